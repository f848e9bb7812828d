//! The `elscata` program: its settings model and the files it writes.

mod model;
mod outputs;

pub use model::{KEYWORDS, elscata_model};
pub use outputs::elscata_outputs;
