pub mod check;
pub mod input;
pub mod model;
pub mod parse;
pub mod run;
