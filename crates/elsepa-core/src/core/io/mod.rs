//! Reading and writing the files exchanged with the scattering programs.
//!
//! All formats implement [`traits::DataFile`]: the fixed-format keyword deck
//! fed to the program ([`input::InputDeck`]), settings stored as TOML
//! ([`toml_settings::TomlSettings`]) and the column tables the program writes
//! back ([`output::TableFile`]).

pub mod format;
pub mod input;
pub mod output;
pub mod table;
pub mod toml_settings;
pub mod traits;
