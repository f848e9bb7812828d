use crate::cli::InputArgs;
use crate::config;
use crate::error::{CliError, Result};
use elsepa::core::elscata::elscata_model;
use elsepa::core::io::input::InputDeck;
use elsepa::core::io::traits::DataFile;
use elsepa::core::settings::{Settings, parse_to_model};
use elsepa::core::units::UnitRegistry;
use std::sync::Arc;
use tracing::info;

pub fn run(args: InputArgs) -> Result<()> {
    let (settings, _) = config::load_settings(&args.settings)?;
    let deck = render_deck(&settings)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &deck)?;
            info!("Input deck written to {:?}", path);
            println!("Input deck written to: {}", path.display());
        }
        None => print!("{}", deck),
    }
    Ok(())
}

/// Parses raw settings against the elscata model and renders the deck.
pub fn render_deck(settings: &Settings) -> Result<String> {
    let units = UnitRegistry::new();
    let model = Arc::new(elscata_model(&units)?);
    let filled = parse_to_model(settings, &model)?;
    InputDeck::new(model)
        .write_to_string(&filled)
        .map_err(CliError::from)
}
