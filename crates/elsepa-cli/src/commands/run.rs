use crate::cli::RunArgs;
use crate::config::{self, AppConfig};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use elsepa::engine::progress::ProgressReporter;
use elsepa::workflows::elscata::{self, OutputData};
use tracing::info;

pub fn run(args: RunArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let AppConfig {
        settings,
        run_config,
    } = config::build_config(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting elscata...");
    let result = elscata::run(&settings, &run_config, &reporter)?;
    info!("Workflow finished with {} output file(s).", result.outputs.len());

    if result.outputs.is_empty() {
        println!("Warning: elscata finished without writing any output files.");
        return Ok(());
    }

    println!("Output files:");
    for (name, data) in &result.outputs {
        match data {
            OutputData::Table(table) => {
                let columns: Vec<&str> = table.column_names().collect();
                println!(
                    "  {:<16} {:>5} rows  {}",
                    name,
                    table.len(),
                    columns.join(", ")
                );
            }
            OutputData::Opaque(text) => {
                println!("  {:<16} {:>5} lines (text)", name, text.lines().count());
            }
        }
    }
    if let Some(dir) = &run_config.output_dir {
        println!("Raw output files copied to: {}", dir.display());
    }
    Ok(())
}
