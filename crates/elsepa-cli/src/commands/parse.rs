use crate::cli::ParseArgs;
use crate::error::{CliError, Result};
use elsepa::core::io::output::TableFile;
use elsepa::core::io::traits::DataFile;
use elsepa::core::units::UnitRegistry;
use std::fs::File;
use std::io::BufWriter;
use tracing::info;

pub fn run(args: ParseArgs) -> Result<()> {
    let units = UnitRegistry::new();
    let table = TableFile::new(&units)
        .read_from_path(&args.file)
        .map_err(|e| CliError::parsing(&args.file, e))?;
    info!(
        "Parsed {} row(s) in {} column(s) from {:?}",
        table.len(),
        table.width(),
        &args.file
    );

    match &args.csv {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            table
                .write_csv(writer)
                .map_err(|e| CliError::parsing(path, e))?;
            println!("Table written to: {}", path.display());
        }
        None => print!("{}", table),
    }
    Ok(())
}
