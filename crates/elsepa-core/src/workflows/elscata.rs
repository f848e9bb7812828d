use crate::core::elscata::{elscata_model, elscata_outputs};
use crate::core::io::input::InputDeck;
use crate::core::io::output::{OutputKind, TableFile};
use crate::core::io::table::Table;
use crate::core::io::traits::DataFile;
use crate::core::settings::{Settings, parse_to_model};
use crate::core::units::UnitRegistry;
use crate::engine::config::RunConfig;
use crate::engine::error::EngineError;
use crate::engine::executor::{Executor, executor_for};
use crate::engine::progress::{Progress, ProgressReporter};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const OUTPUT_EXTENSION: &str = "dat";

/// The contents of one output file.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputData {
    /// Kept verbatim.
    Opaque(String),
    Table(Table),
}

impl OutputData {
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Table(table) => Some(table),
            Self::Opaque(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunResult {
    /// The validated settings with every default filled in.
    pub settings: Settings,
    /// The input deck as it was fed to the program.
    pub input: String,
    /// Parsed outputs keyed by file stem, in file name order.
    pub outputs: IndexMap<String, OutputData>,
    pub stdout: String,
}

impl RunResult {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.outputs.get(name).and_then(OutputData::as_table)
    }
}

/// Runs `elscata` for `settings` on the backend selected by `config`.
#[instrument(skip_all, name = "elscata_workflow")]
pub fn run(
    settings: &Settings,
    config: &RunConfig,
    reporter: &ProgressReporter,
) -> Result<RunResult, EngineError> {
    let executor = executor_for(&config.backend);
    info!(executor = %executor.describe(), "Selected executor");
    run_with(
        executor.as_ref(),
        settings,
        config.output_dir.as_deref(),
        reporter,
    )
}

/// Runs `elscata` through an arbitrary executor.
///
/// Settings may hold raw text or bare numbers for quantity fields; they are
/// parsed against the model before validation. Each call uses a fresh
/// scratch directory. When `output_dir` is given, the raw `.dat` files are
/// copied there as well.
#[instrument(skip_all, name = "elscata_run")]
pub fn run_with(
    executor: &dyn Executor,
    settings: &Settings,
    output_dir: Option<&Path>,
    reporter: &ProgressReporter,
) -> Result<RunResult, EngineError> {
    let units = UnitRegistry::new();
    let model = Arc::new(elscata_model(&units)?);

    let (filled, input) = reporter.phase("Preparing input", || -> Result<_, EngineError> {
        let filled = parse_to_model(settings, &model)?;
        let input = InputDeck::new(model.clone()).write_to_string(&filled)?;
        debug!(lines = input.lines().count(), "Rendered input deck");
        Ok((filled, input))
    })?;

    let scratch = tempfile::Builder::new()
        .prefix("elsepa-")
        .tempdir()
        .map_err(EngineError::io("creating the scratch directory"))?;

    let output = reporter.phase("Running elscata", || {
        executor.execute(&input, scratch.path())
    })?;

    let outputs = reporter.phase("Collecting outputs", || {
        collect_outputs(scratch.path(), output_dir, &units, reporter)
    })?;

    info!(outputs = outputs.len(), "elscata run finished");
    Ok(RunResult {
        settings: filled,
        input,
        outputs,
        stdout: output.stdout,
    })
}

fn output_files(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(EngineError::io("listing the run directory"))? {
        let path = entry
            .map_err(EngineError::io("listing the run directory"))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == OUTPUT_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn collect_outputs(
    run_dir: &Path,
    output_dir: Option<&Path>,
    units: &UnitRegistry,
    reporter: &ProgressReporter,
) -> Result<IndexMap<String, OutputData>, EngineError> {
    let parsers = elscata_outputs();
    let files = output_files(run_dir)?;
    if let Some(dir) = output_dir {
        fs::create_dir_all(dir).map_err(EngineError::io("creating the output directory"))?;
    }

    reporter.report(Progress::TaskStart {
        total_steps: files.len() as u64,
    });
    let mut outputs = IndexMap::with_capacity(files.len());
    for path in files {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        let data = match parsers.classify(&stem) {
            Some(OutputKind::Table) => OutputData::Table(
                TableFile::new(units)
                    .read_from_path(&path)
                    .map_err(|source| EngineError::Output {
                        path: path.clone(),
                        source,
                    })?,
            ),
            kind => {
                if kind.is_none() {
                    warn!(file = %stem, "No parser registered for output, keeping it as text");
                }
                OutputData::Opaque(
                    fs::read_to_string(&path).map_err(EngineError::io("reading an output file"))?,
                )
            }
        };
        if let (Some(dir), Some(name)) = (output_dir, path.file_name()) {
            fs::copy(&path, dir.join(name)).map_err(EngineError::io("copying an output file"))?;
        }
        outputs.insert(stem, data);
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    Ok(outputs)
}
