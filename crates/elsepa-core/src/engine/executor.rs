use super::config::{Backend, DATA_DIR_ENV};
use super::container::ContainerExecutor;
use super::error::EngineError;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use tracing::{debug, info};

/// What a finished program printed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionOutput {
    pub(crate) fn from_process(output: &Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Runs the scattering program once.
///
/// Implementations feed `input` to the program's standard input and leave
/// every file it writes in `work_dir`.
pub trait Executor: Send + Sync {
    fn execute(&self, input: &str, work_dir: &Path) -> Result<ExecutionOutput, EngineError>;

    /// A short human-readable name for logs.
    fn describe(&self) -> String;
}

/// A program on the local machine, run with a fixed argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalExecutor {
    program: PathBuf,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl LocalExecutor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// The `elscata` binary with `ELSEPA_DATA` pointing at `data_dir`.
    pub fn elscata(binary: impl Into<PathBuf>, data_dir: &Path) -> Self {
        Self::new(binary).with_env(DATA_DIR_ENV, data_dir.display().to_string())
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Executor for LocalExecutor {
    fn execute(&self, input: &str, work_dir: &Path) -> Result<ExecutionOutput, EngineError> {
        let program = self.program.display().to_string();
        info!(program = %program, work_dir = %work_dir.display(), "Launching process");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .current_dir(work_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EngineError::Launch {
                program: program.clone(),
                source,
            })?;

        // A program that rejects its input may exit before reading all of it;
        // it is still waited on so its exit status and stderr are kept.
        let written = feed_stdin(&mut child, input);

        let output = child
            .wait_with_output()
            .map_err(EngineError::io("waiting for the program"))?;
        let captured = ExecutionOutput::from_process(&output);
        debug!(stdout_bytes = output.stdout.len(), status = %output.status, "Process finished");

        if !output.status.success() {
            return Err(EngineError::ProcessFailed {
                program,
                status: output.status.to_string(),
                stderr: captured.stderr.trim().to_string(),
            });
        }
        written.map_err(EngineError::io("writing the program input"))?;
        Ok(captured)
    }

    fn describe(&self) -> String {
        self.program.display().to_string()
    }
}

/// Writes `input` to the child's standard input and closes it.
pub(crate) fn feed_stdin(child: &mut Child, input: &str) -> io::Result<()> {
    match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(input.as_bytes()),
        None => Ok(()),
    }
}

/// The executor a backend calls for.
pub fn executor_for(backend: &Backend) -> Box<dyn Executor> {
    match backend {
        Backend::Local { binary, data_dir } => {
            Box::new(LocalExecutor::elscata(binary.clone(), data_dir))
        }
        Backend::Container {
            image,
            working_dir,
            command,
            engine,
        } => Box::new(
            ContainerExecutor::new(image.clone())
                .working_dir(working_dir.clone())
                .command(command.clone())
                .engine(engine.clone()),
        ),
    }
}


#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn local_executor_feeds_stdin_and_runs_in_work_dir() {
        let dir = tempdir().unwrap();
        let executor = LocalExecutor::new("sh").with_args(["-c", "cat > echoed.dat; echo $MARKER"]);
        let executor = executor.with_env("MARKER", "present");

        let output = executor.execute("IZ      79\n", dir.path()).unwrap();

        assert_eq!(output.stdout.trim(), "present");
        let echoed = std::fs::read_to_string(dir.path().join("echoed.dat")).unwrap();
        assert_eq!(echoed, "IZ      79\n");
    }

    #[test]
    fn non_zero_exit_is_reported_with_stderr() {
        let dir = tempdir().unwrap();
        let executor = LocalExecutor::new("sh").with_args(["-c", "echo broken >&2; exit 3"]);
        let err = executor.execute("", dir.path()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ProcessFailed { ref stderr, .. } if stderr == "broken"
        ));
    }

    #[test]
    fn early_exit_on_large_input_keeps_the_exit_status_and_stderr() {
        let dir = tempdir().unwrap();
        let executor = LocalExecutor::new("sh").with_args(["-c", "echo rejected >&2; exit 3"]);
        let input = "IZ      79\n".repeat(200_000);

        let err = executor.execute(&input, dir.path()).unwrap_err();

        assert!(matches!(
            err,
            EngineError::ProcessFailed { ref status, ref stderr, .. }
                if status.contains('3') && stderr == "rejected"
        ));
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let dir = tempdir().unwrap();
        let executor = LocalExecutor::new(dir.path().join("does-not-exist"));
        assert!(matches!(
            executor.execute("", dir.path()),
            Err(EngineError::Launch { .. })
        ));
    }

    #[test]
    fn elscata_executor_exports_the_data_directory() {
        let executor = LocalExecutor::elscata("/opt/elsepa/elscata", Path::new("/opt/elsepa/data"));
        assert_eq!(executor.program(), Path::new("/opt/elsepa/elscata"));
        assert_eq!(
            executor.envs,
            vec![(DATA_DIR_ENV.to_string(), "/opt/elsepa/data".to_string())]
        );
        assert_eq!(executor.describe(), "/opt/elsepa/elscata");
    }
}
