use super::config::{DEFAULT_CONTAINER_ENGINE, DEFAULT_CONTAINER_WORKING_DIR, ELSCATA_BINARY};
use super::error::EngineError;
use super::executor::{ExecutionOutput, Executor, feed_stdin};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Builds the argument list for a shell running `commands` in sequence,
/// stopping at the first failure.
pub fn sh(commands: &[&str]) -> Vec<String> {
    vec!["sh".into(), "-c".into(), commands.join(" && ")]
}

/// A long-lived container driven through a container engine's CLI.
///
/// The container is created with an open standard input so that its default
/// command stays alive; work is done with [`Container::exec`]. Dropping a
/// container that was not [removed](Container::remove) removes it forcibly.
#[derive(Debug)]
pub struct Container {
    engine: String,
    id: String,
    working_dir: String,
    removed: bool,
}

impl Container {
    pub fn create(engine: &str, image: &str, working_dir: &str) -> Result<Self, EngineError> {
        let output = run_engine(engine, "create", &create_args(image, working_dir), None)?;
        let id = output.stdout.trim().to_string();
        if id.is_empty() {
            return Err(EngineError::Container {
                operation: "create",
                message: format!("no container id returned for image '{image}'"),
            });
        }
        info!(image, id = %short_id(&id), "Created container");
        Ok(Self {
            engine: engine.to_string(),
            id,
            working_dir: working_dir.to_string(),
            removed: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn working_dir(&self) -> &str {
        &self.working_dir
    }

    pub fn start(&self) -> Result<(), EngineError> {
        run_engine(&self.engine, "start", &["start".into(), self.id.clone()], None)?;
        Ok(())
    }

    /// Copies a host file or directory to `target`, taken relative to the
    /// working directory unless absolute.
    pub fn copy_in(&self, source: &Path, target: &str) -> Result<(), EngineError> {
        let destination = format!("{}:{}", self.id, self.resolve(target));
        let args = vec!["cp".into(), source.display().to_string(), destination];
        run_engine(&self.engine, "copy in", &args, None)?;
        Ok(())
    }

    /// Copies `source` out of the container. A source ending in `/.` copies
    /// a directory's contents.
    pub fn copy_out(&self, source: &str, target: &Path) -> Result<(), EngineError> {
        let origin = format!("{}:{}", self.id, self.resolve(source));
        let args = vec!["cp".into(), origin, target.display().to_string()];
        run_engine(&self.engine, "copy out", &args, None)?;
        Ok(())
    }

    /// Runs a command inside the container's working directory, optionally
    /// feeding it standard input.
    pub fn exec(&self, command: &[String], stdin: Option<&str>) -> Result<ExecutionOutput, EngineError> {
        let args = exec_args(&self.id, &self.working_dir, command, stdin.is_some());
        run_engine(&self.engine, "exec", &args, stdin)
    }

    pub fn sh(&self, commands: &[&str]) -> Result<ExecutionOutput, EngineError> {
        self.exec(&sh(commands), None)
    }

    pub fn kill(&self) -> Result<(), EngineError> {
        run_engine(&self.engine, "kill", &["kill".into(), self.id.clone()], None)?;
        Ok(())
    }

    pub fn remove(mut self) -> Result<(), EngineError> {
        self.removed = true;
        run_engine(&self.engine, "remove", &["rm".into(), "-f".into(), self.id.clone()], None)?;
        debug!(id = %short_id(&self.id), "Removed container");
        Ok(())
    }

    fn resolve(&self, path: &str) -> String {
        resolve_in(&self.working_dir, path)
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        let status = Command::new(&self.engine)
            .args(["rm", "-f", self.id.as_str()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if !matches!(status, Ok(s) if s.success()) {
            warn!(id = %short_id(&self.id), "Failed to clean up container");
        }
    }
}

/// Runs the program inside a fresh container per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerExecutor {
    image: String,
    working_dir: String,
    command: String,
    engine: String,
}

impl ContainerExecutor {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            working_dir: DEFAULT_CONTAINER_WORKING_DIR.to_string(),
            command: ELSCATA_BINARY.to_string(),
            engine: DEFAULT_CONTAINER_ENGINE.to_string(),
        }
    }

    pub fn working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// The container CLI to call, `docker` unless set.
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }
}

impl Executor for ContainerExecutor {
    fn execute(&self, input: &str, work_dir: &Path) -> Result<ExecutionOutput, EngineError> {
        let container = Container::create(&self.engine, &self.image, &self.working_dir)?;
        container.start()?;
        let output = container.exec(&sh(&[self.command.as_str()]), Some(input))?;
        container.copy_out(".", work_dir)?;
        if let Err(e) = container.kill() {
            debug!(error = %e, "Container already stopped");
        }
        container.remove()?;
        Ok(output)
    }

    fn describe(&self) -> String {
        format!("{}:{}", self.engine, self.image)
    }
}

fn create_args(image: &str, working_dir: &str) -> Vec<String> {
    vec![
        "create".into(),
        "-i".into(),
        "-w".into(),
        working_dir.into(),
        image.into(),
    ]
}

fn exec_args(id: &str, working_dir: &str, command: &[String], interactive: bool) -> Vec<String> {
    let mut args = vec!["exec".to_string()];
    if interactive {
        args.push("-i".into());
    }
    args.extend(["-w".to_string(), working_dir.to_string(), id.to_string()]);
    args.extend(command.iter().cloned());
    args
}

fn resolve_in(working_dir: &str, path: &str) -> String {
    if path.starts_with('/') {
        return path.to_string();
    }
    format!("{}/{}", working_dir.trim_end_matches('/'), path)
}

fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

fn run_engine(
    engine: &str,
    operation: &'static str,
    args: &[String],
    stdin: Option<&str>,
) -> Result<ExecutionOutput, EngineError> {
    debug!(engine, ?args, "Running container command");
    let mut child = Command::new(engine)
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| EngineError::Launch {
            program: engine.to_string(),
            source,
        })?;

    let written = feed_stdin(&mut child, stdin.unwrap_or_default());

    let output = child
        .wait_with_output()
        .map_err(EngineError::io("waiting for the container engine"))?;
    let captured = ExecutionOutput::from_process(&output);
    if !output.status.success() {
        return Err(EngineError::Container {
            operation,
            message: captured.stderr.trim().to_string(),
        });
    }
    written.map_err(EngineError::io("writing to the container"))?;
    Ok(captured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sh_joins_commands_with_and() {
        assert_eq!(
            sh(&["cd /data", "elscata < input.in"]),
            vec!["sh", "-c", "cd /data && elscata < input.in"]
        );
    }

    #[test]
    fn relative_paths_resolve_against_the_working_directory() {
        assert_eq!(resolve_in("/tmp/elsepa/", "dcs.dat"), "/tmp/elsepa/dcs.dat");
        assert_eq!(resolve_in("/tmp/elsepa", "."), "/tmp/elsepa/.");
        assert_eq!(resolve_in("/tmp/elsepa", "/etc/hosts"), "/etc/hosts");
    }

    #[test]
    fn engine_arguments_keep_stdin_open_only_when_needed() {
        assert_eq!(
            create_args("elsepa:2020", "/work"),
            vec!["create", "-i", "-w", "/work", "elsepa:2020"]
        );
        let command = sh(&["elscata"]);
        assert_eq!(
            exec_args("abc", "/work", &command, true),
            vec!["exec", "-i", "-w", "/work", "abc", "sh", "-c", "elscata"]
        );
        assert_eq!(
            exec_args("abc", "/work", &command, false)[1],
            "-w"
        );
    }

    #[test]
    fn executor_defaults_target_docker() {
        let executor = ContainerExecutor::new("elsepa:latest").working_dir("/run");
        assert_eq!(executor.describe(), "docker:elsepa:latest");
        assert_eq!(executor.working_dir, "/run");
        assert_eq!(executor.command, ELSCATA_BINARY);
    }

    #[cfg(unix)]
    #[test]
    fn engine_failure_while_feeding_stdin_reports_its_stderr() {
        let args: Vec<String> = sh(&["echo 'no such container' >&2", "exit 1"])
            .into_iter()
            .skip(1)
            .collect();
        let input = "x".repeat(1 << 20);
        let err = run_engine("sh", "exec", &args, Some(&input)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Container { operation: "exec", ref message } if message == "no such container"
        ));
    }

    #[test]
    fn missing_engine_is_a_launch_error() {
        let err = run_engine("elsepa-no-such-engine", "start", &[], None).unwrap_err();
        assert!(matches!(err, EngineError::Launch { .. }));
    }
}
