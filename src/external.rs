use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Stdin, Stdout};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, ExitStatus, Stdio};

/// Command that is not a builtin: a program image located on `PATH`.
#[derive(Debug)]
pub struct ExternalCommand {
    name: String,
    program: OsString,
    args: Vec<OsString>,
}

impl ExternalCommand {
    /// `name` is what the user typed, `program` the resolved executable.
    pub fn new(name: impl Into<String>, program: OsString, args: Vec<OsString>) -> Self {
        Self {
            name: name.into(),
            program,
            args,
        }
    }

    /// Look `name` up on the environment's `PATH`.
    pub fn resolve(env: &Environment, name: &str, args: &[&str]) -> Option<Self> {
        let search_paths = env.get_var("PATH")?;
        let executable = find_command_path(OsStr::new(&search_paths), Path::new(name))?;
        Some(Self::new(
            name,
            executable.as_os_str().to_owned(),
            args.iter().map(OsString::from).collect(),
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start the program without waiting for it.
    ///
    /// The returned handle owns the child; it is collected by
    /// [`SpawnedChild::wait`] or, failing that, when the handle is dropped.
    pub fn spawn(&self, stdin: Stdio, stdout: Stdio, env: &Environment) -> Result<SpawnedChild> {
        let child = std::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(stdin)
            .stdout(stdout)
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir)
            .spawn()
            .with_context(|| self.name.clone())?;
        tracing::debug!(name = %self.name, pid = child.id(), "spawned");
        Ok(SpawnedChild {
            name: self.name.clone(),
            child: Some(child),
        })
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        ExternalCommand::resolve(env, name, args)
            .map(|cmd| Box::new(cmd) as Box<dyn ExecutableCommand>)
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        self.spawn(stdin.stdio(), stdout.stdio(), env)?.wait()
    }
}

/// A running child process that has not been collected yet.
///
/// [`SpawnedChild::wait`] consumes the handle, so a child can be waited on only
/// once. A handle dropped without `wait` blocks until the child exits.
#[derive(Debug)]
pub struct SpawnedChild {
    name: String,
    child: Option<Child>,
}

impl SpawnedChild {
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// The read end of the child's stdout, if it was spawned with [`Stdio::piped`].
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.as_mut()?.stdout.take()
    }

    /// Block until the child exits and return its exit code.
    pub fn wait(mut self) -> Result<ExitCode> {
        let Some(mut child) = self.child.take() else {
            return Ok(0);
        };
        let status = child
            .wait()
            .with_context(|| format!("{}: wait", self.name))?;
        tracing::debug!(name = %self.name, %status, "collected");
        Ok(exit_code(status))
    }
}

impl Drop for SpawnedChild {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.wait() {
                tracing::warn!(name = %self.name, "failed to collect child: {e}");
            }
        }
    }
}

fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(x) => x,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it exists.
/// - `./foo` on Unix or any `./`-prefixed path on other platforms: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|path| path.is_file())
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}
