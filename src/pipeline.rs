use crate::command::{ExecutableCommand, ExitCode, Stdin, Stdout};
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::ExternalCommand;
use crate::io_adapters::InheritedStdin;
use anyhow::{Context, Result};

/// Two programs with the first one's stdout connected to the second one's stdin.
///
/// Both stages are program images found on `PATH`; builtins run in-process and
/// cannot take part.
#[derive(Debug)]
pub struct Pipeline {
    first: ExternalCommand,
    second: ExternalCommand,
}

impl Pipeline {
    pub fn new(first: ExternalCommand, second: ExternalCommand) -> Self {
        Self { first, second }
    }

    /// Resolve both stages (`argv[0]` is the program name).
    pub fn resolve(env: &Environment, first: &[&str], second: &[&str]) -> Result<Self, ShellError> {
        let stage = |argv: &[&str]| -> Result<ExternalCommand, ShellError> {
            let (name, args) = argv.split_first().ok_or(ShellError::UnsupportedPipeline)?;
            ExternalCommand::resolve(env, name, args)
                .ok_or_else(|| ShellError::NotFound(name.to_string()))
        };
        Ok(Self::new(stage(first)?, stage(second)?))
    }

    /// Run both stages and wait for both of them.
    ///
    /// `stdin` feeds the first stage and `stdout` receives the second stage's
    /// output. Returns the exit codes in stage order.
    ///
    /// The parent gives away both pipe ends while spawning, so once the first
    /// stage exits the second one sees end of input. If the second stage cannot
    /// be spawned, the read end is already closed and the first stage is collected
    /// before the error is returned.
    pub fn run(
        &self,
        stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
        env: &Environment,
    ) -> Result<(ExitCode, ExitCode)> {
        let (reader, writer) = std::io::pipe().context("pipe")?;
        tracing::debug!(first = self.first.name(), second = self.second.name(), "starting pipeline");

        let first = self.first.spawn(stdin.stdio(), writer.into(), env)?;
        let second = self.second.spawn(reader.into(), stdout.stdio(), env)?;

        let first_code = first.wait()?;
        let second_code = second.wait()?;
        Ok((first_code, second_code))
    }
}

impl ExecutableCommand for Pipeline {
    /// The pipeline's exit code is the one of its last stage.
    fn execute(
        self: Box<Self>,
        stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let (_, last) = self.run(stdin, stdout, env)?;
        Ok(last)
    }
}

/// Run `first | second` with the shell's own stdin and stdout.
pub fn run_pipeline(
    first: &[&str],
    second: &[&str],
    env: &Environment,
) -> Result<(ExitCode, ExitCode)> {
    let pipeline = Pipeline::resolve(env, first, second)?;
    pipeline.run(
        Box::new(InheritedStdin::lock()),
        Box::new(std::io::stdout()),
        env,
    )
}
