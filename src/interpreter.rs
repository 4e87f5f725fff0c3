use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Stdin, Stdout};
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::error::ShellError;
use crate::io_adapters::InheritedStdin;
use crate::lexer;
use crate::parser::{self, Invocation};
use crate::pipeline::Pipeline;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// Zero-sized factory for one command type.
///
/// `CommandFactory` is implemented for every builtin and for `ExternalCommand`.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// The interpreter maintains an [`Environment`] and a list of [`CommandFactory`] objects
/// that are queried in order to create commands by name. See [`Default`] for the
/// factories included out of the box.
///
/// Example
/// ```
/// use mini_shell::Interpreter;
/// let mut sh = Interpreter::default();
/// let code = sh.run("echo", &["hello", "world"]).unwrap();
/// assert_eq!(code, 0);
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(),
            commands,
        }
    }

    /// Create an interpreter with the default commands and the given limits.
    pub fn with_config(config: ShellConfig) -> Self {
        Self {
            env: Environment::with_config(config),
            commands: default_commands(),
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Run a single command invocation by name with arguments.
    ///
    /// Returns the command's exit code or an error if the command cannot be created
    /// or fails to execute.
    pub fn run(&mut self, name: &str, args: &[&str]) -> anyhow::Result<ExitCode> {
        self.run_with_io(
            name,
            args,
            Box::new(InheritedStdin::lock()),
            Box::new(std::io::stdout()),
        )
    }

    /// Like [`Interpreter::run`] with explicit streams.
    pub fn run_with_io(
        &mut self,
        name: &str,
        args: &[&str],
        stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
    ) -> anyhow::Result<ExitCode> {
        let cmd = self.create(name, args)?;
        cmd.execute(stdin, stdout, &mut self.env)
    }

    fn create(&self, name: &str, args: &[&str]) -> Result<Box<dyn ExecutableCommand>, ShellError> {
        self.commands
            .iter()
            .find_map(|factory| factory.try_create(&self.env, name, args))
            .ok_or_else(|| ShellError::NotFound(name.to_string()))
    }

    /// Record, tokenize and run one input line with the shell's own streams.
    pub fn execute_line(&mut self, line: &str) -> anyhow::Result<ExitCode> {
        self.execute_line_with_io(
            line,
            Box::new(InheritedStdin::lock()),
            Box::new(std::io::stdout()),
        )
    }

    /// Record, tokenize and run one input line.
    ///
    /// Blank lines are neither recorded nor executed. A line with a single
    /// standalone `|` runs as a two-stage pipeline.
    pub fn execute_line_with_io(
        &mut self,
        line: &str,
        stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
    ) -> anyhow::Result<ExitCode> {
        let line = self.env.config.truncate_line(line);
        let tokens = lexer::tokenize(line, self.env.config.max_tokens);
        if tokens.is_empty() {
            return Ok(0);
        }
        self.env.history.push(line.trim_end_matches(['\n', '\r']));

        match parser::classify(&tokens)? {
            Invocation::Empty => Ok(0),
            Invocation::Simple { name, args } => {
                tracing::debug!(name, ?args, "dispatching");
                self.run_with_io(name, args, stdin, stdout)
            }
            Invocation::Pipeline { first, second } => {
                tracing::debug!(?first, ?second, "dispatching pipeline");
                let pipeline = Pipeline::resolve(&self.env, first, second)?;
                Box::new(pipeline).execute(stdin, stdout, &mut self.env)
            }
        }
    }

    /// Read-eval-print loop on the terminal.
    ///
    /// Ends on `exit`, end of input or Ctrl-C. Command errors are printed and the
    /// loop goes on.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;

        while !self.env.should_exit {
            let prompt = self.env.config.prompt.clone();
            match rl.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    if let Err(e) = self.execute_line(&line) {
                        report(&e);
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Dispatcher errors go to stdout like any other shell message; failures of
/// the command itself go to stderr.
fn report(e: &anyhow::Error) {
    tracing::debug!("command failed: {e:?}");
    if e.downcast_ref::<ShellError>().is_some() {
        println!("{e}");
    } else {
        eprintln!("{e:#}");
    }
}

/// The default set of commands, builtins first, then the external launcher.
fn default_commands() -> Vec<Box<dyn CommandFactory>> {
    use crate::builtin::*;
    use crate::external::ExternalCommand;
    vec![
        Box::new(Factory::<Exit>::default()),
        Box::new(Factory::<Pwd>::default()),
        Box::new(Factory::<Touch>::default()),
        Box::new(Factory::<Cat>::default()),
        Box::new(Factory::<Rm>::default()),
        Box::new(Factory::<Echo>::default()),
        Box::new(Factory::<Ls>::default()),
        Box::new(Factory::<Mkdir>::default()),
        Box::new(Factory::<Mv>::default()),
        Box::new(Factory::<Cal>::default()),
        Box::new(Factory::<Who>::default()),
        Box::new(Factory::<More>::default()),
        Box::new(Factory::<Sort>::default()),
        Box::new(Factory::<Uniq>::default()),
        Box::new(Factory::<Ps>::default()),
        Box::new(Factory::<Kill>::default()),
        Box::new(Factory::<Cmp>::default()),
        Box::new(Factory::<History>::default()),
        Box::new(Factory::<ExternalCommand>::default()),
    ]
}

impl Default for Interpreter {
    /// Create an interpreter with every builtin, the external command launcher and
    /// the default limits.
    fn default() -> Self {
        Self::with_config(ShellConfig::default())
    }
}
