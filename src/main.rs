use argh::FromArgs;
use mini_shell::Interpreter;
use mini_shell::config::ShellConfig;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// Interactive mini shell with file utilities and two-stage pipelines.
struct Args {
    #[argh(option)]
    /// prompt printed before each line
    prompt: Option<String>,

    #[argh(option)]
    /// number of input lines remembered by `history` (default 20)
    history_size: Option<usize>,

    #[argh(option)]
    /// lines shown by `more` before each pause (default 10)
    page_lines: Option<usize>,
}

impl Args {
    fn into_config(self) -> ShellConfig {
        let mut config = ShellConfig::default();
        if let Some(prompt) = self.prompt {
            config.prompt = prompt;
        }
        if let Some(size) = self.history_size {
            config.history_capacity = size;
        }
        if let Some(lines) = self.page_lines {
            config.page_lines = lines;
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Args = argh::from_env();
    let mut shell = Interpreter::with_config(args.into_config());
    shell.repl()?;
    Ok(())
}
