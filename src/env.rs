use crate::config::ShellConfig;
use crate::history::History;
use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Mutable state shared by every command the interpreter runs.
///
/// The environment contains:
/// - `vars`: variables passed to spawned programs (`PATH` is looked up here).
/// - `current_dir`: the directory relative paths are resolved against.
/// - `should_exit`: set by `exit`; the read loop stops once it is true.
/// - `history`: the input lines remembered for the `history` builtin.
/// - `config`: limits the loop and the builtins agree on.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
    pub should_exit: bool,
    pub history: History,
    pub config: ShellConfig,
}

impl Environment {
    /// Capture the current process state with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ShellConfig::default())
    }

    /// Capture the current process variables and working directory.
    pub fn with_config(config: ShellConfig) -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
            history: History::with_capacity(config.history_capacity),
            config,
        }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Resolve `path` against [`Environment::current_dir`]; absolute paths pass through.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.current_dir.join(path)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
