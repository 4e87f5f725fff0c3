use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Stdin, Stdout};
use crate::env::Environment;
use crate::external::ExternalCommand;
use crate::interpreter::Factory;
use crate::procfs;
use crate::textutil::{self, Comparison};
use anyhow::{Context, Result, anyhow};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::fs::{self, DirBuilder, File};
use std::io::{self, BufReader, Read, Write};
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;
use std::process::Stdio;

/// Built-in commands known to the shell at compile time.
///
/// A builtin declares how many arguments it takes (the command name excluded).
/// Invocations outside that range print [`BuiltinCommand::USAGE`] and never reach
/// [`BuiltinCommand::execute`].
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, matched exactly.
    const NAME: &'static str;
    /// Literal usage line printed on an argument count mismatch.
    const USAGE: &'static str;
    const MIN_ARGS: usize;
    /// `None` means any number of arguments.
    const MAX_ARGS: Option<usize>;

    /// Build the command; `args.len()` is already within the declared range.
    fn from_args(args: &[&str]) -> Self;

    /// Executes the command using provided IO streams and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode>;

    fn accepts(argc: usize) -> bool {
        argc >= Self::MIN_ARGS && Self::MAX_ARGS.is_none_or(|max| argc <= max)
    }
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        mut stdin: Box<dyn Stdin>,
        mut stdout: Box<dyn Stdout>,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        match T::execute(*self, &mut stdin, &mut stdout, env) {
            Ok(x) => Ok(x),
            Err(e) => {
                tracing::debug!(command = T::NAME, "builtin failed: {e:#}");
                writeln!(stdout, "{e:#}")?;
                Ok(1)
            }
        }
    }
}

/// Stand-in for a builtin called with the wrong number of arguments.
struct InvalidArgs {
    usage: &'static str,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        _stdin: Box<dyn Stdin>,
        mut stdout: Box<dyn Stdout>,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        writeln!(stdout, "{}", self.usage)?;
        Ok(2)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name != T::NAME {
            return None;
        }
        let cmd: Box<dyn ExecutableCommand> = if T::accepts(args.len()) {
            Box::new(T::from_args(args))
        } else {
            Box::new(InvalidArgs { usage: T::USAGE })
        };
        Some(cmd)
    }
}

/// Open `path` (relative to the shell's directory) with errors prefixed by `cmd`.
fn open_for(cmd: &str, path: &str, env: &Environment) -> Result<File> {
    File::open(env.resolve(path)).with_context(|| format!("{cmd}: {path}"))
}

/// Leave the read loop.
pub struct Exit;

impl BuiltinCommand for Exit {
    const NAME: &'static str = "exit";
    const USAGE: &'static str = "Usage: exit";
    const MIN_ARGS: usize = 0;
    const MAX_ARGS: Option<usize> = None;

    fn from_args(_args: &[&str]) -> Self {
        Self
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}

/// Print the current working directory.
pub struct Pwd;

impl BuiltinCommand for Pwd {
    const NAME: &'static str = "pwd";
    const USAGE: &'static str = "Usage: pwd";
    const MIN_ARGS: usize = 0;
    const MAX_ARGS: Option<usize> = Some(0);

    fn from_args(_args: &[&str]) -> Self {
        Self
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        writeln!(stdout, "Current directory: {}", env.current_dir.display())?;
        Ok(0)
    }
}

/// Create a file, truncating it if it exists.
pub struct Touch {
    pub path: String,
}

impl BuiltinCommand for Touch {
    const NAME: &'static str = "touch";
    const USAGE: &'static str = "Usage: touch <filename>";
    const MIN_ARGS: usize = 1;
    const MAX_ARGS: Option<usize> = Some(1);

    fn from_args(args: &[&str]) -> Self {
        Self {
            path: args[0].to_string(),
        }
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        File::create(env.resolve(&self.path)).with_context(|| format!("touch: {}", self.path))?;
        Ok(0)
    }
}

/// Print a file byte for byte; `-` copies stdin until end of input.
pub struct Cat {
    pub path: String,
}

impl BuiltinCommand for Cat {
    const NAME: &'static str = "cat";
    const USAGE: &'static str = "Usage: cat <filename>";
    const MIN_ARGS: usize = 1;
    const MAX_ARGS: Option<usize> = Some(1);

    fn from_args(args: &[&str]) -> Self {
        Self {
            path: args[0].to_string(),
        }
    }

    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        if self.path == "-" {
            io::copy(stdin, stdout)?;
        } else {
            let mut f = open_for("cat", &self.path, env)?;
            io::copy(&mut f, stdout)?;
        }
        Ok(0)
    }
}

/// Remove a file or an empty directory.
pub struct Rm {
    pub path: String,
}

impl BuiltinCommand for Rm {
    const NAME: &'static str = "rm";
    const USAGE: &'static str = "Usage: rm <filename>";
    const MIN_ARGS: usize = 1;
    const MAX_ARGS: Option<usize> = Some(1);

    fn from_args(args: &[&str]) -> Self {
        Self {
            path: args[0].to_string(),
        }
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let target = env.resolve(&self.path);
        let is_dir = fs::symlink_metadata(&target)
            .map(|m| m.is_dir())
            .unwrap_or(false);
        let removed = if is_dir {
            fs::remove_dir(&target)
        } else {
            fs::remove_file(&target)
        };
        removed.with_context(|| format!("rm: {}", self.path))?;
        Ok(0)
    }
}

/// Print each argument followed by a space, then a newline.
pub struct Echo {
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    const NAME: &'static str = "echo";
    const USAGE: &'static str = "Usage: echo [args...]";
    const MIN_ARGS: usize = 0;
    const MAX_ARGS: Option<usize> = None;

    fn from_args(args: &[&str]) -> Self {
        Self {
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        for arg in &self.args {
            write!(stdout, "{arg} ")?;
        }
        writeln!(stdout)?;
        Ok(0)
    }
}

/// List directory entries in directory order, `.` and `..` first.
pub struct Ls {
    pub dir: Option<String>,
}

impl BuiltinCommand for Ls {
    const NAME: &'static str = "ls";
    const USAGE: &'static str = "Usage: ls [directory]";
    const MIN_ARGS: usize = 0;
    const MAX_ARGS: Option<usize> = Some(1);

    fn from_args(args: &[&str]) -> Self {
        Self {
            dir: args.first().map(|s| s.to_string()),
        }
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let dir = self.dir.as_deref().unwrap_or(".");
        let entries = fs::read_dir(env.resolve(dir)).with_context(|| format!("ls: {dir}"))?;
        writeln!(stdout, ".")?;
        writeln!(stdout, "..")?;
        for entry in entries {
            let entry = entry.with_context(|| format!("ls: {dir}"))?;
            writeln!(stdout, "{}", entry.file_name().to_string_lossy())?;
        }
        Ok(0)
    }
}

/// Create a directory with mode 0777 (before the umask applies).
pub struct Mkdir {
    pub path: String,
}

impl BuiltinCommand for Mkdir {
    const NAME: &'static str = "mkdir";
    const USAGE: &'static str = "Usage: mkdir <directory>";
    const MIN_ARGS: usize = 1;
    const MAX_ARGS: Option<usize> = Some(1);

    fn from_args(args: &[&str]) -> Self {
        Self {
            path: args[0].to_string(),
        }
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        DirBuilder::new()
            .mode(0o777)
            .create(env.resolve(&self.path))
            .with_context(|| format!("mkdir: {}", self.path))?;
        Ok(0)
    }
}

/// Rename a file or directory.
pub struct Mv {
    pub source: String,
    pub destination: String,
}

impl BuiltinCommand for Mv {
    const NAME: &'static str = "mv";
    const USAGE: &'static str = "Usage: mv <source> <destination>";
    const MIN_ARGS: usize = 2;
    const MAX_ARGS: Option<usize> = Some(2);

    fn from_args(args: &[&str]) -> Self {
        Self {
            source: args[0].to_string(),
            destination: args[1].to_string(),
        }
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        fs::rename(env.resolve(&self.source), env.resolve(&self.destination))
            .with_context(|| format!("mv: {} -> {}", self.source, self.destination))?;
        Ok(0)
    }
}

/// Page through a file, answering prompts from stdin.
pub struct More {
    pub path: String,
}

impl BuiltinCommand for More {
    const NAME: &'static str = "more";
    const USAGE: &'static str = "Usage: more <filename>";
    const MIN_ARGS: usize = 1;
    const MAX_ARGS: Option<usize> = Some(1);

    fn from_args(args: &[&str]) -> Self {
        Self {
            path: args[0].to_string(),
        }
    }

    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let file = open_for("more", &self.path, env)?;
        textutil::page(BufReader::new(file), stdin, stdout, env.config.page_lines)?;
        Ok(0)
    }
}

/// Print the lines of a file in byte order.
pub struct Sort {
    pub path: String,
}

impl BuiltinCommand for Sort {
    const NAME: &'static str = "sort";
    const USAGE: &'static str = "Usage: sort <filename>";
    const MIN_ARGS: usize = 1;
    const MAX_ARGS: Option<usize> = Some(1);

    fn from_args(args: &[&str]) -> Self {
        Self {
            path: args[0].to_string(),
        }
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let file = open_for("sort", &self.path, env)?;
        textutil::sort_lines(BufReader::new(file), stdout)?;
        Ok(0)
    }
}

/// Print a file with adjacent duplicate lines collapsed.
pub struct Uniq {
    pub path: String,
}

impl BuiltinCommand for Uniq {
    const NAME: &'static str = "uniq";
    const USAGE: &'static str = "Usage: uniq <filename>";
    const MIN_ARGS: usize = 1;
    const MAX_ARGS: Option<usize> = Some(1);

    fn from_args(args: &[&str]) -> Self {
        Self {
            path: args[0].to_string(),
        }
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let file = open_for("uniq", &self.path, env)?;
        textutil::uniq_lines(BufReader::new(file), stdout)?;
        Ok(0)
    }
}

/// Compare two files byte by byte.
pub struct Cmp {
    pub first: String,
    pub second: String,
}

impl BuiltinCommand for Cmp {
    const NAME: &'static str = "cmp";
    const USAGE: &'static str = "Usage: cmp <file1> <file2>";
    const MIN_ARGS: usize = 2;
    const MAX_ARGS: Option<usize> = Some(2);

    fn from_args(args: &[&str]) -> Self {
        Self {
            first: args[0].to_string(),
            second: args[1].to_string(),
        }
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let a = open_for("cmp", &self.first, env)?;
        let b = open_for("cmp", &self.second, env)?;
        match textutil::compare(a, b).context("cmp")? {
            Comparison::Identical => {
                writeln!(stdout, "Files {} and {} are identical.", self.first, self.second)?;
                Ok(0)
            }
            Comparison::Differ { byte } => {
                writeln!(stdout, "{} {} differ: byte {byte}", self.first, self.second)?;
                Ok(1)
            }
        }
    }
}

/// List processes from `/proc`.
pub struct Ps;

impl BuiltinCommand for Ps {
    const NAME: &'static str = "ps";
    const USAGE: &'static str = "Usage: ps";
    const MIN_ARGS: usize = 0;
    const MAX_ARGS: Option<usize> = Some(0);

    fn from_args(_args: &[&str]) -> Self {
        Self
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        procfs::print_processes(Path::new("/proc"), stdout)?;
        Ok(0)
    }
}

/// Send SIGTERM to a process.
pub struct Kill {
    pub pid: String,
}

impl BuiltinCommand for Kill {
    const NAME: &'static str = "kill";
    const USAGE: &'static str = "Usage: kill <pid>";
    const MIN_ARGS: usize = 1;
    const MAX_ARGS: Option<usize> = Some(1);

    fn from_args(args: &[&str]) -> Self {
        Self {
            pid: args[0].to_string(),
        }
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        // 0 and negative values would signal whole process groups
        let pid: i32 = match self.pid.parse() {
            Ok(pid) if pid > 0 => pid,
            _ => return Err(anyhow!("kill: invalid pid: {}", self.pid)),
        };
        kill(Pid::from_raw(pid), Signal::SIGTERM).with_context(|| format!("kill: {pid}"))?;
        writeln!(stdout, "Process with PID {pid} killed.")?;
        Ok(0)
    }
}

/// Print the remembered input lines, oldest first.
pub struct History;

impl BuiltinCommand for History {
    const NAME: &'static str = "history";
    const USAGE: &'static str = "Usage: history";
    const MIN_ARGS: usize = 0;
    const MAX_ARGS: Option<usize> = Some(0);

    fn from_args(_args: &[&str]) -> Self {
        Self
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        writeln!(stdout, "Command history:")?;
        for (i, line) in env.history.iter().enumerate() {
            writeln!(stdout, "{}. {}", i + 1, line)?;
        }
        Ok(0)
    }
}

/// Run a system utility by name and copy its output into `stdout`.
fn run_utility(name: &str, args: &[String], stdout: &mut dyn Write, env: &Environment) -> Result<ExitCode> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let utility = ExternalCommand::resolve(env, name, &args)
        .ok_or_else(|| anyhow!("{name}: not available on this system"))?;
    let mut child = utility.spawn(Stdio::inherit(), Stdio::piped(), env)?;
    if let Some(mut output) = child.take_stdout() {
        io::copy(&mut output, stdout).with_context(|| name.to_string())?;
    }
    child.wait()
}

/// Show a calendar through the system `cal`.
pub struct Cal {
    pub args: Vec<String>,
}

impl BuiltinCommand for Cal {
    const NAME: &'static str = "cal";
    const USAGE: &'static str = "Usage: cal [month] [year]";
    const MIN_ARGS: usize = 0;
    const MAX_ARGS: Option<usize> = Some(2);

    fn from_args(args: &[&str]) -> Self {
        Self {
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        run_utility(Self::NAME, &self.args, stdout, env)
    }
}

/// Show logged-in users through the system `who`.
pub struct Who;

impl BuiltinCommand for Who {
    const NAME: &'static str = "who";
    const USAGE: &'static str = "Usage: who";
    const MIN_ARGS: usize = 0;
    const MAX_ARGS: Option<usize> = Some(0);

    fn from_args(_args: &[&str]) -> Self {
        Self
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        run_utility(Self::NAME, &[], stdout, env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::{MemReader, MemWriter};
    use std::io::Cursor;
    use tempfile::TempDir;

    /// Environment rooted in a fresh scratch directory.
    fn scratch_env() -> (TempDir, Environment) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let mut env = Environment::new();
        env.current_dir = dir.path().to_path_buf();
        (dir, env)
    }

    fn run<T: BuiltinCommand>(cmd: T, env: &mut Environment) -> (ExitCode, String) {
        let mut out = Vec::new();
        let code = BuiltinCommand::execute(cmd, &mut Cursor::new(Vec::new()), &mut out, env)
            .unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    /// Go through the factory the way the interpreter does.
    fn dispatch<T: BuiltinCommand + 'static>(args: &[&str], env: &mut Environment) -> (ExitCode, String) {
        let out = MemWriter::new();
        let cmd = Factory::<T>::default()
            .try_create(env, T::NAME, args)
            .expect("factory must accept its own name");
        let code = cmd
            .execute(Box::new(MemReader::new(Vec::new())), Box::new(out.clone()), env)
            .unwrap();
        (code, out.contents())
    }

    #[test]
    fn test_factory_ignores_other_names() {
        let env = Environment::new();
        assert!(Factory::<Touch>::default().try_create(&env, "Touch", &["x"]).is_none());
        assert!(Factory::<Touch>::default().try_create(&env, "tou", &["x"]).is_none());
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let (dir, mut env) = scratch_env();
        let (code, out) = run(Pwd, &mut env);
        assert_eq!(code, 0);
        assert_eq!(out, format!("Current directory: {}\n", dir.path().display()));
    }

    #[test]
    fn test_echo_leaves_a_trailing_space() {
        let mut env = Environment::new();
        let (_, out) = dispatch::<Echo>(&["a", "b", "c"], &mut env);
        assert_eq!(out, "a b c \n");
        let (_, out) = dispatch::<Echo>(&[], &mut env);
        assert_eq!(out, "\n");
    }

    #[test]
    fn test_touch_creates_and_truncates() {
        let (dir, mut env) = scratch_env();
        let path = dir.path().join("f.txt");
        fs::write(&path, "old content").unwrap();

        let (code, _) = dispatch::<Touch>(&["f.txt"], &mut env);
        assert_eq!(code, 0);
        assert_eq!(fs::read(&path).unwrap(), b"");

        dispatch::<Touch>(&["new.txt"], &mut env);
        assert!(dir.path().join("new.txt").exists());
    }

    #[test]
    fn test_touch_without_argument_does_nothing() {
        let (dir, mut env) = scratch_env();
        let (code, out) = dispatch::<Touch>(&[], &mut env);
        assert_eq!(code, 2);
        assert_eq!(out, "Usage: touch <filename>\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_too_many_arguments_print_usage() {
        let (dir, mut env) = scratch_env();
        let (code, out) = dispatch::<Mv>(&["a", "b", "c"], &mut env);
        assert_eq!(code, 2);
        assert_eq!(out, "Usage: mv <source> <destination>\n");
        let (_, out) = dispatch::<Ls>(&["a", "b"], &mut env);
        assert_eq!(out, "Usage: ls [directory]\n");
        let (_, out) = dispatch::<Cmp>(&["a"], &mut env);
        assert_eq!(out, "Usage: cmp <file1> <file2>\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_cat_reads_file() {
        let (dir, mut env) = scratch_env();
        fs::write(dir.path().join("f"), "hello\nworld\n").unwrap();
        let (code, out) = run(Cat { path: "f".into() }, &mut env);
        assert_eq!(code, 0);
        assert_eq!(out, "hello\nworld\n");
    }

    #[test]
    fn test_cat_dash_reads_stdin() {
        let mut env = Environment::new();
        let mut out = Vec::new();
        let input = b"from stdin\nline2\n".to_vec();
        let code = Cat { path: "-".into() }
            .execute(&mut Cursor::new(input), &mut out, &mut env)
            .unwrap();
        assert_eq!(code, 0);
        assert_eq!(String::from_utf8(out).unwrap(), "from stdin\nline2\n");
    }

    #[test]
    fn test_cat_missing_file_reports_error() {
        let (_dir, mut env) = scratch_env();
        let (code, out) = dispatch::<Cat>(&["missing.txt"], &mut env);
        assert_eq!(code, 1);
        assert!(out.starts_with("cat: missing.txt: "), "got {out:?}");
    }

    #[test]
    fn test_rm_removes_file_and_empty_dir() {
        let (dir, mut env) = scratch_env();
        fs::write(dir.path().join("f"), "x").unwrap();
        fs::create_dir(dir.path().join("d")).unwrap();

        assert_eq!(dispatch::<Rm>(&["f"], &mut env).0, 0);
        assert_eq!(dispatch::<Rm>(&["d"], &mut env).0, 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

        let (code, out) = dispatch::<Rm>(&["f"], &mut env);
        assert_eq!(code, 1);
        assert!(out.starts_with("rm: f"));
    }

    #[test]
    fn test_ls_lists_entries() {
        let (dir, mut env) = scratch_env();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let (code, out) = dispatch::<Ls>(&[], &mut env);
        assert_eq!(code, 0);
        let mut names: Vec<&str> = out.lines().collect();
        assert_eq!(&names[..2], [".", ".."]);
        names.sort();
        assert_eq!(names, [".", "..", "a.txt", "sub"]);

        let (_, out) = dispatch::<Ls>(&["sub"], &mut env);
        assert_eq!(out, ".\n..\n");
    }

    #[test]
    fn test_ls_missing_directory() {
        let (_dir, mut env) = scratch_env();
        let (code, out) = dispatch::<Ls>(&["nope"], &mut env);
        assert_eq!(code, 1);
        assert!(out.starts_with("ls: nope"));
    }

    #[test]
    fn test_mkdir_and_mv() {
        let (dir, mut env) = scratch_env();
        assert_eq!(dispatch::<Mkdir>(&["d"], &mut env).0, 0);
        assert!(dir.path().join("d").is_dir());
        assert_eq!(dispatch::<Mkdir>(&["d"], &mut env).0, 1);

        fs::write(dir.path().join("a"), "payload").unwrap();
        assert_eq!(dispatch::<Mv>(&["a", "d/b"], &mut env).0, 0);
        assert!(!dir.path().join("a").exists());
        assert_eq!(fs::read_to_string(dir.path().join("d/b")).unwrap(), "payload");
    }

    #[test]
    fn test_sort_and_uniq_files() {
        let (dir, mut env) = scratch_env();
        fs::write(dir.path().join("fruit"), "banana\napple\ncherry\n").unwrap();
        fs::write(dir.path().join("dups"), "a\na\nb\na\n").unwrap();

        let (_, out) = dispatch::<Sort>(&["fruit"], &mut env);
        assert_eq!(out, "apple\nbanana\ncherry\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("fruit")).unwrap(),
            "banana\napple\ncherry\n"
        );

        let (_, out) = dispatch::<Uniq>(&["dups"], &mut env);
        assert_eq!(out, "a\nb\na\n");
    }

    #[test]
    fn test_more_quits_on_q() {
        let (dir, mut env) = scratch_env();
        let text: String = (1..=15).map(|i| format!("{i}\n")).collect();
        fs::write(dir.path().join("long"), text).unwrap();

        let out = MemWriter::new();
        let cmd = Factory::<More>::default()
            .try_create(&env, "more", &["long"])
            .unwrap();
        cmd.execute(Box::new(MemReader::new("q\n")), Box::new(out.clone()), &mut env)
            .unwrap();
        let shown = out.contents();
        assert!(shown.ends_with("10\n--More--\n"));
        assert!(!shown.contains("11"));
    }

    #[test]
    fn test_more_uses_configured_page_size() {
        let (dir, mut env) = scratch_env();
        env.config.page_lines = 2;
        fs::write(dir.path().join("f"), "1\n2\n3\n").unwrap();
        let mut out = Vec::new();
        More { path: "f".into() }
            .execute(&mut Cursor::new(b"\n".to_vec()), &mut out, &mut env)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1\n2\n--More--3\n");
    }

    #[test]
    fn test_cmp_messages() {
        let (dir, mut env) = scratch_env();
        fs::write(dir.path().join("a"), "hello world").unwrap();
        fs::write(dir.path().join("b"), "hello world").unwrap();
        fs::write(dir.path().join("c"), "hellX world").unwrap();
        fs::write(dir.path().join("d"), "hello").unwrap();

        let (code, out) = dispatch::<Cmp>(&["a", "b"], &mut env);
        assert_eq!((code, out.as_str()), (0, "Files a and b are identical.\n"));
        let (code, out) = dispatch::<Cmp>(&["a", "c"], &mut env);
        assert_eq!((code, out.as_str()), (1, "a c differ: byte 5\n"));
        let (_, out) = dispatch::<Cmp>(&["d", "a"], &mut env);
        assert_eq!(out, "d a differ: byte 6\n");
    }

    #[test]
    fn test_cmp_missing_second_file() {
        let (dir, mut env) = scratch_env();
        fs::write(dir.path().join("a"), "x").unwrap();
        let (code, out) = dispatch::<Cmp>(&["a", "zzz"], &mut env);
        assert_eq!(code, 1);
        assert!(out.starts_with("cmp: zzz"));
    }

    #[test]
    fn test_history_lists_entries_one_indexed() {
        let mut env = Environment::new();
        env.history.push("ls");
        env.history.push("pwd");
        env.history.push("history");
        let (_, out) = run(History, &mut env);
        assert_eq!(out, "Command history:\n1. ls\n2. pwd\n3. history\n");
    }

    #[test]
    fn test_exit_sets_flag() {
        let mut env = Environment::new();
        let (code, out) = dispatch::<Exit>(&["ignored"], &mut env);
        assert_eq!((code, out.as_str()), (0, ""));
        assert!(env.should_exit);
    }

    #[test]
    fn test_kill_rejects_bad_pids() {
        let mut env = Environment::new();
        for bad in ["abc", "0", "-1"] {
            let (code, out) = dispatch::<Kill>(&[bad], &mut env);
            assert_eq!(code, 1);
            assert_eq!(out, format!("kill: invalid pid: {bad}\n"));
        }
    }

    #[test]
    fn test_kill_terminates_child() {
        let mut env = Environment::new();
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        let pid = child.id().to_string();
        let (code, out) = dispatch::<Kill>(&[pid.as_str()], &mut env);
        assert_eq!(code, 0);
        assert_eq!(out, format!("Process with PID {pid} killed.\n"));
        let status = child.wait().unwrap();
        assert!(!status.success());
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_ps_prints_header_and_rows() {
        let mut env = Environment::new();
        let (code, out) = run(Ps, &mut env);
        assert_eq!(code, 0);
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some(procfs::header().as_str()));
        assert!(lines.next().is_some());
    }

    #[test]
    fn test_cal_rejects_three_arguments() {
        let mut env = Environment::new();
        let (code, out) = dispatch::<Cal>(&["1", "2", "3"], &mut env);
        assert_eq!(code, 2);
        assert_eq!(out, "Usage: cal [month] [year]\n");
    }

    #[test]
    fn test_missing_utility_is_reported() {
        let mut env = Environment::new();
        env.vars.clear();
        env.set_var("PATH", "/definitely/missing");
        let (code, out) = dispatch::<Who>(&[], &mut env);
        assert_eq!(code, 1);
        assert_eq!(out, "who: not available on this system\n");
    }
}
