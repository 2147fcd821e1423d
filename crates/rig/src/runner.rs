use crate::error::{Error, Result};
use log::{debug, error};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// How the child's standard streams are wired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stdio {
    /// Stream straight to the terminal
    Inherit,
    /// Collect stdout and stderr for parsing
    Capture,
}

/// A single external program call, run from the project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
    pub stdio: Stdio,
    /// Indices into `args` that are masked when displayed
    secrets: Vec<usize>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            stdio: Stdio::Inherit,
            secrets: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Pass an argument that must never show up in logs
    pub fn secret(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.secrets.push(self.args.len());
        self.arg(arg)
    }

    pub fn captured(mut self) -> Self {
        self.stdio = Stdio::Capture;
        self
    }

    /// Short name used in messages, e.g. `blender` for `/opt/blender/blender`
    pub fn tool_name(&self) -> String {
        self.program
            .file_stem()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }
}

fn quote(arg: &OsStr) -> String {
    let text = arg.to_string_lossy();
    if text.is_empty() || text.chars().any(|c| c.is_whitespace() || c == '"') {
        format!("\"{}\"", text.replace('"', "\\\""))
    } else {
        text.into_owned()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(self.program.as_os_str()))?;
        for (i, arg) in self.args.iter().enumerate() {
            if self.secrets.contains(&i) {
                write!(f, " ***")?;
            } else {
                write!(f, " {}", quote(arg))?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs external programs. Every pipeline step goes through this, so tests
/// can swap in a recording fake.
pub trait Runner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput>;

    /// Run and turn a non-zero exit into [`Error::ToolFailed`]
    fn execute(&self, invocation: &Invocation) -> Result<ToolOutput> {
        debug!("$ {invocation}");
        let output = self.run(invocation)?;

        if !output.success {
            let stderr = output.stderr.trim();
            if !stderr.is_empty() {
                error!("{}: {}", invocation.tool_name(), stderr);
            }
            return Err(Error::ToolFailed {
                tool: invocation.tool_name(),
                code: output.code,
            });
        }

        Ok(output)
    }
}

/// Spawns real processes with [`std::process::Command`]
pub struct SystemRunner;

impl SystemRunner {
    fn unavailable(invocation: &Invocation, err: io::Error) -> Error {
        if err.kind() == io::ErrorKind::NotFound {
            Error::ToolUnavailable {
                tool: invocation.tool_name(),
            }
        } else {
            Error::Io(err)
        }
    }
}

impl Runner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).current_dir(&invocation.cwd);

        match invocation.stdio {
            Stdio::Inherit => {
                let status = command
                    .status()
                    .map_err(|e| Self::unavailable(invocation, e))?;
                Ok(ToolOutput {
                    code: status.code(),
                    success: status.success(),
                    ..ToolOutput::default()
                })
            }
            Stdio::Capture => {
                let output = command
                    .output()
                    .map_err(|e| Self::unavailable(invocation, e))?;
                Ok(ToolOutput {
                    code: output.status.code(),
                    success: output.status.success(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
        }
    }
}

/// Resolve a configured tool path. Relative paths containing a separator are
/// taken from the project root and made absolute, since the child runs with
/// the project root as its working directory. Bare names are left for `PATH`
/// lookup.
pub fn resolve_tool(root: &Path, tool: &Path) -> PathBuf {
    if tool.is_relative() && tool.components().count() > 1 {
        let joined = root.join(tool);
        std::path::absolute(&joined).unwrap_or(joined)
    } else {
        tool.to_path_buf()
    }
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::cell::RefCell;

    type Handler = Box<dyn Fn(&Invocation) -> ToolOutput>;

    /// Records every invocation instead of spawning anything
    pub struct FakeRunner {
        calls: RefCell<Vec<Invocation>>,
        handler: Handler,
    }

    impl FakeRunner {
        /// Every call succeeds with empty output
        pub fn ok() -> Self {
            Self::with(|_| ToolOutput::succeeded(""))
        }

        pub fn with(handler: impl Fn(&Invocation) -> ToolOutput + 'static) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                handler: Box::new(handler),
            }
        }

        pub fn calls(&self) -> Vec<Invocation> {
            self.calls.borrow().clone()
        }

        /// The recorded calls rendered as command lines
        pub fn lines(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|c| c.to_string()).collect()
        }

        pub fn is_untouched(&self) -> bool {
            self.calls.borrow().is_empty()
        }
    }

    impl ToolOutput {
        pub fn succeeded(stdout: impl Into<String>) -> Self {
            Self {
                code: Some(0),
                success: true,
                stdout: stdout.into(),
                stderr: String::new(),
            }
        }

        pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
            Self {
                code: Some(code),
                success: false,
                stdout: String::new(),
                stderr: stderr.into(),
            }
        }
    }

    impl Runner for FakeRunner {
        fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
            self.calls.borrow_mut().push(invocation.clone());
            Ok((self.handler)(invocation))
        }
    }

    /// Value of the argument following `flag`, if any
    pub fn flag_value(invocation: &Invocation, flag: &str) -> Option<String> {
        invocation
            .args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| invocation.args.get(i + 1))
            .map(|a| a.to_string_lossy().into_owned())
    }
}
