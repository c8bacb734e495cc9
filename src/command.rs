//! External command plumbing.
//!
//! Every collaborator (keytool, certutil, reg, the Windows certificate
//! wizards) is reached through [`CommandRunner`], so a run can be replayed
//! against a scripted runner in tests.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

use crate::error::{KeygenError, Result};

/// A program plus its already-separated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Arguments are passed to the program exactly as written, without quoting
    pub verbatim: bool,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            verbatim: false,
        }
    }

    pub fn verbatim(mut self) -> Self {
        self.verbatim = true;
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    /// Value following `flag`, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Bare file name of the program, e.g. `keytool` for `C:\jre\bin\keytool.exe`.
    pub fn program_name(&self) -> String {
        self.program
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}

fn is_password_flag(arg: &str) -> bool {
    arg.starts_with('-') && arg.ends_with("pass")
}

/// Log form of the command line. Password values are masked.
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.program.display())?;
        let mut masked = false;
        for arg in &self.args {
            if masked {
                f.write_str(" ****")?;
            } else if !self.verbatim && (arg.is_empty() || arg.contains(char::is_whitespace)) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
            masked = is_password_flag(arg);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
}

pub trait CommandRunner {
    /// Run to completion. `Err` means the program could not be started at all.
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput>;
}

/// Runs commands on the host, blocking until they exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        debug!("Executing {}", invocation);
        let mut command = Command::new(&invocation.program);
        add_args(&mut command, invocation);
        let output = command.output()?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

#[cfg(windows)]
fn add_args(command: &mut Command, invocation: &Invocation) {
    use std::os::windows::process::CommandExt;

    if invocation.verbatim {
        for arg in &invocation.args {
            command.raw_arg(arg);
        }
    } else {
        command.args(&invocation.args);
    }
}

#[cfg(not(windows))]
fn add_args(command: &mut Command, invocation: &Invocation) {
    command.args(&invocation.args);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    Failed,
    Skipped,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Success => "[success]",
            Self::Failed => "[failed]",
            Self::Skipped => "[skipped]",
        };
        f.write_str(tag)
    }
}

/// Log a progress line for a step.
pub fn report(outcome: StepOutcome, message: impl fmt::Display) {
    match outcome {
        StepOutcome::Failed => warn!(" - {} {}", outcome, message),
        _ => info!(" - {} {}", outcome, message),
    }
}

/// Run a step and require a zero exit status.
pub fn exec_step(runner: &dyn CommandRunner, invocation: &Invocation, step: &str) -> Result<()> {
    match runner.run(invocation) {
        Ok(output) if output.success => {
            report(StepOutcome::Success, step);
            Ok(())
        }
        Ok(_) => {
            report(StepOutcome::Failed, step);
            Err(KeygenError::tool_failed(step, "non-zero exit status"))
        }
        Err(e) => {
            report(
                StepOutcome::Failed,
                format!("Error executing {}", invocation),
            );
            Err(KeygenError::tool_failed(step, e.to_string()))
        }
    }
}
