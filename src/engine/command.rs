//! Cancellable execution of external tools

use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::errors::DomainError;

/// Output captured from a finished tool
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    /// stdout followed by stderr, lossily decoded
    pub fn combined(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&self.stderr));
        text
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.status.code()
    }
}

/// One invocation of an external program
#[derive(Debug, Clone)]
pub struct ToolCommand {
    tool: &'static str,
    program: OsString,
    args: Vec<OsString>,
    lower_priority: bool,
}

impl ToolCommand {
    /// `tool` names the program in errors; `program` is what gets executed
    pub fn new(tool: &'static str, program: impl AsRef<Path>) -> Self {
        Self {
            tool,
            program: program.as_ref().as_os_str().to_owned(),
            args: Vec::new(),
            lower_priority: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the child below normal scheduling priority
    pub fn lower_priority(mut self, lower: bool) -> Self {
        self.lower_priority = lower;
        self
    }

    pub fn tool(&self) -> &'static str {
        self.tool
    }

    /// Run to completion and capture output. The exit status is not checked.
    ///
    /// Cancelling `cancel` kills the child and returns [`DomainError::Cancelled`].
    pub async fn output(&self, cancel: &CancellationToken) -> Result<ToolOutput, DomainError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(tool = self.tool, args = ?self.args, "spawning tool");

        let child = command.spawn().map_err(|source| DomainError::ToolUnavailable {
            tool: self.tool,
            source,
        })?;

        if self.lower_priority {
            if let Some(pid) = child.id() {
                if let Err(e) = priority::lower(pid) {
                    warn!(tool = self.tool, pid, err = %e, "failed to lower process priority");
                }
            }
        }

        // Dropping the wait future drops the child, which kills it
        let output = tokio::select! {
            result = child.wait_with_output() => result?,
            _ = cancel.cancelled() => {
                debug!(tool = self.tool, "tool cancelled");
                return Err(DomainError::Cancelled);
            }
        };

        Ok(ToolOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    /// Run and fail unless the exit status is success
    pub async fn run(&self, cancel: &CancellationToken) -> Result<ToolOutput, DomainError> {
        let output = self.output(cancel).await?;
        if !output.status.success() {
            return Err(self.failure(&output));
        }
        Ok(output)
    }

    /// Error carrying the captured output of a failed run
    pub fn failure(&self, output: &ToolOutput) -> DomainError {
        DomainError::ToolFailed {
            tool: self.tool,
            status: output.status.to_string(),
            output: output.combined(),
        }
    }
}

#[cfg(windows)]
mod priority {
    use std::io;

    use winapi::um::handleapi::CloseHandle;
    use winapi::um::processthreadsapi::{OpenProcess, SetPriorityClass};
    use winapi::um::winbase::BELOW_NORMAL_PRIORITY_CLASS;
    use winapi::um::winnt::PROCESS_SET_INFORMATION;

    pub fn lower(pid: u32) -> io::Result<()> {
        // SAFETY: the handle is checked for null and closed before returning
        unsafe {
            let handle = OpenProcess(PROCESS_SET_INFORMATION, 0, pid);
            if handle.is_null() {
                return Err(io::Error::last_os_error());
            }
            let ok = SetPriorityClass(handle, BELOW_NORMAL_PRIORITY_CLASS);
            let result = if ok == 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(())
            };
            CloseHandle(handle);
            result
        }
    }
}

#[cfg(not(windows))]
mod priority {
    use std::io;

    pub fn lower(pid: u32) -> io::Result<()> {
        tracing::info!(pid, "lowering process priority is only supported on Windows");
        Ok(())
    }
}
