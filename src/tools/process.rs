use crate::error::{Result, SuiteError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Captured output of a successful tool run
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// An external command line, built up before being run
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            envs: Vec::new(),
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

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn get_envs(&self) -> &[(OsString, OsString)] {
        &self.envs
    }

    /// Space-joined command line, for logs and error messages
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|s| s.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion, failing on non-zero exit or when `timeout` elapses
    ///
    /// The child is killed if the deadline passes or the returned future is
    /// dropped before it finishes.
    pub async fn run(&self, timeout: Option<Duration>) -> Result<ToolOutput> {
        let program = self.display();
        debug!("Running: {}", program);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| SuiteError::ExternalProcessFailure {
            program: program.clone(),
            status: "spawn failed".to_string(),
            output: e.to_string(),
        })?;

        let wait = child.wait_with_output();
        let result = match timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(SuiteError::Timeout {
                        program,
                        after: limit,
                    })
                }
            },
            None => wait.await,
        };

        let output = result.map_err(|e| SuiteError::ExternalProcessFailure {
            program: program.clone(),
            status: "wait failed".to_string(),
            output: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let status = output
                .status
                .code()
                .map_or_else(|| "terminated by signal".to_string(), |c| c.to_string());
            return Err(SuiteError::ExternalProcessFailure {
                program,
                status,
                output: join_output(&stdout, &stderr),
            });
        }

        info!("Finished: {}", program);

        Ok(ToolOutput { stdout, stderr })
    }
}

fn join_output(stdout: &str, stderr: &str) -> String {
    match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (true, _) => stderr.to_string(),
        (false, true) => stdout.to_string(),
        (false, false) => format!("{stdout}\n{stderr}"),
    }
}
