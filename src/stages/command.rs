// src/stages/command.rs

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::pipeline::{FileItem, Stage, StageError};

/// Pipe each item through an external shell command (stdin to stdout).
///
/// Used for the optional transpile step. With no command configured the
/// stage passes items through unchanged. A command that cannot be spawned
/// or exits non-zero is fatal for the run: every later item would fail the
/// same way.
#[derive(Debug, Clone)]
pub struct CommandStage {
    name: String,
    cmd: Option<String>,
}

impl CommandStage {
    pub fn new(name: impl Into<String>, cmd: Option<String>) -> Self {
        Self {
            name: name.into(),
            cmd,
        }
    }

    pub fn command(&self) -> Option<&str> {
        self.cmd.as_deref()
    }

    /// Run `cmd` with `input` on stdin and return its stdout.
    pub fn run_command(cmd: &str, input: &[u8]) -> Result<Vec<u8>> {
        // Build a shell command appropriate for the platform.
        let mut command = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(cmd);
            c
        };

        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .with_context(|| format!("spawning `{cmd}`"))?;

        // Feed stdin from a separate thread so a chatty child cannot
        // deadlock against a full stdout pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = input.to_vec();
            std::thread::spawn(move || stdin.write_all(&input))
        });

        let output = child
            .wait_with_output()
            .with_context(|| format!("waiting for `{cmd}`"))?;

        let written = writer.map(|w| w.join());

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            debug!(cmd = %cmd, "stderr: {}", line);
        }

        // A child that exits early closes stdin; report its status first.
        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            bail!("`{cmd}` exited with code {code}: {}", stderr.trim());
        }

        match written {
            Some(Ok(res)) => res.with_context(|| format!("writing stdin of `{cmd}`"))?,
            Some(Err(_)) => bail!("stdin writer for `{cmd}` panicked"),
            None => {}
        }

        Ok(output.stdout)
    }
}

impl Stage for CommandStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, mut item: FileItem) -> Result<Vec<FileItem>, StageError> {
        let Some(cmd) = &self.cmd else {
            return Ok(vec![item]);
        };

        info!(stage = %self.name, path = ?item.origin, cmd = %cmd, "running external command");
        item.contents = Self::run_command(cmd, &item.contents)
            .with_context(|| format!("processing {:?}", item.origin))
            .map_err(|cause| StageError::fatal(&self.name, cause))?;
        Ok(vec![item])
    }
}
