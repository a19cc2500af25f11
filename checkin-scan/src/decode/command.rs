//! Decode source backed by an external decoder process
//!
//! Runs a command such as `zbarcam --raw --nodisplay /dev/video2` that prints
//! one decoded payload per stdout line. The process holds the camera, so
//! stopping the source kills it. Commands are tried in order: the first is
//! the preferred (rear-facing) device, later entries are fallbacks for any
//! other device.

use super::{DecodeSink, DecodeSource};
use crate::error::DecoderError;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct CommandDecodeSource {
    commands: Vec<String>,
    running: Option<RunningDecoder>,
}

struct RunningDecoder {
    command: String,
    cancel: CancellationToken,
}

impl CommandDecodeSource {
    pub fn new(commands: Vec<String>) -> Self {
        Self {
            commands,
            running: None,
        }
    }

    /// Command line of the decoder currently running
    pub fn active_command(&self) -> Option<&str> {
        self.running.as_ref().map(|r| r.command.as_str())
    }

    fn spawn_command(command_line: &str) -> std::io::Result<Child> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty decoder command")
        })?;

        Command::new(program)
            .args(parts)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
    }
}

impl DecodeSource for CommandDecodeSource {
    fn start(&mut self, sink: DecodeSink) -> Result<(), DecoderError> {
        self.stop();

        if self.commands.is_empty() {
            return Err(DecoderError::CameraUnavailable(
                "no decoder commands configured".to_string(),
            ));
        }

        let mut last_error = String::new();
        for command_line in &self.commands {
            let mut child = match Self::spawn_command(command_line) {
                Ok(child) => child,
                Err(e) => {
                    warn!(command = %command_line, error = %e, "Decoder failed to start");
                    last_error = format!("{}: {}", command_line, e);
                    continue;
                }
            };

            let Some(stdout) = child.stdout.take() else {
                last_error = format!("{}: stdout not captured", command_line);
                continue;
            };

            info!(command = %command_line, epoch = sink.epoch(), "Decoder started");

            let cancel = CancellationToken::new();
            self.running = Some(RunningDecoder {
                command: command_line.clone(),
                cancel: cancel.clone(),
            });

            let command_label = command_line.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                loop {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            if let Err(e) = child.kill().await {
                                debug!(command = %command_label, error = %e, "Decoder gone");
                            }
                            break;
                        }
                        line = lines.next_line() => match line {
                            Ok(Some(text)) => {
                                if text.trim().is_empty() {
                                    continue;
                                }
                                if !sink.deliver(text).await {
                                    let _ = child.kill().await;
                                    break;
                                }
                            }
                            Ok(None) | Err(_) => {
                                let status = child.wait().await;
                                if !cancel.is_cancelled() {
                                    let detail = match status {
                                        Ok(status) => status.to_string(),
                                        Err(e) => e.to_string(),
                                    };
                                    warn!(command = %command_label, %detail, "Decoder exited");
                                    let message =
                                        format!("decoder '{}' exited: {}", command_label, detail);
                                    sink.fail(message).await;
                                }
                                break;
                            }
                        },
                    }
                }
            });

            return Ok(());
        }

        Err(DecoderError::CameraUnavailable(last_error))
    }

    fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            debug!(command = %running.command, "Stopping decoder");
            running.cancel.cancel();
        }
    }

    fn is_active(&self) -> bool {
        self.running.is_some()
    }
}

impl Drop for CommandDecodeSource {
    fn drop(&mut self) {
        self.stop();
    }
}
