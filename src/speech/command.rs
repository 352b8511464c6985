//! Speech backed by external programs.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use super::error::SpeechError;
use super::SpeechCapability;

/// Default time allowed for one recognition run.
pub const DEFAULT_LISTEN_TIMEOUT: Duration = Duration::from_secs(15);

/// A program and its leading arguments, split from a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(String::from);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).kill_on_drop(true);
        command
    }
}

/// Speech through a synthesizer program (e.g. `say`, `espeak-ng`) and a
/// recognizer program that prints the transcript on stdout.
///
/// Only one utterance plays at a time: starting a new one kills the
/// previous synthesizer process.
#[derive(Debug)]
pub struct CommandSpeech {
    synthesizer: Option<CommandLine>,
    voice: Option<String>,
    recognizer: Option<CommandLine>,
    listen_timeout: Duration,
    current: Mutex<Option<Child>>,
}

impl CommandSpeech {
    /// Creates speech from optional synthesizer and recognizer command lines.
    pub fn new(speak_cmd: Option<&str>, listen_cmd: Option<&str>) -> Self {
        Self {
            synthesizer: speak_cmd.and_then(CommandLine::parse),
            voice: None,
            recognizer: listen_cmd.and_then(CommandLine::parse),
            listen_timeout: DEFAULT_LISTEN_TIMEOUT,
            current: Mutex::new(None),
        }
    }

    /// Passes `-v <voice>` to the synthesizer.
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn with_listen_timeout(mut self, timeout: Duration) -> Self {
        self.listen_timeout = timeout;
        self
    }

    /// Returns true while an utterance is still playing.
    ///
    /// A finished utterance is reaped and forgotten.
    pub async fn is_speaking(&self) -> bool {
        let mut current = self.current.lock().await;
        let Some(child) = current.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                tracing::debug!(%status, "Utterance finished");
                *current = None;
                false
            }
            Err(e) => {
                tracing::debug!(error = %e, "Lost track of utterance");
                *current = None;
                false
            }
        }
    }

    /// Stops the utterance in progress, if any.
    pub async fn cancel(&self) {
        let mut current = self.current.lock().await;
        if let Some(mut child) = current.take() {
            if child.start_kill().is_ok() {
                let _ = child.wait().await;
                tracing::debug!("Previous utterance cancelled");
            }
        }
    }
}

#[async_trait]
impl SpeechCapability for CommandSpeech {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let synthesizer = self.synthesizer.as_ref().ok_or(SpeechError::Unsupported)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        self.cancel().await;

        let mut command = synthesizer.command();
        if let Some(voice) = &self.voice {
            command.arg("-v").arg(voice);
        }
        let child = command
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SpeechError::Failed(format!("{}: {e}", synthesizer.program)))?;

        tracing::debug!(chars = text.chars().count(), "Speaking");
        *self.current.lock().await = Some(child);
        Ok(())
    }

    async fn listen(&self) -> Result<String, SpeechError> {
        let recognizer = self.recognizer.as_ref().ok_or(SpeechError::Unsupported)?;

        let mut command = recognizer.command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = tokio::time::timeout(self.listen_timeout, command.output())
            .await
            .map_err(|_| SpeechError::Timeout)?
            .map_err(|e| SpeechError::Failed(format!("{}: {e}", recognizer.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(SpeechError::Failed(if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            }));
        }

        let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if transcript.is_empty() {
            return Err(SpeechError::NoMatch);
        }
        Ok(transcript)
    }

    fn is_supported(&self) -> bool {
        self.synthesizer.is_some() || self.recognizer.is_some()
    }
}
