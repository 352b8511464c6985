//! Speech synthesis and recognition.
//!
//! The coach speaks replies through a [`SpeechCapability`]. Environments
//! without speech use [`UnsupportedSpeech`], which fails every call with
//! [`SpeechError::Unsupported`]. Callers treat speech failures as
//! non-fatal.

mod command;
pub mod error;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

pub use self::command::{CommandSpeech, DEFAULT_LISTEN_TIMEOUT};
pub use self::error::SpeechError;

/// Speak text aloud and listen for a spoken transcript.
#[async_trait]
pub trait SpeechCapability: Send + Sync {
    /// Starts speaking `text`, replacing any utterance in progress.
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;

    /// Listens for one utterance and returns its transcript.
    async fn listen(&self) -> Result<String, SpeechError>;

    fn is_supported(&self) -> bool;
}

/// Speech for environments without any speech support.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedSpeech;

#[async_trait]
impl SpeechCapability for UnsupportedSpeech {
    async fn speak(&self, _text: &str) -> Result<(), SpeechError> {
        Err(SpeechError::Unsupported)
    }

    async fn listen(&self) -> Result<String, SpeechError> {
        Err(SpeechError::Unsupported)
    }

    fn is_supported(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
pub struct MockSpeech {
    spoken: Mutex<Vec<String>>,
    transcripts: Mutex<VecDeque<String>>,
    should_fail: AtomicBool,
}

impl MockSpeech {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_transcript(&self, transcript: impl Into<String>) {
        lock(&self.transcripts).push_back(transcript.into());
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        lock(&self.spoken).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl SpeechCapability for MockSpeech {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SpeechError::Failed("Mock failure".to_string()));
        }
        lock(&self.spoken).push(text.to_string());
        Ok(())
    }

    async fn listen(&self) -> Result<String, SpeechError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SpeechError::Failed("Mock failure".to_string()));
        }
        lock(&self.transcripts)
            .pop_front()
            .ok_or(SpeechError::NoMatch)
    }

    fn is_supported(&self) -> bool {
        true
    }
}
