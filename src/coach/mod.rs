//! The coach: conversation state on top of a chat backend.
//!
//! User messages and injected prompts share one conversation. Requests are
//! serialized so the history sent to the backend is always consistent, but
//! the conversation itself is only locked while it is read or updated, so
//! the history stays readable while a request is in flight.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};

use crate::chat::prompts::{REVIEW_PROMPT, SYSTEM_PROMPT};
use crate::chat::{ChatBackend, ChatError, ChatMessage, Conversation};
use crate::speech::SpeechCapability;
use crate::types::{SessionState, TimerSnapshot};

/// Prefixes (lowercase) that mark a message as "my task is finished".
const DONE_PREFIXES: &[&str] = &["我做完", "i'm done", "i’m done", "i am done", "im done"];

/// Returns true if the text says the user finished their task.
pub fn is_done_phrase(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    let text = text.trim_end_matches(['!', '.', '！', '。']);
    text == "done" || DONE_PREFIXES.iter().any(|prefix| text.starts_with(prefix))
}

pub struct Coach {
    backend: Arc<dyn ChatBackend>,
    speech: Arc<dyn SpeechCapability>,
    conversation: Mutex<Conversation>,
    /// Held for a whole request/reply exchange.
    send_lock: Mutex<()>,
    timer: watch::Receiver<TimerSnapshot>,
}

impl Coach {
    /// Creates a coach that reads the timer state from `timer`.
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        speech: Arc<dyn SpeechCapability>,
        timer: watch::Receiver<TimerSnapshot>,
    ) -> Self {
        Self {
            backend,
            speech,
            conversation: Mutex::new(Conversation::new()),
            send_lock: Mutex::new(()),
            timer,
        }
    }

    /// Handles a message typed or spoken by the user.
    ///
    /// A "done" message during a focus session is replaced by the review
    /// prompt.
    ///
    /// # Errors
    ///
    /// Returns `EmptyMessage` for blank input, or the backend error.
    pub async fn handle_user_message(&self, text: &str) -> Result<ChatMessage, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let state = self.timer.borrow().state;
        if state == SessionState::Focus && is_done_phrase(text) {
            info!("Task finished during focus, asking for a review");
            return self.send_prompt(REVIEW_PROMPT).await;
        }

        self.send_prompt(text).await
    }

    /// Sends a prompt as a user message and returns the reply.
    ///
    /// On failure the prompt is removed from the history.
    pub async fn send_prompt(&self, prompt: &str) -> Result<ChatMessage, ChatError> {
        let _exchange = self.send_lock.lock().await;

        let request = {
            let mut conversation = self.conversation.lock().await;
            if conversation.ensure_system_prompt(SYSTEM_PROMPT) {
                debug!("Conversation started with the system prompt");
            }
            conversation.push(ChatMessage::user(prompt));
            conversation.messages().to_vec()
        };

        // The conversation is unlocked while waiting on the backend
        let result = self.backend.complete(&request).await;

        let reply = {
            let mut conversation = self.conversation.lock().await;
            match result {
                Ok(reply) => {
                    conversation.push(reply.clone());
                    reply
                }
                Err(e) => {
                    conversation.rollback_user();
                    warn!(error = %e, "Chat request failed");
                    return Err(e);
                }
            }
        };

        if let Err(e) = self.speech.speak(&reply.content).await {
            if e.is_unsupported() {
                debug!("Speech unsupported, reply not spoken");
            } else {
                warn!(error = %e, "Failed to speak reply");
            }
        }

        Ok(reply)
    }

    /// Conversation without the system prompt.
    pub async fn history(&self) -> Vec<ChatMessage> {
        self.conversation.lock().await.visible()
    }

    /// Listens for one spoken message and handles it.
    pub async fn listen(&self) -> anyhow::Result<(String, ChatMessage)> {
        let transcript = self.speech.listen().await?;
        info!(%transcript, "Heard");
        let reply = self.handle_user_message(&transcript).await?;
        Ok((transcript, reply))
    }

    /// Sends injected prompts in order until the channel closes.
    pub async fn run_prompt_queue(&self, mut prompts: mpsc::UnboundedReceiver<String>) {
        while let Some(prompt) = prompts.recv().await {
            match self.send_prompt(&prompt).await {
                Ok(reply) => info!(reply = %reply.content, "Coach suggestion"),
                Err(e) => warn!(error = %e, "Injected prompt failed"),
            }
        }
        debug!("Prompt queue closed");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{MockChatBackend, Role};
    use crate::speech::{MockSpeech, UnsupportedSpeech};
    use async_trait::async_trait;
    use tokio::sync::Notify;
    use tokio::time::{timeout, Duration};

    fn create_coach(
        state: SessionState,
    ) -> (
        Coach,
        Arc<MockChatBackend>,
        Arc<MockSpeech>,
        watch::Sender<TimerSnapshot>,
    ) {
        let backend = Arc::new(MockChatBackend::new());
        let speech = Arc::new(MockSpeech::new());
        let (tx, rx) = watch::channel(TimerSnapshot {
            state,
            remaining: 100,
        });
        let coach = Coach::new(backend.clone(), speech.clone(), rx);
        (coach, backend, speech, tx)
    }

    /// Backend that answers only after `release` is notified.
    struct GatedBackend {
        release: Notify,
    }

    #[async_trait]
    impl ChatBackend for GatedBackend {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatMessage, ChatError> {
            self.release.notified().await;
            let last = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
            Ok(ChatMessage::assistant(format!("late: {last}")))
        }
    }

    // ------------------------------------------------------------------------
    // Done Phrase Tests
    // ------------------------------------------------------------------------

    mod done_phrase_tests {
        use super::*;

        #[test]
        fn test_done_phrases() {
            assert!(is_done_phrase("我做完了"));
            assert!(is_done_phrase("I'm done with chapter 3"));
            assert!(is_done_phrase("i am done"));
            assert!(is_done_phrase("  DONE! "));
        }

        #[test]
        fn test_not_done_phrases() {
            assert!(!is_done_phrase("what is done in rust?"));
            assert!(!is_done_phrase("almost done"));
            assert!(!is_done_phrase(""));
        }
    }

    // ------------------------------------------------------------------------
    // Coach Tests
    // ------------------------------------------------------------------------

    mod coach_tests {
        use super::*;

        #[tokio::test]
        async fn test_empty_message_rejected() {
            let (coach, backend, _speech, _tx) = create_coach(SessionState::Idle);

            let result = coach.handle_user_message("   ").await;

            assert!(matches!(result, Err(ChatError::EmptyMessage)));
            assert_eq!(backend.request_count(), 0);
        }

        #[tokio::test]
        async fn test_system_prompt_sent_once() {
            let (coach, backend, _speech, _tx) = create_coach(SessionState::Idle);

            coach.handle_user_message("hello").await.unwrap();
            coach.handle_user_message("again").await.unwrap();

            let requests = backend.requests();
            assert_eq!(requests[0][0], ChatMessage::system(SYSTEM_PROMPT));
            assert_eq!(requests[0].len(), 2);
            assert_eq!(requests[1].len(), 4);
            assert_eq!(
                requests[1]
                    .iter()
                    .filter(|m| m.role == Role::System)
                    .count(),
                1
            );
        }

        #[tokio::test]
        async fn test_reply_is_recorded_and_spoken() {
            let (coach, backend, speech, _tx) = create_coach(SessionState::Idle);
            backend.push_reply("Stretch your arms.");

            let reply = coach.handle_user_message("hi").await.unwrap();

            assert_eq!(reply, ChatMessage::assistant("Stretch your arms."));
            assert_eq!(speech.spoken(), vec!["Stretch your arms.".to_string()]);
            assert_eq!(
                coach.history().await,
                vec![
                    ChatMessage::user("hi"),
                    ChatMessage::assistant("Stretch your arms.")
                ]
            );
        }

        #[tokio::test]
        async fn test_done_during_focus_sends_review_prompt() {
            let (coach, backend, _speech, _tx) = create_coach(SessionState::Focus);

            coach.handle_user_message("我做完了").await.unwrap();

            let request = backend.requests().pop().unwrap();
            assert_eq!(request.last().unwrap(), &ChatMessage::user(REVIEW_PROMPT));
        }

        #[tokio::test]
        async fn test_done_outside_focus_is_sent_verbatim() {
            let (coach, backend, _speech, tx) = create_coach(SessionState::Idle);

            coach.handle_user_message("I'm done").await.unwrap();
            tx.send_replace(TimerSnapshot {
                state: SessionState::Break,
                remaining: 10,
            });
            coach.handle_user_message("done").await.unwrap();

            let requests = backend.requests();
            assert_eq!(requests[0].last().unwrap(), &ChatMessage::user("I'm done"));
            assert_eq!(requests[1].last().unwrap(), &ChatMessage::user("done"));
        }

        #[tokio::test]
        async fn test_failure_rolls_back_user_message() {
            let (coach, backend, speech, _tx) = create_coach(SessionState::Idle);
            coach.handle_user_message("first").await.unwrap();
            backend.set_should_fail(true);

            let result = coach.handle_user_message("second").await;

            assert!(result.is_err());
            assert_eq!(coach.history().await.len(), 2);
            assert_eq!(speech.spoken().len(), 1);

            backend.set_should_fail(false);
            coach.handle_user_message("third").await.unwrap();
            let last_request = backend.requests().pop().unwrap();
            assert!(!last_request.contains(&ChatMessage::user("second")));
        }

        #[tokio::test]
        async fn test_failure_on_first_message_keeps_system_prompt_only() {
            let (coach, backend, _speech, _tx) = create_coach(SessionState::Idle);
            backend.set_should_fail(true);

            assert!(coach.handle_user_message("hi").await.is_err());
            backend.set_should_fail(false);
            coach.handle_user_message("hi").await.unwrap();

            let request = backend.requests().pop().unwrap();
            assert_eq!(
                request,
                vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user("hi")]
            );
        }

        #[tokio::test]
        async fn test_speech_failure_is_not_fatal() {
            let (coach, _backend, speech, _tx) = create_coach(SessionState::Idle);
            speech.set_should_fail(true);

            assert!(coach.handle_user_message("hi").await.is_ok());
        }

        #[tokio::test]
        async fn test_unsupported_speech_is_not_fatal() {
            let (_tx, rx) = watch::channel(TimerSnapshot {
                state: SessionState::Idle,
                remaining: 0,
            });
            let coach = Coach::new(
                Arc::new(MockChatBackend::new()),
                Arc::new(UnsupportedSpeech),
                rx,
            );

            assert!(coach.handle_user_message("hi").await.is_ok());
        }

        #[tokio::test]
        async fn test_listen_feeds_transcript() {
            let (coach, backend, speech, _tx) = create_coach(SessionState::Focus);
            speech.push_transcript("I'm done");

            let (transcript, _reply) = coach.listen().await.unwrap();

            assert_eq!(transcript, "I'm done");
            let request = backend.requests().pop().unwrap();
            assert_eq!(request.last().unwrap(), &ChatMessage::user(REVIEW_PROMPT));
        }

        #[tokio::test]
        async fn test_prompt_queue_in_order() {
            let (coach, backend, _speech, _tx) = create_coach(SessionState::Break);
            let (tx, rx) = mpsc::unbounded_channel();
            tx.send("one".to_string()).unwrap();
            tx.send("two".to_string()).unwrap();
            drop(tx);

            coach.run_prompt_queue(rx).await;

            let history = coach.history().await;
            assert_eq!(history[0], ChatMessage::user("one"));
            assert_eq!(history[2], ChatMessage::user("two"));
            assert_eq!(backend.request_count(), 2);
        }

        #[tokio::test]
        async fn test_history_readable_while_reply_pending() {
            let backend = Arc::new(GatedBackend {
                release: Notify::new(),
            });
            let (_tx, rx) = watch::channel(TimerSnapshot {
                state: SessionState::Idle,
                remaining: 100,
            });
            let coach = Arc::new(Coach::new(
                backend.clone(),
                Arc::new(MockSpeech::new()),
                rx,
            ));

            let pending = {
                let coach = coach.clone();
                tokio::spawn(async move { coach.handle_user_message("slow one").await })
            };
            tokio::task::yield_now().await;

            let history = timeout(Duration::from_millis(200), coach.history())
                .await
                .expect("history blocked by a pending chat request");
            assert_eq!(history, vec![ChatMessage::user("slow one")]);

            backend.release.notify_one();
            let reply = pending.await.unwrap().unwrap();
            assert_eq!(reply.content, "late: slow one");
            assert_eq!(coach.history().await.len(), 2);
        }

        #[tokio::test]
        async fn test_concurrent_prompts_are_serialized() {
            let backend = Arc::new(GatedBackend {
                release: Notify::new(),
            });
            let (_tx, rx) = watch::channel(TimerSnapshot {
                state: SessionState::Break,
                remaining: 100,
            });
            let coach = Arc::new(Coach::new(
                backend.clone(),
                Arc::new(MockSpeech::new()),
                rx,
            ));

            let first = {
                let coach = coach.clone();
                tokio::spawn(async move { coach.send_prompt("first").await })
            };
            tokio::task::yield_now().await;
            let second = {
                let coach = coach.clone();
                tokio::spawn(async move { coach.send_prompt("second").await })
            };
            tokio::task::yield_now().await;

            // The second prompt waits for the first exchange to finish
            assert_eq!(coach.history().await, vec![ChatMessage::user("first")]);

            backend.release.notify_one();
            first.await.unwrap().unwrap();
            backend.release.notify_one();
            second.await.unwrap().unwrap();

            assert_eq!(
                coach.history().await,
                vec![
                    ChatMessage::user("first"),
                    ChatMessage::assistant("late: first"),
                    ChatMessage::user("second"),
                    ChatMessage::assistant("late: second"),
                ]
            );
        }
    }
}
