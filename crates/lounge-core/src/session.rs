//! Chat session: the conversation plus the single in-flight request gate.
//!
//! Every input surface (typed text, sample questions, amenity shortcuts, the
//! nearby-lounges shortcut) goes through [`ChatSession::send_user_message`]
//! or its non-blocking half, [`ChatSession::begin_send`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::ai::CompletionBackend;
use crate::conversation::{ChatMessage, Conversation};
use crate::prompt::build_prompt;

/// Reply used when the completion task itself dies.
pub const INTERNAL_ERROR_REPLY: &str =
    "Sorry, I encountered an error while retrieving that information. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The question and exactly one reply were appended.
    Answered,
    /// Input was blank after trimming; nothing was appended.
    Empty,
    /// Another request is in flight; nothing was appended.
    Busy,
}

struct Inner {
    conversation: Mutex<Conversation>,
    busy: AtomicBool,
    backend: Arc<dyn CompletionBackend>,
    revision: watch::Sender<u64>,
}

impl Inner {
    fn notify(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }

    fn conversation(&self) -> MutexGuard<'_, Conversation> {
        self.conversation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn append_user_message(&self, content: &str) {
        self.conversation().append_user_message(content);
        self.notify();
    }

    fn append_assistant_message(&self, content: &str) {
        self.conversation().append_assistant_message(content);
        self.notify();
    }
}

/// Holds the busy gate; releasing happens on drop so no path can leave it set.
///
/// Owns its `Arc` so it can travel into the task that finishes the request.
struct BusyGuard {
    inner: Arc<Inner>,
}

impl BusyGuard {
    fn acquire(inner: &Arc<Inner>) -> Option<Self> {
        inner
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        inner.notify();
        Some(Self {
            inner: Arc::clone(inner),
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.inner.busy.store(false, Ordering::Release);
        self.inner.notify();
    }
}

/// Cheap to clone; all clones share one conversation and one gate.
#[derive(Clone)]
pub struct ChatSession {
    inner: Arc<Inner>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                conversation: Mutex::new(Conversation::new()),
                busy: AtomicBool::new(false),
                backend,
                revision,
            }),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::Acquire)
    }

    /// Snapshot of the transcript in display order.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.inner.conversation().messages().to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner.conversation().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.conversation().is_empty()
    }

    /// Receiver that changes whenever a message lands or the gate flips.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    pub fn append_user_message(&self, content: &str) {
        self.inner.append_user_message(content);
    }

    pub fn append_assistant_message(&self, content: &str) {
        self.inner.append_assistant_message(content);
    }

    /// Take the gate, append the question, and start the request.
    ///
    /// Everything up to the spawn happens synchronously, so a caller that gets
    /// `Ok` knows the question was accepted. The returned task owns the gate
    /// and appends the reply; dropping or aborting the caller changes nothing.
    /// Must be called from within a tokio runtime.
    pub fn begin_send(&self, text: &str) -> Result<JoinHandle<()>, SendOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SendOutcome::Empty);
        }

        let Some(gate) = BusyGuard::acquire(&self.inner) else {
            tracing::debug!("request already in flight, ignoring send");
            return Err(SendOutcome::Busy);
        };

        self.inner.append_user_message(text);

        let prompt = build_prompt(text);
        Ok(tokio::spawn(async move {
            let backend = Arc::clone(&gate.inner.backend);
            let reply = match tokio::spawn(async move { backend.complete(&prompt).await }).await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::error!(error = %e, "error getting response");
                    INTERNAL_ERROR_REPLY.to_string()
                }
            };

            gate.inner.append_assistant_message(&reply);
            drop(gate);
        }))
    }

    /// Ask one question and wait for its answer.
    ///
    /// The user message is appended before the backend is called; the reply
    /// (completion or fallback text) is appended once it resolves, even if
    /// this future is dropped first.
    pub async fn send_user_message(&self, text: &str) -> SendOutcome {
        match self.begin_send(text) {
            Ok(request) => {
                if let Err(e) = request.await {
                    tracing::error!(error = %e, "request task failed");
                }
                SendOutcome::Answered
            }
            Err(outcome) => outcome,
        }
    }
}
