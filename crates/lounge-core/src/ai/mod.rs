pub mod gemini;

use async_trait::async_trait;

pub use gemini::GeminiClient;

/// Anything that can turn a prompt into assistant text.
///
/// Implementations never fail: errors are converted into user-readable text so
/// every question gets exactly one answer.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> String;
}
