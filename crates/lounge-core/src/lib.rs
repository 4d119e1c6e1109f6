pub mod ai;
pub mod config;
pub mod conversation;
pub mod error;
pub mod geo;
pub mod prompt;
pub mod sanitize;
pub mod session;
pub mod shortcuts;

// Re-export main types for convenience
pub use ai::{CompletionBackend, GeminiClient};
pub use config::Config;
pub use conversation::{ChatMessage, ChatRole, Conversation};
pub use error::{ConfigError, GeoError, QueryError};
pub use geo::{Coordinates, FixedLocator, GeoShortcut, IpLocator, Locator, NearbyQuery, ReverseGeocoder};
pub use prompt::build_prompt;
pub use sanitize::sanitize;
pub use session::{ChatSession, SendOutcome};
