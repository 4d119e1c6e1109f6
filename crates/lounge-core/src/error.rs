use thiserror::Error;

/// Why a Gemini request did not produce a completion.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Network, DNS, TLS, or a body that was not JSON at all.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with an `error` object.
    #[error("backend error: {0}")]
    Backend(String),

    /// JSON came back but without `candidates[0].content.parts[0].text`.
    #[error("unexpected response shape: {0}")]
    MalformedPayload(String),
}

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Could not get your location: {0}")]
    Position(String),

    #[error("Could not determine your location name: {0}")]
    ReverseGeocode(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Gemini API key not configured. Set GEMINI_API_KEY or add gemini_api_key to {0}")]
    MissingApiKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

pub const TRANSPORT_FALLBACK: &str =
    "I'm sorry, I encountered an issue while retrieving lounge information. Please try again later.";
pub const MALFORMED_FALLBACK: &str = "Sorry, I couldn't retrieve information about lounges at this airport. Please try again with a different airport name.";

impl QueryError {
    /// Text shown to the user in place of a completion.
    pub fn user_message(&self) -> String {
        match self {
            QueryError::Transport(_) => TRANSPORT_FALLBACK.to_string(),
            QueryError::Backend(message) => format!("Error fetching lounge information: {}", message),
            QueryError::MalformedPayload(_) => MALFORMED_FALLBACK.to_string(),
        }
    }
}
