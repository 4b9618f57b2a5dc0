/// Error surfaced to callers that send or read conversation messages.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The message text itself is unacceptable (blank, too long).
    #[error("validation error: {0}")]
    Validation(String),

    #[error("crypto error: {0}")]
    Crypto(String),
}
