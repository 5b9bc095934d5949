use crate::store::StoreError;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum VerificationError {
    #[error("{0}")]
    InvalidEmail(String),
    #[error("The email address is already subscribed")]
    AlreadySubscribed,
    #[error("The email address is not subscribed")]
    NotSubscribed,
    #[error("A code was issued recently, retry in {wait_seconds}s")]
    RateLimited { wait_seconds: i64 },
    #[error("No pending verification for this email address")]
    NoCodeFound,
    #[error("The pending code was issued for a different action")]
    IntentMismatch,
    #[error("The verification code has expired")]
    Expired,
    #[error("Too many wrong codes were submitted")]
    AttemptsExhausted,
    #[error("Wrong verification code, {attempts_remaining} attempts left")]
    CodeMismatch { attempts_remaining: u32 },
    #[error("Failed to access the subscription store")]
    StoreIOError(#[from] StoreError),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for VerificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
