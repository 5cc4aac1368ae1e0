use thiserror::Error;

/// Failure kinds surfaced by the extraction pipeline.
///
/// `Parse` and `RetryExhausted` are fatal for the current call: the first
/// means the upstream page format changed, the second that the redirector
/// stayed gated through the whole retry budget. `Http` wraps transport
/// failures from the underlying client.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("expected pattern not found: {0}")]
    Parse(&'static str),

    #[error("failed to open a session with the provider origin")]
    SessionBootstrap,

    #[error("{stage} still gated after {attempts} attempts")]
    RetryExhausted { stage: &'static str, attempts: u32 },

    #[error("episode {0} not found in listing")]
    LookupMiss(u32),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] anyhow::Error),
}
