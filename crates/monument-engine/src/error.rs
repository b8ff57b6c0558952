//! Engine-layer error taxonomy (spec §7).

/// Errors surfaced by the tick state machine, validator, resolver, and
/// context builder. `monument-api` maps these onto `monument-wire::ApiError`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unknown namespace")]
    UnknownNamespace,

    #[error("unknown actor or actor eliminated")]
    UnknownActor,

    #[error("bad secret")]
    AuthFailed,

    #[error("intent not permitted for actor (ScopeDenied)")]
    ScopeDenied,

    #[error("submission outside COLLECT (PhaseMismatch)")]
    PhaseMismatch,

    #[error("Supertick mismatch: submission targets tick {submitted}, namespace is at tick {current}")]
    SupertickMismatch { submitted: u64, current: u64 },

    #[error("Context hash mismatch: submitted hash does not match the current snapshot")]
    ContextHashMismatch,

    #[error("already submitted: a journal row already exists for this actor and tick")]
    AlreadySubmitted,

    #[error("malformed action: {0}")]
    MalformedAction(String),

    #[error("store error: {0}")]
    Store(#[from] monument_store::StoreError),

    #[error("namespace poisoned after an internal error; refusing further requests")]
    Poisoned,

    #[error("internal engine error: {0}")]
    Internal(String),
}

impl EngineError {
    /// `true` if this error should poison the namespace (spec §7: fatal).
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            EngineError::Store(e) => e.is_fatal(),
            EngineError::Poisoned => true,
            EngineError::Internal(_) => true,
            _ => false,
        }
    }
}
