//! Store-layer error types.

use monument_world::InvalidNamespace;

/// Errors that can occur opening or operating on a namespace's store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The namespace identifier failed validation before a path was ever
    /// constructed from it.
    #[error("invalid namespace: {0}")]
    InvalidNamespace(#[from] InvalidNamespace),

    /// `PRAGMA user_version` did not match the server's expected schema
    /// version. The namespace is refused rather than migrated.
    #[error("schema mismatch: store has version {found}, server expects {expected}")]
    SchemaMismatch { found: i64, expected: i64 },

    /// The connection could not acquire the write lock within the
    /// configured busy timeout.
    #[error("store busy: timed out waiting for a write lock")]
    Busy,

    /// Underlying SQLite error not covered above.
    #[error("store I/O error: {0}")]
    Io(#[from] rusqlite::Error),

    /// A row's JSON-encoded column failed to decode.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// `true` if this error should be treated as fatal for the namespace
    /// (spec §7: "SchemaMismatch and repeated Internal are fatal").
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::SchemaMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_mismatch_is_fatal() {
        let e = StoreError::SchemaMismatch { found: 1, expected: 2 };
        assert!(e.is_fatal());
    }

    #[test]
    fn busy_is_not_fatal() {
        assert!(!StoreError::Busy.is_fatal());
    }
}
