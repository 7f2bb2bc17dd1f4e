//! The database-context contract. Persistence itself is out of scope; this crate only
//! depends on the `begin/commit/rollback` + synchronization-conflict shape.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// Dispatch rolls back and asks the transport to retry the frame later.
    #[error("serialization conflict")]
    SyncConflict,
    #[error("database error: {0}")]
    Other(String),
}

pub trait DbContext: Send {
    fn begin_transaction(&mut self) -> Result<(), DbError>;
    fn commit_transaction(&mut self) -> Result<(), DbError>;
    fn rollback_transaction(&mut self) -> Result<(), DbError>;
}

/// An in-memory stand-in used by tests and the demo runner. Never used as a real persistence
/// layer; production nodes supply their own `DbContext`.
#[derive(Default)]
pub struct NullDbContext {
    pub rollback_calls: u32,
    pub commit_calls: u32,
    /// When set, the next `commit_transaction` call raises this error instead of succeeding.
    pub fail_next_commit: Option<DbError>,
}

impl DbContext for NullDbContext {
    fn begin_transaction(&mut self) -> Result<(), DbError> {
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<(), DbError> {
        self.commit_calls += 1;
        if let Some(err) = self.fail_next_commit.take() {
            return Err(err);
        }
        Ok(())
    }

    fn rollback_transaction(&mut self) -> Result<(), DbError> {
        self.rollback_calls += 1;
        Ok(())
    }
}
