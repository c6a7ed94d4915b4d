//! Optional remote mirror of the transaction log.
//!
//! Mirroring is best effort: the local record is always written first and a
//! remote failure is only logged. Fetching is limited to reading what the
//! remote holds; there is no merge back into the local log.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{ResultEngine, Transaction};

/// Which remote transactions to fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoteFilter {
    /// Only transactions dated on or after this day.
    pub since: Option<NaiveDate>,
}

#[async_trait]
pub trait RemoteMirror: Send + Sync {
    /// `false` when no remote endpoint is configured.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Appends one transaction to the remote store of `env_id`.
    async fn append(&self, env_id: &str, transaction: &Transaction) -> ResultEngine<()>;

    /// Fetches the remote transactions of `env_id`.
    async fn fetch(&self, env_id: &str, filter: RemoteFilter) -> ResultEngine<Vec<Transaction>>;
}

/// Mirror used when no remote is configured. Every operation succeeds and does
/// nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMirror;

#[async_trait]
impl RemoteMirror for NoopMirror {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn append(&self, _env_id: &str, _transaction: &Transaction) -> ResultEngine<()> {
        Ok(())
    }

    async fn fetch(&self, _env_id: &str, _filter: RemoteFilter) -> ResultEngine<Vec<Transaction>> {
        Ok(Vec::new())
    }
}
