//! Data-structure capabilities of the external store.
//!
//! Each trait is a narrow slice of what the store offers. Callers depend on
//! the slice they use; the store itself owns the data structure.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// List commands. Index arguments follow store semantics: negative counts
/// from the tail, `stop` is inclusive.
#[async_trait]
pub trait ListOps: Send + Sync {
    /// Prepends a value and returns the new length.
    async fn lpush(&self, key: &str, value: &str) -> Result<usize>;

    /// Removes and returns the tail element.
    async fn rpop(&self, key: &str) -> Result<Option<String>>;

    /// Removes and returns the head element, waiting up to `timeout` for one
    /// to appear. None when the wait elapses. A zero `timeout` waits the
    /// shortest time the store allows, never indefinitely.
    async fn blpop(&self, key: &str, timeout: Duration) -> Result<Option<String>>;

    /// Number of elements in the list, 0 when absent.
    async fn llen(&self, key: &str) -> Result<usize>;

    /// Elements between `start` and `stop`, both inclusive.
    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>>;
}

/// Unordered set commands.
#[async_trait]
pub trait SetOps: Send + Sync {
    /// Adds members and returns how many were new.
    async fn sadd(&self, key: &str, members: &[&str]) -> Result<usize>;

    async fn smembers(&self, key: &str) -> Result<BTreeSet<String>>;

    async fn sunion(&self, keys: &[&str]) -> Result<BTreeSet<String>>;

    async fn sinter(&self, keys: &[&str]) -> Result<BTreeSet<String>>;
}

/// Hash field commands.
#[async_trait]
pub trait HashOps: Send + Sync {
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>>;

    /// Sets several fields at once.
    async fn hset_multiple(&self, key: &str, fields: &[(&str, &str)]) -> Result<()>;

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>>;
}

/// Where a stream read starts.
///
/// Reads are one-shot: the caller keeps the id of the last entry it saw and
/// passes it back as [`StreamCursor::After`] to continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamCursor {
    /// Every entry from the beginning of the stream
    Start,
    /// Only entries appended after the read begins
    Latest,
    /// Entries with an id strictly greater than this one
    After(String),
}

impl fmt::Display for StreamCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamCursor::Start => f.write_str("0"),
            StreamCursor::Latest => f.write_str("$"),
            StreamCursor::After(id) => f.write_str(id),
        }
    }
}

/// One stream entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: String,
    pub fields: HashMap<String, String>,
}

impl StreamEntry {
    /// Cursor that continues reading after this entry.
    pub fn cursor(&self) -> StreamCursor {
        StreamCursor::After(self.id.clone())
    }
}

/// Append-only stream commands.
#[async_trait]
pub trait StreamOps: Send + Sync {
    /// Appends an entry with a store-assigned id and returns that id.
    async fn xadd(&self, key: &str, fields: &[(&str, &str)]) -> Result<String>;

    /// Reads up to `count` entries after `cursor`. With `block`, waits that
    /// long for at least one entry; an empty result means the wait elapsed.
    /// A zero `block` still returns after the shortest wait the store allows.
    async fn xread(
        &self,
        key: &str,
        cursor: &StreamCursor,
        count: usize,
        block: Option<Duration>,
    ) -> Result<Vec<StreamEntry>>;
}
