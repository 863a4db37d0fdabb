//! Store walkthroughs
//!
//! Small routines exercising the store capabilities end to end. Nothing here
//! runs on its own; callers invoke them explicitly.

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::info;

use crate::error::Result;
use crate::store::{KeyValueStore, ListOps, SetOps};

/// Reads a string key.
pub async fn read_string(store: &dyn KeyValueStore, key: &str) -> Result<Option<String>> {
    let result = store.get(key).await?;
    info!(key = %key, result = ?result, "read string");
    Ok(result)
}

/// Writes a value, then sets its lifetime with a separate expire call and
/// reads it back.
pub async fn write_with_expiry(
    store: &dyn KeyValueStore,
    key: &str,
    value: &str,
    ttl: Duration,
) -> Result<Option<String>> {
    // Long initial lifetime; the expire call below sets the real one
    store
        .set(key, value.to_string(), ttl.max(Duration::from_secs(3600)))
        .await?;
    store.expire(key, ttl).await?;
    read_string(store, key).await
}

/// Outcome of [`drain_list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDrain {
    /// Length right after the pushes
    pub length: usize,
    /// Per round: tail pop, then blocking head pop
    pub popped: Vec<(Option<String>, Option<String>)>,
    /// `lrange(1, 3)` after draining
    pub remaining: Vec<String>,
}

/// Pushes `values` to the head of the list, then pops from both ends, once
/// per element, using the list as a queue from the tail and a stack from the
/// head.
pub async fn drain_list<S: ListOps + ?Sized>(
    store: &S,
    key: &str,
    values: &[&str],
    block: Duration,
) -> Result<ListDrain> {
    for value in values {
        store.lpush(key, value).await?;
    }
    let length = store.llen(key).await?;

    let mut popped = Vec::with_capacity(length);
    for _ in 0..length {
        let tail = store.rpop(key).await?;
        let head = store.blpop(key, block).await?;
        info!(tail = ?tail, head = ?head, "popped");
        popped.push((tail, head));
    }

    let remaining = store.lrange(key, 1, 3).await?;
    Ok(ListDrain {
        length,
        popped,
        remaining,
    })
}

/// Union and intersection of two sets after seeding them.
pub async fn set_overlap<S: SetOps + ?Sized>(
    store: &S,
    (left_key, left): (&str, &[&str]),
    (right_key, right): (&str, &[&str]),
) -> Result<(BTreeSet<String>, BTreeSet<String>)> {
    store.sadd(left_key, left).await?;
    store.sadd(right_key, right).await?;

    let union = store.sunion(&[left_key, right_key]).await?;
    let intersection = store.sinter(&[left_key, right_key]).await?;
    Ok((union, intersection))
}
