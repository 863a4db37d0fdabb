//! Redis Store Module
//!
//! [`KeyValueStore`] and the data-structure capabilities backed by an
//! external Redis server.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, MultiplexedConnection};
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, Client};
use tracing::{debug, info};

use super::{HashOps, KeyValueStore, ListOps, SetOps, StreamCursor, StreamEntry, StreamOps};
use crate::error::{CacheError, Result};

// == Redis Store ==
/// Handle to a Redis server.
///
/// Regular commands share one auto-reconnecting multiplexed connection.
/// Blocking commands open a dedicated connection so they cannot stall it.
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connects to the server at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url)?;
        let manager = ConnectionManager::new(client.clone()).await?;
        info!("Redis connected");
        Ok(Self { client, manager })
    }

    fn conn(&self) -> ConnectionManager {
        self.manager.clone()
    }

    async fn dedicated(&self) -> Result<MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

/// Expiry argument for PX and PEXPIRE. Sub-millisecond lifetimes round up
/// to one millisecond; the server rejects zero.
fn millis(ttl: Duration) -> Result<u64> {
    if ttl.is_zero() {
        return Err(CacheError::InvalidConfiguration(
            "ttl must be positive".to_string(),
        ));
    }
    let ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    Ok(ms.max(1))
}

// The server reads a timeout of 0 as "wait forever", so short waits round up
// to the smallest positive value each command accepts.

/// BLPOP timeout in seconds, at least one millisecond.
fn blpop_timeout(wait: Duration) -> f64 {
    wait.as_secs_f64().max(0.001)
}

/// XREAD BLOCK argument in milliseconds, at least one.
fn block_millis(wait: Duration) -> usize {
    usize::try_from(wait.as_millis()).unwrap_or(usize::MAX).max(1)
}

#[async_trait]
impl KeyValueStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = self.conn().get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        // Value and expiry in one command, no window without a deadline
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(millis(ttl)?)
            .query_async(&mut self.conn())
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let removed: usize = self.conn().del(key).await?;
        Ok(removed > 0)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let applied: bool = redis::cmd("PEXPIRE")
            .arg(key)
            .arg(millis(ttl)?)
            .query_async(&mut self.conn())
            .await?;
        Ok(applied)
    }
}

#[async_trait]
impl ListOps for RedisStore {
    async fn lpush(&self, key: &str, value: &str) -> Result<usize> {
        let len: usize = self.conn().lpush(key, value).await?;
        Ok(len)
    }

    async fn rpop(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = redis::cmd("RPOP")
            .arg(key)
            .query_async(&mut self.conn())
            .await?;
        Ok(value)
    }

    async fn blpop(&self, key: &str, timeout: Duration) -> Result<Option<String>> {
        let mut conn = self.dedicated().await?;
        let popped: Option<(String, String)> = redis::cmd("BLPOP")
            .arg(key)
            .arg(blpop_timeout(timeout))
            .query_async(&mut conn)
            .await?;
        Ok(popped.map(|(_, value)| value))
    }

    async fn llen(&self, key: &str) -> Result<usize> {
        let len: usize = self.conn().llen(key).await?;
        Ok(len)
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let values: Vec<String> = self.conn().lrange(key, start, stop).await?;
        Ok(values)
    }
}

#[async_trait]
impl SetOps for RedisStore {
    async fn sadd(&self, key: &str, members: &[&str]) -> Result<usize> {
        let mut cmd = redis::cmd("SADD");
        cmd.arg(key);
        for member in members {
            cmd.arg(*member);
        }
        let added: usize = cmd.query_async(&mut self.conn()).await?;
        Ok(added)
    }

    async fn smembers(&self, key: &str) -> Result<BTreeSet<String>> {
        let members: BTreeSet<String> = self.conn().smembers(key).await?;
        Ok(members)
    }

    async fn sunion(&self, keys: &[&str]) -> Result<BTreeSet<String>> {
        set_combination(self.conn(), "SUNION", keys).await
    }

    async fn sinter(&self, keys: &[&str]) -> Result<BTreeSet<String>> {
        set_combination(self.conn(), "SINTER", keys).await
    }
}

async fn set_combination(
    mut conn: ConnectionManager,
    command: &str,
    keys: &[&str],
) -> Result<BTreeSet<String>> {
    if keys.is_empty() {
        return Ok(BTreeSet::new());
    }
    let mut cmd = redis::cmd(command);
    for key in keys {
        cmd.arg(*key);
    }
    let members: BTreeSet<String> = cmd.query_async(&mut conn).await?;
    Ok(members)
}

#[async_trait]
impl HashOps for RedisStore {
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        let value: Option<String> = self.conn().hget(key, field).await?;
        Ok(value)
    }

    async fn hset_multiple(&self, key: &str, fields: &[(&str, &str)]) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut cmd = redis::cmd("HSET");
        cmd.arg(key);
        for (field, value) in fields {
            cmd.arg(*field).arg(*value);
        }
        let _: usize = cmd.query_async(&mut self.conn()).await?;
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let fields: HashMap<String, String> = self.conn().hgetall(key).await?;
        Ok(fields)
    }
}

#[async_trait]
impl StreamOps for RedisStore {
    async fn xadd(&self, key: &str, fields: &[(&str, &str)]) -> Result<String> {
        let id: String = self.conn().xadd(key, "*", fields).await?;
        Ok(id)
    }

    async fn xread(
        &self,
        key: &str,
        cursor: &StreamCursor,
        count: usize,
        block: Option<Duration>,
    ) -> Result<Vec<StreamEntry>> {
        let mut options = StreamReadOptions::default().count(count);
        let ids = [cursor.to_string()];

        let keys = [key];

        let reply: Option<StreamReadReply> = match block {
            Some(wait) => {
                options = options.block(block_millis(wait));
                let mut conn = self.dedicated().await?;
                let reply = conn.xread_options(&keys[..], &ids[..], &options).await?;
                reply
            }
            None => {
                let mut conn = self.conn();
                let reply = conn.xread_options(&keys[..], &ids[..], &options).await?;
                reply
            }
        };

        let Some(reply) = reply else {
            debug!(key = %key, cursor = %cursor, "stream read returned nothing");
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        for stream in reply.keys {
            for stream_id in stream.ids {
                let mut fields = HashMap::with_capacity(stream_id.map.len());
                for (field, value) in &stream_id.map {
                    fields.insert(field.clone(), redis::from_redis_value::<String>(value)?);
                }
                entries.push(StreamEntry {
                    id: stream_id.id,
                    fields,
                });
            }
        }
        Ok(entries)
    }
}
