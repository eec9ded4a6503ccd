//! Run lock repository — single-flight guard for pipeline runs.
//!
//! A lock row is taken with a conditional upsert: it is inserted when
//! absent, or taken over when the previous holder's lease has expired.

use chrono::{DateTime, Duration, Utc};
use rusqlite::params;

use super::{format_timestamp, parse_timestamp, Database, DatabaseError};

/// A held run lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLockRow {
    pub name: String,
    pub owner: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Tries to acquire `name` for `owner` until `now + ttl`.
///
/// Returns `true` when the lock was taken, `false` when another owner
/// holds an unexpired lease.
pub fn try_acquire(
    db: &Database,
    name: &str,
    owner: &str,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<bool, DatabaseError> {
    let acquired_at = format_timestamp(now);
    let expires_at = format_timestamp(now + ttl);
    db.with_conn(|conn| {
        let changed = conn.execute(
            "INSERT INTO run_locks (name, owner, acquired_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET
               owner = excluded.owner,
               acquired_at = excluded.acquired_at,
               expires_at = excluded.expires_at
             WHERE run_locks.expires_at <= excluded.acquired_at",
            params![name, owner, acquired_at, expires_at],
        )?;
        Ok(changed == 1)
    })
}

/// Extends `owner`'s lease on `name` to `now + ttl`.
///
/// Returns `false` when `owner` no longer holds the lock, either because
/// it was released or because another run took over an expired lease.
pub fn renew(
    db: &Database,
    name: &str,
    owner: &str,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<bool, DatabaseError> {
    let expires_at = format_timestamp(now + ttl);
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE run_locks SET expires_at = ?3 WHERE name = ?1 AND owner = ?2",
            params![name, owner, expires_at],
        )?;
        Ok(changed == 1)
    })
}

/// Releases `name` if it is still held by `owner`.
///
/// Returns `false` when the lock had already been taken over or released.
pub fn release(db: &Database, name: &str, owner: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "DELETE FROM run_locks WHERE name = ?1 AND owner = ?2",
            params![name, owner],
        )?;
        Ok(changed == 1)
    })
}

/// Returns the current holder of `name`, expired or not.
pub fn find(db: &Database, name: &str) -> Result<Option<RunLockRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT name, owner, acquired_at, expires_at FROM run_locks WHERE name = ?1",
        )?;
        let mut rows = stmt.query(params![name])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let acquired_at: String = row.get(2)?;
        let expires_at: String = row.get(3)?;
        Ok(Some(RunLockRow {
            name: row.get(0)?,
            owner: row.get(1)?,
            acquired_at: parse_timestamp("acquired_at", &acquired_at)?,
            expires_at: parse_timestamp("expires_at", &expires_at)?,
        }))
    })
}
