//! Collection version stores
//!
//! A version store maps a collection key to the last upstream version token
//! observed for it. A key that was never recorded reads as [`UNKNOWN_VERSION`].
//!
//! Two backends:
//! - [`FileVersionStore`]: one JSON object file read and rewritten wholesale
//!   on every operation. Writers in other processes can still clobber each
//!   other (last write wins).
//! - [`SqliteVersionStore`]: one row per key; compare-and-swap is a single
//!   conditional upsert, atomic per key.

mod file;
#[cfg(feature = "sqlx")]
mod sqlite;

pub use file::FileVersionStore;
#[cfg(feature = "sqlx")]
pub use sqlite::SqliteVersionStore;

use async_trait::async_trait;

use crate::Result;

/// Token reported for a collection that has no stored version
pub const UNKNOWN_VERSION: &str = "0";

/// Persistent collection key → version token mapping
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Stored token, `None` when the key was never recorded
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Unconditionally record a token
    async fn set(&self, key: &str, token: &str) -> Result<()>;

    /// Record `new` only if the stored token still equals `expected`
    ///
    /// An `expected` of [`UNKNOWN_VERSION`] also matches a missing key.
    /// Returns whether the write happened.
    async fn compare_and_swap(&self, key: &str, expected: &str, new: &str) -> Result<bool>;
}
