//! Local show catalog - the store the sync engine reconciles into.
//!
//! The engine needs exactly four operations: find by title
//! (case-insensitive), insert, mutate in place, and commit. They are grouped
//! in a [`CatalogSession`] that lives for one sync cycle; nothing a session
//! stages is visible to other readers until [`CatalogSession::commit`].

mod sqlite;
mod types;

pub use sqlite::SqliteCatalogStore;
pub use types::*;

/// A catalog that can hand out per-cycle sessions.
pub trait CatalogStore: Send + Sync {
    /// Open a session. Each sync cycle uses exactly one.
    fn begin(&self) -> Result<Box<dyn CatalogSession>, CatalogError>;
}

/// Unit of work over the catalog, scoped to one sync cycle.
///
/// Reads see the committed catalog plus this session's own staged changes.
/// Dropping a session without committing discards everything it staged.
pub trait CatalogSession: Send {
    /// Find a show whose title equals `title` ignoring case.
    ///
    /// If several shows share the same folded title, the oldest one wins.
    fn find_by_title(&mut self, title: &str) -> Result<Option<CatalogShow>, CatalogError>;

    /// Stage a new show.
    fn insert(&mut self, show: CatalogShow) -> Result<(), CatalogError>;

    /// Stage new field values for an existing show (matched by `id`).
    fn update(&mut self, show: CatalogShow) -> Result<(), CatalogError>;

    /// Number of changes staged and not yet committed.
    fn pending(&self) -> usize;

    /// Apply all staged changes atomically.
    fn commit(self: Box<Self>) -> Result<CommitSummary, CatalogError>;
}
