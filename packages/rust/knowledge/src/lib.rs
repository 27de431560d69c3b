//! Knowledge workspace clients.
//!
//! This crate provides:
//! - [`Workspace`] — the page create/update/comment capability
//! - [`MemoryWorkspace`] — deterministic in-memory implementation
//! - [`HttpWorkspace`] — bearer-token JSON client for a hosted workspace
//! - [`schema`] — documentation-only destination database schemas

pub mod http;
pub mod memory;
pub mod schema;

use std::future::Future;

use studyloop_shared::{PageId, PageWrite, Properties, Result};

pub use http::HttpWorkspace;
pub use memory::{MemoryWorkspace, StoredPage};
pub use schema::{DatabaseSchema, PropertyKind, PropertySchema, mistake_log, study_plan};

/// Page persistence boundary of the knowledge workspace.
///
/// Implementations guarantee page identifiers unique for the life of a
/// session; property updates are idempotent and last-write-wins per key.
pub trait Workspace: Send + Sync {
    /// Create a page and return its identifier.
    fn create_page(&self, page: &PageWrite) -> impl Future<Output = Result<PageId>> + Send;

    /// Merge `properties` into an existing page.
    fn update_page(
        &self,
        id: &PageId,
        properties: &Properties,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Attach a comment to an existing page.
    fn create_comment(&self, id: &PageId, text: &str)
    -> impl Future<Output = Result<()>> + Send;
}
