//! In-memory workspace for dry runs and tests.

use std::sync::{Arc, Mutex};

use tracing::debug;
use uuid::Uuid;

use studyloop_shared::{PageId, PageWrite, Properties, Result, StudyLoopError};

use crate::Workspace;

/// A page held by the in-memory workspace.
#[derive(Debug, Clone)]
pub struct StoredPage {
    /// The payload the page was created from.
    pub write: PageWrite,
    /// Current properties (initial payload merged with later updates).
    pub properties: Properties,
    /// Comments in attachment order.
    pub comments: Vec<String>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Pages in creation order.
    pages: Vec<(PageId, StoredPage)>,
}

/// Deterministic in-memory [`Workspace`].
///
/// Page identifiers are UUID v7, allocated by the store itself. Clones
/// share state, so a test can keep a handle for inspection while the
/// orchestrator owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkspace {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages created so far.
    pub fn page_count(&self) -> usize {
        self.inner.lock().expect("workspace mutex").pages.len()
    }

    /// Snapshot of a page by id.
    pub fn page(&self, id: &PageId) -> Option<StoredPage> {
        let inner = self.inner.lock().expect("workspace mutex");
        inner
            .pages
            .iter()
            .find(|(page_id, _)| page_id == id)
            .map(|(_, page)| page.clone())
    }

    /// Snapshot of all pages in creation order.
    pub fn pages(&self) -> Vec<(PageId, StoredPage)> {
        self.inner.lock().expect("workspace mutex").pages.clone()
    }
}

impl Workspace for MemoryWorkspace {
    async fn create_page(&self, page: &PageWrite) -> Result<PageId> {
        let id = PageId::new(Uuid::now_v7().to_string());
        let stored = StoredPage {
            write: page.clone(),
            properties: page.properties.clone(),
            comments: Vec::new(),
        };

        let mut inner = self.inner.lock().expect("workspace mutex");
        inner.pages.push((id.clone(), stored));
        debug!(page = %id, title = %page.title, "created page");
        Ok(id)
    }

    async fn update_page(&self, id: &PageId, properties: &Properties) -> Result<()> {
        let mut inner = self.inner.lock().expect("workspace mutex");
        let (_, page) = inner
            .pages
            .iter_mut()
            .find(|(page_id, _)| page_id == id)
            .ok_or_else(|| StudyLoopError::Persistence(format!("unknown page {id}")))?;

        for (key, value) in properties {
            page.properties.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn create_comment(&self, id: &PageId, text: &str) -> Result<()> {
        let mut inner = self.inner.lock().expect("workspace mutex");
        let (_, page) = inner
            .pages
            .iter_mut()
            .find(|(page_id, _)| page_id == id)
            .ok_or_else(|| StudyLoopError::Persistence(format!("unknown page {id}")))?;

        page.comments.push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use studyloop_shared::PropertyValue;

    fn write(title: &str) -> PageWrite {
        PageWrite {
            parent: "learner-demo".into(),
            title: title.into(),
            body: "**body**".into(),
            properties: [("priority".to_string(), PropertyValue::number(5.0))].into(),
        }
    }

    #[tokio::test]
    async fn page_ids_are_unique() {
        let workspace = MemoryWorkspace::new();
        let a = workspace.create_page(&write("a")).await.unwrap();
        let b = workspace.create_page(&write("b")).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(workspace.page_count(), 2);
    }

    #[tokio::test]
    async fn updates_are_last_write_wins_per_key() {
        let workspace = MemoryWorkspace::new();
        let id = workspace.create_page(&write("a")).await.unwrap();

        workspace
            .update_page(
                &id,
                &[("status".to_string(), PropertyValue::text("generated"))].into(),
            )
            .await
            .unwrap();
        workspace
            .update_page(
                &id,
                &[
                    ("status".to_string(), PropertyValue::text("reviewed")),
                    ("score".to_string(), PropertyValue::number(4.0)),
                ]
                .into(),
            )
            .await
            .unwrap();

        let page = workspace.page(&id).unwrap();
        assert_eq!(page.properties["status"], PropertyValue::Text("reviewed".into()));
        assert_eq!(page.properties["score"], PropertyValue::Number(4.0));
        // Creation-time properties survive unrelated updates.
        assert_eq!(page.properties["priority"], PropertyValue::Number(5.0));
    }

    #[tokio::test]
    async fn comments_keep_attachment_order() {
        let workspace = MemoryWorkspace::new();
        let id = workspace.create_page(&write("a")).await.unwrap();

        workspace.create_comment(&id, "first").await.unwrap();
        workspace.create_comment(&id, "second").await.unwrap();

        let page = workspace.page(&id).unwrap();
        assert_eq!(page.comments, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn unknown_page_is_a_persistence_error() {
        let workspace = MemoryWorkspace::new();
        let missing = PageId::new("nope");

        let err = workspace
            .update_page(&missing, &Properties::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StudyLoopError::Persistence(_)));

        let err = workspace.create_comment(&missing, "x").await.unwrap_err();
        assert!(matches!(err, StudyLoopError::Persistence(_)));
    }
}
