//! Bearer-token JSON client for a hosted knowledge workspace.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use studyloop_shared::{PageId, PageWrite, Properties, Result, StudyLoopError};

use crate::Workspace;

/// User-Agent string for workspace requests.
const USER_AGENT: &str = concat!("studyloop/", env!("CARGO_PKG_VERSION"));

/// Response body of a page-create call.
#[derive(Debug, Deserialize)]
struct CreatedPage {
    id: String,
}

/// [`Workspace`] implementation speaking a Notion-style REST surface:
/// `POST /v1/pages`, `PATCH /v1/pages/{id}`, `POST /v1/comments`.
///
/// Page identifiers are allocated by the service.
pub struct HttpWorkspace {
    client: Client,
    base_url: Url,
    token: String,
}

impl HttpWorkspace {
    /// Build a client against `base_url`, authenticating with `token`.
    pub fn new(base_url: Url, token: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| {
                StudyLoopError::Persistence(format!("failed to build workspace client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| StudyLoopError::Persistence(format!("bad endpoint {path}: {e}")))
    }

    /// Map a non-success status to a persistence error; rate limits are
    /// called out so callers can surface them as retryable.
    fn status_error(context: &str, status: StatusCode) -> StudyLoopError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            StudyLoopError::Persistence(format!("{context}: rate limited (HTTP 429)"))
        } else {
            StudyLoopError::Persistence(format!("{context}: HTTP {status}"))
        }
    }
}

impl Workspace for HttpWorkspace {
    #[instrument(skip_all, fields(title = %page.title))]
    async fn create_page(&self, page: &PageWrite) -> Result<PageId> {
        let response = self
            .client
            .post(self.endpoint("/v1/pages")?)
            .bearer_auth(&self.token)
            .json(page)
            .send()
            .await
            .map_err(|e| StudyLoopError::Persistence(format!("create page: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error("create page", status));
        }

        let created: CreatedPage = response
            .json()
            .await
            .map_err(|e| StudyLoopError::Persistence(format!("create page response: {e}")))?;

        debug!(page = %created.id, "created page");
        Ok(PageId::new(created.id))
    }

    #[instrument(skip_all, fields(page = %id))]
    async fn update_page(&self, id: &PageId, properties: &Properties) -> Result<()> {
        let response = self
            .client
            .patch(self.endpoint(&format!("/v1/pages/{id}"))?)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "properties": properties }))
            .send()
            .await
            .map_err(|e| StudyLoopError::Persistence(format!("update page {id}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(&format!("update page {id}"), status));
        }
        Ok(())
    }

    #[instrument(skip_all, fields(page = %id))]
    async fn create_comment(&self, id: &PageId, text: &str) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("/v1/comments")?)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "page_id": id, "text": text }))
            .send()
            .await
            .map_err(|e| StudyLoopError::Persistence(format!("comment on {id}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(&format!("comment on {id}"), status));
        }
        Ok(())
    }
}
