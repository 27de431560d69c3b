//! Application configuration for studyloop.
//!
//! User config lives at `~/.studyloop/studyloop.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudyLoopError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "studyloop.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".studyloop";

// ---------------------------------------------------------------------------
// Config structs (matching studyloop.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Knowledge workspace settings.
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// OCR service settings.
    #[serde(default)]
    pub ocr: OcrConfig,

    /// Task pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineSection,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default captured document to process.
    #[serde(default = "default_document")]
    pub document: String,

    /// Maximum characters of extracted text quoted in generated content.
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            document: default_document(),
            excerpt_chars: default_excerpt_chars(),
        }
    }
}

fn default_document() -> String {
    "samples/demo-note.txt".into()
}
fn default_excerpt_chars() -> usize {
    80
}

/// `[workspace]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Name of the env var holding the API token (never store the token itself).
    #[serde(default = "default_api_token_env")]
    pub api_token_env: String,

    /// Base URL of the workspace API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Parent container for created pages. Empty = use the learner id.
    #[serde(default)]
    pub parent_page: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            api_token_env: default_api_token_env(),
            base_url: default_base_url(),
            parent_page: String::new(),
        }
    }
}

fn default_api_token_env() -> String {
    "STUDYLOOP_WORKSPACE_TOKEN".into()
}
fn default_base_url() -> String {
    "https://api.notion.com".into()
}

/// `[ocr]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// OCR service endpoint. Empty = use the built-in line extractor.
    #[serde(default)]
    pub endpoint: String,

    /// Request timeout for the OCR service.
    #[serde(default = "default_ocr_timeout")]
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_secs: default_ocr_timeout(),
        }
    }
}

fn default_ocr_timeout() -> u64 {
    30
}

/// Order of the status update and comment within a task's page writes.
///
/// Page creation always comes first; the remaining two calls have no
/// destination-imposed ordering, so it is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteOrder {
    /// Create page, update status, then comment.
    StatusFirst,
    /// Create page, comment, then update status.
    CommentFirst,
}

impl Default for WriteOrder {
    fn default() -> Self {
        Self::StatusFirst
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSection {
    /// Sequencing of per-task page writes.
    #[serde(default)]
    pub write_order: WriteOrder,

    /// Abort the batch on the first task failure instead of isolating it.
    #[serde(default)]
    pub fail_fast: bool,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            write_order: WriteOrder::default(),
            fail_fast: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime pipeline configuration — merged from config file + CLI flags.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Sequencing of per-task page writes.
    pub write_order: WriteOrder,
    /// Abort the batch on the first task failure.
    pub fail_fast: bool,
    /// Parent container for created pages. `None` = use the learner id.
    pub parent_page: Option<String>,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            write_order: config.pipeline.write_order,
            fail_fast: config.pipeline.fail_fast,
            parent_page: (!config.workspace.parent_page.is_empty())
                .then(|| config.workspace.parent_page.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.studyloop/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| StudyLoopError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.studyloop/studyloop.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| StudyLoopError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        StudyLoopError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| StudyLoopError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| StudyLoopError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| StudyLoopError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the workspace API token from the configured env var, if set.
pub fn workspace_token(config: &AppConfig) -> Option<String> {
    match std::env::var(&config.workspace.api_token_env) {
        Ok(val) if !val.is_empty() => Some(val),
        _ => None,
    }
}

/// Check that the workspace API token env var is set and non-empty.
pub fn validate_workspace_token(config: &AppConfig) -> Result<String> {
    workspace_token(config).ok_or_else(|| {
        StudyLoopError::config(format!(
            "workspace API token not found. Set the {} environment variable.",
            config.workspace.api_token_env
        ))
    })
}
