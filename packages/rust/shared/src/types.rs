//! Core domain types for the studyloop pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StudyLoopError};

/// Property value written when a captured document has no due date.
pub const DUE_UNSET: &str = "not set";

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Reference to a captured study document (path or URI).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentRef(pub String);

impl DocumentRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a page in the knowledge workspace.
///
/// Allocated by the workspace backend; unique for the life of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Learner profile
// ---------------------------------------------------------------------------

/// Self-reported competency of the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetencyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl CompetencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl std::fmt::Display for CompetencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who the generated content is for. Immutable once a session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerProfile {
    /// Learner identifier, also the default parent container for pages.
    pub learner_id: String,
    /// Competency level.
    pub competency: CompetencyLevel,
    /// Free-text learning goal.
    pub learning_goal: String,
    /// Preferred interaction style (e.g. "walkthrough + plan").
    pub preferred_style: String,
}

// ---------------------------------------------------------------------------
// Learning tasks
// ---------------------------------------------------------------------------

/// The kind of generated-content work a task asks for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Annotation,
    Analysis,
    Organization,
    Planning,
}

impl TaskKind {
    /// All kinds, in their canonical order.
    pub const ALL: [TaskKind; 4] = [
        Self::Annotation,
        Self::Analysis,
        Self::Organization,
        Self::Planning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Annotation => "annotation",
            Self::Analysis => "analysis",
            Self::Organization => "organization",
            Self::Planning => "planning",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority, validated to 1..=5 (higher = more urgent).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(StudyLoopError::validation(format!(
                "priority {value} outside {}..={}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Priority {
    type Error = StudyLoopError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> u8 {
        priority.0
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One unit of generated-content work tied to a captured document.
///
/// Tasks arrive as an ordered batch; execution and output order match
/// the batch order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningTask {
    /// Identifier, unique within a batch.
    pub id: String,
    /// Task kind.
    pub kind: TaskKind,
    /// Free-text description of the work.
    pub description: String,
    /// Urgency, 1..=5.
    pub priority: Priority,
    /// Optional due timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Extraction result
// ---------------------------------------------------------------------------

/// Coarse classification of an extracted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanClass {
    /// The first line of a capture, assumed to be the prompt.
    Question,
    /// Everything after the first line.
    Analysis,
}

impl SpanClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Analysis => "analysis",
        }
    }
}

/// Pixel bounding region of a recognized line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

/// Capture provenance for a span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanSource {
    /// Page reference within the captured document.
    pub page: String,
    /// When the span was extracted.
    pub captured_at: DateTime<Utc>,
}

/// One recognized line of a captured document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// Line identifier, unique within one extraction result.
    pub line_id: String,
    /// Raw recognized text.
    pub text: String,
    /// Recognition confidence, 0.0..=1.0.
    pub confidence: f32,
    /// Bounding region on the source page.
    pub region: Region,
    /// Coarse line classification.
    pub class: SpanClass,
    /// Capture provenance.
    pub source: SpanSource,
}

/// Structured multi-format extraction of a captured document.
///
/// `plain_text` is never empty and `spans` always holds at least one
/// entry; extraction substitutes a fixed placeholder when the source
/// yields no usable text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Originating document reference.
    pub source: DocumentRef,
    /// Sanitized plain text.
    pub plain_text: String,
    /// Markdown rendering (first line emphasized, rest bulleted).
    pub markdown: String,
    /// Tabular rendering: one `[row_number, text]` pair per line, 1-based.
    pub table: Vec<[String; 2]>,
    /// Ordered line spans, one per line of `plain_text`.
    pub spans: Vec<TextSpan>,
    /// SHA-256 of the source bytes, for traceability.
    pub content_hash: String,
}

// ---------------------------------------------------------------------------
// Agent context
// ---------------------------------------------------------------------------

/// Read-only bundle shared by every task in a batch.
///
/// Built once per document, so extraction cost is paid once rather than
/// once per task, and discarded after the task loop completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentContext {
    pub profile: LearnerProfile,
    pub tasks: Vec<LearningTask>,
    pub text: ExtractedText,
}

// ---------------------------------------------------------------------------
// Workspace payloads
// ---------------------------------------------------------------------------

/// A single page property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f64),
    Text(String),
}

impl PropertyValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn number(value: f64) -> Self {
        Self::Number(value)
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Page property map. Updates are last-write-wins per key.
pub type Properties = BTreeMap<String, PropertyValue>;

/// Payload for creating a page in the knowledge workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageWrite {
    /// Parent container reference.
    pub parent: String,
    /// Page title.
    pub title: String,
    /// Markdown body.
    pub body: String,
    /// Initial properties (at minimum: priority, type, due).
    pub properties: Properties,
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

/// One recorded outcome for a completed task.
///
/// Records are append-only; feedback never mutates the task itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// Originating task.
    pub task_id: String,
    /// Kind of the originating task.
    pub kind: TaskKind,
    /// Numeric outcome score.
    pub score: f64,
    /// Free-text comment.
    pub comment: String,
    /// Recording time (orders the log).
    pub recorded_at: DateTime<Utc>,
}

/// Aggregate score statistics for one task kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KindStats {
    pub count: usize,
    pub mean: f64,
}

/// Direction of the score trend across the feedback log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Steady,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Steady => "steady",
        })
    }
}

/// Derived recommendation computed from the full feedback log.
///
/// Recomputable at any time; never persisted as authoritative state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyNote {
    /// Weakest-performing task kind, the recommended remediation focus.
    pub focus: TaskKind,
    /// Mean score of the focus kind.
    pub focus_mean: f64,
    /// Per-kind aggregates over the whole log.
    pub per_kind: BTreeMap<TaskKind, KindStats>,
    /// Aggregate score trend.
    pub trend: Trend,
    /// Human-readable one-line summary.
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_bounds() {
        assert!(Priority::new(0).is_err());
        assert!(Priority::new(6).is_err());
        for value in 1..=5 {
            assert_eq!(Priority::new(value).unwrap().get(), value);
        }
    }

    #[test]
    fn priority_rejects_out_of_range_on_deserialize() {
        let result: std::result::Result<Priority, _> = serde_json::from_str("7");
        assert!(result.is_err());

        let priority: Priority = serde_json::from_str("3").expect("valid priority");
        assert_eq!(priority.get(), 3);
    }

    #[test]
    fn task_roundtrip() {
        let task = LearningTask {
            id: "T1".into(),
            kind: TaskKind::Annotation,
            description: "annotate margins and error causes".into(),
            priority: Priority::new(5).unwrap(),
            due: None,
        };

        let json = serde_json::to_string(&task).expect("serialize");
        assert!(json.contains("\"annotation\""));
        assert!(!json.contains("due"));

        let parsed: LearningTask = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, task);
    }

    #[test]
    fn profile_roundtrip() {
        let profile = LearnerProfile {
            learner_id: "learner-demo".into(),
            competency: CompetencyLevel::Intermediate,
            learning_goal: "linear functions and word problems".into(),
            preferred_style: "walkthrough + plan".into(),
        };

        let json = serde_json::to_string(&profile).expect("serialize");
        assert!(json.contains("\"intermediate\""));
        let parsed: LearnerProfile = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, profile);
    }

    #[test]
    fn property_value_untagged() {
        let props: Properties = [
            ("priority".to_string(), PropertyValue::number(5.0)),
            ("type".to_string(), PropertyValue::text("annotation")),
        ]
        .into();

        let json = serde_json::to_string(&props).expect("serialize");
        let parsed: Properties = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed["priority"], PropertyValue::Number(5.0));
        assert_eq!(parsed["type"], PropertyValue::Text("annotation".into()));
    }

    #[test]
    fn task_kind_ordering_is_canonical() {
        let mut kinds = vec![TaskKind::Planning, TaskKind::Annotation, TaskKind::Analysis];
        kinds.sort();
        assert_eq!(
            kinds,
            vec![TaskKind::Annotation, TaskKind::Analysis, TaskKind::Planning]
        );
    }
}
