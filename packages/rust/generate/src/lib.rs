//! Content generation for learning tasks.
//!
//! A [`ContentGenerator`] turns the shared [`AgentContext`] plus one
//! [`LearningTask`] into a markdown body for the task's workspace page.
//! [`TemplateGenerator`] is the deterministic built-in; a model-backed
//! engine plugs in behind the same trait.

use std::future::Future;

use tracing::debug;

use studyloop_shared::{AgentContext, DUE_UNSET, LearningTask, Result};

/// Default bound on the quoted excerpt of the shared extraction.
pub const DEFAULT_EXCERPT_CHARS: usize = 80;

/// Produces task-specific markdown from the shared context.
///
/// Side-effect-free: purely a function of its two inputs, beyond any
/// internal nondeterminism of a delegated generation engine.
pub trait ContentGenerator: Send + Sync {
    /// Generate the markdown body for `task`.
    fn generate(
        &self,
        context: &AgentContext,
        task: &LearningTask,
    ) -> impl Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// Template generator
// ---------------------------------------------------------------------------

/// Deterministic generator rendering a fixed markdown template.
///
/// Incorporates the task kind and priority, the learner and their goal,
/// a bounded excerpt of the shared extraction, the task description, and
/// the due date (or an explicit "not set" marker).
#[derive(Debug, Clone)]
pub struct TemplateGenerator {
    excerpt_chars: usize,
}

impl TemplateGenerator {
    pub fn new(excerpt_chars: usize) -> Self {
        Self { excerpt_chars }
    }

    /// Char-safe bounded excerpt of `text`, with an ellipsis when cut.
    fn excerpt(&self, text: &str) -> String {
        if text.chars().count() <= self.excerpt_chars {
            text.to_string()
        } else {
            let mut cut: String = text.chars().take(self.excerpt_chars).collect();
            cut.push('…');
            cut
        }
    }
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_EXCERPT_CHARS)
    }
}

impl ContentGenerator for TemplateGenerator {
    async fn generate(&self, context: &AgentContext, task: &LearningTask) -> Result<String> {
        let due = match &task.due {
            Some(due) => due.to_rfc3339(),
            None => DUE_UNSET.to_string(),
        };

        let markdown = [
            format!("**Task: {} | priority {}**", task.kind, task.priority),
            format!(
                "- Learner: {} (goal: {})",
                context.profile.learner_id, context.profile.learning_goal
            ),
            format!("- Source excerpt: {}", self.excerpt(&context.text.plain_text)),
            format!("- Suggested action: {}", task.description),
            format!("- Due: {due}"),
        ]
        .join("\n");

        debug!(task = %task.id, len = markdown.len(), "rendered task content");
        Ok(markdown)
    }
}
