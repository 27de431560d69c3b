//! End-to-end task pipeline: capture → extraction → generation → workspace.
//!
//! [`LearningAgent`] assembles one shared [`AgentContext`] per document
//! (extraction cost is paid once, not once per task) and fans it out
//! across the task batch in input order, writing one workspace page per
//! task. Failures are captured per task; siblings keep running unless
//! `fail_fast` is set.

use tracing::{info, instrument, warn};

use studyloop_extract::{ByteSource, TextExtractor};
use studyloop_generate::ContentGenerator;
use studyloop_knowledge::Workspace;
use studyloop_shared::{
    AgentContext, DUE_UNSET, DocumentRef, LearnerProfile, LearningTask, PageId, PageWrite,
    PipelineConfig, Properties, PropertyValue, Result, WriteOrder,
};

use crate::progress::Progress;

/// Status property value set once a task's content is generated.
const STATUS_GENERATED: &str = "generated";

// ---------------------------------------------------------------------------
// Batch report
// ---------------------------------------------------------------------------

/// How one task settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Page created, status set, comment attached.
    Succeeded { page_id: PageId },
    /// The task was attempted and failed; siblings were not affected.
    Failed { reason: String },
    /// Skipped because an earlier task aborted a fail-fast batch.
    NotAttempted,
}

impl TaskOutcome {
    pub fn page_id(&self) -> Option<&PageId> {
        match self {
            Self::Succeeded { page_id } => Some(page_id),
            _ => None,
        }
    }
}

/// Per-task entry of a [`BatchReport`].
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub task_id: String,
    pub title: String,
    pub outcome: TaskOutcome,
}

/// Result of executing a task batch.
///
/// Holds one record per input task, in input order; the i-th record
/// corresponds to the i-th task regardless of outcome.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub records: Vec<TaskRecord>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Identifiers of successfully created pages, in task order.
    pub fn page_ids(&self) -> Vec<&PageId> {
        self.records
            .iter()
            .filter_map(|r| r.outcome.page_id())
            .collect()
    }

    pub fn succeeded(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, TaskOutcome::Succeeded { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, TaskOutcome::Failed { .. }))
            .count()
    }

    pub fn not_attempted(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, TaskOutcome::NotAttempted))
            .count()
    }

    pub fn fully_succeeded(&self) -> bool {
        self.succeeded() == self.len()
    }
}

// ---------------------------------------------------------------------------
// Page payload helpers
// ---------------------------------------------------------------------------

/// Title of the page created for `task`.
fn page_title(task: &LearningTask) -> String {
    format!("{}-{}", task.kind, task.id)
}

/// Initial page properties for `task`: priority, type, and due date (or
/// the explicit "not set" marker).
pub fn task_properties(task: &LearningTask) -> Properties {
    [
        (
            "priority".to_string(),
            PropertyValue::number(f64::from(task.priority.get())),
        ),
        ("type".to_string(), PropertyValue::text(task.kind.as_str())),
        (
            "due".to_string(),
            match &task.due {
                Some(due) => PropertyValue::text(due.to_rfc3339()),
                None => PropertyValue::text(DUE_UNSET),
            },
        ),
    ]
    .into()
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Orchestrates the capture-to-workspace pipeline over injected
/// capability implementations.
pub struct LearningAgent<S, X, G, W> {
    source: S,
    extractor: X,
    generator: G,
    workspace: W,
    config: PipelineConfig,
}

impl<S, X, G, W> LearningAgent<S, X, G, W>
where
    S: ByteSource,
    X: TextExtractor,
    G: ContentGenerator,
    W: Workspace,
{
    pub fn new(source: S, extractor: X, generator: G, workspace: W, config: PipelineConfig) -> Self {
        Self {
            source,
            extractor,
            generator,
            workspace,
            config,
        }
    }

    /// Read and extract `doc` once, bundling the result with the profile
    /// and task batch into the shared context.
    ///
    /// Extraction failure aborts the run; without a context there is
    /// nothing for the task loop to work on.
    #[instrument(skip_all, fields(doc = %doc))]
    pub async fn build_context(
        &self,
        doc: &DocumentRef,
        profile: LearnerProfile,
        tasks: Vec<LearningTask>,
    ) -> Result<AgentContext> {
        let bytes = self.source.read(doc).await?;
        let text = self.extractor.extract(doc, &bytes).await?;

        info!(
            tasks = tasks.len(),
            spans = text.spans.len(),
            hash = %text.content_hash,
            "context ready"
        );

        Ok(AgentContext {
            profile,
            tasks,
            text,
        })
    }

    /// Execute the task batch in input order, one workspace page per task.
    ///
    /// Strictly sequential: task N's page writes complete before task
    /// N+1 begins, so workspace write order matches task order.
    #[instrument(skip_all, fields(tasks = context.tasks.len()))]
    pub async fn execute_tasks(
        &self,
        context: &AgentContext,
        progress: &dyn Progress,
    ) -> BatchReport {
        let total = context.tasks.len();
        let mut records = Vec::with_capacity(total);
        let mut aborted = false;

        for (index, task) in context.tasks.iter().enumerate() {
            if aborted {
                records.push(TaskRecord {
                    task_id: task.id.clone(),
                    title: page_title(task),
                    outcome: TaskOutcome::NotAttempted,
                });
                continue;
            }

            progress.task_started(&task.id, index + 1, total);

            let outcome = match self.run_task(context, task).await {
                Ok(page_id) => TaskOutcome::Succeeded { page_id },
                Err(e) => {
                    warn!(task = %task.id, error = %e, "task failed");
                    if self.config.fail_fast {
                        aborted = true;
                    }
                    TaskOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };

            progress.task_finished(&task.id, &outcome);
            records.push(TaskRecord {
                task_id: task.id.clone(),
                title: page_title(task),
                outcome,
            });
        }

        let report = BatchReport { records };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            not_attempted = report.not_attempted(),
            "batch complete"
        );
        progress.done(&report);
        report
    }

    /// One task, start to finish: generate content, create the page,
    /// set the generated status, attach the comment. The status/comment
    /// order follows `write_order`.
    async fn run_task(&self, context: &AgentContext, task: &LearningTask) -> Result<PageId> {
        let body = self.generator.generate(context, task).await?;

        let parent = self
            .config
            .parent_page
            .clone()
            .unwrap_or_else(|| context.profile.learner_id.clone());

        let page = PageWrite {
            parent,
            title: page_title(task),
            body,
            properties: task_properties(task),
        };

        let page_id = self.workspace.create_page(&page).await?;

        let status: Properties = [(
            "status".to_string(),
            PropertyValue::text(STATUS_GENERATED),
        )]
        .into();
        let comment = format!("Automated task: {}", task.description);

        match self.config.write_order {
            WriteOrder::StatusFirst => {
                self.workspace.update_page(&page_id, &status).await?;
                self.workspace.create_comment(&page_id, &comment).await?;
            }
            WriteOrder::CommentFirst => {
                self.workspace.create_comment(&page_id, &comment).await?;
                self.workspace.update_page(&page_id, &status).await?;
            }
        }

        info!(task = %task.id, page = %page_id, "task persisted");
        Ok(page_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use studyloop_extract::{LineExtractor, MemorySource};
    use studyloop_generate::TemplateGenerator;
    use studyloop_knowledge::MemoryWorkspace;
    use studyloop_shared::{CompetencyLevel, ExtractedText, Priority, TaskKind};

    use crate::progress::SilentProgress;

    const DOC: &str = "note-1";

    fn profile() -> LearnerProfile {
        LearnerProfile {
            learner_id: "learner-demo".into(),
            competency: CompetencyLevel::Intermediate,
            learning_goal: "linear functions and word problems".into(),
            preferred_style: "walkthrough + plan".into(),
        }
    }

    fn task(id: &str, kind: TaskKind, priority: u8) -> LearningTask {
        LearningTask {
            id: id.into(),
            kind,
            description: format!("work on {id}"),
            priority: Priority::new(priority).unwrap(),
            due: None,
        }
    }

    fn demo_tasks() -> Vec<LearningTask> {
        vec![
            task("T1", TaskKind::Annotation, 5),
            task("T2", TaskKind::Analysis, 4),
            task("T3", TaskKind::Organization, 3),
            task("T4", TaskKind::Planning, 4),
        ]
    }

    fn source() -> MemorySource {
        let mut source = MemorySource::new();
        source.insert(DOC, "Solve: 2x + 1 = 9\nx = 4".as_bytes());
        source
    }

    fn agent_with<G: ContentGenerator>(
        generator: G,
        workspace: MemoryWorkspace,
        config: PipelineConfig,
    ) -> LearningAgent<MemorySource, LineExtractor, G, MemoryWorkspace> {
        LearningAgent::new(source(), LineExtractor, generator, workspace, config)
    }

    // -----------------------------------------------------------------------
    // Doubles
    // -----------------------------------------------------------------------

    /// Generator that fails for one task id and delegates otherwise.
    struct FailingFor {
        task_id: String,
        inner: TemplateGenerator,
    }

    impl ContentGenerator for FailingFor {
        async fn generate(&self, context: &AgentContext, task: &LearningTask) -> Result<String> {
            if task.id == self.task_id {
                return Err(studyloop_shared::StudyLoopError::Generation(
                    "engine unavailable".into(),
                ));
            }
            self.inner.generate(context, task).await
        }
    }

    /// Extractor that counts invocations and delegates to the line extractor.
    #[derive(Clone, Default)]
    struct CountingExtractor {
        calls: Arc<AtomicUsize>,
    }

    impl TextExtractor for CountingExtractor {
        async fn extract(&self, doc: &DocumentRef, bytes: &[u8]) -> Result<ExtractedText> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            LineExtractor.extract(doc, bytes).await
        }
    }

    /// Workspace that records the order of calls across tasks.
    #[derive(Clone, Default)]
    struct RecordingWorkspace {
        inner: MemoryWorkspace,
        calls: Arc<std::sync::Mutex<Vec<String>>>,
    }

    impl RecordingWorkspace {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Workspace for RecordingWorkspace {
        async fn create_page(&self, page: &PageWrite) -> Result<PageId> {
            self.calls.lock().unwrap().push(format!("create {}", page.title));
            self.inner.create_page(page).await
        }

        async fn update_page(&self, id: &PageId, properties: &Properties) -> Result<()> {
            self.calls.lock().unwrap().push("update".into());
            self.inner.update_page(id, properties).await
        }

        async fn create_comment(&self, id: &PageId, text: &str) -> Result<()> {
            self.calls.lock().unwrap().push("comment".into());
            self.inner.create_comment(id, text).await
        }
    }

    // -----------------------------------------------------------------------
    // Context assembly
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn context_is_built_with_a_single_extraction() {
        let extractor = CountingExtractor::default();
        let agent = LearningAgent::new(
            source(),
            extractor.clone(),
            TemplateGenerator::default(),
            MemoryWorkspace::new(),
            PipelineConfig::default(),
        );

        let context = agent
            .build_context(&DocumentRef::new(DOC), profile(), demo_tasks())
            .await
            .expect("context");
        agent.execute_tasks(&context, &SilentProgress).await;

        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(context.tasks.len(), 4);
        assert_eq!(context.text.spans.len(), 2);
    }

    #[tokio::test]
    async fn missing_document_aborts_context_build() {
        let agent = agent_with(
            TemplateGenerator::default(),
            MemoryWorkspace::new(),
            PipelineConfig::default(),
        );

        let err = agent
            .build_context(&DocumentRef::new("missing"), profile(), demo_tasks())
            .await
            .expect_err("unregistered doc");
        assert!(matches!(err, studyloop_shared::StudyLoopError::Io { .. }));
    }

    // -----------------------------------------------------------------------
    // Task loop
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn report_matches_task_order_and_length() {
        let workspace = MemoryWorkspace::new();
        let agent = agent_with(
            TemplateGenerator::default(),
            workspace.clone(),
            PipelineConfig::default(),
        );

        let context = agent
            .build_context(&DocumentRef::new(DOC), profile(), demo_tasks())
            .await
            .unwrap();
        let report = agent.execute_tasks(&context, &SilentProgress).await;

        assert_eq!(report.len(), 4);
        assert!(report.fully_succeeded());
        assert_eq!(
            report.records.iter().map(|r| r.task_id.as_str()).collect::<Vec<_>>(),
            vec!["T1", "T2", "T3", "T4"]
        );
        assert_eq!(report.records[0].title, "annotation-T1");

        // Pages were created in task order with ids matching the report.
        let pages = workspace.pages();
        assert_eq!(pages.len(), 4);
        for (page_id, _) in &pages {
            assert!(report.page_ids().contains(&page_id));
        }
        assert_eq!(
            report.page_ids(),
            pages.iter().map(|(id, _)| id).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn each_page_gets_status_and_one_comment() {
        let workspace = MemoryWorkspace::new();
        let agent = agent_with(
            TemplateGenerator::default(),
            workspace.clone(),
            PipelineConfig::default(),
        );

        let context = agent
            .build_context(&DocumentRef::new(DOC), profile(), demo_tasks())
            .await
            .unwrap();
        agent.execute_tasks(&context, &SilentProgress).await;

        for (expected, (_, page)) in context.tasks.iter().zip(workspace.pages()) {
            assert_eq!(
                page.properties["status"],
                PropertyValue::Text("generated".into())
            );
            assert_eq!(
                page.properties["type"],
                PropertyValue::Text(expected.kind.as_str().into())
            );
            assert_eq!(
                page.properties["priority"],
                PropertyValue::Number(f64::from(expected.priority.get()))
            );
            assert_eq!(page.properties["due"], PropertyValue::Text(DUE_UNSET.into()));
            assert_eq!(page.comments.len(), 1);
            assert_eq!(
                page.comments[0],
                format!("Automated task: {}", expected.description)
            );
            assert_eq!(page.write.parent, "learner-demo");
        }
    }

    #[tokio::test]
    async fn one_failing_task_does_not_abort_siblings() {
        let workspace = MemoryWorkspace::new();
        let agent = agent_with(
            FailingFor {
                task_id: "T2".into(),
                inner: TemplateGenerator::default(),
            },
            workspace.clone(),
            PipelineConfig::default(),
        );

        let context = agent
            .build_context(&DocumentRef::new(DOC), profile(), demo_tasks())
            .await
            .unwrap();
        let report = agent.execute_tasks(&context, &SilentProgress).await;

        assert_eq!(report.len(), 4);
        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.failed(), 1);
        assert!(matches!(
            &report.records[1].outcome,
            TaskOutcome::Failed { reason } if reason.contains("engine unavailable")
        ));
        assert_eq!(workspace.page_count(), 3);
        assert_eq!(report.page_ids().len(), 3);
    }

    #[tokio::test]
    async fn fail_fast_marks_remaining_tasks_not_attempted() {
        let workspace = MemoryWorkspace::new();
        let config = PipelineConfig {
            fail_fast: true,
            ..PipelineConfig::default()
        };
        let agent = agent_with(
            FailingFor {
                task_id: "T2".into(),
                inner: TemplateGenerator::default(),
            },
            workspace.clone(),
            config,
        );

        let context = agent
            .build_context(&DocumentRef::new(DOC), profile(), demo_tasks())
            .await
            .unwrap();
        let report = agent.execute_tasks(&context, &SilentProgress).await;

        assert_eq!(report.len(), 4);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.not_attempted(), 2);
        assert!(matches!(report.records[2].outcome, TaskOutcome::NotAttempted));
        assert!(matches!(report.records[3].outcome, TaskOutcome::NotAttempted));
        assert_eq!(workspace.page_count(), 1);
    }

    // -----------------------------------------------------------------------
    // Write sequencing
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn status_first_sequencing_per_task() {
        let workspace = RecordingWorkspace::default();
        let agent = LearningAgent::new(
            source(),
            LineExtractor,
            TemplateGenerator::default(),
            workspace.clone(),
            PipelineConfig::default(),
        );

        let tasks = vec![
            task("T1", TaskKind::Annotation, 5),
            task("T2", TaskKind::Analysis, 4),
        ];
        let context = agent
            .build_context(&DocumentRef::new(DOC), profile(), tasks)
            .await
            .unwrap();
        agent.execute_tasks(&context, &SilentProgress).await;

        // Task N's three calls complete before task N+1 begins.
        assert_eq!(
            workspace.calls(),
            vec![
                "create annotation-T1",
                "update",
                "comment",
                "create analysis-T2",
                "update",
                "comment",
            ]
        );
    }

    #[tokio::test]
    async fn comment_first_sequencing_per_task() {
        let workspace = RecordingWorkspace::default();
        let config = PipelineConfig {
            write_order: WriteOrder::CommentFirst,
            ..PipelineConfig::default()
        };
        let agent = LearningAgent::new(
            source(),
            LineExtractor,
            TemplateGenerator::default(),
            workspace.clone(),
            config,
        );

        let context = agent
            .build_context(
                &DocumentRef::new(DOC),
                profile(),
                vec![task("T1", TaskKind::Annotation, 5)],
            )
            .await
            .unwrap();
        agent.execute_tasks(&context, &SilentProgress).await;

        assert_eq!(workspace.calls(), vec!["create annotation-T1", "comment", "update"]);
    }

    #[tokio::test]
    async fn configured_parent_overrides_learner_id() {
        let workspace = MemoryWorkspace::new();
        let config = PipelineConfig {
            parent_page: Some("inbox-page".into()),
            ..PipelineConfig::default()
        };
        let agent = agent_with(TemplateGenerator::default(), workspace.clone(), config);

        let context = agent
            .build_context(
                &DocumentRef::new(DOC),
                profile(),
                vec![task("T1", TaskKind::Annotation, 5)],
            )
            .await
            .unwrap();
        agent.execute_tasks(&context, &SilentProgress).await;

        let (_, page) = &workspace.pages()[0];
        assert_eq!(page.write.parent, "inbox-page");
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_report() {
        let agent = agent_with(
            TemplateGenerator::default(),
            MemoryWorkspace::new(),
            PipelineConfig::default(),
        );

        let context = agent
            .build_context(&DocumentRef::new(DOC), profile(), vec![])
            .await
            .unwrap();
        let report = agent.execute_tasks(&context, &SilentProgress).await;
        assert!(report.is_empty());
        assert!(report.fully_succeeded());
    }
}
