//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

use studyloop_core::{
    BatchReport, FeedbackLog, LearningAgent, Progress, TaskOutcome,
};
use studyloop_extract::{LineExtractor, LocalFileSource, RemoteOcr, TextExtractor};
use studyloop_generate::TemplateGenerator;
use studyloop_knowledge::{HttpWorkspace, MemoryWorkspace, Workspace, mistake_log, study_plan};
use studyloop_shared::{
    AppConfig, CompetencyLevel, DocumentRef, LearnerProfile, LearningTask, PipelineConfig,
    Priority, TaskKind, init_config, load_config, workspace_token,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// studyloop — turn captured study work into workspace task pages.
#[derive(Parser)]
#[command(
    name = "studyloop",
    version,
    about = "Turn captured study documents into knowledge-workspace task pages with a feedback loop.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Process a captured study document end to end.
    Run {
        /// Captured document to process (defaults to the configured sample).
        #[arg(short, long)]
        document: Option<PathBuf>,

        /// Parent container for created pages (defaults to the learner id).
        #[arg(long)]
        parent: Option<String>,

        /// Abort the batch on the first task failure.
        #[arg(long)]
        fail_fast: bool,
    },

    /// Print the destination database schemas.
    Schema {
        /// Which schema to print: mistake-log, study-plan, or all.
        #[arg(default_value = "all")]
        which: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "studyloop=info",
        1 => "studyloop=debug",
        _ => "studyloop=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            document,
            parent,
            fail_fast,
        } => cmd_run(document, parent, fail_fast).await,
        Command::Schema { which } => cmd_schema(&which),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

async fn cmd_run(
    document: Option<PathBuf>,
    parent: Option<String>,
    fail_fast: bool,
) -> Result<()> {
    let config = load_config()?;

    let document = document.unwrap_or_else(|| PathBuf::from(&config.defaults.document));
    let doc = DocumentRef::new(document.to_string_lossy().to_string());

    let mut pipeline = PipelineConfig::from(&config);
    if fail_fast {
        pipeline.fail_fast = true;
    }
    if parent.is_some() {
        pipeline.parent_page = parent;
    }

    let args = RunArgs {
        doc,
        profile: demo_profile(),
        tasks: demo_tasks(),
        generator: TemplateGenerator::new(config.defaults.excerpt_chars),
        pipeline,
    };

    info!(doc = %args.doc, tasks = args.tasks.len(), "processing captured document");

    // Workspace and extractor selection is config-driven: remote backends
    // engage only when their endpoint/token is configured.
    let token = workspace_token(&config);
    let dry_run = token.is_none();

    match (ocr_endpoint(&config)?, token) {
        (Some(endpoint), Some(token)) => {
            let extractor = RemoteOcr::new(endpoint, ocr_timeout(&config))?;
            let workspace = http_workspace(&config, token)?;
            run_pipeline(args, extractor, workspace, dry_run).await
        }
        (Some(endpoint), None) => {
            let extractor = RemoteOcr::new(endpoint, ocr_timeout(&config))?;
            run_pipeline(args, extractor, MemoryWorkspace::new(), dry_run).await
        }
        (None, Some(token)) => {
            let workspace = http_workspace(&config, token)?;
            run_pipeline(args, LineExtractor, workspace, dry_run).await
        }
        (None, None) => run_pipeline(args, LineExtractor, MemoryWorkspace::new(), dry_run).await,
    }
}

struct RunArgs {
    doc: DocumentRef,
    profile: LearnerProfile,
    tasks: Vec<LearningTask>,
    generator: TemplateGenerator,
    pipeline: PipelineConfig,
}

/// The entry sequence: build the shared context, execute the batch,
/// record sample feedback, and print the summary.
async fn run_pipeline<X: TextExtractor, W: Workspace>(
    args: RunArgs,
    extractor: X,
    workspace: W,
    dry_run: bool,
) -> Result<()> {
    let agent = LearningAgent::new(
        LocalFileSource,
        extractor,
        args.generator,
        workspace,
        args.pipeline,
    );
    let progress = CliProgress::new();

    progress.phase("Extracting document");
    let context = agent
        .build_context(&args.doc, args.profile, args.tasks)
        .await?;

    progress.phase("Executing tasks");
    let report = agent.execute_tasks(&context, &progress).await;

    let mut feedback = FeedbackLog::new();
    for (index, task) in context.tasks.iter().enumerate() {
        feedback.record(
            task,
            4.5 - index as f64 * 0.5,
            format!("Sample feedback: {}", task.description),
        );
    }

    print_summary(&report, &feedback, dry_run);

    if !report.fully_succeeded() {
        return Err(eyre!(
            "{} of {} tasks did not complete",
            report.len() - report.succeeded(),
            report.len()
        ));
    }
    Ok(())
}

fn print_summary(report: &BatchReport, feedback: &FeedbackLog, dry_run: bool) {
    println!();
    if dry_run {
        println!("  Dry run: in-memory workspace (set the workspace token to write remotely)");
    }
    println!(
        "  Tasks: {} succeeded, {} failed, {} not attempted",
        report.succeeded(),
        report.failed(),
        report.not_attempted()
    );
    for record in &report.records {
        match &record.outcome {
            TaskOutcome::Succeeded { page_id } => {
                println!("    {:<18} page {page_id}", record.title);
            }
            TaskOutcome::Failed { reason } => {
                println!("    {:<18} failed: {reason}", record.title);
            }
            TaskOutcome::NotAttempted => {
                println!("    {:<18} not attempted", record.title);
            }
        }
    }
    match feedback.strategy_note() {
        Some(note) => println!("  Strategy: {}", note.summary),
        None => println!("  Strategy: no feedback recorded"),
    }
    println!();
}

// ---------------------------------------------------------------------------
// Demo profile and batch
// ---------------------------------------------------------------------------

fn demo_profile() -> LearnerProfile {
    LearnerProfile {
        learner_id: "learner-demo".into(),
        competency: CompetencyLevel::Intermediate,
        learning_goal: "consolidate linear functions and word problems".into(),
        preferred_style: "walkthrough + plan".into(),
    }
}

fn demo_tasks() -> Vec<LearningTask> {
    vec![
        LearningTask {
            id: "T1".into(),
            kind: TaskKind::Annotation,
            description: "add margin notes and error-cause analysis".into(),
            priority: Priority::new(5).expect("valid priority"),
            due: None,
        },
        LearningTask {
            id: "T2".into(),
            kind: TaskKind::Analysis,
            description: "generate a step-by-step walkthrough with knowledge points".into(),
            priority: Priority::new(4).expect("valid priority"),
            due: None,
        },
        LearningTask {
            id: "T3".into(),
            kind: TaskKind::Organization,
            description: "organize the capture into a markdown note".into(),
            priority: Priority::new(3).expect("valid priority"),
            due: None,
        },
        LearningTask {
            id: "T4".into(),
            kind: TaskKind::Planning,
            description: "draft a 3-day review plan".into(),
            priority: Priority::new(4).expect("valid priority"),
            due: Some(chrono::Utc::now() + chrono::Duration::days(3)),
        },
    ]
}

// ---------------------------------------------------------------------------
// Backend selection helpers
// ---------------------------------------------------------------------------

fn ocr_endpoint(config: &AppConfig) -> Result<Option<Url>> {
    if config.ocr.endpoint.is_empty() {
        return Ok(None);
    }
    Url::parse(&config.ocr.endpoint)
        .map(Some)
        .map_err(|e| eyre!("invalid OCR endpoint '{}': {e}", config.ocr.endpoint))
}

fn ocr_timeout(config: &AppConfig) -> Duration {
    Duration::from_secs(config.ocr.timeout_secs)
}

fn http_workspace(config: &AppConfig, token: String) -> Result<HttpWorkspace> {
    let base_url = Url::parse(&config.workspace.base_url)
        .map_err(|e| eyre!("invalid workspace base URL '{}': {e}", config.workspace.base_url))?;
    Ok(HttpWorkspace::new(base_url, token)?)
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl Progress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn task_started(&self, task_id: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Task [{current}/{total}] {task_id}"));
    }

    fn task_finished(&self, _task_id: &str, _outcome: &TaskOutcome) {}

    fn done(&self, _report: &BatchReport) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// schema / config
// ---------------------------------------------------------------------------

fn cmd_schema(which: &str) -> Result<()> {
    match which {
        "mistake-log" => println!("{}", mistake_log().render()),
        "study-plan" => println!("{}", study_plan().render()),
        "all" => {
            println!("{}", mistake_log().render());
            println!("{}", study_plan().render());
        }
        other => {
            return Err(eyre!(
                "unknown schema '{other}' — expected mistake-log, study-plan, or all"
            ));
        }
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("created {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
