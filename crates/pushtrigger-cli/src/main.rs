//! pushtrigger - post-submit job dispatcher CLI
//!
//! ## Commands
//!
//! - `dispatch`: launch the post-submits that apply to a push event
//! - `validate`: check a job configuration file
//! - `changes`: print the change set of a push event

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pushtrigger_core::{ChangeSet, DispatchedJob, PushEvent};
use pushtrigger_dispatch::{
    DispatchPolicy, DispatchReport, FsLauncher, LaunchError, Launcher, PushDispatcher,
    StaticJobConfig,
};
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "pushtrigger")]
#[command(author = "Stevedores Org")]
#[command(version = pushtrigger_core::VERSION)]
#[command(about = "Dispatch post-submit jobs for push events", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch every configured post-submit that applies to a push
    Dispatch {
        /// Job configuration file (TOML)
        #[arg(short, long, env = "PUSHTRIGGER_CONFIG")]
        config: PathBuf,

        /// Push event JSON file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        event: PathBuf,

        /// Directory launched jobs are written to
        #[arg(short, long, env = "PUSHTRIGGER_OUTBOX")]
        outbox: Option<PathBuf>,

        /// Print jobs to stdout as JSON lines instead of writing the outbox
        #[arg(long)]
        dry_run: bool,

        /// Keep dispatching after a failed job and report all failures
        #[arg(long)]
        collect_errors: bool,
    },

    /// Check a job configuration file
    Validate {
        /// Job configuration file (TOML)
        #[arg(short, long, env = "PUSHTRIGGER_CONFIG")]
        config: PathBuf,
    },

    /// Print the files changed by a push
    Changes {
        /// Push event JSON file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        event: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    pushtrigger_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Dispatch {
            config,
            event,
            outbox,
            dry_run,
            collect_errors,
        } => cmd_dispatch(
            &config,
            &event,
            outbox.as_deref(),
            dry_run,
            collect_errors,
        ),
        Commands::Validate { config } => cmd_validate(&config),
        Commands::Changes { event } => cmd_changes(&event),
    }
}

/// Launcher for dry runs: one JSON document per line.
struct StdoutLauncher<W> {
    out: Mutex<W>,
}

impl<W: Write> StdoutLauncher<W> {
    fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

impl<W: Write + Send> Launcher for StdoutLauncher<W> {
    fn launch(&self, job: DispatchedJob) -> Result<DispatchedJob, LaunchError> {
        let line = serde_json::to_string(&job)?;
        let mut out = self.out.lock().map_err(|_| LaunchError::Rejected {
            job: job.spec.job.clone(),
            reason: "output lock poisoned".to_string(),
        })?;
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(job)
    }
}

fn read_event(path: &Path) -> Result<PushEvent> {
    let raw = if path == Path::new("-") {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read push event from stdin")?;
        raw
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read push event {}", path.display()))?
    };
    let event: PushEvent = serde_json::from_str(&raw).context("Failed to parse push event")?;
    debug!(guid = %event.guid, reference = %event.reference, "Read push event");
    Ok(event)
}

fn load_config(path: &Path) -> Result<StaticJobConfig> {
    StaticJobConfig::load(path)
        .with_context(|| format!("Failed to load job config {}", path.display()))
}

fn cmd_dispatch(
    config: &Path,
    event: &Path,
    outbox: Option<&Path>,
    dry_run: bool,
    collect_errors: bool,
) -> Result<()> {
    let store = load_config(config)?;
    let event = read_event(event)?;

    let launcher: Arc<dyn Launcher> = if dry_run {
        Arc::new(StdoutLauncher::new(io::stdout()))
    } else {
        let outbox = outbox
            .context("No outbox configured: pass --outbox, set PUSHTRIGGER_OUTBOX or use --dry-run")?;
        Arc::new(
            FsLauncher::new(outbox)
                .with_context(|| format!("Failed to open outbox {}", outbox.display()))?,
        )
    };

    let report = dispatch(store, launcher, &event, collect_errors)?;

    // stdout belongs to the job stream on dry runs
    let summary = render_report(&event, &report);
    if dry_run {
        eprint!("{summary}");
    } else {
        print!("{summary}");
    }
    Ok(())
}

fn dispatch(
    store: StaticJobConfig,
    launcher: Arc<dyn Launcher>,
    event: &PushEvent,
    collect_errors: bool,
) -> Result<DispatchReport> {
    let policy = if collect_errors {
        DispatchPolicy::CollectAll
    } else {
        DispatchPolicy::AbortOnFirst
    };
    PushDispatcher::new(Arc::new(store), launcher)
        .with_policy(policy)
        .handle_push(event)
        .with_context(|| format!("Failed to dispatch push {}", event.guid))
}

fn render_report(event: &PushEvent, report: &DispatchReport) -> String {
    let repo = event.repo.full_name();
    if report.branch_deleted {
        return format!("{repo}: branch '{}' deleted, nothing to dispatch\n", event.branch());
    }

    let mut out = format!(
        "{repo}@{}: {} launched, {} skipped\n",
        event.branch(),
        report.launched_count(),
        report.skipped.len()
    );
    for job in &report.launched {
        out.push_str(&format!("  launched {} as {}\n", job.spec.job, job.name));
    }
    for job in &report.skipped {
        out.push_str(&format!("  skipped  {job}\n"));
    }
    out
}

fn cmd_validate(config: &Path) -> Result<()> {
    let store = load_config(config)?;
    println!(
        "{}: {} job(s) across {} repositor{}",
        config.display(),
        store.job_count(),
        store.repos().count(),
        if store.repos().count() == 1 { "y" } else { "ies" }
    );
    Ok(())
}

fn cmd_changes(event: &Path) -> Result<()> {
    let event = read_event(event)?;
    for path in ChangeSet::from_push(&event).iter() {
        println!("{path}");
    }
    Ok(())
}
