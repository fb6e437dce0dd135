use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use portal_core::config::PortalCoreConfig;
use portal_core::contract::model::{ApplicationDecision, Section};
use portal_core::infra::identity::static_identity::StaticIdentity;
use portal_core::infra::storage::memory_store::InMemoryStore;
use portal_core::{Dashboard, PortalCore};
use runtime::{AppConfig, CliArgs};

mod seed;

const MODULE_NAME: &str = "portal_core";

/// Portal Demo - scripted tutor session against the in-memory portal store
#[derive(Parser)]
#[command(name = "portal-demo")]
#[command(about = "Portal Demo - scripted tutor session against the portal dashboard core")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scripted session and print the audit trail as JSON
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.home_dir));
    tracing::info!("Portal demo starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_session(config).await,
        Commands::Check => check_config(config),
    }
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    let module: PortalCoreConfig = config.module_config(MODULE_NAME)?;
    tracing::debug!(role = ?module.role, "portal_core configuration parsed");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}

async fn run_session(config: AppConfig) -> Result<()> {
    let module: PortalCoreConfig = config.module_config(MODULE_NAME)?;

    let store = InMemoryStore::new();
    seed::populate(&store).await?;

    let identity = Arc::new(StaticIdentity::signed_in(seed::tutor()?));
    let portal = PortalCore::init(module, store.portal_store(), identity)?;

    let mut events = Box::pin(portal.events());
    let event_log = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            tracing::info!(?event, "domain event");
        }
    });

    let dash = portal.open_dashboard().await;
    let _watchers = watch_views(&dash);

    script(&dash).await?;

    let trail = dash
        .audit_trail()
        .value()
        .ok_or_else(|| anyhow!("audit trail produced no snapshot"))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&*trail).context("Failed to render audit trail")?
    );

    event_log.abort();
    tracing::info!(entries = trail.len(), "Portal demo finished");
    Ok(())
}

/// Keep every dashboard view live for the session and log what it reports.
fn watch_views(dash: &Dashboard) -> Vec<live_state::Subscription> {
    vec![
        dash.tutor_courses()
            .subscribe(|d| log_delivery("tutor_courses", d.as_ref().map(|c| c.len()))),
        dash.all_students()
            .subscribe(|d| log_delivery("all_students", d.as_ref().map(|s| s.len()))),
        dash.pending_applications()
            .subscribe(|d| log_delivery("pending_applications", d.as_ref().map(|n| *n))),
        dash.application_queue()
            .subscribe(|d| log_delivery("application_queue", d.as_ref().map(|q| q.len()))),
        dash.selected_student().subscribe(|d| match d {
            Ok(Some(student)) => tracing::info!(student = %student.display_name, "selected student"),
            Ok(None) => tracing::info!("no student selected"),
            Err(e) => tracing::warn!(error = %e, "selected_student failed"),
        }),
        dash.chat_messages()
            .subscribe(|d| log_delivery("chat_messages", d.as_ref().map(|m| m.len()))),
        dash.audit_trail()
            .subscribe(|d| log_delivery("audit_trail", d.as_ref().map(|t| t.len()))),
        dash.current_section()
            .subscribe(|section: &Section| tracing::info!(?section, "section changed")),
    ]
}

fn log_delivery(view: &str, delivery: Result<usize, &live_state::ViewError>) {
    match delivery {
        Ok(size) => tracing::info!(view, size, "view updated"),
        Err(e) => tracing::warn!(view, error = %e, "view failed"),
    }
}

async fn script(dash: &Dashboard) -> Result<()> {
    dash.set_section(Section::Courses);
    let course = dash
        .create_course("Distributed Systems", "Computer Science")
        .await?;
    dash.update_course_content(seed::COURSE_ID, "Week 1: what is a computer?")
        .await?;
    dash.update_course_content(course.id.as_str(), "Week 1: clocks and ordering")
        .await?;

    dash.set_section(Section::Messages);
    dash.select_student("student-1")?;
    dash.send_message_to_selected("Welcome to the course!").await?;
    dash.send_message_to_selected("Office hours are on Friday.")
        .await?;
    dash.clear_selection();

    dash.set_section(Section::Applications);
    let queue = dash.application_queue().value().unwrap_or_default();
    for card in queue.iter() {
        dash.review_application(card.enrollment.id.as_str(), ApplicationDecision::Approve)
            .await?;
    }

    dash.set_section(Section::Dashboard);
    Ok(())
}
