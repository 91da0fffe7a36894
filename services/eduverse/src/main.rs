//! EduVerse CLI
//!
//! Serves the dashboard or runs a single dashboard action against the backend.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eduverse::controller::DashboardController;
use eduverse::model::CreateOutcome;
use eduverse::{build_controller, load_config, Config};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Level};

#[derive(Parser)]
#[command(name = "eduverse")]
#[command(about = "EduVerse coaching-institute dashboard")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config file)
    #[arg(long, env = "EDUVERSE_BACKEND_URL")]
    backend_url: Option<String>,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard (default)
    Serve,

    /// Show backend health and the institution list
    Status,

    /// Create a free-plan institution
    CreateInstitution {
        /// Institute name
        #[arg(long, default_value = "")]
        name: String,

        /// Subdomain
        #[arg(long, default_value = "")]
        subdomain: String,
    },

    /// Create a demo teacher and batch for the first institution
    DemoSetup,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    debug!(
        "Parsed command line arguments: config={:?}, backend_url={:?}, dashboard_port={:?}, log_level={:?}",
        args.config,
        args.backend_url,
        args.dashboard_port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        debug!("Using default configuration");
        Config::default()
    };

    if let Some(backend_url) = args.backend_url {
        config.backend.base_url = backend_url;
    }
    if let Some(dashboard_port) = args.dashboard_port {
        config.dashboard.port = dashboard_port;
    }

    debug!("Backend at {}", config.backend.base_url);

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            info!("Starting EduVerse dashboard");
            eduverse::run(config).await?;
        }
        Commands::Status => {
            let controller = build_controller(&config, &CancellationToken::new())?;
            run_status(&controller).await?;
        }
        Commands::CreateInstitution { name, subdomain } => {
            let controller = build_controller(&config, &CancellationToken::new())?;
            run_create_institution(&controller, &name, &subdomain).await?;
        }
        Commands::DemoSetup => {
            let controller = build_controller(&config, &CancellationToken::new())?;
            run_demo_setup(&controller).await?;
        }
    }

    Ok(())
}

async fn run_status(controller: &DashboardController) -> Result<(), Box<dyn std::error::Error>> {
    let report = controller.initialize().await;
    let state = controller.snapshot().await;

    match (&report.health, &state.health) {
        (Ok(()), Some(health)) => {
            info!("Backend: {}", health.backend);
            info!("Database: {}", health.database);
            info!("Collections: {}", health.collections.join(", "));
        }
        (Err(e), _) => warn!("Health check unavailable: {}", e),
        _ => {}
    }

    report.institutions?;
    info!("Institutions: {}", state.institutions.len());
    for institution in &state.institutions {
        info!(
            "  {} ({}) plan={} subdomain={}",
            institution.name,
            institution.id,
            institution.plan,
            institution.subdomain.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

async fn run_create_institution(
    controller: &DashboardController,
    name: &str,
    subdomain: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    controller.update_form(name, subdomain).await;
    match controller.submit_form().await? {
        CreateOutcome::Created { id } => {
            let count = controller.snapshot().await.institutions.len();
            info!("Created institution '{}' with id {}", name, id);
            info!("Institutions: {}", count);
        }
        CreateOutcome::MissingIdentifier => {
            warn!("Backend did not return an identifier; institution list not refreshed");
        }
    }
    Ok(())
}

async fn run_demo_setup(controller: &DashboardController) -> Result<(), Box<dyn std::error::Error>> {
    controller.refresh_institutions().await?;
    let report = controller.demo_setup().await?;
    info!(
        "Demo data ready for institution {}: {} students",
        report.institution_id,
        report.students.len()
    );
    for student in &report.students {
        info!("  {}", serde_json::to_string(student)?);
    }
    Ok(())
}
