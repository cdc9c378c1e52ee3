//! tfb-ui - Team Feedback Tool
//!
//! Local single-user web service for collecting tenet-based peer
//! feedback and aggregating it into manager reports. Serves a static
//! HTML/JS front end over a JSON API backed by a local SQLite database.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tfb_common::config::{DataFolderInitializer, DataFolderResolver};
use tfb_common::TenetCatalog;
use tracing::info;

use tfb_ui::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "tfb-ui", about = "Team Feedback Tool web service")]
struct Args {
    /// Data folder holding feedback.db and tenets.json
    #[arg(long, env = "TFB_DATA_FOLDER")]
    data_folder: Option<PathBuf>,

    /// Listen port
    #[arg(long, default_value_t = 5780)]
    port: u16,

    /// Seed demo orgchart and feedback data, then exit
    #[arg(long)]
    generate_sample: bool,

    /// Overwrite existing data when seeding samples
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting Team Feedback Tool (tfb-ui) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    // Resolve data folder: CLI > env > config file > platform default
    let resolver = DataFolderResolver::new(args.data_folder.clone());
    let data_folder = resolver.resolve();

    let initializer = DataFolderInitializer::new(data_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());

    let db_pool = tfb_common::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let catalog = TenetCatalog::load(&initializer.tenets_path())?;
    info!("Tenet catalog loaded ({} active tenets)", catalog.tenets().len());

    if args.generate_sample {
        let report = tfb_ui::sample::generate_sample_data(&db_pool, &catalog, args.force).await?;
        info!(
            "Sample data generated: {} people, {} peer feedback, {} manager feedback, {} imported rows",
            report.people, report.peer_feedback, report.manager_feedback, report.workday_rows
        );
        return Ok(());
    }

    let state = AppState::new(db_pool, catalog);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", args.port)).await?;
    info!("Listening on http://127.0.0.1:{}", args.port);
    info!("Health check: http://127.0.0.1:{}/health", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
