//! TestRail suite backup rotation - main entry point.
//!
//! Reads the checkpoint of the previous rotation, rolls every tracked
//! suite's backups forward one generation, and rewrites the checkpoint with
//! whatever was completed, also when the pass aborts, so the next
//! invocation can resume with the suites not yet reached.

use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use testrail_sync::checkpoint;
use testrail_sync::config::Config;
use testrail_sync::gateway::ApiClient;
use testrail_sync::services::rotate_all;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - TESTRAIL_URL, TESTRAIL_USERNAME, TESTRAIL_PASSWORD must be set");
            error!("  - TESTRAIL_USER_ID, TESTRAIL_PROJECT_ID must be numeric ids");
            error!("  - TESTRAIL_PLAN_NAME and TESTRAIL_BASE_PLAN_ID must be set");
            std::process::exit(1);
        }
    };

    info!("<-------------------- Backup rotation started -------------------->");

    let client = match ApiClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build TestRail client: {}", e);
            std::process::exit(1);
        }
    };

    let records = match checkpoint::load(&config.checkpoint_path) {
        Ok(records) => records,
        Err(e) => {
            error!("Cannot read backup checkpoint: {}", e);
            std::process::exit(1);
        }
    };

    let report = rotate_all(&client, &records).await;

    // Persist the completed rows on both paths; this checkpoint is what makes
    // an aborted pass resumable.
    if let Err(e) = checkpoint::store(&config.checkpoint_path, &report.completed) {
        error!("Failed to persist backup checkpoint: {}", e);
        std::process::exit(1);
    }

    match report.aborted {
        None => {
            info!("All {} suite(s) rotated", report.completed.len());
        }
        Some(failure) => {
            error!(
                "Not all suites were backed up: {} of {} done, stopped at '{}': {}",
                report.completed.len(),
                records.len(),
                failure.suite_name,
                failure.error
            );
            std::process::exit(1);
        }
    }
}
