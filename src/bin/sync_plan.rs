//! One plan-synchronization pass from the command line.
//!
//! Finds or creates the configured plan and prints the ids of its runs, one
//! per line, for the test harness to pick up.

use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use testrail_sync::config::Config;
use testrail_sync::gateway::ApiClient;
use testrail_sync::services::{sync_plan, PlanSyncOptions};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let client = match ApiClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build TestRail client: {}", e);
            std::process::exit(1);
        }
    };

    let options = PlanSyncOptions {
        project_id: config.project_id,
        plan_title: config.plan_name.clone(),
        base_plan_id: config.base_plan_id,
        created_by: config.user_id,
        desired_run_names: config.run_names.clone(),
    };

    match sync_plan(&client, &options).await {
        Ok(run_ids) => {
            info!("Plan '{}' resolved to {} run(s)", config.plan_name, run_ids.len());
            for run_id in run_ids {
                println!("{}", run_id);
            }
        }
        Err(e) => {
            error!(
                "Plan synchronization failed for '{}' in project {}: {}",
                config.plan_name, config.project_id, e
            );
            std::process::exit(1);
        }
    }
}
