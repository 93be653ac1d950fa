//! Entry point: wire the clients together and run one posting cycle.
//!
//! Invoked periodically by an external scheduler; each invocation posts
//! at most one group. Exit code 0 covers normal completion, "nothing to
//! post" and partially aborted groups; exit code 1 means a setup,
//! credential or data-read failure prevented the run.

mod constants;
mod cycle;
mod domain;
mod services;

use base64::Engine;
use log::{error, info, warn};

use cycle::{CycleConfig, CycleOutcome, run_cycle};
use services::cloudinary::CloudinaryClient;
use services::media::MediaResolver;
use services::session;
use services::sheets::{ServiceAccountKey, SheetsClient};
use services::store::SheetsStore;
use services::threads::{ThreadsClient, ThreadsPublisher};

struct Config {
    service_account: ServiceAccountKey,
    spreadsheet_id: String,
    cloudinary: Option<CloudinaryClient>,
}

fn load_config() -> Result<Config, String> {
    let raw_key = std::env::var("GOOGLE_SERVICE_ACCOUNT_JSON")
        .map_err(|_| "GOOGLE_SERVICE_ACCOUNT_JSON must be set".to_string())?;
    let service_account = parse_service_account(&raw_key)?;

    let spreadsheet_id =
        std::env::var("SPREADSHEET_ID").map_err(|_| "SPREADSHEET_ID must be set".to_string())?;

    // Upload credentials are optional: without them local media paths
    // degrade to text-only posts instead of failing the run.
    let cloudinary = match (
        std::env::var("CLOUDINARY_CLOUD_NAME"),
        std::env::var("CLOUDINARY_API_KEY"),
        std::env::var("CLOUDINARY_API_SECRET"),
    ) {
        (Ok(cloud_name), Ok(api_key), Ok(api_secret)) => {
            Some(CloudinaryClient::new(&cloud_name, &api_key, &api_secret))
        }
        _ => {
            warn!("Cloudinary credentials not set, local media uploads disabled");
            None
        }
    };

    Ok(Config {
        service_account,
        spreadsheet_id,
        cloudinary,
    })
}

/// Accepts the key file either as inline JSON or base64-encoded (the
/// usual shape when stored in CI secrets).
fn parse_service_account(raw: &str) -> Result<ServiceAccountKey, String> {
    let json = if raw.trim_start().starts_with('{') {
        raw.to_string()
    } else {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(raw.trim())
            .map_err(|e| format!("GOOGLE_SERVICE_ACCOUNT_JSON is neither JSON nor base64: {}", e))?;
        String::from_utf8(decoded)
            .map_err(|e| format!("GOOGLE_SERVICE_ACCOUNT_JSON decodes to invalid UTF-8: {}", e))?
    };

    serde_json::from_str(&json).map_err(|e| format!("invalid service-account key file: {}", e))
}

async fn run() -> Result<(), String> {
    let config = load_config()?;

    let sheets = SheetsClient::connect(&config.service_account, &config.spreadsheet_id)
        .await
        .map_err(|e| format!("spreadsheet connection failed: {}", e))?;
    info!("connected to spreadsheet");

    let threads = ThreadsClient::new();

    let session = session::load(&sheets)
        .await
        .map_err(|e| format!("failed to load session: {}", e))?;
    let session = session::ensure_valid(&sheets, &threads, session)
        .await
        .map_err(|e| e.to_string())?;

    let store = SheetsStore::new(sheets);
    let resolver = MediaResolver::new(config.cloudinary);
    let publisher = ThreadsPublisher::new(threads, resolver, session);

    let outcome = run_cycle(
        &store,
        &publisher,
        &mut rand::rng(),
        &CycleConfig::default(),
    )
    .await
    .map_err(|e| e.to_string())?;

    match outcome {
        CycleOutcome::NothingToPost => info!("nothing to post"),
        CycleOutcome::Posted {
            group,
            posted,
            total,
        } if posted == total => {
            info!("posted group {} ({}/{} rows)", group, posted, total);
        }
        CycleOutcome::Posted {
            group,
            posted,
            total,
        } => {
            warn!(
                "group {} aborted after {}/{} rows; the rest stay eligible",
                group, posted, total
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}
