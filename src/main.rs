use anyhow::Context;
use credential_service::telemetry::{init_tracing, TracingConfig};
use credential_service::{Config, IssueOptions, MemoryRecordStore, TokenGenerator, VerifyOptions};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(&TracingConfig::from_env()?)?;

    let subject = std::env::args()
        .nth(1)
        .context("usage: credential-service <subject>")?;

    let config = Config::from_env()?;
    let store = Arc::new(MemoryRecordStore::new());
    let generator = TokenGenerator::new(config, Some(store))?;

    info!(generator_id = %generator.id(), "Issuing token");

    let issued = generator.issue(subject, IssueOptions::new()).await?;
    let outcome = generator
        .verify(&issued.token, VerifyOptions::new())
        .await;

    let report = json!({
        "issued": issued,
        "verification": {
            "status": outcome.status(),
            "subject": outcome.subject(),
        },
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    generator.dispose().await;
    Ok(())
}
