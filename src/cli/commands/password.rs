use serde_json::json;

use crate::auth::hash_password;
use crate::cli::OutputFormat;
use crate::config;

/// Hash a password with the configured cost, for seeding rows by hand
pub async fn handle(password: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let plain = password.trim().to_string();
    let cost = config::config().security.bcrypt_cost;
    let hash = tokio::task::spawn_blocking(move || hash_password(&plain, cost)).await??;

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "hash": hash, "cost": cost }))?);
        }
        OutputFormat::Text => {
            println!("{}", hash);
        }
    }
    Ok(())
}
