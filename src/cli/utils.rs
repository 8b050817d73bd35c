use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::config;
use crate::database::{DatabaseManager, PgAdministratorRepository};
use crate::services::{AuthService, ThrottlePolicy};

/// Output a success message in the appropriate format.
///
/// In JSON mode the fields of `data` are merged into the top-level object.
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ collection_name: [] }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Auth service backed by the configured database, for maintenance commands
pub fn auth_service() -> anyhow::Result<AuthService> {
    let settings = config::config();
    let pool = DatabaseManager::main_pool()?;

    Ok(AuthService::new(
        std::sync::Arc::new(PgAdministratorRepository::new(pool)),
        ThrottlePolicy::from(&settings.security),
        settings.security.bcrypt_cost,
    ))
}
