use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "Create an active administrator")]
    Create {
        #[arg(help = "Login name")]
        username: String,

        #[arg(long, help = "Initial password")]
        password: String,

        #[arg(long, help = "Contact email")]
        email: Option<String>,

        #[arg(long, help = "Display name")]
        nombre: Option<String>,
    },

    #[command(about = "List administrators")]
    List,

    #[command(about = "Set a new password and clear any login lockout")]
    ResetPassword {
        #[arg(help = "Login name")]
        username: String,

        #[arg(long, help = "New password")]
        password: String,
    },

    #[command(about = "Allow an administrator to log in")]
    Activate {
        #[arg(help = "Login name")]
        username: String,
    },

    #[command(about = "Block an administrator from logging in")]
    Deactivate {
        #[arg(help = "Login name")]
        username: String,
    },
}

pub async fn handle(cmd: AdminCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let auth = auth_service()?;

    match cmd {
        AdminCommands::Create {
            username,
            password,
            email,
            nombre,
        } => {
            let admin = auth.create_admin(&username, &password, email, nombre).await?;
            output_success(
                &output_format,
                &format!("Administrator '{}' created", admin.username),
                Some(json!({ "admin": admin })),
            )
        }
        AdminCommands::List => {
            let admins = auth.list_admins().await?;
            if admins.is_empty() {
                return output_empty_collection(&output_format, "admins", "No administrators found");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "admins": admins }))?);
                }
                OutputFormat::Text => {
                    println!("{:<6} {:<20} {:<25} {:<30} {:<8} {}", "ID", "USERNAME", "NAME", "EMAIL", "ACTIVE", "LAST LOGIN");
                    println!("{}", "-".repeat(110));

                    for admin in &admins {
                        let last_login = admin
                            .last_login
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_else(|| "never".to_string());

                        println!(
                            "{:<6} {:<20} {:<25} {:<30} {:<8} {}",
                            admin.id,
                            admin.username,
                            admin.name.as_deref().unwrap_or("-"),
                            admin.email.as_deref().unwrap_or("-"),
                            if admin.active { "yes" } else { "no" },
                            last_login
                        );
                    }
                }
            }
            Ok(())
        }
        AdminCommands::ResetPassword { username, password } => {
            let admin = auth.reset_password(&username, &password).await?;
            output_success(
                &output_format,
                &format!("Password reset for '{}'", admin.username),
                None,
            )
        }
        AdminCommands::Activate { username } => {
            let admin = auth.set_active(&username, true).await?;
            output_success(
                &output_format,
                &format!("Administrator '{}' activated", admin.username),
                Some(json!({ "admin": admin })),
            )
        }
        AdminCommands::Deactivate { username } => {
            let admin = auth.set_active(&username, false).await?;
            output_success(
                &output_format,
                &format!("Administrator '{}' deactivated", admin.username),
                Some(json!({ "admin": admin })),
            )
        }
    }
}
