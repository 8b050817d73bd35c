use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Row of the `administradores` table
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Administrator {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: Option<String>,
    #[sqlx(rename = "nombre")]
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    #[sqlx(rename = "activo")]
    #[serde(rename = "activo")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Column values for seeding an administrator
#[derive(Debug, Clone, PartialEq)]
pub struct NewAdministrator {
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub name: Option<String>,
}
