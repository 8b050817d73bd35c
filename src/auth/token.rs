use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

/// Decoded form of a session token.
///
/// The token carries no signature. Anyone can mint one, so it only proves
/// that the bearer was handed a string of the right shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub nonce: String,
}

/// Build a token: base64 of `username:unix_millis:uuid`
pub fn issue_token(username: &str, now: DateTime<Utc>) -> String {
    let raw = format!("{}:{}:{}", username, now.timestamp_millis(), Uuid::new_v4());
    STANDARD.encode(raw.as_bytes())
}

/// Structural check only: decodes and splits into exactly three parts,
/// ignoring trailing empty fields
pub fn validate_token(token: &str) -> bool {
    decode_parts(token).is_some()
}

pub fn parse_token(token: &str) -> Option<SessionToken> {
    let parts = decode_parts(token)?;
    let millis: i64 = parts[1].parse().ok()?;
    let issued_at = Utc.timestamp_millis_opt(millis).single()?;

    Some(SessionToken {
        username: parts[0].clone(),
        issued_at,
        nonce: parts[2].clone(),
    })
}

fn decode_parts(token: &str) -> Option<Vec<String>> {
    let bytes = STANDARD.decode(token.trim()).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    let mut parts: Vec<String> = decoded.split(':').map(str::to_string).collect();
    // Trailing empty fields do not count
    while parts.len() > 1 && parts.last().is_some_and(String::is_empty) {
        parts.pop();
    }
    if parts.len() == 3 {
        Some(parts)
    } else {
        None
    }
}
