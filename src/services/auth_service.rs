use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::{hash_password, issue_token, verify_password, PasswordError};
use crate::database::manager::DatabaseError;
use crate::database::models::{Administrator, NewAdministrator};
use crate::database::repository::AdministratorRepository;
use crate::services::login_throttle::{AttemptStart, LoginThrottle, ThrottlePolicy};

const MAX_USERNAME_LEN: usize = 50;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Administrator already exists: {0}")]
    AlreadyExists(String),

    #[error("Administrator not found: {0}")]
    NotFound(String),

    #[error("Invalid administrator data: {0}")]
    Validation(String),

    #[error("Password worker failed: {0}")]
    Worker(String),
}

/// Result of a login attempt as seen by callers
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Success { token: String, admin: Administrator },
    InvalidCredentials,
    Locked,
}

impl LoginOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            LoginOutcome::Success { .. } => "Login successful",
            LoginOutcome::InvalidCredentials => "Invalid username or password",
            LoginOutcome::Locked => "Account temporarily locked after too many failed attempts",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Success { .. })
    }
}

/// Credential checks, login throttling and administrator maintenance
#[derive(Clone)]
pub struct AuthService {
    admins: Arc<dyn AdministratorRepository>,
    throttle: LoginThrottle,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(admins: Arc<dyn AdministratorRepository>, policy: ThrottlePolicy, bcrypt_cost: u32) -> Self {
        Self {
            admins,
            throttle: LoginThrottle::new(policy),
            bcrypt_cost,
        }
    }

    pub fn throttle(&self) -> &LoginThrottle {
        &self.throttle
    }

    /// Check a username/password pair.
    ///
    /// A locked username is refused before the store or the password is looked
    /// at. Unknown users, inactive users and wrong passwords all count as a
    /// failed attempt and produce the same outcome. The attempt is counted
    /// before the password is verified, so parallel guesses share one budget.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let username = username.trim();
        let password = password.trim();

        let attempts = match self.throttle.begin_attempt(username).await {
            AttemptStart::Allowed(attempts) => attempts,
            AttemptStart::Locked => {
                warn!(username = %username, "Login refused: account locked");
                return Ok(LoginOutcome::Locked);
            }
        };

        match self.check_credentials(username, password).await {
            Ok(Some(outcome)) => Ok(outcome),
            Ok(None) => {
                warn!(username = %username, attempts, "Login failed");
                Ok(LoginOutcome::InvalidCredentials)
            }
            Err(e) => {
                self.throttle.abandon_attempt(username).await;
                Err(e)
            }
        }
    }

    /// `None` when the credentials are wrong
    async fn check_credentials(&self, username: &str, password: &str) -> Result<Option<LoginOutcome>, AuthError> {
        let Some(mut admin) = self.admins.find_active_by_username(username).await? else {
            return Ok(None);
        };

        if !self.password_matches(password, &admin).await? {
            return Ok(None);
        }

        self.throttle.reset(username).await;

        let now = Utc::now();
        admin.last_login = Some(now);
        let admin = self.admins.save(&admin).await?;
        let token = issue_token(&admin.username, now);

        info!(username = %admin.username, admin_id = admin.id, "Login successful");
        Ok(Some(LoginOutcome::Success { token, admin }))
    }

    async fn password_matches(&self, password: &str, admin: &Administrator) -> Result<bool, AuthError> {
        let plain = password.to_string();
        let hash = admin.password_hash.clone();
        let verdict = tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
            .await
            .map_err(|e| AuthError::Worker(e.to_string()))?;

        match verdict {
            Ok(matches) => Ok(matches),
            Err(e) => {
                warn!(username = %admin.username, error = %e, "Stored password hash is unusable");
                Ok(false)
            }
        }
    }

    async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let plain = password.to_string();
        let cost = self.bcrypt_cost;
        let hash = tokio::task::spawn_blocking(move || hash_password(&plain, cost))
            .await
            .map_err(|e| AuthError::Worker(e.to_string()))??;
        Ok(hash)
    }

    /// Seed a new active administrator
    pub async fn create_admin(
        &self,
        username: &str,
        password: &str,
        email: Option<String>,
        name: Option<String>,
    ) -> Result<Administrator, AuthError> {
        let username = username.trim();
        validate_username(username)?;
        validate_password(password)?;

        if self.admins.exists_by_username(username).await? {
            return Err(AuthError::AlreadyExists(username.to_string()));
        }

        let password_hash = self.hash(password.trim()).await?;
        let admin = self
            .admins
            .insert(NewAdministrator {
                username: username.to_string(),
                password_hash,
                email,
                name,
            })
            .await?;

        info!(username = %admin.username, admin_id = admin.id, "Administrator created");
        Ok(admin)
    }

    /// Replace the password hash and lift any lockout for the account
    pub async fn reset_password(&self, username: &str, password: &str) -> Result<Administrator, AuthError> {
        let username = username.trim();
        validate_password(password)?;

        let mut admin = self
            .admins
            .find_by_username(username)
            .await?
            .ok_or_else(|| AuthError::NotFound(username.to_string()))?;

        admin.password_hash = self.hash(password.trim()).await?;
        let admin = self.admins.save(&admin).await?;
        self.throttle.reset(username).await;

        info!(username = %admin.username, "Administrator password reset");
        Ok(admin)
    }

    pub async fn set_active(&self, username: &str, active: bool) -> Result<Administrator, AuthError> {
        let username = username.trim();
        let mut admin = self
            .admins
            .find_by_username(username)
            .await?
            .ok_or_else(|| AuthError::NotFound(username.to_string()))?;

        admin.active = active;
        let admin = self.admins.save(&admin).await?;
        info!(username = %admin.username, active, "Administrator status changed");
        Ok(admin)
    }

    pub async fn list_admins(&self) -> Result<Vec<Administrator>, AuthError> {
        Ok(self.admins.find_all().await?)
    }
}

fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.is_empty() {
        return Err(AuthError::Validation("username is required".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AuthError::Validation(format!(
            "username must be at most {} characters",
            MAX_USERNAME_LEN
        )));
    }
    // ':' separates the token fields
    if username.contains(':') {
        return Err(AuthError::Validation("username cannot contain ':'".to_string()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.trim().is_empty() {
        return Err(AuthError::Validation("password is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{parse_token, validate_token};
    use crate::testing::{MemoryAdministratorRepository, TEST_BCRYPT_COST};
    use chrono::Duration;

    async fn service_with(policy: ThrottlePolicy) -> (AuthService, Arc<MemoryAdministratorRepository>) {
        let repo = Arc::new(MemoryAdministratorRepository::default());
        let service = AuthService::new(repo.clone(), policy, TEST_BCRYPT_COST);
        service
            .create_admin("admin", "correcta", Some("admin@tienda.test".into()), Some("Admin".into()))
            .await
            .unwrap();
        (service, repo)
    }

    async fn service() -> (AuthService, Arc<MemoryAdministratorRepository>) {
        service_with(ThrottlePolicy::default()).await
    }

    #[tokio::test]
    async fn correct_credentials_succeed_and_stamp_last_login() {
        let (service, repo) = service().await;
        let before = Utc::now();

        let outcome = service.authenticate("admin", "correcta").await.unwrap();
        let LoginOutcome::Success { token, admin } = outcome else {
            panic!("expected success, got {:?}", outcome);
        };

        assert!(validate_token(&token));
        assert_eq!(parse_token(&token).unwrap().username, "admin");
        assert!(admin.last_login.unwrap() >= before);

        let stored = repo.find_by_username("admin").await.unwrap().unwrap();
        assert_eq!(stored.last_login, admin.last_login);
    }

    #[tokio::test]
    async fn inputs_are_trimmed() {
        let (service, _) = service().await;
        let outcome = service.authenticate("  admin ", " correcta  ").await.unwrap();
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_indistinguishable() {
        let (service, _) = service().await;
        assert_eq!(
            service.authenticate("admin", "incorrecta").await.unwrap(),
            LoginOutcome::InvalidCredentials
        );
        assert_eq!(
            service.authenticate("nadie", "correcta").await.unwrap(),
            LoginOutcome::InvalidCredentials
        );
        assert_eq!(service.throttle().failed_attempts("admin").await, 1);
        assert_eq!(service.throttle().failed_attempts("nadie").await, 1);
    }

    #[tokio::test]
    async fn sixth_attempt_is_locked_even_with_right_password() {
        let (service, _) = service().await;
        for _ in 0..5 {
            let outcome = service.authenticate("admin", "mala").await.unwrap();
            assert_eq!(outcome, LoginOutcome::InvalidCredentials);
        }

        let outcome = service.authenticate("admin", "correcta").await.unwrap();
        assert_eq!(outcome, LoginOutcome::Locked);
        assert!(outcome.message().contains("locked"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_wrong_guesses_are_capped_by_the_lockout() {
        let (service, _) = service().await;
        let mut handles = Vec::new();
        for i in 0..20 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.authenticate("admin", &format!("guess{i}")).await.unwrap()
            }));
        }

        let mut evaluated = 0;
        let mut locked = 0;
        for handle in handles {
            match handle.await.unwrap() {
                LoginOutcome::InvalidCredentials => evaluated += 1,
                LoginOutcome::Locked => locked += 1,
                other => panic!("unexpected outcome {:?}", other),
            }
        }
        assert_eq!(evaluated, 5);
        assert_eq!(locked, 15);
        assert_eq!(
            service.authenticate("admin", "correcta").await.unwrap(),
            LoginOutcome::Locked
        );
    }

    #[tokio::test]
    async fn attempt_after_window_is_evaluated_normally() {
        let policy = ThrottlePolicy {
            max_failed_attempts: 5,
            lockout_window: Duration::milliseconds(50),
        };
        let (service, _) = service_with(policy).await;
        for _ in 0..5 {
            service.authenticate("admin", "mala").await.unwrap();
        }
        assert_eq!(
            service.authenticate("admin", "correcta").await.unwrap(),
            LoginOutcome::Locked
        );

        tokio::time::sleep(std::time::Duration::from_millis(80)).await;

        assert!(service.authenticate("admin", "correcta").await.unwrap().is_success());
    }

    #[tokio::test]
    async fn success_clears_failure_counter() {
        let (service, _) = service().await;
        for _ in 0..3 {
            service.authenticate("admin", "mala").await.unwrap();
        }
        assert!(service.authenticate("admin", "correcta").await.unwrap().is_success());
        assert_eq!(service.throttle().failed_attempts("admin").await, 0);
    }

    #[tokio::test]
    async fn inactive_admin_cannot_log_in() {
        let (service, _) = service().await;
        service.set_active("admin", false).await.unwrap();
        assert_eq!(
            service.authenticate("admin", "correcta").await.unwrap(),
            LoginOutcome::InvalidCredentials
        );

        service.set_active("admin", true).await.unwrap();
        assert!(service.authenticate("admin", "correcta").await.unwrap().is_success());
    }

    #[tokio::test]
    async fn corrupt_hash_counts_as_bad_credentials() {
        let (service, repo) = service().await;
        let mut admin = repo.find_by_username("admin").await.unwrap().unwrap();
        admin.password_hash = "plaintext-by-mistake".to_string();
        repo.save(&admin).await.unwrap();

        assert_eq!(
            service.authenticate("admin", "plaintext-by-mistake").await.unwrap(),
            LoginOutcome::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn reset_password_replaces_hash_and_lifts_lock() {
        let (service, _) = service().await;
        for _ in 0..5 {
            service.authenticate("admin", "mala").await.unwrap();
        }
        service.reset_password("admin", "nueva").await.unwrap();

        assert_eq!(
            service.authenticate("admin", "correcta").await.unwrap(),
            LoginOutcome::InvalidCredentials
        );
        assert!(service.authenticate("admin", "nueva").await.unwrap().is_success());
    }

    #[tokio::test]
    async fn create_admin_rejects_duplicates_and_bad_usernames() {
        let (service, _) = service().await;
        assert!(matches!(
            service.create_admin("admin", "x", None, None).await,
            Err(AuthError::AlreadyExists(_))
        ));
        assert!(matches!(
            service.create_admin("   ", "x", None, None).await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            service.create_admin("a:b", "x", None, None).await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            service.create_admin("nuevo", "  ", None, None).await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn reset_password_for_unknown_admin() {
        let (service, _) = service().await;
        assert!(matches!(
            service.reset_password("nadie", "x").await,
            Err(AuthError::NotFound(_))
        ));
    }
}
