use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::domain::{present, AuthSession, Credential, LoginInput, RegisterInput};
use super::errors::AuthError;
use super::repository::AuthRepository;

/// Auth service configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub min_username_len: usize,
    pub min_password_len: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { min_username_len: 3, min_password_len: 6 }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new user.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::default());
    /// let input = RegisterInput { username: Some("alice".into()), password: Some("secret1".into()) };
    /// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    /// let username = rt.block_on(svc.register(input)).unwrap();
    /// assert_eq!(username, "alice");
    /// ```
    #[instrument(skip(self, input), fields(username = ?input.username))]
    pub async fn register(&self, input: RegisterInput) -> Result<String, AuthError> {
        let (Some(username), Some(password)) = (present(&input.username), present(&input.password)) else {
            return Err(AuthError::Validation("Username and password are required".into()));
        };
        if username.chars().count() < self.cfg.min_username_len {
            return Err(AuthError::Validation(format!(
                "Username must be at least {} characters",
                self.cfg.min_username_len
            )));
        }
        if password.chars().count() < self.cfg.min_password_len {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                self.cfg.min_password_len
            )));
        }

        let cred = Credential { username: username.to_string(), password: password.to_string() };
        if let Err(e) = self.repo.insert_unique(cred).await {
            if matches!(e, AuthError::Conflict) {
                debug!("username taken");
            }
            return Err(e);
        }
        info!(%username, "user_registered");
        Ok(username.to_string())
    }

    /// Authenticate a user; any mismatch is reported the same way.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let svc = AuthService::new(Arc::new(MockAuthRepository::default()), AuthConfig::default());
    /// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    /// rt.block_on(svc.register(RegisterInput { username: Some("alice".into()), password: Some("secret1".into()) })).unwrap();
    /// let session = rt.block_on(svc.login(LoginInput { username: Some("alice".into()), password: Some("secret1".into()) })).unwrap();
    /// assert_eq!(session.username, "alice");
    /// ```
    #[instrument(skip(self, input), fields(username = ?input.username))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let (Some(username), Some(password)) = (present(&input.username), present(&input.password)) else {
            return Err(AuthError::Validation("Username and password are required".into()));
        };
        match self.repo.find_match(username, password).await? {
            Some(user) => {
                info!(username = %user.username, "user_logged_in");
                Ok(AuthSession { username: user.username })
            }
            None => {
                warn!("login rejected");
                Err(AuthError::Unauthorized)
            }
        }
    }
}
