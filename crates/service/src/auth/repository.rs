use async_trait::async_trait;

use super::domain::Credential;
use super::errors::AuthError;

/// Repository abstraction for credential persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// First stored credential matching both fields exactly.
    async fn find_match(&self, username: &str, password: &str) -> Result<Option<Credential>, AuthError>;
    /// Append `cred` unless its username is taken (`AuthError::Conflict`).
    async fn insert_unique(&self, cred: Credential) -> Result<(), AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<Vec<Credential>>,
    }

    impl MockAuthRepository {
        pub fn count(&self, username: &str) -> usize {
            let users = self.users.lock().unwrap_or_else(|e| e.into_inner());
            users.iter().filter(|u| u.username == username).count()
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_match(&self, username: &str, password: &str) -> Result<Option<Credential>, AuthError> {
            let users = self.users.lock().unwrap_or_else(|e| e.into_inner());
            Ok(users.iter().find(|u| u.username == username && u.password == password).cloned())
        }

        async fn insert_unique(&self, cred: Credential) -> Result<(), AuthError> {
            let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
            if users.iter().any(|u| u.username == cred.username) {
                return Err(AuthError::Conflict);
            }
            users.push(cred);
            Ok(())
        }
    }
}
