use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::dto::{Credentials, Registration};
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{decoy_hash, hash_password, verify_password};
use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};
use crate::users::repo::UserStore;
use crate::users::repo_types::{NewUser, User};

/// A freshly issued bearer token and the user it belongs to.
#[derive(Debug)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Registration, login and token verification.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    keys: JwtKeys,
    // Stands in for the stored hash when the login identifier matches nobody.
    dummy_hash: String,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, jwt: &JwtConfig) -> anyhow::Result<Self> {
        jwt.validate()?;
        Ok(Self {
            store,
            keys: JwtKeys::from(jwt),
            dummy_hash: decoy_hash()?,
        })
    }

    pub async fn register(&self, reg: Registration) -> AppResult<User> {
        let Registration {
            username,
            email,
            password,
        } = reg;
        let password_hash = hash_password(&password)?;
        drop(password);

        let user = self
            .store
            .insert(NewUser {
                username,
                email,
                password_hash,
            })
            .await
            .map_err(|e| {
                if matches!(e, AppError::DuplicateIdentity) {
                    warn!("registration with taken username or email");
                }
                e
            })?;
        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    pub async fn login(&self, creds: Credentials) -> AppResult<Session> {
        let found = if creds.login.contains('@') {
            self.store.find_by_email(&creds.login).await?
        } else {
            self.store.find_by_username(&creds.login).await?
        };

        let hash = found
            .as_ref()
            .map(|u| u.password_hash.as_str())
            .unwrap_or(self.dummy_hash.as_str());
        let ok = verify_password(&creds.password, hash)?;

        match found {
            Some(user) if ok => {
                let token = self.issue_token(user.id)?;
                info!(user_id = %user.id, "user logged in");
                Ok(Session { token, user })
            }
            Some(user) => {
                warn!(user_id = %user.id, "login invalid password");
                Err(AppError::InvalidCredentials)
            }
            None => {
                warn!("login unknown identifier");
                Err(AppError::InvalidCredentials)
            }
        }
    }

    pub fn issue_token(&self, user_id: Uuid) -> AppResult<String> {
        Ok(self.keys.sign(user_id)?)
    }

    /// Resolves a bearer token to its user id. Pure: no store access.
    pub fn verify(&self, token: &str) -> AppResult<Uuid> {
        self.keys.verify(token).map(|claims| claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::dto::{LoginRequest, RegisterRequest};
    use crate::users::memory::MemoryUserStore;

    fn service() -> AuthService {
        let cfg = crate::config::AppConfig::in_memory("unit-secret");
        AuthService::new(Arc::new(MemoryUserStore::new()), &cfg.jwt).unwrap()
    }

    fn registration(username: &str, email: &str, password: &str) -> Registration {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
        .validate()
        .unwrap()
    }

    fn credentials(login: &str, password: &str) -> Credentials {
        LoginRequest {
            login: login.into(),
            password: password.into(),
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn register_then_login_then_verify() {
        let auth = service();
        let user = auth
            .register(registration("alice", "a@x.com", "Secret123"))
            .await
            .unwrap();
        assert_ne!(user.password_hash, "Secret123");

        let by_email = auth.login(credentials("a@x.com", "Secret123")).await.unwrap();
        assert_eq!(auth.verify(&by_email.token).unwrap(), user.id);

        let by_name = auth.login(credentials("alice", "Secret123")).await.unwrap();
        assert_eq!(by_name.user.id, user.id);
    }

    #[tokio::test]
    async fn duplicate_email_fails_and_first_user_survives() {
        let auth = service();
        auth.register(registration("alice", "a@x.com", "Secret123"))
            .await
            .unwrap();
        let err = auth
            .register(registration("bob", "A@x.com", "Other1234"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateIdentity));

        auth.login(credentials("a@x.com", "Secret123")).await.unwrap();
        let err = auth.login(credentials("bob", "Other1234")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let auth = service();
        auth.register(registration("alice", "a@x.com", "Secret123"))
            .await
            .unwrap();

        let wrong = auth.login(credentials("a@x.com", "Secret124")).await.unwrap_err();
        let unknown = auth.login(credentials("z@x.com", "Secret123")).await.unwrap_err();
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[test]
    fn verify_rejects_garbage() {
        let auth = service();
        assert!(matches!(auth.verify("abc"), Err(AppError::InvalidToken)));
    }
}
