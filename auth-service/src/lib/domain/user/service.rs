use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::Authenticator;

use crate::domain::user::models::AuthenticatedSession;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::SignUpCommand;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;
use crate::domain::user::models::Username;
use crate::user::errors::UserError;
use crate::user::ports::AuthServicePort;
use crate::user::ports::UserRepository;

/// Domain service implementation for signup, login and profile lookup.
///
/// Concrete implementation of AuthServicePort with dependency injection.
/// Every repository call is bounded by `store_timeout`.
pub struct AuthService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    authenticator: Arc<Authenticator>,
    store_timeout: Duration,
}

impl<UR> AuthService<UR>
where
    UR: UserRepository,
{
    const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `authenticator` - Password hashing and token issuance
    pub fn new(repository: Arc<UR>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            authenticator,
            store_timeout: Self::DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, UserError>
    where
        F: Future<Output = Result<T, UserError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    operation,
                    timeout_ms = self.store_timeout.as_millis() as u64,
                    "Store operation timed out"
                );
                Err(UserError::Timeout(operation))
            }
        }
    }
}

#[async_trait]
impl<UR> AuthServicePort for AuthService<UR>
where
    UR: UserRepository,
{
    async fn sign_up(&self, command: SignUpCommand) -> Result<UserProfile, UserError> {
        let account = command.validate().inspect_err(|errors| {
            tracing::info!(username = %command.username, %errors, "Signup rejected by validation");
        })?;

        match self
            .bounded("get_by_username", self.repository.get_by_username(&account.username))
            .await
        {
            Ok(_) => {
                tracing::info!(username = %account.username, "Signup rejected: username taken");
                return Err(UserError::UsernameAlreadyExists(
                    account.username.to_string(),
                ));
            }
            Err(UserError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let authenticator = Arc::clone(&self.authenticator);
        let password = account.password;
        let password_hash =
            tokio::task::spawn_blocking(move || authenticator.hash_password(password.expose()))
                .await
                .map_err(|e| UserError::Internal(format!("Hashing task failed: {}", e)))?
                .map_err(|e| UserError::Internal(format!("Password hashing failed: {}", e)))?;

        let new_user = NewUser {
            id: UserId::new(),
            username: account.username,
            email: account.email,
            password_hash,
        };

        let user = self
            .bounded("create", self.repository.create(new_user))
            .await
            .inspect_err(|e| {
                if e.is_conflict() {
                    tracing::info!(error = %e, "Signup rejected by store uniqueness constraint");
                }
            })?;

        tracing::info!(user_id = %user.id, username = %user.username, "User signed up");

        Ok(UserProfile::from(user))
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthenticatedSession, UserError> {
        command.validate()?;

        // A name that could never have been registered is treated as unknown.
        let Ok(username) = Username::new(command.username.clone()) else {
            tracing::info!(reason = "unknown_user", "Login failed");
            return Err(UserError::InvalidCredentials);
        };

        let user = match self
            .bounded("get_by_username", self.repository.get_by_username(&username))
            .await
        {
            Ok(user) => user,
            Err(UserError::NotFound(_)) => {
                tracing::info!(username = %username, reason = "unknown_user", "Login failed");
                return Err(UserError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let authenticator = Arc::clone(&self.authenticator);
        let password = command.password;
        let stored_hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || {
            authenticator.verify_password(&password, &stored_hash)
        })
        .await
        .map_err(|e| UserError::Internal(format!("Verification task failed: {}", e)))?;

        if !matches {
            tracing::info!(username = %username, reason = "wrong_password", "Login failed");
            return Err(UserError::InvalidCredentials);
        }

        let issued = self
            .authenticator
            .issue_token(user.username.as_str(), Some(user.id.to_string().as_str()))
            .map_err(|e| UserError::Internal(format!("Token issuance failed: {}", e)))?;

        tracing::info!(user_id = %user.id, username = %user.username, "User logged in");

        Ok(AuthenticatedSession {
            token: issued.access_token,
            expires_at: issued.expires_at,
            user: UserProfile::from(user),
        })
    }

    async fn get_profile(&self, id: &UserId) -> Result<UserProfile, UserError> {
        self.bounded("get_by_id", self.repository.get_by_id(id))
            .await
            .map(UserProfile::from)
    }

    async fn get_profile_by_username(&self, username: &str) -> Result<UserProfile, UserError> {
        let username = Username::new(username.to_string())
            .map_err(|_| UserError::NotFound(username.to_string()))?;

        self.bounded("get_by_username", self.repository.get_by_username(&username))
            .await
            .map(UserProfile::from)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::mock;

    use super::*;
    use crate::domain::user::models::EmailAddress;
    use crate::domain::user::models::User;

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: NewUser) -> Result<User, UserError>;
            async fn get_by_username(&self, username: &Username) -> Result<User, UserError>;
            async fn get_by_id(&self, id: &UserId) -> Result<User, UserError>;
            async fn update(&self, user: User) -> Result<User, UserError>;
            async fn delete(&self, id: &UserId) -> Result<(), UserError>;
        }
    }

    fn authenticator() -> Arc<Authenticator> {
        Arc::new(
            Authenticator::new(b"service_test_secret_32_bytes_long!", chrono::Duration::hours(1))
                .with_password_hasher(auth::PasswordHasher::with_cost(1024, 1, 1).unwrap()),
        )
    }

    fn stored_user(username: &str, password_hash: String) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            username: Username::new(username.to_string()).unwrap(),
            email: EmailAddress::new(format!("{}@example.com", username)).unwrap(),
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    fn persisted(user: NewUser) -> User {
        let now = Utc::now();
        User {
            id: user.id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    fn alice_sign_up() -> SignUpCommand {
        SignUpCommand::new(
            "alice".to_string(),
            "alice@example.com".to_string(),
            "Password1".to_string(),
        )
    }

    #[tokio::test]
    async fn test_sign_up_success() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_get_by_username()
            .times(1)
            .returning(|u| Err(UserError::NotFound(u.to_string())));
        repository
            .expect_create()
            .withf(|user| {
                user.username.as_str() == "alice"
                    && user.email.as_str() == "alice@example.com"
                    && user.password_hash.starts_with("$argon2id$")
                    && !user.password_hash.contains("Password1")
            })
            .times(1)
            .returning(|user| Ok(persisted(user)));

        let service = AuthService::new(Arc::new(repository), authenticator());

        let profile = service.sign_up(alice_sign_up()).await.unwrap();
        assert_eq!(profile.username.as_str(), "alice");
        assert_eq!(profile.email.as_str(), "alice@example.com");
    }

    #[tokio::test]
    async fn test_sign_up_validation_never_touches_store() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_get_by_username().times(0);
        repository.expect_create().times(0);

        let service = AuthService::new(Arc::new(repository), authenticator());

        let command = SignUpCommand::new(
            "ab".to_string(),
            "alice@example.com".to_string(),
            "short1".to_string(),
        );

        match service.sign_up(command).await {
            Err(UserError::ValidationFailed(errors)) => {
                assert!(errors.get("username").is_some());
                assert!(errors.get("password").is_some());
                assert!(errors.get("email").is_none());
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_username_pre_check() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_get_by_username()
            .times(1)
            .returning(|u| Ok(stored_user(u.as_str(), "$argon2id$existing".to_string())));
        repository.expect_create().times(0);

        let service = AuthService::new(Arc::new(repository), authenticator());

        let result = service.sign_up(alice_sign_up()).await;
        assert!(matches!(result, Err(UserError::UsernameAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_sign_up_store_conflict_propagates() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_get_by_username()
            .times(1)
            .returning(|u| Err(UserError::NotFound(u.to_string())));
        repository
            .expect_create()
            .times(1)
            .returning(|user| Err(UserError::EmailAlreadyExists(user.email.to_string())));

        let service = AuthService::new(Arc::new(repository), authenticator());

        let result = service.sign_up(alice_sign_up()).await;
        assert!(matches!(result, Err(UserError::EmailAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_sign_up_store_failure_propagates() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_get_by_username()
            .times(1)
            .returning(|_| Err(UserError::DatabaseError("connection refused".to_string())));
        repository.expect_create().times(0);

        let service = AuthService::new(Arc::new(repository), authenticator());

        let result = service.sign_up(alice_sign_up()).await;
        assert!(matches!(result, Err(UserError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn test_login_success() {
        let authenticator = authenticator();
        let user = stored_user("alice", authenticator.hash_password("Password1").unwrap());
        let user_id = user.id;

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_get_by_username()
            .withf(|u| u.as_str() == "alice")
            .times(1)
            .returning(move |_| Ok(user.clone()));

        let service = AuthService::new(Arc::new(repository), Arc::clone(&authenticator));

        let session = service
            .login(LoginCommand::new("alice".to_string(), "Password1".to_string()))
            .await
            .unwrap();

        assert!(!session.token.is_empty());
        assert_eq!(session.user.id, user_id);

        let claims = authenticator.validate_token(&session.token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.uid, Some(user_id.to_string()));
        assert_eq!(claims.expires_at(), Some(session.expires_at));
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_user_are_identical() {
        let authenticator = authenticator();
        let user = stored_user("alice", authenticator.hash_password("Password1").unwrap());

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_get_by_username()
            .returning(move |u| {
                if u.as_str() == "alice" {
                    Ok(user.clone())
                } else {
                    Err(UserError::NotFound(u.to_string()))
                }
            });

        let service = AuthService::new(Arc::new(repository), authenticator);

        let wrong_password = service
            .login(LoginCommand::new("alice".to_string(), "wrong".to_string()))
            .await
            .unwrap_err();
        let unknown_user = service
            .login(LoginCommand::new("nobody".to_string(), "Password1".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, UserError::InvalidCredentials));
        assert!(matches!(unknown_user, UserError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_login_with_impossible_username_is_invalid_credentials() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_get_by_username().times(0);

        let service = AuthService::new(Arc::new(repository), authenticator());

        let result = service
            .login(LoginCommand::new("ab".to_string(), "Password1".to_string()))
            .await;
        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_missing_fields() {
        let repository = MockTestUserRepository::new();
        let service = AuthService::new(Arc::new(repository), authenticator());

        let result = service
            .login(LoginCommand::new(String::new(), String::new()))
            .await;
        match result {
            Err(UserError::ValidationFailed(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_profile_success() {
        let user = stored_user("alice", "$argon2id$hash".to_string());
        let user_id = user.id;

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_get_by_id()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(move |_| Ok(user.clone()));

        let service = AuthService::new(Arc::new(repository), authenticator());

        let profile = service.get_profile(&user_id).await.unwrap();
        assert_eq!(profile.id, user_id);
        assert_eq!(profile.username.as_str(), "alice");
    }

    #[tokio::test]
    async fn test_get_profile_not_found() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_get_by_id()
            .times(1)
            .returning(|id| Err(UserError::NotFound(id.to_string())));

        let service = AuthService::new(Arc::new(repository), authenticator());

        let result = service.get_profile(&UserId::new()).await;
        assert!(matches!(result, Err(UserError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_profile_by_username() {
        let user = stored_user("alice", "$argon2id$hash".to_string());

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_get_by_username()
            .withf(|u| u.as_str() == "alice")
            .times(1)
            .returning(move |_| Ok(user.clone()));

        let service = AuthService::new(Arc::new(repository), authenticator());

        let profile = service.get_profile_by_username("alice").await.unwrap();
        assert_eq!(profile.username.as_str(), "alice");

        let result = service.get_profile_by_username("").await;
        assert!(matches!(result, Err(UserError::NotFound(_))));
    }

    struct SlowRepository;

    #[async_trait]
    impl UserRepository for SlowRepository {
        async fn create(&self, _user: NewUser) -> Result<User, UserError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(UserError::DatabaseError("unreachable".to_string()))
        }

        async fn get_by_username(&self, username: &Username) -> Result<User, UserError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(UserError::NotFound(username.to_string()))
        }

        async fn get_by_id(&self, id: &UserId) -> Result<User, UserError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(UserError::NotFound(id.to_string()))
        }

        async fn update(&self, user: User) -> Result<User, UserError> {
            Ok(user)
        }

        async fn delete(&self, _id: &UserId) -> Result<(), UserError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_store_timeout_surfaces_as_timeout() {
        let service = AuthService::new(Arc::new(SlowRepository), authenticator())
            .with_store_timeout(Duration::from_millis(50));

        let result = service.sign_up(alice_sign_up()).await;
        assert!(matches!(result, Err(UserError::Timeout("get_by_username"))));

        let result = service.get_profile(&UserId::new()).await;
        assert!(matches!(result, Err(UserError::Timeout("get_by_id"))));
    }
}
