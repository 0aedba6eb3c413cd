use async_trait::async_trait;

use crate::domain::user::models::AuthenticatedSession;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::SignUpCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;
use crate::domain::user::models::Username;
use crate::user::errors::UserError;

/// Port for authentication service operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new user.
    ///
    /// # Arguments
    /// * `command` - Raw username, email, and password
    ///
    /// # Returns
    /// Public-safe profile of the created user
    ///
    /// # Errors
    /// * `ValidationFailed` - One or more fields violate the input rules
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `Internal` / `DatabaseError` / `Timeout` - Infrastructure failure
    async fn sign_up(&self, command: SignUpCommand) -> Result<UserProfile, UserError>;

    /// Verify credentials and open a session.
    ///
    /// # Errors
    /// * `ValidationFailed` - Username or password missing
    /// * `InvalidCredentials` - Unknown user or wrong password, indistinguishably
    /// * `Internal` / `DatabaseError` / `Timeout` - Infrastructure failure
    async fn login(&self, command: LoginCommand) -> Result<AuthenticatedSession, UserError>;

    /// Retrieve a profile by user identifier.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn get_profile(&self, id: &UserId) -> Result<UserProfile, UserError>;

    /// Retrieve a profile by username.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn get_profile_by_username(&self, username: &str) -> Result<UserProfile, UserError>;
}

/// Persistence operations for user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Arguments
    /// * `user` - Insert payload; timestamps are stamped by the store
    ///
    /// # Returns
    /// Stored user entity
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: NewUser) -> Result<User, UserError>;

    /// Retrieve user by username, including the password hash.
    ///
    /// # Errors
    /// * `NotFound` - No user with this username
    /// * `DatabaseError` - Database operation failed
    async fn get_by_username(&self, username: &Username) -> Result<User, UserError>;

    /// Retrieve user by identifier, including the password hash.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn get_by_id(&self, id: &UserId) -> Result<User, UserError>;

    /// Update existing user in storage and re-stamp `updated_at`.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `UsernameAlreadyExists` - New username is already taken
    /// * `EmailAlreadyExists` - New email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn update(&self, user: User) -> Result<User, UserError>;

    /// Remove user from storage.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn delete(&self, id: &UserId) -> Result<(), UserError>;
}
