use super::auth::{AuthToken, AuthTokenValue, UserAuthCredentials};
use super::permissions::{Permission, UserRole};
use anyhow::Result;

pub trait UserAuthCredentialsStore: Send + Sync {
    /// Returns the user's authentication credentials given the user handle.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_auth_credentials(&self, user_handle: &str) -> Result<Option<UserAuthCredentials>>;

    /// Replaces the user's password credentials, removing them when
    /// `username_password` is None.
    fn update_user_auth_credentials(&self, credentials: UserAuthCredentials) -> Result<()>;
}

pub trait UserAuthTokenStore: Send + Sync {
    /// Returns Ok(None) if the token does not exist.
    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Deletes an auth token, returning it if it existed.
    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()>;

    fn add_user_auth_token(&self, token: AuthToken) -> Result<()>;

    fn get_all_user_auth_tokens(&self, user_handle: &str) -> Result<Vec<AuthToken>>;
}

pub trait UserStore: UserAuthTokenStore + UserAuthCredentialsStore + Send + Sync {
    /// Creates a new user and returns the user id.
    fn create_user(&self, user_handle: &str) -> Result<usize>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>>;

    fn get_all_user_handles(&self) -> Result<Vec<String>>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>>;

    fn get_user_roles(&self, user_id: usize) -> Result<Vec<UserRole>>;

    fn add_user_role(&self, user_id: usize, role: UserRole) -> Result<()>;

    fn remove_user_role(&self, user_id: usize, role: UserRole) -> Result<()>;

    /// Union of the permissions granted by all the user's roles.
    fn resolve_user_permissions(&self, user_id: usize) -> Result<Vec<Permission>>;
}
