use super::{
    permissions::{Permission, UserRole},
    AuthToken, AuthTokenValue, UserAuthCredentials, UserStore, UsernamePasswordCredentials,
};
use anyhow::{bail, Context, Result};
use std::{sync::Arc, time::SystemTime};
use tracing::info;

pub struct UserManager {
    user_store: Arc<dyn UserStore>,
}

impl UserManager {
    pub fn new(user_store: Arc<dyn UserStore>) -> Self {
        Self { user_store }
    }

    pub fn add_user<T: AsRef<str>>(&self, user_handle: T) -> Result<usize> {
        let user_handle = user_handle.as_ref();
        if user_handle.is_empty() {
            bail!("The user handle cannot be empty.")
        }
        if self.user_store.get_user_id(user_handle)?.is_some() {
            bail!("User handle already exists.");
        }

        let user_id = self.user_store.create_user(user_handle)?;
        info!("Created user {} with id {}", user_handle, user_id);
        Ok(user_id)
    }

    pub fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>> {
        self.user_store.get_user_id(user_handle)
    }

    pub fn get_user_handle(&self, user_id: usize) -> Result<Option<String>> {
        self.user_store.get_user_handle(user_id)
    }

    pub fn get_all_user_handles(&self) -> Result<Vec<String>> {
        self.user_store.get_all_user_handles()
    }

    pub fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        self.user_store.get_user_auth_token(value)
    }

    pub fn update_auth_token_last_used(&self, value: &AuthTokenValue) -> Result<()> {
        self.user_store
            .update_user_auth_token_last_used_timestamp(value)
    }

    pub fn generate_auth_token(&self, credentials: &UserAuthCredentials) -> Result<AuthToken> {
        let token = AuthToken {
            user_id: credentials.user_id,
            value: AuthTokenValue::generate(),
            created: SystemTime::now(),
            last_used: None,
        };
        self.user_store.add_user_auth_token(token.clone())?;
        Ok(token)
    }

    /// Removes `token_value`, which must belong to `user_id`.
    pub fn delete_auth_token(&self, user_id: usize, token_value: &AuthTokenValue) -> Result<()> {
        match self.user_store.delete_user_auth_token(token_value)? {
            Some(removed) if removed.user_id == user_id => Ok(()),
            Some(removed) => {
                let owner = removed.user_id;
                self.user_store.add_user_auth_token(removed)?;
                bail!(
                    "Tried to delete an auth token of user {} while authenticated as user {}.",
                    owner,
                    user_id
                )
            }
            None => bail!("Auth token not found."),
        }
    }

    pub fn get_user_tokens(&self, user_handle: &str) -> Result<Vec<AuthToken>> {
        self.user_store.get_all_user_auth_tokens(user_handle)
    }

    pub fn get_user_credentials(&self, user_handle: &str) -> Result<Option<UserAuthCredentials>> {
        self.user_store.get_user_auth_credentials(user_handle)
    }

    pub fn create_password_credentials(&self, user_handle: &str, password: &str) -> Result<()> {
        let mut credentials = self
            .user_store
            .get_user_auth_credentials(user_handle)?
            .with_context(|| format!("User with handle {} not found.", user_handle))?;
        if credentials.username_password.is_some() {
            bail!(
                "User with handle {} already has password credentials. Maybe you want to update them?",
                user_handle
            );
        }
        credentials.username_password =
            Some(UsernamePasswordCredentials::new(credentials.user_id, password)?);
        self.user_store.update_user_auth_credentials(credentials)
    }

    pub fn update_password_credentials(&self, user_handle: &str, password: &str) -> Result<()> {
        let mut credentials = self
            .user_store
            .get_user_auth_credentials(user_handle)?
            .with_context(|| format!("User with handle {} not found.", user_handle))?;
        if credentials.username_password.is_none() {
            bail!(
                "Cannot update password of user with handle {} since it never had one.",
                user_handle
            );
        }
        credentials.username_password =
            Some(UsernamePasswordCredentials::new(credentials.user_id, password)?);
        self.user_store.update_user_auth_credentials(credentials)
    }

    pub fn delete_password_credentials(&self, user_handle: &str) -> Result<()> {
        let mut credentials = self
            .user_store
            .get_user_auth_credentials(user_handle)?
            .with_context(|| format!("User with handle {} not found.", user_handle))?;
        credentials.username_password = None;
        self.user_store.update_user_auth_credentials(credentials)
    }

    /// Checks `password` against the stored hash. Unknown users and users
    /// without a password both yield Ok(None).
    pub fn verify_password(&self, user_handle: &str, password: &str) -> Result<Option<UserAuthCredentials>> {
        let credentials = match self.user_store.get_user_auth_credentials(user_handle)? {
            Some(credentials) => credentials,
            None => return Ok(None),
        };
        let verified = match credentials.username_password.as_ref() {
            Some(password_credentials) => password_credentials.verify(password)?,
            None => false,
        };
        Ok(verified.then_some(credentials))
    }

    pub fn get_user_roles(&self, user_id: usize) -> Result<Vec<UserRole>> {
        self.user_store.get_user_roles(user_id)
    }

    pub fn add_user_role(&self, user_id: usize, role: UserRole) -> Result<()> {
        self.user_store.add_user_role(user_id, role)
    }

    pub fn remove_user_role(&self, user_id: usize, role: UserRole) -> Result<()> {
        self.user_store.remove_user_role(user_id, role)
    }

    pub fn get_user_permissions(&self, user_id: usize) -> Result<Vec<Permission>> {
        self.user_store.resolve_user_permissions(user_id)
    }
}
