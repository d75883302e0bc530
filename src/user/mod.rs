pub mod auth;
pub mod permissions;
mod sqlite_user_store;
mod user_manager;
mod user_store;

pub use auth::{AuthToken, AuthTokenValue, UserAuthCredentials, UsernamePasswordCredentials};
pub use permissions::{Permission, UserRole};
pub use sqlite_user_store::SqliteUserStore;
pub use user_manager::UserManager;
pub use user_store::{UserAuthCredentialsStore, UserAuthTokenStore, UserStore};
