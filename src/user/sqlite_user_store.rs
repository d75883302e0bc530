use super::auth::{
    AuthToken, AuthTokenValue, PasswordHasherKind, UserAuthCredentials,
    UsernamePasswordCredentials,
};
use super::permissions::{Permission, UserRole};
use super::user_store::{UserAuthCredentialsStore, UserAuthTokenStore, UserStore};
use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned_db, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    DEFAULT_TIMESTAMP,
};
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

const USER_FOREIGN_KEY: ForeignKey = ForeignKey {
    foreign_table: "user",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

/// V 0
const USER_TABLE_V_0: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("handle", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_user_handle", "handle")],
    unique_constraints: &[],
};
const AUTH_TOKEN_TABLE_V_0: Table = Table {
    name: "auth_token",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FOREIGN_KEY)
        ),
        sqlite_column!("value", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    indices: &[("idx_auth_token_value", "value")],
    unique_constraints: &[],
};
const USER_PASSWORD_CREDENTIALS_TABLE_V_0: Table = Table {
    name: "user_password_credentials",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&USER_FOREIGN_KEY)
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    indices: &[],
    unique_constraints: &[],
};

/// V 1
const USER_ROLE_TABLE_V_1: Table = Table {
    name: "user_role",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FOREIGN_KEY)
        ),
        sqlite_column!("role", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_user_role_user", "user_id")],
    unique_constraints: &[&["user_id", "role"]],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[
            USER_TABLE_V_0,
            AUTH_TOKEN_TABLE_V_0,
            USER_PASSWORD_CREDENTIALS_TABLE_V_0,
        ],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[
            USER_TABLE_V_0,
            AUTH_TOKEN_TABLE_V_0,
            USER_PASSWORD_CREDENTIALS_TABLE_V_0,
            USER_ROLE_TABLE_V_1,
        ],
        migration: Some(|conn: &Connection| USER_ROLE_TABLE_V_1.create(conn)),
    },
];

fn system_time_from_secs(value: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(value.max(0) as u64)
}

fn secs_from_system_time(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn parse_auth_token_row(row: &rusqlite::Row) -> rusqlite::Result<AuthToken> {
    Ok(AuthToken {
        user_id: row.get(0)?,
        value: AuthTokenValue(row.get(1)?),
        created: system_time_from_secs(row.get(2)?),
        last_used: row.get::<_, Option<i64>>(3)?.map(system_time_from_secs),
    })
}

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned_db(db_path, VERSIONED_SCHEMAS)?;
        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("User store connection mutex poisoned"))
    }
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, user_handle: &str) -> Result<usize> {
        let conn = self.conn()?;
        conn.execute(
            &format!("INSERT INTO {} (handle) VALUES (?1)", USER_TABLE_V_0.name),
            params![user_handle],
        )
        .with_context(|| format!("Failed to create user {}", user_handle))?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT handle FROM user WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn get_all_user_handles(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT handle FROM user ORDER BY id")?;
        let handles = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(handles)
    }

    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT id FROM user WHERE handle = ?1",
                params![user_handle],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn get_user_roles(&self, user_id: usize) -> Result<Vec<UserRole>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT role FROM {} WHERE user_id = ?1",
            USER_ROLE_TABLE_V_1.name
        ))?;
        let roles = stmt
            .query_map(params![user_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter_map(|role| {
                let parsed = UserRole::from_str(&role);
                if parsed.is_none() {
                    debug!("Ignoring unknown role {} of user_id={}", role, user_id);
                }
                parsed
            })
            .collect();
        Ok(roles)
    }

    fn add_user_role(&self, user_id: usize, role: UserRole) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (user_id, role) VALUES (?1, ?2)",
                USER_ROLE_TABLE_V_1.name
            ),
            params![user_id, role.as_str()],
        )
        .with_context(|| format!("Failed to add role {} to user_id={}", role, user_id))?;
        Ok(())
    }

    fn remove_user_role(&self, user_id: usize, role: UserRole) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "DELETE FROM {} WHERE user_id = ?1 AND role = ?2",
                USER_ROLE_TABLE_V_1.name
            ),
            params![user_id, role.as_str()],
        )?;
        Ok(())
    }

    fn resolve_user_permissions(&self, user_id: usize) -> Result<Vec<Permission>> {
        let permissions: HashSet<Permission> = self
            .get_user_roles(user_id)?
            .iter()
            .flat_map(|role| role.permissions().iter().copied())
            .collect();
        Ok(permissions.into_iter().collect())
    }
}

impl UserAuthTokenStore for SqliteUserStore {
    fn get_user_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT user_id, value, created, last_used FROM auth_token WHERE value = ?1",
                params![value.0],
                parse_auth_token_row,
            )
            .optional()?)
    }

    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let existing = self.get_user_auth_token(token)?;
        if existing.is_some() {
            self.conn()?.execute(
                "DELETE FROM auth_token WHERE value = ?1",
                params![token.0],
            )?;
        }
        Ok(existing)
    }

    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()> {
        self.conn()?.execute(
            "UPDATE auth_token SET last_used = ?1 WHERE value = ?2",
            params![secs_from_system_time(SystemTime::now()), token.0],
        )?;
        Ok(())
    }

    fn add_user_auth_token(&self, token: AuthToken) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO auth_token (user_id, value, created) VALUES (?1, ?2, ?3)",
            params![
                token.user_id,
                token.value.0,
                secs_from_system_time(token.created)
            ],
        )?;
        Ok(())
    }

    fn get_all_user_auth_tokens(&self, user_handle: &str) -> Result<Vec<AuthToken>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, value, created, last_used FROM auth_token \
             WHERE user_id = (SELECT id FROM user WHERE handle = ?1)",
        )?;
        let tokens = stmt
            .query_map(params![user_handle], parse_auth_token_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tokens)
    }
}

impl UserAuthCredentialsStore for SqliteUserStore {
    fn get_user_auth_credentials(&self, user_handle: &str) -> Result<Option<UserAuthCredentials>> {
        let user_id = match self.get_user_id(user_handle)? {
            Some(id) => id,
            None => return Ok(None),
        };
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT salt, hash, hasher, created, last_used \
                 FROM user_password_credentials WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<i64>>(3)?,
                        row.get::<_, Option<i64>>(4)?,
                    ))
                },
            )
            .optional()?;

        let username_password = match row {
            None => None,
            Some((salt, hash, hasher, created, last_used)) => Some(UsernamePasswordCredentials {
                user_id,
                salt,
                hash,
                hasher: PasswordHasherKind::from_str(&hasher)?,
                created: system_time_from_secs(created.unwrap_or(0)),
                last_used: last_used.map(system_time_from_secs),
            }),
        };

        Ok(Some(UserAuthCredentials {
            user_id,
            username_password,
        }))
    }

    fn update_user_auth_credentials(&self, credentials: UserAuthCredentials) -> Result<()> {
        let conn = self.conn()?;
        match credentials.username_password.as_ref() {
            Some(password) => {
                conn.execute(
                    "INSERT INTO user_password_credentials (user_id, salt, hash, hasher) \
                     VALUES (?1, ?2, ?3, ?4) \
                     ON CONFLICT(user_id) DO UPDATE SET \
                     salt = excluded.salt, hash = excluded.hash, hasher = excluded.hasher",
                    params![
                        credentials.user_id,
                        password.salt,
                        password.hash,
                        password.hasher.to_string()
                    ],
                )?;
            }
            None => {
                conn.execute(
                    "DELETE FROM user_password_credentials WHERE user_id = ?1",
                    params![credentials.user_id],
                )?;
            }
        }
        Ok(())
    }
}
