use anyhow::{bail, Context, Result};
use rusqlite::{params, types::Type, Connection};
use std::path::Path;
use tracing::info;

pub const DEFAULT_TIMESTAMP: &str = "(cast(strftime('%s','now') as int))";

/// Every database created by this server stores `BASE_DB_VERSION + schema version`
/// in `PRAGMA user_version`, so that a foreign SQLite file (user_version = 0)
/// is never mistaken for one of ours.
pub const BASE_DB_VERSION: usize = 99999;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                is_unique: false,
                default_value: None,
                foreign_key: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
        }
    }

    fn from_sql(s: &str) -> Option<&'static SqlType> {
        match s {
            "TEXT" => Some(&SqlType::Text),
            "INTEGER" => Some(&SqlType::Integer),
            "REAL" => Some(&SqlType::Real),
            _ => None,
        }
    }
}

#[allow(unused)]
pub enum ForeignKeyOnChange {
    NoAction,
    Restrict,
    SetNull,
    Cascade,
}

impl ForeignKeyOnChange {
    fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyOnChange::NoAction => "NO ACTION",
            ForeignKeyOnChange::Restrict => "RESTRICT",
            ForeignKeyOnChange::SetNull => "SET NULL",
            ForeignKeyOnChange::Cascade => "CASCADE",
        }
    }
}

pub struct ForeignKey {
    pub foreign_table: &'static str,
    pub foreign_column: &'static str,
    pub on_delete: ForeignKeyOnChange,
}

pub struct Column<'a, S: AsRef<str>> {
    pub name: S,
    pub sql_type: &'a SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub is_unique: bool,
    pub default_value: Option<S>,
    pub foreign_key: Option<&'a ForeignKey>,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column<'static, &'static str>],
    pub indices: &'static [(&'static str, &'static str)],
    pub unique_constraints: &'static [&'static [&'static str]],
}

impl Table {
    fn create_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let mut sql = format!("{} {}", column.name, column.sql_type.as_sql());
                if column.is_primary_key {
                    sql.push_str(" PRIMARY KEY");
                }
                if column.non_null {
                    sql.push_str(" NOT NULL");
                }
                if column.is_unique {
                    sql.push_str(" UNIQUE");
                }
                if let Some(default_value) = column.default_value {
                    sql.push_str(&format!(" DEFAULT {}", default_value));
                }
                if let Some(fk) = column.foreign_key {
                    sql.push_str(&format!(
                        " REFERENCES {}({}) ON DELETE {}",
                        fk.foreign_table,
                        fk.foreign_column,
                        fk.on_delete.as_sql()
                    ));
                }
                sql
            })
            .chain(
                self.unique_constraints
                    .iter()
                    .map(|columns| format!("UNIQUE ({})", columns.join(", "))),
            )
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({});", self.name, columns)
    }

    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute(&self.create_sql(), params![])
            .with_context(|| format!("Failed to create table {}", self.name))?;

        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX {} ON {}({});",
                    index_name, self.name, column_name
                ),
                params![],
            )?;
        }
        Ok(())
    }

    fn validate(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let actual_columns = stmt
            .query_map(params![], |row| {
                let type_name: String = row.get(2)?;
                let sql_type = SqlType::from_sql(&type_name).ok_or_else(|| {
                    rusqlite::Error::InvalidColumnType(2, type_name.clone(), Type::Text)
                })?;
                Ok(Column {
                    name: row.get::<_, String>(1)?,
                    sql_type,
                    non_null: row.get::<_, i32>(3)? == 1,
                    default_value: row.get::<_, Option<String>>(4)?,
                    is_primary_key: row.get::<_, i32>(5)? == 1,
                    is_unique: false,
                    foreign_key: None,
                })
            })?
            .collect::<Result<Vec<Column<'_, String>>, _>>()
            .with_context(|| format!("Failed to read columns of table {}", self.name))?;

        if actual_columns.len() != self.columns.len() {
            bail!(
                "Table {} has {} columns, expected {}",
                self.name,
                actual_columns.len(),
                self.columns.len()
            );
        }

        for (actual, expected) in actual_columns.iter().zip(self.columns.iter()) {
            if actual.name != expected.name {
                bail!(
                    "Table {} column name mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    actual.name
                );
            }
            if actual.sql_type != expected.sql_type
                || actual.non_null != expected.non_null
                || actual.is_primary_key != expected.is_primary_key
            {
                bail!(
                    "Table {} column {} definition mismatch: expected {:?} (non_null={}, pk={}), got {:?} (non_null={}, pk={})",
                    self.name,
                    expected.name,
                    expected.sql_type,
                    expected.non_null,
                    expected.is_primary_key,
                    actual.sql_type,
                    actual.non_null,
                    actual.is_primary_key
                );
            }
        }

        for (index_name, _) in self.indices {
            let index_exists = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2",
                    params![index_name, self.name],
                    |_| Ok(()),
                )
                .is_ok();
            if !index_exists {
                bail!("Table {} is missing index '{}'", self.name, index_name);
            }
        }
        Ok(())
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.create(conn)?;
        }
        conn.pragma_update(None, "user_version", BASE_DB_VERSION + self.version)?;
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.validate(conn)?;
        }
        Ok(())
    }
}

fn read_schema_version(conn: &Connection, schemas: &[VersionedSchema]) -> Result<usize> {
    let raw_version: i64 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .context("Failed to read database version")?;
    let version = raw_version - BASE_DB_VERSION as i64;
    if version < 0 {
        bail!(
            "Database version {} does not contain base db version {}",
            raw_version,
            BASE_DB_VERSION
        );
    }
    if version as usize >= schemas.len() {
        bail!("Database version {} is too new", version);
    }
    Ok(version as usize)
}

/// Opens (or creates) the SQLite database at `db_path`, creating the latest
/// schema on a fresh file, otherwise validating the stored version and running
/// the pending migrations in a single transaction.
pub fn open_versioned_db<P: AsRef<Path>>(
    db_path: P,
    schemas: &[VersionedSchema],
) -> Result<Connection> {
    let db_path = db_path.as_ref();
    let latest = schemas.last().context("No schema versions declared")?;
    let is_new = !db_path.exists();

    let mut conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {:?}", db_path))?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    if is_new {
        info!(
            "Creating db schema at version {} in {:?}",
            latest.version, db_path
        );
        latest.create(&conn)?;
        return Ok(conn);
    }

    let version = read_schema_version(&conn, schemas)?;
    schemas[version].validate(&conn)?;

    if version < latest.version {
        let tx = conn.transaction()?;
        let mut current = version;
        for schema in schemas.iter().skip(version + 1) {
            if let Some(migration) = schema.migration {
                info!("Migrating db from version {} to {}", current, schema.version);
                migration(&tx)?;
            }
            current = schema.version;
        }
        tx.pragma_update(None, "user_version", BASE_DB_VERSION + current)?;
        tx.commit()?;
    }

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite_column;
    use tempfile::TempDir;

    const NOTES_V_0: Table = Table {
        name: "notes",
        columns: &[
            sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
            sqlite_column!("body", &SqlType::Text, non_null = true),
        ],
        indices: &[],
        unique_constraints: &[],
    };

    const TAGS_V_1: Table = Table {
        name: "tags",
        columns: &[
            sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
            sqlite_column!("label", &SqlType::Text, non_null = true),
        ],
        indices: &[("idx_tags_label", "label")],
        unique_constraints: &[&["label"]],
    };

    const SCHEMAS_V_0: &[VersionedSchema] = &[VersionedSchema {
        version: 0,
        tables: &[NOTES_V_0],
        migration: None,
    }];

    const SCHEMAS_V_1: &[VersionedSchema] = &[
        VersionedSchema {
            version: 0,
            tables: &[NOTES_V_0],
            migration: None,
        },
        VersionedSchema {
            version: 1,
            tables: &[NOTES_V_0, TAGS_V_1],
            migration: Some(|conn: &Connection| TAGS_V_1.create(conn)),
        },
    ];

    fn user_version(conn: &Connection) -> i64 {
        conn.query_row("PRAGMA user_version;", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn creates_latest_schema_on_new_file() {
        let dir = TempDir::new().unwrap();
        let conn = open_versioned_db(dir.path().join("test.db"), SCHEMAS_V_1).unwrap();

        assert_eq!(user_version(&conn), (BASE_DB_VERSION + 1) as i64);
        conn.execute("INSERT INTO tags (label) VALUES ('a')", [])
            .unwrap();
        assert!(conn
            .execute("INSERT INTO tags (label) VALUES ('a')", [])
            .is_err());
    }

    #[test]
    fn migrates_older_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        {
            let conn = open_versioned_db(&path, SCHEMAS_V_0).unwrap();
            conn.execute("INSERT INTO notes (body) VALUES ('kept')", [])
                .unwrap();
        }

        let conn = open_versioned_db(&path, SCHEMAS_V_1).unwrap();
        assert_eq!(user_version(&conn), (BASE_DB_VERSION + 1) as i64);
        let body: String = conn
            .query_row("SELECT body FROM notes", [], |r| r.get(0))
            .unwrap();
        assert_eq!(body, "kept");
        SCHEMAS_V_1[1].validate(&conn).unwrap();
    }

    #[test]
    fn rejects_foreign_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("foreign.db");
        Connection::open(&path)
            .unwrap()
            .execute("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT NOT NULL)", [])
            .unwrap();

        let err = open_versioned_db(&path, SCHEMAS_V_0).unwrap_err();
        assert!(err.to_string().contains("base db version"));
    }

    #[test]
    fn validate_detects_missing_index() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE tags (id INTEGER PRIMARY KEY, label TEXT NOT NULL)", [])
            .unwrap();

        let err = TAGS_V_1.validate(&conn).unwrap_err().to_string();
        assert!(err.contains("missing index"));
        assert!(err.contains("idx_tags_label"));
    }

    #[test]
    fn validate_detects_column_mismatch() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)", [])
            .unwrap();

        let err = NOTES_V_0.validate(&conn).unwrap_err().to_string();
        assert!(err.contains("definition mismatch"));
    }
}
