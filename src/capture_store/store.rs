//! SQLite-backed capture store.

use super::models::*;
use super::schema::{CAPTURES_VERSIONED_SCHEMAS, SORTABLE_CAPTURE_FIELDS};
use super::trait_def::{CaptureStore, CaptureStoreError};
use super::validation::validate_capture_form;
use crate::sqlite_persistence::open_versioned_db;
use anyhow::{anyhow, Context, Result};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const SELECT_CAPTURE: &str = "SELECT c.id, c.artist_id, c.sku, c.name, c.description, \
     c.price, c.rating, c.image_url, a.id, a.name, a.friendly_name \
     FROM captures c LEFT JOIN artists a ON a.id = c.artist_id";

#[derive(Clone)]
pub struct SqliteCaptureStore {
    conn: Arc<Mutex<Connection>>,
}

/// SQL function lowercasing with full Unicode case folding. SQLite's own
/// `LOWER` and `LIKE` only fold ASCII letters.
const UNICODE_LOWER_FN: &str = "ulower";

fn register_unicode_lower(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        UNICODE_LOWER_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )
    .with_context(|| format!("Failed to register SQL function {}", UNICODE_LOWER_FN))
}

fn order_by_clause(ordering: Option<&CaptureOrdering>) -> Result<String> {
    let ordering = match ordering {
        Some(ordering) => ordering,
        None => return Ok(" ORDER BY c.id".to_string()),
    };
    let column = match &ordering.key {
        CaptureOrderKey::NameCaseInsensitive => format!("{}(c.name)", UNICODE_LOWER_FN),
        CaptureOrderKey::ArtistName => "a.name".to_string(),
        CaptureOrderKey::Field(field) => {
            if !SORTABLE_CAPTURE_FIELDS.contains(&field.as_str()) {
                return Err(CaptureStoreError::UnknownSortField(field.clone()).into());
            }
            format!("c.{}", field)
        }
    };
    let direction = if ordering.descending { "DESC" } else { "ASC" };
    Ok(format!(
        " ORDER BY {column} {direction}, c.id {direction}",
        column = column,
        direction = direction
    ))
}

impl SqliteCaptureStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_db(db_path, CAPTURES_VERSIONED_SCHEMAS)
            .context("Failed to open captures database")?;
        register_unicode_lower(&conn)?;

        let capture_count: i64 = conn.query_row("SELECT COUNT(*) FROM captures", [], |r| r.get(0))?;
        let artist_count: i64 = conn.query_row("SELECT COUNT(*) FROM artists", [], |r| r.get(0))?;
        info!(
            "Opened captures catalog: {} captures, {} artists",
            capture_count, artist_count
        );

        Ok(SqliteCaptureStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Captures store connection mutex poisoned"))
    }

    /// Artists are managed out of band (admin CLI, fixtures), never by the views.
    pub fn create_artist(&self, name: &str, friendly_name: Option<&str>) -> Result<Artist> {
        if name.trim().is_empty() {
            anyhow::bail!("The artist name cannot be empty.");
        }
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO artists (name, friendly_name) VALUES (?1, ?2)",
            params![name, friendly_name],
        )
        .with_context(|| format!("Failed to create artist '{}'", name))?;
        Ok(Artist {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            friendly_name: friendly_name.map(str::to_string),
        })
    }

    fn parse_artist_row(row: &rusqlite::Row) -> rusqlite::Result<Artist> {
        Ok(Artist {
            id: row.get(0)?,
            name: row.get(1)?,
            friendly_name: row.get(2)?,
        })
    }

    fn parse_capture_row(row: &rusqlite::Row) -> rusqlite::Result<Capture> {
        let artist = match row.get::<_, Option<i64>>(8)? {
            Some(artist_id) => Some(Artist {
                id: artist_id,
                name: row.get(9)?,
                friendly_name: row.get(10)?,
            }),
            None => None,
        };
        Ok(Capture {
            id: row.get(0)?,
            artist,
            sku: row.get(2)?,
            name: row.get(3)?,
            description: row.get(4)?,
            price: row.get(5)?,
            rating: row.get(6)?,
            image_url: row.get(7)?,
        })
    }

    fn get_capture_inner(conn: &Connection, id: i64) -> Result<Option<Capture>> {
        Ok(conn
            .query_row(
                &format!("{} WHERE c.id = ?1", SELECT_CAPTURE),
                params![id],
                Self::parse_capture_row,
            )
            .optional()?)
    }

    fn check_form(&self, form: &CaptureForm) -> Result<()> {
        let errors = validate_capture_form(self, form)?;
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CaptureStoreError::InvalidForm(errors).into())
        }
    }

    fn count(&self, table: &str) -> usize {
        let conn = match self.conn() {
            Ok(conn) => conn,
            Err(_) => return 0,
        };
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
            r.get::<_, i64>(0)
        })
        .map(|count| count as usize)
        .unwrap_or(0)
    }
}

impl CaptureStore for SqliteCaptureStore {
    fn get_capture(&self, id: i64) -> Result<Option<Capture>> {
        let conn = self.conn()?;
        Self::get_capture_inner(&conn, id)
    }

    fn query_captures(&self, query: &CaptureQuery) -> Result<Vec<Capture>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(names) = &query.artist_names {
            if names.is_empty() {
                conditions.push("0".to_string());
            } else {
                let placeholders = vec!["?"; names.len()].join(", ");
                conditions.push(format!("a.name IN ({})", placeholders));
                values.extend(names.iter().cloned().map(Value::Text));
            }
        }

        if let Some(text) = &query.text {
            // instr() matches the needle literally, so `%` and `_` need no escaping.
            conditions.push(format!(
                "(instr({f}(c.name), ?) > 0 OR instr({f}(c.description), ?) > 0)",
                f = UNICODE_LOWER_FN
            ));
            let needle = text.to_lowercase();
            values.push(Value::Text(needle.clone()));
            values.push(Value::Text(needle));
        }

        let mut sql = SELECT_CAPTURE.to_string();
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(&order_by_clause(query.ordering.as_ref())?);
        debug!("Captures query: {}", sql);

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let captures = stmt
            .query_map(params_from_iter(values), Self::parse_capture_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(captures)
    }

    fn create_capture(&self, form: &CaptureForm) -> Result<Capture> {
        self.check_form(form)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO captures (artist_id, sku, name, description, price, rating, image_url) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                form.artist_id,
                form.sku,
                form.name,
                form.description,
                form.price,
                form.rating,
                form.image_url
            ],
        )
        .context("Failed to insert capture")?;
        let id = conn.last_insert_rowid();
        Self::get_capture_inner(&conn, id)?
            .with_context(|| format!("Capture {} vanished right after insertion", id))
    }

    fn update_capture(&self, id: i64, form: &CaptureForm) -> Result<Option<Capture>> {
        self.check_form(form)?;

        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE captures SET artist_id = ?1, sku = ?2, name = ?3, description = ?4, \
             price = ?5, rating = ?6, image_url = ?7 WHERE id = ?8",
            params![
                form.artist_id,
                form.sku,
                form.name,
                form.description,
                form.price,
                form.rating,
                form.image_url,
                id
            ],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        Self::get_capture_inner(&conn, id)
    }

    fn delete_capture(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn()?
            .execute("DELETE FROM captures WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn get_artist(&self, id: i64) -> Result<Option<Artist>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT id, name, friendly_name FROM artists WHERE id = ?1",
                params![id],
                Self::parse_artist_row,
            )
            .optional()?)
    }

    fn get_artists_by_names(&self, names: &[String]) -> Result<Vec<Artist>> {
        if names.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!(
            "SELECT id, name, friendly_name FROM artists WHERE name IN ({}) ORDER BY name",
            vec!["?"; names.len()].join(", ")
        );
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let artists = stmt
            .query_map(params_from_iter(names.iter()), Self::parse_artist_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artists)
    }

    fn list_artists(&self) -> Result<Vec<Artist>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name, friendly_name FROM artists ORDER BY name")?;
        let artists = stmt
            .query_map([], Self::parse_artist_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artists)
    }

    fn get_captures_count(&self) -> usize {
        self.count("captures")
    }

    fn get_artists_count(&self) -> usize {
        self.count("artists")
    }
}
