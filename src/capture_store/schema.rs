//! SQLite schema of the captures database.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("friendly_name", &SqlType::Text),
    ],
    indices: &[],
    unique_constraints: &[],
};

const ARTIST_FOREIGN_KEY: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const CAPTURES_TABLE: Table = Table {
    name: "captures",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            foreign_key = Some(&ARTIST_FOREIGN_KEY)
        ),
        sqlite_column!("sku", &SqlType::Text),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text, non_null = true),
        sqlite_column!("price", &SqlType::Real, non_null = true),
        sqlite_column!("rating", &SqlType::Real),
        sqlite_column!("image_url", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_captures_artist", "artist_id"),
        ("idx_captures_name", "name"),
    ],
    unique_constraints: &[],
};

pub(super) const CAPTURES_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[ARTISTS_TABLE, CAPTURES_TABLE],
    migration: None,
}];

/// Capture columns a caller may sort by.
pub(super) const SORTABLE_CAPTURE_FIELDS: &[&str] = &[
    "id",
    "artist_id",
    "sku",
    "name",
    "description",
    "price",
    "rating",
    "image_url",
];
