//! Room schema export (`<version>.json`) and its conversion to SQL.
//!
//! Room embeds ready-made `createSql` fragments in the export, with the
//! table or view name left as a `${TABLE_NAME}` / `${VIEW_NAME}` template.
//! Only the fields needed to rebuild the DDL are modelled; everything else
//! in the file is ignored.

use crate::error::PrefillerError;
use serde::Deserialize;

const TABLE_NAME_PLACEHOLDER: &str = "${TABLE_NAME}";
const VIEW_NAME_PLACEHOLDER: &str = "${VIEW_NAME}";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaExport {
    #[serde(default)]
    pub format_version: Option<u32>,
    pub database: DatabaseBundle,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseBundle {
    pub version: u32,
    #[serde(default)]
    pub identity_hash: Option<String>,
    #[serde(default)]
    pub entities: Vec<EntityBundle>,
    #[serde(default)]
    pub views: Vec<ViewBundle>,
    #[serde(default)]
    pub setup_queries: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityBundle {
    pub table_name: String,
    pub create_sql: String,
    #[serde(default)]
    pub indices: Vec<IndexBundle>,
    /// Only present on FTS entities backed by an external content table.
    #[serde(default)]
    pub content_sync_triggers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexBundle {
    pub name: String,
    pub create_sql: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewBundle {
    pub view_name: String,
    pub create_sql: String,
}

impl SchemaExport {
    pub fn from_json(json: &str) -> Result<Self, PrefillerError> {
        Ok(serde_json::from_str(json)?)
    }

    /// SQL fragments that materialize the schema on an empty database.
    ///
    /// Order: every table with its indices, then FTS content sync triggers
    /// (they reference content tables), views, Room's setup queries and
    /// finally the `user_version` stamp.
    pub fn to_sql(&self) -> Vec<String> {
        let db = &self.database;
        let mut sql = Vec::new();

        for entity in &db.entities {
            sql.push(entity.create_sql.replace(TABLE_NAME_PLACEHOLDER, &entity.table_name));
            sql.extend(
                entity
                    .indices
                    .iter()
                    .map(|index| index.create_sql.replace(TABLE_NAME_PLACEHOLDER, &entity.table_name)),
            );
        }
        for entity in &db.entities {
            sql.extend(entity.content_sync_triggers.iter().cloned());
        }
        for view in &db.views {
            sql.push(view.create_sql.replace(VIEW_NAME_PLACEHOLDER, &view.view_name));
        }
        sql.extend(db.setup_queries.iter().cloned());
        sql.push(format!("PRAGMA user_version = {}", db.version));
        sql
    }
}
