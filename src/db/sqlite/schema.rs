//! Startup schema integrity check.
//!
//! Reads the live definition of every table through SQLite's table-valued
//! pragma functions and compares it with the declared schema. Column order
//! does not matter; declared types are compared by SQLite type affinity.
//! Only explicitly created indices are checked (auto-indices backing
//! primary keys are ignored).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use sqlx::{Row, SqlitePool};
use tracing::{debug, error};

use super::helpers::db_err;
use crate::db::{DbError, DbResult};

/// SQLite type affinity of a declared column type.
pub(crate) fn affinity(declared: &str) -> &'static str {
    let ty = declared.to_ascii_uppercase();
    if ty.contains("INT") {
        "INTEGER"
    } else if ty.contains("CHAR") || ty.contains("CLOB") || ty.contains("TEXT") {
        "TEXT"
    } else if ty.is_empty() || ty.contains("BLOB") {
        "BLOB"
    } else if ty.contains("REAL") || ty.contains("FLOA") || ty.contains("DOUB") {
        "REAL"
    } else {
        "NUMERIC"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnInfo {
    pub affinity: &'static str,
    pub not_null: bool,
    /// 1-based position in the primary key, 0 when not part of it.
    pub primary_key: i64,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ForeignKeyInfo {
    pub parent: String,
    pub from: String,
    pub to: String,
    pub on_update: String,
    pub on_delete: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct IndexInfo {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

/// Structural description of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TableInfo {
    pub name: String,
    pub columns: BTreeMap<String, ColumnInfo>,
    pub foreign_keys: BTreeSet<ForeignKeyInfo>,
    pub indices: BTreeSet<IndexInfo>,
}

impl TableInfo {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: BTreeMap::new(),
            foreign_keys: BTreeSet::new(),
            indices: BTreeSet::new(),
        }
    }

    fn column(mut self, name: &str, declared: &str, not_null: bool, primary_key: i64) -> Self {
        self.columns.insert(
            name.to_string(),
            ColumnInfo {
                affinity: affinity(declared),
                not_null,
                primary_key,
                default_value: None,
            },
        );
        self
    }

    fn default_value(mut self, column: &str, value: &str) -> Self {
        if let Some(info) = self.columns.get_mut(column) {
            info.default_value = Some(value.to_string());
        }
        self
    }

    fn foreign_key(mut self, from: &str, parent: &str, to: &str, on_delete: &str) -> Self {
        self.foreign_keys.insert(ForeignKeyInfo {
            parent: parent.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            on_update: "NO ACTION".to_string(),
            on_delete: on_delete.to_string(),
        });
        self
    }

    fn index(mut self, name: &str, unique: bool, columns: &[&str]) -> Self {
        self.indices.insert(IndexInfo {
            name: name.to_string(),
            unique,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }
}

impl fmt::Display for TableInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return write!(f, "{}(<missing>)", self.name);
        }

        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|(name, c)| {
                let mut s = format!("{} {}", name, c.affinity);
                if c.not_null {
                    s.push_str(" NOT NULL");
                }
                if c.primary_key > 0 {
                    s.push_str(&format!(" PK{}", c.primary_key));
                }
                if let Some(default) = &c.default_value {
                    s.push_str(&format!(" DEFAULT {}", default));
                }
                s
            })
            .collect();

        let foreign_keys: Vec<String> = self
            .foreign_keys
            .iter()
            .map(|fk| {
                format!(
                    "{} -> {}({}) ON UPDATE {} ON DELETE {}",
                    fk.from, fk.parent, fk.to, fk.on_update, fk.on_delete
                )
            })
            .collect();

        let indices: Vec<String> = self
            .indices
            .iter()
            .map(|idx| {
                format!(
                    "{}{}({})",
                    if idx.unique { "UNIQUE " } else { "" },
                    idx.name,
                    idx.columns.join(", ")
                )
            })
            .collect();

        write!(
            f,
            "{}(columns=[{}], foreign_keys=[{}], indices=[{}])",
            self.name,
            columns.join(", "),
            foreign_keys.join(", "),
            indices.join(", ")
        )
    }
}

/// The schema this build expects.
pub(crate) fn expected_tables() -> Vec<TableInfo> {
    vec![
        TableInfo::new("users")
            .column("id", "TEXT", true, 1)
            .column("username", "TEXT", true, 0)
            .column("email", "TEXT", true, 0)
            .column("created_at", "TEXT", true, 0),
        TableInfo::new("todo_lists")
            .column("id", "TEXT", true, 1)
            .column("user_id", "TEXT", true, 0)
            .column("name", "TEXT", true, 0)
            .column("color", "TEXT", true, 0)
            .column("reminder", "TEXT", false, 0)
            .column("is_persistent", "INTEGER", true, 0)
            .column("created_at", "TEXT", true, 0)
            .column("updated_at", "TEXT", true, 0)
            .column("is_synced", "INTEGER", true, 0)
            .column("is_deleted", "INTEGER", true, 0),
        TableInfo::new("tasks")
            .column("id", "TEXT", true, 1)
            .column("list_id", "TEXT", true, 0)
            .column("title", "TEXT", true, 0)
            .column("description", "TEXT", false, 0)
            .column("completed", "INTEGER", true, 0)
            .column("reminder", "TEXT", false, 0)
            .column("position", "INTEGER", true, 0)
            .default_value("position", "0")
            .column("created_at", "TEXT", true, 0)
            .column("updated_at", "TEXT", true, 0)
            .column("is_synced", "INTEGER", true, 0)
            .column("is_deleted", "INTEGER", true, 0)
            .foreign_key("list_id", "todo_lists", "id", "CASCADE")
            .index("index_tasks_list_id", false, &["list_id"]),
    ]
}

/// Read the live definition of `table`. A missing table has no columns.
pub(crate) async fn read_table(pool: &SqlitePool, table: &str) -> DbResult<TableInfo> {
    let mut info = TableInfo::new(table);

    let rows = sqlx::query(
        r#"SELECT name, type AS declared_type, "notnull" AS not_null, dflt_value, pk
           FROM pragma_table_info(?)"#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(db_err)?;

    for row in &rows {
        let name: String = row.get("name");
        let declared: String = row.get("declared_type");
        let not_null: i64 = row.get("not_null");
        info.columns.insert(
            name,
            ColumnInfo {
                affinity: affinity(&declared),
                not_null: not_null != 0,
                primary_key: row.get("pk"),
                default_value: row.get("dflt_value"),
            },
        );
    }

    let rows = sqlx::query(
        r#"SELECT "table" AS parent, "from" AS from_column, "to" AS to_column, on_update, on_delete
           FROM pragma_foreign_key_list(?)"#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(db_err)?;

    for row in &rows {
        let to: Option<String> = row.get("to_column");
        info.foreign_keys.insert(ForeignKeyInfo {
            parent: row.get("parent"),
            from: row.get("from_column"),
            to: to.unwrap_or_default(),
            on_update: row.get::<String, _>("on_update").to_ascii_uppercase(),
            on_delete: row.get::<String, _>("on_delete").to_ascii_uppercase(),
        });
    }

    let rows = sqlx::query(
        r#"SELECT name, "unique" AS is_unique
           FROM pragma_index_list(?)
           WHERE origin = 'c'"#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(db_err)?;

    for row in &rows {
        let name: String = row.get("name");
        let unique: i64 = row.get("is_unique");
        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_index_info(?) ORDER BY seqno")
                .bind(&name)
                .fetch_all(pool)
                .await
                .map_err(db_err)?;
        info.indices.insert(IndexInfo {
            name,
            unique: unique != 0,
            columns,
        });
    }

    Ok(info)
}

/// Compare every declared table with the live database.
///
/// Returns the first mismatch as `DbError::SchemaMismatch`.
pub(crate) async fn validate(pool: &SqlitePool) -> DbResult<()> {
    for expected in expected_tables() {
        let found = read_table(pool, &expected.name).await?;
        if found != expected {
            error!(table = %expected.name, %expected, %found, "schema mismatch");
            return Err(DbError::SchemaMismatch {
                table: expected.name.clone(),
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
    }

    debug!("schema matches declared tables");
    Ok(())
}
