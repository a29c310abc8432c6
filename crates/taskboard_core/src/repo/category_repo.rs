//! Category repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Category names are unique; `ensure_default_categories` relies on that
//!   uniqueness to stay idempotent.
//! - Deleting a category never deletes tasks: the foreign key clears
//!   `tasks.category_uuid` instead.

use crate::model::category::{Category, CategoryId, DEFAULT_CATEGORIES};
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const CATEGORY_ENTITY: &str = "category";

/// Repository interface for category persistence.
pub trait CategoryRepository {
    fn create_category(&self, category: &Category) -> RepoResult<CategoryId>;
    /// Inserts any missing default category. Returns how many were created.
    fn ensure_default_categories(&self) -> RepoResult<usize>;
    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>>;
    /// Lists all categories ordered by name.
    fn list_categories(&self) -> RepoResult<Vec<Category>>;
    fn delete_category(&self, id: CategoryId) -> RepoResult<()>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    /// Creates a repository over a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["categories"])?;
        Ok(Self { conn })
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn create_category(&self, category: &Category) -> RepoResult<CategoryId> {
        let normalized = Category::new(&category.name, category.description.as_str())?;

        self.conn.execute(
            "INSERT INTO categories (uuid, name, description) VALUES (?1, ?2, ?3);",
            params![
                category.id.to_string(),
                normalized.name,
                normalized.description,
            ],
        )?;
        Ok(category.id)
    }

    fn ensure_default_categories(&self) -> RepoResult<usize> {
        let mut created = 0;
        for (name, description) in DEFAULT_CATEGORIES {
            created += self.conn.execute(
                "INSERT OR IGNORE INTO categories (uuid, name, description)
                 VALUES (?1, ?2, ?3);",
                params![Uuid::new_v4().to_string(), name, description],
            )?;
        }
        Ok(created)
    }

    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        let columns = self
            .conn
            .query_row(
                "SELECT uuid, name, description FROM categories WHERE uuid = ?1;",
                [id.to_string()],
                read_category_columns,
            )
            .optional()?;

        columns.map(into_category).transpose()
    }

    fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, name, description
             FROM categories
             ORDER BY name COLLATE NOCASE ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(into_category(read_category_columns(row)?)?);
        }
        Ok(categories)
    }

    fn delete_category(&self, id: CategoryId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM categories WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: CATEGORY_ENTITY,
                id,
            });
        }
        Ok(())
    }
}

type CategoryColumns = (String, String, String);

fn read_category_columns(row: &Row<'_>) -> rusqlite::Result<CategoryColumns> {
    Ok((row.get("uuid")?, row.get("name")?, row.get("description")?))
}

fn into_category((uuid, name, description): CategoryColumns) -> RepoResult<Category> {
    Ok(Category {
        id: parse_uuid(&uuid, "categories.uuid")?,
        name,
        description,
    })
}
