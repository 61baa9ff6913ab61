use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::models::Posting;

/// Errors that can occur when reading the posting catalog
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Columns that may be used as equality filters on posting queries
const FILTERABLE_COLUMNS: [&str; 5] = [
    "location",
    "postal_code",
    "profession",
    "company_name",
    "source_platform",
];

/// Read access to the scraped posting catalog
#[async_trait]
pub trait PostingStore: Send + Sync {
    /// Active postings, optionally narrowed by whitelisted equality filters.
    /// Filters with a null value or an unknown column are ignored.
    async fn list_active(
        &self,
        filters: &HashMap<String, Option<String>>,
    ) -> Result<Vec<Posting>, StorageError>;

    async fn get(&self, id: i64) -> Result<Posting, StorageError>;

    async fn count_active(&self) -> Result<i64, StorageError>;

    /// Distinct company names across active postings
    async fn distinct_companies(&self) -> Result<i64, StorageError>;
}

/// SQLite-backed posting catalog
///
/// The catalog is populated by the scraper pipeline; this service only reads.
pub struct SqlitePostingStore {
    pool: SqlitePool,
}

impl SqlitePostingStore {
    /// Open the database and run pending migrations
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StorageError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl PostingStore for SqlitePostingStore {
    async fn list_active(
        &self,
        filters: &HashMap<String, Option<String>>,
    ) -> Result<Vec<Posting>, StorageError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, title, profession, description, requirements, location, postal_code, \
             company_name, source_url, source_platform, is_active, created_at \
             FROM postings WHERE is_active = 1",
        );

        let mut applied = 0usize;
        for column in FILTERABLE_COLUMNS {
            if let Some(Some(value)) = filters.get(column) {
                builder.push(format!(" AND {} = ", column));
                builder.push_bind(value.clone());
                applied += 1;
            }
        }

        builder.push(" ORDER BY created_at DESC");

        let postings = builder
            .build_query_as::<Posting>()
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(
            "Loaded {} active postings ({} filters applied)",
            postings.len(),
            applied
        );

        Ok(postings)
    }

    async fn get(&self, id: i64) -> Result<Posting, StorageError> {
        let query = r#"
            SELECT id, title, profession, description, requirements, location, postal_code,
                   company_name, source_url, source_platform, is_active, created_at
            FROM postings
            WHERE id = ?
        "#;

        sqlx::query_as::<_, Posting>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("posting {}", id)))
    }

    async fn count_active(&self) -> Result<i64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM postings WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("count"))
    }

    async fn distinct_companies(&self) -> Result<i64, StorageError> {
        let row = sqlx::query(
            "SELECT COUNT(DISTINCT company_name) as count FROM postings WHERE is_active = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqlitePostingStore {
        let store = SqlitePostingStore::new("sqlite::memory:", 1).await.unwrap();
        let insert = r#"
            INSERT INTO postings
                (title, profession, description, location, postal_code, company_name,
                 source_url, source_platform, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;
        let rows = [
            ("Informatiker/in EFZ", "Informatiker/in EFZ", "Software entwickeln", "Zürich", "8001", "Tech AG", "https://example.ch/1", "yousty", 1),
            ("Koch/Köchin EFZ", "Koch/Köchin EFZ", "Kochen im Team", "Bern", "3001", "Restaurant Adler", "https://example.ch/2", "lena", 1),
            ("Maurer/in EFZ", "Maurer/in EFZ", "Auf dem Bau", "Zürich", "8004", "Bau GmbH", "https://example.ch/3", "yousty", 0),
        ];
        for (title, profession, description, location, postal, company, url, platform, active) in rows {
            sqlx::query(insert)
                .bind(title)
                .bind(profession)
                .bind(description)
                .bind(location)
                .bind(postal)
                .bind(company)
                .bind(url)
                .bind(platform)
                .bind(active)
                .execute(&store.pool)
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_list_active_excludes_inactive() {
        let store = store().await;
        let postings = store.list_active(&HashMap::new()).await.unwrap();
        assert_eq!(postings.len(), 2);
        assert!(postings.iter().all(|p| p.is_active));
    }

    #[tokio::test]
    async fn test_list_active_applies_whitelisted_filter() {
        let store = store().await;
        let filters = HashMap::from([("location".to_string(), Some("Zürich".to_string()))]);
        let postings = store.list_active(&filters).await.unwrap();
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].title, "Informatiker/in EFZ");
    }

    #[tokio::test]
    async fn test_list_active_ignores_null_and_unknown_filters() {
        let store = store().await;
        let filters = HashMap::from([
            ("location".to_string(), None),
            ("drop_table".to_string(), Some("x".to_string())),
        ]);
        let postings = store.list_active(&filters).await.unwrap();
        assert_eq!(postings.len(), 2);
    }

    #[tokio::test]
    async fn test_get_missing_posting_is_not_found() {
        let store = store().await;
        assert!(matches!(
            store.get(9999).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_counts() {
        let store = store().await;
        assert_eq!(store.count_active().await.unwrap(), 2);
        assert_eq!(store.distinct_companies().await.unwrap(), 2);
        assert!(store.health_check().await.unwrap());
    }
}
