use crate::domain::model::Category;
use crate::domain::repository;
use async_trait::async_trait;
use sqlx::Error::RowNotFound;
use sqlx::{Pool, Postgres};

#[derive(Clone)]
pub struct PgCategoryRepository {
    pub pool: Pool<Postgres>,
}

impl PgCategoryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        PgCategoryRepository { pool }
    }
}

#[async_trait]
impl repository::CategoryRepository for PgCategoryRepository {
    async fn all(&self) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, nombre FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn find(&self, id: i64) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query("SELECT id, nombre FROM categories WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await;
        match row {
            Ok(row) => Ok(Some(row.into())),
            Err(RowNotFound) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
