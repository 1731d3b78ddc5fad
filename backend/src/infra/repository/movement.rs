use crate::domain::model::{
    Movement, MovementChange, MovementKind, MovementWithCategory, NewMovement,
};
use crate::domain::repository;
use async_trait::async_trait;
use sqlx::Error::RowNotFound;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct PgMovementRepository {
    pub pool: Pool<Postgres>,
}

impl PgMovementRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        PgMovementRepository { pool }
    }
}

// `kind.table()` elige entre las dos tablas gemelas; el resto del SQL es
// idéntico para ingresos y gastos.
#[async_trait]
impl repository::MovementRepository for PgMovementRepository {
    async fn list_for_user(
        &self,
        kind: MovementKind,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<MovementWithCategory>> {
        let rows = sqlx::query(&format!(
            "SELECT m.id, m.user_id, m.fecha, m.descripcion, m.category_id, m.monto, \
             c.nombre AS categoria_nombre \
             FROM {} m LEFT JOIN categories c ON c.id = m.category_id \
             WHERE m.user_id = $1 \
             ORDER BY m.fecha DESC, m.id DESC",
            kind.table()
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MovementWithCategory::from).collect())
    }

    async fn find(&self, kind: MovementKind, id: i64) -> anyhow::Result<Option<Movement>> {
        let row = sqlx::query(&format!(
            "SELECT id, user_id, fecha, descripcion, category_id, monto FROM {} WHERE id = $1",
            kind.table()
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await;
        match row {
            Ok(row) => Ok(Some(row.into())),
            Err(RowNotFound) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn insert(&self, kind: MovementKind, new: NewMovement) -> anyhow::Result<Movement> {
        let result = sqlx::query(&format!(
            "INSERT INTO {}(user_id, monto, fecha, descripcion, category_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
            kind.table()
        ))
        .bind(new.user_id)
        .bind(new.monto)
        .bind(new.fecha)
        .bind(&new.descripcion)
        .bind(new.category_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Movement {
            id: result.get("id"),
            user_id: new.user_id,
            fecha: new.fecha,
            descripcion: new.descripcion,
            category_id: new.category_id,
            monto: new.monto,
        })
    }

    async fn update(
        &self,
        kind: MovementKind,
        id: i64,
        change: MovementChange,
    ) -> anyhow::Result<Option<Movement>> {
        let row = sqlx::query(&format!(
            "UPDATE {} SET monto = $1, fecha = $2, descripcion = $3, category_id = $4 \
             WHERE id = $5 \
             RETURNING id, user_id, fecha, descripcion, category_id, monto",
            kind.table()
        ))
        .bind(change.monto)
        .bind(change.fecha)
        .bind(&change.descripcion)
        .bind(change.category_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Movement::from))
    }

    async fn delete(&self, kind: MovementKind, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", kind.table()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
