use crate::domain::model::*;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use uuid::Uuid;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait MovementRepository: Send + Sync {
    /// Todos los movimientos de un usuario, con el nombre de categoría
    /// resuelto, ordenados por fecha descendente.
    async fn list_for_user(
        &self,
        kind: MovementKind,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<MovementWithCategory>>;

    async fn find(&self, kind: MovementKind, id: i64) -> anyhow::Result<Option<Movement>>;

    async fn insert(&self, kind: MovementKind, new: NewMovement) -> anyhow::Result<Movement>;

    /// Full-record replacement. Returns `None` when the row no longer exists.
    async fn update(
        &self,
        kind: MovementKind,
        id: i64,
        change: MovementChange,
    ) -> anyhow::Result<Option<Movement>>;

    /// Returns `false` when there was nothing to delete.
    async fn delete(&self, kind: MovementKind, id: i64) -> anyhow::Result<bool>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn all(&self) -> anyhow::Result<Vec<Category>>;

    async fn find(&self, id: i64) -> anyhow::Result<Option<Category>>;
}
