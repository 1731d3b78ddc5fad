use crate::domain::model::{Category, Movement, MovementDraft, MovementKind, MovementWithCategory};
use crate::domain::repository::{CategoryRepository, MovementRepository};
use crate::service::validate::{self, ValidationErrors};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("No encontrado")]
    NotFound,
    #[error("cuerpo de la petición inválido")]
    Validation(ValidationErrors),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Reglas de negocio de ingresos y gastos, por encima de los repositorios.
pub struct MovementService {
    movements: Arc<dyn MovementRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl MovementService {
    pub fn new(
        movements: Arc<dyn MovementRepository>,
        categories: Arc<dyn CategoryRepository>,
    ) -> MovementService {
        MovementService {
            movements,
            categories,
        }
    }

    pub async fn list(
        &self,
        kind: MovementKind,
        user_id: Uuid,
    ) -> Result<Vec<MovementWithCategory>, AppError> {
        Ok(self.movements.list_for_user(kind, user_id).await?)
    }

    pub async fn create(
        &self,
        kind: MovementKind,
        draft: MovementDraft,
    ) -> Result<Movement, AppError> {
        let new = validate::create(&draft).map_err(AppError::Validation)?;
        self.check_category(new.category_id).await?;
        Ok(self.movements.insert(kind, new).await?)
    }

    pub async fn update(
        &self,
        kind: MovementKind,
        id: i64,
        draft: MovementDraft,
    ) -> Result<Movement, AppError> {
        // El registro se resuelve antes de validar el cuerpo: un id
        // desconocido responde 404 aunque el cuerpo también sea inválido.
        if self.movements.find(kind, id).await?.is_none() {
            return Err(AppError::NotFound);
        }
        let change = validate::update(&draft).map_err(AppError::Validation)?;
        self.check_category(change.category_id).await?;
        match self.movements.update(kind, id, change).await? {
            Some(movement) => Ok(movement),
            // la fila desapareció entre el find y el update
            None => Err(AppError::NotFound),
        }
    }

    pub async fn delete(&self, kind: MovementKind, id: i64) -> Result<(), AppError> {
        if self.movements.delete(kind, id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }

    pub async fn categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.categories.all().await?)
    }

    async fn check_category(&self, category_id: Option<i64>) -> Result<(), AppError> {
        let Some(id) = category_id else {
            return Ok(());
        };
        if self.categories.find(id).await?.is_none() {
            let mut errors = ValidationErrors::default();
            errors.push("category_id", "categoría inexistente");
            return Err(AppError::Validation(errors));
        }
        Ok(())
    }
}
