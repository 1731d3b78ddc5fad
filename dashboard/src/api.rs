use crate::model::{Category, MovementChange, MovementKind, MovementRecord, NewMovement};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Toda petición se aborta pasado este límite.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ApiError {
    /// La petición no llegó a producir respuesta (red caída, timeout).
    #[error("fallo de red: {0}")]
    Transport(#[from] reqwest::Error),
    /// El servidor respondió con un estado de error.
    #[error("el servidor rechazó la operación ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait MovementApi: Send + Sync {
    async fn list(
        &self,
        kind: MovementKind,
        user_id: Uuid,
    ) -> Result<Vec<MovementRecord>, ApiError>;

    async fn create(
        &self,
        kind: MovementKind,
        new: NewMovement,
    ) -> Result<MovementRecord, ApiError>;

    async fn update(
        &self,
        kind: MovementKind,
        id: i64,
        change: MovementChange,
    ) -> Result<MovementRecord, ApiError>;

    async fn delete(&self, kind: MovementKind, id: i64) -> Result<(), ApiError>;

    async fn categories(&self) -> Result<Vec<Category>, ApiError>;
}

pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Result<HttpApi, ApiError> {
        let client = reqwest::ClientBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(HttpApi {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl MovementApi for HttpApi {
    async fn list(
        &self,
        kind: MovementKind,
        user_id: Uuid,
    ) -> Result<Vec<MovementRecord>, ApiError> {
        let resp = self
            .client
            .get(self.url(kind.path()))
            .query(&[("user_id", user_id.to_string())])
            .send()
            .await?;
        checked(resp).await
    }

    async fn create(
        &self,
        kind: MovementKind,
        new: NewMovement,
    ) -> Result<MovementRecord, ApiError> {
        let resp = self
            .client
            .post(self.url(kind.path()))
            .json(&new)
            .send()
            .await?;
        checked(resp).await
    }

    async fn update(
        &self,
        kind: MovementKind,
        id: i64,
        change: MovementChange,
    ) -> Result<MovementRecord, ApiError> {
        let resp = self
            .client
            .put(self.url(&format!("{}/{}", kind.path(), id)))
            .json(&change)
            .send()
            .await?;
        checked(resp).await
    }

    async fn delete(&self, kind: MovementKind, id: i64) -> Result<(), ApiError> {
        let resp = self
            .client
            .delete(self.url(&format!("{}/{}", kind.path(), id)))
            .send()
            .await?;
        checked::<serde_json::Value>(resp).await?;
        Ok(())
    }

    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let resp = self.client.get(self.url("categories")).send().await?;
        checked(resp).await
    }
}

async fn checked<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(ApiError::Rejected {
            status: status.as_u16(),
            message: rejection_message(resp).await,
        });
    }
    Ok(resp.json::<T>().await?)
}

/// Saca un mensaje legible del cuerpo de error, sea `{"error": ...}` o el
/// mapa `{"errors": {...}}` de la validación.
async fn rejection_message(resp: reqwest::Response) -> String {
    let fallback = resp
        .status()
        .canonical_reason()
        .unwrap_or("error desconocido")
        .to_string();
    let body = match resp.text().await {
        Ok(body) => body,
        Err(_) => return fallback,
    };
    if body.is_empty() {
        return fallback;
    }
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(value) => {
            if let Some(message) = value.get("error").and_then(|v| v.as_str()) {
                message.to_string()
            } else if let Some(errors) = value.get("errors") {
                errors.to_string()
            } else {
                body
            }
        }
        Err(_) => body,
    }
}
