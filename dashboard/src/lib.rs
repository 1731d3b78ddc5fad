//! Capa de datos del panel de finanzas: cliente HTTP del backend, snapshots
//! locales por usuario y coordinación optimista de las listas.

pub mod api;
pub mod cache;
pub mod coordinator;
pub mod model;

#[cfg(test)]
mod tests;

pub use api::{ApiError, HttpApi, MovementApi};
pub use cache::SnapshotCache;
pub use coordinator::Coordinator;
pub use model::{Category, Draft, Entry, EntryId, MovementKind, MovementRecord};
