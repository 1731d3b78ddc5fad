use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

/// Selects one of the two parallel movement tables. Income and expenses share
/// a shape but stay in independent tables, so everything downstream takes the
/// kind as a parameter instead of duplicating per-entity code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementKind {
    Ingreso,
    Gasto,
}

impl MovementKind {
    pub fn table(&self) -> &'static str {
        match self {
            MovementKind::Ingreso => "ingresos",
            MovementKind::Gasto => "gastos",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: i64,
    pub user_id: Uuid,
    pub fecha: NaiveDate,
    pub descripcion: Option<String>,
    pub category_id: Option<i64>,
    pub monto: Decimal,
}

/// Movement junto con el nombre de su categoría, como lo devuelve el listado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementWithCategory {
    #[serde(flatten)]
    pub movement: Movement,
    pub categoria_nombre: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub nombre: String,
}

/// Raw request body for create and update. Everything is optional here; the
/// validation gate decides what is required per operation. `user_id` is only
/// read on create — updates never move a record to another owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementDraft {
    pub user_id: Option<Uuid>,
    pub fecha: Option<String>,
    pub descripcion: Option<String>,
    pub category_id: Option<i64>,
    pub monto: Option<Decimal>,
}

/// A validated create, ready for the record store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovement {
    pub user_id: Uuid,
    pub fecha: NaiveDate,
    pub descripcion: Option<String>,
    pub category_id: Option<i64>,
    pub monto: Decimal,
}

/// A validated full-record replacement. There is no partial patch: every
/// update carries the complete new value.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementChange {
    pub fecha: NaiveDate,
    pub descripcion: Option<String>,
    pub category_id: Option<i64>,
    pub monto: Decimal,
}

impl From<PgRow> for Movement {
    fn from(row: PgRow) -> Self {
        Movement {
            id: row.get("id"),
            user_id: row.get("user_id"),
            fecha: row.get("fecha"),
            descripcion: row.get("descripcion"),
            category_id: row.get("category_id"),
            monto: row.get("monto"),
        }
    }
}

impl From<PgRow> for MovementWithCategory {
    fn from(row: PgRow) -> Self {
        MovementWithCategory {
            movement: Movement {
                id: row.get("id"),
                user_id: row.get("user_id"),
                fecha: row.get("fecha"),
                descripcion: row.get("descripcion"),
                category_id: row.get("category_id"),
                monto: row.get("monto"),
            },
            categoria_nombre: row.get("categoria_nombre"),
        }
    }
}

impl From<PgRow> for Category {
    fn from(row: PgRow) -> Self {
        Category {
            id: row.get("id"),
            nombre: row.get("nombre"),
        }
    }
}
