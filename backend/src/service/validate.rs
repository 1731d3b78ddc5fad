use crate::domain::model::{MovementChange, MovementDraft, NewMovement};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;

/// Field-level failures, keyed by the wire name of the offending field.
/// Nothing that fails here ever reaches the record store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

pub fn create(draft: &MovementDraft) -> Result<NewMovement, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if draft.user_id.is_none() {
        errors.push("user_id", "obligatorio");
    }
    let fecha = check_fecha(draft.fecha.as_deref(), &mut errors);
    let monto = check_monto(draft.monto, &mut errors);

    match (draft.user_id, fecha, monto) {
        (Some(user_id), Some(fecha), Some(monto)) => Ok(NewMovement {
            user_id,
            fecha,
            descripcion: draft.descripcion.clone(),
            category_id: draft.category_id,
            monto,
        }),
        _ => Err(errors),
    }
}

/// Igual que `create` pero sin `user_id`: un registro nunca cambia de dueño,
/// por lo que el campo se ignora aunque venga en el cuerpo.
pub fn update(draft: &MovementDraft) -> Result<MovementChange, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let fecha = check_fecha(draft.fecha.as_deref(), &mut errors);
    let monto = check_monto(draft.monto, &mut errors);

    match (fecha, monto) {
        (Some(fecha), Some(monto)) => Ok(MovementChange {
            fecha,
            descripcion: draft.descripcion.clone(),
            category_id: draft.category_id,
            monto,
        }),
        _ => Err(errors),
    }
}

fn check_fecha(fecha: Option<&str>, errors: &mut ValidationErrors) -> Option<NaiveDate> {
    let Some(raw) = fecha else {
        errors.push("fecha", "obligatorio");
        return None;
    };
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(fecha) => Some(fecha),
        Err(_) => {
            errors.push("fecha", "debe ser una fecha válida (YYYY-MM-DD)");
            None
        }
    }
}

fn check_monto(monto: Option<Decimal>, errors: &mut ValidationErrors) -> Option<Decimal> {
    let Some(monto) = monto else {
        errors.push("monto", "obligatorio");
        return None;
    };
    if monto < Decimal::ZERO {
        errors.push("monto", "no puede ser negativo");
        return None;
    }
    Some(two_decimals(monto))
}

/// Los montos se guardan y devuelven siempre con dos decimales exactos.
pub fn two_decimals(monto: Decimal) -> Decimal {
    let mut monto = monto.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    monto.rescale(2);
    monto
}
