use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementKind {
    Ingreso,
    Gasto,
}

impl MovementKind {
    /// Segmento de URL del recurso; también da nombre a su snapshot local.
    pub fn path(&self) -> &'static str {
        match self {
            MovementKind::Ingreso => "ingresos",
            MovementKind::Gasto => "gastos",
        }
    }
}

/// Identidad de una fila visible: el id del servidor, o un marcador local
/// emitido mientras el alta sigue en vuelo. Los marcadores se serializan como
/// `"local-{n}"`, que nunca puede chocar con un id numérico del servidor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryId {
    Server(i64),
    Local(u64),
}

impl EntryId {
    pub fn is_local(&self) -> bool {
        matches!(self, EntryId::Local(_))
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryId::Server(id) => write!(f, "{id}"),
            EntryId::Local(n) => write!(f, "local-{n}"),
        }
    }
}

impl Serialize for EntryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EntryId::Server(id) => serializer.serialize_i64(*id),
            EntryId::Local(n) => serializer.collect_str(&format_args!("local-{n}")),
        }
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntryIdVisitor;

        impl<'de> Visitor<'de> for EntryIdVisitor {
            type Value = EntryId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("un id numérico o un marcador \"local-{n}\"")
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<EntryId, E> {
                Ok(EntryId::Server(value))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<EntryId, E> {
                i64::try_from(value)
                    .map(EntryId::Server)
                    .map_err(|_| E::custom("id fuera de rango"))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<EntryId, E> {
                let n = value
                    .strip_prefix("local-")
                    .and_then(|n| n.parse().ok())
                    .ok_or_else(|| E::custom("marcador local inválido"))?;
                Ok(EntryId::Local(n))
            }
        }

        deserializer.deserialize_any(EntryIdVisitor)
    }
}

/// Un movimiento tal como lo devuelve el servidor. Los listados traen
/// `categoria_nombre` resuelto; las respuestas de escritura no.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub id: i64,
    pub user_id: Uuid,
    pub fecha: NaiveDate,
    pub descripcion: Option<String>,
    pub category_id: Option<i64>,
    pub monto: Decimal,
    #[serde(default)]
    pub categoria_nombre: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub nombre: String,
}

/// Lo que entrega el formulario: sin id para un alta, con el id del servidor
/// para una edición.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub id: Option<i64>,
    pub fecha: NaiveDate,
    pub descripcion: Option<String>,
    pub category_id: Option<i64>,
    pub monto: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMovement {
    pub user_id: Uuid,
    pub fecha: NaiveDate,
    pub descripcion: Option<String>,
    pub category_id: Option<i64>,
    pub monto: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementChange {
    pub fecha: NaiveDate,
    pub descripcion: Option<String>,
    pub category_id: Option<i64>,
    pub monto: Decimal,
}

/// Una fila visible de la lista, provisional o ya confirmada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub fecha: NaiveDate,
    pub descripcion: Option<String>,
    pub category_id: Option<i64>,
    pub monto: Decimal,
    pub categoria_nombre: Option<String>,
}

impl From<MovementRecord> for Entry {
    fn from(record: MovementRecord) -> Self {
        Entry {
            id: EntryId::Server(record.id),
            fecha: record.fecha,
            descripcion: record.descripcion,
            category_id: record.category_id,
            monto: two_decimals(record.monto),
            categoria_nombre: record.categoria_nombre,
        }
    }
}

/// Los montos se muestran siempre con dos decimales exactos.
pub fn two_decimals(monto: Decimal) -> Decimal {
    let mut monto = monto.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    monto.rescale(2);
    monto
}
