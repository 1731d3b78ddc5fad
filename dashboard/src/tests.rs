use crate::api::{ApiError, MockMovementApi, MovementApi};
use crate::cache::SnapshotCache;
use crate::coordinator::Coordinator;
use crate::model::{Category, Draft, Entry, EntryId, MovementKind, MovementRecord};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use uuid::Uuid;

fn temp_dir() -> PathBuf {
    static SEQ: AtomicU32 = AtomicU32::new(0);
    std::env::temp_dir().join(format!(
        "finanzas-dashboard-{}-{}",
        std::process::id(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    ))
}

fn temp_cache() -> SnapshotCache {
    SnapshotCache::open(temp_dir()).unwrap()
}

fn coordinator(api: MockMovementApi, user_id: Uuid) -> Coordinator {
    Coordinator::open(Arc::new(api), temp_cache(), user_id)
}

fn fecha(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

fn monto(raw: &str) -> Decimal {
    raw.parse().unwrap()
}

fn record(id: i64, user_id: Uuid, date: &str, amount: &str) -> MovementRecord {
    MovementRecord {
        id,
        user_id,
        fecha: fecha(date),
        descripcion: None,
        category_id: None,
        monto: monto(amount),
        categoria_nombre: None,
    }
}

fn draft(date: &str, amount: &str) -> Draft {
    Draft {
        id: None,
        fecha: fecha(date),
        descripcion: None,
        category_id: None,
        monto: monto(amount),
    }
}

fn rejected(status: u16) -> ApiError {
    ApiError::Rejected {
        status,
        message: "rechazado".to_string(),
    }
}

/// Doble de pruebas cuyo `create` no responde hasta que el test lo libera,
/// para observar la lista con el alta todavía en vuelo. Cualquier otra
/// operación de escritura es un error del test.
struct GatedCreate {
    gate: Mutex<Option<oneshot::Receiver<MovementRecord>>>,
}

impl GatedCreate {
    fn new() -> (oneshot::Sender<MovementRecord>, GatedCreate) {
        let (release, gate) = oneshot::channel();
        (
            release,
            GatedCreate {
                gate: Mutex::new(Some(gate)),
            },
        )
    }
}

#[async_trait]
impl MovementApi for GatedCreate {
    async fn list(
        &self,
        _kind: MovementKind,
        _user_id: Uuid,
    ) -> Result<Vec<MovementRecord>, ApiError> {
        unimplemented!()
    }

    async fn create(
        &self,
        _kind: MovementKind,
        _new: crate::model::NewMovement,
    ) -> Result<MovementRecord, ApiError> {
        let gate = self.gate.lock().unwrap().take().expect("solo un alta");
        Ok(gate.await.expect("canal cerrado sin respuesta"))
    }

    async fn update(
        &self,
        _kind: MovementKind,
        _id: i64,
        _change: crate::model::MovementChange,
    ) -> Result<MovementRecord, ApiError> {
        unimplemented!()
    }

    async fn delete(&self, _kind: MovementKind, _id: i64) -> Result<(), ApiError> {
        unimplemented!()
    }

    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        Ok(vec![Category {
            id: 1,
            nombre: "Salario".to_string(),
        }])
    }
}

// deja avanzar a las tareas en vuelo hasta su próximo await
async fn let_tasks_run() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_alta_provisional_visible_y_reconciliada() {
    let user_id = Uuid::new_v4();
    let (release, api) = GatedCreate::new();
    let coordinator = Arc::new(Coordinator::open(Arc::new(api), temp_cache(), user_id));
    coordinator.reload_categories().await.unwrap();

    let task = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        async move {
            let draft = Draft {
                category_id: Some(1),
                descripcion: Some("sueldo de julio".to_string()),
                ..draft("2025-07-01", "2500")
            };
            coordinator.submit(MovementKind::Ingreso, draft).await
        }
    });
    let_tasks_run().await;

    // con la respuesta aún en vuelo, la fila provisional ya se ve
    let entries = coordinator.entries(MovementKind::Ingreso);
    assert_eq!(entries.len(), 1);
    assert!(entries[0].id.is_local());
    assert_eq!(entries[0].monto.to_string(), "2500.00");
    assert_eq!(entries[0].categoria_nombre.as_deref(), Some("Salario"));

    let respuesta = MovementRecord {
        category_id: Some(1),
        ..record(31, user_id, "2025-07-01", "2500.00")
    };
    release.send(respuesta).unwrap();

    let confirmed = task.await.unwrap().unwrap();
    assert_eq!(confirmed.id, EntryId::Server(31));

    // el marcador local desapareció; quedó la fila confirmada, con nombre
    let entries = coordinator.entries(MovementKind::Ingreso);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, EntryId::Server(31));
    assert_eq!(entries[0].categoria_nombre.as_deref(), Some("Salario"));
}

#[tokio::test]
async fn test_alta_rechazada_revierte_la_lista() {
    let user_id = Uuid::new_v4();
    let registros = vec![
        record(7, user_id, "2025-07-03", "15.00"),
        record(5, user_id, "2025-07-01", "9.99"),
    ];
    let mut api = MockMovementApi::new();
    api.expect_list()
        .returning(move |_, _| Ok(registros.clone()));
    api.expect_create().returning(|_, _| Err(rejected(422)));

    let coordinator = coordinator(api, user_id);
    coordinator.reload(MovementKind::Gasto).await.unwrap();
    let before = coordinator.entries(MovementKind::Gasto);

    let err = coordinator
        .submit(MovementKind::Gasto, draft("2025-07-04", "3.50"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Rejected { status: 422, .. }));
    // valor por valor, la lista quedó como antes del intento
    assert_eq!(coordinator.entries(MovementKind::Gasto), before);
}

#[tokio::test]
async fn test_edicion_rechazada_restaura_la_fila() {
    let user_id = Uuid::new_v4();
    let registros = vec![
        record(9, user_id, "2025-07-05", "1.00"),
        record(7, user_id, "2025-07-03", "100.00"),
    ];
    let mut api = MockMovementApi::new();
    api.expect_list()
        .returning(move |_, _| Ok(registros.clone()));
    api.expect_update().returning(|_, _, _| Err(rejected(500)));

    let coordinator = coordinator(api, user_id);
    coordinator.reload(MovementKind::Gasto).await.unwrap();
    let before = coordinator.entries(MovementKind::Gasto)[1].clone();

    let draft = Draft {
        id: Some(7),
        ..draft("2025-07-03", "999")
    };
    coordinator
        .submit(MovementKind::Gasto, draft)
        .await
        .unwrap_err();

    let entries = coordinator.entries(MovementKind::Gasto);
    assert_eq!(entries.len(), 2);
    // misma posición, mismo contenido
    assert_eq!(entries[1], before);
    assert_eq!(entries[0].id, EntryId::Server(9));
}

#[tokio::test]
async fn test_edicion_confirmada_mantiene_posicion_y_nombre() {
    let user_id = Uuid::new_v4();
    let registros = vec![
        record(9, user_id, "2025-07-05", "1.00"),
        record(7, user_id, "2025-07-03", "100.00"),
    ];
    let mut api = MockMovementApi::new();
    api.expect_categories().returning(|| {
        Ok(vec![Category {
            id: 1,
            nombre: "Salario".to_string(),
        }])
    });
    api.expect_list()
        .returning(move |_, _| Ok(registros.clone()));
    api.expect_update()
        .withf(|_, id, change| *id == 7 && change.monto.to_string() == "45")
        .returning(move |_, id, change| {
            Ok(MovementRecord {
                id,
                user_id,
                fecha: change.fecha,
                descripcion: change.descripcion,
                category_id: change.category_id,
                monto: monto("45.00"),
                categoria_nombre: None,
            })
        });

    let coordinator = coordinator(api, user_id);
    coordinator.reload_categories().await.unwrap();
    coordinator.reload(MovementKind::Ingreso).await.unwrap();

    let draft = Draft {
        id: Some(7),
        category_id: Some(1),
        ..draft("2025-07-04", "45")
    };
    let confirmed = coordinator
        .submit(MovementKind::Ingreso, draft)
        .await
        .unwrap();
    assert_eq!(confirmed.monto.to_string(), "45.00");

    let entries = coordinator.entries(MovementKind::Ingreso);
    // la fila editada no cambia de lugar hasta la próxima recarga
    assert_eq!(entries[1].id, EntryId::Server(7));
    assert_eq!(entries[1].monto.to_string(), "45.00");
    assert_eq!(entries[1].categoria_nombre.as_deref(), Some("Salario"));
}

#[tokio::test]
async fn test_borrado_rechazado_reinserta_ordenado() {
    let user_id = Uuid::new_v4();
    let registros = vec![
        record(8, user_id, "2025-07-04", "3.00"),
        record(7, user_id, "2025-07-03", "2.00"),
        record(6, user_id, "2025-07-02", "1.00"),
    ];
    let mut api = MockMovementApi::new();
    api.expect_list()
        .returning(move |_, _| Ok(registros.clone()));
    api.expect_delete().returning(|_, _| Err(rejected(503)));

    let coordinator = coordinator(api, user_id);
    coordinator.reload(MovementKind::Gasto).await.unwrap();

    coordinator
        .remove(MovementKind::Gasto, EntryId::Server(7))
        .await
        .unwrap_err();

    // reaparece una sola vez, en su lugar por fecha
    let ids: Vec<EntryId> = coordinator
        .entries(MovementKind::Gasto)
        .iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(
        ids,
        vec![EntryId::Server(8), EntryId::Server(7), EntryId::Server(6)]
    );
}

#[tokio::test]
async fn test_borrado_confirmado() {
    let user_id = Uuid::new_v4();
    let registros = vec![
        record(8, user_id, "2025-07-04", "3.00"),
        record(7, user_id, "2025-07-03", "2.00"),
    ];
    let mut api = MockMovementApi::new();
    api.expect_list()
        .returning(move |_, _| Ok(registros.clone()));
    api.expect_delete().returning(|_, _| Ok(()));

    let coordinator = coordinator(api, user_id);
    coordinator.reload(MovementKind::Gasto).await.unwrap();

    coordinator
        .remove(MovementKind::Gasto, EntryId::Server(7))
        .await
        .unwrap();
    let entries = coordinator.entries(MovementKind::Gasto);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, EntryId::Server(8));
}

#[tokio::test]
async fn test_borrar_marcador_local_no_llama_al_servidor() {
    let user_id = Uuid::new_v4();
    let (release, api) = GatedCreate::new();
    let coordinator = Arc::new(Coordinator::open(Arc::new(api), temp_cache(), user_id));

    let task = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        async move {
            coordinator
                .submit(MovementKind::Ingreso, draft("2025-07-01", "10"))
                .await
        }
    });
    let_tasks_run().await;

    let id = coordinator.entries(MovementKind::Ingreso)[0].id;
    assert!(id.is_local());

    // el doble haría panic si esto llegara a la red
    coordinator.remove(MovementKind::Ingreso, id).await.unwrap();
    assert!(coordinator.entries(MovementKind::Ingreso).is_empty());

    // la respuesta del alta llega tarde: ya no hay fila que reconciliar
    release
        .send(record(31, user_id, "2025-07-01", "10.00"))
        .unwrap();
    let confirmed = task.await.unwrap().unwrap();
    assert_eq!(confirmed.id, EntryId::Server(31));
    assert!(coordinator.entries(MovementKind::Ingreso).is_empty());
}

#[tokio::test]
async fn test_recarga_identica_no_cambia_nada() {
    let user_id = Uuid::new_v4();
    let registros = vec![
        record(7, user_id, "2025-07-03", "15.00"),
        record(5, user_id, "2025-07-01", "9.99"),
    ];
    let mut api = MockMovementApi::new();
    api.expect_list()
        .times(2)
        .returning(move |_, _| Ok(registros.clone()));

    let coordinator = coordinator(api, user_id);
    let first = coordinator.reload(MovementKind::Ingreso).await.unwrap();
    let second = coordinator.reload(MovementKind::Ingreso).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(coordinator.entries(MovementKind::Ingreso), first);
}

#[tokio::test]
async fn test_recarga_fallida_vacia_la_lista() {
    let user_id = Uuid::new_v4();
    let registros = vec![record(7, user_id, "2025-07-03", "15.00")];
    let llamadas = AtomicU32::new(0);
    let mut api = MockMovementApi::new();
    api.expect_list().returning(move |_, _| {
        if llamadas.fetch_add(1, Ordering::Relaxed) == 0 {
            Ok(registros.clone())
        } else {
            Err(rejected(500))
        }
    });

    let coordinator = coordinator(api, user_id);
    coordinator.reload(MovementKind::Gasto).await.unwrap();
    assert_eq!(coordinator.entries(MovementKind::Gasto).len(), 1);

    coordinator.reload(MovementKind::Gasto).await.unwrap_err();
    // nada de filas viejas tras un fallo de carga
    assert!(coordinator.entries(MovementKind::Gasto).is_empty());
}

#[tokio::test]
async fn test_snapshot_pinta_la_proxima_sesion() {
    let user_id = Uuid::new_v4();
    let dir = temp_dir();

    let registros = vec![record(7, user_id, "2025-07-03", "15.00")];
    let mut api = MockMovementApi::new();
    api.expect_list()
        .returning(move |_, _| Ok(registros.clone()));
    let primera = Coordinator::open(
        Arc::new(api),
        SnapshotCache::open(dir.clone()).unwrap(),
        user_id,
    );
    primera.reload(MovementKind::Ingreso).await.unwrap();
    drop(primera);

    // segunda sesión: sin expectativas, cualquier llamada de red haría panic
    let segunda = Coordinator::open(
        Arc::new(MockMovementApi::new()),
        SnapshotCache::open(dir).unwrap(),
        user_id,
    );
    let entries = segunda.entries(MovementKind::Ingreso);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, EntryId::Server(7));
    assert_eq!(entries[0].monto.to_string(), "15.00");
}

#[test]
fn test_snapshot_corrupto_es_arranque_en_frio() {
    let user_id = Uuid::new_v4();
    let dir = temp_dir();
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{user_id}-ingresos.json")), "{esto no es json").unwrap();

    let cache = SnapshotCache::open(dir).unwrap();
    assert!(cache.movements(user_id, MovementKind::Ingreso).is_none());
}

#[test]
fn test_snapshot_ida_y_vuelta() {
    let user_id = Uuid::new_v4();
    let cache = temp_cache();
    let entries = vec![Entry {
        id: EntryId::Server(7),
        fecha: fecha("2025-07-03"),
        descripcion: Some("verdulería".to_string()),
        category_id: Some(3),
        monto: monto("12.00"),
        categoria_nombre: Some("Comida".to_string()),
    }];

    cache
        .store_movements(user_id, MovementKind::Gasto, &entries)
        .unwrap();
    assert_eq!(cache.movements(user_id, MovementKind::Gasto), Some(entries));
    // cada tipo tiene su propio archivo
    assert!(cache.movements(user_id, MovementKind::Ingreso).is_none());
}

#[test]
fn test_marcadores_locales_en_el_cable() {
    assert_eq!(EntryId::Server(42).to_string(), "42");
    assert_eq!(EntryId::Local(7).to_string(), "local-7");

    assert_eq!(serde_json::to_value(EntryId::Server(42)).unwrap(), json!(42));
    assert_eq!(
        serde_json::to_value(EntryId::Local(7)).unwrap(),
        json!("local-7")
    );
    assert_eq!(
        serde_json::from_value::<EntryId>(json!(42)).unwrap(),
        EntryId::Server(42)
    );
    assert_eq!(
        serde_json::from_value::<EntryId>(json!("local-7")).unwrap(),
        EntryId::Local(7)
    );
    assert!(serde_json::from_value::<EntryId>(json!("otra-cosa")).is_err());
}
