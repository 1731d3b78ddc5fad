use crate::api::{ApiError, MovementApi};
use crate::cache::SnapshotCache;
use crate::model::{
    two_decimals, Category, Draft, Entry, EntryId, MovementChange, MovementKind, MovementRecord,
    NewMovement,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Dueño, en el cliente, de las listas de ingresos y gastos de la sesión.
///
/// Las mutaciones son optimistas: la lista visible cambia antes de que el
/// servidor conteste, y la respuesta confirma la fila provisional o la
/// revierte. Se crea al iniciar sesión (pintando las listas desde el snapshot
/// local) y se descarta al cerrarla, llevándose todo el estado del usuario.
pub struct Coordinator {
    api: Arc<dyn MovementApi>,
    cache: SnapshotCache,
    user_id: Uuid,
    lists: Mutex<Lists>,
    next_local: AtomicU64,
}

#[derive(Default)]
struct Lists {
    ingresos: Vec<Entry>,
    gastos: Vec<Entry>,
    categories: Vec<Category>,
}

impl Lists {
    fn seq(&self, kind: MovementKind) -> &Vec<Entry> {
        match kind {
            MovementKind::Ingreso => &self.ingresos,
            MovementKind::Gasto => &self.gastos,
        }
    }

    fn seq_mut(&mut self, kind: MovementKind) -> &mut Vec<Entry> {
        match kind {
            MovementKind::Ingreso => &mut self.ingresos,
            MovementKind::Gasto => &mut self.gastos,
        }
    }

    fn category_name(&self, category_id: Option<i64>) -> Option<String> {
        let id = category_id?;
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.nombre.clone())
    }
}

impl Coordinator {
    pub fn open(api: Arc<dyn MovementApi>, cache: SnapshotCache, user_id: Uuid) -> Coordinator {
        let lists = Lists {
            ingresos: cache.movements(user_id, MovementKind::Ingreso).unwrap_or_default(),
            gastos: cache.movements(user_id, MovementKind::Gasto).unwrap_or_default(),
            categories: cache.categories(user_id).unwrap_or_default(),
        };
        Coordinator {
            api,
            cache,
            user_id,
            lists: Mutex::new(lists),
            next_local: AtomicU64::new(1),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Copia actual de una lista, filas provisionales incluidas.
    pub fn entries(&self, kind: MovementKind) -> Vec<Entry> {
        self.lists().seq(kind).clone()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.lists().categories.clone()
    }

    /// Aplica un borrador de forma optimista y reconcilia con la respuesta.
    /// Sin id crea una fila nueva; con id reemplaza la existente. Si el
    /// servidor falla, la lista vuelve a su valor anterior y el error se
    /// devuelve para que la interfaz lo muestre.
    pub async fn submit(&self, kind: MovementKind, draft: Draft) -> Result<Entry, ApiError> {
        match draft.id {
            None => self.submit_create(kind, draft).await,
            Some(id) => self.submit_update(kind, id, draft).await,
        }
    }

    async fn submit_create(&self, kind: MovementKind, draft: Draft) -> Result<Entry, ApiError> {
        let placeholder = EntryId::Local(self.next_local.fetch_add(1, Ordering::Relaxed));
        {
            let mut lists = self.lists();
            let entry = Entry {
                id: placeholder,
                fecha: draft.fecha,
                descripcion: draft.descripcion.clone(),
                category_id: draft.category_id,
                monto: two_decimals(draft.monto),
                categoria_nombre: lists.category_name(draft.category_id),
            };
            // Lo recién enviado queda arriba del todo, sin importar su fecha.
            lists.seq_mut(kind).insert(0, entry);
        }

        let new = NewMovement {
            user_id: self.user_id,
            fecha: draft.fecha,
            descripcion: draft.descripcion,
            category_id: draft.category_id,
            monto: draft.monto,
        };
        match self.api.create(kind, new).await {
            Ok(record) => Ok(self.reconcile(kind, placeholder, record)),
            Err(err) => {
                self.lists()
                    .seq_mut(kind)
                    .retain(|entry| entry.id != placeholder);
                Err(err)
            }
        }
    }

    async fn submit_update(
        &self,
        kind: MovementKind,
        id: i64,
        draft: Draft,
    ) -> Result<Entry, ApiError> {
        let target = EntryId::Server(id);
        let prior = {
            let mut lists = self.lists();
            let categoria_nombre = lists.category_name(draft.category_id);
            match lists.seq_mut(kind).iter_mut().find(|e| e.id == target) {
                Some(slot) => {
                    let prior = slot.clone();
                    *slot = Entry {
                        id: target,
                        fecha: draft.fecha,
                        descripcion: draft.descripcion.clone(),
                        category_id: draft.category_id,
                        monto: two_decimals(draft.monto),
                        categoria_nombre,
                    };
                    Some(prior)
                }
                // la fila ya no está en pantalla; la petición sale igual
                None => None,
            }
        };

        let change = MovementChange {
            fecha: draft.fecha,
            descripcion: draft.descripcion,
            category_id: draft.category_id,
            monto: draft.monto,
        };
        match self.api.update(kind, id, change).await {
            Ok(record) => Ok(self.reconcile(kind, target, record)),
            Err(err) => {
                if let Some(prior) = prior {
                    let mut lists = self.lists();
                    if let Some(slot) = lists.seq_mut(kind).iter_mut().find(|e| e.id == target) {
                        *slot = prior;
                    }
                }
                Err(err)
            }
        }
    }

    /// Quita una fila de forma optimista. Un marcador local solo existe en
    /// esta sesión, así que no hay nada que pedirle al servidor. Si el borrado
    /// remoto falla, la copia retenida vuelve a la lista, reordenada por fecha
    /// descendente (la posición exacta original no se conserva).
    pub async fn remove(&self, kind: MovementKind, id: EntryId) -> Result<(), ApiError> {
        let retained = {
            let mut lists = self.lists();
            let seq = lists.seq_mut(kind);
            seq.iter()
                .position(|entry| entry.id == id)
                .map(|index| seq.remove(index))
        };

        let EntryId::Server(server_id) = id else {
            return Ok(());
        };

        match self.api.delete(kind, server_id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                if let Some(entry) = retained {
                    let mut lists = self.lists();
                    let seq = lists.seq_mut(kind);
                    if !seq.iter().any(|e| e.id == entry.id) {
                        seq.push(entry);
                        seq.sort_by(|a, b| b.fecha.cmp(&a.fecha));
                    }
                }
                Err(err)
            }
        }
    }

    /// Reemplaza una lista por la copia autoritativa del servidor y persiste
    /// el snapshot. Una carga fallida vacía la lista en vez de dejar filas
    /// viejas en pantalla.
    pub async fn reload(&self, kind: MovementKind) -> Result<Vec<Entry>, ApiError> {
        match self.api.list(kind, self.user_id).await {
            Ok(records) => {
                let entries: Vec<Entry> = records.into_iter().map(Entry::from).collect();
                *self.lists().seq_mut(kind) = entries.clone();
                if let Err(err) = self.cache.store_movements(self.user_id, kind, &entries) {
                    log::warn!(lista = kind.path(), err:? = err; "no se pudo guardar el snapshot");
                }
                Ok(entries)
            }
            Err(err) => {
                self.lists().seq_mut(kind).clear();
                Err(err)
            }
        }
    }

    pub async fn reload_categories(&self) -> Result<Vec<Category>, ApiError> {
        match self.api.categories().await {
            Ok(categories) => {
                self.lists().categories = categories.clone();
                if let Err(err) = self.cache.store_categories(self.user_id, &categories) {
                    log::warn!(err:? = err; "no se pudo guardar el snapshot de categorías");
                }
                Ok(categories)
            }
            Err(err) => {
                self.lists().categories.clear();
                Err(err)
            }
        }
    }

    /// Cambia la fila provisional por el registro confirmado, resolviendo el
    /// nombre de categoría con la lista local (las respuestas de escritura no
    /// lo traen). Si la fila ya no está, la respuesta llegó tarde y no cambia
    /// nada visible.
    fn reconcile(&self, kind: MovementKind, target: EntryId, record: MovementRecord) -> Entry {
        let mut lists = self.lists();
        let categoria_nombre = lists.category_name(record.category_id);
        let mut entry = Entry::from(record);
        entry.categoria_nombre = categoria_nombre;
        if let Some(slot) = lists.seq_mut(kind).iter_mut().find(|e| e.id == target) {
            *slot = entry.clone();
        }
        entry
    }

    // El candado nunca se retiene a través de un await: cada operación lo
    // toma solo el instante de mutar la lista, así los envíos en vuelo no se
    // bloquean entre sí.
    fn lists(&self) -> MutexGuard<'_, Lists> {
        self.lists.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
