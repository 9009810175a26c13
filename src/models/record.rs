// src/models/record.rs

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// Uma coleção lógica por tipo de entidade. O armazenamento local não impõe
/// chaves estrangeiras entre coleções — integridade referencial é
/// responsabilidade da camada de serviços.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Clients,
    Farms,
    Lots,
    Products,
    Stock,
    Movements,
    Orders,
    OrderActivities,
    Warehouses,
    Observations,
    Profiles,
}

impl Collection {
    /// Todas as coleções, na ordem em que o motor de sync as percorre.
    pub const ALL: [Collection; 11] = [
        Collection::Clients,
        Collection::Farms,
        Collection::Lots,
        Collection::Products,
        Collection::Stock,
        Collection::Movements,
        Collection::Orders,
        Collection::OrderActivities,
        Collection::Warehouses,
        Collection::Observations,
        Collection::Profiles,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Collection::Clients => "clients",
            Collection::Farms => "farms",
            Collection::Lots => "lots",
            Collection::Products => "products",
            Collection::Stock => "stock",
            Collection::Movements => "movements",
            Collection::Orders => "orders",
            Collection::OrderActivities => "order_activities",
            Collection::Warehouses => "warehouses",
            Collection::Observations => "observations",
            Collection::Profiles => "profiles",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contrato comum de todo registro sincronizável.
///
/// Campos obrigatórios em toda entidade: `id` (UUID gerado no cliente, nunca
/// reatribuído), `synced`, `updatedAt`, `deleted`/`deletedAt`/`deletedBy`.
///
/// REGRA DURA para quem adicionar um novo caminho de mutação: toda escrita
/// que representa uma mudança de domínio passa por `LocalStore::put_dirty`,
/// que chama `mark_dirty` (synced=false + updatedAt=agora) antes de
/// persistir. Um flag esquecido quebra a sincronização em silêncio.
pub trait Syncable: Serialize + DeserializeOwned + Clone + Send + Sync {
    const COLLECTION: Collection;

    fn id(&self) -> Uuid;
    fn synced(&self) -> bool;
    fn updated_at(&self) -> DateTime<Utc>;
    fn deleted(&self) -> bool;

    fn set_synced(&mut self, synced: bool);
    fn set_updated_at(&mut self, at: DateTime<Utc>);
    fn set_deleted(&mut self, at: DateTime<Utc>, by: &str);

    /// Marca o registro como pendente de sincronização.
    fn mark_dirty(&mut self) {
        self.set_synced(false);
        self.set_updated_at(Utc::now());
    }

    /// Soft delete: o registro permanece no armazenamento local até o backend
    /// remoto confirmar a exclusão (aí sim ele é expurgado).
    fn soft_delete(&mut self, by: &str) {
        self.set_deleted(Utc::now(), by);
        self.mark_dirty();
    }
}

/// Implementa `Syncable` para uma entidade com os campos padrão
/// (`id`, `synced`, `updated_at`, `deleted`, `deleted_at`, `deleted_by`).
macro_rules! impl_syncable {
    ($ty:ty, $collection:expr) => {
        impl $crate::models::record::Syncable for $ty {
            const COLLECTION: $crate::models::record::Collection = $collection;

            fn id(&self) -> uuid::Uuid {
                self.id
            }

            fn synced(&self) -> bool {
                self.synced
            }

            fn updated_at(&self) -> chrono::DateTime<chrono::Utc> {
                self.updated_at
            }

            fn deleted(&self) -> bool {
                self.deleted
            }

            fn set_synced(&mut self, synced: bool) {
                self.synced = synced;
            }

            fn set_updated_at(&mut self, at: chrono::DateTime<chrono::Utc>) {
                self.updated_at = at;
            }

            fn set_deleted(&mut self, at: chrono::DateTime<chrono::Utc>, by: &str) {
                self.deleted = true;
                self.deleted_at = Some(at);
                self.deleted_by = Some(by.to_string());
            }
        }
    };
}

pub(crate) use impl_syncable;
