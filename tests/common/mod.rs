// tests/common/mod.rs
//
// Dublê em memória do backend remoto, com injeção de falha de rede, usado
// pelos testes de sincronização e de invariantes.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use campocore::{
    AppConfig, AppState, RemoteBackend, RemoteChange, RemoteError, RemoteRecord, SessionContext,
};
use campocore::models::profiles::Role;

#[derive(Default)]
pub struct MemoryBackend {
    rows: Mutex<HashMap<(String, Uuid), RemoteRecord>>,
    fail_writes: AtomicBool,
    upsert_calls: AtomicUsize,
    notify_tx: Mutex<Option<mpsc::Sender<RemoteChange>>>,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Liga/desliga a falha injetada de rede nas escritas.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn record(&self, collection: &str, id: Uuid) -> Option<RemoteRecord> {
        self.rows
            .lock()
            .unwrap()
            .get(&(collection.to_string(), id))
            .cloned()
    }

    /// Registros vivos (sem tombstones) da coleção.
    pub fn live_count(&self, collection: &str) -> usize {
        self.rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.collection == collection && !r.deleted)
            .count()
    }

    /// Semeia um registro direto no remoto, como se outro dispositivo
    /// tivesse feito push.
    pub fn seed(&self, record: RemoteRecord) {
        self.rows
            .lock()
            .unwrap()
            .insert((record.collection.clone(), record.id), record);
    }

    /// Emite uma notificação de mudança pelo canal de assinatura.
    pub async fn notify_change(&self, collection: &str) {
        let tx = self.notify_tx.lock().unwrap().clone();
        if let Some(tx) = tx {
            tx.send(RemoteChange {
                collection: collection.to_string(),
            })
            .await
            .expect("canal de notificação fechado");
        }
    }
}

#[async_trait]
impl RemoteBackend for MemoryBackend {
    async fn upsert(&self, record: RemoteRecord) -> Result<(), RemoteError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RemoteError::Network("falha injetada".to_string()));
        }
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.rows
            .lock()
            .unwrap()
            .insert((record.collection.clone(), record.id), record);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<(), RemoteError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RemoteError::Network("falha injetada".to_string()));
        }
        // Vira tombstone para que os outros dispositivos aprendam a exclusão
        // no próximo pull.
        self.rows.lock().unwrap().insert(
            (collection.to_string(), id),
            RemoteRecord {
                collection: collection.to_string(),
                id,
                data: serde_json::Value::Null,
                updated_at: Utc::now(),
                deleted: true,
            },
        );
        Ok(())
    }

    async fn changed_since(
        &self,
        collection: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<RemoteRecord>, RemoteError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.collection == collection)
            .filter(|r| since.is_none_or(|s| r.updated_at > s))
            .cloned()
            .collect())
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<RemoteChange>, RemoteError> {
        let (tx, rx) = mpsc::channel(16);
        *self.notify_tx.lock().unwrap() = Some(tx);
        Ok(rx)
    }
}

/// Sobe um AppState em memória ligado a um backend dublê.
pub async fn state(device: &str) -> (AppState, Arc<MemoryBackend>) {
    campocore::init_tracing();
    let backend = MemoryBackend::new();
    let state = AppState::new(AppConfig::in_memory(device), backend.clone())
        .await
        .expect("falha ao montar o AppState de teste");
    (state, backend)
}

/// Dois dispositivos compartilhando o mesmo backend remoto.
pub async fn two_devices() -> (AppState, AppState, Arc<MemoryBackend>) {
    campocore::init_tracing();
    let backend = MemoryBackend::new();
    let a = AppState::new(AppConfig::in_memory("device-a"), backend.clone())
        .await
        .expect("falha ao montar o dispositivo A");
    let b = AppState::new(AppConfig::in_memory("device-b"), backend.clone())
        .await
        .expect("falha ao montar o dispositivo B");
    (a, b, backend)
}

pub fn session() -> SessionContext {
    SessionContext::new(Uuid::new_v4(), "Ing. Agr. Paula", Role::Admin)
}
