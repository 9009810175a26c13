// src/sync/remote.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Um registro no formato de transporte: corpo JSON opaco + os metadados
/// que o merge precisa. O push monta isso a partir das linhas sujas; o pull
/// recebe e decide via last-write-wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecord {
    pub collection: String,
    pub id: Uuid,
    pub data: serde_json::Value,
    pub updated_at: DateTime<Utc>,
    /// Tombstone de exclusão: o registro foi excluído no remoto.
    pub deleted: bool,
}

/// Notificação de mudança vinda do canal de assinatura do backend.
#[derive(Debug, Clone)]
pub struct RemoteChange {
    pub collection: String,
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("erro de rede: {0}")]
    Network(String),

    #[error("o backend rejeitou o registro: {0}")]
    Rejected(String),

    #[error("tempo esgotado esperando o backend")]
    Timeout,
}

/// O contrato com o backend remoto. As implementações concretas
/// (HTTP/WebSocket do serviço hospedado) ficam fora deste crate.
///
/// Requisitos que o motor assume:
/// - `upsert` e `delete` são idempotentes por id — repetir a mesma chamada
///   não duplica nem falha;
/// - `changed_since` devolve os registros da coleção com `updatedAt`
///   estritamente maior que o cursor (ou todos, com cursor None), INCLUINDO
///   tombstones de exclusão, para que outros dispositivos as aprendam;
/// - `subscribe` entrega um canal que emite a cada mudança de linha remota.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    async fn upsert(&self, record: RemoteRecord) -> Result<(), RemoteError>;

    async fn delete(&self, collection: &str, id: Uuid) -> Result<(), RemoteError>;

    async fn changed_since(
        &self,
        collection: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<RemoteRecord>, RemoteError>;

    async fn subscribe(&self) -> Result<mpsc::Receiver<RemoteChange>, RemoteError>;
}
