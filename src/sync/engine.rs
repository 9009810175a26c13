// src/sync/engine.rs

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::{
    common::error::AppError,
    db::{local_store::LocalStore, rows::RecordRow},
    models::record::Collection,
    sync::{
        remote::{RemoteBackend, RemoteError, RemoteRecord},
        status::{StatusSubscription, SyncReport, SyncStatus},
    },
};

/// Quanto tempo um status terminal (success/error) fica visível antes de
/// reverter sozinho para idle.
const STATUS_DISPLAY_WINDOW: Duration = Duration::from_secs(3);

// O motor de sincronização bidirecional.
//
// `sync()` roda pull-antes-de-push: puxar primeiro faz as edições locais
// serem mescladas contra a baseline remota mais fresca, reduzindo conflitos
// de sobrescrita espúrios. Chamadas sobrepostas são coalescidas (a segunda
// vira no-op enquanto a primeira está em voo) — ciclos intercalados sobre o
// mesmo conjunto sujo poderiam subir duas vezes ou perder a corrida do flag.
//
// Nenhum retry automático sem um gatilho novo (ação do usuário, evento de
// reconexão ou notificação de mudança): um backend fora do ar não deve
// virar um hot-loop.
pub struct SyncEngine {
    store: LocalStore,
    backend: Arc<dyn RemoteBackend>,
    network_timeout: Duration,
    in_flight: Mutex<()>,
    status_tx: watch::Sender<SyncStatus>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SyncEngine {
    pub fn new(
        store: LocalStore,
        backend: Arc<dyn RemoteBackend>,
        network_timeout: Duration,
    ) -> Arc<Self> {
        let (status_tx, _) = watch::channel(SyncStatus::Idle);
        Arc::new(Self {
            store,
            backend,
            network_timeout,
            in_flight: Mutex::new(()),
            status_tx,
            listener: Mutex::new(None),
        })
    }

    // --- STATUS ---

    pub fn status(&self) -> SyncStatus {
        self.status_tx.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// Registra um callback de mudança de status; devolve a assinatura que o
    /// libera (`unsubscribe`).
    pub fn on_status_change<F>(&self, callback: F) -> StatusSubscription
    where
        F: Fn(SyncStatus) + Send + 'static,
    {
        let mut rx = self.status_tx.subscribe();
        let handle = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let status = rx.borrow_and_update().clone();
                callback(status);
            }
        });
        StatusSubscription { handle }
    }

    fn set_status(self: &Arc<Self>, status: SyncStatus) {
        let terminal = matches!(
            status,
            SyncStatus::Success { .. } | SyncStatus::Error { .. }
        );
        self.status_tx.send_replace(status.clone());

        if terminal {
            // Reverte para idle depois da janela de exibição, a menos que
            // outro ciclo já tenha trocado o status.
            let engine = Arc::clone(self);
            tokio::spawn(async move {
                tokio::time::sleep(STATUS_DISPLAY_WINDOW).await;
                engine.status_tx.send_if_modified(|current| {
                    if *current == status {
                        *current = SyncStatus::Idle;
                        true
                    } else {
                        false
                    }
                });
            });
        }
    }

    // --- CICLO COMPLETO ---

    /// Pull-então-push, serializado: uma segunda chamada com um ciclo em voo
    /// é coalescida. Erros de rede viram status `error` e entradas no
    /// relatório; só erros de armazenamento local sobem como `Err`.
    pub async fn sync(self: &Arc<Self>) -> Result<SyncReport, AppError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::debug!("sync já em andamento, chamada coalescida");
            return Ok(SyncReport::coalesced());
        };

        self.set_status(SyncStatus::Syncing);
        let mut report = SyncReport::default();

        let result = async {
            self.pull_into(&mut report).await?;
            self.push_into(&mut report).await?;
            Ok::<(), AppError>(())
        }
        .await;

        if let Err(e) = result {
            self.set_status(SyncStatus::Error {
                message: e.to_string(),
            });
            return Err(e);
        }

        self.finish(report)
    }

    /// Só o push (upload de todos os registros sujos).
    pub async fn push_changes(self: &Arc<Self>) -> Result<SyncReport, AppError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::debug!("sync já em andamento, push coalescido");
            return Ok(SyncReport::coalesced());
        };

        self.set_status(SyncStatus::Syncing);
        let mut report = SyncReport::default();

        if let Err(e) = self.push_into(&mut report).await {
            self.set_status(SyncStatus::Error {
                message: e.to_string(),
            });
            return Err(e);
        }

        self.finish(report)
    }

    fn finish(self: &Arc<Self>, report: SyncReport) -> Result<SyncReport, AppError> {
        if report.ok() {
            tracing::info!(
                pushed = report.pushed,
                pulled = report.pulled,
                purged = report.purged,
                "sincronização concluída"
            );
            self.set_status(SyncStatus::Success {
                pushed: report.pushed,
                pulled: report.pulled,
            });
        } else {
            tracing::warn!(errors = report.errors.len(), "sincronização com falhas");
            self.set_status(SyncStatus::Error {
                message: report.errors.join("; "),
            });
        }
        Ok(report)
    }

    // --- PULL ---

    async fn pull_into(&self, report: &mut SyncReport) -> Result<(), AppError> {
        for collection in Collection::ALL {
            let name = collection.as_str();
            let cursor = self.store.cursor(name).await?;

            // Falha de rede é por lote: registra, segue para a próxima
            // coleção e mantém o cursor antigo para retentar depois.
            let fetched = match self
                .with_timeout(self.backend.changed_since(name, cursor))
                .await
            {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(collection = name, "pull falhou: {e}");
                    report.errors.push(format!("pull {name}: {e}"));
                    continue;
                }
            };

            let mut max_seen = cursor;
            for remote in fetched {
                let local = self.store.row(name, remote.id).await?;
                self.merge_remote(local, remote, &mut max_seen, report)
                    .await?;
            }

            // Cursor avança só depois do lote inteiro mesclar com sucesso.
            if max_seen != cursor {
                if let Some(at) = max_seen {
                    self.store.set_cursor(name, at).await?;
                }
            }
        }
        Ok(())
    }

    async fn merge_remote(
        &self,
        local: Option<RecordRow>,
        remote: RemoteRecord,
        max_seen: &mut Option<chrono::DateTime<chrono::Utc>>,
        report: &mut SyncReport,
    ) -> Result<(), AppError> {
        if max_seen.is_none_or(|at| remote.updated_at > at) {
            *max_seen = Some(remote.updated_at);
        }

        match merge_decision(local.as_ref(), &remote) {
            MergeOutcome::KeepLocal => {
                // Não é um erro: é a política documentada. Fica no log para
                // perícia posterior.
                let local = local.expect("KeepLocal implica linha local");
                tracing::debug!(
                    collection = %remote.collection,
                    id = %remote.id,
                    local_at = %local.updated_at,
                    remote_at = %remote.updated_at,
                    "last-write-wins: edição local pendente é mais nova, remoto descartado"
                );
            }
            MergeOutcome::PurgeLocal => {
                tracing::debug!(
                    collection = %remote.collection,
                    id = %remote.id,
                    "tombstone remoto, expurgando registro local"
                );
                self.store.purge(&remote.collection, remote.id).await?;
                report.purged += 1;
            }
            MergeOutcome::AdoptRemote => {
                if let Some(local) = &local {
                    tracing::debug!(
                        collection = %remote.collection,
                        id = %remote.id,
                        local_at = %local.updated_at,
                        remote_at = %remote.updated_at,
                        "last-write-wins: adotando versão remota"
                    );
                }
                let mut data = remote.data;
                // O corpo que veio do push de outro dispositivo carrega o
                // flag `synced` daquele momento; aqui ele passa a refletir
                // ESTE dispositivo, que acabou de confirmar com o remoto.
                if let Some(obj) = data.as_object_mut() {
                    obj.insert("synced".to_string(), Value::Bool(true));
                }
                let row = RecordRow {
                    collection: remote.collection,
                    id: remote.id,
                    data,
                    synced: true,
                    updated_at: remote.updated_at,
                    deleted: remote.deleted,
                };
                self.store.put_row(&row).await?;
                report.pulled += 1;
            }
        }
        Ok(())
    }

    // --- PUSH ---

    async fn push_into(&self, report: &mut SyncReport) -> Result<(), AppError> {
        let dirty = self.store.dirty_rows().await?;
        if dirty.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = dirty.len(), "enviando registros sujos");

        for row in dirty {
            if row.deleted {
                // Soft delete local → delete remoto; com o ack, o tombstone
                // local pode ser expurgado (Active → SoftDeleted → Purged).
                match self
                    .with_timeout(self.backend.delete(&row.collection, row.id))
                    .await
                {
                    Ok(()) => {
                        self.store.purge(&row.collection, row.id).await?;
                        report.purged += 1;
                    }
                    Err(e) => {
                        report
                            .errors
                            .push(format!("push {}/{}: {e}", row.collection, row.id));
                    }
                }
                continue;
            }

            let remote = RemoteRecord {
                collection: row.collection.clone(),
                id: row.id,
                data: row.data.clone(),
                updated_at: row.updated_at,
                deleted: false,
            };
            match self.with_timeout(self.backend.upsert(remote)).await {
                Ok(()) => {
                    // Guarda de carimbo: se uma edição entrou durante o
                    // upload, o registro continua sujo.
                    self.store
                        .mark_synced(&row.collection, row.id, row.updated_at)
                        .await?;
                    report.pushed += 1;
                }
                Err(e) => {
                    // Falha por registro: este fica sujo, os demais seguem.
                    report
                        .errors
                        .push(format!("push {}/{}: {e}", row.collection, row.id));
                }
            }
        }
        Ok(())
    }

    // --- ASSINATURA DE MUDANÇAS REMOTAS ---

    /// Abre o canal de notificações e dispara um ciclo de sync a cada
    /// mudança remota. Idempotente: chamar com uma assinatura ativa não cria
    /// uma segunda.
    pub async fn subscribe_to_changes(self: &Arc<Self>) -> Result<(), RemoteError> {
        let mut slot = self.listener.lock().await;
        if slot.is_some() {
            tracing::debug!("assinatura de mudanças remotas já ativa");
            return Ok(());
        }

        let mut rx = self.with_timeout(self.backend.subscribe()).await?;
        let engine = Arc::clone(self);
        let handle = tokio::spawn(async move {
            while let Some(change) = rx.recv().await {
                tracing::debug!(
                    collection = %change.collection,
                    "mudança remota notificada, disparando pull"
                );
                if let Err(e) = engine.sync().await {
                    tracing::error!("sync disparado por notificação falhou: {e}");
                }
            }
            tracing::info!("canal de notificações remotas fechado");
        });
        *slot = Some(handle);
        Ok(())
    }

    /// Libera completamente o canal de assinatura.
    pub async fn unsubscribe(&self) {
        if let Some(handle) = self.listener.lock().await.take() {
            handle.abort();
            tracing::debug!("assinatura de mudanças remotas liberada");
        }
    }

    /// Uma chamada de rede travada não pode segurar a UI: tudo que fala com
    /// o backend tem um teto de tempo.
    async fn with_timeout<T>(
        &self,
        fut: impl Future<Output = Result<T, RemoteError>>,
    ) -> Result<T, RemoteError> {
        match tokio::time::timeout(self.network_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout),
        }
    }
}

// --- DECISÃO DE MERGE (pura, testável) ---

#[derive(Debug, PartialEq, Eq)]
enum MergeOutcome {
    /// Sobrescreve o local com o remoto e marca synced=true.
    AdoptRemote,
    /// Edição local pendente mais nova: mantém o local sujo, o próximo push
    /// decide.
    KeepLocal,
    /// Tombstone remoto: remove fisicamente a linha local.
    PurgeLocal,
}

/// Last-write-wins por `updatedAt`, o registro inteiro de uma vez (sem merge
/// por campo — limitação conhecida e documentada). Empate vai para o remoto:
/// timestamps iguais significam que o próprio push já deu a volta.
fn merge_decision(local: Option<&RecordRow>, remote: &RemoteRecord) -> MergeOutcome {
    if let Some(local) = local {
        if !local.synced && local.updated_at > remote.updated_at {
            return MergeOutcome::KeepLocal;
        }
    }
    if remote.deleted {
        MergeOutcome::PurgeLocal
    } else {
        MergeOutcome::AdoptRemote
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::json;
    use uuid::Uuid;

    fn local_row(synced: bool, at: chrono::DateTime<chrono::Utc>) -> RecordRow {
        RecordRow {
            collection: "farms".to_string(),
            id: Uuid::new_v4(),
            data: json!({"name": "Campo Norte"}),
            synced,
            updated_at: at,
            deleted: false,
        }
    }

    fn remote_record(at: chrono::DateTime<chrono::Utc>, deleted: bool) -> RemoteRecord {
        RemoteRecord {
            collection: "farms".to_string(),
            id: Uuid::new_v4(),
            data: json!({"name": "Campo Norte II"}),
            updated_at: at,
            deleted,
        }
    }

    #[test]
    fn remoto_mais_novo_vence() {
        let t1 = Utc::now();
        let t2 = t1 + ChronoDuration::seconds(5);
        let local = local_row(false, t1);
        let remote = remote_record(t2, false);
        assert_eq!(
            merge_decision(Some(&local), &remote),
            MergeOutcome::AdoptRemote
        );
    }

    #[test]
    fn edicao_local_pendente_mais_nova_vence() {
        let t1 = Utc::now();
        let t2 = t1 + ChronoDuration::seconds(5);
        let local = local_row(false, t2);
        let remote = remote_record(t1, false);
        assert_eq!(
            merge_decision(Some(&local), &remote),
            MergeOutcome::KeepLocal
        );
    }

    #[test]
    fn local_ja_sincronizado_e_sobrescrito_mesmo_sendo_mais_novo() {
        // Um local synced=true com timestamp maior não deveria acontecer na
        // prática, mas a regra só protege edições PENDENTES.
        let t1 = Utc::now();
        let t2 = t1 + ChronoDuration::seconds(5);
        let local = local_row(true, t2);
        let remote = remote_record(t1, false);
        assert_eq!(
            merge_decision(Some(&local), &remote),
            MergeOutcome::AdoptRemote
        );
    }

    #[test]
    fn empate_vai_para_o_remoto() {
        let t1 = Utc::now();
        let local = local_row(false, t1);
        let remote = remote_record(t1, false);
        assert_eq!(
            merge_decision(Some(&local), &remote),
            MergeOutcome::AdoptRemote
        );
    }

    #[test]
    fn tombstone_remoto_expurga() {
        let t1 = Utc::now();
        let t2 = t1 + ChronoDuration::seconds(5);
        let local = local_row(true, t1);
        let remote = remote_record(t2, true);
        assert_eq!(
            merge_decision(Some(&local), &remote),
            MergeOutcome::PurgeLocal
        );
    }

    #[test]
    fn tombstone_remoto_nao_vence_edicao_local_mais_nova() {
        let t1 = Utc::now();
        let t2 = t1 + ChronoDuration::seconds(5);
        let local = local_row(false, t2);
        let remote = remote_record(t1, true);
        assert_eq!(
            merge_decision(Some(&local), &remote),
            MergeOutcome::KeepLocal
        );
    }

    #[test]
    fn sem_linha_local_adota_o_remoto() {
        let remote = remote_record(Utc::now(), false);
        assert_eq!(merge_decision(None, &remote), MergeOutcome::AdoptRemote);
    }
}
