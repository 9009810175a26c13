// src/sync/status.rs

use serde::Serialize;
use tokio::task::JoinHandle;

/// Máquina de estados do motor: idle → syncing → {success, error} → idle.
/// Os estados terminais revertem sozinhos para `idle` depois de uma pequena
/// janela de exibição (ver sync::engine).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SyncStatus {
    Idle,
    Syncing,
    Success { pushed: usize, pulled: usize },
    Error { message: String },
}

/// Resultado agregado de um ciclo de sync (pull, push ou ambos).
///
/// Erros de rede NUNCA estouram para fora do motor: eles chegam aqui como
/// strings e viram status `error`. Os registros afetados continuam sujos e
/// serão retentados no próximo gatilho explícito.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub pushed: usize,
    pub pulled: usize,
    pub purged: usize,
    pub errors: Vec<String>,
    /// true quando a chamada encontrou outro sync em andamento e foi
    /// coalescida (nada foi feito).
    pub coalesced: bool,
}

impl SyncReport {
    pub fn coalesced() -> Self {
        Self {
            coalesced: true,
            ..Self::default()
        }
    }

    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Assinatura de status devolvida por `on_status_change`; solta o callback
/// ao chamar `unsubscribe` (ou ao ser dropada).
pub struct StatusSubscription {
    pub(crate) handle: JoinHandle<()>,
}

impl StatusSubscription {
    pub fn unsubscribe(self) {
        self.handle.abort();
    }
}

impl Drop for StatusSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
