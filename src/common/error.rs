use thiserror::Error;
use uuid::Uuid;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
//
// Três famílias, com políticas de propagação diferentes:
// - erros de armazenamento (quota/corrupção): fatais para a ação do usuário,
//   nunca engolidos em silêncio;
// - violações de invariante de domínio: rejeitadas ANTES de qualquer escrita,
//   a mensagem volta para a UI e nenhum estado parcial fica para trás;
// - erros de rede/sincronização NÃO passam por aqui — ficam contidos no
//   motor de sync e viram status `error` (ver sync::engine).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Variante para erros do banco local (sqlx/SQLite)
    #[error("Erro de armazenamento local")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro ao executar as migrações do armazenamento local")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    // Um registro que não desserializa é corrupção ou um shape desconhecido;
    // rejeitamos na borda do store em vez de propagar dados ad hoc.
    #[error("Registro corrompido ou com formato desconhecido")]
    CorruptRecord(#[from] serde_json::Error),

    #[error("Registro não encontrado: {collection}/{id}")]
    RecordNotFound { collection: &'static str, id: Uuid },

    #[error("Ya existe un producto \"{name}\" de la marca \"{brand}\" para este cliente")]
    DuplicateProduct { name: String, brand: String },

    #[error("Debe existir al menos un administrador maestro activo")]
    LastMasterAdmin,

    #[error("No se puede revertir la siembra: ya existe una cosecha confirmada sobre esta orden")]
    SowingLockedByHarvest,

    #[error("Movimiento de transferencia sin su par (referencia {0})")]
    TransferPartnerMissing(String),

    #[error("Cantidad inválida: {0}")]
    InvalidQuantity(String),

    // Variante genérica para qualquer outro erro inesperado
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Violações de invariante são falhas de validação, não de sistema: a UI
    /// mostra a mensagem e nada foi escrito. Tudo o resto é falha de sistema.
    pub fn is_domain_rejection(&self) -> bool {
        matches!(
            self,
            AppError::ValidationError(_)
                | AppError::DuplicateProduct { .. }
                | AppError::LastMasterAdmin
                | AppError::SowingLockedByHarvest
                | AppError::InvalidQuantity(_)
        )
    }
}
