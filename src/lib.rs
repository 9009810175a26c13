//! Núcleo local-first de gestão agrícola: armazenamento durável no
//! dispositivo, rastreamento de mudanças pendentes e sincronização
//! bidirecional com o backend remoto, mantendo as invariantes de domínio
//! (saldos de estoque, transições de lote, administrador maestro único).

// Declaração dos nossos módulos
pub mod common;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod sync;

// Reexports principais para a camada que nos consome (UI)
pub use common::error::AppError;
pub use config::config::{AppConfig, AppState, SessionContext, init_tracing};
pub use db::local_store::LocalStore;
pub use models::record::{Collection, Syncable};
pub use sync::engine::SyncEngine;
pub use sync::remote::{RemoteBackend, RemoteChange, RemoteError, RemoteRecord};
pub use sync::status::{StatusSubscription, SyncReport, SyncStatus};
