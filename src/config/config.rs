// src/config/config.rs

use std::sync::Arc;
use std::{env, time::Duration};

use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::local_store::LocalStore,
    models::profiles::Role,
    services::{
        client_service::ClientService, observation_service::ObservationService,
        order_service::OrderService, product_service::ProductService,
        profile_service::ProfileService, stock_service::StockService,
    },
    sync::{engine::SyncEngine, remote::RemoteBackend},
};

/// Inicializa o logger. Idempotente (chamável de binários e de testes).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init();
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// URL SQLite do armazenamento local do dispositivo.
    pub database_url: String,
    /// Nome do dispositivo, só para logs.
    pub device_name: String,
    /// Teto de tempo de cada chamada de rede do motor de sync.
    pub sync_timeout: Duration,
}

impl AppConfig {
    // Função para carregar as configurações do ambiente
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let database_url = env::var("CAMPO_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://campocore.db?mode=rwc".to_string());
        let device_name =
            env::var("CAMPO_DEVICE").unwrap_or_else(|_| "dispositivo".to_string());
        let sync_timeout = env::var("CAMPO_SYNC_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        Self {
            database_url,
            device_name,
            sync_timeout,
        }
    }

    /// Armazenamento efêmero em memória (testes e demonstrações).
    pub fn in_memory(device_name: &str) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            device_name: device_name.to_string(),
            sync_timeout: Duration::from_secs(2),
        }
    }
}

/// A identidade da sessão, fornecida pelo provedor de autenticação da
/// aplicação que nos embute. Passada explicitamente a cada chamada de
/// serviço que carimba identidade — nada de estado global de sessão.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub user_name: String,
    pub role: Role,
}

impl SessionContext {
    pub fn new(user_id: Uuid, user_name: &str, role: Role) -> Self {
        Self {
            user_id,
            user_name: user_name.to_string(),
            role,
        }
    }
}

// O estado compartilhado que será acessível em toda a aplicação: o ponto
// único de composição de store, serviços e motor de sync.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: LocalStore,
    pub clients: ClientService,
    pub products: ProductService,
    pub stock: StockService,
    pub orders: OrderService,
    pub profiles: ProfileService,
    pub observations: ObservationService,
    pub sync: Arc<SyncEngine>,
}

impl AppState {
    pub async fn new(
        config: AppConfig,
        backend: Arc<dyn RemoteBackend>,
    ) -> Result<Self, AppError> {
        let pool = match SqlitePoolOptions::new()
            // Um único escritor lógico por dispositivo: as mutações locais
            // são serializadas pela própria conexão.
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => {
                tracing::info!(
                    device = %config.device_name,
                    "✅ Armazenamento local aberto em {}",
                    config.database_url
                );
                pool
            }
            Err(e) => {
                tracing::error!("🔥 Falha ao abrir o armazenamento local: {:?}", e);
                return Err(e.into());
            }
        };

        sqlx::migrate!().run(&pool).await?;

        let store = LocalStore::new(pool);
        let stock = StockService::new(store.clone());
        let clients = ClientService::new(store.clone(), stock.clone());
        let products = ProductService::new(store.clone());
        let orders = OrderService::new(store.clone(), stock.clone());
        let profiles = ProfileService::new(store.clone());
        let observations = ObservationService::new(store.clone());
        let sync = SyncEngine::new(store.clone(), backend, config.sync_timeout);

        Ok(Self {
            config,
            store,
            clients,
            products,
            stock,
            orders,
            profiles,
            observations,
            sync,
        })
    }
}
