// src/services/client_service.rs

use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::config::SessionContext,
    db::local_store::LocalStore,
    models::{
        clients::{Client, NewClient},
        record::Syncable,
    },
    services::stock_service::StockService,
};

#[derive(Clone)]
pub struct ClientService {
    store: LocalStore,
    stock_service: StockService,
}

impl ClientService {
    pub fn new(store: LocalStore, stock_service: StockService) -> Self {
        Self {
            store,
            stock_service,
        }
    }

    /// Cria o cliente e provisiona na hora os dois depósitos padrão.
    pub async fn create_client(
        &self,
        session: &SessionContext,
        input: NewClient,
    ) -> Result<Client, AppError> {
        input.validate()?;

        let mut client = Client::new(input, &session.user_name);
        self.store.put_dirty(&mut client).await?;

        self.stock_service
            .ensure_default_warehouses(client.id)
            .await?;

        Ok(client)
    }

    pub async fn update_client(
        &self,
        _session: &SessionContext,
        mut client: Client,
    ) -> Result<Client, AppError> {
        // Garante que estamos editando um cliente vivo, não ressuscitando um
        // soft-deleted por acidente.
        self.store.get_active::<Client>(client.id).await?;
        self.store.put_dirty(&mut client).await?;
        Ok(client)
    }

    pub async fn delete_client(
        &self,
        session: &SessionContext,
        client_id: Uuid,
    ) -> Result<(), AppError> {
        let mut client = self.store.get_active::<Client>(client_id).await?;
        client.soft_delete(&session.user_name);
        self.store.put(&client).await?;
        Ok(())
    }
}
