// src/services/order_service.rs

use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::config::SessionContext,
    db::local_store::LocalStore,
    models::{
        farms::{Lot, LotStatus},
        orders::{
            ActivityAction, NewOrder, Order, OrderActivity, OrderStatus, OrderType,
        },
        products::{Product, ProductType},
        record::Syncable,
    },
    services::stock_service::StockService,
};

// Ordens de trabalho e suas cascatas. Toda a lógica de efeito colateral
// entre entidades (lote, estoque, trilha de atividade) vive aqui, síncrona
// dentro da mesma mutação — nunca num passo adiado — para que seja testável
// sem UI.
#[derive(Clone)]
pub struct OrderService {
    store: LocalStore,
    stock_service: StockService,
}

impl OrderService {
    pub fn new(store: LocalStore, stock_service: StockService) -> Self {
        Self {
            store,
            stock_service,
        }
    }

    // --- CRIAÇÃO ---

    /// Cria a ordem e, para pulverización/siembra, baixa o estoque dos itens
    /// na hora (não na conclusão), com a movimentação OUT pareada.
    ///
    /// Ordem fixa das escritas (recuperável após crash no meio): ordem →
    /// estoque → atividade.
    pub async fn create_order(
        &self,
        session: &SessionContext,
        input: NewOrder,
    ) -> Result<Order, AppError> {
        input.validate()?;

        // Checagens antes de qualquer escrita
        if matches!(input.order_type, OrderType::Spraying | OrderType::Sowing) {
            if input.treated_area <= Decimal::ZERO {
                return Err(AppError::InvalidQuantity(
                    "la superficie tratada debe ser positiva".to_string(),
                ));
            }
            for item in &input.items {
                if item.dosage <= Decimal::ZERO {
                    return Err(AppError::InvalidQuantity(
                        "la dosis debe ser positiva".to_string(),
                    ));
                }
            }
        }

        // 1. Grava a ordem
        let mut order = Order::new(&input, &session.user_name);
        self.store.put_dirty(&mut order).await?;

        // 2. Baixa de estoque por item (cosecha não consome insumos)
        if order.order_type != OrderType::Harvest {
            for item in &order.items {
                let product = self.store.get_active::<Product>(item.product_id).await?;
                self.stock_service
                    .deduct_for_order(
                        session,
                        order.client_id,
                        &product,
                        item.total_quantity,
                        order.id,
                    )
                    .await?;
            }
        }

        // 3. Trilha de atividade
        self.append_activity(session, order.id, ActivityAction::Create, "Orden creada")
            .await?;

        Ok(order)
    }

    // --- TRANSIÇÃO DE STATUS ---

    /// Muda o status da ordem e dispara as cascatas de lote/estoque.
    ///
    /// Invariantes checadas ANTES da primeira escrita; depois, ordem fixa:
    /// status da ordem → estoque → lote. Um crash no meio deixa a ordem
    /// concluída sem lote atualizado, que é reparável; o inverso não seria.
    pub async fn set_status(
        &self,
        session: &SessionContext,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<Order, AppError> {
        let mut order = self.store.get_active::<Order>(order_id).await?;
        let old_status = order.status;
        if old_status == new_status {
            return Ok(order);
        }

        let applying = new_status == OrderStatus::Done && old_status != OrderStatus::Done;
        let reverting = old_status == OrderStatus::Done && new_status != OrderStatus::Done;

        // A cosecha é um portão de mão única sobre a siembra da qual
        // depende: com uma cosecha DONE/CONFIRMED apontando para esta
        // ordem, a reversão é rejeitada sem escrever nada.
        if order.order_type == OrderType::Sowing && reverting {
            self.ensure_no_confirmed_harvest(order.id).await?;
        }

        // 1. Status da ordem
        order.status = new_status;
        self.store.put_dirty(&mut order).await?;

        // 2.+3. Cascatas (estoque antes do lote)
        match order.order_type {
            OrderType::Sowing if applying => self.apply_sowing(&order).await?,
            OrderType::Sowing if reverting => self.revert_sowing(&order).await?,
            OrderType::Harvest if applying => self.apply_harvest(session, &order).await?,
            OrderType::Harvest if reverting => self.revert_harvest(session, &order).await?,
            _ => {}
        }

        self.append_activity(
            session,
            order.id,
            ActivityAction::StatusChange,
            &format!("{old_status} → {new_status}"),
        )
        .await?;

        Ok(order)
    }

    // --- EXCLUSÃO ---

    /// Soft delete com devolução de estoque: cada item volta ao saldo com a
    /// movimentação IN pareada. O registro fica no store até o backend
    /// confirmar a exclusão.
    pub async fn delete_order(
        &self,
        session: &SessionContext,
        order_id: Uuid,
    ) -> Result<(), AppError> {
        let mut order = self.store.get_active::<Order>(order_id).await?;

        // 1. Soft delete da ordem
        order.soft_delete(&session.user_name);
        self.store.put(&order).await?;

        // 2. Devolução de estoque
        if order.order_type != OrderType::Harvest {
            for item in &order.items {
                let product = self.store.get_active::<Product>(item.product_id).await?;
                self.stock_service
                    .return_for_order(
                        session,
                        order.client_id,
                        &product,
                        item.total_quantity,
                        order.id,
                    )
                    .await?;
            }
        } else if order.status == OrderStatus::Done {
            if let Some(product) = self.harvest_product(&order).await? {
                if order.harvested_quantity > Decimal::ZERO {
                    self.stock_service
                        .reverse_harvest(
                            session,
                            order.client_id,
                            &product,
                            order.harvested_quantity,
                            order.id,
                        )
                        .await?;
                }
            }
        }

        // 3. Trilha de atividade
        self.append_activity(session, order.id, ActivityAction::Delete, "Orden eliminada")
            .await?;
        Ok(())
    }

    // --- TRILHA DE ATIVIDADE ---

    /// Histórico append-only da ordem, do mais antigo para o mais novo.
    pub async fn activities_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<OrderActivity>, AppError> {
        let mut activities: Vec<OrderActivity> = self
            .store
            .get_all::<OrderActivity>()
            .await?
            .into_iter()
            .filter(|a| a.order_id == order_id)
            .collect();
        activities.sort_by_key(|a| a.timestamp);
        Ok(activities)
    }

    async fn append_activity(
        &self,
        session: &SessionContext,
        order_id: Uuid,
        action: ActivityAction,
        description: &str,
    ) -> Result<(), AppError> {
        let mut activity =
            OrderActivity::new(order_id, action, description, &session.user_name);
        self.store.put_dirty(&mut activity).await?;
        Ok(())
    }

    // ---
    // Cascatas de lote
    // ---

    async fn apply_sowing(&self, order: &Order) -> Result<(), AppError> {
        let mut lot = self.store.get_active::<Lot>(order.lot_id).await?;
        lot.status = LotStatus::Sowed;
        if let Some(species) = self.seed_species(order).await? {
            lot.crop_species = species;
        }
        self.store.put_dirty(&mut lot).await?;
        Ok(())
    }

    async fn revert_sowing(&self, order: &Order) -> Result<(), AppError> {
        let mut lot = self.store.get_active::<Lot>(order.lot_id).await?;
        lot.status = LotStatus::Empty;
        lot.crop_species.clear();
        lot.harvest_yield = Decimal::ZERO;
        lot.observed_yield = Decimal::ZERO;
        self.store.put_dirty(&mut lot).await?;
        Ok(())
    }

    async fn apply_harvest(
        &self,
        session: &SessionContext,
        order: &Order,
    ) -> Result<(), AppError> {
        // 2. Estoque: credita o grão colhido no Acopio de Granos
        if order.harvested_quantity > Decimal::ZERO {
            if let Some(product) = self.harvest_product(order).await? {
                self.stock_service
                    .credit_harvest(
                        session,
                        order.client_id,
                        &product,
                        order.harvested_quantity,
                        order.id,
                    )
                    .await?;
            } else {
                tracing::warn!(order_id = %order.id, "cosecha sem item de produto, crédito de grão omitido");
            }
        }

        // 3. Lote
        let mut lot = self.store.get_active::<Lot>(order.lot_id).await?;
        lot.status = LotStatus::Harvested;
        lot.harvest_yield = order.harvested_quantity;
        lot.observed_yield = order.harvested_quantity;
        self.store.put_dirty(&mut lot).await?;
        Ok(())
    }

    async fn revert_harvest(
        &self,
        session: &SessionContext,
        order: &Order,
    ) -> Result<(), AppError> {
        if order.harvested_quantity > Decimal::ZERO {
            if let Some(product) = self.harvest_product(order).await? {
                self.stock_service
                    .reverse_harvest(
                        session,
                        order.client_id,
                        &product,
                        order.harvested_quantity,
                        order.id,
                    )
                    .await?;
            }
        }

        let mut lot = self.store.get_active::<Lot>(order.lot_id).await?;
        lot.status = LotStatus::Sowed;
        lot.harvest_yield = Decimal::ZERO;
        lot.observed_yield = Decimal::ZERO;
        self.store.put_dirty(&mut lot).await?;
        Ok(())
    }

    // ---
    // Auxiliares
    // ---

    /// A espécie vem do item de tipo SEMENTE da ordem de siembra.
    async fn seed_species(&self, order: &Order) -> Result<Option<String>, AppError> {
        for item in &order.items {
            if let Some(product) = self.store.get::<Product>(item.product_id).await? {
                if product.product_type == ProductType::Seed {
                    return Ok(Some(product.name));
                }
            }
        }
        Ok(None)
    }

    /// O produto colhido é o primeiro item da ordem de cosecha.
    async fn harvest_product(&self, order: &Order) -> Result<Option<Product>, AppError> {
        match order.items.first() {
            Some(item) => self.store.get::<Product>(item.product_id).await,
            None => Ok(None),
        }
    }

    async fn ensure_no_confirmed_harvest(&self, sowing_order_id: Uuid) -> Result<(), AppError> {
        let blocked = self
            .store
            .get_all::<Order>()
            .await?
            .into_iter()
            .any(|o| {
                o.order_type == OrderType::Harvest
                    && !o.deleted
                    && o.sowing_order_id == Some(sowing_order_id)
                    && matches!(o.status, OrderStatus::Done | OrderStatus::Confirmed)
            });
        if blocked {
            return Err(AppError::SowingLockedByHarvest);
        }
        Ok(())
    }
}
