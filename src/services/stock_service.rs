// src/services/stock_service.rs

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::config::SessionContext,
    db::local_store::LocalStore,
    models::{
        clients::{DEFAULT_WAREHOUSES, GRAIN_WAREHOUSE, Warehouse},
        movements::{ADJUSTMENT_PREFIX, InventoryMovement, MovementType},
        products::{ClientStock, Product},
        record::Syncable,
    },
};

#[derive(Clone)]
pub struct StockService {
    store: LocalStore,
}

impl StockService {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    // ---
    // Depósitos
    // ---

    /// Garante os dois depósitos padrão do cliente ("Galpón", "Acopio de
    /// Granos"). Idempotente por pré-checagem — sem transações no store,
    /// duas chamadas quase simultâneas podem em tese provisionar em dobro;
    /// risco raro e de baixo dano, aceito e documentado em DESIGN.md.
    pub async fn ensure_default_warehouses(
        &self,
        client_id: Uuid,
    ) -> Result<Vec<Warehouse>, AppError> {
        let existing: Vec<Warehouse> = self
            .store
            .get_all::<Warehouse>()
            .await?
            .into_iter()
            .filter(|w| w.client_id == client_id && !w.deleted)
            .collect();
        if !existing.is_empty() {
            return Ok(existing);
        }

        let mut created = Vec::with_capacity(DEFAULT_WAREHOUSES.len());
        for name in DEFAULT_WAREHOUSES {
            let mut warehouse = Warehouse::new(client_id, name);
            self.store.put_dirty(&mut warehouse).await?;
            created.push(warehouse);
        }
        tracing::info!(%client_id, "depósitos padrão provisionados");
        Ok(created)
    }

    async fn warehouse_by_name(
        &self,
        client_id: Uuid,
        name: &str,
    ) -> Result<Warehouse, AppError> {
        let warehouses = self.ensure_default_warehouses(client_id).await?;
        warehouses
            .into_iter()
            .find(|w| w.name == name)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("depósito padrão ausente: {name}")))
    }

    // ---
    // Saldos
    // ---

    async fn find_stock(
        &self,
        client_id: Uuid,
        product_id: Uuid,
        warehouse_id: Option<Uuid>,
    ) -> Result<Option<ClientStock>, AppError> {
        Ok(self
            .store
            .get_all::<ClientStock>()
            .await?
            .into_iter()
            .find(|s| {
                s.client_id == client_id
                    && s.product_id == product_id
                    && !s.deleted
                    && warehouse_id.is_none_or(|w| s.warehouse_id == w)
            }))
    }

    /// Aplica um delta no saldo. Privado de propósito: saldo NUNCA muda sem
    /// uma movimentação registrada — todos os caminhos públicos fazem o par.
    /// Sobregiro é permitido: a linha nasce (ou fica) negativa e o déficit é
    /// sinalizado, não bloqueado.
    async fn bump_stock(
        &self,
        client_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
        delta: Decimal,
    ) -> Result<ClientStock, AppError> {
        let stock = match self
            .find_stock(client_id, product_id, Some(warehouse_id))
            .await?
        {
            Some(mut stock) => {
                stock.quantity += delta;
                self.store.put_dirty(&mut stock).await?;
                stock
            }
            None => {
                let mut stock = ClientStock::new(client_id, product_id, warehouse_id, delta);
                self.store.put_dirty(&mut stock).await?;
                stock
            }
        };

        if stock.quantity < Decimal::ZERO {
            tracing::warn!(
                %client_id,
                %product_id,
                saldo = %stock.quantity,
                "saldo de estoque negativo (sobregiro)"
            );
        }
        Ok(stock)
    }

    async fn record_movement(
        &self,
        mut movement: InventoryMovement,
    ) -> Result<InventoryMovement, AppError> {
        self.store.put_dirty(&mut movement).await?;
        Ok(movement)
    }

    // --- AJUSTE MANUAL ---

    /// Correção manual de saldo: o delta e a movimentação (IN/OUT pelo
    /// sinal) entram juntos.
    pub async fn adjust_stock(
        &self,
        session: &SessionContext,
        client_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
        delta: Decimal,
        unit: &str,
        notes: Option<&str>,
    ) -> Result<(ClientStock, InventoryMovement), AppError> {
        if delta == Decimal::ZERO {
            return Err(AppError::InvalidQuantity(
                "el ajuste debe ser distinto de cero".to_string(),
            ));
        }

        let reference = format!("{ADJUSTMENT_PREFIX}{}", Uuid::new_v4());
        let movement_type = if delta > Decimal::ZERO {
            MovementType::In
        } else {
            MovementType::Out
        };

        // 1. Saldo
        let stock = self
            .bump_stock(client_id, product_id, warehouse_id, delta)
            .await?;

        // 2. Movimentação
        let mut movement = InventoryMovement::new(
            client_id,
            product_id,
            movement_type,
            delta.abs(),
            unit,
            &reference,
            warehouse_id,
            &session.user_name,
        );
        movement.notes = notes.map(str::to_string);
        let movement = self.record_movement(movement).await?;

        Ok((stock, movement))
    }

    // --- TRANSFERÊNCIA ENTRE DEPÓSITOS ---

    /// Sempre produz exatamente duas movimentações (OUT na origem, IN no
    /// destino) com a mesma referência `TRF-…`, criadas na mesma operação.
    pub async fn transfer(
        &self,
        session: &SessionContext,
        input: TransferInput,
    ) -> Result<(InventoryMovement, InventoryMovement), AppError> {
        if input.quantity <= Decimal::ZERO {
            return Err(AppError::InvalidQuantity(
                "la cantidad a transferir debe ser positiva".to_string(),
            ));
        }
        if input.from_warehouse_id == input.to_warehouse_id {
            return Err(AppError::InvalidQuantity(
                "el depósito de origen y destino deben ser distintos".to_string(),
            ));
        }

        let reference = InventoryMovement::transfer_reference();

        // 1. Origem: baixa + OUT
        self.bump_stock(
            input.client_id,
            input.product_id,
            input.from_warehouse_id,
            -input.quantity,
        )
        .await?;
        let mut out = InventoryMovement::new(
            input.client_id,
            input.product_id,
            MovementType::Out,
            input.quantity,
            &input.unit,
            &reference,
            input.from_warehouse_id,
            &session.user_name,
        );
        out.carrier = input.carrier.clone();
        out.license_plate = input.license_plate.clone();
        out.notes = input.notes.clone();
        let out = self.record_movement(out).await?;

        // 2. Destino: alta + IN
        self.bump_stock(
            input.client_id,
            input.product_id,
            input.to_warehouse_id,
            input.quantity,
        )
        .await?;
        let mut incoming = InventoryMovement::new(
            input.client_id,
            input.product_id,
            MovementType::In,
            input.quantity,
            &input.unit,
            &reference,
            input.to_warehouse_id,
            &session.user_name,
        );
        incoming.carrier = input.carrier;
        incoming.license_plate = input.license_plate;
        incoming.notes = input.notes;
        let incoming = self.record_movement(incoming).await?;

        Ok((out, incoming))
    }

    /// Exclui uma movimentação desfazendo seu efeito no saldo. Se ela for
    /// metade de uma transferência, o par cai junto — nunca uma sem a outra.
    pub async fn delete_movement(
        &self,
        session: &SessionContext,
        movement_id: Uuid,
    ) -> Result<(), AppError> {
        let movement = self.store.get_active::<InventoryMovement>(movement_id).await?;

        let mut batch = vec![movement.clone()];
        if movement.is_transfer() {
            let partner = self
                .store
                .get_all::<InventoryMovement>()
                .await?
                .into_iter()
                .find(|m| {
                    m.reference_id == movement.reference_id && m.id != movement.id && !m.deleted
                })
                .ok_or_else(|| {
                    AppError::TransferPartnerMissing(movement.reference_id.clone())
                })?;
            batch.push(partner);
        }

        for mut m in batch {
            let reverse = match m.movement_type {
                MovementType::In | MovementType::Harvest => -m.quantity,
                MovementType::Out | MovementType::Sale => m.quantity,
            };
            self.bump_stock(m.client_id, m.product_id, m.warehouse_id, reverse)
                .await?;
            m.soft_delete(&session.user_name);
            self.store.put(&m).await?;
        }
        Ok(())
    }

    // ---
    // Cascatas de ordens (chamadas pelo order_service)
    // ---

    /// Baixa de criação de ordem: consome do depósito onde o produto tem
    /// saldo (ou do Galpón, abrindo sobregiro, se não houver linha).
    pub async fn deduct_for_order(
        &self,
        session: &SessionContext,
        client_id: Uuid,
        product: &Product,
        quantity: Decimal,
        order_id: Uuid,
    ) -> Result<(ClientStock, InventoryMovement), AppError> {
        let warehouse_id = match self.find_stock(client_id, product.id, None).await? {
            Some(stock) => stock.warehouse_id,
            None => self.warehouse_by_name(client_id, DEFAULT_WAREHOUSES[0]).await?.id,
        };

        let stock = self
            .bump_stock(client_id, product.id, warehouse_id, -quantity)
            .await?;
        let movement = self
            .record_movement(InventoryMovement::new(
                client_id,
                product.id,
                MovementType::Out,
                quantity,
                &product.unit,
                &order_id.to_string(),
                warehouse_id,
                &session.user_name,
            ))
            .await?;
        Ok((stock, movement))
    }

    /// Devolução ao excluir uma ordem: o inverso da baixa, com IN pareado.
    pub async fn return_for_order(
        &self,
        session: &SessionContext,
        client_id: Uuid,
        product: &Product,
        quantity: Decimal,
        order_id: Uuid,
    ) -> Result<(), AppError> {
        let warehouse_id = match self.find_stock(client_id, product.id, None).await? {
            Some(stock) => stock.warehouse_id,
            None => self.warehouse_by_name(client_id, DEFAULT_WAREHOUSES[0]).await?.id,
        };

        self.bump_stock(client_id, product.id, warehouse_id, quantity)
            .await?;
        let mut movement = InventoryMovement::new(
            client_id,
            product.id,
            MovementType::In,
            quantity,
            &product.unit,
            &order_id.to_string(),
            warehouse_id,
            &session.user_name,
        );
        movement.notes = Some("Devolución por orden eliminada".to_string());
        self.record_movement(movement).await?;
        Ok(())
    }

    /// Crédito do grão colhido no "Acopio de Granos" ao completar uma
    /// ordem de cosecha.
    pub async fn credit_harvest(
        &self,
        session: &SessionContext,
        client_id: Uuid,
        product: &Product,
        quantity: Decimal,
        order_id: Uuid,
    ) -> Result<(), AppError> {
        let grain = self.warehouse_by_name(client_id, GRAIN_WAREHOUSE).await?;
        self.bump_stock(client_id, product.id, grain.id, quantity)
            .await?;
        self.record_movement(InventoryMovement::new(
            client_id,
            product.id,
            MovementType::Harvest,
            quantity,
            &product.unit,
            &order_id.to_string(),
            grain.id,
            &session.user_name,
        ))
        .await?;
        Ok(())
    }

    /// Desfaz o crédito de cosecha ao reverter a ordem.
    pub async fn reverse_harvest(
        &self,
        session: &SessionContext,
        client_id: Uuid,
        product: &Product,
        quantity: Decimal,
        order_id: Uuid,
    ) -> Result<(), AppError> {
        let grain = self.warehouse_by_name(client_id, GRAIN_WAREHOUSE).await?;
        self.bump_stock(client_id, product.id, grain.id, -quantity)
            .await?;
        let mut movement = InventoryMovement::new(
            client_id,
            product.id,
            MovementType::Out,
            quantity,
            &product.unit,
            &order_id.to_string(),
            grain.id,
            &session.user_name,
        );
        movement.notes = Some("Reversión de cosecha".to_string());
        self.record_movement(movement).await?;
        Ok(())
    }
}

/// Dados de uma transferência entre depósitos.
#[derive(Debug, Clone)]
pub struct TransferInput {
    pub client_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit: String,
    pub from_warehouse_id: Uuid,
    pub to_warehouse_id: Uuid,
    pub carrier: Option<String>,
    pub license_plate: Option<String>,
    pub notes: Option<String>,
}
