// src/models/movements.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::record::{Collection, impl_syncable};

/// Prefixo do `referenceId` que marca um par de transferência entre
/// depósitos (OUT na origem + IN no destino, mesma referência).
pub const TRANSFER_PREFIX: &str = "TRF-";

/// Prefixo do `referenceId` de um ajuste manual de estoque.
pub const ADJUSTMENT_PREFIX: &str = "AJU-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    In,
    Out,
    Sale,
    Harvest,
}

// --- Movimentação de estoque (histórico) ---
// Todo delta de ClientStock.quantity tem exatamente uma movimentação
// registrada: é a trilha de auditoria do saldo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InventoryMovement {
    pub id: Uuid,
    pub client_id: Uuid,
    pub product_id: Uuid,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub unit: String,
    /// A ordem ou o evento de transferência/ajuste que causou o delta.
    pub reference_id: String,
    pub warehouse_id: Uuid,
    // Sub-campos de logística
    pub carrier: Option<String>,
    pub license_plate: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub synced: bool,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl InventoryMovement {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client_id: Uuid,
        product_id: Uuid,
        movement_type: MovementType,
        quantity: Decimal,
        unit: &str,
        reference_id: &str,
        warehouse_id: Uuid,
        created_by: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            client_id,
            product_id,
            movement_type,
            quantity,
            unit: unit.to_string(),
            reference_id: reference_id.to_string(),
            warehouse_id,
            carrier: None,
            license_plate: None,
            notes: None,
            created_at: now,
            created_by: created_by.to_string(),
            synced: false,
            updated_at: now,
            deleted: false,
            deleted_at: None,
            deleted_by: None,
        }
    }

    /// Gera a referência compartilhada por um par de transferência.
    pub fn transfer_reference() -> String {
        format!("{}{}", TRANSFER_PREFIX, Uuid::new_v4())
    }

    pub fn is_transfer(&self) -> bool {
        self.reference_id.starts_with(TRANSFER_PREFIX)
    }
}

impl_syncable!(InventoryMovement, Collection::Movements);
