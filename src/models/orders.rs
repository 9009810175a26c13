// src/models/orders.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::record::{Collection, impl_syncable};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Spraying,
    Sowing,
    Harvest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Draft,
    Pending,
    Confirmed,
    Done,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OrderStatus::Draft => "DRAFT",
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Done => "DONE",
        })
    }
}

// --- Item de ordem ---
// Embutido na ordem (não é uma coleção própria). `totalQuantity` é derivado:
// dosis × superficie tratada, calculado na criação.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub dosage: Decimal,
    pub total_quantity: Decimal,
}

impl OrderItem {
    pub fn new(product_id: Uuid, dosage: Decimal, treated_area: Decimal) -> Self {
        Self {
            product_id,
            dosage,
            total_quantity: dosage * treated_area,
        }
    }
}

// --- Ordem de trabalho ---
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Order {
    pub id: Uuid,
    pub client_id: Uuid,
    pub farm_id: Uuid,
    pub lot_id: Uuid,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub status: OrderStatus,
    /// Superfície tratada em hectares.
    pub treated_area: Decimal,
    pub items: Vec<OrderItem>,
    /// Ordens de cosecha: a ordem de siembra que está sendo colhida.
    pub sowing_order_id: Option<Uuid>,
    /// Ordens de cosecha: quantidade colhida, creditada no depósito de grãos
    /// ao completar.
    pub harvested_quantity: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub synced: bool,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl Order {
    pub fn new(input: &NewOrder, created_by: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            client_id: input.client_id,
            farm_id: input.farm_id,
            lot_id: input.lot_id,
            order_type: input.order_type,
            status: OrderStatus::Pending,
            treated_area: input.treated_area,
            items: input
                .items
                .iter()
                .map(|i| OrderItem::new(i.product_id, i.dosage, input.treated_area))
                .collect(),
            sowing_order_id: input.sowing_order_id,
            harvested_quantity: input.harvested_quantity.unwrap_or(Decimal::ZERO),
            notes: input.notes.clone(),
            created_at: now,
            created_by: created_by.to_string(),
            synced: false,
            updated_at: now,
            deleted: false,
            deleted_at: None,
            deleted_by: None,
        }
    }
}

impl_syncable!(Order, Collection::Orders);

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub client_id: Uuid,
    pub farm_id: Uuid,
    pub lot_id: Uuid,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub treated_area: Decimal,
    pub items: Vec<NewOrderItem>,
    pub sowing_order_id: Option<Uuid>,
    pub harvested_quantity: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub dosage: Decimal,
}

// --- Atividade de ordem (trilha de auditoria) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    Create,
    StatusChange,
    Delete,
}

/// Append-only: uma vez escrita, nunca é atualizada nem excluída — nem
/// mesmo expurgada após sincronizar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrderActivity {
    pub id: Uuid,
    pub order_id: Uuid,
    pub action: ActivityAction,
    pub description: String,
    pub user_name: String,
    pub timestamp: DateTime<Utc>,
    pub synced: bool,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl OrderActivity {
    pub fn new(order_id: Uuid, action: ActivityAction, description: &str, user_name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_id,
            action,
            description: description.to_string(),
            user_name: user_name.to_string(),
            timestamp: now,
            synced: false,
            updated_at: now,
            deleted: false,
            deleted_at: None,
            deleted_by: None,
        }
    }
}

impl_syncable!(OrderActivity, Collection::OrderActivities);
