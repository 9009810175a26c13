// src/models/products.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::record::{Collection, impl_syncable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    Herbicide,
    Fertilizer,
    Seed,
    Fungicide,
    Insecticide,
    Other,
}

// --- Produto (catálogo) ---
// `clientId = None` é um produto global; `Some` é restrito ao cliente.
// Invariante: (name, brand) é único dentro do escopo de um cliente —
// o pré-check vive em services::product_service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Product {
    pub id: Uuid,
    pub client_id: Option<Uuid>,
    pub name: String,
    pub brand: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub unit: String,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub synced: bool,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl Product {
    pub fn new(input: NewProduct, created_by: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            client_id: input.client_id,
            name: input.name,
            brand: input.brand,
            product_type: input.product_type,
            unit: input.unit,
            price: input.price,
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

impl_syncable!(Product, Collection::Products);

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, message = "El nombre es obligatorio"))]
    pub name: String,
    pub brand: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    #[validate(length(min = 1, message = "La unidad es obligatoria"))]
    pub unit: String,
    pub price: Decimal,
}

// --- Saldo de estoque ---
// `quantity` é um saldo corrente COM SINAL: sobregiro é permitido (saldo
// negativo sinaliza o déficit, não bloqueia a ordem). O saldo só muda
// através de um InventoryMovement registrado — nunca por escrita direta.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClientStock {
    pub id: Uuid,
    pub client_id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub quantity: Decimal,
    pub created_at: DateTime<Utc>,
    pub synced: bool,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl ClientStock {
    pub fn new(client_id: Uuid, product_id: Uuid, warehouse_id: Uuid, quantity: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            client_id,
            product_id,
            warehouse_id,
            quantity,
            created_at: now,
            synced: false,
            updated_at: now,
            deleted: false,
            deleted_at: None,
            deleted_by: None,
        }
    }
}

impl_syncable!(ClientStock, Collection::Stock);
