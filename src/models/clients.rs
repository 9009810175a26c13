// src/models/clients.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::record::{Collection, impl_syncable};

/// Depósitos padrão criados automaticamente para todo cliente novo.
pub const DEFAULT_WAREHOUSES: [&str; 2] = ["Galpón", "Acopio de Granos"];

/// Depósito que recebe o grão colhido ao completar uma ordem de cosecha.
pub const GRAIN_WAREHOUSE: &str = "Acopio de Granos";

// --- Cliente ---
// Dono de campos, produtos, estoque, ordens e depósitos.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub tax_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub synced: bool,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl Client {
    pub fn new(input: NewClient, created_by: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            phone: input.phone,
            email: input.email,
            tax_id: input.tax_id,
            notes: input.notes,
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

impl_syncable!(Client, Collection::Clients);

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    #[validate(length(min = 1, message = "El nombre es obligatorio"))]
    pub name: String,
    pub phone: Option<String>,
    #[validate(email(message = "Email inválido"))]
    pub email: Option<String>,
    pub tax_id: Option<String>,
    pub notes: Option<String>,
}

// --- Depósito ---
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Warehouse {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub synced: bool,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl Warehouse {
    pub fn new(client_id: Uuid, name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            client_id,
            name: name.to_string(),
            created_at: now,
            synced: false,
            updated_at: now,
            deleted: false,
            deleted_at: None,
            deleted_by: None,
        }
    }
}

impl_syncable!(Warehouse, Collection::Warehouses);
