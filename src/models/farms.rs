// src/models/farms.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::record::{Collection, impl_syncable};

// --- Campo (finca) ---
// O polígono geográfico (`boundary`) é opaco para o núcleo: a UI de mapas o
// desenha, nós só o transportamos.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Farm {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub boundary: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub synced: bool,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl Farm {
    pub fn new(client_id: Uuid, name: &str, created_by: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            client_id,
            name: name.to_string(),
            boundary: None,
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

impl_syncable!(Farm, Collection::Farms);

// --- Lote ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LotStatus {
    Empty,
    Sowed,
    Harvested,
}

/// `status`, `cropSpecies` e os rendimentos são campos derivados: as
/// transições autoritativas vêm da conclusão de ordens de siembra/cosecha
/// (ver services::order_service), nunca de edição direta.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Lot {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub name: String,
    pub hectares: Decimal,
    pub boundary: Option<serde_json::Value>,
    pub status: LotStatus,
    pub crop_species: String,
    #[serde(rename = "yield")]
    pub harvest_yield: Decimal,
    pub observed_yield: Decimal,
    pub created_at: DateTime<Utc>,
    pub synced: bool,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl Lot {
    pub fn new(farm_id: Uuid, name: &str, hectares: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            farm_id,
            name: name.to_string(),
            hectares,
            boundary: None,
            status: LotStatus::Empty,
            crop_species: String::new(),
            harvest_yield: Decimal::ZERO,
            observed_yield: Decimal::ZERO,
            created_at: now,
            synced: false,
            updated_at: now,
            deleted: false,
            deleted_at: None,
            deleted_by: None,
        }
    }
}

impl_syncable!(Lot, Collection::Lots);
