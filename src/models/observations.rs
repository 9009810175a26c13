// src/models/observations.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::record::{Collection, impl_syncable};

// --- Observação de lote ---
// Notas de campo livres, penduradas em um lote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Observation {
    pub id: Uuid,
    pub lot_id: Uuid,
    pub text: String,
    pub date: DateTime<Utc>,
    pub created_by: String,
    pub synced: bool,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl Observation {
    pub fn new(input: NewObservation, created_by: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            lot_id: input.lot_id,
            text: input.text,
            date: input.date.unwrap_or(now),
            created_by: created_by.to_string(),
            synced: false,
            updated_at: now,
            deleted: false,
            deleted_at: None,
            deleted_by: None,
        }
    }
}

impl_syncable!(Observation, Collection::Observations);

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewObservation {
    pub lot_id: Uuid,
    #[validate(length(min = 1, message = "La observación no puede estar vacía"))]
    pub text: String,
    pub date: Option<DateTime<Utc>>,
}
