// src/models/profiles.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::record::{Collection, impl_syncable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    MasterAdmin,
    Admin,
    Client,
    Contratista,
}

// --- Perfil de usuário ---
// O `id` é a identidade do provedor de autenticação (não é gerado aqui).
// Invariantes (services::profile_service): sempre resta ao menos um
// MASTER_ADMIN ativo; um perfil CLIENT tem no máximo um cliente atribuído.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserProfile {
    pub id: Uuid,
    pub user_name: String,
    pub role: Role,
    pub assigned_clients: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub synced: bool,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl UserProfile {
    pub fn new(id: Uuid, user_name: &str, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_name: user_name.to_string(),
            role,
            assigned_clients: Vec::new(),
            created_at: now,
            synced: false,
            updated_at: now,
            deleted: false,
            deleted_at: None,
            deleted_by: None,
        }
    }
}

impl_syncable!(UserProfile, Collection::Profiles);
