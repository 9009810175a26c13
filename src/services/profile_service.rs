// src/services/profile_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::config::SessionContext,
    db::local_store::LocalStore,
    models::{
        profiles::{Role, UserProfile},
        record::Syncable,
    },
};

#[derive(Clone)]
pub struct ProfileService {
    store: LocalStore,
}

impl ProfileService {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Muda o papel de um perfil.
    ///
    /// Invariantes, checadas antes de escrever:
    /// - nunca pode restar zero MASTER_ADMIN ativos no sistema;
    /// - um perfil que vira CLIENT fica com no máximo um cliente atribuído
    ///   (atribuições múltiplas existentes são cortadas para a primeira).
    pub async fn change_role(
        &self,
        _session: &SessionContext,
        profile_id: Uuid,
        new_role: Role,
    ) -> Result<UserProfile, AppError> {
        let mut profile = self.store.get_active::<UserProfile>(profile_id).await?;

        if profile.role == Role::MasterAdmin && new_role != Role::MasterAdmin {
            self.ensure_another_master_admin(profile_id).await?;
        }

        profile.role = new_role;
        if new_role == Role::Client && profile.assigned_clients.len() > 1 {
            profile.assigned_clients.truncate(1);
        }

        self.store.put_dirty(&mut profile).await?;
        Ok(profile)
    }

    /// Atribui um cliente ao perfil. Para CLIENT, a atribuição substitui:
    /// a lista nunca passa de um elemento.
    pub async fn assign_client(
        &self,
        _session: &SessionContext,
        profile_id: Uuid,
        client_id: Uuid,
    ) -> Result<UserProfile, AppError> {
        let mut profile = self.store.get_active::<UserProfile>(profile_id).await?;

        if profile.role == Role::Client {
            profile.assigned_clients = vec![client_id];
        } else if !profile.assigned_clients.contains(&client_id) {
            profile.assigned_clients.push(client_id);
        }

        self.store.put_dirty(&mut profile).await?;
        Ok(profile)
    }

    /// Soft delete guardado pela mesma garantia de MASTER_ADMIN.
    pub async fn delete_profile(
        &self,
        session: &SessionContext,
        profile_id: Uuid,
    ) -> Result<(), AppError> {
        let mut profile = self.store.get_active::<UserProfile>(profile_id).await?;

        if profile.role == Role::MasterAdmin {
            self.ensure_another_master_admin(profile_id).await?;
        }

        profile.soft_delete(&session.user_name);
        self.store.put(&profile).await?;
        Ok(())
    }

    /// Conta os MASTER_ADMIN ativos excluindo o perfil em questão; zero
    /// significa que a mudança deixaria o sistema sem administrador maestro.
    async fn ensure_another_master_admin(&self, excluding: Uuid) -> Result<(), AppError> {
        let remaining = self
            .store
            .get_all::<UserProfile>()
            .await?
            .into_iter()
            .filter(|p| p.role == Role::MasterAdmin && !p.deleted && p.id != excluding)
            .count();
        if remaining == 0 {
            return Err(AppError::LastMasterAdmin);
        }
        Ok(())
    }
}
