// src/services/observation_service.rs

use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::config::SessionContext,
    db::local_store::LocalStore,
    models::{
        observations::{NewObservation, Observation},
        record::Syncable,
    },
};

// Notas de campo penduradas em lotes.
#[derive(Clone)]
pub struct ObservationService {
    store: LocalStore,
}

impl ObservationService {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub async fn create_observation(
        &self,
        session: &SessionContext,
        input: NewObservation,
    ) -> Result<Observation, AppError> {
        input.validate()?;
        let mut observation = Observation::new(input, &session.user_name);
        self.store.put_dirty(&mut observation).await?;
        Ok(observation)
    }

    /// Observações vivas do lote, da mais recente para a mais antiga.
    pub async fn observations_for_lot(
        &self,
        lot_id: Uuid,
    ) -> Result<Vec<Observation>, AppError> {
        let mut observations: Vec<Observation> = self
            .store
            .get_all::<Observation>()
            .await?
            .into_iter()
            .filter(|o| o.lot_id == lot_id && !o.deleted)
            .collect();
        observations.sort_by_key(|o| std::cmp::Reverse(o.date));
        Ok(observations)
    }

    pub async fn delete_observation(
        &self,
        session: &SessionContext,
        observation_id: Uuid,
    ) -> Result<(), AppError> {
        let mut observation = self.store.get_active::<Observation>(observation_id).await?;
        observation.soft_delete(&session.user_name);
        self.store.put(&observation).await?;
        Ok(())
    }
}
