// tests/store_tests.rs
//
// Contrato do armazenamento local: round-trip sujo, soft delete visível em
// getAll, remoção física e rejeição de shapes desconhecidos na borda.

mod common;

use chrono::Utc;
use uuid::Uuid;

use campocore::db::rows::RecordRow;
use campocore::models::farms::Farm;
use campocore::{AppError, Syncable};

#[tokio::test]
async fn put_dirty_reestampa_synced_e_updated_at() {
    let (state, _backend) = common::state("store-p1").await;

    let mut farm = Farm::new(Uuid::new_v4(), "La Esperanza", "Paula");
    // Simula um registro que já tinha sincronizado antes da edição
    farm.synced = true;
    let before = farm.updated_at;

    state.store.put_dirty(&mut farm).await.unwrap();

    let got: Farm = state.store.get(farm.id).await.unwrap().unwrap();
    assert!(!got.synced);
    assert!(got.updated_at >= before);
}

#[tokio::test]
async fn get_all_inclui_soft_deleted() {
    let (state, _backend) = common::state("store-softdelete").await;

    let mut farm = Farm::new(Uuid::new_v4(), "San Martín", "Paula");
    state.store.put_dirty(&mut farm).await.unwrap();

    farm.soft_delete("Paula");
    state.store.put(&farm).await.unwrap();

    // Filtrar é responsabilidade de quem consome: histórico/undo dependem
    // de enxergar o registro marcado.
    let all = state.store.get_all::<Farm>().await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].deleted);
    assert_eq!(all[0].deleted_by.as_deref(), Some("Paula"));

    // get_active, por outro lado, trata soft-deleted como inexistente
    let err = state.store.get_active::<Farm>(farm.id).await.unwrap_err();
    assert!(matches!(err, AppError::RecordNotFound { .. }));
}

#[tokio::test]
async fn delete_remove_fisicamente() {
    let (state, _backend) = common::state("store-delete").await;

    let mut farm = Farm::new(Uuid::new_v4(), "El Ombú", "Paula");
    state.store.put_dirty(&mut farm).await.unwrap();

    state.store.delete::<Farm>(farm.id).await.unwrap();
    assert!(state.store.get::<Farm>(farm.id).await.unwrap().is_none());
    assert!(state.store.get_all::<Farm>().await.unwrap().is_empty());
}

#[tokio::test]
async fn campo_desconhecido_e_rejeitado_na_borda() {
    let (state, _backend) = common::state("store-unknown").await;

    let farm = Farm::new(Uuid::new_v4(), "La Aurora", "Paula");
    let mut data = serde_json::to_value(&farm).unwrap();
    data.as_object_mut()
        .unwrap()
        .insert("campoInventado".to_string(), serde_json::json!(42));

    let row = RecordRow {
        collection: "farms".to_string(),
        id: farm.id,
        data,
        synced: false,
        updated_at: Utc::now(),
        deleted: false,
    };
    state.store.put_row(&row).await.unwrap();

    let err = state.store.get::<Farm>(farm.id).await.unwrap_err();
    assert!(matches!(err, AppError::CorruptRecord(_)));
}

#[tokio::test]
async fn put_sobrescreve_o_registro_inteiro() {
    let (state, _backend) = common::state("store-overwrite").await;

    let mut farm = Farm::new(Uuid::new_v4(), "Nombre Viejo", "Paula");
    state.store.put_dirty(&mut farm).await.unwrap();

    farm.name = "Nombre Nuevo".to_string();
    farm.boundary = Some(serde_json::json!({"type": "Polygon"}));
    state.store.put_dirty(&mut farm).await.unwrap();

    let got: Farm = state.store.get(farm.id).await.unwrap().unwrap();
    assert_eq!(got.name, "Nombre Nuevo");
    assert!(got.boundary.is_some());
    assert_eq!(state.store.get_all::<Farm>().await.unwrap().len(), 1);
}
