// src/db/rows.rs

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::Row;
use uuid::Uuid;

use crate::{common::error::AppError, db::local_store::LocalStore};

/// Uma linha crua do armazenamento, sem tipar o corpo.
///
/// É a visão que o motor de sincronização usa: ele trabalha coleção por
/// coleção sobre JSON, sem conhecer os tipos de domínio.
#[derive(Debug, Clone)]
pub struct RecordRow {
    pub collection: String,
    pub id: Uuid,
    pub data: Value,
    pub synced: bool,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
}

fn row_from_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<RecordRow, AppError> {
    let data: String = row.try_get("data")?;
    Ok(RecordRow {
        collection: row.try_get("collection")?,
        id: row.try_get("id")?,
        data: serde_json::from_str(&data)?,
        synced: row.try_get("synced")?,
        updated_at: row.try_get("updated_at")?,
        deleted: row.try_get("deleted")?,
    })
}

// Superfície crua usada pelo motor de sync: varredura de sujos, marcação de
// sincronizado com guarda de carimbo, expurgo e cursores de pull.
impl LocalStore {
    /// Todos os registros com synced=false, os mais antigos primeiro.
    pub async fn dirty_rows(&self) -> Result<Vec<RecordRow>, AppError> {
        let rows = sqlx::query(
            "SELECT collection, id, data, synced, updated_at, deleted
             FROM records WHERE synced = 0 ORDER BY updated_at ASC",
        )
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(row_from_sqlite).collect()
    }

    pub async fn row(&self, collection: &str, id: Uuid) -> Result<Option<RecordRow>, AppError> {
        let row = sqlx::query(
            "SELECT collection, id, data, synced, updated_at, deleted
             FROM records WHERE collection = ? AND id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.as_ref().map(row_from_sqlite).transpose()
    }

    /// Upsert de uma linha crua (merge do pull grava por aqui).
    pub async fn put_row(&self, row: &RecordRow) -> Result<(), AppError> {
        let data = serde_json::to_string(&row.data)?;
        sqlx::query(
            r#"
            INSERT INTO records (collection, id, data, synced, updated_at, deleted)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (collection, id) DO UPDATE SET
                data = excluded.data,
                synced = excluded.synced,
                updated_at = excluded.updated_at,
                deleted = excluded.deleted
            "#,
        )
        .bind(&row.collection)
        .bind(row.id)
        .bind(data)
        .bind(row.synced)
        .bind(row.updated_at)
        .bind(row.deleted)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Marca um registro como sincronizado, com guarda de carimbo: se o
    /// `updatedAt` local mudou desde que o push leu a linha (uma edição
    /// entrou durante o upload), o registro CONTINUA sujo e o próximo push
    /// leva a versão nova. Devolve true se marcou.
    pub async fn mark_synced(
        &self,
        collection: &str,
        id: Uuid,
        stamp: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let Some(mut row) = self.row(collection, id).await? else {
            return Ok(false);
        };
        if row.updated_at != stamp {
            tracing::debug!(
                collection,
                %id,
                "registro mudou durante o push, permanece sujo"
            );
            return Ok(false);
        }

        row.synced = true;
        if let Some(obj) = row.data.as_object_mut() {
            obj.insert("synced".to_string(), Value::Bool(true));
        }
        self.put_row(&row).await?;
        Ok(true)
    }

    /// Expurgo físico pós-confirmação remota.
    pub async fn purge(&self, collection: &str, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM records WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Cursor do último pull bem-sucedido da coleção (None = nunca puxou,
    /// o próximo pull é uma varredura completa).
    pub async fn cursor(&self, collection: &str) -> Result<Option<DateTime<Utc>>, AppError> {
        let row =
            sqlx::query("SELECT last_pulled_at FROM sync_cursors WHERE collection = ?")
                .bind(collection)
                .fetch_optional(self.pool())
                .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("last_pulled_at")?)),
            None => Ok(None),
        }
    }

    pub async fn set_cursor(
        &self,
        collection: &str,
        at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sync_cursors (collection, last_pulled_at)
            VALUES (?, ?)
            ON CONFLICT (collection) DO UPDATE SET last_pulled_at = excluded.last_pulled_at
            "#,
        )
        .bind(collection)
        .bind(at)
        .execute(self.pool())
        .await?;
        Ok(())
    }
}
