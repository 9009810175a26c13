// src/db/local_store.rs

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::{common::error::AppError, models::record::Syncable};

// O armazenamento local do dispositivo: uma tabela genérica `records`, uma
// coleção lógica por tipo de entidade, corpo do registro em JSON.
//
// Contrato (a UI fala direto com este objeto):
// - `get`/`get_all` devolvem TAMBÉM os registros soft-deleted — filtrar é
//   responsabilidade de quem consome, para que histórico e undo continuem
//   possíveis;
// - `put` faz upsert por id e sobrescreve o registro INTEIRO (quem chama
//   faz o merge antes);
// - `delete` é remoção física, reservada para expurgo pós-sync e remoção
//   imediata de duplicatas — exclusão de domínio é `put` com deleted=true.
//
// Falhas de quota/corrupção sobem como erro explícito para quem chamou;
// nunca descartamos uma escrita em silêncio.
#[derive(Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn get<T: Syncable>(&self, id: Uuid) -> Result<Option<T>, AppError> {
        let row = sqlx::query("SELECT data FROM records WHERE collection = ? AND id = ?")
            .bind(T::COLLECTION.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let data: String = row.try_get("data")?;
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => Ok(None),
        }
    }

    pub async fn get_all<T: Syncable>(&self) -> Result<Vec<T>, AppError> {
        let rows =
            sqlx::query("SELECT data FROM records WHERE collection = ? ORDER BY updated_at DESC")
                .bind(T::COLLECTION.as_str())
                .fetch_all(&self.pool)
                .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let data: String = row.try_get("data")?;
            records.push(serde_json::from_str(&data)?);
        }
        Ok(records)
    }

    /// Upsert do registro exatamente como está (sem carimbar nada).
    ///
    /// É o caminho usado pelo merge do pull, que precisa gravar timestamps
    /// remotos sem alterá-los. Mutações de domínio usam `put_dirty`.
    pub async fn put<T: Syncable>(&self, record: &T) -> Result<(), AppError> {
        let data = serde_json::to_string(record)?;
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
        .bind(T::COLLECTION.as_str())
        .bind(record.id())
        .bind(data)
        .bind(record.synced())
        .bind(record.updated_at())
        .bind(record.deleted())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Carimba o registro como sujo (synced=false, updatedAt=agora) e grava.
    ///
    /// TODO caminho de mutação de domínio passa por aqui — é o que mantém o
    /// contrato do rastreador de sujeira em um único lugar.
    pub async fn put_dirty<T: Syncable>(&self, record: &mut T) -> Result<(), AppError> {
        record.mark_dirty();
        self.put(record).await
    }

    /// Remoção física imediata.
    pub async fn delete<T: Syncable>(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM records WHERE collection = ? AND id = ?")
            .bind(T::COLLECTION.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// `get` que falha com RecordNotFound quando o registro não existe ou já
    /// foi soft-deleted. Conveniência para os serviços.
    pub async fn get_active<T: Syncable>(&self, id: Uuid) -> Result<T, AppError> {
        match self.get::<T>(id).await? {
            Some(record) if !record.deleted() => Ok(record),
            _ => Err(AppError::RecordNotFound {
                collection: T::COLLECTION.as_str(),
                id,
            }),
        }
    }
}
