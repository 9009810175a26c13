// src/services/product_service.rs

use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::config::SessionContext,
    db::local_store::LocalStore,
    models::{
        products::{NewProduct, Product},
        record::Syncable,
    },
};

#[derive(Clone)]
pub struct ProductService {
    store: LocalStore,
}

impl ProductService {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Cria um produto. Invariante de unicidade: dentro do escopo de um
    /// cliente (ou do catálogo global), o par (name, brand) não pode se
    /// repetir — a submissão duplicada é rejeitada, nunca duplicada.
    pub async fn create_product(
        &self,
        session: &SessionContext,
        input: NewProduct,
    ) -> Result<Product, AppError> {
        input.validate()?;
        self.ensure_unique(input.client_id, &input.name, &input.brand, None)
            .await?;

        let mut product = Product::new(input, &session.user_name);
        self.store.put_dirty(&mut product).await?;
        Ok(product)
    }

    pub async fn update_product(
        &self,
        _session: &SessionContext,
        mut product: Product,
    ) -> Result<Product, AppError> {
        self.store.get_active::<Product>(product.id).await?;
        self.ensure_unique(
            product.client_id,
            &product.name,
            &product.brand,
            Some(product.id),
        )
        .await?;
        self.store.put_dirty(&mut product).await?;
        Ok(product)
    }

    pub async fn delete_product(
        &self,
        session: &SessionContext,
        product_id: Uuid,
    ) -> Result<(), AppError> {
        let mut product = self.store.get_active::<Product>(product_id).await?;
        product.soft_delete(&session.user_name);
        self.store.put(&product).await?;
        Ok(())
    }

    /// Pré-checagem de unicidade (o store não tem índice único): compara
    /// name+brand sem diferenciar maiúsculas, dentro do mesmo escopo.
    async fn ensure_unique(
        &self,
        client_id: Option<Uuid>,
        name: &str,
        brand: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), AppError> {
        let name_key = name.trim().to_lowercase();
        let brand_key = brand.trim().to_lowercase();

        let duplicate = self.store.get_all::<Product>().await?.into_iter().any(|p| {
            !p.deleted
                && p.client_id == client_id
                && exclude != Some(p.id)
                && p.name.trim().to_lowercase() == name_key
                && p.brand.trim().to_lowercase() == brand_key
        });

        if duplicate {
            return Err(AppError::DuplicateProduct {
                name: name.to_string(),
                brand: brand.to_string(),
            });
        }
        Ok(())
    }
}
