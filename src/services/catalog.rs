//! Product catalog

use std::sync::Arc;

use tracing::info;

use crate::errors::{Result, ShoptrackError};
use crate::storage::{NewProduct, Product, SeaOrmStorage};

const MAX_NAME_CHARS: usize = 120;

pub struct CatalogService {
    storage: Arc<SeaOrmStorage>,
}

impl CatalogService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        self.storage.list_products().await
    }

    pub async fn get_product(&self, id: i32) -> Result<Product> {
        self.storage
            .find_product(id)
            .await?
            .ok_or_else(|| ShoptrackError::not_found(format!("Product not found: {}", id)))
    }

    pub async fn create_product(&self, mut product: NewProduct) -> Result<Product> {
        product.name = product.name.trim().to_string();
        validate_product(&product)?;

        let created = self.storage.insert_product(product).await?;
        info!("Product created: {} ({})", created.name, created.id);
        Ok(created)
    }
}

fn validate_product(product: &NewProduct) -> Result<()> {
    let len = product.name.chars().count();
    if len == 0 || len > MAX_NAME_CHARS {
        return Err(ShoptrackError::validation(format!(
            "Product name must be between 1 and {} characters",
            MAX_NAME_CHARS
        )));
    }
    if product.price_cents < 0 {
        return Err(ShoptrackError::validation("Price cannot be negative"));
    }
    if product.stock < 0 {
        return Err(ShoptrackError::validation("Stock cannot be negative"));
    }
    Ok(())
}
