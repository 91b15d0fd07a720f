use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, PaginatorTrait, QueryOrder};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::model_to_product;
use crate::errors::{Result, ShoptrackError};
use crate::storage::models::{NewProduct, Product};

use migration::entities::product;

const DEFAULT_IMAGE_FILE: &str = "default.jpg";

impl SeaOrmStorage {
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let models = product::Entity::find()
            .order_by_asc(product::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("查询商品失败: {}", e)))?;
        Ok(models.into_iter().map(model_to_product).collect())
    }

    pub async fn find_product(&self, id: i32) -> Result<Option<Product>> {
        let model = product::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("查询商品失败: {}", e)))?;
        Ok(model.map(model_to_product))
    }

    pub async fn insert_product(&self, new_product: NewProduct) -> Result<Product> {
        let active = product::ActiveModel {
            name: Set(new_product.name),
            price_cents: Set(new_product.price_cents),
            description: Set(new_product.description),
            image_file: Set(new_product
                .image_file
                .unwrap_or_else(|| DEFAULT_IMAGE_FILE.to_string())),
            stock: Set(new_product.stock),
            ..Default::default()
        };
        let db = &self.db;
        let model = self
            .retry
            .run("insert_product", || async { active.clone().insert(db).await })
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("创建商品失败: {}", e)))?;

        info!("Product created: id={} name={}", model.id, model.name);
        Ok(model_to_product(model))
    }

    pub async fn count_products(&self) -> Result<u64> {
        product::Entity::find()
            .count(&self.db)
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("统计商品失败: {}", e)))
    }
}
