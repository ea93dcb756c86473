use crate::{
    entities::{category, product, Category, Product},
    errors::ServiceError,
    events::{Event, EventSender},
    services::inventory::StockStatus,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Category names seeded for a freshly registered operator
const DEFAULT_CATEGORIES: [&str; 4] = ["Groceries", "Beverages", "Snacks", "Household"];

/// Product projection served to the POS grid and inventory table,
/// with the category name joined in and the stock tier precomputed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogProduct {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub icon: Option<String>,
    pub price: Decimal,
    pub category_id: Option<Uuid>,
    pub category_name: String,
    pub stock_quantity: i32,
    pub reorder_level: i32,
    pub is_active: bool,
    pub stock_status: StockStatus,
}

impl CatalogProduct {
    fn from_parts(product: product::Model, category: Option<category::Model>) -> Self {
        let stock_status = product.stock_status();
        Self {
            id: product.id,
            name: product.name,
            sku: product.sku,
            icon: product.icon,
            price: product.price,
            category_id: product.category_id,
            category_name: category
                .map(|c| c.name)
                .unwrap_or_else(|| "Uncategorized".to_string()),
            stock_quantity: product.stock_quantity,
            reorder_level: product.reorder_level,
            is_active: product.is_active,
            stock_status,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema, validator::Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub sku: String,
    pub icon: Option<String>,
    pub price: Decimal,
    pub category_id: Option<Uuid>,
    pub stock_quantity: i32,
    pub reorder_level: i32,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub icon: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub stock_quantity: Option<i32>,
    pub reorder_level: Option<i32>,
}

/// Service for the product catalog and its categories
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Lists the operator's active products with category names, ordered by
    /// product name.
    #[instrument(skip(self))]
    pub async fn list_products(&self, user_id: Uuid) -> Result<Vec<CatalogProduct>, ServiceError> {
        let rows = Product::find()
            .filter(product::Column::UserId.eq(user_id))
            .filter(product::Column::IsActive.eq(true))
            .order_by_asc(product::Column::Name)
            .find_also_related(Category)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(p, c)| CatalogProduct::from_parts(p, c))
            .collect())
    }

    /// Fetches one of the operator's products regardless of active flag.
    #[instrument(skip(self))]
    pub async fn get_product(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<CatalogProduct, ServiceError> {
        let row = Product::find_by_id(product_id)
            .filter(product::Column::UserId.eq(user_id))
            .find_also_related(Category)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        Ok(CatalogProduct::from_parts(row.0, row.1))
    }

    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        user_id: Uuid,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price must not be negative".to_string(),
            ));
        }
        if input.stock_quantity < 0 || input.reorder_level < 0 {
            return Err(ServiceError::ValidationError(
                "Stock quantity and reorder level must not be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            category_id: Set(input.category_id),
            name: Set(input.name),
            sku: Set(input.sku),
            icon: Set(input.icon),
            price: Set(input.price),
            stock_quantity: Set(input.stock_quantity),
            reorder_level: Set(input.reorder_level),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let product = product.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product.id))
            .await;

        info!("Created product {} ({})", product.id, product.name);
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let product = Product::find_by_id(product_id)
            .filter(product::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        if input.price.map(|p| p < Decimal::ZERO).unwrap_or(false) {
            return Err(ServiceError::ValidationError(
                "Price must not be negative".to_string(),
            ));
        }
        if input.stock_quantity.map(|q| q < 0).unwrap_or(false)
            || input.reorder_level.map(|r| r < 0).unwrap_or(false)
        {
            return Err(ServiceError::ValidationError(
                "Stock quantity and reorder level must not be negative".to_string(),
            ));
        }

        let mut active: product::ActiveModel = product.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(sku) = input.sku {
            active.sku = Set(sku);
        }
        if let Some(icon) = input.icon {
            active.icon = Set(Some(icon));
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(Some(category_id));
        }
        if let Some(stock_quantity) = input.stock_quantity {
            active.stock_quantity = Set(stock_quantity);
        }
        if let Some(reorder_level) = input.reorder_level {
            active.reorder_level = Set(reorder_level);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;

        Ok(updated)
    }

    /// Soft-deletes a product by clearing its active flag. The row is kept so
    /// historical transaction items retain a valid reference.
    #[instrument(skip(self))]
    pub async fn deactivate_product(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<(), ServiceError> {
        let product = Product::find_by_id(product_id)
            .filter(product::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let mut active: product::ActiveModel = product.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductDeactivated(product_id))
            .await;

        info!("Deactivated product {}", product_id);
        Ok(())
    }

    /// Lists the operator's categories ordered by name.
    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<category::Model>, ServiceError> {
        let categories = Category::find()
            .filter(category::Column::UserId.eq(user_id))
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(categories)
    }

    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        user_id: Uuid,
        name: String,
    ) -> Result<category::Model, ServiceError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Category name must not be empty".to_string(),
            ));
        }

        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(name),
            created_at: Set(Utc::now()),
        };
        let model = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryCreated(model.id))
            .await;

        Ok(model)
    }

    /// Creates the baseline categories for a newly registered operator.
    ///
    /// Failures are logged and swallowed so signup itself never fails on
    /// seed data.
    #[instrument(skip(self))]
    pub async fn create_default_categories(&self, user_id: Uuid) {
        for name in DEFAULT_CATEGORIES {
            if let Err(e) = self.create_category(user_id, name.to_string()).await {
                tracing::error!("Error creating default category '{}': {}", name, e);
            }
        }
    }
}
