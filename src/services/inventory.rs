use crate::{
    entities::{product, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Stock level tier for a product.
///
/// Used by the inventory table (badge and filter) and by the POS product grid
/// to disable add-to-cart for sold-out products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

/// Classifies a stock level against its reorder threshold.
///
/// Out of stock at zero or below, low stock strictly between zero and the
/// reorder level, in stock otherwise (a reorder level of zero can never
/// produce a low tier).
pub fn classify_stock(stock_quantity: i32, reorder_level: i32) -> StockStatus {
    if stock_quantity <= 0 {
        StockStatus::OutOfStock
    } else if stock_quantity < reorder_level {
        StockStatus::LowStock
    } else {
        StockStatus::InStock
    }
}

impl product::Model {
    /// Stock tier of this product
    pub fn stock_status(&self) -> StockStatus {
        classify_stock(self.stock_quantity, self.reorder_level)
    }
}

/// Product row as served to the inventory table, with its stock tier
/// precomputed for badge rendering and filtering.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InventoryItem {
    #[serde(flatten)]
    pub product: product::Model,
    pub stock_status: StockStatus,
}

impl From<product::Model> for InventoryItem {
    fn from(product: product::Model) -> Self {
        let stock_status = product.stock_status();
        Self {
            product,
            stock_status,
        }
    }
}

/// Counts per stock tier across the active catalog
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InventorySummary {
    pub total_products: u64,
    pub in_stock: u64,
    pub low_stock: u64,
    pub out_of_stock: u64,
}

/// Manual stock correction. Exactly one of `set_quantity` (absolute) or
/// `delta` (relative) must be provided; results are floored at zero.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdjustStockInput {
    pub set_quantity: Option<i32>,
    pub delta: Option<i32>,
}

/// Service for inventory queries and manual stock adjustments
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Lists the operator's active products, optionally filtered by stock
    /// tier and by a name/SKU search term.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        user_id: Uuid,
        status: Option<StockStatus>,
        search: Option<String>,
    ) -> Result<Vec<InventoryItem>, ServiceError> {
        let mut query = Product::find()
            .filter(product::Column::UserId.eq(user_id))
            .filter(product::Column::IsActive.eq(true));

        if let Some(term) = search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(product::Column::Name.contains(term))
                    .add(product::Column::Sku.contains(term)),
            );
        }

        let products = query
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?;

        // The tier depends on two columns, so classification happens here
        // rather than in SQL.
        let items = products.into_iter().map(InventoryItem::from);
        Ok(match status {
            Some(wanted) => items.filter(|item| item.stock_status == wanted).collect(),
            None => items.collect(),
        })
    }

    /// Counts active products per stock tier.
    #[instrument(skip(self))]
    pub async fn summary(&self, user_id: Uuid) -> Result<InventorySummary, ServiceError> {
        let products = Product::find()
            .filter(product::Column::UserId.eq(user_id))
            .filter(product::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?;

        let mut summary = InventorySummary {
            total_products: products.len() as u64,
            in_stock: 0,
            low_stock: 0,
            out_of_stock: 0,
        };
        for p in &products {
            match p.stock_status() {
                StockStatus::InStock => summary.in_stock += 1,
                StockStatus::LowStock => summary.low_stock += 1,
                StockStatus::OutOfStock => summary.out_of_stock += 1,
            }
        }
        Ok(summary)
    }

    /// Active products at or below their reorder threshold (low or out tiers).
    #[instrument(skip(self))]
    pub async fn low_stock(&self, user_id: Uuid) -> Result<Vec<InventoryItem>, ServiceError> {
        let items = self.list(user_id, None, None).await?;
        Ok(items
            .into_iter()
            .filter(|item| item.stock_status != StockStatus::InStock)
            .collect())
    }

    /// Applies a manual stock correction, floored at zero.
    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        input: AdjustStockInput,
    ) -> Result<product::Model, ServiceError> {
        let product = Product::find_by_id(product_id)
            .filter(product::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let old_quantity = product.stock_quantity;
        let new_quantity = match (input.set_quantity, input.delta) {
            (Some(quantity), None) => quantity,
            (None, Some(delta)) => old_quantity.saturating_add(delta),
            _ => {
                return Err(ServiceError::ValidationError(
                    "Provide exactly one of set_quantity or delta".to_string(),
                ))
            }
        }
        .max(0);

        let mut active: product::ActiveModel = product.into();
        active.stock_quantity = Set(new_quantity);
        active.updated_at = Set(chrono::Utc::now());
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::StockAdjusted {
                product_id,
                old_quantity,
                new_quantity,
            })
            .await;

        info!(
            "Adjusted stock for product {}: {} -> {}",
            product_id, old_quantity, new_quantity
        );
        Ok(updated)
    }
}
