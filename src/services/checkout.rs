//! Checkout orchestration: turns an in-memory cart into a durable
//! transaction with line items and matching stock decrements.
//!
//! The storage layer offers no multi-statement transaction to the client, so
//! the write sequence is compensated manually: any line-item insert failure
//! deletes the rows already written, restores the stock already decremented,
//! and removes the transaction row before the error is reported. Compensation
//! itself is best-effort - a failing undo step is logged and skipped rather
//! than retried forever.

use crate::{
    entities::{
        product, profile, sales_transaction, transaction_item, PaymentMethod, Product,
        SalesTransaction, TransactionItem, TransactionStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

const RECEIPT_SUFFIX_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const RECEIPT_SUFFIX_LEN: usize = 9;

/// Generates a human-facing receipt number: `RCP-<millis>-<9 char base36>`.
///
/// Uniqueness is probabilistic; collisions are neither detected nor retried.
pub fn generate_receipt_number() -> String {
    let millis = Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..RECEIPT_SUFFIX_LEN)
        .map(|_| RECEIPT_SUFFIX_ALPHABET[rng.gen_range(0..RECEIPT_SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("RCP-{}-{}", millis, suffix)
}

/// One product-quantity-price entry of the client-held cart.
///
/// Name and unit price are captured at add-to-cart time and not re-read at
/// checkout.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl CartLine {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Finalized cart plus payment details, as submitted by the POS client
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub lines: Vec<CartLine>,
    pub payment_method: PaymentMethod,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    /// Cash handed over by the customer; required for cash payments
    pub amount_tendered: Option<Decimal>,
}

impl CheckoutRequest {
    /// Rejects carts the orchestrator must never see: empty carts, bad
    /// quantities or prices, inconsistent totals, and under-tendered cash.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "Cart is empty".to_string(),
            ));
        }
        for line in &self.lines {
            if line.quantity < 1 {
                return Err(ServiceError::ValidationError(format!(
                    "Quantity for '{}' must be at least 1",
                    line.product_name
                )));
            }
            if line.unit_price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Unit price for '{}' must not be negative",
                    line.product_name
                )));
            }
        }

        let computed_subtotal: Decimal = self.lines.iter().map(CartLine::subtotal).sum();
        if computed_subtotal != self.subtotal {
            return Err(ServiceError::ValidationError(
                "Subtotal does not match cart lines".to_string(),
            ));
        }
        if self.subtotal + self.tax_amount != self.total_amount {
            return Err(ServiceError::ValidationError(
                "Total does not match subtotal plus tax".to_string(),
            ));
        }

        if self.payment_method == PaymentMethod::Cash {
            match self.amount_tendered {
                Some(tendered) if tendered >= self.total_amount => {}
                Some(_) => {
                    return Err(ServiceError::ValidationError(
                        "Amount tendered is less than the total due".to_string(),
                    ))
                }
                None => {
                    return Err(ServiceError::ValidationError(
                        "Amount tendered is required for cash payments".to_string(),
                    ))
                }
            }
        }

        Ok(())
    }
}

/// Result of a successful checkout
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckoutOutcome {
    pub transaction: sales_transaction::Model,
    pub receipt_number: String,
    /// Change owed to the customer (cash payments only)
    pub change_due: Option<Decimal>,
}

/// Previous and new stock level of a decrement, used to build the undo list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDecrementResult {
    pub previous: i32,
    pub new: i32,
}

/// Narrow storage port the orchestrator writes through.
///
/// Production uses [`SeaOrmCheckoutStore`]; tests substitute an in-memory
/// double with failure injection.
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    /// Display name for the receipt, if the operator has a profile
    async fn cashier_name(&self, user_id: Uuid) -> Result<Option<String>, ServiceError>;

    async fn insert_transaction(
        &self,
        transaction: sales_transaction::Model,
    ) -> Result<sales_transaction::Model, ServiceError>;

    async fn insert_item(&self, item: transaction_item::Model) -> Result<(), ServiceError>;

    /// Atomically decrements a product's stock, clamped at zero, returning
    /// the previous and new levels. Implementations must not lose concurrent
    /// updates (conditional write or equivalent).
    async fn decrement_stock(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<StockDecrementResult, ServiceError>;

    /// Writes back a pre-decrement stock level during rollback
    async fn restore_stock(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        previous_quantity: i32,
    ) -> Result<(), ServiceError>;

    /// Deletes every line item referencing the transaction
    async fn delete_items(&self, transaction_id: Uuid) -> Result<(), ServiceError>;

    async fn delete_transaction(&self, transaction_id: Uuid) -> Result<(), ServiceError>;
}

/// sea-orm implementation of the checkout storage port
#[derive(Clone)]
pub struct SeaOrmCheckoutStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmCheckoutStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CheckoutStore for SeaOrmCheckoutStore {
    async fn cashier_name(&self, user_id: Uuid) -> Result<Option<String>, ServiceError> {
        let profile = profile::Entity::find_by_id(user_id).one(&*self.db).await?;
        Ok(profile.map(|p| p.full_name))
    }

    async fn insert_transaction(
        &self,
        transaction: sales_transaction::Model,
    ) -> Result<sales_transaction::Model, ServiceError> {
        let active = sales_transaction::ActiveModel {
            id: Set(transaction.id),
            user_id: Set(transaction.user_id),
            receipt_number: Set(transaction.receipt_number),
            subtotal: Set(transaction.subtotal),
            tax_amount: Set(transaction.tax_amount),
            total_amount: Set(transaction.total_amount),
            payment_method: Set(transaction.payment_method),
            status: Set(transaction.status),
            cashier_name: Set(transaction.cashier_name),
            created_at: Set(transaction.created_at),
        };
        Ok(active.insert(&*self.db).await?)
    }

    async fn insert_item(&self, item: transaction_item::Model) -> Result<(), ServiceError> {
        let active = transaction_item::ActiveModel {
            id: Set(item.id),
            transaction_id: Set(item.transaction_id),
            user_id: Set(item.user_id),
            product_id: Set(item.product_id),
            product_name: Set(item.product_name),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            subtotal: Set(item.subtotal),
            created_at: Set(item.created_at),
        };
        active.insert(&*self.db).await?;
        Ok(())
    }

    async fn decrement_stock(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<StockDecrementResult, ServiceError> {
        // Conditional update keyed on the observed stock level; a concurrent
        // decrement makes the predicate miss and we re-read. This replaces
        // the lost-update-prone blind read-modify-write.
        loop {
            let current = Product::find_by_id(product_id)
                .filter(product::Column::UserId.eq(user_id))
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", product_id))
                })?
                .stock_quantity;

            let new = (current - quantity).max(0);
            let result = Product::update_many()
                .col_expr(product::Column::StockQuantity, Expr::value(new))
                .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(product::Column::Id.eq(product_id))
                .filter(product::Column::UserId.eq(user_id))
                .filter(product::Column::StockQuantity.eq(current))
                .exec(&*self.db)
                .await?;

            if result.rows_affected == 1 {
                return Ok(StockDecrementResult {
                    previous: current,
                    new,
                });
            }
        }
    }

    async fn restore_stock(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        previous_quantity: i32,
    ) -> Result<(), ServiceError> {
        Product::update_many()
            .col_expr(
                product::Column::StockQuantity,
                Expr::value(previous_quantity),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    async fn delete_items(&self, transaction_id: Uuid) -> Result<(), ServiceError> {
        TransactionItem::delete_many()
            .filter(transaction_item::Column::TransactionId.eq(transaction_id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    async fn delete_transaction(&self, transaction_id: Uuid) -> Result<(), ServiceError> {
        SalesTransaction::delete_many()
            .filter(sales_transaction::Column::Id.eq(transaction_id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }
}

/// Orchestrates the checkout write sequence with manual compensation
#[derive(Clone)]
pub struct CheckoutService {
    store: Arc<dyn CheckoutStore>,
    event_sender: Arc<EventSender>,
}

impl CheckoutService {
    pub fn new(store: Arc<dyn CheckoutStore>, event_sender: Arc<EventSender>) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    /// Builds a checkout service backed by the sea-orm store
    pub fn with_database(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self::new(Arc::new(SeaOrmCheckoutStore::new(db)), event_sender)
    }

    /// Converts the finalized cart into one transaction row plus one line
    /// item per cart line, decrementing each product's stock (clamped at
    /// zero) as items land.
    ///
    /// On a line-item insert failure the already-written rows are removed,
    /// decremented stocks are restored to their recorded previous values, and
    /// the transaction row is deleted before the failure is reported; the
    /// caller keeps its cart and may retry. Stock decrement failures do not
    /// abort the sale - they are logged and the sequence continues.
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn checkout(
        &self,
        user_id: Uuid,
        request: CheckoutRequest,
    ) -> Result<CheckoutOutcome, ServiceError> {
        request.validate()?;

        let cashier_name = self
            .store
            .cashier_name(user_id)
            .await?
            .unwrap_or_else(|| "Unknown".to_string());

        let receipt_number = generate_receipt_number();

        let transaction = sales_transaction::Model {
            id: Uuid::new_v4(),
            user_id,
            receipt_number: receipt_number.clone(),
            subtotal: request.subtotal,
            tax_amount: request.tax_amount,
            total_amount: request.total_amount,
            payment_method: request.payment_method,
            status: TransactionStatus::Completed,
            cashier_name,
            created_at: Utc::now(),
        };

        let transaction = match self.store.insert_transaction(transaction).await {
            Ok(t) => t,
            Err(e) => {
                error!("Error creating transaction: {}", e);
                self.event_sender
                    .send_or_log(Event::CheckoutFailed {
                        user_id,
                        reason: "Failed to create transaction".to_string(),
                    })
                    .await;
                return Err(ServiceError::CheckoutFailed(
                    "Failed to create transaction".to_string(),
                ));
            }
        };

        // Undo list: (product, stock before decrement) for this attempt only
        let mut decremented: Vec<(Uuid, i32)> = Vec::with_capacity(request.lines.len());

        for line in &request.lines {
            let item = transaction_item::Model {
                id: Uuid::new_v4(),
                transaction_id: transaction.id,
                user_id,
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal(),
                created_at: Utc::now(),
            };

            if let Err(e) = self.store.insert_item(item).await {
                error!("Error inserting transaction item: {}", e);
                self.compensate(user_id, transaction.id, &decremented).await;
                self.event_sender
                    .send_or_log(Event::CheckoutFailed {
                        user_id,
                        reason: "Failed to save transaction items".to_string(),
                    })
                    .await;
                return Err(ServiceError::CheckoutFailed(
                    "Failed to save transaction items".to_string(),
                ));
            }

            match self
                .store
                .decrement_stock(user_id, line.product_id, line.quantity)
                .await
            {
                Ok(result) => {
                    decremented.push((line.product_id, result.previous));
                    self.event_sender
                        .send_or_log(Event::StockDecremented {
                            product_id: line.product_id,
                            old_quantity: result.previous,
                            new_quantity: result.new,
                        })
                        .await;
                }
                Err(e) => {
                    // Stale catalog data must not void the sale; the level is
                    // reconciled by a later manual adjustment.
                    error!(
                        "Error updating stock for product {}: {}",
                        line.product_id, e
                    );
                }
            }
        }

        self.event_sender
            .send_or_log(Event::TransactionCompleted {
                transaction_id: transaction.id,
                receipt_number: receipt_number.clone(),
                total_amount: transaction.total_amount,
            })
            .await;

        let change_due = match request.payment_method {
            PaymentMethod::Cash => request
                .amount_tendered
                .map(|tendered| tendered - request.total_amount),
            PaymentMethod::GCash => None,
        };

        info!(
            "Checkout completed: transaction {} receipt {}",
            transaction.id, receipt_number
        );

        Ok(CheckoutOutcome {
            transaction,
            receipt_number,
            change_due,
        })
    }

    /// Best-effort rollback of a partially written checkout: delete inserted
    /// items, restore decremented stock, delete the transaction row. Each
    /// failing step is logged and skipped - never retried in a loop - so a
    /// broken storage backend cannot wedge the operator's terminal.
    async fn compensate(&self, user_id: Uuid, transaction_id: Uuid, decremented: &[(Uuid, i32)]) {
        warn!(
            "Rolling back checkout for transaction {} ({} stock decrements to restore)",
            transaction_id,
            decremented.len()
        );

        if let Err(e) = self.store.delete_items(transaction_id).await {
            error!(
                "Rollback: failed deleting items for transaction {}: {}",
                transaction_id, e
            );
        }

        for (product_id, previous) in decremented {
            match self
                .store
                .restore_stock(user_id, *product_id, *previous)
                .await
            {
                Ok(()) => {
                    self.event_sender
                        .send_or_log(Event::StockRestored {
                            product_id: *product_id,
                            restored_quantity: *previous,
                        })
                        .await;
                }
                Err(e) => {
                    error!(
                        "Rollback: failed restoring stock for product {}: {}",
                        product_id, e
                    );
                }
            }
        }

        if let Err(e) = self.store.delete_transaction(transaction_id).await {
            error!(
                "Rollback: failed deleting transaction {}: {}",
                transaction_id, e
            );
        }
    }
}
