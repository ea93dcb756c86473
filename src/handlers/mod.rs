pub mod analytics;
pub mod auth;
pub mod categories;
pub mod checkout;
pub mod common;
pub mod inventory;
pub mod products;
pub mod profile;
pub mod transactions;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<crate::services::catalog::CatalogService>,
    pub inventory: Arc<crate::services::inventory::InventoryService>,
    pub checkout: Arc<crate::services::checkout::CheckoutService>,
    pub transactions: Arc<crate::services::transactions::TransactionService>,
    pub analytics: Arc<crate::services::analytics::AnalyticsService>,
}

impl AppServices {
    /// Builds the service container shared by all HTTP handlers
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            catalog: Arc::new(crate::services::catalog::CatalogService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            inventory: Arc::new(crate::services::inventory::InventoryService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            checkout: Arc::new(crate::services::checkout::CheckoutService::with_database(
                db_pool.clone(),
                event_sender.clone(),
            )),
            transactions: Arc::new(crate::services::transactions::TransactionService::new(
                db_pool.clone(),
                event_sender,
            )),
            analytics: Arc::new(crate::services::analytics::AnalyticsService::new(db_pool)),
        }
    }
}
