use crate::{
    entities::{
        sales_transaction, transaction_item, SalesTransaction, TransactionItem,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::IntoParams;
use uuid::Uuid;

/// Filters for the transaction history listing
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct TransactionFilter {
    /// Inclusive lower bound on creation time
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time
    pub end: Option<DateTime<Utc>>,
    /// Substring match over receipt number or cashier name
    pub search: Option<String>,
    #[serde(default = "default_page")]
    #[param(default = 1)]
    pub page: u64,
    #[serde(default = "default_per_page")]
    #[param(default = 20)]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

/// Service for the transaction history: listing, detail, administrative
/// deletion, and CSV export.
#[derive(Clone)]
pub struct TransactionService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl TransactionService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    fn filtered_query(
        user_id: Uuid,
        filter: &TransactionFilter,
    ) -> sea_orm::Select<SalesTransaction> {
        let mut query = SalesTransaction::find()
            .filter(sales_transaction::Column::UserId.eq(user_id));

        if let Some(start) = filter.start {
            query = query.filter(sales_transaction::Column::CreatedAt.gte(start));
        }
        if let Some(end) = filter.end {
            query = query.filter(sales_transaction::Column::CreatedAt.lte(end));
        }
        if let Some(term) = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            query = query.filter(
                Condition::any()
                    .add(sales_transaction::Column::ReceiptNumber.contains(term))
                    .add(sales_transaction::Column::CashierName.contains(term)),
            );
        }

        query.order_by_desc(sales_transaction::Column::CreatedAt)
    }

    /// Lists the operator's transactions newest-first, with a total count for
    /// pagination.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: TransactionFilter,
    ) -> Result<(Vec<sales_transaction::Model>, u64), ServiceError> {
        let per_page = filter.per_page.clamp(1, 100);
        let page = filter.page.max(1);

        let paginator = Self::filtered_query(user_id, &filter).paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let transactions = paginator.fetch_page(page - 1).await?;

        Ok((transactions, total))
    }

    /// Fetches a transaction together with its line items.
    #[instrument(skip(self))]
    pub async fn get_with_items(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<(sales_transaction::Model, Vec<transaction_item::Model>), ServiceError> {
        let transaction = SalesTransaction::find_by_id(transaction_id)
            .filter(sales_transaction::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Transaction {} not found", transaction_id))
            })?;

        let items = TransactionItem::find()
            .filter(transaction_item::Column::TransactionId.eq(transaction_id))
            .order_by_asc(transaction_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok((transaction, items))
    }

    /// Administrative deletion: removes the line items first, then the
    /// transaction row itself.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: Uuid, transaction_id: Uuid) -> Result<(), ServiceError> {
        let transaction = SalesTransaction::find_by_id(transaction_id)
            .filter(sales_transaction::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Transaction {} not found", transaction_id))
            })?;

        TransactionItem::delete_many()
            .filter(transaction_item::Column::TransactionId.eq(transaction.id))
            .exec(&*self.db)
            .await?;

        SalesTransaction::delete_many()
            .filter(sales_transaction::Column::Id.eq(transaction.id))
            .exec(&*self.db)
            .await?;

        self.event_sender
            .send_or_log(Event::TransactionDeleted(transaction_id))
            .await;

        info!("Deleted transaction {}", transaction_id);
        Ok(())
    }

    /// Renders the filtered history as CSV for download.
    #[instrument(skip(self))]
    pub async fn export_csv(
        &self,
        user_id: Uuid,
        filter: TransactionFilter,
    ) -> Result<String, ServiceError> {
        let transactions = Self::filtered_query(user_id, &filter).all(&*self.db).await?;

        let mut csv = String::from(
            "receipt_number,created_at,cashier_name,payment_method,status,subtotal,tax_amount,total_amount\n",
        );
        for t in &transactions {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                csv_field(&t.receipt_number),
                t.created_at.to_rfc3339(),
                csv_field(&t.cashier_name),
                t.payment_method.as_str(),
                csv_field(&format!("{:?}", t.status).to_lowercase()),
                t.subtotal,
                t.tax_amount,
                t.total_amount,
            ));
        }

        Ok(csv)
    }
}

/// Quotes a CSV field when it contains a delimiter, quote, or newline
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields_pass_through() {
        assert_eq!(csv_field("RCP-123-ABC"), "RCP-123-ABC");
    }

    #[test]
    fn fields_with_delimiters_are_quoted() {
        assert_eq!(csv_field("Doe, Jane"), "\"Doe, Jane\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
