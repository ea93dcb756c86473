use crate::{
    entities::{
        product, sales_transaction, transaction_item, Category, Product, SalesTransaction,
        TransactionItem,
    },
    errors::ServiceError,
};
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Timelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

const TOP_PRODUCT_LIMIT: usize = 5;
const SLOW_MOVER_LIMIT: usize = 5;
const SLOW_MOVER_WINDOW_DAYS: u64 = 30;

/// Reporting window selected in the analytics dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Today,
    Week,
    Month,
    Year,
}

/// Start of the reporting window `offset` periods back from `now`.
///
/// Weeks are rolling seven-day windows; months and years are calendar-based.
pub fn period_start(period: Period, now: DateTime<Utc>, offset: u32) -> DateTime<Utc> {
    let today = now.date_naive();
    let start_date = match period {
        Period::Today => today - Days::new(offset as u64),
        Period::Week => today - Days::new(6 + 7 * offset as u64),
        Period::Month => today
            .with_day(1)
            .unwrap_or(today)
            .checked_sub_months(Months::new(offset))
            .unwrap_or(today),
        Period::Year => NaiveDate::from_ymd_opt(today.year() - offset as i32, 1, 1)
            .unwrap_or(today),
    };
    start_date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
}

/// Half-open reporting window `[start, end)` for the given offset;
/// the current window (offset zero) ends at `now`.
pub fn period_range(period: Period, now: DateTime<Utc>, offset: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = period_start(period, now, offset);
    let end = if offset == 0 {
        now
    } else {
        period_start(period, now, offset - 1)
    };
    (start, end)
}

/// Chart bucket label for a transaction timestamp:
/// hour of day for today, weekday for week, day of month for month,
/// month for year.
pub fn bucket_label(period: Period, at: DateTime<Utc>) -> String {
    match period {
        Period::Today => {
            let hour = at.hour();
            let display_hour = if hour % 12 == 0 { 12 } else { hour % 12 };
            let suffix = if hour >= 12 { "PM" } else { "AM" };
            format!("{} {}", display_hour, suffix)
        }
        Period::Week => {
            const DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
            DAYS[at.weekday().num_days_from_sunday() as usize].to_string()
        }
        Period::Month => at.day().to_string(),
        Period::Year => {
            const MONTHS: [&str; 12] = [
                "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
            ];
            MONTHS[at.month0() as usize].to_string()
        }
    }
}

/// Rollup of one reporting window
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PeriodMetrics {
    pub total_revenue: Decimal,
    pub transaction_count: u64,
    pub average_sale: Decimal,
}

impl PeriodMetrics {
    fn from_totals(totals: &[Decimal]) -> Self {
        let total_revenue: Decimal = totals.iter().copied().sum();
        let transaction_count = totals.len() as u64;
        let average_sale = if transaction_count > 0 {
            (total_revenue / Decimal::from(transaction_count)).round_dp(2)
        } else {
            Decimal::ZERO
        };
        Self {
            total_revenue,
            transaction_count,
            average_sale,
        }
    }
}

/// Current window metrics with the previous window for comparison
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalyticsMetrics {
    pub current: PeriodMetrics,
    pub previous: PeriodMetrics,
}

/// One point of the revenue chart
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RevenuePoint {
    pub period: String,
    pub revenue: Decimal,
}

/// Best seller over the selected window
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TopProduct {
    pub product_name: String,
    pub icon: Option<String>,
    pub category_name: String,
    pub total_sold: i64,
    pub total_revenue: Decimal,
}

/// Active product without recent sales
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SlowMovingItem {
    pub product_name: String,
    pub stock_quantity: i32,
    pub days_without_sales: i64,
}

/// Read-only sales rollups for the analytics dashboard. Holds no state;
/// everything is derived from transactions and line items at query time.
#[derive(Clone)]
pub struct AnalyticsService {
    db: Arc<DatabaseConnection>,
}

impl AnalyticsService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn totals_in_range(
        &self,
        user_id: Uuid,
        range: (DateTime<Utc>, DateTime<Utc>),
    ) -> Result<Vec<Decimal>, ServiceError> {
        let transactions = SalesTransaction::find()
            .filter(sales_transaction::Column::UserId.eq(user_id))
            .filter(sales_transaction::Column::CreatedAt.gte(range.0))
            .filter(sales_transaction::Column::CreatedAt.lt(range.1))
            .all(&*self.db)
            .await?;
        Ok(transactions.into_iter().map(|t| t.total_amount).collect())
    }

    /// Revenue, transaction count, and average sale for the selected window,
    /// paired with the previous window of the same length.
    #[instrument(skip(self))]
    pub async fn metrics(
        &self,
        user_id: Uuid,
        period: Period,
    ) -> Result<AnalyticsMetrics, ServiceError> {
        let now = Utc::now();
        let current = self
            .totals_in_range(user_id, period_range(period, now, 0))
            .await?;
        let previous = self
            .totals_in_range(user_id, period_range(period, now, 1))
            .await?;

        Ok(AnalyticsMetrics {
            current: PeriodMetrics::from_totals(&current),
            previous: PeriodMetrics::from_totals(&previous),
        })
    }

    /// Revenue bucketed for the dashboard chart, in chronological order.
    #[instrument(skip(self))]
    pub async fn revenue_series(
        &self,
        user_id: Uuid,
        period: Period,
    ) -> Result<Vec<RevenuePoint>, ServiceError> {
        let now = Utc::now();
        let (start, end) = period_range(period, now, 0);

        let transactions = SalesTransaction::find()
            .filter(sales_transaction::Column::UserId.eq(user_id))
            .filter(sales_transaction::Column::CreatedAt.gte(start))
            .filter(sales_transaction::Column::CreatedAt.lt(end))
            .order_by_asc(sales_transaction::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        // First-seen order keeps the series chronological without a second sort
        let mut series: Vec<RevenuePoint> = Vec::new();
        for t in transactions {
            let label = bucket_label(period, t.created_at);
            match series.iter_mut().find(|point| point.period == label) {
                Some(point) => point.revenue += t.total_amount,
                None => series.push(RevenuePoint {
                    period: label,
                    revenue: t.total_amount,
                }),
            }
        }

        Ok(series)
    }

    /// Top five products by quantity sold within the window.
    #[instrument(skip(self))]
    pub async fn top_products(
        &self,
        user_id: Uuid,
        period: Period,
    ) -> Result<Vec<TopProduct>, ServiceError> {
        let now = Utc::now();
        let (start, end) = period_range(period, now, 0);

        let rows = TransactionItem::find()
            .filter(transaction_item::Column::UserId.eq(user_id))
            .find_also_related(SalesTransaction)
            .all(&*self.db)
            .await?;

        let in_range = rows.into_iter().filter(|(_, transaction)| {
            transaction
                .as_ref()
                .map(|t| t.created_at >= start && t.created_at < end)
                .unwrap_or(false)
        });

        // icon/category lookup for the cards rendered next to each name
        let products = Product::find()
            .filter(product::Column::UserId.eq(user_id))
            .find_also_related(Category)
            .all(&*self.db)
            .await?;
        let details: HashMap<Uuid, (Option<String>, String)> = products
            .into_iter()
            .map(|(p, c)| {
                (
                    p.id,
                    (
                        p.icon,
                        c.map(|c| c.name).unwrap_or_else(|| "Uncategorized".to_string()),
                    ),
                )
            })
            .collect();

        let mut grouped: Vec<TopProduct> = Vec::new();
        for (item, _) in in_range {
            match grouped
                .iter_mut()
                .find(|g| g.product_name == item.product_name)
            {
                Some(entry) => {
                    entry.total_sold += item.quantity as i64;
                    entry.total_revenue += item.subtotal;
                }
                None => {
                    let (icon, category_name) = details
                        .get(&item.product_id)
                        .cloned()
                        .unwrap_or((None, "Uncategorized".to_string()));
                    grouped.push(TopProduct {
                        product_name: item.product_name,
                        icon,
                        category_name,
                        total_sold: item.quantity as i64,
                        total_revenue: item.subtotal,
                    });
                }
            }
        }

        grouped.sort_by(|a, b| b.total_sold.cmp(&a.total_sold));
        grouped.truncate(TOP_PRODUCT_LIMIT);
        Ok(grouped)
    }

    /// Active products with no sales in the last thirty days, ordered by how
    /// long they have sat untouched.
    #[instrument(skip(self))]
    pub async fn slow_movers(&self, user_id: Uuid) -> Result<Vec<SlowMovingItem>, ServiceError> {
        let now = Utc::now();
        let cutoff = now - Days::new(SLOW_MOVER_WINDOW_DAYS);

        let products = Product::find()
            .filter(product::Column::UserId.eq(user_id))
            .filter(product::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?;

        let recent_items = TransactionItem::find()
            .filter(transaction_item::Column::UserId.eq(user_id))
            .filter(transaction_item::Column::CreatedAt.gte(cutoff))
            .all(&*self.db)
            .await?;
        let recently_sold: HashSet<Uuid> =
            recent_items.into_iter().map(|item| item.product_id).collect();

        let mut slow: Vec<SlowMovingItem> = products
            .into_iter()
            .filter(|p| !recently_sold.contains(&p.id))
            .map(|p| SlowMovingItem {
                product_name: p.name,
                stock_quantity: p.stock_quantity,
                days_without_sales: (now - p.updated_at).num_days(),
            })
            .collect();

        slow.sort_by(|a, b| b.days_without_sales.cmp(&a.days_without_sales));
        slow.truncate(SLOW_MOVER_LIMIT);
        Ok(slow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn hour_buckets_wrap_noon_and_midnight() {
        assert_eq!(bucket_label(Period::Today, at(2025, 6, 1, 0, 5)), "12 AM");
        assert_eq!(bucket_label(Period::Today, at(2025, 6, 1, 9, 0)), "9 AM");
        assert_eq!(bucket_label(Period::Today, at(2025, 6, 1, 12, 0)), "12 PM");
        assert_eq!(bucket_label(Period::Today, at(2025, 6, 1, 23, 59)), "11 PM");
    }

    #[test]
    fn week_buckets_use_weekday_names() {
        // 2025-06-01 is a Sunday
        assert_eq!(bucket_label(Period::Week, at(2025, 6, 1, 10, 0)), "Sun");
        assert_eq!(bucket_label(Period::Week, at(2025, 6, 2, 10, 0)), "Mon");
    }

    #[test]
    fn month_and_year_buckets() {
        assert_eq!(bucket_label(Period::Month, at(2025, 6, 17, 0, 0)), "17");
        assert_eq!(bucket_label(Period::Year, at(2025, 2, 1, 0, 0)), "Feb");
        assert_eq!(bucket_label(Period::Year, at(2025, 12, 31, 0, 0)), "Dec");
    }

    #[test]
    fn today_range_starts_at_midnight() {
        let now = at(2025, 6, 17, 15, 30);
        let (start, end) = period_range(Period::Today, now, 0);
        assert_eq!(start, at(2025, 6, 17, 0, 0));
        assert_eq!(end, now);
    }

    #[test]
    fn previous_day_range_is_the_full_prior_day() {
        let now = at(2025, 6, 17, 15, 30);
        let (start, end) = period_range(Period::Today, now, 1);
        assert_eq!(start, at(2025, 6, 16, 0, 0));
        assert_eq!(end, at(2025, 6, 17, 0, 0));
    }

    #[test]
    fn month_range_starts_on_the_first() {
        let now = at(2025, 6, 17, 15, 30);
        assert_eq!(period_start(Period::Month, now, 0), at(2025, 6, 1, 0, 0));
        assert_eq!(period_start(Period::Month, now, 1), at(2025, 5, 1, 0, 0));
    }

    #[test]
    fn year_range_starts_on_january_first() {
        let now = at(2025, 6, 17, 15, 30);
        assert_eq!(period_start(Period::Year, now, 0), at(2025, 1, 1, 0, 0));
        assert_eq!(period_start(Period::Year, now, 1), at(2024, 1, 1, 0, 0));
    }

    #[test]
    fn week_range_covers_rolling_seven_days() {
        let now = at(2025, 6, 17, 15, 30);
        assert_eq!(period_start(Period::Week, now, 0), at(2025, 6, 11, 0, 0));
    }

    #[test]
    fn metrics_average_divides_revenue_by_count() {
        let metrics = PeriodMetrics::from_totals(&[dec!(10), dec!(20), dec!(15)]);
        assert_eq!(metrics.total_revenue, dec!(45));
        assert_eq!(metrics.transaction_count, 3);
        assert_eq!(metrics.average_sale, dec!(15));
    }

    #[test]
    fn metrics_of_empty_window_are_zero() {
        let metrics = PeriodMetrics::from_totals(&[]);
        assert_eq!(metrics.total_revenue, Decimal::ZERO);
        assert_eq!(metrics.transaction_count, 0);
        assert_eq!(metrics.average_sale, Decimal::ZERO);
    }
}
