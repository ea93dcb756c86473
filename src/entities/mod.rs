//! Database entities for the POS domain.
//!
//! All rows are scoped to the owning operator via `user_id`; payment method
//! and transaction status are closed enums validated at the storage boundary.

pub mod category;
pub mod product;
pub mod profile;
pub mod sales_transaction;
pub mod transaction_item;
pub mod user;

pub use category::Entity as Category;
pub use product::Entity as Product;
pub use profile::Entity as Profile;
pub use sales_transaction::Entity as SalesTransaction;
pub use transaction_item::Entity as TransactionItem;
pub use user::Entity as User;

pub use sales_transaction::{PaymentMethod, TransactionStatus};
