pub mod payment_transaction;

pub use payment_transaction::{PaymentMethod, PaymentTransaction, Provider, TransactionStatus};
