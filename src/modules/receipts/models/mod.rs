pub mod payment_receipt;

pub use payment_receipt::{PaymentReceipt, ReceiptStatus};
