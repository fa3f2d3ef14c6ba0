pub mod refund_repository;

pub use refund_repository::{MySqlRefundRepository, RefundRepository};
