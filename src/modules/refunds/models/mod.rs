pub mod refund;

pub use refund::{InitiatorType, Refund, RefundStatus, RefundType};
