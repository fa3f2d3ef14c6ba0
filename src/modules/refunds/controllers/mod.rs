pub mod refund_controller;

pub use refund_controller::RefundController;
