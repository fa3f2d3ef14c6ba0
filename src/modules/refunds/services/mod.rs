pub mod refund_orchestrator;

pub use refund_orchestrator::{Initiator, RefundOrchestrator, RefundOutcome};
