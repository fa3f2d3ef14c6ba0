pub mod receipt_workflow;

pub use receipt_workflow::{
    ReceiptConfirmationWorkflow, ReceiptReviewOutcome, RECEIPT_REJECTED_REFUND_REASON,
};
