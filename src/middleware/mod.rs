pub mod principal;
pub mod request_id;

pub use principal::{AccountType, Principal, PrincipalExtractor};
pub use request_id::{RequestId, RequestIdToken};
