pub mod client;
pub mod error;
pub mod model;

pub use client::AccessRequestsApi;
pub use error::AccessError;
pub use model::{
    Decision, HistoryRecord, Identity, InboundEvent, EventOutcome, PendingPage, RegisterOutcome,
    UserRecord, UserStatus,
};
