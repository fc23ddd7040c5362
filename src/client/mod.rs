pub mod builder;
pub mod connector;
pub mod transaction;

pub use builder::EntityServerBuilder;
pub use connector::EntityServerClient;
pub use transaction::{TransactionState, TransactionTracker};
