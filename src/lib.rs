pub mod client;
pub mod core;

pub use client::{EntityServerBuilder, EntityServerClient, TransactionState};
pub use crate::core::{
    config::ClientConfig,
    errors::EntityError,
    types::{DeleteOptions, Filter, HistoryOptions, ListOptions, QueryOptions},
};
