mod traits;
mod client;
pub mod provider;

pub use traits::*;
pub use client::{estimate_cost, CostEstimate, PlaceholderClient};
pub use provider::{ProviderConfig, ProviderId, ProviderRegistry};
