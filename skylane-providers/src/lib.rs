pub mod airlabs;
pub mod amadeus;
pub mod aviationstack;
pub mod mock;
pub mod opensky;
pub mod search;
pub mod stripe;
pub mod token_cache;

pub use amadeus::{AmadeusClient, AmadeusConfig};
pub use search::{SearchOrchestrator, SearchStrategy, StrategyOutcome};
pub use stripe::StripeGateway;
pub use token_cache::{AmadeusTokenCache, InMemoryTokenStore};

/// Every provider call caps its result set regardless of provider-side
/// limit parameters, to bound response size and processing cost.
pub const RESULT_LIMIT: usize = 10;
