use std::sync::Arc;

use skylane_core::payment::PaymentGateway;
use skylane_providers::airlabs::AirLabsClient;
use skylane_providers::SearchOrchestrator;
use skylane_store::{BookingRepo, DbClient, FlightRepo, RedisClient, UserRepo};

use crate::mailer::MailerHandle;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
    pub refresh_expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbClient>,
    pub redis: Arc<RedisClient>,
    pub users: UserRepo,
    pub flights: FlightRepo,
    pub bookings: BookingRepo,
    pub search: Arc<SearchOrchestrator>,
    pub airports: Option<Arc<AirLabsClient>>,
    pub payments: Arc<dyn PaymentGateway>,
    pub mailer: MailerHandle,
    pub auth: AuthConfig,
    /// Forces every search onto the mock generator (no-API-key setups).
    pub force_mock_search: bool,
    pub stripe_webhook_secret: Option<String>,
    pub stripe_publishable_key: String,
}
