use std::sync::Arc;
use tempora_bookings::BookingLister;
use tempora_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub lister: Arc<BookingLister>,
    pub redis: Arc<RedisClient>,
    pub auth: AuthConfig,
}
