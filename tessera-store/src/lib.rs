pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod events;
pub mod event_repo;
pub mod redis_repo;

pub use booking_repo::PgBookingStore;
pub use database::DbClient;
pub use event_repo::PgEventStore;
pub use events::KafkaNotifier;
pub use redis_repo::RedisClient;
