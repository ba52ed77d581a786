pub mod app_config;
pub mod database;
pub mod redis_repo;
pub mod events;
pub mod memory_repo;
pub mod flight_repo;
pub mod booking_repo;
pub mod user_repo;
pub mod manual_repo;

pub use redis_repo::RedisClient;
pub use events::{EventProducer, KafkaReceiptNotifier};
pub use memory_repo::InMemoryStore;
pub use flight_repo::PostgresFlightRepository;
pub use booking_repo::PostgresBookingRepository;
pub use user_repo::PostgresUserRepository;
pub use manual_repo::PostgresManualRepository;
