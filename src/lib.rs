pub mod config;
pub mod queue;
pub mod web_server;

// Public API
pub use config::{BrokerConfig, Config, ServerConfig};
pub use queue::{
    create_shared_broker, BoundedKeyQueue, BrokerError, BrokerResult, QueueBroker, QueueKey,
    SharedQueueBroker,
};
pub use web_server::{shutdown_channel, WebServer};
