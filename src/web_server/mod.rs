pub mod handlers;
pub mod server;
pub mod shutdown;


pub use handlers::AppState;
pub use server::WebServer;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
