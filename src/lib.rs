pub mod addr;
pub mod client;
pub mod config;
pub mod handler;
pub mod logger;
pub mod request;
pub mod resources;
pub mod response;
pub mod server;
pub mod stats;

pub use config::ServerConfig;
pub use logger::Logger;
pub use request::{ParseError, Request};
pub use resources::{normalize_target, ResourceError, StaticFiles};
pub use response::{Response, Status};
pub use server::{start, Server};
pub use stats::ConnectionStats;
