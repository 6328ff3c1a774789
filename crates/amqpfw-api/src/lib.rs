// amqpfw-api: Async Rust client for the broker-hosting firewall API

pub mod client;
pub mod error;
pub mod firewall;
pub mod retry;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use error::Error;
pub use firewall::FirewallApi;
pub use retry::{RetryPolicy, Retrying};
pub use transport::{TlsMode, TransportConfig};
pub use types::RuleParams;
