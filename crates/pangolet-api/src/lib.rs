// pangolet-api: Async Rust client for the Pangolin gateway, public IP echo, and Seerr discovery

pub mod discovery;
pub mod error;
pub mod gateway;
pub mod public_ip;
pub mod transport;

pub use discovery::DiscoveryClient;
pub use error::Error;
pub use gateway::GatewayClient;
pub use public_ip::PublicIpClient;
pub use transport::{TlsMode, TransportConfig};
