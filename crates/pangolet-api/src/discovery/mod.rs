pub mod client;
pub mod types;

pub use client::DiscoveryClient;
pub use types::{
    DiscoverEndpoint, DiscoverParams, DiscoverResponse, Genre, ImageKind, MediaInfo, MediaKind,
    MediaRequest, MediaResult, MediaStatus, resolve_image,
};
