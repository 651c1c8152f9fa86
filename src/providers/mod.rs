pub mod client;
pub mod registry;

pub use client::{ClientSettings, FetchMode, FreshnessWindows, ProviderClient};
pub use registry::{ProviderConfig, ProviderRegistry, RequestFamily, UpcomingStyle};
