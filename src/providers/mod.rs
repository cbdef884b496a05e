pub(crate) mod fallback;
mod provider;
pub(crate) mod push;
mod relay;
mod service;
pub(crate) mod system;

pub use fallback::{FallbackBuilder, FallbackProvider};
pub use provider::{LocationProvider, ProviderRef};
pub use push::PushProvider;
pub use service::{ServiceProvider, ServiceProviderRef};
pub use system::SystemProvider;
