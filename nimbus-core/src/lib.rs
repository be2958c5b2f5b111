pub mod builder;
pub mod config;
pub mod layers;
pub mod registry;

pub use builder::{ClientApp, ClientAppBuilder};
pub use config::{AppConfig, ConfigError, ConfigValue, FromConfigValue};
pub use layers::init_tracing;
pub use registry::{Lifetime, ServiceError, ServiceProvider, ServiceRegistry};

pub mod prelude {
    //! Re-exports of the most commonly used core types.
    pub use crate::{AppConfig, ClientApp, ClientAppBuilder, ServiceProvider, ServiceRegistry};
}
