//! Gateway configuration: schema, discovery and loading.
//!
//! Config files may be TOML, YAML or JSON and may reference environment
//! variables as `${NAME}` or `${NAME:-fallback}`.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{clear_config_dir, discover_and_load, load_config, set_config_dir},
    schema::{GatewayConfig, ImgateConfig, RoutingConfig},
};
