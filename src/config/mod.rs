mod env_overrides;
pub mod hot_reload;
mod loader;
#[cfg(test)]
pub(crate) mod test_env;
mod types;

pub use hot_reload::ConfigHandle;
pub use types::{BYTES_PER_KB, Config, MonitorConfig, ReliabilityConfig};
