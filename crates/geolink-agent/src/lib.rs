//! GeoLink agent library.
//!
//! Configuration, device identity, session notification, and the
//! simulated fix provider for the agent binary.

pub mod config;
pub mod identity;
pub mod notify;
pub mod sim;

pub use config::{Config, ConfigError, default_config_path};
pub use identity::resolve_device_id;
pub use notify::{LogNotifier, SessionNotifier};
pub use sim::RandomWalkSource;
