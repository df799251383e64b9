//! `issuetrack-service`: the operation surface transports call into.
//!
//! - `config.rs`: settings from the environment
//! - `tracker.rs`: [`IssueTracker`], one method per operation, token in,
//!   domain value out
//! - `error.rs`: [`ServiceError`] with stable codes and HTTP-style statuses
//! - `bootstrap.rs`: process startup (logging, stores, bootstrap admin)

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod tracker;

pub use bootstrap::{seed_admin, start, start_from_env};
pub use config::{AdminSeed, ConfigError, Settings};
pub use error::ServiceError;
pub use tracker::{IssueTracker, NotificationBus, Stores};
