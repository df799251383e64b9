//! Infrastructure layer: storage adapters behind the domain's store traits.
//!
//! Only in-memory adapters ship today. They are process-local and lose their
//! contents on restart, which suits tests, demos and single-node dev setups.

pub mod store;

pub use store::{InMemoryAttachmentStore, InMemoryIssueStore, InMemoryUserStore};
