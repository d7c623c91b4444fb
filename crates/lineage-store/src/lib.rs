//! # Lineage Store
//!
//! Local content-addressed storage for lineage.
//!
//! Content is stored under its [`HashKey`](lineage_core::HashKey) in a
//! sharded directory tree. Writes go through a uniquely named temp file and
//! an atomic rename, so concurrent writers of the same key never expose a
//! partial file.
//!
//! ## Example
//!
//! ```rust,ignore
//! use lineage_store::{ContentStore, StoreConfig};
//!
//! let store = ContentStore::new(StoreConfig::with_data_dir("./data/content")).await?;
//! let key = store.put_content(b"occurrence.tsv").await?;
//! assert_eq!(store.get(&key).await?.as_deref(), Some(&b"occurrence.tsv"[..]));
//! ```

pub mod container;
pub mod error;
pub mod store;

// Re-exports
pub use container::{find_in_container, is_gzip};
pub use error::StoreError;
pub use store::{ContentStore, StoreConfig, StoredContent};
