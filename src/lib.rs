//! # record-builder
//!
//! Derives a mutable builder for an immutable record struct. The builder
//! assembles a value field by field, remembers which fields were explicitly
//! assigned, and produces the record with `build()`.
//!
//! ## Example
//!
//! ```rust
//! use record_builder::RecordBuilder;
//! use std::collections::HashMap;
//!
//! #[derive(RecordBuilder, Debug, Clone, PartialEq)]
//! pub struct Server {
//!     pub host: String,
//!     pub port: u16,
//!     pub motd: Option<String>,
//!     pub aliases: Vec<String>,
//!     pub limits: HashMap<String, u32>,
//! }
//!
//! let builder = Server::builder()
//!     .set_host("localhost".to_string())
//!     .set_port(8080)
//!     .add_aliases("local".to_string())
//!     .put_limits("connections".to_string(), 64);
//!
//! assert!(builder.has_port());
//! assert!(!builder.has_motd());
//! assert_eq!(builder.get_port(), 8080);
//!
//! let server = builder.build().unwrap();
//! assert_eq!(server.aliases, vec!["local"]);
//!
//! // Start again from an existing value.
//! let copy = ServerBuilder::from(server.clone()).build().unwrap();
//! assert_eq!(copy, server);
//! ```
//!
//! Fields that are neither primitives, nullable nor containers must be set
//! before they can be read or built:
//!
//! ```rust
//! use record_builder::{BuilderError, RecordBuilder};
//!
//! #[derive(RecordBuilder, Debug)]
//! struct Account {
//!     owner: String,
//! }
//!
//! let err = Account::builder().build().unwrap_err();
//! assert_eq!(err, BuilderError::missing("Account", "owner"));
//! assert_eq!(err.to_string(), "owner has not been set a value yet");
//! ```

extern crate self as record_builder;

mod error;

pub use error::BuilderError;
pub use record_builder_derive::RecordBuilder;
