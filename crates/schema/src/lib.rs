//! Structural schema validation for values crossing the RPC boundary.
//!
//! A schema is a small type algebra over JSON values:
//!
//! ```text
//! SchemaEntry := NUMBER | STRING | BOOL | ANY | OBJECT | ARRAY
//!              | { type, isOptional?, allowNull?, entries?, extraKeys?, items? }
//!              | [SchemaEntry, ...]            (union, first match wins)
//! ```
//!
//! Validation is permissive by default: an `OBJECT` without `entries` or
//! `extraKeys` accepts any object, and an `ARRAY` without `items` accepts any
//! contents. Unknown keys are rejected only when `entries` is declared.
//!
//! Values are `serde_json::Value`. A value that is not there at all (a missing
//! trailing argument, a handler that returned nothing) is `None`; an explicit
//! JSON `null` is `Some(Value::Null)`.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use sigrpc_schema::{validate, validate_array, Descriptor, SchemaEntry, SchemaType};
//!
//! let player = Descriptor::new(SchemaType::Object)
//!     .entry("name", SchemaType::String)
//!     .entry("health", Descriptor::new(SchemaType::Number).optional())
//!     .into();
//!
//! assert!(validate(&player, Some(&json!({ "name": "Steve" }))).is_ok());
//! assert!(validate(&player, Some(&json!({ "name": "Steve", "hacked": true }))).is_err());
//!
//! let arguments = [SchemaEntry::string(), SchemaEntry::number()];
//! assert!(validate_array(&arguments, &[json!("foo"), json!(1), json!("extra")]).is_ok());
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

mod entry;
mod error;
mod validate;

pub use entry::{Descriptor, Normalized, SchemaEntry, SchemaType};
pub use error::{ValidationError, ValidationResult};
pub use validate::{validate, validate_array};
