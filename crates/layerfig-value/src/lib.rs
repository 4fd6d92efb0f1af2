//! Configuration tree for layerfig.
//!
//! Every stage of the resolution pipeline (override unification, override
//! application, template evaluation) works on the same generic tree. Only the
//! final construction step knows about the application's typed schema.
//!
//! # Key Types
//!
//! - [`ConfigValue`]: a scalar, an ordered sequence, or an ordered string-keyed mapping
//! - [`ConfigMap`]: the mapping type (insertion order preserved)
//! - [`ConfigPath`]: a location inside a tree, rendered as `root.a.list[2]` in errors
//!
//! # Example
//!
//! ```rust
//! use layerfig_value::ConfigValue;
//!
//! let tree = ConfigValue::from(serde_json::json!({
//!     "server": { "port": 8080, "hosts": ["a", "b"] }
//! }));
//!
//! assert_eq!(tree.pointer(&["server", "port"]), Some(&ConfigValue::Integer(8080)));
//! ```

mod convert;
mod path;
mod serialize;
mod value;

pub use convert::ValueError;
pub use path::ConfigPath;
pub use value::{ConfigMap, ConfigValue};
