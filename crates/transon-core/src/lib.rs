//! Declarative JSON-to-JSON transformation
//!
//! A template is a JSON document. Maps carrying the marker key (`"$"` by
//! default) are rules evaluated against input data; everything else is
//! copied into the output as written.
//!
//! ```
//! use serde_json::json;
//! use transon_core::Transformer;
//!
//! let template = json!({
//!     "names": {"$": "map", "item": {"$": "attr", "name": "name"}}
//! });
//! let transformer = Transformer::new(&template).unwrap();
//! let output = transformer.transform(&json!([{"name": "Ada"}, {"name": "Alan"}])).unwrap();
//! assert_eq!(output, json!({"names": ["Ada", "Alan"]}));
//! ```

// Core modules
pub mod config;
pub mod error;
pub mod output;
pub mod registry;
pub mod template;
pub mod transformer;
pub mod value;

mod evaluator;

// Re-export commonly used types
pub use config::TransformOptions;
pub use error::{ErrorKind, Result, TransformError};
pub use output::{NoContent, Output, NO_CONTENT};
pub use registry::{Registry, TemplateLoader};
pub use template::{RuleKind, Template, TemplatePath};
pub use transformer::{transform, Transformer};
pub use value::Value;
