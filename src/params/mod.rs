//! Parameter declarations.
//!
//! A handler declares its inputs as a [`Signature`]: an ordered list of
//! [`Arg`]s, each with a [`ParamType`] and an [`ArgDefault`] slot. The slot
//! decides where the value is read from:
//!
//! - [`ArgDefault::Param`] names the source explicitly (path, query, header,
//!   body, form, URL-encoded form or file);
//! - a plain [`ArgDefault::Value`] or [`ArgDefault::Required`] means query,
//!   unless the route rule has a placeholder with the same name;
//! - [`ArgDefault::Depends`] flattens the arguments of another signature or
//!   model into the endpoint.

mod arg;
mod field;
mod model;
mod types;

pub use arg::{Arg, ArgDefault, Dependency, Depends, Signature};
pub use field::{FieldBuilder, FieldInfo, Param};
pub use model::{Model, ModelField, ModelSchema};
pub use types::{EnumType, ParamEnum, ParamSource, ParamType};
