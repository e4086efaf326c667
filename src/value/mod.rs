mod convert;
mod encode;
mod error;
mod native;
mod number;
mod path;
mod tags;
mod ty;
mod val;

/// Value-model conversion entry point and error.
pub use convert::{ConvertError, convert};
/// Native-to-typed encoding entry point.
pub use encode::encode;
/// Encoding error, cause set, and result alias.
pub use error::{EncodeCause, EncodeError, Result};
/// Native value classification and capability traits.
pub use native::{KeyKind, MapKey, Mapping, Native, Record, Reflect, Scalar, Sequence, SetValues};
/// Numeric scalar representation.
pub use number::Number;
/// Encoding path steps and tracker.
pub use path::{Path, PathStep};
/// Struct-tag resolution table and cache entry point.
pub use tags::{Tag, TagTable, attributes_of};
/// Type constructors for the closed value model.
pub use ty::{CapsuleType, Type};
/// Typed runtime values and capsule payload handles.
pub use val::{Handle, Value};
