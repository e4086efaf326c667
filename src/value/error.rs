use thiserror::Error;

use crate::value::{ConvertError, Path, Type};

/// Crate-local result type for encoding operations.
pub type Result<T> = std::result::Result<T, EncodeError>;

/// Error produced while encoding a native value into the typed value model.
///
/// An encoding error means the native structure does not satisfy the
/// declared schema it was paired with. That is a bug in the calling
/// integration, not a condition to report to configuration authors.
#[derive(Debug, Error)]
#[error("{path}: {cause}")]
pub struct EncodeError {
	/// Snapshot of the traversal position where encoding failed.
	pub path: Path,
	/// Failure cause.
	pub cause: EncodeCause,
}

/// Closed set of encoding failure causes.
#[derive(Debug, Error)]
pub enum EncodeCause {
	/// Native kind has no representation under the requested target type.
	#[error("cannot encode {kind} as {target}")]
	IncompatibleKind {
		/// Classified native kind name.
		kind: &'static str,
		/// Requested target type.
		target: Type,
	},
	/// Mapping keys are not strings.
	#[error("cannot encode mapping with {key_kind} keys; keys must be strings")]
	NonStringKey {
		/// Declared native key kind name.
		key_kind: &'static str,
	},
	/// Native element or field count differs from the declared tuple arity.
	#[error("wrong number of elements: have {have}, need {need}")]
	ArityMismatch {
		/// Native element or field count.
		have: usize,
		/// Declared tuple element-type count.
		need: usize,
	},
	/// Handle payload type differs from the capsule's declared type.
	#[error("payload of type {payload} not compatible with {capsule}")]
	CapsuleMismatch {
		/// Native payload type name.
		payload: &'static str,
		/// Declared capsule type.
		capsule: Type,
	},
	/// Capsule target given a native value that is not a shared handle.
	#[error("{capsule} requires a handle payload, got {kind}")]
	CapsuleNotHandle {
		/// Classified native kind name.
		kind: &'static str,
		/// Declared capsule type.
		capsule: Type,
	},
	/// Dynamic target given a native value that is not already typed.
	#[error("cannot encode {kind} dynamically; only typed values are allowed")]
	DynamicNotTyped {
		/// Classified native kind name.
		kind: &'static str,
	},
	/// The value model rejected a passthrough conversion.
	#[error("unsuitable value: {0}")]
	Convert(#[from] ConvertError),
}
