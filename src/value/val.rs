use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::value::{Number, Type};

/// Reference-counted opaque payload carried by capsule values.
///
/// A handle stores the payload behind `Arc` so the typed value model holds a
/// reference, never a copy. Two handles compare equal only when they share
/// the same allocation.
#[derive(Clone)]
pub struct Handle {
	type_name: &'static str,
	payload_id: TypeId,
	payload: Arc<dyn Any + Send + Sync>,
}

impl Handle {
	/// Wrap a shared payload into a capsule handle.
	pub fn new<T: Any + Send + Sync>(payload: Arc<T>) -> Handle {
		Handle {
			type_name: std::any::type_name::<T>(),
			payload_id: TypeId::of::<T>(),
			payload,
		}
	}

	/// Type identity of the wrapped payload.
	pub fn payload_id(&self) -> TypeId {
		self.payload_id
	}

	/// Diagnostic name of the wrapped payload type.
	pub fn payload_type_name(&self) -> &'static str {
		self.type_name
	}

	/// Borrow the payload when it is a `T`.
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.payload.downcast_ref::<T>()
	}

	/// Clone out the shared payload when it is a `T`.
	pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
		Arc::clone(&self.payload).downcast::<T>().ok()
	}
}

impl PartialEq for Handle {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.payload, &other.payload)
	}
}

impl fmt::Debug for Handle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Handle({})", self.type_name)
	}
}

/// One value in the configuration language's closed type system.
///
/// The runtime representation always matches the type the value claims to
/// inhabit. Null is a distinct per-type state, not the absence of a value:
/// a null list and a null number carry different types and compare unequal.
#[derive(Debug, Clone)]
pub struct Value {
	ty: Type,
	repr: Repr,
}

#[derive(Debug, Clone)]
enum Repr {
	Null,
	Bool(bool),
	Number(Number),
	String(Arc<str>),
	List(Vec<Value>),
	Map(BTreeMap<String, Value>),
	Set(Vec<Value>),
	Object(BTreeMap<String, Value>),
	Tuple(Vec<Value>),
	Capsule(Handle),
}

impl Value {
	/// Null value of the given type.
	pub fn null(ty: Type) -> Value {
		Value { ty, repr: Repr::Null }
	}

	/// Boolean value.
	pub fn bool(value: bool) -> Value {
		Value {
			ty: Type::Bool,
			repr: Repr::Bool(value),
		}
	}

	/// Numeric value.
	pub fn number(value: impl Into<Number>) -> Value {
		Value {
			ty: Type::Number,
			repr: Repr::Number(value.into()),
		}
	}

	/// String value.
	pub fn string(value: impl Into<Arc<str>>) -> Value {
		Value {
			ty: Type::String,
			repr: Repr::String(value.into()),
		}
	}

	/// List of `element`-typed values in order.
	pub fn list(element: Type, values: Vec<Value>) -> Value {
		debug_assert!(values.iter().all(|value| element == Type::Dynamic || *value.ty() == element));
		Value {
			ty: Type::list(element),
			repr: Repr::List(values),
		}
	}

	/// String-keyed map of `element`-typed values.
	pub fn map(element: Type, entries: BTreeMap<String, Value>) -> Value {
		debug_assert!(entries.values().all(|value| element == Type::Dynamic || *value.ty() == element));
		Value {
			ty: Type::map(element),
			repr: Repr::Map(entries),
		}
	}

	/// Set of `element`-typed values; duplicates are dropped by value
	/// equality and member order is not significant.
	pub fn set(element: Type, values: Vec<Value>) -> Value {
		debug_assert!(values.iter().all(|value| element == Type::Dynamic || *value.ty() == element));
		let mut unique: Vec<Value> = Vec::with_capacity(values.len());
		for value in values {
			if !unique.contains(&value) {
				unique.push(value);
			}
		}
		Value {
			ty: Type::set(element),
			repr: Repr::Set(unique),
		}
	}

	/// Object value; the attribute types are derived from the given values.
	pub fn object(attrs: BTreeMap<String, Value>) -> Value {
		let ty = Type::Object(Arc::new(
			attrs.iter().map(|(name, value)| (name.clone(), value.ty().clone())).collect(),
		));
		Value {
			ty,
			repr: Repr::Object(attrs),
		}
	}

	/// Tuple value; the element types are derived from the given values.
	pub fn tuple(values: Vec<Value>) -> Value {
		let ty = Type::tuple(values.iter().map(|value| value.ty().clone()));
		Value {
			ty,
			repr: Repr::Tuple(values),
		}
	}

	/// Capsule value carrying a shared native payload.
	pub fn capsule(ty: Type, handle: Handle) -> Value {
		debug_assert!(matches!(&ty, Type::Capsule(capsule) if capsule.payload_id() == handle.payload_id()));
		Value {
			ty,
			repr: Repr::Capsule(handle),
		}
	}

	/// Declared type of this value.
	pub fn ty(&self) -> &Type {
		&self.ty
	}

	/// Whether this value is the null state of its type.
	pub fn is_null(&self) -> bool {
		matches!(self.repr, Repr::Null)
	}

	/// Borrow the boolean payload.
	pub fn as_bool(&self) -> Option<bool> {
		match &self.repr {
			Repr::Bool(value) => Some(*value),
			_ => None,
		}
	}

	/// Borrow the numeric payload.
	pub fn as_number(&self) -> Option<&Number> {
		match &self.repr {
			Repr::Number(value) => Some(value),
			_ => None,
		}
	}

	/// Borrow the string payload.
	pub fn as_str(&self) -> Option<&str> {
		match &self.repr {
			Repr::String(value) => Some(value),
			_ => None,
		}
	}

	/// Borrow list, set, or tuple elements.
	pub fn elements(&self) -> Option<&[Value]> {
		match &self.repr {
			Repr::List(values) | Repr::Set(values) | Repr::Tuple(values) => Some(values),
			_ => None,
		}
	}

	/// Borrow map or object entries.
	pub fn entries(&self) -> Option<&BTreeMap<String, Value>> {
		match &self.repr {
			Repr::Map(entries) | Repr::Object(entries) => Some(entries),
			_ => None,
		}
	}

	/// Borrow one object attribute by name.
	pub fn attribute(&self, name: &str) -> Option<&Value> {
		match &self.repr {
			Repr::Object(attrs) => attrs.get(name),
			_ => None,
		}
	}

	/// Borrow the capsule handle.
	pub fn as_handle(&self) -> Option<&Handle> {
		match &self.repr {
			Repr::Capsule(handle) => Some(handle),
			_ => None,
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		self.ty == other.ty && self.repr == other.repr
	}
}

impl PartialEq for Repr {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Repr::Null, Repr::Null) => true,
			(Repr::Bool(a), Repr::Bool(b)) => a == b,
			(Repr::Number(a), Repr::Number(b)) => a == b,
			(Repr::String(a), Repr::String(b)) => a == b,
			(Repr::List(a), Repr::List(b)) | (Repr::Tuple(a), Repr::Tuple(b)) => a == b,
			(Repr::Map(a), Repr::Map(b)) | (Repr::Object(a), Repr::Object(b)) => a == b,
			// Sets compare as unordered collections.
			(Repr::Set(a), Repr::Set(b)) => a.len() == b.len() && a.iter().all(|value| b.contains(value)),
			(Repr::Capsule(a), Repr::Capsule(b)) => a == b,
			_ => false,
		}
	}
}
