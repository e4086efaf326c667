use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::BuildHasher;
use std::sync::Arc;

use num_bigint::BigInt;

use crate::value::{Handle, Tag, Value};

/// Closed classification of a native runtime value.
///
/// [`Reflect`] implementations produce exactly one of these shapes; the
/// encoder dispatches on the classification instead of on runtime type
/// tests, so the set of accepted native types stays open while the set of
/// shapes stays closed.
pub enum Native<'a> {
	/// Scalar payload.
	Scalar(Scalar<'a>),
	/// Value already inhabiting the typed value model.
	Typed(&'a Value),
	/// One level of pointer/optional indirection; `None` when empty.
	Indirect(Option<&'a dyn Reflect>),
	/// Ordered, index-addressable sequence.
	Sequence(&'a dyn Sequence),
	/// Keyed mapping.
	Mapping(&'a dyn Mapping),
	/// Structured record with declared attribute tags.
	Record(&'a dyn Record),
	/// Native set container exposing unordered member values.
	Set(&'a dyn SetValues),
	/// Opaque capsule payload handle.
	Handle(&'a Handle),
}

/// Scalar payload classifications.
#[derive(Debug, Clone, Copy)]
pub enum Scalar<'a> {
	/// Boolean.
	Bool(bool),
	/// Signed integer.
	Int(i64),
	/// Unsigned integer.
	Uint(u64),
	/// Floating point.
	Float(f64),
	/// Arbitrary-precision integer.
	Big(&'a BigInt),
	/// Text.
	Str(&'a str),
}

impl Native<'_> {
	/// Diagnostic name of the classified kind.
	pub fn kind(&self) -> &'static str {
		match self {
			Native::Scalar(Scalar::Bool(_)) => "bool",
			Native::Scalar(Scalar::Int(_)) => "integer",
			Native::Scalar(Scalar::Uint(_)) => "unsigned integer",
			Native::Scalar(Scalar::Float(_)) => "float",
			Native::Scalar(Scalar::Big(_)) => "big integer",
			Native::Scalar(Scalar::Str(_)) => "string",
			Native::Typed(_) => "typed value",
			Native::Indirect(_) => "indirection",
			Native::Sequence(_) => "sequence",
			Native::Mapping(_) => "mapping",
			Native::Record(_) => "record",
			Native::Set(_) => "set",
			Native::Handle(_) => "handle",
		}
	}
}

/// Capability to classify a native value for encoding.
///
/// Any type can opt into encoding by implementing this trait; the standard
/// scalars, containers, smart pointers, and `serde_json::Value` are covered
/// out of the box.
pub trait Reflect {
	/// Classify this value into the closed native shape set.
	fn reflect(&self) -> Native<'_>;
}

/// Ordered, index-addressable native sequence.
pub trait Sequence {
	/// Number of elements.
	fn len(&self) -> usize;

	/// Whether the sequence has no elements.
	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Borrow the element at `index`; `index` must be below [`Sequence::len`].
	fn get(&self, index: usize) -> &dyn Reflect;
}

/// Key kind declared by a native mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
	/// String-like keys, the only encodable kind.
	Str,
	/// Any other key kind, named for diagnostics.
	Other(&'static str),
}

/// Key type usable in a native mapping.
///
/// Only string-like kinds encode; the others exist so that a mapping with
/// an unsupported key type classifies as a mapping and fails with a precise
/// key-kind diagnostic instead of a generic shape mismatch.
pub trait MapKey {
	/// Kind reported to the encoder.
	const KIND: KeyKind;

	/// Borrow the key as text when the kind is string-like.
	fn as_str(&self) -> Option<&str>;
}

/// Keyed native mapping.
pub trait Mapping {
	/// Declared key kind.
	fn key_kind(&self) -> KeyKind;

	/// Number of entries.
	fn len(&self) -> usize;

	/// Whether the mapping has no entries.
	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Borrow the value stored under a string key.
	fn get(&self, key: &str) -> Option<&dyn Reflect>;

	/// Snapshot of the entries; mappings with non-string key kinds return
	/// no entries.
	fn entries(&self) -> Vec<(&str, &dyn Reflect)>;
}

/// Structured record with declared attribute tags and positional fields.
pub trait Record {
	/// Identity of the record type, used to key the attribute-table cache.
	fn type_id(&self) -> TypeId;

	/// Diagnostic name of the record type.
	fn type_name(&self) -> &'static str;

	/// Declared attribute tags in field order.
	fn tags(&self) -> &'static [Tag];

	/// Number of declared fields.
	fn field_count(&self) -> usize {
		self.tags().len()
	}

	/// Borrow the field at a declared position; `index` must be below
	/// [`Record::field_count`].
	fn field(&self, index: usize) -> &dyn Reflect;
}

/// Native set container exposing unordered member values.
pub trait SetValues {
	/// Number of members.
	fn len(&self) -> usize;

	/// Whether the set has no members.
	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Snapshot of the member values.
	fn values(&self) -> Vec<&dyn Reflect>;
}

impl Reflect for bool {
	fn reflect(&self) -> Native<'_> {
		Native::Scalar(Scalar::Bool(*self))
	}
}

impl Reflect for i8 {
	fn reflect(&self) -> Native<'_> {
		Native::Scalar(Scalar::Int(i64::from(*self)))
	}
}

impl Reflect for i16 {
	fn reflect(&self) -> Native<'_> {
		Native::Scalar(Scalar::Int(i64::from(*self)))
	}
}

impl Reflect for i32 {
	fn reflect(&self) -> Native<'_> {
		Native::Scalar(Scalar::Int(i64::from(*self)))
	}
}

impl Reflect for i64 {
	fn reflect(&self) -> Native<'_> {
		Native::Scalar(Scalar::Int(*self))
	}
}

impl Reflect for isize {
	fn reflect(&self) -> Native<'_> {
		Native::Scalar(Scalar::Int(*self as i64))
	}
}

impl Reflect for u8 {
	fn reflect(&self) -> Native<'_> {
		Native::Scalar(Scalar::Uint(u64::from(*self)))
	}
}

impl Reflect for u16 {
	fn reflect(&self) -> Native<'_> {
		Native::Scalar(Scalar::Uint(u64::from(*self)))
	}
}

impl Reflect for u32 {
	fn reflect(&self) -> Native<'_> {
		Native::Scalar(Scalar::Uint(u64::from(*self)))
	}
}

impl Reflect for u64 {
	fn reflect(&self) -> Native<'_> {
		Native::Scalar(Scalar::Uint(*self))
	}
}

impl Reflect for usize {
	fn reflect(&self) -> Native<'_> {
		Native::Scalar(Scalar::Uint(*self as u64))
	}
}

impl Reflect for f32 {
	fn reflect(&self) -> Native<'_> {
		Native::Scalar(Scalar::Float(f64::from(*self)))
	}
}

impl Reflect for f64 {
	fn reflect(&self) -> Native<'_> {
		Native::Scalar(Scalar::Float(*self))
	}
}

impl Reflect for &str {
	fn reflect(&self) -> Native<'_> {
		Native::Scalar(Scalar::Str(*self))
	}
}

impl Reflect for String {
	fn reflect(&self) -> Native<'_> {
		Native::Scalar(Scalar::Str(self))
	}
}

impl Reflect for BigInt {
	fn reflect(&self) -> Native<'_> {
		Native::Scalar(Scalar::Big(self))
	}
}

impl Reflect for Value {
	fn reflect(&self) -> Native<'_> {
		Native::Typed(self)
	}
}

impl Reflect for Handle {
	fn reflect(&self) -> Native<'_> {
		Native::Handle(self)
	}
}

impl<T: Reflect> Reflect for &T {
	fn reflect(&self) -> Native<'_> {
		Native::Indirect(Some(*self as &dyn Reflect))
	}
}

impl<T: Reflect> Reflect for Option<T> {
	fn reflect(&self) -> Native<'_> {
		Native::Indirect(self.as_ref().map(|inner| inner as &dyn Reflect))
	}
}

impl<T: Reflect> Reflect for Box<T> {
	fn reflect(&self) -> Native<'_> {
		Native::Indirect(Some(self.as_ref() as &dyn Reflect))
	}
}

impl<T: Reflect> Reflect for Arc<T> {
	fn reflect(&self) -> Native<'_> {
		Native::Indirect(Some(self.as_ref() as &dyn Reflect))
	}
}

impl<T: Reflect> Sequence for Vec<T> {
	fn len(&self) -> usize {
		self.as_slice().len()
	}

	fn get(&self, index: usize) -> &dyn Reflect {
		&self[index]
	}
}

impl<T: Reflect> Reflect for Vec<T> {
	fn reflect(&self) -> Native<'_> {
		Native::Sequence(self)
	}
}

impl<T: Reflect, const N: usize> Sequence for [T; N] {
	fn len(&self) -> usize {
		N
	}

	fn get(&self, index: usize) -> &dyn Reflect {
		&self[index]
	}
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
	fn reflect(&self) -> Native<'_> {
		Native::Sequence(self)
	}
}

impl MapKey for String {
	const KIND: KeyKind = KeyKind::Str;

	fn as_str(&self) -> Option<&str> {
		Some(self)
	}
}

impl MapKey for Box<str> {
	const KIND: KeyKind = KeyKind::Str;

	fn as_str(&self) -> Option<&str> {
		Some(self)
	}
}

impl MapKey for Arc<str> {
	const KIND: KeyKind = KeyKind::Str;

	fn as_str(&self) -> Option<&str> {
		Some(self)
	}
}

impl MapKey for bool {
	const KIND: KeyKind = KeyKind::Other("bool");

	fn as_str(&self) -> Option<&str> {
		None
	}
}

impl MapKey for char {
	const KIND: KeyKind = KeyKind::Other("char");

	fn as_str(&self) -> Option<&str> {
		None
	}
}

impl MapKey for i32 {
	const KIND: KeyKind = KeyKind::Other("i32");

	fn as_str(&self) -> Option<&str> {
		None
	}
}

impl MapKey for i64 {
	const KIND: KeyKind = KeyKind::Other("i64");

	fn as_str(&self) -> Option<&str> {
		None
	}
}

impl MapKey for u32 {
	const KIND: KeyKind = KeyKind::Other("u32");

	fn as_str(&self) -> Option<&str> {
		None
	}
}

impl MapKey for u64 {
	const KIND: KeyKind = KeyKind::Other("u64");

	fn as_str(&self) -> Option<&str> {
		None
	}
}

impl<K: MapKey, V: Reflect, S: BuildHasher> Mapping for HashMap<K, V, S> {
	fn key_kind(&self) -> KeyKind {
		K::KIND
	}

	fn len(&self) -> usize {
		HashMap::len(self)
	}

	fn get(&self, key: &str) -> Option<&dyn Reflect> {
		self.iter()
			.find(|(candidate, _)| candidate.as_str() == Some(key))
			.map(|(_, value)| value as &dyn Reflect)
	}

	fn entries(&self) -> Vec<(&str, &dyn Reflect)> {
		self.iter()
			.filter_map(|(key, value)| Some((key.as_str()?, value as &dyn Reflect)))
			.collect()
	}
}

impl<K: MapKey, V: Reflect, S: BuildHasher> Reflect for HashMap<K, V, S> {
	fn reflect(&self) -> Native<'_> {
		Native::Mapping(self)
	}
}

impl<K: MapKey, V: Reflect> Mapping for BTreeMap<K, V> {
	fn key_kind(&self) -> KeyKind {
		K::KIND
	}

	fn len(&self) -> usize {
		BTreeMap::len(self)
	}

	fn get(&self, key: &str) -> Option<&dyn Reflect> {
		self.iter()
			.find(|(candidate, _)| candidate.as_str() == Some(key))
			.map(|(_, value)| value as &dyn Reflect)
	}

	fn entries(&self) -> Vec<(&str, &dyn Reflect)> {
		self.iter()
			.filter_map(|(key, value)| Some((key.as_str()?, value as &dyn Reflect)))
			.collect()
	}
}

impl<K: MapKey, V: Reflect> Reflect for BTreeMap<K, V> {
	fn reflect(&self) -> Native<'_> {
		Native::Mapping(self)
	}
}

impl<T: Reflect, S: BuildHasher> SetValues for HashSet<T, S> {
	fn len(&self) -> usize {
		HashSet::len(self)
	}

	fn values(&self) -> Vec<&dyn Reflect> {
		self.iter().map(|member| member as &dyn Reflect).collect()
	}
}

impl<T: Reflect, S: BuildHasher> Reflect for HashSet<T, S> {
	fn reflect(&self) -> Native<'_> {
		Native::Set(self)
	}
}

impl<T: Reflect> SetValues for BTreeSet<T> {
	fn len(&self) -> usize {
		BTreeSet::len(self)
	}

	fn values(&self) -> Vec<&dyn Reflect> {
		self.iter().map(|member| member as &dyn Reflect).collect()
	}
}

impl<T: Reflect> Reflect for BTreeSet<T> {
	fn reflect(&self) -> Native<'_> {
		Native::Set(self)
	}
}

impl Reflect for serde_json::Value {
	fn reflect(&self) -> Native<'_> {
		match self {
			serde_json::Value::Null => Native::Indirect(None),
			serde_json::Value::Bool(value) => Native::Scalar(Scalar::Bool(*value)),
			serde_json::Value::Number(number) => {
				if let Some(value) = number.as_i64() {
					Native::Scalar(Scalar::Int(value))
				} else if let Some(value) = number.as_u64() {
					Native::Scalar(Scalar::Uint(value))
				} else {
					Native::Scalar(Scalar::Float(number.as_f64().unwrap_or(f64::NAN)))
				}
			}
			serde_json::Value::String(text) => Native::Scalar(Scalar::Str(text)),
			serde_json::Value::Array(items) => Native::Sequence(items),
			serde_json::Value::Object(entries) => Native::Mapping(entries),
		}
	}
}

impl Mapping for serde_json::Map<String, serde_json::Value> {
	fn key_kind(&self) -> KeyKind {
		KeyKind::Str
	}

	fn len(&self) -> usize {
		serde_json::Map::len(self)
	}

	fn get(&self, key: &str) -> Option<&dyn Reflect> {
		serde_json::Map::get(self, key).map(|value| value as &dyn Reflect)
	}

	fn entries(&self) -> Vec<(&str, &dyn Reflect)> {
		self.iter().map(|(key, value)| (key.as_str(), value as &dyn Reflect)).collect()
	}
}
