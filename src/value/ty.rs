use std::any::TypeId;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Type constructors for the configuration language's closed value model.
///
/// Types are cheap to clone; compound constructors share their interior
/// through `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
	/// Boolean scalar.
	Bool,
	/// Numeric scalar, including arbitrary-precision integers.
	Number,
	/// Textual scalar.
	String,
	/// Placeholder satisfied only by values that are already typed.
	Dynamic,
	/// Ordered homogeneous sequence.
	List(Arc<Type>),
	/// String-keyed homogeneous mapping.
	Map(Arc<Type>),
	/// Unordered homogeneous collection without duplicates.
	Set(Arc<Type>),
	/// Closed attribute set with a declared type per attribute.
	Object(Arc<BTreeMap<String, Type>>),
	/// Fixed-arity sequence with a declared type per position.
	Tuple(Arc<[Type]>),
	/// Opaque native payload carried by reference.
	Capsule(CapsuleType),
}

/// Identity of a capsule's encapsulated native payload type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapsuleType {
	name: &'static str,
	payload: TypeId,
}

impl CapsuleType {
	/// Declare a capsule over the native payload type `T`.
	pub fn of<T: 'static>(name: &'static str) -> CapsuleType {
		CapsuleType {
			name,
			payload: TypeId::of::<T>(),
		}
	}

	/// Display name of the capsule.
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Type identity of the encapsulated payload.
	pub fn payload_id(&self) -> TypeId {
		self.payload
	}
}

impl Type {
	/// List type with the given element type.
	pub fn list(element: Type) -> Type {
		Type::List(Arc::new(element))
	}

	/// Map type with the given element type.
	pub fn map(element: Type) -> Type {
		Type::Map(Arc::new(element))
	}

	/// Set type with the given element type.
	pub fn set(element: Type) -> Type {
		Type::Set(Arc::new(element))
	}

	/// Object type with the given attribute types.
	pub fn object<I, S>(attrs: I) -> Type
	where
		I: IntoIterator<Item = (S, Type)>,
		S: Into<String>,
	{
		Type::Object(Arc::new(attrs.into_iter().map(|(name, ty)| (name.into(), ty)).collect()))
	}

	/// Tuple type with the given element types in order.
	pub fn tuple<I>(elements: I) -> Type
	where
		I: IntoIterator<Item = Type>,
	{
		Type::Tuple(elements.into_iter().collect())
	}

	/// Capsule type over the native payload type `T`.
	pub fn capsule<T: 'static>(name: &'static str) -> Type {
		Type::Capsule(CapsuleType::of::<T>(name))
	}

	/// Element type of a list, map, or set constructor.
	pub fn element_type(&self) -> Option<&Type> {
		match self {
			Type::List(element) | Type::Map(element) | Type::Set(element) => Some(element),
			_ => None,
		}
	}

	/// Declared attribute types of an object constructor.
	pub fn attribute_types(&self) -> Option<&BTreeMap<String, Type>> {
		match self {
			Type::Object(attrs) => Some(attrs),
			_ => None,
		}
	}

	/// Declared element types of a tuple constructor.
	pub fn tuple_element_types(&self) -> Option<&[Type]> {
		match self {
			Type::Tuple(elements) => Some(elements),
			_ => None,
		}
	}
}

impl fmt::Display for Type {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Type::Bool => f.write_str("bool"),
			Type::Number => f.write_str("number"),
			Type::String => f.write_str("string"),
			Type::Dynamic => f.write_str("dynamic"),
			Type::List(element) => write!(f, "list({element})"),
			Type::Map(element) => write!(f, "map({element})"),
			Type::Set(element) => write!(f, "set({element})"),
			Type::Object(attrs) => {
				f.write_str("object({")?;
				for (position, (name, ty)) in attrs.iter().enumerate() {
					if position > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{name}: {ty}")?;
				}
				f.write_str("})")
			}
			Type::Tuple(elements) => {
				f.write_str("tuple(")?;
				for (position, ty) in elements.iter().enumerate() {
					if position > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{ty}")?;
				}
				f.write_str(")")
			}
			Type::Capsule(capsule) => write!(f, "capsule({})", capsule.name()),
		}
	}
}
