use std::collections::BTreeMap;

use thiserror::Error;

use crate::value::{Number, Type, Value};

/// Error produced when a typed value cannot be converted to a target type.
#[derive(Debug, Error)]
pub enum ConvertError {
	/// No conversion rule exists between the two types.
	#[error("cannot convert {from} to {to}")]
	Mismatch {
		/// Source value type.
		from: Type,
		/// Requested target type.
		to: Type,
	},
	/// Source and target tuple arities differ.
	#[error("cannot convert tuple of {have} elements to tuple of {need}")]
	TupleArity {
		/// Source tuple arity.
		have: usize,
		/// Target tuple arity.
		need: usize,
	},
	/// A target object attribute is missing from the source object.
	#[error("missing attribute {name} for conversion to {to}")]
	MissingAttribute {
		/// Required attribute name.
		name: String,
		/// Requested target type.
		to: Type,
	},
	/// Text does not parse as the target scalar.
	#[error("cannot parse {text:?} as {to}")]
	Parse {
		/// Offending source text.
		text: String,
		/// Requested target type.
		to: Type,
	},
}

/// Convert a typed value to the target type using the model's compatibility
/// rules.
///
/// The rule set is closed: identity, anything to `dynamic`, null retyping
/// between convertible types, scalar formatting and parsing, element-wise
/// collection conversions, and structural tuple/object conversions. Anything
/// outside it is a [`ConvertError`].
pub fn convert(value: &Value, target: &Type) -> Result<Value, ConvertError> {
	if *target == Type::Dynamic || value.ty() == target {
		return Ok(value.clone());
	}

	if value.is_null() {
		if convertible(value.ty(), target) {
			return Ok(Value::null(target.clone()));
		}
		return Err(mismatch(value, target));
	}

	match target {
		Type::String => match value.ty() {
			Type::Bool => {
				let text = if value.as_bool() == Some(true) { "true" } else { "false" };
				Ok(Value::string(text))
			}
			Type::Number => match value.as_number() {
				Some(number) => Ok(Value::string(number.to_string())),
				None => Err(mismatch(value, target)),
			},
			_ => Err(mismatch(value, target)),
		},
		Type::Number => match value.as_str() {
			Some(text) => match Number::parse(text) {
				Some(number) => Ok(Value::number(number)),
				None => Err(ConvertError::Parse {
					text: text.to_owned(),
					to: target.clone(),
				}),
			},
			None => Err(mismatch(value, target)),
		},
		Type::Bool => match value.as_str() {
			Some("true") => Ok(Value::bool(true)),
			Some("false") => Ok(Value::bool(false)),
			Some(text) => Err(ConvertError::Parse {
				text: text.to_owned(),
				to: target.clone(),
			}),
			None => Err(mismatch(value, target)),
		},
		Type::List(element) => {
			let values = collection_elements(value).ok_or_else(|| mismatch(value, target))?;
			let converted = values.iter().map(|member| convert(member, element)).collect::<Result<Vec<_>, _>>()?;
			Ok(Value::list((**element).clone(), converted))
		}
		Type::Set(element) => {
			let values = collection_elements(value).ok_or_else(|| mismatch(value, target))?;
			let converted = values.iter().map(|member| convert(member, element)).collect::<Result<Vec<_>, _>>()?;
			Ok(Value::set((**element).clone(), converted))
		}
		Type::Map(element) => {
			let entries = match value.ty() {
				Type::Map(_) | Type::Object(_) => value.entries().ok_or_else(|| mismatch(value, target))?,
				_ => return Err(mismatch(value, target)),
			};
			let mut converted = BTreeMap::new();
			for (key, member) in entries {
				converted.insert(key.clone(), convert(member, element)?);
			}
			Ok(Value::map((**element).clone(), converted))
		}
		Type::Tuple(elements) => {
			if value.ty().tuple_element_types().is_none() {
				return Err(mismatch(value, target));
			}
			let values = value.elements().ok_or_else(|| mismatch(value, target))?;
			if values.len() != elements.len() {
				return Err(ConvertError::TupleArity {
					have: values.len(),
					need: elements.len(),
				});
			}
			let converted = values
				.iter()
				.zip(elements.iter())
				.map(|(member, element)| convert(member, element))
				.collect::<Result<Vec<_>, _>>()?;
			Ok(Value::tuple(converted))
		}
		Type::Object(attrs) => {
			if value.ty().attribute_types().is_none() {
				return Err(mismatch(value, target));
			}
			let mut converted = BTreeMap::new();
			for (name, attr_ty) in attrs.iter() {
				let member = value.attribute(name).ok_or_else(|| ConvertError::MissingAttribute {
					name: name.clone(),
					to: target.clone(),
				})?;
				converted.insert(name.clone(), convert(member, attr_ty)?);
			}
			Ok(Value::object(converted))
		}
		// Capsules and non-scalar sources only convert by identity, which
		// was already handled above.
		_ => Err(mismatch(value, target)),
	}
}

/// Whether a conversion rule exists between two types, ignoring
/// value-dependent failures such as unparseable text.
fn convertible(from: &Type, to: &Type) -> bool {
	if from == to || *from == Type::Dynamic || *to == Type::Dynamic {
		return true;
	}
	match (from, to) {
		(Type::Bool | Type::Number, Type::String) => true,
		(Type::String, Type::Number | Type::Bool) => true,
		(Type::List(a) | Type::Set(a), Type::List(b) | Type::Set(b)) => convertible(a, b),
		(Type::Tuple(members), Type::List(b) | Type::Set(b)) => members.iter().all(|member| convertible(member, b)),
		(Type::Map(a), Type::Map(b)) => convertible(a, b),
		(Type::Object(attrs), Type::Map(b)) => attrs.values().all(|attr| convertible(attr, b)),
		(Type::Tuple(a), Type::Tuple(b)) => {
			a.len() == b.len() && a.iter().zip(b.iter()).all(|(from_ty, to_ty)| convertible(from_ty, to_ty))
		}
		(Type::Object(a), Type::Object(b)) => {
			b.iter().all(|(name, to_ty)| a.get(name).is_some_and(|from_ty| convertible(from_ty, to_ty)))
		}
		_ => false,
	}
}

fn mismatch(value: &Value, target: &Type) -> ConvertError {
	ConvertError::Mismatch {
		from: value.ty().clone(),
		to: target.clone(),
	}
}

fn collection_elements(value: &Value) -> Option<&[Value]> {
	match value.ty() {
		Type::List(_) | Type::Set(_) | Type::Tuple(_) => value.elements(),
		_ => None,
	}
}
