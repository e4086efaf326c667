use std::collections::BTreeMap;
use std::sync::Arc;

use crate::value::{
	CapsuleType, EncodeCause, KeyKind, Mapping, Native, Path, PathStep, Record, Reflect, Result, Scalar, Sequence,
	SetValues, Type, Value, attributes_of, convert,
};

/// Encode a native value into a typed value conforming to `ty`.
///
/// The target type drives the conversion; the native value's shape is never
/// used to infer structure, except under [`Type::Dynamic`] where the input
/// must already be a typed value. Absent natives (empty `Option` chains at
/// any depth) encode to the typed null of the target. The first failure
/// aborts the whole call with the structural path at which it occurred; no
/// partial value is ever produced.
pub fn encode(value: &dyn Reflect, ty: &Type) -> Result<Value> {
	let mut path = Path::new();
	encode_at(value, ty, &mut path)
}

fn encode_at(value: &dyn Reflect, ty: &Type, path: &mut Path) -> Result<Value> {
	let Some(native) = unwrap_indirection(value) else {
		return Ok(Value::null(ty.clone()));
	};

	// Already-typed inputs bypass native dispatch entirely and go through
	// the value model's own conversion rules, whatever the target is.
	if let Native::Typed(typed) = native {
		return convert(typed, ty).map_err(|err| path.error(EncodeCause::Convert(err)));
	}

	match ty {
		Type::Bool => encode_bool(native, path),
		Type::Number => encode_number(native, path),
		Type::String => encode_string(native, path),
		Type::Dynamic => Err(path.error(EncodeCause::DynamicNotTyped { kind: native.kind() })),
		Type::List(element) => encode_list(native, element.as_ref(), path),
		Type::Map(element) => encode_map(native, element.as_ref(), path),
		Type::Set(element) => encode_set(native, element.as_ref(), path),
		Type::Object(attrs) => encode_object(native, attrs.as_ref(), path),
		Type::Tuple(elements) => encode_tuple(native, elements.as_ref(), path),
		Type::Capsule(capsule) => encode_capsule(native, capsule, path),
	}
}

/// Step through indirection layers until a concrete classification or an
/// empty layer. Depth is bounded by the static nesting of the native type,
/// so the loop always terminates.
fn unwrap_indirection(value: &dyn Reflect) -> Option<Native<'_>> {
	let mut current = value;
	loop {
		match current.reflect() {
			Native::Indirect(Some(inner)) => current = inner,
			Native::Indirect(None) => return None,
			other => return Some(other),
		}
	}
}

fn encode_bool(native: Native<'_>, path: &mut Path) -> Result<Value> {
	match native {
		Native::Scalar(Scalar::Bool(value)) => Ok(Value::bool(value)),
		other => Err(path.error(EncodeCause::IncompatibleKind {
			kind: other.kind(),
			target: Type::Bool,
		})),
	}
}

fn encode_number(native: Native<'_>, path: &mut Path) -> Result<Value> {
	match native {
		Native::Scalar(Scalar::Int(value)) => Ok(Value::number(value)),
		Native::Scalar(Scalar::Uint(value)) => Ok(Value::number(value)),
		Native::Scalar(Scalar::Float(value)) => Ok(Value::number(value)),
		// Arbitrary-precision integers are preserved exactly.
		Native::Scalar(Scalar::Big(value)) => Ok(Value::number(value.clone())),
		other => Err(path.error(EncodeCause::IncompatibleKind {
			kind: other.kind(),
			target: Type::Number,
		})),
	}
}

fn encode_string(native: Native<'_>, path: &mut Path) -> Result<Value> {
	match native {
		Native::Scalar(Scalar::Str(value)) => Ok(Value::string(value)),
		other => Err(path.error(EncodeCause::IncompatibleKind {
			kind: other.kind(),
			target: Type::String,
		})),
	}
}

fn encode_list(native: Native<'_>, element: &Type, path: &mut Path) -> Result<Value> {
	let Native::Sequence(sequence) = native else {
		return Err(path.error(EncodeCause::IncompatibleKind {
			kind: native.kind(),
			target: Type::list(element.clone()),
		}));
	};

	let mut values = Vec::with_capacity(sequence.len());
	for index in 0..sequence.len() {
		path.push(PathStep::Index(index));
		let value = encode_at(sequence.get(index), element, path);
		path.pop();
		values.push(value?);
	}

	Ok(Value::list(element.clone(), values))
}

fn encode_map(native: Native<'_>, element: &Type, path: &mut Path) -> Result<Value> {
	let Native::Mapping(mapping) = native else {
		return Err(path.error(EncodeCause::IncompatibleKind {
			kind: native.kind(),
			target: Type::map(element.clone()),
		}));
	};

	if let KeyKind::Other(key_kind) = mapping.key_kind() {
		return Err(path.error(EncodeCause::NonStringKey { key_kind }));
	}

	let mut entries = BTreeMap::new();
	for (key, value) in mapping.entries() {
		path.push(PathStep::Key(key.into()));
		let encoded = encode_at(value, element, path);
		path.pop();
		entries.insert(key.to_owned(), encoded?);
	}

	Ok(Value::map(element.clone(), entries))
}

fn encode_set(native: Native<'_>, element: &Type, path: &mut Path) -> Result<Value> {
	let members: Vec<&dyn Reflect> = match native {
		Native::Sequence(sequence) => (0..sequence.len()).map(|index| sequence.get(index)).collect(),
		Native::Set(set) => set.values(),
		other => {
			return Err(path.error(EncodeCause::IncompatibleKind {
				kind: other.kind(),
				target: Type::set(element.clone()),
			}));
		}
	};

	// Set membership is not index-addressable, so no step is pushed while
	// members encode.
	let mut values = Vec::with_capacity(members.len());
	for member in members {
		values.push(encode_at(member, element, path)?);
	}

	Ok(Value::set(element.clone(), values))
}

fn encode_object(native: Native<'_>, attrs: &BTreeMap<String, Type>, path: &mut Path) -> Result<Value> {
	match native {
		Native::Mapping(mapping) => {
			if let KeyKind::Other(key_kind) = mapping.key_kind() {
				return Err(path.error(EncodeCause::NonStringKey { key_kind }));
			}
			if attrs.is_empty() {
				return Ok(Value::object(BTreeMap::new()));
			}

			let mut values = BTreeMap::new();
			for (name, attr_ty) in attrs {
				path.push(PathStep::Attr(name.as_str().into()));
				let encoded = match mapping.get(name) {
					Some(value) => encode_at(value, attr_ty, path),
					None => Ok(Value::null(attr_ty.clone())),
				};
				path.pop();
				values.insert(name.clone(), encoded?);
			}

			Ok(Value::object(values))
		}
		Native::Record(record) => {
			if attrs.is_empty() {
				return Ok(Value::object(BTreeMap::new()));
			}

			let table = attributes_of(record);
			let mut values = BTreeMap::new();
			for (name, attr_ty) in attrs {
				path.push(PathStep::Attr(name.as_str().into()));
				let encoded = match table.get(name) {
					Some(index) => encode_at(record.field(index), attr_ty, path),
					None => Ok(Value::null(attr_ty.clone())),
				};
				path.pop();
				values.insert(name.clone(), encoded?);
			}

			Ok(Value::object(values))
		}
		other => Err(path.error(EncodeCause::IncompatibleKind {
			kind: other.kind(),
			target: Type::Object(Arc::new(attrs.clone())),
		})),
	}
}

fn encode_tuple(native: Native<'_>, elements: &[Type], path: &mut Path) -> Result<Value> {
	match native {
		Native::Sequence(sequence) => {
			if sequence.len() != elements.len() {
				return Err(path.error(EncodeCause::ArityMismatch {
					have: sequence.len(),
					need: elements.len(),
				}));
			}

			let mut values = Vec::with_capacity(elements.len());
			for (index, element) in elements.iter().enumerate() {
				path.push(PathStep::Index(index));
				let value = encode_at(sequence.get(index), element, path);
				path.pop();
				values.push(value?);
			}

			Ok(Value::tuple(values))
		}
		// Tuple targets are positional; record attribute names are ignored.
		Native::Record(record) => {
			if record.field_count() != elements.len() {
				return Err(path.error(EncodeCause::ArityMismatch {
					have: record.field_count(),
					need: elements.len(),
				}));
			}

			let mut values = Vec::with_capacity(elements.len());
			for (index, element) in elements.iter().enumerate() {
				path.push(PathStep::Index(index));
				let value = encode_at(record.field(index), element, path);
				path.pop();
				values.push(value?);
			}

			Ok(Value::tuple(values))
		}
		other => Err(path.error(EncodeCause::IncompatibleKind {
			kind: other.kind(),
			target: Type::tuple(elements.iter().cloned()),
		})),
	}
}

fn encode_capsule(native: Native<'_>, capsule: &CapsuleType, path: &mut Path) -> Result<Value> {
	let Native::Handle(handle) = native else {
		return Err(path.error(EncodeCause::CapsuleNotHandle {
			kind: native.kind(),
			capsule: Type::Capsule(capsule.clone()),
		}));
	};

	if handle.payload_id() != capsule.payload_id() {
		return Err(path.error(EncodeCause::CapsuleMismatch {
			payload: handle.payload_type_name(),
			capsule: Type::Capsule(capsule.clone()),
		}));
	}

	Ok(Value::capsule(Type::Capsule(capsule.clone()), handle.clone()))
}

#[cfg(test)]
mod tests {
	use std::any::TypeId;
	use std::collections::{BTreeMap, HashMap, HashSet};
	use std::sync::Arc;

	use num_bigint::BigInt;

	use crate::value::{
		EncodeCause, Handle, Native, Number, PathStep, Record, Reflect, Tag, Type, Value, encode,
	};

	struct Target {
		name: String,
		port: u64,
		labels: HashMap<String, String>,
	}

	impl Record for Target {
		fn type_id(&self) -> TypeId {
			TypeId::of::<Target>()
		}

		fn type_name(&self) -> &'static str {
			"Target"
		}

		fn tags(&self) -> &'static [Tag] {
			&[
				Tag { name: "name", index: 0 },
				Tag { name: "port", index: 1 },
				Tag { name: "labels", index: 2 },
			]
		}

		fn field(&self, index: usize) -> &dyn Reflect {
			match index {
				0 => &self.name,
				1 => &self.port,
				_ => &self.labels,
			}
		}
	}

	impl Reflect for Target {
		fn reflect(&self) -> Native<'_> {
			Native::Record(self)
		}
	}

	fn target() -> Target {
		Target {
			name: "node".to_owned(),
			port: 9100,
			labels: HashMap::new(),
		}
	}

	#[test]
	fn scalars_encode_by_kind() {
		assert_eq!(encode(&true, &Type::Bool).unwrap(), Value::bool(true));
		assert_eq!(encode(&42_i32, &Type::Number).unwrap(), Value::number(42));
		assert_eq!(encode(&2.5_f64, &Type::Number).unwrap(), Value::number(2.5));
		assert_eq!(encode(&"up", &Type::String).unwrap(), Value::string("up"));
	}

	#[test]
	fn big_integers_encode_without_loss() {
		let big = BigInt::from(3) << 200;
		let value = encode(&big, &Type::Number).unwrap();
		assert_eq!(value.as_number(), Some(&Number::Big(BigInt::from(3) << 200)));
	}

	#[test]
	fn incompatible_scalar_kinds_are_rejected() {
		let err = encode(&true, &Type::String).unwrap_err();
		assert!(matches!(
			err.cause,
			EncodeCause::IncompatibleKind { kind: "bool", target: Type::String },
		));
		assert_eq!(err.to_string(), "root: cannot encode bool as string");
	}

	#[test]
	fn absent_indirection_encodes_to_typed_null_at_any_depth() {
		let absent: Option<Option<Option<bool>>> = Some(Some(None));
		let value = encode(&absent, &Type::Bool).unwrap();
		assert!(value.is_null());
		assert_eq!(*value.ty(), Type::Bool);

		let boxed: Option<Box<Vec<i64>>> = None;
		let value = encode(&boxed, &Type::list(Type::Number)).unwrap();
		assert!(value.is_null());
		assert_eq!(*value.ty(), Type::list(Type::Number));
	}

	#[test]
	fn present_indirection_unwraps_to_the_payload() {
		let wrapped: Option<Box<u16>> = Some(Box::new(8080));
		assert_eq!(encode(&wrapped, &Type::Number).unwrap(), Value::number(8080_u16));

		let shared = Arc::new("shared".to_owned());
		assert_eq!(encode(&shared, &Type::String).unwrap(), Value::string("shared"));
	}

	#[test]
	fn lists_preserve_order_and_report_element_paths() {
		let value = encode(&vec![1_i64, 2, 3], &Type::list(Type::Number)).unwrap();
		assert_eq!(
			value.elements(),
			Some(&[Value::number(1_i64), Value::number(2_i64), Value::number(3_i64)][..]),
		);

		let mixed = vec![
			serde_json::json!(1),
			serde_json::json!("two"),
			serde_json::json!(3),
		];
		let err = encode(&mixed, &Type::list(Type::Number)).unwrap_err();
		assert_eq!(err.path.steps(), &[PathStep::Index(1)]);
	}

	#[test]
	fn empty_sequences_encode_to_empty_not_null() {
		let value = encode(&Vec::<i64>::new(), &Type::list(Type::Number)).unwrap();
		assert!(!value.is_null());
		assert_eq!(value.elements(), Some(&[][..]));

		let value = encode(&HashMap::<String, i64>::new(), &Type::map(Type::Number)).unwrap();
		assert!(!value.is_null());
		assert_eq!(value.entries().map(BTreeMap::len), Some(0));
	}

	#[test]
	fn maps_encode_values_and_report_offending_keys() {
		let mut labels = HashMap::new();
		labels.insert("job".to_owned(), "agent".to_owned());
		labels.insert("instance".to_owned(), "local".to_owned());
		let value = encode(&labels, &Type::map(Type::String)).unwrap();
		let entries = value.entries().expect("map entries");
		assert_eq!(entries.get("job").and_then(Value::as_str), Some("agent"));
		assert_eq!(entries.get("instance").and_then(Value::as_str), Some("local"));

		let mut bad = HashMap::new();
		bad.insert("ok".to_owned(), serde_json::json!("text"));
		bad.insert("broken".to_owned(), serde_json::json!(false));
		let err = encode(&bad, &Type::map(Type::String)).unwrap_err();
		assert_eq!(err.path.steps(), &[PathStep::Key("broken".into())]);
	}

	#[test]
	fn non_string_keys_are_rejected_for_maps_and_objects() {
		let mut numbered: HashMap<i64, String> = HashMap::new();
		numbered.insert(1, "one".to_owned());

		let err = encode(&numbered, &Type::map(Type::String)).unwrap_err();
		assert!(matches!(err.cause, EncodeCause::NonStringKey { key_kind: "i64" }));

		let err = encode(&numbered, &Type::object([("a", Type::String)])).unwrap_err();
		assert!(matches!(err.cause, EncodeCause::NonStringKey { key_kind: "i64" }));
	}

	#[test]
	fn sets_deduplicate_from_sequences_and_set_containers() {
		let value = encode(&vec![3_i64, 1, 3, 2, 1], &Type::set(Type::Number)).unwrap();
		assert_eq!(value.elements().map(<[Value]>::len), Some(3));

		let mut native: HashSet<u64> = HashSet::new();
		native.insert(10);
		native.insert(20);
		let value = encode(&native, &Type::set(Type::Number)).unwrap();
		assert_eq!(value.elements().map(<[Value]>::len), Some(2));
	}

	#[test]
	fn set_element_failures_report_the_container_path() {
		let mixed = vec![serde_json::json!(1), serde_json::json!("two")];
		let err = encode(&mixed, &Type::set(Type::Number)).unwrap_err();
		assert!(err.path.steps().is_empty());
	}

	#[test]
	fn objects_from_mappings_fill_missing_attributes_with_null() {
		let mut native = HashMap::new();
		native.insert("a".to_owned(), "x".to_owned());
		let ty = Type::object([("a", Type::String), ("b", Type::Number)]);

		let value = encode(&native, &ty).unwrap();
		assert_eq!(value.attribute("a").and_then(Value::as_str), Some("x"));
		assert!(value.attribute("b").is_some_and(Value::is_null));
		assert_eq!(value.attribute("b").map(Value::ty), Some(&Type::Number));
	}

	#[test]
	fn objects_from_records_resolve_declared_attributes() {
		let ty = Type::object([
			("name", Type::String),
			("port", Type::Number),
			("labels", Type::map(Type::String)),
			("extra", Type::Bool),
		]);

		let value = encode(&target(), &ty).unwrap();
		assert_eq!(value.attribute("name").and_then(Value::as_str), Some("node"));
		assert_eq!(value.attribute("port"), Some(&Value::number(9100_u64)));
		assert!(value.attribute("extra").is_some_and(Value::is_null));
	}

	#[test]
	fn object_attribute_failures_report_attribute_paths() {
		let ty = Type::object([("port", Type::Number)]);
		let mut native = HashMap::new();
		native.insert("port".to_owned(), "not a number".to_owned());

		let err = encode(&native, &ty).unwrap_err();
		assert_eq!(err.path.steps(), &[PathStep::Attr("port".into())]);
	}

	#[test]
	fn zero_attribute_objects_ignore_native_content() {
		let mut native = HashMap::new();
		native.insert("anything".to_owned(), 1_i64);
		let empty = Type::Object(Arc::new(BTreeMap::new()));
		let value = encode(&native, &empty).unwrap();
		assert!(!value.is_null());
		assert_eq!(value.entries().map(BTreeMap::len), Some(0));
	}

	#[test]
	fn tuples_enforce_arity_before_encoding_elements() {
		let err = encode(&vec![1_i64, 2, 3], &Type::tuple([Type::Number, Type::String])).unwrap_err();
		assert!(matches!(err.cause, EncodeCause::ArityMismatch { have: 3, need: 2 }));
		assert!(err.path.steps().is_empty());
	}

	#[test]
	fn tuples_encode_records_positionally() {
		let ty = Type::tuple([Type::String, Type::Number, Type::map(Type::String)]);
		let value = encode(&target(), &ty).unwrap();
		let elements = value.elements().expect("tuple elements");
		assert_eq!(elements[0].as_str(), Some("node"));
		assert_eq!(elements[1], Value::number(9100_u64));
	}

	#[test]
	fn empty_tuples_encode_canonically() {
		let value = encode(&Vec::<i64>::new(), &Type::tuple([])).unwrap();
		assert!(!value.is_null());
		assert_eq!(value.elements(), Some(&[][..]));
	}

	#[test]
	fn capsules_accept_matching_handles_by_reference() {
		struct FileHandle {
			fd: i32,
		}

		let ty = Type::capsule::<FileHandle>("file");
		let payload = Arc::new(FileHandle { fd: 3 });
		let handle = Handle::new(Arc::clone(&payload));

		let value = encode(&handle, &ty).unwrap();
		let stored = value.as_handle().expect("capsule handle");
		assert_eq!(stored.downcast_ref::<FileHandle>().map(|file| file.fd), Some(3));

		let absent: Option<Handle> = None;
		let value = encode(&absent, &ty).unwrap();
		assert!(value.is_null());
		assert_eq!(*value.ty(), ty);
	}

	#[test]
	fn capsules_reject_foreign_payloads_and_non_handles() {
		struct FileHandle;
		struct Socket;

		let ty = Type::capsule::<FileHandle>("file");
		let wrong = Handle::new(Arc::new(Socket));
		let err = encode(&wrong, &ty).unwrap_err();
		assert!(matches!(err.cause, EncodeCause::CapsuleMismatch { .. }));

		let err = encode(&7_i64, &ty).unwrap_err();
		assert!(matches!(err.cause, EncodeCause::CapsuleNotHandle { kind: "integer", .. }));
	}

	#[test]
	fn dynamic_requires_already_typed_input() {
		let typed = Value::string("passthrough");
		assert_eq!(encode(&typed, &Type::Dynamic).unwrap(), typed);

		let err = encode(&1_i64, &Type::Dynamic).unwrap_err();
		assert!(matches!(err.cause, EncodeCause::DynamicNotTyped { kind: "integer" }));
	}

	#[test]
	fn passthrough_converts_through_the_value_model() {
		let tuple = Value::tuple(vec![Value::number(1), Value::number(2)]);
		let value = encode(&tuple, &Type::list(Type::Number)).unwrap();
		assert_eq!(*value.ty(), Type::list(Type::Number));

		let err = encode(&Value::bool(true), &Type::list(Type::Number)).unwrap_err();
		assert!(matches!(err.cause, EncodeCause::Convert(_)));
	}

	#[test]
	fn passthrough_applies_inside_collections() {
		let natives = vec![Value::number(1), Value::number(2)];
		let value = encode(&natives, &Type::list(Type::Number)).unwrap();
		assert_eq!(
			value.elements(),
			Some(&[Value::number(1), Value::number(2)][..]),
		);
	}

	#[test]
	fn json_trees_encode_against_declared_types() {
		let json = serde_json::json!({
			"targets": ["a:9100", "b:9100"],
			"interval": 15,
			"enabled": null,
		});
		let ty = Type::object([
			("targets", Type::list(Type::String)),
			("interval", Type::Number),
			("enabled", Type::Bool),
			("comment", Type::String),
		]);

		let value = encode(&json, &ty).unwrap();
		assert_eq!(
			value.attribute("targets").and_then(Value::elements).map(<[Value]>::len),
			Some(2),
		);
		assert_eq!(value.attribute("interval"), Some(&Value::number(15_i64)));
		assert!(value.attribute("enabled").is_some_and(Value::is_null));
		assert!(value.attribute("comment").is_some_and(Value::is_null));
	}
}
