use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use tracing::trace;

use crate::value::Record;

/// One declared attribute on a structured record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
	/// Attribute name exposed to the configuration language.
	pub name: &'static str,
	/// Zero-based field position within the record.
	pub index: usize,
}

/// Attribute-name lookup table for one record type.
#[derive(Debug)]
pub struct TagTable {
	tags: &'static [Tag],
	by_name: HashMap<&'static str, usize>,
}

impl TagTable {
	fn build(tags: &'static [Tag]) -> TagTable {
		let by_name = tags.iter().map(|tag| (tag.name, tag.index)).collect();
		TagTable { tags, by_name }
	}

	/// Field position declared for an attribute name.
	pub fn get(&self, name: &str) -> Option<usize> {
		self.by_name.get(name).copied()
	}

	/// Declared tags in field order.
	pub fn tags(&self) -> &'static [Tag] {
		self.tags
	}

	/// Number of declared attributes.
	pub fn len(&self) -> usize {
		self.tags.len()
	}

	/// Whether the record declares no attributes.
	pub fn is_empty(&self) -> bool {
		self.tags.is_empty()
	}
}

fn cache() -> &'static DashMap<TypeId, Arc<TagTable>> {
	static CACHE: OnceLock<DashMap<TypeId, Arc<TagTable>>> = OnceLock::new();
	CACHE.get_or_init(DashMap::new)
}

/// Resolve the attribute table for a record type.
///
/// Tables are built lazily, once per record type identity, and shared
/// through a concurrent cache; the entry shard stays locked during the
/// build so concurrent first lookups of one type do not race.
pub fn attributes_of(record: &dyn Record) -> Arc<TagTable> {
	let entry = cache().entry(record.type_id()).or_insert_with(|| {
		trace!(record = record.type_name(), "building attribute table");
		Arc::new(TagTable::build(record.tags()))
	});
	Arc::clone(entry.value())
}
