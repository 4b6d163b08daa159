//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the typed config item model: what the binder produces and the runtime serves.
//!
//! A [`ConfigItem`] stores its field values in schema order in a [`ConfigValue`] tree. Items are
//! handed around as `Arc<ConfigItem>`: the deduplicating store shares one instance across every
//! specialization that agrees on it, so instance identity (`Arc::ptr_eq`) is meaningful and
//! tested against.
//!
//! [`MetaRef`] is the strongly-typed reference between items. The id half (entry + key) is
//! plain data; the resolved half is a per-instance slot filled after the owning specialization
//! is known. Cloning a value tree RESETS every resolved slot, which is exactly what item
//! duplication needs.

use getset::Getters;
use indexmap::IndexMap;

use std::fmt;
use std::fmt::Display;
use std::sync::{Arc, OnceLock};


//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// Canonical identity of one config item: its entry name and its real (alias-resolved) key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Getters)]
#[getset(get = "pub")]
pub struct ConfigItemId {
    entry: String,
    key: String,
}

/// Identity of one experiment variant, and with it of one patch.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Getters)]
#[getset(get = "pub")]
pub struct ExperimentVariantPair {
    experiment_id: String,
    variant_id: String,
}

/// A strongly-typed reference from one item to another.
#[derive(Debug, Default)]
pub struct MetaRef {

    /// Entry name of the target library.
    target_entry: String,

    /// Key as authored. May be an alias; canonicalization happens when the id is taken.
    raw_key: String,

    /// The instance this reference points at within the owning item's specialization.
    resolved: OnceLock<Arc<ConfigItem>>,
}

/// One typed field value.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),

    /// An enum variant name, validated against the schema at bind time.
    Enum(String),

    /// A time span in microseconds.
    Duration(i64),

    /// A point in time, in microseconds since the unix epoch.
    Instant(i64),
    List(Vec<ConfigValue>),
    Struct(ConfigStruct),
    Ref(MetaRef),

    /// An explicitly skipped collection element.
    Null,
}

/// A nested struct value.
#[derive(Clone, Debug, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct ConfigStruct {
    type_name: String,
    members: IndexMap<String, ConfigValue>,
}

/// One fully-bound config item.
#[derive(Clone, Debug, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct ConfigItem {

    /// Name of this item's struct type.
    type_name: String,

    /// Field values, in schema field order. Absent fields are simply not present.
    values: IndexMap<String, ConfigValue>,
}

/// An ordered keyed library of items of one type.
#[derive(Clone, Debug, Default, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Library {

    /// Name of the entry this library was bound from.
    entry_name: String,

    /// Name of the item struct type.
    item_type: String,

    /// The items, in sheet row order.
    items: IndexMap<String, Arc<ConfigItem>>,

    /// Alias to real key.
    aliases: IndexMap<String, String>,
}

/// A single structure bound from a key-value sheet.
#[derive(Clone, Debug, Default, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct KeyValueStructure {

    /// Name of the entry this structure was bound from.
    entry_name: String,

    /// Name of the struct type.
    type_name: String,

    /// Member values, in schema field order.
    values: IndexMap<String, ConfigValue>,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

impl ConfigItemId {

    /// This function builds an item id.
    pub fn new(entry: &str, key: &str) -> Self {
        Self { entry: entry.to_owned(), key: key.to_owned() }
    }
}

impl Display for ConfigItemId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}[{}]", self.entry, self.key)
    }
}

impl ExperimentVariantPair {

    /// This function builds a variant pair.
    pub fn new(experiment_id: &str, variant_id: &str) -> Self {
        Self { experiment_id: experiment_id.to_owned(), variant_id: variant_id.to_owned() }
    }

    /// This function parses a variant pair from its sheet form, `experiment/variant`.
    ///
    /// A value with no slash is treated as experiment and variant at once, which keeps ad-hoc
    /// single-variant sheets working.
    pub fn parse(value: &str) -> Self {
        match value.split_once('/') {
            Some((experiment_id, variant_id)) => Self::new(experiment_id.trim(), variant_id.trim()),
            None => Self::new(value.trim(), value.trim()),
        }
    }
}

impl Display for ExperimentVariantPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.experiment_id, self.variant_id)
    }
}

impl MetaRef {

    /// This function builds an unresolved reference.
    pub fn new(target_entry: &str, raw_key: &str) -> Self {
        Self { target_entry: target_entry.to_owned(), raw_key: raw_key.to_owned(), resolved: OnceLock::new() }
    }

    /// This function returns the entry name of the target library.
    pub fn target_entry(&self) -> &str {
        &self.target_entry
    }

    /// This function returns the key as authored, which may be an alias.
    pub fn raw_key(&self) -> &str {
        &self.raw_key
    }

    /// This function fills the resolved slot of this reference.
    ///
    /// Resolution happens exactly once per instance; a second call on the same instance means
    /// the duplication pass missed a clone and is a bug.
    pub fn resolve_to(&self, item: Arc<ConfigItem>) -> bool {
        self.resolved.set(item).is_ok()
    }

    /// This function returns the resolved target instance, if resolution already ran.
    pub fn resolved(&self) -> Option<&Arc<ConfigItem>> {
        self.resolved.get()
    }
}

/// Cloning a reference drops its resolution: the clone will live in a different specialization
/// and must be re-resolved there.
impl Clone for MetaRef {
    fn clone(&self) -> Self {
        Self::new(&self.target_entry, &self.raw_key)
    }
}

/// Equality is identity-only. Two references to the same id are equal even when they resolve to
/// different instances in different specializations.
impl PartialEq for MetaRef {
    fn eq(&self, other: &Self) -> bool {
        self.target_entry == other.target_entry && self.raw_key == other.raw_key
    }
}

impl ConfigValue {

    /// This function visits every reference in this value tree.
    pub fn walk_refs<'a>(&'a self, visitor: &mut dyn FnMut(&'a MetaRef)) {
        match self {
            Self::Ref(meta_ref) => visitor(meta_ref),
            Self::List(elements) => for element in elements {
                element.walk_refs(visitor);
            },
            Self::Struct(value) => for member in value.members().values() {
                member.walk_refs(visitor);
            },
            _ => {},
        }
    }
}

impl ConfigStruct {

    /// This function builds a struct value.
    pub fn new(type_name: &str, members: IndexMap<String, ConfigValue>) -> Self {
        Self { type_name: type_name.to_owned(), members }
    }
}

impl ConfigItem {

    /// This function builds an item from its bound values.
    pub fn new(type_name: &str, values: IndexMap<String, ConfigValue>) -> Self {
        Self { type_name: type_name.to_owned(), values }
    }

    /// This function returns the value of the provided field, if bound.
    pub fn value(&self, name: &str) -> Option<&ConfigValue> {
        self.values.get(name)
    }

    /// This function replaces the value of the provided field. Only sound on owned items.
    pub fn set_value(&mut self, name: &str, value: ConfigValue) {
        self.values.insert(name.to_owned(), value);
    }

    /// This function visits every reference held by this item.
    pub fn walk_refs<'a>(&'a self, visitor: &mut dyn FnMut(&'a MetaRef)) {
        for value in self.values.values() {
            value.walk_refs(visitor);
        }
    }
}

impl Library {

    /// This function creates a new empty library.
    pub fn new(entry_name: &str, item_type: &str) -> Self {
        Self { entry_name: entry_name.to_owned(), item_type: item_type.to_owned(), ..Default::default() }
    }

    /// This function inserts an item, returning the previous one if the key already existed.
    pub fn insert(&mut self, key: &str, item: Arc<ConfigItem>) -> Option<Arc<ConfigItem>> {
        self.items.insert(key.to_owned(), item)
    }

    /// This function registers an alias for a real key.
    pub fn insert_alias(&mut self, alias: &str, real_key: &str) {
        self.aliases.insert(alias.to_owned(), real_key.to_owned());
    }

    /// This function resolves a possibly-aliased key to the real key, when the item exists.
    pub fn resolve_key<'a>(&'a self, key: &'a str) -> Option<&'a str> {
        if self.items.contains_key(key) {
            return Some(key);
        }
        self.aliases.get(key).map(String::as_str).filter(|real| self.items.contains_key(*real))
    }

    /// This function returns the item with the provided key, without alias resolution.
    pub fn get(&self, key: &str) -> Option<&Arc<ConfigItem>> {
        self.items.get(key)
    }

    /// This function returns the item a reference key points at, resolving aliases.
    pub fn resolve_ref(&self, key: &str) -> Option<&Arc<ConfigItem>> {
        self.resolve_key(key).and_then(|real| self.items.get(real))
    }

    /// This function returns the amount of items in the library.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// This function returns true if the library has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A fully bound config: every library and key-value structure of one scope.
///
/// This is what the builder produces per variant and what the deduplicating store ingests as
/// baseline.
#[derive(Clone, Debug, Default, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct GameConfig {
    libraries: IndexMap<String, Library>,
    key_values: IndexMap<String, KeyValueStructure>,
}

impl GameConfig {

    /// This function creates a new empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// This function adds a library to the config.
    pub fn insert_library(&mut self, library: Library) {
        self.libraries.insert(library.entry_name().clone(), library);
    }

    /// This function adds a key-value structure to the config.
    pub fn insert_key_value(&mut self, structure: KeyValueStructure) {
        self.key_values.insert(structure.entry_name().clone(), structure);
    }

    /// This function returns the library bound for the provided entry, if any.
    pub fn library(&self, entry_name: &str) -> Option<&Library> {
        self.libraries.get(entry_name)
    }

    /// This function returns the structure bound for the provided entry, if any.
    pub fn key_value(&self, entry_name: &str) -> Option<&KeyValueStructure> {
        self.key_values.get(entry_name)
    }
}

impl KeyValueStructure {

    /// This function builds a structure from its bound values.
    pub fn new(entry_name: &str, type_name: &str, values: IndexMap<String, ConfigValue>) -> Self {
        Self { entry_name: entry_name.to_owned(), type_name: type_name.to_owned(), values }
    }

    /// This function returns the value of the provided member, if bound.
    pub fn value(&self, name: &str) -> Option<&ConfigValue> {
        self.values.get(name)
    }

    /// This function replaces the value of the provided member.
    pub fn set_value(&mut self, name: &str, value: ConfigValue) {
        self.values.insert(name.to_owned(), value);
    }
}
