//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with all the code to interact with schema registries.
//!
//! The registry is the declarative description of every config entry the engine can build: what
//! kind of entry it is (library or key-value), which struct type its items have, and for each
//! struct the ordered, MetaTag-numbered member list the binary format depends on. Everything
//! downstream (binding, serialization, patching) is driven by this data; there is no reflection
//! and no per-entry generated code.
//!
//! The basic structure of a registry file, in RON:
//! ```ron
//! (
//!     version: 1,
//!     entries: {
//!         "Fruits": (kind: Library, scope: Shared, item_type: "FruitInfo"),
//!     },
//!     structs: {
//!         "FruitInfo": (name: "FruitInfo", version: 1, fields: [
//!             (name: "Id", meta_tag: 1, field_type: String, is_key: true),
//!             (name: "Name", meta_tag: 2, field_type: String, is_key: false),
//!             (name: "Value", meta_tag: 3, field_type: I32, is_key: false),
//!         ]),
//!     },
//!     enums: {},
//! )
//! ```

use getset::Getters;
use indexmap::IndexMap;
use ron::ser::PrettyConfig;
use serde_derive::{Deserialize, Serialize};

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use crate::error::{CfgLibError, Result};

#[cfg(test)] mod schema_test;

/// Current version of the registry file format.
pub const SCHEMA_FILE_VERSION: u32 = 1;

/// Extension used by library and key-value entries inside an archive.
pub const ENTRY_EXTENSION: &str = ".mpc";

/// Extension of the alias table companion of a library entry.
pub const ALIAS_TABLE_SUFFIX: &str = ".AliasTable2.mpc";

/// Legacy alias table companion, mapping real key to aliases. Inverted on read.
pub const LEGACY_ALIAS_TABLE_SUFFIX: &str = ".AliasTable.mpc";

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// The kind of a config entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {

    /// An ordered keyed collection of items of one struct type.
    Library,

    /// A single structure whose members come from a vertical sheet.
    KeyValue,
}

/// Which archive a config entry is delivered in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryScope {

    /// Delivered to both clients and servers.
    Shared,

    /// Server-only.
    Server,
}

/// The declared type of a field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Bool,
    I32,
    I64,
    F32,
    F64,
    String,

    /// An enum value; the name references an [`EnumSchema`].
    Enum(String),

    /// A time span, stored as microseconds.
    Duration,

    /// A point in time, stored as microseconds since the unix epoch.
    Instant,

    /// A sequential collection of the inner type.
    List(Box<FieldType>),

    /// A nested struct; the name references a [`StructSchema`].
    Struct(String),

    /// A reference to an item of the named library entry.
    Ref(String),
}

/// One member of a struct type.
#[derive(Clone, Debug, PartialEq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct FieldSchema {

    /// Name of the field, as written in sheet headers.
    name: String,

    /// The wire number of this field. Never reuse a tag: readers identify members by it.
    meta_tag: u32,

    /// The declared type of the field.
    field_type: FieldType,

    /// If this field is part of the item identity.
    is_key: bool,
}

/// One struct type: a versioned, ordered member list.
#[derive(Clone, Debug, PartialEq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct StructSchema {
    name: String,
    version: u32,
    fields: Vec<FieldSchema>,
}

/// One enum type and its allowed variants.
#[derive(Clone, Debug, PartialEq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct EnumSchema {
    name: String,
    variants: Vec<String>,
}

/// One config entry declaration.
#[derive(Clone, Debug, PartialEq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct EntrySchema {
    name: String,
    kind: EntryKind,
    scope: EntryScope,

    /// Name of the struct type of this entry's items (or of the structure itself, for key-value).
    item_type: String,
}

/// The full registry: every entry, struct and enum the engine knows about.
#[derive(Clone, Debug, Default, PartialEq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct SchemaRegistry {
    version: u32,
    entries: IndexMap<String, EntrySchema>,
    structs: IndexMap<String, StructSchema>,
    enums: IndexMap<String, EnumSchema>,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

impl FieldSchema {

    /// This function creates a new field.
    pub fn new(name: &str, meta_tag: u32, field_type: FieldType, is_key: bool) -> Self {
        Self { name: name.to_owned(), meta_tag, field_type, is_key }
    }
}

impl StructSchema {

    /// This function creates a new struct type.
    pub fn new(name: &str, version: u32, fields: Vec<FieldSchema>) -> Self {
        Self { name: name.to_owned(), version, fields }
    }

    /// This function returns the field with the provided name, if it exists.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// This function returns the field with the provided meta tag, if it exists.
    pub fn field_by_tag(&self, meta_tag: u32) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| *field.meta_tag() == meta_tag)
    }

    /// This function returns the key fields, in declaration order.
    pub fn key_fields(&self) -> Vec<&FieldSchema> {
        self.fields.iter().filter(|field| *field.is_key()).collect()
    }
}

impl EnumSchema {

    /// This function creates a new enum type.
    pub fn new(name: &str, variants: &[&str]) -> Self {
        Self { name: name.to_owned(), variants: variants.iter().map(|variant| (*variant).to_owned()).collect() }
    }
}

impl EntrySchema {

    /// This function creates a new entry declaration.
    pub fn new(name: &str, kind: EntryKind, scope: EntryScope, item_type: &str) -> Self {
        Self { name: name.to_owned(), kind, scope, item_type: item_type.to_owned() }
    }

    /// Name of this entry's payload within its archive.
    pub fn entry_file_name(&self) -> String {
        format!("{}{ENTRY_EXTENSION}", self.name)
    }

    /// Name of this entry's alias table within its archive.
    pub fn alias_table_file_name(&self) -> String {
        format!("{}{ALIAS_TABLE_SUFFIX}", self.name)
    }

    /// Name of this entry's legacy alias table within its archive.
    pub fn legacy_alias_table_file_name(&self) -> String {
        format!("{}{LEGACY_ALIAS_TABLE_SUFFIX}", self.name)
    }
}

impl SchemaRegistry {

    /// This function creates a new empty registry.
    pub fn new() -> Self {
        Self { version: SCHEMA_FILE_VERSION, ..Default::default() }
    }

    /// This function adds an entry declaration to the registry.
    pub fn add_entry(&mut self, entry: EntrySchema) -> &mut Self {
        self.entries.insert(entry.name().clone(), entry);
        self
    }

    /// This function adds a struct type to the registry.
    pub fn add_struct(&mut self, schema: StructSchema) -> &mut Self {
        self.structs.insert(schema.name().clone(), schema);
        self
    }

    /// This function adds an enum type to the registry.
    pub fn add_enum(&mut self, schema: EnumSchema) -> &mut Self {
        self.enums.insert(schema.name().clone(), schema);
        self
    }

    /// This function returns the entry with the provided name, or an error.
    pub fn entry(&self, name: &str) -> Result<&EntrySchema> {
        self.entries.get(name).ok_or_else(|| CfgLibError::UnknownEntry(name.to_owned()))
    }

    /// This function returns the struct type with the provided name, or an error.
    pub fn struct_schema(&self, name: &str) -> Result<&StructSchema> {
        self.structs.get(name).ok_or_else(|| CfgLibError::UnknownStructType(name.to_owned()))
    }

    /// This function returns the enum type with the provided name, if it exists.
    pub fn enum_schema(&self, name: &str) -> Option<&EnumSchema> {
        self.enums.get(name)
    }

    /// This function returns the struct type of the provided entry.
    pub fn item_type_of(&self, entry: &EntrySchema) -> Result<&StructSchema> {
        self.struct_schema(entry.item_type())
    }

    /// This function loads a registry from a RON file.
    pub fn load(path: &Path) -> Result<Self> {
        let mut data = String::new();
        BufReader::new(File::open(path)?).read_to_string(&mut data)?;
        Self::load_from_str(&data)
    }

    /// This function loads a registry from RON data.
    pub fn load_from_str(data: &str) -> Result<Self> {
        let registry: Self = ron::from_str(data)?;
        if registry.version > SCHEMA_FILE_VERSION {
            return Err(CfgLibError::UnsupportedSchemaRegistryVersion(registry.version));
        }
        registry.validate()?;
        Ok(registry)
    }

    /// This function saves the registry to a RON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        let config = PrettyConfig::default();
        file.write_all(ron::ser::to_string_pretty(self, config)?.as_bytes())?;
        Ok(())
    }

    /// This function checks the registry is internally consistent: struct and enum references
    /// resolve, ref targets are library entries, libraries have key fields, and meta tags are
    /// unique within each struct.
    pub fn validate(&self) -> Result<()> {
        for entry in self.entries.values() {
            let item_type = self.struct_schema(entry.item_type())?;
            if *entry.kind() == EntryKind::Library && item_type.key_fields().is_empty() {
                return Err(CfgLibError::InvariantViolated(format!("the library entry \"{}\" has an item type with no key fields", entry.name())));
            }
        }

        for schema in self.structs.values() {
            let mut seen_tags = std::collections::HashSet::new();
            for field in schema.fields() {
                if !seen_tags.insert(*field.meta_tag()) {
                    return Err(CfgLibError::InvariantViolated(format!("the struct \"{}\" reuses meta tag {}", schema.name(), field.meta_tag())));
                }
                if *field.meta_tag() == 0 {
                    return Err(CfgLibError::InvariantViolated(format!("the struct \"{}\" uses meta tag 0, which is reserved", schema.name())));
                }
                self.validate_field_type(schema.name(), field.field_type())?;
            }
        }

        Ok(())
    }

    fn validate_field_type(&self, struct_name: &str, field_type: &FieldType) -> Result<()> {
        match field_type {
            FieldType::Enum(name) => {
                if self.enum_schema(name).is_none() {
                    return Err(CfgLibError::InvariantViolated(format!("the struct \"{struct_name}\" references the unknown enum \"{name}\"")));
                }
            },
            FieldType::Struct(name) => {
                self.struct_schema(name)?;
            },
            FieldType::Ref(entry_name) => {
                let entry = self.entry(entry_name)?;
                if *entry.kind() != EntryKind::Library {
                    return Err(CfgLibError::InvariantViolated(format!("the struct \"{struct_name}\" references the non-library entry \"{entry_name}\"")));
                }
            },
            FieldType::List(inner) => self.validate_field_type(struct_name, inner)?,
            _ => {},
        }
        Ok(())
    }
}
