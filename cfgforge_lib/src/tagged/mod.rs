//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the tagged binary encoding used by entry payloads, alias tables, patches and
//! patch envelopes.
//!
//! The format is self-describing: every value is prefixed by a wire type byte, and struct
//! members carry the meta tag of their field, terminated by tag 0. That combination is what the
//! compatibility rules rest on: a reader can SKIP any member it does not know (removed members
//! are tolerated), absent members simply never appear (added members are safe), and a wire type
//! change on a live tag is a hard error.
//!
//! Wire types:
//!
//! | Byte | Type   | Payload |
//! | ---- | ------ | ------- |
//! | 0    | Null   | none |
//! | 1    | Bool   | 1 byte |
//! | 2    | Int    | i32 |
//! | 3    | Long   | i64 |
//! | 4    | Float  | f32 |
//! | 5    | Double | f64 |
//! | 6    | String | Sized StringU8 |
//! | 7    | Bytes  | u32 length + bytes |
//! | 8    | List   | u32 count, then count values (wire byte + payload each) |
//! | 9    | Map    | u32 count, then count key/value pairs (each wire byte + payload) |
//! | 10   | Struct | members (`meta_tag:u32, wire:u8, payload`), terminated by tag 0 |
//! | 11   | Enum   | Sized StringU8 (variant name) |

use indexmap::IndexMap;

use std::io::Write;
use std::sync::Arc;

use crate::binary::{ReadBytes, WriteBytes};
use crate::error::{CfgLibError, Result};
use crate::items::{ConfigItem, ConfigStruct, ConfigValue, KeyValueStructure, Library, MetaRef};
use crate::patch::{EntryPatch, LibraryPatch, PatchEnvelope, StructurePatch};
use crate::schema::{EntryKind, EntrySchema, FieldType, SchemaRegistry, StructSchema};

#[cfg(test)] mod tagged_test;

/// Meta tag of the item-type member of an entry payload.
const TAG_ITEM_TYPE: u32 = 1;

/// Meta tag of the item list (libraries) or member struct (key-value) of an entry payload.
const TAG_CONTENT: u32 = 2;

/// Meta tag of the appended-items map of a library patch payload.
const TAG_PATCH_APPENDED: u32 = 3;

/// Struct terminator tag.
const TAG_END: u32 = 0;

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// The wire type byte of one value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireType {
    Null,
    Bool,
    Int,
    Long,
    Float,
    Double,
    String,
    Bytes,
    List,
    Map,
    Struct,
    Enum,
}

/// The codec over one schema registry.
pub struct TaggedCodec<'a> {
    registry: &'a SchemaRegistry,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

impl WireType {

    /// This function decodes a wire type byte.
    pub fn from_byte(byte: u8) -> Result<Self> {
        Ok(match byte {
            0 => Self::Null,
            1 => Self::Bool,
            2 => Self::Int,
            3 => Self::Long,
            4 => Self::Float,
            5 => Self::Double,
            6 => Self::String,
            7 => Self::Bytes,
            8 => Self::List,
            9 => Self::Map,
            10 => Self::Struct,
            11 => Self::Enum,
            _ => return Err(CfgLibError::UnknownWireType(byte)),
        })
    }

    /// This function returns the byte of this wire type.
    pub fn byte(self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool => 1,
            Self::Int => 2,
            Self::Long => 3,
            Self::Float => 4,
            Self::Double => 5,
            Self::String => 6,
            Self::Bytes => 7,
            Self::List => 8,
            Self::Map => 9,
            Self::Struct => 10,
            Self::Enum => 11,
        }
    }

    /// The wire type a declared field type encodes with.
    pub fn of_field_type(field_type: &FieldType) -> Self {
        match field_type {
            FieldType::Bool => Self::Bool,
            FieldType::I32 => Self::Int,
            FieldType::I64 | FieldType::Duration | FieldType::Instant => Self::Long,
            FieldType::F32 => Self::Float,
            FieldType::F64 => Self::Double,
            FieldType::String | FieldType::Ref(_) => Self::String,
            FieldType::Enum(_) => Self::Enum,
            FieldType::List(_) => Self::List,
            FieldType::Struct(_) => Self::Struct,
        }
    }
}

impl<'a> TaggedCodec<'a> {

    /// This function creates a codec over the provided registry.
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    //---------------------------------------------------------------------------//
    //                              Entry payloads
    //---------------------------------------------------------------------------//

    /// This function encodes a library into its `.mpc` payload.
    pub fn encode_library(&self, library: &Library) -> Result<Vec<u8>> {
        let schema = self.registry.struct_schema(library.item_type())?;
        let mut data = vec![];

        write_member_header(&mut data, TAG_ITEM_TYPE, WireType::String)?;
        data.write_sized_string_u8(library.item_type())?;

        write_member_header(&mut data, TAG_CONTENT, WireType::List)?;
        data.write_u32(library.items().len() as u32)?;
        for item in library.items().values() {
            data.write_u8(WireType::Struct.byte())?;
            self.encode_item(schema, item, &mut data)?;
        }

        data.write_u32(TAG_END)?;
        Ok(data)
    }

    /// This function decodes a library from its `.mpc` payload.
    ///
    /// Aliases are NOT part of the payload: they travel in the alias table companion entry.
    pub fn decode_library<R: ReadBytes>(&self, entry: &EntrySchema, data: &mut R) -> Result<Library> {
        let schema = self.registry.item_type_of(entry)?;
        let mut library = Library::new(entry.name(), entry.item_type());

        loop {
            let tag = data.read_u32()?;
            if tag == TAG_END {
                break;
            }
            let wire = WireType::from_byte(data.read_u8()?)?;
            match tag {
                TAG_ITEM_TYPE => {
                    expect_wire(WireType::String, wire)?;
                    let item_type = data.read_sized_string_u8()?;
                    if item_type != *entry.item_type() {
                        return Err(CfgLibError::PatchTypeMismatch {
                            entry: entry.name().clone(),
                            expected: entry.item_type().clone(),
                            found: item_type,
                        });
                    }
                },
                TAG_CONTENT => {
                    expect_wire(WireType::List, wire)?;
                    let count = data.read_u32()?;
                    for _ in 0..count {
                        let element_wire = WireType::from_byte(data.read_u8()?)?;
                        expect_wire(WireType::Struct, element_wire)?;
                        let item = self.decode_item(schema, data)?;
                        let key = item_key(schema, &item);
                        library.insert(&key, Arc::new(item));
                    }
                },
                _ => skip_value(wire, data)?,
            }
        }

        Ok(library)
    }

    /// This function encodes a key-value structure into its `.mpc` payload.
    pub fn encode_key_value(&self, structure: &KeyValueStructure) -> Result<Vec<u8>> {
        let schema = self.registry.struct_schema(structure.type_name())?;
        let mut data = vec![];

        write_member_header(&mut data, TAG_ITEM_TYPE, WireType::String)?;
        data.write_sized_string_u8(structure.type_name())?;

        write_member_header(&mut data, TAG_CONTENT, WireType::Struct)?;
        self.encode_members(schema, structure.values(), &mut data)?;

        data.write_u32(TAG_END)?;
        Ok(data)
    }

    /// This function decodes a key-value structure from its `.mpc` payload.
    pub fn decode_key_value<R: ReadBytes>(&self, entry: &EntrySchema, data: &mut R) -> Result<KeyValueStructure> {
        let schema = self.registry.item_type_of(entry)?;
        let mut values = IndexMap::new();

        loop {
            let tag = data.read_u32()?;
            if tag == TAG_END {
                break;
            }
            let wire = WireType::from_byte(data.read_u8()?)?;
            match tag {
                TAG_ITEM_TYPE => {
                    expect_wire(WireType::String, wire)?;
                    let _ = data.read_sized_string_u8()?;
                },
                TAG_CONTENT => {
                    expect_wire(WireType::Struct, wire)?;
                    values = self.decode_members(schema, data)?;
                },
                _ => skip_value(wire, data)?,
            }
        }

        Ok(KeyValueStructure::new(entry.name(), entry.item_type(), values))
    }

    //---------------------------------------------------------------------------//
    //                              Alias tables
    //---------------------------------------------------------------------------//

    /// This function encodes an alias table (alias to real key) into its payload: a Map value.
    pub fn encode_alias_table(aliases: &IndexMap<String, String>) -> Result<Vec<u8>> {
        let mut data = vec![];
        data.write_u8(WireType::Map.byte())?;
        data.write_u32(aliases.len() as u32)?;
        for (alias, real_key) in aliases {
            data.write_u8(WireType::String.byte())?;
            data.write_sized_string_u8(alias)?;
            data.write_u8(WireType::String.byte())?;
            data.write_sized_string_u8(real_key)?;
        }
        Ok(data)
    }

    /// This function decodes an alias table payload.
    ///
    /// With `invert` the mapping direction flips on read. The legacy `AliasTable.mpc` format
    /// mapped real key to alias and needs that.
    pub fn decode_alias_table<R: ReadBytes>(data: &mut R, invert: bool) -> Result<IndexMap<String, String>> {
        let wire = WireType::from_byte(data.read_u8()?)?;
        expect_wire(WireType::Map, wire)?;

        let count = data.read_u32()?;
        let mut aliases = IndexMap::with_capacity(count as usize);
        for _ in 0..count {
            let key_wire = WireType::from_byte(data.read_u8()?)?;
            expect_wire(WireType::String, key_wire)?;
            let key = data.read_sized_string_u8()?;

            let value_wire = WireType::from_byte(data.read_u8()?)?;
            expect_wire(WireType::String, value_wire)?;
            let value = data.read_sized_string_u8()?;

            if invert {
                aliases.insert(value, key.clone());
            } else {
                aliases.insert(key, value);
            }
        }
        Ok(aliases)
    }

    //---------------------------------------------------------------------------//
    //                              Patches
    //---------------------------------------------------------------------------//

    /// This function encodes one entry's patch.
    pub fn encode_entry_patch(&self, patch: &EntryPatch) -> Result<Vec<u8>> {
        match patch {
            EntryPatch::Library(patch) => self.encode_library_patch(patch),
            EntryPatch::Structure(patch) => self.encode_structure_patch(patch),
        }
    }

    fn encode_library_patch(&self, patch: &LibraryPatch) -> Result<Vec<u8>> {
        let schema = self.registry.struct_schema(patch.item_type())?;
        let mut data = vec![];

        write_member_header(&mut data, TAG_ITEM_TYPE, WireType::String)?;
        data.write_sized_string_u8(patch.item_type())?;

        write_member_header(&mut data, TAG_CONTENT, WireType::Map)?;
        self.encode_item_map(schema, patch.replaced(), &mut data)?;

        write_member_header(&mut data, TAG_PATCH_APPENDED, WireType::Map)?;
        self.encode_item_map(schema, patch.appended(), &mut data)?;

        data.write_u32(TAG_END)?;
        Ok(data)
    }

    fn encode_structure_patch(&self, patch: &StructurePatch) -> Result<Vec<u8>> {
        let schema = self.registry.struct_schema(patch.type_name())?;
        let mut data = vec![];

        write_member_header(&mut data, TAG_ITEM_TYPE, WireType::String)?;
        data.write_sized_string_u8(patch.type_name())?;

        write_member_header(&mut data, TAG_CONTENT, WireType::Struct)?;
        self.encode_members(schema, patch.replacement_values(), &mut data)?;

        data.write_u32(TAG_END)?;
        Ok(data)
    }

    /// This function decodes one entry's patch, against the kind the entry declares.
    ///
    /// A library payload for a key-value entry (or the other way around) is a hard error: a
    /// patch of the wrong shape must never be half-applied.
    pub fn decode_entry_patch<R: ReadBytes>(&self, entry: &EntrySchema, data: &mut R) -> Result<EntryPatch> {
        match entry.kind() {
            EntryKind::Library => self.decode_library_patch(entry, data).map(EntryPatch::Library),
            EntryKind::KeyValue => self.decode_structure_patch(entry, data).map(EntryPatch::Structure),
        }
    }

    fn decode_library_patch<R: ReadBytes>(&self, entry: &EntrySchema, data: &mut R) -> Result<LibraryPatch> {
        let schema = self.registry.item_type_of(entry)?;
        let mut replaced = IndexMap::new();
        let mut appended = IndexMap::new();

        loop {
            let tag = data.read_u32()?;
            if tag == TAG_END {
                break;
            }
            let wire = WireType::from_byte(data.read_u8()?)?;
            match tag {
                TAG_ITEM_TYPE => {
                    expect_wire(WireType::String, wire)?;
                    let item_type = data.read_sized_string_u8()?;
                    if item_type != *entry.item_type() {
                        return Err(CfgLibError::PatchTypeMismatch {
                            entry: entry.name().clone(),
                            expected: entry.item_type().clone(),
                            found: item_type,
                        });
                    }
                },
                TAG_CONTENT => {
                    expect_wire(WireType::Map, wire)?;
                    replaced = self.decode_item_map(schema, data)?;
                },
                TAG_PATCH_APPENDED => {
                    expect_wire(WireType::Map, wire)?;
                    appended = self.decode_item_map(schema, data)?;
                },
                _ => skip_value(wire, data)?,
            }
        }

        LibraryPatch::from_parts(entry.name(), entry.item_type(), replaced, appended)
    }

    fn decode_structure_patch<R: ReadBytes>(&self, entry: &EntrySchema, data: &mut R) -> Result<StructurePatch> {
        let schema = self.registry.item_type_of(entry)?;
        let mut values = IndexMap::new();

        loop {
            let tag = data.read_u32()?;
            if tag == TAG_END {
                break;
            }
            let wire = WireType::from_byte(data.read_u8()?)?;
            match tag {
                TAG_ITEM_TYPE => {
                    expect_wire(WireType::String, wire)?;
                    let item_type = data.read_sized_string_u8()?;
                    if item_type != *entry.item_type() {
                        return Err(CfgLibError::PatchTypeMismatch {
                            entry: entry.name().clone(),
                            expected: entry.item_type().clone(),
                            found: item_type,
                        });
                    }
                },
                TAG_CONTENT => {
                    expect_wire(WireType::Struct, wire)?;
                    values = self.decode_members(schema, data)?;
                },
                _ => skip_value(wire, data)?,
            }
        }

        StructurePatch::from_member_names(entry.name(), schema, values)
    }

    //---------------------------------------------------------------------------//
    //                              Envelopes
    //---------------------------------------------------------------------------//

    /// This function encodes a patch envelope: a Map of entry name to patch bytes.
    pub fn encode_envelope(envelope: &PatchEnvelope) -> Result<Vec<u8>> {
        let mut data = vec![];
        data.write_u8(WireType::Map.byte())?;
        data.write_u32(envelope.entries().len() as u32)?;
        for (name, bytes) in envelope.entries() {
            data.write_u8(WireType::String.byte())?;
            data.write_sized_string_u8(name)?;
            data.write_u8(WireType::Bytes.byte())?;
            data.write_u32(bytes.len() as u32)?;
            data.write_all(bytes)?;
        }
        Ok(data)
    }

    /// This function decodes a patch envelope. The per-entry bytes stay undecoded, so importers
    /// can decode entries lazily.
    pub fn decode_envelope<R: ReadBytes>(data: &mut R) -> Result<PatchEnvelope> {
        let wire = WireType::from_byte(data.read_u8()?)?;
        expect_wire(WireType::Map, wire)?;

        let count = data.read_u32()?;
        let mut envelope = PatchEnvelope::new();
        for _ in 0..count {
            let key_wire = WireType::from_byte(data.read_u8()?)?;
            expect_wire(WireType::String, key_wire)?;
            let name = data.read_sized_string_u8()?;

            let value_wire = WireType::from_byte(data.read_u8()?)?;
            expect_wire(WireType::Bytes, value_wire)?;
            let length = data.read_u32()?;
            let bytes = data.read_slice(length as usize, false)?;

            envelope.insert(&name, bytes);
        }
        Ok(envelope)
    }

    //---------------------------------------------------------------------------//
    //                              Items and values
    //---------------------------------------------------------------------------//

    /// This function encodes one item as a struct payload.
    pub fn encode_item<W: WriteBytes>(&self, schema: &StructSchema, item: &ConfigItem, buffer: &mut W) -> Result<()> {
        self.encode_members(schema, item.values(), buffer)
    }

    /// This function decodes one item from a struct payload.
    pub fn decode_item<R: ReadBytes>(&self, schema: &StructSchema, data: &mut R) -> Result<ConfigItem> {
        Ok(ConfigItem::new(schema.name(), self.decode_members(schema, data)?))
    }

    /// Encodes member values in SCHEMA field order, skipping absent members.
    fn encode_members<W: WriteBytes>(&self, schema: &StructSchema, values: &IndexMap<String, ConfigValue>, buffer: &mut W) -> Result<()> {
        for field in schema.fields() {
            let value = match values.get(field.name()) {
                Some(value) => value,
                None => continue,
            };
            write_member_header(buffer, *field.meta_tag(), WireType::of_field_type(field.field_type()))?;
            self.encode_value(field.field_type(), value, buffer)?;
        }
        buffer.write_u32(TAG_END)?;
        Ok(())
    }

    /// Decodes members until the terminator, skipping tags the schema does not know.
    fn decode_members<R: ReadBytes>(&self, schema: &StructSchema, data: &mut R) -> Result<IndexMap<String, ConfigValue>> {
        let mut values = IndexMap::new();
        loop {
            let tag = data.read_u32()?;
            if tag == TAG_END {
                break;
            }
            let wire = WireType::from_byte(data.read_u8()?)?;
            match schema.field_by_tag(tag) {
                Some(field) => {
                    expect_wire(WireType::of_field_type(field.field_type()), wire)?;
                    let value = self.decode_value(field.field_type(), data)?;
                    values.insert(field.name().clone(), value);
                },
                None => skip_value(wire, data)?,
            }
        }
        Ok(values)
    }

    fn encode_value<W: WriteBytes>(&self, field_type: &FieldType, value: &ConfigValue, buffer: &mut W) -> Result<()> {
        match (field_type, value) {
            (FieldType::Bool, ConfigValue::Bool(value)) => buffer.write_bool(*value),
            (FieldType::I32, ConfigValue::I32(value)) => buffer.write_i32(*value),
            (FieldType::I64, ConfigValue::I64(value)) => buffer.write_i64(*value),
            (FieldType::Duration, ConfigValue::Duration(value)) => buffer.write_i64(*value),
            (FieldType::Instant, ConfigValue::Instant(value)) => buffer.write_i64(*value),
            (FieldType::F32, ConfigValue::F32(value)) => buffer.write_f32(*value),
            (FieldType::F64, ConfigValue::F64(value)) => buffer.write_f64(*value),
            (FieldType::String, ConfigValue::String(value)) => buffer.write_sized_string_u8(value),
            (FieldType::Enum(_), ConfigValue::Enum(value)) => buffer.write_sized_string_u8(value),
            (FieldType::Ref(_), ConfigValue::Ref(meta_ref)) => buffer.write_sized_string_u8(meta_ref.raw_key()),
            (FieldType::List(element_type), ConfigValue::List(elements)) => {
                buffer.write_u32(elements.len() as u32)?;
                for element in elements {
                    match element {
                        ConfigValue::Null => buffer.write_u8(WireType::Null.byte())?,
                        element => {
                            buffer.write_u8(WireType::of_field_type(element_type).byte())?;
                            self.encode_value(element_type, element, buffer)?;
                        },
                    }
                }
                Ok(())
            },
            (FieldType::Struct(type_name), ConfigValue::Struct(value)) => {
                let schema = self.registry.struct_schema(type_name)?;
                self.encode_members(schema, value.members(), buffer)
            },
            (field_type, value) => Err(CfgLibError::InvariantViolated(
                format!("the value {value:?} cannot be encoded as {field_type:?}; the binder produced a mistyped item"),
            )),
        }
    }

    fn decode_value<R: ReadBytes>(&self, field_type: &FieldType, data: &mut R) -> Result<ConfigValue> {
        Ok(match field_type {
            FieldType::Bool => ConfigValue::Bool(data.read_bool()?),
            FieldType::I32 => ConfigValue::I32(data.read_i32()?),
            FieldType::I64 => ConfigValue::I64(data.read_i64()?),
            FieldType::Duration => ConfigValue::Duration(data.read_i64()?),
            FieldType::Instant => ConfigValue::Instant(data.read_i64()?),
            FieldType::F32 => ConfigValue::F32(data.read_f32()?),
            FieldType::F64 => ConfigValue::F64(data.read_f64()?),
            FieldType::String => ConfigValue::String(data.read_sized_string_u8()?),
            FieldType::Enum(_) => ConfigValue::Enum(data.read_sized_string_u8()?),
            FieldType::Ref(entry_name) => ConfigValue::Ref(MetaRef::new(entry_name, &data.read_sized_string_u8()?)),
            FieldType::List(element_type) => {
                let count = data.read_u32()?;
                let mut elements = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let wire = WireType::from_byte(data.read_u8()?)?;
                    if wire == WireType::Null {
                        elements.push(ConfigValue::Null);
                    } else {
                        expect_wire(WireType::of_field_type(element_type), wire)?;
                        elements.push(self.decode_value(element_type, data)?);
                    }
                }
                ConfigValue::List(elements)
            },
            FieldType::Struct(type_name) => {
                let schema = self.registry.struct_schema(type_name)?;
                ConfigValue::Struct(ConfigStruct::new(type_name, self.decode_members(schema, data)?))
            },
        })
    }

    fn encode_item_map<W: WriteBytes>(&self, schema: &StructSchema, items: &IndexMap<String, Arc<ConfigItem>>, buffer: &mut W) -> Result<()> {
        buffer.write_u32(items.len() as u32)?;
        for (key, item) in items {
            buffer.write_u8(WireType::String.byte())?;
            buffer.write_sized_string_u8(key)?;
            buffer.write_u8(WireType::Struct.byte())?;
            self.encode_item(schema, item, buffer)?;
        }
        Ok(())
    }

    fn decode_item_map<R: ReadBytes>(&self, schema: &StructSchema, data: &mut R) -> Result<IndexMap<String, Arc<ConfigItem>>> {
        let count = data.read_u32()?;
        let mut items = IndexMap::with_capacity(count as usize);
        for _ in 0..count {
            let key_wire = WireType::from_byte(data.read_u8()?)?;
            expect_wire(WireType::String, key_wire)?;
            let key = data.read_sized_string_u8()?;

            let value_wire = WireType::from_byte(data.read_u8()?)?;
            expect_wire(WireType::Struct, value_wire)?;
            let item = self.decode_item(schema, data)?;
            items.insert(key, Arc::new(item));
        }
        Ok(items)
    }
}

//---------------------------------------------------------------------------//
//                              Free functions
//---------------------------------------------------------------------------//

/// This function computes the canonical key of a decoded item from its key fields.
pub fn item_key(schema: &StructSchema, item: &ConfigItem) -> String {
    let parts = schema.key_fields().iter()
        .map(|field| match item.value(field.name()) {
            Some(ConfigValue::String(value)) => value.clone(),
            Some(ConfigValue::Enum(value)) => value.clone(),
            Some(ConfigValue::I32(value)) => value.to_string(),
            Some(ConfigValue::I64(value)) => value.to_string(),
            _ => String::new(),
        })
        .collect::<Vec<_>>();
    parts.join("/")
}

fn write_member_header<W: WriteBytes>(buffer: &mut W, meta_tag: u32, wire: WireType) -> Result<()> {
    buffer.write_u32(meta_tag)?;
    buffer.write_u8(wire.byte())
}

fn expect_wire(expected: WireType, found: WireType) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(CfgLibError::WireTypeMismatch { expected: format!("{expected:?}"), found: format!("{found:?}") })
    }
}

/// This function skips one value of the provided wire type.
pub fn skip_value<R: ReadBytes>(wire: WireType, data: &mut R) -> Result<()> {
    match wire {
        WireType::Null => {},
        WireType::Bool => { data.read_u8()?; },
        WireType::Int | WireType::Float => { data.read_slice(4, false)?; },
        WireType::Long | WireType::Double => { data.read_slice(8, false)?; },
        WireType::String | WireType::Enum => { data.read_sized_string_u8()?; },
        WireType::Bytes => {
            let length = data.read_u32()?;
            data.read_slice(length as usize, false)?;
        },
        WireType::List => {
            let count = data.read_u32()?;
            for _ in 0..count {
                let wire = WireType::from_byte(data.read_u8()?)?;
                skip_value(wire, data)?;
            }
        },
        WireType::Map => {
            let count = data.read_u32()?;
            for _ in 0..count {
                let key_wire = WireType::from_byte(data.read_u8()?)?;
                skip_value(key_wire, data)?;
                let value_wire = WireType::from_byte(data.read_u8()?)?;
                skip_value(value_wire, data)?;
            }
        },
        WireType::Struct => {
            loop {
                let tag = data.read_u32()?;
                if tag == TAG_END {
                    break;
                }
                let wire = WireType::from_byte(data.read_u8()?)?;
                skip_value(wire, data)?;
            }
        },
    }
    Ok(())
}
