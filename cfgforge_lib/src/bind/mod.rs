//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the output binder: the stage that turns syntax trees into typed items.
//!
//! Binding is driven entirely by the schema registry. Scalars go through the
//! [`values`](crate::values) parser, collections bind element-wise, objects bind against their
//! struct type. Every problem is reported into the build log with the offending cell's location;
//! the binder itself never fails hard and never panics on config-author input.
//!
//! Member iteration follows the syntax tree's insertion order, never a re-sort, because archive
//! bytes must come out identical across runs.

use indexmap::IndexMap;

use std::sync::Arc;

use crate::build::log::BuildLog;
use crate::items::{ConfigItem, ConfigStruct, ConfigValue, KeyValueStructure, Library};
use crate::schema::{EntrySchema, FieldType, SchemaRegistry, StructSchema};
use crate::sheets::syntax::{Node, ObjectNode, RootObject};
use crate::values::{parse_inline_list, parse_scalar};

#[cfg(test)] mod bind_test;

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// What to do when a sheet declares a member the schema does not know.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownMemberPolicy {
    Ignore,

    #[default]
    Warn,
    Error,
}

/// The binder: schema registry plus binding options.
pub struct Binder<'a> {
    registry: &'a SchemaRegistry,
    unknown_member_policy: UnknownMemberPolicy,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

impl<'a> Binder<'a> {

    /// This function creates a binder over the provided registry.
    pub fn new(registry: &'a SchemaRegistry, unknown_member_policy: UnknownMemberPolicy) -> Self {
        Self { registry, unknown_member_policy }
    }

    /// This function binds baseline roots into a [`Library`], registering aliases as it goes.
    ///
    /// Duplicate keys keep their first definition; the duplicate detection pass has already
    /// reported them.
    pub fn bind_library(&self, entry: &EntrySchema, roots: &[RootObject], log: &mut BuildLog) -> Library {
        let mut library = Library::new(entry.name(), entry.item_type());

        let schema = match self.registry.item_type_of(entry) {
            Ok(schema) => schema,
            Err(error) => {
                log.error(&error.to_string(), None);
                return library;
            },
        };

        for root in roots {
            if root.variant_id().is_some() {
                continue;
            }

            let key = root.key();
            if let Some(item) = self.bind_item(schema, root, log) {
                if library.get(&key).is_none() {
                    library.insert(&key, Arc::new(item));
                    self.register_aliases(&mut library, &key, root, log);
                }
            }
        }

        library
    }

    /// This function binds the roots of one variant into items, keyed like the library.
    pub fn bind_variant_items(&self, entry: &EntrySchema, roots: &[RootObject], variant_id: &str, log: &mut BuildLog) -> IndexMap<String, Arc<ConfigItem>> {
        let mut items = IndexMap::new();

        let schema = match self.registry.item_type_of(entry) {
            Ok(schema) => schema,
            Err(error) => {
                log.error(&error.to_string(), None);
                return items;
            },
        };

        for root in roots {
            if root.variant_id().as_deref() != Some(variant_id) {
                continue;
            }
            if let Some(item) = self.bind_item(schema, root, log) {
                if !items.contains_key(&root.key()) {
                    items.insert(root.key(), Arc::new(item));
                }
            }
        }

        items
    }

    /// This function binds one root into an item of the provided struct type.
    pub fn bind_item(&self, schema: &StructSchema, root: &RootObject, log: &mut BuildLog) -> Option<ConfigItem> {
        let values = self.bind_object_members(schema, root.node(), log);
        Some(ConfigItem::new(schema.name(), values))
    }

    /// This function binds a key-value root into its structure.
    pub fn bind_key_value(&self, entry: &EntrySchema, root: &RootObject, log: &mut BuildLog) -> KeyValueStructure {
        let schema = match self.registry.item_type_of(entry) {
            Ok(schema) => schema,
            Err(error) => {
                log.error(&error.to_string(), None);
                return KeyValueStructure::default();
            },
        };

        let values = self.bind_object_members(schema, root.node(), log);
        KeyValueStructure::new(entry.name(), schema.name(), values)
    }

    /// Binds the members of an object node against a struct type, in node insertion order.
    fn bind_object_members(&self, schema: &StructSchema, node: &ObjectNode, log: &mut BuildLog) -> IndexMap<String, ConfigValue> {
        let mut values = IndexMap::new();

        for (member_id, member_node) in node.members() {
            let field = match schema.field_by_name(member_id.name()) {
                Some(field) => field,
                None => {
                    self.report_unknown_member(schema, member_id.name(), member_node, log);
                    continue;
                },
            };

            if let Some(value) = self.bind_value(field.field_type(), member_node, log) {
                values.insert(member_id.name().clone(), value);
            }
        }

        values
    }

    /// Binds one node against one declared type.
    fn bind_value(&self, field_type: &FieldType, node: &Node, log: &mut BuildLog) -> Option<ConfigValue> {
        match (field_type, node) {

            // Inline collections arrive as scalars and go through the inline list parser.
            (FieldType::List(element_type), Node::Scalar(scalar)) => {
                match parse_inline_list(element_type, scalar.value(), self.registry) {
                    Ok(value) => Some(value),
                    Err(error) => {
                        log.error(&error, Some(scalar.location().clone()));
                        None
                    },
                }
            },

            (FieldType::List(element_type), Node::Collection(collection)) => {
                let mut elements = vec![];
                for element in collection.elements() {
                    match element {
                        Some(element_node) => elements.push(self.bind_value(element_type, element_node, log)?),
                        None => elements.push(ConfigValue::Null),
                    }
                }
                Some(ConfigValue::List(elements))
            },

            (FieldType::Struct(type_name), Node::Object(object)) => {
                let schema = match self.registry.struct_schema(type_name) {
                    Ok(schema) => schema,
                    Err(error) => {
                        log.error(&error.to_string(), node.location());
                        return None;
                    },
                };
                let members = self.bind_object_members(schema, object, log);
                Some(ConfigValue::Struct(ConfigStruct::new(type_name, members)))
            },

            (_, Node::Scalar(scalar)) => {
                match parse_scalar(field_type, scalar.value(), self.registry) {
                    Ok(value) => Some(value),
                    Err(error) => {
                        log.error(&error, Some(scalar.location().clone()));
                        None
                    },
                }
            },

            (_, node) => {
                log.error(
                    &format!("The sheet provides a compound value where the schema declares a {field_type:?}."),
                    node.location(),
                );
                None
            },
        }
    }

    fn register_aliases(&self, library: &mut Library, key: &str, root: &RootObject, log: &mut BuildLog) {
        let aliases = match root.aliases() {
            Some(aliases) => aliases,
            None => return,
        };

        for alias in aliases.split(',').map(str::trim).filter(|alias| !alias.is_empty()) {
            if library.aliases().contains_key(alias) || library.get(alias).is_some() {
                log.error(
                    &format!("The alias \"{alias}\" collides with an existing key or alias of the library \"{}\".", library.entry_name()),
                    Some(root.location().clone()),
                );
            } else {
                library.insert_alias(alias, key);
            }
        }
    }

    fn report_unknown_member(&self, schema: &StructSchema, member_name: &str, node: &Node, log: &mut BuildLog) {
        let text = format!("The member \"{member_name}\" is not part of the type \"{}\".", schema.name());
        match self.unknown_member_policy {
            UnknownMemberPolicy::Ignore => {},
            UnknownMemberPolicy::Warn => log.warning(&text, node.location()),
            UnknownMemberPolicy::Error => log.error(&text, node.location()),
        }
    }
}
