//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the syntax tree the item splitter produces and the binder consumes.
//!
//! The tree is deliberately untyped: it carries cell strings and locations, nothing else. Typing
//! happens later, against the schema, in the binder. Member order is insertion order and is kept
//! stable because archive bytes must be deterministic.

use getset::Getters;
use indexmap::IndexMap;

use std::fmt;
use std::fmt::Display;

use crate::sheets::location::SourceLocation;

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// Identity of one member of an [`ObjectNode`]: name plus the variant it belongs to.
///
/// Equality includes the variant, so a member and its variant override coexist as siblings until
/// variant extraction splits them apart.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Getters)]
#[getset(get = "pub")]
pub struct NodeMemberId {
    name: String,
    variant_id: Option<String>,
}

/// One node of the syntax tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {

    /// A scalar cell value.
    Scalar(ScalarNode),

    /// A collection. `None` elements mark explicitly skipped indexes.
    Collection(CollectionNode),

    /// An object with ordered members.
    Object(ObjectNode),
}

/// A scalar leaf: the raw cell string plus where it came from.
#[derive(Clone, Debug, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct ScalarNode {
    value: String,
    location: SourceLocation,
}

/// A collection node.
#[derive(Clone, Debug, Default, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct CollectionNode {
    elements: Vec<Option<Node>>,
}

/// An object node with ordered members.
#[derive(Clone, Debug, Default, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct ObjectNode {
    members: IndexMap<NodeMemberId, Node>,
}

/// The root of one parsed item, for one variant (or the baseline).
#[derive(Clone, Debug, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct RootObject {

    /// The identity of the item: the values of its key cells, in key-column order.
    id: Vec<String>,

    /// The members of the item.
    node: ObjectNode,

    /// Location of the rows this item was parsed from.
    location: SourceLocation,

    /// Raw alias list (comma-separated), extracted from the `/Aliases` member.
    aliases: Option<String>,

    /// The variant this root belongs to. `None` is the baseline.
    variant_id: Option<String>,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

impl NodeMemberId {

    /// This function builds a baseline member id.
    pub fn baseline(name: &str) -> Self {
        Self { name: name.to_owned(), variant_id: None }
    }

    /// This function builds a member id scoped to a variant.
    pub fn variant(name: &str, variant_id: &str) -> Self {
        Self { name: name.to_owned(), variant_id: Some(variant_id.to_owned()) }
    }

    /// This function builds a member id from a name and an optional variant.
    pub fn new(name: &str, variant_id: Option<&str>) -> Self {
        Self { name: name.to_owned(), variant_id: variant_id.map(|id| id.to_owned()) }
    }
}

impl Display for NodeMemberId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.variant_id {
            Some(variant_id) => write!(f, "{}/:{variant_id}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl Node {

    /// This function returns the location of this node, when it has one.
    ///
    /// Collections and objects answer with the location of their first located child.
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Self::Scalar(scalar) => Some(scalar.location.clone()),
            Self::Collection(collection) => collection.elements.iter().flatten().find_map(Node::location),
            Self::Object(object) => object.members.values().find_map(Node::location),
        }
    }
}

impl ScalarNode {

    /// This function builds a scalar node.
    pub fn new(value: &str, location: SourceLocation) -> Self {
        Self { value: value.to_owned(), location }
    }
}

impl CollectionNode {

    /// This function builds a collection node from its elements.
    pub fn new(elements: Vec<Option<Node>>) -> Self {
        Self { elements }
    }

    /// This function returns true if the collection has no elements at all.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl ObjectNode {

    /// This function creates a new empty object node.
    pub fn new() -> Self {
        Self::default()
    }

    /// This function inserts a member, returning the previous value if the member already existed.
    pub fn insert(&mut self, id: NodeMemberId, node: Node) -> Option<Node> {
        self.members.insert(id, node)
    }

    /// This function returns the member with the provided baseline name, if present.
    pub fn member(&self, name: &str) -> Option<&Node> {
        self.members.get(&NodeMemberId::baseline(name))
    }

    /// This function removes the member with the provided baseline name.
    pub fn remove_member(&mut self, name: &str) -> Option<Node> {
        self.members.shift_remove(&NodeMemberId::baseline(name))
    }

    /// Mutable access to the members, for the post-processing passes.
    pub fn members_mut(&mut self) -> &mut IndexMap<NodeMemberId, Node> {
        &mut self.members
    }
}

impl RootObject {

    /// This function builds a new root object.
    pub fn new(id: Vec<String>, node: ObjectNode, location: SourceLocation, variant_id: Option<String>) -> Self {
        Self { id, node, location, aliases: None, variant_id }
    }

    /// This function returns the canonical key of this item: its id parts joined with `/`.
    pub fn key(&self) -> String {
        self.id.join("/")
    }

    /// This function replaces the id of this root. Used when a variant overlay inherits its
    /// identity from the baseline.
    pub fn set_id(&mut self, id: Vec<String>) {
        self.id = id;
    }

    /// This function replaces the aliases of this root.
    pub fn set_aliases(&mut self, aliases: Option<String>) {
        self.aliases = aliases;
    }

    /// Mutable access to the members of this root.
    pub fn node_mut(&mut self) -> &mut ObjectNode {
        &mut self.node
    }
}
