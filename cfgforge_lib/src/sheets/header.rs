//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the header-path DSL parser.
//!
//! Every header cell is parsed into a [`SliceInfo`]: a path of segments plus tags. The grammar:
//!
//! ```text
//! header     := ( path )? ( '#' tag )*
//! path       := segment ( '.' segment )*
//! segment    := IDENT ( '[' INT ']' | '[' ']' )?
//! tag        := IDENT ( ':' tagValue )?
//! ```
//!
//! On top of the grammar there are a few special forms, checked before it:
//! * Headers starting with `//` are comments and parse to nothing.
//! * `/Variant` and `/Aliases` are reserved single-segment headers.
//! * `/:VariantId[,VariantId...]` marks a variant override column: it carries no path of its own
//!   and inherits the path of the nearest non-override column to its left.

use getset::Getters;

use crate::build::log::BuildMessage;
use crate::sheets::{ALIASES_HEADER, COMMENT_PREFIX, Spreadsheet, VARIANT_HEADER, VARIANT_OVERRIDE_PREFIX};
use crate::sheets::location::SourceLocation;

/// Tag marking a column as part of the item identity.
pub const TAG_KEY: &str = "key";

/// Tag marking a column as a comment for humans, ignored by the pipeline.
pub const TAG_COMMENT: &str = "comment";

/// The tags the pipeline knows about. Anything else in a header is a typo.
const KNOWN_TAGS: [&str; 2] = [TAG_KEY, TAG_COMMENT];

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// The kind of a path segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {

    /// First segment of a path: a top-level member of the item.
    Root,

    /// A nested member.
    Member,

    /// `Name[]`: one element of a linear collection per content row.
    LinearCollection,

    /// `Name[3]`: an explicitly indexed element of a collection.
    IndexedElement,
}

/// One segment of a header path.
#[derive(Clone, Debug, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct PathSegment {
    name: String,
    variant_id: Option<String>,
    kind: SegmentKind,
    element_index: Option<u32>,
}

/// One tag of a header.
#[derive(Clone, Debug, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Tag {
    name: String,
    value: Option<String>,
}

/// One parsed header: a column of a library sheet, or a member row of a key-value sheet.
#[derive(Clone, Debug, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct SliceInfo {

    /// Index of the column (or row, for key-value sheets) this slice was parsed from.
    index: u32,

    /// The raw header text, for diagnostics.
    full_path: String,

    /// The parsed path.
    segments: Vec<PathSegment>,

    /// The parsed tags.
    tags: Vec<Tag>,

    /// Location of the header cell.
    location: SourceLocation,
}

/// Result of parsing one header cell.
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedHeader {

    /// Empty or comment header: the column carries no data.
    Empty,

    /// A normal header.
    Slice(SliceInfo),

    /// A variant override header, with the variant ids it covers. The path is inherited later.
    VariantOverride(Vec<String>),
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

impl PathSegment {

    /// This function builds a plain member segment.
    pub fn member(name: &str, kind: SegmentKind) -> Self {
        Self { name: name.to_owned(), variant_id: None, kind, element_index: None }
    }

    /// This function returns a copy of this segment with the provided variant id applied.
    pub fn with_variant(&self, variant_id: &str) -> Self {
        let mut segment = self.clone();
        segment.variant_id = Some(variant_id.to_owned());
        segment
    }
}

impl SliceInfo {

    /// This function returns true if this slice is tagged as part of the item identity.
    pub fn is_key(&self) -> bool {
        self.tags.iter().any(|tag| tag.name() == TAG_KEY)
    }

    /// This function returns true if this slice is tagged as a human comment.
    pub fn is_comment(&self) -> bool {
        self.tags.iter().any(|tag| tag.name() == TAG_COMMENT)
    }

    /// This function returns true if this slice is the reserved `/Variant` header.
    pub fn is_variant_id(&self) -> bool {
        self.full_path == VARIANT_HEADER
    }

    /// This function returns true if this slice is the reserved `/Aliases` header.
    pub fn is_aliases(&self) -> bool {
        self.full_path == ALIASES_HEADER
    }

    /// This function returns the variant id carried by this slice, if any.
    pub fn variant_id(&self) -> Option<&str> {
        self.segments.first().and_then(|segment| segment.variant_id().as_deref())
    }

    /// This function returns a copy of this slice with the provided variant id applied to every
    /// segment. Used by key-value sheets, where a `/Variant` cell scopes a whole member row.
    pub fn with_variant_everywhere(&self, variant_id: &str) -> Self {
        let mut slice = self.clone();
        slice.segments = slice.segments.iter().map(|segment| segment.with_variant(variant_id)).collect();
        slice
    }

    /// This function returns a copy of this slice re-rooted at the provided index and location,
    /// with the provided variant id applied to every segment.
    fn as_variant_override(&self, variant_id: &str, index: u32, full_path: &str, location: SourceLocation) -> Self {
        Self {
            index,
            full_path: full_path.to_owned(),
            segments: self.segments.iter().map(|segment| segment.with_variant(variant_id)).collect(),
            tags: self.tags.clone(),
            location,
        }
    }
}

//---------------------------------------------------------------------------//
//                              Parsing functions
//---------------------------------------------------------------------------//

/// This function parses one header cell.
///
/// Returns a [`BuildMessage`] pointing at the header cell on any malformed input.
pub fn parse_header_cell(value: &str, index: u32, location: &SourceLocation) -> Result<ParsedHeader, BuildMessage> {
    let trimmed = value.trim();

    if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
        return Ok(ParsedHeader::Empty);
    }

    // Reserved headers sidestep the grammar: their names are not valid IDENTs.
    if trimmed == VARIANT_HEADER || trimmed == ALIASES_HEADER {
        let segments = vec![PathSegment::member(trimmed, SegmentKind::Root)];
        return Ok(ParsedHeader::Slice(SliceInfo {
            index,
            full_path: trimmed.to_owned(),
            segments,
            tags: vec![],
            location: location.clone(),
        }));
    }

    if let Some(ids) = trimmed.strip_prefix(VARIANT_OVERRIDE_PREFIX) {
        let ids = ids.split(',').map(|id| id.trim().to_owned()).filter(|id| !id.is_empty()).collect::<Vec<_>>();
        if ids.is_empty() {
            return Err(bad_header(trimmed, "a variant override header needs at least one variant id", location));
        }
        return Ok(ParsedHeader::VariantOverride(ids));
    }

    let mut parser = HeaderParser { chars: trimmed.char_indices().peekable(), input: trimmed };

    let segments = parser.parse_path(location)?;
    let tags = parser.parse_tags(location)?;

    // Tags may stand alone only when the whole header is a comment marker.
    if segments.is_empty() && !tags.iter().all(|tag| tag.name() == TAG_COMMENT) {
        return Err(bad_header(trimmed, "tags other than #comment need a path before them", location));
    }

    parser.skip_whitespace();
    if let Some((_, char)) = parser.chars.peek() {
        return Err(bad_header(trimmed, &format!("unexpected token \"{char}\" after the final tag"), location));
    }

    if segments.is_empty() && tags.is_empty() {
        return Ok(ParsedHeader::Empty);
    }

    Ok(ParsedHeader::Slice(SliceInfo {
        index,
        full_path: trimmed.to_owned(),
        segments,
        tags,
        location: location.clone(),
    }))
}

/// This function parses the header row of a library sheet into slices, resolving variant
/// override columns against their left neighbour.
///
/// Problems land in `errors`; the returned slices cover only the well-formed headers.
pub fn parse_header_row(sheet: &Spreadsheet, errors: &mut Vec<BuildMessage>) -> Vec<SliceInfo> {
    let mut slices: Vec<SliceInfo> = vec![];
    let header_row = match sheet.cells().first() {
        Some(row) => row,
        None => return slices,
    };

    for cell in header_row {
        let location = cell.location(sheet.source());
        match parse_header_cell(&cell.value, cell.col, &location) {
            Ok(ParsedHeader::Empty) => {},
            Ok(ParsedHeader::Slice(slice)) => slices.push(slice),
            Ok(ParsedHeader::VariantOverride(ids)) => {

                // The override column borrows the path of the nearest real column to its left.
                let predecessor = slices.iter().rev().find(|slice| slice.variant_id().is_none() && !slice.is_variant_id() && !slice.is_aliases() && !slice.is_comment()).cloned();
                match predecessor {
                    Some(predecessor) => for id in &ids {
                        slices.push(predecessor.as_variant_override(id, cell.col, &cell.value, location.clone()));
                    },
                    None => errors.push(BuildMessage::error(
                        &format!("Variant override header \"{}\" has no non-variant column to its left to inherit from.", cell.value),
                        Some(location.clone()),
                    )),
                }
            },
            Err(error) => errors.push(error),
        }
    }

    slices
}

/// Helper to keep the BadHeader messages uniform.
fn bad_header(header: &str, reason: &str, location: &SourceLocation) -> BuildMessage {
    BuildMessage::error(&format!("Bad header \"{header}\": {reason}."), Some(location.clone()))
}

/// Internal scanner over one header cell.
struct HeaderParser<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    input: &'a str,
}

impl HeaderParser<'_> {

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some((_, char)) if char.is_whitespace()) {
            self.chars.next();
        }
    }

    /// Scans one IDENT: everything up to a structural character.
    fn parse_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some((_, char)) = self.chars.peek() {
            if char.is_whitespace() || matches!(char, '.' | '[' | ']' | '#' | ':') {
                break;
            }
            ident.push(*char);
            self.chars.next();
        }
        ident
    }

    fn parse_path(&mut self, location: &SourceLocation) -> Result<Vec<PathSegment>, BuildMessage> {
        let mut segments: Vec<PathSegment> = vec![];

        self.skip_whitespace();
        if matches!(self.chars.peek(), None | Some((_, '#'))) {
            return Ok(segments);
        }

        loop {
            let name = self.parse_ident();
            if name.is_empty() {
                return Err(bad_header(self.input, "a path segment has an empty name", location));
            }

            let kind = if segments.is_empty() { SegmentKind::Root } else { SegmentKind::Member };
            let mut segment = PathSegment::member(&name, kind);

            // Optional bracket suffix turns the segment into a collection form.
            if matches!(self.chars.peek(), Some((_, '['))) {
                self.chars.next();
                let mut digits = String::new();
                while matches!(self.chars.peek(), Some((_, char)) if char.is_ascii_digit()) {
                    digits.push(self.chars.next().unwrap().1);
                }
                if !matches!(self.chars.next(), Some((_, ']'))) {
                    return Err(bad_header(self.input, &format!("unbalanced brackets on segment \"{name}\""), location));
                }
                if digits.is_empty() {
                    segment.kind = SegmentKind::LinearCollection;
                } else {
                    segment.kind = SegmentKind::IndexedElement;
                    segment.element_index = Some(digits.parse().map_err(|_| bad_header(self.input, &format!("invalid index on segment \"{name}\""), location))?);
                }
            }

            segments.push(segment);

            match self.chars.peek() {
                Some((_, '.')) => { self.chars.next(); },
                Some((_, ']')) => return Err(bad_header(self.input, "unbalanced brackets", location)),
                _ => break,
            }
        }

        Ok(segments)
    }

    fn parse_tags(&mut self, location: &SourceLocation) -> Result<Vec<Tag>, BuildMessage> {
        let mut tags = vec![];

        loop {
            self.skip_whitespace();
            match self.chars.peek() {
                Some((_, '#')) => { self.chars.next(); },
                _ => break,
            }

            let name = self.parse_ident();
            if name.is_empty() {
                return Err(bad_header(self.input, "a tag has an empty name", location));
            }
            if !KNOWN_TAGS.contains(&name.as_str()) {
                return Err(bad_header(self.input, &format!("unknown tag \"#{name}\""), location));
            }

            let value = if matches!(self.chars.peek(), Some((_, ':'))) {
                self.chars.next();
                let value = self.parse_ident();
                if value.is_empty() {
                    return Err(bad_header(self.input, &format!("tag \"#{name}\" has an empty value"), location));
                }
                Some(value)
            } else {
                None
            };

            tags.push(Tag { name, value });
        }

        Ok(tags)
    }
}
