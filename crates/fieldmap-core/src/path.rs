//! Field path model
//!
//! A path addresses one value (or one collection level) inside a document:
//! `/order/lines[2]/sku`, `/names<>/first`. Segments are separated by `/`;
//! a trailing `[n]` is an array index, `<n>` a list index, and the empty
//! bracket forms `[]` / `<>` denote "every element" at that level. Map
//! access carries no marker in the path text - the key is the segment name
//! itself and the map shape comes from the field's declared collection type.
//!
//! Paths are immutable once parsed and structurally equal iff their segment
//! sequences match, indices included. `Path::parse(&p.to_string())` yields
//! `p` for every parseable path.
//!
//! Copyright (c) 2026 Fieldmap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Collection marker attached to one path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionMarker {
    /// Plain segment, no collection at this level
    None,
    /// Array access: `[n]`, or `[]` for every element
    Array(Option<usize>),
    /// List access: `<n>`, or `<>` for every element
    List(Option<usize>),
    /// Key access into a map; never parsed from path text, set by modules
    /// when the field's declared collection type is a map
    Map,
}

/// One named step in a path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    name: String,
    marker: CollectionMarker,
}

impl Segment {
    pub fn new(name: impl Into<String>, marker: CollectionMarker) -> Self {
        Self {
            name: name.into(),
            marker,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn marker(&self) -> CollectionMarker {
        self.marker
    }

    /// Whether this segment addresses a collection level
    pub fn is_collection(&self) -> bool {
        !matches!(self.marker, CollectionMarker::None)
    }

    /// The concrete element index, absent for the "every element" form
    pub fn index(&self) -> Option<usize> {
        match self.marker {
            CollectionMarker::Array(index) | CollectionMarker::List(index) => index,
            _ => None,
        }
    }

    /// The same segment with its index replaced
    pub fn with_index(&self, index: usize) -> Segment {
        let marker = match self.marker {
            CollectionMarker::List(_) => CollectionMarker::List(Some(index)),
            // A plain segment being indexed becomes an array access
            _ => CollectionMarker::Array(Some(index)),
        };
        Segment {
            name: self.name.clone(),
            marker,
        }
    }
}

/// An ordered, immutable sequence of segments addressing a field
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The root path, `/`
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from pre-constructed segments
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Parse a path string
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathSyntax`] on empty segments or malformed
    /// bracket/angle-bracket index syntax.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.strip_prefix('/').unwrap_or(input);
        if trimmed.is_empty() {
            return if input.is_empty() {
                Err(syntax_error("empty path", 0, input))
            } else {
                Ok(Self::root())
            };
        }

        let mut segments = Vec::new();
        // Position of the current segment within the original input
        let mut position = input.len() - trimmed.len();
        for raw in trimmed.split('/') {
            if raw.is_empty() {
                return Err(syntax_error("empty segment", position, input));
            }
            segments.push(parse_segment(raw, position, input)?);
            position += raw.len() + 1;
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last segment, if any
    pub fn leaf(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn leaf_name(&self) -> Option<&str> {
        self.leaf().map(Segment::name)
    }

    /// The path without its leaf segment
    pub fn parent(&self) -> Option<Path> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Path {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// A new path whose leaf segment carries the given element index
    pub fn with_leaf_index(&self, index: usize) -> Result<Path> {
        let leaf = self
            .leaf()
            .ok_or_else(|| Error::invalid_state("cannot index the root path"))?;
        let mut segments = self.segments.clone();
        *segments.last_mut().unwrap() = leaf.with_index(index);
        Ok(Path { segments })
    }

    /// A new path with one more plain segment appended
    pub fn child(&self, name: impl Into<String>) -> Path {
        let mut segments = self.segments.clone();
        segments.push(Segment::new(name, CollectionMarker::None));
        Path { segments }
    }
}

fn syntax_error(message: &str, position: usize, path: &str) -> Error {
    Error::PathSyntax {
        message: message.to_string(),
        position,
        path: path.to_string(),
    }
}

fn parse_segment(raw: &str, position: usize, input: &str) -> Result<Segment> {
    let (open, close, list) = if raw.contains('[') {
        ('[', ']', false)
    } else if raw.contains('<') {
        ('<', '>', true)
    } else {
        if raw.contains(']') || raw.contains('>') {
            return Err(syntax_error("unmatched closing bracket", position, input));
        }
        return Ok(Segment::new(raw, CollectionMarker::None));
    };

    let bracket = raw.find(open).unwrap();
    let name = &raw[..bracket];
    if name.is_empty() {
        return Err(syntax_error("segment has no name", position, input));
    }
    let rest = &raw[bracket + 1..];
    let Some(body) = rest.strip_suffix(close) else {
        return Err(syntax_error("unterminated index bracket", position + bracket, input));
    };
    if body.contains(open) || body.contains(close) {
        return Err(syntax_error("nested index bracket", position + bracket, input));
    }

    let index = if body.is_empty() {
        None
    } else {
        let parsed = body.parse::<usize>().map_err(|_| {
            syntax_error("index is not a non-negative integer", position + bracket + 1, input)
        })?;
        Some(parsed)
    };

    let marker = if list {
        CollectionMarker::List(index)
    } else {
        CollectionMarker::Array(index)
    };
    Ok(Segment::new(name, marker))
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        match self.marker {
            CollectionMarker::None | CollectionMarker::Map => Ok(()),
            CollectionMarker::Array(Some(index)) => write!(f, "[{}]", index),
            CollectionMarker::Array(None) => write!(f, "[]"),
            CollectionMarker::List(Some(index)) => write!(f, "<{}>", index),
            CollectionMarker::List(None) => write!(f, "<>"),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Path::parse(s)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Path::parse(&raw).map_err(D::Error::custom)
    }
}
