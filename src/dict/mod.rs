// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! The DNS field dictionary.
//!
//! A [`Dictionary`] describes the named fields that make up DNS
//! messages, for encoders that work field by field rather than through
//! the [`Reader`](crate::message::Reader) and
//! [`Writer`](crate::message::Writer). It is built once with a
//! [`DictionaryBuilder`], which validates every definition, and is
//! immutable afterwards; share it with an [`Arc`](std::sync::Arc).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

mod length;
pub use length::{wire_length, Value, MAX_ARRAY_ELEMENT_LEN};

/// The size, in octets, of a field's type number in this protocol.
pub const DEFAULT_TYPE_SIZE: usize = 2;

/// The size, in octets, of a field's length prefix in this protocol.
pub const DEFAULT_LENGTH_WIDTH: usize = 2;

/// The structural fields present in every DNS dictionary.
const DNS_STRUCTURAL_FIELDS: [&str; 5] = ["packet", "question", "rr", "ns", "ar"];

////////////////////////////////////////////////////////////////////////
// FIELD TYPES AND FLAGS                                              //
////////////////////////////////////////////////////////////////////////

/// The data type of a field.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FieldType {
    Bool,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int32,
    Ipv4Addr,
    Ipv6Addr,
    String,
    Octets,
    Struct,
}

impl FieldType {
    const ALL: [Self; 11] = [
        Self::Bool,
        Self::Uint8,
        Self::Uint16,
        Self::Uint32,
        Self::Uint64,
        Self::Int32,
        Self::Ipv4Addr,
        Self::Ipv6Addr,
        Self::String,
        Self::Octets,
        Self::Struct,
    ];

    /// Returns the name of the type as used in configuration.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Int32 => "int32",
            Self::Ipv4Addr => "ipv4addr",
            Self::Ipv6Addr => "ipv6addr",
            Self::String => "string",
            Self::Octets => "octets",
            Self::Struct => "struct",
        }
    }

    /// Returns whether values of this type vary in length.
    pub fn is_variable_size(self) -> bool {
        matches!(self, Self::String | Self::Octets)
    }

    /// Returns whether this type groups other fields instead of holding
    /// a value.
    pub fn is_structural(self) -> bool {
        self == Self::Struct
    }

    /// Returns the encoded length of every value of this type, if it is
    /// fixed.
    pub fn fixed_len(self) -> Option<usize> {
        match self {
            Self::Bool | Self::Uint8 => Some(1),
            Self::Uint16 => Some(2),
            Self::Uint32 | Self::Int32 | Self::Ipv4Addr => Some(4),
            Self::Uint64 => Some(8),
            Self::Ipv6Addr => Some(16),
            Self::String | Self::Octets | Self::Struct => None,
        }
    }
}

impl FromStr for FieldType {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(text))
            .ok_or("unknown field type")
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A protocol-specific refinement of a field's type.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Subtype {
    /// The field holds a domain name, which must be encoded and decoded
    /// through a [`LabelTracker`](crate::compression::LabelTracker).
    DnsLabel,
}

impl FromStr for Subtype {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.eq_ignore_ascii_case("dns_label") {
            Ok(Self::DnsLabel)
        } else {
            Err("unknown subtype")
        }
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::DnsLabel => f.write_str("dns_label"),
        }
    }
}

/// Flags refining a field definition.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct FieldFlags {
    /// A fixed encoded length for a variable-size type.
    pub length: Option<u16>,

    /// Whether the field is an array. Each element of an array of
    /// strings or octets is preceded by a 16-bit length.
    pub array: bool,

    pub subtype: Option<Subtype>,

    /// Set by [`DictionaryBuilder::define`] for fields whose elements
    /// carry their own length.
    pub known_width: bool,
}

////////////////////////////////////////////////////////////////////////
// FIELD DEFINITIONS                                                  //
////////////////////////////////////////////////////////////////////////

/// The identifier of a field within its [`Dictionary`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FieldId(u32);

impl From<FieldId> for u32 {
    fn from(id: FieldId) -> Self {
        id.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated field definition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldDef {
    id: FieldId,
    name: Box<str>,
    field_type: FieldType,
    flags: FieldFlags,
}

impl FieldDef {
    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn flags(&self) -> &FieldFlags {
        &self.flags
    }
}

impl fmt::Display for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:>4}  {:<24} {}", self.id.0, self.name, self.field_type)?;
        if let Some(length) = self.flags.length {
            write!(f, "[{}]", length)?;
        }
        if self.flags.array {
            f.write_str(" array")?;
        }
        if let Some(subtype) = self.flags.subtype {
            write!(f, " {}", subtype)?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// DICTIONARY                                                         //
////////////////////////////////////////////////////////////////////////

/// An immutable set of field definitions.
#[derive(Clone, Debug)]
pub struct Dictionary {
    fields: Vec<FieldDef>,
    by_name: HashMap<Box<str>, FieldId>,
    type_size: usize,
    length_width: usize,
}

impl Dictionary {
    /// Returns the DNS dictionary, which holds the structural fields
    /// `packet`, `question`, `rr`, `ns`, and `ar`.
    pub fn dns() -> Self {
        DictionaryBuilder::dns().build()
    }

    /// Looks up a field by its identifier.
    pub fn lookup(&self, id: FieldId) -> Option<&FieldDef> {
        self.fields.get(id.0 as usize)
    }

    /// Looks up a field by name. Names are case-sensitive.
    pub fn by_name(&self, name: &str) -> Option<&FieldDef> {
        self.by_name.get(name).and_then(|id| self.lookup(*id))
    }

    /// Returns the size, in octets, of the type number that precedes
    /// an encoded field.
    pub fn type_size(&self) -> usize {
        self.type_size
    }

    /// Returns the size, in octets, of the length prefix of an encoded
    /// variable-size field.
    pub fn length_width(&self) -> usize {
        self.length_width
    }

    /// Returns an iterator over the fields, in definition order.
    pub fn iter(&self) -> std::slice::Iter<FieldDef> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = &'a FieldDef;
    type IntoIter = std::slice::Iter<'a, FieldDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Builds a [`Dictionary`], validating each definition as it is added.
#[derive(Debug, Default)]
pub struct DictionaryBuilder {
    fields: Vec<FieldDef>,
    by_name: HashMap<Box<str>, FieldId>,
}

impl DictionaryBuilder {
    /// Creates a builder with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder holding the fields of [`Dictionary::dns`].
    pub fn dns() -> Self {
        let mut builder = Self::new();
        for name in DNS_STRUCTURAL_FIELDS {
            builder.insert(name, FieldType::Struct, FieldFlags::default());
        }
        builder
    }

    /// Defines a new field and returns its identifier.
    ///
    /// Arrays of strings or octets are marked as known-width, since
    /// each element carries a 16-bit length. The
    /// [`DnsLabel`](Subtype::DnsLabel) subtype is only allowed on
    /// string fields, which it also marks as known-width.
    pub fn define(
        &mut self,
        name: &str,
        field_type: FieldType,
        mut flags: FieldFlags,
    ) -> Result<FieldId, Error> {
        if self.by_name.contains_key(name) {
            return Err(Error::DuplicateName(name.into()));
        }
        if flags.array && field_type.is_variable_size() {
            flags.known_width = true;
        }
        if let Some(Subtype::DnsLabel) = flags.subtype {
            if field_type != FieldType::String {
                return Err(Error::LabelSubtypeNotString(name.into()));
            }
            flags.known_width = true;
        }
        Ok(self.insert(name, field_type, flags))
    }

    fn insert(&mut self, name: &str, field_type: FieldType, flags: FieldFlags) -> FieldId {
        let id = FieldId(self.fields.len() as u32);
        self.fields.push(FieldDef {
            id,
            name: name.into(),
            field_type,
            flags,
        });
        self.by_name.insert(name.into(), id);
        id
    }

    /// Finishes building.
    pub fn build(self) -> Dictionary {
        Dictionary {
            fields: self.fields,
            by_name: self.by_name,
            type_size: DEFAULT_TYPE_SIZE,
            length_width: DEFAULT_LENGTH_WIDTH,
        }
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a field definition was rejected.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    LabelSubtypeNotString(Box<str>),
    DuplicateName(Box<str>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::LabelSubtypeNotString(name) => write!(
                f,
                "field {}: the dns_label subtype can only be used with string fields",
                name
            ),
            Self::DuplicateName(name) => write!(f, "field {} is already defined", name),
        }
    }
}

impl std::error::Error for Error {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
