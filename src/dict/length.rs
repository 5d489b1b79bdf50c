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

//! Encoded lengths of field values.

use std::net::{Ipv4Addr, Ipv6Addr};

use super::{FieldDef, FieldType, Subtype};

/// The longest array element of strings or octets that can be encoded,
/// since each element carries a 16-bit length.
pub const MAX_ARRAY_ELEMENT_LEN: usize = 65535;

/// A value of a field, borrowed from wherever it is stored.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Value<'a> {
    Bool(bool),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Int32(i32),
    Ipv4Addr(Ipv4Addr),
    Ipv6Addr(Ipv6Addr),
    String(&'a str),
    Octets(&'a [u8]),
}

impl Value<'_> {
    /// Returns the type of the value.
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Bool(_) => FieldType::Bool,
            Self::Uint8(_) => FieldType::Uint8,
            Self::Uint16(_) => FieldType::Uint16,
            Self::Uint32(_) => FieldType::Uint32,
            Self::Uint64(_) => FieldType::Uint64,
            Self::Int32(_) => FieldType::Int32,
            Self::Ipv4Addr(_) => FieldType::Ipv4Addr,
            Self::Ipv6Addr(_) => FieldType::Ipv6Addr,
            Self::String(_) => FieldType::String,
            Self::Octets(_) => FieldType::Octets,
        }
    }

    /// Returns the length of the value in network encoding.
    pub fn network_len(&self) -> usize {
        match self {
            Self::String(s) => s.len(),
            Self::Octets(o) => o.len(),
            other => other.field_type().fixed_len().unwrap_or(0),
        }
    }
}

/// Returns the number of octets `value` occupies on the wire as a value
/// of `field`:
///
/// * the declared length, for a variable-size field with a fixed
///   length;
/// * the length capped at [`MAX_ARRAY_ELEMENT_LEN`], for an element of
///   an array of strings or octets; and
/// * the value's natural network length otherwise.
///
/// Structural fields have no value, and domain names are sized by the
/// [`LabelTracker`](crate::compression::LabelTracker) that compresses
/// them. Asking for either is a bug: it panics in debug builds and
/// returns 0 in release builds.
pub fn wire_length(field: &FieldDef, value: &Value) -> usize {
    let field_type = field.field_type();
    if field_type.is_structural() {
        debug_assert!(false, "structural field {} has no value", field.name());
        return 0;
    }
    if !field_type.is_variable_size() {
        return value.network_len();
    }

    let flags = field.flags();
    if flags.subtype == Some(Subtype::DnsLabel) {
        debug_assert!(
            false,
            "field {} holds domain names, which only a label tracker can size",
            field.name()
        );
        return 0;
    }
    if let Some(length) = flags.length {
        return length as usize;
    }
    let len = value.network_len();
    if flags.array {
        len.min(MAX_ARRAY_ELEMENT_LEN)
    } else {
        len
    }
}

#[cfg(test)]
mod tests {
    use super::super::{DictionaryBuilder, FieldFlags};
    use super::*;

    fn field(field_type: FieldType, flags: FieldFlags) -> FieldDef {
        let mut builder = DictionaryBuilder::new();
        let id = builder.define("field", field_type, flags).unwrap();
        builder.build().lookup(id).unwrap().clone()
    }

    #[test]
    fn scalars_use_natural_length() {
        let cases = [
            (FieldType::Bool, Value::Bool(true), 1),
            (FieldType::Uint8, Value::Uint8(7), 1),
            (FieldType::Uint16, Value::Uint16(7), 2),
            (FieldType::Uint32, Value::Uint32(7), 4),
            (FieldType::Int32, Value::Int32(-7), 4),
            (FieldType::Uint64, Value::Uint64(7), 8),
            (FieldType::Ipv4Addr, Value::Ipv4Addr(Ipv4Addr::LOCALHOST), 4),
            (FieldType::Ipv6Addr, Value::Ipv6Addr(Ipv6Addr::LOCALHOST), 16),
        ];
        for (field_type, value, expected) in cases {
            let field = field(field_type, FieldFlags::default());
            assert_eq!(wire_length(&field, &value), expected);
        }
    }

    #[test]
    fn variable_size_values_use_their_length() {
        let field = field(FieldType::Octets, FieldFlags::default());
        assert_eq!(wire_length(&field, &Value::Octets(&[1, 2, 3])), 3);
        let big = vec![0; 70000];
        assert_eq!(wire_length(&field, &Value::Octets(&big)), 70000);
    }

    #[test]
    fn fixed_length_overrides_value_length() {
        let flags = FieldFlags {
            length: Some(16),
            ..FieldFlags::default()
        };
        let field = field(FieldType::Octets, flags);
        assert_eq!(wire_length(&field, &Value::Octets(b"abc")), 16);
    }

    #[test]
    fn array_elements_are_capped() {
        let flags = FieldFlags {
            array: true,
            ..FieldFlags::default()
        };
        let big = "x".repeat(70000);
        let strings = field(FieldType::String, flags);
        assert_eq!(wire_length(&strings, &Value::String(&big)), 65535);
        assert_eq!(wire_length(&strings, &Value::String("short")), 5);
        let octets = field(FieldType::Octets, flags);
        assert_eq!(wire_length(&octets, &Value::Octets(big.as_bytes())), 65535);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn structural_fields_have_no_length() {
        let field = field(FieldType::Struct, FieldFlags::default());
        wire_length(&field, &Value::Uint8(0));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn label_fields_have_no_length() {
        let flags = FieldFlags {
            subtype: Some(Subtype::DnsLabel),
            ..FieldFlags::default()
        };
        let field = field(FieldType::String, flags);
        wire_length(&field, &Value::String("example.com"));
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn bugs_yield_zero_in_release_builds() {
        let field = field(FieldType::Struct, FieldFlags::default());
        assert_eq!(wire_length(&field, &Value::Uint8(0)), 0);
    }
}
