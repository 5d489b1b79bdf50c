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

//! Implementation of data structures related to domain names.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::ops::Index;
use std::str::FromStr;

use arrayvec::ArrayVec;

mod builder;
mod error;
mod label;
pub use builder::NameBuilder;
pub use error::Error;
pub use label::Label;

/// The maximum number of labels in a domain name, counting the null
/// label.
pub const MAX_N_LABELS: usize = 128;

/// The maximum length of the uncompressed on-the-wire representation of
/// a domain name.
pub const MAX_WIRE_LEN: usize = 255;

/// The maximum length of a label in a domain name (not including the
/// octet that provides the length).
pub const MAX_LABEL_LEN: usize = 63;

////////////////////////////////////////////////////////////////////////
// NAME STRUCTURE                                                     //
////////////////////////////////////////////////////////////////////////

/// A domain name.
///
/// A `Name` stores the uncompressed on-the-wire representation of the
/// name, as defined in [RFC 1035 § 3.1], together with the offset of
/// each label within it. It therefore never exceeds 255 octets and
/// always ends with the null label. Both buffers are inline, so a
/// `Name` never allocates.
///
/// `Name`s can be constructed
///
/// * through the [`FromStr`] implementation (a trailing dot is
///   optional);
/// * through a [`NameBuilder`]; or
/// * by decoding a possibly compressed name from a message with
///   [`LabelTracker::read_name`](crate::compression::LabelTracker::read_name).
///
/// Equality and hashing are ASCII-case-insensitive, following the
/// [`Label`] type; the case of the stored octets is preserved.
///
/// [RFC 1035 § 3.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.1
#[derive(Clone)]
pub struct Name {
    wire_repr: ArrayVec<u8, MAX_WIRE_LEN>,
    label_offsets: ArrayVec<u8, MAX_N_LABELS>,
}

#[allow(clippy::len_without_is_empty)] // A domain name is never empty!
impl Name {
    /// Returns a `Name` representing the DNS root, `.`.
    pub fn root() -> Self {
        let mut wire_repr = ArrayVec::new();
        wire_repr.push(0);
        let mut label_offsets = ArrayVec::new();
        label_offsets.push(0);
        Self {
            wire_repr,
            label_offsets,
        }
    }

    /// Returns whether the `Name` is the DNS root `.`.
    pub fn is_root(&self) -> bool {
        self.label_offsets.len() == 1
    }

    /// Returns an iterator over labels in this `Name`, ending with the
    /// null label.
    pub fn labels(&self) -> Labels {
        Labels {
            name: self,
            front: 0,
            back: self.len(),
        }
    }

    /// Returns the number of labels in this `Name`, counting the null
    /// label.
    pub fn len(&self) -> usize {
        self.label_offsets.len()
    }

    /// Returns the uncompressed on-the-wire representation.
    pub fn wire_repr(&self) -> &[u8] {
        &self.wire_repr
    }

    /// Returns the length of the uncompressed on-the-wire
    /// representation.
    pub fn wire_len(&self) -> usize {
        self.wire_repr.len()
    }

    /// Returns the on-the-wire representation of the first `n` labels
    /// of the name. If `n` equals [`Name::len`], this is the whole
    /// representation. Panics if `n` is greater than [`Name::len`].
    pub fn wire_repr_to(&self, n: usize) -> &[u8] {
        if n == self.len() {
            &self.wire_repr
        } else {
            &self.wire_repr[..self.label_offset(n)]
        }
    }

    /// Returns whether the two names have identical on-the-wire
    /// representations, including the case of every octet.
    pub fn eq_case_sensitive(&self, other: &Name) -> bool {
        self.wire_repr == other.wire_repr
    }

    fn label_offset(&self, n: usize) -> usize {
        self.label_offsets[n] as usize
    }
}

impl Index<usize> for Name {
    type Output = Label;

    fn index(&self, index: usize) -> &Self::Output {
        let offset = self.label_offset(index);
        let len = self.wire_repr[offset] as usize;
        Label::from_unchecked(&self.wire_repr[offset + 1..offset + 1 + len])
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            f.write_str(".")
        } else {
            for label in self.labels().take(self.len() - 1) {
                write!(f, "{}.", label)?;
            }
            Ok(())
        }
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.labels().zip(other.labels()).all(|(a, b)| a == b)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for label in self.labels() {
            label.hash(state);
        }
    }
}

////////////////////////////////////////////////////////////////////////
// ITERATION OVER A NAME'S LABELS                                     //
////////////////////////////////////////////////////////////////////////

/// An iterator over the [`Label`]s in a [`Name`], constructed with
/// [`Name::labels`].
#[derive(Clone, Debug)]
pub struct Labels<'a> {
    name: &'a Name,
    front: usize,
    back: usize,
}

impl<'a> Iterator for Labels<'a> {
    type Item = &'a Label;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            let this_one = self.front;
            self.front += 1;
            Some(&self.name[this_one])
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl DoubleEndedIterator for Labels<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.back > self.front {
            self.back -= 1;
            Some(&self.name[self.back])
        } else {
            None
        }
    }
}

impl ExactSizeIterator for Labels<'_> {}

impl FusedIterator for Labels<'_> {}

////////////////////////////////////////////////////////////////////////
// PARSING NAMES FROM STRINGS                                         //
////////////////////////////////////////////////////////////////////////

/// Parses a name in the zone-file format of [RFC 1035 § 5.1]. The
/// escapes `\X` and `\DDD` are supported. The trailing dot may be
/// omitted; the name is always treated as fully qualified.
///
/// [RFC 1035 § 5.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-5.1
impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::StrEmpty);
        } else if s == "." {
            return Ok(Name::root());
        }

        let mut remaining_octets = s.as_bytes();
        let mut builder = NameBuilder::new();

        // Every multi-byte UTF-8 sequence starts with a non-ASCII
        // octet, so checking octet by octet suffices.
        while let Some(&octet) = remaining_octets.first() {
            if octet == b'\\' {
                let (value, consumed) = parse_escape(&remaining_octets[1..])?;
                builder.try_push(value)?;
                remaining_octets = &remaining_octets[consumed + 1..];
            } else if octet == b'.' {
                builder.next_label()?;
                remaining_octets = &remaining_octets[1..];
            } else if !octet.is_ascii() {
                return Err(Error::StrNotAscii);
            } else {
                builder.try_push(octet)?;
                remaining_octets = &remaining_octets[1..];
            }
        }
        builder.finish()
    }
}

/// Parses an escape sequence. `remaining_octets` starts with the octet
/// immediately *after* the backslash.
fn parse_escape(remaining_octets: &[u8]) -> Result<(u8, usize), Error> {
    match remaining_octets {
        [] => Err(Error::InvalidEscape),
        [a, b, c, ..] if a.is_ascii_digit() && b.is_ascii_digit() && c.is_ascii_digit() => {
            let value =
                100 * (a - b'0') as usize + 10 * (b - b'0') as usize + (c - b'0') as usize;
            u8::try_from(value)
                .map(|v| (v, 3))
                .map_err(|_| Error::InvalidEscape)
        }
        [a, ..] if a.is_ascii_digit() => Err(Error::InvalidEscape),
        [a, ..] => Ok((*a, 1)),
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_expected_characteristics() {
        let root = Name::root();
        assert!(root.is_root());
        assert_eq!(root.len(), 1);
        assert_eq!(root.wire_repr(), &[0]);
        assert_eq!(root.to_string(), ".");
    }

    #[test]
    fn labels_iterator_works() {
        let name: Name = "a.b.example.test.".parse().unwrap();
        let labels: Vec<&[u8]> = name.labels().map(Label::octets).collect();
        let expected: [&[u8]; 5] = [b"a", b"b", b"example", b"test", b""];
        assert_eq!(labels, expected);
        assert_eq!(name.labels().rev().nth(1).unwrap().octets(), b"test");
    }

    #[test]
    fn wire_repr_to_works() {
        let name: Name = "a.bb.ccc.".parse().unwrap();
        assert_eq!(name.wire_repr_to(0), b"");
        assert_eq!(name.wire_repr_to(1), b"\x01a");
        assert_eq!(name.wire_repr_to(3), b"\x01a\x02bb\x03ccc");
        assert_eq!(name.wire_repr_to(4), b"\x01a\x02bb\x03ccc\x00");
    }

    #[test]
    fn fromstr_works_with_and_without_trailing_dot() {
        let absolute: Name = "example.test.".parse().unwrap();
        let relative: Name = "example.test".parse().unwrap();
        assert_eq!(absolute.wire_repr(), b"\x07example\x04test\x00");
        assert!(absolute.eq_case_sensitive(&relative));
    }

    #[test]
    fn fromstr_rejects_bad_input() {
        assert_eq!("".parse::<Name>(), Err(Error::StrEmpty));
        assert_eq!("✈.aero.".parse::<Name>(), Err(Error::StrNotAscii));
        assert_eq!("a.b..c.".parse::<Name>(), Err(Error::NullNonTerminal));
        assert_eq!("\\00x.".parse::<Name>(), Err(Error::InvalidEscape));
        assert_eq!("\\256.".parse::<Name>(), Err(Error::InvalidEscape));
        assert_eq!(
            "xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx."
                .parse::<Name>(),
            Err(Error::LabelTooLong)
        );
    }

    #[test]
    fn fromstr_escaping_works() {
        let escaped: Name = "\\000.\\\\\\..".parse().unwrap();
        assert_eq!(escaped.wire_repr(), b"\x01\x00\x02\\.\x00");
        assert_eq!(escaped.to_string(), "\\000.\\\\\\..");
    }

    #[test]
    fn eq_is_case_insensitive_but_case_is_preserved() {
        let upper: Name = "WWW.Example.COM".parse().unwrap();
        let lower: Name = "www.example.com".parse().unwrap();
        assert_eq!(upper, lower);
        assert!(!upper.eq_case_sensitive(&lower));
        assert_eq!(upper.to_string(), "WWW.Example.COM.");
    }
}
