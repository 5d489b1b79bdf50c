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

//! Implementation of the [`NameBuilder`] type.

use arrayvec::ArrayVec;

use super::{Error, Name, MAX_LABEL_LEN, MAX_N_LABELS, MAX_WIRE_LEN};

/// A structure for building a [`Name`] label by label or octet by
/// octet.
///
/// The builder always holds a syntactically complete name: its last
/// label is the one currently being filled, and when that label is
/// empty the name ends with the null label. Every method checks the
/// limits of [RFC 1035 § 2.3.4] as it goes, so a name that would
/// exceed 255 octets on the wire is refused at the octet that
/// overflows it.
///
/// ```
/// use dnswire::name::NameBuilder;
///
/// let mut builder = NameBuilder::new();
/// builder.try_push_label(b"example").unwrap();
/// builder.try_push_label(b"test").unwrap();
/// assert_eq!(builder.finish().unwrap(), "example.test.".parse().unwrap());
/// ```
///
/// [RFC 1035 § 2.3.4]: https://datatracker.ietf.org/doc/html/rfc1035#section-2.3.4
pub struct NameBuilder {
    wire_repr: ArrayVec<u8, MAX_WIRE_LEN>,
    label_offsets: ArrayVec<u8, MAX_N_LABELS>,
    label_start: usize,
    label_len: u8,
}

impl NameBuilder {
    /// Constructs a new `NameBuilder`, which initially contains a
    /// single null label.
    pub fn new() -> Self {
        let mut wire_repr = ArrayVec::new();
        wire_repr.push(0);
        let mut label_offsets = ArrayVec::new();
        label_offsets.push(0);
        Self {
            wire_repr,
            label_offsets,
            label_start: 0,
            label_len: 0,
        }
    }

    /// Returns whether the name currently ends with the null label.
    pub fn is_fully_qualified(&self) -> bool {
        self.label_len == 0
    }

    /// Returns the current length of the name's on-the-wire
    /// representation, counting the terminating null label.
    pub fn wire_len(&self) -> usize {
        self.wire_repr.len()
    }

    /// Tries to add the given octet to the current label. In the error
    /// case, the `NameBuilder`'s state remains unchanged.
    pub fn try_push(&mut self, octet: u8) -> Result<(), Error> {
        if self.label_len >= (MAX_LABEL_LEN as u8) {
            Err(Error::LabelTooLong)
        } else if self.wire_repr.try_push(octet).is_ok() {
            self.label_len += 1;
            Ok(())
        } else {
            Err(Error::NameTooLong)
        }
    }

    /// Tries to add the given slice to the current label. In the error
    /// case, the `NameBuilder`'s state remains unchanged.
    pub fn try_push_slice(&mut self, octets: &[u8]) -> Result<(), Error> {
        if (self.label_len as usize) + octets.len() > MAX_LABEL_LEN {
            Err(Error::LabelTooLong)
        } else if self.wire_repr.try_extend_from_slice(octets).is_ok() {
            self.label_len += octets.len() as u8;
            Ok(())
        } else {
            Err(Error::NameTooLong)
        }
    }

    /// Finishes the current label and starts a new, null one. Fails if
    /// the current label is itself null or if the name is full.
    pub fn next_label(&mut self) -> Result<(), Error> {
        if self.is_fully_qualified() {
            Err(Error::NullNonTerminal)
        } else if self.wire_repr.is_full() {
            Err(Error::NameTooLong)
        } else {
            self.wire_repr[self.label_start] = self.label_len;
            self.label_start = self.wire_repr.len();
            self.label_len = 0;

            // Neither push can fail: wire_repr is not full, and a name
            // that fits in 255 octets has at most 128 labels.
            self.wire_repr.push(0);
            self.label_offsets.push(self.label_start as u8);
            Ok(())
        }
    }

    /// Appends a complete, non-null label. Any label in progress is
    /// finished first.
    pub fn try_push_label(&mut self, octets: &[u8]) -> Result<(), Error> {
        if octets.is_empty() {
            return Err(Error::NullNonTerminal);
        }
        if !self.is_fully_qualified() {
            self.next_label()?;
        }
        self.try_push_slice(octets)?;
        self.next_label()
    }

    /// Finishes the construction of the domain name, implicitly
    /// finishing the current label if it is not null.
    pub fn finish(mut self) -> Result<Name, Error> {
        if !self.is_fully_qualified() {
            self.next_label()?;
        }
        Ok(Name {
            wire_repr: self.wire_repr,
            label_offsets: self.label_offsets,
        })
    }
}

impl Default for NameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
