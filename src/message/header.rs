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

//! Implementation of the read-only [`Header`] view.

use std::convert::TryFrom;
use std::fmt;

use super::constants::*;
use super::validate::ValidationError;

/// A read-only view of the fixed 12-octet header at the start of a DNS
/// message.
///
/// A `Header` is constructed with its [`TryFrom`] implementation, which
/// only checks that the buffer is long enough to hold a header. No
/// field is otherwise interpreted or trusted; use
/// [`check`](super::check) for structural validation.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Header<'a> {
    octets: &'a [u8],
}

impl<'a> Header<'a> {
    /// Returns the 16-bit ID of the message.
    pub fn id(&self) -> u16 {
        self.u16_at(ID_OFFSET)
    }

    /// Returns whether the QR (query response) bit is set.
    pub fn qr(&self) -> bool {
        (self.octets[FLAGS_HI] & QR_MASK) != 0
    }

    /// Returns the raw four-bit opcode.
    pub fn opcode(&self) -> u8 {
        (self.octets[FLAGS_HI] & OPCODE_MASK) >> OPCODE_SHIFT
    }

    /// Returns whether the AA (authoritative answer) bit is set.
    pub fn aa(&self) -> bool {
        (self.octets[FLAGS_HI] & AA_MASK) != 0
    }

    /// Returns whether the TC (truncation) bit is set.
    pub fn tc(&self) -> bool {
        (self.octets[FLAGS_HI] & TC_MASK) != 0
    }

    /// Returns whether the RD (recursion desired) bit is set.
    pub fn rd(&self) -> bool {
        (self.octets[FLAGS_HI] & RD_MASK) != 0
    }

    /// Returns whether the RA (recursion available) bit is set.
    pub fn ra(&self) -> bool {
        (self.octets[FLAGS_LO] & RA_MASK) != 0
    }

    /// Returns the raw four-bit RCODE.
    pub fn rcode(&self) -> u8 {
        self.octets[FLAGS_LO] & RCODE_MASK
    }

    /// Returns the number of questions in the message.
    pub fn qdcount(&self) -> u16 {
        self.u16_at(QDCOUNT_OFFSET)
    }

    /// Returns the number of answers in the message.
    pub fn ancount(&self) -> u16 {
        self.u16_at(ANCOUNT_OFFSET)
    }

    /// Returns the number of authority records in the message.
    pub fn nscount(&self) -> u16 {
        self.u16_at(NSCOUNT_OFFSET)
    }

    /// Returns the number of additional records in the message.
    pub fn arcount(&self) -> u16 {
        self.u16_at(ARCOUNT_OFFSET)
    }

    fn u16_at(&self, offset: usize) -> u16 {
        u16::from_be_bytes([self.octets[offset], self.octets[offset + 1]])
    }
}

impl<'a> TryFrom<&'a [u8]> for Header<'a> {
    type Error = ValidationError;

    fn try_from(octets: &'a [u8]) -> Result<Self, Self::Error> {
        if octets.len() >= HEADER_SIZE {
            Ok(Self { octets })
        } else {
            Err(ValidationError::HeaderTooShort)
        }
    }
}

impl fmt::Debug for Header<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Header")
            .field("id", &self.id())
            .field("qr", &self.qr())
            .field("opcode", &self.opcode())
            .field("aa", &self.aa())
            .field("tc", &self.tc())
            .field("rd", &self.rd())
            .field("ra", &self.ra())
            .field("rcode", &self.rcode())
            .field("qdcount", &self.qdcount())
            .field("ancount", &self.ancount())
            .field("nscount", &self.nscount())
            .field("arcount", &self.arcount())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
