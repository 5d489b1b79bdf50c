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

//! Implementation of the [`Reader`] type to read on-the-wire DNS
//! messages.

use std::convert::TryFrom;
use std::fmt;

use super::constants::HEADER_SIZE;
use super::validate::{check, Direction, ValidationError};
use super::{Header, Question, Record};
use crate::compression::{self, LabelTracker};

////////////////////////////////////////////////////////////////////////
// READER                                                             //
////////////////////////////////////////////////////////////////////////

/// A "frame" around a buffer containing a DNS message that enables
/// reading the message data.
///
/// A `Reader` is constructed with [`Reader::new`], which runs the
/// structural checks of [`check`] first. No name in a buffer that fails
/// them is ever looked at.
///
/// Header fields are available at any time through [`Reader::header`].
/// Questions and records are read with [`Reader::read_question`] and
/// [`Reader::read_rr`], which advance a cursor that starts just past
/// the header. Both take the [`LabelTracker`] of the calling context,
/// which must have been acquired for this message with the visited set
/// cleared.
pub struct Reader<'a> {
    octets: &'a [u8],
    header: Header<'a>,
    cursor: usize,
}

impl<'a> Reader<'a> {
    /// Validates `octets` as a message travelling in `direction` and
    /// creates a `Reader` for it.
    pub fn new(octets: &'a [u8], direction: Direction) -> Result<Self> {
        check(octets, direction)?;
        let header = Header::try_from(octets)?;
        Ok(Self {
            octets,
            header,
            cursor: HEADER_SIZE,
        })
    }

    /// Returns the message header.
    pub fn header(&self) -> Header<'a> {
        self.header
    }

    /// Returns the offset of the next question or record.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Reads a [`Question`] starting at the current cursor.
    ///
    /// This method is atomic, in that the cursor is not changed on
    /// failure.
    pub fn read_question(&mut self, tracker: &mut LabelTracker) -> Result<Question> {
        let (qname, qname_len) = tracker.read_name(self.octets, self.cursor)?;
        let qname_end = self.cursor + qname_len;
        let qtype = read_u16(self.octets, qname_end)?;
        let qclass = read_u16(self.octets, qname_end + 2)?;
        self.cursor = qname_end + 4;
        Ok(Question {
            qname,
            qtype,
            qclass,
        })
    }

    /// Reads a resource record at the current cursor.
    ///
    /// This method is atomic, in that the cursor is not changed on
    /// failure.
    pub fn read_rr(&mut self, tracker: &mut LabelTracker) -> Result<Record<'a>> {
        let (owner, owner_len) = tracker.read_name(self.octets, self.cursor)?;
        let owner_end = self.cursor + owner_len;
        let rr_type = read_u16(self.octets, owner_end)?;
        let class = read_u16(self.octets, owner_end + 2)?;
        let ttl = read_u32(self.octets, owner_end + 4)?;
        let rdlength = read_u16(self.octets, owner_end + 8)? as usize;
        let rdata_start = owner_end + 10;
        let rdata = self
            .octets
            .get(rdata_start..rdata_start + rdlength)
            .ok_or(Error::UnexpectedEomInField)?;
        self.cursor = rdata_start + rdlength;
        Ok(Record {
            owner,
            rr_type,
            class,
            ttl,
            rdata,
        })
    }

    /// Returns whether the `Reader`'s cursor has reached the end of the
    /// message.
    pub fn at_eom(&self) -> bool {
        self.cursor >= self.octets.len()
    }
}

impl fmt::Debug for Reader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Reader")
            .field("header", &self.header)
            .field("len", &self.octets.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

fn read_u16(octets: &[u8], at: usize) -> Result<u16> {
    match octets.get(at..at + 2) {
        Some(&[a, b]) => Ok(u16::from_be_bytes([a, b])),
        _ => Err(Error::UnexpectedEomInField),
    }
}

fn read_u32(octets: &[u8], at: usize) -> Result<u32> {
    match octets.get(at..at + 4) {
        Some(&[a, b, c, d]) => Ok(u32::from_be_bytes([a, b, c, d])),
        _ => Err(Error::UnexpectedEomInField),
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a message, [`Question`], or resource record
/// could not be read.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    Invalid(ValidationError),
    InvalidName(compression::Error),
    UnexpectedEomInField,
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Self::Invalid(err)
    }
}

impl From<compression::Error> for Error {
    fn from(err: compression::Error) -> Self {
        Self::InvalidName(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Invalid(err) => write!(f, "invalid message: {}", err),
            Self::InvalidName(err) => write!(f, "invalid name: {}", err),
            Self::UnexpectedEomInField => f.write_str("unexpected end of message in field"),
        }
    }
}

impl std::error::Error for Error {}

/// The type returned by fallible [`Reader`] methods.
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::TrackerSlot;
    use crate::name::Name;

    /// This is a reply to a query for example.com. IN NS to a recursive
    /// server, made on January 7, 2022.
    const EXAMPLE_COM_NS_MESSAGE: &[u8] =
        b"\xe2\xd7\x81\x80\x00\x01\x00\x02\x00\x00\x00\x01\x07\x65\x78\x61\
          \x6d\x70\x6c\x65\x03\x63\x6f\x6d\x00\x00\x02\x00\x01\xc0\x0c\x00\
          \x02\x00\x01\x00\x01\x50\xa2\x00\x14\x01\x61\x0c\x69\x61\x6e\x61\
          \x2d\x73\x65\x72\x76\x65\x72\x73\x03\x6e\x65\x74\x00\xc0\x0c\x00\
          \x02\x00\x01\x00\x01\x50\xa2\x00\x04\x01\x62\xc0\x2b\x00\x00\x29\
          \x10\x00\x00\x00\x00\x00\x00\x00";

    #[test]
    fn reader_works() {
        let mut slot = TrackerSlot::new();
        let tracker = slot
            .acquire(EXAMPLE_COM_NS_MESSAGE.len(), true)
            .unwrap();
        let mut reader = Reader::new(EXAMPLE_COM_NS_MESSAGE, Direction::Response).unwrap();
        let expected_qname: Name = "example.com.".parse().unwrap();
        let expected_ns_a: Name = "a.iana-servers.net.".parse().unwrap();

        // Check the header.
        let header = reader.header();
        assert_eq!(header.id(), 0xe2d7);
        assert!(header.qr());
        assert_eq!(header.qdcount(), 1);
        assert_eq!(header.ancount(), 2);
        assert_eq!(header.nscount(), 0);
        assert_eq!(header.arcount(), 1);

        // Check the question.
        let question = reader.read_question(tracker).unwrap();
        assert_eq!(question.qname, expected_qname);
        assert_eq!(question.qtype, 2);
        assert_eq!(question.qclass, 1);

        // Check the answers. The RDATA is opaque, so the second NS
        // name stays compressed.
        let answer_1 = reader.read_rr(tracker).unwrap();
        assert_eq!(answer_1.owner, expected_qname);
        assert_eq!(answer_1.rr_type, 2);
        assert_eq!(answer_1.class, 1);
        assert_eq!(answer_1.ttl, 86178);
        assert_eq!(answer_1.rdata, expected_ns_a.wire_repr());
        let answer_2 = reader.read_rr(tracker).unwrap();
        assert_eq!(answer_2.owner, expected_qname);
        assert_eq!(answer_2.rdata, b"\x01b\xc0\x2b");
        let (target, _) = tracker.read_name(EXAMPLE_COM_NS_MESSAGE, 0x2b).unwrap();
        assert_eq!(target, "iana-servers.net.".parse::<Name>().unwrap());

        // Check the OPT record.
        let opt = reader.read_rr(tracker).unwrap();
        assert!(opt.owner.is_root());
        assert_eq!(opt.rr_type, 41);
        assert_eq!(opt.class, 4096);
        assert!(opt.rdata.is_empty());

        // And that should be it!
        assert!(reader.at_eom());
    }

    #[test]
    fn reader_rejects_invalid_messages() {
        assert_eq!(
            Reader::new(EXAMPLE_COM_NS_MESSAGE, Direction::Query).unwrap_err(),
            Error::Invalid(ValidationError::DirectionMismatch {
                expected: Direction::Query
            })
        );
        for size in 0..=HEADER_SIZE {
            let buf = vec![0; size];
            assert_eq!(
                Reader::new(&buf, Direction::Query).unwrap_err(),
                Error::Invalid(ValidationError::HeaderTooShort)
            );
        }
    }

    #[test]
    fn failed_reads_leave_cursor_alone() {
        // The question is cut off inside QCLASS.
        let message = &EXAMPLE_COM_NS_MESSAGE[..28];
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(message.len(), true).unwrap();
        let mut reader = Reader::new(message, Direction::Response).unwrap();
        assert_eq!(
            reader.read_question(tracker),
            Err(Error::UnexpectedEomInField)
        );
        assert_eq!(reader.cursor(), HEADER_SIZE);

        // Truncated RDATA.
        let message = &EXAMPLE_COM_NS_MESSAGE[..50];
        let tracker = slot.acquire(message.len(), true).unwrap();
        let mut reader = Reader::new(message, Direction::Response).unwrap();
        reader.read_question(tracker).unwrap();
        let cursor = reader.cursor();
        assert_eq!(reader.read_rr(tracker), Err(Error::UnexpectedEomInField));
        assert_eq!(reader.cursor(), cursor);
    }

    #[test]
    fn name_errors_are_reported() {
        let mut message = EXAMPLE_COM_NS_MESSAGE[..12].to_vec();
        message.extend_from_slice(b"\xc0\x0c\x00\x01\x00\x01");
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(message.len(), true).unwrap();
        let mut reader = Reader::new(&message, Direction::Response).unwrap();
        assert_eq!(
            reader.read_question(tracker),
            Err(Error::InvalidName(compression::Error::CompressionLoop))
        );
    }
}
