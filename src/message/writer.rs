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

//! Implementation of the [`Writer`] type to write on-the-wire DNS
//! messages.

use std::fmt;

use super::constants::*;
use super::{Question, Record};
use crate::compression::{Compression, LabelTracker, Span};
use crate::name::Name;

////////////////////////////////////////////////////////////////////////
// WRITER                                                             //
////////////////////////////////////////////////////////////////////////

/// A "frame" around a buffer that serializes a DNS message into it.
///
/// A `Writer` is constructed using [`Writer::new`]. The underlying
/// buffer must be long enough to accommodate a full DNS message header
/// of 12 octets, which is initially zeroed. At most 65,535 octets of
/// the buffer are used.
///
/// Since header information is in a fixed position, it can be written
/// at any time through the appropriate `Writer` methods. Questions and
/// resource records are written sequentially based on a cursor, so
/// [`Writer::add_question`], [`Writer::add_answer_rr`],
/// [`Writer::add_authority_rr`], and [`Writer::add_additional_rr`] must
/// be used in that order. Attempts to use them out of order fail with
/// [`Error::OutOfOrder`].
///
/// Each of these methods takes the calling context's [`LabelTracker`],
/// acquired for this message, and compresses the owner name or QNAME
/// against the names written before it. Passing `None` writes the name
/// uncompressed. If a method fails, the message (and the tracker's
/// recorded spans) are left exactly as they were before the call.
pub struct Writer<'a> {
    octets: &'a mut [u8],
    cursor: usize,
    limit: usize,
    section: Section,
    qdcount: u16,
    ancount: u16,
    nscount: u16,
    arcount: u16,
}

/// A type for recording which section of a DNS message a [`Writer`] is
/// currently serializing.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
enum Section {
    Question,
    Answer,
    Authority,
    Additional,
}

impl<'a> Writer<'a> {
    /// Creates a new `Writer` over `octets`. Fails if the buffer cannot
    /// hold the header.
    pub fn new(octets: &'a mut [u8]) -> Result<Self> {
        let limit = octets.len().min(MAX_MESSAGE_SIZE);
        if limit < HEADER_SIZE {
            return Err(Error::Truncation);
        }
        octets[..HEADER_SIZE].fill(0);
        Ok(Self {
            octets,
            cursor: HEADER_SIZE,
            limit,
            section: Section::Question,
            qdcount: 0,
            ancount: 0,
            nscount: 0,
            arcount: 0,
        })
    }

    /// Returns the ID of the message.
    pub fn id(&self) -> u16 {
        u16::from_be_bytes([self.octets[ID_OFFSET], self.octets[ID_OFFSET + 1]])
    }

    /// Sets the ID of the message.
    pub fn set_id(&mut self, id: u16) {
        self.write(ID_OFFSET, &id.to_be_bytes());
    }

    /// Sets the QR (query response) bit.
    pub fn set_qr(&mut self, qr: bool) {
        self.set_flag(QR_MASK, qr);
    }

    /// Sets the four-bit opcode. Higher bits of `opcode` are ignored.
    pub fn set_opcode(&mut self, opcode: u8) {
        let flags = self.octets[FLAGS_HI] & !OPCODE_MASK;
        self.octets[FLAGS_HI] = flags | ((opcode << OPCODE_SHIFT) & OPCODE_MASK);
    }

    /// Sets the RD (recursion desired) bit.
    pub fn set_rd(&mut self, rd: bool) {
        self.set_flag(RD_MASK, rd);
    }

    fn set_flag(&mut self, mask: u8, value: bool) {
        if value {
            self.octets[FLAGS_HI] |= mask;
        } else {
            self.octets[FLAGS_HI] &= !mask;
        }
    }

    /// Returns the current number of questions in the message.
    pub fn qdcount(&self) -> u16 {
        self.qdcount
    }

    /// Returns the current number of answer RRs in the message.
    pub fn ancount(&self) -> u16 {
        self.ancount
    }

    /// Returns the current number of authority RRs in the message.
    pub fn nscount(&self) -> u16 {
        self.nscount
    }

    /// Returns the current number of additional RRs in the message.
    pub fn arcount(&self) -> u16 {
        self.arcount
    }

    /// Adds a question to the message. This must be used before any
    /// resource records are added.
    pub fn add_question(
        &mut self,
        tracker: Option<&mut LabelTracker>,
        question: &Question,
    ) -> Result<()> {
        if self.section != Section::Question {
            return Err(Error::OutOfOrder);
        }
        let new_qdcount = self.qdcount.checked_add(1).ok_or(Error::CountOverflow)?;
        self.with_rollback(tracker, |this, tracker| {
            this.write_name(tracker, &question.qname)?;
            this.try_push(&question.qtype.to_be_bytes())?;
            this.try_push(&question.qclass.to_be_bytes())
        })?;
        self.qdcount = new_qdcount;
        Ok(())
    }

    /// Adds a resource record to the answer section of the message.
    pub fn add_answer_rr(
        &mut self,
        tracker: Option<&mut LabelTracker>,
        record: &Record,
    ) -> Result<()> {
        self.add_rr(Section::Answer, tracker, record)
    }

    /// Adds a resource record to the authority section of the message.
    pub fn add_authority_rr(
        &mut self,
        tracker: Option<&mut LabelTracker>,
        record: &Record,
    ) -> Result<()> {
        self.add_rr(Section::Authority, tracker, record)
    }

    /// Adds a resource record to the additional section of the message.
    pub fn add_additional_rr(
        &mut self,
        tracker: Option<&mut LabelTracker>,
        record: &Record,
    ) -> Result<()> {
        self.add_rr(Section::Additional, tracker, record)
    }

    /// Writes the section counts into the header and returns the length
    /// of the finished message.
    pub fn finish(mut self) -> usize {
        self.write(QDCOUNT_OFFSET, &self.qdcount.to_be_bytes());
        self.write(ANCOUNT_OFFSET, &self.ancount.to_be_bytes());
        self.write(NSCOUNT_OFFSET, &self.nscount.to_be_bytes());
        self.write(ARCOUNT_OFFSET, &self.arcount.to_be_bytes());
        self.cursor
    }

    fn add_rr(
        &mut self,
        section: Section,
        tracker: Option<&mut LabelTracker>,
        record: &Record,
    ) -> Result<()> {
        if self.section > section {
            return Err(Error::OutOfOrder);
        }
        let new_count = self.count(section).checked_add(1).ok_or(Error::CountOverflow)?;
        let rdlength = u16::try_from(record.rdata.len()).map_err(|_| Error::Truncation)?;
        self.with_rollback(tracker, |this, tracker| {
            this.section = section;
            this.write_name(tracker, &record.owner)?;
            this.try_push(&record.rr_type.to_be_bytes())?;
            this.try_push(&record.class.to_be_bytes())?;
            this.try_push(&record.ttl.to_be_bytes())?;
            this.try_push(&rdlength.to_be_bytes())?;
            this.try_push(record.rdata)
        })?;
        *self.count_mut(section) = new_count;
        Ok(())
    }

    fn count(&self, section: Section) -> u16 {
        match section {
            Section::Question => self.qdcount,
            Section::Answer => self.ancount,
            Section::Authority => self.nscount,
            Section::Additional => self.arcount,
        }
    }

    fn count_mut(&mut self, section: Section) -> &mut u16 {
        match section {
            Section::Question => &mut self.qdcount,
            Section::Answer => &mut self.ancount,
            Section::Authority => &mut self.nscount,
            Section::Additional => &mut self.arcount,
        }
    }

    /// Executes `f(self, tracker)`, returning the result and rolling
    /// back the section, cursor, and the tracker's spans first if the
    /// result is an error.
    fn with_rollback<F, T>(&mut self, mut tracker: Option<&mut LabelTracker>, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self, Option<&mut LabelTracker>) -> Result<T>,
    {
        let saved_section = self.section;
        let saved_cursor = self.cursor;
        let result = f(self, tracker.as_deref_mut());
        if result.is_err() {
            self.section = saved_section;
            self.cursor = saved_cursor;
            if let Some(tracker) = tracker {
                tracker.forget_spans_from(saved_cursor);
            }
        }
        result
    }

    /// Writes `name` at the current cursor, compressed against the
    /// tracker's spans if there is a tracker. The new span is recorded
    /// only once the whole name has been written.
    fn write_name(&mut self, tracker: Option<&mut LabelTracker>, name: &Name) -> Result<()> {
        let position = self.cursor;
        let compression = match tracker {
            Some(ref tracker) => tracker.find_suffix(&self.octets[..position], name),
            None => Compression::uncompressed(name),
        };
        if self.limit - position < compression.encoded_len(name) {
            return Err(Error::Truncation);
        }

        let literal = compression.literal(name);
        self.try_push(literal)?;
        match compression.pointer {
            Some(pointer) => self.try_push(&(0xc000 | pointer).to_be_bytes())?,
            None => self.try_push(&[0])?,
        }

        if let Some(tracker) = tracker {
            tracker.record_span(Span {
                start: position,
                end: position + literal.len(),
            });
        }
        Ok(())
    }

    /// Tries to write `data` to the underlying buffer at the current
    /// cursor, failing if there is not sufficient space.
    fn try_push(&mut self, data: &[u8]) -> Result<()> {
        if self.limit - self.cursor >= data.len() {
            self.write(self.cursor, data);
            self.cursor += data.len();
            Ok(())
        } else {
            Err(Error::Truncation)
        }
    }

    /// Writes `data` to the underlying buffer at `position`. Note that
    /// this performs no bounds checking.
    fn write(&mut self, position: usize, data: &[u8]) {
        self.octets[position..position + data.len()].copy_from_slice(data);
    }
}

impl fmt::Debug for Writer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Writer")
            .field("cursor", &self.cursor)
            .field("limit", &self.limit)
            .field("section", &self.section)
            .field("qdcount", &self.qdcount)
            .field("ancount", &self.ancount)
            .field("nscount", &self.nscount)
            .field("arcount", &self.arcount)
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a [`Writer`] operation could not be
/// performed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// Adding the question or resource record would overflow the
    /// corresponding 16-bit counter in the DNS header.
    CountOverflow,

    /// There is not enough room left in the buffer.
    Truncation,

    /// An attempt was made to serialize a question or resource record
    /// in the wrong place in the message (e.g., adding a question after
    /// an answer resource record has already been serialized).
    OutOfOrder,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::CountOverflow => f.write_str("record count would overflow"),
            Self::Truncation => f.write_str("message would be truncated"),
            Self::OutOfOrder => f.write_str("question or record serialized out of order"),
        }
    }
}

impl std::error::Error for Error {}

/// The type returned by fallible [`Writer`] methods.
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
