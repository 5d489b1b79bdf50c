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

//! Domain-name compression as described in [RFC 1035 § 4.1.4].
//!
//! The [`LabelTracker`] is per-message scratch state that serves both
//! directions of the compression scheme:
//!
//! * While encoding, it records the [`Span`]s of label octets already
//!   written to the message, so that a later name whose trailing labels
//!   match an earlier name can end with a pointer instead.
//! * While decoding, it records the offsets visited while following
//!   pointers, so that a pointer chain that loops is detected instead
//!   of followed forever.
//!
//! A tracker is owned by a [`TrackerSlot`], one per execution context
//! (for instance, one per worker thread). The slot is passed explicitly
//! to whatever encodes or decodes messages, and
//! [`TrackerSlot::acquire`] rebinds its tracker to each new message.
//! Nothing is shared, so nothing is locked.
//!
//! [RFC 1035 § 4.1.4]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.4

use std::fmt;

use arrayvec::ArrayVec;
use log::{debug, trace, warn};

use crate::message::constants::{HEADER_SIZE, MAX_MESSAGE_SIZE};
use crate::name::{Name, NameBuilder, MAX_N_LABELS};

mod visited;
pub use visited::VisitedSet;

/// The two high bits that mark a length octet as a pointer.
pub const POINTER_MASK: u8 = 0xc0;

/// The largest offset a pointer can hold.
pub const POINTER_MAX: usize = 0x3fff;

/// The number of spans a tracker has room for before it must grow.
const INITIAL_SPAN_CAPACITY: usize = 256;

////////////////////////////////////////////////////////////////////////
// TRACKER SLOTS                                                      //
////////////////////////////////////////////////////////////////////////

/// The owner of one execution context's [`LabelTracker`].
///
/// A slot is created once (for instance, when a worker thread starts)
/// and reused for every message the context processes. If the slot
/// could not allocate its tracker, [`TrackerSlot::acquire`] fails with
/// [`Error::TrackerUnavailable`]; encoders should then write names
/// without compression, and decoders should refuse to decode names.
pub struct TrackerSlot {
    tracker: Option<LabelTracker>,
}

impl TrackerSlot {
    /// Creates a slot and allocates its tracker.
    pub fn new() -> Self {
        let tracker = LabelTracker::try_new();
        if tracker.is_none() {
            warn!("Failed to allocate a label tracker; names will not be compressed.");
        }
        Self { tracker }
    }

    /// Creates a slot without a tracker.
    pub fn unavailable() -> Self {
        Self { tracker: None }
    }

    /// Returns whether the slot holds a tracker.
    pub fn is_available(&self) -> bool {
        self.tracker.is_some()
    }

    /// Binds the slot's tracker to a message of `buffer_len` octets and
    /// returns it.
    ///
    /// The span list is reset to a single empty span just past the
    /// header. If `clear_visited` is set, the visited-offset set is
    /// emptied as well; decoders should pass `true`.
    pub fn acquire(
        &mut self,
        buffer_len: usize,
        clear_visited: bool,
    ) -> Result<&mut LabelTracker, Error> {
        let tracker = self.tracker.as_mut().ok_or(Error::TrackerUnavailable)?;
        tracker.reset(buffer_len, clear_visited);
        Ok(tracker)
    }
}

impl Default for TrackerSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TrackerSlot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TrackerSlot")
            .field("available", &self.is_available())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////
// LABEL TRACKER                                                      //
////////////////////////////////////////////////////////////////////////

/// A range of offsets `[start, end)` in a message holding label octets
/// (length octets included) that were written literally.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Returns whether the span holds no octets.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// How a [`LabelTracker`] compares labels when looking for a prior
/// occurrence of a name's suffix.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CompressionMode {
    /// Compare labels ASCII-case-insensitively, as DNS does. A name may
    /// then decode with the case of an earlier name's suffix.
    #[default]
    Standard,

    /// Compare labels octet for octet, so that every name decodes with
    /// exactly the case it was written with.
    CasePreserving,
}

/// How to write a name, as decided by [`LabelTracker::find_suffix`].
///
/// The first `literal_labels` labels of the name are written as-is.
/// They are followed by a pointer to `pointer` if there is one, and by
/// the null label otherwise.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Compression {
    pub pointer: Option<u16>,
    pub literal_labels: usize,
}

impl Compression {
    /// Returns the plan that writes all of `name` literally.
    pub fn uncompressed(name: &Name) -> Self {
        Self {
            pointer: None,
            literal_labels: name.len() - 1,
        }
    }

    /// Returns the octets of `name` that are written literally, not
    /// counting the terminating null label.
    pub fn literal<'n>(&self, name: &'n Name) -> &'n [u8] {
        name.wire_repr_to(self.literal_labels)
    }

    /// Returns the number of octets this plan writes for `name`.
    pub fn encoded_len(&self, name: &Name) -> usize {
        self.literal(name).len() + if self.pointer.is_some() { 2 } else { 1 }
    }
}

/// Per-message scratch state for name compression.
///
/// See the [module documentation](self) for an overview. A
/// `LabelTracker` is only obtained through [`TrackerSlot::acquire`].
///
/// In the default [`CompressionMode::Standard`], a name compressed
/// against an earlier name decodes with the earlier name's case in the
/// shared suffix. Use [`CompressionMode::CasePreserving`] when every
/// name must decode with exactly the case it was written with.
pub struct LabelTracker {
    buffer_len: usize,
    spans: Vec<Span>,
    spans_exhausted: bool,
    visited: VisitedSet,
    mode: CompressionMode,
}

impl LabelTracker {
    fn try_new() -> Option<Self> {
        let mut spans = Vec::new();
        spans.try_reserve(INITIAL_SPAN_CAPACITY).ok()?;
        let mut tracker = Self {
            buffer_len: 0,
            spans,
            spans_exhausted: false,
            visited: VisitedSet::try_new()?,
            mode: CompressionMode::default(),
        };
        tracker.reset(0, false);
        Some(tracker)
    }

    fn reset(&mut self, buffer_len: usize, clear_visited: bool) {
        self.buffer_len = buffer_len.min(MAX_MESSAGE_SIZE);
        self.spans.clear();
        self.spans.push(Span {
            start: HEADER_SIZE,
            end: HEADER_SIZE,
        });
        self.spans_exhausted = false;
        if clear_visited {
            self.visited.clear();
        } else {
            self.visited.forget_touched();
        }
    }

    /// Returns the length of the message the tracker is bound to.
    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    /// Returns the recorded spans, oldest first.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Returns the visited-offset set.
    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    /// Returns the current [`CompressionMode`].
    pub fn compression_mode(&self) -> CompressionMode {
        self.mode
    }

    /// Sets the [`CompressionMode`]. The mode survives rebinding.
    pub fn set_compression_mode(&mut self, mode: CompressionMode) {
        self.mode = mode;
    }

    ////////////////////////////////////////////////////////////////////
    // ENCODING                                                       //
    ////////////////////////////////////////////////////////////////////

    /// Decides how `name` can be written into the message `octets`,
    /// which holds everything written so far.
    ///
    /// Every label position inside the recorded spans is a candidate.
    /// The candidate whose (pointer-expanded) label sequence equals the
    /// longest suffix of `name` wins. The root name is never
    /// compressed, since a pointer is longer than the null label. Once
    /// the span list has failed to grow, every name is written
    /// literally.
    pub fn find_suffix(&self, octets: &[u8], name: &Name) -> Compression {
        if self.spans_exhausted {
            return Compression::uncompressed(name);
        }
        let n_labels = name.len() - 1;
        let mut best: Option<(usize, u16)> = None;

        'spans: for span in &self.spans {
            let mut position = span.start;
            while position < span.end && position <= POINTER_MAX {
                let len = match octets.get(position) {
                    Some(&len) if len != 0 && len & POINTER_MASK == 0 => len as usize,
                    _ => break,
                };
                if let Some(matched) = self.match_suffix(octets, position, name) {
                    if best.map_or(true, |(longest, _)| matched > longest) {
                        best = Some((matched, position as u16));
                        if matched == n_labels {
                            break 'spans;
                        }
                    }
                }
                position += 1 + len;
            }
        }

        match best {
            Some((matched, pointer)) => {
                trace!(
                    "Compressing {} with a pointer to {} ({} labels shared).",
                    name,
                    pointer,
                    matched
                );
                Compression {
                    pointer: Some(pointer),
                    literal_labels: n_labels - matched,
                }
            }
            None => Compression::uncompressed(name),
        }
    }

    /// Records `span` as a compression target. Spans that are empty or
    /// start beyond the reach of a pointer are ignored.
    ///
    /// If the span list cannot grow, the span is dropped and
    /// compression is off for the rest of the message.
    pub fn record_span(&mut self, span: Span) {
        if span.is_empty() || span.start > POINTER_MAX || self.spans_exhausted {
            return;
        }
        if self.spans.len() == self.spans.capacity() && self.spans.try_reserve(1).is_err() {
            warn!(
                "Could not grow the span list past {} entries; \
                 further names in this message will not be compressed.",
                self.spans.len()
            );
            self.spans_exhausted = true;
            return;
        }
        self.spans.push(span);
    }

    /// Drops every recorded span starting at or after `position`. A
    /// writer that rolls its cursor back to `position` must call this,
    /// since the octets those spans describe will be overwritten.
    pub fn forget_spans_from(&mut self, position: usize) {
        while self.spans.len() > 1 && self.spans[self.spans.len() - 1].start >= position {
            self.spans.pop();
        }
    }

    /// Finds a compression for `name`, which the caller is about to
    /// write at `position`, and records the octets it will write
    /// literally as a new span.
    ///
    /// The caller must write exactly what the returned [`Compression`]
    /// describes. A caller that may fail part way (say, for lack of
    /// space) should use [`LabelTracker::find_suffix`] and
    /// [`LabelTracker::record_span`] instead.
    pub fn find_or_record_span(
        &mut self,
        octets: &[u8],
        position: usize,
        name: &Name,
    ) -> Compression {
        let compression = self.find_suffix(&octets[..position.min(octets.len())], name);
        debug_assert!(compression.pointer.map_or(true, |p| (p as usize) < position));
        self.record_span(Span {
            start: position,
            end: position + compression.literal(name).len(),
        });
        compression
    }

    /// Checks whether the name at `position` equals a suffix of `name`,
    /// returning the number of (non-null) labels matched.
    fn match_suffix(&self, octets: &[u8], position: usize, name: &Name) -> Option<usize> {
        let n_labels = name.len() - 1;
        let prior = expand_labels(octets, position, n_labels)?;
        let skip = n_labels - prior.len();
        let equal = prior
            .iter()
            .zip(name.labels().skip(skip))
            .all(|(&(start, len), label)| {
                let prior_octets = &octets[start..start + len];
                match self.mode {
                    CompressionMode::Standard => prior_octets.eq_ignore_ascii_case(label.octets()),
                    CompressionMode::CasePreserving => prior_octets == label.octets(),
                }
            });
        if equal && !prior.is_empty() {
            Some(prior.len())
        } else {
            None
        }
    }

    ////////////////////////////////////////////////////////////////////
    // DECODING                                                       //
    ////////////////////////////////////////////////////////////////////

    /// Reads the possibly compressed name that starts at offset `start`
    /// of `octets`.
    ///
    /// Returns the name and the number of octets it occupies at
    /// `start` (up to and including its null label or first pointer).
    /// Reading fails with
    ///
    /// * [`Error::CompressionLoop`] if a pointer leads to an offset
    ///   already visited while reading this name, or does not point
    ///   strictly backwards;
    /// * [`Error::NameTooLong`] if the name exceeds 255 octets
    ///   uncompressed;
    /// * [`Error::Truncated`] if the message (or the tracker's bound
    ///   length, if shorter) ends inside the name; and
    /// * [`Error::InvalidLabelType`] for the reserved label types.
    pub fn read_name(&mut self, octets: &[u8], start: usize) -> Result<(Name, usize), Error> {
        let octets = &octets[..octets.len().min(self.buffer_len)];
        let result = self.expand_name(octets, start);
        self.visited.forget_touched();
        if let Err(ref e) = result {
            debug!("Failed to read the name at offset {}: {}.", start, e);
        }
        result
    }

    fn expand_name(&mut self, octets: &[u8], start: usize) -> Result<(Name, usize), Error> {
        let mut builder = NameBuilder::new();
        let mut position = start;
        let mut consumed = None;

        loop {
            let len = *octets.get(position).ok_or(Error::Truncated)?;
            if !self.visited.insert(position) {
                return Err(Error::CompressionLoop);
            }

            match len & POINTER_MASK {
                0x00 if len == 0 => {
                    let consumed = match consumed {
                        Some(consumed) => consumed,
                        None => position + 1 - start,
                    };
                    let name = builder.finish().map_err(|_| Error::NameTooLong)?;
                    return Ok((name, consumed));
                }
                0x00 => {
                    let label_start = position + 1;
                    let label_end = label_start + len as usize;
                    let label = octets
                        .get(label_start..label_end)
                        .ok_or(Error::Truncated)?;
                    builder
                        .try_push_label(label)
                        .map_err(|_| Error::NameTooLong)?;
                    position = label_end;
                }
                POINTER_MASK => {
                    let low = *octets.get(position + 1).ok_or(Error::Truncated)?;
                    let target = usize::from(u16::from_be_bytes([len & !POINTER_MASK, low]));
                    if target >= position || self.visited.contains(target) {
                        return Err(Error::CompressionLoop);
                    }
                    if consumed.is_none() {
                        consumed = Some(position + 2 - start);
                    }
                    position = target;
                }
                _ => return Err(Error::InvalidLabelType),
            }
        }
    }
}

impl fmt::Debug for LabelTracker {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LabelTracker")
            .field("buffer_len", &self.buffer_len)
            .field("spans", &self.spans.len())
            .field("visited", &self.visited.len())
            .field("mode", &self.mode)
            .finish()
    }
}

/// Collects the `(start, len)` of every non-null label of the name at
/// `position`, following pointers. Returns `None` if the name is
/// malformed or has more than `max_labels` labels. Only data written
/// by this crate is expected here, but nothing is trusted.
fn expand_labels(
    octets: &[u8],
    mut position: usize,
    max_labels: usize,
) -> Option<ArrayVec<(usize, usize), MAX_N_LABELS>> {
    let mut labels = ArrayVec::new();
    loop {
        let len = *octets.get(position)?;
        match len & POINTER_MASK {
            0x00 if len == 0 => return Some(labels),
            0x00 => {
                if labels.len() == max_labels {
                    return None;
                }
                let start = position + 1;
                let end = start + len as usize;
                if end > octets.len() {
                    return None;
                }
                labels.try_push((start, len as usize)).ok()?;
                position = end;
            }
            POINTER_MASK => {
                let low = *octets.get(position + 1)?;
                let target = usize::from(u16::from_be_bytes([len & !POINTER_MASK, low]));
                if target >= position {
                    return None;
                }
                position = target;
            }
            _ => return None,
        }
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error from the compression machinery. None of these is fatal to
/// anything but the message being processed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// The execution context has no tracker.
    TrackerUnavailable,

    /// A pointer chain loops, or a pointer does not point backwards.
    CompressionLoop,

    /// A decoded name is longer than 255 octets.
    NameTooLong,

    /// The message ends before a label or pointer does.
    Truncated,

    /// A label uses one of the reserved label types `0b01` or `0b10`.
    InvalidLabelType,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::TrackerUnavailable => f.write_str("no label tracker is available"),
            Self::CompressionLoop => f.write_str("compression pointers form a loop"),
            Self::NameTooLong => f.write_str("name is longer than 255 octets"),
            Self::Truncated => f.write_str("message ends inside a name"),
            Self::InvalidLabelType => f.write_str("invalid label type"),
        }
    }
}

impl std::error::Error for Error {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    /// A 12-octet header of zeros, after which names are written.
    const HEADER: [u8; HEADER_SIZE] = [0; HEADER_SIZE];

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    /// Appends `name` to `octets` the way an encoder would.
    fn encode(tracker: &mut LabelTracker, octets: &mut Vec<u8>, name: &Name) -> usize {
        let position = octets.len();
        let compression = tracker.find_or_record_span(octets, position, name);
        octets.extend_from_slice(compression.literal(name));
        match compression.pointer {
            Some(pointer) => octets.extend_from_slice(&(0xc000 | pointer).to_be_bytes()),
            None => octets.push(0),
        }
        position
    }

    /// Builds a name of four labels whose wire length is `wire_len`
    /// (between 196 and 256).
    fn long_name_octets(wire_len: usize) -> Vec<u8> {
        let mut octets = Vec::new();
        for _ in 0..3 {
            octets.push(63);
            octets.extend_from_slice(&[b'x'; 63]);
        }
        let last = wire_len - 3 * 64 - 2;
        octets.push(last as u8);
        octets.extend(std::iter::repeat(b'y').take(last));
        octets.push(0);
        assert_eq!(octets.len(), wire_len);
        octets
    }

    #[test]
    fn acquire_is_idempotent() {
        let mut slot = TrackerSlot::new();
        for _ in 0..2 {
            let tracker = slot.acquire(512, true).unwrap();
            assert!(tracker.visited().is_empty());
            assert_eq!(tracker.buffer_len(), 512);
            assert_eq!(
                tracker.spans(),
                &[Span {
                    start: HEADER_SIZE,
                    end: HEADER_SIZE
                }]
            );
        }
    }

    #[test]
    fn acquire_rewinds_previous_state() {
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(0, true).unwrap();
        let mut octets = HEADER.to_vec();
        encode(tracker, &mut octets, &name("www.example.com"));
        assert_eq!(tracker.spans().len(), 2);

        let tracker = slot.acquire(octets.len(), true).unwrap();
        assert_eq!(tracker.spans().len(), 1);
        assert_eq!(tracker.find_suffix(&octets, &name("example.com")).pointer, None);
    }

    #[test]
    fn unavailable_slot_fails_to_acquire() {
        let mut slot = TrackerSlot::unavailable();
        assert!(!slot.is_available());
        assert_eq!(slot.acquire(512, true).unwrap_err(), Error::TrackerUnavailable);
    }

    #[test]
    fn suffix_is_compressed_to_a_pointer() {
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(0, false).unwrap();
        let mut octets = HEADER.to_vec();
        let www = name("www.example.com");
        let mail = name("mail.example.com");

        assert_eq!(encode(tracker, &mut octets, &www), 12);
        assert_eq!(encode(tracker, &mut octets, &mail), 29);
        assert_eq!(
            &octets[12..],
            b"\x03www\x07example\x03com\x00\x04mail\xc0\x10"
        );

        let tracker = slot.acquire(octets.len(), true).unwrap();
        assert!(tracker.read_name(&octets, 12).unwrap().0.eq_case_sensitive(&www));
        let (decoded, consumed) = tracker.read_name(&octets, 29).unwrap();
        assert!(decoded.eq_case_sensitive(&mail));
        assert_eq!(consumed, 7);
    }

    #[test]
    fn identical_name_is_a_bare_pointer() {
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(0, false).unwrap();
        let mut octets = HEADER.to_vec();
        encode(tracker, &mut octets, &name("example.com"));
        encode(tracker, &mut octets, &name("EXAMPLE.COM"));
        assert_eq!(&octets[25..], b"\xc0\x0c");
    }

    #[test]
    fn pointers_chain_through_compressed_names() {
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(0, false).unwrap();
        let mut octets = HEADER.to_vec();
        encode(tracker, &mut octets, &name("example.com"));
        let b = encode(tracker, &mut octets, &name("b.example.com"));
        let a = encode(tracker, &mut octets, &name("a.b.example.com"));
        assert_eq!(&octets[a..], &[0x01, b'a', 0xc0, b as u8]);

        let tracker = slot.acquire(octets.len(), true).unwrap();
        assert_eq!(tracker.read_name(&octets, a).unwrap().0, name("a.b.example.com"));
    }

    #[test]
    fn round_trip_preserves_case_when_asked() {
        let names = [
            "www.Example.com",
            "mail.example.COM",
            "example.com",
            "ftp.EXAMPLE.com",
            "other.test",
            "a.b.c.other.test",
            ".",
        ];
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(0, false).unwrap();
        tracker.set_compression_mode(CompressionMode::CasePreserving);
        let mut octets = HEADER.to_vec();
        let offsets: Vec<usize> = names
            .iter()
            .map(|n| encode(tracker, &mut octets, &name(n)))
            .collect();

        let tracker = slot.acquire(octets.len(), true).unwrap();
        for (n, offset) in names.iter().zip(offsets) {
            let (decoded, _) = tracker.read_name(&octets, offset).unwrap();
            assert!(decoded.eq_case_sensitive(&name(n)), "{} != {}", decoded, n);
        }
        assert!(tracker.visited().is_empty());
    }

    #[test]
    fn round_trip_through_distant_pointers() {
        let names = ["example.com", "www.example.com", "mail.example.com"];
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(0, false).unwrap();
        let mut octets = HEADER.to_vec();
        let offsets: Vec<usize> = names
            .iter()
            .map(|n| encode(tracker, &mut octets, &name(n)))
            .collect();
        assert_eq!(offsets, [12, 25, 31]);
        assert_eq!(
            &octets[12..],
            b"\x07example\x03com\x00\x03www\xc0\x0c\x04mail\xc0\x0c"
        );

        // The last name points back past the one in between.
        let tracker = slot.acquire(octets.len(), true).unwrap();
        let (decoded, consumed) = tracker.read_name(&octets, 31).unwrap();
        assert!(decoded.eq_case_sensitive(&name("mail.example.com")));
        assert_eq!(consumed, 7);
        for (n, offset) in names.iter().zip(offsets) {
            let (decoded, _) = tracker.read_name(&octets, offset).unwrap();
            assert!(decoded.eq_case_sensitive(&name(n)), "{} != {}", decoded, n);
        }
        assert!(tracker.visited().is_empty());
    }

    #[test]
    fn second_pointer_may_lie_well_before_the_name() {
        let mut octets = HEADER.to_vec();
        octets.extend_from_slice(b"\x03com\x00\x07example\xc0\x0c");
        octets.extend_from_slice(&[0; 20]);
        let start = octets.len();
        octets.extend_from_slice(b"\x03www\xc0\x11");
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(octets.len(), true).unwrap();
        let (decoded, consumed) = tracker.read_name(&octets, start).unwrap();
        assert_eq!(decoded, name("www.example.com"));
        assert_eq!(consumed, 6);
    }

    #[test]
    fn standard_mode_reuses_earlier_case() {
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(0, false).unwrap();
        let mut octets = HEADER.to_vec();
        encode(tracker, &mut octets, &name("www.Example.com"));
        let mail = encode(tracker, &mut octets, &name("mail.example.com"));

        let tracker = slot.acquire(octets.len(), true).unwrap();
        let (decoded, _) = tracker.read_name(&octets, mail).unwrap();
        assert_eq!(decoded, name("mail.example.com"));
        assert!(decoded.eq_case_sensitive(&name("mail.Example.com")));
    }

    #[test]
    fn standard_mode_matches_case_insensitively() {
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(0, false).unwrap();
        assert_eq!(tracker.compression_mode(), CompressionMode::Standard);
        let mut octets = HEADER.to_vec();
        encode(tracker, &mut octets, &name("Example.COM"));
        let compression = tracker.find_suffix(&octets, &name("www.example.com"));
        assert_eq!(compression.pointer, Some(12));
        assert_eq!(compression.literal_labels, 1);

        tracker.set_compression_mode(CompressionMode::CasePreserving);
        let compression = tracker.find_suffix(&octets, &name("www.example.com"));
        assert_eq!(compression.pointer, None);
    }

    #[test]
    fn root_is_never_compressed() {
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(0, false).unwrap();
        let mut octets = HEADER.to_vec();
        encode(tracker, &mut octets, &name("example.com"));
        let root = Name::root();
        let compression = tracker.find_suffix(&octets, &root);
        assert_eq!(compression, Compression::uncompressed(&root));
        assert_eq!(compression.encoded_len(&root), 1);
    }

    #[test]
    fn spans_beyond_pointer_range_are_not_targets() {
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(0, false).unwrap();
        let mut octets = vec![0; POINTER_MAX + 1];
        encode(tracker, &mut octets, &name("example.com"));
        assert_eq!(tracker.spans().len(), 1);
        let compression = tracker.find_suffix(&octets, &name("example.com"));
        assert_eq!(compression.pointer, None);
    }

    #[test]
    fn span_list_grows_past_initial_capacity() {
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(0, false).unwrap();
        let mut octets = HEADER.to_vec();
        for i in 0..INITIAL_SPAN_CAPACITY + 10 {
            encode(tracker, &mut octets, &name(&format!("host{}.example.com", i)));
        }
        assert_eq!(tracker.spans().len(), INITIAL_SPAN_CAPACITY + 11);

        let tracker = slot.acquire(octets.len(), true).unwrap();
        let (last, _) = tracker
            .read_name(&octets, octets.len() - "host265".len() - 3)
            .unwrap();
        assert_eq!(last, name("host265.example.com"));
    }

    #[test]
    fn exhausted_span_list_disables_compression() {
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(0, false).unwrap();
        let mut octets = HEADER.to_vec();
        encode(tracker, &mut octets, &name("example.com"));
        tracker.spans_exhausted = true;
        let compression = tracker.find_suffix(&octets, &name("www.example.com"));
        assert_eq!(compression.pointer, None);
        assert_eq!(compression.literal_labels, 3);

        let tracker = slot.acquire(0, false).unwrap();
        assert!(!tracker.spans_exhausted);
    }

    #[test]
    fn mutual_pointers_are_a_loop() {
        let mut octets = HEADER.to_vec();
        octets.extend_from_slice(b"\xc0\x0e\xc0\x0c");
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(octets.len(), true).unwrap();
        assert_eq!(tracker.read_name(&octets, 12), Err(Error::CompressionLoop));
        assert_eq!(tracker.read_name(&octets, 14), Err(Error::CompressionLoop));
    }

    #[test]
    fn pointer_to_itself_is_a_loop() {
        let mut octets = HEADER.to_vec();
        octets.extend_from_slice(b"\x01a\xc0\x0c");
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(octets.len(), true).unwrap();
        assert_eq!(tracker.read_name(&octets, 12), Err(Error::CompressionLoop));

        let mut octets = HEADER.to_vec();
        octets.extend_from_slice(b"\xc0\x0c");
        let tracker = slot.acquire(octets.len(), true).unwrap();
        assert_eq!(tracker.read_name(&octets, 12), Err(Error::CompressionLoop));
    }

    #[test]
    fn forward_pointer_is_rejected() {
        let mut octets = HEADER.to_vec();
        octets.extend_from_slice(b"\x01x\xc0\x10\x00");
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(octets.len(), true).unwrap();
        assert_eq!(tracker.read_name(&octets, 12), Err(Error::CompressionLoop));
    }

    #[test]
    fn shared_suffixes_are_not_mistaken_for_loops() {
        // Both names end with a pointer to the same "test." label.
        let mut octets = HEADER.to_vec();
        octets.extend_from_slice(b"\x04test\x00\x01a\xc0\x0c\x01b\xc0\x0c");
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(octets.len(), true).unwrap();
        assert_eq!(tracker.read_name(&octets, 18).unwrap().0, name("a.test"));
        assert_eq!(tracker.read_name(&octets, 22).unwrap().0, name("b.test"));
        assert_eq!(tracker.read_name(&octets, 12).unwrap().0, name("test"));
    }

    #[test]
    fn name_length_boundary_is_enforced() {
        let mut slot = TrackerSlot::new();

        let mut octets = HEADER.to_vec();
        octets.extend_from_slice(&long_name_octets(255));
        let tracker = slot.acquire(octets.len(), true).unwrap();
        let (decoded, consumed) = tracker.read_name(&octets, 12).unwrap();
        assert_eq!(decoded.wire_len(), 255);
        assert_eq!(consumed, 255);

        let mut octets = HEADER.to_vec();
        octets.extend_from_slice(&long_name_octets(256));
        let tracker = slot.acquire(octets.len(), true).unwrap();
        assert_eq!(tracker.read_name(&octets, 12), Err(Error::NameTooLong));
    }

    #[test]
    fn name_length_is_checked_across_pointers() {
        // 200 octets of suffix, then a prefix of 56 octets pointing to
        // it: 256 octets in total.
        let mut suffix = Vec::new();
        for _ in 0..3 {
            suffix.push(63);
            suffix.extend_from_slice(&[b'x'; 63]);
        }
        suffix.extend_from_slice(b"\x06suffix\x00");
        assert_eq!(suffix.len(), 200);

        let mut octets = HEADER.to_vec();
        octets.extend_from_slice(&suffix);
        let prefix_start = octets.len();
        octets.push(55);
        octets.extend_from_slice(&[b'p'; 55]);
        octets.extend_from_slice(b"\xc0\x0c");
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(octets.len(), true).unwrap();
        assert_eq!(
            tracker.read_name(&octets, prefix_start),
            Err(Error::NameTooLong)
        );
    }

    #[test]
    fn truncation_is_detected() {
        let mut slot = TrackerSlot::new();
        for body in [&b"\x07exam"[..], b"\x07example", b"\x01a\xc0", b""] {
            let mut octets = HEADER.to_vec();
            octets.extend_from_slice(body);
            let tracker = slot.acquire(octets.len(), true).unwrap();
            assert_eq!(tracker.read_name(&octets, 12), Err(Error::Truncated));
        }
    }

    #[test]
    fn reads_stop_at_the_bound_length() {
        let mut octets = HEADER.to_vec();
        octets.extend_from_slice(b"\x07example\x00");
        let mut slot = TrackerSlot::new();
        let tracker = slot.acquire(octets.len() - 1, true).unwrap();
        assert_eq!(tracker.read_name(&octets, 12), Err(Error::Truncated));
    }

    #[test]
    fn reserved_label_types_are_rejected() {
        let mut slot = TrackerSlot::new();
        for first in [0x40, 0x80] {
            let mut octets = HEADER.to_vec();
            octets.extend_from_slice(&[first, 0x00, 0x00]);
            let tracker = slot.acquire(octets.len(), true).unwrap();
            assert_eq!(
                tracker.read_name(&octets, 12),
                Err(Error::InvalidLabelType)
            );
        }
    }
}
