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

//! Structural validation of raw DNS messages.
//!
//! This is the first gate a message passes through: nothing else in a
//! message may be trusted, and no name may be parsed, until [`check`]
//! (or its boolean form [`is_valid`]) has accepted the buffer.

use std::convert::TryFrom;
use std::fmt;

use log::trace;

use super::constants::HEADER_SIZE;
use super::Header;

/// Whether a message is expected to be a query or a response.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Direction {
    Query,
    Response,
}

impl Direction {
    /// Returns the direction indicated by a QR bit.
    pub fn from_qr(qr: bool) -> Self {
        if qr {
            Self::Response
        } else {
            Self::Query
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Query => f.write_str("query"),
            Self::Response => f.write_str("response"),
        }
    }
}

/// Checks the header of `octets` against the structural rules of
/// RFC 1035 for a message travelling in `direction`.
///
/// A buffer is rejected if
///
/// * it is no longer than the 12-octet header;
/// * its QR bit does not match `direction`; or
/// * it is a query with no questions, or with any answer or authority
///   records.
///
/// Queries may carry additional records (an OPT record, for instance).
/// Responses are not checked beyond the QR bit: servers do not always
/// echo the question, and any number of answers (including none) is
/// legitimate.
pub fn check(octets: &[u8], direction: Direction) -> Result<(), ValidationError> {
    if octets.len() <= HEADER_SIZE {
        return Err(ValidationError::HeaderTooShort);
    }
    let header = Header::try_from(octets)?;

    if Direction::from_qr(header.qr()) != direction {
        return Err(ValidationError::DirectionMismatch { expected: direction });
    }

    if direction == Direction::Query {
        if header.qdcount() == 0 {
            return Err(ValidationError::NoQuestions);
        } else if header.ancount() != 0 {
            return Err(ValidationError::AnswersInQuery);
        } else if header.nscount() != 0 {
            return Err(ValidationError::AuthorityInQuery);
        }
    }

    Ok(())
}

/// Returns whether `octets` passes [`check`]. Callers must not parse a
/// message any further when this returns `false`.
pub fn is_valid(octets: &[u8], direction: Direction) -> bool {
    match check(octets, direction) {
        Ok(()) => true,
        Err(e) => {
            trace!("Rejecting {}-octet {}: {}.", octets.len(), direction, e);
            false
        }
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// The reason a message failed structural validation. Every variant
/// means the message must be dropped.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValidationError {
    HeaderTooShort,
    DirectionMismatch { expected: Direction },
    NoQuestions,
    AnswersInQuery,
    AuthorityInQuery,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::HeaderTooShort => f.write_str("message is not longer than the header"),
            Self::DirectionMismatch { expected } => {
                write!(f, "QR bit does not match the expected {}", expected)
            }
            Self::NoQuestions => f.write_str("query has no questions"),
            Self::AnswersInQuery => f.write_str("query has answer records"),
            Self::AuthorityInQuery => f.write_str("query has authority records"),
        }
    }
}

impl std::error::Error for ValidationError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    /// Builds a 13-octet message (header plus one octet of body).
    fn message(qr: bool, counts: [u16; 4]) -> Vec<u8> {
        let mut octets = vec![0x12, 0x34, if qr { 0x80 } else { 0x00 }, 0x00];
        for count in counts {
            octets.extend_from_slice(&count.to_be_bytes());
        }
        octets.push(0);
        octets
    }

    #[test]
    fn short_buffers_are_always_rejected() {
        let mut rng = rand::thread_rng();
        for len in 0..=HEADER_SIZE {
            for _ in 0..32 {
                let octets: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
                assert!(!is_valid(&octets, Direction::Query));
                assert!(!is_valid(&octets, Direction::Response));
            }
        }
    }

    #[test]
    fn header_only_message_is_rejected() {
        let octets = &message(false, [1, 0, 0, 0])[..HEADER_SIZE];
        assert_eq!(
            check(octets, Direction::Query),
            Err(ValidationError::HeaderTooShort)
        );
    }

    #[test]
    fn simple_query_is_accepted() {
        assert!(is_valid(&message(false, [1, 0, 0, 0]), Direction::Query));
    }

    #[test]
    fn query_may_carry_additional_records() {
        assert!(is_valid(&message(false, [1, 0, 0, 1]), Direction::Query));
        assert!(is_valid(&message(false, [3, 0, 0, 0xffff]), Direction::Query));
    }

    #[test]
    fn query_count_rules_are_enforced() {
        assert_eq!(
            check(&message(false, [0, 0, 0, 0]), Direction::Query),
            Err(ValidationError::NoQuestions)
        );
        assert_eq!(
            check(&message(false, [1, 1, 0, 0]), Direction::Query),
            Err(ValidationError::AnswersInQuery)
        );
        assert_eq!(
            check(&message(false, [1, 0, 1, 0]), Direction::Query),
            Err(ValidationError::AuthorityInQuery)
        );
    }

    #[test]
    fn qr_bit_must_match_direction() {
        assert_eq!(Direction::from_qr(false), Direction::Query);
        assert_eq!(Direction::from_qr(true), Direction::Response);
        assert_eq!(
            check(&message(true, [1, 0, 0, 0]), Direction::Query),
            Err(ValidationError::DirectionMismatch {
                expected: Direction::Query
            })
        );
        assert_eq!(
            check(&message(false, [1, 0, 0, 0]), Direction::Response),
            Err(ValidationError::DirectionMismatch {
                expected: Direction::Response
            })
        );
    }

    #[test]
    fn responses_accept_any_counts() {
        let mut rng = rand::thread_rng();
        assert!(is_valid(&message(true, [0, 0, 0, 0]), Direction::Response));
        for _ in 0..256 {
            let counts = [rng.gen(), rng.gen(), rng.gen(), rng.gen()];
            assert!(is_valid(&message(true, counts), Direction::Response));
        }
    }

    #[test]
    fn random_valid_queries_satisfy_count_rules() {
        let mut rng = rand::thread_rng();
        for _ in 0..1024 {
            let counts: [u16; 4] = [
                rng.gen_range(0..3),
                rng.gen_range(0..2),
                rng.gen_range(0..2),
                rng.gen(),
            ];
            let octets = message(false, counts);
            let expected = counts[0] >= 1 && counts[1] == 0 && counts[2] == 0;
            assert_eq!(is_valid(&octets, Direction::Query), expected);
        }
    }
}
