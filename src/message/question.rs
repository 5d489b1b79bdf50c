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

//! The [`Question`] and [`Record`] types carried in message bodies.

use std::fmt;

use crate::name::Name;

/// The question of a DNS query, as defined in [RFC 1035 § 4.1.2].
///
/// QTYPE and QCLASS are kept as raw 16-bit values; nothing in this
/// crate interprets them.
///
/// [RFC 1035 § 4.1.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.2
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Question {
    pub qname: Name,
    pub qtype: u16,
    pub qclass: u16,
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} CLASS{} TYPE{}", self.qname, self.qclass, self.qtype)
    }
}

/// A resource record, as defined in [RFC 1035 § 4.1.3].
///
/// The RDATA is opaque: names inside it are neither compressed when
/// writing nor expanded when reading.
///
/// [RFC 1035 § 4.1.3]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.3
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record<'a> {
    pub owner: Name,
    pub rr_type: u16,
    pub class: u16,
    pub ttl: u32,
    pub rdata: &'a [u8],
}

impl fmt::Display for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} CLASS{} TYPE{} \\# {}",
            self.owner,
            self.ttl,
            self.class,
            self.rr_type,
            self.rdata.len()
        )?;
        if !self.rdata.is_empty() {
            f.write_str(" ")?;
            for octet in self.rdata {
                write!(f, "{:02x}", octet)?;
            }
        }
        Ok(())
    }
}
