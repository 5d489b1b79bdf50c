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

//! Constants for the layout of the fixed DNS message header. See
//! [RFC 1035 § 4.1.1](https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1).

/// The length of the fixed header that starts every DNS message.
pub const HEADER_SIZE: usize = 12;

/// The largest message that DNS can carry (over TCP, with its 16-bit
/// length prefix).
pub const MAX_MESSAGE_SIZE: usize = 65535;

// Big-endian 16-bit fields, by the offset of their first octet.
pub const ID_OFFSET: usize = 0;
pub const QDCOUNT_OFFSET: usize = 4;
pub const ANCOUNT_OFFSET: usize = 6;
pub const NSCOUNT_OFFSET: usize = 8;
pub const ARCOUNT_OFFSET: usize = 10;

// Flag bits in the third octet.
pub const FLAGS_HI: usize = 2;
pub const QR_MASK: u8 = 0x80;
pub const OPCODE_MASK: u8 = 0x78;
pub const OPCODE_SHIFT: u32 = 3;
pub const AA_MASK: u8 = 0x04;
pub const TC_MASK: u8 = 0x02;
pub const RD_MASK: u8 = 0x01;

// Flag bits in the fourth octet.
pub const FLAGS_LO: usize = 3;
pub const RA_MASK: u8 = 0x80;
pub const RCODE_MASK: u8 = 0x0f;
