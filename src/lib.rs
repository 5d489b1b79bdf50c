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

//! Wire-level mechanics of the DNS message format.
//!
//! This crate provides
//!
//! * structural validation of raw messages against the header rules of
//!   RFC 1035 ([`message::check`] and [`message::is_valid`]);
//! * domain-name compression, both the span tracking that lets an
//!   encoder point back at earlier names and the loop detection that
//!   keeps a decoder from following pointers forever
//!   ([`compression`]);
//! * a [`Name`](name::Name) type and a thin [`Reader`](message::Reader)
//!   and [`Writer`](message::Writer) that drive the above over whole
//!   messages; and
//! * the DNS field dictionary and its value-length policy ([`dict`]).
//!
//! Compression state is owned by a
//! [`TrackerSlot`](compression::TrackerSlot), one per execution
//! context, which is passed explicitly to whatever encodes or decodes
//! messages.

pub mod compression;
pub mod dict;
pub mod message;
pub mod name;
