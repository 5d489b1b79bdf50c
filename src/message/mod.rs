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

//! Validation, reading, and writing of DNS messages.
//!
//! [`check`] and [`is_valid`] apply the structural rules that every
//! message must pass before anything else in it is read. [`Reader`] and
//! [`Writer`] then walk message bodies, handing each domain name to the
//! [`LabelTracker`](crate::compression::LabelTracker) of the calling
//! context.

pub mod constants;
mod header;
mod question;
pub mod reader;
pub mod validate;
pub mod writer;
pub use header::Header;
pub use question::{Question, Record};
pub use reader::Reader;
pub use validate::{check, is_valid, Direction, ValidationError};
pub use writer::Writer;
