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

//! Implements the `check`, `encode`, and `fields` subcommands.

use std::fs;

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, error, info, warn};

use dnswire::compression::TrackerSlot;
use dnswire::message::constants::{HEADER_SIZE, MAX_MESSAGE_SIZE};
use dnswire::message::{Direction, Question, Reader, Writer};
use dnswire::name::Name;

use crate::args::{CheckArgs, EncodeArgs, FieldsArgs, Format};
use crate::config;

////////////////////////////////////////////////////////////////////////
// CHECK                                                              //
////////////////////////////////////////////////////////////////////////

/// Validates each message file and prints what it contains.
pub fn check(args: CheckArgs) -> Result<()> {
    let config = config::load(args.config.as_deref())?;
    let direction: Direction = args
        .direction
        .or(config.direction)
        .map_or(Direction::Query, Into::into);
    let format = args.format.or(config.format).unwrap_or(Format::Raw);

    let mut slot = TrackerSlot::new();
    let mut n_failed = 0;
    for path in &args.files {
        let result = fs::read(path)
            .context("failed to read the file")
            .and_then(|contents| decode_input(contents, format))
            .and_then(|message| describe_message(&message, direction, &mut slot));
        match result {
            Ok(lines) => {
                println!("{}: {}", path.display(), lines.join("\n  "));
            }
            Err(e) => {
                error!("{}: {:#}", path.display(), e);
                n_failed += 1;
            }
        }
    }

    if n_failed > 0 {
        bail!("{} of {} messages failed the check", n_failed, args.files.len());
    }
    info!("All {} messages passed the check.", args.files.len());
    Ok(())
}

/// Converts the contents of a message file in `format` to the octets of
/// the message.
fn decode_input(contents: Vec<u8>, format: Format) -> Result<Vec<u8>> {
    match format {
        Format::Raw => Ok(contents),
        Format::Hex => hex::decode(strip_whitespace(&contents)).context("invalid hex"),
        Format::Base64 => STANDARD
            .decode(strip_whitespace(&contents))
            .context("invalid base64"),
    }
}

fn strip_whitespace(contents: &[u8]) -> Vec<u8> {
    contents
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect()
}

/// Validates `message` and reads every question and record in it,
/// returning a summary line followed by one line per entry.
fn describe_message(
    message: &[u8],
    direction: Direction,
    slot: &mut TrackerSlot,
) -> Result<Vec<String>> {
    let mut reader = Reader::new(message, direction)?;
    let tracker = slot
        .acquire(message.len(), true)
        .context("cannot decode names")?;
    let header = reader.header();
    let mut lines = vec![format!(
        "valid {}, ID {:#06x}, {} question(s), {} answer(s), {} authority, {} additional",
        direction,
        header.id(),
        header.qdcount(),
        header.ancount(),
        header.nscount(),
        header.arcount(),
    )];

    for i in 0..header.qdcount() {
        let question = reader
            .read_question(tracker)
            .with_context(|| format!("failed to read question {}", i + 1))?;
        lines.push(format!("question    {}", question));
    }
    let sections = [
        ("answer", header.ancount()),
        ("authority", header.nscount()),
        ("additional", header.arcount()),
    ];
    for (section, count) in sections {
        for i in 0..count {
            let record = reader
                .read_rr(tracker)
                .with_context(|| format!("failed to read {} record {}", section, i + 1))?;
            lines.push(format!("{:<11} {}", section, record));
        }
    }

    if !reader.at_eom() {
        warn!(
            "{} octet(s) of trailing data after the last record.",
            message.len() - reader.cursor()
        );
    }
    Ok(lines)
}

////////////////////////////////////////////////////////////////////////
// ENCODE                                                             //
////////////////////////////////////////////////////////////////////////

/// Encodes a query and prints it in hex.
pub fn encode(args: EncodeArgs) -> Result<()> {
    let message = encode_query(&args)?;
    println!("{}", hex::encode(message));
    Ok(())
}

/// Builds a query with one question per name in `args`.
fn encode_query(args: &EncodeArgs) -> Result<Vec<u8>> {
    let names = args
        .names
        .iter()
        .map(|n| n.parse::<Name>().map_err(|e| anyhow!("invalid name {}: {}", n, e)))
        .collect::<Result<Vec<_>>>()?;

    let mut slot = if args.no_compression {
        TrackerSlot::unavailable()
    } else {
        TrackerSlot::new()
    };
    let mut buf = vec![0; MAX_MESSAGE_SIZE];
    let mut tracker = slot.acquire(buf.len(), false).ok();
    if tracker.is_none() && !args.no_compression {
        warn!("No label tracker is available; names will not be compressed.");
    }

    let mut writer = Writer::new(&mut buf).context("failed to start the message")?;
    writer.set_id(args.id.unwrap_or_else(rand::random));
    writer.set_rd(args.rd);
    let mut uncompressed_len = 0;
    for qname in names {
        uncompressed_len += qname.wire_len() + 4;
        let question = Question {
            qname,
            qtype: args.qtype,
            qclass: args.qclass,
        };
        writer
            .add_question(tracker.as_deref_mut(), &question)
            .with_context(|| format!("failed to add the question for {}", question.qname))?;
    }
    let len = writer.finish();
    debug!(
        "Encoded {} question(s) in {} octets of body ({} uncompressed).",
        args.names.len(),
        len - HEADER_SIZE,
        uncompressed_len,
    );

    buf.truncate(len);
    Ok(buf)
}

////////////////////////////////////////////////////////////////////////
// FIELDS                                                             //
////////////////////////////////////////////////////////////////////////

/// Prints the field dictionary.
pub fn fields(args: FieldsArgs) -> Result<()> {
    let config = config::load(args.config.as_deref())?;
    let dictionary = config.dictionary()?;
    println!(
        "# {} field(s), type size {}, length width {}",
        dictionary.len(),
        dictionary.type_size(),
        dictionary.length_width(),
    );
    for field in &dictionary {
        println!("{}", field);
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
