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

//! Implements command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use dnswire::message::Direction;

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// Validate, decode, and encode DNS messages
#[derive(Debug, Parser)]
#[command(author, version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate DNS messages and print the names they contain
    Check(CheckArgs),

    /// Encode a query with compressed names and print it in hex
    Encode(EncodeArgs),

    /// Print the field dictionary
    Fields(FieldsArgs),
}

#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Set the configuration file to use
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Set whether the messages are queries or responses [default: query]
    #[arg(long, value_enum)]
    pub direction: Option<DirectionArg>,

    /// Set how the messages are stored in the files [default: raw]
    #[arg(long, value_enum)]
    pub format: Option<Format>,

    /// The files holding one message each
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct EncodeArgs {
    /// Set the message ID [default: random]
    #[arg(long)]
    pub id: Option<u16>,

    /// Set the QTYPE of every question
    #[arg(long, default_value_t = 1)]
    pub qtype: u16,

    /// Set the QCLASS of every question
    #[arg(long, default_value_t = 1)]
    pub qclass: u16,

    /// Set the RD (recursion desired) bit
    #[arg(long)]
    pub rd: bool,

    /// Write names without compression
    #[arg(long)]
    pub no_compression: bool,

    /// The QNAMEs, one question each
    #[arg(required = true, value_name = "NAME")]
    pub names: Vec<String>,
}

#[derive(Debug, Parser)]
pub struct FieldsArgs {
    /// Set the configuration file to use
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// The direction of the messages to check.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DirectionArg {
    Query,
    Response,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Query => Self::Query,
            DirectionArg::Response => Self::Response,
        }
    }
}

/// How a message is stored in a file.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// The octets of the message as-is
    Raw,

    /// Hexadecimal digits, with any whitespace ignored
    Hex,

    /// Standard base64, with any whitespace ignored
    Base64,
}
