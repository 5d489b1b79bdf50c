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

//! Dispatches subcommands and reports their failure.

use std::fmt::Write;
use std::process;

use env_logger::Env;
use log::{debug, error};

use crate::args::{Args, Command};
use crate::commands;

/// Runs the subcommand given on the command line.
pub fn run(args: Args) {
    env_logger::init_from_env(Env::new().default_filter_or("warn"));
    debug!(
        "dnswire v{}.{}.{} starting.",
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR"),
        env!("CARGO_PKG_VERSION_PATCH"),
    );

    let result = match args.command {
        Command::Check(check_args) => commands::check(check_args),
        Command::Encode(encode_args) => commands::encode(encode_args),
        Command::Fields(fields_args) => commands::fields(fields_args),
    };

    if let Err(e) = result {
        let mut message = String::from("Failed:");
        for (i, cause) in e.chain().enumerate() {
            write!(message, "\n[{}] {}", i + 1, cause).unwrap();
        }
        message.push_str("\nExiting with failure.");
        error!("{}", message);
        process::exit(1);
    }
}
