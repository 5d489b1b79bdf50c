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

//! Implements the configuration file.

use std::fmt::{self, Write};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::Level::Debug;
use log::{debug, log_enabled};
use paste::paste;
use serde::{de, Deserialize};

use dnswire::dict::{Dictionary, DictionaryBuilder, FieldFlags, FieldType, Subtype};

use crate::args::{DirectionArg, Format};

////////////////////////////////////////////////////////////////////////
// CONFIGURATION LOADING                                              //
////////////////////////////////////////////////////////////////////////

/// Loads the configuration from the file given by `path`, or returns
/// the default configuration if there is no path.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            let raw_config =
                fs::read(path).context("failed to read the configuration file")?;
            toml::from_slice(&raw_config).context("failed to parse the configuration file")?
        }
        None => Config::default(),
    };
    log_config_summary(&config);
    Ok(config)
}

/// Summarizes the configuration in the log, if the debug log level is
/// enabled.
fn log_config_summary(config: &Config) {
    if !log_enabled!(Debug) {
        // Don't compute the message if it will never be printed.
        return;
    }

    let mut message = format!(
        "Configuration loaded:\n\
         Direction: {}\n\
         Format:    {}\n\
         Fields:    ",
        config
            .direction
            .map_or("default", |d| if d == DirectionArg::Query { "query" } else { "response" }),
        match config.format {
            None => "default",
            Some(Format::Raw) => "raw",
            Some(Format::Hex) => "hex",
            Some(Format::Base64) => "base64",
        },
    );
    if config.fields.is_empty() {
        message.push_str("none added");
    } else {
        write!(message, "{} added", config.fields.len()).unwrap();
        for field in &config.fields {
            write!(message, "\n  {} ({})", field.name, field.field_type.0).unwrap();
        }
    }
    debug!("{}", message);
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION FILE STRUCTURE                                       //
////////////////////////////////////////////////////////////////////////

/// The complete configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub direction: Option<DirectionArg>,
    pub format: Option<Format>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

impl Config {
    /// Builds the DNS dictionary extended with the configured fields.
    pub fn dictionary(&self) -> Result<Dictionary> {
        let mut builder = DictionaryBuilder::dns();
        for field in &self.fields {
            let flags = FieldFlags {
                length: field.length,
                array: field.array,
                subtype: field.subtype.as_ref().map(|s| s.0),
                ..FieldFlags::default()
            };
            builder
                .define(&field.name, field.field_type.0, flags)
                .with_context(|| format!("failed to define field {}", field.name))?;
        }
        Ok(builder.build())
    }
}

/// The definition of an additional field.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: ConfigFieldType,
    #[serde(default)]
    pub array: bool,
    pub length: Option<u16>,
    pub subtype: Option<ConfigSubtype>,
}

////////////////////////////////////////////////////////////////////////
// WRAPPERS OVER DNSWIRE TYPES FOR SERDE                              //
////////////////////////////////////////////////////////////////////////

/// Generates a deserializable `ConfigX` structure wrapping an `X` type
/// from [`dnswire`], using its [`FromStr`](std::str::FromStr)
/// implementation.
macro_rules! make_serde_wrapper {
    ($wrapper:ident, $over:ty, $description:literal) => {
        /// A macro-generated deserializable wrapper over a [`dnswire`]
        /// type.
        #[derive(Clone, Debug)]
        pub struct $wrapper(pub $over);

        impl<'de> Deserialize<'de> for $wrapper {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: de::Deserializer<'de>,
            {
                deserializer.deserialize_str(paste! { [<$wrapper Visitor>] })
            }
        }

        paste! {
            /// A macro-generated [`Visitor`](de::Visitor).
            #[derive(Debug)]
            struct [<$wrapper Visitor>];
        }

        impl<'de> de::Visitor<'de> for paste! { [<$wrapper Visitor>] } {
            type Value = $wrapper;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str($description)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .parse()
                    .map($wrapper)
                    .map_err(|e| E::custom(format!("invalid {}: {}", $description, e)))
            }
        }
    };
}

make_serde_wrapper!(ConfigFieldType, FieldType, "field type");
make_serde_wrapper!(ConfigSubtype, Subtype, "field subtype");
