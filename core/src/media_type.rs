// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Parameters of `application/json` content types used by OData.

use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::str::FromStr;

/// Amount of control information in a payload (`odata.metadata`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MetadataLevel {
    None,
    #[default]
    Minimal,
    Full,
}

impl FromStr for MetadataLevel {
    type Err = MediaTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "minimal" => Ok(Self::Minimal),
            "full" => Ok(Self::Full),
            _ => Err(MediaTypeError::InvalidParameter {
                name: "odata.metadata".into(),
                value: s.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaTypeError {
    /// Media type is not `application/json`.
    NotJson(String),
    InvalidParameter { name: String, value: String },
}

impl Display for MediaTypeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::NotJson(v) => write!(f, "not a JSON media type: {v}"),
            Self::InvalidParameter { name, value } => {
                write!(f, "invalid media type parameter {name}={value}")
            }
        }
    }
}

impl std::error::Error for MediaTypeError {}

/// OData specific parameters of a JSON media type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaTypeParameters {
    pub metadata: Option<MetadataLevel>,
    pub streaming: Option<bool>,
    pub ieee754_compatible: bool,
    pub charset: Option<String>,
}

impl MediaTypeParameters {
    /// Parse a content type such as
    /// `application/json;odata.metadata=minimal;IEEE754Compatible=true`.
    /// Both `odata.` prefixed and 4.01 short parameter names are accepted.
    ///
    /// # Errors
    ///
    /// Returns error if the media type is not JSON or a known parameter has
    /// an invalid value.
    pub fn parse(content_type: &str) -> Result<Self, MediaTypeError> {
        let mut parts = content_type.split(';');
        let media_type = parts.next().unwrap_or_default().trim();
        if !media_type.eq_ignore_ascii_case("application/json") {
            return Err(MediaTypeError::NotJson(media_type.into()));
        }
        let mut params = Self::default();
        for part in parts {
            let Some((name, value)) = part.split_once('=') else {
                continue;
            };
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim().trim_matches('"');
            let flag = || match value.to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(MediaTypeError::InvalidParameter {
                    name: name.clone(),
                    value: value.into(),
                }),
            };
            match name.as_str() {
                "odata.metadata" | "metadata" => params.metadata = Some(value.parse()?),
                "odata.streaming" | "streaming" => params.streaming = Some(flag()?),
                "ieee754compatible" => params.ieee754_compatible = flag()?,
                "charset" => params.charset = Some(value.to_ascii_lowercase()),
                _ => {}
            }
        }
        Ok(params)
    }

    /// Payload is UTF-8 encoded (the default when no charset is given).
    #[must_use]
    pub fn is_utf8(&self) -> bool {
        self.charset
            .as_deref()
            .map_or(true, |c| c == "utf-8" || c == "utf8")
    }
}

impl FromStr for MediaTypeParameters {
    type Err = MediaTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
