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

use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::str::FromStr;

/// OData protocol version. Selects control annotation names and the
/// delta payload representation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ODataVersion {
    /// 4.0: `@odata.` prefixed control annotations.
    #[default]
    V4,
    /// 4.01: short control annotation names; prefixed names still accepted
    /// when reading.
    V401,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVersion(pub String);

impl Display for UnknownVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "unknown OData version {}", self.0)
    }
}

impl std::error::Error for UnknownVersion {}

impl Display for ODataVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::V4 => f.write_str("4.0"),
            Self::V401 => f.write_str("4.01"),
        }
    }
}

impl FromStr for ODataVersion {
    type Err = UnknownVersion;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "4.0" | "4" => Ok(Self::V4),
            "4.01" => Ok(Self::V401),
            _ => Err(UnknownVersion(s.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        assert_eq!("4.01".parse::<ODataVersion>().unwrap(), ODataVersion::V401);
        assert_eq!(ODataVersion::default().to_string(), "4.0");
        assert!("3.0".parse::<ODataVersion>().is_err());
    }
}
