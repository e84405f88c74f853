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

/// Primitive types of the `Edm` namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Binary,
    Boolean,
    Byte,
    Date,
    DateTimeOffset,
    Decimal,
    Double,
    Duration,
    Guid,
    Int16,
    Int32,
    Int64,
    SByte,
    Single,
    Stream,
    String,
    TimeOfDay,
}

const ALL: [PrimitiveKind; 17] = [
    PrimitiveKind::Binary,
    PrimitiveKind::Boolean,
    PrimitiveKind::Byte,
    PrimitiveKind::Date,
    PrimitiveKind::DateTimeOffset,
    PrimitiveKind::Decimal,
    PrimitiveKind::Double,
    PrimitiveKind::Duration,
    PrimitiveKind::Guid,
    PrimitiveKind::Int16,
    PrimitiveKind::Int32,
    PrimitiveKind::Int64,
    PrimitiveKind::SByte,
    PrimitiveKind::Single,
    PrimitiveKind::Stream,
    PrimitiveKind::String,
    PrimitiveKind::TimeOfDay,
];

impl PrimitiveKind {
    /// Name of the type without namespace, e.g. `Int32`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Binary => "Binary",
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::Date => "Date",
            Self::DateTimeOffset => "DateTimeOffset",
            Self::Decimal => "Decimal",
            Self::Double => "Double",
            Self::Duration => "Duration",
            Self::Guid => "Guid",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::SByte => "SByte",
            Self::Single => "Single",
            Self::Stream => "Stream",
            Self::String => "String",
            Self::TimeOfDay => "TimeOfDay",
        }
    }

    /// Lookup by name without namespace.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        ALL.into_iter().find(|k| k.name() == name)
    }

    #[must_use]
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            Self::Byte | Self::SByte | Self::Int16 | Self::Int32 | Self::Int64
        )
    }

    /// Numeric types that lose precision as JSON numbers and are written
    /// as strings when `IEEE754Compatible=true`.
    #[must_use]
    pub const fn is_ieee754_sensitive(self) -> bool {
        matches!(self, Self::Int64 | Self::Decimal)
    }

    /// Values of `self` can be stored in `target` without loss.
    #[must_use]
    pub const fn promotes_to(self, target: Self) -> bool {
        use PrimitiveKind::*;
        matches!(
            (self, target),
            (Byte, Int16 | Int32 | Int64 | Decimal | Single | Double)
                | (SByte, Int16 | Int32 | Int64 | Decimal | Single | Double)
                | (Int16, Int32 | Int64 | Decimal | Single | Double)
                | (Int32, Int64 | Decimal | Single | Double)
                | (Int64, Decimal | Single | Double)
                | (Single, Double)
        )
    }
}

impl Display for PrimitiveKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Edm.{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        assert_eq!(PrimitiveKind::from_name("Int64"), Some(PrimitiveKind::Int64));
        assert_eq!(PrimitiveKind::from_name("Untyped"), None);
        assert_eq!(PrimitiveKind::TimeOfDay.to_string(), "Edm.TimeOfDay");
    }

    #[test]
    fn promotion() {
        assert!(PrimitiveKind::Int32.promotes_to(PrimitiveKind::Int64));
        assert!(PrimitiveKind::Int32.promotes_to(PrimitiveKind::Double));
        assert!(!PrimitiveKind::Int64.promotes_to(PrimitiveKind::Int32));
        assert!(!PrimitiveKind::String.promotes_to(PrimitiveKind::Guid));
    }
}
