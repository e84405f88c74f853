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

//! Property and annotation values.

use crate::edm::PrimitiveKind;
use crate::edm_temporal::EdmDate;
use crate::edm_temporal::EdmDateTimeOffset;
use crate::edm_temporal::EdmDuration;
use crate::edm_temporal::EdmTimeOfDay;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rust_decimal::Decimal;
use serde_json::Number;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Value of a primitive type.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    Boolean(bool),
    Byte(u8),
    SByte(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
    String(String),
    Guid(Uuid),
    Binary(Vec<u8>),
    Date(EdmDate),
    TimeOfDay(EdmTimeOfDay),
    DateTimeOffset(EdmDateTimeOffset),
    Duration(EdmDuration),
}

impl PrimitiveValue {
    #[must_use]
    pub const fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Boolean(_) => PrimitiveKind::Boolean,
            Self::Byte(_) => PrimitiveKind::Byte,
            Self::SByte(_) => PrimitiveKind::SByte,
            Self::Int16(_) => PrimitiveKind::Int16,
            Self::Int32(_) => PrimitiveKind::Int32,
            Self::Int64(_) => PrimitiveKind::Int64,
            Self::Single(_) => PrimitiveKind::Single,
            Self::Double(_) => PrimitiveKind::Double,
            Self::Decimal(_) => PrimitiveKind::Decimal,
            Self::String(_) => PrimitiveKind::String,
            Self::Guid(_) => PrimitiveKind::Guid,
            Self::Binary(_) => PrimitiveKind::Binary,
            Self::Date(_) => PrimitiveKind::Date,
            Self::TimeOfDay(_) => PrimitiveKind::TimeOfDay,
            Self::DateTimeOffset(_) => PrimitiveKind::DateTimeOffset,
            Self::Duration(_) => PrimitiveKind::Duration,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Convert to a JSON value as it appears in a payload without
    /// `IEEE754Compatible`. Non-finite floating point values become
    /// strings.
    #[must_use]
    pub fn to_json_value(&self) -> JsonValue {
        let float = |v: f64| {
            Number::from_f64(v).map_or_else(|| JsonValue::String(special_float(v).into()), JsonValue::Number)
        };
        match self {
            Self::Boolean(v) => JsonValue::Bool(*v),
            Self::Byte(v) => JsonValue::from(*v),
            Self::SByte(v) => JsonValue::from(*v),
            Self::Int16(v) => JsonValue::from(*v),
            Self::Int32(v) => JsonValue::from(*v),
            Self::Int64(v) => JsonValue::from(*v),
            Self::Single(v) => float(f64::from(*v)),
            Self::Double(v) => float(*v),
            Self::Decimal(v) => v
                .to_string()
                .parse::<Number>()
                .map_or_else(|_| JsonValue::String(v.to_string()), JsonValue::Number),
            Self::String(v) => JsonValue::String(v.clone()),
            Self::Guid(v) => JsonValue::String(v.hyphenated().to_string()),
            Self::Binary(v) => JsonValue::String(BASE64.encode(v)),
            Self::Date(v) => JsonValue::String(v.to_string()),
            Self::TimeOfDay(v) => JsonValue::String(v.to_string()),
            Self::DateTimeOffset(v) => JsonValue::String(v.to_string()),
            Self::Duration(v) => JsonValue::String(v.to_string()),
        }
    }
}

/// Payload representation of infinite and NaN floating point values.
#[must_use]
pub fn special_float(v: f64) -> &'static str {
    if v.is_nan() {
        "NaN"
    } else if v.is_sign_negative() {
        "-INF"
    } else {
        "INF"
    }
}

impl From<bool> for PrimitiveValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i32> for PrimitiveValue {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for PrimitiveValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for PrimitiveValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<Decimal> for PrimitiveValue {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<Uuid> for PrimitiveValue {
    fn from(v: Uuid) -> Self {
        Self::Guid(v)
    }
}

impl From<&str> for PrimitiveValue {
    fn from(v: &str) -> Self {
        Self::String(v.into())
    }
}

impl From<String> for PrimitiveValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// Untyped JSON value preserved as its exact source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UntypedValue {
    raw: String,
}

impl UntypedValue {
    /// Wrap raw JSON text. The text is written verbatim by writers.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn into_raw(self) -> String {
        self.raw
    }
}

/// Value of an enum type: member name(s) as they appear in the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub type_name: Option<String>,
    pub value: String,
}

/// Collection of primitive or enum values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectionValue {
    /// `Collection(...)` type name, if known.
    pub type_name: Option<String>,
    pub items: Vec<ODataValue>,
}

/// Media resource or stream property reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamReference {
    pub edit_link: Option<String>,
    pub read_link: Option<String>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
}

impl StreamReference {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.edit_link.is_none()
            && self.read_link.is_none()
            && self.content_type.is_none()
            && self.etag.is_none()
    }
}

/// Value of a property, annotation, parameter or collection item.
#[derive(Debug, Clone, PartialEq)]
pub enum ODataValue {
    Null,
    Primitive(PrimitiveValue),
    Enum(EnumValue),
    Collection(CollectionValue),
    Untyped(UntypedValue),
    Stream(StreamReference),
}

impl ODataValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            Self::Primitive(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_untyped(&self) -> Option<&UntypedValue> {
        match self {
            Self::Untyped(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_collection(&self) -> Option<&CollectionValue> {
        match self {
            Self::Collection(v) => Some(v),
            _ => None,
        }
    }

    /// Convert to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns error if an untyped value does not hold valid JSON.
    pub fn to_json_value(&self) -> Result<JsonValue, serde_json::Error> {
        Ok(match self {
            Self::Null | Self::Stream(_) => JsonValue::Null,
            Self::Primitive(v) => v.to_json_value(),
            Self::Enum(v) => JsonValue::String(v.value.clone()),
            Self::Collection(v) => JsonValue::Array(
                v.items
                    .iter()
                    .map(Self::to_json_value)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Self::Untyped(v) => serde_json::from_str(v.raw())?,
        })
    }
}

impl From<PrimitiveValue> for ODataValue {
    fn from(v: PrimitiveValue) -> Self {
        Self::Primitive(v)
    }
}

macro_rules! primitive_into_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ODataValue {
                fn from(v: $t) -> Self {
                    Self::Primitive(v.into())
                }
            }
        )*
    };
}

primitive_into_value!(bool, i32, i64, f64, Decimal, Uuid, &str, String);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn json_conversion() {
        let value = ODataValue::Collection(CollectionValue {
            type_name: Some("Collection(Edm.Decimal)".into()),
            items: vec![
                Decimal::from_str("12.30").unwrap().into(),
                ODataValue::Null,
                ODataValue::Untyped(UntypedValue::new(r#"{"a":[1,2]}"#)),
            ],
        });
        assert_eq!(value.to_json_value().unwrap(), json!([12.30, null, {"a": [1, 2]}]));
    }

    #[test]
    fn special_floats_become_strings() {
        assert_eq!(PrimitiveValue::Double(f64::NAN).to_json_value(), json!("NaN"));
        assert_eq!(PrimitiveValue::Double(f64::NEG_INFINITY).to_json_value(), json!("-INF"));
        assert_eq!(PrimitiveValue::Single(1.5).to_json_value(), json!(1.5));
    }

    #[test]
    fn kinds() {
        assert_eq!(PrimitiveValue::from("x").kind(), PrimitiveKind::String);
        assert_eq!(ODataValue::from(5).as_primitive(), Some(&PrimitiveValue::Int32(5)));
    }
}
