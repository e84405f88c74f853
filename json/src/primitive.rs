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

//! Reading and writing primitive values.

use crate::json_writer::JsonWriter;
use crate::lexer::JsonScalar;
use crate::Error;
use base64::engine::general_purpose::STANDARD;
use base64::engine::general_purpose::URL_SAFE;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use odata_json_core::edm::EnumType;
use odata_json_core::edm::PrimitiveKind;
use odata_json_core::value::special_float;
use odata_json_core::value::EnumValue;
use odata_json_core::value::ODataValue;
use odata_json_core::PrimitiveValue;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

/// Read a non-null scalar as a value of the primitive kind.
///
/// # Errors
///
/// Returns [`Error::InvalidPrimitiveValue`] if the scalar is not a valid
/// value of the kind.
pub fn read_primitive(
    scalar: &JsonScalar<'_>,
    kind: PrimitiveKind,
    property: &str,
) -> Result<PrimitiveValue, Error> {
    let invalid = || Error::InvalidPrimitiveValue {
        property: property.into(),
        type_name: kind.to_string(),
        value: scalar_text(scalar),
    };
    let value = match (kind, scalar) {
        (PrimitiveKind::Boolean, JsonScalar::Boolean(v)) => PrimitiveValue::Boolean(*v),
        (PrimitiveKind::Byte, JsonScalar::Number(v)) => {
            PrimitiveValue::Byte(v.parse().map_err(|_| invalid())?)
        }
        (PrimitiveKind::SByte, JsonScalar::Number(v)) => {
            PrimitiveValue::SByte(v.parse().map_err(|_| invalid())?)
        }
        (PrimitiveKind::Int16, JsonScalar::Number(v)) => {
            PrimitiveValue::Int16(v.parse().map_err(|_| invalid())?)
        }
        (PrimitiveKind::Int32, JsonScalar::Number(v)) => {
            PrimitiveValue::Int32(v.parse().map_err(|_| invalid())?)
        }
        (PrimitiveKind::Int64, JsonScalar::Number(v)) => {
            PrimitiveValue::Int64(v.parse().map_err(|_| invalid())?)
        }
        (PrimitiveKind::Int64, JsonScalar::String(v)) => {
            PrimitiveValue::Int64(v.parse().map_err(|_| invalid())?)
        }
        (PrimitiveKind::Decimal, JsonScalar::Number(v)) => {
            PrimitiveValue::Decimal(parse_decimal(v).ok_or_else(invalid)?)
        }
        (PrimitiveKind::Decimal, JsonScalar::String(v)) => {
            PrimitiveValue::Decimal(parse_decimal(v).ok_or_else(invalid)?)
        }
        (PrimitiveKind::Double, JsonScalar::Number(v)) => {
            PrimitiveValue::Double(v.parse().map_err(|_| invalid())?)
        }
        (PrimitiveKind::Double, JsonScalar::String(v)) => {
            PrimitiveValue::Double(parse_float(v).ok_or_else(invalid)?)
        }
        (PrimitiveKind::Single, JsonScalar::Number(v)) => {
            PrimitiveValue::Single(v.parse().map_err(|_| invalid())?)
        }
        (PrimitiveKind::Single, JsonScalar::String(v)) => {
            #[allow(clippy::cast_possible_truncation)]
            let v = parse_float(v).ok_or_else(invalid)? as f32;
            PrimitiveValue::Single(v)
        }
        (PrimitiveKind::String | PrimitiveKind::Stream, JsonScalar::String(v)) => {
            PrimitiveValue::String(v.to_string())
        }
        (PrimitiveKind::Guid, JsonScalar::String(v)) => {
            PrimitiveValue::Guid(Uuid::parse_str(v).map_err(|_| invalid())?)
        }
        (PrimitiveKind::Binary, JsonScalar::String(v)) => {
            PrimitiveValue::Binary(decode_binary(v).ok_or_else(invalid)?)
        }
        (PrimitiveKind::Date, JsonScalar::String(v)) => {
            PrimitiveValue::Date(v.parse().map_err(|_| invalid())?)
        }
        (PrimitiveKind::TimeOfDay, JsonScalar::String(v)) => {
            PrimitiveValue::TimeOfDay(v.parse().map_err(|_| invalid())?)
        }
        (PrimitiveKind::DateTimeOffset, JsonScalar::String(v)) => {
            PrimitiveValue::DateTimeOffset(v.parse().map_err(|_| invalid())?)
        }
        (PrimitiveKind::Duration, JsonScalar::String(v)) => {
            PrimitiveValue::Duration(v.parse().map_err(|_| invalid())?)
        }
        _ => return Err(invalid()),
    };
    Ok(value)
}

/// Read a scalar as a member of the enum type.
///
/// # Errors
///
/// Returns [`Error::InvalidEnumValue`] if the scalar is not a string or
/// names no member.
pub fn read_enum(scalar: &JsonScalar<'_>, ty: &EnumType) -> Result<EnumValue, Error> {
    match scalar {
        JsonScalar::String(v) if ty.is_valid_value(v) => Ok(EnumValue {
            type_name: Some(ty.name.to_string()),
            value: v.to_string(),
        }),
        _ => Err(Error::InvalidEnumValue {
            type_name: ty.name.to_string(),
            value: scalar_text(scalar),
        }),
    }
}

/// Value of a scalar without type information.
///
/// Strings stay strings, integers become the smallest of `Int32` and
/// `Int64` they fit, other numbers `Decimal` when exactly representable
/// and `Double` otherwise.
#[must_use]
pub fn infer_primitive(scalar: &JsonScalar<'_>) -> ODataValue {
    match scalar {
        JsonScalar::Null => ODataValue::Null,
        JsonScalar::Boolean(v) => PrimitiveValue::Boolean(*v).into(),
        JsonScalar::String(v) => PrimitiveValue::String(v.to_string()).into(),
        JsonScalar::Number(v) => infer_number(v).into(),
    }
}

fn infer_number(v: &str) -> PrimitiveValue {
    if let Ok(n) = v.parse::<i32>() {
        return PrimitiveValue::Int32(n);
    }
    if let Ok(n) = v.parse::<i64>() {
        return PrimitiveValue::Int64(n);
    }
    let is_integer = !v.contains(['.', 'e', 'E']);
    if !is_integer {
        if let Some(d) = parse_decimal(v) {
            return PrimitiveValue::Decimal(d);
        }
    }
    // Valid JSON numbers always parse as f64.
    PrimitiveValue::Double(v.parse().unwrap_or(f64::NAN))
}

fn parse_decimal(v: &str) -> Option<Decimal> {
    if v.contains(['e', 'E']) {
        Decimal::from_scientific(v).ok()
    } else {
        Decimal::from_str_exact(v).ok()
    }
}

fn parse_float(v: &str) -> Option<f64> {
    match v {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => f64::from_str(v).ok().filter(|f| f.is_finite()),
    }
}

fn decode_binary(v: &str) -> Option<Vec<u8>> {
    STANDARD
        .decode(v)
        .or_else(|_| URL_SAFE.decode(v))
        .or_else(|_| URL_SAFE_NO_PAD.decode(v))
        .ok()
}

/// Source-like text of a scalar for error messages.
#[must_use]
pub fn scalar_text(scalar: &JsonScalar<'_>) -> String {
    match scalar {
        JsonScalar::Null => "null".into(),
        JsonScalar::Boolean(v) => v.to_string(),
        JsonScalar::Number(v) => (*v).into(),
        JsonScalar::String(v) => format!("\"{v}\""),
    }
}

/// Write a primitive value in its canonical JSON form.
///
/// `Double` and `Single` always carry a fraction or exponent. With
/// `ieee754_compatible`, `Int64` and `Decimal` are written as strings.
///
/// # Errors
///
/// Returns error if a string cannot be escaped.
pub fn write_primitive(
    w: &mut JsonWriter,
    value: &PrimitiveValue,
    ieee754_compatible: bool,
) -> Result<(), Error> {
    match value {
        PrimitiveValue::Boolean(v) => w.boolean(*v),
        PrimitiveValue::Byte(v) => w.raw(&v.to_string()),
        PrimitiveValue::SByte(v) => w.raw(&v.to_string()),
        PrimitiveValue::Int16(v) => w.raw(&v.to_string()),
        PrimitiveValue::Int32(v) => w.raw(&v.to_string()),
        PrimitiveValue::Int64(v) if ieee754_compatible => w.string(&v.to_string())?,
        PrimitiveValue::Int64(v) => w.raw(&v.to_string()),
        PrimitiveValue::Single(v) if v.is_finite() => w.raw(&format!("{v:?}")),
        PrimitiveValue::Single(v) => w.string(special_float(f64::from(*v)))?,
        PrimitiveValue::Double(v) if v.is_finite() => w.raw(&format!("{v:?}")),
        PrimitiveValue::Double(v) => w.string(special_float(*v))?,
        PrimitiveValue::Decimal(v) if ieee754_compatible => w.string(&v.to_string())?,
        PrimitiveValue::Decimal(v) => w.raw(&v.to_string()),
        other => match other.to_json_value() {
            serde_json::Value::String(s) => w.string(&s)?,
            v => w.value(&v)?,
        },
    }
    Ok(())
}

/// Dynamic values of the kind need `@odata.type` to be read back with
/// the same type.
#[must_use]
pub const fn needs_type_annotation(kind: PrimitiveKind) -> bool {
    !matches!(
        kind,
        PrimitiveKind::Boolean | PrimitiveKind::String | PrimitiveKind::Int32 | PrimitiveKind::Double
    )
}
