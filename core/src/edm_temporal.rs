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

//! Temporal primitive types
//!
//! - [`EdmDateTimeOffset`] wraps `time::OffsetDateTime` and uses RFC 3339;
//!   `+00:00` is rendered as `Z`, other offsets are preserved.
//! - [`EdmDate`] is `YYYY-MM-DD`.
//! - [`EdmTimeOfDay`] is `hh:mm[:ss[.fffffffff]]`; fractional seconds are
//!   rendered without trailing zeros.
//! - [`EdmDuration`] is the ISO 8601 day-time duration `[-]PnDTnHnMn.nS`,
//!   rendered in canonical form (`PT36H` becomes `P1DT12H`).
//!
//! ```rust
//! use odata_json_core::EdmDuration;
//!
//! let d: EdmDuration = "PT36H".parse().unwrap();
//! assert_eq!(d.to_string(), "P1DT12H");
//! ```

use core::str::FromStr;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use std::fmt::Error as FmtError;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::Date;
use time::Duration;
use time::OffsetDateTime;
use time::Time;

const SECONDS_PER_DAY: i64 = 86_400;
const NANOS_DIGITS: usize = 9;

/// Invalid textual representation of a temporal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTemporal(pub String);

impl Display for InvalidTemporal {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "invalid temporal value: {}", self.0)
    }
}

impl std::error::Error for InvalidTemporal {}

/// Type corresponding to `Edm.DateTimeOffset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdmDateTimeOffset(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl From<OffsetDateTime> for EdmDateTimeOffset {
    fn from(dt: OffsetDateTime) -> Self {
        Self(dt)
    }
}

impl From<EdmDateTimeOffset> for OffsetDateTime {
    fn from(w: EdmDateTimeOffset) -> Self {
        w.0
    }
}

impl Display for EdmDateTimeOffset {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = self.0.format(&Rfc3339).map_err(|_| FmtError)?;
        f.write_str(&s)
    }
}

impl FromStr for EdmDateTimeOffset {
    type Err = InvalidTemporal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OffsetDateTime::parse(s, &Rfc3339)
            .map(Self)
            .map_err(|_| InvalidTemporal(s.into()))
    }
}

/// Type corresponding to `Edm.Date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdmDate(Date);

impl From<Date> for EdmDate {
    fn from(d: Date) -> Self {
        Self(d)
    }
}

impl From<EdmDate> for Date {
    fn from(w: EdmDate) -> Self {
        w.0
    }
}

impl Display for EdmDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = self
            .0
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(|_| FmtError)?;
        f.write_str(&s)
    }
}

impl FromStr for EdmDate {
    type Err = InvalidTemporal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s, format_description!("[year]-[month]-[day]"))
            .map(Self)
            .map_err(|_| InvalidTemporal(s.into()))
    }
}

/// Type corresponding to `Edm.TimeOfDay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdmTimeOfDay(Time);

impl From<Time> for EdmTimeOfDay {
    fn from(t: Time) -> Self {
        Self(t)
    }
}

impl From<EdmTimeOfDay> for Time {
    fn from(w: EdmTimeOfDay) -> Self {
        w.0
    }
}

impl Display for EdmTimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let t = self.0;
        write!(f, "{:02}:{:02}:{:02}", t.hour(), t.minute(), t.second())?;
        write_fraction(f, t.nanosecond())
    }
}

impl FromStr for EdmTimeOfDay {
    type Err = InvalidTemporal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Time::parse(s, format_description!("[hour]:[minute]:[second].[subsecond]"))
            .or_else(|_| Time::parse(s, format_description!("[hour]:[minute]:[second]")))
            .or_else(|_| Time::parse(s, format_description!("[hour]:[minute]")))
            .map(Self)
            .map_err(|_| InvalidTemporal(s.into()))
    }
}

/// Type corresponding to `Edm.Duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdmDuration(Duration);

impl From<Duration> for EdmDuration {
    fn from(d: Duration) -> Self {
        Self(d)
    }
}

impl From<EdmDuration> for Duration {
    fn from(w: EdmDuration) -> Self {
        w.0
    }
}

impl Display for EdmDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.0.is_negative() {
            f.write_str("-")?;
        }
        let abs = self.0.abs();
        let total = abs.whole_seconds();
        let nanos = abs.subsec_nanoseconds().unsigned_abs();
        let days = total / SECONDS_PER_DAY;
        let hours = total % SECONDS_PER_DAY / 3600;
        let minutes = total % 3600 / 60;
        let seconds = total % 60;

        f.write_str("P")?;
        if days > 0 {
            write!(f, "{days}D")?;
        }
        if hours == 0 && minutes == 0 && seconds == 0 && nanos == 0 {
            return if days == 0 { f.write_str("T0S") } else { Ok(()) };
        }
        f.write_str("T")?;
        if hours > 0 {
            write!(f, "{hours}H")?;
        }
        if minutes > 0 {
            write!(f, "{minutes}M")?;
        }
        if seconds > 0 || nanos > 0 {
            write!(f, "{seconds}")?;
            write_fraction(f, nanos)?;
            f.write_str("S")?;
        }
        Ok(())
    }
}

impl FromStr for EdmDuration {
    type Err = InvalidTemporal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s)
            .map(Self)
            .ok_or_else(|| InvalidTemporal(s.into()))
    }
}

fn write_fraction(f: &mut Formatter<'_>, nanos: u32) -> FmtResult {
    if nanos == 0 {
        return Ok(());
    }
    let digits = format!("{nanos:09}");
    write!(f, ".{}", digits.trim_end_matches('0'))
}

fn digits(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_duration(s: &str) -> Option<Duration> {
    let (negative, rest) = s.strip_prefix('-').map_or((false, s), |r| (true, r));
    let rest = rest.strip_prefix('P')?;
    let (date, time) = match rest.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (rest, None),
    };
    if date.is_empty() && time.is_none() {
        return None;
    }

    let mut seconds: i64 = 0;
    let mut nanos: i32 = 0;
    if !date.is_empty() {
        let days = digits(date.strip_suffix('D')?)?;
        seconds = days.checked_mul(SECONDS_PER_DAY)?;
    }
    if let Some(mut time) = time {
        if time.is_empty() {
            return None;
        }
        for (unit, factor) in [('H', 3600), ('M', 60)] {
            if let Some((value, tail)) = time.split_once(unit) {
                seconds = seconds.checked_add(digits(value)?.checked_mul(factor)?)?;
                time = tail;
            }
        }
        if !time.is_empty() {
            let value = time.strip_suffix('S')?;
            let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
            seconds = seconds.checked_add(digits(whole)?)?;
            if !fraction.is_empty() {
                digits(fraction)?;
                let padded = format!("{fraction:0<9}");
                nanos = padded[..NANOS_DIGITS].parse().ok()?;
            }
        }
    }
    let duration = Duration::new(seconds, nanos);
    Some(if negative { -duration } else { duration })
}
