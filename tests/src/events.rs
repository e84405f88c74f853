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

//! Reading payloads into events.

use crate::Error;
use odata_json::reader::Expected;
use odata_json::reader::MessageReader;
use odata_json::ReaderEvent;
use odata_json_core::item::Resource;
use odata_json_core::EdmModel;
use odata_json_core::ReaderSettings;

/// Read a resource payload of `source` into events.
///
/// # Errors
///
/// Returns the first reader error.
pub fn read_resource(
    input: &str,
    model: &EdmModel,
    settings: &ReaderSettings,
    source: &str,
) -> Result<Vec<ReaderEvent>, Error> {
    let reader = MessageReader::new(input, model, settings).create_resource_reader(Expected::navigation_source(source))?;
    Ok(reader.collect::<Result<Vec<_>, _>>()?)
}

/// Read a resource set payload of `source` into events.
///
/// # Errors
///
/// Returns the first reader error.
pub fn read_resource_set(
    input: &str,
    model: &EdmModel,
    settings: &ReaderSettings,
    source: &str,
) -> Result<Vec<ReaderEvent>, Error> {
    let reader =
        MessageReader::new(input, model, settings).create_resource_set_reader(Expected::navigation_source(source))?;
    Ok(reader.collect::<Result<Vec<_>, _>>()?)
}

/// Names of the events, for comparing event sequences.
#[must_use]
pub fn names(events: &[ReaderEvent]) -> Vec<&'static str> {
    events.iter().map(ReaderEvent::name).collect()
}

/// Completed resources in payload order of their ends.
#[must_use]
pub fn resources(events: &[ReaderEvent]) -> Vec<&Resource> {
    events
        .iter()
        .filter_map(|e| match e {
            ReaderEvent::ResourceEnd(r) => Some(r),
            _ => None,
        })
        .collect()
}

/// The last completed resource: the top-level one of a resource payload.
///
/// # Errors
///
/// Returns error if there is no resource.
pub fn top_resource(events: &[ReaderEvent]) -> Result<&Resource, Error> {
    resources(events)
        .last()
        .copied()
        .ok_or(Error::ExpectedEvent("ResourceEnd"))
}
