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

//! Core types of the OData JSON format
//!
//! This crate holds everything the JSON reader and writer share but that
//! does not depend on JSON itself:
//! - [`edm`]: the Entity Data Model, its builder and name parsing;
//! - [`value`] and [`item`]: values and payload items produced by readers
//!   and consumed by writers;
//! - [`settings`], [`media_type`], [`version`]: reader/writer configuration;
//! - [`context_url`] and [`odata`]: control information carried by payloads.

/// Context URL construction and parsing.
pub mod context_url;
/// Entity Data Model.
pub mod edm;
/// `Edm.Date`, `Edm.TimeOfDay`, `Edm.DateTimeOffset` and `Edm.Duration`.
pub mod edm_temporal;
/// Resources, resource sets and delta items.
pub mod item;
/// Media type parameters of OData JSON payloads.
pub mod media_type;
/// Control annotations and identifiers.
pub mod odata;
/// Reader and writer settings.
pub mod settings;
/// Property and annotation values.
pub mod value;
/// Protocol versions.
pub mod version;

#[doc(inline)]
pub use edm::EdmModel;
#[doc(inline)]
pub use edm_temporal::EdmDate;
#[doc(inline)]
pub use edm_temporal::EdmDateTimeOffset;
#[doc(inline)]
pub use edm_temporal::EdmDuration;
#[doc(inline)]
pub use edm_temporal::EdmTimeOfDay;
#[doc(inline)]
pub use odata::ControlAnnotation;
#[doc(inline)]
pub use odata::ODataETag;
#[doc(inline)]
pub use odata::ODataId;
#[doc(inline)]
pub use settings::ReaderSettings;
#[doc(inline)]
pub use settings::WriterSettings;
#[doc(inline)]
pub use value::ODataValue;
#[doc(inline)]
pub use value::PrimitiveValue;
#[doc(inline)]
pub use version::ODataVersion;
