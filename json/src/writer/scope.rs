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

//! Open scopes of a [`super::ResourceWriter`].

use odata_json_core::edm::NavigationSource;
use odata_json_core::edm::StructuredType;
use odata_json_core::item::InstanceAnnotation;
use odata_json_core::item::NestedResourceInfo;
use odata_json_core::item::OperationLink;

pub(super) struct SetScope<'a> {
    pub delta: bool,
    pub item_type: Option<&'a StructuredType>,
    pub source: Option<&'a NavigationSource>,
    /// Payload root: closes the wrapping object.
    pub top: bool,
}

pub(super) struct ResourceScope<'a> {
    pub ty: Option<&'a StructuredType>,
    pub source: Option<&'a NavigationSource>,
    pub deleted: bool,
    /// Bound operations, written after the properties.
    pub actions: Vec<OperationLink>,
    pub functions: Vec<OperationLink>,
}

pub(super) struct NestedScope<'a> {
    pub info: NestedResourceInfo,
    pub target: Option<&'a StructuredType>,
    pub source: Option<&'a NavigationSource>,
    pub binds: Vec<String>,
    /// Expanded content (resource, null or set) was started.
    pub content: bool,
}

pub(super) enum Scope<'a> {
    Set(SetScope<'a>),
    Resource(ResourceScope<'a>),
    NestedInfo(NestedScope<'a>),
}

impl Scope<'_> {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Set(SetScope { delta: true, .. }) => "delta resource set",
            Self::Set(_) => "resource set",
            Self::Resource(ResourceScope { deleted: true, .. }) => "deleted resource",
            Self::Resource(_) => "resource",
            Self::NestedInfo(_) => "nested resource info",
        }
    }
}

/// Nested resource info entered by its content.
pub(super) struct NestedContent<'a> {
    pub name: String,
    pub target: Option<&'a StructuredType>,
    pub source: Option<&'a NavigationSource>,
    pub binds: Vec<String>,
    pub is_collection: bool,
    pub count: Option<i64>,
    pub annotations: Vec<InstanceAnnotation>,
}

/// Open stream property value.
pub(super) struct OpenStream {
    pub binary: bool,
    /// Bytes not yet encoded: base64 is written in 3 byte groups.
    pub pending: Vec<u8>,
}
