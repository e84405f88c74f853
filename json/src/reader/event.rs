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

use odata_json_core::edm::PrimitiveKind;
use odata_json_core::item::DeletedResource;
use odata_json_core::item::DeltaDeletedLink;
use odata_json_core::item::DeltaLink;
use odata_json_core::item::NestedResourceInfo;
use odata_json_core::item::PropertyInfo;
use odata_json_core::item::Resource;
use odata_json_core::item::ResourceItem;
use odata_json_core::item::ResourceSet;
use odata_json_core::ODataValue;

/// Item produced by resource readers.
///
/// Start events carry the control information known when the scope
/// starts. End events carry the complete item, including properties read
/// inside the scope.
#[derive(Debug, Clone, PartialEq)]
pub enum ReaderEvent {
    ResourceSetStart(ResourceSet),
    ResourceSetEnd(ResourceSet),
    DeltaResourceSetStart(ResourceSet),
    DeltaResourceSetEnd(ResourceSet),
    ResourceStart(Resource),
    ResourceEnd(Resource),
    /// `null` value of a single-valued nested resource.
    NullResource,
    DeletedResourceStart(DeletedResource),
    DeletedResourceEnd(DeletedResource),
    DeltaLink(DeltaLink),
    DeltaDeletedLink(DeltaDeletedLink),
    NestedResourceInfoStart(NestedResourceInfo),
    NestedResourceInfoEnd(NestedResourceInfo),
    /// Property with annotations but without a value.
    NestedProperty(PropertyInfo),
    /// Item of an untyped collection.
    Primitive(ODataValue),
    /// `@odata.bind` target inside a nested resource info.
    EntityReferenceLink(String),
    /// Property selected by the read-as-stream predicate.
    PropertyStream(StreamedProperty),
}

impl ReaderEvent {
    /// Short name of the event kind, for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ResourceSetStart(_) => "ResourceSetStart",
            Self::ResourceSetEnd(_) => "ResourceSetEnd",
            Self::DeltaResourceSetStart(_) => "DeltaResourceSetStart",
            Self::DeltaResourceSetEnd(_) => "DeltaResourceSetEnd",
            Self::ResourceStart(_) => "ResourceStart",
            Self::ResourceEnd(_) => "ResourceEnd",
            Self::NullResource => "NullResource",
            Self::DeletedResourceStart(_) => "DeletedResourceStart",
            Self::DeletedResourceEnd(_) => "DeletedResourceEnd",
            Self::DeltaLink(_) => "DeltaLink",
            Self::DeltaDeletedLink(_) => "DeltaDeletedLink",
            Self::NestedResourceInfoStart(_) => "NestedResourceInfoStart",
            Self::NestedResourceInfoEnd(_) => "NestedResourceInfoEnd",
            Self::NestedProperty(_) => "NestedProperty",
            Self::Primitive(_) => "Primitive",
            Self::EntityReferenceLink(_) => "EntityReferenceLink",
            Self::PropertyStream(_) => "PropertyStream",
        }
    }
}

impl ReaderEvent {
    /// Completed delta item carried by an end or link event.
    #[must_use]
    pub fn into_item(self) -> Option<ResourceItem> {
        match self {
            Self::ResourceEnd(v) => Some(ResourceItem::Resource(v)),
            Self::DeletedResourceEnd(v) => Some(ResourceItem::DeletedResource(v)),
            Self::DeltaLink(v) => Some(ResourceItem::DeltaLink(v)),
            Self::DeltaDeletedLink(v) => Some(ResourceItem::DeltaDeletedLink(v)),
            _ => None,
        }
    }
}

/// Content of a property read as a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamData {
    Text(String),
    Binary(Vec<u8>),
}

/// Property read as a stream instead of a materialized value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamedProperty {
    pub name: String,
    pub kind: Option<PrimitiveKind>,
    pub data: StreamData,
}

impl StreamedProperty {
    /// Content as bytes: UTF-8 of text, decoded bytes of binary.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        match &self.data {
            StreamData::Text(v) => v.as_bytes(),
            StreamData::Binary(v) => v,
        }
    }
}
