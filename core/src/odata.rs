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

//! OData control information
//!
//! - [`ODataId`]: value of `@odata.id`, the resource identifier (opaque string)
//! - [`ODataETag`]: value of `@odata.etag`, the entity tag (opaque string)
//! - [`ControlAnnotation`]: annotations in the `odata` namespace and their
//!   version dependent names.
//!
//! ```rust
//! use odata_json_core::ControlAnnotation;
//! use odata_json_core::ODataVersion;
//!
//! assert_eq!(ControlAnnotation::Count.name(ODataVersion::V4), "odata.count");
//! assert_eq!(ControlAnnotation::Count.name(ODataVersion::V401), "count");
//! assert_eq!(
//!     ControlAnnotation::parse("odata.nextLink", ODataVersion::V401),
//!     Some(ControlAnnotation::NextLink)
//! );
//! ```

use crate::version::ODataVersion;
use core::fmt::Display;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use serde::Deserialize;
use serde::Serialize;

/// Type for `@odata.id` identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ODataId(String);

impl ODataId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ODataId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ODataId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl Display for ODataId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.0.fmt(f)
    }
}

/// Type for `@odata.etag` identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ODataETag(String);

impl ODataETag {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ODataETag {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ODataETag {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl Display for ODataETag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.0.fmt(f)
    }
}

const ODATA_PREFIX: &str = "odata.";

/// Annotations of the `odata` namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAnnotation {
    Context,
    MetadataEtag,
    Type,
    Count,
    NextLink,
    DeltaLink,
    Id,
    ETag,
    EditLink,
    ReadLink,
    NavigationLink,
    AssociationLink,
    MediaEditLink,
    MediaReadLink,
    MediaContentType,
    MediaEtag,
    Removed,
    Delta,
    Bind,
}

const ALL: [ControlAnnotation; 19] = [
    ControlAnnotation::Context,
    ControlAnnotation::MetadataEtag,
    ControlAnnotation::Type,
    ControlAnnotation::Count,
    ControlAnnotation::NextLink,
    ControlAnnotation::DeltaLink,
    ControlAnnotation::Id,
    ControlAnnotation::ETag,
    ControlAnnotation::EditLink,
    ControlAnnotation::ReadLink,
    ControlAnnotation::NavigationLink,
    ControlAnnotation::AssociationLink,
    ControlAnnotation::MediaEditLink,
    ControlAnnotation::MediaReadLink,
    ControlAnnotation::MediaContentType,
    ControlAnnotation::MediaEtag,
    ControlAnnotation::Removed,
    ControlAnnotation::Delta,
    ControlAnnotation::Bind,
];

impl ControlAnnotation {
    /// Term without namespace, e.g. `nextLink`.
    #[must_use]
    pub const fn term(self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::MetadataEtag => "metadataEtag",
            Self::Type => "type",
            Self::Count => "count",
            Self::NextLink => "nextLink",
            Self::DeltaLink => "deltaLink",
            Self::Id => "id",
            Self::ETag => "etag",
            Self::EditLink => "editLink",
            Self::ReadLink => "readLink",
            Self::NavigationLink => "navigationLink",
            Self::AssociationLink => "associationLink",
            Self::MediaEditLink => "mediaEditLink",
            Self::MediaReadLink => "mediaReadLink",
            Self::MediaContentType => "mediaContentType",
            Self::MediaEtag => "mediaEtag",
            Self::Removed => "removed",
            Self::Delta => "delta",
            Self::Bind => "bind",
        }
    }

    /// Annotation name (without `@`) written for the protocol version.
    #[must_use]
    pub const fn name(self, version: ODataVersion) -> &'static str {
        match version {
            ODataVersion::V4 => self.qualified_name(),
            ODataVersion::V401 => self.term(),
        }
    }

    /// Name with the `odata.` prefix.
    #[must_use]
    pub const fn qualified_name(self) -> &'static str {
        match self {
            Self::Context => "odata.context",
            Self::MetadataEtag => "odata.metadataEtag",
            Self::Type => "odata.type",
            Self::Count => "odata.count",
            Self::NextLink => "odata.nextLink",
            Self::DeltaLink => "odata.deltaLink",
            Self::Id => "odata.id",
            Self::ETag => "odata.etag",
            Self::EditLink => "odata.editLink",
            Self::ReadLink => "odata.readLink",
            Self::NavigationLink => "odata.navigationLink",
            Self::AssociationLink => "odata.associationLink",
            Self::MediaEditLink => "odata.mediaEditLink",
            Self::MediaReadLink => "odata.mediaReadLink",
            Self::MediaContentType => "odata.mediaContentType",
            Self::MediaEtag => "odata.mediaEtag",
            Self::Removed => "odata.removed",
            Self::Delta => "odata.delta",
            Self::Bind => "odata.bind",
        }
    }

    /// Recognize an annotation name (without `@`). Prefixed names are
    /// accepted for every version, short names only for 4.01.
    #[must_use]
    pub fn parse(name: &str, version: ODataVersion) -> Option<Self> {
        let term = match name.strip_prefix(ODATA_PREFIX) {
            Some(term) => term,
            None if version >= ODataVersion::V401 => name,
            None => return None,
        };
        ALL.into_iter().find(|a| a.term() == term)
    }

    /// Annotation name is in the `odata` namespace (known or not).
    #[must_use]
    pub fn is_odata_namespace(name: &str) -> bool {
        name.starts_with(ODATA_PREFIX)
    }
}

impl Display for ControlAnnotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.qualified_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_version() {
        for a in ALL {
            assert_eq!(ControlAnnotation::parse(a.name(ODataVersion::V4), ODataVersion::V4), Some(a));
            assert_eq!(
                ControlAnnotation::parse(a.name(ODataVersion::V401), ODataVersion::V401),
                Some(a)
            );
        }
    }

    #[test]
    fn short_names_need_401() {
        assert_eq!(ControlAnnotation::parse("removed", ODataVersion::V4), None);
        assert_eq!(
            ControlAnnotation::parse("removed", ODataVersion::V401),
            Some(ControlAnnotation::Removed)
        );
        assert_eq!(ControlAnnotation::parse("odata.unknown", ODataVersion::V401), None);
        assert!(ControlAnnotation::is_odata_namespace("odata.unknown"));
    }

    #[test]
    fn identifiers_are_transparent() {
        let id = ODataId::from("Customers('ALFKI')");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""Customers('ALFKI')""#);
        assert_eq!(ODataETag::from("W/\"1\"").to_string(), "W/\"1\"");
    }
}
