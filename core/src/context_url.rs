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

//! Context URLs
//!
//! The context URL names the metadata document and describes the payload:
//! `{service-root}$metadata#{fragment}`. Readers only look at the fragment;
//! the delta item kinds (`$deletedEntity`, `$link`, `$deletedLink`) route
//! items of 4.0 delta payloads.
//!
//! ```rust
//! use odata_json_core::context_url::ContextUrl;
//! use odata_json_core::context_url::ContextUrlKind;
//!
//! let ctx = ContextUrl::parse("http://host/service/$metadata#Customers/$deletedEntity");
//! assert_eq!(ctx.navigation_source.as_deref(), Some("Customers"));
//! assert_eq!(ctx.kind, ContextUrlKind::DeletedEntity);
//! ```

use url::Url;

const METADATA_SEGMENT: &str = "$metadata";

/// Payload kind described by a context URL fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextUrlKind {
    /// `#Set`
    ResourceSet,
    /// `#Set/$entity`
    Entity,
    /// `#Set/$delta`
    Delta,
    /// `#Set/$deletedEntity`
    DeletedEntity,
    /// `#Set/$link`
    Link,
    /// `#Set/$deletedLink`
    DeletedLink,
    /// `#Collection(Type)`
    Collection(String),
    /// `#Type` or other fragments, e.g. a single property.
    Other(String),
}

impl ContextUrlKind {
    const fn suffix(&self) -> Option<&'static str> {
        match self {
            Self::Entity => Some("/$entity"),
            Self::Delta => Some("/$delta"),
            Self::DeletedEntity => Some("/$deletedEntity"),
            Self::Link => Some("/$link"),
            Self::DeletedLink => Some("/$deletedLink"),
            Self::ResourceSet | Self::Collection(_) | Self::Other(_) => None,
        }
    }
}

const SUFFIXED: [ContextUrlKind; 5] = [
    ContextUrlKind::Entity,
    ContextUrlKind::Delta,
    ContextUrlKind::DeletedEntity,
    ContextUrlKind::Link,
    ContextUrlKind::DeletedLink,
];

/// Parsed context URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextUrl {
    /// Part before `#`, empty for relative context URLs.
    pub metadata_url: String,
    pub navigation_source: Option<String>,
    pub kind: ContextUrlKind,
}

impl ContextUrl {
    /// Parse a context URL. Parsing never fails: unrecognized fragments
    /// become [`ContextUrlKind::Other`].
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let (metadata_url, fragment) = text.split_once('#').unwrap_or((text, ""));
        let metadata_url = metadata_url.to_string();
        if let Some(element) = fragment
            .strip_prefix("Collection(")
            .and_then(|v| v.strip_suffix(')'))
        {
            return Self {
                metadata_url,
                navigation_source: None,
                kind: ContextUrlKind::Collection(element.into()),
            };
        }
        for kind in SUFFIXED {
            if let Some(source) = kind.suffix().and_then(|s| fragment.strip_suffix(s)) {
                return Self {
                    metadata_url,
                    navigation_source: Some(source.into()).filter(|s: &String| !s.is_empty()),
                    kind,
                };
            }
        }
        let is_source = !fragment.is_empty()
            && !fragment.contains('/')
            && !fragment.contains('(')
            && !fragment.contains('.');
        if is_source {
            Self {
                metadata_url,
                navigation_source: Some(fragment.into()),
                kind: ContextUrlKind::ResourceSet,
            }
        } else {
            Self {
                metadata_url,
                navigation_source: None,
                kind: ContextUrlKind::Other(fragment.into()),
            }
        }
    }

    /// Fragment for the payload kind, e.g. `Customers/$delta`.
    #[must_use]
    pub fn fragment(navigation_source: &str, kind: &ContextUrlKind) -> String {
        match kind {
            ContextUrlKind::Collection(element) => format!("Collection({element})"),
            ContextUrlKind::Other(fragment) => fragment.clone(),
            _ => format!("{navigation_source}{}", kind.suffix().unwrap_or_default()),
        }
    }

    /// Build a context URL. Without a service root a relative context URL
    /// (`#fragment`) is produced.
    ///
    /// # Errors
    ///
    /// Returns error if the metadata URL cannot be derived from the
    /// service root.
    pub fn build(
        service_root: Option<&Url>,
        navigation_source: &str,
        kind: &ContextUrlKind,
    ) -> Result<String, url::ParseError> {
        let fragment = Self::fragment(navigation_source, kind);
        match service_root {
            Some(root) => {
                let mut root = root.clone();
                if !root.path().ends_with('/') {
                    let path = format!("{}/", root.path());
                    root.set_path(&path);
                }
                let mut url = root.join(METADATA_SEGMENT)?;
                url.set_fragment(Some(&fragment));
                Ok(url.to_string())
            }
            None => Ok(format!("#{fragment}")),
        }
    }
}
