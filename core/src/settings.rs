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

//! Reader and writer settings
//!
//! Settings are plain values built per reader or writer; nothing is
//! global. Builder methods follow the usual fluent style:
//!
//! ```rust
//! use odata_json_core::settings::AnnotationFilter;
//! use odata_json_core::ODataVersion;
//! use odata_json_core::ReaderSettings;
//!
//! let settings = ReaderSettings::default()
//!     .version(ODataVersion::V401)
//!     .read_untyped_as_string(false)
//!     .include_annotations(AnnotationFilter::parse("Core.*,-Core.Secret"));
//! assert!(settings.include_annotation.matches("Core.Description"));
//! assert!(!settings.include_annotation.matches("Core.Secret"));
//! assert!(!settings.include_annotation.matches("Display.Label"));
//! ```

use crate::edm::PrimitiveKind;
use crate::media_type::MediaTypeParameters;
pub use crate::media_type::MetadataLevel;
use crate::version::ODataVersion;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::Arc;
use url::Url;

/// Validations applied against the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validations {
    /// Reject properties not declared on a non-open type.
    pub throw_on_undeclared_property_for_non_open_type: bool,
    /// Reject payload types that conflict with declared types.
    pub throw_if_type_conflicts_with_metadata: bool,
}

impl Default for Validations {
    fn default() -> Self {
        Self {
            throw_on_undeclared_property_for_non_open_type: true,
            throw_if_type_conflicts_with_metadata: true,
        }
    }
}

impl Validations {
    /// No model validations.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            throw_on_undeclared_property_for_non_open_type: false,
            throw_if_type_conflicts_with_metadata: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pattern {
    exclude: bool,
    /// `None` for `*`.
    namespace: Option<String>,
    /// `None` for `NS.*` and `*`.
    term: Option<String>,
}

impl Pattern {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (exclude, text) = text.strip_prefix('-').map_or((false, text), |t| (true, t));
        if text.is_empty() {
            return None;
        }
        if text == "*" {
            return Some(Self {
                exclude,
                namespace: None,
                term: None,
            });
        }
        let (namespace, term) = text.rsplit_once('.')?;
        Some(Self {
            exclude,
            namespace: Some(namespace.into()),
            term: (term != "*").then(|| term.into()),
        })
    }

    /// Specificity of the match, `None` if the pattern does not match.
    fn specificity(&self, namespace: &str, term: &str) -> Option<u8> {
        match (&self.namespace, &self.term) {
            (None, _) => Some(1),
            (Some(ns), None) if ns == namespace => Some(2),
            (Some(ns), Some(t)) if ns == namespace && t == term => Some(3),
            _ => None,
        }
    }
}

#[derive(Clone)]
enum FilterRules {
    Patterns(Vec<Pattern>),
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

/// Selects custom instance annotations to read or write.
///
/// Built from the `odata.include-annotations` preference syntax: comma
/// separated `*`, `Namespace.*` or `Namespace.term` patterns, each
/// optionally prefixed with `-` to exclude. The most specific matching
/// pattern decides; exclusion wins between equally specific patterns.
/// Annotations matching no pattern are excluded.
#[derive(Clone)]
pub struct AnnotationFilter {
    rules: FilterRules,
}

impl AnnotationFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::parse("*")
    }

    #[must_use]
    pub fn none() -> Self {
        Self::parse("-*")
    }

    /// Parse preference syntax. Malformed patterns are ignored.
    #[must_use]
    pub fn parse(preference: &str) -> Self {
        Self {
            rules: FilterRules::Patterns(preference.split(',').filter_map(Pattern::parse).collect()),
        }
    }

    /// Filter with a custom predicate over the annotation name.
    #[must_use]
    pub fn custom(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            rules: FilterRules::Custom(Arc::new(f)),
        }
    }

    /// Annotation `name` (without `@`, optionally with `#qualifier`) is
    /// selected.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match &self.rules {
            FilterRules::Custom(f) => f(name),
            FilterRules::Patterns(patterns) => {
                let name = name.split_once('#').map_or(name, |(n, _)| n);
                let (namespace, term) = name.rsplit_once('.').unwrap_or(("", name));
                patterns
                    .iter()
                    .filter_map(|p| p.specificity(namespace, term).map(|s| (s, p.exclude)))
                    // Exclusion sorts after inclusion for equal specificity.
                    .max()
                    .is_some_and(|(_, exclude)| !exclude)
            }
        }
    }
}

impl Default for AnnotationFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl Debug for AnnotationFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.rules {
            FilterRules::Patterns(p) => f.debug_tuple("AnnotationFilter").field(p).finish(),
            FilterRules::Custom(_) => f.write_str("AnnotationFilter(<custom>)"),
        }
    }
}

/// Predicate selecting properties read as streams: primitive kind (if
/// known), whether the property is a collection, property name.
pub type ReadAsStreamFn = Arc<dyn Fn(Option<PrimitiveKind>, bool, &str) -> bool + Send + Sync>;

/// Settings of readers.
#[derive(Clone)]
pub struct ReaderSettings {
    pub version: ODataVersion,
    pub validations: Validations,
    /// Keep undeclared values without type information as raw JSON text.
    pub read_untyped_as_string: bool,
    /// Read arrays of primitives in untyped values item by item.
    pub enable_untyped_collections: bool,
    pub include_annotation: AnnotationFilter,
    pub read_as_stream: Option<ReadAsStreamFn>,
    /// `Int64` and `Decimal` values may be strings.
    pub ieee754_compatible: bool,
    pub max_nesting_depth: usize,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            version: ODataVersion::default(),
            validations: Validations::default(),
            read_untyped_as_string: true,
            enable_untyped_collections: true,
            include_annotation: AnnotationFilter::default(),
            read_as_stream: None,
            ieee754_compatible: false,
            max_nesting_depth: 100,
        }
    }
}

impl ReaderSettings {
    #[must_use]
    pub const fn version(mut self, version: ODataVersion) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub const fn validations(mut self, validations: Validations) -> Self {
        self.validations = validations;
        self
    }

    #[must_use]
    pub const fn read_untyped_as_string(mut self, v: bool) -> Self {
        self.read_untyped_as_string = v;
        self
    }

    #[must_use]
    pub const fn enable_untyped_collections(mut self, v: bool) -> Self {
        self.enable_untyped_collections = v;
        self
    }

    #[must_use]
    pub fn include_annotations(mut self, filter: AnnotationFilter) -> Self {
        self.include_annotation = filter;
        self
    }

    #[must_use]
    pub fn read_as_stream(
        mut self,
        f: impl Fn(Option<PrimitiveKind>, bool, &str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.read_as_stream = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub const fn ieee754_compatible(mut self, v: bool) -> Self {
        self.ieee754_compatible = v;
        self
    }

    #[must_use]
    pub const fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Take `IEEE754Compatible` from content type parameters.
    #[must_use]
    pub const fn apply_media_type(mut self, params: &MediaTypeParameters) -> Self {
        self.ieee754_compatible = params.ieee754_compatible;
        self
    }

    /// Property is selected by the read-as-stream predicate.
    #[must_use]
    pub fn is_stream(&self, kind: Option<PrimitiveKind>, is_collection: bool, name: &str) -> bool {
        self.read_as_stream
            .as_ref()
            .is_some_and(|f| f(kind, is_collection, name))
    }
}

impl Debug for ReaderSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ReaderSettings")
            .field("version", &self.version)
            .field("validations", &self.validations)
            .field("read_untyped_as_string", &self.read_untyped_as_string)
            .field("enable_untyped_collections", &self.enable_untyped_collections)
            .field("include_annotation", &self.include_annotation)
            .field("read_as_stream", &self.read_as_stream.is_some())
            .field("ieee754_compatible", &self.ieee754_compatible)
            .field("max_nesting_depth", &self.max_nesting_depth)
            .finish()
    }
}

/// Direction of the payload being written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PayloadMode {
    /// Client to service: no deferred links, counts or next links.
    Request,
    #[default]
    Response,
}

/// Settings of writers.
#[derive(Debug, Clone, Default)]
pub struct WriterSettings {
    pub version: ODataVersion,
    pub payload_mode: PayloadMode,
    pub metadata_level: MetadataLevel,
    pub validations: Validations,
    pub ieee754_compatible: bool,
    /// Base of context URLs; relative context URLs are written without it.
    pub service_root: Option<Url>,
    pub include_annotation: AnnotationFilter,
}

impl WriterSettings {
    #[must_use]
    pub const fn version(mut self, version: ODataVersion) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub const fn payload_mode(mut self, mode: PayloadMode) -> Self {
        self.payload_mode = mode;
        self
    }

    #[must_use]
    pub const fn metadata_level(mut self, level: MetadataLevel) -> Self {
        self.metadata_level = level;
        self
    }

    #[must_use]
    pub const fn validations(mut self, validations: Validations) -> Self {
        self.validations = validations;
        self
    }

    #[must_use]
    pub const fn ieee754_compatible(mut self, v: bool) -> Self {
        self.ieee754_compatible = v;
        self
    }

    #[must_use]
    pub fn service_root(mut self, root: Url) -> Self {
        self.service_root = Some(root);
        self
    }

    #[must_use]
    pub fn include_annotations(mut self, filter: AnnotationFilter) -> Self {
        self.include_annotation = filter;
        self
    }

    /// Take metadata level and `IEEE754Compatible` from content type
    /// parameters.
    #[must_use]
    pub fn apply_media_type(mut self, params: &MediaTypeParameters) -> Self {
        if let Some(level) = params.metadata {
            self.metadata_level = level;
        }
        self.ieee754_compatible = params.ieee754_compatible;
        self
    }

    #[must_use]
    pub fn is_request(&self) -> bool {
        self.payload_mode == PayloadMode::Request
    }
}
