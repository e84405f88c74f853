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

//! Property and annotation collector.
//!
//! One collector is created for every resource scope (and for a parameter
//! payload) and dropped with it. It records scope-level annotations,
//! annotations of properties and the properties whose values were read,
//! detecting duplicates and annotations that follow their property.

use crate::Error;
use odata_json_core::item::InstanceAnnotation;
use odata_json_core::value::StreamReference;
use std::collections::HashMap;
use std::collections::HashSet;
use std::mem;

/// Annotations of one property.
#[derive(Debug, Default)]
pub struct PropertyAnnotations {
    pub type_name: Option<String>,
    pub count: Option<i64>,
    pub next_link: Option<String>,
    pub navigation_link: Option<String>,
    pub association_link: Option<String>,
    pub media: StreamReference,
    pub bind: Vec<String>,
    /// Custom annotations that passed the annotation filter.
    pub custom: Vec<InstanceAnnotation>,
}

impl PropertyAnnotations {
    /// Annotations describe a (deferred) navigation property.
    #[must_use]
    pub fn is_navigation(&self) -> bool {
        self.navigation_link.is_some() || self.association_link.is_some() || !self.bind.is_empty()
    }
}

#[derive(Debug, Default)]
struct PropertyState {
    annotations: PropertyAnnotations,
    seen: HashSet<String>,
    value_read: bool,
}

#[derive(Debug, Default)]
pub struct PropertyAndAnnotationCollector {
    scope: HashSet<String>,
    index: HashMap<String, usize>,
    properties: Vec<(String, PropertyState)>,
}

impl PropertyAndAnnotationCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an annotation of the scope itself.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateAnnotation`] if the annotation was
    /// already recorded.
    pub fn add_scope_annotation(&mut self, annotation: &str) -> Result<(), Error> {
        if self.scope.insert(annotation.into()) {
            Ok(())
        } else {
            Err(Error::DuplicateAnnotation {
                property: None,
                annotation: annotation.into(),
            })
        }
    }

    /// Record an annotation of `property` and return the property's
    /// annotations for update.
    ///
    /// # Errors
    ///
    /// Returns error if the annotation is repeated or the property value
    /// was already read.
    pub fn annotations_mut(
        &mut self,
        property: &str,
        annotation: &str,
        is_type: bool,
    ) -> Result<&mut PropertyAnnotations, Error> {
        let state = self.state_mut(property);
        if state.value_read {
            return Err(if is_type {
                Error::TypeAnnotationAfterProperty(property.into())
            } else {
                Error::PropertyAnnotationAfterProperty {
                    property: property.into(),
                    annotation: annotation.into(),
                }
            });
        }
        if !state.seen.insert(annotation.into()) {
            return Err(Error::DuplicateAnnotation {
                property: Some(property.into()),
                annotation: annotation.into(),
            });
        }
        Ok(&mut state.annotations)
    }

    /// Record that the value of `property` is being read and take its
    /// annotations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateProperty`] if the value was already read.
    pub fn mark_property(&mut self, property: &str) -> Result<PropertyAnnotations, Error> {
        let state = self.state_mut(property);
        if state.value_read {
            return Err(Error::DuplicateProperty(property.into()));
        }
        state.value_read = true;
        Ok(mem::take(&mut state.annotations))
    }

    /// Names of properties whose values were read, in payload order.
    pub fn read_properties(&self) -> impl Iterator<Item = &str> {
        self.properties
            .iter()
            .filter(|(_, s)| s.value_read)
            .map(|(name, _)| name.as_str())
    }

    /// Take the properties that had annotations but no value, in payload
    /// order.
    pub fn take_annotation_only(&mut self) -> Vec<(String, PropertyAnnotations)> {
        self.index.clear();
        mem::take(&mut self.properties)
            .into_iter()
            .filter(|(_, s)| !s.value_read)
            .map(|(name, s)| (name, s.annotations))
            .collect()
    }

    fn state_mut(&mut self, property: &str) -> &mut PropertyState {
        let i = match self.index.get(property) {
            Some(i) => *i,
            None => {
                self.properties.push((property.into(), PropertyState::default()));
                let i = self.properties.len() - 1;
                self.index.insert(property.into(), i);
                i
            }
        };
        &mut self.properties[i].1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_scope_annotation() {
        let mut c = PropertyAndAnnotationCollector::new();
        c.add_scope_annotation("odata.id").unwrap();
        assert!(matches!(
            c.add_scope_annotation("odata.id"),
            Err(Error::DuplicateAnnotation { property: None, .. })
        ));
    }

    #[test]
    fn annotations_before_value() {
        let mut c = PropertyAndAnnotationCollector::new();
        c.annotations_mut("Name", "odata.type", true).unwrap().type_name = Some("#String".into());
        assert!(matches!(
            c.annotations_mut("Name", "odata.type", true),
            Err(Error::DuplicateAnnotation { property: Some(_), .. })
        ));
        let annotations = c.mark_property("Name").unwrap();
        assert_eq!(annotations.type_name.as_deref(), Some("#String"));
        assert!(c.read_properties().eq(["Name"]));
    }

    #[test]
    fn annotations_after_value() {
        let mut c = PropertyAndAnnotationCollector::new();
        c.mark_property("Name").unwrap();
        assert!(matches!(
            c.annotations_mut("Name", "odata.type", true),
            Err(Error::TypeAnnotationAfterProperty(p)) if p == "Name"
        ));
        assert!(matches!(
            c.annotations_mut("Name", "custom.note", false),
            Err(Error::PropertyAnnotationAfterProperty { .. })
        ));
        assert!(matches!(c.mark_property("Name"), Err(Error::DuplicateProperty(_))));
    }

    #[test]
    fn annotation_only_properties_in_order() {
        let mut c = PropertyAndAnnotationCollector::new();
        c.annotations_mut("B", "custom.x", false).unwrap();
        c.annotations_mut("A", "custom.x", false).unwrap();
        c.annotations_mut("C", "custom.x", false).unwrap();
        c.mark_property("A").unwrap();
        let names = c
            .take_annotation_only()
            .into_iter()
            .map(|(n, _)| n)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["B", "C"]);
    }
}
