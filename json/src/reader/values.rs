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

//! Member names and annotation values shared by readers.

use crate::lexer::JsonNode;
use crate::lexer::JsonReader;
use crate::lexer::JsonScalar;
use crate::lexer::NodeKind;
use crate::primitive::infer_primitive;
use crate::Error;
use odata_json_core::edm::OperationKind;
use odata_json_core::edm::QualifiedName;
use odata_json_core::item::OperationLink;
use odata_json_core::value::UntypedValue;
use odata_json_core::ControlAnnotation;
use odata_json_core::EdmModel;
use odata_json_core::ODataValue;
use odata_json_core::ODataVersion;
use std::collections::HashSet;
use tracing::trace;

const METADATA_REFERENCE: &str = "$metadata#";

/// Classified name of an object member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberName<'n> {
    /// `@annotation` of the enclosing scope.
    Scope(&'n str),
    /// `#Namespace.Operation` or `...$metadata#Namespace.Operation`.
    MetadataReference(&'n str),
    /// `Property@annotation`.
    PropertyAnnotation(&'n str, &'n str),
    Property(&'n str),
}

impl<'n> MemberName<'n> {
    #[must_use]
    pub fn classify(name: &'n str) -> Self {
        if let Some(annotation) = name.strip_prefix('@') {
            return Self::Scope(annotation);
        }
        if name.starts_with('#') || name.contains(METADATA_REFERENCE) {
            return Self::MetadataReference(name);
        }
        match name.split_once('@') {
            Some((property, annotation)) => Self::PropertyAnnotation(property, annotation),
            None => Self::Property(name),
        }
    }
}

/// Classified annotation name (without `@`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationName<'n> {
    Control(ControlAnnotation),
    /// Unknown annotation of the `odata` namespace.
    OtherOData(&'n str),
    /// Custom annotation `Namespace.term[#qualifier]`.
    Custom(&'n str),
}

impl<'n> AnnotationName<'n> {
    /// Classify an annotation name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAnnotationName`] if the name is neither a
    /// control annotation nor a namespace qualified term.
    pub fn parse(name: &'n str, version: ODataVersion) -> Result<Self, Error> {
        if let Some(control) = ControlAnnotation::parse(name, version) {
            return Ok(Self::Control(control));
        }
        if ControlAnnotation::is_odata_namespace(name) {
            return Ok(Self::OtherOData(name));
        }
        let term = name.split_once('#').map_or(name, |(term, _)| term);
        match term.rsplit_once('.') {
            Some((namespace, term)) if !namespace.is_empty() && !term.is_empty() => {
                Ok(Self::Custom(name))
            }
            _ => Err(Error::InvalidAnnotationName(name.into())),
        }
    }
}

/// Read a string annotation value.
///
/// # Errors
///
/// Returns [`Error::InvalidAnnotationValue`] if the value is not a string.
pub fn read_string(lexer: &mut JsonReader<'_>, annotation: &str) -> Result<String, Error> {
    match lexer.node() {
        JsonNode::Primitive(JsonScalar::String(_)) => match lexer.take_scalar()? {
            JsonScalar::String(v) => Ok(v.into_owned()),
            _ => Err(invalid_value(annotation, "a string")),
        },
        _ => Err(invalid_value(annotation, "a string")),
    }
}

/// Read a count: a number, or a string with `IEEE754Compatible`.
///
/// # Errors
///
/// Returns [`Error::InvalidAnnotationValue`] if the value is not an
/// integer.
pub fn read_count(lexer: &mut JsonReader<'_>, annotation: &str) -> Result<i64, Error> {
    let scalar = match lexer.node() {
        JsonNode::Primitive(_) => lexer.take_scalar()?,
        _ => return Err(invalid_value(annotation, "an integer")),
    };
    let count = match &scalar {
        JsonScalar::Number(v) => v.parse().ok(),
        JsonScalar::String(v) => v.parse().ok(),
        _ => None,
    };
    count.ok_or_else(|| invalid_value(annotation, "an integer"))
}

/// Read one string or an array of strings.
///
/// # Errors
///
/// Returns [`Error::InvalidAnnotationValue`] for other values.
pub fn read_strings(lexer: &mut JsonReader<'_>, annotation: &str) -> Result<Vec<String>, Error> {
    if !matches!(lexer.node(), JsonNode::StartArray) {
        return read_string(lexer, annotation).map(|v| vec![v]);
    }
    lexer.read()?;
    let mut result = Vec::new();
    while !matches!(lexer.node(), JsonNode::EndArray) {
        result.push(read_string(lexer, annotation)?);
    }
    lexer.read()?;
    Ok(result)
}

/// Value of a custom annotation: scalars are inferred, objects and arrays
/// kept as raw JSON.
///
/// # Errors
///
/// Returns error if the value is malformed.
pub fn read_annotation_value(lexer: &mut JsonReader<'_>) -> Result<ODataValue, Error> {
    match lexer.node() {
        JsonNode::Primitive(_) => Ok(infer_primitive(&lexer.take_scalar()?)),
        _ => Ok(ODataValue::Untyped(UntypedValue::new(lexer.skip_value()?))),
    }
}

/// Skip an annotation the reader does not surface.
///
/// # Errors
///
/// Returns error if the value is malformed.
pub fn skip_annotation(lexer: &mut JsonReader<'_>, annotation: &str) -> Result<(), Error> {
    trace!(annotation, "annotation skipped");
    lexer.skip_value().map(|_| ())
}

/// Kind of the operation advertised by a metadata reference. Operations
/// unknown to the model are treated as actions.
#[must_use]
pub fn operation_kind(model: &EdmModel, metadata: &str) -> OperationKind {
    let name = metadata.rsplit_once('#').map_or(metadata, |(_, n)| n);
    // Strip overload parameters, e.g. `NS.Func(p1,p2)`.
    let name = name.split_once('(').map_or(name, |(n, _)| n);
    name.parse::<QualifiedName>()
        .ok()
        .and_then(|n| model.find_operation(&n))
        .map_or(OperationKind::Action, |op| op.kind)
}

/// Read the value of a metadata reference property: an object for one
/// binding, an array of objects with `target` for several.
///
/// # Errors
///
/// Returns error if the value is not an object or an array of objects,
/// `title` or `target` is repeated or `target` is missing in an array.
pub fn read_operations(
    lexer: &mut JsonReader<'_>,
    metadata: &str,
) -> Result<Vec<OperationLink>, Error> {
    match lexer.node() {
        JsonNode::StartObject => Ok(vec![read_operation(lexer, metadata, false)?]),
        JsonNode::StartArray => {
            lexer.read()?;
            let mut result = Vec::new();
            while !matches!(lexer.node(), JsonNode::EndArray) {
                if !matches!(lexer.node(), JsonNode::StartObject) {
                    return Err(Error::InvalidOperationValue(metadata.into()));
                }
                result.push(read_operation(lexer, metadata, true)?);
            }
            lexer.read()?;
            Ok(result)
        }
        _ => Err(Error::InvalidOperationValue(metadata.into())),
    }
}

fn read_operation(
    lexer: &mut JsonReader<'_>,
    metadata: &str,
    target_required: bool,
) -> Result<OperationLink, Error> {
    let mut link = OperationLink::new(metadata);
    let mut seen = HashSet::new();
    lexer.read()?;
    while let JsonNode::Property(_) = lexer.node() {
        let name = lexer.take_property_name()?;
        let known = matches!(name.as_ref(), "title" | "target");
        if known && !seen.insert(name.to_string()) {
            return Err(Error::DuplicateOperationProperty {
                operation: metadata.into(),
                property: name.into_owned(),
            });
        }
        match name.as_ref() {
            "title" => link.title = Some(read_string(lexer, "title")?),
            "target" => link.target = Some(read_string(lexer, "target")?),
            other => skip_annotation(lexer, other)?,
        }
    }
    lexer.expect(NodeKind::EndObject)?;
    lexer.read()?;
    if target_required && link.target.is_none() {
        return Err(Error::OperationMissingTarget(metadata.into()));
    }
    Ok(link)
}

fn invalid_value(annotation: &str, expected: &'static str) -> Error {
    Error::InvalidAnnotationValue {
        annotation: annotation.into(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_names() {
        assert_eq!(MemberName::classify("@odata.id"), MemberName::Scope("odata.id"));
        assert_eq!(
            MemberName::classify("#NS.Action"),
            MemberName::MetadataReference("#NS.Action")
        );
        assert_eq!(
            MemberName::classify("http://host/$metadata#NS.Action"),
            MemberName::MetadataReference("http://host/$metadata#NS.Action")
        );
        assert_eq!(
            MemberName::classify("Name@custom.note"),
            MemberName::PropertyAnnotation("Name", "custom.note")
        );
        assert_eq!(MemberName::classify("Name"), MemberName::Property("Name"));
    }

    #[test]
    fn annotation_names() {
        assert_eq!(
            AnnotationName::parse("odata.type", ODataVersion::V4).unwrap(),
            AnnotationName::Control(ControlAnnotation::Type)
        );
        assert_eq!(
            AnnotationName::parse("type", ODataVersion::V401).unwrap(),
            AnnotationName::Control(ControlAnnotation::Type)
        );
        assert!(matches!(
            AnnotationName::parse("type", ODataVersion::V4),
            Err(Error::InvalidAnnotationName(_))
        ));
        assert_eq!(
            AnnotationName::parse("odata.unknown", ODataVersion::V4).unwrap(),
            AnnotationName::OtherOData("odata.unknown")
        );
        assert_eq!(
            AnnotationName::parse("custom.note#q1", ODataVersion::V4).unwrap(),
            AnnotationName::Custom("custom.note#q1")
        );
    }

    fn at_value(input: &str) -> JsonReader<'_> {
        let mut lexer = JsonReader::new(input);
        lexer.read().unwrap();
        lexer
    }

    #[test]
    fn operations() {
        let mut lexer = at_value(r#"{"title":"Do","target":"http://t"}"#);
        let ops = read_operations(&mut lexer, "#NS.Do").unwrap();
        assert_eq!(ops, vec![OperationLink::new("#NS.Do").with_title("Do").with_target("http://t")]);

        let mut lexer = at_value(r#"[{"title":"Do"}]"#);
        assert!(matches!(
            read_operations(&mut lexer, "#NS.Do"),
            Err(Error::OperationMissingTarget(_))
        ));

        let mut lexer = at_value(r#"{"title":"a","title":"b"}"#);
        assert!(matches!(
            read_operations(&mut lexer, "#NS.Do"),
            Err(Error::DuplicateOperationProperty { .. })
        ));

        let mut lexer = at_value(r#""x""#);
        assert!(matches!(
            read_operations(&mut lexer, "#NS.Do"),
            Err(Error::InvalidOperationValue(_))
        ));
    }

    #[test]
    fn counts_and_strings() {
        assert_eq!(read_count(&mut at_value("12"), "odata.count").unwrap(), 12);
        assert_eq!(read_count(&mut at_value("\"12\""), "odata.count").unwrap(), 12);
        assert!(read_count(&mut at_value("1.5"), "odata.count").is_err());
        assert_eq!(
            read_strings(&mut at_value(r#"["a","b"]"#), "odata.bind").unwrap(),
            vec!["a", "b"]
        );
        assert!(read_string(&mut at_value("1"), "odata.id").is_err());
    }
}
