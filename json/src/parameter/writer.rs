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

//! Writer of operation parameter payloads.

use super::find_operation;
use super::operation_name;
use crate::json_writer::JsonWriter;
use crate::lexer::validate;
use crate::primitive::write_primitive;
use crate::writer::ResourceWriter;
use crate::Error;
use odata_json_core::edm::Operation;
use odata_json_core::edm::Parameter;
use odata_json_core::edm::PrimitiveKind;
use odata_json_core::edm::TypeKind;
use odata_json_core::EdmModel;
use odata_json_core::ODataValue;
use odata_json_core::WriterSettings;
use std::collections::HashSet;
use tracing::debug;

/// Writer of the parameters of one operation.
///
/// ```rust
/// use odata_json::parameter::ParameterWriter;
/// use odata_json_core::edm::builder::OperationDecl;
/// use odata_json_core::EdmModel;
/// use odata_json_core::ODataValue;
/// use odata_json_core::WriterSettings;
///
/// let model = EdmModel::builder()
///     .operation(OperationDecl::action("NS.Extend").parameter("days", "Edm.Int32", false))
///     .build()
///     .unwrap();
/// let settings = WriterSettings::default();
/// let mut writer = ParameterWriter::new(&model, &settings, "NS.Extend").unwrap();
/// writer.write_value("days", &ODataValue::from(4)).unwrap();
/// assert_eq!(writer.finish().unwrap(), r#"{"days":4}"#);
/// ```
pub struct ParameterWriter<'a> {
    model: &'a EdmModel,
    settings: &'a WriterSettings,
    operation: &'a Operation,
    json: JsonWriter,
    written: HashSet<String>,
}

impl<'a> ParameterWriter<'a> {
    /// # Errors
    ///
    /// Returns [`Error::UnknownOperation`] if the model has no such
    /// operation.
    pub fn new(model: &'a EdmModel, settings: &'a WriterSettings, operation: &str) -> Result<Self, Error> {
        let operation = find_operation(model, operation)?;
        let mut json = JsonWriter::new();
        json.start_object();
        Ok(Self {
            model,
            settings,
            operation,
            json,
            written: HashSet::new(),
        })
    }

    /// Write a primitive, enum, untyped or collection parameter.
    ///
    /// # Errors
    ///
    /// Returns error if the parameter is unknown, already written, of a
    /// structured or stream type, or `null` for a non-nullable parameter.
    pub fn write_value(&mut self, name: &str, value: &ODataValue) -> Result<(), Error> {
        let parameter = self.begin(name)?;
        match &parameter.type_ref.element {
            TypeKind::Structured(_) | TypeKind::Primitive(PrimitiveKind::Stream) => {
                return Err(Error::UnsupportedParameterType {
                    operation: operation_name(self.operation),
                    parameter: name.into(),
                    type_name: parameter.type_ref.type_name().to_string(),
                });
            }
            _ => {}
        }
        if value.is_null() && !parameter.type_ref.nullable {
            return Err(Error::NullValueForNonNullable(name.into()));
        }
        self.json.name(name)?;
        self.write_json(value)?;
        debug!(parameter = name, "parameter written");
        Ok(())
    }

    /// Write a structured parameter; `write` produces the resource with
    /// the given resource writer.
    ///
    /// # Errors
    ///
    /// Returns error if the parameter is unknown, already written, not of
    /// a single structured type, or `write` fails or leaves the resource
    /// incomplete.
    pub fn write_resource<F>(&mut self, name: &str, write: F) -> Result<(), Error>
    where
        F: FnOnce(&mut ResourceWriter<'a>) -> Result<(), Error>,
    {
        self.write_structured(name, false, write)
    }

    /// Write a collection of structured values.
    ///
    /// # Errors
    ///
    /// Returns error if the parameter is unknown, already written, not a
    /// collection of a structured type, or `write` fails or leaves the
    /// resource set incomplete.
    pub fn write_resource_set<F>(&mut self, name: &str, write: F) -> Result<(), Error>
    where
        F: FnOnce(&mut ResourceWriter<'a>) -> Result<(), Error>,
    {
        self.write_structured(name, true, write)
    }

    fn write_structured<F>(&mut self, name: &str, collection: bool, write: F) -> Result<(), Error>
    where
        F: FnOnce(&mut ResourceWriter<'a>) -> Result<(), Error>,
    {
        let parameter = self.begin(name)?;
        let type_ref = &parameter.type_ref;
        if !matches!(type_ref.element, TypeKind::Structured(_)) || type_ref.collection != collection {
            return Err(Error::UnsupportedParameterType {
                operation: operation_name(self.operation),
                parameter: name.into(),
                type_name: type_ref.type_name().to_string(),
            });
        }
        let mut writer = ResourceWriter::bare(self.model, self.settings);
        write(&mut writer)?;
        let text = writer.finish()?;
        self.json.name(name)?;
        self.json.raw(&text);
        debug!(parameter = name, collection, "structured parameter written");
        Ok(())
    }

    /// Close the payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParameter`] if a required parameter was not
    /// written.
    pub fn finish(mut self) -> Result<String, Error> {
        if let Some(missing) = self
            .operation
            .required_parameters()
            .find(|p| !self.written.contains(p.name.inner().as_str()))
        {
            return Err(Error::MissingParameter {
                operation: operation_name(self.operation),
                parameter: missing.name.inner().to_string(),
            });
        }
        self.json.end_object();
        Ok(self.json.into_inner())
    }

    fn begin(&mut self, name: &str) -> Result<&'a Parameter, Error> {
        let operation = self.operation;
        let parameter = operation.parameter(name).ok_or_else(|| Error::UnknownParameter {
            operation: operation_name(operation),
            parameter: name.into(),
        })?;
        if !self.written.insert(name.into()) {
            return Err(Error::DuplicateParameter {
                operation: operation_name(operation),
                parameter: name.into(),
            });
        }
        Ok(parameter)
    }

    fn write_json(&mut self, value: &ODataValue) -> Result<(), Error> {
        match value {
            ODataValue::Null | ODataValue::Stream(_) => self.json.null(),
            ODataValue::Primitive(v) => write_primitive(&mut self.json, v, self.settings.ieee754_compatible)?,
            ODataValue::Enum(v) => self.json.string(&v.value)?,
            ODataValue::Untyped(v) => {
                validate(v.raw())?;
                self.json.raw(v.raw());
            }
            ODataValue::Collection(c) => {
                self.json.start_array();
                for item in &c.items {
                    self.write_json(item)?;
                }
                self.json.end_array();
            }
        }
        Ok(())
    }
}
