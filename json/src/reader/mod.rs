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

//! Payload readers.
//!
//! [`MessageReader`] wraps a decoded payload and creates the reader for the
//! expected payload kind:
//!
//! ```rust
//! use odata_json::reader::Expected;
//! use odata_json::reader::MessageReader;
//! use odata_json::reader::ReaderEvent;
//! use odata_json_core::EdmModel;
//! use odata_json_core::ReaderSettings;
//!
//! let model = EdmModel::builder().build().unwrap();
//! let settings = ReaderSettings::default();
//! let message = MessageReader::new(r#"{"value":[{"Name":"a"}]}"#, &model, &settings);
//! let events = message
//!     .create_resource_set_reader(Expected::none())
//!     .unwrap()
//!     .collect::<Result<Vec<_>, _>>()
//!     .unwrap();
//! assert!(matches!(events[0], ReaderEvent::ResourceSetStart(_)));
//! assert_eq!(events.len(), 4);
//! ```

pub mod event;
pub mod resource;
pub mod values;

use crate::collection::CollectionReader;
use crate::io::decode_payload;
use crate::parameter::ParameterReader;
use crate::resolver::ResourceType;
use crate::Error;
use odata_json_core::edm::NavigationSource;
use odata_json_core::edm::SchemaType;
use odata_json_core::edm::TypeName;
use odata_json_core::item::Property;
use odata_json_core::EdmModel;
use odata_json_core::ReaderSettings;

#[doc(inline)]
pub use event::ReaderEvent;
#[doc(inline)]
pub use event::StreamData;
#[doc(inline)]
pub use event::StreamedProperty;
#[doc(inline)]
pub use resource::ResourceReader;

/// What the caller expects the payload to contain.
#[derive(Debug, Clone, Copy, Default)]
pub struct Expected<'e> {
    /// Entity set or singleton the payload belongs to.
    pub navigation_source: Option<&'e str>,
    /// Structured type of the resources. Defaults to the entity type of
    /// the navigation source.
    pub type_name: Option<&'e str>,
}

impl<'e> Expected<'e> {
    /// Nothing is known: types come from the payload.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            navigation_source: None,
            type_name: None,
        }
    }

    #[must_use]
    pub const fn navigation_source(name: &'e str) -> Self {
        Self {
            navigation_source: Some(name),
            type_name: None,
        }
    }

    #[must_use]
    pub const fn type_name(name: &'e str) -> Self {
        Self {
            navigation_source: None,
            type_name: Some(name),
        }
    }

    #[must_use]
    pub const fn with_type_name(mut self, name: &'e str) -> Self {
        self.type_name = Some(name);
        self
    }

    pub(crate) fn resolve<'m>(
        &self,
        model: &'m EdmModel,
    ) -> Result<(ResourceType<'m>, Option<&'m NavigationSource>), Error> {
        let source = self
            .navigation_source
            .map(|name| {
                model
                    .find_navigation_source(name)
                    .ok_or_else(|| Error::UnknownNavigationSource(name.into()))
            })
            .transpose()?;
        let ty = match self.type_name {
            Some(name) => {
                let type_name = TypeName::from_payload(name)?;
                match model.find_type(type_name.element()) {
                    Some(SchemaType::Structured(t)) => ResourceType::model(t),
                    Some(_) => return Err(Error::NotAStructuredType(name.into())),
                    None => return Err(Error::UnknownTypeName(name.into())),
                }
            }
            None => source
                .and_then(|s| model.navigation_source_type(s))
                .map(ResourceType::model)
                .unwrap_or_default(),
        };
        Ok((ty, source))
    }
}

/// Decoded payload of a message, with the model and settings to read it.
#[derive(Debug, Clone, Copy)]
pub struct MessageReader<'a> {
    input: &'a str,
    model: &'a EdmModel,
    settings: &'a ReaderSettings,
}

impl<'a> MessageReader<'a> {
    #[must_use]
    pub const fn new(input: &'a str, model: &'a EdmModel, settings: &'a ReaderSettings) -> Self {
        Self {
            input,
            model,
            settings,
        }
    }

    /// Message from raw bytes and the content type of the message. Media
    /// type parameters other than the charset are applied to the settings
    /// by the caller, see [`ReaderSettings::apply_media_type`].
    ///
    /// # Errors
    ///
    /// Returns error if the content type names a charset other than UTF-8
    /// or the bytes are not valid UTF-8.
    pub fn from_bytes(
        bytes: &'a [u8],
        content_type: Option<&str>,
        model: &'a EdmModel,
        settings: &'a ReaderSettings,
    ) -> Result<Self, Error> {
        Ok(Self::new(decode_payload(bytes, content_type)?, model, settings))
    }

    /// # Errors
    ///
    /// Returns error if the expected navigation source or type is not in
    /// the model.
    pub fn create_resource_reader(&self, expected: Expected<'_>) -> Result<ResourceReader<'a>, Error> {
        ResourceReader::resource(self.input, self.model, self.settings, expected)
    }

    /// # Errors
    ///
    /// Returns error if the expected navigation source or type is not in
    /// the model.
    pub fn create_resource_set_reader(&self, expected: Expected<'_>) -> Result<ResourceReader<'a>, Error> {
        ResourceReader::resource_set(self.input, self.model, self.settings, expected)
    }

    /// # Errors
    ///
    /// Returns error if the expected navigation source or type is not in
    /// the model.
    pub fn create_delta_resource_set_reader(
        &self,
        expected: Expected<'_>,
    ) -> Result<ResourceReader<'a>, Error> {
        ResourceReader::delta_resource_set(self.input, self.model, self.settings, expected)
    }

    /// # Errors
    ///
    /// Returns error if the item type is not a primitive, enum or type
    /// definition of the model.
    pub fn create_collection_reader(&self, item_type: Option<&str>) -> Result<CollectionReader<'a>, Error> {
        CollectionReader::new(self.input, self.model, self.settings, item_type)
    }

    /// Reader of the parameters of the operation with qualified name
    /// `operation`.
    ///
    /// # Errors
    ///
    /// Returns error if the operation is not in the model.
    pub fn create_parameter_reader(&self, operation: &str) -> Result<ParameterReader<'a>, Error> {
        ParameterReader::new(self.input, self.model, self.settings, operation)
    }

    /// Read a single property payload (`{"value": ...}`).
    ///
    /// # Errors
    ///
    /// Returns error if the payload is malformed or its value does not
    /// match the expected type.
    pub fn read_property(&self, expected_type: Option<&str>) -> Result<Property, Error> {
        crate::property::read_property(self.input, self.model, self.settings, expected_type)
    }
}
