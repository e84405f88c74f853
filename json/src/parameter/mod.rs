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

//! Operation parameter payloads.
//!
//! A parameter payload is a JSON object whose members are the parameters
//! of an action or function:
//!
//! ```rust
//! use odata_json::parameter::ParameterReader;
//! use odata_json::parameter::ParameterValue;
//! use odata_json_core::edm::builder::OperationDecl;
//! use odata_json_core::EdmModel;
//! use odata_json_core::ODataValue;
//! use odata_json_core::PrimitiveValue;
//! use odata_json_core::ReaderSettings;
//!
//! let model = EdmModel::builder()
//!     .operation(OperationDecl::action("NS.Extend").parameter("days", "Edm.Int32", false))
//!     .build()
//!     .unwrap();
//! let settings = ReaderSettings::default();
//! let mut reader = ParameterReader::new(r#"{"days":4}"#, &model, &settings, "NS.Extend").unwrap();
//! let parameter = reader.next().unwrap().unwrap();
//! assert_eq!(parameter.name, "days");
//! assert!(matches!(
//!     parameter.value,
//!     ParameterValue::Value(ODataValue::Primitive(PrimitiveValue::Int32(4)))
//! ));
//! assert!(reader.next().is_none());
//! ```

pub mod reader;
pub mod writer;

use crate::Error;
use odata_json_core::edm::Operation;
use odata_json_core::edm::QualifiedName;
use odata_json_core::EdmModel;

#[doc(inline)]
pub use reader::Parameter;
#[doc(inline)]
pub use reader::ParameterReader;
#[doc(inline)]
pub use reader::ParameterReaderState;
#[doc(inline)]
pub use reader::ParameterValue;
#[doc(inline)]
pub use writer::ParameterWriter;

/// Find an operation by qualified name.
fn find_operation<'m>(model: &'m EdmModel, operation: &str) -> Result<&'m Operation, Error> {
    operation
        .parse::<QualifiedName>()
        .ok()
        .and_then(|name| model.find_operation(&name))
        .ok_or_else(|| Error::UnknownOperation(operation.into()))
}

/// Operation name used in errors.
fn operation_name(operation: &Operation) -> String {
    operation.name.name.to_string()
}
