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

//! Entity Data Model
//!
//! The model is built in code with [`EdmModel::builder`] and is immutable
//! afterwards. Readers and writers only perform lookups on it.

pub mod builder;
pub mod error;
pub mod model;
pub mod names;
pub mod primitive;

#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use model::EdmModel;
#[doc(inline)]
pub use model::EnumType;
#[doc(inline)]
pub use model::NavigationSource;
#[doc(inline)]
pub use model::Operation;
#[doc(inline)]
pub use model::OperationKind;
#[doc(inline)]
pub use model::Parameter;
#[doc(inline)]
pub use model::Property;
#[doc(inline)]
pub use model::SchemaType;
#[doc(inline)]
pub use model::StructuredKind;
#[doc(inline)]
pub use model::StructuredType;
#[doc(inline)]
pub use model::TypeKind;
#[doc(inline)]
pub use model::TypeRef;
#[doc(inline)]
pub use names::NameError;
#[doc(inline)]
pub use names::QualifiedName;
#[doc(inline)]
pub use names::TypeName;
#[doc(inline)]
pub use primitive::PrimitiveKind;
