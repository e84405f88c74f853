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

//! `TestModel` schema.

use odata_json_core::edm::builder::EnumTypeDecl;
use odata_json_core::edm::builder::NavigationSourceDecl;
use odata_json_core::edm::builder::OperationDecl;
use odata_json_core::edm::builder::StructuredTypeDecl;
use odata_json_core::EdmModel;

/// Namespace of the model.
pub const NAMESPACE: &str = "TestModel";

/// Model with addresses, customers and orders, a closed `Person` type,
/// an open `Bag` type and a few actions.
///
/// # Panics
///
/// Panics if the model is invalid.
#[must_use]
pub fn test_model() -> EdmModel {
    EdmModel::builder()
        .enum_type(EnumTypeDecl::new("TestModel.Color").member("Red", 0).member("Green", 1))
        .structured(StructuredTypeDecl::complex("TestModel.Address").property("StreetName", "Edm.String", true))
        .structured(
            StructuredTypeDecl::complex("TestModel.derivedAddress")
                .base_type("TestModel.Address")
                .property("StreetNumber", "Edm.Int32", true),
        )
        .structured(
            StructuredTypeDecl::entity("TestModel.Customer")
                .key("Id")
                .property("Id", "Edm.Int32", false)
                .property("Name", "Edm.String", true)
                .property("Address", "TestModel.Address", true)
                .property("Tags", "Collection(Edm.String)", false)
                .property("Color", "TestModel.Color", true)
                .property("Extra", "Edm.Untyped", true)
                .navigation("Orders", "Collection(TestModel.Order)", false),
        )
        .structured(
            StructuredTypeDecl::entity("TestModel.Order")
                .key("Id")
                .property("Id", "Edm.Int32", false)
                .property("Amount", "Edm.Decimal", true),
        )
        .structured(
            StructuredTypeDecl::entity("TestModel.Person")
                .key("Id")
                .property("Id", "Edm.Int32", false),
        )
        .structured(StructuredTypeDecl::complex("TestModel.Bag").open())
        .operation(
            OperationDecl::action("TestModel.TransferProduct")
                .parameter("productId", "Edm.Int32", false)
                .parameter("categoryId", "Edm.Int32", false),
        )
        .operation(OperationDecl::action("TestModel.Extend").parameter("days", "Edm.Int32", false))
        .operation(
            OperationDecl::action("TestModel.Relocate")
                .parameter("addresses", "Collection(TestModel.Address)", false)
                .optional_parameter("address", "TestModel.Address"),
        )
        .operation(
            OperationDecl::action("TestModel.Tag")
                .bound("customer", "TestModel.Customer")
                .parameter("tags", "Collection(Edm.String)", false)
                .optional_parameter("color", "TestModel.Color")
                .optional_parameter("payload", "Edm.Untyped"),
        )
        .operation(OperationDecl::action("TestModel.Upload").parameter("data", "Edm.Stream", false))
        .navigation_source(
            NavigationSourceDecl::entity_set("Customers", "TestModel.Customer").binding("Orders", "Orders"),
        )
        .navigation_source(NavigationSourceDecl::entity_set("Orders", "TestModel.Order"))
        .navigation_source(NavigationSourceDecl::entity_set("People", "TestModel.Person"))
        .build()
        .expect("invalid test model")
}
