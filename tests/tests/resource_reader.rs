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

use odata_json::reader::Expected;
use odata_json::reader::MessageReader;
use odata_json::reader::StreamData;
use odata_json::Error as ODataError;
use odata_json::ReaderEvent;
use odata_json_core::settings::AnnotationFilter;
use odata_json_core::settings::Validations;
use odata_json_core::value::CollectionValue;
use odata_json_core::ODataValue;
use odata_json_core::ODataVersion;
use odata_json_core::ReaderSettings;
use odata_json_tests::events::names;
use odata_json_tests::events::read_resource;
use odata_json_tests::events::read_resource_set;
use odata_json_tests::events::resources;
use odata_json_tests::events::top_resource;
use odata_json_tests::test_model;
use odata_json_tests::Error;
use odata_json_tests::ODATA_CONTEXT;
use odata_json_tests::ODATA_TYPE;
use serde_json::json;
use tokio::test;

#[test]
async fn resource_with_control_information() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let input = json!({
        ODATA_CONTEXT: "http://host/service/$metadata#Customers/$entity",
        "@odata.id": "Customers(1)",
        "@odata.etag": "W/\"1\"",
        "Id": 1,
        "Name": "Bob",
        "Tags": ["a", "b"],
        "Color": "Red",
    })
    .to_string();
    let events = read_resource(&input, &model, &settings, "Customers")?;
    let customer = top_resource(&events)?;
    assert_eq!(customer.type_name.as_deref(), Some("TestModel.Customer"));
    assert_eq!(customer.id.as_ref().map(|v| v.as_str()), Some("Customers(1)"));
    assert_eq!(customer.etag.as_ref().map(|v| v.as_str()), Some("W/\"1\""));
    assert_eq!(customer.property("Name").map(|p| &p.value), Some(&ODataValue::from("Bob")));
    let Some(ODataValue::Collection(tags)) = customer.property("Tags").map(|p| &p.value) else {
        return Err(Error::ExpectedEvent("Tags"));
    };
    assert_eq!(tags.items.len(), 2);
    let Some(ODataValue::Enum(color)) = customer.property("Color").map(|p| &p.value) else {
        return Err(Error::ExpectedEvent("Color"));
    };
    assert_eq!(color.value, "Red");
    Ok(())
}

#[test]
async fn declared_nullable_values_set_to_null() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let input = r#"{"Id":1,"Name":null,"Color":null,"Address":{"StreetName":null}}"#;
    let events = read_resource(input, &model, &settings, "Customers")?;
    let items = resources(&events);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].property("StreetName").map(|p| &p.value), Some(&ODataValue::Null));
    assert_eq!(items[1].property("Name").map(|p| &p.value), Some(&ODataValue::Null));
    assert_eq!(items[1].property("Color").map(|p| &p.value), Some(&ODataValue::Null));

    let err = read_resource(r#"{"Id":null}"#, &model, &settings, "Customers").unwrap_err();
    assert!(
        matches!(err, Error::OData(ODataError::NullValueForNonNullable(ref name)) if name == "Id"),
        "{err}"
    );
    Ok(())
}

#[test]
async fn derived_complex_property() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let input = json!({
        "Id": 1,
        "Address": {ODATA_TYPE: "#TestModel.derivedAddress", "StreetName": "x", "StreetNumber": 3},
    })
    .to_string();
    let events = read_resource(&input, &model, &settings, "Customers")?;
    let items = resources(&events);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].type_name.as_deref(), Some("TestModel.derivedAddress"));
    assert_eq!(items[0].property("StreetNumber").map(|p| &p.value), Some(&ODataValue::from(3)));
    Ok(())
}

#[test]
async fn undeclared_values_are_raw_text() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default().validations(Validations::none());
    let input = r#"{"Id":1,"Weight":12.3,"Note":"abc","Shape":{"a":[1,2]}}"#;
    let events = read_resource(input, &model, &settings, "People")?;
    let person = top_resource(&events)?;
    let raw = |name: &str| {
        person
            .property(name)
            .and_then(|p| p.value.as_untyped())
            .map(|v| v.raw().to_string())
    };
    assert_eq!(raw("Weight").as_deref(), Some("12.3"));
    assert_eq!(raw("Note").as_deref(), Some("\"abc\""));
    assert_eq!(raw("Shape").as_deref(), Some(r#"{"a":[1,2]}"#));
    Ok(())
}

#[test]
async fn undeclared_property_of_closed_type() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let result = read_resource(r#"{"Id":1,"Weight":12.3}"#, &model, &settings, "People");
    assert!(matches!(
        result,
        Err(Error::OData(ODataError::UndeclaredProperty { property, .. })) if property == "Weight"
    ));
    Ok(())
}

#[test]
async fn undeclared_object_as_untyped_resource() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default()
        .validations(Validations::none())
        .read_untyped_as_string(false);
    let events = read_resource(r#"{"Id":1,"Blob":{"a":1}}"#, &model, &settings, "People")?;
    assert_eq!(
        names(&events),
        vec![
            "ResourceStart",
            "NestedResourceInfoStart",
            "ResourceStart",
            "ResourceEnd",
            "NestedResourceInfoEnd",
            "ResourceEnd"
        ]
    );
    let blob = resources(&events)[0];
    assert_eq!(blob.type_name, None);
    assert_eq!(blob.property("a").map(|p| &p.value), Some(&ODataValue::from(1)));
    Ok(())
}

#[test]
async fn declared_untyped_property() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let input = r#"{"Id":1,"Extra":{"Inner":{"Deep":[1,2]}}}"#;
    let events = read_resource(input, &model, &settings, "Customers")?;
    assert_eq!(
        names(&events),
        vec![
            "ResourceStart",
            "NestedResourceInfoStart",
            "ResourceStart",
            "NestedResourceInfoStart",
            "ResourceStart",
            "NestedResourceInfoStart",
            "ResourceSetStart",
            "Primitive",
            "Primitive",
            "ResourceSetEnd",
            "NestedResourceInfoEnd",
            "ResourceEnd",
            "NestedResourceInfoEnd",
            "ResourceEnd",
            "NestedResourceInfoEnd",
            "ResourceEnd"
        ]
    );
    assert_eq!(events[7], ReaderEvent::Primitive(ODataValue::from(1)));

    let settings = ReaderSettings::default().enable_untyped_collections(false);
    let events = read_resource(input, &model, &settings, "Customers")?;
    let inner = resources(&events)[0];
    let Some(ODataValue::Collection(deep)) = inner.property("Deep").map(|p| &p.value) else {
        return Err(Error::ExpectedEvent("Deep"));
    };
    assert_eq!(deep.items, vec![ODataValue::from(1), ODataValue::from(2)]);
    Ok(())
}

#[test]
async fn collection_of_unknown_type_with_scalar_items() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let input = r##"{"Items@odata.type":"#Collection(Unknown.Thing)","Items":[1,2]}"##;
    let reader =
        MessageReader::new(input, &model, &settings).create_resource_reader(Expected::type_name("TestModel.Bag"))?;
    let events = reader.collect::<Result<Vec<_>, _>>()?;
    let bag = top_resource(&events)?;
    let items = bag.property("Items").ok_or(Error::ExpectedEvent("Items"))?;
    assert_eq!(items.type_name.as_deref(), Some("Collection(Unknown.Thing)"));
    assert_eq!(
        items.value.as_collection().map(|c: &CollectionValue| c.items.len()),
        Some(2)
    );
    Ok(())
}

#[test]
async fn shape_and_type_mismatches() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();

    let result = read_resource(r#"{"Id":1,"Tags":"a"}"#, &model, &settings, "Customers");
    assert!(matches!(
        result,
        Err(Error::OData(ODataError::CollectionTypeMismatch { property, .. })) if property == "Tags"
    ));

    let result = read_resource(r#"{"Id":1,"Name":["a"]}"#, &model, &settings, "Customers");
    assert!(matches!(
        result,
        Err(Error::OData(ODataError::SingletonTypeMismatch { .. }))
    ));

    let result = read_resource(r##"{"Id":1,"Name@odata.type":"#Int32","Name":1}"##, &model, &settings, "Customers");
    assert!(matches!(result, Err(Error::OData(ODataError::TypeConflict { .. }))));

    let result = read_resource(r#"{"Id":1,"Color":"Blue"}"#, &model, &settings, "Customers");
    assert!(matches!(result, Err(Error::OData(ODataError::InvalidEnumValue { .. }))));

    let result = read_resource(r#"{"Id":null}"#, &model, &settings, "Customers");
    assert!(matches!(
        result,
        Err(Error::OData(ODataError::NullValueForNonNullable(name))) if name == "Id"
    ));
    Ok(())
}

#[test]
async fn include_annotations_filter() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default().include_annotations(AnnotationFilter::parse("Core.*"));
    let input = r#"{"@Core.Description":"d","@Display.Label":"l","Id":1,"Name@Core.Note":"n","Name":"x"}"#;
    let events = read_resource(input, &model, &settings, "Customers")?;
    let customer = top_resource(&events)?;
    let annotations = customer.annotations.iter().map(|a| a.name.as_str()).collect::<Vec<_>>();
    assert_eq!(annotations, vec!["Core.Description"]);
    let name = customer.property("Name").ok_or(Error::ExpectedEvent("Name"))?;
    assert_eq!(name.annotations.len(), 1);
    Ok(())
}

#[test]
async fn properties_read_as_streams() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default().read_as_stream(|_, _, name| name == "Name");
    let events = read_resource(r#"{"Id":1,"Name":"Bob"}"#, &model, &settings, "Customers")?;
    assert_eq!(names(&events), vec!["ResourceStart", "PropertyStream", "ResourceEnd"]);
    let ReaderEvent::PropertyStream(stream) = &events[1] else {
        return Err(Error::ExpectedEvent("PropertyStream"));
    };
    assert_eq!(stream.name, "Name");
    assert_eq!(stream.data, StreamData::Text("Bob".into()));
    assert_eq!(stream.bytes(), b"Bob");
    let customer = top_resource(&events)?;
    assert!(customer.property("Name").is_none());
    Ok(())
}

#[test]
async fn short_annotation_names_in_401() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default().version(ODataVersion::V401);
    let input = r##"{"@context":"#Customers","@count":1,"value":[{"@id":"Customers(1)","Id":1}]}"##;
    let events = read_resource_set(input, &model, &settings, "Customers")?;
    let ReaderEvent::ResourceSetEnd(set) = events.last().ok_or(Error::ExpectedEvent("ResourceSetEnd"))? else {
        return Err(Error::ExpectedEvent("ResourceSetEnd"));
    };
    assert_eq!(set.count, Some(1));
    assert_eq!(
        top_resource(&events)?.id.as_ref().map(|v| v.as_str()),
        Some("Customers(1)")
    );
    Ok(())
}

#[test]
async fn nesting_depth_is_limited() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default().max_nesting_depth(3);
    let input = r#"{"Id":1,"Extra":{"a":{"b":{"c":1}}}}"#;
    let result = read_resource(input, &model, &settings, "Customers");
    assert!(matches!(result, Err(Error::OData(ODataError::MaxDepthExceeded(3)))));
    Ok(())
}

#[test]
async fn unknown_navigation_source() {
    let model = test_model();
    let settings = ReaderSettings::default();
    let result = read_resource("{}", &model, &settings, "Nowhere");
    assert!(matches!(
        result,
        Err(Error::OData(ODataError::UnknownNavigationSource(_)))
    ));
}
