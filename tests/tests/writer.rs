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

use odata_json::parameter::ParameterValue;
use odata_json::reader::Expected;
use odata_json::reader::MessageReader;
use odata_json::Error as ODataError;
use odata_json::ParameterReader;
use odata_json::ParameterWriter;
use odata_json::ReaderEvent;
use odata_json::ResourceWriter;
use odata_json_core::item::DeletedResource;
use odata_json_core::item::DeltaDeletedEntryReason;
use odata_json_core::item::DeltaLink;
use odata_json_core::item::NestedResourceInfo;
use odata_json_core::item::Property;
use odata_json_core::item::Resource;
use odata_json_core::item::ResourceSet;
use odata_json_core::media_type::MetadataLevel;
use odata_json_core::settings::PayloadMode;
use odata_json_core::settings::Validations;
use odata_json_core::value::CollectionValue;
use odata_json_core::ODataValue;
use odata_json_core::ReaderSettings;
use odata_json_core::WriterSettings;
use odata_json_tests::events::names;
use odata_json_tests::events::read_resource;
use odata_json_tests::events::resources;
use odata_json_tests::events::top_resource;
use odata_json_tests::test_model;
use odata_json_tests::Error;
use rust_decimal::Decimal;
use tokio::test;

fn write_one(settings: &WriterSettings, source: &str, resource: &Resource) -> Result<String, Error> {
    let model = test_model();
    let mut writer = ResourceWriter::new(&model, settings).with_navigation_source(source)?;
    writer.write_start_resource(Some(resource))?;
    writer.write_end()?;
    Ok(writer.finish()?)
}

#[test]
async fn undeclared_null_round_trip() -> Result<(), Error> {
    let model = test_model();
    let input = r#"{"Id":61880128,"UndeclaredAddress1":null}"#;
    let reader_settings = ReaderSettings::default().validations(Validations::none());
    let events = read_resource(input, &model, &reader_settings, "People")?;
    let person = top_resource(&events)?;

    let settings = WriterSettings::default()
        .payload_mode(PayloadMode::Request)
        .validations(Validations::none());
    assert_eq!(write_one(&settings, "People", person)?, input);
    Ok(())
}

#[test]
async fn undeclared_property_is_rejected() -> Result<(), Error> {
    let resource = Resource::new()
        .with_property(Property::new("Id", 1))
        .with_property(Property::new("Weight", 2));
    let result = write_one(&WriterSettings::default(), "People", &resource);
    assert!(matches!(
        result,
        Err(Error::OData(ODataError::UndeclaredProperty { property, .. })) if property == "Weight"
    ));
    Ok(())
}

#[test]
async fn metadata_levels() -> Result<(), Error> {
    let resource = Resource::new()
        .with_type_name("TestModel.Customer")
        .with_property(Property::new("Id", 1));

    let full = WriterSettings::default().metadata_level(MetadataLevel::Full);
    assert_eq!(
        write_one(&full, "Customers", &resource)?,
        r##"{"@odata.context":"#Customers/$entity","@odata.type":"#TestModel.Customer","Id":1}"##
    );

    let minimal = WriterSettings::default();
    assert_eq!(
        write_one(&minimal, "Customers", &resource)?,
        r##"{"@odata.context":"#Customers/$entity","Id":1}"##
    );

    let none = WriterSettings::default().metadata_level(MetadataLevel::None);
    assert_eq!(write_one(&none, "Customers", &resource)?, r#"{"Id":1}"#);
    Ok(())
}

#[test]
async fn ieee754_compatible_decimals() -> Result<(), Error> {
    let order = Resource::new()
        .with_property(Property::new("Id", 1))
        .with_property(Property::new("Amount", Decimal::new(1230, 2)));

    let settings = WriterSettings::default().ieee754_compatible(true);
    assert_eq!(
        write_one(&settings, "Orders", &order)?,
        r##"{"@odata.context":"#Orders/$entity","Id":1,"Amount":"12.30"}"##
    );

    let settings = WriterSettings::default();
    assert_eq!(
        write_one(&settings, "Orders", &order)?,
        r##"{"@odata.context":"#Orders/$entity","Id":1,"Amount":12.30}"##
    );
    Ok(())
}

#[test]
async fn text_stream_property() -> Result<(), Error> {
    let model = test_model();
    let settings = WriterSettings::default();
    let mut writer = ResourceWriter::new(&model, &settings);
    writer.write_start_resource(Some(&Resource::new().with_property(Property::new("Id", 1))))?;
    writer.start_text_stream("Name")?;
    writer.write_stream_text("Bo")?;
    assert!(matches!(writer.write_end(), Err(ODataError::StreamNotClosed)));
    writer.write_stream_text("b \"x\"")?;
    writer.end_stream()?;
    writer.write_end()?;
    assert_eq!(writer.finish()?, r#"{"Id":1,"Name":"Bob \"x\""}"#);
    Ok(())
}

#[test]
async fn delta_round_trip() -> Result<(), Error> {
    let model = test_model();
    let settings = WriterSettings::default();
    let mut writer = ResourceWriter::new(&model, &settings).with_navigation_source("Customers")?;
    writer.write_start_delta_resource_set(&ResourceSet::new())?;
    writer.write_start_resource(Some(&Resource::new().with_property(Property::new("Id", 1))))?;
    writer.write_end()?;
    writer.write_start_deleted_resource(&DeletedResource::new("Customers(2)", DeltaDeletedEntryReason::Changed))?;
    writer.write_end()?;
    writer.write_delta_link(&DeltaLink::new("Customers(1)", "Orders", "Orders(3)"))?;
    writer.write_end()?;
    let text = writer.finish()?;

    let reader_settings = ReaderSettings::default();
    let events = MessageReader::new(&text, &model, &reader_settings)
        .create_delta_resource_set_reader(Expected::navigation_source("Customers"))?
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(
        names(&events),
        vec![
            "DeltaResourceSetStart",
            "ResourceStart",
            "ResourceEnd",
            "DeletedResourceStart",
            "DeletedResourceEnd",
            "DeltaLink",
            "DeltaResourceSetEnd"
        ]
    );
    Ok(())
}

#[test]
async fn nested_null_and_expanded_resources() -> Result<(), Error> {
    let model = test_model();
    let settings = WriterSettings::default();
    let mut writer = ResourceWriter::new(&model, &settings).with_navigation_source("Customers")?;
    writer.write_start_resource(Some(&Resource::new().with_property(Property::new("Id", 1))))?;
    writer.write_start_nested_resource_info(&NestedResourceInfo::new("Address"))?;
    writer.write_start_resource(None)?;
    writer.write_end()?;
    writer.write_start_nested_resource_info(&NestedResourceInfo::new("Orders"))?;
    writer.write_start_resource_set(&ResourceSet::new())?;
    writer.write_start_resource(Some(&Resource::new().with_property(Property::new("Id", 7))))?;
    writer.write_end()?;
    writer.write_end()?;
    writer.write_end()?;
    writer.write_end()?;
    let text = writer.finish()?;
    assert_eq!(
        text,
        r##"{"@odata.context":"#Customers/$entity","Id":1,"Address":null,"Orders":[{"Id":7}]}"##
    );

    let events = read_resource(&text, &model, &ReaderSettings::default(), "Customers")?;
    assert!(names(&events).contains(&"NullResource"));
    assert_eq!(resources(&events)[0].type_name.as_deref(), Some("TestModel.Order"));
    Ok(())
}

#[test]
async fn nested_annotations_survive_round_trip() -> Result<(), Error> {
    let model = test_model();
    let input = r#"{"Id":1,"Address@custom.note":"x","Address":{"StreetName":"a"}}"#;
    let events = read_resource(input, &model, &ReaderSettings::default(), "Customers")?;
    let info = events
        .iter()
        .find_map(|e| match e {
            ReaderEvent::NestedResourceInfoStart(info) => Some(info),
            _ => None,
        })
        .ok_or(Error::ExpectedEvent("NestedResourceInfoStart"))?;
    let items = resources(&events);

    let settings = WriterSettings::default();
    let mut writer = ResourceWriter::new(&model, &settings).with_navigation_source("Customers")?;
    writer.write_start_resource(Some(items[1]))?;
    writer.write_start_nested_resource_info(info)?;
    writer.write_start_resource(Some(items[0]))?;
    writer.write_end()?;
    writer.write_end()?;
    writer.write_end()?;
    assert_eq!(
        writer.finish()?,
        r##"{"@odata.context":"#Customers/$entity","Id":1,"Address@custom.note":"x","Address":{"StreetName":"a"}}"##
    );
    Ok(())
}

#[test]
async fn writer_rejects_incomplete_payloads() -> Result<(), Error> {
    let model = test_model();
    let settings = WriterSettings::default();
    let mut writer = ResourceWriter::new(&model, &settings);
    writer.write_start_resource_set(&ResourceSet::new())?;
    assert!(matches!(writer.finish(), Err(ODataError::WriterNotCompleted)));

    let mut writer = ResourceWriter::new(&model, &settings);
    writer.write_start_resource_set(&ResourceSet::new())?;
    writer.write_end()?;
    assert!(matches!(
        writer.write_end(),
        Err(ODataError::InvalidWriterTransition {
            scope: "completed payload",
            ..
        })
    ));
    Ok(())
}

#[test]
async fn parameter_payload_round_trip() -> Result<(), Error> {
    let model = test_model();
    let settings = WriterSettings::default();
    let mut writer = ParameterWriter::new(&model, &settings, "TestModel.Relocate")?;
    writer.write_resource_set("addresses", |w| {
        w.write_start_resource_set(&ResourceSet::new())?;
        w.write_start_resource(Some(
            &Resource::new()
                .with_type_name("TestModel.derivedAddress")
                .with_property(Property::new("StreetName", "Bla"))
                .with_property(Property::new("StreetNumber", 61)),
        ))?;
        w.write_end()?;
        w.write_end()
    })?;
    let text = writer.finish()?;
    assert_eq!(
        text,
        r##"{"addresses":[{"@odata.type":"#TestModel.derivedAddress","StreetName":"Bla","StreetNumber":61}]}"##
    );

    let reader_settings = ReaderSettings::default();
    let mut reader = ParameterReader::new(&text, &model, &reader_settings, "TestModel.Relocate")?;
    let Some(ParameterValue::ResourceSet(set)) = reader.next().transpose()?.map(|p| p.value) else {
        return Err(Error::ExpectedEvent("ResourceSet"));
    };
    let events = set.collect::<Result<Vec<_>, _>>()?;
    assert_eq!(
        resources(&events)[0].type_name.as_deref(),
        Some("TestModel.derivedAddress")
    );
    Ok(())
}

#[test]
async fn parameter_values() -> Result<(), Error> {
    let model = test_model();
    let settings = WriterSettings::default();
    let mut writer = ParameterWriter::new(&model, &settings, "TestModel.Tag")?;
    let tags = CollectionValue {
        type_name: None,
        items: vec![ODataValue::from("a"), ODataValue::from("b")],
    };
    writer.write_value("tags", &ODataValue::Collection(tags))?;
    writer.write_value("color", &ODataValue::Null)?;
    assert_eq!(writer.finish()?, r#"{"tags":["a","b"],"color":null}"#);
    Ok(())
}

#[test]
async fn invalid_parameter_writes() -> Result<(), Error> {
    let model = test_model();
    let settings = WriterSettings::default();

    let writer = ParameterWriter::new(&model, &settings, "TestModel.TransferProduct")?;
    assert!(matches!(
        writer.finish(),
        Err(ODataError::MissingParameter { parameter, .. }) if parameter == "productId"
    ));

    let mut writer = ParameterWriter::new(&model, &settings, "TestModel.Extend")?;
    assert!(matches!(
        writer.write_value("days", &ODataValue::Null),
        Err(ODataError::NullValueForNonNullable(_))
    ));

    let mut writer = ParameterWriter::new(&model, &settings, "TestModel.Extend")?;
    writer.write_value("days", &ODataValue::from(1))?;
    assert!(matches!(
        writer.write_value("days", &ODataValue::from(2)),
        Err(ODataError::DuplicateParameter { .. })
    ));

    let mut writer = ParameterWriter::new(&model, &settings, "TestModel.Relocate")?;
    assert!(matches!(
        writer.write_value("address", &ODataValue::Null),
        Err(ODataError::UnsupportedParameterType { .. })
    ));

    let mut writer = ParameterWriter::new(&model, &settings, "TestModel.Upload")?;
    assert!(matches!(
        writer.write_value("data", &ODataValue::from("AAA=")),
        Err(ODataError::UnsupportedParameterType { .. })
    ));
    Ok(())
}

#[test]
async fn delta_items_copied_between_payloads() -> Result<(), Error> {
    let model = test_model();
    let input = r##"{"@odata.context":"#Customers/$delta","value":[{"Id":1},{"@odata.context":"#Customers/$deletedEntity","id":"Customers(2)","reason":"deleted"},{"@odata.context":"#Customers/$deletedLink","source":"Customers(1)","relationship":"Orders","target":"Orders(3)"}]}"##;
    let reader_settings = ReaderSettings::default();
    let items = MessageReader::new(input, &model, &reader_settings)
        .create_delta_resource_set_reader(Expected::navigation_source("Customers"))?
        .filter_map(|e| e.map(ReaderEvent::into_item).transpose())
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(items.len(), 3);

    let settings = WriterSettings::default();
    let mut writer = ResourceWriter::new(&model, &settings).with_navigation_source("Customers")?;
    writer.write_start_delta_resource_set(&ResourceSet::new())?;
    for item in &items {
        writer.write_delta_item(item)?;
    }
    writer.write_end()?;
    assert_eq!(writer.finish()?, input);
    Ok(())
}
