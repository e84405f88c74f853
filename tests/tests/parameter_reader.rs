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

use odata_json::parameter::ParameterReaderState;
use odata_json::parameter::ParameterValue;
use odata_json::reader::MessageReader;
use odata_json::Error as ODataError;
use odata_json::ParameterReader;
use odata_json_core::ODataValue;
use odata_json_core::PrimitiveValue;
use odata_json_core::settings::Validations;
use odata_json_core::ReaderSettings;
use odata_json_tests::events::names;
use odata_json_tests::events::resources;
use odata_json_tests::test_model;
use odata_json_tests::Error;
use tokio::test;

fn first_error(reader: ParameterReader<'_>) -> Option<ODataError> {
    reader.filter_map(Result::err).next()
}

#[test]
async fn primitive_parameter() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let mut reader = MessageReader::new(r#"{"days":4}"#, &model, &settings).create_parameter_reader("TestModel.Extend")?;
    assert_eq!(reader.state(), ParameterReaderState::Start);
    let parameter = reader.next().ok_or(Error::ExpectedEvent("parameter"))??;
    assert_eq!(parameter.name, "days");
    assert!(matches!(
        parameter.value,
        ParameterValue::Value(ODataValue::Primitive(PrimitiveValue::Int32(4)))
    ));
    assert_eq!(reader.state(), ParameterReaderState::Value);
    assert!(reader.next().is_none());
    assert_eq!(reader.state(), ParameterReaderState::Completed);
    Ok(())
}

#[test]
async fn derived_resources_in_collection_parameter() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let input = r#"{"addresses":[{"StreetName":"Bla","@odata.type":"TestModel.derivedAddress","StreetNumber":61},{"StreetName":"Bla2"}]}"#;
    let mut reader = ParameterReader::new(input, &model, &settings, "TestModel.Relocate")?;
    let parameter = reader.next().ok_or(Error::ExpectedEvent("parameter"))??;
    assert_eq!(parameter.name, "addresses");
    assert_eq!(reader.state(), ParameterReaderState::ResourceSet);
    let ParameterValue::ResourceSet(set) = parameter.value else {
        return Err(Error::ExpectedEvent("ResourceSet"));
    };
    let events = set.collect::<Result<Vec<_>, _>>()?;
    assert_eq!(
        names(&events),
        vec![
            "ResourceSetStart",
            "ResourceStart",
            "ResourceEnd",
            "ResourceStart",
            "ResourceEnd",
            "ResourceSetEnd"
        ]
    );
    let items = resources(&events);
    assert_eq!(items[0].type_name.as_deref(), Some("TestModel.derivedAddress"));
    assert_eq!(items[0].properties.len(), 2);
    assert_eq!(
        items[0].property("StreetNumber").map(|p| &p.value),
        Some(&ODataValue::from(61))
    );
    assert_eq!(items[1].type_name.as_deref(), Some("TestModel.Address"));
    assert_eq!(items[1].properties.len(), 1);
    assert!(reader.next().is_none());
    Ok(())
}

#[test]
async fn sub_readers_need_not_be_drained() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let input = r#"{"addresses":[{"StreetName":"a"}],"address":{"StreetName":"b"}}"#;
    let mut reader = ParameterReader::new(input, &model, &settings, "TestModel.Relocate")?;
    let first = reader.next().ok_or(Error::ExpectedEvent("parameter"))??;
    assert_eq!(first.name, "addresses");
    let second = reader.next().ok_or(Error::ExpectedEvent("parameter"))??;
    assert_eq!(second.name, "address");
    assert_eq!(reader.state(), ParameterReaderState::Resource);
    let ParameterValue::Resource(resource) = second.value else {
        return Err(Error::ExpectedEvent("Resource"));
    };
    let events = resource.collect::<Result<Vec<_>, _>>()?;
    assert_eq!(names(&events), vec!["ResourceStart", "ResourceEnd"]);
    assert_eq!(
        resources(&events)[0].property("StreetName").map(|p| &p.value),
        Some(&ODataValue::from("b"))
    );
    assert!(reader.next().is_none());
    Ok(())
}

#[test]
async fn collection_enum_and_untyped_parameters() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let input = r#"{"tags":["a","b"],"color":"Green","payload":{"x":[1]}}"#;
    let reader = ParameterReader::new(input, &model, &settings, "TestModel.Tag")?;
    let parameters = reader.collect::<Result<Vec<_>, _>>()?;
    assert_eq!(parameters.len(), 3);
    let mut parameters = parameters.into_iter();

    let Some(ParameterValue::Collection(tags)) = parameters.next().map(|p| p.value) else {
        return Err(Error::ExpectedEvent("Collection"));
    };
    let tags = tags.read_to_end()?;
    assert_eq!(tags.items, vec![ODataValue::from("a"), ODataValue::from("b")]);

    let Some(ParameterValue::Value(ODataValue::Enum(color))) = parameters.next().map(|p| p.value) else {
        return Err(Error::ExpectedEvent("Enum"));
    };
    assert_eq!(color.value, "Green");

    let Some(ParameterValue::Value(ODataValue::Untyped(payload))) = parameters.next().map(|p| p.value) else {
        return Err(Error::ExpectedEvent("Untyped"));
    };
    assert_eq!(payload.raw(), r#"{"x":[1]}"#);
    Ok(())
}

#[test]
async fn optional_parameters_may_be_null_or_absent() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let reader = ParameterReader::new(r#"{"tags":[],"color":null}"#, &model, &settings, "TestModel.Tag")?;
    let parameters = reader.collect::<Result<Vec<_>, _>>()?;
    assert_eq!(parameters.len(), 2);
    assert!(matches!(parameters[1].value, ParameterValue::Value(ODataValue::Null)));
    Ok(())
}

#[test]
async fn missing_parameter() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let reader = ParameterReader::new(r#"{"productId":1}"#, &model, &settings, "TestModel.TransferProduct")?;
    match first_error(reader) {
        Some(ODataError::MissingParameter { operation, parameter }) => {
            assert_eq!(operation, "TransferProduct");
            assert_eq!(parameter, "categoryId");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    Ok(())
}

#[test]
async fn empty_payload_has_no_parameters() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let reader = ParameterReader::new("", &model, &settings, "TestModel.Extend")?;
    assert!(matches!(
        first_error(reader),
        Some(ODataError::MissingParameter { parameter, .. }) if parameter == "days"
    ));
    Ok(())
}

#[test]
async fn unknown_operation() {
    let model = test_model();
    let settings = ReaderSettings::default();
    assert!(matches!(
        ParameterReader::new("{}", &model, &settings, "TestModel.Nope"),
        Err(ODataError::UnknownOperation(_))
    ));
}

#[test]
async fn orphaned_annotation_is_reported_before_missing_parameters() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let input = r#"{"productId@custom.annotation":"x","categoryId":1}"#;
    let reader = ParameterReader::new(input, &model, &settings, "TestModel.TransferProduct")?;
    assert!(matches!(
        first_error(reader),
        Some(ODataError::OrphanedPropertyAnnotation(name)) if name == "productId"
    ));
    Ok(())
}

#[test]
async fn payload_level_annotations() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();

    let reader = ParameterReader::new(r#"{"@custom.note":"x","days":1}"#, &model, &settings, "TestModel.Extend")?;
    assert_eq!(reader.collect::<Result<Vec<_>, _>>()?.len(), 1);

    let reader = ParameterReader::new(r#"{"@odata.id":"x","days":1}"#, &model, &settings, "TestModel.Extend")?;
    assert!(matches!(
        first_error(reader),
        Some(ODataError::InstanceAnnotationInParameterPayload(_))
    ));

    let reader = ParameterReader::new(r##"{"#TestModel.Extend":{},"days":1}"##, &model, &settings, "TestModel.Extend")?;
    assert!(matches!(
        first_error(reader),
        Some(ODataError::MetadataReferenceInParameterPayload(_))
    ));
    Ok(())
}

#[test]
async fn parameter_type_annotation_is_accepted() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let input = r##"{"days@odata.type":"#Int32","days":2}"##;
    let reader = ParameterReader::new(input, &model, &settings, "TestModel.Extend")?;
    let parameters = reader.collect::<Result<Vec<_>, _>>()?;
    assert_eq!(parameters.len(), 1);
    Ok(())
}

#[test]
async fn parameter_type_annotation_conflict() -> Result<(), Error> {
    let model = test_model();
    let input = r##"{"days@odata.type":"#String","days":2}"##;
    let settings = ReaderSettings::default();
    let reader = ParameterReader::new(input, &model, &settings, "TestModel.Extend")?;
    assert!(matches!(
        first_error(reader),
        Some(ODataError::TypeConflict { ref property, .. }) if property == "days"
    ));

    let settings = ReaderSettings::default().validations(Validations::none());
    let reader = ParameterReader::new(input, &model, &settings, "TestModel.Extend")?;
    let parameters = reader.collect::<Result<Vec<_>, _>>()?;
    assert!(matches!(
        parameters[0].value,
        ParameterValue::Value(ODataValue::Primitive(PrimitiveValue::Int32(2)))
    ));
    Ok(())
}

#[test]
async fn invalid_parameters() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();

    let reader = ParameterReader::new(r#"{"weeks":1}"#, &model, &settings, "TestModel.Extend")?;
    assert!(matches!(
        first_error(reader),
        Some(ODataError::UnknownParameter { parameter, .. }) if parameter == "weeks"
    ));

    let reader = ParameterReader::new(r#"{"days":1,"days":2}"#, &model, &settings, "TestModel.Extend")?;
    assert!(matches!(
        first_error(reader),
        Some(ODataError::DuplicateParameter { parameter, .. }) if parameter == "days"
    ));

    let reader = ParameterReader::new(r#"{"days":null}"#, &model, &settings, "TestModel.Extend")?;
    assert!(matches!(
        first_error(reader),
        Some(ODataError::NullValueForNonNullable(name)) if name == "days"
    ));

    let reader = ParameterReader::new(r#"{"data":"AAA="}"#, &model, &settings, "TestModel.Upload")?;
    assert!(matches!(
        first_error(reader),
        Some(ODataError::UnsupportedParameterType { .. })
    ));

    let reader = ParameterReader::new(r#"{"tags":"a"}"#, &model, &settings, "TestModel.Tag")?;
    assert!(matches!(
        first_error(reader),
        Some(ODataError::CollectionTypeMismatch { .. })
    ));

    let reader = ParameterReader::new(r#"{"customer":{"Id":1},"tags":[]}"#, &model, &settings, "TestModel.Tag")?;
    assert!(matches!(
        first_error(reader),
        Some(ODataError::UnknownParameter { parameter, .. }) if parameter == "customer"
    ));
    Ok(())
}

#[test]
async fn reader_stops_after_error() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let mut reader = ParameterReader::new(r#"{"weeks":1,"days":1}"#, &model, &settings, "TestModel.Extend")?;
    assert!(matches!(reader.next(), Some(Err(_))));
    assert!(reader.next().is_none());
    Ok(())
}
