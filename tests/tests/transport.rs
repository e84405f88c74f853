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

use futures_util::io::Cursor;
use odata_json::io::read_payload_async;
use odata_json::io::write_payload_async;
use odata_json::io::CancellationSignal;
use odata_json::reader::Expected;
use odata_json::reader::MessageReader;
use odata_json::Error as ODataError;
use odata_json::ResourceWriter;
use odata_json_core::item::Property;
use odata_json_core::item::Resource;
use odata_json_core::item::ResourceSet;
use odata_json_core::media_type::MediaTypeParameters;
use odata_json_core::media_type::MetadataLevel;
use odata_json_core::ODataValue;
use odata_json_core::PrimitiveValue;
use odata_json_core::ReaderSettings;
use odata_json_core::WriterSettings;
use odata_json_tests::events::top_resource;
use odata_json_tests::test_model;
use odata_json_tests::Error;
use tokio::test;

const JSON_UTF8: &str = "application/json;odata.metadata=minimal;charset=utf-8";

#[test]
async fn message_from_bytes() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let bytes = b"\xEF\xBB\xBF{\"Id\":1,\"Name\":\"Bob\"}";
    let message = MessageReader::from_bytes(bytes, Some(JSON_UTF8), &model, &settings)?;
    let events = message
        .create_resource_reader(Expected::navigation_source("Customers"))?
        .collect::<Result<Vec<_>, _>>()?;
    let customer = top_resource(&events)?;
    assert_eq!(customer.property("Name").map(|p| &p.value), Some(&ODataValue::from("Bob")));

    assert!(matches!(
        MessageReader::from_bytes(b"{}", Some("application/json;charset=utf-16"), &model, &settings),
        Err(ODataError::UnsupportedCharset(charset)) if charset == "utf-16"
    ));
    assert!(matches!(
        MessageReader::from_bytes(b"{}", Some("text/plain"), &model, &settings),
        Err(ODataError::MediaType(_))
    ));
    Ok(())
}

#[test]
async fn media_type_parameters_apply_to_settings() -> Result<(), Error> {
    let params = MediaTypeParameters::parse("application/json;metadata=full;IEEE754Compatible=true")
        .map_err(ODataError::from)?;
    assert_eq!(params.metadata, Some(MetadataLevel::Full));
    let settings = WriterSettings::default().apply_media_type(&params);
    assert_eq!(settings.metadata_level, MetadataLevel::Full);
    assert!(settings.ieee754_compatible);
    let settings = ReaderSettings::default().apply_media_type(&params);
    assert!(settings.ieee754_compatible);
    Ok(())
}

#[test]
async fn async_read_and_write() -> Result<(), Error> {
    let model = test_model();
    let signal = CancellationSignal::new();

    let mut input = Cursor::new(br#"{"value":[{"Id":1},{"Id":2}]}"#.to_vec());
    let text = read_payload_async(&mut input, Some(JSON_UTF8), &signal).await?;
    let reader_settings = ReaderSettings::default();
    let count = MessageReader::new(&text, &model, &reader_settings)
        .create_resource_set_reader(Expected::navigation_source("Orders"))?
        .filter(|e| matches!(e, Ok(odata_json::ReaderEvent::ResourceEnd(_))))
        .count();
    assert_eq!(count, 2);

    let mut out = Vec::new();
    write_payload_async(&mut out, &text, &signal).await?;
    assert_eq!(out, text.as_bytes());
    Ok(())
}

#[test]
async fn cancelled_transport() -> Result<(), Error> {
    let signal = CancellationSignal::new();
    signal.cancel();
    assert!(signal.is_cancelled());

    let mut input = Cursor::new(b"{}".to_vec());
    assert!(matches!(
        read_payload_async(&mut input, None, &signal).await,
        Err(ODataError::Cancelled)
    ));

    let mut out = Vec::new();
    assert!(matches!(
        write_payload_async(&mut out, "{}", &signal).await,
        Err(ODataError::Cancelled)
    ));
    assert!(out.is_empty());
    Ok(())
}

#[test]
async fn writer_flushes_incrementally() -> Result<(), Error> {
    let model = test_model();
    let settings = WriterSettings::default();
    let signal = CancellationSignal::new();
    let mut out = Vec::new();
    let mut writer = ResourceWriter::new(&model, &settings).with_navigation_source("Orders")?;
    writer.write_start_resource_set(&ResourceSet::new())?;
    for id in 1..=3 {
        writer.write_start_resource(Some(&Resource::new().with_property(Property::new("Id", id))))?;
        writer.write_end()?;
        writer.flush_to_async(&mut out, &signal).await?;
        assert!(writer.as_str().is_empty());
    }
    writer.write_end()?;
    writer.flush_to_async(&mut out, &signal).await?;
    assert_eq!(writer.finish()?, "");
    assert_eq!(
        String::from_utf8_lossy(&out),
        r##"{"@odata.context":"#Orders","value":[{"Id":1},{"Id":2},{"Id":3}]}"##
    );
    Ok(())
}

#[test]
async fn collection_payload() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let input = r##"{"@odata.context":"#Collection(Edm.Int32)","@odata.count":3,"value":[1,2,3]}"##;
    let collection = MessageReader::new(input, &model, &settings)
        .create_collection_reader(None)?
        .read_to_end()?;
    assert_eq!(collection.type_name.as_deref(), Some("Collection(Edm.Int32)"));
    assert_eq!(
        collection.items,
        vec![
            ODataValue::Primitive(PrimitiveValue::Int32(1)),
            ODataValue::Primitive(PrimitiveValue::Int32(2)),
            ODataValue::Primitive(PrimitiveValue::Int32(3))
        ]
    );

    let result = MessageReader::new(r#"{"value":["Red","Blue"]}"#, &model, &settings)
        .create_collection_reader(Some("Collection(TestModel.Color)"))?
        .read_to_end();
    assert!(matches!(result, Err(ODataError::InvalidEnumValue { .. })));
    Ok(())
}

#[test]
async fn property_payload() -> Result<(), Error> {
    let model = test_model();
    let settings = ReaderSettings::default();
    let input = r##"{"@odata.context":"#Customers(1)/Name","value":"Bob"}"##;
    let property = MessageReader::new(input, &model, &settings).read_property(Some("Edm.String"))?;
    assert_eq!(property.name, "Name");
    assert_eq!(property.value, ODataValue::from("Bob"));

    let property = MessageReader::new(r#"{"value":"Green"}"#, &model, &settings).read_property(Some("TestModel.Color"))?;
    let ODataValue::Enum(color) = property.value else {
        return Err(Error::ExpectedEvent("Enum"));
    };
    assert_eq!(color.value, "Green");
    Ok(())
}
