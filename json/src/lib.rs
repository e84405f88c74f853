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

//! Readers and writers of OData JSON payloads
//!
//! Reading is pull based: readers are iterators of events or values.
//! Writing is push based: writers keep a stack of open scopes and reject
//! calls that are not valid in the current one.
//!
//! - [`reader`]: resources, resource sets and delta resource sets, and
//!   [`reader::MessageReader`] to create readers for a payload;
//! - [`parameter`]: operation parameter payloads;
//! - [`collection`] and [`property`]: collection and property payloads;
//! - [`writer`]: resources, resource sets and delta resource sets;
//! - [`io`]: payload decoding and transport helpers.
//!
//! All errors are fatal for the payload. Readers return the first error
//! and stop.

/// Collection payloads and arrays of primitive values.
pub mod collection;
/// Annotations and properties seen in one scope.
pub mod collector;
/// Errors of readers and writers.
pub mod error;
/// Payload decoding and transport.
pub mod io;
/// JSON text output.
pub mod json_writer;
/// JSON tokenizer.
pub mod lexer;
pub mod parameter;
/// Reading and writing of primitive values.
pub mod primitive;
/// Top-level property payloads.
pub mod property;
pub mod reader;
/// Effective types of resources and properties.
pub mod resolver;
pub mod writer;

#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use error::ErrorCategory;
#[doc(inline)]
pub use parameter::ParameterReader;
#[doc(inline)]
pub use parameter::ParameterWriter;
#[doc(inline)]
pub use reader::MessageReader;
#[doc(inline)]
pub use reader::ReaderEvent;
#[doc(inline)]
pub use reader::ResourceReader;
#[doc(inline)]
pub use writer::ResourceWriter;
