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

//! Low level JSON text writer.

use serde_json::Value as JsonValue;

/// Appends JSON text to a buffer, inserting separators between members
/// and items. Callers are responsible for well-formed nesting.
#[derive(Debug, Default)]
pub struct JsonWriter {
    out: String,
    /// One entry per open container: container has items.
    stack: Vec<bool>,
    after_name: bool,
}

impl JsonWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_object(&mut self) {
        self.separator();
        self.out.push('{');
        self.stack.push(false);
    }

    pub fn end_object(&mut self) {
        self.stack.pop();
        self.out.push('}');
    }

    pub fn start_array(&mut self) {
        self.separator();
        self.out.push('[');
        self.stack.push(false);
    }

    pub fn end_array(&mut self) {
        self.stack.pop();
        self.out.push(']');
    }

    /// Write a member name. The next write is its value.
    ///
    /// # Errors
    ///
    /// Returns error if the name cannot be escaped.
    pub fn name(&mut self, name: &str) -> Result<(), serde_json::Error> {
        self.separator();
        self.out.push_str(&serde_json::to_string(name)?);
        self.out.push(':');
        self.after_name = true;
        Ok(())
    }

    /// Write a string value.
    ///
    /// # Errors
    ///
    /// Returns error if the string cannot be escaped.
    pub fn string(&mut self, v: &str) -> Result<(), serde_json::Error> {
        self.separator();
        self.out.push_str(&serde_json::to_string(v)?);
        Ok(())
    }

    pub fn null(&mut self) {
        self.raw("null");
    }

    pub fn boolean(&mut self, v: bool) {
        self.raw(if v { "true" } else { "false" });
    }

    /// Write a number or any other preformatted value verbatim.
    pub fn raw(&mut self, text: &str) {
        self.separator();
        self.out.push_str(text);
    }

    /// Write a `serde_json` value.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    pub fn value(&mut self, v: &JsonValue) -> Result<(), serde_json::Error> {
        self.separator();
        self.out.push_str(&serde_json::to_string(v)?);
        Ok(())
    }

    /// Open a string value whose content is appended in pieces with
    /// [`Self::push_str_content`].
    pub fn start_string(&mut self) {
        self.separator();
        self.out.push('"');
    }

    /// Append escaped text to an open string value.
    ///
    /// # Errors
    ///
    /// Returns error if the text cannot be escaped.
    pub fn push_str_content(&mut self, text: &str) -> Result<(), serde_json::Error> {
        let quoted = serde_json::to_string(text)?;
        // Strip the quotes added by the serializer.
        self.out.push_str(&quoted[1..quoted.len() - 1]);
        Ok(())
    }

    pub fn end_string(&mut self) {
        self.out.push('"');
    }

    /// Text written so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// Take the text written so far, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.out)
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.out
    }

    fn separator(&mut self) {
        if self.after_name {
            self.after_name = false;
        } else if let Some(has_items) = self.stack.last_mut() {
            if *has_items {
                self.out.push(',');
            }
            *has_items = true;
        }
    }
}
