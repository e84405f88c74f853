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

//! Tokenizing JSON reader.
//!
//! [`JsonReader`] is a pull lexer over JSON text. It is always positioned
//! on a current node; [`JsonReader::read`] advances to the next one.
//! Every node records its byte offset so the exact source text of a value
//! can be captured with [`JsonReader::skip_value`].
//!
//! ```rust
//! use odata_json::lexer::JsonNode;
//! use odata_json::lexer::JsonReader;
//!
//! let mut lexer = JsonReader::new(r#"{"a":[1, 2]}"#);
//! lexer.read().unwrap();
//! assert!(matches!(lexer.node(), JsonNode::StartObject));
//! lexer.read().unwrap();
//! assert_eq!(lexer.take_property_name().unwrap(), "a");
//! assert_eq!(lexer.skip_value().unwrap(), "[1, 2]");
//! assert!(matches!(lexer.node(), JsonNode::EndObject));
//! ```

use crate::Error;
use std::borrow::Cow;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::mem;

/// Default limit of nested objects and arrays.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Scalar JSON value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonScalar<'a> {
    Null,
    Boolean(bool),
    /// Number as it appears in the source.
    Number(&'a str),
    String(Cow<'a, str>),
}

impl JsonScalar<'_> {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Node of the JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JsonNode<'a> {
    /// Nothing read yet.
    #[default]
    None,
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    /// Name of an object member. The value follows.
    Property(Cow<'a, str>),
    Primitive(JsonScalar<'a>),
    EndOfInput,
}

impl JsonNode<'_> {
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::None => NodeKind::None,
            Self::StartObject => NodeKind::StartObject,
            Self::EndObject => NodeKind::EndObject,
            Self::StartArray => NodeKind::StartArray,
            Self::EndArray => NodeKind::EndArray,
            Self::Property(_) => NodeKind::Property,
            Self::Primitive(_) => NodeKind::Primitive,
            Self::EndOfInput => NodeKind::EndOfInput,
        }
    }

    /// Node is a string value.
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Self::Primitive(JsonScalar::String(_)))
    }
}

/// Kind of a [`JsonNode`] without its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    None,
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    Property,
    Primitive,
    EndOfInput,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::None => "nothing",
            Self::StartObject => "start of object",
            Self::EndObject => "end of object",
            Self::StartArray => "start of array",
            Self::EndArray => "end of array",
            Self::Property => "property",
            Self::Primitive => "primitive value",
            Self::EndOfInput => "end of input",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    container: Container,
    has_items: bool,
}

/// Pull lexer over JSON text.
///
/// Cloning the reader is cheap enough to look ahead in a payload.
#[derive(Debug, Clone)]
pub struct JsonReader<'a> {
    input: &'a str,
    pos: usize,
    stack: Vec<Frame>,
    node: JsonNode<'a>,
    node_start: usize,
    after_name: bool,
    started: bool,
    max_depth: usize,
}

impl<'a> JsonReader<'a> {
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            stack: Vec::new(),
            node: JsonNode::None,
            node_start: 0,
            after_name: false,
            started: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Current node.
    #[must_use]
    pub const fn node(&self) -> &JsonNode<'a> {
        &self.node
    }

    #[must_use]
    pub const fn node_kind(&self) -> NodeKind {
        self.node.kind()
    }

    /// Byte offset of the current node.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.node_start
    }

    /// Number of open objects and arrays.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Advance to the next node.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid JSON or nesting is deeper
    /// than allowed.
    pub fn read(&mut self) -> Result<&JsonNode<'a>, Error> {
        self.node = self.next_node()?;
        Ok(&self.node)
    }

    fn next_node(&mut self) -> Result<JsonNode<'a>, Error> {
        if matches!(self.node, JsonNode::EndOfInput) {
            return Ok(JsonNode::EndOfInput);
        }
        // Taken nodes leave `None` behind, so the document start is tracked
        // separately.
        if !self.started {
            self.started = true;
            return self.value();
        }
        if self.after_name {
            self.after_name = false;
            self.skip_whitespace();
            self.expect_byte(b':')?;
            return self.value();
        }
        self.skip_whitespace();
        let Some(frame) = self.stack.last().copied() else {
            self.node_start = self.pos;
            return if self.pos == self.input.len() {
                Ok(JsonNode::EndOfInput)
            } else {
                Err(self.syntax("unexpected content after JSON value"))
            };
        };
        self.node_start = self.pos;
        match (frame.container, self.peek()) {
            (Container::Object, Some(b'}')) => {
                self.pos += 1;
                self.stack.pop();
                Ok(JsonNode::EndObject)
            }
            (Container::Array, Some(b']')) => {
                self.pos += 1;
                self.stack.pop();
                Ok(JsonNode::EndArray)
            }
            (container, _) => {
                if frame.has_items {
                    self.expect_byte(b',')?;
                    self.skip_whitespace();
                }
                if let Some(top) = self.stack.last_mut() {
                    top.has_items = true;
                }
                match container {
                    Container::Object => {
                        self.node_start = self.pos;
                        if self.peek() != Some(b'"') {
                            return Err(self.syntax("expected property name"));
                        }
                        let name = self.string()?;
                        self.after_name = true;
                        Ok(JsonNode::Property(name))
                    }
                    Container::Array => self.value(),
                }
            }
        }
    }

    /// Take the name of the current property node and advance to its
    /// value.
    ///
    /// # Errors
    ///
    /// Returns error if the current node is not a property or the value
    /// is malformed.
    pub fn take_property_name(&mut self) -> Result<Cow<'a, str>, Error> {
        match mem::take(&mut self.node) {
            JsonNode::Property(name) => {
                self.read()?;
                Ok(name)
            }
            other => {
                self.node = other;
                Err(self.unexpected("property"))
            }
        }
    }

    /// Take the current scalar and advance past it.
    ///
    /// # Errors
    ///
    /// Returns error if the current node is not a scalar.
    pub fn take_scalar(&mut self) -> Result<JsonScalar<'a>, Error> {
        match mem::take(&mut self.node) {
            JsonNode::Primitive(v) => {
                self.read()?;
                Ok(v)
            }
            other => {
                self.node = other;
                Err(self.unexpected("primitive value"))
            }
        }
    }

    /// Skip the value starting at the current node and return its source
    /// text. The reader is left on the node following the value.
    ///
    /// # Errors
    ///
    /// Returns error if the current node does not start a value or the
    /// value is malformed.
    pub fn skip_value(&mut self) -> Result<&'a str, Error> {
        let start = self.node_start;
        match self.node {
            JsonNode::StartObject | JsonNode::StartArray => {
                let depth = self.stack.len();
                while self.stack.len() >= depth {
                    if matches!(self.read()?, JsonNode::EndOfInput) {
                        return Err(self.syntax("unexpected end of input"));
                    }
                }
            }
            JsonNode::Primitive(_) => {}
            _ => return Err(self.unexpected("value")),
        }
        let input = self.input;
        let raw = &input[start..self.pos];
        self.read()?;
        Ok(raw)
    }

    /// Fail unless the current node is of the `expected` kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedNode`] on mismatch.
    pub fn expect(&self, expected: NodeKind) -> Result<(), Error> {
        if self.node.kind() == expected {
            Ok(())
        } else {
            Err(Error::UnexpectedNode {
                position: self.node_start,
                expected: node_kind_name(expected),
                found: self.node.kind(),
            })
        }
    }

    /// Error reporting the current node where `expected` was required.
    #[must_use]
    pub fn unexpected(&self, expected: &'static str) -> Error {
        Error::UnexpectedNode {
            position: self.node_start,
            expected,
            found: self.node.kind(),
        }
    }

    fn value(&mut self) -> Result<JsonNode<'a>, Error> {
        self.skip_whitespace();
        self.node_start = self.pos;
        match self.peek() {
            Some(b'{') => {
                self.push(Container::Object)?;
                Ok(JsonNode::StartObject)
            }
            Some(b'[') => {
                self.push(Container::Array)?;
                Ok(JsonNode::StartArray)
            }
            Some(b'"') => Ok(JsonNode::Primitive(JsonScalar::String(self.string()?))),
            Some(b't') => self.literal("true", JsonScalar::Boolean(true)),
            Some(b'f') => self.literal("false", JsonScalar::Boolean(false)),
            Some(b'n') => self.literal("null", JsonScalar::Null),
            Some(b'-' | b'0'..=b'9') => self.number(),
            Some(_) => Err(self.syntax("expected value")),
            None => Err(self.syntax("unexpected end of input")),
        }
    }

    fn push(&mut self, container: Container) -> Result<(), Error> {
        if self.stack.len() >= self.max_depth {
            return Err(Error::MaxDepthExceeded(self.max_depth));
        }
        self.pos += 1;
        self.stack.push(Frame {
            container,
            has_items: false,
        });
        Ok(())
    }

    fn literal(&mut self, text: &str, value: JsonScalar<'a>) -> Result<JsonNode<'a>, Error> {
        if self.input[self.pos..].starts_with(text) {
            self.pos += text.len();
            Ok(JsonNode::Primitive(value))
        } else {
            Err(self.syntax("invalid literal"))
        }
    }

    fn number(&mut self) -> Result<JsonNode<'a>, Error> {
        let input = self.input;
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => self.digits(),
            _ => return Err(self.syntax("invalid number")),
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.syntax("invalid number"));
            }
            self.digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.syntax("invalid number"));
            }
            self.digits();
        }
        Ok(JsonNode::Primitive(JsonScalar::Number(&input[start..self.pos])))
    }

    fn digits(&mut self) {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
    }

    fn string(&mut self) -> Result<Cow<'a, str>, Error> {
        // Opening quote.
        self.pos += 1;
        let input = self.input;
        let bytes = input.as_bytes();
        let mut owned: Option<String> = None;
        let mut chunk_start = self.pos;
        loop {
            let Some(&b) = bytes.get(self.pos) else {
                return Err(self.syntax("unterminated string"));
            };
            match b {
                b'"' => {
                    let tail = &input[chunk_start..self.pos];
                    self.pos += 1;
                    return Ok(match owned {
                        Some(mut s) => {
                            s.push_str(tail);
                            Cow::Owned(s)
                        }
                        None => Cow::Borrowed(tail),
                    });
                }
                b'\\' => {
                    let s = owned.get_or_insert_with(String::new);
                    s.push_str(&input[chunk_start..self.pos]);
                    self.pos += 1;
                    s.push(self.escape()?);
                    chunk_start = self.pos;
                }
                0x00..=0x1f => return Err(self.syntax("control character in string")),
                _ => self.pos += 1,
            }
        }
    }

    fn escape(&mut self) -> Result<char, Error> {
        let Some(b) = self.peek() else {
            return Err(self.syntax("unterminated string"));
        };
        self.pos += 1;
        Ok(match b {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let high = self.hex4()?;
                let code = if (0xd800..0xdc00).contains(&high) {
                    if !self.input[self.pos..].starts_with("\\u") {
                        return Err(self.syntax("unpaired surrogate"));
                    }
                    self.pos += 2;
                    let low = self.hex4()?;
                    if !(0xdc00..0xe000).contains(&low) {
                        return Err(self.syntax("unpaired surrogate"));
                    }
                    0x10000 + ((high - 0xd800) << 10) + (low - 0xdc00)
                } else {
                    high
                };
                char::from_u32(code).ok_or_else(|| self.syntax("invalid unicode escape"))?
            }
            _ => return Err(self.syntax("invalid escape")),
        })
    }

    fn hex4(&mut self) -> Result<u32, Error> {
        let digits = self
            .input
            .get(self.pos..self.pos + 4)
            .filter(|digits| digits.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| self.syntax("invalid unicode escape"))?;
        let code =
            u32::from_str_radix(digits, 16).map_err(|_| self.syntax("invalid unicode escape"))?;
        self.pos += 4;
        Ok(code)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn expect_byte(&mut self, expected: u8) -> Result<(), Error> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.syntax(match expected {
                b':' => "expected ':'",
                b',' => "expected ','",
                _ => "unexpected character",
            }))
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn syntax(&self, message: &str) -> Error {
        Error::Syntax {
            position: self.pos,
            message: message.into(),
        }
    }
}

const fn node_kind_name(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::None => "nothing",
        NodeKind::StartObject => "object",
        NodeKind::EndObject => "end of object",
        NodeKind::StartArray => "array",
        NodeKind::EndArray => "end of array",
        NodeKind::Property => "property",
        NodeKind::Primitive => "primitive value",
        NodeKind::EndOfInput => "end of input",
    }
}

/// Check that `text` is exactly one JSON value.
///
/// # Errors
///
/// Returns error if `text` is not a JSON value.
pub fn validate(text: &str) -> Result<(), Error> {
    let mut lexer = JsonReader::new(text);
    lexer.read()?;
    lexer.skip_value()?;
    lexer.expect(NodeKind::EndOfInput)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(input: &str) -> Result<Vec<NodeKind>, Error> {
        let mut lexer = JsonReader::new(input);
        let mut result = Vec::new();
        loop {
            let kind = lexer.read()?.kind();
            result.push(kind);
            if kind == NodeKind::EndOfInput {
                return Ok(result);
            }
        }
    }

    #[test]
    fn node_stream() {
        use NodeKind::*;
        assert_eq!(
            nodes(r#" {"a": [1, "x", null], "b": {}} "#).unwrap(),
            vec![
                StartObject,
                Property,
                StartArray,
                Primitive,
                Primitive,
                Primitive,
                EndArray,
                Property,
                StartObject,
                EndObject,
                EndObject,
                EndOfInput
            ]
        );
    }

    #[test]
    fn scalars() {
        let mut lexer = JsonReader::new(r#"[-0.5e+3, true, "a\"bé😀"]"#);
        lexer.read().unwrap();
        lexer.read().unwrap();
        assert_eq!(lexer.take_scalar().unwrap(), JsonScalar::Number("-0.5e+3"));
        assert_eq!(lexer.take_scalar().unwrap(), JsonScalar::Boolean(true));
        assert_eq!(
            lexer.take_scalar().unwrap(),
            JsonScalar::String("a\"b\u{e9}\u{1f600}".into())
        );
        assert_eq!(lexer.node_kind(), NodeKind::EndArray);
    }

    #[test]
    fn unescaped_strings_are_borrowed() {
        let mut lexer = JsonReader::new(r#""plain""#);
        lexer.read().unwrap();
        assert!(matches!(
            lexer.node(),
            JsonNode::Primitive(JsonScalar::String(Cow::Borrowed("plain")))
        ));
    }

    #[test]
    fn skip_value_returns_source_text() {
        let mut lexer = JsonReader::new(r#"{"a":{"b":[1,{"c":2}]} ,"d":12.3}"#);
        lexer.read().unwrap();
        lexer.read().unwrap();
        lexer.take_property_name().unwrap();
        assert_eq!(lexer.skip_value().unwrap(), r#"{"b":[1,{"c":2}]}"#);
        assert_eq!(lexer.take_property_name().unwrap(), "d");
        assert_eq!(lexer.skip_value().unwrap(), "12.3");
        assert_eq!(lexer.node_kind(), NodeKind::EndObject);
    }

    #[test]
    fn malformed_text() {
        for input in [
            "",
            "{",
            r#"{"a" 1}"#,
            r#"{"a":1,}"#,
            "[1,]",
            "01",
            "1.",
            "-",
            "tru",
            r#""a"#,
            "\"\u{1}\"",
            r#""\x""#,
            r#""\ud800""#,
            r#""\u+041""#,
            "{} {}",
            "{a:1}",
        ] {
            assert!(
                matches!(nodes(input), Err(Error::Syntax { .. })),
                "{input:?} must fail"
            );
        }
    }

    #[test]
    fn separators_after_taken_nodes() {
        let mut lexer = JsonReader::new(r#"{"Id":1,"Name":null}"#);
        lexer.read().unwrap();
        lexer.read().unwrap();
        assert_eq!(lexer.take_property_name().unwrap(), "Id");
        assert_eq!(lexer.take_scalar().unwrap(), JsonScalar::Number("1"));
        assert_eq!(lexer.take_property_name().unwrap(), "Name");
        assert_eq!(lexer.take_scalar().unwrap(), JsonScalar::Null);
        assert_eq!(lexer.node_kind(), NodeKind::EndObject);
        assert_eq!(lexer.read().unwrap().kind(), NodeKind::EndOfInput);
    }

    #[test]
    fn depth_limit() {
        let mut lexer = JsonReader::new("[[[1]]]").with_max_depth(2);
        lexer.read().unwrap();
        lexer.read().unwrap();
        assert!(matches!(lexer.read(), Err(Error::MaxDepthExceeded(2))));
    }

    #[test]
    fn lookahead_by_clone() {
        let mut lexer = JsonReader::new(r#"{"x":1,"y":2}"#);
        lexer.read().unwrap();
        let mut ahead = lexer.clone();
        ahead.skip_value().unwrap();
        assert_eq!(ahead.node_kind(), NodeKind::EndOfInput);
        assert_eq!(lexer.node_kind(), NodeKind::StartObject);
    }

    #[test]
    fn validate_values() {
        assert!(validate(r#"{"a":[true,null]}"#).is_ok());
        assert!(validate("12.3").is_ok());
        assert!(validate("12.3 4").is_err());
        assert!(validate("").is_err());
    }
}
