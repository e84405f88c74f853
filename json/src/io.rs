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

//! Payload transport: decoding bytes to text, reading and writing
//! payloads with cooperative cancellation.

use crate::Error;
use odata_json_core::media_type::MediaTypeParameters;
use std::io::Read;
use std::str;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[cfg(feature = "async")]
use futures_util::io::AsyncRead;
#[cfg(feature = "async")]
use futures_util::io::AsyncReadExt;
#[cfg(feature = "async")]
use futures_util::io::AsyncWrite;
#[cfg(feature = "async")]
use futures_util::io::AsyncWriteExt;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[cfg(feature = "async")]
const CHUNK_SIZE: usize = 8 * 1024;

/// Cooperative cancellation shared between the caller and async
/// transport. Checked before every suspension point.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal(Arc<AtomicBool>);

impl CancellationSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if cancellation was requested.
    pub fn check(&self) -> Result<(), Error> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Decode payload bytes. A UTF-8 byte order mark is dropped.
///
/// # Errors
///
/// Returns error if the content type is malformed, names a charset other
/// than UTF-8, or the bytes are not valid UTF-8.
pub fn decode_payload<'b>(bytes: &'b [u8], content_type: Option<&str>) -> Result<&'b str, Error> {
    if let Some(content_type) = content_type {
        let params = MediaTypeParameters::parse(content_type)?;
        if !params.is_utf8() {
            return Err(Error::UnsupportedCharset(params.charset.unwrap_or_default()));
        }
    }
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
}

/// Read a whole payload from `reader`.
///
/// # Errors
///
/// Returns error if reading fails or the payload cannot be decoded.
pub fn read_payload<R: Read>(mut reader: R, content_type: Option<&str>) -> Result<String, Error> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode_payload(&bytes, content_type).map(ToOwned::to_owned)
}

/// Read a whole payload from an async `reader`.
///
/// # Errors
///
/// Returns [`Error::Cancelled`] if `signal` is cancelled before a read,
/// or error if reading fails or the payload cannot be decoded.
#[cfg(feature = "async")]
pub async fn read_payload_async<R: AsyncRead + Unpin>(
    reader: &mut R,
    content_type: Option<&str>,
    signal: &CancellationSignal,
) -> Result<String, Error> {
    let mut bytes = Vec::new();
    let mut chunk = vec![0; CHUNK_SIZE];
    loop {
        signal.check()?;
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);
    }
    decode_payload(&bytes, content_type).map(ToOwned::to_owned)
}

/// Write `text` to an async `writer` and flush it.
///
/// # Errors
///
/// Returns [`Error::Cancelled`] if `signal` is cancelled before a write,
/// or error if writing fails.
#[cfg(feature = "async")]
pub async fn write_payload_async<W: AsyncWrite + Unpin>(
    writer: &mut W,
    text: &str,
    signal: &CancellationSignal,
) -> Result<(), Error> {
    for chunk in text.as_bytes().chunks(CHUNK_SIZE) {
        signal.check()?;
        writer.write_all(chunk).await?;
    }
    signal.check()?;
    writer.flush().await?;
    Ok(())
}
