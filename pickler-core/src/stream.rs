// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Append-only / consume-only stream wrapper with a logical position.
//!
//! The pickle protocol never rewinds: back-references are resolved through the
//! memo table, so the stream only has to report how many bytes crossed it.

use crate::error::Error;
use std::io::{self, Read, SeekFrom, Write};

/// Wraps a byte sink or source and counts the bytes transferred through it.
///
/// `position()` starts at 0 for every wrapper regardless of where the inner
/// stream currently is.
#[derive(Debug)]
pub struct PositionStream<S> {
    inner: S,
    position: u64,
}

impl<S> PositionStream<S> {
    pub fn new(inner: S) -> Self {
        PositionStream { inner, position: 0 }
    }

    #[inline(always)]
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Always fails: pickle streams cannot be repositioned.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, Error> {
        Err(Error::not_supported(format!(
            "cannot seek a pickle stream to {:?}",
            pos
        )))
    }

    /// Always fails: pickle streams have no known length.
    pub fn len(&self) -> Result<u64, Error> {
        Err(Error::not_supported("pickle streams have no length"))
    }
}

impl<W: Write> Write for PositionStream<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<R: Read> Read for PositionStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl<S> io::Seek for PositionStream<S> {
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "pickle streams are not seekable",
        ))
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}
