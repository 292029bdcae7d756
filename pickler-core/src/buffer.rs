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

use crate::error::Error;
use crate::stream::PositionStream;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Number of payload bits carried by one 16-bit varint unit.
const VARINT_CHUNK_BITS: u32 = 15;
const VARINT_CHUNK_MASK: u16 = 0x7FFF;
const VARINT_CONTINUATION: u16 = 0x8000;
/// A 64-bit value never needs more than five units.
const VARINT_MAX_UNITS: u32 = 5;
/// Bits left for the fifth unit: 64 - 4 * 15.
const VARINT_LAST_UNIT_MASK: u16 = 0x000F;

pub struct Writer<'w> {
    stream: PositionStream<&'w mut dyn Write>,
}

impl<'w> Writer<'w> {
    pub fn new(sink: &'w mut dyn Write) -> Writer<'w> {
        Writer {
            stream: PositionStream::new(sink),
        }
    }

    /// Bytes written since this writer was created.
    #[inline(always)]
    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        self.stream.flush()?;
        Ok(())
    }

    pub fn write_bytes(&mut self, v: &[u8]) -> Result<(), Error> {
        self.stream.write_all(v)?;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), Error> {
        self.stream.write_u8(value)?;
        Ok(())
    }

    pub fn write_i8(&mut self, value: i8) -> Result<(), Error> {
        self.stream.write_i8(value)?;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), Error> {
        self.write_u8(value as u8)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), Error> {
        self.stream.write_u16::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_i16(&mut self, value: i16) -> Result<(), Error> {
        self.stream.write_i16::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), Error> {
        self.stream.write_u32::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<(), Error> {
        self.stream.write_i32::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_u64(&mut self, value: u64) -> Result<(), Error> {
        self.stream.write_u64::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_i64(&mut self, value: i64) -> Result<(), Error> {
        self.stream.write_i64::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), Error> {
        self.stream.write_f32::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_f64(&mut self, value: f64) -> Result<(), Error> {
        self.stream.write_f64::<LittleEndian>(value)?;
        Ok(())
    }

    /// Writes `value` as 15-bit groups, lowest group first, one little-endian
    /// u16 per group with bit 15 set on every unit but the last.
    ///
    /// Negative values are encoded through their two's-complement bit pattern
    /// and always take five units.
    pub fn write_varint(&mut self, value: i64) -> Result<(), Error> {
        let mut rest = value as u64;
        loop {
            let chunk = (rest as u16) & VARINT_CHUNK_MASK;
            rest >>= VARINT_CHUNK_BITS;
            if rest == 0 {
                return self.write_u16(chunk);
            }
            self.write_u16(chunk | VARINT_CONTINUATION)?;
        }
    }

    /// Compact zigzag 7-bit encoding used for string length prefixes.
    pub fn write_varint32(&mut self, value: i32) -> Result<(), Error> {
        let zigzag = ((value << 1) ^ (value >> 31)) as u32;
        self.write_varuint32(zigzag)
    }

    pub fn write_varuint32(&mut self, mut value: u32) -> Result<(), Error> {
        while value >= 0x80 {
            self.write_u8(((value as u8) & 0x7F) | 0x80)?;
            value >>= 7;
        }
        self.write_u8(value as u8)
    }

    /// Writes `[len][utf8 bytes]`, or the `-1` sentinel for `None`.
    pub fn write_nullable_string(&mut self, s: Option<&str>) -> Result<(), Error> {
        match s {
            None => self.write_varint32(-1),
            Some(s) => {
                let len = i32::try_from(s.len()).map_err(|_| {
                    Error::unsupported_type(format!(
                        "string of {} bytes exceeds the length prefix",
                        s.len()
                    ))
                })?;
                self.write_varint32(len)?;
                self.write_bytes(s.as_bytes())
            }
        }
    }

    pub fn write_string(&mut self, s: &str) -> Result<(), Error> {
        self.write_nullable_string(Some(s))
    }
}

pub struct Reader<'r> {
    stream: PositionStream<&'r mut dyn Read>,
}

impl<'r> Reader<'r> {
    pub fn new(source: &'r mut dyn Read) -> Reader<'r> {
        Reader {
            stream: PositionStream::new(source),
        }
    }

    /// Bytes consumed since this reader was created.
    #[inline(always)]
    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    /// Returns true if the source has no bytes left. Consumes a byte when
    /// there is one.
    pub fn at_end(&mut self) -> Result<bool, Error> {
        let mut probe = [0u8; 1];
        loop {
            match self.stream.read(&mut probe) {
                Ok(0) => return Ok(true),
                Ok(_) => return Ok(false),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    /// Reads exactly `len` bytes without trusting `len` for the allocation size.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        (&mut self.stream)
            .take(len as u64)
            .read_to_end(&mut buf)
            .map_err(Error::from_read)?;
        if buf.len() != len {
            return Err(Error::format(format!(
                "expected {} bytes, stream ended after {}",
                len,
                buf.len()
            )));
        }
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.stream.read_u8().map_err(Error::from_read)
    }

    pub fn read_i8(&mut self) -> Result<i8, Error> {
        self.stream.read_i8().map_err(Error::from_read)
    }

    pub fn read_bool(&mut self) -> Result<bool, Error> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::format(format!("invalid bool byte {}", other))),
        }
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        self.stream
            .read_u16::<LittleEndian>()
            .map_err(Error::from_read)
    }

    pub fn read_i16(&mut self) -> Result<i16, Error> {
        self.stream
            .read_i16::<LittleEndian>()
            .map_err(Error::from_read)
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        self.stream
            .read_u32::<LittleEndian>()
            .map_err(Error::from_read)
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        self.stream
            .read_i32::<LittleEndian>()
            .map_err(Error::from_read)
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        self.stream
            .read_u64::<LittleEndian>()
            .map_err(Error::from_read)
    }

    pub fn read_i64(&mut self) -> Result<i64, Error> {
        self.stream
            .read_i64::<LittleEndian>()
            .map_err(Error::from_read)
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        self.stream
            .read_f32::<LittleEndian>()
            .map_err(Error::from_read)
    }

    pub fn read_f64(&mut self) -> Result<f64, Error> {
        self.stream
            .read_f64::<LittleEndian>()
            .map_err(Error::from_read)
    }

    /// Inverse of [`Writer::write_varint`].
    ///
    /// A fifth unit that still has its continuation bit set, or that carries
    /// bits beyond the 64th, is a format error.
    pub fn read_varint(&mut self) -> Result<i64, Error> {
        let mut result = 0u64;
        for index in 0..VARINT_MAX_UNITS {
            let unit = self.read_u16()?;
            let data = unit & VARINT_CHUNK_MASK;
            if index == VARINT_MAX_UNITS - 1
                && (unit & VARINT_CONTINUATION != 0 || data & !VARINT_LAST_UNIT_MASK != 0)
            {
                return Err(Error::format(format!(
                    "varint overflows 64 bits: fifth unit is {:#06x}",
                    unit
                )));
            }
            result |= (data as u64) << (VARINT_CHUNK_BITS * index);
            if unit & VARINT_CONTINUATION == 0 {
                return Ok(result as i64);
            }
        }
        Err(Error::format("unterminated varint"))
    }

    /// Reads a varint that must be a non-negative count or length.
    pub fn read_varint_len(&mut self) -> Result<usize, Error> {
        let value = self.read_varint()?;
        usize::try_from(value)
            .map_err(|_| Error::format(format!("invalid length {}", value)))
    }

    pub fn read_varint32(&mut self) -> Result<i32, Error> {
        let encoded = self.read_varuint32()?;
        Ok(((encoded >> 1) as i32) ^ -((encoded & 1) as i32))
    }

    pub fn read_varuint32(&mut self) -> Result<u32, Error> {
        let mut result = 0u32;
        for index in 0..5 {
            let b = self.read_u8()? as u32;
            if index == 4 && b > 0x0F {
                return Err(Error::format("compact integer overflows 32 bits"));
            }
            result |= (b & 0x7F) << (7 * index);
            if b < 0x80 {
                return Ok(result);
            }
        }
        Err(Error::format("unterminated compact integer"))
    }

    /// Inverse of [`Writer::write_nullable_string`].
    pub fn read_nullable_string(&mut self) -> Result<Option<String>, Error> {
        let len = self.read_varint32()?;
        if len == -1 {
            return Ok(None);
        }
        let len = usize::try_from(len)
            .map_err(|_| Error::format(format!("invalid string length {}", len)))?;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| Error::format(format!("string is not valid utf-8: {}", e)))
    }

    pub fn read_string(&mut self) -> Result<String, Error> {
        self.read_nullable_string()?
            .ok_or_else(|| Error::format("unexpected null string"))
    }
}
