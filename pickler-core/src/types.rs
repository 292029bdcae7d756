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
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// First two bytes of every pickle.
pub const MAGIC_NUMBER: u16 = 0x5049;
/// The only format version this engine reads and writes.
pub const FORMAT_VERSION: u8 = 1;

/// Leading byte of every encoded value.
///
/// `BackRef` is mutually exclusive with a fresh payload: it is followed by the
/// varint offset of the object's original tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Tag {
    Null = 0,
    BackRef = 1,
    Bool = 2,
    I8 = 3,
    U8 = 4,
    I16 = 5,
    U16 = 6,
    I32 = 7,
    U32 = 8,
    I64 = 9,
    U64 = 10,
    F32 = 11,
    F64 = 12,
    Char = 13,
    Timestamp = 14,
    Date = 15,
    Str = 32,
    Boxed = 33,
    Array = 34,
    Tuple = 35,
    Record = 36,
    Enum = 37,
    Function = 38,
    /// Unit member resolved by name at load time.
    MemberRef = 48,
    /// Unit member whose unit definition is inlined.
    MemberDef = 49,
    UnitRef = 50,
    UnitDef = 51,
}

impl Tag {
    pub fn from_byte(byte: u8) -> Result<Tag, Error> {
        Tag::try_from(byte).map_err(|_| Error::format(format!("unknown tag {:#04x}", byte)))
    }
}

/// Scalar kinds that are written without identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum PrimitiveKind {
    Bool = 2,
    I8 = 3,
    U8 = 4,
    I16 = 5,
    U16 = 6,
    I32 = 7,
    U32 = 8,
    I64 = 9,
    U64 = 10,
    F32 = 11,
    F64 = 12,
    Char = 13,
    Timestamp = 14,
    Date = 15,
}

impl PrimitiveKind {
    pub fn from_byte(byte: u8) -> Result<PrimitiveKind, Error> {
        PrimitiveKind::try_from(byte)
            .map_err(|_| Error::format(format!("unknown primitive kind {:#04x}", byte)))
    }

    pub fn tag(self) -> Tag {
        // Primitive kinds share their discriminants with the matching tags.
        match self {
            PrimitiveKind::Bool => Tag::Bool,
            PrimitiveKind::I8 => Tag::I8,
            PrimitiveKind::U8 => Tag::U8,
            PrimitiveKind::I16 => Tag::I16,
            PrimitiveKind::U16 => Tag::U16,
            PrimitiveKind::I32 => Tag::I32,
            PrimitiveKind::U32 => Tag::U32,
            PrimitiveKind::I64 => Tag::I64,
            PrimitiveKind::U64 => Tag::U64,
            PrimitiveKind::F32 => Tag::F32,
            PrimitiveKind::F64 => Tag::F64,
            PrimitiveKind::Char => Tag::Char,
            PrimitiveKind::Timestamp => Tag::Timestamp,
            PrimitiveKind::Date => Tag::Date,
        }
    }

    pub fn from_tag(tag: Tag) -> Option<PrimitiveKind> {
        PrimitiveKind::try_from(u8::from(tag)).ok()
    }

    /// Size of the fixed-width payload in bytes.
    pub fn width(self) -> usize {
        match self {
            PrimitiveKind::Bool | PrimitiveKind::I8 | PrimitiveKind::U8 => 1,
            PrimitiveKind::I16 | PrimitiveKind::U16 => 2,
            PrimitiveKind::I32
            | PrimitiveKind::U32
            | PrimitiveKind::F32
            | PrimitiveKind::Char
            | PrimitiveKind::Date => 4,
            PrimitiveKind::I64 | PrimitiveKind::U64 | PrimitiveKind::F64 => 8,
            PrimitiveKind::Timestamp => 12,
        }
    }
}

/// Underlying integer representation of an enum shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum IntKind {
    I8 = 3,
    U8 = 4,
    I16 = 5,
    U16 = 6,
    I32 = 7,
    U32 = 8,
    I64 = 9,
    U64 = 10,
}

impl IntKind {
    pub fn from_byte(byte: u8) -> Result<IntKind, Error> {
        IntKind::try_from(byte)
            .map_err(|_| Error::format(format!("unknown integer kind {:#04x}", byte)))
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            IntKind::I8 | IntKind::I16 | IntKind::I32 | IntKind::I64
        )
    }

    pub fn bits(self) -> u32 {
        match self {
            IntKind::I8 | IntKind::U8 => 8,
            IntKind::I16 | IntKind::U16 => 16,
            IntKind::I32 | IntKind::U32 => 32,
            IntKind::I64 | IntKind::U64 => 64,
        }
    }

    /// Returns true if `value`, read as this kind's bit pattern, is in range.
    pub fn contains(self, value: i64) -> bool {
        match self {
            IntKind::I8 => i8::try_from(value).is_ok(),
            IntKind::U8 => u8::try_from(value).is_ok(),
            IntKind::I16 => i16::try_from(value).is_ok(),
            IntKind::U16 => u16::try_from(value).is_ok(),
            IntKind::I32 => i32::try_from(value).is_ok(),
            IntKind::U32 => u32::try_from(value).is_ok(),
            // u64 values above i64::MAX are stored by bit pattern.
            IntKind::I64 | IntKind::U64 => true,
        }
    }
}

/// Element storage of an array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Every slot is a full value with its own tag and identity.
    Any,
    /// Slots are raw fixed-width payloads with no tag.
    Primitive(PrimitiveKind),
}

impl ElementType {
    const ANY_BYTE: u8 = 0;

    pub fn to_byte(self) -> u8 {
        match self {
            ElementType::Any => Self::ANY_BYTE,
            ElementType::Primitive(kind) => kind.into(),
        }
    }

    pub fn from_byte(byte: u8) -> Result<ElementType, Error> {
        if byte == Self::ANY_BYTE {
            Ok(ElementType::Any)
        } else {
            PrimitiveKind::from_byte(byte).map(ElementType::Primitive)
        }
    }
}

/// Declared type of a record field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    Any,
    Primitive(PrimitiveKind),
}

impl FieldType {
    pub fn to_byte(self) -> u8 {
        match self {
            FieldType::Any => 0,
            FieldType::Primitive(kind) => kind.into(),
        }
    }

    pub fn from_byte(byte: u8) -> Result<FieldType, Error> {
        if byte == 0 {
            Ok(FieldType::Any)
        } else {
            PrimitiveKind::from_byte(byte).map(FieldType::Primitive)
        }
    }
}

/// Kind of a unit member as written next to its local path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum MemberKind {
    Record = 1,
    Enum = 2,
    Code = 3,
}

impl MemberKind {
    pub fn from_byte(byte: u8) -> Result<MemberKind, Error> {
        MemberKind::try_from(byte)
            .map_err(|_| Error::format(format!("unknown member kind {:#04x}", byte)))
    }
}
