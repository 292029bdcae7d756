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

use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::meta::unit::{
    check_definitions, CodeBody, CodeDef, Construction, EnumDef, FieldDef, RecordDef, Unit,
    UnitId,
};
use crate::types::{FieldType, IntKind};

/// Structural description of a unit, enough to rebuild it in another process.
///
/// Produced by a [`TypeProvider`](crate::provider::TypeProvider) and inlined
/// into the stream the first time a by-value unit is written. Static values
/// are not part of the descriptor; they travel as trailers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitDescriptor {
    pub id: UnitId,
    pub records: Vec<RecordDef>,
    pub enums: Vec<EnumDef>,
    pub code: Vec<CodeDef>,
    pub statics: Vec<String>,
}

const BODY_BYTECODE: u8 = 0;
const BODY_NATIVE: u8 = 1;

impl UnitDescriptor {
    pub fn of(unit: &Unit) -> UnitDescriptor {
        UnitDescriptor {
            id: unit.id().clone(),
            records: unit.records().iter().map(|s| s.def().clone()).collect(),
            enums: unit.enums().iter().map(|s| s.def().clone()).collect(),
            code: unit.code().iter().map(|c| c.def().clone()).collect(),
            statics: unit.statics().iter().map(|c| c.name().to_string()).collect(),
        }
    }

    pub fn write(&self, writer: &mut Writer) -> Result<(), Error> {
        writer.write_string(self.id.name())?;
        writer.write_string(self.id.version())?;

        writer.write_varint(self.records.len() as i64)?;
        for record in &self.records {
            writer.write_string(&record.name)?;
            writer.write_u8(record.construction as u8)?;
            write_fields(writer, &record.fields)?;
        }

        writer.write_varint(self.enums.len() as i64)?;
        for def in &self.enums {
            writer.write_string(&def.name)?;
            writer.write_u8(def.underlying.into())?;
            writer.write_varint(def.variants.len() as i64)?;
            for (name, value) in &def.variants {
                writer.write_string(name)?;
                writer.write_varint(*value)?;
            }
        }

        writer.write_varint(self.code.len() as i64)?;
        for def in &self.code {
            writer.write_string(&def.name)?;
            writer.write_varint(def.arity as i64)?;
            match &def.body {
                CodeBody::Bytecode(bytes) => {
                    writer.write_u8(BODY_BYTECODE)?;
                    writer.write_varint(bytes.len() as i64)?;
                    writer.write_bytes(bytes)?;
                }
                CodeBody::Native(symbol) => {
                    writer.write_u8(BODY_NATIVE)?;
                    writer.write_string(symbol)?;
                }
            }
        }

        writer.write_varint(self.statics.len() as i64)?;
        for name in &self.statics {
            writer.write_string(name)?;
        }
        Ok(())
    }

    pub fn read(reader: &mut Reader) -> Result<UnitDescriptor, Error> {
        let name = reader.read_string()?;
        let version = reader.read_string()?;

        let count = reader.read_varint_len()?;
        let mut records = Vec::new();
        for _ in 0..count {
            let name = reader.read_string()?;
            let construction = Construction::from_byte(reader.read_u8()?)?;
            let fields = read_fields(reader)?;
            records.push(RecordDef {
                name,
                fields,
                construction,
            });
        }

        let count = reader.read_varint_len()?;
        let mut enums = Vec::new();
        for _ in 0..count {
            let name = reader.read_string()?;
            let underlying = IntKind::from_byte(reader.read_u8()?)?;
            let variant_count = reader.read_varint_len()?;
            let mut variants = Vec::new();
            for _ in 0..variant_count {
                let variant = reader.read_string()?;
                variants.push((variant, reader.read_varint()?));
            }
            enums.push(EnumDef {
                name,
                underlying,
                variants,
            });
        }

        let count = reader.read_varint_len()?;
        let mut code = Vec::new();
        for _ in 0..count {
            let name = reader.read_string()?;
            let arity = u32::try_from(reader.read_varint()?)
                .map_err(|_| Error::format("code arity out of range"))?;
            let body = match reader.read_u8()? {
                BODY_BYTECODE => {
                    let len = reader.read_varint_len()?;
                    CodeBody::Bytecode(reader.read_bytes(len)?)
                }
                BODY_NATIVE => CodeBody::Native(reader.read_string()?),
                other => return Err(Error::format(format!("unknown code body {}", other))),
            };
            code.push(CodeDef { name, arity, body });
        }

        let count = reader.read_varint_len()?;
        let mut statics = Vec::new();
        for _ in 0..count {
            statics.push(reader.read_string()?);
        }

        let id = UnitId::new(name, version);
        check_definitions(&id, &records, &enums, &code, statics.iter()).map_err(Error::format)?;
        Ok(UnitDescriptor {
            id,
            records,
            enums,
            code,
            statics,
        })
    }
}

pub(crate) fn write_fields(writer: &mut Writer, fields: &[FieldDef]) -> Result<(), Error> {
    writer.write_varint(fields.len() as i64)?;
    for field in fields {
        writer.write_string(&field.name)?;
        writer.write_u8(field.ty.to_byte())?;
    }
    Ok(())
}

pub(crate) fn read_fields(reader: &mut Reader) -> Result<Vec<FieldDef>, Error> {
    let count = reader.read_varint_len()?;
    let mut fields = Vec::new();
    for _ in 0..count {
        let name = reader.read_string()?;
        let ty = FieldType::from_byte(reader.read_u8()?)?;
        fields.push(FieldDef { name, ty });
    }
    Ok(fields)
}
