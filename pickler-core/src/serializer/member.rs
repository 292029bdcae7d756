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

//! References to unit members and the units that own them.
//!
//! By reference:
//! `[MemberRef][UnitRef name version][kind][path][signature]`
//!
//! By value:
//! `[MemberDef][UnitDef descriptor][kind][path]`, followed later by a trailer
//! holding the unit's static cells and its initialized flag.
//!
//! Members and units are memoized like any other object, so each one is
//! written in full at most once per call.

use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::meta::descriptor::{read_fields, write_fields, UnitDescriptor};
use crate::meta::unit::{Construction, Member, Unit, UnitId};
use crate::policy::UnitMode;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::memo::MemoEntry;
use crate::resolver::trailer::{Trailer, TrailerHost};
use crate::serializer::{read_offset, read_value, write_value};
use crate::types::{MemberKind, Tag};
use crate::value::{ObjectId, Value};
use std::sync::Arc;

pub fn write_member(context: &mut WriteContext, member: &Member) -> Result<(), Error> {
    let id = member.object_id();
    if context.memo.maybe_write_memo(&mut context.writer, id)? {
        return Ok(());
    }
    let unit = member.unit()?;
    let mode = context.unit_mode(&unit);
    let offset = context.writer.position();
    context.memo.begin(offset, id);
    match mode {
        UnitMode::ByValue => {
            context.writer.write_u8(Tag::MemberDef.into())?;
            write_unit(context, &unit, mode)?;
            context.writer.write_u8(member.kind().into())?;
            context.writer.write_string(member.path())?;
        }
        UnitMode::ByReference | UnitMode::Default => {
            context.writer.write_u8(Tag::MemberRef.into())?;
            write_unit(context, &unit, UnitMode::ByReference)?;
            context.writer.write_u8(member.kind().into())?;
            context.writer.write_string(member.path())?;
            write_signature(&mut context.writer, member)?;
        }
    }
    context.memo.finish(id);
    Ok(())
}

fn write_unit<'a>(
    context: &mut WriteContext<'a>,
    unit: &Arc<Unit>,
    mode: UnitMode,
) -> Result<(), Error> {
    let id = ObjectId::of_arc(unit);
    if context.memo.maybe_write_memo(&mut context.writer, id)? {
        return Ok(());
    }
    let offset = context.writer.position();
    context.memo.begin(offset, id);
    if mode == UnitMode::ByValue {
        context.writer.write_u8(Tag::UnitDef.into())?;
        let descriptor = context.describe(unit);
        descriptor.write(&mut context.writer)?;

        let statics = descriptor.statics.clone();
        let owner = unit.clone();
        let trailer: Trailer<WriteContext<'a>> = Box::new(move |context: &mut WriteContext<'a>| {
            for name in &statics {
                let value = owner.static_value(name).unwrap_or(Value::Null);
                write_value(context, &value)?;
            }
            Ok(())
        });
        let owner = unit.clone();
        let static_init: Trailer<WriteContext<'a>> =
            Box::new(move |context: &mut WriteContext<'a>| {
                context.writer.write_bool(owner.is_initialized())
            });
        context.trailers().push_trailer(trailer, Some(static_init));
    } else {
        context
            .unit_context()
            .check_unambiguous(unit.id().name())?;
        context.writer.write_u8(Tag::UnitRef.into())?;
        context.writer.write_string(unit.id().name())?;
        context.writer.write_string(unit.id().version())?;
    }
    context.memo.finish(id);
    Ok(())
}

fn write_signature(writer: &mut Writer, member: &Member) -> Result<(), Error> {
    match member {
        Member::Record(shape) => {
            writer.write_u8(shape.construction() as u8)?;
            write_fields(writer, shape.fields())
        }
        Member::Enum(_) => Ok(()),
        Member::Code(code) => writer.write_varint(code.arity() as i64),
    }
}

fn check_signature(reader: &mut Reader, member: &Member) -> Result<(), Error> {
    match member {
        Member::Record(shape) => {
            let construction = Construction::from_byte(reader.read_u8()?)?;
            let fields = read_fields(reader)?;
            if construction != shape.construction() || fields.as_slice() != shape.fields() {
                return Err(Error::shape_mismatch(format!(
                    "record {} is {:?} {:?} in the stream but {:?} {:?} here",
                    shape.name(),
                    construction,
                    fields,
                    shape.construction(),
                    shape.fields()
                )));
            }
        }
        Member::Enum(_) => {}
        Member::Code(code) => {
            let arity = reader.read_varint()?;
            if arity != code.arity() as i64 {
                return Err(Error::shape_mismatch(format!(
                    "code {} takes {} arguments in the stream but {} here",
                    code.name(),
                    arity,
                    code.arity()
                )));
            }
        }
    }
    Ok(())
}

pub fn read_member(context: &mut ReadContext) -> Result<Member, Error> {
    let offset = context.reader.position();
    let tag = Tag::from_byte(context.reader.read_u8()?)?;
    match tag {
        Tag::BackRef => {
            let target = read_offset(&mut context.reader)?;
            context.memo.resolve_member(target)
        }
        Tag::MemberRef | Tag::MemberDef => {
            context.memo.begin(offset);
            let unit = read_unit(context)?;
            let kind = MemberKind::from_byte(context.reader.read_u8()?)?;
            let path = context.reader.read_string()?;
            let member = unit.member(kind, &path).ok_or_else(|| {
                Error::unknown_unit(format!("{} has no {:?} named '{}'", unit.id(), kind, path))
            })?;
            if tag == Tag::MemberRef {
                check_signature(&mut context.reader, &member)?;
            }
            context
                .memo
                .add_memo(offset, MemoEntry::Member(member.clone()))?;
            Ok(member)
        }
        other => Err(Error::format(format!(
            "{:?} at offset {} where a member was expected",
            other, offset
        ))),
    }
}

fn read_unit<'a>(context: &mut ReadContext<'a>) -> Result<Arc<Unit>, Error> {
    let offset = context.reader.position();
    let tag = Tag::from_byte(context.reader.read_u8()?)?;
    let unit = match tag {
        Tag::BackRef => {
            let target = read_offset(&mut context.reader)?;
            return context.memo.resolve_unit(target);
        }
        Tag::UnitRef => {
            context.memo.begin(offset);
            let name = context.reader.read_string()?;
            let version = context.reader.read_string()?;
            context
                .target_context()
                .resolve(&UnitId::new(name, version))?
        }
        Tag::UnitDef => {
            context.memo.begin(offset);
            let descriptor = UnitDescriptor::read(&mut context.reader)?;
            let statics = descriptor.statics.clone();
            let target = context.target_context();
            let unit = context
                .get_pickler()
                .get_provider()
                .materialize(descriptor, target)?;
            context.defer_load(unit.clone());
            tracing::debug!(unit = %unit.id(), "materialized unit from stream");

            let owner = unit.clone();
            let trailer: Trailer<ReadContext<'a>> = Box::new(move |context: &mut ReadContext<'a>| {
                for name in &statics {
                    let value = read_value(context)?;
                    owner.set_static(name, value)?;
                }
                Ok(())
            });
            let owner = unit.clone();
            let static_init: Trailer<ReadContext<'a>> = Box::new(move |context: &mut ReadContext<'a>| {
                if context.reader.read_bool()? {
                    owner.mark_initialized();
                }
                Ok(())
            });
            context.trailers().push_trailer(trailer, Some(static_init));
            unit
        }
        other => {
            return Err(Error::format(format!(
                "{:?} at offset {} where a unit was expected",
                other, offset
            )))
        }
    };
    context.memo.add_memo(offset, MemoEntry::Unit(unit.clone()))?;
    Ok(unit)
}
