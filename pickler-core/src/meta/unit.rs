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

//! Logical units of code and the definitions they own.
//!
//! A [`Unit`] is the Rust stand-in for an assembly or module: it has a
//! name/version identity, owns record shapes, enum shapes, code and static
//! cells, and persists across many pickling calls inside a
//! [`UnitContext`](crate::meta::context::UnitContext). Every definition holds
//! a weak back pointer to its unit so the pickler can consult the policy for
//! the unit a value belongs to.

use crate::error::Error;
use crate::meta::descriptor::UnitDescriptor;
use crate::types::{FieldType, IntKind, MemberKind};
use crate::value::{ObjectId, Value};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Name plus version qualifier of a unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId {
    name: String,
    version: String,
}

impl UnitId {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> UnitId {
        UnitId {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The identity string used in diagnostics, e.g. `geometry, Version=1.0`.
    pub fn full_name(&self) -> String {
        format!("{}, Version={}", self.name, self.version)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Version={}", self.name, self.version)
    }
}

/// Where a live unit came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitOrigin {
    /// Registered by the host; other processes can resolve it by name.
    Static,
    /// Materialized from a pickle; only this process knows it.
    Dynamic,
}

/// How a record is rebuilt on read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Construction {
    /// Allocate with null fields, register, then assign fields. Cycles allowed.
    Fields = 0,
    /// All field values are passed to a constructor. Registered only once
    /// built, so a cycle back into the record cannot be represented.
    Constructor = 1,
}

impl Construction {
    pub fn from_byte(byte: u8) -> Result<Construction, Error> {
        match byte {
            0 => Ok(Construction::Fields),
            1 => Ok(Construction::Constructor),
            other => Err(Error::format(format!("unknown construction {}", other))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldDef {
    pub name: String,
    pub ty: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: FieldType) -> FieldDef {
        FieldDef {
            name: name.into(),
            ty,
        }
    }

    pub fn any(name: impl Into<String>) -> FieldDef {
        FieldDef::new(name, FieldType::Any)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
    pub construction: Construction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumDef {
    pub name: String,
    pub underlying: IntKind,
    pub variants: Vec<(String, i64)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodeBody {
    /// Opaque instructions carried verbatim.
    Bytecode(Vec<u8>),
    /// A host function looked up by symbol in a native registry.
    Native(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeDef {
    pub name: String,
    pub arity: u32,
    pub body: CodeBody,
}

/// Host function signature: captured environment, then call arguments.
pub type NativeFn = fn(&[Value], &[Value]) -> Result<Value, Error>;

pub struct RecordShape {
    def: RecordDef,
    unit: Weak<Unit>,
}

impl RecordShape {
    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.def.fields
    }

    pub fn construction(&self) -> Construction {
        self.def.construction
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.def.fields.iter().position(|f| f.name == name)
    }

    pub fn unit(&self) -> Result<Arc<Unit>, Error> {
        upgrade_owner(&self.unit, &self.def.name)
    }
}

impl fmt::Debug for RecordShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordShape")
            .field("name", &self.def.name)
            .field("fields", &self.def.fields)
            .field("construction", &self.def.construction)
            .finish()
    }
}

pub struct EnumShape {
    def: EnumDef,
    unit: Weak<Unit>,
}

impl EnumShape {
    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn underlying(&self) -> IntKind {
        self.def.underlying
    }

    pub fn variants(&self) -> &[(String, i64)] {
        &self.def.variants
    }

    pub fn value_of(&self, variant: &str) -> Option<i64> {
        self.def
            .variants
            .iter()
            .find(|(name, _)| name == variant)
            .map(|(_, v)| *v)
    }

    pub fn variant_name(&self, value: i64) -> Option<&str> {
        self.def
            .variants
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(name, _)| name.as_str())
    }

    pub fn unit(&self) -> Result<Arc<Unit>, Error> {
        upgrade_owner(&self.unit, &self.def.name)
    }
}

impl fmt::Debug for EnumShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumShape")
            .field("name", &self.def.name)
            .field("underlying", &self.def.underlying)
            .finish()
    }
}

pub struct Code {
    def: CodeDef,
    native: Option<NativeFn>,
    unit: Weak<Unit>,
}

impl Code {
    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn arity(&self) -> u32 {
        self.def.arity
    }

    pub fn body(&self) -> &CodeBody {
        &self.def.body
    }

    pub fn unit(&self) -> Result<Arc<Unit>, Error> {
        upgrade_owner(&self.unit, &self.def.name)
    }

    /// Runs a native body. Bytecode bodies are data only in this host.
    pub fn call(&self, env: &[Value], args: &[Value]) -> Result<Value, Error> {
        if args.len() != self.def.arity as usize {
            return Err(Error::shape_mismatch(format!(
                "{} takes {} arguments, got {}",
                self.def.name,
                self.def.arity,
                args.len()
            )));
        }
        match self.native {
            Some(f) => f(env, args),
            None => Err(Error::not_supported(format!(
                "{} has no native body to execute",
                self.def.name
            ))),
        }
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Code")
            .field("name", &self.def.name)
            .field("arity", &self.def.arity)
            .field("body", &self.def.body)
            .finish()
    }
}

fn upgrade_owner(unit: &Weak<Unit>, member: &str) -> Result<Arc<Unit>, Error> {
    unit.upgrade().ok_or_else(|| {
        Error::unknown_unit(format!("the unit owning '{}' has been dropped", member))
    })
}

/// A shape or code object that can be named inside its unit.
#[derive(Clone, Debug)]
pub enum Member {
    Record(Arc<RecordShape>),
    Enum(Arc<EnumShape>),
    Code(Arc<Code>),
}

impl Member {
    pub fn kind(&self) -> MemberKind {
        match self {
            Member::Record(_) => MemberKind::Record,
            Member::Enum(_) => MemberKind::Enum,
            Member::Code(_) => MemberKind::Code,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Member::Record(shape) => shape.name(),
            Member::Enum(shape) => shape.name(),
            Member::Code(code) => code.name(),
        }
    }

    pub fn unit(&self) -> Result<Arc<Unit>, Error> {
        match self {
            Member::Record(shape) => shape.unit(),
            Member::Enum(shape) => shape.unit(),
            Member::Code(code) => code.unit(),
        }
    }

    pub fn object_id(&self) -> ObjectId {
        match self {
            Member::Record(shape) => ObjectId::of_arc(shape),
            Member::Enum(shape) => ObjectId::of_arc(shape),
            Member::Code(code) => ObjectId::of_arc(code),
        }
    }
}

pub struct StaticCell {
    name: String,
    value: RwLock<Value>,
}

impl StaticCell {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self) -> Value {
        self.value.read().clone()
    }

    pub fn set(&self, value: Value) {
        *self.value.write() = value;
    }
}

pub struct Unit {
    id: UnitId,
    origin: UnitOrigin,
    records: Vec<Arc<RecordShape>>,
    enums: Vec<Arc<EnumShape>>,
    code: Vec<Arc<Code>>,
    statics: Vec<StaticCell>,
    initialized: AtomicBool,
}

impl Unit {
    pub fn builder(name: impl Into<String>, version: impl Into<String>) -> UnitBuilder {
        UnitBuilder::new(UnitId::new(name, version))
    }

    pub fn id(&self) -> &UnitId {
        &self.id
    }

    pub fn origin(&self) -> UnitOrigin {
        self.origin
    }

    pub fn records(&self) -> &[Arc<RecordShape>] {
        &self.records
    }

    pub fn enums(&self) -> &[Arc<EnumShape>] {
        &self.enums
    }

    pub fn code(&self) -> &[Arc<Code>] {
        &self.code
    }

    pub fn statics(&self) -> &[StaticCell] {
        &self.statics
    }

    pub fn record(&self, name: &str) -> Option<Arc<RecordShape>> {
        self.records.iter().find(|s| s.name() == name).cloned()
    }

    pub fn enum_shape(&self, name: &str) -> Option<Arc<EnumShape>> {
        self.enums.iter().find(|s| s.name() == name).cloned()
    }

    pub fn function(&self, name: &str) -> Option<Arc<Code>> {
        self.code.iter().find(|c| c.name() == name).cloned()
    }

    pub fn member(&self, kind: MemberKind, path: &str) -> Option<Member> {
        match kind {
            MemberKind::Record => self.record(path).map(Member::Record),
            MemberKind::Enum => self.enum_shape(path).map(Member::Enum),
            MemberKind::Code => self.function(path).map(Member::Code),
        }
    }

    pub fn static_cell(&self, name: &str) -> Option<&StaticCell> {
        self.statics.iter().find(|c| c.name == name)
    }

    pub fn static_value(&self, name: &str) -> Option<Value> {
        self.static_cell(name).map(StaticCell::get)
    }

    pub fn set_static(&self, name: &str, value: Value) -> Result<(), Error> {
        let cell = self.static_cell(name).ok_or_else(|| {
            Error::unknown_unit(format!("{} has no static '{}'", self.id, name))
        })?;
        cell.set(value);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Marks the static initializer as run. Returns false if it already was.
    pub fn mark_initialized(&self) -> bool {
        !self.initialized.swap(true, Ordering::AcqRel)
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("id", &self.id)
            .field("origin", &self.origin)
            .field("records", &self.records.len())
            .field("enums", &self.enums.len())
            .field("code", &self.code.len())
            .field("statics", &self.statics.len())
            .finish()
    }
}

/// Collects definitions and builds an immutable [`Unit`].
///
/// ```
/// use pickler_core::meta::unit::{Construction, FieldDef, Unit};
/// use pickler_core::types::IntKind;
///
/// let unit = Unit::builder("geometry", "1.0")
///     .record("Point", vec![FieldDef::any("x"), FieldDef::any("y")], Construction::Fields)
///     .enumeration("Color", IntKind::U8, vec![("Red".into(), 0), ("Blue".into(), 1)])
///     .build()
///     .unwrap();
/// assert!(unit.record("Point").is_some());
/// ```
pub struct UnitBuilder {
    id: UnitId,
    origin: UnitOrigin,
    records: Vec<RecordDef>,
    enums: Vec<EnumDef>,
    code: Vec<CodeDef>,
    natives: HashMap<String, NativeFn>,
    statics: Vec<(String, Value)>,
    initialized: bool,
}

impl UnitBuilder {
    pub fn new(id: UnitId) -> UnitBuilder {
        UnitBuilder {
            id,
            origin: UnitOrigin::Static,
            records: Vec::new(),
            enums: Vec::new(),
            code: Vec::new(),
            natives: HashMap::new(),
            statics: Vec::new(),
            initialized: false,
        }
    }

    pub fn origin(mut self, origin: UnitOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn record(
        mut self,
        name: impl Into<String>,
        fields: Vec<FieldDef>,
        construction: Construction,
    ) -> Self {
        self.records.push(RecordDef {
            name: name.into(),
            fields,
            construction,
        });
        self
    }

    pub fn enumeration(
        mut self,
        name: impl Into<String>,
        underlying: IntKind,
        variants: Vec<(String, i64)>,
    ) -> Self {
        self.enums.push(EnumDef {
            name: name.into(),
            underlying,
            variants,
        });
        self
    }

    pub fn bytecode(mut self, name: impl Into<String>, arity: u32, bytes: Vec<u8>) -> Self {
        self.code.push(CodeDef {
            name: name.into(),
            arity,
            body: CodeBody::Bytecode(bytes),
        });
        self
    }

    pub fn native(
        mut self,
        name: impl Into<String>,
        arity: u32,
        symbol: impl Into<String>,
        f: NativeFn,
    ) -> Self {
        let symbol = symbol.into();
        self.natives.insert(symbol.clone(), f);
        self.code.push(CodeDef {
            name: name.into(),
            arity,
            body: CodeBody::Native(symbol),
        });
        self
    }

    pub fn static_cell(mut self, name: impl Into<String>, value: Value) -> Self {
        self.statics.push((name.into(), value));
        self
    }

    pub fn initialized(mut self, initialized: bool) -> Self {
        self.initialized = initialized;
        self
    }

    /// Starts a dynamic unit from a structural descriptor. Native bodies are
    /// resolved through `natives`; an unknown symbol fails the build.
    pub fn from_descriptor(
        descriptor: UnitDescriptor,
        natives: &HashMap<String, NativeFn>,
    ) -> Result<UnitBuilder, Error> {
        let mut builder = UnitBuilder::new(descriptor.id).origin(UnitOrigin::Dynamic);
        builder.records = descriptor.records;
        builder.enums = descriptor.enums;
        for def in &descriptor.code {
            if let CodeBody::Native(symbol) = &def.body {
                let f = natives.get(symbol).ok_or_else(|| {
                    Error::unsupported_type(format!(
                        "native symbol '{}' of {} is not registered in this process",
                        symbol, def.name
                    ))
                })?;
                builder.natives.insert(symbol.clone(), *f);
            }
        }
        builder.code = descriptor.code;
        builder.statics = descriptor
            .statics
            .into_iter()
            .map(|name| (name, Value::Null))
            .collect();
        Ok(builder)
    }

    pub fn build(self) -> Result<Arc<Unit>, Error> {
        check_definitions(
            &self.id,
            &self.records,
            &self.enums,
            &self.code,
            self.statics.iter().map(|(name, _)| name),
        )
        .map_err(Error::config)?;

        let UnitBuilder {
            id,
            origin,
            records,
            enums,
            code,
            natives,
            statics,
            initialized,
        } = self;
        Ok(Arc::new_cyclic(|weak: &Weak<Unit>| Unit {
            id,
            origin,
            records: records
                .into_iter()
                .map(|def| {
                    Arc::new(RecordShape {
                        def,
                        unit: weak.clone(),
                    })
                })
                .collect(),
            enums: enums
                .into_iter()
                .map(|def| {
                    Arc::new(EnumShape {
                        def,
                        unit: weak.clone(),
                    })
                })
                .collect(),
            code: code
                .into_iter()
                .map(|def| {
                    let native = match &def.body {
                        CodeBody::Native(symbol) => natives.get(symbol).copied(),
                        CodeBody::Bytecode(_) => None,
                    };
                    Arc::new(Code {
                        def,
                        native,
                        unit: weak.clone(),
                    })
                })
                .collect(),
            statics: statics
                .into_iter()
                .map(|(name, value)| StaticCell {
                    name,
                    value: RwLock::new(value),
                })
                .collect(),
            initialized: AtomicBool::new(initialized),
        }))
    }
}

/// Names are unique per kind and enum variants fit their underlying width.
pub(crate) fn check_definitions<'a>(
    unit: &UnitId,
    records: &[RecordDef],
    enums: &[EnumDef],
    code: &[CodeDef],
    statics: impl Iterator<Item = &'a String>,
) -> Result<(), String> {
    check_unique(unit, "record", records.iter().map(|d| &d.name))?;
    check_unique(unit, "enum", enums.iter().map(|d| &d.name))?;
    check_unique(unit, "code", code.iter().map(|d| &d.name))?;
    check_unique(unit, "static", statics)?;
    for record in records {
        check_unique(unit, "field", record.fields.iter().map(|f| &f.name))?;
    }
    for def in enums {
        if let Some((name, value)) = def
            .variants
            .iter()
            .find(|(_, v)| !def.underlying.contains(*v))
        {
            return Err(format!(
                "{}::{}::{} = {} does not fit {:?}",
                unit, def.name, name, value, def.underlying
            ));
        }
    }
    Ok(())
}

fn check_unique<'a>(
    unit: &UnitId,
    what: &str,
    names: impl Iterator<Item = &'a String>,
) -> Result<(), String> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(format!("{} defines {} '{}' twice", unit, what, name));
        }
    }
    Ok(())
}

impl RecordShape {
    pub(crate) fn def(&self) -> &RecordDef {
        &self.def
    }
}

impl EnumShape {
    pub(crate) fn def(&self) -> &EnumDef {
        &self.def
    }
}

impl Code {
    pub(crate) fn def(&self) -> &CodeDef {
        &self.def
    }
}
