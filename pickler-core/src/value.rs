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

//! The dynamic object model that the pickler walks.
//!
//! Scalars and enum values are plain values. Everything else is behind an
//! [`Arc`], and the address of that allocation is the object's identity: two
//! [`Value`]s holding clones of the same `Arc` are the same object, and a
//! pickle round-trip preserves that.

use crate::error::Error;
use crate::meta::unit::{Code, Construction, EnumShape, RecordShape};
use crate::types::{ElementType, FieldType, PrimitiveKind};
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

pub type ArrayRef = Arc<RwLock<Array>>;
pub type RecordRef = Arc<RwLock<Record>>;
pub type FunctionRef = Arc<Function>;

/// Address of a shared allocation, stable while the allocation is alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

impl ObjectId {
    pub fn of_arc<T: ?Sized>(arc: &Arc<T>) -> ObjectId {
        ObjectId(Arc::as_ptr(arc) as *const () as usize)
    }
}

#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    Str(Arc<str>),
    Enum(EnumValue),
    Boxed(Arc<Value>),
    Array(ArrayRef),
    Tuple(Arc<Tuple>),
    Record(RecordRef),
    Function(FunctionRef),
    /// A raw address. Never picklable.
    Pointer(usize),
    /// An OS or runtime resource. Never picklable.
    Handle(NativeHandle),
}

impl Value {
    pub fn str(s: &str) -> Value {
        Value::Str(Arc::from(s))
    }

    /// Boxes a scalar or enum value so it gains an identity.
    pub fn boxed(inner: Value) -> Result<Value, Error> {
        if inner.primitive_kind().is_none() && !matches!(inner, Value::Enum(_)) {
            return Err(Error::unsupported_type(format!(
                "only scalars and enum values can be boxed, got {}",
                inner.kind_name()
            )));
        }
        Ok(Value::Boxed(Arc::new(inner)))
    }

    pub fn array(array: Array) -> Value {
        Value::Array(Arc::new(RwLock::new(array)))
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(Arc::new(Tuple::new(items)))
    }

    pub fn record(record: Record) -> Value {
        Value::Record(Arc::new(RwLock::new(record)))
    }

    pub fn function(code: Arc<Code>, env: Vec<Value>) -> Value {
        Value::Function(Arc::new(Function::new(code, env)))
    }

    /// The scalar kind of this value, if it is a scalar.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        let kind = match self {
            Value::Bool(_) => PrimitiveKind::Bool,
            Value::I8(_) => PrimitiveKind::I8,
            Value::U8(_) => PrimitiveKind::U8,
            Value::I16(_) => PrimitiveKind::I16,
            Value::U16(_) => PrimitiveKind::U16,
            Value::I32(_) => PrimitiveKind::I32,
            Value::U32(_) => PrimitiveKind::U32,
            Value::I64(_) => PrimitiveKind::I64,
            Value::U64(_) => PrimitiveKind::U64,
            Value::F32(_) => PrimitiveKind::F32,
            Value::F64(_) => PrimitiveKind::F64,
            Value::Char(_) => PrimitiveKind::Char,
            Value::Timestamp(_) => PrimitiveKind::Timestamp,
            Value::Date(_) => PrimitiveKind::Date,
            _ => return None,
        };
        Some(kind)
    }

    /// Zero value of a scalar kind, used to fill freshly allocated storage.
    pub fn default_of(kind: PrimitiveKind) -> Value {
        match kind {
            PrimitiveKind::Bool => Value::Bool(false),
            PrimitiveKind::I8 => Value::I8(0),
            PrimitiveKind::U8 => Value::U8(0),
            PrimitiveKind::I16 => Value::I16(0),
            PrimitiveKind::U16 => Value::U16(0),
            PrimitiveKind::I32 => Value::I32(0),
            PrimitiveKind::U32 => Value::U32(0),
            PrimitiveKind::I64 => Value::I64(0),
            PrimitiveKind::U64 => Value::U64(0),
            PrimitiveKind::F32 => Value::F32(0.0),
            PrimitiveKind::F64 => Value::F64(0.0),
            PrimitiveKind::Char => Value::Char('\0'),
            PrimitiveKind::Timestamp => Value::Timestamp(NaiveDateTime::default()),
            PrimitiveKind::Date => Value::Date(NaiveDate::default()),
        }
    }

    /// Identity of reference-typed values. Scalars and enum values have none.
    pub fn identity(&self) -> Option<ObjectId> {
        match self {
            Value::Str(s) => Some(ObjectId::of_arc(s)),
            Value::Boxed(b) => Some(ObjectId::of_arc(b)),
            Value::Array(a) => Some(ObjectId::of_arc(a)),
            Value::Tuple(t) => Some(ObjectId::of_arc(t)),
            Value::Record(r) => Some(ObjectId::of_arc(r)),
            Value::Function(f) => Some(ObjectId::of_arc(f)),
            _ => None,
        }
    }

    /// Returns true if both values are the same object.
    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        match (a.identity(), b.identity()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::U8(_) => "u8",
            Value::I16(_) => "i16",
            Value::U16(_) => "u16",
            Value::I32(_) => "i32",
            Value::U32(_) => "u32",
            Value::I64(_) => "i64",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Char(_) => "char",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
            Value::Str(_) => "string",
            Value::Enum(_) => "enum",
            Value::Boxed(_) => "box",
            Value::Array(_) => "array",
            Value::Tuple(_) => "tuple",
            Value::Record(_) => "record",
            Value::Function(_) => "function",
            Value::Pointer(_) => "pointer",
            Value::Handle(_) => "handle",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_boxed(&self) -> Option<&Arc<Value>> {
        match self {
            Value::Boxed(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&Arc<Tuple>> {
        match self {
            Value::Tuple(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordRef> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionRef> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }
}

/// Structural equality. Only terminates for acyclic values; the same object
/// compares equal to itself without being walked.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        if Value::ptr_eq(self, other) {
            return true;
        }
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Boxed(a), Value::Boxed(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => *a.read() == *b.read(),
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => *a.read() == *b.read(),
            (Value::Function(a), Value::Function(b)) => **a == **b,
            (Value::Pointer(a), Value::Pointer(b)) => a == b,
            (Value::Handle(a), Value::Handle(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Value {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::str(v)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeHandle {
    pub kind: String,
    pub raw: u64,
}

#[derive(Clone, Debug)]
pub struct EnumValue {
    shape: Arc<EnumShape>,
    value: i64,
}

impl EnumValue {
    pub fn new(shape: Arc<EnumShape>, value: i64) -> Result<EnumValue, Error> {
        if !shape.underlying().contains(value) {
            return Err(Error::shape_mismatch(format!(
                "{} does not fit the {:?} representation of {}",
                value,
                shape.underlying(),
                shape.name()
            )));
        }
        Ok(EnumValue { shape, value })
    }

    pub fn of(shape: Arc<EnumShape>, variant: &str) -> Result<EnumValue, Error> {
        let value = shape.value_of(variant).ok_or_else(|| {
            Error::shape_mismatch(format!("{} has no variant {}", shape.name(), variant))
        })?;
        Ok(EnumValue { shape, value })
    }

    pub fn shape(&self) -> &Arc<EnumShape> {
        &self.shape
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn variant(&self) -> Option<&str> {
        self.shape.variant_name(self.value)
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &EnumValue) -> bool {
        Arc::ptr_eq(&self.shape, &other.shape) && self.value == other.value
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimension {
    pub lower: i64,
    pub len: usize,
}

impl Dimension {
    pub fn new(lower: i64, len: usize) -> Dimension {
        Dimension { lower, len }
    }
}

/// A possibly multi-dimensional array stored in row-major order.
#[derive(Clone, PartialEq)]
pub struct Array {
    element: ElementType,
    dims: Vec<Dimension>,
    items: Vec<Value>,
}

impl Array {
    /// Allocates an array filled with the element type's zero value.
    pub fn new(element: ElementType, dims: Vec<Dimension>) -> Result<Array, Error> {
        let total = slot_count(&dims)?;
        let fill = match element {
            ElementType::Any => Value::Null,
            ElementType::Primitive(kind) => Value::default_of(kind),
        };
        Ok(Array {
            element,
            dims,
            items: vec![fill; total],
        })
    }

    /// An array with no storage yet. Elements are appended with
    /// [`Array::push_loaded`] until the returned slot count is reached, so a
    /// declared size is never allocated before its elements exist.
    pub(crate) fn unfilled(
        element: ElementType,
        dims: Vec<Dimension>,
    ) -> Result<(Array, usize), Error> {
        let total = slot_count(&dims)?;
        let array = Array {
            element,
            dims,
            items: Vec::with_capacity(total.min(PREALLOCATED_ITEMS)),
        };
        Ok((array, total))
    }

    pub(crate) fn push_loaded(&mut self, value: Value) -> Result<(), Error> {
        self.check_element(&value)?;
        self.items.push(value);
        Ok(())
    }

    /// A one-dimensional, zero-based array.
    pub fn vector(element: ElementType, items: Vec<Value>) -> Result<Array, Error> {
        let dims = vec![Dimension::new(0, items.len())];
        Array::from_items(element, dims, items)
    }

    pub fn from_items(
        element: ElementType,
        dims: Vec<Dimension>,
        items: Vec<Value>,
    ) -> Result<Array, Error> {
        let mut array = Array::new(element, dims)?;
        if items.len() != array.items.len() {
            return Err(Error::shape_mismatch(format!(
                "array of {} slots given {} items",
                array.items.len(),
                items.len()
            )));
        }
        for (index, item) in items.into_iter().enumerate() {
            array.set_flat(index, item)?;
        }
        Ok(array)
    }

    pub fn element(&self) -> ElementType {
        self.element
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Elements in row-major order.
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    fn flat_index(&self, indices: &[i64]) -> Option<usize> {
        if indices.len() != self.dims.len() {
            return None;
        }
        let mut flat = 0usize;
        for (index, dim) in indices.iter().zip(&self.dims) {
            let offset = index.checked_sub(dim.lower)?;
            let offset = usize::try_from(offset).ok()?;
            if offset >= dim.len {
                return None;
            }
            flat = flat * dim.len + offset;
        }
        Some(flat)
    }

    /// Element at `indices`, honoring each dimension's lower bound.
    pub fn get(&self, indices: &[i64]) -> Option<&Value> {
        self.flat_index(indices).map(|i| &self.items[i])
    }

    pub fn set(&mut self, indices: &[i64], value: Value) -> Result<(), Error> {
        let index = self.flat_index(indices).ok_or_else(|| {
            Error::shape_mismatch(format!("index {:?} outside {:?}", indices, self.dims))
        })?;
        self.set_flat(index, value)
    }

    pub fn set_flat(&mut self, index: usize, value: Value) -> Result<(), Error> {
        self.check_element(&value)?;
        let len = self.items.len();
        let slot = self.items.get_mut(index).ok_or_else(|| {
            Error::shape_mismatch(format!("flat index {} outside array of {}", index, len))
        })?;
        *slot = value;
        Ok(())
    }
}

impl Array {
    fn check_element(&self, value: &Value) -> Result<(), Error> {
        if let ElementType::Primitive(kind) = self.element {
            if value.primitive_kind() != Some(kind) {
                return Err(Error::shape_mismatch(format!(
                    "{:?} array cannot hold a {}",
                    kind,
                    value.kind_name()
                )));
            }
        }
        Ok(())
    }
}

/// Upper bound on storage reserved before any element has been read.
const PREALLOCATED_ITEMS: usize = 1024;

fn slot_count(dims: &[Dimension]) -> Result<usize, Error> {
    if dims.is_empty() {
        return Err(Error::shape_mismatch("an array needs at least one dimension"));
    }
    dims.iter()
        .try_fold(1usize, |acc, d| acc.checked_mul(d.len))
        .ok_or_else(|| Error::shape_mismatch("array size overflows usize"))
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("element", &self.element)
            .field("dims", &self.dims)
            .finish_non_exhaustive()
    }
}

/// An immutable positional group. Rebuilt only once all items are known.
#[derive(Clone, Debug, PartialEq)]
pub struct Tuple {
    items: Vec<Value>,
}

impl Tuple {
    pub fn new(items: Vec<Value>) -> Tuple {
        Tuple { items }
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn arity(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }
}

#[derive(Clone)]
pub struct Record {
    shape: Arc<RecordShape>,
    fields: Vec<Value>,
}

impl Record {
    /// A record whose fields hold their declared type's zero value.
    pub fn empty(shape: Arc<RecordShape>) -> Record {
        let fields = shape
            .fields()
            .iter()
            .map(|f| match f.ty {
                FieldType::Any => Value::Null,
                FieldType::Primitive(kind) => Value::default_of(kind),
            })
            .collect();
        Record { shape, fields }
    }

    pub fn new(shape: Arc<RecordShape>, fields: Vec<Value>) -> Result<Record, Error> {
        if fields.len() != shape.fields().len() {
            return Err(Error::shape_mismatch(format!(
                "{} has {} fields, got {} values",
                shape.name(),
                shape.fields().len(),
                fields.len()
            )));
        }
        let mut record = Record::empty(shape);
        for (index, value) in fields.into_iter().enumerate() {
            record.set_index(index, value)?;
        }
        Ok(record)
    }

    pub fn shape(&self) -> &Arc<RecordShape> {
        &self.shape
    }

    pub fn construction(&self) -> Construction {
        self.shape.construction()
    }

    /// Field values in declared order.
    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.shape.field_index(name).map(|i| &self.fields[i])
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<(), Error> {
        let index = self.shape.field_index(name).ok_or_else(|| {
            Error::shape_mismatch(format!("{} has no field {}", self.shape.name(), name))
        })?;
        self.set_index(index, value)
    }

    pub fn set_index(&mut self, index: usize, value: Value) -> Result<(), Error> {
        let field = self.shape.fields().get(index).ok_or_else(|| {
            Error::shape_mismatch(format!("{} has no field #{}", self.shape.name(), index))
        })?;
        if let FieldType::Primitive(kind) = field.ty {
            if value.primitive_kind() != Some(kind) {
                return Err(Error::shape_mismatch(format!(
                    "{}.{} is {:?}, got {}",
                    self.shape.name(),
                    field.name,
                    kind,
                    value.kind_name()
                )));
            }
        }
        self.fields[index] = value;
        Ok(())
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.shape, &other.shape) && self.fields == other.fields
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("shape", &self.shape.name())
            .finish_non_exhaustive()
    }
}

/// A closure: shared code plus the values it captured.
pub struct Function {
    code: Arc<Code>,
    env: RwLock<Vec<Value>>,
}

impl Function {
    pub fn new(code: Arc<Code>, env: Vec<Value>) -> Function {
        Function {
            code,
            env: RwLock::new(env),
        }
    }

    pub fn code(&self) -> &Arc<Code> {
        &self.code
    }

    /// Captured values in capture order.
    pub fn env(&self) -> Vec<Value> {
        self.env.read().clone()
    }

    pub fn set_env(&self, env: Vec<Value>) {
        *self.env.write() = env;
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, Error> {
        let env = self.env();
        self.code.call(&env, args)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.code, &other.code) && *self.env.read() == *other.env.read()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("code", &self.code.name())
            .finish_non_exhaustive()
    }
}
