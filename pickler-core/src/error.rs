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

//! Error taxonomy for pickling and unpickling.
//!
//! Every failure is raised synchronously at the point it is detected and is
//! never retried. A failed call leaves its output in an unspecified state that
//! callers must discard.

use std::borrow::Cow;

use thiserror::Error;

/// Set PICKLER_PANIC_ON_ERROR at compile time to panic where an error is created.
pub const PANIC_ON_ERROR: bool = option_env!("PICKLER_PANIC_ON_ERROR").is_some();

#[inline(always)]
pub const fn should_panic_on_error() -> bool {
    PANIC_ON_ERROR
}

/// Error type for pickling and unpickling.
///
/// # Always use the static constructors
///
/// Build errors through [`Error::format`], [`Error::dangling_reference`] and
/// friends rather than the variants, so that `PICKLER_PANIC_ON_ERROR` can turn
/// any of them into a panic with a full backtrace:
///
/// ```bash
/// RUST_BACKTRACE=1 PICKLER_PANIC_ON_ERROR=1 cargo test
/// ```
///
/// ```rust
/// use pickler_core::error::Error;
///
/// let err = Error::format("truncated varint");
/// let err = Error::dangling_reference(42, "back-reference to an unregistered object");
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The value's shape can never be pickled (raw pointers, OS handles).
    ///
    /// Do not construct this variant directly; use [`Error::unsupported_type`] instead.
    #[error("unsupported type: {0}")]
    UnsupportedType(Cow<'static, str>),

    /// Malformed or corrupt bytes on read.
    ///
    /// Do not construct this variant directly; use [`Error::format`] instead.
    #[error("format error: {0}")]
    Format(Cow<'static, str>),

    /// A back-reference names an offset that is not registered.
    ///
    /// Do not construct this variant directly; use [`Error::dangling_reference`] instead.
    #[error("dangling reference to offset {offset}: {message}")]
    DanglingReference {
        offset: u64,
        message: Cow<'static, str>,
    },

    /// A by-name lookup matched more than one live unit.
    ///
    /// Do not construct this variant directly; use [`Error::ambiguous_reference`] instead.
    #[error("ambiguous reference to '{name}', candidates: {}", .candidates.join("; "))]
    AmbiguousReference {
        name: String,
        candidates: Vec<String>,
    },

    /// The shape recorded in the stream conflicts with the shape the reader expects.
    ///
    /// Do not construct this variant directly; use [`Error::shape_mismatch`] instead.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(Cow<'static, str>),

    /// The operation is not supported by this component (seeking a pickle stream).
    ///
    /// Do not construct this variant directly; use [`Error::not_supported`] instead.
    #[error("not supported: {0}")]
    NotSupported(Cow<'static, str>),

    /// A by-reference unit or member could not be found.
    ///
    /// Do not construct this variant directly; use [`Error::unknown_unit`] instead.
    #[error("unknown unit: {0}")]
    UnknownUnit(Cow<'static, str>),

    /// Invalid engine configuration, reported at construction time.
    ///
    /// Do not construct this variant directly; use [`Error::config`] instead.
    #[error("configuration error: {0}")]
    Config(Cow<'static, str>),

    /// The underlying sink or source failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a new [`Error::UnsupportedType`].
    ///
    /// ```
    /// use pickler_core::error::Error;
    ///
    /// let err = Error::unsupported_type("raw pointer 0x10");
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unsupported_type<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::UnsupportedType(s.into());
        if PANIC_ON_ERROR {
            panic!("PICKLER_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::Format`].
    ///
    /// ```
    /// use pickler_core::error::Error;
    ///
    /// let err = Error::format(format!("unknown tag {}", 0xEE));
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn format<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::Format(s.into());
        if PANIC_ON_ERROR {
            panic!("PICKLER_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::DanglingReference`] for the given stream offset.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn dangling_reference<S: Into<Cow<'static, str>>>(offset: u64, message: S) -> Self {
        let err = Error::DanglingReference {
            offset,
            message: message.into(),
        };
        if PANIC_ON_ERROR {
            panic!("PICKLER_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::AmbiguousReference`] listing every candidate's full identity.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn ambiguous_reference(name: impl Into<String>, candidates: Vec<String>) -> Self {
        let err = Error::AmbiguousReference {
            name: name.into(),
            candidates,
        };
        if PANIC_ON_ERROR {
            panic!("PICKLER_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::ShapeMismatch`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn shape_mismatch<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::ShapeMismatch(s.into());
        if PANIC_ON_ERROR {
            panic!("PICKLER_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::NotSupported`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn not_supported<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::NotSupported(s.into());
        if PANIC_ON_ERROR {
            panic!("PICKLER_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::UnknownUnit`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unknown_unit<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::UnknownUnit(s.into());
        if PANIC_ON_ERROR {
            panic!("PICKLER_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::Config`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn config<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::Config(s.into());
        if PANIC_ON_ERROR {
            panic!("PICKLER_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Maps a short read to [`Error::Format`]; other io failures stay [`Error::Io`].
    #[inline(never)]
    pub fn from_read(err: std::io::Error) -> Error {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::format("unexpected end of stream")
        } else {
            Error::Io(err)
        }
    }
}

/// Ensures a condition is true; otherwise returns the given [`enum@Error`].
///
/// ```
/// use pickler_core::ensure;
/// use pickler_core::error::Error;
///
/// fn check_rank(rank: i64) -> Result<(), Error> {
///     ensure!(rank > 0, Error::format("array rank must be positive"));
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}

/// Returns early with an [`Error::Format`].
///
/// ```
/// use pickler_core::bail;
/// use pickler_core::error::Error;
///
/// fn reject(tag: u8) -> Result<(), Error> {
///     bail!("unexpected tag {}", tag);
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($msg:literal) => {
        return Err($crate::error::Error::format($msg))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::format(format!($fmt, $($arg)*)))
    };
}
