// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decoder trait definition.
//!
//! A [`Decoder`] turns a raw string into a typed value. The trait is
//! object-safe: it works on [`TypeId`]s and boxed [`Any`] values, and the
//! typed entry point [`decode`](trait.Decoder.html#method.decode) lives on
//! `dyn Decoder`.

use crate::domain::DecodeError;
use std::any::{type_name, Any, TypeId};

/// Converts raw configuration strings into typed values.
///
/// # Examples
///
/// ```rust
/// use livecfg::domain::DecodeError;
/// use livecfg::ports::Decoder;
/// use std::any::{Any, TypeId};
///
/// /// Decodes every `i32` as 42.
/// struct Always42;
///
/// impl Decoder for Always42 {
///     fn decode_any(
///         &self,
///         type_id: TypeId,
///         type_name: &'static str,
///         _raw: &str,
///     ) -> Result<Box<dyn Any + Send>, DecodeError> {
///         if type_id == TypeId::of::<i32>() {
///             Ok(Box::new(42i32))
///         } else {
///             Err(DecodeError::UnsupportedType { target_type: type_name })
///         }
///     }
/// }
///
/// let decoder: &dyn Decoder = &Always42;
/// assert_eq!(decoder.decode::<i32>("7").unwrap(), 42);
/// assert!(decoder.decode::<bool>("true").is_err());
/// ```
pub trait Decoder: Send + Sync {
    /// Decodes `raw` into a value of the type identified by `type_id`.
    ///
    /// The returned box must hold a value of exactly that type.
    fn decode_any(
        &self,
        type_id: TypeId,
        type_name: &'static str,
        raw: &str,
    ) -> Result<Box<dyn Any + Send>, DecodeError>;
}

impl dyn Decoder {
    /// Decodes `raw` into a `T`.
    pub fn decode<T: Any>(&self, raw: &str) -> Result<T, DecodeError> {
        let target_type = type_name::<T>();
        let boxed = self.decode_any(TypeId::of::<T>(), target_type, raw)?;
        boxed
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| DecodeError::UnsupportedType { target_type })
    }
}
