// SPDX-License-Identifier: MIT OR Apache-2.0

//! Default string-to-value decoder.
//!
//! [`DefaultDecoder`] knows the primitive numeric types, `bool`, `char`,
//! `String`, comma-separated `Vec<String>`, network addresses, paths and
//! millisecond [`Duration`]s. Further types can be added per instance with
//! [`DefaultDecoder::register`].

use crate::domain::{BoxError, DecodeError};
use crate::ports::Decoder;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

type ParseFn =
    Arc<dyn Fn(&str) -> std::result::Result<Box<dyn Any + Send>, BoxError> + Send + Sync>;

#[derive(Debug, Error)]
#[error("expected one of true, yes, on, false, no, off")]
struct InvalidBoolean;

fn parse_boolean(raw: &str) -> std::result::Result<bool, InvalidBoolean> {
    if ["true", "yes", "on"]
        .iter()
        .any(|t| raw.eq_ignore_ascii_case(t))
    {
        Ok(true)
    } else if ["false", "no", "off"]
        .iter()
        .any(|f| raw.eq_ignore_ascii_case(f))
    {
        Ok(false)
    } else {
        Err(InvalidBoolean)
    }
}

/// Splits on `,` and drops trailing empty items. An empty input yields one
/// empty item.
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    let mut items: Vec<String> = raw.split(',').map(str::to_string).collect();
    if raw.is_empty() {
        return items;
    }
    while matches!(items.last(), Some(last) if last.is_empty()) {
        items.pop();
    }
    items
}

fn entry<T, E, F>(parse: F) -> (TypeId, ParseFn)
where
    T: Any + Send,
    E: Into<BoxError>,
    F: Fn(&str) -> std::result::Result<T, E> + Send + Sync + 'static,
{
    let parse: ParseFn = Arc::new(move |raw: &str| {
        parse(raw)
            .map(|value| Box::new(value) as Box<dyn Any + Send>)
            .map_err(Into::into)
    });
    (TypeId::of::<T>(), parse)
}

fn from_str_entry<T>() -> (TypeId, ParseFn)
where
    T: FromStr + Any + Send,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    entry::<T, _, _>(T::from_str)
}

static BUILT_INS: Lazy<HashMap<TypeId, ParseFn>> = Lazy::new(|| {
    [
        from_str_entry::<i8>(),
        from_str_entry::<i16>(),
        from_str_entry::<i32>(),
        from_str_entry::<i64>(),
        from_str_entry::<i128>(),
        from_str_entry::<isize>(),
        from_str_entry::<u8>(),
        from_str_entry::<u16>(),
        from_str_entry::<u32>(),
        from_str_entry::<u64>(),
        from_str_entry::<u128>(),
        from_str_entry::<usize>(),
        from_str_entry::<f32>(),
        from_str_entry::<f64>(),
        from_str_entry::<char>(),
        from_str_entry::<IpAddr>(),
        from_str_entry::<Ipv4Addr>(),
        from_str_entry::<Ipv6Addr>(),
        from_str_entry::<SocketAddr>(),
        entry::<String, std::convert::Infallible, _>(|raw| Ok(raw.to_string())),
        entry::<PathBuf, std::convert::Infallible, _>(|raw| Ok(PathBuf::from(raw))),
        entry::<bool, _, _>(parse_boolean),
        entry::<Vec<String>, std::convert::Infallible, _>(|raw| Ok(split_list(raw))),
        entry::<Duration, _, _>(|raw| u64::from_str(raw).map(Duration::from_millis)),
    ]
    .into_iter()
    .collect()
});

/// The decoder every config starts with.
///
/// # Examples
///
/// ```rust
/// use livecfg::adapters::DefaultDecoder;
/// use livecfg::ports::Decoder;
/// use std::time::Duration;
///
/// #[derive(Debug, PartialEq)]
/// struct Level(u8);
///
/// let decoder = DefaultDecoder::new();
/// decoder.register(|raw: &str| raw.parse::<u8>().map(Level));
///
/// let decoder: &dyn Decoder = &decoder;
/// assert_eq!(decoder.decode::<bool>("on").unwrap(), true);
/// assert_eq!(decoder.decode::<Duration>("250").unwrap(), Duration::from_millis(250));
/// assert_eq!(decoder.decode::<Level>("3").unwrap(), Level(3));
/// ```
#[derive(Default)]
pub struct DefaultDecoder {
    custom: RwLock<HashMap<TypeId, ParseFn>>,
}

impl DefaultDecoder {
    /// Creates a decoder with only the built-in types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the parser for `T` on this decoder.
    pub fn register<T, E, F>(&self, parse: F)
    where
        T: Any + Send,
        E: Into<BoxError>,
        F: Fn(&str) -> std::result::Result<T, E> + Send + Sync + 'static,
    {
        let (type_id, parse) = entry::<T, E, F>(parse);
        self.custom.write().insert(type_id, parse);
    }

    /// Returns `true` if this decoder can produce a `T`.
    pub fn supports<T: Any>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.custom.read().contains_key(&type_id) || BUILT_INS.contains_key(&type_id)
    }

    fn parser(&self, type_id: TypeId) -> Option<ParseFn> {
        if let Some(parse) = self.custom.read().get(&type_id) {
            return Some(Arc::clone(parse));
        }
        BUILT_INS.get(&type_id).cloned()
    }
}

impl Decoder for DefaultDecoder {
    fn decode_any(
        &self,
        type_id: TypeId,
        type_name: &'static str,
        raw: &str,
    ) -> std::result::Result<Box<dyn Any + Send>, DecodeError> {
        let parse = self.parser(type_id).ok_or(DecodeError::UnsupportedType {
            target_type: type_name,
        })?;
        parse(raw).map_err(|source| DecodeError::Invalid {
            target_type: type_name,
            value: raw.to_string(),
            source,
        })
    }
}

impl fmt::Debug for DefaultDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultDecoder")
            .field("custom_types", &self.custom.read().len())
            .field("built_in_types", &BUILT_INS.len())
            .finish()
    }
}
