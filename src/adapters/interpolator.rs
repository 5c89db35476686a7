// SPDX-License-Identifier: MIT OR Apache-2.0

//! `${key}` substitution.

use crate::domain::{ConfigError, Result};
use crate::ports::{Interpolator, Lookup};

const OPEN: &str = "${";
const CLOSE: char = '}';

/// Replaces `${key}` references with the referenced value, recursively.
///
/// References to unknown keys are kept verbatim unless the interpolator was
/// created with [`strict`](DefaultInterpolator::strict), in which case they
/// fail with [`ConfigError::MissingKey`]. A reference chain that revisits a
/// key fails with [`ConfigError::InterpolationCycle`].
///
/// # Examples
///
/// ```rust
/// use livecfg::adapters::DefaultInterpolator;
/// use livecfg::ports::Interpolator;
///
/// let lookup = |key: &str| match key {
///     "host" => Some("localhost".to_string()),
///     "port" => Some("80".to_string()),
///     "addr" => Some("${host}:${port}".to_string()),
///     _ => None,
/// };
///
/// let interpolator = DefaultInterpolator::new();
/// let url = interpolator.resolve("url", "http://${addr}/${path}", &lookup).unwrap();
/// assert_eq!(url, "http://localhost:80/${path}");
/// ```
#[derive(Clone, Debug, Default)]
pub struct DefaultInterpolator {
    strict: bool,
}

impl DefaultInterpolator {
    /// Leaves unresolved references in place.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails on unresolved references.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    fn substitute(
        &self,
        text: &str,
        lookup: Lookup<'_>,
        chain: &mut Vec<String>,
    ) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find(OPEN) {
            out.push_str(&rest[..start]);
            let after = &rest[start + OPEN.len()..];
            let Some(end) = after.find(CLOSE) else {
                // unterminated reference
                out.push_str(&rest[start..]);
                return Ok(out);
            };
            let name = &after[..end];

            match lookup(name) {
                Some(value) => {
                    let revisits = chain.iter().any(|seen| seen == name);
                    chain.push(name.to_string());
                    if revisits {
                        return Err(ConfigError::InterpolationCycle {
                            key: chain[0].clone(),
                            chain: chain.clone(),
                        });
                    }
                    let resolved = self.substitute(&value, lookup, chain)?;
                    chain.pop();
                    out.push_str(&resolved);
                }
                None if self.strict => {
                    return Err(ConfigError::MissingKey {
                        key: name.to_string(),
                    })
                }
                None => {
                    out.push_str(OPEN);
                    out.push_str(name);
                    out.push(CLOSE);
                }
            }

            rest = &after[end + CLOSE.len_utf8()..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

impl Interpolator for DefaultInterpolator {
    fn resolve(&self, key: &str, raw: &str, lookup: Lookup<'_>) -> Result<String> {
        if !raw.contains(OPEN) {
            return Ok(raw.to_string());
        }
        let mut chain = vec![key.to_string()];
        self.substitute(raw, lookup, &mut chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve_with(pairs: &[(&str, &str)], key: &str) -> Result<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let lookup = |name: &str| map.get(name).cloned();
        let raw = map.get(key).cloned().unwrap_or_default();
        DefaultInterpolator::new().resolve(key, &raw, &lookup)
    }

    #[test]
    fn test_plain_value_untouched() {
        assert_eq!(resolve_with(&[("a", "plain")], "a").unwrap(), "plain");
    }

    #[test]
    fn test_nested_references() {
        let pairs = [("a", "${b}-${c}"), ("b", "${c}"), ("c", "z")];
        assert_eq!(resolve_with(&pairs, "a").unwrap(), "z-z");
    }

    #[test]
    fn test_unresolved_left_in_place() {
        assert_eq!(resolve_with(&[("a", "x${nope}y")], "a").unwrap(), "x${nope}y");
    }

    #[test]
    fn test_unterminated_reference() {
        assert_eq!(resolve_with(&[("a", "x${b")], "a").unwrap(), "x${b");
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let err = resolve_with(&[("a", "${a}")], "a").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InterpolationCycle { ref chain, .. } if chain == &["a", "a"]
        ));
    }

    #[test]
    fn test_indirect_cycle() {
        let pairs = [("a", "${b}"), ("b", "${c}"), ("c", "${a}")];
        match resolve_with(&pairs, "a") {
            Err(ConfigError::InterpolationCycle { key, chain }) => {
                assert_eq!(key, "a");
                assert_eq!(chain, vec!["a", "b", "c", "a"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_repeated_reference_is_not_a_cycle() {
        let pairs = [("a", "${b}${b}"), ("b", "x")];
        assert_eq!(resolve_with(&pairs, "a").unwrap(), "xx");
    }

    #[test]
    fn test_strict_rejects_unresolved() {
        let lookup = |_: &str| -> Option<String> { None };
        let err = DefaultInterpolator::strict()
            .resolve("a", "${missing}", &lookup)
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { ref key } if key == "missing"));
    }
}
