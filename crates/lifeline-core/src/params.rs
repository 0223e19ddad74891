use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Call/return arguments: positional values followed by keyword values.
///
/// Keyword order is the insertion order; setting an existing keyword replaces its value in
/// place. Equality is ordered on both parts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Params {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    args: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    kwargs: IndexMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.args.push(value.to_string());
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.kwargs.insert(key.into(), value.to_string());
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn kwargs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.kwargs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }
}

impl PartialEq for Params {
    fn eq(&self, other: &Self) -> bool {
        self.args == other.args && self.kwargs.iter().eq(other.kwargs.iter())
    }
}

impl Eq for Params {}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arg in &self.args {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            f.write_str(arg)?;
        }
        for (k, v) in &self.kwargs {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

/// Builds [`Params`](crate::Params): positional values, then `;` and `key = value` pairs.
///
/// ```
/// use lifeline_core::params;
///
/// let p = params!("a", 2; x = 1, y = "z");
/// assert_eq!(p.to_string(), "a, 2, x=1, y=z");
/// assert!(params!().is_empty());
/// ```
#[macro_export]
macro_rules! params {
    ($($arg:expr),* $(,)? $(; $($key:ident = $value:expr),* $(,)?)?) => {{
        #[allow(unused_mut)]
        let mut p = $crate::Params::new();
        $(p = p.arg($arg);)*
        $($(p = p.kwarg(stringify!($key), $value);)*)?
        p
    }};
}
