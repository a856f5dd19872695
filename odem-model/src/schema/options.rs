use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Policy for saving or loading an item whose recorded changes would
/// conflict with its stored record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnUnsaved {
    /// Proceed silently.
    Ignore,
    /// Log a warning and proceed.
    Warn,
    /// Abort before any I/O.
    #[default]
    Fail,
}

impl FromStr for OnUnsaved {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(OnUnsaved::Ignore),
            "warn" => Ok(OnUnsaved::Warn),
            "fail" => Ok(OnUnsaved::Fail),
            _ => Err(format!("invalid onUnsaved policy: {s}")),
        }
    }
}

impl fmt::Display for OnUnsaved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OnUnsaved::Ignore => "ignore",
            OnUnsaved::Warn => "warn",
            OnUnsaved::Fail => "fail",
        })
    }
}

/// The `options` section of a schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelOptions {
    pub on_unsaved: Option<OnUnsaved>,
    /// Options without a meaning to the model compiler, kept for the host.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ModelOptions {
    pub fn merged(base: &Self, own: &Self) -> Self {
        let mut extra = base.extra.clone();
        extra.extend(own.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self {
            on_unsaved: own.on_unsaved.or(base.on_unsaved),
            extra,
        }
    }
}
