use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// A permission codename and the bit that grants it.
///
/// `bitmask_idx` is counted from the least-significant (rightmost) end of
/// the decoded bitmask. It is kept signed so that a malformed catalog entry
/// is rejected at check time rather than silently wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDefinition {
    pub bitmask_idx: i64,
    pub codename: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
}

impl PermissionDefinition {
    pub fn new(bitmask_idx: i64, codename: impl Into<String>) -> Self {
        Self {
            bitmask_idx,
            codename: codename.into(),
            name: None,
            service: None,
        }
    }
}

/// Whether every requested permission must be granted, or just one.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AggregationPolicy {
    #[default]
    All,
    Any,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_parses_with_optional_fields_missing() {
        let def: PermissionDefinition =
            serde_json::from_str(r#"{"bitmask_idx": 3, "codename": "view_order"}"#).unwrap();
        assert_eq!(def, PermissionDefinition::new(3, "view_order"));
    }

    #[test]
    fn aggregation_parses_case_insensitively() {
        assert_eq!("ANY".parse::<AggregationPolicy>().unwrap(), AggregationPolicy::Any);
        assert_eq!(AggregationPolicy::All.as_ref(), "all");
        assert_eq!(AggregationPolicy::default(), AggregationPolicy::All);
    }
}
