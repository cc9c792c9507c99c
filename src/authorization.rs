//! Permission checks against a token's bitmask.
//!
//! A token grants permissions through `permission_bitmask`, a base64 string
//! whose decoded bytes are read most-significant bit first and concatenated.
//! A permission's `bitmask_idx` counts from the *right* end of that string,
//! so index 0 is the last character.

use std::collections::{BTreeSet, HashMap};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{AuthError, Result};
use crate::models::{AggregationPolicy, Consumer, PermissionDefinition};
use crate::storage::PermissionCatalog;

/// Decides whether an authenticated consumer holds the requested permissions.
pub trait Authorization: Send + Sync {
    fn authorize(
        &self,
        consumer: &Consumer,
        permissions: &BTreeSet<String>,
        aggregation: AggregationPolicy,
        catalog: &PermissionCatalog,
    ) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BitmaskAuthorization;

impl BitmaskAuthorization {
    /// Decode standard padded base64 into a string of `'0'`/`'1'`, eight
    /// characters per byte.
    pub fn convert_base64_to_bitmask(encoded: &str) -> Result<String> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|_| AuthError::bad_encoding(format!("Bad base64-encoded `{encoded}`")))?;

        Ok(bytes.iter().map(|b| format!("{b:08b}")).collect())
    }

    /// Evaluate `permissions` against a decoded bitmask, a string of `'0'`
    /// and `'1'` as produced by [`Self::convert_base64_to_bitmask`].
    ///
    /// Under `All` the first unset bit denies; under `Any` the first set bit
    /// grants. A codename missing from `definitions`, or whose index does
    /// not fit the bitmask, fails with `BadBitmask` as soon as it is reached.
    /// So does a bitmask holding any other character.
    pub fn check_permissions(
        permissions: &BTreeSet<String>,
        aggregation: AggregationPolicy,
        bitmask: &str,
        definitions: &[PermissionDefinition],
    ) -> Result<()> {
        if permissions.is_empty() {
            return Ok(());
        }

        if !bitmask.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(AuthError::bad_bitmask(format!("Bad permission bitmask `{bitmask}`")));
        }

        let indices: HashMap<&str, i64> = definitions
            .iter()
            .map(|p| (p.codename.as_str(), p.bitmask_idx))
            .collect();
        let bits = bitmask.as_bytes();

        for codename in permissions {
            let position = indices
                .get(codename.as_str())
                .and_then(|&idx| usize::try_from(idx).ok())
                .filter(|&idx| idx < bits.len())
                .map(|idx| bits.len() - idx - 1)
                .ok_or_else(|| AuthError::bad_bitmask(format!("Bad permission bitmask `{bitmask}`")))?;

            let granted = bits[position] == b'1';
            match aggregation {
                AggregationPolicy::All if !granted => {
                    tracing::debug!("Permission `{}` is not granted", codename);
                    return Err(AuthError::permission_denied());
                }
                AggregationPolicy::Any if granted => return Ok(()),
                _ => {}
            }
        }

        match aggregation {
            AggregationPolicy::All => Ok(()),
            AggregationPolicy::Any => Err(AuthError::permission_denied()),
        }
    }
}

impl Authorization for BitmaskAuthorization {
    fn authorize(
        &self,
        consumer: &Consumer,
        permissions: &BTreeSet<String>,
        aggregation: AggregationPolicy,
        catalog: &PermissionCatalog,
    ) -> Result<()> {
        if permissions.is_empty() {
            return Ok(());
        }

        let bitmask = Self::convert_base64_to_bitmask(consumer.permission_bitmask())?;
        let definitions = catalog.get_permissions(Some(permissions))?;
        Self::check_permissions(permissions, aggregation, &bitmask, &definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;

    const BITMASK: &str = "111111111111111111111111111111110111111101111111";

    fn definitions() -> Vec<PermissionDefinition> {
        vec![
            PermissionDefinition::new(0, "view_order"),
            PermissionDefinition::new(6, "edit_order"),
            PermissionDefinition::new(7, "delete_tickettype"),
            PermissionDefinition::new(15, "delete_ticket"),
            PermissionDefinition::new(47, "view_report"),
            PermissionDefinition::new(48, "out_of_range"),
            PermissionDefinition::new(-1, "negative"),
        ]
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn check(names: &[&str], aggregation: AggregationPolicy) -> Result<()> {
        BitmaskAuthorization::check_permissions(&set(names), aggregation, BITMASK, &definitions())
    }

    #[test]
    fn decodes_fixture_bitmask() {
        assert_eq!(
            BitmaskAuthorization::convert_base64_to_bitmask("/////39/").unwrap(),
            BITMASK
        );
    }

    #[test]
    fn rejects_bad_padding() {
        let err = BitmaskAuthorization::convert_base64_to_bitmask("//39/").unwrap_err();
        assert_eq!(err.code, ErrorCode::BadEncoding);
        assert_eq!(err.message, "Bad base64-encoded `//39/`");
    }

    #[test]
    fn bitmask_reproduces_every_byte() {
        let bytes: Vec<u8> = (0..=255).collect();
        let bitmask = BitmaskAuthorization::convert_base64_to_bitmask(&STANDARD.encode(&bytes))
            .unwrap();

        assert_eq!(bitmask.len(), 8 * bytes.len());
        for (chunk, byte) in bitmask.as_bytes().chunks(8).zip(&bytes) {
            let chunk = std::str::from_utf8(chunk).unwrap();
            assert_eq!(u8::from_str_radix(chunk, 2).unwrap(), *byte);
        }
    }

    #[test]
    fn bit_index_counts_from_the_right() {
        // 0x01 0x00: only the last bit of the first byte is set, which is
        // index 8 counted from the right end.
        let bitmask = BitmaskAuthorization::convert_base64_to_bitmask(&STANDARD.encode([1u8, 0]))
            .unwrap();
        assert_eq!(bitmask, "0000000100000000");

        let defs = vec![
            PermissionDefinition::new(0, "low"),
            PermissionDefinition::new(8, "high"),
        ];
        let all = AggregationPolicy::All;
        assert!(BitmaskAuthorization::check_permissions(&set(&["high"]), all, &bitmask, &defs).is_ok());
        assert_eq!(
            BitmaskAuthorization::check_permissions(&set(&["low"]), all, &bitmask, &defs)
                .unwrap_err()
                .code,
            ErrorCode::PermissionDenied
        );
    }

    #[test]
    fn empty_request_is_vacuously_granted() {
        assert!(check(&[], AggregationPolicy::All).is_ok());
        assert!(check(&[], AggregationPolicy::Any).is_ok());
        assert!(
            BitmaskAuthorization::check_permissions(&set(&[]), AggregationPolicy::All, "", &[])
                .is_ok()
        );
    }

    #[test]
    fn all_requires_every_bit() {
        assert!(check(&["view_order"], AggregationPolicy::All).is_ok());
        assert!(check(&["view_order", "edit_order", "view_report"], AggregationPolicy::All).is_ok());

        let err = check(&["delete_tickettype"], AggregationPolicy::All).unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert_eq!(err.message, "Permission denied");

        let err = check(&["view_order", "delete_ticket"], AggregationPolicy::All).unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[test]
    fn any_requires_one_bit() {
        assert!(check(&["delete_tickettype", "view_order"], AggregationPolicy::Any).is_ok());

        let err = check(&["delete_tickettype", "delete_ticket"], AggregationPolicy::Any).unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[test]
    fn unknown_or_out_of_range_index_is_bad_bitmask() {
        for name in ["missing", "out_of_range", "negative"] {
            let err = check(&[name], AggregationPolicy::All).unwrap_err();
            assert_eq!(err.code, ErrorCode::BadBitmask, "{name}");
        }
    }

    #[test]
    fn non_binary_bitmask_is_bad_bitmask() {
        let defs = vec![PermissionDefinition::new(0, "view_order")];
        for bitmask in ["1121", "11é1", "1 1"] {
            let err = BitmaskAuthorization::check_permissions(
                &set(&["view_order"]),
                AggregationPolicy::Any,
                bitmask,
                &defs,
            )
            .unwrap_err();
            assert_eq!(err.code, ErrorCode::BadBitmask, "{bitmask}");
        }
    }

    #[test]
    fn any_short_circuits_before_later_bad_entries() {
        // "delete_ticket" < "missing" < "view_order" in iteration order; the
        // unknown codename is reached before the granted one.
        let err = check(&["delete_ticket", "missing", "view_order"], AggregationPolicy::Any)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadBitmask);

        // "edit_order" is granted and sorts before "missing".
        assert!(check(&["edit_order", "missing"], AggregationPolicy::Any).is_ok());
    }
}
