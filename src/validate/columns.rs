//! Schema check (code `20`): required and optional attribute columns.

use crate::config::step;
use crate::diagnostics::{CheckOutcome, Ledger, ProcessTrail, TemplateArgs, code};
use crate::feature::FeatureProfile;
use crate::topology::MapSource;
use crate::Result;
use super::names::outcome;

/// Check that `map_name` carries the profile's columns.
///
/// A missing `main_field` is an error, a missing `limit_field` a warning.
/// `failed` in the outcome only reflects errors, so a map missing just its
/// optional column is still usable.
pub fn check_columns<S: MapSource + ?Sized>(
    source: &S,
    map_name: &str,
    profile: &FeatureProfile,
    ledger: &mut Ledger,
    trail: &mut ProcessTrail,
) -> Result<CheckOutcome> {
    let present = source.columns(map_name)?;
    let has = |c: &str| present.iter().any(|p| p == c);

    let mut fields: Vec<(&str, bool)> = vec![(profile.main_field.as_str(), true)];
    if let Some(limit) = profile.limit_field.as_deref() {
        fields.push((limit, false));
    }

    let mut map_failed = false;
    for (field, required) in fields {
        let missing = !has(field);
        if missing {
            let msg = if required {
                format!("Map [{map_name}] lacks the required column: [{field}].")
            } else {
                format!("Map [{map_name}] lacks the column [{field}] (its values are ignored during processing).")
            };
            ledger.append_once(msg, &profile.feature_type, !required, code::SCHEMA);
            map_failed |= required;
        }
        trail.log_step(
            step::CHECK_BASIC_COLUMNS,
            missing,
            &TemplateArgs::new().arg("map_name", map_name).arg("columns", field),
        );
    }

    let mut out = outcome(ledger, &profile.feature_type, code::SCHEMA);
    out.failed = map_failed;
    Ok(out)
}
