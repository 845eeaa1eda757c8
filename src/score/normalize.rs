//! Bureau score normalization.
//!
//! Maps each raw reading onto the canonical `[300, 850]` scale:
//!
//! - Experian / TransUnion are native to `[300, 850]`: identity.
//! - Equifax is native to `[300, 900]`: `300 + (raw - 300) * 550 / 600`.
//!
//! Missing readings are imputed with the mean of the normalized readings that
//! are present. Readings outside their native range are rejected, never clamped.

use crate::domain::{Bureau, CANONICAL_RANGE, CustomerCreditProfile, NormalizedScore, NormalizedScores};
use crate::error::ScoreError;

/// Map one raw reading onto the canonical range.
pub fn normalize_raw(bureau: Bureau, raw: f64) -> Result<f64, ScoreError> {
    let native = bureau.native_range();
    if !native.contains(raw) {
        return Err(ScoreError::OutOfRangeInput {
            bureau,
            value: raw,
            min: native.min,
            max: native.max,
        });
    }

    if native == CANONICAL_RANGE {
        return Ok(raw);
    }

    Ok(CANONICAL_RANGE.min + (raw - native.min) * CANONICAL_RANGE.width() / native.width())
}

/// Normalize all three readings of a profile, imputing the missing ones.
pub fn normalize_profile(profile: &CustomerCreditProfile) -> Result<NormalizedScores, ScoreError> {
    let mut present = [None; 3];
    for (slot, bureau) in present.iter_mut().zip(Bureau::ALL) {
        if let Some(raw) = profile.reading(bureau) {
            *slot = Some(normalize_raw(bureau, raw)?);
        }
    }

    let values: Vec<f64> = present.iter().flatten().copied().collect();
    if values.is_empty() {
        return Err(ScoreError::InsufficientData);
    }
    let fill = values.iter().sum::<f64>() / values.len() as f64;

    let [experian, equifax, transunion] = present.map(|v| match v {
        Some(value) => NormalizedScore { value, imputed: false },
        None => NormalizedScore { value: fill, imputed: true },
    });

    Ok(NormalizedScores {
        experian,
        equifax,
        transunion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn equifax_endpoints_are_exact() {
        assert_eq!(normalize_raw(Bureau::Equifax, 300.0).unwrap(), 300.0);
        assert_eq!(normalize_raw(Bureau::Equifax, 900.0).unwrap(), 850.0);
        // 780 → 300 + 480 * 550 / 600 = 740
        assert!((normalize_raw(Bureau::Equifax, 780.0).unwrap() - 740.0).abs() < 1e-9);
    }

    #[test]
    fn native_canonical_bureaus_pass_through() {
        assert_eq!(normalize_raw(Bureau::Experian, 712.0).unwrap(), 712.0);
        assert_eq!(normalize_raw(Bureau::TransUnion, 300.0).unwrap(), 300.0);
        assert_eq!(normalize_raw(Bureau::TransUnion, 850.0).unwrap(), 850.0);
    }

    #[test]
    fn out_of_range_equifax_is_rejected() {
        for raw in [950.0, 250.0] {
            let err = normalize_raw(Bureau::Equifax, raw).unwrap_err();
            assert_eq!(
                err,
                ScoreError::OutOfRangeInput {
                    bureau: Bureau::Equifax,
                    value: raw,
                    min: 300.0,
                    max: 900.0,
                }
            );
        }
    }

    #[test]
    fn experian_above_850_is_rejected() {
        let err = normalize_raw(Bureau::Experian, 851.0).unwrap_err();
        assert!(matches!(err, ScoreError::OutOfRangeInput { bureau: Bureau::Experian, .. }));
        assert!(normalize_raw(Bureau::Experian, f64::NAN).is_err());
    }

    #[test]
    fn missing_equifax_is_mean_of_present() {
        let profile = CustomerCreditProfile::new("C1")
            .with_reading(Bureau::Experian, Some(750.0))
            .with_reading(Bureau::TransUnion, Some(730.0));
        let n = normalize_profile(&profile).unwrap();
        assert_eq!(n.equifax, NormalizedScore { value: 740.0, imputed: true });
        assert!(!n.experian.imputed);
        assert!(!n.transunion.imputed);
    }

    #[test]
    fn imputation_uses_normalized_not_raw_values() {
        // Equifax 900 normalizes to 850; the two missing bureaus get 850, not 900.
        let profile = CustomerCreditProfile::new("C2").with_reading(Bureau::Equifax, Some(900.0));
        let n = normalize_profile(&profile).unwrap();
        assert_eq!(n.experian.value, 850.0);
        assert_eq!(n.transunion.value, 850.0);
        assert!(n.experian.imputed && n.transunion.imputed);
    }

    #[test]
    fn all_missing_is_insufficient_data() {
        let profile = CustomerCreditProfile::new("C3");
        assert_eq!(normalize_profile(&profile).unwrap_err(), ScoreError::InsufficientData);
    }

    #[test]
    fn out_of_range_reading_fails_before_imputation() {
        let profile = CustomerCreditProfile::new("C4")
            .with_reading(Bureau::Experian, Some(700.0))
            .with_reading(Bureau::Equifax, Some(950.0));
        assert!(matches!(
            normalize_profile(&profile),
            Err(ScoreError::OutOfRangeInput { bureau: Bureau::Equifax, .. })
        ));
    }

    proptest! {
        #[test]
        fn equifax_rescale_is_monotonic_and_in_range(a in 300.0f64..=900.0, b in 300.0f64..=900.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let n_lo = normalize_raw(Bureau::Equifax, lo).unwrap();
            let n_hi = normalize_raw(Bureau::Equifax, hi).unwrap();
            prop_assert!(n_lo <= n_hi);
            prop_assert!(n_lo >= 300.0 && n_hi <= 850.0);
        }
    }
}
