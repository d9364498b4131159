use serde_json::Value;

/// Coerces a raw score into a finite number.
///
/// JSON numbers are taken as-is and strings are parsed after trimming.
/// Anything else, including `NaN` and infinities, yields `None`.
pub fn coerce_score(raw: &Value) -> Option<f64> {
    let score = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    score.is_finite().then_some(score)
}

/// Rounds `value` half away from zero to `places` decimal places.
///
/// A result of zero is always `+0.0`, so rounded values that compare equal
/// also sort equal under `f64::total_cmp`. Values too large to scale are
/// returned unchanged.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    // Adding +0.0 turns -0.0 into +0.0 and leaves every other value alone.
    scaled.round() / factor + 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_numbers() {
        assert_eq!(coerce_score(&json!(8)), Some(8.0));
        assert_eq!(coerce_score(&json!(-2)), Some(-2.0));
        assert_eq!(coerce_score(&json!(7.25)), Some(7.25));
    }

    #[test]
    fn test_coerce_numeric_strings() {
        assert_eq!(coerce_score(&json!("9")), Some(9.0));
        assert_eq!(coerce_score(&json!(" 4.5 ")), Some(4.5));
    }

    #[test]
    fn test_coerce_rejects_non_numeric() {
        assert_eq!(coerce_score(&json!("abc")), None);
        assert_eq!(coerce_score(&json!("")), None);
        assert_eq!(coerce_score(&json!(null)), None);
        assert_eq!(coerce_score(&json!(true)), None);
        assert_eq!(coerce_score(&json!([1])), None);
        assert_eq!(coerce_score(&json!({"value": 1})), None);
    }

    #[test]
    fn test_coerce_rejects_non_finite_strings() {
        assert_eq!(coerce_score(&json!("NaN")), None);
        assert_eq!(coerce_score(&json!("inf")), None);
        assert_eq!(coerce_score(&json!("-infinity")), None);
    }

    #[test]
    fn test_round_to_three_places() {
        assert_eq!(round_to(8.0, 3), 8.0);
        assert_eq!(round_to(2.0 / 3.0, 3), 0.667);
        assert_eq!(round_to(10.0 / 3.0, 3), 3.333);
        assert_eq!(round_to(-1.23456, 3), -1.235);
    }

    #[test]
    fn test_round_to_small_negative_is_positive_zero() {
        let rounded = round_to(-0.0001, 3);
        assert_eq!(rounded, 0.0);
        assert!(rounded.is_sign_positive());
        assert!(round_to(-0.0, 3).is_sign_positive());
    }

    #[test]
    fn test_round_to_keeps_values_too_large_to_scale() {
        assert_eq!(round_to(1e306, 3), 1e306);
        assert_eq!(round_to(-f64::MAX, 3), -f64::MAX);
    }
}
