/// Converts a correlation coefficient into a strength label by magnitude.
///
/// | abs(r)      | Label       |
/// |-------------|-------------|
/// | >= 0.80     | very strong |
/// | >= 0.60     | strong      |
/// | >= 0.40     | moderate    |
/// | >= 0.20     | weak        |
/// | < 0.20      | negligible  |
pub fn strength(r: f64) -> &'static str {
    match r.abs() {
        a if a >= 0.80 => "very strong",
        a if a >= 0.60 => "strong",
        a if a >= 0.40 => "moderate",
        a if a >= 0.20 => "weak",
        _ => "negligible",
    }
}

/// `"positive"` or `"negative"`, for prose.
pub fn direction(r: f64) -> &'static str {
    if r < 0.0 { "negative" } else { "positive" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_boundaries() {
        assert_eq!(strength(1.00), "very strong");
        assert_eq!(strength(0.80), "very strong");
        assert_eq!(strength(0.79), "strong");
        assert_eq!(strength(0.60), "strong");
        assert_eq!(strength(0.59), "moderate");
        assert_eq!(strength(0.40), "moderate");
        assert_eq!(strength(0.39), "weak");
        assert_eq!(strength(0.20), "weak");
        assert_eq!(strength(0.19), "negligible");
        assert_eq!(strength(0.00), "negligible");
    }

    #[test]
    fn test_strength_uses_magnitude() {
        assert_eq!(strength(-0.85), "very strong");
        assert_eq!(strength(-0.1), "negligible");
        assert_eq!(direction(-0.85), "negative");
        assert_eq!(direction(0.3), "positive");
    }
}
