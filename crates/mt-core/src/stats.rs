//! Small numeric and text helpers shared by the aggregation engines.

/// Arithmetic mean. `None` when `values` is empty.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    #[expect(
        clippy::cast_precision_loss,
        reason = "sample counts are far below f64's exact integer range"
    )]
    let count = values.len() as f64;
    Some(values.iter().sum::<f64>() / count)
}

/// Sample standard deviation (n - 1 denominator). Zero when fewer than two
/// values are present.
#[must_use]
pub fn std_deviation(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let Some(mean) = mean(values) else {
        return 0.0;
    };
    let sum_of_squares: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
    #[expect(
        clippy::cast_precision_loss,
        reason = "sample counts are far below f64's exact integer range"
    )]
    let denominator = (values.len() - 1) as f64;
    (sum_of_squares / denominator).sqrt()
}

/// Area of a trapezoid with parallel sides `a` and `b` and height `h`.
#[must_use]
pub fn trapezoid_area(a: f64, b: f64, h: f64) -> f64 {
    f64::midpoint(a, b) * h
}

/// Renders a duration in whole seconds as `M:SS`.
#[must_use]
pub fn format_seconds(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Splits a description into whitespace-delimited words, title-cased so
/// casing variants count as the same word.
#[must_use]
pub fn normalized_words(description: &str) -> Vec<String> {
    description
        .split_whitespace()
        .filter_map(|word| {
            let mut chars = word.chars();
            let first = chars.next()?;
            let rest = chars.as_str().to_lowercase();
            Some(first.to_uppercase().chain(rest.chars()).collect())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn mean_averages_samples() {
        assert_eq!(mean(&[2.0, 4.0, 6.0]), Some(4.0));
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "zero is exactly representable")]
    fn std_deviation_of_short_inputs_is_zero() {
        assert_eq!(std_deviation(&[]), 0.0);
        assert_eq!(std_deviation(&[5.0]), 0.0);
    }

    #[test]
    fn std_deviation_uses_sample_denominator() {
        // Mean 2, squared deviations 1 + 1, divided by n - 1 = 1.
        let result = std_deviation(&[1.0, 3.0]);
        assert!((result - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "inputs are exactly representable")]
    fn trapezoid_area_is_mean_side_times_height() {
        assert_eq!(trapezoid_area(2.0, 8.0, 10.0), 50.0);
        assert_eq!(trapezoid_area(4.0, 4.0, 0.5), 2.0);
    }

    #[test]
    fn seconds_render_as_minutes_and_seconds() {
        assert_eq!(format_seconds(0), "0:00");
        assert_eq!(format_seconds(65), "1:05");
        assert_eq!(format_seconds(600), "10:00");
        assert_eq!(format_seconds(3725), "62:05");
    }

    #[test]
    fn words_are_split_and_title_cased() {
        assert_eq!(
            normalized_words("  calm  FOCUSED run\tfast "),
            ["Calm", "Focused", "Run", "Fast"]
        );
    }

    #[test]
    fn empty_description_has_no_words() {
        assert!(normalized_words("").is_empty());
        assert!(normalized_words("   ").is_empty());
    }
}
