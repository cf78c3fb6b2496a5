//! Half-over-half trend classification.

use canon_core::effectiveness::{QualityTrend, TrendDirection};

/// Compare the mean of the first half of `series` with the mean of the
/// second half.
///
/// The first half is `floor(n / 2)` items. A difference larger than
/// `threshold` is a trend whose strength is `|diff| / scale`; anything else
/// is stable, with strength `1 - |diff| / threshold` (how flat it is). Both
/// strengths are clamped to `0.0..=1.0`. Fewer than two points is stable with
/// strength 0.
pub fn classify_trend(series: &[f64], threshold: f64, scale: f64) -> QualityTrend {
    let values: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();
    if values.len() < 2 {
        let mean = values.first().copied().unwrap_or(0.0);
        return QualityTrend {
            direction: TrendDirection::Stable,
            strength: 0.0,
            first_half_mean: mean,
            second_half_mean: mean,
            samples: values.len(),
        };
    }

    let (first, second) = values.split_at(values.len() / 2);
    let first_half_mean = mean(first);
    let second_half_mean = mean(second);
    let diff = second_half_mean - first_half_mean;
    let magnitude = diff.abs();

    let (direction, strength) = if magnitude > threshold {
        let direction = if diff > 0.0 {
            TrendDirection::Improving
        } else {
            TrendDirection::Declining
        };
        let strength = if scale > 0.0 { magnitude / scale } else { 1.0 };
        (direction, strength)
    } else if threshold > 0.0 {
        (TrendDirection::Stable, 1.0 - magnitude / threshold)
    } else {
        (TrendDirection::Stable, 1.0)
    };

    QualityTrend {
        direction,
        strength: strength.clamp(0.0, 1.0),
        first_half_mean,
        second_half_mean,
        samples: values.len(),
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
