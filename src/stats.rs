// Summary statistics used to judge uniformity.
// Inputs are any iterable of values convertible into f64, so integer counts
// and float proportions go through the same code.

/// Arithmetic mean, or `None` for an empty input.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator,
    I::Item: Into<f64>,
{
    let (count, total) = values.into_iter().fold((0usize, 0.0f64), |(count, total), value| {
        let value: f64 = value.into();
        (count + 1, total + value)
    });
    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}

/// Sample variance (divides by `count - 1`).
///
/// Undefined for fewer than two values, which is reported as `None` rather
/// than a division by zero.
pub fn variance<I>(values: I) -> Option<f64>
where
    I: IntoIterator,
    I::Item: Into<f64>,
{
    let values: Vec<f64> = values.into_iter().map(Into::into).collect();
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values.iter().copied())?;
    let squared: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
    Some(squared / (values.len() - 1) as f64)
}

/// Sample standard deviation.
pub fn stddev<I>(values: I) -> Option<f64>
where
    I: IntoIterator,
    I::Item: Into<f64>,
{
    variance(values).map(f64::sqrt)
}
