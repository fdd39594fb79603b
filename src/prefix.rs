// Prefix-sum predicates over integer sequences.
// Both checks walk the input once, stop at the first violating prefix, and
// accumulate in an i64 so narrow element types cannot overflow the sum.

/// True when every prefix sum of `items` is non-negative.
///
/// An empty input is vacuously non-negative.
pub fn non_neg_prefix_sum<I>(items: I) -> bool
where
    I: IntoIterator,
    I::Item: Into<i64>,
{
    let mut sum: i64 = 0;
    for item in items {
        let value: i64 = item.into();
        sum += value;
        if sum < 0 {
            return false;
        }
    }
    true
}

/// True when every prefix sum of `items` is non-positive.
pub fn non_pos_prefix_sum<I>(items: I) -> bool
where
    I: IntoIterator,
    I::Item: Into<i64>,
{
    let mut sum: i64 = 0;
    for item in items {
        let value: i64 = item.into();
        sum += value;
        if sum > 0 {
            return false;
        }
    }
    true
}
