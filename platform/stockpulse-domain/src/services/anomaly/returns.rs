use crate::value_objects::price_point::PricePoint;

/// Day-over-day percentage returns from newest-first points.
///
/// `returns[i]` compares `points[i]` with `points[i + 1]`. Pairs whose earlier close is not
/// positive are skipped.
pub fn pct_returns_newest_first(points: &[PricePoint]) -> Vec<f64> {
    points
        .windows(2)
        .filter_map(|pair| {
            let (current, previous) = (&pair[0], &pair[1]);
            if previous.close <= 0.0 {
                return None;
            }
            Some((current.close - previous.close) / previous.close * 100.0)
        })
        .collect()
}
