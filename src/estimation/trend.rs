use crate::estimation::OccupancyRecord;
use std::collections::HashMap;

/// Candidates are `step / 10` for `step` in `1..=20`, i.e. 0.1 through 2.0.
const MULTIPLIER_STEPS: u32 = 20;
pub const DEFAULT_MULTIPLIER: f64 = 1.0;

/// Multiplier in 0.1..=2.0 that best lays the average curve over the live samples.
///
/// Samples pair up by identical `time` label; averages with no live sample at that label
/// contribute nothing. Ties keep the smaller multiplier, so with no label in common every
/// candidate scores zero and 0.1 wins. Only an empty `avg` leaves the curve unscaled.
pub fn find_best_multiplier(live: &[OccupancyRecord], avg: &[OccupancyRecord]) -> f64 {
    if avg.is_empty() {
        return DEFAULT_MULTIPLIER;
    }

    let mut by_time: HashMap<&str, u32> = HashMap::with_capacity(live.len());
    for record in live {
        by_time.entry(record.time.as_str()).or_insert(record.count);
    }

    let pairs: Vec<(f64, f64)> = avg
        .iter()
        .filter_map(|a| {
            by_time
                .get(a.time.as_str())
                .map(|&count| (f64::from(count), f64::from(a.count)))
        })
        .collect();

    let mut best_multiplier = DEFAULT_MULTIPLIER;
    let mut best_deviation = f64::INFINITY;
    for step in 1..=MULTIPLIER_STEPS {
        let multiplier = f64::from(step) / 10.0;
        let deviation: f64 = pairs
            .iter()
            .map(|(live, avg)| (live - avg * multiplier).abs())
            .sum();
        if deviation < best_deviation {
            best_deviation = deviation;
            best_multiplier = multiplier;
        }
    }
    best_multiplier
}

/// The average curve scaled by [`find_best_multiplier`], same labels and order as `avg`.
pub fn fitted_curve(live: &[OccupancyRecord], avg: &[OccupancyRecord]) -> Vec<OccupancyRecord> {
    let multiplier = find_best_multiplier(live, avg);
    avg.iter()
        .map(|a| OccupancyRecord {
            time: a.time.clone(),
            count: (f64::from(a.count) * multiplier).round() as u32,
        })
        .collect()
}
