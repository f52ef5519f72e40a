//! Per-metric deltas between two snapshots

use crate::models::{round_to, Direction, KpiSnapshot, Metric, MetricDelta};

/// Compare `current` against `previous`, one delta per metric in canonical order.
///
/// `delta = round(current - previous, 1dp)`; a zero delta counts as `Up`.
pub fn compare(current: &KpiSnapshot, previous: &KpiSnapshot) -> Vec<MetricDelta> {
    Metric::ALL
        .iter()
        .map(|&metric| {
            let current_value = current.value(metric);
            let previous_value = previous.value(metric);
            let delta = round_to(current_value - previous_value, 1);
            MetricDelta {
                metric,
                current: current_value,
                previous: previous_value,
                delta,
                direction: Direction::from_delta(delta),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeekId;

    fn snapshot(week: u32, values: [f64; 5]) -> KpiSnapshot {
        KpiSnapshot::new(WeekId::new(week).unwrap(), values)
    }

    #[test]
    fn test_compare_canonical_order_and_count() {
        let current = snapshot(23, [91.4, 97.4, 78.9, 74.9, 88.2]);
        let previous = snapshot(22, [94.8, 98.5, 82.1, 71.2, 91.7]);

        let deltas = compare(&current, &previous);
        assert_eq!(deltas.len(), 5);
        let order: Vec<Metric> = deltas.iter().map(|d| d.metric).collect();
        assert_eq!(order, Metric::ALL.to_vec());
    }

    #[test]
    fn test_compare_rounds_to_one_decimal() {
        let current = snapshot(23, [91.4, 97.4, 78.9, 74.9, 88.2]);
        let previous = snapshot(22, [94.8, 98.5, 82.1, 71.2, 91.7]);

        let deltas = compare(&current, &previous);
        let values: Vec<f64> = deltas.iter().map(|d| d.delta).collect();
        assert_eq!(values, vec![-3.4, -1.1, -3.2, 3.7, -3.5]);

        assert_eq!(deltas[0].current, 91.4);
        assert_eq!(deltas[0].previous, 94.8);
        assert_eq!(deltas[0].direction, Direction::Down);
        assert_eq!(deltas[3].direction, Direction::Up);
    }

    #[test]
    fn test_compare_zero_delta_is_up() {
        let same = snapshot(5, [90.0, 90.0, 80.0, 70.0, 60.0]);
        let deltas = compare(&same, &same);
        assert!(deltas.iter().all(|d| d.delta == 0.0));
        assert!(deltas.iter().all(|d| d.direction == Direction::Up));
    }

    #[test]
    fn test_compare_does_not_mutate_inputs() {
        let current = snapshot(21, [96.1, 99.1, 87.3, 69.8, 94.2]);
        let previous = snapshot(20, [94.2, 98.5, 85.0, 68.4, 92.6]);
        let before = (current.clone(), previous.clone());

        let first = compare(&current, &previous);
        let second = compare(&current, &previous);
        assert_eq!(first, second);
        assert_eq!((current, previous), before);
        assert_eq!(first[0].delta, 1.9);
    }
}
