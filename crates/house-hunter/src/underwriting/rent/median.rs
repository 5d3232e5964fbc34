use std::cmp::Ordering;

/// A comp's rent together with its similarity weight.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedRent<'a> {
    pub comp_id: &'a str,
    pub rent: f64,
    pub weight: f64,
}

/// Weighted median of the supplied rents, or `None` for an empty set.
///
/// Entries are ordered by rent and then `comp_id`, so the result does not depend
/// on input order. When the cumulative weight lands exactly on the midpoint the
/// rents on either side of it are averaged.
pub fn weighted_median(entries: &[WeightedRent<'_>]) -> Option<f64> {
    let mut ordered: Vec<&WeightedRent<'_>> = entries
        .iter()
        .filter(|entry| entry.weight.is_finite() && entry.weight >= 0.0)
        .collect();
    if ordered.is_empty() {
        return None;
    }

    ordered.sort_by(|left, right| {
        left.rent
            .partial_cmp(&right.rent)
            .unwrap_or(Ordering::Equal)
            .then_with(|| left.comp_id.cmp(right.comp_id))
    });

    let total: f64 = ordered.iter().map(|entry| entry.weight).sum();
    if total <= 0.0 {
        let mean = ordered.iter().map(|entry| entry.rent).sum::<f64>() / ordered.len() as f64;
        return Some(mean);
    }

    let half = total / 2.0;
    let tolerance = total * 1e-12;
    let mut cumulative = 0.0;

    for (index, entry) in ordered.iter().enumerate() {
        cumulative += entry.weight;
        if cumulative + tolerance < half {
            continue;
        }

        let on_midpoint = (cumulative - half).abs() <= tolerance;
        return match ordered.get(index + 1) {
            Some(next) if on_midpoint => Some((entry.rent + next.rent) / 2.0),
            _ => Some(entry.rent),
        };
    }

    ordered.last().map(|entry| entry.rent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(comp_id: &str, rent: f64, weight: f64) -> WeightedRent<'_> {
        WeightedRent {
            comp_id,
            rent,
            weight,
        }
    }

    #[test]
    fn empty_input_has_no_median() {
        assert_eq!(weighted_median(&[]), None);
    }

    #[test]
    fn heavy_comp_pulls_the_median() {
        let entries = [
            entry("a", 1500.0, 0.2),
            entry("b", 1800.0, 0.9),
            entry("c", 2400.0, 0.3),
        ];
        assert_eq!(weighted_median(&entries), Some(1800.0));
    }

    #[test]
    fn exact_midpoint_split_averages_neighbours() {
        let entries = [entry("a", 1600.0, 0.5), entry("b", 2000.0, 0.5)];
        assert_eq!(weighted_median(&entries), Some(1800.0));

        let four = [
            entry("a", 1000.0, 1.0),
            entry("b", 1200.0, 1.0),
            entry("c", 1400.0, 1.0),
            entry("d", 1600.0, 1.0),
        ];
        assert_eq!(weighted_median(&four), Some(1300.0));
    }

    #[test]
    fn odd_count_of_equal_weights_returns_middle_value() {
        let entries = [
            entry("a", 1000.0, 1.0),
            entry("b", 1400.0, 1.0),
            entry("c", 1200.0, 1.0),
        ];
        assert_eq!(weighted_median(&entries), Some(1200.0));
    }

    #[test]
    fn result_is_independent_of_input_order() {
        let base = vec![
            entry("d", 2100.0, 0.31),
            entry("a", 1750.0, 0.77),
            entry("c", 1750.0, 0.12),
            entry("b", 1990.0, 0.45),
            entry("e", 2600.0, 0.05),
        ];
        let expected = weighted_median(&base);

        let mut reversed = base.clone();
        reversed.reverse();
        assert_eq!(weighted_median(&reversed), expected);

        let mut rotated = base.clone();
        rotated.rotate_left(2);
        assert_eq!(weighted_median(&rotated), expected);
    }

    #[test]
    fn median_stays_within_the_observed_range() {
        let entries = [
            entry("a", 1320.0, 0.01),
            entry("b", 1410.0, 0.02),
            entry("c", 2980.0, 0.97),
        ];
        let median = weighted_median(&entries).expect("median");
        assert!((1320.0..=2980.0).contains(&median));
        assert_eq!(median, 2980.0);
    }
}
