//! Grouping and averaging helpers shared by the aggregation commands.

use std::collections::BTreeMap;

/// Running arithmetic mean
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// Mean of the pushed values, `None` if nothing was pushed
    pub fn value(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Group items by `key` and average the values returned by `value`.
///
/// Items for which `value` returns `None` do not contribute to their group.
/// Groups that end up with no values are left out of the result.
pub fn group_mean<T, K, I, FK, FV>(items: I, key: FK, value: FV) -> BTreeMap<K, f64>
where
    I: IntoIterator<Item = T>,
    K: Ord,
    FK: Fn(&T) -> K,
    FV: Fn(&T) -> Option<f64>,
{
    let mut groups: BTreeMap<K, Mean> = BTreeMap::new();
    for item in items {
        let Some(v) = value(&item) else { continue };
        groups.entry(key(&item)).or_default().push(v);
    }
    groups
        .into_iter()
        .filter_map(|(k, mean)| mean.value().map(|m| (k, m)))
        .collect()
}

/// Regroup `(outer, inner) -> value` into `outer -> [(inner, value)]`, inner keys ascending.
pub fn split_by_outer<A, B, V>(grouped: &BTreeMap<(A, B), V>) -> BTreeMap<A, Vec<(B, V)>>
where
    A: Ord + Copy,
    B: Ord + Copy,
    V: Copy,
{
    let mut out: BTreeMap<A, Vec<(B, V)>> = BTreeMap::new();
    for (&(a, b), &v) in grouped {
        out.entry(a).or_default().push((b, v));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        let mean = Mean::default();
        assert_eq!(mean.value(), None);
    }

    #[test]
    fn test_mean_values() {
        let mut mean = Mean::default();
        for v in [1.0, 2.0, 6.0] {
            mean.push(v);
        }
        assert_eq!(mean.value(), Some(3.0));
    }

    #[test]
    fn test_group_mean() {
        let rows = vec![(500, 1, 10.0), (500, 1, 12.0), (500, 2, 6.0), (1000, 1, 40.0)];
        let grouped = group_mean(rows, |r| (r.0, r.1), |r| Some(r.2));
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[&(500, 1)], 11.0);
        assert_eq!(grouped[&(500, 2)], 6.0);
        assert_eq!(grouped[&(1000, 1)], 40.0);
    }

    #[test]
    fn test_group_mean_skips_missing_values() {
        let rows = vec![(1, Some(2.0)), (1, None), (2, None)];
        let grouped = group_mean(rows, |r| r.0, |r| r.1);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[&1], 2.0);
    }

    #[test]
    fn test_split_by_outer_orders_inner_keys() {
        let mut grouped = BTreeMap::new();
        grouped.insert((500u32, 4u32), 3.0);
        grouped.insert((500, 1), 1.0);
        grouped.insert((1000, 2), 2.0);
        let split = split_by_outer(&grouped);
        assert_eq!(split[&500], vec![(1, 1.0), (4, 3.0)]);
        assert_eq!(split[&1000], vec![(2, 2.0)]);
    }
}
