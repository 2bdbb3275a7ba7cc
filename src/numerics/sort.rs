//! Sort/select helpers shared by the reported-Hypo seed, station-magnitude
//! aggregation and NA misfit ranking: a stable median and an
//! index-permutation sort that reorders descriptors without relocating
//! the payload records they describe.

/// Stable median: for odd length, the middle value after sorting; for even
/// length, the average of the two middle values. Input is not required to
/// be pre-sorted; this function clones and sorts a copy.
pub fn median(values: &[f64]) -> f64 {
    assert!(!values.is_empty(), "median of empty slice");
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    }
}

/// Returns the permutation of `0..keys.len()` that sorts `keys` ascending,
/// with ties broken by original index (stable).
pub fn stable_index_sort(keys: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..keys.len()).collect();
    idx.sort_by(|&a, &b| keys[a].partial_cmp(&keys[b]).unwrap().then(a.cmp(&b)));
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_odd_is_middle_value() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
    }

    #[test]
    fn median_even_is_average_of_middle_two() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }

    #[test]
    fn index_sort_is_stable() {
        let keys = [2.0, 1.0, 1.0, 0.0];
        assert_eq!(stable_index_sort(&keys), vec![3, 1, 2, 0]);
    }
}
