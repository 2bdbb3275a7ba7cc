//! Hierarchical single-link clustering, used to reorder stations by
//! nearest-neighbour so the correlated-error covariance matrix comes
//! out block-diagonal up to small leakage.

/// Given an N x N symmetric separation matrix (km), returns a permutation
/// of `0..n` such that single-link nearest-neighbour stations end up
/// adjacent. Ties broken by increasing original index for determinism.
pub fn single_link_order(distance: &[Vec<f64>]) -> Vec<usize> {
    let n = distance.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![0];
    }

    let mut clusters: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();

    let cluster_distance = |a: &[usize], b: &[usize], distance: &[Vec<f64>]| -> f64 {
        let mut best = f64::INFINITY;
        for &i in a {
            for &j in b {
                if distance[i][j] < best {
                    best = distance[i][j];
                }
            }
        }
        best
    };

    while clusters.len() > 1 {
        let mut best = (f64::INFINITY, 0usize, 1usize);
        for i in 0..clusters.len() {
            for j in (i + 1)..clusters.len() {
                let d = cluster_distance(&clusters[i], &clusters[j], distance);
                if d < best.0 || (d == best.0 && (i, j) < (best.1, best.2)) {
                    best = (d, i, j);
                }
            }
        }
        let (_, i, j) = best;
        let merged_j = clusters.remove(j);
        clusters[i].extend(merged_j);
    }

    clusters.into_iter().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_points_end_up_adjacent() {
        // 4 stations on a line at 0, 1, 10, 11 km: {0,1} and {10,11} should
        // each be contiguous in the resulting order.
        let pos = [0.0, 1.0, 10.0, 11.0];
        let mut dist = vec![vec![0.0; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                dist[i][j] = (pos[i] - pos[j]).abs();
            }
        }
        let order = single_link_order(&dist);
        assert_eq!(order.len(), 4);
        let pos_of = |s: usize| order.iter().position(|&x| x == s).unwrap();
        assert_eq!((pos_of(0) as i64 - pos_of(1) as i64).abs(), 1);
        assert_eq!((pos_of(2) as i64 - pos_of(3) as i64).abs(), 1);
    }
}
