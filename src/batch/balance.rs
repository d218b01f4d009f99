//! Keeps either player's bucket from collapsing to (almost) nothing.

const RATIO_EPSILON: f64 = 1e-9;

/// Enforce `min_ratio <= share <= max_ratio` on a two-cluster assignment.
///
/// `distances[i]` holds sample i's distance to centroid 0 and 1. When the
/// smaller cluster is under the floor (the floor itself passes), the most
/// ambiguous samples of the larger cluster move over one at a time until the
/// floor is met, or until one more move would push the smaller cluster past
/// `max_ratio`. Returns the indices moved.
pub fn enforce_ratio(
    assignments: &mut [usize],
    distances: &[[f64; 2]],
    min_ratio: f64,
    max_ratio: f64,
) -> Vec<usize> {
    let n = assignments.len();
    if n == 0 {
        return Vec::new();
    }

    let share = |count: usize| count as f64 / n as f64;
    let mut counts = [0usize; 2];
    for &c in assignments.iter() {
        counts[c.min(1)] += 1;
    }

    let minority = if counts[0] <= counts[1] { 0 } else { 1 };
    let majority = 1 - minority;
    if share(counts[minority]) >= min_ratio - RATIO_EPSILON {
        return Vec::new();
    }

    let mut candidates: Vec<usize> = (0..n).filter(|&i| assignments[i] == majority).collect();
    candidates.sort_by(|&x, &y| {
        let ax = (distances[x][0] - distances[x][1]).abs();
        let ay = (distances[y][0] - distances[y][1]).abs();
        ax.total_cmp(&ay)
    });

    let mut moved = Vec::new();
    for i in candidates {
        if share(counts[minority]) >= min_ratio - RATIO_EPSILON {
            break;
        }
        if share(counts[minority] + 1) > max_ratio + RATIO_EPSILON {
            break;
        }
        assignments[i] = minority;
        counts[minority] += 1;
        counts[majority] -= 1;
        moved.push(i);
    }

    moved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distances(n_major: usize) -> Vec<[f64; 2]> {
        let mut d: Vec<[f64; 2]> = (0..n_major).map(|i| [0.1 + i as f64 * 0.01, 1.0]).collect();
        d.push([1.0, 0.05]);
        d
    }

    #[test]
    fn floor_is_inclusive() {
        let mut assignments = vec![0; 9];
        assignments.push(1);
        let moved = enforce_ratio(&mut assignments, &distances(9), 0.1, 0.9);
        assert!(moved.is_empty());
    }

    #[test]
    fn below_floor_moves_most_ambiguous_first() {
        let mut assignments = vec![0; 10];
        assignments.push(1);
        let moved = enforce_ratio(&mut assignments, &distances(10), 0.1, 0.9);
        // the last majority sample sits closest to the boundary
        assert_eq!(moved, vec![9]);
        assert_eq!(assignments.iter().filter(|&&c| c == 1).count(), 2);
    }

    #[test]
    fn empty_cluster_is_filled_to_the_floor() {
        let mut assignments = vec![0; 20];
        let d: Vec<[f64; 2]> = (0..20).map(|i| [0.1, 0.1 + i as f64]).collect();
        let moved = enforce_ratio(&mut assignments, &d, 0.1, 0.9);
        assert_eq!(moved, vec![0, 1]);
    }

    #[test]
    fn cap_stops_rebalancing_early() {
        let mut assignments = vec![0, 0];
        let moved = enforce_ratio(&mut assignments, &[[0.1, 0.2], [0.1, 0.3]], 0.6, 0.4);
        assert!(moved.is_empty());
    }
}
