//! Small deterministic-start k-means over 3-vectors.

use rand::Rng;

use crate::error::{AttributionError, Result};

use super::config::ReseedPolicy;

pub type Point = [f64; 3];

const ENABLE_LOGS: bool = true;

use crate::log_debug;

pub fn distance(a: &Point, b: &Point) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    pub centroids: Vec<Point>,
    /// Cluster index per input point.
    pub assignments: Vec<usize>,
    pub iterations: usize,
    pub converged: bool,
}

impl KMeansResult {
    pub fn members(&self, cluster: usize) -> impl Iterator<Item = usize> + '_ {
        self.assignments
            .iter()
            .enumerate()
            .filter(move |&(_, &c)| c == cluster)
            .map(|(i, _)| i)
    }
}

/// Index of the point whose nearest centroid is farthest away.
fn farthest_from(points: &[Point], centroids: &[Point]) -> usize {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let nearest = centroids
                .iter()
                .map(|c| distance(p, c))
                .fold(f64::INFINITY, f64::min);
            (i, nearest)
        })
        .fold((0, f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best })
        .0
}

fn nearest(point: &Point, centroids: &[Point]) -> usize {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, distance(point, c)))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
        .0
}

/// Seeds are the first point, then repeatedly the point farthest from the
/// seeds so far. Iterates assignment and mean update until nothing moves or
/// `max_iterations` is reached.
pub fn kmeans(points: &[Point], k: usize, max_iterations: usize, reseed: ReseedPolicy) -> Result<KMeansResult> {
    if k == 0 || points.len() < k {
        return Err(AttributionError::InsufficientEvidence(format!(
            "cannot form {k} clusters from {} point(s)",
            points.len()
        )));
    }

    let mut centroids = vec![points[0]];
    while centroids.len() < k {
        centroids.push(points[farthest_from(points, &centroids)]);
    }

    let mut assignments = vec![usize::MAX; points.len()];
    let mut iterations = 0;
    let mut converged = false;
    let mut rng = rand::thread_rng();

    while iterations < max_iterations.max(1) {
        iterations += 1;

        let mut changed = false;
        for (i, p) in points.iter().enumerate() {
            let c = nearest(p, &centroids);
            if assignments[i] != c {
                assignments[i] = c;
                changed = true;
            }
        }
        if !changed {
            converged = true;
            break;
        }

        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (p, &c) in points.iter().zip(assignments.iter()) {
            for d in 0..3 {
                sums[c][d] += p[d];
            }
            counts[c] += 1;
        }

        let mut empty = Vec::new();
        for c in 0..k {
            if counts[c] == 0 {
                empty.push(c);
            } else {
                let n = counts[c] as f64;
                centroids[c] = [sums[c][0] / n, sums[c][1] / n, sums[c][2] / n];
            }
        }

        for c in empty {
            let survivors: Vec<Point> = (0..k)
                .filter(|&o| o != c && counts[o] > 0)
                .map(|o| centroids[o])
                .collect();
            let index = match reseed {
                ReseedPolicy::Random => rng.gen_range(0..points.len()),
                ReseedPolicy::Farthest => farthest_from(points, &survivors),
            };
            log_debug!("cluster {c} emptied on iteration {iterations}; reseeding from point {index}");
            centroids[c] = points[index];
        }
    }

    Ok(KMeansResult {
        centroids,
        assignments,
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separates_two_blobs() {
        let points = vec![
            [0.9, 0.1, 0.1],
            [0.1, 0.1, 0.9],
            [0.85, 0.12, 0.1],
            [0.12, 0.1, 0.88],
            [0.88, 0.08, 0.12],
        ];
        let result = kmeans(&points, 2, 50, ReseedPolicy::Farthest).unwrap();
        assert!(result.converged);
        assert_eq!(result.assignments, vec![0, 1, 0, 1, 0]);
        assert_eq!(result.members(0).collect::<Vec<_>>(), vec![0, 2, 4]);
        assert!((result.centroids[1][2] - 0.89).abs() < 1e-9);
    }

    #[test]
    fn seeding_is_deterministic() {
        let points = vec![[0.5, 0.5, 0.5], [0.2, 0.2, 0.2], [0.0, 0.0, 1.0], [0.45, 0.5, 0.5]];
        let a = kmeans(&points, 2, 50, ReseedPolicy::Farthest).unwrap();
        let b = kmeans(&points, 2, 50, ReseedPolicy::Farthest).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.assignments[2], 1);
    }

    #[test]
    fn identical_points_do_not_loop_forever() {
        let points = vec![[0.3, 0.3, 0.3]; 4];
        let result = kmeans(&points, 2, 10, ReseedPolicy::Farthest).unwrap();
        assert!(result.iterations <= 10);
        assert_eq!(result.assignments.len(), 4);
    }

    #[test]
    fn too_few_points_is_an_error() {
        assert!(kmeans(&[[0.0; 3]], 2, 10, ReseedPolicy::Random).is_err());
        assert!(kmeans(&[], 0, 10, ReseedPolicy::Random).is_err());
    }
}
