//! Deterministic k-means over fixed-size feature vectors.
//!
//! Seeding is farthest-point (maximin) starting from the first item, followed
//! by Lloyd iterations. Ties in distance go to the lower cluster index, so a
//! given input always yields the same clustering.

use crate::error::{Error, Result};

/// Upper bound on Lloyd iterations.
pub const MAX_ITERATIONS: usize = 100;

/// Cluster assignment for every input item.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering<const D: usize> {
    /// `assignments[i]` is the cluster of item `i`.
    pub assignments: Vec<usize>,
    pub centroids: Vec<[f64; D]>,
}

impl<const D: usize> Clustering<D> {
    pub fn cluster_count(&self) -> usize {
        self.centroids.len()
    }

    /// Indices of the items assigned to `cluster`, in input order.
    pub fn members(&self, cluster: usize) -> impl Iterator<Item = usize> + '_ {
        self.assignments
            .iter()
            .enumerate()
            .filter(move |&(_, &assigned)| assigned == cluster)
            .map(|(index, _)| index)
    }
}

fn squared_distance<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest<const D: usize>(point: &[f64; D], centroids: &[[f64; D]]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (index, centroid) in centroids.iter().enumerate() {
        let distance = squared_distance(point, centroid);
        if distance < best_distance {
            best = index;
            best_distance = distance;
        }
    }
    best
}

fn seed<const D: usize>(points: &[[f64; D]], k: usize) -> Vec<[f64; D]> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[0]);

    while centroids.len() < k {
        let mut farthest = 0;
        let mut farthest_distance = -1.0;
        for (index, point) in points.iter().enumerate() {
            let distance = centroids
                .iter()
                .map(|c| squared_distance(point, c))
                .fold(f64::INFINITY, f64::min);
            if distance > farthest_distance {
                farthest = index;
                farthest_distance = distance;
            }
        }
        centroids.push(points[farthest]);
    }

    centroids
}

/// Clusters `items` into `k` groups using the features returned by `feature`.
///
/// Fails with [`Error::NoClusters`] when `k` is zero and with
/// [`Error::InsufficientSamples`] when there are fewer items than clusters.
/// Clusters can end up empty when items share identical features.
pub fn kmeans<T, const D: usize>(
    items: &[T],
    k: usize,
    feature: impl Fn(&T) -> [f64; D],
) -> Result<Clustering<D>> {
    if k == 0 {
        return Err(Error::NoClusters);
    }
    if items.len() < k {
        return Err(Error::InsufficientSamples {
            samples: items.len(),
            clusters: k,
        });
    }

    let points: Vec<[f64; D]> = items.iter().map(feature).collect();
    let mut centroids = seed(&points, k);
    let mut assignments: Vec<usize> = points.iter().map(|p| nearest(p, &centroids)).collect();

    for _ in 0..MAX_ITERATIONS {
        let mut sums = vec![[0.0; D]; k];
        let mut counts = vec![0usize; k];
        for (point, &cluster) in points.iter().zip(&assignments) {
            counts[cluster] += 1;
            for (sum, value) in sums[cluster].iter_mut().zip(point) {
                *sum += value;
            }
        }
        for ((centroid, sum), &count) in centroids.iter_mut().zip(&sums).zip(&counts) {
            // Empty clusters keep their previous centroid.
            if count > 0 {
                for (c, s) in centroid.iter_mut().zip(sum) {
                    *c = s / count as f64;
                }
            }
        }

        let next: Vec<usize> = points.iter().map(|p| nearest(p, &centroids)).collect();
        if next == assignments {
            break;
        }
        assignments = next;
    }

    Ok(Clustering {
        assignments,
        centroids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separates_two_groups_in_one_dimension() {
        let values = [1.0, 50.0, 2.0, 48.0, 3.0, 52.0];
        let clustering = kmeans(&values, 2, |&v| [v]).unwrap();

        // Cluster 0 is seeded from the first item.
        assert_eq!(clustering.assignments, vec![0, 1, 0, 1, 0, 1]);
        assert!((clustering.centroids[0][0] - 2.0).abs() < 1e-12);
        assert!((clustering.centroids[1][0] - 50.0).abs() < 1e-12);
        assert_eq!(clustering.members(1).collect::<Vec<_>>(), vec![1, 3, 5]);
    }

    #[test]
    fn works_in_two_dimensions() {
        let points = [[0.0, 0.0], [10.0, 10.0], [0.5, 0.0], [10.0, 9.5]];
        let clustering = kmeans(&points, 2, |p| *p).unwrap();
        assert_eq!(clustering.assignments, vec![0, 1, 0, 1]);
    }

    #[test]
    fn refines_past_the_seed_assignment() {
        // Seeds are 0 and 100; the middle values split around the centroids'
        // midpoint rather than around the seeds.
        let values = [0.0, 100.0, 40.0, 60.0, 55.0, 45.0];
        let clustering = kmeans(&values, 2, |&v| [v]).unwrap();

        assert_eq!(clustering.assignments[0], 0);
        assert_eq!(clustering.assignments[1], 1);
        let cluster_of_40 = clustering.assignments[2];
        let cluster_of_60 = clustering.assignments[3];
        assert_eq!(clustering.assignments[5], cluster_of_40);
        assert_eq!(clustering.assignments[4], cluster_of_60);
    }

    #[test]
    fn too_few_items_is_an_error() {
        let err = kmeans(&[1.0f64], 2, |&v| [v]).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientSamples {
                samples: 1,
                clusters: 2
            }
        ));
    }

    #[test]
    fn identical_items_leave_a_cluster_empty() {
        let clustering = kmeans(&[4.0f64, 4.0, 4.0], 2, |&v| [v]).unwrap();
        assert_eq!(clustering.assignments, vec![0, 0, 0]);
        assert_eq!(clustering.members(1).count(), 0);
        assert_eq!(clustering.cluster_count(), 2);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let values: Vec<f64> = (0..40).map(|i| ((i * 37) % 23) as f64).collect();
        let first = kmeans(&values, 3, |&v| [v]).unwrap();
        for _ in 0..5 {
            assert_eq!(kmeans(&values, 3, |&v| [v]).unwrap(), first);
        }
    }
}
