//! Leaf/noise separation by clustering particle areas.
//!
//! Particles are clustered on area alone and the cluster holding the largest
//! total area is taken to be the leaves. This assumes leaves dominate the
//! summed area of a scan; scans where debris outweighs the leaves are
//! misclassified.

use crate::cluster::kmeans;
use crate::descriptor::ShapeDescriptor;
use crate::error::Result;

/// Usual cluster count: leaves and noise.
pub const DEFAULT_CLUSTERS: usize = 2;

/// Feature vector used for clustering.
pub fn area_feature(descriptor: &ShapeDescriptor) -> [f64; 1] {
    [descriptor.area()]
}

/// Both sides of a leaf/noise split, each in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseSplit {
    pub leaves: Vec<ShapeDescriptor>,
    pub noise: Vec<ShapeDescriptor>,
    /// Index of the cluster kept as leaves.
    pub leaf_cluster: usize,
}

/// Splits descriptors into leaves and noise.
///
/// On equal cluster sums the lower cluster index wins; cluster 0 is the one
/// seeded from the first descriptor.
pub fn split_noise(descriptors: &[ShapeDescriptor], clusters: usize) -> Result<NoiseSplit> {
    let clustering = kmeans(descriptors, clusters, area_feature)?;

    let mut sums = vec![0.0; clustering.cluster_count()];
    for (descriptor, &cluster) in descriptors.iter().zip(&clustering.assignments) {
        sums[cluster] += descriptor.area();
    }

    let mut leaf_cluster = 0;
    for (cluster, &sum) in sums.iter().enumerate().skip(1) {
        if sum > sums[leaf_cluster] {
            leaf_cluster = cluster;
        }
    }

    let (leaves, noise): (Vec<_>, Vec<_>) = descriptors
        .iter()
        .zip(&clustering.assignments)
        .partition(|&(_, &cluster)| cluster == leaf_cluster);

    Ok(NoiseSplit {
        leaves: leaves.into_iter().map(|(d, _)| d.clone()).collect(),
        noise: noise.into_iter().map(|(d, _)| d.clone()).collect(),
        leaf_cluster,
    })
}

/// Keeps only the descriptors classified as leaves.
///
/// Fails with [`crate::Error::InsufficientSamples`] when there are fewer
/// descriptors than clusters; callers skip filtering for such scans.
pub fn filter_noise(descriptors: &[ShapeDescriptor], clusters: usize) -> Result<Vec<ShapeDescriptor>> {
    Ok(split_noise(descriptors, clusters)?.leaves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::{areas, descriptors};

    #[test]
    fn keeps_the_large_area_cluster() {
        let input = descriptors("scan.jpg", &[30.0, 0.4, 28.0, 0.2, 35.0, 0.5, 0.3]);

        let leaves = filter_noise(&input, DEFAULT_CLUSTERS).unwrap();

        assert_eq!(areas(&leaves), vec![30.0, 28.0, 35.0]);
    }

    #[test]
    fn split_is_a_partition_of_the_input() {
        let input = descriptors("scan.jpg", &[5.0, 1.0, 9.0, 1.5, 8.0, 0.5, 7.5, 2.0]);

        let split = split_noise(&input, DEFAULT_CLUSTERS).unwrap();

        assert_eq!(split.leaves.len() + split.noise.len(), input.len());
        for descriptor in split.leaves.iter().chain(&split.noise) {
            assert!(input.contains(descriptor));
        }
        for descriptor in &input {
            let in_leaves = split.leaves.contains(descriptor);
            let in_noise = split.noise.contains(descriptor);
            assert!(in_leaves != in_noise, "each descriptor lands on exactly one side");
        }
    }

    #[test]
    fn noise_dominating_total_area_wins() {
        // Many mid-sized debris particles outweigh two leaves.
        let mut values = vec![100.0, 90.0];
        values.extend(std::iter::repeat(20.0).take(15));
        let input = descriptors("scan.jpg", &values);

        let leaves = filter_noise(&input, DEFAULT_CLUSTERS).unwrap();

        assert_eq!(leaves.len(), 15);
        assert!(leaves.iter().all(|d| d.area() == 20.0));
    }

    #[test]
    fn equal_cluster_sums_pick_the_first_cluster() {
        // {2} and {1, 1} both sum to 2.
        let input = descriptors("scan.jpg", &[2.0, 1.0, 1.0]);

        for _ in 0..10 {
            let split = split_noise(&input, DEFAULT_CLUSTERS).unwrap();
            assert_eq!(split.leaf_cluster, 0);
            assert_eq!(areas(&split.leaves), vec![2.0]);
            assert_eq!(areas(&split.noise), vec![1.0, 1.0]);
        }
    }

    #[test]
    fn fewer_descriptors_than_clusters_is_an_error() {
        let err = filter_noise(&descriptors("scan.jpg", &[3.0]), DEFAULT_CLUSTERS).unwrap_err();
        assert!(matches!(err, Error::InsufficientSamples { samples: 1, clusters: 2 }));

        let err = filter_noise(&[], DEFAULT_CLUSTERS).unwrap_err();
        assert!(matches!(err, Error::InsufficientSamples { samples: 0, .. }));
    }

    #[test]
    fn zero_clusters_is_an_error() {
        let input = descriptors("scan.jpg", &[1.0, 2.0]);

        assert!(matches!(filter_noise(&input, 0), Err(Error::NoClusters)));
        assert!(matches!(split_noise(&[], 0), Err(Error::NoClusters)));
    }
}
