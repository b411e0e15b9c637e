//! Target container selection

use crate::models::Container;

/// Image substring identifying the user-container image family
pub const DEFAULT_IMAGE_MARKER: &str = "user-images";

/// Pick the first container whose image contains `marker`
///
/// Returns the container's position in the pod spec alongside it; patch paths
/// are built from that index. No match is a normal outcome (system pods).
pub fn select_target<'a>(
    containers: &'a [Container],
    marker: &str,
) -> Option<(usize, &'a Container)> {
    containers
        .iter()
        .enumerate()
        .find(|(_, c)| c.image.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(name: &str, image: &str) -> Container {
        Container {
            name: name.to_string(),
            image: image.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_match() {
        let containers = vec![
            container("proxy", "envoyproxy/envoy:v1.28"),
            container("notebook", "gcr.io/x/user-images:latest"),
        ];

        let (index, target) = select_target(&containers, DEFAULT_IMAGE_MARKER).unwrap();
        assert_eq!(index, 1);
        assert_eq!(target.name, "notebook");
    }

    #[test]
    fn test_no_match() {
        let containers = vec![container("coredns", "registry.k8s.io/coredns:v1.11")];
        assert!(select_target(&containers, DEFAULT_IMAGE_MARKER).is_none());
        assert!(select_target(&[], DEFAULT_IMAGE_MARKER).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let containers = vec![
            container("init-like", "busybox"),
            container("first", "gcr.io/x/user-images:a"),
            container("second", "gcr.io/x/user-images:b"),
        ];

        let (index, target) = select_target(&containers, DEFAULT_IMAGE_MARKER).unwrap();
        assert_eq!(index, 1);
        assert_eq!(target.name, "first");
    }
}
