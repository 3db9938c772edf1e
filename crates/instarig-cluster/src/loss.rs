//! Symmetric Chamfer distance between predicted points and target joints.

use glam::Vec3;

use crate::error::{ClusterError, ClusterResult};

fn check(points: &[Vec3], targets: &[Vec3]) -> ClusterResult<()> {
    if targets.is_empty() {
        return Err(ClusterError::EmptyTargets);
    }
    if points.is_empty() {
        return Err(ClusterError::EmptyPoints);
    }
    Ok(())
}

/// Index and squared distance of the point in `set` nearest to `p`.
fn nearest(p: Vec3, set: &[Vec3]) -> (usize, f32) {
    set.iter()
        .enumerate()
        .map(|(i, q)| (i, p.distance_squared(*q)))
        .fold((0, f32::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

/// Mean squared nearest distance from points to targets plus the same from
/// targets to points.
#[allow(clippy::cast_precision_loss)]
pub fn chamfer_loss(points: &[Vec3], targets: &[Vec3]) -> ClusterResult<f32> {
    check(points, targets)?;
    let forward: f32 = points.iter().map(|&p| nearest(p, targets).1).sum();
    let backward: f32 = targets.iter().map(|&t| nearest(t, points).1).sum();
    Ok(forward / points.len() as f32 + backward / targets.len() as f32)
}

/// [`chamfer_loss`] and its derivative along the given point tangents.
///
/// Nearest-neighbor assignments are held fixed, which is exact almost
/// everywhere.
#[allow(clippy::cast_precision_loss)]
pub fn chamfer_loss_with_tangent(
    points: &[Vec3],
    tangents: &[Vec3],
    targets: &[Vec3],
) -> ClusterResult<(f32, f32)> {
    check(points, targets)?;
    if tangents.len() != points.len() {
        return Err(ClusterError::LengthMismatch {
            points: points.len(),
            values: tangents.len(),
        });
    }
    let n = points.len() as f32;
    let m = targets.len() as f32;

    let mut loss = 0.0;
    let mut derivative = 0.0;
    for (&p, &t) in points.iter().zip(tangents) {
        let (j, d2) = nearest(p, targets);
        loss += d2 / n;
        derivative += 2.0 * (p - targets[j]).dot(t) / n;
    }
    for &target in targets {
        let (i, d2) = nearest(target, points);
        loss += d2 / m;
        derivative += 2.0 * (points[i] - target).dot(tangents[i]) / m;
    }
    Ok((loss, derivative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_sets() {
        let set = vec![Vec3::ZERO, Vec3::ONE];
        assert_eq!(chamfer_loss(&set, &set).unwrap(), 0.0);
    }

    #[test]
    fn test_asymmetric_sets() {
        let points = vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)];
        let targets = vec![Vec3::ZERO];
        // forward: (0 + 4) / 2, backward: 0 / 1
        assert!((chamfer_loss(&points, &targets).unwrap() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(
            chamfer_loss(&[Vec3::ZERO], &[]).unwrap_err(),
            ClusterError::EmptyTargets
        );
        assert_eq!(
            chamfer_loss(&[], &[Vec3::ZERO]).unwrap_err(),
            ClusterError::EmptyPoints
        );
    }

    #[test]
    fn test_tangent_matches_finite_difference() {
        let points = vec![Vec3::new(0.1, 0.0, 0.0), Vec3::new(1.0, 0.5, 0.0)];
        let tangents = vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, -1.0, 0.5)];
        let targets = vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0)];

        let (loss, derivative) = chamfer_loss_with_tangent(&points, &tangents, &targets).unwrap();
        assert!((loss - chamfer_loss(&points, &targets).unwrap()).abs() < 1e-6);

        let delta = 1e-3;
        let moved = |s: f32| -> Vec<Vec3> {
            points.iter().zip(&tangents).map(|(p, t)| *p + *t * s).collect()
        };
        let fd = (chamfer_loss(&moved(delta), &targets).unwrap()
            - chamfer_loss(&moved(-delta), &targets).unwrap())
            / (2.0 * delta);
        assert!((derivative - fd).abs() < 1e-2, "{derivative} vs {fd}");
    }
}
