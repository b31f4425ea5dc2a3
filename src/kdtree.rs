use crate::math::Point3;

/// The splitting axis a [`KdNode`] partitions its subtree on, cycling
/// X → Y → Z → X … with tree depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn component(self, p: Point3) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
            Axis::Z => p.z,
        }
    }

    fn next(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::Z,
            Axis::Z => Axis::X,
        }
    }
}

struct KdNode {
    position: Point3,
    axis: Axis,
    left: Option<Box<KdNode>>,
    right: Option<Box<KdNode>>,
}

/// A static, balanced 3-D k-d tree over photon positions, supporting
/// radius-bounded nearest-neighbor queries. Built once per frame and
/// read-only thereafter.
pub struct KdTree {
    root: Option<Box<KdNode>>,
    len: usize,
}

impl KdTree {
    /// Builds a balanced tree from `points`, consuming the vector.
    ///
    /// At each level, the working slice is sorted along the current
    /// splitting axis and split at the median. The median index is then
    /// **slid leftward while the value on the splitting axis equals the
    /// median's**, so the pivot becomes the first occurrence of its value —
    /// this is what guarantees "equal points lie in the right subtree",
    /// which [`neighbors`][KdTree::neighbors]'s pruning relies on. A plain
    /// median split without this adjustment silently drops photons whose
    /// position ties the splitter value on the wrong side.
    pub fn build(points: Vec<Point3>) -> Self {
        let len = points.len();
        let root = build_recursive(points, Axis::X);
        KdTree { root, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All stored positions within distance `r` of `point`. Order is
    /// unspecified.
    pub fn neighbors(&self, point: Point3, r: f64) -> Vec<Point3> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            neighbors_recursive(root, point, r, &mut out);
        }
        out
    }

    /// Count of positions within distance `r` of `point`, without
    /// allocating the result list — the radiance estimator only needs `k`.
    pub fn count_within(&self, point: Point3, r: f64) -> usize {
        match &self.root {
            Some(root) => count_recursive(root, point, r),
            None => 0,
        }
    }
}

fn build_recursive(mut points: Vec<Point3>, axis: Axis) -> Option<Box<KdNode>> {
    if points.is_empty() {
        return None;
    }

    points.sort_by(|a, b| {
        axis.component(*a)
            .partial_cmp(&axis.component(*b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut median = points.len() / 2;
    let pivot_value = axis.component(points[median]);
    while median > 0 && axis.component(points[median - 1]) == pivot_value {
        median -= 1;
    }

    let position = points[median];
    let right_half = points.split_off(median + 1);
    let mut left_half = points;
    left_half.truncate(median);

    Some(Box::new(KdNode {
        position,
        axis,
        left: build_recursive(left_half, axis.next()),
        right: build_recursive(right_half, axis.next()),
    }))
}

fn neighbors_recursive(node: &KdNode, point: Point3, r: f64, out: &mut Vec<Point3>) {
    if (node.position - point).length_squared() < r * r {
        out.push(node.position);
    }

    let split = node.axis.component(node.position);
    let query = node.axis.component(point);

    if split > query - r {
        if let Some(left) = &node.left {
            neighbors_recursive(left, point, r, out);
        }
    }
    if split < query + r {
        if let Some(right) = &node.right {
            neighbors_recursive(right, point, r, out);
        }
    }
}

fn count_recursive(node: &KdNode, point: Point3, r: f64) -> usize {
    let mut count = if (node.position - point).length_squared() < r * r {
        1
    } else {
        0
    };

    let split = node.axis.component(node.position);
    let query = node.axis.component(point);

    if split > query - r {
        if let Some(left) = &node.left {
            count += count_recursive(left, point, r);
        }
    }
    if split < query + r {
        if let Some(right) = &node.right {
            count += count_recursive(right, point, r);
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn brute_force_neighbors(points: &[Point3], query: Point3, r: f64) -> Vec<Point3> {
        points
            .iter()
            .copied()
            .filter(|p| (*p - query).length_squared() < r * r)
            .collect()
    }

    #[test]
    fn neighbors_matches_brute_force() {
        let mut rng = rand::thread_rng();
        let points: Vec<Point3> = (0..500)
            .map(|_| {
                Point3::new(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                )
            })
            .collect();

        let tree = KdTree::build(points.clone());

        for _ in 0..20 {
            let query = Point3::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            );
            let r = rng.gen_range(0.5..5.0);

            let mut expected = brute_force_neighbors(&points, query, r);
            let mut actual = tree.neighbors(query, r);

            let key = |p: &Point3| (p.x.to_bits(), p.y.to_bits(), p.z.to_bits());
            expected.sort_by_key(key);
            actual.sort_by_key(key);

            assert_eq!(expected.len(), actual.len());
            assert_eq!(expected, actual);
            assert_eq!(tree.count_within(query, r), expected.len());
        }
    }

    #[test]
    fn neighbors_handles_duplicate_splitter_values() {
        // All points share x = 0.0 — the median-slide must not drop any of
        // them across recursive splits on that axis.
        let points: Vec<Point3> = (0..32)
            .map(|i| Point3::new(0.0, i as f64, 0.0))
            .collect();
        let tree = KdTree::build(points.clone());
        let found = tree.neighbors(Point3::new(0.0, 15.0, 0.0), 100.0);
        assert_eq!(found.len(), points.len());
    }

    #[test]
    fn empty_tree_returns_no_neighbors() {
        let tree = KdTree::build(Vec::new());
        assert!(tree.is_empty());
        assert_eq!(tree.neighbors(Point3::zero(), 10.0).len(), 0);
        assert_eq!(tree.count_within(Point3::zero(), 10.0), 0);
    }
}
