use super::math::{cluster_labels, union};

/// Relative tolerance when deciding whether two hits describe one face.
pub const GROUP_EPS: f64 = 0.2;

/// A raw cascade hit in frame coordinates, before grouping.
///
/// Signed so that averaging and tolerance arithmetic need no casts; the
/// detector clips the grouped result into a [`BoundingBox`].
///
/// [`BoundingBox`]: crate::shared::bounding_box::BoundingBox
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CandidateRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CandidateRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn right(&self) -> i32 {
        self.x + self.width
    }

    fn bottom(&self) -> i32 {
        self.y + self.height
    }

    fn is_similar(&self, other: &Self, eps: f64) -> bool {
        let delta =
            eps * (self.width.min(other.width) + self.height.min(other.height)) as f64 * 0.5;
        (self.x - other.x).abs() as f64 <= delta
            && (self.y - other.y).abs() as f64 <= delta
            && (self.right() - other.right()).abs() as f64 <= delta
            && (self.bottom() - other.bottom()).abs() as f64 <= delta
    }

    /// True when `self` lies inside `outer` grown by `eps` of its size.
    fn is_nested_in(&self, outer: &Self, eps: f64) -> bool {
        let dx = (outer.width as f64 * eps).round() as i32;
        let dy = (outer.height as f64 * eps).round() as i32;
        self.x >= outer.x - dx
            && self.y >= outer.y - dy
            && self.right() <= outer.right() + dx
            && self.bottom() <= outer.bottom() + dy
    }
}

/// Cluster overlapping hits and keep the well-supported clusters.
///
/// Hits are partitioned by similarity, each cluster is replaced by its
/// average rectangle, clusters with `group_threshold` or fewer members are
/// dropped, and a weak cluster lying inside a stronger one is suppressed.
/// A threshold of zero returns the hits unchanged. Output order follows
/// the first appearance of each cluster in `rects`.
pub fn group_rectangles(
    rects: &[CandidateRect],
    group_threshold: usize,
    eps: f64,
) -> Vec<CandidateRect> {
    if group_threshold == 0 || rects.is_empty() {
        return rects.to_vec();
    }

    let n = rects.len();
    let mut parent: Vec<usize> = (0..n).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            if rects[i].is_similar(&rects[j], eps) {
                union(&mut parent, i, j);
            }
        }
    }
    let (labels, cluster_count) = cluster_labels(&mut parent);

    let mut sums = vec![[0i64; 4]; cluster_count];
    let mut counts = vec![0usize; cluster_count];
    for (r, &label) in rects.iter().zip(&labels) {
        let s = &mut sums[label];
        s[0] += r.x as i64;
        s[1] += r.y as i64;
        s[2] += r.width as i64;
        s[3] += r.height as i64;
        counts[label] += 1;
    }

    let clusters: Vec<(CandidateRect, usize)> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &count)| {
            let avg = |v: i64| (v as f64 / count as f64).round() as i32;
            (
                CandidateRect::new(avg(s[0]), avg(s[1]), avg(s[2]), avg(s[3])),
                count,
            )
        })
        .collect();

    clusters
        .iter()
        .enumerate()
        .filter(|&(_, &(_, n1))| n1 > group_threshold)
        .filter(|&(i, &(r1, n1))| {
            !clusters.iter().enumerate().any(|(j, &(r2, n2))| {
                j != i
                    && n2 > group_threshold
                    && r1.is_nested_in(&r2, eps)
                    && (n2 > n1.max(3) || n1 < 3)
            })
        })
        .map(|(_, &(r, _))| r)
        .collect()
}
