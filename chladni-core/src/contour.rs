//! # Zero-Contour Module
//!
//! Extracts the nodal lines of a sampled plate field with marching squares
//! at level 0 and stitches the cell segments into polylines.
//!
//! ## Details
//! - Values within [`ZERO_TOLERANCE`] of zero are treated as exactly zero,
//!   which absorbs the `sin(k·π)` rounding noise along the far plate edges.
//! - A crossing through a zero-valued grid point is keyed by that point, so
//!   nodal lines running exactly through the grid (such as the diagonal of
//!   an antisymmetric field) still join up.
//! - The plate boundary is a zero of every mode, so segments lying entirely
//!   on the boundary are dropped.
//! - Saddle cells are resolved by the field value at the cell centre, taken
//!   exactly when the field knows its modes and as the corner mean otherwise.
//!   A centre at zero is where two nodal lines cross, and all four edge
//!   crossings are joined there.
//! - Components are counted with a tolerance of [`JOIN_DISTANCE`] grid
//!   spacings, so the count does not depend on where a crossing falls
//!   relative to the grid.

use std::collections::{BTreeMap, BTreeSet};

use crate::pattern::Field;

/// Magnitudes at or below this are snapped to zero before contouring.
pub const ZERO_TOLERANCE: f64 = 1e-9;

/// Nodal lines closer than this many grid spacings count as touching.
pub const JOIN_DISTANCE: f64 = 2.0;

/// A point on the plate in plate coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// The nodal lines of a field.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    /// Side length of the plate the points live on.
    pub side_length: f64,
    /// Connected runs of points; a closed loop repeats its first point at the end.
    pub polylines: Vec<Vec<Point>>,
    components: usize,
}

impl Contour {
    /// Number of connected nodal lines.
    ///
    /// Lines that cross count as one, as do lines that come within
    /// [`JOIN_DISTANCE`] grid spacings of each other, which is how lines
    /// meeting at the same point of the plate edge are seen.
    pub fn component_count(&self) -> usize {
        self.components
    }

    /// Total number of straight segments across all polylines.
    pub fn segment_count(&self) -> usize {
        self.polylines.iter().map(|p| p.len().saturating_sub(1)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.polylines.is_empty()
    }
}

/// Where a contour crosses the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Crossing {
    /// Exactly on grid point `(i, j)`.
    Vertex(usize, usize),
    /// On the edge from `(i, j)` to `(i + 1, j)`.
    Horizontal(usize, usize),
    /// On the edge from `(i, j)` to `(i, j + 1)`.
    Vertical(usize, usize),
    /// At the centre of cell `(i, j)`, where two lines cross.
    Centre(usize, usize),
}

/// Edge pairs crossed in each of the 16 marching-squares cases.
///
/// Corners are numbered counter-clockwise from the bottom left
/// (`c0 = (i, j)`, `c1 = (i+1, j)`, `c2 = (i+1, j+1)`, `c3 = (i, j+1)`) and bit
/// `k` of the case is set when corner `k` is above zero. Edges are bottom (0),
/// right (1), top (2) and left (3).
fn cell_segments(case: u8, center_above: bool) -> &'static [(usize, usize)] {
    match case {
        1 | 14 => &[(3, 0)],
        2 | 13 => &[(0, 1)],
        3 | 12 => &[(3, 1)],
        4 | 11 => &[(1, 2)],
        6 | 9 => &[(0, 2)],
        7 | 8 => &[(2, 3)],
        5 if center_above => &[(0, 1), (2, 3)],
        5 => &[(3, 0), (1, 2)],
        10 if center_above => &[(3, 0), (1, 2)],
        10 => &[(0, 1), (2, 3)],
        _ => &[],
    }
}

fn snap(value: f64) -> f64 {
    if value.abs() <= ZERO_TOLERANCE { 0.0 } else { value }
}

/// Traces the zero-level nodal lines of a field.
///
/// The result is fully determined by the field: identical fields give
/// identical polylines in identical order.
pub fn extract_zero_contour(field: &Field) -> Contour {
    let res = field.resolution;
    let values: Vec<f64> = field.values.iter().map(|&v| snap(v)).collect();
    let value = |(i, j): (usize, usize)| values[j * res + i];
    let is_boundary = |c: Crossing| match c {
        Crossing::Vertex(i, j) => i == 0 || j == 0 || i + 1 == res || j + 1 == res,
        _ => false,
    };

    let mut segments: BTreeSet<(Crossing, Crossing)> = BTreeSet::new();
    for j in 0..res.saturating_sub(1) {
        for i in 0..res - 1 {
            let corners = [(i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1)];
            let mut case = 0u8;
            for (bit, &corner) in corners.iter().enumerate() {
                if value(corner) > 0.0 {
                    case |= 1 << bit;
                }
            }
            if case == 0 || case == 15 {
                continue;
            }

            let edges = [
                (corners[0], corners[1], Crossing::Horizontal(i, j)),
                (corners[1], corners[2], Crossing::Vertical(i + 1, j)),
                (corners[3], corners[2], Crossing::Horizontal(i, j + 1)),
                (corners[0], corners[3], Crossing::Vertical(i, j)),
            ];
            let crossing = |edge: usize| {
                let (a, b, key) = edges[edge];
                let below = if value(a) > 0.0 { b } else { a };
                if value(below) == 0.0 {
                    Crossing::Vertex(below.0, below.1)
                } else {
                    key
                }
            };
            let mut add = |a: Crossing, b: Crossing| {
                if a != b && !(is_boundary(a) && is_boundary(b)) {
                    segments.insert((a.min(b), a.max(b)));
                }
            };

            let mut center_above = false;
            if case == 5 || case == 10 {
                let centre = centre_value(field, &values, i, j);
                if centre == 0.0 {
                    for edge in 0..4 {
                        add(crossing(edge), Crossing::Centre(i, j));
                    }
                    continue;
                }
                center_above = centre > 0.0;
            }

            for &(e1, e2) in cell_segments(case, center_above) {
                add(crossing(e1), crossing(e2));
            }
        }
    }

    let segments: Vec<(Crossing, Crossing)> = segments.into_iter().collect();
    let points: BTreeMap<Crossing, Point> = segments
        .iter()
        .flat_map(|&(a, b)| [a, b])
        .map(|c| (c, crossing_point(field, &values, c)))
        .collect();

    let spacing = if res > 1 { field.side_length / (res - 1) as f64 } else { 0.0 };
    let components = count_components(&segments, &points, JOIN_DISTANCE * spacing);
    let polylines: Vec<Vec<Point>> = stitch(&segments)
        .into_iter()
        .map(|path| path.into_iter().map(|c| points[&c]).collect())
        .collect();

    Contour { side_length: field.side_length, polylines, components }
}

/// Field value at the centre of cell `(i, j)`, snapped like the grid values.
fn centre_value(field: &Field, values: &[f64], i: usize, j: usize) -> f64 {
    let x = (field.coordinate(i) + field.coordinate(i + 1)) / 2.0;
    let y = (field.coordinate(j) + field.coordinate(j + 1)) / 2.0;
    let exact = field.sample(x, y).unwrap_or_else(|| {
        let res = field.resolution;
        let corners = [(i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1)];
        corners.iter().map(|&(ci, cj)| values[cj * res + ci]).sum::<f64>() / 4.0
    });
    snap(exact)
}

/// Plate coordinates of a crossing, interpolating linearly along its edge.
fn crossing_point(field: &Field, values: &[f64], crossing: Crossing) -> Point {
    let res = field.resolution;
    let value = |i: usize, j: usize| values[j * res + i];
    match crossing {
        Crossing::Vertex(i, j) => Point { x: field.coordinate(i), y: field.coordinate(j) },
        Crossing::Horizontal(i, j) => {
            let t = value(i, j) / (value(i, j) - value(i + 1, j));
            let x0 = field.coordinate(i);
            Point { x: x0 + t * (field.coordinate(i + 1) - x0), y: field.coordinate(j) }
        }
        Crossing::Vertical(i, j) => {
            let t = value(i, j) / (value(i, j) - value(i, j + 1));
            let y0 = field.coordinate(j);
            Point { x: field.coordinate(i), y: y0 + t * (field.coordinate(j + 1) - y0) }
        }
        Crossing::Centre(i, j) => Point {
            x: (field.coordinate(i) + field.coordinate(i + 1)) / 2.0,
            y: (field.coordinate(j) + field.coordinate(j + 1)) / 2.0,
        },
    }
}

/// Joins segments that share crossings into maximal paths.
///
/// Paths start at endpoints and junctions first; whatever remains afterwards
/// consists of closed loops.
fn stitch(segments: &[(Crossing, Crossing)]) -> Vec<Vec<Crossing>> {
    let mut adjacency: BTreeMap<Crossing, Vec<usize>> = BTreeMap::new();
    for (idx, &(a, b)) in segments.iter().enumerate() {
        adjacency.entry(a).or_default().push(idx);
        adjacency.entry(b).or_default().push(idx);
    }

    let mut used = vec![false; segments.len()];
    let mut paths = Vec::new();

    let open_starts: Vec<Crossing> = adjacency
        .iter()
        .filter(|(_, segs)| segs.len() != 2)
        .map(|(&c, _)| c)
        .collect();
    let all_starts: Vec<Crossing> = adjacency.keys().copied().collect();

    for start in open_starts.into_iter().chain(all_starts) {
        loop {
            let path = trace(start, &adjacency, segments, &mut used);
            if path.len() < 2 {
                break;
            }
            paths.push(path);
        }
    }
    paths
}

fn trace(
    start: Crossing,
    adjacency: &BTreeMap<Crossing, Vec<usize>>,
    segments: &[(Crossing, Crossing)],
    used: &mut [bool],
) -> Vec<Crossing> {
    let mut path = vec![start];
    let mut current = start;
    loop {
        let next = adjacency[&current].iter().copied().find(|&s| !used[s]);
        let Some(seg) = next else { break };
        used[seg] = true;
        let (a, b) = segments[seg];
        current = if a == current { b } else { a };
        path.push(current);
    }
    path
}

/// Counts connected components of the segment graph with a union-find.
///
/// Crossings within `join_radius` of each other are merged as well. They are
/// bucketed on a grid of that size, so only neighbouring buckets are compared.
fn count_components(
    segments: &[(Crossing, Crossing)],
    points: &BTreeMap<Crossing, Point>,
    join_radius: f64,
) -> usize {
    let index: BTreeMap<Crossing, usize> = points.keys().enumerate().map(|(k, &c)| (c, k)).collect();
    let mut sets = DisjointSets::new(index.len());
    for &(a, b) in segments {
        sets.union(index[&a], index[&b]);
    }

    if join_radius > 0.0 {
        let located: Vec<Point> = points.values().copied().collect();
        let bucket_of = |p: &Point| ((p.x / join_radius).floor() as i64, (p.y / join_radius).floor() as i64);

        let mut buckets: BTreeMap<(i64, i64), Vec<usize>> = BTreeMap::new();
        for (k, p) in located.iter().enumerate() {
            buckets.entry(bucket_of(p)).or_default().push(k);
        }

        for (k, p) in located.iter().enumerate() {
            let (bx, by) = bucket_of(p);
            for dx in -1..=1 {
                for dy in -1..=1 {
                    let Some(bucket) = buckets.get(&(bx + dx, by + dy)) else { continue };
                    for &other in bucket {
                        let q = located[other];
                        if other > k && (q.x - p.x).hypot(q.y - p.y) <= join_radius {
                            sets.union(k, other);
                        }
                    }
                }
            }
        }
    }
    sets.count
}

struct DisjointSets {
    parent: Vec<usize>,
    count: usize,
}

impl DisjointSets {
    fn new(len: usize) -> Self {
        Self { parent: (0..len).collect(), count: len }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra] = rb;
            self.count -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::ModePair;
    use crate::pattern::{synthesize, PlateConfig};

    fn contour(m: u8, n: u8, resolution: usize) -> Contour {
        let plate = PlateConfig { side_length: 1.0, resolution };
        extract_zero_contour(&synthesize(ModePair::new(m, n), &plate))
    }

    #[test]
    fn test_antisymmetric_pair_gives_diagonal() {
        // (1, 2) vanishes inside the plate only where cos(πx) = cos(πy), i.e. on x = y.
        let c = contour(1, 2, 100);
        assert_eq!(c.component_count(), 1);
        assert_eq!(c.polylines.len(), 1);
        // Away from the corners, where the line meets the boundary, it is exactly diagonal.
        let inner: Vec<&Point> = c.polylines[0]
            .iter()
            .filter(|p| (0.05..0.95).contains(&p.x) && (0.05..0.95).contains(&p.y))
            .collect();
        assert!(inner.len() > 80);
        for p in inner {
            assert!((p.x - p.y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_symmetric_pair_gives_closed_loop() {
        // (1, 3) vanishes where sin²(πx) + sin²(πy) = 3/2, a loop around the centre.
        let c = contour(1, 3, 200);
        assert_eq!(c.component_count(), 1);
        let line = &c.polylines[0];
        assert_eq!(line.first(), line.last());
        for p in line {
            let s = (std::f64::consts::PI * p.x).sin().powi(2)
                + (std::f64::consts::PI * p.y).sin().powi(2);
            assert!((s - 1.5).abs() < 0.02);
        }
    }

    #[test]
    fn test_diagonal_and_two_arcs() {
        // (2, 3) vanishes on x = y and on the two branches of cos(πx)·cos(πy) = -1/4.
        assert_eq!(contour(2, 3, 150).component_count(), 3);
    }

    #[test]
    fn test_points_stay_on_plate() {
        let c = contour(3, 5, 120);
        assert!(!c.is_empty());
        for p in c.polylines.iter().flatten() {
            assert!((0.0..=1.0).contains(&p.x));
            assert!((0.0..=1.0).contains(&p.y));
        }
    }

    #[test]
    fn test_extraction_is_deterministic() {
        assert_eq!(contour(4, 1, 150), contour(4, 1, 150));
    }

    #[test]
    fn test_flat_field_has_no_contour() {
        let field = Field { side_length: 1.0, resolution: 4, values: vec![0.0; 16], modes: None };
        let c = extract_zero_contour(&field);
        assert!(c.is_empty());
        assert_eq!(c.component_count(), 0);
    }

    #[test]
    fn test_saddle_cell_uses_centre() {
        // Opposite corners positive; a positive centre keeps them connected
        // and the cuts isolate the two negative corners.
        let field = Field { side_length: 1.0, resolution: 2, values: vec![2.0, -1.0, -1.0, 2.0], modes: None };
        let c = extract_zero_contour(&field);
        assert_eq!(c.segment_count(), 2);
        let near = |p: &Point, x: f64, y: f64| (p.x - x).abs() < 1e-12 && (p.y - y).abs() < 1e-12;
        assert!(c.polylines.iter().any(|line| {
            line.iter().any(|p| near(p, 2.0 / 3.0, 0.0)) && line.iter().any(|p| near(p, 1.0, 1.0 / 3.0))
        }));
        // Both cuts lie within a grid spacing of each other.
        assert_eq!(c.component_count(), 1);
    }

    #[test]
    fn test_zero_centre_joins_all_four_crossings() {
        let field = Field { side_length: 1.0, resolution: 2, values: vec![1.0, -1.0, -1.0, 1.0], modes: None };
        let c = extract_zero_contour(&field);
        assert_eq!(c.segment_count(), 4);
        assert_eq!(c.component_count(), 1);
        let centre = Point { x: 0.5, y: 0.5 };
        assert!(c.polylines.iter().flatten().any(|p| *p == centre));
    }

    #[test]
    fn test_crossing_lines_count_once() {
        // (2, 4) vanishes on the midlines x = 1/2 and y = 1/2, which cross at the
        // plate centre, and on a diamond that meets them on the plate edge.
        // At 150 samples the centre falls inside a cell, at 151 on a grid point.
        assert_eq!(contour(2, 4, 150).component_count(), 1);
        assert_eq!(contour(2, 4, 151).component_count(), 1);
        // (3, 6) is a lattice of lines, some of which meet only on the plate edge.
        assert_eq!(contour(3, 6, 150).component_count(), 1);
        assert_eq!(contour(3, 6, 151).component_count(), 1);
    }
}
