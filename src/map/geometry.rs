//! Boundary data laid out on the canvas: projected rings, fill triangles
//! and a spatial index for pointer hit tests.

use egui::{Pos2, Rect};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::RTree;

use super::boundary::BoundaryDataset;
use super::projection::MercatorProjection;

/// A country in canvas coordinates.
#[derive(Debug, Clone)]
pub struct ProjectedCountry {
    pub name: String,
    /// Polygons as canvas rings; outline first, then holes.
    pub polygons: Vec<Vec<Vec<Pos2>>>,
    /// Outline vertices of every polygon, referenced by `triangles`.
    pub fill_vertices: Vec<Pos2>,
    pub triangles: Vec<[u32; 3]>,
    pub bounds: Rect,
    pub area: f32,
}

impl ProjectedCountry {
    pub fn contains(&self, p: Pos2) -> bool {
        if !self.bounds.contains(p) {
            return false;
        }
        self.polygons.iter().any(|rings| match rings.split_first() {
            Some((outline, holes)) => {
                ring_contains(outline, p) && !holes.iter().any(|hole| ring_contains(hole, p))
            }
            None => false,
        })
    }
}

/// Country bounding box tagged with its index in paint order.
type CountryEnvelope = GeomWithData<Rectangle<[f32; 2]>, usize>;

/// Every country projected once for a fixed canvas. Countries are ordered
/// largest first, which is also the paint order, so enclaves are drawn on
/// top of the country that surrounds them.
pub struct WorldGeometry {
    projection: MercatorProjection,
    countries: Vec<ProjectedCountry>,
    index: RTree<CountryEnvelope>,
}

impl WorldGeometry {
    pub fn new(dataset: &BoundaryDataset, projection: MercatorProjection) -> Self {
        let mut countries: Vec<ProjectedCountry> = dataset
            .countries()
            .iter()
            .filter_map(|shape| {
                let polygons: Vec<Vec<Vec<Pos2>>> = shape
                    .polygons
                    .iter()
                    .map(|rings| {
                        rings
                            .iter()
                            .map(|ring| {
                                let mut points: Vec<Pos2> = ring
                                    .iter()
                                    .map(|&(lon, lat)| projection.project_clamped(lon, lat))
                                    .collect();
                                if points.len() > 1 && points.first() == points.last() {
                                    points.pop();
                                }
                                points
                            })
                            .filter(|ring| ring.len() >= 3)
                            .collect::<Vec<_>>()
                    })
                    .filter(|rings| !rings.is_empty())
                    .collect();
                if polygons.is_empty() {
                    return None;
                }
                Some(build_country(shape.name.clone(), polygons))
            })
            .collect();

        countries.sort_by(|a, b| b.area.total_cmp(&a.area));

        let envelopes = countries
            .iter()
            .enumerate()
            .map(|(index, c)| {
                let bbox = Rectangle::from_corners([c.bounds.min.x, c.bounds.min.y], [c.bounds.max.x, c.bounds.max.y]);
                CountryEnvelope::new(bbox, index)
            })
            .collect();

        Self {
            projection,
            countries,
            index: RTree::bulk_load(envelopes),
        }
    }

    pub fn projection(&self) -> &MercatorProjection {
        &self.projection
    }

    pub fn countries(&self) -> &[ProjectedCountry] {
        &self.countries
    }

    pub fn country(&self, index: usize) -> Option<&ProjectedCountry> {
        self.countries.get(index)
    }

    /// Topmost country under `p`, i.e. the smallest one containing it.
    pub fn country_at(&self, p: Pos2) -> Option<usize> {
        self.index
            .locate_all_at_point(&[p.x, p.y])
            .map(|e| e.data)
            .filter(|&i| self.countries[i].contains(p))
            .max()
    }
}

fn build_country(name: String, polygons: Vec<Vec<Vec<Pos2>>>) -> ProjectedCountry {
    let mut fill_vertices = Vec::new();
    let mut triangles = Vec::new();
    let mut bounds = Rect::NOTHING;
    let mut area = 0.0_f32;

    for rings in &polygons {
        for (i, ring) in rings.iter().enumerate() {
            let ring_area = signed_area(ring).abs();
            if i == 0 {
                area += ring_area;
                for p in ring {
                    bounds.extend_with(*p);
                }
            } else {
                area -= ring_area;
            }
        }

        let outline = &rings[0];
        let base = fill_vertices.len() as u32;
        triangles.extend(
            triangulate(outline)
                .into_iter()
                .map(|[a, b, c]| [base + a as u32, base + b as u32, base + c as u32]),
        );
        fill_vertices.extend_from_slice(outline);
    }

    ProjectedCountry {
        name,
        polygons,
        fill_vertices,
        triangles,
        bounds,
        area: area.max(0.0),
    }
}

fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Shoelace area; positive for counter-clockwise rings in a y-up frame.
pub fn signed_area(ring: &[Pos2]) -> f32 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f32 = (0..n)
        .map(|i| {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice / 2.0
}

/// Even-odd ray cast.
pub fn ring_contains(ring: &[Pos2], p: Pos2) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn point_in_triangle(p: Pos2, a: Pos2, b: Pos2, c: Pos2) -> bool {
    let d1 = cross(a, b, p);
    let d2 = cross(b, c, p);
    let d3 = cross(c, a, p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Ear-clipping triangulation of a simple ring (no closing duplicate).
/// Degenerate leftovers are fanned so every vertex stays covered.
pub fn triangulate(ring: &[Pos2]) -> Vec<[usize; 3]> {
    let n = ring.len();
    if n < 3 {
        return Vec::new();
    }
    let orientation = if signed_area(ring) >= 0.0 { 1.0 } else { -1.0 };
    let mut remaining: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);
    let mut i = 0;
    let mut misses = 0;

    while remaining.len() > 3 {
        let len = remaining.len();
        i %= len;
        let (ia, ib, ic) = (remaining[(i + len - 1) % len], remaining[i], remaining[(i + 1) % len]);
        let (a, b, c) = (ring[ia], ring[ib], ring[ic]);

        let convex = cross(a, b, c) * orientation > 0.0;
        let is_ear = convex
            && !remaining.iter().any(|&k| {
                k != ia && k != ib && k != ic && {
                    let p = ring[k];
                    p != a && p != b && p != c && point_in_triangle(p, a, b, c)
                }
            });

        if is_ear {
            triangles.push([ia, ib, ic]);
            remaining.remove(i);
            misses = 0;
        } else {
            i += 1;
            misses += 1;
            if misses > len {
                for k in 1..len - 1 {
                    triangles.push([remaining[0], remaining[k], remaining[k + 1]]);
                }
                return triangles;
            }
        }
    }
    triangles.push([remaining[0], remaining[1], remaining[2]]);
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::boundary::tests::TWO_SQUARES;
    use approx::assert_relative_eq;
    use egui::pos2;

    fn world() -> WorldGeometry {
        let dataset = BoundaryDataset::from_geojson(TWO_SQUARES.as_bytes(), "name").unwrap();
        WorldGeometry::new(&dataset, MercatorProjection::default())
    }

    fn triangles_area(ring: &[Pos2], tris: &[[usize; 3]]) -> f32 {
        tris.iter()
            .map(|&[a, b, c]| (cross(ring[a], ring[b], ring[c]) / 2.0).abs())
            .sum()
    }

    #[test]
    fn triangulates_a_concave_ring() {
        // An L shape.
        let ring = [
            pos2(0.0, 0.0),
            pos2(4.0, 0.0),
            pos2(4.0, 1.0),
            pos2(1.0, 1.0),
            pos2(1.0, 4.0),
            pos2(0.0, 4.0),
        ];
        let tris = triangulate(&ring);
        assert_eq!(tris.len(), 4);
        assert_relative_eq!(triangles_area(&ring, &tris), signed_area(&ring).abs());

        let mut reversed = ring;
        reversed.reverse();
        assert_relative_eq!(triangles_area(&reversed, &triangulate(&reversed)), 7.0);
    }

    #[test]
    fn ring_containment() {
        let square = [pos2(0.0, 0.0), pos2(2.0, 0.0), pos2(2.0, 2.0), pos2(0.0, 2.0)];
        assert!(ring_contains(&square, pos2(1.0, 1.0)));
        assert!(!ring_contains(&square, pos2(3.0, 1.0)));
        assert!(!ring_contains(&[], pos2(0.0, 0.0)));
    }

    #[test]
    fn countries_are_sorted_largest_first() {
        let world = world();
        let names: Vec<&str> = world.countries().iter().map(|c| c.name.as_str()).collect();
        // Eastland has an extra island, so it is larger.
        assert_eq!(names, ["Eastland", "Westland"]);
        assert!(world.countries().iter().all(|c| !c.triangles.is_empty()));
    }

    #[test]
    fn hit_tests_against_projected_outlines() {
        let world = world();
        let p = *world.projection();
        let west = p.project(crate::map::projection::Coordinate::new(0.0, -10.0));
        let east = p.project(crate::map::projection::Coordinate::new(0.0, 10.0));
        let ocean = p.project(crate::map::projection::Coordinate::new(-40.0, -100.0));

        let name_at = |pos| world.country_at(pos).map(|i| world.countries()[i].name.as_str());
        assert_eq!(name_at(west), Some("Westland"));
        assert_eq!(name_at(east), Some("Eastland"));
        assert_eq!(name_at(ocean), None);
    }

    #[test]
    fn enclaves_win_hit_tests() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"name": "Outer"},
             "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [20, 0], [20, 20], [0, 20], [0, 0]]]}},
            {"type": "Feature", "properties": {"name": "Inner"},
             "geometry": {"type": "Polygon", "coordinates": [[[8, 8], [12, 8], [12, 12], [8, 12], [8, 8]]]}}
        ]}"#;
        let dataset = BoundaryDataset::from_geojson(json.as_bytes(), "name").unwrap();
        let world = WorldGeometry::new(&dataset, MercatorProjection::default());
        let centre = world
            .projection()
            .project(crate::map::projection::Coordinate::new(10.0, 10.0));

        let hit = world.country_at(centre).unwrap();
        assert_eq!(world.countries()[hit].name, "Inner");
    }
}
