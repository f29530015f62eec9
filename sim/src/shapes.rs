//! Collision shape templates for the pusher and the seven tangram pieces.
//!
//! Conventions
//! - Units are simulation units (already scaled).
//! - Pieces are prisms extruded along +Y, centred on their centroid.
//! - The collision margin is a rounded border around a core shape. The core
//!   outline is inset by the margin so the outer extents keep the nominal size.

use std::fmt;

use rapier3d::parry::bounding_volume::Aabb;
use rapier3d::prelude::*;

use crate::error::SceneError;

const SQRT_2: f32 = std::f32::consts::SQRT_2;

/// Minimal signed area of a core outline before it is considered collapsed.
const AREA_EPS: f32 = 1.0e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pusher,
    SmallTriangle,
    MediumTriangle,
    LargeTriangle,
    Square,
    Parallelogram,
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceKind::Pusher => "pusher",
            PieceKind::SmallTriangle => "small triangle",
            PieceKind::MediumTriangle => "medium triangle",
            PieceKind::LargeTriangle => "large triangle",
            PieceKind::Square => "square",
            PieceKind::Parallelogram => "parallelogram",
        };
        f.write_str(name)
    }
}

/// A shared collision shape plus the bounds it was measured with.
#[derive(Clone)]
pub struct ShapeTemplate {
    shape: SharedShape,
    local_aabb: Aabb,
    margin: f32,
}

impl fmt::Debug for ShapeTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeTemplate")
            .field("local_aabb", &self.local_aabb)
            .field("margin", &self.margin)
            .finish_non_exhaustive()
    }
}

impl ShapeTemplate {
    pub fn new(shape: SharedShape, margin: f32) -> Self {
        let local_aabb = shape.compute_local_aabb();
        Self {
            shape,
            local_aabb,
            margin,
        }
    }

    /// Cloning the returned handle shares the underlying shape.
    pub fn shape(&self) -> &SharedShape {
        &self.shape
    }

    /// Local bounds including the rounded border.
    pub fn local_aabb(&self) -> &Aabb {
        &self.local_aabb
    }

    pub fn half_extents(&self) -> Vector<f32> {
        self.local_aabb.half_extents()
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }
}

/// Nominal dimensions shared by every template.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PieceDimensions {
    /// Leg of the small triangle, edge of the square.
    pub base_length: f32,
    /// Prism thickness.
    pub height: f32,
    pub margin: f32,
}

/// The five distinct shapes of the scene, built once and shared.
#[derive(Clone, Debug)]
pub struct ShapeCatalog {
    pub pusher: ShapeTemplate,
    pub small_triangle: ShapeTemplate,
    pub medium_triangle: ShapeTemplate,
    pub large_triangle: ShapeTemplate,
    pub square: ShapeTemplate,
    pub parallelogram: ShapeTemplate,
}

impl ShapeCatalog {
    pub fn build(dims: PieceDimensions) -> Result<Self, SceneError> {
        let a = dims.base_length;
        let half_height = dims.height * 0.5;
        let margin = dims.margin;

        let prism = |kind: PieceKind, outline: &[[f32; 2]]| {
            polygon_prism(kind, outline, half_height, margin)
        };

        Ok(Self {
            pusher: cylinder_y(PieceKind::Pusher, dims.height * 0.5, a * 0.5, margin)?,
            small_triangle: prism(PieceKind::SmallTriangle, &triangle_outline(a))?,
            medium_triangle: prism(PieceKind::MediumTriangle, &triangle_outline(SQRT_2 * a))?,
            large_triangle: prism(PieceKind::LargeTriangle, &triangle_outline(2.0 * a))?,
            square: prism(PieceKind::Square, &square_outline(a))?,
            parallelogram: prism(PieceKind::Parallelogram, &parallelogram_outline(a))?,
        })
    }

    pub fn get(&self, kind: PieceKind) -> &ShapeTemplate {
        match kind {
            PieceKind::Pusher => &self.pusher,
            PieceKind::SmallTriangle => &self.small_triangle,
            PieceKind::MediumTriangle => &self.medium_triangle,
            PieceKind::LargeTriangle => &self.large_triangle,
            PieceKind::Square => &self.square,
            PieceKind::Parallelogram => &self.parallelogram,
        }
    }
}

/// Right isosceles triangle with legs `leg`, hypotenuse along X, apex on +Z.
pub fn triangle_outline(leg: f32) -> [[f32; 2]; 3] {
    let half_base = leg / SQRT_2;
    let third = leg / (3.0 * SQRT_2);
    [
        [-half_base, -third],
        [half_base, -third],
        [0.0, 2.0 * third],
    ]
}

pub fn square_outline(edge: f32) -> [[f32; 2]; 4] {
    let h = edge * 0.5;
    [[-h, -h], [h, -h], [h, h], [-h, h]]
}

/// Parallelogram with a long side of `√2·edge` along X and short sides of
/// `edge` at 45°.
pub fn parallelogram_outline(edge: f32) -> [[f32; 2]; 4] {
    let s = SQRT_2 * edge;
    let q = s * 0.25;
    [
        [3.0 * q, -q],
        [-q, -q],
        [-3.0 * q, q],
        [q, q],
    ]
}

/// Y-aligned cylinder whose outer surface matches `radius`/`half_height`.
fn cylinder_y(
    kind: PieceKind,
    radius: f32,
    half_height: f32,
    margin: f32,
) -> Result<ShapeTemplate, SceneError> {
    let core_radius = radius - margin;
    let core_half_height = half_height - margin;
    if core_radius <= 0.0 || core_half_height <= 0.0 {
        return Err(SceneError::DegenerateShape {
            kind,
            reason: format!("margin {margin} swallows radius {radius} or half height {half_height}"),
        });
    }

    let shape = if margin > 0.0 {
        SharedShape::round_cylinder(core_half_height, core_radius, margin)
    } else {
        SharedShape::cylinder(half_height, radius)
    };
    Ok(ShapeTemplate::new(shape, margin))
}

/// Extrude a convex outline in the XZ plane into a rounded prism.
fn polygon_prism(
    kind: PieceKind,
    outline: &[[f32; 2]],
    half_height: f32,
    margin: f32,
) -> Result<ShapeTemplate, SceneError> {
    let degenerate = |reason: String| SceneError::DegenerateShape { kind, reason };

    let core_half_height = half_height - margin;
    if core_half_height <= 0.0 {
        return Err(degenerate(format!(
            "margin {margin} swallows half height {half_height}"
        )));
    }

    let core = inset_convex(outline, margin).ok_or_else(|| {
        degenerate(format!("outline collapses when inset by margin {margin}"))
    })?;

    let mut points = Vec::with_capacity(core.len() * 2);
    for [x, z] in &core {
        points.push(Point::new(*x, -core_half_height, *z));
        points.push(Point::new(*x, core_half_height, *z));
    }

    let shape = if margin > 0.0 {
        SharedShape::round_convex_hull(&points, margin)
    } else {
        SharedShape::convex_hull(&points)
    }
    .ok_or_else(|| degenerate("convex hull computation failed".to_string()))?;

    Ok(ShapeTemplate::new(shape, margin))
}

fn signed_area(outline: &[[f32; 2]]) -> f32 {
    let n = outline.len();
    (0..n)
        .map(|i| {
            let [x0, y0] = outline[i];
            let [x1, y1] = outline[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum::<f32>()
        * 0.5
}

/// Move every edge of a convex outline inward by `distance`.
///
/// Returns `None` when the outline is degenerate or the inset flips it.
fn inset_convex(outline: &[[f32; 2]], distance: f32) -> Option<Vec<[f32; 2]>> {
    let n = outline.len();
    if n < 3 {
        return None;
    }
    let area = signed_area(outline);
    if area.abs() <= AREA_EPS {
        return None;
    }
    if distance == 0.0 {
        return Some(outline.to_vec());
    }

    // Outward normal of edge i (from vertex i to i+1), accounting for winding.
    let orient = area.signum();
    let normals: Vec<[f32; 2]> = (0..n)
        .map(|i| {
            let [x0, y0] = outline[i];
            let [x1, y1] = outline[(i + 1) % n];
            let (ex, ey) = (x1 - x0, y1 - y0);
            let len = (ex * ex + ey * ey).sqrt();
            [orient * ey / len, -orient * ex / len]
        })
        .collect();

    let inset: Vec<[f32; 2]> = (0..n)
        .map(|i| {
            let [px, py] = normals[(i + n - 1) % n];
            let [cx, cy] = normals[i];
            let denom = 1.0 + px * cx + py * cy;
            let [x, y] = outline[i];
            [
                x - distance * (px + cx) / denom,
                y - distance * (py + cy) / denom,
            ]
        })
        .collect();

    let inset_area = signed_area(&inset);
    if inset_area * orient <= AREA_EPS || inset_area.abs() >= area.abs() {
        return None;
    }
    Some(inset)
}
