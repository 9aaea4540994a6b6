//! Drawing data for instruments and rays
//!
//! Nothing here touches a graphics library: the viewer and the terminal
//! output both consume these plain polylines and colors.

use crate::histogram::Histogram2d;
use crate::simulator::{ComponentId, Simulator};
use glam::{DVec2, DVec3};

/// World-frame polylines for one component
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub component: ComponentId,
    pub kind: &'static str,
    pub lines: Vec<Vec<DVec3>>,
}

/// Outlines of every component that has a footprint
pub fn outlines(sim: &Simulator) -> Vec<Outline> {
    sim.components()
        .iter()
        .enumerate()
        .filter_map(|(i, component)| {
            let lines = component.global_outline();
            (!lines.is_empty()).then(|| Outline {
                component: ComponentId::from_index(i),
                kind: component.kind.type_name(),
                lines,
            })
        })
        .collect()
}

/// Local x, y and z axes of every component, each `length` long
pub fn axes(sim: &Simulator, length: f64) -> Vec<[(DVec3, DVec3); 3]> {
    sim.components()
        .iter()
        .map(|component| {
            let origin = component.global.position;
            let tip = |v: DVec3| (origin, origin + component.global.vector_to_global(v) * length);
            [tip(DVec3::X), tip(DVec3::Y), tip(DVec3::Z)]
        })
        .collect()
}

/// Plane the 3D scene is flattened onto; the beam axis z is always horizontal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    /// Looking down y: horizontal z, vertical x
    #[default]
    Top,
    /// Looking along x: horizontal z, vertical y
    Side,
}

impl Projection {
    pub fn project(self, point: DVec3) -> DVec2 {
        match self {
            Projection::Top => DVec2::new(point.z, point.x),
            Projection::Side => DVec2::new(point.z, point.y),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Projection::Top => "top (z, x)",
            Projection::Side => "side (z, y)",
        }
    }
}

/// Axis-aligned 2D bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds2 {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds2 {
    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn include(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Grow by `fraction` of the size on every side; degenerate axes get a unit margin
    pub fn padded(&self, fraction: f64) -> Bounds2 {
        let size = self.size();
        let pad = DVec2::new(
            if size.x > 0.0 { size.x * fraction } else { 0.5 },
            if size.y > 0.0 { size.y * fraction } else { 0.5 },
        );
        Bounds2 {
            min: self.min - pad,
            max: self.max + pad,
        }
    }
}

/// Projected extent of all outlines and component origins
pub fn scene_bounds(sim: &Simulator, projection: Projection) -> Option<Bounds2> {
    let points = sim
        .components()
        .iter()
        .flat_map(|c| {
            let mut pts: Vec<DVec3> = c.global_outline().into_iter().flatten().collect();
            pts.push(c.global.position);
            pts
        })
        .map(|p| projection.project(p));

    points.fold(None, |bounds: Option<Bounds2>, p| {
        let mut b = bounds.unwrap_or(Bounds2 { min: p, max: p });
        b.include(p);
        Some(b)
    })
}

/// "Winter" colormap: blue at 0 through to green at 1, as RGB bytes
pub fn heatmap_color(value: f64) -> [u8; 3] {
    let v = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
    [0, (v * 255.0).round() as u8, ((1.0 - v / 2.0) * 255.0).round() as u8]
}

const SHADES: [char; 5] = [' ', '.', ':', 'o', '#'];

/// Text rendering of a histogram, rows from +y down to -y
pub fn render_ascii(histogram: &Histogram2d) -> String {
    let (nx, ny) = histogram.shape();
    let mut out = String::with_capacity((nx + 3) * (ny + 2));
    let border = format!("+{}+\n", "-".repeat(nx));

    out.push_str(&border);
    for iy in (0..ny).rev() {
        out.push('|');
        for ix in 0..nx {
            let level = histogram.normalized_intensity(ix, iy);
            let shade = if histogram.count(ix, iy) == 0 {
                0
            } else {
                1 + ((level * (SHADES.len() - 2) as f64).round() as usize).min(SHADES.len() - 2)
            };
            out.push(SHADES[shade]);
        }
        out.push_str("|\n");
    }
    out.push_str(&border);
    out
}
