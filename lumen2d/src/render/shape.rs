use crate::math::{angle_to_point, Vec2};
use crate::render::backend::{GraphicsBackend, QuadVertex};

/// Filled disk drawn as a triangle fan with a radial color gradient.
///
/// Lights use a fully transparent rim so the illumination falls off to
/// nothing at `radius`. More `parts` means a rounder rim at higher
/// vertex cost.
#[derive(Clone, Copy, Debug)]
pub struct Disk {
    pub radius: f32,
    pub center_color: [f32; 4],
    pub rim_color: [f32; 4],
    pub parts: u32,
}

impl Disk {
    pub fn new(radius: f32, center_color: [f32; 4], rim_color: [f32; 4]) -> Self {
        Self {
            radius,
            center_color,
            rim_color,
            parts: 25,
        }
    }

    /// Override the angular subdivision count.
    #[must_use]
    pub fn with_parts(self, parts: u32) -> Self {
        Self { parts, ..self }
    }

    /// Draw centered on `center`, in backend coordinates.
    pub fn draw<B: GraphicsBackend>(&self, backend: &mut B, center: Vec2) {
        backend.set_offset(Vec2::ZERO);

        let degrees_per_part = 360.0 / self.parts as f32;
        let rim: Vec<QuadVertex> = (0..=self.parts)
            .map(|i| {
                let degrees = degrees_per_part * i as f32;
                QuadVertex::flat(angle_to_point(center, degrees, self.radius), self.rim_color)
            })
            .collect();

        backend.draw_fan(QuadVertex::flat(center, self.center_color), &rim);
    }
}

/// Straight line segment, drawn as a thin quad.
#[derive(Clone, Copy, Debug)]
pub struct Line {
    pub width: f32,
    pub color: [f32; 4],
}

impl Line {
    pub fn new(width: f32, color: [f32; 4]) -> Self {
        Self { width, color }
    }

    pub fn draw<B: GraphicsBackend>(&self, backend: &mut B, a: Vec2, b: Vec2) {
        let span = b - a;
        let length = span.length();
        if length == 0.0 {
            return;
        }
        let normal = Vec2::new(-span.y / length, span.x / length) * (self.width / 2.0);

        backend.set_offset(Vec2::ZERO);
        backend.draw_quad(
            None,
            [
                QuadVertex::flat(a - normal, self.color),
                QuadVertex::flat(a + normal, self.color),
                QuadVertex::flat(b + normal, self.color),
                QuadVertex::flat(b - normal, self.color),
            ],
        );
    }
}
