use image::RgbaImage;

use crate::math::{Rect, Vec2};
use crate::render::backend::{GraphicsBackend, QuadVertex};
use crate::render::shadow::ShadowQuad;
use crate::render::texture::Texture;

/// A drawable image that can block light.
///
/// `footprint` marks the physical base that casts shadows, in
/// sprite-local coordinates; without one the full bounding box is the
/// base. `square_shadow` selects the opaque flat-color shadow used for
/// solid casters (walls) over the textured fading silhouette used for
/// thin ones (characters).
pub struct Sprite {
    texture: Texture,
    pub footprint: Option<Rect>,
    pub square_shadow: bool,
    white_variant: Option<Box<Sprite>>,
}

impl Sprite {
    pub fn new(texture: Texture, footprint: Option<Rect>, square_shadow: bool) -> Self {
        Self {
            texture,
            footprint,
            square_shadow,
            white_variant: None,
        }
    }

    /// Decode-and-upload convenience for plain sprites.
    pub fn from_image<B: GraphicsBackend>(backend: &mut B, image: &RgbaImage) -> Self {
        Self::new(Texture::from_image(backend, image), None, false)
    }

    /// Emissive sprite: the image's silhouette recolored to a glow
    /// color, for drawing into a lighting layer.
    pub fn glower<B: GraphicsBackend>(
        backend: &mut B,
        image: &RgbaImage,
        color: [u8; 4],
    ) -> Self {
        let mut pixels = image.as_raw().clone();
        for px in pixels.chunks_exact_mut(4) {
            let alpha = px[3];
            px.copy_from_slice(&color);
            px[3] = alpha.min(color[3]);
        }
        let texture = Texture::from_rgba(backend, &pixels, image.width(), image.height());
        Self::new(texture, None, false)
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn width(&self) -> f32 {
        self.texture.width() as f32
    }

    pub fn height(&self) -> f32 {
        self.texture.height() as f32
    }

    /// The longer of width and height; pads the shadow culling radius.
    pub fn longest_side(&self) -> f32 {
        if self.height() > self.width() {
            self.height()
        } else {
            self.width()
        }
    }

    /// Center of the sprite placed at `dest`, in scene coordinates.
    pub fn center(&self, dest: Vec2) -> Vec2 {
        Vec2::new(dest.x + self.width() / 2.0, dest.y + self.height() / 2.0)
    }

    /// Draw at `dest` in backend coordinates.
    pub fn draw<B: GraphicsBackend>(&self, backend: &mut B, dest: Vec2) {
        self.texture.draw(backend, dest);
    }

    /// Draw this caster's shadow quad. All four points are already in
    /// backend coordinates.
    ///
    /// Inside an enclosed space the shadow is fully opaque end to end;
    /// outside it starts at 0.6 alpha on the base edge and fades to
    /// nothing at the far edge.
    pub fn draw_shadow<B: GraphicsBackend>(&self, backend: &mut B, quad: &ShadowQuad, inside: bool) {
        let base_alpha = if inside { 1.0 } else { 0.6 };
        let far_alpha = if inside { 1.0 } else { 0.0 };

        backend.set_offset(Vec2::ZERO);

        if self.square_shadow {
            let color = [0.0, 0.0, 0.0, base_alpha];
            backend.draw_quad(
                None,
                [
                    QuadVertex::flat(quad.base1, color),
                    QuadVertex::flat(quad.far1, color),
                    QuadVertex::flat(quad.far2, color),
                    QuadVertex::flat(quad.base2, color),
                ],
            );
        } else {
            backend.draw_quad(
                Some(self.texture.id()),
                [
                    QuadVertex::new(quad.base1, Vec2::new(0.0, 0.0), [0.0, 0.0, 0.0, base_alpha]),
                    QuadVertex::new(quad.far1, Vec2::new(0.0, 1.0), [0.0, 0.0, 0.0, far_alpha]),
                    QuadVertex::new(quad.far2, Vec2::new(1.0, 1.0), [0.0, 0.0, 0.0, far_alpha]),
                    QuadVertex::new(quad.base2, Vec2::new(1.0, 0.0), [0.0, 0.0, 0.0, base_alpha]),
                ],
            );
        }
    }

    /// The white silhouette used to occlude light at the caster's
    /// visible pixels: fully opaque pixels become solid white, fully
    /// transparent pixels stay transparent (binary threshold on alpha).
    ///
    /// Computed once per sprite and cached; the pixel readback is the
    /// expensive part.
    pub fn white_variant<B: GraphicsBackend>(&mut self, backend: &mut B) -> &Sprite {
        if self.white_variant.is_none() {
            let pixels = backend.read_texture(self.texture.id());
            let mut white = vec![0u8; pixels.len()];
            let src: &[[u8; 4]] = bytemuck::cast_slice(&pixels);
            let dst: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut white);
            for (src_px, dst_px) in src.iter().zip(dst.iter_mut()) {
                if src_px[3] != 0 {
                    *dst_px = [255, 255, 255, 255];
                }
            }

            let texture = Texture::from_rgba(
                backend,
                &white,
                self.texture.width(),
                self.texture.height(),
            );
            self.white_variant = Some(Box::new(Sprite::new(
                texture,
                self.footprint,
                self.square_shadow,
            )));
        }

        match self.white_variant.as_deref() {
            Some(variant) => variant,
            None => unreachable!("white variant populated above"),
        }
    }

    /// The cached white variant, if one has been computed.
    pub fn cached_white_variant(&self) -> Option<&Sprite> {
        self.white_variant.as_deref()
    }

    /// Free the sprite's texture and any cached white variant.
    pub fn release<B: GraphicsBackend>(self, backend: &mut B) {
        if let Some(white) = self.white_variant {
            white.release(backend);
        }
        self.texture.release(backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::{Command, HeadlessBackend};

    fn sprite_from_pixels(backend: &mut HeadlessBackend, pixels: &[u8], w: u32, h: u32) -> Sprite {
        Sprite::new(Texture::from_rgba(backend, pixels, w, h), None, false)
    }

    #[test]
    fn test_longest_side() {
        let mut backend = HeadlessBackend::new();
        let tall = sprite_from_pixels(&mut backend, &[0; 32], 2, 4);
        assert_eq!(tall.longest_side(), 4.0);
        let wide = sprite_from_pixels(&mut backend, &[0; 32], 4, 2);
        assert_eq!(wide.longest_side(), 4.0);
    }

    #[test]
    fn test_center() {
        let mut backend = HeadlessBackend::new();
        let sprite = sprite_from_pixels(&mut backend, &[0; 64], 4, 4);
        let c = sprite.center(Vec2::new(10.0, 20.0));
        assert_eq!(c, Vec2::new(12.0, 22.0));
    }

    #[test]
    fn test_white_variant_thresholds_alpha() {
        let mut backend = HeadlessBackend::new();
        // One opaque red pixel, one transparent, one half-transparent.
        let pixels = [255, 0, 0, 255, 9, 9, 9, 0, 7, 7, 7, 128];
        let mut sprite = sprite_from_pixels(&mut backend, &pixels, 3, 1);

        let white_id = sprite.white_variant(&mut backend).texture().id();
        let white = backend.read_texture(white_id);
        assert_eq!(&white[0..4], &[255, 255, 255, 255]);
        assert_eq!(&white[4..8], &[0, 0, 0, 0]);
        // Anything nonzero counts as opaque; no partial handling.
        assert_eq!(&white[8..12], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_white_variant_is_memoized() {
        let mut backend = HeadlessBackend::new();
        let mut sprite = sprite_from_pixels(&mut backend, &[255; 16], 2, 2);

        let first = sprite.white_variant(&mut backend).texture().id();
        let second = sprite.white_variant(&mut backend).texture().id();
        assert_eq!(first, second);

        let readbacks = backend
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::ReadTexture(_)))
            .count();
        assert_eq!(readbacks, 1);
    }

    #[test]
    fn test_textured_shadow_fades_outside() {
        let mut backend = HeadlessBackend::new();
        let sprite = sprite_from_pixels(&mut backend, &[255; 16], 2, 2);
        let quad = ShadowQuad {
            base1: Vec2::new(0.0, 0.0),
            base2: Vec2::new(2.0, 0.0),
            far1: Vec2::new(0.0, 4.0),
            far2: Vec2::new(2.0, 4.0),
        };
        backend.clear_commands();
        sprite.draw_shadow(&mut backend, &quad, false);

        let Some(Command::DrawQuad { texture, vertices }) = backend
            .commands()
            .iter()
            .find(|c| matches!(c, Command::DrawQuad { .. }))
        else {
            panic!("no quad drawn");
        };
        assert!(texture.is_some());
        assert_eq!(vertices[0].color[3], 0.6);
        assert_eq!(vertices[1].color[3], 0.0);
        assert_eq!(vertices[2].color[3], 0.0);
        assert_eq!(vertices[3].color[3], 0.6);
    }

    #[test]
    fn test_textured_shadow_stays_opaque_inside() {
        let mut backend = HeadlessBackend::new();
        let sprite = sprite_from_pixels(&mut backend, &[255; 16], 2, 2);
        let quad = ShadowQuad {
            base1: Vec2::new(0.0, 0.0),
            base2: Vec2::new(2.0, 0.0),
            far1: Vec2::new(0.0, 4.0),
            far2: Vec2::new(2.0, 4.0),
        };
        backend.clear_commands();
        sprite.draw_shadow(&mut backend, &quad, true);

        let Some(Command::DrawQuad { vertices, .. }) = backend
            .commands()
            .iter()
            .find(|c| matches!(c, Command::DrawQuad { .. }))
        else {
            panic!("no quad drawn");
        };
        for v in vertices {
            assert_eq!(v.color[3], 1.0);
        }
    }

    #[test]
    fn test_square_shadow_is_flat_and_untextured() {
        let mut backend = HeadlessBackend::new();
        let mut sprite = sprite_from_pixels(&mut backend, &[255; 16], 2, 2);
        sprite.square_shadow = true;
        let quad = ShadowQuad {
            base1: Vec2::new(0.0, 0.0),
            base2: Vec2::new(2.0, 0.0),
            far1: Vec2::new(0.0, 4.0),
            far2: Vec2::new(2.0, 4.0),
        };
        backend.clear_commands();
        sprite.draw_shadow(&mut backend, &quad, false);

        let Some(Command::DrawQuad { texture, vertices }) = backend
            .commands()
            .iter()
            .find(|c| matches!(c, Command::DrawQuad { .. }))
        else {
            panic!("no quad drawn");
        };
        assert!(texture.is_none());
        for v in vertices {
            assert_eq!(v.color, [0.0, 0.0, 0.0, 0.6]);
        }
    }

    #[test]
    fn test_glower_recolors_silhouette() {
        let mut backend = HeadlessBackend::new();
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, image::Rgba([10, 20, 30, 255]));
        image.put_pixel(1, 0, image::Rgba([10, 20, 30, 0]));

        let glower = Sprite::glower(&mut backend, &image, [255, 200, 0, 255]);
        let pixels = backend.read_texture(glower.texture().id());
        assert_eq!(&pixels[0..4], &[255, 200, 0, 255]);
        assert_eq!(pixels[7], 0);
    }
}
