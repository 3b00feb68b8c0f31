use std::path::Path;

use image::RgbaImage;

use crate::math::Vec2;
use crate::render::backend::{BatchId, GraphicsBackend, QuadVertex, TextureId};
use crate::render::error::RenderError;

/// A backend texture together with its baked draw batch.
///
/// The batch replays a single textured quad at the origin; drawing
/// translates to the destination first. After the texture has been used
/// as a render target its contents changed under the batch, so the
/// surface manager rebakes it before handing it back out.
///
/// Owns both backend resources exclusively. Call [`Texture::release`]
/// before dropping a superseded texture; the backend does not collect
/// garbage.
pub struct Texture {
    id: TextureId,
    batch: BatchId,
    width: u32,
    height: u32,
    alpha: f32,
}

impl Texture {
    /// Allocate a texture with undefined contents, for render targets.
    pub fn empty<B: GraphicsBackend>(backend: &mut B, width: u32, height: u32) -> Self {
        let id = backend.create_texture(width, height, None);
        let batch = bake_quad(backend, id, width, height, 1.0);
        Self {
            id,
            batch,
            width,
            height,
            alpha: 1.0,
        }
    }

    /// Upload raw RGBA8 pixels (`width * height * 4` bytes).
    pub fn from_rgba<B: GraphicsBackend>(
        backend: &mut B,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Self {
        let id = backend.create_texture(width, height, Some(pixels));
        let batch = bake_quad(backend, id, width, height, 1.0);
        Self {
            id,
            batch,
            width,
            height,
            alpha: 1.0,
        }
    }

    /// Upload a decoded image.
    pub fn from_image<B: GraphicsBackend>(backend: &mut B, image: &RgbaImage) -> Self {
        Self::from_rgba(backend, image.as_raw(), image.width(), image.height())
    }

    /// Fully transparent texture, the blank slate for shadow passes.
    pub fn transparent<B: GraphicsBackend>(backend: &mut B, width: u32, height: u32) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&[255, 255, 255, 0]);
        }
        Self::from_rgba(backend, &pixels, width, height)
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Change the whole-texture alpha. Rebakes the draw batch only when
    /// the value actually changed.
    pub fn set_alpha<B: GraphicsBackend>(&mut self, backend: &mut B, alpha: f32) {
        if alpha != self.alpha {
            self.alpha = alpha;
            self.rebake(backend);
        }
    }

    /// Re-record the draw batch. Required after the texture served as a
    /// render target so draws pick up the new contents.
    pub fn rebake<B: GraphicsBackend>(&mut self, backend: &mut B) {
        backend.delete_batch(self.batch);
        self.batch = bake_quad(backend, self.id, self.width, self.height, self.alpha);
    }

    /// Draw at `dest` in backend coordinates.
    pub fn draw<B: GraphicsBackend>(&self, backend: &mut B, dest: Vec2) {
        backend.set_offset(dest);
        backend.draw_batch(self.batch);
    }

    /// Debug utility: read the texture back and write it as a PNG.
    ///
    /// The readback arrives bottom-up; rows are flipped before encoding.
    pub fn save<B: GraphicsBackend>(&self, backend: &mut B, path: &Path) -> Result<(), RenderError> {
        let pixels = backend.read_texture(self.id);
        let row = (self.width * 4) as usize;
        let mut flipped = Vec::with_capacity(pixels.len());
        for chunk in pixels.chunks(row).rev() {
            flipped.extend_from_slice(chunk);
        }
        let image = RgbaImage::from_raw(self.width, self.height, flipped)
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height));
        image.save(path)?;
        Ok(())
    }

    /// Free the backend texture and batch.
    pub fn release<B: GraphicsBackend>(self, backend: &mut B) {
        backend.delete_batch(self.batch);
        backend.delete_texture(self.id);
    }
}

fn bake_quad<B: GraphicsBackend>(
    backend: &mut B,
    texture: TextureId,
    width: u32,
    height: u32,
    alpha: f32,
) -> BatchId {
    let w = width as f32;
    let h = height as f32;
    let color = [1.0, 1.0, 1.0, alpha];

    let batch = backend.begin_batch();
    backend.draw_quad(
        Some(texture),
        [
            QuadVertex::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 0.0), color),
            QuadVertex::new(Vec2::new(0.0, h), Vec2::new(0.0, 1.0), color),
            QuadVertex::new(Vec2::new(w, h), Vec2::new(1.0, 1.0), color),
            QuadVertex::new(Vec2::new(w, 0.0), Vec2::new(1.0, 0.0), color),
        ],
    );
    backend.end_batch();
    batch
}
