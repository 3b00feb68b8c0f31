use glam::Mat4;

use crate::math::Vec2;

/// Opaque handle referencing a texture owned by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) u32);

/// Opaque handle referencing a framebuffer owned by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub(crate) u32);

/// Opaque handle referencing a recorded draw batch (display-list
/// equivalent) owned by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BatchId(pub(crate) u32);

/// Blend equation selection for subsequent draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    /// Standard alpha compositing (src-alpha, one-minus-src-alpha).
    #[default]
    Alpha,
    /// Multiplicative blending (dst-color, zero); darkens.
    Multiply,
    /// Additive "screen" blending (one, one-minus-src-color); lightens.
    Screen,
}

/// One corner of a quad handed to the backend.
///
/// Positions are in backend coordinates (top-left origin, y-down) by the
/// time they reach a draw call. `uv` is ignored for untextured draws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadVertex {
    pub position: Vec2,
    pub uv: Vec2,
    pub color: [f32; 4],
}

impl QuadVertex {
    pub fn new(position: Vec2, uv: Vec2, color: [f32; 4]) -> Self {
        Self {
            position,
            uv,
            color,
        }
    }

    /// Vertex without texture coordinates, for flat-colored geometry.
    pub fn flat(position: Vec2, color: [f32; 4]) -> Self {
        Self {
            position,
            uv: Vec2::ZERO,
            color,
        }
    }
}

/// The backend declined to attach a color target, e.g. under transient
/// memory pressure. Attachment may be retried a bounded number of times.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("backend failed to attach color texture to framebuffer")]
pub struct AttachError;

/// Immediate-mode graphics backend consumed by the lighting engine.
///
/// Window/context creation, input, and presentation live behind this
/// trait; the engine only issues resource management and draw commands.
/// All calls happen on the single render thread, in strict order.
///
/// Commands issued between `begin_batch` and `end_batch` (including
/// `set_offset`) are recorded instead of executed and replayed by
/// `draw_batch`.
pub trait GraphicsBackend {
    /// Allocate a texture, optionally uploading RGBA8 pixel data
    /// (`width * height * 4` bytes). `None` leaves the contents
    /// undefined, for use as a render target.
    fn create_texture(&mut self, width: u32, height: u32, pixels: Option<&[u8]>) -> TextureId;

    fn delete_texture(&mut self, texture: TextureId);

    /// Read back the full RGBA8 contents of a texture.
    fn read_texture(&mut self, texture: TextureId) -> Vec<u8>;

    fn create_framebuffer(&mut self) -> FramebufferId;

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId);

    /// Bind a framebuffer as the render target, or fall back to the
    /// screen target with `None`.
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);

    /// Attach a texture as the bound framebuffer's color target.
    fn attach_color_texture(
        &mut self,
        framebuffer: FramebufferId,
        texture: TextureId,
    ) -> Result<(), AttachError>;

    /// Install the orthographic projection for the 2D scene.
    fn set_projection(&mut self, projection: Mat4);

    fn set_blend_mode(&mut self, mode: BlendMode);

    /// Clear the active render target to `color`.
    fn clear(&mut self, color: [f32; 4]);

    /// Reset the model transform to identity translated by `offset`.
    fn set_offset(&mut self, offset: Vec2);

    /// Draw a quad, textured when `texture` is `Some`.
    fn draw_quad(&mut self, texture: Option<TextureId>, vertices: [QuadVertex; 4]);

    /// Draw a triangle fan from a center vertex through the rim vertices.
    fn draw_fan(&mut self, center: QuadVertex, rim: &[QuadVertex]);

    /// Start recording a draw batch. Nested recording is not supported.
    fn begin_batch(&mut self) -> BatchId;

    fn end_batch(&mut self);

    fn draw_batch(&mut self, batch: BatchId);

    fn delete_batch(&mut self, batch: BatchId);
}
