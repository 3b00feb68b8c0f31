use crate::math::Vec2;
use crate::render::backend::{FramebufferId, GraphicsBackend};
use crate::render::error::RenderError;
use crate::render::texture::Texture;

/// Attachment attempts before a target allocation failure is fatal to
/// the current lighting rebuild.
pub const MAX_ATTACH_ATTEMPTS: u32 = 4;

/// Where draw commands currently land.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    Screen,
    Texture,
}

/// Render-target state machine: either drawing to the screen or into an
/// owned offscreen texture.
///
/// Entering texture mode always tears down and replaces the previous
/// framebuffer/texture pair so a stale or wrong-sized attachment can
/// never survive a mode switch. Same-state requests are no-ops.
pub struct OffscreenSurface {
    width: u32,
    height: u32,
    mode: RenderMode,
    framebuffer: Option<FramebufferId>,
    target: Option<Texture>,
}

impl OffscreenSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            mode: RenderMode::Screen,
            framebuffer: None,
            target: None,
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Redirect rendering into a texture.
    ///
    /// `reuse` supplies a caller-owned texture to render into (the
    /// shadow pass starts from a transparent one); otherwise a fresh
    /// target of `size` (default: surface size) is allocated. The
    /// surface owns the target until [`OffscreenSurface::render_to_screen`]
    /// hands it back.
    pub fn render_to_texture<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        reuse: Option<Texture>,
        size: Option<(u32, u32)>,
    ) -> Result<(), RenderError> {
        if self.mode == RenderMode::Texture {
            // No-op, but we were handed ownership: a reuse texture that
            // cannot become the target must not leak.
            if let Some(texture) = reuse {
                texture.release(backend);
            }
            return Ok(());
        }

        if let Some(framebuffer) = self.framebuffer.take() {
            backend.delete_framebuffer(framebuffer);
        }
        if let Some(old) = self.target.take() {
            old.release(backend);
        }

        let (width, height) = size.unwrap_or((self.width, self.height));
        let target = match reuse {
            Some(texture) => texture,
            None => Texture::empty(backend, width, height),
        };

        let framebuffer = backend.create_framebuffer();
        backend.bind_framebuffer(Some(framebuffer));

        let mut attempts = 0;
        loop {
            attempts += 1;
            match backend.attach_color_texture(framebuffer, target.id()) {
                Ok(()) => break,
                Err(_) if attempts < MAX_ATTACH_ATTEMPTS => {
                    log::warn!("render target attachment failed (attempt {attempts}), retrying");
                }
                Err(_) => {
                    log::warn!("render target attachment failed (attempt {attempts}), giving up");
                    backend.bind_framebuffer(None);
                    backend.delete_framebuffer(framebuffer);
                    target.release(backend);
                    return Err(RenderError::TargetAllocation { attempts });
                }
            }
        }

        self.framebuffer = Some(framebuffer);
        self.target = Some(target);
        self.mode = RenderMode::Texture;
        Ok(())
    }

    /// Fall back to the screen target and hand the rendered texture to
    /// the caller. Returns `None` when already rendering to the screen.
    ///
    /// The texture's draw batch is rebaked first; its contents changed
    /// underneath the batch while it was a render target.
    pub fn render_to_screen<B: GraphicsBackend>(&mut self, backend: &mut B) -> Option<Texture> {
        if self.mode == RenderMode::Screen {
            return None;
        }

        backend.bind_framebuffer(None);
        self.mode = RenderMode::Screen;

        let mut target = self.target.take()?;
        target.rebake(backend);
        Some(target)
    }

    /// Clear the active target and reset the transform. Call after
    /// entering texture mode, before drawing into it.
    pub fn fill<B: GraphicsBackend>(&self, backend: &mut B, color: [f32; 4]) {
        backend.clear(color);
        backend.set_offset(Vec2::ZERO);
    }

    /// Free whatever the surface still holds.
    pub fn release<B: GraphicsBackend>(&mut self, backend: &mut B) {
        if let Some(framebuffer) = self.framebuffer.take() {
            backend.delete_framebuffer(framebuffer);
        }
        if let Some(target) = self.target.take() {
            target.release(backend);
        }
    }
}
