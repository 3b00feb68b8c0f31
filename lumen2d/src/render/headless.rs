//! Command-recording backend.
//!
//! Implements [`GraphicsBackend`] without a GPU: every call is appended
//! to a command log and resource ids are tracked with live/dead
//! accounting. Useful for tests, tooling, and dry-running render passes.

use std::collections::{HashMap, HashSet};

use glam::Mat4;

use crate::math::Vec2;
use crate::render::backend::{
    AttachError, BatchId, BlendMode, FramebufferId, GraphicsBackend, QuadVertex, TextureId,
};

/// One recorded backend call.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    CreateTexture {
        texture: TextureId,
        width: u32,
        height: u32,
        uploaded: bool,
    },
    DeleteTexture(TextureId),
    ReadTexture(TextureId),
    CreateFramebuffer(FramebufferId),
    DeleteFramebuffer(FramebufferId),
    BindFramebuffer(Option<FramebufferId>),
    AttachColorTexture {
        framebuffer: FramebufferId,
        texture: TextureId,
        ok: bool,
    },
    SetProjection(Mat4),
    SetBlendMode(BlendMode),
    Clear([f32; 4]),
    SetOffset(Vec2),
    DrawQuad {
        texture: Option<TextureId>,
        vertices: [QuadVertex; 4],
    },
    DrawFan {
        center: QuadVertex,
        rim: Vec<QuadVertex>,
    },
    BeginBatch(BatchId),
    EndBatch,
    DrawBatch(BatchId),
    DeleteBatch(BatchId),
}

/// Recording [`GraphicsBackend`] with live-resource accounting.
#[derive(Default)]
pub struct HeadlessBackend {
    commands: Vec<Command>,
    next_id: u32,
    textures: HashMap<TextureId, (u32, u32, Vec<u8>)>,
    framebuffers: HashSet<FramebufferId>,
    batches: HashSet<BatchId>,
    recording: Option<BatchId>,
    framebuffers_created: u32,
    /// Number of upcoming attach calls that should report failure.
    fail_attaches: u32,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` attachment attempts fail, simulating
    /// transient target-allocation pressure.
    pub fn fail_next_attaches(&mut self, count: u32) {
        self.fail_attaches = count;
    }

    /// Full command log in issue order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Forget the log so a test can scope assertions to one pass.
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn live_framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn live_batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn framebuffers_created(&self) -> u32 {
        self.framebuffers_created
    }

    /// Whether a batch is currently being recorded.
    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn create_texture(&mut self, width: u32, height: u32, pixels: Option<&[u8]>) -> TextureId {
        let id = TextureId(self.next());
        let data = match pixels {
            Some(p) => p.to_vec(),
            None => vec![0; (width * height * 4) as usize],
        };
        self.textures.insert(id, (width, height, data));
        self.commands.push(Command::CreateTexture {
            texture: id,
            width,
            height,
            uploaded: pixels.is_some(),
        });
        id
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        self.commands.push(Command::DeleteTexture(texture));
    }

    fn read_texture(&mut self, texture: TextureId) -> Vec<u8> {
        self.commands.push(Command::ReadTexture(texture));
        self.textures
            .get(&texture)
            .map(|(_, _, data)| data.clone())
            .unwrap_or_default()
    }

    fn create_framebuffer(&mut self) -> FramebufferId {
        let id = FramebufferId(self.next());
        self.framebuffers.insert(id);
        self.framebuffers_created += 1;
        self.commands.push(Command::CreateFramebuffer(id));
        id
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.framebuffers.remove(&framebuffer);
        self.commands.push(Command::DeleteFramebuffer(framebuffer));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.commands.push(Command::BindFramebuffer(framebuffer));
    }

    fn attach_color_texture(
        &mut self,
        framebuffer: FramebufferId,
        texture: TextureId,
    ) -> Result<(), AttachError> {
        let ok = if self.fail_attaches > 0 {
            self.fail_attaches -= 1;
            false
        } else {
            true
        };
        self.commands.push(Command::AttachColorTexture {
            framebuffer,
            texture,
            ok,
        });
        if ok {
            Ok(())
        } else {
            Err(AttachError)
        }
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.commands.push(Command::SetProjection(projection));
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.commands.push(Command::SetBlendMode(mode));
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.commands.push(Command::Clear(color));
    }

    fn set_offset(&mut self, offset: Vec2) {
        self.commands.push(Command::SetOffset(offset));
    }

    fn draw_quad(&mut self, texture: Option<TextureId>, vertices: [QuadVertex; 4]) {
        self.commands.push(Command::DrawQuad { texture, vertices });
    }

    fn draw_fan(&mut self, center: QuadVertex, rim: &[QuadVertex]) {
        self.commands.push(Command::DrawFan {
            center,
            rim: rim.to_vec(),
        });
    }

    fn begin_batch(&mut self) -> BatchId {
        let id = BatchId(self.next());
        self.batches.insert(id);
        self.recording = Some(id);
        self.commands.push(Command::BeginBatch(id));
        id
    }

    fn end_batch(&mut self) {
        self.recording = None;
        self.commands.push(Command::EndBatch);
    }

    fn draw_batch(&mut self, batch: BatchId) {
        self.commands.push(Command::DrawBatch(batch));
    }

    fn delete_batch(&mut self, batch: BatchId) {
        self.batches.remove(&batch);
        self.commands.push(Command::DeleteBatch(batch));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_accounting() {
        let mut backend = HeadlessBackend::new();
        let tex = backend.create_texture(4, 4, None);
        let fb = backend.create_framebuffer();
        assert_eq!(backend.live_texture_count(), 1);
        assert_eq!(backend.live_framebuffer_count(), 1);

        backend.delete_texture(tex);
        backend.delete_framebuffer(fb);
        assert_eq!(backend.live_texture_count(), 0);
        assert_eq!(backend.live_framebuffer_count(), 0);
        assert_eq!(backend.framebuffers_created(), 1);
    }

    #[test]
    fn test_read_back_uploaded_pixels() {
        let mut backend = HeadlessBackend::new();
        let pixels = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let tex = backend.create_texture(2, 1, Some(&pixels));
        assert_eq!(backend.read_texture(tex), pixels.to_vec());
    }

    #[test]
    fn test_injected_attach_failures_are_consumed() {
        let mut backend = HeadlessBackend::new();
        let tex = backend.create_texture(4, 4, None);
        let fb = backend.create_framebuffer();
        backend.fail_next_attaches(2);

        assert!(backend.attach_color_texture(fb, tex).is_err());
        assert!(backend.attach_color_texture(fb, tex).is_err());
        assert!(backend.attach_color_texture(fb, tex).is_ok());
    }
}
