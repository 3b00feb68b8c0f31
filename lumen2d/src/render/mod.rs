mod backend;
mod casters;
mod error;
mod headless;
mod light;
mod shadow;
mod shape;
mod sprite;
mod stage;
mod surface;
mod texture;

pub use backend::{
    AttachError, BatchId, BlendMode, FramebufferId, GraphicsBackend, QuadVertex, TextureId,
};
pub use casters::{Shadowcaster, ShadowcasterSet};
pub use error::RenderError;
pub use headless::{Command, HeadlessBackend};
pub use light::Light;
pub use shadow::{
    resolve_base_points, resolve_shadow_quad, ShadowQuad, PROJECTION_FACTOR,
    PROJECTION_FACTOR_INSIDE,
};
pub use shape::{Disk, Line};
pub use sprite::Sprite;
pub use stage::{Stage, MAIN_LAYER};
pub use surface::{OffscreenSurface, RenderMode, MAX_ATTACH_ATTEMPTS};
pub use texture::Texture;
pub use crate::math::Vec2;
