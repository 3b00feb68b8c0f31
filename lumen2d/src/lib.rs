//! Lumen2D - dynamic 2D lighting and shadow casting for immediate-mode
//! backends.
//!
//! Scenes register shadow-casting sprites on a [`Stage`], render each
//! [`Light`] into its own offscreen texture, composite the lights into a
//! lighting layer, and multiply that layer over the drawn frame.

pub mod math;
pub mod render;
pub mod scene;

pub use crate::math::{
    angle_between, angle_to_point, color_from_u8, distance, project_away_from_point, Rect, Vec2,
};
pub use crate::render::{
    BlendMode, Disk, GraphicsBackend, HeadlessBackend, Light, OffscreenSurface, RenderError,
    RenderMode, ShadowQuad, Sprite, Stage, Texture,
};
pub use crate::scene::{LightConfig, SceneConfig};
