use std::collections::HashMap;

use glam::Mat4;

use crate::math::Vec2;
use crate::render::backend::{BlendMode, GraphicsBackend};
use crate::render::casters::ShadowcasterSet;
use crate::render::error::RenderError;
use crate::render::light::Light;
use crate::render::shadow::{
    resolve_shadow_quad, ShadowQuad, PROJECTION_FACTOR, PROJECTION_FACTOR_INSIDE,
};
use crate::render::shape::{Disk, Line};
use crate::render::sprite::Sprite;
use crate::render::surface::OffscreenSurface;
use crate::render::texture::Texture;

/// Key under which [`Stage::build_lighting`] stores its layer.
pub const MAIN_LAYER: &str = "main";

/// Shared rendering state for one scene: viewport, ambient color,
/// render-target and blend mode, the shadowcaster registry, and the
/// composited lighting layers.
///
/// Everything runs on the one render thread; the stage is handed by
/// reference to whatever needs to draw, there is no ambient global
/// state.
pub struct Stage {
    width: u32,
    height: u32,
    environment_color: [f32; 4],
    inside: bool,
    blend: BlendMode,
    surface: OffscreenSurface,
    casters: ShadowcasterSet,
    layers: HashMap<String, Texture>,
}

impl Stage {
    /// Set up a stage for a `width` x `height` viewport and install the
    /// 2D orthographic projection on the backend.
    ///
    /// `environment_color` is the ambient base: visible wherever no
    /// light reaches once a lighting layer is applied.
    pub fn new<B: GraphicsBackend>(
        backend: &mut B,
        width: u32,
        height: u32,
        environment_color: [f32; 4],
    ) -> Self {
        backend.set_projection(Mat4::orthographic_rh_gl(
            0.0,
            width as f32,
            0.0,
            height as f32,
            -1.0,
            1.0,
        ));
        backend.set_blend_mode(BlendMode::Alpha);

        Self {
            width,
            height,
            environment_color,
            inside: false,
            blend: BlendMode::Alpha,
            surface: OffscreenSurface::new(width, height),
            casters: ShadowcasterSet::new(),
            layers: HashMap::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn environment_color(&self) -> [f32; 4] {
        self.environment_color
    }

    pub fn set_environment_color(&mut self, color: [f32; 4]) {
        self.environment_color = color;
    }

    pub fn inside(&self) -> bool {
        self.inside
    }

    /// Mark the scene as an enclosed space: shadows get pushed
    /// off-screen instead of fading, and stay opaque end to end.
    pub fn set_inside(&mut self, inside: bool) {
        self.inside = inside;
    }

    pub fn surface_mut(&mut self) -> &mut OffscreenSurface {
        &mut self.surface
    }

    pub fn casters(&self) -> &ShadowcasterSet {
        &self.casters
    }

    /// Scene coordinates (bottom-left origin, y-up) to backend
    /// coordinates (top-left origin, y-down). `extra` is the drawable's
    /// height for texture-like sources, zero for plain geometry.
    pub fn to_backend(&self, point: Vec2, extra: f32) -> Vec2 {
        Vec2::new(point.x, self.height as f32 - point.y - extra)
    }

    /// Switch the backend blend mode. Switching to the already-active
    /// mode issues no backend call.
    pub fn set_blend<B: GraphicsBackend>(&mut self, backend: &mut B, mode: BlendMode) {
        if mode != self.blend {
            backend.set_blend_mode(mode);
            self.blend = mode;
        }
    }

    pub fn blend(&self) -> BlendMode {
        self.blend
    }

    /// Clear the active target and reset the transform.
    pub fn fill<B: GraphicsBackend>(&self, backend: &mut B, color: [f32; 4]) {
        self.surface.fill(backend, color);
    }

    pub fn draw_sprite<B: GraphicsBackend>(&self, backend: &mut B, sprite: &Sprite, dest: Vec2) {
        sprite.draw(backend, self.to_backend(dest, sprite.height()));
    }

    pub fn draw_texture<B: GraphicsBackend>(&self, backend: &mut B, texture: &Texture, dest: Vec2) {
        texture.draw(backend, self.to_backend(dest, texture.height() as f32));
    }

    pub fn draw_disk<B: GraphicsBackend>(&self, backend: &mut B, disk: &Disk, center: Vec2) {
        disk.draw(backend, self.to_backend(center, 0.0));
    }

    pub fn draw_line<B: GraphicsBackend>(&self, backend: &mut B, line: &Line, a: Vec2, b: Vec2) {
        line.draw(backend, self.to_backend(a, 0.0), self.to_backend(b, 0.0));
    }

    /// Compute and draw one caster's shadow quad for a light at
    /// `light_pos`. Projection length follows the inside flag.
    pub fn draw_shadow<B: GraphicsBackend>(
        &self,
        backend: &mut B,
        light_pos: Vec2,
        sprite: &Sprite,
        dest: Vec2,
    ) {
        let factor = if self.inside {
            PROJECTION_FACTOR_INSIDE
        } else {
            PROJECTION_FACTOR
        };
        let length = sprite.height() * factor;
        let quad = resolve_shadow_quad(light_pos, sprite, dest, length);
        let quad = ShadowQuad {
            base1: self.to_backend(quad.base1, 0.0),
            base2: self.to_backend(quad.base2, 0.0),
            far1: self.to_backend(quad.far1, 0.0),
            far2: self.to_backend(quad.far2, 0.0),
        };
        sprite.draw_shadow(backend, &quad, self.inside);
    }

    /// Replace the set of shadow-casting sprites. Rebuilds the white
    /// silhouette batch; the previous set is released wholesale.
    pub fn set_shadowcasters<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        entries: Vec<(Sprite, Vec2)>,
    ) {
        let viewport_height = self.height as f32;
        self.casters.rebuild(backend, viewport_height, entries);
    }

    /// Draw the pre-baked white silhouettes of every registered caster.
    pub fn draw_white_casters<B: GraphicsBackend>(&self, backend: &mut B) {
        self.casters.draw(backend);
    }

    /// Composite every light's rendered texture into the `"main"`
    /// lighting layer.
    pub fn build_lighting<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        lights: &[Light],
    ) -> Result<(), RenderError> {
        self.build_lighting_layer(backend, lights, MAIN_LAYER)
    }

    /// Composite every light into a named lighting layer.
    ///
    /// The layer starts from the environment color, accumulates each
    /// light with additive screen blending, and replaces any previous
    /// layer under `key`. Zero lights is valid and leaves the layer
    /// uniformly ambient. Fails with [`RenderError::LightNotRendered`]
    /// if any light has not been rendered this scene.
    pub fn build_lighting_layer<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        lights: &[Light],
        key: &str,
    ) -> Result<(), RenderError> {
        log::debug!("building lighting layer {key:?} from {} lights", lights.len());
        self.surface.render_to_texture(backend, None, None)?;
        let environment = self.environment_color;
        self.fill(backend, environment);

        self.set_blend(backend, BlendMode::Screen);
        for light in lights {
            let result = match light.texture() {
                Some(texture) => {
                    let dest = self.to_backend(Vec2::ZERO, texture.height() as f32);
                    texture.draw(backend, dest);
                    Ok(())
                }
                None => Err(RenderError::LightNotRendered),
            };
            if result.is_err() {
                self.set_blend(backend, BlendMode::Alpha);
                // Hand the partial target back before bailing out, so
                // later draws hit the screen and nothing leaks.
                if let Some(partial) = self.surface.render_to_screen(backend) {
                    partial.release(backend);
                }
                return result;
            }
        }
        self.set_blend(backend, BlendMode::Alpha);

        let layer = self
            .surface
            .render_to_screen(backend)
            .ok_or(RenderError::PassNotActive)?;
        if let Some(old) = self.layers.insert(key.to_string(), layer) {
            old.release(backend);
        }
        Ok(())
    }

    /// Multiply the `"main"` lighting layer over the rendered scene.
    pub fn draw_lighting<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        offset: Vec2,
    ) -> Result<(), RenderError> {
        self.draw_lighting_layer(backend, MAIN_LAYER, offset)
    }

    /// Multiply a named lighting layer over the rendered scene.
    pub fn draw_lighting_layer<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        key: &str,
        offset: Vec2,
    ) -> Result<(), RenderError> {
        if !self.layers.contains_key(key) {
            return Err(RenderError::LightNotRendered);
        }

        self.set_blend(backend, BlendMode::Multiply);
        if let Some(layer) = self.layers.get(key) {
            let dest = self.to_backend(offset, layer.height() as f32);
            layer.draw(backend, dest);
        }
        self.set_blend(backend, BlendMode::Alpha);
        Ok(())
    }

    /// The composited layer under `key`, if it has been built.
    pub fn lighting_layer(&self, key: &str) -> Option<&Texture> {
        self.layers.get(key)
    }

    /// Release every backend resource the stage still owns.
    pub fn release<B: GraphicsBackend>(mut self, backend: &mut B) {
        for (_, layer) in self.layers.drain() {
            layer.release(backend);
        }
        self.casters.clear(backend);
        self.surface.release(backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::{Command, HeadlessBackend};
    use crate::render::surface::RenderMode;

    fn stage(backend: &mut HeadlessBackend) -> Stage {
        Stage::new(backend, 200, 100, [0.1, 0.1, 0.2, 1.0])
    }

    #[test]
    fn test_to_backend_flips_y() {
        let mut backend = HeadlessBackend::new();
        let stage = stage(&mut backend);
        assert_eq!(
            stage.to_backend(Vec2::new(10.0, 30.0), 0.0),
            Vec2::new(10.0, 70.0)
        );
        // Texture-likes subtract their height as well.
        assert_eq!(
            stage.to_backend(Vec2::new(10.0, 30.0), 16.0),
            Vec2::new(10.0, 54.0)
        );
    }

    #[test]
    fn test_set_blend_is_idempotent() {
        let mut backend = HeadlessBackend::new();
        let mut stage = stage(&mut backend);
        backend.clear_commands();

        stage.set_blend(&mut backend, BlendMode::Alpha);
        assert!(backend.commands().is_empty());

        stage.set_blend(&mut backend, BlendMode::Multiply);
        stage.set_blend(&mut backend, BlendMode::Multiply);
        let switches = backend
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::SetBlendMode(_)))
            .count();
        assert_eq!(switches, 1);
    }

    #[test]
    fn test_empty_light_list_builds_ambient_layer() {
        let mut backend = HeadlessBackend::new();
        let mut stage = stage(&mut backend);

        stage.build_lighting(&mut backend, &[]).unwrap();
        assert!(stage.lighting_layer(MAIN_LAYER).is_some());

        // The layer pass cleared to the environment color and drew no
        // light textures.
        assert!(backend
            .commands()
            .iter()
            .any(|c| *c == Command::Clear([0.1, 0.1, 0.2, 1.0])));
        stage.release(&mut backend);
    }

    #[test]
    fn test_build_lighting_rejects_unrendered_lights() {
        let mut backend = HeadlessBackend::new();
        let mut stage = stage(&mut backend);
        let unrendered = Light::new([1.0; 4], 50.0, false);

        let err = stage.build_lighting(&mut backend, &[unrendered]);
        assert!(matches!(err, Err(RenderError::LightNotRendered)));
        // Blending and the screen target were restored before bailing
        // out, and the partial layer target was released.
        assert_eq!(stage.blend(), BlendMode::Alpha);
        assert_eq!(stage.surface_mut().mode(), RenderMode::Screen);
        let last_bind = backend
            .commands()
            .iter()
            .rev()
            .find_map(|c| match c {
                Command::BindFramebuffer(fb) => Some(*fb),
                _ => None,
            });
        assert_eq!(last_bind, Some(None));
        assert_eq!(backend.live_texture_count(), 0);
        stage.release(&mut backend);
    }

    #[test]
    fn test_draw_lighting_without_build_fails() {
        let mut backend = HeadlessBackend::new();
        let mut stage = stage(&mut backend);
        let err = stage.draw_lighting(&mut backend, Vec2::ZERO);
        assert!(matches!(err, Err(RenderError::LightNotRendered)));
        stage.release(&mut backend);
    }

    #[test]
    fn test_draw_lighting_wraps_draw_in_multiply_blend() {
        let mut backend = HeadlessBackend::new();
        let mut stage = stage(&mut backend);
        stage.build_lighting(&mut backend, &[]).unwrap();
        backend.clear_commands();

        stage.draw_lighting(&mut backend, Vec2::ZERO).unwrap();
        let modes: Vec<_> = backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::SetBlendMode(m) => Some(*m),
                _ => None,
            })
            .collect();
        assert_eq!(modes, vec![BlendMode::Multiply, BlendMode::Alpha]);
        assert!(backend
            .commands()
            .iter()
            .any(|c| matches!(c, Command::DrawBatch(_))));
        stage.release(&mut backend);
    }

    #[test]
    fn test_rebuilding_a_layer_releases_the_old_one() {
        let mut backend = HeadlessBackend::new();
        let mut stage = stage(&mut backend);

        stage.build_lighting(&mut backend, &[]).unwrap();
        let live = backend.live_texture_count();
        stage.build_lighting(&mut backend, &[]).unwrap();
        assert_eq!(backend.live_texture_count(), live);

        stage.release(&mut backend);
        assert_eq!(backend.live_texture_count(), 0);
    }

    #[test]
    fn test_named_layers_are_independent() {
        let mut backend = HeadlessBackend::new();
        let mut stage = stage(&mut backend);

        stage
            .build_lighting_layer(&mut backend, &[], "background")
            .unwrap();
        assert!(stage.lighting_layer("background").is_some());
        assert!(stage.lighting_layer(MAIN_LAYER).is_none());

        let err = stage.draw_lighting(&mut backend, Vec2::ZERO);
        assert!(matches!(err, Err(RenderError::LightNotRendered)));
        assert!(stage
            .draw_lighting_layer(&mut backend, "background", Vec2::ZERO)
            .is_ok());
        stage.release(&mut backend);
    }

    #[test]
    fn test_release_frees_everything() {
        let mut backend = HeadlessBackend::new();
        let mut stage = stage(&mut backend);
        stage.build_lighting(&mut backend, &[]).unwrap();
        stage
            .build_lighting_layer(&mut backend, &[], "aux")
            .unwrap();

        stage.release(&mut backend);
        assert_eq!(backend.live_texture_count(), 0);
        assert_eq!(backend.live_framebuffer_count(), 0);
        assert_eq!(backend.live_batch_count(), 0);
    }
}
