use crate::math::{distance, Vec2};
use crate::render::backend::{BlendMode, GraphicsBackend};
use crate::render::error::RenderError;
use crate::render::shape::Disk;
use crate::render::stage::Stage;
use crate::render::texture::Texture;

/// A point light.
///
/// `strength` is both the radius of the illumination disk and, halved,
/// the distance out to which shadowcasters are considered. The light
/// owns its last rendered texture; `tex` stays empty until
/// [`Light::render`] succeeds, and drawing before that is an error.
pub struct Light {
    pub color: [f32; 4],
    pub strength: f32,
    pub visibility_distance: f32,
    pub shadows: bool,
    disk: Disk,
    tex: Option<Texture>,
}

impl Light {
    pub fn new(color: [f32; 4], strength: f32, shadows: bool) -> Self {
        Self {
            color,
            strength,
            visibility_distance: strength * 0.5,
            shadows,
            disk: Disk::new(strength, color, [0.0, 0.0, 0.0, 0.0]),
            tex: None,
        }
    }

    /// The rendered illumination+shadow texture, once `render` has run.
    pub fn texture(&self) -> Option<&Texture> {
        self.tex.as_ref()
    }

    pub fn is_rendered(&self) -> bool {
        self.tex.is_some()
    }

    /// Draw the rendered light texture at `pos`.
    pub fn draw<B: GraphicsBackend>(
        &self,
        backend: &mut B,
        stage: &Stage,
        pos: Vec2,
    ) -> Result<(), RenderError> {
        match &self.tex {
            Some(tex) => {
                stage.draw_texture(backend, tex, pos);
                Ok(())
            }
            None => Err(RenderError::LightNotRendered),
        }
    }

    /// Render this light's full contribution at `pos` into its cached
    /// texture.
    ///
    /// Two offscreen passes: first the shadow layer (every caster in
    /// reach gets a shadow quad, then the white silhouettes go on top),
    /// then the illumination disk over the environment color, darkened
    /// by multiply-blending the shadow layer onto it. The previous
    /// cached texture is released up front.
    pub fn render<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        stage: &mut Stage,
        pos: Vec2,
    ) -> Result<(), RenderError> {
        if let Some(old) = self.tex.take() {
            old.release(backend);
        }

        // Shadow layer, over a blank transparent target.
        let target = Texture::transparent(backend, stage.width(), stage.height());
        stage
            .surface_mut()
            .render_to_texture(backend, Some(target), None)?;

        if self.shadows {
            for caster in stage.casters().entries() {
                let reach = self.visibility_distance + caster.sprite.longest_side();
                if distance(pos, caster.sprite.center(caster.position)) < reach {
                    stage.draw_shadow(backend, pos, &caster.sprite, caster.position);
                }
            }
            stage.draw_white_casters(backend);
        }

        let shadow_tex = stage
            .surface_mut()
            .render_to_screen(backend)
            .ok_or(RenderError::PassNotActive)?;

        // Illumination disk over the ambient base.
        if let Err(err) = stage.surface_mut().render_to_texture(backend, None, None) {
            shadow_tex.release(backend);
            return Err(err);
        }
        let environment = stage.environment_color();
        stage.fill(backend, environment);
        stage.draw_disk(backend, &self.disk, pos);

        // Darken the disk wherever the shadow layer is opaque.
        stage.set_blend(backend, BlendMode::Multiply);
        stage.draw_texture(backend, &shadow_tex, Vec2::ZERO);
        stage.set_blend(backend, BlendMode::Alpha);

        let tex = match stage.surface_mut().render_to_screen(backend) {
            Some(tex) => tex,
            None => {
                shadow_tex.release(backend);
                return Err(RenderError::PassNotActive);
            }
        };
        shadow_tex.release(backend);
        self.tex = Some(tex);
        Ok(())
    }

    /// Free the cached texture, if any.
    pub fn release<B: GraphicsBackend>(mut self, backend: &mut B) {
        if let Some(tex) = self.tex.take() {
            tex.release(backend);
        }
    }
}
