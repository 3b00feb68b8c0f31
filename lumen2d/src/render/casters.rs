use crate::math::Vec2;
use crate::render::backend::{BatchId, GraphicsBackend, QuadVertex};
use crate::render::sprite::Sprite;

/// One registered shadow-blocking sprite and its world position.
/// Immutable for the frame once registered.
pub struct Shadowcaster {
    pub sprite: Sprite,
    pub position: Vec2,
}

/// The set of sprites that may cast shadows, plus a pre-baked batch of
/// their white silhouettes.
///
/// The set only changes wholesale: replacing it releases every previous
/// sprite and regenerates the silhouette batch. The per-light renderer
/// replays that batch on top of the shadow quads so casters occlude
/// light even where no quad was drawn.
#[derive(Default)]
pub struct ShadowcasterSet {
    casters: Vec<Shadowcaster>,
    white_batch: Option<BatchId>,
}

impl ShadowcasterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Shadowcaster] {
        &self.casters
    }

    pub fn len(&self) -> usize {
        self.casters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.casters.is_empty()
    }

    /// Replace the full caster set.
    ///
    /// White variants are computed (or pulled from each sprite's cache)
    /// up front, then flattened into one batch: offset plus quad per
    /// caster, with positions already converted to backend coordinates
    /// against `viewport_height`.
    pub fn rebuild<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        viewport_height: f32,
        entries: Vec<(Sprite, Vec2)>,
    ) {
        self.clear(backend);
        log::debug!("rebuilding shadowcaster set with {} casters", entries.len());

        self.casters = entries
            .into_iter()
            .map(|(sprite, position)| Shadowcaster { sprite, position })
            .collect();

        // Materialize white variants before recording; texture creation
        // must not interleave with the batch.
        for caster in &mut self.casters {
            caster.sprite.white_variant(backend);
        }

        let batch = backend.begin_batch();
        for caster in &self.casters {
            let Some(white) = caster.sprite.cached_white_variant() else {
                continue;
            };
            let w = white.width();
            let h = white.height();
            let dest = Vec2::new(
                caster.position.x,
                viewport_height - caster.position.y - h,
            );
            backend.set_offset(dest);
            let color = [1.0, 1.0, 1.0, 1.0];
            backend.draw_quad(
                Some(white.texture().id()),
                [
                    QuadVertex::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 0.0), color),
                    QuadVertex::new(Vec2::new(0.0, h), Vec2::new(0.0, 1.0), color),
                    QuadVertex::new(Vec2::new(w, h), Vec2::new(1.0, 1.0), color),
                    QuadVertex::new(Vec2::new(w, 0.0), Vec2::new(1.0, 0.0), color),
                ],
            );
        }
        backend.end_batch();
        self.white_batch = Some(batch);
    }

    /// Replay the flattened white-silhouette batch.
    pub fn draw<B: GraphicsBackend>(&self, backend: &mut B) {
        if let Some(batch) = self.white_batch {
            backend.set_offset(Vec2::ZERO);
            backend.draw_batch(batch);
        }
    }

    /// Release every sprite and the baked batch.
    pub fn clear<B: GraphicsBackend>(&mut self, backend: &mut B) {
        if let Some(batch) = self.white_batch.take() {
            backend.delete_batch(batch);
        }
        for caster in self.casters.drain(..) {
            caster.sprite.release(backend);
        }
    }
}
