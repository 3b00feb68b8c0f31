//! Shadow geometry: which edge of a caster faces the light, and where
//! the shadow quad ends up.

use crate::math::{project_away_from_point, Vec2};
use crate::render::sprite::Sprite;

/// Shadow projection length as a multiple of caster height in open
/// scenes; the shadow fades out before the far edge matters much.
pub const PROJECTION_FACTOR: f32 = 2.0;
/// Projection multiple in enclosed ("inside") scenes, long enough to
/// push the far edge off-screen instead of terminating visibly.
pub const PROJECTION_FACTOR_INSIDE: f32 = 10.0;

/// The four corners of one caster's shadow for one light, in scene
/// coordinates. Derived per frame, never persisted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowQuad {
    pub base1: Vec2,
    pub base2: Vec2,
    pub far1: Vec2,
    pub far2: Vec2,
}

#[derive(Clone, Copy, PartialEq)]
enum Hor {
    Left,
    Mid,
    Right,
}

#[derive(Clone, Copy, PartialEq)]
enum Ver {
    Top,
    Mid,
    Bottom,
}

/// The two points of the caster edge that shadows fan out from.
///
/// Without a footprint the base is the sprite's full far edge. With one,
/// the light's position is classified against the footprint into a 3x3
/// grid and the facing edge is picked from a fixed table, so shadows
/// always leave from the edge the light can see rather than crossing the
/// caster.
pub fn resolve_base_points(light: Vec2, caster: &Sprite, dest: Vec2) -> (Vec2, Vec2) {
    let Some(base) = caster.footprint else {
        return (
            Vec2::new(dest.x, dest.y + caster.height()),
            Vec2::new(dest.x + caster.width(), dest.y + caster.height()),
        );
    };

    // Square casters shadow only their footprint span; everything else
    // spans the full sprite width so thin props still read as solid.
    let (left, right) = if caster.square_shadow {
        (base.left, base.right)
    } else {
        (0.0, caster.width())
    };
    let top = base.top;
    let bottom = base.bottom;

    let hor = if light.x < dest.x {
        Hor::Left
    } else if light.x > dest.x && light.x < dest.x + caster.width() {
        Hor::Mid
    } else {
        Hor::Right
    };

    let ver = if light.y < dest.y + base.top {
        Ver::Top
    } else if light.y > dest.y + base.top && light.y < dest.y + base.bottom {
        Ver::Mid
    } else {
        Ver::Bottom
    };

    let (p1, p2) = match (hor, ver) {
        (Hor::Left, Ver::Top) => ((right, top), (left, bottom)),
        (Hor::Mid, Ver::Top) => ((left, top), (right, top)),
        (Hor::Right, Ver::Top) => ((left, top), (right, bottom)),

        (Hor::Left, Ver::Mid) => ((right, bottom), (left, top)),
        // Light level with the base on both axes: fall back to the full
        // sprite silhouette edge.
        (Hor::Mid, Ver::Mid) => ((left, caster.height()), (right, caster.height())),
        (Hor::Right, Ver::Mid) => ((right, top), (right, bottom)),

        (Hor::Left, Ver::Bottom) => ((left, top), (right, bottom)),
        (Hor::Mid, Ver::Bottom) => ((left, bottom), (right, bottom)),
        (Hor::Right, Ver::Bottom) => ((right, top), (left, bottom)),
    };

    (
        Vec2::new(dest.x + p1.0, dest.y + p1.1),
        Vec2::new(dest.x + p2.0, dest.y + p2.1),
    )
}

/// Resolve the base edge and project both endpoints away from the light
/// by `length` to complete the quad.
pub fn resolve_shadow_quad(
    light: Vec2,
    caster: &Sprite,
    dest: Vec2,
    length: f32,
) -> ShadowQuad {
    let (base1, base2) = resolve_base_points(light, caster, dest);
    ShadowQuad {
        base1,
        base2,
        far1: project_away_from_point(light, length, base1),
        far2: project_away_from_point(light, length, base2),
    }
}
