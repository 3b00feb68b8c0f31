//! Runs a full lighting frame against the headless backend and reports
//! what reached it: a torch and a cold fill light over a wall and a
//! character, composited into the main lighting layer.

use anyhow::Result;
use image::{Rgba, RgbaImage};
use lumen2d::{
    HeadlessBackend, LightConfig, Rect, SceneConfig, Sprite, Stage, Texture, Vec2,
};

fn solid_image(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(color))
}

/// A sprite with a transparent border, so the white variant actually
/// has something to threshold.
fn character_image(width: u32, height: u32) -> RgbaImage {
    let mut image = RgbaImage::new(width, height);
    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            image.put_pixel(x, y, Rgba([180, 140, 100, 255]));
        }
    }
    image
}

fn main() -> Result<()> {
    let mut backend = HeadlessBackend::new();

    let mut config = SceneConfig::new(800, 600);
    config.environment_color = [0.05, 0.05, 0.1, 1.0];
    config.lights.push(LightConfig {
        color: [1.0, 0.85, 0.6, 1.0],
        strength: 300.0,
        shadows: true,
    });
    config.lights.push(LightConfig {
        color: [0.4, 0.5, 0.9, 1.0],
        strength: 180.0,
        shadows: false,
    });

    let mut stage = Stage::new(&mut backend, config.width, config.height, config.environment_color);
    stage.set_inside(config.inside);

    // A solid wall segment and a character in front of it.
    let wall_texture = Texture::from_image(&mut backend, &solid_image(120, 40, [90, 90, 90, 255]));
    let wall = Sprite::new(
        wall_texture,
        Some(Rect::new(0.0, 0.0, 120.0, 40.0)),
        true,
    );

    let hero_texture = Texture::from_image(&mut backend, &character_image(24, 48));
    let hero = Sprite::new(
        hero_texture,
        Some(Rect::new(0.0, 40.0, 24.0, 48.0)),
        false,
    );

    stage.set_shadowcasters(
        &mut backend,
        vec![
            (wall, Vec2::new(300.0, 200.0)),
            (hero, Vec2::new(420.0, 180.0)),
        ],
    );

    let mut lights = config.build_lights();
    let light_positions = [Vec2::new(380.0, 320.0), Vec2::new(150.0, 420.0)];
    for (light, pos) in lights.iter_mut().zip(light_positions) {
        light.render(&mut backend, &mut stage, pos)?;
    }

    stage.build_lighting(&mut backend, &lights)?;
    stage.draw_lighting(&mut backend, Vec2::ZERO)?;

    println!(
        "rendered {} lights over {} casters: {} backend commands, {} live textures",
        lights.len(),
        stage.casters().len(),
        backend.commands().len(),
        backend.live_texture_count(),
    );

    for light in lights {
        light.release(&mut backend);
    }
    stage.release(&mut backend);
    println!(
        "after teardown: {} live textures, {} live framebuffers",
        backend.live_texture_count(),
        backend.live_framebuffer_count(),
    );

    Ok(())
}
