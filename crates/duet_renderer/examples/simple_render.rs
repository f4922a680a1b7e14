//! Simple two-pipeline example.
//!
//! Builds a floor, a mirror wall and a glass panel in code, then writes the
//! ray-traced and rasterized frames as PNG files.

use duet_core::{Material, Mesh, PointLight, Triangle};
use duet_math::{Camera, Color, Vec3};
use duet_renderer::{rasterize_frame, raytrace_frame, RenderConfig, RenderContext, Scene};

fn quad(corners: [Vec3; 4], material: Material) -> Mesh {
    let [a, b, c, d] = corners;
    Mesh::new(
        vec![Triangle::flat([a, b, c], 0), Triangle::flat([a, c, d], 0)],
        vec![material],
    )
}

fn build_scene() -> Scene {
    let floor = quad(
        [
            Vec3::new(-2.0, -0.5, 2.0),
            Vec3::new(2.0, -0.5, 2.0),
            Vec3::new(2.0, -0.5, -2.0),
            Vec3::new(-2.0, -0.5, -2.0),
        ],
        Material::diffuse("floor", Color::new(0.8, 0.8, 0.7)),
    );
    let mirror = quad(
        [
            Vec3::new(-1.5, -0.5, -1.0),
            Vec3::new(1.5, -0.5, -1.0),
            Vec3::new(1.5, 1.5, -1.0),
            Vec3::new(-1.5, 1.5, -1.0),
        ],
        Material::mirror("mirror", Color::splat(0.9)),
    );
    let glass = quad(
        [
            Vec3::new(-0.3, -0.5, 0.0),
            Vec3::new(0.3, -0.5, 0.0),
            Vec3::new(0.3, 0.3, 0.0),
            Vec3::new(-0.3, 0.3, 0.0),
        ],
        Material::dielectric("glass", 1.5, Color::ONE),
    );

    Scene::builder()
        .add_mesh(floor)
        .add_mesh(mirror)
        .add_mesh(glass)
        .add_mesh(Mesh::single_triangle())
        .add_light(PointLight::default())
        .build()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Duet - Simple Example");
    println!("=====================");

    let start = std::time::Instant::now();
    let scene = build_scene();
    println!("Scene built in {:?}", start.elapsed());

    let camera = Camera::new(Vec3::new(0.5, 0.8, 2.5), Vec3::ZERO, 1.0);
    let ctx = RenderContext::new(camera, 512, 384).with_config(RenderConfig {
        shadows: true,
        background: Color::new(0.5, 0.7, 1.0),
        ..RenderConfig::default()
    });

    let start = std::time::Instant::now();
    let traced = raytrace_frame(&scene, &ctx)?;
    println!("Ray traced in {:?}", start.elapsed());
    traced.save_png("simple_raytrace.png", 2.2)?;

    let start = std::time::Instant::now();
    let rasterized = rasterize_frame(&scene, &ctx)?;
    println!("Rasterized in {:?}", start.elapsed());
    rasterized.save_png("simple_rasterize.png", 2.2)?;

    println!("Saved simple_raytrace.png and simple_rasterize.png");
    Ok(())
}
