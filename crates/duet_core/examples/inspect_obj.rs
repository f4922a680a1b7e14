//! Example: Load and inspect an OBJ file.
//!
//! Run with: cargo run --example inspect_obj -- cornellbox.obj

use std::env;

use duet_core::{load_obj, MaterialKind};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: inspect_obj <path-to-obj-file>");
        println!("\nExample:");
        println!("  cargo run --example inspect_obj -- cornellbox.obj");
        return;
    }

    let path = &args[1];
    println!("Loading OBJ file: {}", path);

    match load_obj(path) {
        Ok(mesh) => {
            let bounds = mesh.bounds;
            println!("\n=== {} ===", path);
            println!("Triangles: {}", mesh.triangle_count());
            println!(
                "Bounds: ({:.2}, {:.2}, {:.2}) to ({:.2}, {:.2}, {:.2})",
                bounds.x.min, bounds.y.min, bounds.z.min, bounds.x.max, bounds.y.max, bounds.z.max
            );

            println!("\n--- Materials ---");
            for (i, material) in mesh.materials.iter().enumerate() {
                let kind = match &material.kind {
                    MaterialKind::Diffuse { reflectance, .. } => format!(
                        "diffuse Kd=({:.2}, {:.2}, {:.2})",
                        reflectance.x, reflectance.y, reflectance.z
                    ),
                    MaterialKind::Mirror { .. } => "mirror".to_string(),
                    MaterialKind::Dielectric { ior, .. } => format!("glass ior={ior}"),
                    _ => "unknown".to_string(),
                };
                let textured = if material.is_textured() { " (textured)" } else { "" };
                println!("  [{}] {} - {}{}", i, material.name, kind, textured);
            }

            let degenerate = mesh.triangles.iter().filter(|t| t.area() == 0.0).count();
            if degenerate > 0 {
                println!("\nDegenerate triangles: {}", degenerate);
            }
        }
        Err(e) => {
            eprintln!("Error loading OBJ: {}", e);
            std::process::exit(1);
        }
    }
}
