//! CLI commands for whole-model operations

use std::path::Path;
use std::time::Instant;

use crate::cli::progress::{DISK, GEAR, LOOKING_GLASS, print_done, print_step};
use crate::inspect::{ModelInfo, inspect_model};
use crate::sdr::WriteOptions;

/// Inspect a model file and display its structure.
pub fn inspect(path: &Path, show_bones: bool) -> anyhow::Result<()> {
    println!("Inspecting model file: {}", path.display());
    println!();

    let info = inspect_model(path)?;
    print_summary(&info, show_bones);
    Ok(())
}

fn print_summary(info: &ModelInfo, show_bones: bool) {
    println!("{} Model Information", info.variant);
    println!("=====================");
    println!("Textures:    {}", info.textures.len());
    println!("Materials:   {}", info.materials.len());
    println!("Meshes:      {} ({} triangles)", info.meshes.len(), info.face_count());
    println!("Skeletons:   {}", info.skeletons.len());
    println!();

    if !info.textures.is_empty() {
        println!("Textures:");
        println!("---------");
        for texture in &info.textures {
            let palette = texture
                .palette_size
                .map(|n| format!(", {n} palette entries"))
                .unwrap_or_default();
            println!(
                "  [{:2}] {}x{} {}{}",
                texture.index, texture.width, texture.height, texture.encoding, palette
            );
        }
        println!();
    }

    if !info.materials.is_empty() {
        println!("Materials:");
        println!("----------");
        for material in &info.materials {
            let texture = material
                .texture
                .map_or_else(|| "none".to_string(), |t| t.to_string());
            println!("  [{:2}] {} (texture {})", material.index, material.name, texture);
        }
        println!();
    }

    for mesh in &info.meshes {
        println!(
            "Mesh {}: {} vertices, {} triangles in {} parts{}{}",
            mesh.index,
            mesh.vertex_count,
            mesh.face_count,
            mesh.part_count,
            if mesh.has_uvs { ", UVs" } else { "" },
            if mesh.weighted { ", weighted" } else { "" },
        );
    }

    for skeleton in &info.skeletons {
        println!();
        println!("Skeleton: {} ({} bones)", skeleton.name, skeleton.bone_count);
        if show_bones {
            for (index, bone) in skeleton.bones.iter().enumerate() {
                let parent = bone.parent.map_or_else(|| "-".to_string(), |p| p.to_string());
                println!("  [{index:3}] {:24} {:10} parent {parent}", bone.name, bone.kind);
            }
        }
        for action in &skeleton.actions {
            println!(
                "  Action: {} ({:.2}s, {} bones animated)",
                action.name, action.duration, action.animated_bones
            );
        }
    }

    if !info.warnings.is_empty() {
        println!();
        println!("Warnings ({}):", info.warnings.len());
        for warning in &info.warnings {
            println!("  - {warning}");
        }
    }
}

/// Write a model summary as JSON.
pub fn info(path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let info = inspect_model(path)?;
    let json = serde_json::to_string_pretty(&info)?;

    match output {
        Some(output) => {
            std::fs::write(output, json)?;
            println!("Written to: {}", output.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Parse a model and serialize it again.
pub fn rebuild(source: &Path, output: &Path, options: WriteOptions) -> anyhow::Result<()> {
    let start = Instant::now();

    print_step(1, 3, LOOKING_GLASS, &format!("Parsing {}...", source.display()));
    let parsed = crate::read_model(source)?;
    for warning in &parsed.warnings {
        println!("  warning: {warning}");
    }

    print_step(2, 3, GEAR, "Validating model...");
    parsed.model.validate()?;

    print_step(3, 3, DISK, &format!("Writing {}...", output.display()));
    crate::write_model(output, &parsed.model, options)?;

    let original_size = std::fs::metadata(source)?.len();
    let rebuilt_size = std::fs::metadata(output)?.len();
    println!("  Original size: {original_size} bytes");
    println!("  Rebuilt size:  {rebuilt_size} bytes");

    print_done(start.elapsed());
    Ok(())
}
