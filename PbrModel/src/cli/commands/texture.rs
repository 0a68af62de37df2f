//! CLI commands for texture operations

use std::path::Path;
use std::time::Instant;

use anyhow::bail;

use crate::cli::progress::{DISK, LOOKING_GLASS, PICTURE, print_done, print_step};
use crate::sdr::WriteOptions;
use crate::texture::import_png;

/// Export every texture of a model as PNG.
pub fn export(source: &Path, destination: &Path) -> anyhow::Result<()> {
    let start = Instant::now();
    print_step(1, 1, PICTURE, &format!("Exporting textures of {}...", source.display()));

    let written = crate::batch::export_textures(source, destination)?;
    for path in &written {
        println!("  {}", path.display());
    }
    println!("Exported {} textures", written.len());

    print_done(start.elapsed());
    Ok(())
}

/// Replace the image behind texture `index` and write the model to `output`.
///
/// The replacement is encoded with the encoding of the image it replaces.
pub fn replace(
    source: &Path,
    index: usize,
    image: &Path,
    output: &Path,
    options: WriteOptions,
) -> anyhow::Result<()> {
    let start = Instant::now();

    print_step(1, 3, LOOKING_GLASS, &format!("Parsing {}...", source.display()));
    let mut model = crate::read_model(source)?.model;
    let Some(texture) = model.textures.get(index) else {
        bail!("texture index {index} out of range ({} textures)", model.textures.len());
    };
    let target = texture.image;
    let shared = model.textures.iter().filter(|t| t.image == target).count();
    if shared > 1 {
        println!("  note: image is shared by {shared} textures, all of them change");
    }

    let original = &model.images[target];
    let encoding = original.encoding;
    print_step(2, 3, PICTURE, &format!("Encoding {} as {encoding:?}...", image.display()));
    let replacement = import_png(image, encoding)?;
    if (replacement.width, replacement.height) != (original.width, original.height) {
        println!(
            "  note: size changes from {}x{} to {}x{}",
            original.width, original.height, replacement.width, replacement.height
        );
    }
    model.images[target] = replacement;

    print_step(3, 3, DISK, &format!("Writing {}...", output.display()));
    crate::write_model(output, &model, options)?;

    print_done(start.elapsed());
    Ok(())
}
