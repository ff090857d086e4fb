use anyhow::{Context, Result};
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

// Models, textures and the music track are looked up below `assets/`. Copy
// them next to the build output so `cargo run` finds them.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets/");
    println!("cargo:rerun-if-env-changed=FLOW_VIGNETTE_ASSETS");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");
    if !assets_src.exists() {
        println!("cargo:warning=no assets/ directory, demos will render without models");
        return Ok(());
    }

    let out_dir = env::var("OUT_DIR")?;
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    copy_items(&[&assets_src], &out_dir, &copy_options)
        .with_context(|| format!("copying {} to {}", assets_src.display(), out_dir))?;

    Ok(())
}
