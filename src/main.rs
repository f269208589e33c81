//! Contour Editor.
//!
//! Lädt eine Szene, führt optional ein Command-Skript aus und gibt die
//! berechneten Regionen pro Ebene aus.
//!
//! Aufruf: `contour-editor <scene.json> [script.json] [out.json]`

use contour_editor::{ContourOptions, Document, EditController, load_scene, load_script, save_scene};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    // Logger initialisieren
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Contour Editor v{} startet...", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let Some(scene_path) = args.next() else {
        anyhow::bail!("Aufruf: contour-editor <scene.json> [script.json] [out.json]");
    };
    let script_path = args.next();
    let out_path = args.next();

    // Optionen aus TOML laden (oder Standardwerte)
    let options = ContourOptions::load_from_file(&ContourOptions::config_path());

    let mut doc = Document::new(options);
    let mut controller = EditController::new();

    let scene = load_scene(&scene_path)?;
    pollster::block_on(controller.handle_command(&mut doc, scene.into_load_command()))?;

    if let Some(script_path) = script_path {
        for command in load_script(&script_path)? {
            pollster::block_on(controller.handle_command(&mut doc, command))?;
        }
    }

    let index = doc.coordinator().index();
    for plane in index.planes() {
        let regions = doc.regions(plane);
        log::info!(
            "{plane}: {} Kurve(n), {} Region(en)",
            index.curve_ids_on_plane(plane).len(),
            regions.len()
        );
        for region in regions {
            let centroid = region.centroid();
            println!(
                "{plane}\t{:#018x}\tFläche {:.4}\tSchwerpunkt ({:.3}, {:.3})",
                region.key, region.area, centroid.x, centroid.y
            );
        }
    }

    if let Some(out_path) = out_path {
        save_scene(&out_path, doc.items())?;
    }

    Ok(())
}
