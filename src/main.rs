use std::path::PathBuf;

use annotate_coco::app::AnnotateApp;
use annotate_coco::config;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let image_path = std::env::args().nth(1).map(PathBuf::from);
    if let Some(path) = &image_path {
        if !path.exists() {
            eprintln!("File not found: {}", path.display());
            eprintln!("Usage: annotate-coco [image.png|jpg]");
            std::process::exit(1);
        }
    }

    let config = config::load_config();

    let title = match image_path.as_ref().and_then(|p| p.file_name()).and_then(|n| n.to_str()) {
        Some(name) => format!("annotate-coco — {name}"),
        None => "annotate-coco".to_string(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([
                config.canvas.initial_width as f32,
                (config.canvas.initial_height + config.canvas.toolbar_height) as f32,
            ])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(AnnotateApp::new(cc, &config, image_path)))),
    )
}
