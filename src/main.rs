mod app;

fn main() -> eframe::Result<()> {
    env_logger::init();
    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Class Map"),
        ..Default::default()
    };
    eframe::run_native(
        "Class Map",
        native_options,
        Box::new(|cc| Ok(Box::new(app::ClassMapApp::new(cc)))),
    )
}
