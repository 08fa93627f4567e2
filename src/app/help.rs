use eframe::egui;

pub(super) fn draw_help_window(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("Help & Commands")
        .open(open)
        .resizable(true)
        .default_width(520.0)
        .default_height(460.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Keyboard Shortcuts");
                ui.separator();

                ui.label("General");
                help_row(ui, "⌘⇧P", "Open command palette");
                help_row(ui, "⌘L", "Load student photos");
                help_row(ui, "⌘S", "Save layout");
                help_row(ui, "⌘⇧S", "Save layout as...");
                help_row(ui, "⌘O", "Load layout");
                help_row(ui, "⌘E", "Export (PDF, text or layout)");
                help_row(ui, "⌘P", "Quick PDF export");
                help_row(ui, "⌘Z", "Undo");
                help_row(ui, "⌘⇧Z / ⌘Y", "Redo");
                help_row(ui, "Escape", "Cancel the current drag");
                help_row(ui, "F1", "This window");

                ui.add_space(10.0);
                ui.label("Arranging");
                help_row(ui, "1 - 4", "Rows, U-shape, Circle, Groups");
                help_row(ui, "Enter", "Organize with the chosen style");
                help_row(ui, "Drag", "Move a student");
                help_row(ui, "Drop on group", "Move the student into that group");
                help_row(ui, "Right-click", "Move a student to another group or remove it");

                ui.add_space(20.0);
                ui.heading("Layouts");
                ui.separator();
                ui.label("A layout file (.classmap) stores positions and groups by student");
                ui.label("name, without photos. Load the same photos first, then load the");
                ui.label("layout; students missing from the file keep their place.");

                ui.add_space(20.0);
                ui.heading("Settings");
                ui.separator();
                ui.label("Read from ~/.config/classmap.toml or settings.toml:");
                ui.add_space(5.0);
                ui.code(r##"default_style = "Groups"
per_row = 5
group_size = 3
export_dir = "/home/me/Documents"
max_photos = 100
max_photo_mib = 10
open_after_export = true"##);
            });
        });
}

fn help_row(ui: &mut egui::Ui, shortcut: &str, description: &str) {
    ui.horizontal(|ui| {
        ui.add_sized([110.0, 16.0], egui::Label::new(
            egui::RichText::new(shortcut).monospace().strong()
        ));
        ui.label(description);
    });
}
