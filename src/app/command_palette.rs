use classmap::ArrangementStyle;
use eframe::egui;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::ClassMapApp;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum CommandId {
    LoadPhotos,
    StyleRows,
    StyleUShape,
    StyleCircle,
    StyleGroups,
    Organize,
    ClearGroups,
    Reset,
    Undo,
    Redo,
    SaveLayout,
    SaveLayoutAs,
    LoadLayout,
    Export,
    QuickPdf,
    ToggleOpenAfterExport,
    Help,
}

pub(super) struct CommandSpec {
    pub id: CommandId,
    pub name: &'static str,
    pub search: &'static str,
}

const COMMANDS: &[CommandSpec] = &[
    CommandSpec { id: CommandId::LoadPhotos, name: "Load Photos...", search: "load photos images import students open" },
    CommandSpec { id: CommandId::StyleRows, name: "Style: Rows", search: "style rows grid arrangement" },
    CommandSpec { id: CommandId::StyleUShape, name: "Style: U-shape", search: "style u shape horseshoe arrangement" },
    CommandSpec { id: CommandId::StyleCircle, name: "Style: Circle", search: "style circle ring arrangement" },
    CommandSpec { id: CommandId::StyleGroups, name: "Style: Groups", search: "style groups tables teams arrangement" },
    CommandSpec { id: CommandId::Organize, name: "Organize", search: "organize arrange seat layout apply" },
    CommandSpec { id: CommandId::ClearGroups, name: "Clear Groups", search: "clear groups ungroup remove" },
    CommandSpec { id: CommandId::Reset, name: "Reset Map", search: "reset clear all new empty" },
    CommandSpec { id: CommandId::Undo, name: "Undo", search: "undo" },
    CommandSpec { id: CommandId::Redo, name: "Redo", search: "redo" },
    CommandSpec { id: CommandId::SaveLayout, name: "Save Layout", search: "save layout snapshot quick" },
    CommandSpec { id: CommandId::SaveLayoutAs, name: "Save Layout As...", search: "save layout snapshot as file" },
    CommandSpec { id: CommandId::LoadLayout, name: "Load Layout...", search: "load layout snapshot open restore" },
    CommandSpec { id: CommandId::Export, name: "Export...", search: "export pdf text txt file" },
    CommandSpec { id: CommandId::QuickPdf, name: "Quick PDF Export", search: "quick pdf export print desktop" },
    CommandSpec { id: CommandId::ToggleOpenAfterExport, name: "Toggle Open After Export", search: "open after export toggle viewer" },
    CommandSpec { id: CommandId::Help, name: "Help", search: "help shortcuts keys" },
];

#[derive(Default)]
pub(super) struct CommandPalette {
    pub open: bool,
    pub query: String,
    pub selected: usize,
    request_focus: bool,
}

#[derive(Clone, Copy)]
pub(super) struct CommandContext {
    pub has_students: bool,
    pub has_groups: bool,
    pub has_undo: bool,
    pub has_redo: bool,
}

impl CommandPalette {
    pub fn open(&mut self, query: impl Into<String>) {
        self.open = true;
        self.query = query.into();
        self.selected = 0;
        self.request_focus = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.query.clear();
        self.selected = 0;
        self.request_focus = false;
    }

    fn is_enabled(cx: CommandContext, id: CommandId) -> bool {
        match id {
            CommandId::Undo => cx.has_undo,
            CommandId::Redo => cx.has_redo,
            CommandId::ClearGroups => cx.has_groups,
            CommandId::Organize
            | CommandId::Reset
            | CommandId::SaveLayout
            | CommandId::SaveLayoutAs
            | CommandId::LoadLayout
            | CommandId::Export
            | CommandId::QuickPdf => cx.has_students,
            _ => true,
        }
    }

    pub(super) fn execute(app: &mut ClassMapApp, ctx: &egui::Context, id: CommandId) {
        match id {
            CommandId::LoadPhotos => app.load_photos_dialog(),
            CommandId::StyleRows => app.select_style(ArrangementStyle::Rows),
            CommandId::StyleUShape => app.select_style(ArrangementStyle::UShape),
            CommandId::StyleCircle => app.select_style(ArrangementStyle::Circle),
            CommandId::StyleGroups => app.select_style(ArrangementStyle::Groups),
            CommandId::Organize => app.organize(),
            CommandId::ClearGroups => app.clear_groups(),
            CommandId::Reset => app.reset(),
            CommandId::Undo => app.undo(),
            CommandId::Redo => app.redo(),
            CommandId::SaveLayout => app.save_snapshot_to_path(),
            CommandId::SaveLayoutAs => app.save_snapshot_dialog(),
            CommandId::LoadLayout => app.open_snapshot_dialog(),
            CommandId::Export => app.export_dialog(),
            CommandId::QuickPdf => app.quick_export_pdf(),
            CommandId::ToggleOpenAfterExport => {
                app.open_after_export = !app.open_after_export;
                app.persist_settings();
            }
            CommandId::Help => app.show_help = true,
        }
        ctx.request_repaint();
    }

    fn filtered(&self) -> Vec<(&'static CommandSpec, i64)> {
        let matcher = SkimMatcherV2::default();
        let q = self.query.trim();
        if q.is_empty() {
            return COMMANDS.iter().map(|c| (c, 0)).collect();
        }
        let mut out = Vec::new();
        for c in COMMANDS {
            if let Some(score) = matcher.fuzzy_match(c.search, q) {
                out.push((c, score));
            }
        }
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.name.cmp(b.0.name)));
        out
    }

    pub fn ui(&mut self, ctx: &egui::Context, cx: CommandContext) -> Option<CommandId> {
        if !self.open {
            return None;
        }
        let matches = self.filtered();
        if self.selected >= matches.len() {
            self.selected = matches.len().saturating_sub(1);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.close();
            return None;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowDown)) && !matches.is_empty() {
            self.selected = (self.selected + 1).min(matches.len() - 1);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowUp)) && !matches.is_empty() {
            self.selected = self.selected.saturating_sub(1);
        }
        let mut run_selected = ctx.input(|i| i.key_pressed(egui::Key::Enter));

        let screen = ctx.content_rect();
        let width = 480.0;
        let height = 300.0;
        let pos = egui::pos2(screen.center().x - width * 0.5, screen.top() + 48.0);
        egui::Area::new(egui::Id::new("command_palette"))
            .fixed_pos(pos)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let frame = egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(30, 30, 34, 240))
                    .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(90, 160, 255)))
                    .inner_margin(10.0)
                    .corner_radius(egui::CornerRadius::same(8));
                frame.show(ui, |ui| {
                    ui.set_min_size(egui::vec2(width, height));
                    let resp = ui.add(
                        egui::TextEdit::singleline(&mut self.query)
                            .desired_width(f32::INFINITY)
                            .hint_text("Search commands"),
                    );
                    if self.request_focus {
                        resp.request_focus();
                        self.request_focus = false;
                    }
                    ui.separator();
                    egui::ScrollArea::vertical().max_height(height - 64.0).show(ui, |ui| {
                        for (idx, (spec, _score)) in matches.iter().enumerate() {
                            let enabled = CommandPalette::is_enabled(cx, spec.id);
                            let resp = ui.add_enabled(
                                enabled,
                                egui::Button::new(spec.name).selected(idx == self.selected),
                            );
                            if resp.clicked() {
                                self.selected = idx;
                                run_selected = true;
                            }
                        }
                    });
                });
            });

        if run_selected {
            if let Some((spec, _)) = matches.get(self.selected) {
                if CommandPalette::is_enabled(cx, spec.id) {
                    let cmd = spec.id;
                    self.close();
                    return Some(cmd);
                }
            }
        }
        None
    }
}
