use classmap::interaction::{self, Cursor};
use classmap::snapshot::FILE_EXTENSION;
use classmap::{ArrangementStyle, GroupId, StudentId};
use eframe::egui;
use std::path::PathBuf;

use super::command_palette::{CommandContext, CommandPalette};
use super::render::{draw_background, draw_groups, draw_students, draw_welcome};
use super::settings::{GROUP_SIZE_RANGE, PER_ROW_RANGE};
use super::{ClassMapApp, View};

impl eframe::App for ClassMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let wants_keyboard = ctx.wants_keyboard_input();
        ctx.input_mut(|i| {
            if !self.command_palette.open
                && i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::P)
            {
                self.command_palette.open("");
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::F1) {
                self.show_help = true;
            }
            if wants_keyboard || self.command_palette.open || self.pending_snapshot.is_some() {
                return;
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::L) {
                self.load_photos_dialog();
            }
            if i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::S) {
                self.save_snapshot_dialog();
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::S) {
                self.save_snapshot_to_path();
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::O) {
                self.open_snapshot_dialog();
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::E) {
                self.export_dialog();
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::P) {
                self.quick_export_pdf();
            }
            if i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::Z)
                || i.consume_key(egui::Modifiers::COMMAND, egui::Key::Y)
            {
                self.redo();
            } else if i.consume_key(egui::Modifiers::COMMAND, egui::Key::Z) {
                self.undo();
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Escape) {
                self.drag.cancel();
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Enter) {
                self.organize();
            }
            let keys = [
                (egui::Key::Num1, ArrangementStyle::Rows),
                (egui::Key::Num2, ArrangementStyle::UShape),
                (egui::Key::Num3, ArrangementStyle::Circle),
                (egui::Key::Num4, ArrangementStyle::Groups),
            ];
            for (key, style) in keys {
                if i.consume_key(egui::Modifiers::NONE, key) {
                    self.select_style(style);
                }
            }
        });

        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if !dropped.is_empty() {
            let layout = dropped.iter().find(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(FILE_EXTENSION))
            });
            match layout {
                Some(path) => self.stage_snapshot(path.clone()),
                None => self.load_photo_paths(&dropped),
            }
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Load Photos... (⌘L)").clicked() {
                        self.load_photos_dialog();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Save Layout (⌘S)").clicked() {
                        self.save_snapshot_to_path();
                        ui.close();
                    }
                    if ui.button("Save Layout As... (⌘⇧S)").clicked() {
                        self.save_snapshot_dialog();
                        ui.close();
                    }
                    if ui.button("Load Layout... (⌘O)").clicked() {
                        self.open_snapshot_dialog();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Export... (⌘E)").clicked() {
                        self.export_dialog();
                        ui.close();
                    }
                    if ui.button("Quick PDF Export (⌘P)").clicked() {
                        self.quick_export_pdf();
                        ui.close();
                    }
                    ui.small("Quick export folder:");
                    if ui
                        .add(
                            egui::TextEdit::singleline(&mut self.export_dir)
                                .hint_text("Desktop"),
                        )
                        .lost_focus()
                    {
                        self.persist_settings();
                    }
                    if ui
                        .checkbox(&mut self.open_after_export, "Open after export")
                        .changed()
                    {
                        self.persist_settings();
                    }
                    ui.separator();
                    if ui.button("Reset Map").clicked() {
                        self.reset();
                        ui.close();
                    }
                });
                ui.menu_button("Edit", |ui| {
                    if ui
                        .add_enabled(self.session.can_undo(), egui::Button::new("Undo (⌘Z)"))
                        .clicked()
                    {
                        self.undo();
                        ui.close();
                    }
                    if ui
                        .add_enabled(self.session.can_redo(), egui::Button::new("Redo (⌘⇧Z)"))
                        .clicked()
                    {
                        self.redo();
                        ui.close();
                    }
                    ui.separator();
                    if ui
                        .add_enabled(
                            !self.session.groups().is_empty(),
                            egui::Button::new("Clear Groups"),
                        )
                        .clicked()
                    {
                        self.clear_groups();
                        ui.close();
                    }
                });
                ui.menu_button("Arrange", |ui| {
                    for (n, style) in ArrangementStyle::ALL.into_iter().enumerate() {
                        let label = format!("{} ({})", style.label(), n + 1);
                        if ui.radio(self.style == style, label).clicked() {
                            self.select_style(style);
                        }
                    }
                    ui.separator();
                    if ui.button("Organize (Enter)").clicked() {
                        self.organize();
                        ui.close();
                    }
                });
                ui.menu_button("Help", |ui| {
                    if ui.button("Show Help (F1)").clicked() {
                        self.show_help = true;
                        ui.close();
                    }
                    if ui.button("Commands (⌘⇧P)").clicked() {
                        self.command_palette.open("");
                        ui.close();
                    }
                });
            });
        });

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Load Photos").clicked() {
                    self.load_photos_dialog();
                }
                ui.separator();

                let before = (self.style, self.per_row, self.group_size);
                egui::ComboBox::from_label("Style")
                    .selected_text(self.style.label())
                    .show_ui(ui, |ui| {
                        for style in ArrangementStyle::ALL {
                            ui.selectable_value(&mut self.style, style, style.label());
                        }
                    });
                ui.add_enabled_ui(self.style != ArrangementStyle::Circle, |ui| {
                    egui::ComboBox::from_label("Per row")
                        .selected_text(self.per_row.to_string())
                        .width(48.0)
                        .show_ui(ui, |ui| {
                            for n in PER_ROW_RANGE {
                                ui.selectable_value(&mut self.per_row, n, n.to_string());
                            }
                        });
                });
                ui.add_enabled_ui(self.style == ArrangementStyle::Groups, |ui| {
                    egui::ComboBox::from_label("Group size")
                        .selected_text(self.group_size.to_string())
                        .width(48.0)
                        .show_ui(ui, |ui| {
                            for n in GROUP_SIZE_RANGE {
                                ui.selectable_value(&mut self.group_size, n, n.to_string());
                            }
                        });
                });
                if before != (self.style, self.per_row, self.group_size) {
                    self.persist_settings();
                }

                if ui.button("Organize").clicked() {
                    self.organize();
                }
                if ui
                    .add_enabled(
                        !self.session.groups().is_empty(),
                        egui::Button::new("Clear Groups"),
                    )
                    .clicked()
                {
                    self.clear_groups();
                }
                ui.separator();
                if ui.button("Save").clicked() {
                    self.save_snapshot_to_path();
                }
                if ui.button("Load").clicked() {
                    self.open_snapshot_dialog();
                }
                if ui.button("Export PDF").clicked() {
                    self.quick_export_pdf();
                }
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(status) = &self.status {
                    ui.label(status);
                } else {
                    ui.label("Ready");
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("Style: {}", self.style.label()));
                    ui.separator();
                    ui.label(format!("Groups: {}", self.session.groups().len()));
                    ui.separator();
                    ui.label(format!("Students: {}", self.session.students().len()));
                });
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
                self.view.origin = rect.min;
                let (width, height) = View::canvas_size(rect.size());
                self.session.set_canvas(width, height);
                self.sync_textures(ctx);

                let pointer_world = ctx
                    .input(|i| i.pointer.interact_pos())
                    .map(|p| self.view.screen_to_world(p));

                if response.drag_started() {
                    let origin = ctx
                        .input(|i| i.pointer.press_origin())
                        .map(|p| self.view.screen_to_world(p))
                        .or(pointer_world);
                    if let Some(p) = origin {
                        self.drag.press(&self.session, p);
                    }
                }
                if response.dragged() {
                    if let Some(p) = pointer_world {
                        self.drag.drag_to(&mut self.session, p);
                    }
                }
                if response.drag_stopped() {
                    match pointer_world {
                        Some(p) => {
                            if let Some(t) = self.drag.release(&mut self.session, p) {
                                self.report_transfer(t.student, t.from, t.to);
                            }
                        }
                        None => self.drag.cancel(),
                    }
                }

                if response.secondary_clicked() {
                    self.context_hit = pointer_world
                        .and_then(|p| interaction::hit_test(self.session.students(), p));
                }

                let painter = ui.painter_at(rect);
                draw_background(&painter, rect);
                if self.session.is_empty() {
                    draw_welcome(&painter, rect);
                }
                draw_groups(&painter, &self.view, self.session.groups());
                draw_students(
                    &painter,
                    &self.view,
                    self.session.students(),
                    &self.textures,
                    self.drag.dragged(),
                );

                response.context_menu(|ui| {
                    let Some(id) = self.context_hit else {
                        ui.label("No student here");
                        return;
                    };
                    let Some(student) = self.session.student(id) else {
                        return;
                    };
                    let current = student.group_id;
                    ui.label(egui::RichText::new(student.name.clone()).strong());
                    ui.separator();
                    let targets: Vec<(GroupId, String)> = self
                        .session
                        .groups()
                        .iter()
                        .filter(|g| Some(g.id) != current && !g.members.is_empty())
                        .map(|g| (g.id, g.label()))
                        .collect();
                    ui.add_enabled_ui(!targets.is_empty(), |ui| {
                        ui.menu_button("Move to", |ui| {
                            for (gid, label) in &targets {
                                if ui.button(label).clicked() {
                                    self.session.record();
                                    if let Some(t) = interaction::transfer(&mut self.session, id, *gid) {
                                        self.report_transfer(t.student, t.from, t.to);
                                    }
                                    ui.close();
                                }
                            }
                        });
                    });
                    if ui.button("Remove from map").clicked() {
                        self.remove_student(id);
                        self.context_hit = None;
                        ui.close();
                    }
                });

                if let Some(p) = pointer_world {
                    if rect.contains(self.view.world_to_screen(p)) {
                        let icon = match self.drag.hover(&self.session, p) {
                            Cursor::Grabbing => egui::CursorIcon::Grabbing,
                            Cursor::Grab => egui::CursorIcon::Grab,
                            Cursor::Default => egui::CursorIcon::Default,
                        };
                        ctx.set_cursor_icon(icon);
                    }
                }
            });

        self.confirm_snapshot_window(ctx);

        let cx = CommandContext {
            has_students: !self.session.is_empty(),
            has_groups: !self.session.groups().is_empty(),
            has_undo: self.session.can_undo(),
            has_redo: self.session.can_redo(),
        };
        if let Some(cmd) = self.command_palette.ui(ctx, cx) {
            CommandPalette::execute(self, ctx, cmd);
        }

        super::help::draw_help_window(ctx, &mut self.show_help);
    }
}

impl ClassMapApp {
    fn report_transfer(&mut self, student: StudentId, from: Option<GroupId>, to: GroupId) {
        let name = self
            .session
            .student(student)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        let label = |gid: GroupId| format!("Group {}", gid.0 + 1);
        self.status = Some(match from {
            Some(from) => format!("Moved {name} from {} to {}", label(from), label(to)),
            None => format!("Moved {name} to {}", label(to)),
        });
    }

    fn confirm_snapshot_window(&mut self, ctx: &egui::Context) {
        let Some(pending) = &self.pending_snapshot else {
            return;
        };
        let mut confirmed = false;
        let mut cancelled = false;
        egui::Window::new("Load layout?")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                for line in pending.summary.to_string().lines() {
                    ui.label(line);
                }
                ui.add_space(6.0);
                ui.label("Positions and groups on the map will be replaced.");
                ui.horizontal(|ui| {
                    confirmed = ui.button("Load").clicked();
                    cancelled = ui.button("Cancel").clicked();
                });
            });
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            cancelled = true;
        }
        if confirmed {
            self.confirm_pending_snapshot();
        } else if cancelled {
            self.pending_snapshot = None;
            self.status = Some("Layout load cancelled".to_string());
        }
    }
}
