use std::{collections::VecDeque, time::Duration};

use client_core::{
    view::{EMPTY_ROSTER_NOTICE, LOADING_NOTICE, SELECTOR_PLACEHOLDER},
    ActivityCard, ActivityListView, ListArea, RemoveControl, SelectionState, StatusKind,
    StatusMessage, ViewEvent,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use tokio::sync::oneshot;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{events::UiEvent, orchestration::dispatch_backend_command};

const UI_POLL_INTERVAL: Duration = Duration::from_millis(100);

struct PendingConfirm {
    prompt: String,
    reply: oneshot::Sender<bool>,
}

pub struct ActivitiesApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    server_url: String,
    list: ActivityListView,
    status: StatusMessage,
    selection: SelectionState,
    pending_confirms: VecDeque<PendingConfirm>,
    /// Bottom status line for worker and queue problems.
    worker_status: String,
}

impl ActivitiesApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>, server_url: String) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            server_url,
            list: ActivityListView::default(),
            status: StatusMessage::default(),
            selection: SelectionState::default(),
            pending_confirms: VecDeque::new(),
            worker_status: String::new(),
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => self.worker_status = message,
                UiEvent::BackendFailed(message) => {
                    tracing::error!("{message}");
                    self.list.mark_unavailable();
                    self.worker_status = message;
                }
                UiEvent::View(ViewEvent::ListRefreshed(view)) => {
                    self.selection.retain_valid(&view);
                    self.list = view;
                }
                UiEvent::View(ViewEvent::StatusChanged(message)) => self.status = message,
                UiEvent::View(ViewEvent::FormReset) => self.selection.reset(),
                UiEvent::ConfirmRequested { prompt, reply } => {
                    self.pending_confirms
                        .push_back(PendingConfirm { prompt, reply });
                }
            }
        }
    }

    fn answer_confirm(&mut self, confirmed: bool) {
        if let Some(pending) = self.pending_confirms.pop_front() {
            // The backend may have given up waiting.
            let _ = pending.reply.send(confirmed);
        }
    }

    fn submit_signup(&mut self) {
        if !self.selection.is_complete() {
            return;
        }
        let Some(activity) = self.selection.activity.clone() else {
            return;
        };
        let email = self.selection.participant.trim().to_string();
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::Signup { email, activity },
            &mut self.worker_status,
        );
    }

    fn request_removal(&mut self, control: RemoveControl) {
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::Unregister {
                email: control.participant,
                activity: control.activity,
            },
            &mut self.worker_status,
        );
    }

    fn show_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.heading("Mergington High School");
                ui.weak("Extracurricular Activities");
            });
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Refresh").clicked() {
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::Refresh,
                        &mut self.worker_status,
                    );
                }
            });
        });
    }

    fn show_status_banner(&self, ui: &mut egui::Ui) {
        if !self.status.visible {
            return;
        }
        let (fill, stroke) = match self.status.kind {
            StatusKind::Success => (
                egui::Color32::from_rgb(46, 94, 62),
                egui::Stroke::new(1.0, egui::Color32::from_rgb(96, 160, 112)),
            ),
            StatusKind::Error => (
                egui::Color32::from_rgb(111, 53, 53),
                egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)),
            ),
        };

        egui::Frame::NONE
            .fill(fill)
            .stroke(stroke)
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(&self.status.text).color(egui::Color32::WHITE));
                });
            });
        ui.add_space(8.0);
    }

    fn show_activity_list(&mut self, ui: &mut egui::Ui) {
        ui.heading("Available Activities");
        ui.add_space(4.0);

        let mut removals = Vec::new();
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| match &self.list.area {
                ListArea::Loading => {
                    ui.weak(LOADING_NOTICE);
                }
                ListArea::Unavailable(notice) => {
                    ui.colored_label(egui::Color32::from_rgb(175, 96, 96), notice.as_str());
                }
                ListArea::Cards(cards) => {
                    for card in cards {
                        show_activity_card(ui, card, &mut removals);
                        ui.add_space(8.0);
                    }
                }
            });

        for control in removals {
            self.request_removal(control);
        }
    }

    fn show_signup_form(&mut self, ui: &mut egui::Ui) {
        ui.heading("Sign Up for an Activity");
        ui.add_space(6.0);

        ui.label("Student Email:");
        ui.add(
            egui::TextEdit::singleline(&mut self.selection.participant)
                .hint_text("your-email@mergington.edu"),
        );
        ui.add_space(4.0);

        ui.label("Select Activity:");
        let selected_text = self
            .selection
            .activity
            .clone()
            .unwrap_or_else(|| SELECTOR_PLACEHOLDER.to_string());
        egui::ComboBox::from_id_salt("activity_selector")
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                for option in &self.list.options {
                    ui.selectable_value(
                        &mut self.selection.activity,
                        Some(option.value.clone()),
                        option.label.as_str(),
                    );
                }
            });
        ui.add_space(8.0);

        let can_submit = self.selection.is_complete();
        if ui
            .add_enabled(can_submit, egui::Button::new("Sign Up"))
            .clicked()
        {
            self.submit_signup();
        }
    }

    fn show_confirm_dialog(&mut self, ctx: &egui::Context) {
        let Some(pending) = self.pending_confirms.front() else {
            return;
        };

        let mut answer = None;
        egui::Window::new("Confirm removal")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(pending.prompt.as_str());
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Remove").clicked() {
                        answer = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        answer = Some(false);
                    }
                });
            });

        if let Some(confirmed) = answer {
            self.answer_confirm(confirmed);
        }
    }
}

fn show_activity_card(ui: &mut egui::Ui, card: &ActivityCard, removals: &mut Vec<RemoveControl>) {
    egui::Frame::NONE
        .fill(ui.visuals().faint_bg_color)
        .stroke(egui::Stroke::new(
            1.0,
            ui.visuals().widgets.noninteractive.bg_stroke.color,
        ))
        .corner_radius(8.0)
        .inner_margin(egui::Margin::symmetric(12, 10))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(egui::RichText::new(&card.name).strong().size(16.0));
            ui.label(card.description.as_str());
            ui.label(format!("Schedule: {}", card.schedule));
            if let Some(spots) = card.spots_left {
                ui.weak(format!("Availability: {spots} spots left"));
            }
            ui.add_space(4.0);
            ui.label(egui::RichText::new("Participants:").strong());

            if card.rows().is_empty() {
                ui.weak(EMPTY_ROSTER_NOTICE);
            }
            for row in card.rows() {
                ui.horizontal(|ui| {
                    ui.label(row.participant.as_str());
                    if ui
                        .small_button("✕")
                        .on_hover_text("Unregister participant")
                        .clicked()
                    {
                        removals.push(row.remove.clone());
                    }
                });
            }
        });
}

impl eframe::App for ActivitiesApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(6.0);
            self.show_header(ui);
            ui.add_space(6.0);
        });

        egui::TopBottomPanel::bottom("worker_status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.small(self.server_url.as_str());
                if !self.worker_status.is_empty() {
                    ui.separator();
                    ui.small(self.worker_status.as_str());
                }
            });
        });

        egui::SidePanel::right("signup_form")
            .resizable(false)
            .min_width(280.0)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                self.show_signup_form(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_status_banner(ui);
            self.show_activity_list(ui);
        });

        self.show_confirm_dialog(ctx);
        ctx.request_repaint_after(UI_POLL_INTERVAL);
    }
}
