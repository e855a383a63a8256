use anyhow::Result;
use ratatui::layout::{Constraint, Direction, Layout};
use std::path::Path;
use std::time::Duration;

use porcelain::git::CancelHandle;
use porcelain::popup::{catalog, HostAction, PopupKind, PopupSpec};

use crate::action::Action;
use crate::components::action_hud::ActionHud;
use crate::components::context_bar::ContextBar;
use crate::components::dialog::render_dialog;
use crate::components::output_view::OutputView;
use crate::components::popup_view::PopupView;
use crate::components::status_view::StatusView;
use crate::components::Component;
use crate::config::AppConfig;
use crate::event::{map_key_to_action, Event, EventReader, KeyContext};
use crate::session::{Job, Session, Snapshot};
use crate::state::{AppState, DialogState, OutputState};
use crate::tui::Tui;
use crate::worker::{Report, Worker};

/// Ticks a message stays on the HUD.
const MESSAGE_TICKS: u32 = 20;

pub struct App {
    state: AppState,
    events: EventReader,
    worker: Worker,
    cancel: CancelHandle,
    /// Status-view key table.
    help: PopupSpec,
    /// Started with `--popup`: closing the popup ends the program.
    popup_only: bool,
    message_countdown: u32,
    viewport_height: usize,
}

impl App {
    pub fn new(session: Session, config: &AppConfig, popup: Option<PopupKind>) -> Self {
        let events = EventReader::new(Duration::from_millis(250));
        let mut state = AppState::new(config.theme.clone());
        apply_snapshot(&mut state, session.snapshot());
        let cancel = session.cancel_handle();
        let worker = Worker::new(session, events.sender());

        let mut app = Self {
            state,
            events,
            worker,
            cancel,
            help: catalog::popup(PopupKind::Help),
            popup_only: popup.is_some(),
            message_countdown: 0,
            viewport_height: 0,
        };
        if let Some(kind) = popup {
            app.submit(Job::OpenPopup(kind));
        }
        app
    }

    pub async fn run(&mut self, terminal: &mut Tui) -> Result<()> {
        let context_bar = ContextBar;
        let status_view = StatusView;
        let popup_view = PopupView;
        let output_view = OutputView;
        let action_hud = ActionHud;

        loop {
            // Update viewport height for cursor auto-scroll calculations
            let term_size = terminal.size()?;
            self.viewport_height = term_size.height.saturating_sub(2) as usize;
            self.state.status.ensure_visible(self.viewport_height);

            terminal.draw(|frame| {
                let outer = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(1),
                        Constraint::Min(1),
                        Constraint::Length(1),
                    ])
                    .split(frame.area());

                context_bar.render(frame, outer[0], &self.state);
                if !self.popup_only {
                    status_view.render(frame, outer[1], &self.state);
                }
                popup_view.render(frame, outer[1], &self.state);
                output_view.render(frame, outer[1], &self.state);
                action_hud.render(frame, outer[2], &self.state);
                render_dialog(frame, &self.state);
            })?;

            // Wait for at least one event, then drain everything queued
            let Some(first) = self.events.next().await else {
                break;
            };
            let mut pending = vec![first];
            while let Some(event) = self.events.try_next() {
                pending.push(event);
            }
            for event in pending {
                self.handle_event(event);
            }

            if self.state.should_quit {
                break;
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => {
                let ctx = KeyContext {
                    dialog: self.state.dialog.as_ref().map(DialogState::mode),
                    popup_open: self.state.popup.is_some(),
                    output_open: self.state.output.is_some(),
                    busy: self.state.busy,
                    visual_mode_active: self.state.status.selection.active,
                    status_keys: &self.help,
                };
                if let Some(action) = map_key_to_action(key, &ctx) {
                    self.update(action);
                }
            }
            Event::Resize => {}
            Event::Tick => {
                if self.message_countdown > 0 {
                    self.message_countdown -= 1;
                    if self.message_countdown == 0 {
                        self.state.status_message = None;
                    }
                }
            }
            Event::Prompt(prompt) => {
                self.state.dialog = Some(DialogState::new(prompt));
            }
            Event::Finished(report) => self.finish(*report),
        }
    }

    fn update(&mut self, action: Action) {
        let page = self.viewport_height.max(1) as isize;
        match action {
            Action::Quit => {
                // Let a job still running wind down.
                self.cancel.cancel();
                self.state.should_quit = true;
            }
            Action::CancelJob => {
                if self.state.busy {
                    self.cancel.cancel();
                    self.set_message("Cancelling...".to_string(), false);
                }
            }

            Action::CursorUp => self.state.status.move_by(-1),
            Action::CursorDown => self.state.status.move_by(1),
            Action::CursorTop => self.state.status.top(),
            Action::CursorBottom => self.state.status.bottom(),
            Action::PageUp => self.state.status.move_by(-page),
            Action::PageDown => self.state.status.move_by(page),
            Action::EnterVisualMode => self.state.status.selection.enter_visual(),
            Action::ExitVisualMode => self.state.status.selection.exit_visual(),
            Action::OpenPopup(kind) => self.submit(Job::OpenPopup(kind)),
            Action::Shortcut(key) => self.submit(Job::Shortcut {
                popup: PopupKind::Help,
                key,
            }),
            Action::Host(host) => self.host(host),

            Action::PopupKey(key) => self.submit(Job::PopupKey(key)),

            Action::OutputUp => self.scroll_output(-1),
            Action::OutputDown => self.scroll_output(1),
            Action::OutputPageUp => self.scroll_output(-page),
            Action::OutputPageDown => self.scroll_output(page),
            Action::CloseOutput => {
                self.state.output = None;
                if self.popup_only && self.state.popup.is_none() {
                    self.state.should_quit = true;
                }
            }

            Action::DialogYes => {
                if let Some(dialog) = self.state.dialog.take() {
                    dialog.confirm(true);
                }
            }
            Action::DialogNo => {
                if let Some(dialog) = self.state.dialog.take() {
                    dialog.confirm(false);
                }
            }
            Action::DialogSubmit => {
                if let Some(dialog) = self.state.dialog.take() {
                    dialog.submit();
                }
            }
            Action::DialogCancel => {
                if let Some(dialog) = self.state.dialog.take() {
                    dialog.cancel();
                }
            }
            Action::DialogChar(c) => {
                if let Some(dialog) = self.state.dialog.as_mut() {
                    dialog.push(c);
                }
            }
            Action::DialogBackspace => {
                if let Some(dialog) = self.state.dialog.as_mut() {
                    dialog.pop();
                }
            }
            Action::DialogUp => {
                if let Some(dialog) = self.state.dialog.as_mut() {
                    dialog.up();
                }
            }
            Action::DialogDown => {
                if let Some(dialog) = self.state.dialog.as_mut() {
                    dialog.down();
                }
            }
        }
    }

    /// Host actions fired from the status view or returned by a popup.
    fn host(&mut self, action: HostAction) {
        let selection = self.state.status.selection.selection();
        let cursor = self.state.status.cursor();
        let job = match action {
            HostAction::Refresh => Job::Refresh,
            HostAction::History => Job::History,
            HostAction::GoToFile => Job::Locate(cursor),
            HostAction::Toggle => Job::Toggle(cursor),
            HostAction::Stage => Job::Stage(selection),
            HostAction::StageUnstaged => Job::StageTracked,
            HostAction::StageAll => Job::StageAll,
            HostAction::Unstage => Job::Unstage(selection),
            HostAction::UnstageStaged => Job::UnstageAll,
            HostAction::Discard => Job::Discard(selection),
            HostAction::Untrack => Job::Untrack(selection),
            HostAction::ToggleMargin => {
                self.state.margin.visible = !self.state.margin.visible;
                return;
            }
            HostAction::CycleMarginStyle => {
                self.state.margin.cycle_style();
                return;
            }
            HostAction::ToggleMarginDetails => {
                self.state.margin.details = !self.state.margin.details;
                return;
            }
            HostAction::ToggleShortstat => {
                self.state.margin.shortstat = !self.state.margin.shortstat;
                return;
            }
        };
        if matches!(
            job,
            Job::Stage(_) | Job::Unstage(_) | Job::Discard(_) | Job::Untrack(_)
        ) {
            self.state.status.selection.exit_visual();
        }
        self.submit(job);
    }

    fn submit(&mut self, job: Job) {
        if self.worker.submit(job) {
            self.state.busy = true;
        } else {
            self.set_message("Background worker stopped".to_string(), true);
        }
    }

    fn finish(&mut self, report: Report) {
        self.state.busy = false;
        // A job that finished without answering its prompt drops the dialog.
        self.state.dialog = None;
        apply_snapshot(&mut self.state, report.snapshot);

        if let Some((message, is_error)) = report.message {
            self.set_message(message, is_error);
        }
        if let Some((title, text)) = report.show {
            self.state.output = Some(OutputState::new(title, &text));
        }
        if let Some((path, line)) = report.open {
            self.show_file(&path, line);
        }
        if let Some(host) = report.host {
            self.host(host);
        }
        if self.popup_only && self.state.popup.is_none() && self.state.output.is_none() {
            self.state.should_quit = true;
        }
    }

    fn show_file(&mut self, path: &Path, line: Option<u32>) {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let mut output = OutputState::new(path.display().to_string(), &text);
                if let Some(line) = line {
                    output.scroll_by(line.saturating_sub(1) as isize, self.viewport_height);
                }
                self.state.output = Some(output);
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "cannot open file");
                self.set_message(format!("Cannot open {}: {err}", path.display()), true);
            }
        }
    }

    fn scroll_output(&mut self, delta: isize) {
        let height = self.viewport_height.saturating_sub(2);
        if let Some(output) = self.state.output.as_mut() {
            output.scroll_by(delta, height);
        }
    }

    fn set_message(&mut self, message: String, is_error: bool) {
        self.state.status_message = Some((message, is_error));
        self.message_countdown = MESSAGE_TICKS;
    }
}

fn apply_snapshot(state: &mut AppState, snapshot: Snapshot) {
    state.head = snapshot.head;
    state.status.replace_rows(snapshot.rows);
    state.popup = snapshot.popup;
}
