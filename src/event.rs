use crossterm::event::{Event as CrosstermEvent, EventStream, KeyCode, KeyEvent, KeyModifiers};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;

use porcelain::popup::spec::{ActionKind, PopupSpec};
use porcelain::popup::PopupKind;

use crate::action::Action;
use crate::worker::{Prompt, Report};

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    Tick,
    /// The worker is blocked on a question to the user.
    Prompt(Prompt),
    /// The worker finished a job.
    Finished(Box<Report>),
}

pub struct EventReader {
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventReader {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let event_tx = tx.clone();
        tokio::spawn(async move {
            let mut reader = EventStream::new();
            loop {
                let event = match reader.next().await {
                    Some(Ok(CrosstermEvent::Key(key))) => Event::Key(key),
                    Some(Ok(CrosstermEvent::Resize(_, _))) => Event::Resize,
                    Some(Err(_)) | None => break,
                    _ => continue,
                };
                if event_tx.send(event).is_err() {
                    break;
                }
            }
        });

        let tick_tx = tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_rate);
            loop {
                interval.tick().await;
                if tick_tx.send(Event::Tick).is_err() {
                    break;
                }
            }
        });

        Self { tx, rx }
    }

    /// Handle for producers outside the terminal, i.e. the worker.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Non-blocking: returns a pending event if one is available, or None.
    pub fn try_next(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}

/// Key names as the popup key tables spell them.
pub fn key_name(key: &KeyEvent) -> Option<String> {
    let name = match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            format!("<c-{}>", c.to_ascii_lowercase())
        }
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "<cr>".to_string(),
        KeyCode::Tab => "<tab>".to_string(),
        KeyCode::Esc => "<esc>".to_string(),
        KeyCode::Backspace => "<bs>".to_string(),
        _ => return None,
    };
    Some(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    Confirm,
    Input,
    Choose,
}

/// All context needed to map a key event to an action.
pub struct KeyContext<'a> {
    pub dialog: Option<DialogMode>,
    pub popup_open: bool,
    pub output_open: bool,
    /// A job is running; the core takes no keys until it reports back.
    pub busy: bool,
    pub visual_mode_active: bool,
    /// Bindings of the status view, taken from the help popup.
    pub status_keys: &'a PopupSpec,
}

/// Map a key event to an action based on current app context.
pub fn map_key_to_action(key: KeyEvent, ctx: &KeyContext<'_>) -> Option<Action> {
    // Dialogs answer the worker and take priority over everything else
    if let Some(mode) = ctx.dialog {
        return dialog_key(key, mode);
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    if ctx.busy {
        let cancel = key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('g');
        return cancel.then_some(Action::CancelJob);
    }

    if ctx.output_open {
        return match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Action::OutputUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::OutputDown),
            KeyCode::PageUp => Some(Action::OutputPageUp),
            KeyCode::PageDown | KeyCode::Char(' ') => Some(Action::OutputPageDown),
            KeyCode::Esc | KeyCode::Char('q') => Some(Action::CloseOutput),
            _ => None,
        };
    }

    if ctx.popup_open {
        return key_name(&key).map(Action::PopupKey);
    }

    if ctx.visual_mode_active {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => return Some(Action::CursorUp),
            KeyCode::Down | KeyCode::Char('j') => return Some(Action::CursorDown),
            KeyCode::Char('V') | KeyCode::Char('v') | KeyCode::Esc => {
                return Some(Action::ExitVisualMode)
            }
            _ => {}
        }
    } else {
        match key.code {
            KeyCode::Char('q') => return Some(Action::Quit),
            KeyCode::Up | KeyCode::Char('k') => return Some(Action::CursorUp),
            KeyCode::Down | KeyCode::Char('j') => return Some(Action::CursorDown),
            KeyCode::Char('g') | KeyCode::Home => return Some(Action::CursorTop),
            KeyCode::Char('G') | KeyCode::End => return Some(Action::CursorBottom),
            KeyCode::PageUp => return Some(Action::PageUp),
            KeyCode::PageDown => return Some(Action::PageDown),
            KeyCode::Char('V') => return Some(Action::EnterVisualMode),
            KeyCode::Char('?') => return Some(Action::OpenPopup(PopupKind::Help)),
            KeyCode::Char('L') => return Some(Action::OpenPopup(PopupKind::Margin)),
            _ => {}
        }
    }

    let name = key_name(&key)?;
    let action = ctx.status_keys.action(&name)?;
    match &action.kind {
        ActionKind::Popup(kind) => Some(Action::OpenPopup(*kind)),
        ActionKind::Host(host) => Some(Action::Host(*host)),
        _ => Some(Action::Shortcut(name)),
    }
}

fn dialog_key(key: KeyEvent, mode: DialogMode) -> Option<Action> {
    match mode {
        DialogMode::Confirm => match key.code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::DialogYes),
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => Some(Action::DialogNo),
            _ => None,
        },
        DialogMode::Input | DialogMode::Choose => match key.code {
            KeyCode::Esc => Some(Action::DialogCancel),
            KeyCode::Enter => Some(Action::DialogSubmit),
            KeyCode::Backspace => Some(Action::DialogBackspace),
            KeyCode::Up if mode == DialogMode::Choose => Some(Action::DialogUp),
            KeyCode::Down | KeyCode::Tab if mode == DialogMode::Choose => Some(Action::DialogDown),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::DialogChar(c))
            }
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use porcelain::popup::{catalog, HostAction};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn status_context(help: &PopupSpec) -> KeyContext<'_> {
        KeyContext {
            dialog: None,
            popup_open: false,
            output_open: false,
            busy: false,
            visual_mode_active: false,
            status_keys: help,
        }
    }

    #[test]
    fn key_names_follow_popup_notation() {
        assert_eq!(
            key_name(&KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)).as_deref(),
            Some("<c-s>")
        );
        assert_eq!(key_name(&press(KeyCode::Enter)).as_deref(), Some("<cr>"));
        assert_eq!(key_name(&press(KeyCode::Char('P'))).as_deref(), Some("P"));
        assert_eq!(key_name(&press(KeyCode::F(1))), None);
    }

    #[test]
    fn status_keys_come_from_the_help_popup() {
        let help = catalog::popup(PopupKind::Help);
        let ctx = status_context(&help);
        assert_eq!(
            map_key_to_action(press(KeyCode::Char('P')), &ctx),
            Some(Action::OpenPopup(PopupKind::Push))
        );
        assert_eq!(
            map_key_to_action(press(KeyCode::Char('s')), &ctx),
            Some(Action::Host(HostAction::Stage))
        );
        assert_eq!(
            map_key_to_action(press(KeyCode::Char('I')), &ctx),
            Some(Action::Shortcut("I".to_string()))
        );
    }

    #[test]
    fn open_popup_receives_raw_key_names() {
        let help = catalog::popup(PopupKind::Help);
        let ctx = KeyContext {
            popup_open: true,
            ..status_context(&help)
        };
        assert_eq!(
            map_key_to_action(press(KeyCode::Char('q')), &ctx),
            Some(Action::PopupKey("q".to_string()))
        );
    }

    #[test]
    fn busy_core_drops_keys_but_dialogs_still_answer() {
        let help = catalog::popup(PopupKind::Help);
        let busy = KeyContext {
            busy: true,
            ..status_context(&help)
        };
        assert_eq!(map_key_to_action(press(KeyCode::Char('s')), &busy), None);
        assert_eq!(
            map_key_to_action(KeyEvent::new(KeyCode::Char('g'), KeyModifiers::CONTROL), &busy),
            Some(Action::CancelJob)
        );

        let asking = KeyContext {
            dialog: Some(DialogMode::Confirm),
            ..busy
        };
        assert_eq!(
            map_key_to_action(press(KeyCode::Char('y')), &asking),
            Some(Action::DialogYes)
        );
    }
}
