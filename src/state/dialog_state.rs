use crate::event::DialogMode;
use crate::worker::{Answer, Prompt, PromptKind};

/// The open confirm, input or choose dialog. Holds the worker's prompt until
/// it is answered.
#[derive(Debug)]
pub struct DialogState {
    prompt: Prompt,
    /// Typed text; the filter for choose dialogs.
    pub input: String,
    /// Index into [`DialogState::matches`].
    pub selected: usize,
}

impl DialogState {
    pub fn new(prompt: Prompt) -> Self {
        let input = match &prompt.kind {
            PromptKind::Input { default } => default.clone().unwrap_or_default(),
            _ => String::new(),
        };
        Self {
            prompt,
            input,
            selected: 0,
        }
    }

    pub fn mode(&self) -> DialogMode {
        match self.prompt.kind {
            PromptKind::Confirm => DialogMode::Confirm,
            PromptKind::Input { .. } => DialogMode::Input,
            PromptKind::Choose { .. } => DialogMode::Choose,
        }
    }

    pub fn text(&self) -> &str {
        &self.prompt.text
    }

    /// Candidates containing the typed filter, case-insensitively.
    pub fn matches(&self) -> Vec<&str> {
        let PromptKind::Choose { candidates } = &self.prompt.kind else {
            return Vec::new();
        };
        let needle = self.input.to_lowercase();
        candidates
            .iter()
            .filter(|c| c.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }

    pub fn push(&mut self, c: char) {
        self.input.push(c);
        self.selected = 0;
    }

    pub fn pop(&mut self) {
        self.input.pop();
        self.selected = 0;
    }

    pub fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn down(&mut self) {
        let count = self.matches().len();
        if self.selected + 1 < count {
            self.selected += 1;
        }
    }

    /// Answer with what the dialog currently shows.
    pub fn submit(self) -> Answer {
        match self.mode() {
            DialogMode::Confirm => self.reply(Answer::Confirm(true)),
            DialogMode::Input => {
                let text = self.input.clone();
                self.reply(Answer::Text(Some(text)))
            }
            DialogMode::Choose => {
                let choice = self.matches().get(self.selected).map(|c| c.to_string());
                self.reply(Answer::Text(choice))
            }
        }
    }

    pub fn confirm(self, yes: bool) -> Answer {
        self.reply(Answer::Confirm(yes))
    }

    pub fn cancel(self) -> Answer {
        let answer = match self.mode() {
            DialogMode::Confirm => Answer::Confirm(false),
            _ => Answer::Text(None),
        };
        self.reply(answer)
    }

    fn reply(self, answer: Answer) -> Answer {
        self.prompt.answer(answer.clone());
        answer
    }
}
