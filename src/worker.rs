use std::sync::mpsc as std_mpsc;

use tokio::sync::mpsc;

use porcelain::Interaction;

use crate::event::Event;
use crate::session::{Job, Session};

pub use crate::session::Report;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    Confirm,
    Input { default: Option<String> },
    Choose { candidates: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Confirm(bool),
    /// `None` when the dialog was dismissed.
    Text(Option<String>),
}

/// A question from the worker. The worker thread blocks until it is
/// answered or dropped.
#[derive(Debug)]
pub struct Prompt {
    pub text: String,
    pub kind: PromptKind,
    reply: std_mpsc::Sender<Answer>,
}

impl Prompt {
    pub fn new(text: &str, kind: PromptKind) -> (Self, std_mpsc::Receiver<Answer>) {
        let (reply, answer) = std_mpsc::channel();
        let prompt = Self {
            text: text.to_string(),
            kind,
            reply,
        };
        (prompt, answer)
    }

    pub fn answer(self, answer: Answer) {
        let _ = self.reply.send(answer);
    }
}

/// [`Interaction`] that forwards each question to the UI as an event.
struct ChannelInteraction {
    events: mpsc::UnboundedSender<Event>,
}

impl ChannelInteraction {
    fn ask(&self, text: &str, kind: PromptKind) -> Option<Answer> {
        let (prompt, answer) = Prompt::new(text, kind);
        self.events.send(Event::Prompt(prompt)).ok()?;
        // A dropped prompt counts as dismissed.
        answer.recv().ok()
    }
}

impl Interaction for ChannelInteraction {
    fn confirm(&mut self, prompt: &str) -> bool {
        matches!(
            self.ask(prompt, PromptKind::Confirm),
            Some(Answer::Confirm(true))
        )
    }

    fn input(&mut self, prompt: &str, default: Option<&str>) -> Option<String> {
        let kind = PromptKind::Input {
            default: default.map(str::to_string),
        };
        match self.ask(prompt, kind)? {
            Answer::Text(text) => text,
            Answer::Confirm(_) => None,
        }
    }

    fn choose(&mut self, prompt: &str, candidates: &[String]) -> Option<String> {
        let kind = PromptKind::Choose {
            candidates: candidates.to_vec(),
        };
        match self.ask(prompt, kind)? {
            Answer::Text(choice) => choice,
            Answer::Confirm(_) => None,
        }
    }
}

/// Owns the session and runs jobs on the blocking pool, strictly one after
/// another. Results come back as [`Event::Finished`].
pub struct Worker {
    job_tx: mpsc::UnboundedSender<Job>,
}

impl Worker {
    pub fn new(session: Session, events: mpsc::UnboundedSender<Event>) -> Self {
        let (job_tx, mut job_rx) = mpsc::unbounded_channel::<Job>();

        tokio::spawn(async move {
            let mut session = Some(session);
            while let Some(job) = job_rx.recv().await {
                let Some(mut current) = session.take() else {
                    break;
                };
                let tx = events.clone();

                let handle = tokio::task::spawn_blocking(move || {
                    let mut ui = ChannelInteraction { events: tx };
                    let report = current.run(job, &mut ui);
                    (current, report)
                });
                match handle.await {
                    Ok((current, report)) => {
                        session = Some(current);
                        if events.send(Event::Finished(Box::new(report))).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::error!(%err, "worker job panicked");
                        break;
                    }
                }
            }
        });

        Self { job_tx }
    }

    /// Queue a job. Returns false once the worker is gone.
    pub fn submit(&self, job: Job) -> bool {
        self.job_tx.send(job).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_flow_back_to_the_asking_thread() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let asking = std::thread::spawn(move || {
            let mut ui = ChannelInteraction { events: tx };
            (
                ui.confirm("Discard?"),
                ui.choose("Branch", &["master".to_string(), "dev".to_string()]),
            )
        });

        for answer in [Answer::Confirm(true), Answer::Text(Some("dev".to_string()))] {
            match rx.recv().await {
                Some(Event::Prompt(prompt)) => prompt.answer(answer),
                other => panic!("expected a prompt, got {other:?}"),
            }
        }

        let (confirmed, chosen) = asking.join().unwrap();
        assert!(confirmed);
        assert_eq!(chosen.as_deref(), Some("dev"));
    }

    #[tokio::test]
    async fn dropped_prompt_is_a_dismissal() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let asking = std::thread::spawn(move || {
            let mut ui = ChannelInteraction { events: tx };
            ui.input("Name", Some("x"))
        });
        match rx.recv().await {
            Some(Event::Prompt(prompt)) => {
                assert_eq!(prompt.kind, PromptKind::Input { default: Some("x".to_string()) });
                drop(prompt);
            }
            other => panic!("expected a prompt, got {other:?}"),
        }
        assert_eq!(asking.join().unwrap(), None);
    }
}
