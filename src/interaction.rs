//! User interaction collaborator.
//!
//! The core asks the host for confirmations, free-form text and a choice
//! among candidates. Every call is blocking from the core's point of view;
//! `None` means the user dismissed the prompt.

pub trait Interaction {
    fn confirm(&mut self, prompt: &str) -> bool;

    fn input(&mut self, prompt: &str, default: Option<&str>) -> Option<String>;

    fn choose(&mut self, prompt: &str, candidates: &[String]) -> Option<String>;
}

/// Answers every question negatively. Useful for hosts without a UI.
#[derive(Debug, Default, Clone, Copy)]
pub struct Decline;

impl Interaction for Decline {
    fn confirm(&mut self, _prompt: &str) -> bool {
        false
    }

    fn input(&mut self, _prompt: &str, _default: Option<&str>) -> Option<String> {
        None
    }

    fn choose(&mut self, _prompt: &str, _candidates: &[String]) -> Option<String> {
        None
    }
}
