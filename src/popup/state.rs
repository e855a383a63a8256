use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::spec::*;
use crate::error::{Error, Result};
use crate::git::config::ConfigStore;

/// One config assignment; `None` unsets the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWrite {
    pub key: String,
    pub value: Option<String>,
}

impl ConfigWrite {
    fn new(key: &str, value: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            value: value.map(str::to_string),
        }
    }

    fn apply(&self, config: &dyn ConfigStore) -> Result<()> {
        match &self.value {
            Some(value) => config.set(&self.key, value),
            None => config.unset(&self.key),
        }
    }
}

/// A variable change, carrying the writes that revert it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigCommand {
    pub writes: Vec<ConfigWrite>,
    pub undo: Vec<ConfigWrite>,
}

impl ConfigCommand {
    /// Apply every write in order. When one fails, the writes already made
    /// are reverted before the error is returned.
    pub fn execute(&self, config: &dyn ConfigStore) -> Result<()> {
        for (done, write) in self.writes.iter().enumerate() {
            if let Err(err) = write.apply(config) {
                for applied in self.writes[..done].iter().rev() {
                    let Some(undo) = self.undo.iter().find(|u| u.key == applied.key) else {
                        continue;
                    };
                    if let Err(revert) = undo.apply(config) {
                        tracing::warn!(key = %undo.key, error = %revert, "could not revert config write");
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn inverse(&self) -> ConfigCommand {
        ConfigCommand {
            writes: self.undo.clone(),
            undo: self.writes.clone(),
        }
    }
}

/// `branch.<b>.merge` is paired with `branch.<b>.remote`.
fn upstream_remote_key(merge_key: &str) -> String {
    match merge_key.strip_suffix(".merge") {
        Some(prefix) => format!("{prefix}.remote"),
        None => format!("{merge_key}.remote"),
    }
}

/// Run-time state of one open popup.
///
/// Every mutation returns a new state; the previous one is left as it was,
/// which is what lets the dispatcher keep a stack of parents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupState {
    spec: Arc<PopupSpec>,
    scope: Scope,
    switches: BTreeSet<String>,
    options: BTreeMap<String, String>,
    /// Mirror of the config keys behind the variables; absent means unset.
    config: BTreeMap<String, String>,
}

impl PopupState {
    /// Open a popup. Variables are read from `config` now; a key that cannot
    /// be resolved in this scope, or cannot be read, shows as unset.
    pub fn open(spec: PopupSpec, scope: Scope, config: &dyn ConfigStore) -> PopupState {
        let mut options = BTreeMap::new();
        let mut mirror = BTreeMap::new();
        for argument in &spec.arguments {
            match &argument.kind {
                ArgumentKind::Option {
                    default: Some(default),
                    ..
                } => {
                    options.insert(argument.key.clone(), default.clone());
                }
                ArgumentKind::Variable { config_key, input } => {
                    let mut keys: Vec<String> = scope.expand(config_key).into_iter().collect();
                    if let (VariableInput::Upstream, Some(merge)) = (input, keys.first()) {
                        keys.push(upstream_remote_key(merge));
                    }
                    if let VariableInput::Cycle {
                        fallback: Some((key, _)),
                        ..
                    } = input
                    {
                        keys.push(key.clone());
                    }
                    for key in keys {
                        match config.get(&key) {
                            Ok(Some(value)) => {
                                mirror.insert(key, value);
                            }
                            Ok(None) => {}
                            Err(err) => tracing::warn!(%key, %err, "could not read config"),
                        }
                    }
                }
                _ => {}
            }
        }
        PopupState {
            spec: Arc::new(spec),
            scope,
            switches: BTreeSet::new(),
            options,
            config: mirror,
        }
    }

    pub fn spec(&self) -> &PopupSpec {
        &self.spec
    }

    pub fn kind(&self) -> PopupKind {
        self.spec.kind
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn is_enabled(&self, key: &str) -> bool {
        self.switches.contains(key)
    }

    pub fn option_value(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn config_value(&self, config_key: &str) -> Option<&str> {
        self.config.get(config_key).map(String::as_str)
    }

    /// Resolved config key of a variable, `None` when out of scope.
    pub fn variable_key(&self, key: &str) -> Option<String> {
        match &self.spec.argument(key)?.kind {
            ArgumentKind::Variable { config_key, .. } => self.scope.expand(config_key),
            _ => None,
        }
    }

    pub fn variable_value(&self, key: &str) -> Option<&str> {
        let config_key = self.variable_key(key)?;
        self.config_value(&config_key)
    }

    fn argument(&self, key: &str) -> Result<&ArgumentSpec> {
        self.spec
            .argument(key)
            .ok_or_else(|| Error::UnknownArgument(key.to_string()))
    }

    /// Flip a switch. No I/O.
    pub fn toggle(&self, key: &str) -> Result<PopupState> {
        if !self.argument(key)?.is_switch() {
            return Err(Error::UnknownArgument(key.to_string()));
        }
        let mut next = self.clone();
        if !next.switches.remove(key) {
            next.switches.insert(key.to_string());
        }
        Ok(next)
    }

    /// Set or clear an option. Values are checked against the declared
    /// choices; setting one option of an exclusive group clears the others.
    pub fn set_option(&self, key: &str, value: Option<&str>) -> Result<PopupState> {
        let argument = self.argument(key)?;
        let ArgumentKind::Option { choices, group, .. } = &argument.kind else {
            return Err(Error::UnknownArgument(key.to_string()));
        };

        let mut next = self.clone();
        match value.filter(|v| !v.is_empty()) {
            Some(value) => {
                if !choices.is_empty() && !choices.iter().any(|c| c == value) {
                    return Err(Error::InvalidArgumentValue {
                        key: key.to_string(),
                        value: value.to_string(),
                        allowed: choices.clone(),
                    });
                }
                if let Some(group) = group {
                    for other in &self.spec.arguments {
                        if let ArgumentKind::Option {
                            group: Some(other_group),
                            ..
                        } = &other.kind
                        {
                            if other_group == group {
                                next.options.remove(&other.key);
                            }
                        }
                    }
                }
                next.options.insert(key.to_string(), value.to_string());
            }
            None => {
                next.options.remove(key);
            }
        }
        Ok(next)
    }

    /// The config change that would set variable `key` to `value`.
    pub fn variable_command(&self, key: &str, value: Option<&str>) -> Result<ConfigCommand> {
        let argument = self.argument(key)?;
        let ArgumentKind::Variable { config_key, input } = &argument.kind else {
            return Err(Error::UnknownArgument(key.to_string()));
        };
        let resolved = self.scope.expand(config_key).ok_or_else(|| {
            if config_key.contains("{branch}") {
                Error::NoBranch
            } else {
                Error::UnknownArgument(config_key.clone())
            }
        })?;
        let value = value.filter(|v| !v.is_empty());

        match input {
            VariableInput::Cycle { choices, .. } => {
                if let Some(v) = value {
                    if !choices.iter().any(|c| c == v) {
                        return Err(Error::InvalidArgumentValue {
                            key: resolved,
                            value: v.to_string(),
                            allowed: choices.clone(),
                        });
                    }
                }
            }
            VariableInput::Upstream => {
                // `remote/branch` for a remote-tracking branch, a bare name for a local one.
                let target = value.map(|v| v.split_once('/').unwrap_or((".", v)));
                return self.upstream_command(key, target);
            }
            VariableInput::Free | VariableInput::Remote => {}
        }

        Ok(ConfigCommand {
            writes: vec![ConfigWrite::new(&resolved, value)],
            undo: vec![ConfigWrite::new(&resolved, self.config_value(&resolved))],
        })
    }

    /// Set (`Some((remote, branch))`, `.` for a local branch) or clear an
    /// upstream pair variable.
    pub fn upstream_command(&self, key: &str, target: Option<(&str, &str)>) -> Result<ConfigCommand> {
        let merge_key = self.variable_key(key).ok_or(Error::NoBranch)?;
        let remote_key = upstream_remote_key(&merge_key);
        let (remote, merge) = match target {
            Some((remote, branch)) => (
                Some(remote.to_string()),
                Some(format!("refs/heads/{branch}")),
            ),
            None => (None, None),
        };
        Ok(ConfigCommand {
            writes: vec![
                ConfigWrite::new(&merge_key, merge.as_deref()),
                ConfigWrite::new(&remote_key, remote.as_deref()),
            ],
            undo: vec![
                ConfigWrite::new(&merge_key, self.config_value(&merge_key)),
                ConfigWrite::new(&remote_key, self.config_value(&remote_key)),
            ],
        })
    }

    /// Write a variable through to `config` and mirror the result.
    pub fn set_variable(
        &self,
        key: &str,
        value: Option<&str>,
        config: &dyn ConfigStore,
    ) -> Result<PopupState> {
        let command = self.variable_command(key, value)?;
        self.apply(&command, config)
    }

    /// Execute a config command and mirror its writes.
    pub fn apply(&self, command: &ConfigCommand, config: &dyn ConfigStore) -> Result<PopupState> {
        command.execute(config)?;
        tracing::info!(writes = ?command.writes, "variable written");
        let mut next = self.clone();
        for write in &command.writes {
            match &write.value {
                Some(value) => next.config.insert(write.key.clone(), value.clone()),
                None => next.config.remove(&write.key),
            };
        }
        Ok(next)
    }

    /// The value a cycling variable takes on its next press.
    pub fn next_cycle_value(&self, key: &str) -> Result<Option<String>> {
        let argument = self.argument(key)?;
        let ArgumentKind::Variable {
            input: VariableInput::Cycle { choices, fallback },
            ..
        } = &argument.kind
        else {
            return Err(Error::UnknownArgument(key.to_string()));
        };
        let mut order: Vec<Option<&str>> = choices.iter().map(|c| Some(c.as_str())).collect();
        if fallback.is_some() {
            order.push(None);
        }
        let current = self.variable_value(key);
        let next = match order.iter().position(|v| *v == current) {
            Some(i) => order[(i + 1) % order.len()],
            None => order.first().copied().flatten(),
        };
        Ok(next.map(str::to_string))
    }

    /// Structured rows for the host to lay out.
    pub fn rows(&self) -> PopupRows {
        let mut rows = PopupRows {
            title: self.scope.label(&self.spec.title),
            variables: Vec::new(),
            arguments: Vec::new(),
            actions: Vec::new(),
        };

        for argument in &self.spec.arguments {
            match &argument.kind {
                ArgumentKind::Variable { config_key, input } => {
                    let name = self.scope.label(config_key);
                    let value = self.scope.expand(config_key).and_then(|k| self.config.get(&k));
                    let section = section_mut(&mut rows.variables, &argument.section);
                    match input {
                        VariableInput::Cycle { choices, fallback } => {
                            let mut cells: Vec<ChoiceCell> = choices
                                .iter()
                                .map(|c| ChoiceCell {
                                    text: c.clone(),
                                    active: value == Some(c),
                                })
                                .collect();
                            if let Some((fallback_key, default)) = fallback {
                                let global = self
                                    .config_value(fallback_key)
                                    .unwrap_or(default.as_str());
                                cells.push(ChoiceCell {
                                    text: format!("{fallback_key}:{global}"),
                                    active: value.is_none(),
                                });
                            }
                            section.push(VariableRow {
                                key: argument.key.clone(),
                                name,
                                value: VariableValue::Choices(cells),
                            });
                        }
                        VariableInput::Upstream => {
                            let remote_name = upstream_remote_key(&name);
                            let remote = self
                                .scope
                                .expand(config_key)
                                .and_then(|k| self.config.get(&upstream_remote_key(&k)));
                            section.push(VariableRow {
                                key: argument.key.clone(),
                                name,
                                value: VariableValue::Text(value.cloned()),
                            });
                            section.push(VariableRow {
                                key: String::new(),
                                name: remote_name,
                                value: VariableValue::Text(remote.cloned()),
                            });
                        }
                        VariableInput::Free | VariableInput::Remote => section.push(VariableRow {
                            key: argument.key.clone(),
                            name,
                            value: VariableValue::Text(value.cloned()),
                        }),
                    }
                }
                ArgumentKind::Switch => {
                    section_mut(&mut rows.arguments, &argument.section).push(ArgumentRow {
                        key: argument.key.clone(),
                        description: argument.description.clone(),
                        flag: argument.flag_hint(),
                        enabled: self.is_enabled(&argument.key),
                    });
                }
                ArgumentKind::Option { .. } => {
                    let value = self.option_value(&argument.key);
                    let flag = match value {
                        Some(v) => argument.render_option(v).join(" "),
                        None => argument.flag_hint(),
                    };
                    section_mut(&mut rows.arguments, &argument.section).push(ArgumentRow {
                        key: argument.key.clone(),
                        description: argument.description.clone(),
                        flag,
                        enabled: value.is_some(),
                    });
                }
            }
        }

        for action in &self.spec.actions {
            let heading = self.scope.label(&action.group);
            if rows.actions.last().map(|g| &g.heading) != Some(&heading) {
                rows.actions.push(ActionGroup {
                    heading,
                    actions: Vec::new(),
                });
            }
            if let Some(group) = rows.actions.last_mut() {
                group.actions.push((action.key.clone(), action.description.clone()));
            }
        }
        rows
    }
}

fn section_mut<'a, T>(sections: &'a mut Vec<(String, Vec<T>)>, heading: &str) -> &'a mut Vec<T> {
    if sections.last().map(|(h, _)| h.as_str()) != Some(heading) {
        sections.push((heading.to_string(), Vec::new()));
    }
    let last = sections.len() - 1;
    &mut sections[last].1
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceCell {
    pub text: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableValue {
    /// `None` renders as `unset`.
    Text(Option<String>),
    Choices(Vec<ChoiceCell>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRow {
    pub key: String,
    pub name: String,
    pub value: VariableValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentRow {
    pub key: String,
    pub description: String,
    pub flag: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionGroup {
    pub heading: String,
    pub actions: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupRows {
    pub title: String,
    pub variables: Vec<(String, Vec<VariableRow>)>,
    pub arguments: Vec<(String, Vec<ArgumentRow>)>,
    pub actions: Vec<ActionGroup>,
}
