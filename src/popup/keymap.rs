use std::collections::BTreeMap;

use super::spec::{key_sequence, PopupSpec};

/// What a key sequence is bound to in one popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Argument(String),
    Action(String),
}

#[derive(Debug)]
struct Node<T> {
    value: Option<T>,
    children: BTreeMap<String, Node<T>>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            value: None,
            children: BTreeMap::new(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Lookup<'a, T> {
    Match(&'a T),
    /// A prefix of at least one longer binding.
    Pending,
    NoMatch,
}

/// Keystroke trie. Sequences never exceed the longest inserted binding.
#[derive(Debug)]
pub struct KeyTrie<T> {
    root: Node<T>,
    max_len: usize,
}

impl<T> Default for KeyTrie<T> {
    fn default() -> Self {
        Self {
            root: Node::default(),
            max_len: 0,
        }
    }
}

impl<T> KeyTrie<T> {
    pub fn insert(&mut self, keys: &[String], value: T) {
        let mut node = &mut self.root;
        for key in keys {
            node = node.children.entry(key.clone()).or_default();
        }
        node.value = Some(value);
        self.max_len = self.max_len.max(keys.len());
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// An exact match wins over a longer binding sharing the prefix.
    pub fn lookup(&self, keys: &[String]) -> Lookup<'_, T> {
        if keys.is_empty() || keys.len() > self.max_len {
            return Lookup::NoMatch;
        }
        let mut node = &self.root;
        for key in keys {
            match node.children.get(key) {
                Some(child) => node = child,
                None => return Lookup::NoMatch,
            }
        }
        match &node.value {
            Some(value) => Lookup::Match(value),
            None if !node.children.is_empty() => Lookup::Pending,
            None => Lookup::NoMatch,
        }
    }
}

/// Bindings for every argument and action of a popup.
pub fn popup_keymap(spec: &PopupSpec) -> KeyTrie<Binding> {
    let mut trie = KeyTrie::default();
    for argument in &spec.arguments {
        trie.insert(&key_sequence(&argument.key), Binding::Argument(argument.key.clone()));
    }
    for action in &spec.actions {
        trie.insert(&key_sequence(&action.key), Binding::Action(action.key.clone()));
    }
    trie
}
