//! "Already applied" flags consulted while refreshing options after a reload.
//!
//! During a refresh every option replays its actions. Some of those effects are
//! already represented in the graph (a define restored by deserialization, a pass
//! re-included by a later option), so the dispatcher records what it applied here
//! and lets a stored `true` win over a later hide/remove.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleKind {
    Option,
    Port,
    Define,
    Undefine,
    Pass,
}

/// Structured key for one toggle flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToggleKey {
    /// Pass the action was scoped to; `None` for unscoped and all-pass actions.
    pub pass: Option<String>,
    pub kind: ToggleKind,
    pub subject: String,
}

impl ToggleKey {
    pub fn new(pass: &str, kind: ToggleKind, subject: impl Into<String>) -> Self {
        Self {
            pass: (!pass.is_empty()).then(|| pass.to_string()),
            kind,
            subject: subject.into(),
        }
    }

    pub fn unscoped(kind: ToggleKind, subject: impl Into<String>) -> Self {
        Self {
            pass: None,
            kind,
            subject: subject.into(),
        }
    }
}

pub trait ToggleStore {
    /// Merges `value` into the stored flag (logical or) and returns the result.
    fn set_options_value(&mut self, key: ToggleKey, value: bool) -> bool;

    /// Current flag without modifying it; absent keys read as `false`.
    fn is_set(&self, key: &ToggleKey) -> bool;

    /// Forgets every flag; called before a full refresh cycle.
    fn reset(&mut self);
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionToggles {
    flags: HashMap<ToggleKey, bool>,
}

impl OptionToggles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn contains(&self, key: &ToggleKey) -> bool {
        self.flags.contains_key(key)
    }
}

impl ToggleStore for OptionToggles {
    fn set_options_value(&mut self, key: ToggleKey, value: bool) -> bool {
        let flag = self.flags.entry(key).or_insert(false);
        *flag = *flag || value;
        *flag
    }

    fn is_set(&self, key: &ToggleKey) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    fn reset(&mut self) {
        self.flags.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_true_is_sticky() {
        let mut toggles = OptionToggles::new();
        let key = ToggleKey::new("Forward", ToggleKind::Option, "Cull");

        assert!(!toggles.set_options_value(key.clone(), false));
        assert!(toggles.set_options_value(key.clone(), true));
        assert!(toggles.set_options_value(key.clone(), false));
        assert!(toggles.is_set(&key));

        toggles.reset();
        assert!(!toggles.is_set(&key));
        assert!(toggles.is_empty());
    }

    #[test]
    fn keys_differ_by_scope_and_kind() {
        let mut toggles = OptionToggles::new();
        toggles.set_options_value(ToggleKey::new("", ToggleKind::Define, "FOO"), true);

        assert!(toggles.is_set(&ToggleKey::unscoped(ToggleKind::Define, "FOO")));
        assert!(!toggles.is_set(&ToggleKey::new("Forward", ToggleKind::Define, "FOO")));
        assert!(!toggles.is_set(&ToggleKey::unscoped(ToggleKind::Undefine, "FOO")));
    }
}
