//! Template-side option definitions.
//!
//! These types are produced by the template parser and consumed read-only by the
//! options engine. They are plain serde structs so a template can also be authored
//! or captured as JSON.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::graph::InputPort;

const DEFAULT_TEMPLATE_JSON: &str = include_str!("../assets/lit-template.json");

/// Whether an option is a user choice or drives a dynamic port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    Option,
    Port,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    ShowOption,
    HideOption,
    SetOption,
    HidePort,
    ShowPort,
    SetPortName,
    SetDefine,
    RemoveDefine,
    SetUndefine,
    RemoveUndefine,
    ExcludePass,
    IncludePass,
    SetPropertyOnPass,
    SetPropertyOnSubShader,
    SetShaderProperty,
}

impl ActionType {
    /// The action that reverts this one, used when a previous selection is undone.
    ///
    /// Returns `None` for actions that have no meaningful inverse; those are
    /// skipped entirely when dispatching inverted.
    pub fn inverse(self) -> Option<ActionType> {
        use ActionType::*;
        match self {
            ShowOption => Some(HideOption),
            HideOption => Some(ShowOption),
            ShowPort => Some(HidePort),
            HidePort => Some(ShowPort),
            SetDefine => Some(RemoveDefine),
            RemoveDefine => Some(SetDefine),
            SetUndefine => Some(RemoveUndefine),
            RemoveUndefine => Some(SetUndefine),
            ExcludePass => Some(IncludePass),
            IncludePass => Some(ExcludePass),
            SetOption | SetPortName | SetPropertyOnPass | SetPropertyOnSubShader
            | SetShaderProperty => None,
        }
    }

    /// Define-family actions that add a directive (as opposed to removing one).
    pub fn is_directive_add(self) -> bool {
        matches!(self, ActionType::SetDefine | ActionType::SetUndefine)
    }

    /// `"#define X"` / `"#undef X"` for define-family actions.
    pub fn directive_token(self, action_data: &str) -> Option<String> {
        match self {
            ActionType::SetDefine | ActionType::RemoveDefine => {
                Some(format!("#define {action_data}"))
            }
            ActionType::SetUndefine | ActionType::RemoveUndefine => {
                Some(format!("#undef {action_data}"))
            }
            _ => None,
        }
    }
}

/// One declarative effect bound to an option value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(default)]
    pub action_data: String,
    #[serde(default = "no_index")]
    pub action_data_index: i32,
    /// Empty means the pass that owns the option.
    #[serde(default)]
    pub pass_name: String,
    #[serde(default)]
    pub all_passes: bool,
}

fn no_index() -> i32 {
    -1
}

impl TemplateAction {
    pub fn new(action_type: ActionType, action_data: impl Into<String>) -> Self {
        Self {
            action_type,
            action_data: action_data.into(),
            action_data_index: -1,
            pass_name: String::new(),
            all_passes: false,
        }
    }

    pub fn with_index(mut self, index: i32) -> Self {
        self.action_data_index = index;
        self
    }

    pub fn on_pass(mut self, pass_name: impl Into<String>) -> Self {
        self.pass_name = pass_name.into();
        self
    }

    pub fn on_all_passes(mut self) -> Self {
        self.all_passes = true;
        self
    }
}

/// A template-declared option.
///
/// For `Port` options, `actions_per_value[0]` applies while the bound port is
/// connected and `actions_per_value[1]` while it is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateOption {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub default_index: usize,
    #[serde(default)]
    pub actions_per_value: Vec<Vec<TemplateAction>>,
    #[serde(default)]
    pub invert_on_deselect: bool,
}

impl TemplateOption {
    pub fn choice(id: impl Into<String>, name: impl Into<String>, values: &[&str]) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            option_type: OptionType::Option,
            values: values.iter().map(|v| v.to_string()).collect(),
            default_index: 0,
            actions_per_value: vec![Vec::new(); values.len()],
            invert_on_deselect: false,
        }
    }

    pub fn port(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            option_type: OptionType::Port,
            values: vec!["Connected".to_string(), "Not Connected".to_string()],
            default_index: 0,
            actions_per_value: vec![Vec::new(), Vec::new()],
            invert_on_deselect: false,
        }
    }

    pub fn with_actions(mut self, value_index: usize, actions: Vec<TemplateAction>) -> Self {
        if self.actions_per_value.len() <= value_index {
            self.actions_per_value.resize(value_index + 1, Vec::new());
        }
        self.actions_per_value[value_index] = actions;
        self
    }

    pub fn with_default(mut self, index: usize) -> Self {
        self.default_index = index;
        self
    }

    pub fn inverting_on_deselect(mut self) -> Self {
        self.invert_on_deselect = true;
        self
    }

    /// Actions bound to `value_index`; empty when the row is missing.
    pub fn actions_for(&self, value_index: usize) -> &[TemplateAction] {
        self.actions_per_value
            .get(value_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Clamps an arbitrary index into the valid value range.
    pub fn clamp_index(&self, index: i32) -> usize {
        let max = self.values.len().saturating_sub(1) as i64;
        (index as i64).clamp(0, max) as usize
    }
}

/// The options block of one pass or sub-shader as parsed from template text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateOptionsContainer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    /// Raw template text of the block; only its length is used, as a change detector.
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub options: Vec<TemplateOption>,
}

impl TemplateOptionsContainer {
    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatePass {
    pub name: String,
    #[serde(default)]
    pub ports: Vec<InputPort>,
    #[serde(default)]
    pub options: TemplateOptionsContainer,
}

/// A multi-pass template: one sub-shader options block plus per-pass blocks.
///
/// The first pass hosts the main output node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDocument {
    pub name: String,
    #[serde(default)]
    pub sub_shader_options: TemplateOptionsContainer,
    #[serde(default)]
    pub passes: Vec<TemplatePass>,
}

pub fn load_default_template() -> Result<TemplateDocument> {
    serde_json::from_str(DEFAULT_TEMPLATE_JSON).context("failed to parse bundled template json")
}

pub fn load_template_from_path(path: impl AsRef<Path>) -> Result<TemplateDocument> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read template json at {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse template json at {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inversion_is_symmetric_where_defined() {
        use ActionType::*;
        let all = [
            ShowOption,
            HideOption,
            SetOption,
            HidePort,
            ShowPort,
            SetPortName,
            SetDefine,
            RemoveDefine,
            SetUndefine,
            RemoveUndefine,
            ExcludePass,
            IncludePass,
            SetPropertyOnPass,
            SetPropertyOnSubShader,
            SetShaderProperty,
        ];
        for ty in all {
            if let Some(inv) = ty.inverse() {
                assert_eq!(inv.inverse(), Some(ty), "{ty:?}");
            }
        }
        assert_eq!(SetOption.inverse(), None);
        assert_eq!(SetPortName.inverse(), None);
        assert_eq!(SetShaderProperty.inverse(), None);
    }

    #[test]
    fn directive_tokens() {
        assert_eq!(
            ActionType::SetDefine.directive_token("FOO").as_deref(),
            Some("#define FOO")
        );
        assert_eq!(
            ActionType::RemoveUndefine.directive_token("BAR").as_deref(),
            Some("#undef BAR")
        );
        assert_eq!(ActionType::ShowOption.directive_token("BAZ"), None);
    }

    #[test]
    fn clamp_index_stays_in_range() {
        let opt = TemplateOption::choice("q", "Quality", &["Low", "Mid", "High"]);
        assert_eq!(opt.clamp_index(-1), 0);
        assert_eq!(opt.clamp_index(1), 1);
        assert_eq!(opt.clamp_index(7), 2);

        let empty = TemplateOption::choice("e", "Empty", &[]);
        assert_eq!(empty.clamp_index(3), 0);
    }

    #[test]
    fn action_defaults_when_parsing() {
        let action: TemplateAction =
            serde_json::from_str(r#"{"type":"set_define","action_data":"FOO"}"#).unwrap();
        assert_eq!(action.action_data_index, -1);
        assert!(action.pass_name.is_empty());
        assert!(!action.all_passes);
    }

    #[test]
    fn bundled_template_parses() {
        let doc = load_default_template().unwrap();
        assert!(!doc.passes.is_empty());
        assert!(doc.sub_shader_options.enabled);
    }
}
