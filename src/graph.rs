//! Graph-side collaborators of the options engine.
//!
//! The engine never owns graph state: it borrows a [`PassGraph`] for the duration of
//! one call and mutates nodes only through [`MasterNode`].

use serde::{Deserialize, Serialize};

use crate::template::TemplateAction;

pub mod memory;

pub use memory::{MultiPassGraph, PassMasterNode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPort {
    /// Stable across renames; what actions address by `action_data_index`.
    pub unique_id: i32,
    pub name: String,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    #[serde(default)]
    pub connected: bool,
}

fn visible_by_default() -> bool {
    true
}

impl InputPort {
    pub fn new(unique_id: i32, name: impl Into<String>) -> Self {
        Self {
            unique_id,
            name: name.into(),
            visible: true,
            connected: false,
        }
    }
}

/// Which module of a pass node a property action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyModule {
    Pass,
    SubShader,
}

/// Ordered set of preprocessor directives injected by options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefineContainer {
    directives: Vec<String>,
}

impl DefineContainer {
    /// Adds `token`. An existing entry is left in place unless `replace` is set,
    /// in which case it is moved to the end.
    pub fn add_define(&mut self, token: &str, replace: bool) {
        if let Some(pos) = self.directives.iter().position(|d| d == token) {
            if !replace {
                return;
            }
            self.directives.remove(pos);
        }
        self.directives.push(token.to_string());
    }

    pub fn remove_define(&mut self, token: &str) {
        self.directives.retain(|d| d != token);
    }

    pub fn contains(&self, token: &str) -> bool {
        self.directives.iter().any(|d| d == token)
    }

    pub fn directives(&self) -> &[String] {
        &self.directives
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

/// A pass master node as seen by option actions.
pub trait MasterNode {
    fn id(&self) -> &str;

    fn pass_name(&self) -> &str;

    fn input_ports(&self) -> &[InputPort];

    fn input_ports_mut(&mut self) -> &mut [InputPort];

    fn set_pass_visible(&mut self, pass_name: &str, visible: bool);

    fn define_container(&self) -> &DefineContainer;

    fn define_container_mut(&mut self) -> &mut DefineContainer;

    fn set_property_action(&mut self, module: PropertyModule, action: &TemplateAction);

    /// Requests a layout pass after port visibility or names changed.
    fn mark_size_dirty(&mut self);

    fn input_port_by_unique_id(&self, unique_id: i32) -> Option<&InputPort> {
        self.input_ports().iter().find(|p| p.unique_id == unique_id)
    }

    fn input_port_by_unique_id_mut(&mut self, unique_id: i32) -> Option<&mut InputPort> {
        self.input_ports_mut()
            .iter_mut()
            .find(|p| p.unique_id == unique_id)
    }

    fn input_port_by_name(&self, name: &str) -> Option<&InputPort> {
        self.input_ports().iter().find(|p| p.name == name)
    }
}

/// The container graph that owns every pass master node of a shader.
pub trait PassGraph {
    fn master_node_of_pass(&self, pass_name: &str) -> Option<String>;

    /// Ids of every pass master node, in pass order.
    fn master_node_ids(&self) -> Vec<String>;

    /// Whether `node_id` is the node that owns sub-shader level state.
    fn is_main_output(&self, node_id: &str) -> bool;

    fn node(&self, node_id: &str) -> Option<&dyn MasterNode>;

    fn node_mut(&mut self, node_id: &str) -> Option<&mut dyn MasterNode>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_define_is_idempotent_without_replace() {
        let mut defines = DefineContainer::default();
        defines.add_define("#define A", false);
        defines.add_define("#define B", false);
        defines.add_define("#define A", false);
        assert_eq!(defines.directives(), ["#define A", "#define B"]);

        defines.add_define("#define A", true);
        assert_eq!(defines.directives(), ["#define B", "#define A"]);
    }

    #[test]
    fn remove_define_of_missing_token_is_noop() {
        let mut defines = DefineContainer::default();
        defines.add_define("#undef X", false);
        defines.remove_define("#define X");
        assert!(defines.contains("#undef X"));
        defines.remove_define("#undef X");
        assert!(defines.is_empty());
    }
}
