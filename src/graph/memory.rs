//! In-memory pass graph used by the workspace, the CLI and tests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{DefineContainer, InputPort, MasterNode, PassGraph, PropertyModule};
use crate::template::{TemplateAction, TemplateDocument};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassMasterNode {
    pub id: String,
    pub pass_name: String,
    #[serde(default)]
    pub input_ports: Vec<InputPort>,
    #[serde(default)]
    pub defines: DefineContainer,
    /// Pass visibility as selected through this node's pass selector.
    #[serde(default)]
    pub pass_visibility: BTreeMap<String, bool>,
    #[serde(default)]
    pub size_is_dirty: bool,
    #[serde(default)]
    pub property_actions: Vec<(PropertyModule, TemplateAction)>,
}

impl PassMasterNode {
    pub fn new(id: impl Into<String>, pass_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pass_name: pass_name.into(),
            input_ports: Vec::new(),
            defines: DefineContainer::default(),
            pass_visibility: BTreeMap::new(),
            size_is_dirty: false,
            property_actions: Vec::new(),
        }
    }

    pub fn with_ports(mut self, ports: Vec<InputPort>) -> Self {
        self.input_ports = ports;
        self
    }

    /// Passes default to visible until an option hides them.
    pub fn is_pass_visible(&self, pass_name: &str) -> bool {
        self.pass_visibility.get(pass_name).copied().unwrap_or(true)
    }

    pub fn port_named(&self, name: &str) -> Option<&InputPort> {
        self.input_ports.iter().find(|p| p.name == name)
    }
}

impl MasterNode for PassMasterNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn pass_name(&self) -> &str {
        &self.pass_name
    }

    fn input_ports(&self) -> &[InputPort] {
        &self.input_ports
    }

    fn input_ports_mut(&mut self) -> &mut [InputPort] {
        &mut self.input_ports
    }

    fn set_pass_visible(&mut self, pass_name: &str, visible: bool) {
        self.pass_visibility.insert(pass_name.to_string(), visible);
    }

    fn define_container(&self) -> &DefineContainer {
        &self.defines
    }

    fn define_container_mut(&mut self) -> &mut DefineContainer {
        &mut self.defines
    }

    fn set_property_action(&mut self, module: PropertyModule, action: &TemplateAction) {
        self.property_actions.push((module, action.clone()));
    }

    fn mark_size_dirty(&mut self) {
        self.size_is_dirty = true;
    }
}

/// Pass master nodes in pass order; the first one is the main output node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiPassGraph {
    pub nodes: Vec<PassMasterNode>,
}

impl MultiPassGraph {
    pub fn new(nodes: Vec<PassMasterNode>) -> Self {
        Self { nodes }
    }

    /// One master node per template pass, carrying the pass's declared ports.
    pub fn from_template(doc: &TemplateDocument) -> Self {
        let nodes = doc
            .passes
            .iter()
            .map(|pass| {
                PassMasterNode::new(master_node_id(&pass.name), &pass.name)
                    .with_ports(pass.ports.clone())
            })
            .collect();
        Self { nodes }
    }

    pub fn get(&self, node_id: &str) -> Option<&PassMasterNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub fn get_mut(&mut self, node_id: &str) -> Option<&mut PassMasterNode> {
        self.nodes.iter_mut().find(|n| n.id == node_id)
    }

    pub fn by_pass(&self, pass_name: &str) -> Option<&PassMasterNode> {
        self.nodes.iter().find(|n| n.pass_name == pass_name)
    }

    pub fn by_pass_mut(&mut self, pass_name: &str) -> Option<&mut PassMasterNode> {
        self.nodes.iter_mut().find(|n| n.pass_name == pass_name)
    }

    pub fn main_output(&self) -> Option<&PassMasterNode> {
        self.nodes.first()
    }
}

pub fn master_node_id(pass_name: &str) -> String {
    format!("master/{pass_name}")
}

impl PassGraph for MultiPassGraph {
    fn master_node_of_pass(&self, pass_name: &str) -> Option<String> {
        self.by_pass(pass_name).map(|n| n.id.clone())
    }

    fn master_node_ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    fn is_main_output(&self, node_id: &str) -> bool {
        self.main_output().is_some_and(|n| n.id == node_id)
    }

    fn node(&self, node_id: &str) -> Option<&dyn MasterNode> {
        self.get(node_id).map(|n| n as &dyn MasterNode)
    }

    fn node_mut(&mut self, node_id: &str) -> Option<&mut dyn MasterNode> {
        self.get_mut(node_id).map(|n| n as &mut dyn MasterNode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_node_is_main_output() {
        let graph = MultiPassGraph::new(vec![
            PassMasterNode::new("a", "Forward"),
            PassMasterNode::new("b", "ShadowCaster"),
        ]);
        assert!(graph.is_main_output("a"));
        assert!(!graph.is_main_output("b"));
        assert_eq!(graph.master_node_of_pass("ShadowCaster").as_deref(), Some("b"));
        assert_eq!(graph.master_node_of_pass("Meta"), None);
    }

    #[test]
    fn ports_resolve_through_trait() {
        let mut graph = MultiPassGraph::new(vec![PassMasterNode::new("a", "Forward").with_ports(
            vec![InputPort::new(3, "Albedo"), InputPort::new(7, "Emission")],
        )]);

        let node = graph.node("a").unwrap();
        assert_eq!(node.input_port_by_name("Emission").map(|p| p.unique_id), Some(7));
        assert!(node.input_port_by_unique_id(9).is_none());

        let node = graph.node_mut("a").unwrap();
        node.input_port_by_unique_id_mut(3).unwrap().visible = false;
        assert!(!graph.get("a").unwrap().input_ports[0].visible);
    }
}
