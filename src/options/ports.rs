//! Port-type options: behaviour driven by whether a node input is connected.

use serde::{Deserialize, Serialize};

use crate::collector::DataCollector;
use crate::graph::{InputPort, MasterNode, PassGraph};
use crate::template::{ActionType, TemplateAction, TemplateOption};

const CONNECTED_ROW: usize = 0;
const UNCONNECTED_ROW: usize = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionPortItem {
    option: TemplateOption,
    /// Unique id of the bound port on the owner, `-1` when the owner has none.
    port_id: i32,
}

impl OptionPortItem {
    pub fn new(owner: &dyn MasterNode, option: TemplateOption) -> Self {
        let port_id = owner
            .input_port_by_name(&option.name)
            .map(|p| p.unique_id)
            .unwrap_or(-1);
        Self { option, port_id }
    }

    pub fn option(&self) -> &TemplateOption {
        &self.option
    }

    pub fn port_id(&self) -> i32 {
        self.port_id
    }

    fn resolve_port<'n>(&self, node: &'n dyn MasterNode) -> Option<&'n InputPort> {
        if self.port_id > -1 {
            node.input_port_by_unique_id(self.port_id)
        } else {
            node.input_port_by_name(&self.option.name)
        }
    }

    fn active_actions(&self, port: &InputPort) -> &[TemplateAction] {
        let row = if port.connected {
            CONNECTED_ROW
        } else {
            UNCONNECTED_ROW
        };
        self.option.actions_for(row)
    }

    pub fn fill_data_collector(&self, node: &dyn MasterNode, collector: &mut DataCollector) {
        match self.resolve_port(node) {
            Some(port) => contribute(self.active_actions(port), collector),
            None => log::debug!(
                "port option {} has no port on {}",
                self.option.name,
                node.id()
            ),
        }
    }

    /// Sub-shader variant: the option id names the pass whose port decides the
    /// row; an empty id means the owner's own port.
    pub fn fill_sub_shader_data_collector(
        &self,
        graph: &dyn PassGraph,
        owner: &dyn MasterNode,
        collector: &mut DataCollector,
    ) {
        if self.option.id.is_empty() || self.option.id == owner.pass_name() {
            self.fill_data_collector(owner, collector);
            return;
        }

        let Some(target) = graph
            .master_node_of_pass(&self.option.id)
            .and_then(|id| graph.node(&id))
        else {
            log::warn!(
                "could not find pass {} for port option {}",
                self.option.id,
                self.option.name
            );
            return;
        };

        match target.input_port_by_name(&self.option.name) {
            Some(port) => contribute(self.active_actions(port), collector),
            None => log::debug!(
                "port option {} has no port on pass {}",
                self.option.name,
                self.option.id
            ),
        }
    }

    /// Applies port-local actions as soon as the bound port changes, without
    /// waiting for the next build.
    pub fn check_immediate_actions_for_port(&self, node: &mut dyn MasterNode, port_id: i32) {
        if self.port_id < 0 || self.port_id != port_id {
            return;
        }
        let Some(port) = node.input_port_by_unique_id(port_id) else {
            log::warn!("could not find port {port_id} for option {}", self.option.name);
            return;
        };
        let actions = self.active_actions(port);

        let mut changed = false;
        for action in actions {
            match action.action_type {
                ActionType::SetPortName => {
                    let target = if action.action_data_index > -1 {
                        action.action_data_index
                    } else {
                        port_id
                    };
                    if let Some(port) = node.input_port_by_unique_id_mut(target) {
                        port.name = action.action_data.clone();
                        changed = true;
                    }
                }
                ActionType::ShowPort | ActionType::HidePort => {
                    let visible = action.action_type == ActionType::ShowPort;
                    let target = if action.action_data_index > -1 {
                        node.input_port_by_unique_id_mut(action.action_data_index)
                    } else {
                        node.input_ports_mut()
                            .iter_mut()
                            .find(|p| p.name == action.action_data)
                    };
                    if let Some(port) = target {
                        port.visible = visible;
                        changed = true;
                    }
                }
                _ => {}
            }
        }

        if changed {
            node.mark_size_dirty();
        }
    }
}

fn contribute(actions: &[TemplateAction], collector: &mut DataCollector) {
    for action in actions {
        match action.action_type {
            ActionType::SetDefine => collector.add_to_defines(&action.action_data, true),
            ActionType::SetUndefine => collector.add_to_defines(&action.action_data, false),
            ActionType::RemoveDefine => collector.remove_from_defines(&action.action_data, true),
            ActionType::RemoveUndefine => {
                collector.remove_from_defines(&action.action_data, false)
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortBindingSet {
    items: Vec<OptionPortItem>,
}

impl PortBindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[OptionPortItem] {
        &self.items
    }

    pub fn push(&mut self, item: OptionPortItem) {
        self.items.push(item);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn fill_port_data(&self, node: &dyn MasterNode, collector: &mut DataCollector) {
        for item in &self.items {
            item.fill_data_collector(node, collector);
        }
    }

    pub fn fill_sub_shader_port_data(
        &self,
        graph: &dyn PassGraph,
        owner: &dyn MasterNode,
        collector: &mut DataCollector,
    ) {
        for item in &self.items {
            item.fill_sub_shader_data_collector(graph, owner, collector);
        }
    }

    pub fn check_immediate_actions_for_port(&self, node: &mut dyn MasterNode, port_id: i32) {
        for item in &self.items {
            item.check_immediate_actions_for_port(node, port_id);
        }
    }
}
