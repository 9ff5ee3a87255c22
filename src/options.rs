//! Custom options of one pass or sub-shader.
//!
//! [`CustomOptions`] owns the option items of a scope, the ports those options
//! drive, and the bookkeeping needed to keep both in step with the template they
//! were parsed from.

pub mod dispatch;
pub mod item;
pub mod persist;
pub mod ports;
pub mod registry;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::collector::DataCollector;
use crate::graph::{MasterNode, PassGraph};
use crate::template::{OptionType, TemplateOptionsContainer};
use dispatch::DispatchContext;
use item::{OptionUIItem, SelectionEvent, SelectionHandler};
use ports::{OptionPortItem, PortBindingSet};
use registry::OptionRegistry;

const DEFAULT_LABEL: &str = " Custom Options";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionScope {
    Pass,
    SubShader,
}

impl OptionScope {
    pub fn selection_handler(self) -> SelectionHandler {
        match self {
            OptionScope::Pass => dispatch::on_pass_option_selected,
            OptionScope::SubShader => dispatch::on_sub_shader_option_selected,
        }
    }
}

/// Outcome of [`CustomOptions::setup_from_template`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SetupReport {
    /// True when the existing items were kept.
    pub preserved: bool,
    /// Items whose handler was re-attached on the preserve path.
    pub rebound: usize,
    pub torn_down: usize,
    pub option_items: usize,
    pub port_items: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomOptions {
    scope: OptionScope,
    label: String,
    /// Body length of the container the items were built from; 0 when disabled.
    size_check: usize,
    registry: OptionRegistry,
    ports: PortBindingSet,
    #[serde(skip)]
    pending_restore: Option<Vec<(String, i32)>>,
}

impl CustomOptions {
    pub fn new(scope: OptionScope) -> Self {
        Self {
            scope,
            label: DEFAULT_LABEL.to_string(),
            size_check: 0,
            registry: OptionRegistry::new(),
            ports: PortBindingSet::new(),
            pending_restore: None,
        }
    }

    pub fn scope(&self) -> OptionScope {
        self.scope
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn size_check(&self) -> usize {
        self.size_check
    }

    pub fn registry(&self) -> &OptionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut OptionRegistry {
        &mut self.registry
    }

    pub fn ports(&self) -> &PortBindingSet {
        &self.ports
    }

    pub fn has_custom_options(&self) -> bool {
        self.size_check > 0
    }

    /// Reconciles the items with `container`.
    ///
    /// An unchanged body length keeps every item and its selection; any other
    /// change discards all items and rebuilds them from the container.
    pub fn setup_from_template(
        &mut self,
        owner: &dyn MasterNode,
        container: &TemplateOptionsContainer,
        is_new_template: bool,
    ) -> SetupReport {
        let handler = self.scope.selection_handler();
        if !is_new_template && container.body_len() == self.size_check {
            let mut rebound = 0;
            for item in self.registry.items_mut() {
                if item.is_unbound() {
                    item.bind(handler);
                    rebound += 1;
                }
            }
            return SetupReport {
                preserved: true,
                rebound,
                torn_down: 0,
                option_items: self.registry.len(),
                port_items: self.ports.len(),
            };
        }

        let torn_down = self.registry.teardown();
        self.ports.clear();
        self.label = if container.name.is_empty() {
            DEFAULT_LABEL.to_string()
        } else {
            format!(" {}", container.name)
        };
        debug!(
            "rebuilding{} on {}: {torn_down} items torn down",
            self.label,
            owner.id()
        );

        if container.enabled {
            for option in &container.options {
                match option.option_type {
                    OptionType::Option => self
                        .registry
                        .push(OptionUIItem::new(option.clone(), handler)),
                    OptionType::Port => self
                        .ports
                        .push(OptionPortItem::new(owner, option.clone())),
                }
            }
            self.size_check = container.body_len();
        } else {
            self.size_check = 0;
        }

        SetupReport {
            preserved: false,
            rebound: 0,
            torn_down,
            option_items: self.registry.len(),
            port_items: self.ports.len(),
        }
    }

    /// Selects `index` on the option with `option_id` and runs the resulting
    /// actions. Returns whether the selection changed.
    pub fn select_option(
        &mut self,
        ctx: &mut DispatchContext<'_>,
        option_id: &str,
        index: i32,
    ) -> bool {
        let Some(item) = self.registry.find_by_id_mut(option_id) else {
            warn!("could not find option {option_id} on {}", ctx.owner);
            return false;
        };
        let handler = item.handler();
        let events = item.select(index);
        if events.is_empty() {
            return false;
        }
        self.run_events(ctx, handler, option_id, &events);
        true
    }

    /// Replays the current selection of every item in refresh mode.
    pub fn refresh(&mut self, ctx: &mut DispatchContext<'_>) {
        let pending: Vec<_> = self
            .registry
            .items()
            .iter()
            .map(|item| (item.id().to_string(), item.handler(), item.refresh_events()))
            .collect();
        for (id, handler, events) in pending {
            self.run_events(ctx, handler, &id, &events);
        }
    }

    fn run_events(
        &mut self,
        ctx: &mut DispatchContext<'_>,
        handler: Option<SelectionHandler>,
        option_id: &str,
        events: &[SelectionEvent],
    ) {
        let Some(handler) = handler else {
            warn!("option {option_id} has no selection handler, actions skipped");
            return;
        };
        for event in events {
            handler(ctx, &mut self.registry, event);
        }
    }

    /// Build-time contribution of the armed items and of the driven ports.
    pub fn fill_data_collector(&self, node: &dyn MasterNode, collector: &mut DataCollector) {
        for item in self.registry.items() {
            item.fill_data_collector(collector);
        }
        self.ports.fill_port_data(node, collector);
    }

    pub fn fill_sub_shader_port_data(
        &self,
        graph: &dyn PassGraph,
        owner: &dyn MasterNode,
        collector: &mut DataCollector,
    ) {
        self.ports.fill_sub_shader_port_data(graph, owner, collector);
    }

    pub fn check_immediate_actions_for_port(&self, node: &mut dyn MasterNode, port_id: i32) {
        self.ports.check_immediate_actions_for_port(node, port_id);
    }

    pub fn destroy(&mut self) {
        self.registry.teardown();
        self.ports.clear();
        self.size_check = 0;
        self.pending_restore = None;
    }
}
