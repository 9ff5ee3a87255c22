//! One template instantiated as a pass graph with custom options on every node.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info, warn};
use serde::Serialize;

use crate::collector::DataCollector;
use crate::graph::memory::master_node_id;
use crate::graph::{MasterNode, MultiPassGraph, PassGraph, PassMasterNode};
use crate::options::dispatch::DispatchContext;
use crate::options::{CustomOptions, OptionScope, SetupReport};
use crate::template::TemplateDocument;
use crate::toggles::{OptionToggles, ToggleStore};

/// Option sets held by one master node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeOptions {
    pub pass: CustomOptions,
    /// Every node carries a copy; only the main output's copy acts.
    pub sub_shader: CustomOptions,
}

impl NodeOptions {
    fn new() -> Self {
        Self {
            pass: CustomOptions::new(OptionScope::Pass),
            sub_shader: CustomOptions::new(OptionScope::SubShader),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateWorkspace {
    template: String,
    graph: MultiPassGraph,
    #[serde(skip)]
    toggles: OptionToggles,
    nodes: BTreeMap<String, NodeOptions>,
}

impl TemplateWorkspace {
    pub fn from_template(doc: &TemplateDocument) -> Self {
        let graph = MultiPassGraph::from_template(doc);
        let mut nodes = BTreeMap::new();
        for pass in &doc.passes {
            let id = master_node_id(&pass.name);
            let Some(node) = graph.get(&id) else {
                continue;
            };
            let mut options = NodeOptions::new();
            options.pass.setup_from_template(node, &pass.options, true);
            options
                .sub_shader
                .setup_from_template(node, &doc.sub_shader_options, true);
            nodes.insert(id, options);
        }
        info!(
            "instantiated template {} with {} passes",
            doc.name,
            graph.nodes.len()
        );
        Self {
            template: doc.name.clone(),
            graph,
            toggles: OptionToggles::new(),
            nodes,
        }
    }

    pub fn template_name(&self) -> &str {
        &self.template
    }

    pub fn graph(&self) -> &MultiPassGraph {
        &self.graph
    }

    pub fn toggles(&self) -> &OptionToggles {
        &self.toggles
    }

    pub fn node_options(&self, pass: &str) -> Option<&NodeOptions> {
        self.nodes.get(&master_node_id(pass))
    }

    pub fn node_options_mut(&mut self, pass: &str) -> Option<&mut NodeOptions> {
        self.nodes.get_mut(&master_node_id(pass))
    }

    /// Re-syncs every node with an edited template.
    ///
    /// Passes that still exist keep their selections when their option block is
    /// unchanged; new passes get a node; dropped passes lose theirs.
    pub fn reload_template(&mut self, doc: &TemplateDocument) -> Vec<(String, SetupReport)> {
        let keep: Vec<String> = doc.passes.iter().map(|p| master_node_id(&p.name)).collect();
        self.graph.nodes.retain(|node| keep.contains(&node.id));
        self.nodes.retain(|id, options| {
            let kept = keep.contains(id);
            if !kept {
                debug!("pass node {id} removed by template reload");
                options.pass.destroy();
                options.sub_shader.destroy();
            }
            kept
        });

        let mut reports = Vec::with_capacity(doc.passes.len());
        for (position, pass) in doc.passes.iter().enumerate() {
            let id = master_node_id(&pass.name);
            let is_new = self.graph.get(&id).is_none();
            if is_new {
                let node = PassMasterNode::new(&id, &pass.name).with_ports(pass.ports.clone());
                let position = position.min(self.graph.nodes.len());
                self.graph.nodes.insert(position, node);
            }
            let Some(node) = self.graph.get(&id) else {
                continue;
            };
            let options = self.nodes.entry(id.clone()).or_insert_with(NodeOptions::new);
            let report = options.pass.setup_from_template(node, &pass.options, is_new);
            options
                .sub_shader
                .setup_from_template(node, &doc.sub_shader_options, is_new);
            reports.push((id, report));
        }
        self.template = doc.name.clone();
        reports
    }

    pub fn select_pass_option(&mut self, pass: &str, option_id: &str, index: i32) -> Result<bool> {
        let node_id = self.node_id_of(pass)?;
        let options = self
            .nodes
            .get_mut(&node_id)
            .ok_or_else(|| anyhow!("pass {pass} has no custom options"))?;
        let mut ctx = DispatchContext::new(&mut self.graph, &mut self.toggles, &node_id);
        Ok(options.pass.select_option(&mut ctx, option_id, index))
    }

    /// Selects on the main output node, the only node whose sub-shader options act.
    pub fn select_sub_shader_option(&mut self, option_id: &str, index: i32) -> Result<bool> {
        let node_id = self
            .graph
            .main_output()
            .map(|node| node.id.clone())
            .context("template has no passes")?;
        let options = self
            .nodes
            .get_mut(&node_id)
            .ok_or_else(|| anyhow!("main output {node_id} has no custom options"))?;
        let mut ctx = DispatchContext::new(&mut self.graph, &mut self.toggles, &node_id);
        Ok(options.sub_shader.select_option(&mut ctx, option_id, index))
    }

    /// Replays every selection in refresh mode, starting from a clean toggle store.
    pub fn refresh_all(&mut self) {
        self.toggles.reset();
        for node_id in self.graph.master_node_ids() {
            let Some(options) = self.nodes.get_mut(&node_id) else {
                continue;
            };
            let mut ctx = DispatchContext::new(&mut self.graph, &mut self.toggles, &node_id);
            options.sub_shader.refresh(&mut ctx);
            options.pass.refresh(&mut ctx);
        }
    }

    /// Build-time directives the options of `pass` contribute.
    pub fn collect_pass_data(&self, pass: &str) -> Result<DataCollector> {
        let node_id = self.node_id_of(pass)?;
        let node = self
            .graph
            .node(&node_id)
            .with_context(|| format!("node {node_id} is missing from the graph"))?;
        let mut collector = DataCollector::new();
        if let Some(options) = self.nodes.get(&node_id) {
            options.pass.fill_data_collector(node, &mut collector);
            options
                .sub_shader
                .fill_sub_shader_port_data(&self.graph, node, &mut collector);
        }
        Ok(collector)
    }

    /// Updates a port's connection and lets the pass options react right away.
    pub fn port_connection_changed(
        &mut self,
        pass: &str,
        port_id: i32,
        connected: bool,
    ) -> Result<()> {
        let node_id = self.node_id_of(pass)?;
        let node = self
            .graph
            .get_mut(&node_id)
            .with_context(|| format!("node {node_id} is missing from the graph"))?;
        let port = node
            .input_port_by_unique_id_mut(port_id)
            .ok_or_else(|| anyhow!("pass {pass} has no port {port_id}"))?;
        port.connected = connected;

        if let Some(options) = self.nodes.get(&node_id) {
            options.pass.check_immediate_actions_for_port(node, port_id);
        }
        Ok(())
    }

    /// Pass then sub-shader selections of every node, in graph order.
    pub fn save_tokens(&self) -> Vec<String> {
        let mut out = Vec::new();
        for node in &self.graph.nodes {
            match self.nodes.get(&node.id) {
                Some(options) => {
                    options.pass.write_to_tokens(&mut out);
                    options.sub_shader.write_to_tokens(&mut out);
                }
                None => {
                    out.push("0".to_string());
                    out.push("0".to_string());
                }
            }
        }
        out
    }

    pub fn load_tokens(&mut self, tokens: &[String]) -> Result<()> {
        let mut cursor = 0;
        for node_id in self.graph.master_node_ids() {
            let options = self
                .nodes
                .get_mut(&node_id)
                .ok_or_else(|| anyhow!("node {node_id} has no custom options"))?;
            options
                .pass
                .read_from_tokens(tokens, &mut cursor)
                .with_context(|| format!("failed to read pass options of {node_id}"))?;
            options
                .sub_shader
                .read_from_tokens(tokens, &mut cursor)
                .with_context(|| format!("failed to read sub-shader options of {node_id}"))?;
        }
        if cursor != tokens.len() {
            bail!(
                "{} trailing tokens after the last node",
                tokens.len() - cursor
            );
        }
        for options in self.nodes.values_mut() {
            options.pass.apply_pending_restore();
            options.sub_shader.apply_pending_restore();
        }
        Ok(())
    }

    fn node_id_of(&self, pass: &str) -> Result<String> {
        self.graph.master_node_of_pass(pass).ok_or_else(|| {
            warn!("could not find pass {pass}");
            anyhow!("unknown pass {pass}")
        })
    }
}
