//! Executes the actions bound to an option value against the pass graph.
//!
//! Every action is first planned into [`ActionEffect`]s from a read-only view of
//! the graph, the toggle store and the registry, then the effects are applied
//! before the next action is planned. Planning never fails: anything that cannot
//! be resolved is logged and the action is skipped.

use log::{debug, warn};

use super::item::SelectionEvent;
use super::registry::OptionRegistry;
use crate::graph::{PassGraph, PropertyModule};
use crate::template::{ActionType, TemplateAction};
use crate::toggles::{ToggleKey, ToggleKind, ToggleStore};

/// Borrowed state a dispatch runs against.
pub struct DispatchContext<'a> {
    pub graph: &'a mut dyn PassGraph,
    pub toggles: &'a mut dyn ToggleStore,
    /// Node that owns the option scope being dispatched.
    pub owner: &'a str,
}

impl<'a> DispatchContext<'a> {
    pub fn new(
        graph: &'a mut dyn PassGraph,
        toggles: &'a mut dyn ToggleStore,
        owner: &'a str,
    ) -> Self {
        Self {
            graph,
            toggles,
            owner,
        }
    }
}

/// Read-only inputs of [`plan_action`].
pub struct PlanView<'a> {
    pub graph: &'a dyn PassGraph,
    pub toggles: &'a dyn ToggleStore,
    pub registry: &'a OptionRegistry,
    pub owner: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEffect {
    RecordToggle {
        key: ToggleKey,
        value: bool,
    },
    SetOptionVisible {
        option: String,
        visible: bool,
    },
    SelectOption {
        option: String,
        index: i32,
    },
    /// Also marks the node's layout dirty.
    SetPortVisible {
        node: String,
        port_id: i32,
        visible: bool,
    },
    RenamePort {
        node: String,
        port_id: i32,
        name: String,
    },
    AddDirective {
        nodes: Vec<String>,
        token: String,
    },
    RemoveDirective {
        nodes: Vec<String>,
        token: String,
    },
    /// Sets `check_on_execute` on the item that raised the dispatch.
    ArmCheckOnExecute(bool),
    SetPassVisible {
        node: String,
        pass: String,
        visible: bool,
    },
    ApplyProperty {
        node: String,
        module: PropertyModule,
        action: TemplateAction,
    },
}

/// The action type to execute, or `None` when an inverted action has no inverse.
pub fn resolve_action_type(action_type: ActionType, invert: bool) -> Option<ActionType> {
    if invert {
        action_type.inverse()
    } else {
        Some(action_type)
    }
}

/// Pass handler: every selection is dispatched.
pub fn on_pass_option_selected(
    ctx: &mut DispatchContext<'_>,
    registry: &mut OptionRegistry,
    event: &SelectionEvent,
) {
    dispatch_actions(ctx, registry, event);
}

/// Sub-shader handler: only the main output node acts on sub-shader options,
/// the copies held by the other pass nodes stay inert.
pub fn on_sub_shader_option_selected(
    ctx: &mut DispatchContext<'_>,
    registry: &mut OptionRegistry,
    event: &SelectionEvent,
) {
    if ctx.graph.is_main_output(ctx.owner) {
        dispatch_actions(ctx, registry, event);
    } else {
        debug!(
            "sub-shader option {} ignored on non-main node {}",
            event.source_id, ctx.owner
        );
    }
}

pub fn dispatch_actions(
    ctx: &mut DispatchContext<'_>,
    registry: &mut OptionRegistry,
    event: &SelectionEvent,
) {
    if let Some(source) = registry.find_by_id_mut(&event.source_id) {
        source.set_check_on_execute(false);
    }

    for action in &event.actions {
        let Some(action_type) = resolve_action_type(action.action_type, event.invert) else {
            continue;
        };

        let effects = {
            let view = PlanView {
                graph: &*ctx.graph,
                toggles: &*ctx.toggles,
                registry: &*registry,
                owner: ctx.owner,
            };
            plan_action(&view, action, action_type, event.is_refreshing)
        };

        for effect in effects {
            apply_effect(ctx, registry, &event.source_id, effect);
        }
    }
}

/// Plans a single action executed as `action_type` (which differs from
/// `action.action_type` when inverted).
pub fn plan_action(
    view: &PlanView<'_>,
    action: &TemplateAction,
    action_type: ActionType,
    is_refreshing: bool,
) -> Vec<ActionEffect> {
    use ActionType::*;

    match action_type {
        ShowOption | HideOption => {
            plan_option_visibility(view, action, action_type == ShowOption, is_refreshing)
        }
        SetOption => {
            if view.registry.find_by_name(&action.action_data).is_none() {
                warn_missing_option(action, action_type);
                return Vec::new();
            }
            vec![ActionEffect::SelectOption {
                option: action.action_data.clone(),
                index: action.action_data_index,
            }]
        }
        HidePort | ShowPort => {
            plan_port_visibility(view, action, action_type == ShowPort, is_refreshing)
        }
        SetPortName => {
            let Some(node_id) = resolve_target(view, action, action_type) else {
                return Vec::new();
            };
            let port = view
                .graph
                .node(&node_id)
                .and_then(|n| n.input_port_by_unique_id(action.action_data_index));
            if port.is_none() {
                warn_missing_port(action, action_type);
                return Vec::new();
            }
            vec![ActionEffect::RenamePort {
                node: node_id,
                port_id: action.action_data_index,
                name: action.action_data.clone(),
            }]
        }
        SetDefine | RemoveDefine | SetUndefine | RemoveUndefine => {
            plan_directive(view, action, action_type, is_refreshing)
        }
        ExcludePass => {
            let key = ToggleKey::unscoped(ToggleKind::Pass, &action.action_data);
            let mut effects = Vec::new();
            let keep = is_refreshing && view.toggles.is_set(&key);
            if is_refreshing {
                effects.push(ActionEffect::RecordToggle { key, value: false });
            }
            if !keep {
                effects.push(ActionEffect::SetPassVisible {
                    node: view.owner.to_string(),
                    pass: action.action_data.clone(),
                    visible: false,
                });
            }
            effects
        }
        IncludePass => vec![
            ActionEffect::RecordToggle {
                key: ToggleKey::unscoped(ToggleKind::Pass, &action.action_data),
                value: true,
            },
            ActionEffect::SetPassVisible {
                node: view.owner.to_string(),
                pass: action.action_data.clone(),
                visible: true,
            },
        ],
        // Property serialization restores these on reload.
        SetPropertyOnPass | SetPropertyOnSubShader if is_refreshing => Vec::new(),
        SetPropertyOnPass => {
            let Some(node_id) = resolve_target(view, action, action_type) else {
                return Vec::new();
            };
            vec![ActionEffect::ApplyProperty {
                node: node_id,
                module: PropertyModule::Pass,
                action: action.clone(),
            }]
        }
        SetPropertyOnSubShader => vec![ActionEffect::ApplyProperty {
            node: view.owner.to_string(),
            module: PropertyModule::SubShader,
            action: action.clone(),
        }],
        // Evaluated by the shader build's property-change check.
        SetShaderProperty => Vec::new(),
    }
}

fn plan_option_visibility(
    view: &PlanView<'_>,
    action: &TemplateAction,
    show: bool,
    is_refreshing: bool,
) -> Vec<ActionEffect> {
    let action_type = if show {
        ActionType::ShowOption
    } else {
        ActionType::HideOption
    };
    if view.registry.find_by_name(&action.action_data).is_none() {
        warn_missing_option(action, action_type);
        return Vec::new();
    }

    let mut effects = Vec::new();
    let mut visible = show;
    if is_refreshing {
        let key = ToggleKey::new(&action.pass_name, ToggleKind::Option, &action.action_data);
        // A value shown earlier in the refresh wins over a later hide.
        visible = show || view.toggles.is_set(&key);
        effects.push(ActionEffect::RecordToggle { key, value: show });
    }
    effects.push(ActionEffect::SetOptionVisible {
        option: action.action_data.clone(),
        visible,
    });

    // An inverted action only reverts visibility, never the selection.
    if action.action_type == action_type && action.action_data_index > -1 {
        effects.push(ActionEffect::SelectOption {
            option: action.action_data.clone(),
            index: action.action_data_index,
        });
    }
    effects
}

fn plan_port_visibility(
    view: &PlanView<'_>,
    action: &TemplateAction,
    show: bool,
    is_refreshing: bool,
) -> Vec<ActionEffect> {
    let action_type = if show {
        ActionType::ShowPort
    } else {
        ActionType::HidePort
    };
    let Some(node_id) = resolve_target(view, action, action_type) else {
        return Vec::new();
    };
    let Some(node) = view.graph.node(&node_id) else {
        warn_missing_pass(action, action_type);
        return Vec::new();
    };
    let port = if action.action_data_index > -1 {
        node.input_port_by_unique_id(action.action_data_index)
    } else {
        node.input_port_by_name(&action.action_data)
    };
    let Some(port) = port else {
        warn_missing_port(action, action_type);
        return Vec::new();
    };

    let mut effects = Vec::new();
    let mut visible = show;
    if is_refreshing {
        let key = ToggleKey::new(&action.pass_name, ToggleKind::Port, &port.name);
        if show {
            effects.push(ActionEffect::RecordToggle { key, value: true });
        } else {
            // Connected ports are never hidden while refreshing.
            visible = view.toggles.is_set(&key) || port.connected;
            effects.push(ActionEffect::RecordToggle {
                key,
                value: port.connected,
            });
        }
    }
    effects.push(ActionEffect::SetPortVisible {
        node: node_id,
        port_id: port.unique_id,
        visible,
    });
    effects
}

fn plan_directive(
    view: &PlanView<'_>,
    action: &TemplateAction,
    action_type: ActionType,
    is_refreshing: bool,
) -> Vec<ActionEffect> {
    let Some(token) = action_type.directive_token(&action.action_data) else {
        return Vec::new();
    };
    let kind = match action_type {
        ActionType::SetDefine | ActionType::RemoveDefine => ToggleKind::Define,
        _ => ToggleKind::Undefine,
    };
    let adding = action_type.is_directive_add();

    let (nodes, key) = if action.all_passes {
        (
            view.graph.master_node_ids(),
            ToggleKey::unscoped(kind, &action.action_data),
        )
    } else if !action.pass_name.is_empty() {
        let Some(node_id) = resolve_target(view, action, action_type) else {
            return Vec::new();
        };
        (
            vec![node_id],
            ToggleKey::new(&action.pass_name, kind, &action.action_data),
        )
    } else {
        // No scope: the define is emitted when the pass is built.
        return vec![ActionEffect::ArmCheckOnExecute(adding)];
    };

    let mut effects = Vec::new();
    if adding {
        if is_refreshing {
            effects.push(ActionEffect::RecordToggle { key, value: true });
        }
        effects.push(ActionEffect::AddDirective { nodes, token });
    } else {
        let still_applied = is_refreshing && view.toggles.is_set(&key);
        if is_refreshing {
            effects.push(ActionEffect::RecordToggle { key, value: false });
        }
        if !still_applied {
            effects.push(ActionEffect::RemoveDirective { nodes, token });
        }
    }
    effects
}

/// The owner, or the master node of `action.pass_name` when one is given.
fn resolve_target(
    view: &PlanView<'_>,
    action: &TemplateAction,
    action_type: ActionType,
) -> Option<String> {
    if action.pass_name.is_empty() {
        return Some(view.owner.to_string());
    }
    let node = view.graph.master_node_of_pass(&action.pass_name);
    if node.is_none() {
        warn_missing_pass(action, action_type);
    }
    node
}

fn apply_effect(
    ctx: &mut DispatchContext<'_>,
    registry: &mut OptionRegistry,
    source_id: &str,
    effect: ActionEffect,
) {
    match effect {
        ActionEffect::RecordToggle { key, value } => {
            ctx.toggles.set_options_value(key, value);
        }
        ActionEffect::SetOptionVisible { option, visible } => {
            if let Some(item) = registry.find_by_name_mut(&option) {
                item.set_visible(visible);
            }
        }
        ActionEffect::SelectOption { option, index } => {
            if let Some(item) = registry.find_by_name_mut(&option) {
                item.set_current_option(index);
            }
        }
        ActionEffect::SetPortVisible {
            node,
            port_id,
            visible,
        } => match ctx.graph.node_mut(&node) {
            Some(target) => {
                if let Some(port) = target.input_port_by_unique_id_mut(port_id) {
                    port.visible = visible;
                }
                target.mark_size_dirty();
            }
            None => warn!("node {node} vanished before its port {port_id} could be updated"),
        },
        ActionEffect::RenamePort {
            node,
            port_id,
            name,
        } => match ctx.graph.node_mut(&node) {
            Some(target) => {
                if let Some(port) = target.input_port_by_unique_id_mut(port_id) {
                    port.name = name;
                }
                target.mark_size_dirty();
            }
            None => warn!("node {node} vanished before its port {port_id} could be renamed"),
        },
        ActionEffect::AddDirective { nodes, token } => {
            for node in &nodes {
                match ctx.graph.node_mut(node) {
                    Some(target) => target.define_container_mut().add_define(&token, false),
                    None => warn!("could not add {token} to missing node {node}"),
                }
            }
        }
        ActionEffect::RemoveDirective { nodes, token } => {
            for node in &nodes {
                match ctx.graph.node_mut(node) {
                    Some(target) => target.define_container_mut().remove_define(&token),
                    None => warn!("could not remove {token} from missing node {node}"),
                }
            }
        }
        ActionEffect::ArmCheckOnExecute(armed) => {
            if let Some(item) = registry.find_by_id_mut(source_id) {
                item.set_check_on_execute(armed);
            }
        }
        ActionEffect::SetPassVisible {
            node,
            pass,
            visible,
        } => match ctx.graph.node_mut(&node) {
            Some(target) => target.set_pass_visible(&pass, visible),
            None => warn!("could not change visibility of pass {pass} on missing node {node}"),
        },
        ActionEffect::ApplyProperty {
            node,
            module,
            action,
        } => match ctx.graph.node_mut(&node) {
            Some(target) => target.set_property_action(module, &action),
            None => warn!("could not apply {:?} on missing node {node}", action.action_type),
        },
    }
}

fn warn_missing_option(action: &TemplateAction, action_type: ActionType) {
    warn!(
        "could not find option {} for action {:?}",
        action.action_data, action_type
    );
}

fn warn_missing_port(action: &TemplateAction, action_type: ActionType) {
    warn!(
        "could not find port {},{} for action {:?}",
        action.action_data_index, action.action_data, action_type
    );
}

fn warn_missing_pass(action: &TemplateAction, action_type: ActionType) {
    warn!(
        "could not find pass {} for action {:?} on {}",
        action.pass_name, action_type, action.action_data
    );
}
