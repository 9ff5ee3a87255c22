//! UI-side state of one choice option.

use serde::{Deserialize, Serialize};

use super::dispatch::DispatchContext;
use super::registry::OptionRegistry;
use crate::collector::DataCollector;
use crate::template::{ActionType, TemplateAction, TemplateOption};

/// Routes a selection raised by an item to the dispatcher of the item's scope.
pub type SelectionHandler = fn(&mut DispatchContext<'_>, &mut OptionRegistry, &SelectionEvent);

/// An action list to run on behalf of one option item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEvent {
    pub source_id: String,
    pub is_refreshing: bool,
    pub invert: bool,
    pub actions: Vec<TemplateAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionUIItem {
    option: TemplateOption,
    current_option: usize,
    is_visible: bool,
    check_on_execute: bool,
    #[serde(skip)]
    handler: Option<SelectionHandler>,
}

impl OptionUIItem {
    pub fn new(option: TemplateOption, handler: SelectionHandler) -> Self {
        let current_option = option.clamp_index(option.default_index as i32);
        Self {
            option,
            current_option,
            is_visible: true,
            check_on_execute: false,
            handler: Some(handler),
        }
    }

    pub fn option(&self) -> &TemplateOption {
        &self.option
    }

    pub fn id(&self) -> &str {
        &self.option.id
    }

    pub fn name(&self) -> &str {
        &self.option.name
    }

    pub fn current_option(&self) -> usize {
        self.current_option
    }

    /// Sets the selection without running any actions.
    pub fn set_current_option(&mut self, index: i32) {
        self.current_option = self.option.clamp_index(index);
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.is_visible = visible;
    }

    /// Armed when the selected value carries unscoped define actions that are
    /// resolved when the pass is built rather than at selection time.
    pub fn check_on_execute(&self) -> bool {
        self.check_on_execute
    }

    pub fn set_check_on_execute(&mut self, armed: bool) {
        self.check_on_execute = armed;
    }

    pub fn handler(&self) -> Option<SelectionHandler> {
        self.handler
    }

    pub fn is_unbound(&self) -> bool {
        self.handler.is_none()
    }

    pub fn bind(&mut self, handler: SelectionHandler) {
        self.handler = Some(handler);
    }

    /// Detaches the selection handler. The item must not be used afterwards.
    pub fn destroy(&mut self) {
        self.handler = None;
    }

    /// Changes the selection and returns the action lists to dispatch, in order.
    ///
    /// Nothing is returned when the clamped index equals the current selection.
    pub fn select(&mut self, index: i32) -> Vec<SelectionEvent> {
        let next = self.option.clamp_index(index);
        if next == self.current_option {
            return Vec::new();
        }

        let mut events = Vec::with_capacity(2);
        if self.option.invert_on_deselect {
            events.push(self.event(self.current_option, false, true));
        }
        self.current_option = next;
        events.push(self.event(next, false, false));
        events
    }

    /// Action lists that re-establish the current selection after a reload.
    pub fn refresh_events(&self) -> Vec<SelectionEvent> {
        let mut events = Vec::new();
        if self.option.invert_on_deselect {
            for index in 0..self.option.values.len() {
                if index != self.current_option {
                    events.push(self.event(index, true, true));
                }
            }
        }
        events.push(self.event(self.current_option, true, false));
        events
    }

    pub fn fill_data_collector(&self, collector: &mut DataCollector) {
        if !self.is_visible || !self.check_on_execute {
            return;
        }

        for action in self.option.actions_for(self.current_option) {
            if action.all_passes || !action.pass_name.is_empty() {
                continue;
            }
            match action.action_type {
                ActionType::SetDefine => collector.add_to_defines(&action.action_data, true),
                ActionType::SetUndefine => collector.add_to_defines(&action.action_data, false),
                _ => {}
            }
        }
    }

    fn event(&self, index: usize, is_refreshing: bool, invert: bool) -> SelectionEvent {
        SelectionEvent {
            source_id: self.option.id.clone(),
            is_refreshing,
            invert,
            actions: self.option.actions_for(index).to_vec(),
        }
    }
}
