//! Build-time data gathered from options when a pass is generated.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataCollector {
    directives: Vec<String>,
}

impl DataCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `#define value` (or `#undef value` when `define` is false).
    pub fn add_to_defines(&mut self, value: &str, define: bool) {
        let token = directive(value, define);
        if !self.directives.contains(&token) {
            self.directives.push(token);
        }
    }

    pub fn remove_from_defines(&mut self, value: &str, define: bool) {
        let token = directive(value, define);
        self.directives.retain(|d| *d != token);
    }

    pub fn directives(&self) -> &[String] {
        &self.directives
    }

    pub fn contains(&self, token: &str) -> bool {
        self.directives.iter().any(|d| d == token)
    }
}

fn directive(value: &str, define: bool) -> String {
    if define {
        format!("#define {value}")
    } else {
        format!("#undef {value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defines_are_deduplicated_in_insertion_order() {
        let mut collector = DataCollector::new();
        collector.add_to_defines("B", true);
        collector.add_to_defines("A", false);
        collector.add_to_defines("B", true);
        assert_eq!(collector.directives(), ["#define B", "#undef A"]);

        collector.remove_from_defines("B", true);
        assert_eq!(collector.directives(), ["#undef A"]);
    }
}
