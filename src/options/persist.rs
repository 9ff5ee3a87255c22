//! Flat token persistence of option selections: `count, (id, index)*`.
//!
//! Saving follows list order; restoring matches by id, so a reordered or
//! trimmed template still picks up every selection whose option survived.

use anyhow::{Context, Result, anyhow};

use super::CustomOptions;

impl CustomOptions {
    pub fn write_to_tokens(&self, out: &mut Vec<String>) {
        let items = self.registry.items();
        out.push(items.len().to_string());
        for item in items {
            out.push(item.id().to_string());
            out.push(item.current_option().to_string());
        }
    }

    /// Reads one selection block starting at `cursor` into the pending buffer.
    ///
    /// Nothing is applied until [`CustomOptions::apply_pending_restore`].
    pub fn read_from_tokens(&mut self, tokens: &[String], cursor: &mut usize) -> Result<()> {
        let count: usize = next_token(tokens, cursor)
            .context("missing option count")?
            .parse()
            .context("option count is not an integer")?;

        let mut pending = Vec::new();
        for entry in 0..count {
            let id = next_token(tokens, cursor)
                .with_context(|| format!("missing id of option entry {entry}"))?;
            let index: i32 = next_token(tokens, cursor)
                .with_context(|| format!("missing index of option {id}"))?
                .parse()
                .with_context(|| format!("index of option {id} is not an integer"))?;
            pending.push((id.to_string(), index));
        }

        self.pending_restore = Some(pending);
        Ok(())
    }

    pub fn has_pending_restore(&self) -> bool {
        self.pending_restore.is_some()
    }

    /// Applies buffered selections by id. Ids no longer present are dropped.
    pub fn apply_pending_restore(&mut self) {
        let Some(pending) = self.pending_restore.take() else {
            return;
        };
        self.registry.refresh_lookup();
        for (id, index) in pending {
            match self.registry.find_by_id_mut(&id) {
                Some(item) => item.set_current_option(index),
                None => log::debug!("dropping restored selection of unknown option {id}"),
            }
        }
    }
}

fn next_token<'t>(tokens: &'t [String], cursor: &mut usize) -> Result<&'t str> {
    let token = tokens
        .get(*cursor)
        .ok_or_else(|| anyhow!("token stream ended at position {}", *cursor))?;
    *cursor += 1;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PassMasterNode;
    use crate::options::OptionScope;
    use crate::template::{TemplateOption, TemplateOptionsContainer};

    fn options(ids: &[&str]) -> CustomOptions {
        let container = TemplateOptionsContainer {
            name: String::new(),
            enabled: true,
            body: "x".repeat(ids.len() + 1),
            options: ids
                .iter()
                .map(|id| TemplateOption::choice(*id, *id, &["A", "B", "C"]))
                .collect(),
        };
        let mut options = CustomOptions::new(OptionScope::Pass);
        options.setup_from_template(&PassMasterNode::new("n", "Forward"), &container, true);
        options
    }

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn writes_count_then_pairs_in_list_order() {
        let mut options = options(&["a", "b"]);
        options.registry_mut().items_mut()[1].set_current_option(2);

        let mut out = Vec::new();
        options.write_to_tokens(&mut out);
        assert_eq!(out, tokens(&["2", "a", "0", "b", "2"]));
    }

    #[test]
    fn restore_matches_by_id_and_drops_unknown() {
        let mut options = options(&["a", "b"]);
        let stream = tokens(&["3", "b", "1", "gone", "2", "a", "2", "tail"]);
        let mut cursor = 0;

        options.read_from_tokens(&stream, &mut cursor).unwrap();
        assert_eq!(cursor, 7);
        assert!(options.has_pending_restore());
        assert_eq!(options.registry().items()[0].current_option(), 0);

        options.apply_pending_restore();
        assert!(!options.has_pending_restore());
        let selected: Vec<_> = options
            .registry()
            .items()
            .iter()
            .map(|i| i.current_option())
            .collect();
        assert_eq!(selected, [2, 1]);
    }

    #[test]
    fn malformed_streams_are_errors() {
        let mut options = options(&["a"]);

        let mut cursor = 0;
        let err = options
            .read_from_tokens(&tokens(&["2", "a", "1"]), &mut cursor)
            .unwrap_err();
        assert!(format!("{err:#}").contains("missing id"));

        let mut cursor = 0;
        assert!(
            options
                .read_from_tokens(&tokens(&["one"]), &mut cursor)
                .is_err()
        );

        let mut cursor = 0;
        assert!(
            options
                .read_from_tokens(&tokens(&["1", "a", "x"]), &mut cursor)
                .is_err()
        );
        assert!(!options.has_pending_restore());
    }

    #[test]
    fn oversized_count_is_a_truncation_error() {
        let mut options = options(&["a"]);
        let mut cursor = 0;

        let err = options
            .read_from_tokens(&tokens(&["1000000000000", "a", "1"]), &mut cursor)
            .unwrap_err();
        assert!(format!("{err:#}").contains("token stream ended"));
        assert!(!options.has_pending_restore());
    }
}
