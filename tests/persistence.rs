use node_forge_template_options::{
    CustomOptions, OptionScope,
    graph::PassMasterNode,
    template::{TemplateOption, TemplateOptionsContainer},
};
use proptest::prelude::*;

const VALUES: &[&str] = &["V0", "V1", "V2", "V3", "V4"];

fn options_with(ids: &[String]) -> CustomOptions {
    let container = TemplateOptionsContainer {
        name: String::new(),
        enabled: true,
        body: format!("{} options", ids.len()),
        options: ids
            .iter()
            .map(|id| TemplateOption::choice(id.as_str(), id.as_str(), VALUES))
            .collect(),
    };
    let mut options = CustomOptions::new(OptionScope::Pass);
    options.setup_from_template(&PassMasterNode::new("n", "Forward"), &container, true);
    options
}

fn selections(options: &CustomOptions) -> Vec<(String, usize)> {
    options
        .registry()
        .items()
        .iter()
        .map(|i| (i.id().to_string(), i.current_option()))
        .collect()
}

proptest! {
    #[test]
    fn tokens_round_trip_into_reordered_template(
        picks in prop::collection::vec(0i32..5, 1..8),
        rotate in 0usize..8,
    ) {
        let ids: Vec<String> = (0..picks.len()).map(|i| format!("opt{i}")).collect();
        let mut saved = options_with(&ids);
        for (item, pick) in saved.registry_mut().items_mut().iter_mut().zip(&picks) {
            item.set_current_option(*pick);
        }
        let mut tokens = Vec::new();
        saved.write_to_tokens(&mut tokens);

        let mut reordered_ids = ids.clone();
        reordered_ids.rotate_left(rotate % ids.len());
        let mut loaded = options_with(&reordered_ids);
        let mut cursor = 0;
        loaded.read_from_tokens(&tokens, &mut cursor).unwrap();
        prop_assert_eq!(cursor, tokens.len());
        loaded.apply_pending_restore();

        let mut expected = selections(&saved);
        let mut actual = selections(&loaded);
        expected.sort();
        actual.sort();
        prop_assert_eq!(expected, actual);
    }

    #[test]
    fn removed_options_are_ignored_on_restore(
        picks in prop::collection::vec(0i32..5, 2..8),
        keep in 1usize..8,
    ) {
        let ids: Vec<String> = (0..picks.len()).map(|i| format!("opt{i}")).collect();
        let mut saved = options_with(&ids);
        for (item, pick) in saved.registry_mut().items_mut().iter_mut().zip(&picks) {
            item.set_current_option(*pick);
        }
        let mut tokens = Vec::new();
        saved.write_to_tokens(&mut tokens);

        let keep = keep.min(ids.len());
        let mut loaded = options_with(&ids[..keep]);
        let mut cursor = 0;
        prop_assert!(loaded.read_from_tokens(&tokens, &mut cursor).is_ok());
        loaded.apply_pending_restore();

        prop_assert_eq!(loaded.registry().len(), keep);
        for (item, pick) in loaded.registry().items().iter().zip(&picks) {
            prop_assert_eq!(item.current_option(), *pick as usize);
        }
    }
}

#[test]
fn out_of_range_restored_index_is_clamped() {
    let ids = vec!["only".to_string()];
    let mut options = options_with(&ids);
    let tokens: Vec<String> = ["1", "only", "42"].iter().map(|t| t.to_string()).collect();
    let mut cursor = 0;
    options.read_from_tokens(&tokens, &mut cursor).unwrap();
    options.apply_pending_restore();
    assert_eq!(options.registry().items()[0].current_option(), VALUES.len() - 1);
}
