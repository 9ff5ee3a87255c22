use node_forge_template_options::{
    CustomOptions, OptionScope,
    graph::{InputPort, PassMasterNode},
    template::{ActionType, TemplateAction, TemplateOption, TemplateOptionsContainer},
};
use proptest::prelude::*;

fn owner() -> PassMasterNode {
    PassMasterNode::new("master/Forward", "Forward").with_ports(vec![
        InputPort::new(0, "Albedo"),
        InputPort::new(1, "Extra"),
    ])
}

fn container(body_len: usize, choices: usize) -> TemplateOptionsContainer {
    let mut options: Vec<TemplateOption> = (0..choices)
        .map(|i| {
            TemplateOption::choice(format!("opt{i}"), format!("Option {i}"), &["A", "B", "C", "D"])
        })
        .collect();
    options.push(
        TemplateOption::port("", "Extra")
            .with_actions(0, vec![TemplateAction::new(ActionType::SetDefine, "EXTRA")]),
    );
    TemplateOptionsContainer {
        name: "Forward Options".to_string(),
        enabled: true,
        body: "#".repeat(body_len),
        options,
    }
}

#[test]
fn unchanged_body_preserves_selections() {
    let owner = owner();
    let mut options = CustomOptions::new(OptionScope::Pass);
    options.setup_from_template(&owner, &container(40, 3), true);
    for (i, item) in options.registry_mut().items_mut().iter_mut().enumerate() {
        item.set_current_option(i as i32 + 1);
    }

    let report = options.setup_from_template(&owner, &container(40, 3), false);
    assert!(report.preserved);
    assert_eq!(report.torn_down, 0);
    let selected: Vec<_> = options
        .registry()
        .items()
        .iter()
        .map(|i| i.current_option())
        .collect();
    assert_eq!(selected, [1, 2, 3]);
    assert_eq!(options.label(), " Forward Options");
}

#[test]
fn new_template_flag_forces_rebuild() {
    let owner = owner();
    let mut options = CustomOptions::new(OptionScope::Pass);
    options.setup_from_template(&owner, &container(40, 2), true);
    options.registry_mut().items_mut()[0].set_current_option(3);

    let report = options.setup_from_template(&owner, &container(40, 2), true);
    assert!(!report.preserved);
    assert_eq!(report.torn_down, 2);
    assert_eq!(options.registry().items()[0].current_option(), 0);
}

#[test]
fn deserialized_options_are_rebound_on_unchanged_body() {
    let owner = owner();
    let mut options = CustomOptions::new(OptionScope::SubShader);
    options.setup_from_template(&owner, &container(12, 2), true);
    options.registry_mut().items_mut()[1].set_current_option(2);

    let json = serde_json::to_string(&options).unwrap();
    let mut restored: CustomOptions = serde_json::from_str(&json).unwrap();
    assert!(restored.registry().items().iter().all(|i| i.is_unbound()));

    let report = restored.setup_from_template(&owner, &container(12, 2), false);
    assert!(report.preserved);
    assert_eq!(report.rebound, 2);
    assert!(restored.registry().items().iter().all(|i| !i.is_unbound()));
    assert_eq!(restored.registry().items()[1].current_option(), 2);
    assert_eq!(restored.registry().lookup_len(), 0);
    assert!(restored.registry().find_by_id("opt1").is_some());
}

proptest! {
    #[test]
    fn body_change_rebuilds_to_new_choice_count(
        old_len in 1usize..64,
        delta in 1usize..32,
        old_choices in 0usize..6,
        new_choices in 0usize..6,
    ) {
        let owner = owner();
        let mut options = CustomOptions::new(OptionScope::Pass);
        options.setup_from_template(&owner, &container(old_len, old_choices), true);

        let changed = container(old_len + delta, new_choices);
        let report = options.setup_from_template(&owner, &changed, false);
        prop_assert!(!report.preserved);
        prop_assert_eq!(report.torn_down, old_choices);
        prop_assert_eq!(options.registry().len(), new_choices);
        prop_assert_eq!(report.port_items, 1);
        prop_assert_eq!(options.size_check(), old_len + delta);
        prop_assert!(options.registry().items().iter().all(|i| i.current_option() == 0));
    }

    #[test]
    fn refresh_lookup_is_idempotent(choices in 0usize..8) {
        let owner = owner();
        let mut options = CustomOptions::new(OptionScope::Pass);
        options.setup_from_template(&owner, &container(10, choices), true);
        let json = serde_json::to_string(&options).unwrap();
        let mut restored: CustomOptions = serde_json::from_str(&json).unwrap();

        restored.registry_mut().refresh_lookup();
        let once: Vec<_> = (0..choices)
            .map(|i| {
                restored
                    .registry()
                    .find_by_id(&format!("opt{i}"))
                    .map(|item| item.name().to_string())
            })
            .collect();
        restored.registry_mut().refresh_lookup();
        let twice: Vec<_> = (0..choices)
            .map(|i| {
                restored
                    .registry()
                    .find_by_id(&format!("opt{i}"))
                    .map(|item| item.name().to_string())
            })
            .collect();
        prop_assert_eq!(restored.registry().lookup_len(), choices);
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn preserved_options_keep_their_label() {
    let owner = owner();
    let mut options = CustomOptions::new(OptionScope::Pass);
    options.setup_from_template(&owner, &container(16, 1), true);

    let mut renamed = container(16, 1);
    renamed.name = "Renamed".to_string();
    let report = options.setup_from_template(&owner, &renamed, false);
    assert!(report.preserved);
    assert_eq!(options.label(), " Forward Options");

    renamed.body.push('#');
    options.setup_from_template(&owner, &renamed, false);
    assert_eq!(options.label(), " Renamed");
}

#[test]
fn disabled_container_resets_size_check() {
    let owner = owner();
    let mut options = CustomOptions::new(OptionScope::Pass);
    options.setup_from_template(&owner, &container(20, 2), true);
    assert!(options.has_custom_options());

    let mut disabled = container(30, 2);
    disabled.enabled = false;
    let report = options.setup_from_template(&owner, &disabled, false);
    assert_eq!(report.torn_down, 2);
    assert_eq!(report.option_items, 0);
    assert_eq!(report.port_items, 0);
    assert_eq!(options.size_check(), 0);
}
