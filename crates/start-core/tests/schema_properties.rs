use std::collections::BTreeMap;

use proptest::prelude::*;
use start_core::content_type::{no_commands, no_plugins};
use start_core::{ContentKind, ContentTypes, CoreError, Editor, EditorOptions, NodeDefinition, assemble_schema};
use start_engine::NodeSpec;

fn block(name: &str) -> NodeDefinition {
    NodeDefinition {
        name: Box::leak(name.to_string().into_boxed_str()),
        spec: |_| NodeSpec::new().content("inline*").group("block"),
        commands: no_commands,
        plugins: no_plugins,
    }
}

fn names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z]{1,8}", 1..12)
        .prop_map(|set| set.into_iter().filter(|n| n != "doc" && n != "text").collect::<Vec<_>>())
        .prop_filter("at least one name", |names| !names.is_empty())
        .prop_shuffle()
}

proptest! {
    #[test]
    fn prop_schema_keeps_registration_order(names in names()) {
        let types = names
            .iter()
            .fold(ContentTypes::new(), |types, name| types.with_node(block(name)));
        let schema = assemble_schema(&types, &BTreeMap::new()).unwrap();

        let mut expected = vec!["doc".to_string(), "text".to_string()];
        expected.extend(names.iter().cloned());
        let actual: Vec<String> = schema.node_names().iter().map(|n| n.to_string()).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn prop_duplicate_node_name_conflicts(names in names(), pick in any::<prop::sample::Index>()) {
        let duplicate = pick.get(&names).clone();
        let types = names
            .iter()
            .chain(std::iter::once(&duplicate))
            .fold(ContentTypes::new(), |types, name| types.with_node(block(name)));

        let err = assemble_schema(&types, &BTreeMap::new()).unwrap_err();
        let conflict = matches!(
            err,
            CoreError::SchemaConflict { kind: ContentKind::Node, ref name } if *name == duplicate
        );
        prop_assert!(conflict, "unexpected error {:?}", err);
    }
}

#[test]
fn test_conflict_fails_editor_construction() {
    let types = ContentTypes::builtin().with_node(block("paragraph"));
    let result = Editor::new(EditorOptions {
        content_types: Some(types),
        ..EditorOptions::new("<p>x</p>")
    });
    assert!(matches!(result, Err(CoreError::SchemaConflict { .. })));
}

#[test]
fn test_markup_precedence_follows_schema_order() {
    // Both types parse <p>; the one registered first wins.
    fn claims_p(name: &str) -> NodeDefinition {
        NodeDefinition {
            name: Box::leak(name.to_string().into_boxed_str()),
            spec: |_| {
                NodeSpec::new()
                    .content("inline*")
                    .group("block")
                    .parse(start_engine::ParseRule::tag("p"))
            },
            commands: no_commands,
            plugins: no_plugins,
        }
    }
    let types = ContentTypes::new().with_node(claims_p("first")).with_node(claims_p("second"));
    let schema = assemble_schema(&types, &BTreeMap::new()).unwrap();
    let doc = start_engine::parse_markup(&schema, "<p>a</p>").unwrap();
    assert_eq!(doc.child(0).unwrap().type_name(), "first");
}
