use std::collections::HashSet;

use pharos_core::clock::ManualClock;
use pharos_core::compiler::EventCompiler;
use pharos_core::config::CompilerConfig;
use pharos_core::event::{Issuer, Kind, Nip01Hasher, TAG_WIKILINK};
use pharos_core::normalize::normalize;
use pharos_core::schedule::schedule;
use pharos_core::validate::verify_batch;
use pharos_core::walker::walk;
use pharos_core::wikilink::extract;
use pharos_core::{Document, LeafKind, NodeRef};
use proptest::prelude::*;

/// One node to append: which existing container to hang it under, whether it
/// is a section, and an optional title drawn from a tiny alphabet so that
/// duplicate ids show up often.
type Spec = (usize, bool, Option<String>);

fn arb_specs() -> impl Strategy<Value = Vec<Spec>> {
    prop::collection::vec(
        (0usize..64, any::<bool>(), prop::option::of("[A-C]{1,2}")),
        0..40,
    )
}

fn build(specs: &[Spec]) -> Document {
    let mut doc = Document::new(Some("Root"));
    let mut containers: Vec<(NodeRef, u8)> = vec![(doc.root(), 0)];

    for (i, (pick, is_section, title)) in specs.iter().enumerate() {
        let (parent, level) = containers[pick % containers.len()];
        if *is_section {
            let child_level = level.saturating_add(1);
            let node = doc.add_section(parent, title.as_deref(), child_level);
            containers.push((node, child_level));
        } else {
            let text = format!("leaf {i} links to [[Node {i}]]");
            doc.add_leaf(parent, LeafKind::Paragraph, title.as_deref(), text);
        }
    }
    doc
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn compiled_batches_obey_graph_laws(specs in arb_specs(), ceiling in 1u8..6) {
        let mut doc = build(&specs);
        let config = CompilerConfig { depth_ceiling: ceiling };
        let walk = walk(&mut doc, &config);
        let order = schedule(&walk.root_id, &walk.adjacency);
        let clock = ManualClock::new(1_000);
        let records = EventCompiler::new(&doc, &walk, &Nip01Hasher, &clock)
            .compile(order, &Issuer::new("pk"))
            .expect("compile");

        // Ordering law.
        prop_assert!(verify_batch(records.values(), &Nip01Hasher).is_ok());

        // Every registered node is linked, so every one is compiled.
        prop_assert_eq!(records.len(), walk.nodes.len());

        // Uniqueness of node ids and record ids.
        let d_tags: HashSet<&str> = records.values().filter_map(|r| r.node_id()).collect();
        prop_assert_eq!(d_tags.len(), records.len());
        let ids: HashSet<&str> = records.values().map(|r| r.id.as_str()).collect();
        prop_assert_eq!(ids.len(), records.len());

        for (node_id, record) in &records {
            let node = doc.node(walk.nodes[node_id.as_str()]);

            // Classification.
            let expected = if node.context().is_container() { Kind::Index } else { Kind::Zettel };
            prop_assert_eq!(record.kind, expected);

            // Depth: nothing below a section at the ceiling is compiled.
            if let Some(parent) = node.parent() {
                let parent_level = doc.node(parent).level().unwrap_or_default();
                prop_assert!(parent_level < ceiling);
            }

            match record.kind {
                Kind::Index => {
                    prop_assert!(record.content.is_empty());
                    prop_assert_eq!(record.tag_values(TAG_WIKILINK).count(), 0);
                }
                Kind::Zettel => prop_assert_eq!(record.child_ids().count(), 0),
            }
        }
    }

    #[test]
    fn slugs_only_contain_safe_characters(text in ".{0,64}") {
        if let Some(slug) = normalize(&text) {
            prop_assert!(!slug.is_empty());
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert_eq!(normalize(&slug), Some(slug.clone()));
        }
    }

    #[test]
    fn one_wikilink_per_marker(labels in prop::collection::vec("[a-z]{1,8}( [a-z]{1,8})?", 0..8)) {
        let text: String = labels.iter().map(|l| format!("see [[{l}]]. ")).collect();
        let slugs: Vec<String> = extract(&text)
            .iter()
            .filter_map(|tag| tag.value().map(str::to_owned))
            .collect();
        let expected: Vec<String> = labels.iter().filter_map(|l| normalize(l)).collect();
        prop_assert_eq!(slugs, expected);
    }
}
