//! Integration tests for graph construction, planning, and persistence

use darkmatter_graph::prelude::*;

fn transclude(target: &Resource) -> Reference {
    Reference::required(target.clone(), ReferenceType::Transclusion)
}

#[test]
fn build_then_plan_full_pipeline() {
    let resolver = MemoryResolver::new();
    let root = Resource::file("root.md");
    let intro = Resource::file("intro.md");
    let outro = Resource::file("outro.md");
    resolver.insert_with_references(
        root.clone(),
        "# Root",
        vec![transclude(&intro), transclude(&outro)],
    );
    resolver.insert(intro.clone(), "# Intro");
    resolver.insert(outro.clone(), "# Outro");

    let outcome = Pipeline::new(resolver).build_and_plan(&root).unwrap();

    assert_eq!(outcome.graph.node_count(), 3);
    assert_eq!(outcome.plan.layer_count(), 2);
    // Both leaves are independent, so they share the first layer
    assert_eq!(outcome.plan.layers()[0].len(), 2);
    assert_eq!(outcome.plan.layers()[1], vec![resource_hash_of(&root)]);
}

#[test]
fn content_hash_is_stable_across_builds() {
    let resolver = MemoryResolver::new();
    let root = Resource::file("root.md");
    resolver.insert(root.clone(), "unchanged content");

    let builder = GraphBuilder::new(&resolver);
    let first = builder.build(&root).unwrap().graph;
    let second = builder.build(&root).unwrap().graph;

    let hash = resource_hash_of(&root);
    assert_eq!(
        first.node(hash).unwrap().content_hash,
        second.node(hash).unwrap().content_hash
    );
}

#[test]
fn rebuilding_unchanged_tree_is_idempotent() {
    let resolver = MemoryResolver::new();
    let root = Resource::file("root.md");
    let a = Resource::file("a.md");
    let b = Resource::file("b.md");
    resolver.insert_with_references(root.clone(), "root", vec![transclude(&a), transclude(&b)]);
    resolver.insert_with_references(a.clone(), "a", vec![transclude(&b)]);
    resolver.insert(b.clone(), "b");

    let builder = GraphBuilder::new(&resolver);
    let first = builder.build(&root).unwrap().graph;
    let second = builder.build(&root).unwrap().graph;

    assert_eq!(first.node_count(), second.node_count());
    assert_eq!(first.edges(), second.edges());
    for node in first.nodes() {
        let other = second.node(node.resource_hash).unwrap();
        assert_eq!(node.resource, other.resource);
        assert_eq!(node.content_hash, other.content_hash);
    }
}

// Scenario: the root transcludes an optional resource that 404s. The
// build succeeds with one diagnostic and no edge to that resource.
#[test]
fn optional_missing_resource_yields_diagnostic_only() {
    let resolver = MemoryResolver::new();
    let root = Resource::file("root.md");
    let missing = Resource::url("https://example.com/404.png");
    resolver.insert_with_references(
        root.clone(),
        "# Root",
        vec![Reference::optional(missing.clone(), ReferenceType::Image)],
    );

    let outcome = GraphBuilder::new(&resolver).build(&root).unwrap();

    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].code, "resource.missing_optional");
    assert_eq!(outcome.graph.node_count(), 1);
    assert_eq!(outcome.graph.edge_count(), 0);
}

// Scenario: A -> B -> C -> A. The build fails with the three cycle edges
// and nothing is persisted.
#[test]
fn reference_cycle_aborts_without_persisting() {
    let dir = tempfile::tempdir().unwrap();
    let store = GraphStore::new(dir.path().join("graph.json"));

    let resolver = MemoryResolver::new();
    let a = Resource::file("a.md");
    let b = Resource::file("b.md");
    let c = Resource::file("c.md");
    resolver.insert_with_references(a.clone(), "a", vec![transclude(&b)]);
    resolver.insert_with_references(b.clone(), "b", vec![transclude(&c)]);
    resolver.insert_with_references(c.clone(), "c", vec![transclude(&a)]);

    let pipeline = Pipeline::new(resolver).with_store(store.clone());
    let err = pipeline.build(&a).unwrap_err();

    match err {
        GraphError::Cycle(edges) => assert_eq!(edges.len(), 3),
        other => panic!("expected cycle, got {other:?}"),
    }
    assert!(store.load(&a).unwrap().is_none());
}

// Scenario: diamond A -> B, A -> C, B -> D, C -> D plans as
// [[D], [B, C], [A]].
#[test]
fn diamond_layers_leaves_first() {
    let resolver = MemoryResolver::new();
    let a = Resource::file("a.md");
    let b = Resource::file("b.md");
    let c = Resource::file("c.md");
    let d = Resource::file("d.md");
    resolver.insert_with_references(a.clone(), "a", vec![transclude(&b), transclude(&c)]);
    resolver.insert_with_references(b.clone(), "b", vec![transclude(&d)]);
    resolver.insert_with_references(c.clone(), "c", vec![transclude(&d)]);
    resolver.insert(d.clone(), "d");

    let outcome = Pipeline::new(resolver).build_and_plan(&a).unwrap();
    let layers = outcome.plan.layers();

    assert_eq!(layers.len(), 3);
    assert_eq!(layers[0], vec![resource_hash_of(&d)]);
    let mut middle = layers[1].clone();
    middle.sort();
    let mut expected = vec![resource_hash_of(&b), resource_hash_of(&c)];
    expected.sort();
    assert_eq!(middle, expected);
    assert_eq!(layers[2], vec![resource_hash_of(&a)]);
}

#[test]
fn persisted_graph_survives_a_new_process() {
    // Same store path, fresh pipeline: simulates a second run
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");

    let root = Resource::file("root.md");
    let child = Resource::file("child.md");

    let make_resolver = || {
        let resolver = MemoryResolver::new();
        resolver.insert_with_references(root.clone(), "# Root", vec![transclude(&child)]);
        resolver.insert(child.clone(), "# Child");
        resolver
    };

    let first = Pipeline::new(make_resolver()).with_store(GraphStore::new(&path));
    let built = first.build(&root).unwrap();
    assert!(built.diagnostics.is_empty());

    let second = Pipeline::new(make_resolver()).with_store(GraphStore::new(&path));
    let loaded = second.load_or_build(&root).unwrap();

    assert_eq!(loaded.graph.edges(), built.graph.edges());
    assert_eq!(loaded.graph.node_count(), 2);
}

#[test]
fn mixed_required_and_optional_references() {
    let resolver = MemoryResolver::new();
    let root = Resource::file("root.md");
    let body = Resource::file("body.md");
    let banner = Resource::url("https://example.com/banner.png");
    let summary_src = Resource::file("notes.md");
    resolver.insert_with_references(
        root.clone(),
        "# Root",
        vec![
            transclude(&body),
            Reference::optional(banner.clone(), ReferenceType::Image),
            Reference::required(summary_src.clone(), ReferenceType::SummaryInput),
        ],
    );
    resolver.insert(body.clone(), "body");
    resolver.insert(banner.clone(), [1u8, 2, 3]);
    resolver.insert(summary_src.clone(), "notes");

    let outcome = GraphBuilder::new(&resolver).build(&root).unwrap();

    assert_eq!(outcome.graph.node_count(), 4);
    assert_eq!(outcome.graph.edge_count(), 3);
    let kinds: Vec<_> = outcome
        .graph
        .edges()
        .iter()
        .map(|e| e.reference_type)
        .collect();
    assert!(kinds.contains(&ReferenceType::Transclusion));
    assert!(kinds.contains(&ReferenceType::Image));
    assert!(kinds.contains(&ReferenceType::SummaryInput));
}
