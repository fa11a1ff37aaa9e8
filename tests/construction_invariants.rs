//! Invariants of the construction pipelines, exercised on the builders
//! directly.

use graph_loading::concurrency::Concurrency;
use graph_loading::core::loading::construction::{
    NodesBuilder, NodesBuilderConfig, PropertyConfig, RelationshipsBuilder,
    RelationshipsBuilderConfig,
};
use graph_loading::types::schema::{Aggregation, NodeLabel, Orientation, RelationshipType};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;

fn nodes_config() -> NodesBuilderConfig {
    NodesBuilderConfig::builder()
        .concurrency(Concurrency::new(4))
        .build()
}

#[test]
fn id_map_round_trips_for_scattered_ids() {
    let builder = NodesBuilder::new(nodes_config()).unwrap();
    let originals = [5i64, 900, 3, 77, 4096, 123_456];
    for &original in &originals {
        builder.add_node(original).unwrap();
    }

    let nodes = builder.build().unwrap();
    let id_map = &nodes.id_map;
    assert_eq!(id_map.node_count(), originals.len());

    for internal in id_map.iter() {
        assert_eq!(
            id_map.to_internal(id_map.to_original_node_id(internal)),
            Some(internal)
        );
    }
    for &original in &originals {
        assert_eq!(
            id_map.to_original_node_id(id_map.to_internal(original).unwrap()),
            original
        );
    }
}

#[test]
fn label_bitmap_cardinality_matches_membership() {
    let builder = NodesBuilder::new(nodes_config()).unwrap();
    let person = NodeLabel::of("Person");
    let company = NodeLabel::of("Company");

    for id in 0..100i64 {
        if id % 3 == 0 {
            builder
                .add_node_with_labels(id, &[person.clone(), company.clone()])
                .unwrap();
        } else {
            builder.add_node_with_labels(id, &[person.clone()]).unwrap();
        }
    }

    let nodes = builder.build().unwrap();
    let id_map = &nodes.id_map;

    let members_by_scan = |label: &NodeLabel| {
        id_map
            .iter()
            .filter(|&internal| id_map.has_label(internal, label))
            .count()
    };
    assert_eq!(id_map.node_count_for_label(&person), members_by_scan(&person));
    assert_eq!(
        id_map.node_count_for_label(&company),
        members_by_scan(&company)
    );
    assert_eq!(id_map.node_count_for_label(&person), 100);
    assert_eq!(id_map.node_count_for_label(&company), 34);
}

#[test]
fn dedup_makes_repeated_input_idempotent() {
    let run = |times: usize| {
        let config = NodesBuilderConfig::builder()
            .concurrency(Concurrency::single_threaded())
            .deduplicate_ids(true)
            .max_original_id(499)
            .build();
        let builder = NodesBuilder::new(config).unwrap();
        for _ in 0..times {
            for id in 0..500i64 {
                builder.add_node(id).unwrap();
            }
        }
        builder.build().unwrap().id_map.node_count()
    };

    assert_eq!(run(1), run(2));
}

#[test]
fn concurrent_dedup_from_shuffled_workers() {
    let config = NodesBuilderConfig::builder()
        .concurrency(Concurrency::new(4))
        .deduplicate_ids(true)
        .build();
    let builder = Arc::new(NodesBuilder::new(config).unwrap());

    std::thread::scope(|scope| {
        for worker in 0..4u64 {
            let builder = Arc::clone(&builder);
            scope.spawn(move || {
                let mut rng = rand::rngs::StdRng::seed_from_u64(worker);
                let mut ids: Vec<i64> = (0..1000).collect();
                ids.shuffle(&mut rng);
                for id in ids {
                    builder.add_node(id).unwrap();
                }
            });
        }
    });

    let builder = Arc::into_inner(builder).unwrap();
    let counters = builder.counters();
    let nodes = builder.build().unwrap();

    assert_eq!(nodes.id_map.node_count(), 1000);
    assert_eq!(counters.snapshot().nodes_skipped_duplicate, 3000);
}

#[test]
fn growing_dedup_handles_large_sparse_ids() {
    // No max-original-id hint: paged id map plus growing bitset.
    let config = NodesBuilderConfig::builder()
        .concurrency(Concurrency::single_threaded())
        .deduplicate_ids(true)
        .build();
    let builder = NodesBuilder::new(config).unwrap();

    let large = 1i64 << 31;
    builder.add_node(0).unwrap();
    builder.add_node(large).unwrap();
    builder.add_node(large).unwrap();

    let counters = builder.counters();
    let nodes = builder.build().unwrap();
    assert_eq!(nodes.id_map.node_count(), 2);
    assert_eq!(counters.snapshot().nodes_skipped_duplicate, 1);
    assert_eq!(nodes.id_map.to_internal(large), Some(1));
    assert_eq!(nodes.id_map.highest_original_id(), large);
}

fn dense_id_map_64() -> Arc<graph_loading::types::graph::IdMap> {
    let builder = NodesBuilder::new(
        NodesBuilderConfig::builder()
            .concurrency(Concurrency::single_threaded())
            .build(),
    )
    .unwrap();
    for id in 0..64i64 {
        builder.add_node(id).unwrap();
    }
    builder.build().unwrap().id_map
}

#[test]
fn inverse_topologies_have_identical_element_counts() {
    let id_map = dense_id_map_64();
    let config = RelationshipsBuilderConfig::builder(RelationshipType::of("LINKS"))
        .concurrency(Concurrency::new(2))
        .index_inverse(true)
        .build();
    let builder = RelationshipsBuilder::new(config, id_map).unwrap();

    for source in 0..64i64 {
        for offset in 1..4i64 {
            builder
                .add_relationship(source, (source + offset) % 64)
                .unwrap();
        }
    }

    let relationships = builder.build().unwrap();
    let forward = relationships.topology();
    let inverse = relationships.inverse_topology().unwrap();
    assert_eq!(forward.element_count(), 192);
    assert_eq!(forward.element_count(), inverse.element_count());
}

#[test]
fn undirected_symmetry() {
    let id_map = dense_id_map_64();
    let config = RelationshipsBuilderConfig::builder(RelationshipType::of("FRIEND"))
        .concurrency(Concurrency::single_threaded())
        .orientation(Orientation::Undirected)
        .build();
    let builder = RelationshipsBuilder::new(config, id_map).unwrap();

    for source in 0..32i64 {
        builder.add_relationship(source, source + 32).unwrap();
    }

    let relationships = builder.build().unwrap();
    let forward = relationships.topology();
    let inverse = relationships.inverse_topology().unwrap();

    for (source, target) in forward.iter() {
        assert!(
            inverse.neighbors(target).contains(&source),
            "forward edge ({source}, {target}) missing its reverse"
        );
    }
    assert_eq!(forward.element_count(), inverse.element_count());
}

#[test]
fn aggregated_property_columns_align_with_topology() {
    let id_map = dense_id_map_64();
    let config = RelationshipsBuilderConfig::builder(RelationshipType::of("RATES"))
        .concurrency(Concurrency::single_threaded())
        .add_property(PropertyConfig::with_aggregation("min", Aggregation::Min))
        .add_property(PropertyConfig::with_aggregation("max", Aggregation::Max))
        .build();
    let builder = RelationshipsBuilder::new(config, id_map).unwrap();

    for value in [3.0f64, 1.0, 2.0] {
        builder.add_relationship_with_values(0, 1, &{
            let mut props = graph_loading::values::PropertyValues::new();
            props.put("min", graph_loading::values::GdsValue::Double(value));
            props.put("max", graph_loading::values::GdsValue::Double(value));
            props
        })
        .unwrap();
    }

    let relationships = builder.build().unwrap();
    let topology = relationships.topology();
    assert_eq!(topology.element_count(), 1);

    let index = topology.relationship_index(0, 0);
    assert_eq!(relationships.property("min").unwrap().value_at(index), 1.0);
    assert_eq!(relationships.property("max").unwrap().value_at(index), 3.0);
    for property in relationships.properties().values() {
        assert_eq!(property.element_count(), topology.element_count());
    }
}

#[test]
fn exact_capacity_batch_flushes_once_without_overflow() {
    let config = NodesBuilderConfig::builder()
        .concurrency(Concurrency::single_threaded())
        .batch_size(128)
        .build();
    let builder = NodesBuilder::new(config).unwrap();

    for id in 0..128i64 {
        builder.add_node(id).unwrap();
    }
    // The full batch was flushed by the capacity check, not by build.
    assert_eq!(builder.counters().snapshot().nodes_imported, 128);

    let nodes = builder.build().unwrap();
    assert_eq!(nodes.id_map.node_count(), 128);
}

#[test]
fn pooled_provider_produces_the_same_graph() {
    let config = NodesBuilderConfig::builder()
        .concurrency(Concurrency::new(4))
        .use_pooled_builder_provider(true)
        .build();
    let builder = Arc::new(NodesBuilder::new(config).unwrap());

    std::thread::scope(|scope| {
        for worker in 0..4i64 {
            let builder = Arc::clone(&builder);
            scope.spawn(move || {
                for i in 0..250i64 {
                    builder.add_node(worker * 250 + i).unwrap();
                }
            });
        }
    });

    let builder = Arc::into_inner(builder).unwrap();
    let nodes = builder.build().unwrap();
    assert_eq!(nodes.id_map.node_count(), 1000);
}
