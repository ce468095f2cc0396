// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::Value;
use understory_style_registry::{
    Dependency, DependencySet, LinkTable, NodeLink, StyleSheet, StyleSheetId, StyleSheetKind,
    StyleUnit, Variants, build_dependency_map, style_sheets_to_refresh,
};

/// Units cycle through the runtime dependency kinds; every fourth is themed.
fn build_units(count: usize) -> Vec<Arc<StyleUnit>> {
    (0..count)
        .map(|i| {
            let mut deps = DependencySet::empty();
            if i % 4 == 0 {
                deps.insert(Dependency::Theme);
            }
            let runtime = Dependency::ALL[5 + i % 11];
            deps.insert(runtime);
            Arc::new(StyleUnit::new(
                format!("unit-{i}"),
                format!("key-{i}"),
                deps,
                Value::Null,
            ))
        })
        .collect()
}

fn build_links(nodes: u32, units: &[Arc<StyleUnit>], per_node: usize) -> LinkTable<u32> {
    let mut table = LinkTable::new();
    for node in 0..nodes {
        let start = node as usize * per_node;
        table.link(
            node,
            (0..per_node).map(|k| {
                let unit = &units[(start + k) % units.len()];
                Arc::new(NodeLink::new(Arc::clone(unit), node, Variants::new()))
            }),
        );
    }
    table
}

fn build_sheets(units: &[Arc<StyleUnit>], per_sheet: usize) -> Vec<Arc<StyleSheet>> {
    units
        .chunks(per_sheet)
        .enumerate()
        .map(|(i, chunk)| {
            let kind = match i % 3 {
                0 => StyleSheetKind::Static,
                1 => StyleSheetKind::Themable,
                _ => StyleSheetKind::ThemableWithMiniRuntime,
            };
            let sheet = StyleSheet::new(StyleSheetId(i as u32), kind, Value::Null);
            for unit in chunk {
                sheet.insert_unit(unit.style_key(), Arc::clone(unit));
            }
            Arc::new(sheet)
        })
        .collect()
}

fn bench_dependency_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_style_registry");
    group.sample_size(50);

    let units = build_units(512);
    let changes = [
        ("theme", Dependency::Theme.into_set()),
        ("insets", Dependency::Insets.into_set()),
        (
            "theme+dimensions",
            Dependency::Theme.into_set() | Dependency::Dimensions.into_set(),
        ),
    ];

    for &nodes in &[256_u32, 4_096_u32] {
        let table = build_links(nodes, &units, 3);
        for (name, changed) in changes {
            group.bench_function(format!("dependency_map(nodes={nodes},{name})"), |b| {
                b.iter(|| black_box(build_dependency_map(&table, black_box(changed))));
            });
        }
    }

    let sheets = build_sheets(&units, 8);
    for (name, changed) in changes {
        group.bench_function(format!("sheets_to_refresh({name})"), |b| {
            b.iter(|| black_box(style_sheets_to_refresh(&sheets, black_box(changed))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dependency_index);
criterion_main!(benches);
