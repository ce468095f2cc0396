// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use understory_tree_patch::{
    DepthFirstSearch, Fragment, PatchNode, PendingUpdates, find_affected_nodes, patch_root,
};

#[derive(Debug)]
struct Node {
    id: u32,
    props: u32,
    children: Vec<Arc<Node>>,
}

impl PatchNode for Node {
    type Family = u32;
    type RawProps = u32;
    type Props = u32;

    fn family(&self) -> u32 {
        self.id
    }

    fn children(&self) -> &[Arc<Self>] {
        &self.children
    }

    fn clone_props(&self, raw: Option<&u32>) -> u32 {
        raw.copied().unwrap_or_default()
    }

    fn clone_with(&self, fragment: Fragment<Self>) -> Self {
        Self {
            id: self.id,
            props: fragment.props.unwrap_or(self.props),
            children: fragment.children.unwrap_or_else(|| self.children.clone()),
        }
    }
}

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }
}

/// Complete tree with `fanout` children per node, ids assigned depth first.
fn build_tree(depth: u32, fanout: u32) -> (Arc<Node>, u32) {
    fn build(next: &mut u32, depth: u32, fanout: u32) -> Arc<Node> {
        let id = *next;
        *next += 1;
        let children = if depth == 0 {
            Vec::new()
        } else {
            (0..fanout).map(|_| build(next, depth - 1, fanout)).collect()
        };
        Arc::new(Node {
            id,
            props: 0,
            children,
        })
    }

    let mut next = 0;
    let root = build(&mut next, depth, fanout);
    (root, next)
}

fn random_updates(count: u32, nodes: u32, seed: u64) -> PendingUpdates<u32, u32> {
    let mut rng = Lcg(seed);
    (0..count)
        .map(|i| (rng.next_u32() % nodes, Some(i)))
        .collect()
}

fn bench_tree_patch(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_tree_patch");
    group.sample_size(50);

    for &(depth, fanout) in &[(6_u32, 4_u32), (10_u32, 2_u32)] {
        let (root, nodes) = build_tree(depth, fanout);

        for &count in &[1_u32, 16, 256] {
            let updates = random_updates(count, nodes, 0x7EE5_0000_0000_0001);

            group.bench_function(
                format!("find_affected(d={depth},f={fanout},n={count})"),
                |b| {
                    b.iter(|| {
                        black_box(find_affected_nodes(
                            &*root,
                            black_box(&updates),
                            &DepthFirstSearch,
                        ))
                    });
                },
            );

            group.bench_function(format!("patch_root(d={depth},f={fanout},n={count})"), |b| {
                b.iter_batched(
                    || updates.clone(),
                    |updates| black_box(patch_root(&*root, &updates, &DepthFirstSearch)),
                    BatchSize::SmallInput,
                );
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_tree_patch);
criterion_main!(benches);
