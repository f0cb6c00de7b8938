//! Performance benchmarks for route discovery and full mapping passes.
//!
//! Run with: `cargo bench --bench discovery`
//!
//! ## Performance Targets
//!
//! | Operation | Target | Notes |
//! |-----------|--------|-------|
//! | Discovery, 32 members | <100µs | Schema scan, no instance reads |
//! | Full pass, 32 members | <500µs | Discovery + buffering + operate |
//! | Nested pass, depth 8 | <2ms | Recursive re-entry per level |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use remap_kernel::{
    ClassCanonicalizer, ClassId, ClassIntrospector, ClassRegistry, ClassSchema, Instance, Map,
    ObjectMapper, PropertySchema, Source, Target, TypeRef, Value,
};

/// Register a flat Src/Tgt class pair with `members` same-named
/// properties.
fn flat_registry(members: usize) -> Arc<ClassRegistry> {
    let registry = ClassRegistry::new();
    let mut src = ClassSchema::new("Src");
    let mut tgt = ClassSchema::new("Tgt");
    for i in 0..members {
        src = src.with_property(PropertySchema::new(format!("m{i:02}"), TypeRef::Int));
        tgt = tgt.with_property(PropertySchema::new(format!("m{i:02}"), TypeRef::Int));
    }
    registry.register(src).unwrap();
    registry.register(tgt).unwrap();
    Arc::new(registry)
}

fn flat_instance(registry: &ClassRegistry, members: usize) -> Instance {
    let mut instance =
        Instance::default_of(&registry.describe(&ClassId::new("Src")).unwrap());
    for i in 0..members {
        instance = instance.with(format!("m{i:02}"), i as i64);
    }
    instance
}

/// Register a Node/NodeDto chain where each level nests the next.
fn nested_registry(depth: usize) -> Arc<ClassRegistry> {
    let registry = ClassRegistry::new();
    for level in 0..=depth {
        let mut node = ClassSchema::new(format!("Node{level}"))
            .with_property(PropertySchema::new("v", TypeRef::Int));
        let mut dto = ClassSchema::new(format!("NodeDto{level}"))
            .with_property(PropertySchema::new("v", TypeRef::Int));
        if level < depth {
            node = node.with_property(PropertySchema::new(
                "next",
                TypeRef::Object(ClassId::new(format!("Node{}", level + 1))),
            ));
            dto = dto.with_property(PropertySchema::new(
                "next",
                TypeRef::Object(ClassId::new(format!("NodeDto{}", level + 1))),
            ));
        }
        registry.register(node).unwrap();
        registry.register(dto).unwrap();
    }
    Arc::new(registry)
}

fn nested_instance(registry: &ClassRegistry, depth: usize) -> Instance {
    let mut current = Instance::default_of(
        &registry
            .describe(&ClassId::new(format!("Node{depth}")))
            .unwrap(),
    )
    .with("v", depth as i64);
    for level in (0..depth).rev() {
        current = Instance::default_of(
            &registry
                .describe(&ClassId::new(format!("Node{level}")))
                .unwrap(),
        )
        .with("v", level as i64)
        .with("next", Value::Object(current));
    }
    current
}

fn bench_discovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("discovery");
    for members in [4usize, 16, 32, 64] {
        let registry = flat_registry(members);
        let mapper = ObjectMapper::with_registry(Arc::clone(&registry));
        let map = Map::default_for(mapper.factory());
        let instance = flat_instance(&registry, members);
        let source =
            Source::new(registry.as_ref(), ClassCanonicalizer::new(), &instance).unwrap();
        let target = Target::for_class(
            registry.as_ref(),
            ClassCanonicalizer::new(),
            &ClassId::new("Tgt"),
        )
        .unwrap();

        group.throughput(Throughput::Elements(members as u64));
        group.bench_with_input(BenchmarkId::from_parameter(members), &members, |b, _| {
            b.iter(|| {
                let routes = map.routes_for(black_box(&source), black_box(&target)).unwrap();
                black_box(routes.len())
            })
        });
    }
    group.finish();
}

fn bench_full_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pass");
    for members in [4usize, 16, 32, 64] {
        let registry = flat_registry(members);
        let mapper = ObjectMapper::with_registry(Arc::clone(&registry));
        let instance = flat_instance(&registry, members);

        group.throughput(Throughput::Elements(members as u64));
        group.bench_with_input(BenchmarkId::from_parameter(members), &members, |b, _| {
            b.iter(|| {
                let mapped = mapper
                    .map_one(black_box(&instance), "Tgt", None)
                    .unwrap();
                black_box(mapped)
            })
        });
    }
    group.finish();
}

fn bench_nested_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_pass");
    for depth in [2usize, 4, 8] {
        let registry = nested_registry(depth);
        let mapper = ObjectMapper::with_registry(Arc::clone(&registry));
        let instance = nested_instance(&registry, depth);

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                let mapped = mapper
                    .map_one(black_box(&instance), "NodeDto0", None)
                    .unwrap();
                black_box(mapped)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_discovery, bench_full_pass, bench_nested_pass);
criterion_main!(benches);
