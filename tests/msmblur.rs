use mblur_bvh::accelerators::bvh::*;
use mblur_bvh::core::error::*;
use mblur_bvh::core::geometry::*;
use mblur_bvh::core::misc::*;
use mblur_bvh::core::pbrt::*;
use mblur_bvh::core::primitive::*;
use mblur_bvh::core::rng::*;
use mblur_bvh::core::scene::*;

use std::collections::BTreeMap;

struct Built {
    root: MBVHChild,
    callbacks: MBVHTreeCallbacks,
    monitor: AtomicMemoryMonitor,
}

fn build(scene: &MotionScene, settings: &Settings) -> Result<Built, BuildError> {
    let (prims, pinfo) = scene.create_prim_refs();
    let callbacks = MBVHTreeCallbacks::new();
    let monitor = AtomicMemoryMonitor::new();
    let root = build_msmblur(prims, &pinfo, &monitor, scene, &callbacks, settings)?;
    return Ok(Built {
        root,
        callbacks,
        monitor,
    });
}

fn unit_box(x: Float, y: Float, z: Float) -> Bounds3f {
    Bounds3f::from(((x, y, z), (x + 1.0, y + 1.0, z + 1.0)))
}

/// Every interior node together with the record its parent stored for it.
fn all_records(root: &MBVHChild) -> Vec<&MBVHChild> {
    let mut out = vec![root];
    let mut i = 0;
    while i < out.len() {
        let children = out[i].node.children();
        out.extend(children);
        i += 1;
    }
    return out;
}

/// Bounds of the primitives below `record` over its time range, evaluated
/// from the scene.
fn true_bounds(scene: &MotionScene, record: &MBVHChild) -> LBBox3f {
    let mut prims = BTreeMap::new();
    for leaf in record.node.leaves() {
        for prim in leaf.prims.iter() {
            prims.insert(prim.id(), *prim);
        }
    }
    let mut lbounds = LBBox3f::empty();
    for prim in prims.values() {
        lbounds.extend(&scene.linear_bounds(prim, &record.dt));
    }
    return lbounds;
}

#[test]
fn covers_every_input_primitive() {
    let scene = MotionScene::random(3000, 4, 100.0, 5.0, 7);
    let settings = Settings::default();
    let built = build(&scene, &settings).unwrap();

    let ids = built.root.node.distinct_primitives();
    assert_eq!(ids.len(), 3000);
    assert_eq!(ids.iter().next(), Some(&(0, 0)));
    assert_eq!(ids.iter().last(), Some(&(0, 2999)));
    assert_eq!(built.root.dt, Interval::new(0.0, 1.0));
    assert_eq!(built.monitor.current(), 0);
}

#[test]
fn static_scene_keeps_each_primitive_once() {
    let scene = MotionScene::random(2000, 1, 100.0, 0.0, 3);
    let built = build(&scene, &Settings::default()).unwrap();
    assert_eq!(built.root.node.primitive_count(), 2000);
    assert_eq!(built.root.node.time_split_count(), 0);
    assert_eq!(built.monitor.allocations(), 1);
}

#[test]
fn leaves_respect_max_leaf_size() {
    let scene = MotionScene::random(2500, 2, 50.0, 4.0, 11);
    for max_leaf_size in [1, 3, 8] {
        let settings = Settings {
            max_leaf_size,
            ..Default::default()
        };
        let built = build(&scene, &settings).unwrap();
        for leaf in built.root.node.leaves() {
            assert!(!leaf.prims.is_empty());
            assert!(leaf.prims.len() <= max_leaf_size);
        }
    }
}

#[test]
fn min_leaf_above_max_leaf_still_bounds_leaves() {
    let scene = MotionScene::random(500, 1, 50.0, 0.0, 5);
    let settings = Settings {
        min_leaf_size: 16,
        max_leaf_size: 4,
        ..Default::default()
    };
    let built = build(&scene, &settings).unwrap();
    assert!(built.root.node.leaves().iter().all(|l| l.prims.len() <= 4));
    assert_eq!(built.root.node.distinct_primitives().len(), 500);
}

#[test]
fn single_leaf_time_segment() {
    let scene = MotionScene::random(1000, 4, 50.0, 10.0, 13);
    let settings = Settings {
        single_leaf_time_segment: true,
        ..Default::default()
    };
    let built = build(&scene, &settings).unwrap();
    let leaves = built.root.node.leaves();
    assert!(!leaves.is_empty());
    for leaf in leaves {
        for prim in leaf.prims.iter() {
            let itime_range =
                time_segment_range(&leaf.time_range, prim.total_time_segments as Float);
            assert_eq!(itime_range.len(), 1);
            assert_eq!(prim.active_time_segments, 1);
        }
    }
    assert_eq!(built.root.node.distinct_primitives().len(), 1000);
    assert!(built.root.node.time_split_count() > 0);
    assert_eq!(built.monitor.current(), 0);
}

#[test]
fn identical_builds_partition_identically() {
    let scene = MotionScene::random(4000, 3, 100.0, 8.0, 17);
    let settings = Settings {
        branching_factor: 4,
        ..Default::default()
    };
    let a = build(&scene, &settings).unwrap();
    let b = build(&scene, &settings).unwrap();
    assert_eq!(a.root.node.leaf_signature(), b.root.node.leaf_signature());
    assert_eq!(a.root.lbounds, b.root.lbounds);
    assert_eq!(a.root.node.summary(), b.root.node.summary());
}

#[test]
fn two_overlapping_primitives_make_one_leaf() {
    let mut scene = MotionScene::new();
    let g = scene.add_geometry(1);
    scene.add_static_primitive(g, &unit_box(0.0, 0.0, 0.0));
    scene.add_static_primitive(g, &unit_box(0.5, 0.0, 0.0));

    let built = build(&scene, &Settings::default()).unwrap();
    assert!(built.root.node.is_leaf());
    let leaves = built.root.node.leaves();
    assert_eq!(leaves.len(), 1);
    assert_eq!(leaves[0].prims.len(), 2);
    assert_eq!(leaves[0].prims[0].prim_id, 0);
    assert_eq!(leaves[0].prims[1].prim_id, 1);
    assert_eq!(built.callbacks.alloc_count(), 1);
    assert_eq!(built.root.lbounds.bounds(), Bounds3f::from(((0.0, 0.0, 0.0), (1.5, 1.0, 1.0))));
}

#[test]
fn two_clusters_split_at_root() {
    let mut rng = RNG::new_sequence(23);
    let mut scene = MotionScene::new();
    let g = scene.add_geometry(1);
    for i in 0..1000 {
        let offset = if i % 2 == 0 { 0.0 } else { 1000.0 };
        let p = rng.uniform_point(0.0, 10.0);
        scene.add_static_primitive(g, &unit_box(p.x + offset, p.y, p.z));
    }

    let built = build(&scene, &Settings::default()).unwrap();
    let children = built.root.node.children();
    assert_eq!(children.len(), 2);

    let mut union = LBBox3f::empty();
    let mut count = 0;
    for child in children.iter() {
        union.extend(&child.lbounds);
        let ids = child.node.distinct_primitives();
        count += ids.len();
        assert_eq!(ids.len(), 500);
        let bounds = child.lbounds.bounds();
        assert!(bounds.max.x < 500.0 || bounds.min.x > 500.0);
    }
    assert_eq!(count, 1000);
    assert_eq!(union, built.root.lbounds);
}

/// Four time segments. Primitive 0 sits still for the whole shutter; the
/// others are far away at the ends of the shutter and stacked on it in
/// between.
fn flicker_scene(n: usize) -> MotionScene {
    let mut scene = MotionScene::new();
    let g = scene.add_geometry(4);
    let a = unit_box(0.0, 0.0, 0.0);
    let b = unit_box(0.0, 100.0, 0.0);
    scene.add_static_primitive(g, &a);
    for _ in 1..n {
        scene.add_primitive(g, vec![b, a, a, a, b]);
    }
    return scene;
}

#[test]
fn time_split_nodes_recompute_bounds() {
    let scene = flicker_scene(16);
    let built = build(&scene, &Settings::default()).unwrap();

    assert!(built.root.node.has_time_splits());
    let children = built.root.node.children();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].dt, Interval::new(0.0, 0.5));
    assert_eq!(children[1].dt, Interval::new(0.5, 1.0));

    let mut checked = 0;
    for record in all_records(&built.root) {
        if record.node.has_time_splits() {
            assert_eq!(record.lbounds, true_bounds(&scene, record));
            checked += 1;
        }
    }
    assert!(checked >= 1);

    // every primitive is in both halves of the shutter
    assert_eq!(children[0].node.distinct_primitives().len(), 16);
    assert_eq!(children[1].node.distinct_primitives().len(), 16);
    assert!(built.monitor.allocations() > 1);
    assert_eq!(built.monitor.current(), 0);
}

#[test]
fn parallel_and_sequential_builds_match() {
    let scene = MotionScene::random(6000, 2, 100.0, 6.0, 29);
    let parallel = Settings {
        single_thread_threshold: 256,
        ..Default::default()
    };
    let sequential = Settings {
        single_thread_threshold: usize::MAX,
        ..Default::default()
    };
    let p = build(&scene, &parallel).unwrap();
    let s = build(&scene, &sequential).unwrap();

    assert_eq!(p.root.node.leaf_signature(), s.root.node.leaf_signature());
    assert_eq!(p.root.node.summary(), s.root.node.summary());
    assert_eq!(p.root.lbounds, s.root.lbounds);
    assert!(p.callbacks.alloc_count() > 1);
    assert_eq!(s.callbacks.alloc_count(), 1);
    assert_eq!(p.monitor.current(), 0);
}

#[test]
fn branching_factor_bounds_children() {
    let scene = MotionScene::random(3000, 1, 100.0, 0.0, 31);
    let settings = Settings {
        branching_factor: 4,
        ..Default::default()
    };
    let built = build(&scene, &settings).unwrap();
    assert_eq!(built.root.node.children().len(), 4);
    for record in all_records(&built.root) {
        assert!(record.node.children().len() <= 4);
    }
}

#[test]
fn branching_factor_above_eight_is_rejected() {
    let scene = MotionScene::random(10, 1, 10.0, 0.0, 1);
    let settings = Settings {
        branching_factor: 9,
        ..Default::default()
    };
    match build(&scene, &settings) {
        Err(BuildError::BranchingFactor { requested, max }) => {
            assert_eq!(requested, 9);
            assert_eq!(max, 8);
        }
        _ => panic!("expected a branching factor error"),
    }
}

#[test]
fn depth_limit_is_fatal() {
    let scene = MotionScene::random(1000, 1, 100.0, 0.0, 37);
    let settings = Settings {
        max_depth: 2,
        max_leaf_size: 1,
        ..Default::default()
    };
    let (prims, pinfo) = scene.create_prim_refs();
    let callbacks = MBVHTreeCallbacks::new();
    let monitor = AtomicMemoryMonitor::new();
    let e = build_msmblur(prims, &pinfo, &monitor, &scene, &callbacks, &settings).unwrap_err();
    assert!(matches!(e, BuildError::DepthLimit { max_depth: 2, .. }));
    assert_eq!(monitor.current(), 0);
}

#[test]
fn cancelled_build_releases_buffers() {
    let scene = flicker_scene(64);
    let (prims, pinfo) = scene.create_prim_refs();
    let callbacks = MBVHTreeCallbacks::new();
    callbacks.cancel();
    let monitor = AtomicMemoryMonitor::new();
    let e = build_msmblur(
        prims,
        &pinfo,
        &monitor,
        &scene,
        &callbacks,
        &Settings::default(),
    )
    .unwrap_err();
    assert!(matches!(e, BuildError::Cancelled(_)));
    assert_eq!(monitor.current(), 0);
}

#[test]
fn progress_counts_every_primitive_once() {
    let scene = MotionScene::random(2000, 1, 100.0, 0.0, 11);
    let (prims, pinfo) = scene.create_prim_refs();
    let callbacks = MBVHTreeCallbacks::with_progress(ProgressReporter::hidden(prims.len()));
    let monitor = AtomicMemoryMonitor::new();
    let settings = Settings {
        single_thread_threshold: 128,
        ..Default::default()
    };
    build_msmblur(prims, &pinfo, &monitor, &scene, &callbacks, &settings).unwrap();
    let progress = callbacks.progress().unwrap();
    assert_eq!(progress.position(), 2000);
}

#[test]
fn empty_input_builds_an_empty_leaf() {
    let scene = MotionScene::new();
    let built = build(&scene, &Settings::default()).unwrap();
    assert!(built.root.node.is_leaf());
    assert_eq!(built.root.node.primitive_count(), 0);
    assert!(built.root.lbounds.is_empty());
}

#[test]
fn settings_file_drives_the_build() {
    use std::io::Write;
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, r#"{{ "branching_factor": 8, "max_leaf_size": 2 }}"#).unwrap();
    let settings = Settings::from_json_file(f.path()).unwrap();

    let scene = MotionScene::random(800, 1, 100.0, 0.0, 41);
    let built = build(&scene, &settings).unwrap();
    assert_eq!(built.root.node.children().len(), 8);
    assert!(built.root.node.leaves().iter().all(|l| l.prims.len() <= 2));
}
