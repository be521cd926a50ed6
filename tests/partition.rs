use mblur_bvh::accelerators::bvh::*;
use mblur_bvh::core::geometry::*;
use mblur_bvh::core::pbrt::*;
use mblur_bvh::core::scene::*;

fn root_record(pool: &PrimRefPool<'_>, buffer: BufferId, scene: &MotionScene) -> BuildRecordMB {
    let (_, pinfo) = scene.create_prim_refs();
    let set = SetMB::new(&pinfo, buffer, 0..pinfo.count, &Interval::default());
    assert_eq!(pool.ref_count(buffer), 1);
    return BuildRecordMB::new(set, 1);
}

fn flicker_scene(n: usize) -> MotionScene {
    let mut scene = MotionScene::new();
    let g = scene.add_geometry(4);
    let a = Bounds3f::from(((0.0, 0.0, 0.0), (1.0, 1.0, 1.0)));
    let b = Bounds3f::from(((0.0, 100.0, 0.0), (1.0, 101.0, 1.0)));
    scene.add_static_primitive(g, &a);
    for _ in 1..n {
        scene.add_primitive(g, vec![b, a, a, a, b]);
    }
    return scene;
}

#[test]
fn object_split_counts_add_up() {
    let scene = MotionScene::random(500, 1, 100.0, 0.0, 3);
    let callbacks = MBVHTreeCallbacks::new();
    let monitor = AtomicMemoryMonitor::new();
    let pool = PrimRefPool::new(&monitor);
    let builder = BVHBuilderMSMBlur::new(&pool, &scene, &callbacks, &Settings::default()).unwrap();

    let root = pool.insert(scene.create_prim_refs().0);
    let mut record = root_record(&pool, root.id(), &scene);
    record.split = builder.find(&record.prims);
    assert!(matches!(record.split.kind, SplitKind::Object { .. }));

    let (l, r, new_vector) = builder.partition(&record);
    assert!(new_vector.is_none());
    assert_eq!(l.size() + r.size(), record.size());
    assert_eq!(l.object_range.end, r.object_range.start);
    assert_eq!(l.time_range, record.prims.time_range);
    assert_eq!(r.time_range, record.prims.time_range);
    assert_eq!(l.buffer, root.id());
    assert_eq!(r.buffer, root.id());

    if let SplitKind::Object { dim, pos, mapping } = record.split.kind {
        pool.with_prims(l.buffer, &l.object_range, |prims| {
            assert!(prims.iter().all(|p| mapping.bin(&p.center2(), dim) < pos));
        });
        pool.with_prims(r.buffer, &r.object_range, |prims| {
            assert!(prims.iter().all(|p| mapping.bin(&p.center2(), dim) >= pos));
        });
    }
}

#[test]
fn fallback_split_halves_sorted_range() {
    let scene = MotionScene::random(101, 1, 100.0, 0.0, 5);
    let callbacks = MBVHTreeCallbacks::new();
    let monitor = AtomicMemoryMonitor::new();
    let pool = PrimRefPool::new(&monitor);
    let builder = BVHBuilderMSMBlur::new(&pool, &scene, &callbacks, &Settings::default()).unwrap();

    let mut prims = scene.create_prim_refs().0;
    prims.reverse();
    let root = pool.insert(prims);
    let mut record = root_record(&pool, root.id(), &scene);
    record.split = Split::fallback();

    let (l, r, new_vector) = builder.partition(&record);
    assert!(new_vector.is_none());
    assert_eq!(l.size(), 50);
    assert_eq!(r.size(), 51);
    assert_eq!(l.info.count + r.info.count, 101);
    pool.with_prims(root.id(), &(0..101), |prims| {
        assert!(prims.windows(2).all(|w| w[0].id() < w[1].id()));
    });
}

#[test]
fn temporal_split_meets_at_split_time() {
    let scene = flicker_scene(16);
    let callbacks = MBVHTreeCallbacks::new();
    let monitor = AtomicMemoryMonitor::new();
    let pool = PrimRefPool::new(&monitor);
    let builder = BVHBuilderMSMBlur::new(&pool, &scene, &callbacks, &Settings::default()).unwrap();

    let root = pool.insert(scene.create_prim_refs().0);
    let mut record = root_record(&pool, root.id(), &scene);
    record.split = builder.find(&record.prims);
    let time = match record.split.kind {
        SplitKind::Temporal { time } => time,
        kind => panic!("expected a temporal split, found {:?}", kind),
    };
    assert_eq!(time, 0.5);

    let (l, r, new_vector) = builder.partition(&record);
    let new_vector = new_vector.unwrap();
    assert_eq!(l.buffer, new_vector.id());
    assert_eq!(r.buffer, root.id());
    assert_eq!(l.size(), record.size());
    assert_eq!(r.size(), record.size());
    assert_eq!(l.time_range, Interval::new(0.0, time));
    assert_eq!(r.time_range, Interval::new(time, 1.0));
    assert_eq!(monitor.allocations(), 2);

    drop(new_vector);
    assert!(!pool.is_live(l.buffer));
    drop(root);
    assert_eq!(pool.live_buffers(), 0);
    assert_eq!(monitor.current(), 0);
}

#[test]
fn fallback_time_split_with_single_segment_leaves() {
    let scene = flicker_scene(4);
    let callbacks = MBVHTreeCallbacks::new();
    let monitor = AtomicMemoryMonitor::new();
    let pool = PrimRefPool::new(&monitor);
    let settings = Settings {
        single_leaf_time_segment: true,
        ..Default::default()
    };
    let builder = BVHBuilderMSMBlur::new(&pool, &scene, &callbacks, &settings).unwrap();

    let root = pool.insert(scene.create_prim_refs().0);
    let record = root_record(&pool, root.id(), &scene);
    let split = builder.find_fallback(&record);
    assert_eq!(split.kind, SplitKind::Temporal { time: 0.5 });
    assert_eq!(split.sah, 1.0);
    drop(root);
}

#[test]
fn large_leaf_builder_bounds_leaf_size() {
    let scene = MotionScene::random(300, 1, 100.0, 0.0, 9);
    let callbacks = MBVHTreeCallbacks::new();
    let monitor = AtomicMemoryMonitor::new();
    let pool = PrimRefPool::new(&monitor);
    let settings = Settings {
        branching_factor: 3,
        max_leaf_size: 5,
        ..Default::default()
    };
    let builder = BVHBuilderMSMBlur::new(&pool, &scene, &callbacks, &settings).unwrap();

    let root = pool.insert(scene.create_prim_refs().0);
    let record = root_record(&pool, root.id(), &scene);
    let mut alloc = callbacks.create_alloc();
    let built = builder.create_large_leaf(&record, &mut alloc).unwrap();

    let leaves = built.node.leaves();
    assert!(leaves.iter().all(|l| l.prims.len() <= 5));
    assert_eq!(built.node.primitive_count(), 300);
    assert!(built.node.children().len() <= 3);
    assert!(alloc.nodes > leaves.len());
    drop(root);
    assert_eq!(monitor.current(), 0);
}
