use crate::core::geometry::*;
use crate::core::pbrt::*;
use crate::core::primitive::*;
use crate::core::rng::RNG;

/// A geometry whose primitives are boxes keyframed at
/// `num_time_segments + 1` evenly spaced times over the shutter.
#[derive(Debug, Clone)]
pub struct MotionGeometry {
    pub num_time_segments: u32,
    pub keyframes: Vec<Vec<Bounds3f>>,
}

impl MotionGeometry {
    pub fn new(num_time_segments: u32) -> Self {
        assert!(num_time_segments >= 1);
        MotionGeometry {
            num_time_segments,
            keyframes: Vec::new(),
        }
    }

    pub fn linear_bounds(&self, prim_id: u32, time_range: &Interval) -> LBBox3f {
        let keys = &self.keyframes[prim_id as usize];
        return LBBox3f::from_keyframes(keys, time_range);
    }
}

/// Keyframed-box scene used by the tools and tests as the primitive bounds
/// provider.
#[derive(Debug, Clone, Default)]
pub struct MotionScene {
    pub geometries: Vec<MotionGeometry>,
}

impl MotionScene {
    pub fn new() -> Self {
        MotionScene {
            geometries: Vec::new(),
        }
    }

    pub fn add_geometry(&mut self, num_time_segments: u32) -> u32 {
        self.geometries.push(MotionGeometry::new(num_time_segments));
        return (self.geometries.len() - 1) as u32;
    }

    /// `keys` must hold one box per time step of the geometry.
    pub fn add_primitive(&mut self, geom_id: u32, keys: Vec<Bounds3f>) -> u32 {
        let geom = &mut self.geometries[geom_id as usize];
        assert_eq!(
            keys.len(),
            geom.num_time_segments as usize + 1,
            "primitive needs one keyframe per time step"
        );
        geom.keyframes.push(keys);
        return (geom.keyframes.len() - 1) as u32;
    }

    /// A primitive that does not move.
    pub fn add_static_primitive(&mut self, geom_id: u32, bounds: &Bounds3f) -> u32 {
        let steps = self.geometries[geom_id as usize].num_time_segments as usize + 1;
        return self.add_primitive(geom_id, vec![*bounds; steps]);
    }

    pub fn num_primitives(&self) -> usize {
        return self.geometries.iter().map(|g| g.keyframes.len()).sum();
    }

    /// References over the full shutter `[0, 1]`, in geometry order.
    pub fn create_prim_refs(&self) -> (Vec<PrimRefMB>, PrimInfoMB) {
        let full = Interval::new(0.0, 1.0);
        let mut prims = Vec::with_capacity(self.num_primitives());
        let mut pinfo = PrimInfoMB::empty();
        for (geom_id, geom) in self.geometries.iter().enumerate() {
            for prim_id in 0..geom.keyframes.len() {
                let lbounds = geom.linear_bounds(prim_id as u32, &full);
                let prim = PrimRefMB::new(
                    &lbounds,
                    geom.num_time_segments,
                    geom.num_time_segments,
                    geom_id as u32,
                    prim_id as u32,
                );
                pinfo.add_primref(&prim);
                prims.push(prim);
            }
        }
        return (prims, pinfo);
    }

    /// `count` small boxes scattered in `[-extent, extent]^3`, each drifting
    /// along a random walk of `num_time_segments` steps of length up to
    /// `motion`.
    pub fn random(
        count: usize,
        num_time_segments: u32,
        extent: Float,
        motion: Float,
        seed: u64,
    ) -> Self {
        let mut rng = RNG::new_sequence(seed);
        let mut scene = MotionScene::new();
        let geom_id = scene.add_geometry(num_time_segments);
        for _ in 0..count {
            let mut p = rng.uniform_point(-extent, extent);
            let size = rng.uniform_range(0.01, 0.1) * extent;
            let mut keys = Vec::with_capacity(num_time_segments as usize + 1);
            for _ in 0..=num_time_segments {
                keys.push(Bounds3f::new(&p, &(p + Vector3f::splat(size))));
                p = p + rng.uniform_point(-motion, motion);
            }
            scene.add_primitive(geom_id, keys);
        }
        return scene;
    }
}

impl RecalculatePrimRef for MotionScene {
    fn recalculate(&self, prim: &PrimRefMB, time_range: &Interval) -> PrimRefMB {
        let geom = &self.geometries[prim.geom_id as usize];
        let lbounds = geom.linear_bounds(prim.prim_id, time_range);
        let tbounds = time_segment_range(time_range, geom.num_time_segments as Float);
        return PrimRefMB::new(
            &lbounds,
            tbounds.len() as u32,
            geom.num_time_segments,
            prim.geom_id,
            prim.prim_id,
        );
    }

    fn linear_bounds(&self, prim: &PrimRefMB, time_range: &Interval) -> LBBox3f {
        let geom = &self.geometries[prim.geom_id as usize];
        return geom.linear_bounds(prim.prim_id, time_range);
    }
}
