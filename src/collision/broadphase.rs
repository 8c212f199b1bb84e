use std::collections::{HashMap, HashSet};

use glam::{DVec3, IVec3};

use crate::{
    core::{body::Body, types::PeriodicCell},
    utils::allocator::{Arena, BodyId},
};

/// Two spheres whose interaction ranges overlap, with the periodic image of
/// `body2` that does the overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidatePair {
    pub body1: BodyId,
    pub body2: BodyId,
    pub cell_dist: IVec3,
}

/// Uniform grid spatial partitioning used by the broad-phase.
pub struct SpatialGrid {
    cell_size: f64,
    grid: HashMap<IVec3, Vec<BodyId>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            grid: HashMap::new(),
        }
    }

    fn world_to_grid(&self, pos: DVec3) -> IVec3 {
        (pos / self.cell_size).floor().as_ivec3()
    }

    pub fn clear(&mut self) {
        self.grid.clear();
    }

    /// Empties the grid and switches it to a new cell size.
    pub fn reset(&mut self, cell_size: f64) {
        self.grid.clear();
        self.cell_size = cell_size;
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of non-empty cells.
    pub fn occupied_cells(&self) -> usize {
        self.grid.len()
    }

    pub fn insert(&mut self, id: BodyId, position: DVec3, reach: f64) {
        let min_cell = self.world_to_grid(position - DVec3::splat(reach));
        let max_cell = self.world_to_grid(position + DVec3::splat(reach));

        for x in min_cell.x..=max_cell.x {
            for y in min_cell.y..=max_cell.y {
                for z in min_cell.z..=max_cell.z {
                    self.grid.entry(IVec3::new(x, y, z)).or_default().push(id);
                }
            }
        }
    }

    pub fn query(&self, position: DVec3, reach: f64) -> Vec<BodyId> {
        let mut results = Vec::new();
        let min_cell = self.world_to_grid(position - DVec3::splat(reach));
        let max_cell = self.world_to_grid(position + DVec3::splat(reach));

        for x in min_cell.x..=max_cell.x {
            for y in min_cell.y..=max_cell.y {
                for z in min_cell.z..=max_cell.z {
                    if let Some(ids) = self.grid.get(&IVec3::new(x, y, z)) {
                        results.extend(ids);
                    }
                }
            }
        }

        results.sort();
        results.dedup();
        results
    }
}

/// Broad phase driver returning sphere pairs close enough to interact.
///
/// The configured cell size is a lower bound: each pass widens the cells to
/// the largest interaction diameter present, so a sphere never spans more
/// than two cells per axis whatever its radius.
pub struct BroadPhase {
    cell_size: f64,
    grid: SpatialGrid,
}

impl BroadPhase {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            grid: SpatialGrid::new(cell_size),
        }
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Interaction reach of one sphere: two spheres get a pair once their
    /// surface separation drops below `cutoff_factor` times their mean radius,
    /// which is exactly when their reach balls overlap.
    pub fn reach(radius: f64, cutoff_factor: f64) -> f64 {
        radius * (1.0 + 0.5 * cutoff_factor)
    }

    /// Candidate pairs sorted by id, each listed once with `body1 < body2`.
    pub fn candidate_pairs(
        &mut self,
        bodies: &Arena<Body>,
        cell: Option<&PeriodicCell>,
        cutoff_factor: f64,
    ) -> Vec<CandidatePair> {
        let mut pairs = match cell {
            Some(cell) => Self::periodic_pairs(bodies, cell, cutoff_factor),
            None => self.grid_pairs(bodies, cutoff_factor),
        };
        pairs.sort_by_key(|pair| (pair.body1, pair.body2, pair.cell_dist.to_array()));
        pairs
    }

    fn grid_pairs(&mut self, bodies: &Arena<Body>, cutoff_factor: f64) -> Vec<CandidatePair> {
        let max_reach = bodies
            .values()
            .filter_map(Body::radius)
            .map(|radius| Self::reach(radius, cutoff_factor))
            .fold(0.0, f64::max);
        let cell_size = if self.cell_size > 0.0 && self.cell_size.is_finite() {
            self.cell_size.max(2.0 * max_reach)
        } else {
            2.0 * max_reach
        };
        if !(cell_size > 0.0) {
            return Vec::new();
        }
        self.grid.reset(cell_size);

        for (id, body) in bodies.iter() {
            if let Some(radius) = body.radius() {
                self.grid
                    .insert(id, body.position, Self::reach(radius, cutoff_factor));
            }
        }

        let mut pairs = Vec::new();
        let mut checked = HashSet::new();

        for (id, body) in bodies.iter() {
            let Some(radius) = body.radius() else {
                continue;
            };
            let reach = Self::reach(radius, cutoff_factor);

            for other_id in self.grid.query(body.position, reach) {
                if other_id == id {
                    continue;
                }
                let pair_key = if id < other_id {
                    (id, other_id)
                } else {
                    (other_id, id)
                };
                if !checked.insert(pair_key) {
                    continue;
                }
                let Some(other) = bodies.get(other_id) else {
                    continue;
                };
                let Some(other_radius) = other.radius() else {
                    continue;
                };
                let limit = reach + Self::reach(other_radius, cutoff_factor);
                if body.position.distance_squared(other.position) < limit * limit {
                    pairs.push(CandidatePair {
                        body1: pair_key.0,
                        body2: pair_key.1,
                        cell_dist: IVec3::ZERO,
                    });
                }
            }
        }

        pairs
    }

    /// Minimum-image search over every sphere pair. Quadratic in the number
    /// of spheres, which stays cheap for the cell sizes the stress averaging
    /// is used with.
    fn periodic_pairs(
        bodies: &Arena<Body>,
        cell: &PeriodicCell,
        cutoff_factor: f64,
    ) -> Vec<CandidatePair> {
        let spheres: Vec<(BodyId, &Body, f64)> = bodies
            .iter()
            .filter_map(|(id, body)| body.radius().map(|radius| (id, body, radius)))
            .collect();

        let mut pairs = Vec::new();
        for (i, &(id1, body1, radius1)) in spheres.iter().enumerate() {
            for &(id2, body2, radius2) in &spheres[i + 1..] {
                let branch = body2.position - body1.position;
                let cell_dist = cell.nearest_image(branch);
                let limit =
                    Self::reach(radius1, cutoff_factor) + Self::reach(radius2, cutoff_factor);
                if (branch + cell.shift(cell_dist)).length_squared() < limit * limit {
                    pairs.push(CandidatePair {
                        body1: id1,
                        body2: id2,
                        cell_dist,
                    });
                }
            }
        }
        pairs
    }
}
