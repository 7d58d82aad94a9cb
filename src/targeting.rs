// Targeting state machine for computer opponents.
// Search strategies pick cells while nothing is known; hunt mode takes over
// after a hit and walks the line of a ship until it sinks.

use alloc::collections::{BTreeMap, BTreeSet, VecDeque};
use alloc::vec::Vec;

use log::debug;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::combat::ShotResult;
use crate::common::{Outcome, TargetingDefect};
use crate::coord::{Axis, Coord};
use crate::ship::ShipId;

/// Search behaviour used while no hunt is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    /// Uniform choice among legal targets, no memory at all.
    Random,
    /// Sample cells with `(row + col) % spacing == 0` before anything else.
    /// A spacing no larger than the shortest ship leaves it nowhere to hide.
    SparseGrid { spacing: usize },
    /// Lattice of cells `coarse` apart in both directions, aligned on the
    /// board centre and taken from the centre outward; then a checkerboard
    /// backfill, then random cleanup.
    Radial { coarse: usize },
    /// Probability density over the remaining enemy ship lengths.
    Density,
}

impl Strategy {
    pub fn checkerboard() -> Self {
        Strategy::SparseGrid { spacing: 2 }
    }

    /// Sparse grid sized for the shortest ship still to be found.
    pub fn sparse_for(min_length: usize) -> Self {
        Strategy::SparseGrid {
            spacing: min_length.max(1),
        }
    }

    pub fn radial() -> Self {
        Strategy::Radial { coarse: 3 }
    }
}

/// Where the search strategy currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Random,
    Coarse,
    Fine,
    Cleanup,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitMeta {
    /// Ships reported damaged by the shot.
    pub ships: Vec<ShipId>,
    /// No live segment remained at the cell after the shot.
    pub fully_destroyed: bool,
}

/// Everything the hunter remembers between shots.
#[derive(Debug, Clone, Default)]
pub struct HuntMemory {
    hits: BTreeMap<Coord, HitMeta>,
    queue: VecDeque<(u32, Coord)>,
    axis: Option<Axis>,
    generation: u32,
    cluster_seeds: Vec<Coord>,
}

impl HuntMemory {
    pub fn hits(&self) -> &BTreeMap<Coord, HitMeta> {
        &self.hits
    }

    pub fn queued(&self) -> impl Iterator<Item = Coord> + '_ {
        self.queue.iter().map(|&(_, c)| c)
    }

    pub fn axis(&self) -> Option<Axis> {
        self.axis
    }

    pub fn is_hunting(&self) -> bool {
        !self.hits.is_empty() || !self.queue.is_empty()
    }

    fn enqueue_batch(&mut self, cells: impl IntoIterator<Item = Coord>) {
        self.generation += 1;
        let gen = self.generation;
        for c in cells {
            if !self.hits.contains_key(&c) && !self.queue.iter().any(|&(_, q)| q == c) {
                self.queue.push_back((gen, c));
            }
        }
    }

    fn dequeue(&mut self, c: Coord) {
        self.queue.retain(|&(_, q)| q != c);
    }
}

/// Chooses one coordinate per turn and learns from the results.
pub struct TargetingMachine {
    strategy: Strategy,
    phase: SearchPhase,
    memory: HuntMemory,
    clustering: Option<f64>,
    remaining_lengths: Vec<usize>,
    rows: usize,
    cols: usize,
}

/// Weight multiplier per observed hit covered by a candidate placement.
const HIT_BIAS: f64 = 10.0;
/// Sampling temperature for the density strategy; lower is greedier.
const DENSITY_TEMPERATURE: f64 = 0.5;

impl TargetingMachine {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            phase: initial_phase(strategy),
            memory: HuntMemory::default(),
            clustering: None,
            remaining_lengths: Vec::new(),
            rows: 0,
            cols: 0,
        }
    }

    /// After each sink, enqueue cells just beyond the wreck's perimeter with
    /// probability `chance` each. A NaN chance leaves clustering off.
    pub fn with_clustering(mut self, chance: f64) -> Self {
        self.clustering = if chance.is_nan() {
            None
        } else {
            Some(chance.clamp(0.0, 1.0))
        };
        self
    }

    pub fn clustering(&self) -> Option<f64> {
        self.clustering
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn memory(&self) -> &HuntMemory {
        &self.memory
    }

    pub fn set_enemy_lengths(&mut self, lengths: &[usize]) {
        self.remaining_lengths = lengths.to_vec();
    }

    pub fn remaining_lengths(&self) -> &[usize] {
        &self.remaining_lengths
    }

    pub fn reset(&mut self) {
        self.memory = HuntMemory::default();
        self.phase = initial_phase(self.strategy);
        self.remaining_lengths.clear();
    }

    /// Pick the next target from `legal` on a `rows`×`cols` board.
    pub fn select_target(
        &mut self,
        rng: &mut SmallRng,
        legal: &[Coord],
        rows: usize,
        cols: usize,
    ) -> Option<Coord> {
        self.rows = rows;
        self.cols = cols;
        if legal.is_empty() {
            return None;
        }
        if self.strategy != Strategy::Random {
            let legal_set: BTreeSet<Coord> = legal.iter().copied().collect();
            self.seed_clusters(rng);
            if let Some(c) = self.hunt_candidate(rng, &legal_set) {
                debug!("hunt target {} (axis {:?})", c, self.memory.axis);
                return Some(c);
            }
        }
        self.search(rng, legal)
    }

    /// Update hunt memory from the result of a shot at `coord`.
    pub fn observe_result(&mut self, coord: Coord, result: &ShotResult) -> Result<(), TargetingDefect> {
        self.memory.dequeue(coord);
        match result.outcome {
            Outcome::Invalid | Outcome::AllDestroyed => {
                return Err(TargetingDefect {
                    coord,
                    outcome: result.outcome,
                })
            }
            Outcome::Miss => {}
            Outcome::Hit | Outcome::Destroyed => {
                for sunk in &result.sunk {
                    if let Some(pos) = self.remaining_lengths.iter().position(|&l| l == sunk.length) {
                        self.remaining_lengths.swap_remove(pos);
                    }
                }
                if self.strategy == Strategy::Random {
                    return Ok(());
                }
                self.record_hit(coord, result);
                if !result.sunk.is_empty() {
                    self.settle_sinks(result);
                }
            }
        }
        Ok(())
    }

    fn record_hit(&mut self, coord: Coord, result: &ShotResult) {
        let first = self.memory.hits.is_empty();
        let meta = HitMeta {
            ships: result.ships.iter().map(|s| s.ship_id).collect(),
            fully_destroyed: result.cell_fully_destroyed,
        };
        self.memory.hits.insert(coord, meta);

        if self.memory.axis.is_some() {
            return;
        }
        let neighbors = coord.neighbors(self.rows, self.cols);
        if first {
            self.memory.enqueue_batch(neighbors);
            return;
        }
        let aligned = self
            .memory
            .hits
            .keys()
            .find_map(|&other| coord.shared_axis(other));
        match aligned {
            Some(axis) => {
                debug!("hunt axis locked: {:?}", axis);
                self.memory.axis = Some(axis);
                self.memory.queue.retain(|&(_, c)| axis.contains(c));
            }
            None => self.memory.enqueue_batch(neighbors),
        }
    }

    /// Drop hits whose every ship has now sunk; keep hunting whatever is left.
    fn settle_sinks(&mut self, result: &ShotResult) {
        let sunk: BTreeSet<ShipId> = result.sunk.iter().map(|s| s.ship_id).collect();
        let wrecked: Vec<Coord> = self
            .memory
            .hits
            .iter()
            .filter(|(_, m)| !m.ships.is_empty() && m.ships.iter().all(|id| sunk.contains(id)))
            .map(|(&c, _)| c)
            .collect();
        for c in &wrecked {
            self.memory.hits.remove(c);
        }
        self.memory.axis = None;
        self.memory.queue.clear();

        if self.memory.hits.is_empty() {
            debug!("hunt complete; resuming {:?} search", self.strategy);
        } else {
            let leftovers: Vec<Coord> = self
                .memory
                .hits
                .keys()
                .flat_map(|c| c.neighbors(self.rows, self.cols))
                .collect();
            debug!("{} unexplained hits remain; continuing hunt", self.memory.hits.len());
            self.memory.enqueue_batch(leftovers);
        }
        if self.clustering.is_some() {
            self.memory.cluster_seeds.extend(wrecked);
        }
    }

    fn seed_clusters(&mut self, rng: &mut SmallRng) {
        let Some(chance) = self.clustering else {
            return;
        };
        if self.memory.cluster_seeds.is_empty() {
            return;
        }
        let wreck: BTreeSet<Coord> = self.memory.cluster_seeds.drain(..).collect();
        let mut ring = BTreeSet::new();
        for c in &wreck {
            for (dr, dc) in [(-2, 0), (2, 0), (0, -2), (0, 2), (-1, -1), (-1, 1), (1, -1), (1, 1)] {
                if let Some(n) = c.offset(dr, dc, self.rows, self.cols) {
                    let touches = wreck.iter().any(|w| w.manhattan(n) <= 1);
                    if !touches {
                        ring.insert(n);
                    }
                }
            }
        }
        let picked: Vec<Coord> = ring.into_iter().filter(|_| rng.random_bool(chance)).collect();
        if !picked.is_empty() {
            debug!("speculative cluster candidates: {}", picked.len());
            self.memory.enqueue_batch(picked);
        }
    }

    fn hunt_candidate(&mut self, rng: &mut SmallRng, legal: &BTreeSet<Coord>) -> Option<Coord> {
        if !self.memory.is_hunting() {
            return None;
        }
        if let Some(axis) = self.memory.axis {
            let ends = self.axis_extensions(axis, legal);
            let pool: Vec<Coord> = if ends.is_empty() {
                self.unfinished(legal, Some(axis))
            } else {
                let queued: Vec<Coord> = ends
                    .iter()
                    .copied()
                    .filter(|c| self.memory.queue.iter().any(|&(_, q)| q == *c))
                    .collect();
                if queued.is_empty() {
                    ends
                } else {
                    queued
                }
            };
            if let Some(&c) = pool.choose(rng) {
                self.memory.dequeue(c);
                return Some(c);
            }
            // Both ends are closed and nothing sank: the hits belong to more
            // than one ship. Fall back to probing around every hit.
            debug!("axis {:?} exhausted without a sink; unlocking", axis);
            self.memory.axis = None;
            let around: Vec<Coord> = self
                .memory
                .hits
                .keys()
                .flat_map(|c| c.neighbors(self.rows, self.cols))
                .collect();
            self.memory.enqueue_batch(around);
        }

        // Oldest batch first; uniform among its legal members.
        self.memory.queue.retain(|(_, c)| legal.contains(c));
        let Some(oldest) = self.memory.queue.iter().map(|&(g, _)| g).min() else {
            return self.unfinished(legal, None).choose(rng).copied();
        };
        let batch: Vec<Coord> = self
            .memory
            .queue
            .iter()
            .filter(|&&(g, _)| g == oldest)
            .map(|&(_, c)| c)
            .collect();
        let &c = batch.choose(rng)?;
        self.memory.dequeue(c);
        Some(c)
    }

    /// Hit cells that still hold a live segment and remain legal.
    fn unfinished(&self, legal: &BTreeSet<Coord>, axis: Option<Axis>) -> Vec<Coord> {
        self.memory
            .hits
            .iter()
            .filter(|(c, m)| {
                !m.fully_destroyed
                    && legal.contains(*c)
                    && axis.map(|a| a.contains(**c)).unwrap_or(true)
            })
            .map(|(&c, _)| c)
            .collect()
    }

    /// Legal cells just past either end of the hits along `axis`.
    fn axis_extensions(&self, axis: Axis, legal: &BTreeSet<Coord>) -> Vec<Coord> {
        let on_axis = self.memory.hits.keys().filter(|c| axis.contains(**c));
        let (lo, hi) = match axis {
            Axis::Row(_) => on_axis.fold((usize::MAX, 0), |(lo, hi), c| (lo.min(c.col), hi.max(c.col))),
            Axis::Col(_) => on_axis.fold((usize::MAX, 0), |(lo, hi), c| (lo.min(c.row), hi.max(c.row))),
        };
        if lo == usize::MAX {
            return Vec::new();
        }
        let mut ends = Vec::new();
        let before = lo.checked_sub(1);
        let after = hi + 1;
        for pos in before.into_iter().chain(core::iter::once(after)) {
            let c = match axis {
                Axis::Row(r) => Coord::new(r, pos),
                Axis::Col(col) => Coord::new(pos, col),
            };
            if legal.contains(&c) {
                ends.push(c);
            }
        }
        ends
    }

    fn search(&mut self, rng: &mut SmallRng, legal: &[Coord]) -> Option<Coord> {
        match self.strategy {
            Strategy::Random => legal.choose(rng).copied(),
            Strategy::SparseGrid { spacing } => {
                let spacing = spacing.max(1);
                let grid: Vec<Coord> = legal
                    .iter()
                    .copied()
                    .filter(|c| (c.row + c.col) % spacing == 0)
                    .collect();
                if let Some(&c) = grid.choose(rng) {
                    self.enter(SearchPhase::Coarse);
                    Some(c)
                } else {
                    self.enter(SearchPhase::Cleanup);
                    legal.choose(rng).copied()
                }
            }
            Strategy::Radial { coarse } => {
                let coarse = coarse.max(1);
                let center = Coord::new(self.rows / 2, self.cols / 2);
                let on_lattice = |c: &Coord| {
                    c.row % coarse == center.row % coarse && c.col % coarse == center.col % coarse
                };
                if let Some(c) = nearest_ring(rng, legal, center, on_lattice) {
                    self.enter(SearchPhase::Coarse);
                    Some(c)
                } else if let Some(c) = nearest_ring(rng, legal, center, |c| (c.row + c.col) % 2 == 0) {
                    self.enter(SearchPhase::Fine);
                    Some(c)
                } else {
                    self.enter(SearchPhase::Cleanup);
                    legal.choose(rng).copied()
                }
            }
            Strategy::Density => {
                let live_hits: BTreeSet<Coord> = self
                    .memory
                    .hits
                    .iter()
                    .filter(|(_, m)| !m.fully_destroyed)
                    .map(|(&c, _)| c)
                    .collect();
                let weights = calc_density(
                    self.rows,
                    self.cols,
                    legal,
                    &live_hits,
                    &self.remaining_lengths,
                );
                match sample_density(&weights, legal, DENSITY_TEMPERATURE, rng) {
                    Some(c) => {
                        self.enter(SearchPhase::Coarse);
                        Some(c)
                    }
                    None => {
                        self.enter(SearchPhase::Cleanup);
                        legal.choose(rng).copied()
                    }
                }
            }
        }
    }

    fn enter(&mut self, phase: SearchPhase) {
        if self.phase != phase {
            debug!("search phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }
}

fn initial_phase(strategy: Strategy) -> SearchPhase {
    match strategy {
        Strategy::Random => SearchPhase::Random,
        _ => SearchPhase::Coarse,
    }
}

/// Uniform pick among the cells matching `keep` that lie closest to `center`.
fn nearest_ring(
    rng: &mut SmallRng,
    legal: &[Coord],
    center: Coord,
    keep: impl Fn(&Coord) -> bool,
) -> Option<Coord> {
    let candidates: Vec<Coord> = legal.iter().copied().filter(|c| keep(c)).collect();
    let nearest = candidates.iter().map(|c| c.manhattan(center)).min()?;
    let ring: Vec<Coord> = candidates
        .into_iter()
        .filter(|c| c.manhattan(center) == nearest)
        .collect();
    ring.choose(rng).copied()
}

/// Relative likelihood of a ship segment at each legal cell, in the order of
/// `legal`. A placement is ruled out when it covers a cell that is neither
/// legal nor a live hit; placements covering more live hits weigh more.
pub fn calc_density(
    rows: usize,
    cols: usize,
    legal: &[Coord],
    hits: &BTreeSet<Coord>,
    lengths: &[usize],
) -> Vec<f64> {
    let open: BTreeSet<Coord> = legal.iter().copied().collect();
    let mut acc: BTreeMap<Coord, f64> = BTreeMap::new();

    for &len in lengths.iter().filter(|&&l| l > 0) {
        for vertical in [false, true] {
            let max_row = if vertical { rows.saturating_sub(len - 1) } else { rows };
            let max_col = if vertical { cols } else { cols.saturating_sub(len - 1) };
            for r in 0..max_row {
                for c in 0..max_col {
                    let cells = (0..len).map(|k| {
                        if vertical {
                            Coord::new(r + k, c)
                        } else {
                            Coord::new(r, c + k)
                        }
                    });
                    let mut n_hits = 0i32;
                    let mut valid = true;
                    for cell in cells.clone() {
                        if hits.contains(&cell) {
                            n_hits += 1;
                        } else if !open.contains(&cell) {
                            valid = false;
                            break;
                        }
                    }
                    if !valid {
                        continue;
                    }
                    let weight = libm::pow(HIT_BIAS, n_hits as f64);
                    for cell in cells {
                        if open.contains(&cell) && !hits.contains(&cell) {
                            *acc.entry(cell).or_insert(0.0) += weight;
                        }
                    }
                }
            }
        }
    }

    let total: f64 = acc.values().sum();
    legal
        .iter()
        .map(|c| {
            if total == 0.0 {
                0.0
            } else {
                acc.get(c).copied().unwrap_or(0.0) / total
            }
        })
        .collect()
}

/// Sample a cell from density `weights` sharpened by `temperature`.
/// Returns `None` when every weight is zero.
pub fn sample_density(
    weights: &[f64],
    legal: &[Coord],
    temperature: f64,
    rng: &mut SmallRng,
) -> Option<Coord> {
    let adjusted: Vec<f64> = weights
        .iter()
        .map(|&w| if w > 0.0 { libm::pow(w, 1.0 / temperature) } else { 0.0 })
        .collect();
    let total: f64 = adjusted.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let threshold: f64 = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, w) in adjusted.iter().enumerate() {
        cumulative += w;
        if threshold < cumulative {
            return legal.get(i).copied();
        }
    }
    legal
        .iter()
        .zip(adjusted.iter())
        .rev()
        .find(|(_, w)| **w > 0.0)
        .map(|(c, _)| *c)
}
