//! Molecular bond graph.
//!
//! Particles link into chains (degree ≤ 2, acyclic). Every chain carries a
//! shared chain id and exactly one anchor; the anchor integrates freely and
//! the other members are pulled toward the rigid shape captured by each
//! bond's formation offset.

use glyph_core::constants::{BOND_FLASH, BOND_PULSE, DISTANCE_EPSILON, EXPLOSION_PULSE};
use glyph_core::{Bond, BondConfig, CollisionConfig, Particle};
use rand::Rng;
use std::collections::{BTreeMap, VecDeque};

/// What a forceful collision did to the bonds around it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakOutcome {
    /// Neither particle had a bond
    Unbonded,
    /// Every bond touching either particle was removed
    Full,
    /// Exactly one affected bond was removed
    Partial,
    /// Nothing removed, affected bonds weakened
    Weaken,
}

/// Reusable breadth-first traversal state
#[derive(Debug, Clone, Default)]
struct Traversal {
    queue: VecDeque<usize>,
    mark: Vec<u32>,
    epoch: u32,
}

impl Traversal {
    fn new(n: usize) -> Self {
        Self { queue: VecDeque::new(), mark: vec![0; n], epoch: 0 }
    }

    /// Start a fresh visit; every index becomes unvisited
    fn begin(&mut self) -> u32 {
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.mark.fill(0);
            self.epoch = 1;
        }
        self.queue.clear();
        self.epoch
    }

    /// Collect the connected component of `start` into `out`
    fn component(&mut self, neighbors: &[[Option<usize>; 2]], start: usize, out: &mut Vec<usize>) {
        out.clear();
        if start >= neighbors.len() {
            return;
        }

        let epoch = self.begin();
        self.mark[start] = epoch;
        self.queue.push_back(start);

        while let Some(i) = self.queue.pop_front() {
            out.push(i);
            for n in neighbors[i].into_iter().flatten() {
                if self.mark[n] != epoch {
                    self.mark[n] = epoch;
                    self.queue.push_back(n);
                }
            }
        }
    }
}

/// Degree-bounded undirected link structure over particle indices
#[derive(Debug, Clone, Default)]
pub struct BondGraph {
    bonds: Vec<Bond>,
    /// Up to two bonded neighbors per particle
    neighbors: Vec<[Option<usize>; 2]>,
    next_chain_id: u32,
    scratch: Traversal,
    members: Vec<usize>,
    members_alt: Vec<usize>,
    targets: Vec<[f32; 2]>,
}

impl BondGraph {
    pub fn new(particle_count: usize) -> Self {
        let mut graph = Self::default();
        graph.clear(particle_count);
        graph
    }

    /// Drop every bond and size the graph for `particle_count` particles
    pub fn clear(&mut self, particle_count: usize) {
        self.bonds.clear();
        self.neighbors.clear();
        self.neighbors.resize(particle_count, [None, None]);
        self.next_chain_id = 1;
        self.scratch = Traversal::new(particle_count);
        self.targets.clear();
        self.targets.resize(particle_count, [0.0, 0.0]);
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn len(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bonds.is_empty()
    }

    pub fn degree(&self, i: usize) -> usize {
        self.neighbors
            .get(i)
            .map_or(0, |slots| slots.iter().flatten().count())
    }

    pub fn linked(&self, i: usize, j: usize) -> bool {
        self.neighbors
            .get(i)
            .is_some_and(|slots| slots.contains(&Some(j)))
    }

    /// Bond between an unordered pair
    pub fn find(&self, i: usize, j: usize) -> Option<&Bond> {
        self.bonds.iter().find(|b| b.connects(i, j))
    }

    pub fn bonds_of(&self, i: usize) -> impl Iterator<Item = &Bond> {
        self.bonds.iter().filter(move |b| b.touches(i))
    }

    /// Members of the molecule containing `i` (just `i` when unbonded)
    pub fn molecule(&self, i: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut traversal = Traversal::new(self.neighbors.len());
        traversal.component(&self.neighbors, i, &mut out);
        out
    }

    /// Particle count of the molecule containing `i`
    pub fn molecule_size(&mut self, i: usize) -> usize {
        if self.degree(i) == 0 {
            return 1;
        }
        self.scratch.component(&self.neighbors, i, &mut self.members);
        self.members.len()
    }

    fn allocate_chain_id(&mut self) -> u32 {
        let id = self.next_chain_id;
        self.next_chain_id = self.next_chain_id.wrapping_add(1).max(1);
        id
    }

    /// Try to bond every eligible proximate pair of interacting particles.
    /// Returns the number of bonds formed.
    pub fn form(&mut self, particles: &mut [Particle], config: &BondConfig, rng: &mut impl Rng) -> u32 {
        let n = particles.len().min(self.neighbors.len());
        let reach2 = config.link_distance * config.link_distance;
        let mut formed = 0;

        for i in 0..n {
            if !particles[i].interacts() {
                continue;
            }
            for j in (i + 1)..n {
                if self.degree(i) >= 2 {
                    break;
                }
                if !particles[j].interacts() || self.degree(j) >= 2 {
                    continue;
                }

                let dx = particles[j].position[0] - particles[i].position[0];
                let dy = particles[j].position[1] - particles[i].position[1];
                let d2 = dx * dx + dy * dy;
                if d2 >= reach2 || d2.sqrt() < DISTANCE_EPSILON {
                    continue;
                }
                if self.linked(i, j) {
                    continue;
                }
                // Chains stay acyclic: never link two members of one molecule
                if particles[i].chain_id.is_some() && particles[i].chain_id == particles[j].chain_id {
                    continue;
                }
                if rng.r#gen::<f32>() >= config.link_probability {
                    continue;
                }
                if self.molecule_size(i) + self.molecule_size(j) > config.max_chain_length {
                    continue;
                }

                self.link(particles, i, j, config, rng);
                formed += 1;
            }
        }

        formed
    }

    /// Create the bond i–j and settle chain ids. Caller has checked eligibility.
    fn link(&mut self, particles: &mut [Particle], i: usize, j: usize, config: &BondConfig, rng: &mut impl Rng) {
        let dx = particles[j].position[0] - particles[i].position[0];
        let dy = particles[j].position[1] - particles[i].position[1];
        let dist = (dx * dx + dy * dy).sqrt();

        // Rigid offset, clamped to the preferred spacing
        let length = dist.min(config.molecular_spacing.max(0.0));
        let k = length / dist;
        let offset = [dx * k, dy * k];

        let lo = config.min_strength.clamp(0.0, 1.0);
        let hi = config.max_strength.clamp(lo, 1.0);
        let strength = if hi > lo { rng.gen_range(lo..=hi) } else { lo };

        match (particles[i].chain_id, particles[j].chain_id) {
            (None, None) => {
                let id = self.allocate_chain_id();
                particles[i].chain_id = Some(id);
                particles[j].chain_id = Some(id);
                particles[i].is_anchor = true;
            }
            (Some(id), None) => particles[j].chain_id = Some(id),
            (None, Some(id)) => particles[i].chain_id = Some(id),
            (Some(id_i), Some(id_j)) => {
                // Merge: the smaller structure takes the larger one's id and drops its anchor
                let size_i = self.molecule_size(i);
                let size_j = self.molecule_size(j);
                let (keep, absorb) = if size_i >= size_j { (id_i, j) } else { (id_j, i) };

                self.scratch.component(&self.neighbors, absorb, &mut self.members);
                for &m in &self.members {
                    particles[m].chain_id = Some(keep);
                    particles[m].is_anchor = false;
                }
            }
        }

        self.bonds.push(Bond { a: i, b: j, strength, age: 0, offset, length });
        attach(&mut self.neighbors[i], j);
        attach(&mut self.neighbors[j], i);

        for e in [i, j] {
            let p = &mut particles[e];
            p.in_molecule = true;
            p.is_head = self.degree(e) == 1;
            p.pulse += BOND_PULSE;
            p.opacity = (p.opacity * BOND_FLASH).min(1.0);
        }
    }

    /// Remove the bond at `idx`, clearing flags on endpoints left unbonded and
    /// relabelling if the molecule split in two.
    fn remove_at(&mut self, idx: usize, particles: &mut [Particle]) -> Bond {
        let bond = self.bonds.swap_remove(idx);
        detach(&mut self.neighbors[bond.a], bond.b);
        detach(&mut self.neighbors[bond.b], bond.a);

        for e in [bond.a, bond.b] {
            let degree = self.degree(e);
            if let Some(p) = particles.get_mut(e) {
                if degree == 0 {
                    p.clear_molecule();
                } else {
                    p.is_head = degree == 1;
                }
            }
        }

        self.repair_split(particles, bond.a, bond.b);
        bond
    }

    /// After removing a–b: give each surviving side one chain id and one anchor
    fn repair_split(&mut self, particles: &mut [Particle], a: usize, b: usize) {
        let mut side_a = std::mem::take(&mut self.members);
        let mut side_b = std::mem::take(&mut self.members_alt);
        side_a.clear();
        side_b.clear();

        if self.degree(a) > 0 {
            self.scratch.component(&self.neighbors, a, &mut side_a);
        }
        if self.degree(b) > 0 && !side_a.contains(&b) {
            self.scratch.component(&self.neighbors, b, &mut side_b);
        }

        if !side_a.is_empty() && !side_b.is_empty() {
            // The side still holding the anchor keeps the old id
            let a_has_anchor = side_a.iter().any(|&m| particles[m].is_anchor);
            let relabel = if a_has_anchor { &side_b } else { &side_a };
            let id = self.allocate_chain_id();
            for &m in relabel {
                particles[m].chain_id = Some(id);
            }
        }

        settle_anchor(particles, &side_a);
        settle_anchor(particles, &side_b);

        self.members = side_a;
        self.members_alt = side_b;
    }

    /// Decay every bond by one frame. Removes bonds whose strength hit zero or
    /// whose endpoints were pulled apart. Returns the number removed.
    pub fn age(&mut self, particles: &mut [Particle], config: &BondConfig) -> u32 {
        let limit = config.link_distance * config.break_distance_factor;
        let mut removed = 0;
        let mut idx = 0;

        while idx < self.bonds.len() {
            let bond = &mut self.bonds[idx];
            bond.strength = (bond.strength - config.strength_decay).clamp(0.0, 1.0);
            bond.age = bond.age.saturating_add(1);

            let stretched = match (particles.get(bond.a), particles.get(bond.b)) {
                (Some(pa), Some(pb)) => pa.distance_to(pb) > limit,
                _ => true,
            };

            if bond.strength <= 0.0 || stretched {
                // swap_remove moves an unvisited bond into idx
                self.remove_at(idx, particles);
                removed += 1;
            } else {
                idx += 1;
            }
        }

        removed
    }

    /// React to a forceful collision between i and j
    pub fn break_on_collision(
        &mut self,
        particles: &mut [Particle],
        i: usize,
        j: usize,
        config: &CollisionConfig,
        rng: &mut impl Rng,
    ) -> BreakOutcome {
        let affected: Vec<usize> = self
            .bonds
            .iter()
            .enumerate()
            .filter(|(_, b)| b.touches(i) || b.touches(j))
            .map(|(idx, _)| idx)
            .collect();

        if affected.is_empty() {
            return BreakOutcome::Unbonded;
        }

        let roll: f32 = rng.r#gen();
        if roll < config.break_probability {
            while let Some(idx) = self.bonds.iter().position(|b| b.touches(i) || b.touches(j)) {
                self.remove_at(idx, particles);
            }
            for e in [i, j] {
                if let Some(p) = particles.get_mut(e) {
                    p.pulse += EXPLOSION_PULSE;
                }
            }
            BreakOutcome::Full
        } else if roll < config.break_probability + config.partial_break_probability {
            let pick = affected[rng.gen_range(0..affected.len())];
            self.remove_at(pick, particles);
            BreakOutcome::Partial
        } else {
            let factor = config.weaken_factor.clamp(0.0, 1.0);
            for idx in affected {
                let bond = &mut self.bonds[idx];
                bond.strength = (bond.strength * factor).clamp(0.0, 1.0);
            }
            BreakOutcome::Weaken
        }
    }

    /// Pull every molecule member toward the rigid position implied by the
    /// anchor and the bond offsets along the chain.
    pub fn propagate(&mut self, particles: &mut [Particle], config: &BondConfig) {
        let n = particles.len().min(self.neighbors.len());
        let rigidity = config.rigidity.clamp(0.0, 1.0);
        let retention = config.member_velocity_retention;

        let epoch = self.scratch.begin();

        for root in 0..n {
            if !particles[root].is_anchor || particles[root].chain_id.is_none() || self.degree(root) == 0 {
                continue;
            }

            let anchor_velocity = particles[root].velocity;
            self.targets[root] = particles[root].position;
            self.scratch.mark[root] = epoch;
            self.scratch.queue.push_back(root);

            while let Some(u) = self.scratch.queue.pop_front() {
                for v in self.neighbors[u].into_iter().flatten() {
                    if self.scratch.mark[v] == epoch {
                        continue;
                    }
                    self.scratch.mark[v] = epoch;

                    let Some(offset) = self.bonds.iter().find(|b| b.connects(u, v)).map(|b| b.offset_from(u)) else {
                        continue;
                    };
                    let target = [self.targets[u][0] + offset[0], self.targets[u][1] + offset[1]];
                    self.targets[v] = target;
                    self.scratch.queue.push_back(v);

                    let p = &mut particles[v];
                    p.position[0] += (target[0] - p.position[0]) * rigidity;
                    p.position[1] += (target[1] - p.position[1]) * rigidity;
                    p.velocity = [anchor_velocity[0] * retention, anchor_velocity[1] * retention];
                }
            }
        }
    }
}

fn attach(slots: &mut [Option<usize>; 2], other: usize) {
    if let Some(slot) = slots.iter_mut().find(|s| s.is_none()) {
        *slot = Some(other);
    }
}

fn detach(slots: &mut [Option<usize>; 2], other: usize) {
    for slot in slots.iter_mut() {
        if *slot == Some(other) {
            *slot = None;
        }
    }
}

/// Leave exactly one anchor among `members`
fn settle_anchor(particles: &mut [Particle], members: &[usize]) {
    let Some(&first) = members.first() else {
        return;
    };
    let mut found = false;
    for &m in members {
        if particles[m].is_anchor {
            if found {
                particles[m].is_anchor = false;
            }
            found = true;
        }
    }
    if !found {
        particles[first].is_anchor = true;
    }
}

/// Group bonded particles by chain id
pub fn molecules(particles: &[Particle]) -> BTreeMap<u32, Vec<usize>> {
    let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, p) in particles.iter().enumerate() {
        if let Some(id) = p.chain_id {
            groups.entry(id).or_default().push(i);
        }
    }
    groups
}
