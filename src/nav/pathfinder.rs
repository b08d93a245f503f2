//! Best-first search over the implicit octree graph.
//!
//! Vertices are [`NavAddress`]es, edges come from [`NeighborResolver`]. The
//! open list is a binary heap with lazy deletion: improved entries are pushed
//! again and stale ones skipped when popped. Equal priorities pop the most
//! recently pushed entry first, which keeps results reproducible.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use glam::{IVec3, Vec3};

use crate::core::{Error, Result};
use crate::math::Aabb;
use crate::svo::address::NavAddress;
use crate::svo::data::OctreeData;
use crate::svo::neighbors::{NeighborLink, NeighborResolver};
use super::options::{CancellationToken, PathOptions, SearchAlgorithm, MAX_SNAP_RADIUS_VOXELS};
use super::raycast::OctreeRaycaster;

/// Counters for one search
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Addresses popped from Open and expanded
    pub expanded: usize,
    /// Addresses that ever entered Open
    pub visited: usize,
    /// Octree raycasts made by the any-angle variants
    pub line_of_sight_checks: usize,
}

/// Address sequence from start to goal
#[derive(Clone, Debug, PartialEq)]
pub struct AddressPath {
    pub addresses: Vec<NavAddress>,
    /// Accumulated cost under the configured cost model
    pub cost: f32,
    pub stats: SearchStats,
}

/// Search result before smoothing
#[derive(Clone, Debug, PartialEq)]
pub struct RawPath {
    pub addresses: Vec<NavAddress>,
    /// Start waypoint, every cell centre on the path, goal waypoint. A
    /// waypoint equal to its cell centre is not repeated.
    pub points: Vec<Vec3>,
    pub cost: f32,
    pub stats: SearchStats,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VisitState {
    Open,
    Closed,
}

#[derive(Clone, Copy, Debug)]
struct SearchRecord {
    g: f32,
    parent: Option<NavAddress>,
    state: VisitState,
}

struct OpenEntry {
    priority: f32,
    seq: u64,
    g: f32,
    address: NavAddress,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on priority, newest first among ties
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Called after each expansion with the expanded address and the running count
pub type ExpansionObserver<'a> = &'a dyn Fn(NavAddress, usize);

/// Runs searches over one snapshot with one set of options
pub struct PathFinder<'a> {
    data: &'a OctreeData,
    options: &'a PathOptions,
    cancel: Option<&'a CancellationToken>,
    observer: Option<ExpansionObserver<'a>>,
}

impl<'a> PathFinder<'a> {
    pub fn new(data: &'a OctreeData, options: &'a PathOptions) -> Self {
        Self { data, options, cancel: None, observer: None }
    }

    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_observer(mut self, observer: ExpansionObserver<'a>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Search between two world points.
    ///
    /// Blocked or mixed start/goal cells are snapped to the nearest free cell
    /// first. Points outside the volume fail with `OutOfBounds`.
    pub fn find_path(&self, start: Vec3, goal: Vec3) -> Result<RawPath> {
        self.options.validate()?;
        let (start_address, start_point) = self.snap(start)?;
        let (goal_address, goal_point) = self.snap(goal)?;

        if start_address == goal_address {
            return Ok(RawPath {
                addresses: vec![start_address],
                points: vec![start_point, goal_point],
                cost: self.options.cost.cost(start_point, goal_point),
                stats: SearchStats::default(),
            });
        }

        let path = self.search(start_address, goal_address)?;

        // Cell centres keep every segment inside the cells it connects; the
        // endpoints only ever join their own cell's centre
        let mut points = Vec::with_capacity(path.addresses.len() + 2);
        points.push(start_point);
        for &address in &path.addresses {
            let center = self.data.address_center(address);
            if points.last() != Some(&center) {
                points.push(center);
            }
        }
        if points.last() != Some(&goal_point) {
            points.push(goal_point);
        }

        Ok(RawPath { addresses: path.addresses, points, cost: path.cost, stats: path.stats })
    }

    /// Nearest traversable cell to `point`, with the waypoint to use for it.
    ///
    /// A free cell containing the point is returned as-is. Otherwise voxel
    /// lattice offsets within `snap_radius_voxels` are tried nearest first,
    /// and the waypoint is pulled half a voxel inside the cell found.
    pub fn snap(&self, point: Vec3) -> Result<(NavAddress, Vec3)> {
        let address = self.data.locate(point)?;
        if self.data.is_traversable(address) {
            return Ok((address, point));
        }

        // Probing further than the volume is wide cannot find anything new
        let radius = self
            .options
            .snap_radius_voxels
            .min(MAX_SNAP_RADIUS_VOXELS)
            .min(self.data.config().voxels_per_axis()) as i32;
        let voxel_size = self.data.voxel_size();
        let bounds = self.data.bounds();
        let radius_sq = (radius as i64) * (radius as i64);

        let mut offsets: Vec<IVec3> = Vec::new();
        for z in -radius..=radius {
            for y in -radius..=radius {
                for x in -radius..=radius {
                    let offset = IVec3::new(x, y, z);
                    let len_sq = offset_length_squared(offset);
                    if len_sq > 0 && len_sq <= radius_sq {
                        offsets.push(offset);
                    }
                }
            }
        }
        offsets.sort_by_key(|&o| (offset_length_squared(o), o.z, o.y, o.x));

        for offset in offsets {
            let sample = point + offset.as_vec3() * voxel_size;
            if !bounds.contains_point(sample) {
                continue;
            }
            let Ok(candidate) = self.data.locate(sample) else {
                continue;
            };
            if self.data.is_traversable(candidate) {
                let cell = self.data.address_box(candidate);
                let inner = Aabb::new(
                    cell.min + Vec3::splat(voxel_size * 0.5),
                    cell.max - Vec3::splat(voxel_size * 0.5),
                );
                let waypoint = inner.closest_point(point);
                log::debug!("Snapped {} to {} at {}", point, candidate, waypoint);
                return Ok((candidate, waypoint));
            }
        }

        Err(Error::Unreachable(format!(
            "no free cell within {} voxels of {}", radius, point
        )))
    }

    /// Search between two traversable addresses.
    pub fn search(&self, start: NavAddress, goal: NavAddress) -> Result<AddressPath> {
        if !self.data.is_traversable(start) || !self.data.is_traversable(goal) {
            return Err(Error::Unreachable(format!("{} or {} is not a free cell", start, goal)));
        }

        let resolver = NeighborResolver::new(self.data, self.options.connectivity());
        let raycaster = OctreeRaycaster::new(self.data);
        let algorithm = self.options.algorithm;
        let goal_center = self.data.address_center(goal);
        let limit = self.options.max_search_nodes;
        let interval = self.options.cancel_check_interval.max(1);

        let mut open = BinaryHeap::new();
        let mut records: HashMap<NavAddress, SearchRecord> = HashMap::new();
        let mut links: Vec<NeighborLink> = Vec::new();
        let mut seq = 0u64;
        let mut expanded = 0usize;
        let mut line_of_sight_checks = 0usize;

        records.insert(start, SearchRecord { g: 0.0, parent: None, state: VisitState::Open });
        open.push(OpenEntry {
            priority: self.priority(start, 0.0, goal_center),
            seq,
            g: 0.0,
            address: start,
        });

        while let Some(entry) = open.pop() {
            let Some(mut record) = records.get(&entry.address).copied() else {
                continue;
            };
            if record.state == VisitState::Closed || entry.g > record.g {
                continue;
            }
            if expanded >= limit {
                log::debug!("Search {} -> {} exceeded budget of {} nodes", start, goal, limit);
                return Err(Error::BudgetExceeded { expanded, limit });
            }
            if expanded % interval == 0 && self.cancel.is_some_and(|t| t.is_cancelled()) {
                return Err(Error::SearchAborted { expanded });
            }

            let current_center = self.data.address_center(entry.address);
            resolver.neighbors_into(entry.address, &mut links);

            // Lazy Theta*: the parent was assumed visible when this cell was
            // relaxed; on failure fall back to the best closed neighbour
            if algorithm == SearchAlgorithm::LazyThetaStar {
                if let Some(parent) = record.parent {
                    line_of_sight_checks += 1;
                    if !raycaster.is_clear(self.data.address_center(parent), current_center) {
                        let repaired = links
                            .iter()
                            .filter_map(|link| {
                                let r = records.get(&link.address)?;
                                (r.state == VisitState::Closed).then(|| {
                                    let center = self.data.address_center(link.address);
                                    (link.address, r.g + self.options.cost.cost(center, current_center))
                                })
                            })
                            .min_by(|a, b| a.1.total_cmp(&b.1));
                        if let Some((parent, g)) = repaired {
                            record.parent = Some(parent);
                            record.g = g;
                        }
                    }
                }
            }

            if entry.address == goal {
                records.insert(goal, record);
                let stats = SearchStats { expanded, visited: records.len(), line_of_sight_checks };
                let path = reconstruct(&records, goal, stats);
                log::debug!(
                    "Path {} -> {}: {} cells, cost {:.2}, {} expanded",
                    start, goal, path.addresses.len(), path.cost, expanded,
                );
                return Ok(path);
            }

            records.insert(entry.address, SearchRecord { state: VisitState::Closed, ..record });
            expanded += 1;
            if let Some(observer) = self.observer {
                observer(entry.address, expanded);
            }

            for link in &links {
                if records.get(&link.address).is_some_and(|r| r.state == VisitState::Closed) {
                    continue;
                }
                let neighbor_center = self.data.address_center(link.address);

                // Any-angle variants connect straight to the grandparent
                let via_parent = match (algorithm, record.parent) {
                    (SearchAlgorithm::ThetaStar, Some(parent)) => records.get(&parent).and_then(|p| {
                        let parent_center = self.data.address_center(parent);
                        line_of_sight_checks += 1;
                        raycaster
                            .is_clear(parent_center, neighbor_center)
                            .then(|| (parent, p.g + self.options.cost.cost(parent_center, neighbor_center)))
                    }),
                    (SearchAlgorithm::LazyThetaStar, Some(parent)) => records.get(&parent).map(|p| {
                        let parent_center = self.data.address_center(parent);
                        (parent, p.g + self.options.cost.cost(parent_center, neighbor_center))
                    }),
                    _ => None,
                };
                let (parent, g) = via_parent.unwrap_or_else(|| {
                    (entry.address, record.g + self.options.cost.cost(current_center, neighbor_center))
                });

                if records.get(&link.address).is_none_or(|r| g < r.g) {
                    records.insert(link.address, SearchRecord { g, parent: Some(parent), state: VisitState::Open });
                    seq += 1;
                    open.push(OpenEntry {
                        priority: self.priority(link.address, g, goal_center),
                        seq,
                        g,
                        address: link.address,
                    });
                }
            }
        }

        Err(Error::Unreachable(format!(
            "no path from {} to {} ({} cells expanded)", start, goal, expanded
        )))
    }

    fn priority(&self, address: NavAddress, g: f32, goal_center: Vec3) -> f32 {
        let h = self.options.heuristic_scale
            * self.options.heuristic.estimate(self.data.address_center(address), goal_center);
        let total = g + h;
        if self.options.node_size_compensation {
            // Finest cells keep their full priority, coarser ones are pulled forward
            let depth = address.layer as f32 + if address.is_voxel() { 1.0 } else { 0.0 };
            let finest = self.data.max_depth() as f32 + 1.0;
            total * (depth + 1.0) / (finest + 1.0)
        } else {
            total
        }
    }
}

fn offset_length_squared(offset: IVec3) -> i64 {
    let o = offset.as_i64vec3();
    o.x * o.x + o.y * o.y + o.z * o.z
}

fn reconstruct(records: &HashMap<NavAddress, SearchRecord>, goal: NavAddress, stats: SearchStats) -> AddressPath {
    let cost = records.get(&goal).map_or(0.0, |r| r.g);
    let mut addresses = vec![goal];
    let mut current = goal;
    while let Some(parent) = records.get(&current).and_then(|r| r.parent) {
        addresses.push(parent);
        current = parent;
    }
    addresses.reverse();
    AddressPath { addresses, cost, stats }
}
