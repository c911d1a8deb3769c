//! District graph: districts as nodes, bidirectional connections as edges.
//!
//! Districts are kept in insertion order (the generator adds the downtown
//! hub first). Adjacency is a `BTreeMap<DistrictId, BTreeSet<DistrictId>>`,
//! so neighbor iteration and BFS expansion follow id order and routing is
//! reproducible.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use urbanium_types::{District, DistrictId, DistrictKind};

use crate::error::WorldError;

/// The city graph holding all districts and their connections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityMap {
    /// Districts in insertion order.
    districts: Vec<District>,
    /// Undirected adjacency.
    adjacency: BTreeMap<DistrictId, BTreeSet<DistrictId>>,
}

impl CityMap {
    /// Create an empty map.
    pub const fn new() -> Self {
        Self {
            districts: Vec::new(),
            adjacency: BTreeMap::new(),
        }
    }

    // -------------------------------------------------------------------
    // Districts
    // -------------------------------------------------------------------

    /// Add a district.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateDistrict`] if the id is already present.
    pub fn add_district(&mut self, district: District) -> Result<(), WorldError> {
        if self.adjacency.contains_key(&district.id) {
            return Err(WorldError::DuplicateDistrict(district.id));
        }
        self.adjacency.insert(district.id, BTreeSet::new());
        self.districts.push(district);
        Ok(())
    }

    /// Look up a district.
    pub fn district(&self, id: DistrictId) -> Option<&District> {
        self.districts.iter().find(|d| d.id == id)
    }

    /// Whether a district exists.
    pub fn contains(&self, id: DistrictId) -> bool {
        self.adjacency.contains_key(&id)
    }

    /// All districts in insertion order.
    pub fn districts(&self) -> &[District] {
        &self.districts
    }

    /// Number of districts.
    pub fn district_count(&self) -> usize {
        self.districts.len()
    }

    /// Ids of districts of the given kind, in insertion order.
    pub fn districts_of_kind(&self, kind: DistrictKind) -> Vec<DistrictId> {
        self.districts
            .iter()
            .filter(|d| d.kind == kind)
            .map(|d| d.id)
            .collect()
    }

    // -------------------------------------------------------------------
    // Connections
    // -------------------------------------------------------------------

    /// Connect two districts in both directions.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DistrictNotFound`] if either end is missing and
    /// [`WorldError::SelfConnection`] if both ends are the same district.
    pub fn connect(&mut self, a: DistrictId, b: DistrictId) -> Result<(), WorldError> {
        if a == b {
            return Err(WorldError::SelfConnection(a));
        }
        if !self.contains(b) {
            return Err(WorldError::DistrictNotFound(b));
        }
        self.adjacency
            .get_mut(&a)
            .ok_or(WorldError::DistrictNotFound(a))?
            .insert(b);
        self.adjacency
            .get_mut(&b)
            .ok_or(WorldError::DistrictNotFound(b))?
            .insert(a);
        Ok(())
    }

    /// Whether an edge connects `from` and `to`.
    pub fn is_adjacent(&self, from: DistrictId, to: DistrictId) -> bool {
        self.adjacency
            .get(&from)
            .is_some_and(|neighbors| neighbors.contains(&to))
    }

    /// Districts directly connected to `district`, in id order.
    pub fn neighbors(&self, district: DistrictId) -> Vec<DistrictId> {
        self.adjacency
            .get(&district)
            .map(|n| n.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of undirected connections.
    pub fn connection_count(&self) -> usize {
        let endpoints: usize = self.adjacency.values().map(BTreeSet::len).sum();
        endpoints / 2
    }

    // -------------------------------------------------------------------
    // Routing
    // -------------------------------------------------------------------

    /// Fewest-hops path from `start` to `goal`, both ends inclusive.
    ///
    /// Returns `None` if either district is missing or no path exists.
    pub fn shortest_path(&self, start: DistrictId, goal: DistrictId) -> Option<Vec<DistrictId>> {
        if !self.contains(start) || !self.contains(goal) {
            return None;
        }
        if start == goal {
            return Some(vec![start]);
        }

        let mut prev: BTreeMap<DistrictId, DistrictId> = BTreeMap::new();
        let mut visited = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if current == goal {
                break;
            }
            for neighbor in self.neighbors(current) {
                if visited.insert(neighbor) {
                    prev.insert(neighbor, current);
                    queue.push_back(neighbor);
                }
            }
        }

        if !prev.contains_key(&goal) {
            return None;
        }

        let mut path = VecDeque::from([goal]);
        let mut current = goal;
        while let Some(&predecessor) = prev.get(&current) {
            path.push_front(predecessor);
            current = predecessor;
            if current == start {
                break;
            }
        }
        Some(path.into_iter().collect())
    }

    /// The first district to step into on the way from `start` to `goal`.
    pub fn next_hop(&self, start: DistrictId, goal: DistrictId) -> Option<DistrictId> {
        self.shortest_path(start, goal)?.get(1).copied()
    }

    /// Whether every district is reachable from every other.
    pub fn is_connected(&self) -> bool {
        let Some(start) = self.districts.first().map(|d| d.id) else {
            return true;
        };

        let mut visited = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for neighbor in self.neighbors(current) {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        visited.len() == self.districts.len()
    }
}
