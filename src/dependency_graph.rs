//! Supplier dependency graph and cascading impact analysis
//!
//! Edges point from a supplier to the suppliers it depends on. Disruption
//! travels the other way: when a supplier is hit, everything that depends on
//! it (directly or transitively) is exposed.

use crate::{
    CriticalityLevel, OrganizationId, Result, Supplier, SupplierDependencyEdge, SupplierId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use tracing::debug;

/// Maximum score a supplier can receive from indirect exposure alone
pub const MAX_CASCADING_SCORE: f64 = 60.0;

/// Source of supplier and dependency records
pub trait SupplierRepository {
    /// Every supplier owned by an organization
    fn suppliers_for_organization(&self, organization_id: OrganizationId) -> Result<Vec<Supplier>>;

    /// Every dependency edge whose dependent supplier belongs to the organization
    fn dependency_edges_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<SupplierDependencyEdge>>;
}

/// Repository backed by in-process maps, for tests and embedded use
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    suppliers: HashMap<OrganizationId, Vec<Supplier>>,
    edges: HashMap<OrganizationId, Vec<SupplierDependencyEdge>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_supplier(&mut self, organization_id: OrganizationId, supplier: Supplier) {
        self.suppliers
            .entry(organization_id)
            .or_default()
            .push(supplier);
    }

    pub fn add_dependency(&mut self, organization_id: OrganizationId, edge: SupplierDependencyEdge) {
        self.edges.entry(organization_id).or_default().push(edge);
    }
}

impl SupplierRepository for InMemoryRepository {
    fn suppliers_for_organization(&self, organization_id: OrganizationId) -> Result<Vec<Supplier>> {
        Ok(self
            .suppliers
            .get(&organization_id)
            .cloned()
            .unwrap_or_default())
    }

    fn dependency_edges_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<SupplierDependencyEdge>> {
        Ok(self.edges.get(&organization_id).cloned().unwrap_or_default())
    }
}

/// Directed graph: supplier -> suppliers it depends on
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DependencyGraph {
    dependencies: BTreeMap<SupplierId, Vec<SupplierId>>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for a supplier set.
    ///
    /// Every supplier gets an entry, even without edges. Edges whose dependent
    /// supplier is not part of the set are ignored.
    pub fn build(suppliers: &[Supplier], edges: &[SupplierDependencyEdge]) -> Self {
        let mut graph = Self::new();
        for supplier in suppliers {
            graph.add_supplier(supplier.id);
        }

        let mut skipped = 0usize;
        for edge in edges {
            if graph.contains(edge.supplier_id) {
                graph.add_dependency(edge.supplier_id, edge.depends_on_supplier_id);
            } else {
                skipped += 1;
            }
        }
        if skipped > 0 {
            debug!("Ignored {} dependency edges from unknown suppliers", skipped);
        }

        graph
    }

    /// Load suppliers and edges for an organization and build its graph
    pub fn for_organization<R: SupplierRepository + ?Sized>(
        repository: &R,
        organization_id: OrganizationId,
    ) -> Result<Self> {
        let suppliers = repository.suppliers_for_organization(organization_id)?;
        let edges = repository.dependency_edges_for_organization(organization_id)?;
        Ok(Self::build(&suppliers, &edges))
    }

    /// Register a supplier with no dependencies yet
    pub fn add_supplier(&mut self, supplier_id: SupplierId) {
        self.dependencies.entry(supplier_id).or_default();
    }

    /// Record that `supplier_id` depends on `depends_on`
    pub fn add_dependency(&mut self, supplier_id: SupplierId, depends_on: SupplierId) {
        self.dependencies
            .entry(supplier_id)
            .or_default()
            .push(depends_on);
    }

    pub fn contains(&self, supplier_id: SupplierId) -> bool {
        self.dependencies.contains_key(&supplier_id)
    }

    /// Direct dependencies of a supplier
    pub fn dependencies_of(&self, supplier_id: SupplierId) -> &[SupplierId] {
        self.dependencies
            .get(&supplier_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Adjacency map keyed by supplier
    pub fn adjacency(&self) -> &BTreeMap<SupplierId, Vec<SupplierId>> {
        &self.dependencies
    }

    pub fn supplier_count(&self) -> usize {
        self.dependencies.len()
    }

    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(Vec::len).sum()
    }

    /// Dependency -> suppliers that depend on it
    fn reverse_edges(&self) -> HashMap<SupplierId, Vec<SupplierId>> {
        let mut reverse: HashMap<SupplierId, Vec<SupplierId>> = HashMap::new();
        for (supplier_id, dependencies) in &self.dependencies {
            for dependency in dependencies {
                reverse.entry(*dependency).or_default().push(*supplier_id);
            }
        }
        reverse
    }

    /// Suppliers transitively exposed to the affected set.
    ///
    /// Breadth-first over reverse edges; the visited set makes cycles and
    /// self-loops harmless. The affected suppliers themselves are excluded.
    pub fn downstream_impact(&self, affected: &BTreeSet<SupplierId>) -> BTreeSet<SupplierId> {
        let mut downstream = BTreeSet::new();
        if affected.is_empty() {
            return downstream;
        }

        let reverse = self.reverse_edges();
        let mut visited: HashSet<SupplierId> = affected.iter().copied().collect();
        let mut queue: VecDeque<SupplierId> = affected.iter().copied().collect();

        while let Some(current) = queue.pop_front() {
            let Some(dependents) = reverse.get(&current) else {
                continue;
            };
            for dependent in dependents {
                if visited.insert(*dependent) {
                    downstream.insert(*dependent);
                    queue.push_back(*dependent);
                }
            }
        }

        downstream
    }

    /// One-hop exposure of unaffected suppliers to affected dependencies.
    ///
    /// Score is the share of a supplier's dependencies that are affected,
    /// scaled to at most [`MAX_CASCADING_SCORE`].
    pub fn cascading_exposure(&self, affected: &BTreeSet<SupplierId>) -> Vec<CascadingExposure> {
        self.dependencies
            .iter()
            .filter(|(supplier_id, _)| !affected.contains(*supplier_id))
            .filter_map(|(supplier_id, dependencies)| {
                let affected_dependencies: Vec<SupplierId> = dependencies
                    .iter()
                    .filter(|dep| affected.contains(*dep))
                    .copied()
                    .collect();
                if affected_dependencies.is_empty() {
                    return None;
                }

                let impact_ratio = affected_dependencies.len() as f64 / dependencies.len() as f64;
                Some(CascadingExposure {
                    supplier_id: *supplier_id,
                    cascading_impact_score: impact_ratio * MAX_CASCADING_SCORE,
                    impact_ratio,
                    affected_dependencies,
                })
            })
            .collect()
    }

    /// Suppliers that lean on High or Critical dependencies
    pub fn critical_paths(
        &self,
        criticality: &HashMap<SupplierId, CriticalityLevel>,
    ) -> Vec<CriticalPath> {
        self.dependencies
            .iter()
            .filter_map(|(supplier_id, dependencies)| {
                let critical_dependencies: Vec<SupplierId> = dependencies
                    .iter()
                    .filter(|dep| {
                        criticality
                            .get(*dep)
                            .map_or(false, CriticalityLevel::is_high)
                    })
                    .copied()
                    .collect();
                if critical_dependencies.is_empty() {
                    return None;
                }

                let risk_level = if critical_dependencies.len() > 2 {
                    PathRisk::High
                } else {
                    PathRisk::Medium
                };
                Some(CriticalPath {
                    supplier_id: *supplier_id,
                    critical_dependencies,
                    risk_level,
                })
            })
            .collect()
    }

    /// How many suppliers depend on each supplier, normalised by `n - 1`
    pub fn centrality(&self) -> BTreeMap<SupplierId, f64> {
        let mut centrality: BTreeMap<SupplierId, f64> =
            self.dependencies.keys().map(|id| (*id, 0.0)).collect();

        for dependencies in self.dependencies.values() {
            for dependency in dependencies {
                if let Some(count) = centrality.get_mut(dependency) {
                    *count += 1.0;
                }
            }
        }

        let total = self.dependencies.len();
        if total > 1 {
            let denominator = (total - 1) as f64;
            for value in centrality.values_mut() {
                *value /= denominator;
            }
        }

        centrality
    }

    /// Get graph statistics
    pub fn get_stats(&self) -> GraphStats {
        let reverse = self.reverse_edges();
        let isolated_suppliers = self
            .dependencies
            .iter()
            .filter(|(id, deps)| deps.is_empty() && !reverse.contains_key(*id))
            .count();

        GraphStats {
            supplier_count: self.supplier_count(),
            edge_count: self.edge_count(),
            isolated_suppliers,
        }
    }
}

/// Suppliers downstream of the affected set
pub fn cascading_impact(
    affected: &BTreeSet<SupplierId>,
    graph: &DependencyGraph,
) -> BTreeSet<SupplierId> {
    graph.downstream_impact(affected)
}

// Result types

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CascadingExposure {
    pub supplier_id: SupplierId,
    pub affected_dependencies: Vec<SupplierId>,
    pub impact_ratio: f64,
    pub cascading_impact_score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PathRisk {
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CriticalPath {
    pub supplier_id: SupplierId,
    pub critical_dependencies: Vec<SupplierId>,
    pub risk_level: PathRisk,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphStats {
    pub supplier_count: usize,
    pub edge_count: usize,
    pub isolated_suppliers: usize,
}
