//! Roster builder (derivation): expands a validated `ClusterConfig` into an
//! immutable, uniquely-named list of node instances and exposes the
//! role-based selectors the action engine's tasks target.

use std::collections::BTreeMap;

use crate::config::cluster_config::{ClusterConfig, JSON6902Patch, Mount, NodeConfig, PortMapping};
use crate::core::types::NodeRole;
use crate::errors::{KinaError, KinaResult, ValidationErrors};

/// One expanded node instance. The result of repeating a `NodeConfig` by
/// its `replicas` count, with `replicas` cleared and a unique `name` plus
/// `provisioning_order` assigned.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub name: String,
    pub role: NodeRole,
    pub image: String,
    pub extra_mounts: Vec<Mount>,
    pub extra_port_mappings: Vec<PortMapping>,
    pub kubeadm_config_patches: Vec<String>,
    pub kubeadm_config_patches_json6902: Vec<JSON6902Patch>,
    pub labels: BTreeMap<String, String>,
    pub provisioning_order: u8,
}

/// The immutable, derived roster for one cluster-creation call.
#[derive(Debug, Clone)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    /// Expand `config.nodes` by replicas, assign names and provisioning
    /// order, then stable-sort by the total order from §3: provisioning
    /// order ascending, ties broken by name ascending.
    ///
    /// Guarantee (§4.2): for identical input modulo ordering of the input
    /// node list, the roster is byte-identical — the sort key depends only
    /// on role and name, never on input position.
    pub fn derive(config: &ClusterConfig) -> KinaResult<Self> {
        let mut errors = ValidationErrors::new();
        let mut entries = Vec::new();

        // Track per-role running counts for naming, and singleton-role
        // uniqueness (etcd/lb must not end up duplicated after expansion).
        let mut role_counts: BTreeMap<NodeRole, u32> = BTreeMap::new();
        for node in &config.nodes {
            let replicas = node.replicas.unwrap_or(1);
            let count = role_counts.entry(node.role).or_insert(0);
            *count += replicas;
        }

        for (role, count) in &role_counts {
            if !role.allows_multiple() && *count > 1 {
                errors.push(format!(
                    "role '{}' appears {} times after replica expansion but only one instance is allowed (already-exists)",
                    role, count
                ));
            }
        }
        errors.into_result().map_err(KinaError::Validation)?;

        let mut per_role_index: BTreeMap<NodeRole, u32> = BTreeMap::new();
        for node in &config.nodes {
            let replicas = node.replicas.unwrap_or(1);
            let total_for_role = *role_counts.get(&node.role).unwrap_or(&0);

            for _ in 0..replicas {
                let idx = per_role_index.entry(node.role).or_insert(0);
                *idx += 1;
                let name = Self::derive_name(node.role, *idx, total_for_role);
                entries.push(Self::materialize(node, name));
            }
        }

        entries.sort_by(Self::total_order);

        Ok(Self { entries })
    }

    /// Naming rule (§3): singletons get the bare role name; multi-instance
    /// roles get a 1-based suffix.
    fn derive_name(role: NodeRole, index_1_based: u32, total_for_role: u32) -> String {
        if total_for_role <= 1 {
            role.singleton_name().to_string()
        } else {
            format!("{}{}", role.singleton_name(), index_1_based)
        }
    }

    fn materialize(node: &NodeConfig, name: String) -> RosterEntry {
        let mut labels = node.labels.clone();
        labels.entry("io.x-k8s.kind.role".to_string()).or_insert_with(|| node.role.to_string());

        RosterEntry {
            name,
            role: node.role,
            image: node.image.clone().unwrap_or_default(),
            extra_mounts: node.extra_mounts.clone(),
            extra_port_mappings: node.extra_port_mappings.clone(),
            kubeadm_config_patches: node.kubeadm_config_patches.clone(),
            kubeadm_config_patches_json6902: node.kubeadm_config_patches_json6902.clone(),
            labels,
            provisioning_order: node.role.provisioning_order(),
        }
    }

    /// Total order from §3: (a) provisioning order ascending, (b) name
    /// ascending.
    fn total_order(a: &RosterEntry, b: &RosterEntry) -> std::cmp::Ordering {
        a.provisioning_order
            .cmp(&b.provisioning_order)
            .then_with(|| a.name.cmp(&b.name))
    }

    pub fn all(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn control_planes(&self) -> Vec<&RosterEntry> {
        self.entries
            .iter()
            .filter(|e| e.role == NodeRole::ControlPlane)
            .collect()
    }

    /// The bootstrap control-plane: the lexicographically first
    /// control-plane entry (which, since the roster is sorted by name
    /// within a provisioning order, is simply the first control-plane
    /// entry encountered).
    pub fn bootstrap(&self) -> Option<&RosterEntry> {
        self.control_planes().into_iter().next()
    }

    /// All control-planes other than the bootstrap one.
    pub fn secondary_control_planes(&self) -> Vec<&RosterEntry> {
        let bootstrap_name = self.bootstrap().map(|e| e.name.clone());
        self.control_planes()
            .into_iter()
            .filter(|e| Some(&e.name) != bootstrap_name.as_ref())
            .collect()
    }

    pub fn workers(&self) -> Vec<&RosterEntry> {
        self.entries
            .iter()
            .filter(|e| e.role == NodeRole::Worker)
            .collect()
    }

    pub fn external_etcd(&self) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.role == NodeRole::ExternalEtcd)
    }

    pub fn external_load_balancer(&self) -> Option<&RosterEntry> {
        self.entries
            .iter()
            .find(|e| e.role == NodeRole::ExternalLoadBalancer)
    }

    pub fn find(&self, name: &str) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A named subset-selector over the roster, matching §4.2's exposed
/// selector list. Actions reference one of these per task rather than
/// filtering the roster by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeSelector {
    All,
    ControlPlanes,
    Bootstrap,
    SecondaryControlPlanes,
    Workers,
    ExternalEtcd,
    ExternalLoadBalancer,
}

impl NodeSelector {
    pub fn select<'a>(&self, roster: &'a Roster) -> Vec<&'a RosterEntry> {
        match self {
            NodeSelector::All => roster.all().iter().collect(),
            NodeSelector::ControlPlanes => roster.control_planes(),
            NodeSelector::Bootstrap => roster.bootstrap().into_iter().collect(),
            NodeSelector::SecondaryControlPlanes => roster.secondary_control_planes(),
            NodeSelector::Workers => roster.workers(),
            NodeSelector::ExternalEtcd => roster.external_etcd().into_iter().collect(),
            NodeSelector::ExternalLoadBalancer => roster.external_load_balancer().into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_single_control_plane() {
        let config = ClusterConfig::from_counts("kina", 1, 0);
        let roster = Roster::derive(&config).unwrap();
        let names: Vec<_> = roster.all().iter().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["control-plane"]);
    }

    #[test]
    fn s2_ha_adds_implicit_lb() {
        let config = ClusterConfig::from_counts("kina", 3, 2);
        let roster = Roster::derive(&config).unwrap();
        let names: Vec<_> = roster.all().iter().map(|e| e.name.clone()).collect();
        assert_eq!(
            names,
            vec![
                "lb",
                "control-plane1",
                "control-plane2",
                "control-plane3",
                "worker1",
                "worker2"
            ]
        );
    }

    #[test]
    fn s3_full_ha_with_etcd() {
        let mut config = ClusterConfig::from_counts("kina", 3, 2);
        config.nodes.push(crate::config::cluster_config::NodeConfig {
            role: NodeRole::ExternalEtcd,
            replicas: Some(1),
            ..Default::default()
        });
        config.apply_defaults();
        let roster = Roster::derive(&config).unwrap();
        let names: Vec<_> = roster.all().iter().map(|e| e.name.clone()).collect();
        assert_eq!(
            names,
            vec![
                "etcd",
                "lb",
                "control-plane1",
                "control-plane2",
                "control-plane3",
                "worker1",
                "worker2"
            ]
        );
        assert_eq!(roster.bootstrap().unwrap().name, "control-plane1");
        assert_eq!(roster.secondary_control_planes().len(), 2);
    }

    #[test]
    fn zero_replicas_contributes_no_entries() {
        let mut config = ClusterConfig::default_with_name("kina");
        config.nodes.push(crate::config::cluster_config::NodeConfig {
            role: NodeRole::Worker,
            replicas: Some(0),
            image: Some("kindest/node:v1.31.0".to_string()),
            ..Default::default()
        });
        let roster = Roster::derive(&config).unwrap();
        assert_eq!(roster.len(), 1);
        assert!(roster.workers().is_empty());
    }

    #[test]
    fn no_duplicate_names_and_stable_under_permutation() {
        let mut a = ClusterConfig::from_counts("kina", 3, 2);
        a.apply_defaults();
        let mut b = a.clone();
        b.nodes.reverse();

        let roster_a = Roster::derive(&a).unwrap();
        let roster_b = Roster::derive(&b).unwrap();

        let names_a: Vec<_> = roster_a.all().iter().map(|e| e.name.clone()).collect();
        let names_b: Vec<_> = roster_b.all().iter().map(|e| e.name.clone()).collect();
        assert_eq!(names_a, names_b);

        let mut sorted_unique = names_a.clone();
        sorted_unique.sort();
        sorted_unique.dedup();
        assert_eq!(sorted_unique.len(), names_a.len());
    }

    #[test]
    fn two_external_lb_nodes_is_an_error() {
        let mut config = ClusterConfig::default_with_name("kina");
        config.nodes.push(crate::config::cluster_config::NodeConfig {
            role: NodeRole::ExternalLoadBalancer,
            image: Some("haproxy:latest".to_string()),
            ..Default::default()
        });
        config.nodes.push(crate::config::cluster_config::NodeConfig {
            role: NodeRole::ExternalLoadBalancer,
            image: Some("haproxy:latest".to_string()),
            ..Default::default()
        });
        assert!(Roster::derive(&config).is_err());
    }
}
