// Note: Some fields may be unused during development but are part of the KIND-compatible schema
use anyhow::Context;
/// KIND-compatible cluster configuration schema, generalized to the full
/// node-role/replica/networking model the roster builder and provisioner
/// require.
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::types::NodeRole;
use crate::errors::{ConfigError, KinaError, KinaResult, ValidationErrors};

/// Known `apiVersion` values the loader accepts. Historical aliases convert
/// into the same internal `ClusterConfig` shape; unrecognized versions are a
/// `config-unknown-version` error.
const API_VERSION_V1ALPHA4: &str = "kind.x-k8s.io/v1alpha4";
const API_VERSION_V1ALPHA3: &str = "kind.x-k8s.io/v1alpha3";

const DEFAULT_NODE_IMAGE: &str = "kindest/node:v1.31.0";
const DEFAULT_API_BIND_ADDRESS: &str = "127.0.0.1";

/// KIND-compatible cluster configuration (the internal, validated form).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// API version (KIND compatibility)
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (KIND compatibility)
    pub kind: String,

    /// Cluster name
    pub name: String,

    /// Node configuration
    pub nodes: Vec<NodeConfig>,

    /// Networking configuration
    pub networking: NetworkingConfig,

    /// Feature gates to enable/disable
    #[serde(rename = "featureGates", default)]
    pub feature_gates: BTreeMap<String, bool>,

    /// kubeadm configuration patches (strategic merge, cluster-wide)
    #[serde(rename = "kubeadmConfigPatches", default)]
    pub kubeadm_config_patches: Vec<String>,

    /// kubeadm configuration patches by target (JSON-6902, cluster-wide)
    #[serde(rename = "kubeadmConfigPatchesJSON6902", default)]
    pub kubeadm_config_patches_json6902: Vec<JSON6902Patch>,

    /// Runtime configuration specific to kina/Apple Container
    #[serde(rename = "runtimeConfig", skip_serializing_if = "Option::is_none")]
    pub runtime_config: Option<RuntimeConfig>,
}

/// Node configuration for cluster nodes (a spec, before replica expansion).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node role
    pub role: NodeRole,

    /// Container image for this node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Number of instances this node spec expands to during derivation.
    /// `None` behaves as 1; `Some(0)` contributes zero roster entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,

    /// Extra mounts for this node
    #[serde(rename = "extraMounts", skip_serializing_if = "Vec::is_empty", default)]
    pub extra_mounts: Vec<Mount>,

    /// Extra port mappings for this node
    #[serde(
        rename = "extraPortMappings",
        skip_serializing_if = "Vec::is_empty",
        default
    )]
    pub extra_port_mappings: Vec<PortMapping>,

    /// kubeadm configuration patches for this node (strategic merge)
    #[serde(
        rename = "kubeadmConfigPatches",
        skip_serializing_if = "Vec::is_empty",
        default
    )]
    pub kubeadm_config_patches: Vec<String>,

    /// kubeadm configuration patches for this node (JSON-6902)
    #[serde(
        rename = "kubeadmConfigPatchesJSON6902",
        skip_serializing_if = "Vec::is_empty",
        default
    )]
    pub kubeadm_config_patches_json6902: Vec<JSON6902Patch>,

    /// Labels for this node
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub labels: BTreeMap<String, String>,

    // Internal fields (not serialized) — filled in once the owning cluster
    // name is known; still unpopulated at the NodeConfig stage, the roster
    // builder derives the real instance name.
    #[serde(skip)]
    #[allow(dead_code)]
    pub cluster_name: String,

    #[serde(skip)]
    #[allow(dead_code)]
    pub name: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            role: NodeRole::ControlPlane,
            image: None,
            replicas: None,
            extra_mounts: Vec::new(),
            extra_port_mappings: Vec::new(),
            kubeadm_config_patches: Vec::new(),
            kubeadm_config_patches_json6902: Vec::new(),
            labels: BTreeMap::new(),
            cluster_name: String::new(),
            name: String::new(),
        }
    }
}

/// IP family for the cluster network.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IpFamily {
    #[default]
    Ipv4,
    Ipv6,
    #[serde(rename = "dual")]
    DualStack,
}

/// Networking configuration (KIND compatible, generalized with ip family).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkingConfig {
    /// IP family of the cluster
    #[serde(rename = "ipFamily", default)]
    pub ip_family: IpFamily,

    /// Disable default CNI
    #[serde(
        rename = "disableDefaultCNI",
        skip_serializing_if = "is_false",
        default
    )]
    pub disable_default_cni: bool,

    /// kube-proxy mode
    #[serde(rename = "kubeProxyMode", skip_serializing_if = "Option::is_none")]
    pub kube_proxy_mode: Option<String>,

    /// Pod subnet CIDR(s), comma-separated for dual-stack
    #[serde(rename = "podSubnet", skip_serializing_if = "Option::is_none")]
    pub pod_subnet: Option<String>,

    /// Service subnet CIDR(s), comma-separated for dual-stack
    #[serde(rename = "serviceSubnet", skip_serializing_if = "Option::is_none")]
    pub service_subnet: Option<String>,

    /// API server bind address
    #[serde(rename = "apiServerAddress", skip_serializing_if = "Option::is_none")]
    pub api_server_address: Option<String>,

    /// API server host port (0 = ephemeral)
    #[serde(rename = "apiServerPort", skip_serializing_if = "Option::is_none")]
    pub api_server_port: Option<u16>,
}

impl Default for NetworkingConfig {
    fn default() -> Self {
        Self {
            ip_family: IpFamily::Ipv4,
            disable_default_cni: false,
            kube_proxy_mode: None,
            pod_subnet: None,
            service_subnet: None,
            api_server_address: None,
            api_server_port: None,
        }
    }
}

/// Mount propagation mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MountPropagation {
    #[default]
    Private,
    HostToContainer,
    Bidirectional,
}

/// Mount configuration for nodes (KIND compatible).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mount {
    /// Host path to mount
    #[serde(rename = "hostPath")]
    pub host_path: PathBuf,

    /// Container path for the mount
    #[serde(rename = "containerPath")]
    pub container_path: PathBuf,

    /// Whether the mount is read-only
    #[serde(rename = "readOnly", skip_serializing_if = "is_false", default)]
    pub read_only: bool,

    /// SELinux relabel option
    #[serde(rename = "selinuxRelabel", skip_serializing_if = "is_false", default)]
    pub selinux_relabel: bool,

    /// Propagation mode
    #[serde(default)]
    pub propagation: MountPropagation,
}

/// Wire protocol for a port mapping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    Sctp,
}

/// Port mapping for nodes (KIND compatible).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortMapping {
    /// Container port
    #[serde(rename = "containerPort")]
    pub container_port: u16,

    /// Host port (optional; 0 or absent means "random")
    #[serde(rename = "hostPort", skip_serializing_if = "Option::is_none")]
    pub host_port: Option<u16>,

    /// Listen address
    #[serde(rename = "listenAddress", skip_serializing_if = "Option::is_none")]
    pub listen_address: Option<String>,

    /// Protocol
    #[serde(default)]
    pub protocol: Protocol,
}

/// JSON-6902 patch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JSON6902Patch {
    /// Group of the target resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Version of the target resource
    pub version: String,

    /// Kind of the target resource
    pub kind: String,

    /// Patch operations (a JSON-6902 document, encoded as text)
    pub patch: String,
}

/// Runtime configuration specific to kina/Apple Container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(rename = "cpuLimit", skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<String>,

    #[serde(rename = "memoryLimit", skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<String>,

    #[serde(rename = "storageLimit", skip_serializing_if = "Option::is_none")]
    pub storage_limit: Option<String>,

    #[serde(skip_serializing_if = "is_false", default)]
    pub privileged: bool,

    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub environment: BTreeMap<String, String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cpu_limit: None,
            memory_limit: Some("2Gi".to_string()),
            storage_limit: Some("20Gi".to_string()),
            privileged: true, // required for systemd in containers
            environment: BTreeMap::new(),
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self::default_with_name("kina")
    }
}

impl ClusterConfig {
    /// Create a default cluster configuration with a specific name: a
    /// single control-plane node with the default image (§4.1 defaulting
    /// rule: empty node list -> one control-plane node).
    pub fn default_with_name(name: &str) -> Self {
        Self {
            api_version: API_VERSION_V1ALPHA4.to_string(),
            kind: "Cluster".to_string(),
            name: name.to_string(),
            nodes: vec![NodeConfig {
                cluster_name: name.to_string(),
                name: format!("{}-control-plane", name),
                ..NodeConfig::default()
            }],
            networking: NetworkingConfig::default(),
            feature_gates: BTreeMap::new(),
            kubeadm_config_patches: Vec::new(),
            kubeadm_config_patches_json6902: Vec::new(),
            runtime_config: Some(RuntimeConfig::default()),
        }
    }

    /// `newConfig(cpCount, workerCount)` from §4.1: error-free for
    /// `cpCount >= 0, workerCount >= 0`; an implicit external load-balancer
    /// node is added when `cpCount > 1`.
    pub fn from_counts(name: &str, cp_count: u32, worker_count: u32) -> Self {
        let mut nodes = Vec::new();
        if cp_count > 0 {
            nodes.push(NodeConfig {
                role: NodeRole::ControlPlane,
                replicas: Some(cp_count),
                cluster_name: name.to_string(),
                ..NodeConfig::default()
            });
        }
        if worker_count > 0 {
            nodes.push(NodeConfig {
                role: NodeRole::Worker,
                replicas: Some(worker_count),
                cluster_name: name.to_string(),
                ..NodeConfig::default()
            });
        }
        if cp_count > 1 {
            nodes.push(NodeConfig {
                role: NodeRole::ExternalLoadBalancer,
                replicas: Some(1),
                cluster_name: name.to_string(),
                ..NodeConfig::default()
            });
        }
        if nodes.is_empty() {
            return Self::default_with_name(name);
        }

        let mut config = Self {
            api_version: API_VERSION_V1ALPHA4.to_string(),
            kind: "Cluster".to_string(),
            name: name.to_string(),
            nodes,
            networking: NetworkingConfig::default(),
            feature_gates: BTreeMap::new(),
            kubeadm_config_patches: Vec::new(),
            kubeadm_config_patches_json6902: Vec::new(),
            runtime_config: Some(RuntimeConfig::default()),
        };
        config.apply_defaults();
        config
    }

    /// Load cluster configuration from a YAML document on disk, applying
    /// §4.1's version dispatch, defaulting, and validation.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> KinaResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(KinaError::Io)?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("failed to load cluster config: {}", path.display()))
            .map_err(KinaError::Context)
    }

    /// Decode a single YAML document (the earliest `---`-delimited document
    /// if several are present, per §6), dispatch on `apiVersion`, default,
    /// and validate.
    pub fn from_yaml_str(content: &str) -> KinaResult<Self> {
        let first_doc = content.split("\n---").next().unwrap_or(content);

        let header: VersionHeader = serde_yaml::from_str(first_doc)
            .map_err(|e| KinaError::Config(ConfigError::InvalidFormat { reason: e.to_string() }))?;

        match header.api_version.as_str() {
            API_VERSION_V1ALPHA4 => {
                let mut config: Self = serde_yaml::from_str(first_doc)
                    .map_err(|e| KinaError::Config(ConfigError::InvalidFormat { reason: e.to_string() }))?;
                config.apply_defaults();
                config.validate().map_err(KinaError::Validation)?;
                Ok(config)
            }
            API_VERSION_V1ALPHA3 => {
                // Historical single-node shape: one node, no role field.
                let legacy: LegacySingleNodeConfig = serde_yaml::from_str(first_doc)
                    .map_err(|e| KinaError::Config(ConfigError::InvalidFormat { reason: e.to_string() }))?;
                let mut config = Self::default_with_name(&legacy.name);
                if let Some(image) = legacy.image {
                    config.nodes[0].image = Some(image);
                }
                config.nodes[0].kubeadm_config_patches = legacy.kubeadm_config_patches;
                config.apply_defaults();
                config.validate().map_err(KinaError::Validation)?;
                Ok(config)
            }
            other => Err(KinaError::Config(ConfigError::UnknownVersion {
                version: other.to_string(),
            })),
        }
    }

    /// Save cluster configuration to file.
    pub async fn to_file<P: AsRef<Path>>(&self, path: P) -> KinaResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(KinaError::Io)?;
        }

        let content = serde_yaml::to_string(self)?;
        tokio::fs::write(path, content).await.map_err(KinaError::Io)?;
        Ok(())
    }

    /// §4.1 defaulting rules, run on the internal form before validation:
    /// empty node list -> one control-plane node with the default image;
    /// missing image -> default image; missing API-server bind address ->
    /// 127.0.0.1; multi-control-plane without an explicit LB gets one added.
    pub fn apply_defaults(&mut self) {
        if self.nodes.is_empty() {
            self.nodes.push(NodeConfig::default());
        }

        for node in &mut self.nodes {
            if node.image.is_none() {
                node.image = Some(DEFAULT_NODE_IMAGE.to_string());
            }
        }

        if self.networking.api_server_address.is_none() {
            self.networking.api_server_address = Some(DEFAULT_API_BIND_ADDRESS.to_string());
        }

        let cp_instances: u32 = self
            .nodes
            .iter()
            .filter(|n| n.role == NodeRole::ControlPlane)
            .map(|n| n.replicas.unwrap_or(1))
            .sum();
        let has_lb = self
            .nodes
            .iter()
            .any(|n| n.role == NodeRole::ExternalLoadBalancer);

        if cp_instances > 1 && !has_lb {
            self.nodes.push(NodeConfig {
                role: NodeRole::ExternalLoadBalancer,
                replicas: Some(1),
                cluster_name: self.name.clone(),
                ..NodeConfig::default()
            });
        }

        self.assign_node_names();
    }

    /// Assign internal per-spec names (pre-replica-expansion); the roster
    /// builder (`core::roster`) assigns the real, replica-expanded instance
    /// names used for containers.
    pub fn assign_node_names(&mut self) {
        let mut counts: BTreeMap<NodeRole, u32> = BTreeMap::new();
        for node in &mut self.nodes {
            node.cluster_name = self.name.clone();
            let count = counts.entry(node.role).or_insert(0);
            node.name = format!("{}-{}-{}", self.name, node.role, count);
            *count += 1;
        }
    }

    /// Validate the cluster configuration, accumulating every independent
    /// defect into a single `ValidationErrors` rather than failing fast
    /// (§7's propagation policy, §8 invariant 8).
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let cp_instances: u32 = self
            .nodes
            .iter()
            .filter(|n| n.role == NodeRole::ControlPlane)
            .map(|n| n.replicas.unwrap_or(1))
            .sum();
        if cp_instances == 0 {
            errors.push("cluster configuration must have at least one control-plane node");
        }

        if self.name.is_empty() {
            errors.push("cluster name cannot be empty");
        }

        let lb_instances: u32 = self
            .nodes
            .iter()
            .filter(|n| n.role == NodeRole::ExternalLoadBalancer)
            .map(|n| n.replicas.unwrap_or(1))
            .sum();
        if lb_instances > 1 {
            errors.push("at most one external-load-balancer node is allowed (already-exists)");
        }
        if cp_instances > 1 && lb_instances == 0 {
            errors.push(
                "multiple control-plane nodes require an external-load-balancer node (none present after defaulting)",
            );
        }

        let etcd_instances: u32 = self
            .nodes
            .iter()
            .filter(|n| n.role == NodeRole::ExternalEtcd)
            .map(|n| n.replicas.unwrap_or(1))
            .sum();
        if etcd_instances > 1 {
            errors.push("at most one external-etcd node is allowed (already-exists)");
        }

        self.networking.validate(&mut errors);

        for (index, node) in self.nodes.iter().enumerate() {
            node.validate(index, &mut errors);
        }

        errors.into_result()
    }

    pub fn control_plane_nodes(&self) -> Vec<&NodeConfig> {
        self.nodes
            .iter()
            .filter(|n| n.role == NodeRole::ControlPlane)
            .collect()
    }

    pub fn worker_nodes(&self) -> Vec<&NodeConfig> {
        self.nodes
            .iter()
            .filter(|n| n.role == NodeRole::Worker)
            .collect()
    }

    pub fn primary_control_plane(&self) -> Option<&NodeConfig> {
        self.control_plane_nodes().into_iter().next()
    }
}

/// Helper used only to sniff `apiVersion` before picking a concrete decode
/// path.
#[derive(Debug, Deserialize)]
struct VersionHeader {
    #[serde(rename = "apiVersion")]
    api_version: String,
}

/// Historical single-node document shape (no `nodes` list, no `role`):
/// converted by materializing one control-plane node (§4.1 Conversion).
#[derive(Debug, Deserialize)]
struct LegacySingleNodeConfig {
    name: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(rename = "kubeadmConfigPatches", default)]
    kubeadm_config_patches: Vec<String>,
}

impl NetworkingConfig {
    fn validate(&self, errors: &mut ValidationErrors) {
        let pod_nets = self.parse_subnet_list(self.pod_subnet.as_deref(), "podSubnet", errors);
        let service_nets =
            self.parse_subnet_list(self.service_subnet.as_deref(), "serviceSubnet", errors);

        self.check_family_match(&pod_nets, "podSubnet", errors);
        self.check_family_match(&service_nets, "serviceSubnet", errors);

        if let Some(port) = self.api_server_port {
            // u16 already bounds this to [0, 65535]; nothing further to check.
            let _ = port;
        }
    }

    fn parse_subnet_list(
        &self,
        raw: Option<&str>,
        field: &str,
        errors: &mut ValidationErrors,
    ) -> Vec<IpNet> {
        let Some(raw) = raw else { return Vec::new() };
        let mut nets = Vec::new();
        for part in raw.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match part.parse::<IpNet>() {
                Ok(net) => nets.push(net),
                Err(_) => errors.push(format!("invalid {}: {}", field, part)),
            }
        }
        nets
    }

    fn check_family_match(&self, nets: &[IpNet], field: &str, errors: &mut ValidationErrors) {
        for net in nets {
            let is_v6 = matches!(net, IpNet::V6(_));
            let mismatch = match self.ip_family {
                IpFamily::Ipv4 => is_v6,
                IpFamily::Ipv6 => !is_v6,
                IpFamily::DualStack => false,
            };
            if mismatch {
                errors.push(format!(
                    "{} {} does not match ipFamily {:?}",
                    field, net, self.ip_family
                ));
            }
        }
    }
}

impl NodeConfig {
    fn validate(&self, index: usize, errors: &mut ValidationErrors) {
        if self.image.as_deref().unwrap_or("").is_empty() {
            errors.push(format!("node[{}]: image cannot be empty", index));
        }

        for mount in &self.extra_mounts {
            if mount.host_path.as_os_str().is_empty() {
                errors.push(format!("node[{}]: mount host path cannot be empty", index));
            }
            if mount.container_path.as_os_str().is_empty() {
                errors.push(format!(
                    "node[{}]: mount container path cannot be empty",
                    index
                ));
            }
        }

        for port in &self.extra_port_mappings {
            if port.container_port == 0 {
                errors.push(format!("node[{}]: container port cannot be 0", index));
            }
            // host_port/container_port are u16, so the [0, 65535] bound from
            // §3 is a type-level invariant here.
        }
    }
}

/// Helper function for serde skip_serializing_if
fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cluster_config() {
        let config = ClusterConfig::default_with_name("test-cluster");

        assert_eq!(config.name, "test-cluster");
        assert_eq!(config.api_version, "kind.x-k8s.io/v1alpha4");
        assert_eq!(config.kind, "Cluster");
        assert_eq!(config.nodes.len(), 1);
        assert_eq!(config.nodes[0].role, NodeRole::ControlPlane);
    }

    #[test]
    fn test_yaml_serialization() {
        let config = ClusterConfig::default_with_name("test");
        let yaml = serde_yaml::to_string(&config).unwrap();

        let deserialized: ClusterConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.name, deserialized.name);
    }

    #[test]
    fn test_validation_accumulates_multiple_defects() {
        let mut config = ClusterConfig::default_with_name("test");
        config.name = String::new();
        config.nodes.clear();

        let result = config.validate();
        let errors = result.unwrap_err();
        // empty name + zero control planes: at least 2 independent defects.
        assert!(errors.len() >= 2);
    }

    #[test]
    fn test_multi_control_plane_requires_lb() {
        let mut config = ClusterConfig::from_counts("ha", 3, 2);
        // from_counts already adds the implicit LB; removing it should fail.
        config.nodes.retain(|n| n.role != NodeRole::ExternalLoadBalancer);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_counts_adds_implicit_lb() {
        let config = ClusterConfig::from_counts("ha", 3, 2);
        assert!(config
            .nodes
            .iter()
            .any(|n| n.role == NodeRole::ExternalLoadBalancer));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ip_family_mismatch_is_rejected() {
        let mut config = ClusterConfig::default_with_name("test");
        config.networking.ip_family = IpFamily::Ipv6;
        config.networking.pod_subnet = Some("10.244.0.0/16".to_string());
        assert!(config.validate().is_err());
    }
}
