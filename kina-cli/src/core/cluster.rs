use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::apple_provider::AppleContainerProvider;
use super::kubernetes::KubernetesClient;
use super::orchestrator;
use super::provider::ContainerProvider;
use super::types::{ClusterInfo, CreateClusterOptions, LoadImageOptions, NodeInfo};
use crate::config::Config;
use crate::core::kubeconfig;

/// Cluster manager: the CLI-facing façade over the provisioning
/// orchestrator and the `AppleContainerProvider` collaborator. Owns the
/// ambient operations (CSR bootstrap, kubeconfig cleanup) the orchestrator
/// itself doesn't need to know about.
pub struct ClusterManager {
    config: Config,
    provider: Arc<AppleContainerProvider>,
    kubernetes: KubernetesClient,
}

impl ClusterManager {
    /// Create a new cluster manager
    pub async fn new(config: &Config) -> Result<Self> {
        let provider = AppleContainerProvider::new(config.clone()).await?;
        let kubernetes = KubernetesClient::new(config)?;

        Ok(Self {
            config: config.clone(),
            provider: Arc::new(provider),
            kubernetes,
        })
    }

    fn provider_handle(&self) -> Arc<dyn ContainerProvider> {
        let provider: Arc<dyn ContainerProvider> = self.provider.clone();
        provider
    }

    /// Report the detected Apple Container CLI's version, for display in
    /// `kina status`.
    pub async fn container_version(&self) -> String {
        self.provider.cli_version().await
    }

    /// Create a new Kubernetes cluster
    pub async fn create_cluster(&self, options: CreateClusterOptions) -> Result<()> {
        info!(
            "Creating cluster '{}' with image '{}'",
            options.name, options.image
        );

        orchestrator::create_cluster(self.provider_handle(), options.clone())
            .await
            .context("Failed to provision cluster")?;

        if options.skip_csr_approval {
            info!("Skipping kubelet CSR auto-approval (--skip-csr-approval specified)");
            warn!(
                "You may need to manually approve CSRs with: kina approve-csr {}",
                options.name
            );
        } else {
            info!("Bootstrapping kubelet CSR auto-approval...");
            if let Err(e) = self.bootstrap_kubelet_csrs(&options.name).await {
                warn!(
                    "Failed to bootstrap kubelet CSRs (this may cause TLS errors): {}",
                    e
                );
                warn!(
                    "You can manually approve CSRs later with: kina approve-csr {}",
                    options.name
                );
            }
        }

        info!("Cluster '{}' created successfully", options.name);
        Ok(())
    }

    /// Delete a Kubernetes cluster
    pub async fn delete_cluster(&self, name: &str) -> Result<()> {
        info!("Deleting cluster '{}'", name);

        if !self.cluster_exists(name).await? {
            warn!("Cluster '{}' does not exist", name);
            return Ok(());
        }

        self.provider
            .cleanup_cluster(name)
            .await
            .context("Failed to delete cluster")?;

        kubeconfig::remove(name)
            .await
            .context("Failed to clean up kubeconfig")?;

        info!("Cluster '{}' deleted successfully", name);
        Ok(())
    }

    /// Delete all clusters
    pub async fn delete_all_clusters(&self) -> Result<()> {
        let clusters = self.list_clusters().await?;

        if clusters.is_empty() {
            info!("No clusters to delete");
            return Ok(());
        }

        for cluster in clusters {
            if let Err(e) = self.delete_cluster(&cluster.name).await {
                warn!("Failed to delete cluster '{}': {}", cluster.name, e);
            }
        }

        Ok(())
    }

    /// List all existing clusters
    pub async fn list_clusters(&self) -> Result<Vec<ClusterInfo>> {
        debug!("Listing clusters");

        let names = self.provider.list_clusters().await?;
        let mut infos = Vec::with_capacity(names.len());
        for name in names {
            let info = self.provider.get_cluster_info(&name).await?;
            infos.push(ClusterInfo {
                name: info.name,
                image: "n/a".to_string(),
                status: info.status,
                created: info.created,
                nodes: info
                    .nodes
                    .iter()
                    .map(|n| NodeInfo {
                        name: n.name.clone(),
                        role: n.role,
                        status: n.status.clone(),
                        version: n.kubernetes_version.clone().unwrap_or_else(|| "unknown".to_string()),
                        container_id: Some(n.container_id.clone()),
                        ip_address: n.ip_address.clone(),
                    })
                    .collect(),
                kubeconfig_path: kubeconfig::individual_path(&info.name)
                    .ok()
                    .map(|p| p.display().to_string()),
            });
        }
        Ok(infos)
    }

    /// Check if a cluster exists
    pub async fn cluster_exists(&self, name: &str) -> Result<bool> {
        Ok(self.provider.cluster_exists(name).await?)
    }

    /// Get kubeconfig for a cluster
    pub async fn get_kubeconfig(&self, name: &str) -> Result<String> {
        debug!("Getting kubeconfig for cluster '{}'", name);

        if !self.cluster_exists(name).await? {
            return Err(anyhow::anyhow!("Cluster '{}' does not exist", name));
        }

        let path = kubeconfig::individual_path(name)?;
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read kubeconfig at {}", path.display()))
    }

    /// Get nodes in a cluster
    pub async fn get_nodes(&self, name: &str) -> Result<Vec<String>> {
        debug!("Getting nodes for cluster '{}'", name);

        if !self.cluster_exists(name).await? {
            return Err(anyhow::anyhow!("Cluster '{}' does not exist", name));
        }

        let nodes = self.provider.list_nodes(name).await?;
        Ok(nodes.into_iter().map(|n| n.name).collect())
    }

    /// Load a container image into a cluster
    pub async fn load_image(&self, options: LoadImageOptions) -> Result<()> {
        info!(
            "Loading image '{}' into cluster '{}'",
            options.image, options.cluster
        );

        if !self.cluster_exists(&options.cluster).await? {
            return Err(anyhow::anyhow!(
                "Cluster '{}' does not exist",
                options.cluster
            ));
        }

        self.provider
            .load_image_into_cluster(&options.cluster, &options.image)
            .await
            .context("Failed to load image into cluster")?;

        info!(
            "Image '{}' loaded successfully into cluster '{}'",
            options.image, options.cluster
        );
        Ok(())
    }

    /// Get detailed status for a specific cluster
    pub async fn get_cluster_status(&self, name: &str) -> Result<ClusterInfo> {
        debug!("Getting detailed status for cluster '{}'", name);

        let clusters = self.list_clusters().await?;
        clusters
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| anyhow::anyhow!("Cluster '{}' does not exist", name))
    }

    /// Bootstrap kubelet CSR auto-approval for a cluster. Prevents TLS
    /// errors with kubectl logs/exec by auto-approving kubelet-serving
    /// CSRs right after the control plane comes up.
    async fn bootstrap_kubelet_csrs(&self, cluster_name: &str) -> Result<()> {
        info!(
            "Bootstrapping kubelet CSR auto-approval for cluster '{}'",
            cluster_name
        );

        let kubeconfig_path = kubeconfig::individual_path(cluster_name)?;
        let kubeconfig_str = kubeconfig_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid kubeconfig path"))?;

        self.kubernetes
            .bootstrap_approve_kubelet_csrs(kubeconfig_str, 60)
            .await
            .context("Failed to bootstrap kubelet CSR auto-approval")?;

        info!(
            "Kubelet CSR bootstrap completed for cluster '{}'",
            cluster_name
        );
        Ok(())
    }

    /// Manually approve any pending kubelet-serving CSRs for a cluster.
    /// This can be used to fix TLS issues in existing clusters.
    pub async fn approve_kubelet_csrs(&self, cluster_name: &str) -> Result<()> {
        info!(
            "Approving pending kubelet CSRs for cluster '{}'",
            cluster_name
        );

        if !self.cluster_exists(cluster_name).await? {
            return Err(anyhow::anyhow!("Cluster '{}' does not exist", cluster_name));
        }

        let kubeconfig_path = self
            .config
            .kubernetes
            .kubeconfig_dir
            .join(format!("{}.yaml", cluster_name));
        let kubeconfig_str = kubeconfig_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid kubeconfig path"))?;

        self.kubernetes
            .auto_approve_kubelet_csrs(kubeconfig_str)
            .await
            .context("Failed to approve kubelet CSRs")?;

        info!(
            "Kubelet CSR approval completed for cluster '{}'",
            cluster_name
        );
        Ok(())
    }
}
