//! Cluster-creation orchestrator (§2): wires the config model, roster
//! derivation, image pre-pull, node provisioning, the action engine, and
//! kubeconfig export into the single pipeline `kina create` runs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use crate::config::cluster_config::ClusterConfig;
use crate::core::actions::{self, CancellationToken, ExecContext};
use crate::core::kubeconfig;
use crate::core::provider::ContainerProvider;
use crate::core::provisioner;
use crate::core::roster::Roster;
use crate::core::types::CreateClusterOptions;
use crate::errors::{ClusterError, KinaError, KinaResult};

/// The container port the bootstrap tool's API server always binds on
/// every control-plane node, and the port HAProxy's frontend listens on
/// when an external load balancer is present (§4.3/§4.5).
const API_SERVER_CONTAINER_PORT: u16 = 6443;
const STANDARD_ACTIONS: &[&str] = &["haproxy", "config", "init", "join"];

/// Build the cluster config this create call will provision: from
/// `options.config_file` when given, otherwise from the CLI's node-count
/// flags (or the single-control-plane default), then run the same
/// defaulting and validation pipeline either path shares.
fn resolve_cluster_config(options: &CreateClusterOptions) -> KinaResult<ClusterConfig> {
    let mut config = if let Some(path) = &options.config_file {
        let content = std::fs::read_to_string(path).map_err(KinaError::Io)?;
        ClusterConfig::from_yaml_str(&content)?
    } else if options.control_plane_nodes.is_some() || options.workers.is_some() {
        ClusterConfig::from_counts(
            &options.name,
            options.control_plane_nodes.unwrap_or(1),
            options.workers.unwrap_or(0),
        )
    } else {
        ClusterConfig::default_with_name(&options.name)
    };

    config.name = options.name.clone();
    if options.config_file.is_none() {
        for node in &mut config.nodes {
            node.image = Some(options.image.clone());
        }
    }

    config.apply_defaults();
    config.validate().map_err(KinaError::Validation)?;
    Ok(config)
}

/// A kubeadm-compatible bootstrap token (`[a-z0-9]{6}.[a-z0-9]{16}`),
/// seeded from wall-clock time and the process id. Not cryptographically
/// hardened (the `rand` crate isn't part of this stack) — adequate for a
/// token whose only job is gating a join within a single local cluster's
/// short-lived bootstrap window.
fn generate_token() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mixed = nanos
        .wrapping_mul(6364136223846793005)
        .wrapping_add(std::process::id() as u128);
    let hex = format!("{:032x}", mixed);
    format!("{}.{}", &hex[0..6], &hex[6..22])
}

/// Run the full §2 pipeline: fail fast on a duplicate name (§9 open
/// question, resolved), derive the roster, provision every node, run the
/// standard action plan, then export and merge the admin kubeconfig. On
/// any failure the cluster's containers are torn down unless
/// `retain_on_failure` was requested.
pub async fn create_cluster(
    provider: Arc<dyn ContainerProvider>,
    options: CreateClusterOptions,
) -> KinaResult<()> {
    if provider.cluster_exists(&options.name).await? {
        return Err(KinaError::Cluster(ClusterError::AlreadyExists {
            name: options.name.clone(),
        }));
    }

    let config = resolve_cluster_config(&options)?;
    let roster = Arc::new(Roster::derive(&config)?);

    match run_pipeline(Arc::clone(&provider), &config, Arc::clone(&roster), &options).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if options.retain_on_failure {
                warn!(
                    "cluster '{}' creation failed, retaining containers for inspection (--retain): {}",
                    options.name, e
                );
            } else {
                warn!("cluster '{}' creation failed, cleaning up: {}", options.name, e);
                if let Err(cleanup_err) = provider.cleanup_cluster(&options.name).await {
                    warn!("cleanup after failed creation also failed: {}", cleanup_err);
                }
            }
            Err(e)
        }
    }
}

async fn run_pipeline(
    provider: Arc<dyn ContainerProvider>,
    config: &ClusterConfig,
    roster: Arc<Roster>,
    options: &CreateClusterOptions,
) -> KinaResult<()> {
    info!(
        "provisioning {} node(s) for cluster '{}'",
        roster.len(),
        config.name
    );
    let provisioned = provisioner::provision_and_wait(&provider, config, &roster).await?;

    // HA port-exposure rule (§4.3): with more than one control plane the
    // API server is fronted by the external load balancer; otherwise the
    // bootstrap control plane itself carries the host exposure.
    let is_ha = roster.control_planes().len() > 1;
    let exposure_node = if is_ha {
        roster.external_load_balancer()
    } else {
        roster.bootstrap()
    }
    .ok_or_else(|| {
        KinaError::Cluster(ClusterError::InvalidState {
            state: "roster has no node carrying the API-server exposure".to_string(),
        })
    })?;
    let exposure_container = provisioned
        .container_ids
        .get(&exposure_node.name)
        .cloned()
        .ok_or_else(|| {
            KinaError::Cluster(ClusterError::NotFound {
                name: exposure_node.name.clone(),
            })
        })?;

    let host_api_port = provider
        .get_host_port(&exposure_container, API_SERVER_CONTAINER_PORT)
        .await?
        .unwrap_or(API_SERVER_CONTAINER_PORT);

    let kubeconfig_output_path = kubeconfig::individual_path(&config.name)?;
    if let Some(parent) = kubeconfig_output_path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(KinaError::Io)?;
    }

    let ctx = Arc::new(ExecContext {
        provider: Arc::clone(&provider),
        roster: Arc::clone(&roster),
        cluster_name: config.name.clone(),
        control_plane_port: API_SERVER_CONTAINER_PORT,
        api_bind_port: API_SERVER_CONTAINER_PORT,
        token: generate_token(),
        wait_duration: options.wait_timeout.map(Duration::from_secs),
        kubeconfig_output_path: kubeconfig_output_path.clone(),
        container_ids: provisioned.container_ids,
        node_ips: provisioned.node_ips,
        host_api_port,
        disable_default_cni: config.networking.disable_default_cni,
    });

    let action_names: Vec<String> = STANDARD_ACTIONS.iter().map(|s| s.to_string()).collect();
    let plan = actions::plan(&action_names, &roster)?;
    actions::execute(plan, Arc::clone(&ctx), &CancellationToken::new()).await?;

    export_kubeconfig(config, &config.name, &kubeconfig_output_path, host_api_port).await?;

    Ok(())
}

/// The `init` action already wrote the bootstrap node's admin kubeconfig
/// to `path` with its port rewritten to `host_api_port` (it has no view
/// of the host-facing address). Finish the job: rewrite the server
/// address too, then merge into the host's kubeconfig.
async fn export_kubeconfig(
    config: &ClusterConfig,
    cluster_name: &str,
    path: &PathBuf,
    host_api_port: u16,
) -> KinaResult<()> {
    let raw = tokio::fs::read_to_string(path).await.map_err(KinaError::Io)?;
    let host_address = config
        .networking
        .api_server_address
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let rewritten = kubeconfig::rewrite(&raw, cluster_name, &format!("{}:{}", host_address, host_api_port))?;
    kubeconfig::save(cluster_name, &rewritten).await
}
