//! Node provisioning (§4.3): image pre-pull, container creation via the
//! `ContainerProvider` collaborator, and per-node readiness polling.
//! Wraps `ContainerProvider::provision`, which already applies the
//! roster derivation and the HA port-exposure rule.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::config::ClusterConfig;
use crate::core::provider::ContainerProvider;
use crate::core::roster::Roster;
use crate::errors::{ClusterError, KinaError, KinaResult};

const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(500);
const READINESS_TIMEOUT: Duration = Duration::from_secs(30);
const IMAGE_PULL_ATTEMPTS: u32 = 4;
const IMAGE_PULL_BASE_BACKOFF: Duration = Duration::from_millis(500);

/// The per-node addressing a provisioned roster resolves to, handed to
/// the action engine as `ExecContext::container_ids`/`node_ips`.
pub struct ProvisionedNodes {
    pub container_ids: BTreeMap<String, String>,
    pub node_ips: BTreeMap<String, String>,
}

/// Pull every distinct image referenced by the roster, best-effort: a
/// failed pull after exhausting retries is logged and does not fail
/// provisioning (`image-pull` is non-fatal per §7).
pub async fn pre_pull_images(provider: &Arc<dyn ContainerProvider>, roster: &Roster) -> KinaResult<()> {
    let mut images: Vec<&str> = roster.all().iter().map(|e| e.image.as_str()).collect();
    images.sort_unstable();
    images.dedup();

    for image in images {
        if image.is_empty() {
            continue;
        }
        let mut attempt = 0;
        loop {
            attempt += 1;
            match provider.pull_image(image).await {
                Ok(()) => break,
                Err(e) if attempt < IMAGE_PULL_ATTEMPTS => {
                    let backoff = IMAGE_PULL_BASE_BACKOFF * 2u32.pow(attempt - 1);
                    warn!(
                        "image pull attempt {} for '{}' failed ({}), retrying in {:?}",
                        attempt, image, e, backoff
                    );
                    sleep(backoff).await;
                }
                Err(e) => {
                    warn!(
                        "image pull for '{}' failed after {} attempts: {}; proceeding anyway",
                        image, attempt, e
                    );
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Create every roster node's container (via `provider.provision`), then
/// resolve each node's container id and IP and poll it for readiness.
pub async fn provision_and_wait(
    provider: &Arc<dyn ContainerProvider>,
    config: &ClusterConfig,
    roster: &Roster,
) -> KinaResult<ProvisionedNodes> {
    pre_pull_images(provider, roster).await?;

    provider.provision(config).await?;

    let nodes = provider.list_nodes(&config.name).await?;

    let mut container_ids = BTreeMap::new();
    let mut node_ips = BTreeMap::new();

    for entry in roster.all() {
        let container_name = format!("{}-{}", config.name, entry.name);
        let node = nodes
            .iter()
            .find(|n| n.container_id == container_name || n.name == container_name)
            .ok_or_else(|| {
                KinaError::Cluster(ClusterError::NotFound {
                    name: container_name.clone(),
                })
            })?;

        wait_for_ready(provider, &node.container_id, &entry.name).await?;

        container_ids.insert(entry.name.clone(), node.container_id.clone());
        if let Some(ip) = &node.ip_address {
            node_ips.insert(entry.name.clone(), ip.clone());
        }
    }

    Ok(ProvisionedNodes {
        container_ids,
        node_ips,
    })
}

/// Poll a node's container every 500ms up to 30s for basic readiness (the
/// container answers an exec call). Times out with `node-not-ready`.
async fn wait_for_ready(provider: &Arc<dyn ContainerProvider>, container_id: &str, node_name: &str) -> KinaResult<()> {
    let started = std::time::Instant::now();
    loop {
        if let Ok(result) = provider.exec_in_container(container_id, &["true"]).await {
            if result.success {
                return Ok(());
            }
        }

        if started.elapsed() >= READINESS_TIMEOUT {
            return Err(KinaError::Cluster(ClusterError::NodeNotReady {
                node: node_name.to_string(),
                seconds: READINESS_TIMEOUT.as_secs(),
            }));
        }

        sleep(READINESS_POLL_INTERVAL).await;
    }
}

