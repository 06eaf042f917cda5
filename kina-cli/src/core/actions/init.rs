//! Action `init` (§4.4.3): runs cluster bootstrap on the control-plane
//! node that already has its kubeadm config written, then performs the
//! post-init steps a freshly bootstrapped node needs.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::core::actions::{ExecContext, Task};
use crate::core::roster::{NodeSelector, RosterEntry};
use crate::errors::KinaResult;

const DEFAULT_CNI_MANIFEST: &str = "/kind/manifests/default-cni.yaml";
const STORAGE_CLASS_MANIFEST: &str = include_str!("storage_class.yaml");
const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);
const UPSTREAM_OVERLAY_CNI_MANIFEST: &str =
    "https://raw.githubusercontent.com/aojea/kindnet/main/install-kindnet.yaml";

pub fn tasks() -> Vec<Task> {
    vec![Task {
        description: "initialize control plane".to_string(),
        selector: NodeSelector::Bootstrap,
        run: Arc::new(|ctx, entry| Box::pin(run(ctx, entry))),
    }]
}

async fn run(ctx: Arc<ExecContext>, entry: RosterEntry) -> KinaResult<()> {
    let container_id = ctx.container_id_for(&entry.name)?.to_string();

    ctx.exec_checked(
        &container_id,
        &[
            "kubeadm",
            "init",
            "--config=/kind/kubeadm.conf",
            "--skip-token-print",
            "--ignore-preflight-errors=all",
        ],
    )
    .await?;

    let admin_conf = ctx
        .provider
        .read_file_from_container(&container_id, "/etc/kubernetes/admin.conf")
        .await?;
    let rewritten = admin_conf.replace(
        &format!(":{}", ctx.api_bind_port),
        &format!(":{}", ctx.host_api_port),
    );
    tokio::fs::write(&ctx.kubeconfig_output_path, rewritten)
        .await
        .map_err(crate::errors::KinaError::Io)?;

    if ctx.disable_default_cni {
        warn!(
            "networking.disableDefaultCNI set, skipping CNI install on node {}",
            entry.name
        );
    } else {
        let cni_probe = ctx
            .provider
            .exec_in_container(&container_id, &["test", "-f", DEFAULT_CNI_MANIFEST])
            .await?;
        if cni_probe.success {
            ctx.exec_checked(
                &container_id,
                &["kubectl", "--kubeconfig=/etc/kubernetes/admin.conf", "apply", "-f", DEFAULT_CNI_MANIFEST],
            )
            .await?;
        } else {
            warn!(
                "no default CNI manifest on node {}, falling back to upstream overlay install",
                entry.name
            );
            ctx.exec_checked(
                &container_id,
                &[
                    "kubectl",
                    "--kubeconfig=/etc/kubernetes/admin.conf",
                    "apply",
                    "-f",
                    UPSTREAM_OVERLAY_CNI_MANIFEST,
                ],
            )
            .await?;
        }
    }

    if ctx.roster.len() == 1 {
        ctx.exec_checked(
            &container_id,
            &[
                "kubectl",
                "--kubeconfig=/etc/kubernetes/admin.conf",
                "taint",
                "nodes",
                "--all",
                "node-role.kubernetes.io/control-plane-",
            ],
        )
        .await?;
    }

    ctx.provider
        .write_file_to_container(&container_id, "/kind/storage-class.yaml", STORAGE_CLASS_MANIFEST)
        .await?;
    ctx.exec_checked(
        &container_id,
        &[
            "kubectl",
            "--kubeconfig=/etc/kubernetes/admin.conf",
            "apply",
            "-f",
            "/kind/storage-class.yaml",
        ],
    )
    .await?;

    if let Some(wait) = ctx.wait_duration {
        if wait > Duration::ZERO {
            wait_for_node_ready(&ctx, &container_id, &entry.name, wait).await;
        }
    }

    Ok(())
}

/// Poll node-Ready every 500ms up to `deadline`; a timeout logs a warning
/// rather than failing the plan (§4.4.3).
async fn wait_for_node_ready(ctx: &ExecContext, container_id: &str, node_name: &str, deadline: Duration) {
    let started = std::time::Instant::now();
    loop {
        let result = ctx
            .provider
            .exec_in_container(
                container_id,
                &[
                    "kubectl",
                    "--kubeconfig=/etc/kubernetes/admin.conf",
                    "get",
                    "nodes",
                    "-o",
                    "jsonpath={.items[*].status.conditions[?(@.type==\"Ready\")].status}",
                ],
            )
            .await;

        if let Ok(r) = result {
            if r.success && r.stdout.contains("True") && !r.stdout.contains("False") {
                return;
            }
        }

        if started.elapsed() >= deadline {
            warn!(
                "node {} did not report Ready within {:?}, continuing anyway",
                node_name, deadline
            );
            return;
        }

        sleep(READY_POLL_INTERVAL).await;
    }
}
