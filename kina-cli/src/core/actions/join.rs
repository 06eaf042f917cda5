//! Action `join` (§4.4.4): joins secondary control planes and workers to
//! the bootstrapped cluster.

use std::sync::Arc;

use crate::core::actions::{ExecContext, Task};
use crate::core::roster::{NodeSelector, RosterEntry};
use crate::errors::{KinaError, KinaResult};

const PKI_FILES: &[&str] = &[
    "ca.crt",
    "ca.key",
    "front-proxy-ca.crt",
    "front-proxy-ca.key",
    "sa.pub",
    "sa.key",
];
const ETCD_PKI_FILES: &[&str] = &["etcd/ca.crt", "etcd/ca.key"];

pub fn tasks() -> Vec<Task> {
    vec![
        Task {
            description: "join secondary control plane".to_string(),
            selector: NodeSelector::SecondaryControlPlanes,
            run: Arc::new(|ctx, entry| Box::pin(join_control_plane(ctx, entry))),
        },
        Task {
            description: "join worker".to_string(),
            selector: NodeSelector::Workers,
            run: Arc::new(|ctx, entry| Box::pin(join_worker(ctx, entry))),
        },
    ]
}

fn join_address(ctx: &ExecContext) -> KinaResult<String> {
    if let Some(lb) = ctx.roster.external_load_balancer() {
        let lb_ip = ctx.node_ips.get(&lb.name).cloned().unwrap_or_default();
        return Ok(format!("{}:{}", lb_ip, ctx.control_plane_port));
    }
    let bootstrap = ctx.roster.bootstrap().ok_or_else(|| {
        KinaError::Cluster(crate::errors::ClusterError::InvalidState {
            state: "roster has no bootstrap control plane".to_string(),
        })
    })?;
    let bootstrap_ip = ctx.ip_for(&bootstrap.name)?;
    Ok(format!("{}:{}", bootstrap_ip, ctx.api_bind_port))
}

/// Copy the six cluster-wide PKI files (plus the two etcd ones, when
/// there's no external etcd) from the bootstrap control plane to `target`
/// via a host-side temp directory, guaranteed to be cleaned up on return
/// (including the error path) since it is dropped at function exit.
async fn stage_pki(ctx: &ExecContext, bootstrap_container: &str, target_container: &str) -> KinaResult<()> {
    let dir = tempfile::tempdir().map_err(KinaError::Io)?;

    ctx.exec_checked(target_container, &["mkdir", "-p", "/etc/kubernetes/pki/etcd"])
        .await?;

    let include_etcd = ctx.roster.external_etcd().is_none();
    let etcd_files: &[&str] = if include_etcd { ETCD_PKI_FILES } else { &[] };
    let files = PKI_FILES.iter().chain(etcd_files.iter());

    for relative in files {
        let remote_path = format!("/etc/kubernetes/pki/{}", relative);
        let content = ctx
            .provider
            .read_file_from_container(bootstrap_container, &remote_path)
            .await?;

        let local_path = dir.path().join(relative.replace('/', "_"));
        tokio::fs::write(&local_path, &content).await.map_err(KinaError::Io)?;

        ctx.provider
            .write_file_to_container(target_container, &remote_path, &content)
            .await?;
    }

    Ok(())
}

async fn join_control_plane(ctx: Arc<ExecContext>, entry: RosterEntry) -> KinaResult<()> {
    let bootstrap = ctx.roster.bootstrap().ok_or_else(|| {
        KinaError::Cluster(crate::errors::ClusterError::InvalidState {
            state: "roster has no bootstrap control plane".to_string(),
        })
    })?;
    let bootstrap_container = ctx.container_id_for(&bootstrap.name)?.to_string();
    let target_container = ctx.container_id_for(&entry.name)?.to_string();

    stage_pki(&ctx, &bootstrap_container, &target_container).await?;

    let address = join_address(&ctx)?;
    ctx.exec_checked(
        &target_container,
        &[
            "kubeadm",
            "join",
            &address,
            "--token",
            &ctx.token,
            "--experimental-control-plane",
            "--discovery-token-unsafe-skip-ca-verification",
            "--ignore-preflight-errors=all",
        ],
    )
    .await?;

    Ok(())
}

async fn join_worker(ctx: Arc<ExecContext>, entry: RosterEntry) -> KinaResult<()> {
    let target_container = ctx.container_id_for(&entry.name)?.to_string();
    let address = join_address(&ctx)?;

    ctx.exec_checked(
        &target_container,
        &[
            "kubeadm",
            "join",
            &address,
            "--token",
            &ctx.token,
            "--discovery-token-unsafe-skip-ca-verification",
            "--ignore-preflight-errors=all",
        ],
    )
    .await?;

    Ok(())
}
