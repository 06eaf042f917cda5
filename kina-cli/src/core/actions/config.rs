//! Action `config` (§4.4.2): renders and patches the bootstrap control
//! plane's kubeadm config and writes it into the node.

use std::sync::Arc;

use crate::core::actions::{ExecContext, Task};
use crate::core::bootstrap_config;
use crate::core::roster::{NodeSelector, RosterEntry};
use crate::errors::KinaResult;

const DEFAULT_KUBERNETES_VERSION: &str = "v1.31.0";

pub fn tasks() -> Vec<Task> {
    vec![Task {
        description: "render bootstrap kubeadm configuration".to_string(),
        selector: NodeSelector::Bootstrap,
        run: Arc::new(|ctx, entry| Box::pin(run(ctx, entry))),
    }]
}

async fn run(ctx: Arc<ExecContext>, entry: RosterEntry) -> KinaResult<()> {
    let container_id = ctx.container_id_for(&entry.name)?;

    let version_probe = ctx
        .provider
        .exec_in_container(container_id, &["cat", "/kind/version"])
        .await?;
    let kubernetes_version = if version_probe.success && !version_probe.stdout.trim().is_empty() {
        version_probe.stdout.trim().to_string()
    } else {
        DEFAULT_KUBERNETES_VERSION.to_string()
    };

    let control_plane_endpoint = match ctx.roster.external_load_balancer() {
        Some(lb) => {
            let lb_ip = ctx.node_ips.get(&lb.name).cloned().unwrap_or_default();
            format!("{}:{}", lb_ip, ctx.control_plane_port)
        }
        None => String::new(),
    };

    let data = bootstrap_config::ConfigData {
        cluster_name: ctx.cluster_name.clone(),
        kubernetes_version,
        control_plane_endpoint,
        api_bind_port: ctx.api_bind_port,
        token: ctx.token.clone(),
    };

    let json6902: Vec<String> = entry
        .kubeadm_config_patches_json6902
        .iter()
        .map(|p| p.patch.clone())
        .collect();

    let rendered = bootstrap_config::render_and_patch(&data, &entry.kubeadm_config_patches, &json6902)?;

    ctx.provider
        .write_file_to_container(container_id, "/kind/kubeadm.conf", &rendered)
        .await?;

    Ok(())
}
