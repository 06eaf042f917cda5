//! Action `haproxy` (§4.4.1): targets the external load balancer, if any,
//! and configures it to round-robin across every control plane.

use std::sync::Arc;

use crate::core::actions::{ExecContext, Task};
use crate::core::haproxy;
use crate::core::roster::{NodeSelector, RosterEntry};
use crate::errors::KinaResult;

pub fn tasks() -> Vec<Task> {
    vec![Task {
        description: "configure HAProxy load balancer".to_string(),
        selector: NodeSelector::ExternalLoadBalancer,
        run: Arc::new(|ctx, entry| Box::pin(run(ctx, entry))),
    }]
}

async fn run(ctx: Arc<ExecContext>, entry: RosterEntry) -> KinaResult<()> {
    let control_planes: Vec<(String, Option<String>)> = ctx
        .roster
        .control_planes()
        .iter()
        .map(|cp| (cp.name.clone(), ctx.node_ips.get(&cp.name).cloned()))
        .collect();

    let backend_servers = haproxy::backend_servers_from(&control_planes, ctx.api_bind_port)?;
    let data = haproxy::ConfigData {
        control_plane_port: ctx.control_plane_port,
        backend_servers,
    };
    let rendered = haproxy::render(&data)?;

    let container_id = ctx.container_id_for(&entry.name)?;
    ctx.provider
        .write_file_to_container(container_id, "/kind/haproxy.cfg", &rendered)
        .await?;
    ctx.exec_checked(container_id, &["haproxy", "-f", "/kind/haproxy.cfg", "-D"])
        .await?;

    Ok(())
}
