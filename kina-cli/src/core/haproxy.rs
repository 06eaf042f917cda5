//! HAProxy configuration renderer (§4.5): a pure function from
//! `ConfigData` to config text. No I/O, no clock, no randomness — identical
//! inputs always produce byte-identical output.

use std::collections::BTreeMap;

use crate::errors::{KinaError, KinaResult};

/// Input to the renderer: the control-plane API port the frontend listens
/// on, and a name -> "ip:port" mapping of backend servers.
#[derive(Debug, Clone)]
pub struct ConfigData {
    pub control_plane_port: u16,
    pub backend_servers: BTreeMap<String, String>,
}

const TEMPLATE_HEADER: &str = "\
# generated by kina, do not edit by hand
global
    log /dev/log local0
    maxconn 4096

defaults
    log global
    mode tcp
    option tcplog
    timeout connect 5s
    timeout client 30s
    timeout server 30s

frontend control-plane
    bind *:{port}
    default_backend control-plane-backend

backend control-plane-backend
    balance roundrobin
    option ssl-hello-chk
";

/// Render the fixed HAProxy template. Backend-server lines are emitted in
/// server-name order (§4.5/§8 invariant 5) because `BTreeMap` iterates in
/// key order.
pub fn render(data: &ConfigData) -> KinaResult<String> {
    let mut out = TEMPLATE_HEADER.replace("{port}", &data.control_plane_port.to_string());

    for (name, address) in &data.backend_servers {
        out.push_str(&format!(
            "    server {name} {address} check check-ssl verify none\n",
            name = name,
            address = address
        ));
    }

    Ok(out)
}

/// Compute the `{name -> "ip:port"}` map the renderer expects from a list
/// of control-plane (name, ip) pairs and the shared API-server container
/// port.
pub fn backend_servers_from(
    control_planes: &[(String, Option<String>)],
    api_server_container_port: u16,
) -> KinaResult<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for (name, ip) in control_planes {
        let ip = ip.as_ref().ok_or_else(|| {
            KinaError::Template {
                reason: format!("control-plane '{}' has no IP address yet", name),
            }
        })?;
        map.insert(name.clone(), format!("{}:{}", ip, api_server_container_port));
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConfigData {
        let mut backend_servers = BTreeMap::new();
        backend_servers.insert("control-plane2".to_string(), "10.0.0.3:6443".to_string());
        backend_servers.insert("control-plane1".to_string(), "10.0.0.2:6443".to_string());
        ConfigData {
            control_plane_port: 6443,
            backend_servers,
        }
    }

    #[test]
    fn pure_function_identical_inputs_identical_output() {
        let data = sample();
        assert_eq!(render(&data).unwrap(), render(&data).unwrap());
    }

    #[test]
    fn backend_lines_sorted_by_server_name() {
        let rendered = render(&sample()).unwrap();
        let cp1_pos = rendered.find("server control-plane1").unwrap();
        let cp2_pos = rendered.find("server control-plane2").unwrap();
        assert!(cp1_pos < cp2_pos);
    }

    #[test]
    fn frontend_binds_configured_port() {
        let rendered = render(&sample()).unwrap();
        assert!(rendered.contains("bind *:6443"));
    }
}
