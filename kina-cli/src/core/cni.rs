//! CNI config writer (§4.7): publishes a CNI conflist to a node's
//! filesystem, idempotently. A single-writer-per-node contract (§5) means
//! this module does no locking of its own — callers serialize writes to
//! the same node.

use std::path::Path;

use crate::errors::{KinaError, KinaResult};

/// Input to the writer: the pod CIDRs assigned to a node, the default
/// routes to install, and the link MTU.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CniConfig {
    pub pod_cidrs: Vec<String>,
    pub default_routes: Vec<String>,
    pub mtu: u32,
}

const CONFLIST_NAME: &str = "10-kina.conflist";

impl CniConfig {
    /// Default routes for a set of pod CIDRs (§4.7): dual-stack clusters
    /// get both default routes, single-family clusters get only the one
    /// that matches.
    pub fn default_routes_for(pod_cidrs: &[String]) -> KinaResult<Vec<String>> {
        let mut has_v4 = false;
        let mut has_v6 = false;
        for cidr in pod_cidrs {
            let net: ipnet::IpNet = cidr.parse().map_err(|e| KinaError::Template {
                reason: format!("invalid pod CIDR '{}': {}", cidr, e),
            })?;
            match net {
                ipnet::IpNet::V4(_) => has_v4 = true,
                ipnet::IpNet::V6(_) => has_v6 = true,
            }
        }

        let mut routes = Vec::new();
        if has_v4 {
            routes.push("0.0.0.0/0".to_string());
        }
        if has_v6 {
            routes.push("::/0".to_string());
        }
        Ok(routes)
    }

    fn render(&self) -> String {
        let pod_cidrs_json = self
            .pod_cidrs
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", ");
        let routes_json = self
            .default_routes
            .iter()
            .map(|r| format!("{{\"dst\": \"{}\"}}", r))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "{{\n  \"cniVersion\": \"1.0.0\",\n  \"name\": \"kina\",\n  \"plugins\": [\n    {{\n      \"type\": \"ptp\",\n      \"mtu\": {mtu},\n      \"ipam\": {{\n        \"type\": \"host-local\",\n        \"ranges\": [[{pod_cidrs}]],\n        \"routes\": [{routes}]\n      }}\n    }},\n    {{\"type\": \"portmap\", \"capabilities\": {{\"portMappings\": true}}}}\n  ]\n}}\n",
            mtu = self.mtu,
            pod_cidrs = pod_cidrs_json,
            routes = routes_json,
        )
    }
}

/// Write the CNI conflist under `cni_net_d` (typically
/// `/etc/cni/net.d` inside the node), skipping the write entirely when
/// the last-written config (tracked in a sidecar `.last` file) is
/// structurally identical (§8 invariant 4, scenario S5): the first call
/// writes and renames, a second call with identical input performs zero
/// filesystem mutation, and a third call with different input writes
/// again.
///
/// Publishing is atomic: the conflist is written to a `.tmp` file in the
/// same directory, fsynced, then renamed over the final path, so a
/// concurrent reader never observes a partial write.
pub fn publish(cni_net_d: &Path, config: &CniConfig) -> KinaResult<bool> {
    let final_path = cni_net_d.join(CONFLIST_NAME);
    let marker_path = cni_net_d.join(".kina-cni-last.json");

    let marker_json = serde_json::to_string(config).map_err(|e| KinaError::Template {
        reason: format!("failed to serialize CNI config marker: {}", e),
    })?;

    if let Ok(existing) = std::fs::read_to_string(&marker_path) {
        if existing == marker_json {
            return Ok(false);
        }
    }

    std::fs::create_dir_all(cni_net_d).map_err(|e| KinaError::Template {
        reason: format!("failed to create CNI config directory: {}", e),
    })?;

    let tmp_path = cni_net_d.join(format!("{}.tmp", CONFLIST_NAME));
    let rendered = config.render();
    write_and_sync(&tmp_path, rendered.as_bytes())?;
    std::fs::rename(&tmp_path, &final_path).map_err(|e| KinaError::Template {
        reason: format!("failed to publish CNI conflist: {}", e),
    })?;

    write_and_sync(&marker_path, marker_json.as_bytes())?;

    Ok(true)
}

fn write_and_sync(path: &Path, contents: &[u8]) -> KinaResult<()> {
    use std::io::Write;
    let mut file = std::fs::File::create(path).map_err(|e| KinaError::Template {
        reason: format!("failed to create '{}': {}", path.display(), e),
    })?;
    file.write_all(contents).map_err(|e| KinaError::Template {
        reason: format!("failed to write '{}': {}", path.display(), e),
    })?;
    file.sync_all().map_err(|e| KinaError::Template {
        reason: format!("failed to fsync '{}': {}", path.display(), e),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CniConfig {
        CniConfig {
            pod_cidrs: vec!["10.244.0.0/24".to_string()],
            default_routes: vec!["0.0.0.0/0".to_string()],
            mtu: 1500,
        }
    }

    #[test]
    fn first_publish_writes_and_renames() {
        let dir = tempfile::tempdir().unwrap();
        let wrote = publish(dir.path(), &sample()).unwrap();
        assert!(wrote);
        assert!(dir.path().join("10-kina.conflist").exists());
    }

    #[test]
    fn identical_second_publish_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        assert!(publish(dir.path(), &sample()).unwrap());
        let final_path = dir.path().join("10-kina.conflist");
        let written_at = std::fs::metadata(&final_path).unwrap().modified().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        let wrote_again = publish(dir.path(), &sample()).unwrap();
        assert!(!wrote_again);
        let still_at = std::fs::metadata(&final_path).unwrap().modified().unwrap();
        assert_eq!(written_at, still_at);
    }

    #[test]
    fn changed_input_writes_again() {
        let dir = tempfile::tempdir().unwrap();
        assert!(publish(dir.path(), &sample()).unwrap());

        let mut changed = sample();
        changed.mtu = 9000;
        assert!(publish(dir.path(), &changed).unwrap());
    }

    #[test]
    fn dual_stack_cidrs_yield_both_default_routes() {
        let cidrs = vec!["10.244.0.0/24".to_string(), "fd00:10:244::/56".to_string()];
        let routes = CniConfig::default_routes_for(&cidrs).unwrap();
        assert_eq!(routes, vec!["0.0.0.0/0".to_string(), "::/0".to_string()]);
    }

    #[test]
    fn single_family_cidrs_yield_one_default_route() {
        let cidrs = vec!["10.244.0.0/24".to_string()];
        let routes = CniConfig::default_routes_for(&cidrs).unwrap();
        assert_eq!(routes, vec!["0.0.0.0/0".to_string()]);
    }
}
