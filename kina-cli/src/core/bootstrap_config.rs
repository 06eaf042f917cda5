//! Bootstrap-config renderer (§4.6): a pure function from `ConfigData` to
//! kubeadm-init config text, then pipelined through the patch engine with
//! the caller's strategic-merge and JSON-6902 patches (already renamed to
//! match the generated object names).

use crate::core::patch;
use crate::errors::KinaResult;

/// Input to the renderer.
#[derive(Debug, Clone)]
pub struct ConfigData {
    pub cluster_name: String,
    pub kubernetes_version: String,
    /// Empty when there is no load balancer (single control-plane).
    pub control_plane_endpoint: String,
    pub api_bind_port: u16,
    pub token: String,
}

const KUBEADM_OBJECT_NAME: &str = "kubeadm-config";

/// Render the fixed kubeadm multi-document template (§4.4.2/§4.4.3): a
/// bootstrap token, `InitConfiguration`, `ClusterConfiguration`, and
/// `KubeletConfiguration`, each addressed individually by JSON-6902
/// patches via `metadata.name`.
pub fn render(data: &ConfigData) -> KinaResult<String> {
    let control_plane_endpoint_line = if data.control_plane_endpoint.is_empty() {
        String::new()
    } else {
        format!("controlPlaneEndpoint: \"{}\"\n", data.control_plane_endpoint)
    };

    Ok(format!(
        "\
---
apiVersion: kubeadm.k8s.io/v1beta3
kind: InitConfiguration
metadata:
  name: {object_name}
bootstrapTokens:
- token: \"{token}\"
  ttl: \"24h0m0s\"
localAPIEndpoint:
  bindPort: {api_bind_port}
nodeRegistration:
  criSocket: unix:///var/run/containerd/containerd.sock
  ignorePreflightErrors:
  - all
---
apiVersion: kubeadm.k8s.io/v1beta3
kind: ClusterConfiguration
metadata:
  name: {object_name}
clusterName: \"{cluster_name}\"
kubernetesVersion: \"{kubernetes_version}\"
{control_plane_endpoint_line}apiServer:
  certSANs:
  - localhost
  - 127.0.0.1
controllerManager: {{}}
scheduler: {{}}
---
apiVersion: kubelet.config.k8s.io/v1beta1
kind: KubeletConfiguration
metadata:
  name: {object_name}
cgroupDriver: systemd
failSwapOn: false
",
        object_name = KUBEADM_OBJECT_NAME,
        token = data.token,
        api_bind_port = data.api_bind_port,
        cluster_name = data.cluster_name,
        kubernetes_version = data.kubernetes_version,
        control_plane_endpoint_line = control_plane_endpoint_line,
    ))
}

/// Render then apply the caller's patches, re-targeted to
/// `KUBEADM_OBJECT_NAME` so user intent ("patch the cluster config") is
/// preserved while the generated object name stays internal.
pub fn render_and_patch(
    data: &ConfigData,
    strategic_merge_patches: &[String],
    json6902_patches: &[String],
) -> KinaResult<String> {
    let rendered = render(data)?;

    let renamed_json6902: KinaResult<Vec<String>> = json6902_patches
        .iter()
        .map(|p| patch::rename_patch_target(p, KUBEADM_OBJECT_NAME))
        .collect();
    let renamed_json6902 = renamed_json6902?;

    patch::apply_all(&rendered, strategic_merge_patches, &renamed_json6902)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConfigData {
        ConfigData {
            cluster_name: "kina".to_string(),
            kubernetes_version: "v1.31.0".to_string(),
            control_plane_endpoint: String::new(),
            api_bind_port: 6443,
            token: "abcdef.0123456789abcdef".to_string(),
        }
    }

    #[test]
    fn pure_function_identical_inputs_identical_output() {
        let data = sample();
        assert_eq!(render(&data).unwrap(), render(&data).unwrap());
    }

    #[test]
    fn control_plane_endpoint_omitted_when_empty() {
        let rendered = render(&sample()).unwrap();
        assert!(!rendered.contains("controlPlaneEndpoint"));
    }

    #[test]
    fn control_plane_endpoint_present_when_set() {
        let mut data = sample();
        data.control_plane_endpoint = "10.0.0.5:6443".to_string();
        let rendered = render(&data).unwrap();
        assert!(rendered.contains("controlPlaneEndpoint: \"10.0.0.5:6443\""));
    }

    #[test]
    fn identical_patches_produce_byte_identical_output() {
        let data = sample();
        let patches = vec!["clusterName: \"patched\"\n".to_string()];
        let a = render_and_patch(&data, &patches, &[]).unwrap();
        let b = render_and_patch(&data, &patches, &[]).unwrap();
        assert_eq!(a, b);
        assert!(a.contains("patched"));
    }
}
