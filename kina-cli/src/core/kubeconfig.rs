//! Client kubeconfig export (§4/§6): fetch the bootstrap control plane's
//! admin kubeconfig, rewrite its server field to the host-exposed API
//! endpoint, give its user a cluster-specific name, and merge it into the
//! host's `~/.kube/config` via `kubectl config view --flatten` the same
//! way a hand-run `kubectl` merge would.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::errors::{ClusterError, KinaError, KinaResult};

fn kube_dir() -> KinaResult<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        KinaError::Cluster(ClusterError::KubeconfigError {
            reason: "could not determine home directory".to_string(),
        })
    })?;
    Ok(home.join(".kube"))
}

/// Path `kina get kubeconfig-path` reports: the per-cluster file kina
/// writes alongside the merged global config.
pub fn individual_path(cluster_name: &str) -> KinaResult<PathBuf> {
    Ok(kube_dir()?.join(cluster_name))
}

/// Rewrite `server:` to the host-exposed API endpoint and give the admin
/// user/context a cluster-specific name so multiple kina clusters can be
/// merged into one kubeconfig without clobbering each other's
/// `kubernetes-admin` entries.
pub fn rewrite(raw_kubeconfig: &str, cluster_name: &str, host_endpoint: &str) -> KinaResult<String> {
    let mut config: serde_yaml::Value = serde_yaml::from_str(raw_kubeconfig).map_err(|e| {
        KinaError::Cluster(ClusterError::KubeconfigError {
            reason: format!("failed to parse kubeconfig: {}", e),
        })
    })?;

    if let Some(clusters) = config.get_mut("clusters").and_then(|c| c.as_sequence_mut()) {
        for cluster in clusters.iter_mut() {
            if let Some(cluster_obj) = cluster.get_mut("cluster") {
                cluster_obj["server"] =
                    serde_yaml::Value::String(format!("https://{}", host_endpoint));
            }
        }
    }

    let cluster_specific_user = format!("{}-admin", cluster_name);

    if let Some(users) = config.get_mut("users").and_then(|u| u.as_sequence_mut()) {
        for user in users.iter_mut() {
            if user.get("name").and_then(|n| n.as_str()) == Some("kubernetes-admin") {
                user["name"] = serde_yaml::Value::String(cluster_specific_user.clone());
            }
        }
    }

    if let Some(contexts) = config.get_mut("contexts").and_then(|c| c.as_sequence_mut()) {
        for context in contexts.iter_mut() {
            if let Some(context_obj) = context.get_mut("context") {
                if context_obj.get("user").and_then(|u| u.as_str()) == Some("kubernetes-admin") {
                    context_obj["user"] = serde_yaml::Value::String(cluster_specific_user.clone());
                }
            }
        }
    }

    serde_yaml::to_string(&config).map_err(|e| {
        KinaError::Cluster(ClusterError::KubeconfigError {
            reason: format!("failed to serialize rewritten kubeconfig: {}", e),
        })
    })
}

/// Write the individual per-cluster kubeconfig file, then merge it into
/// `~/.kube/config` by shelling out to `kubectl config view --flatten`
/// with `KUBECONFIG` pointed at both files — the same merge kubectl
/// itself performs, rather than hand-rolling YAML-list dedup.
pub async fn save(cluster_name: &str, kubeconfig: &str) -> KinaResult<()> {
    let dir = kube_dir()?;
    tokio::fs::create_dir_all(&dir).await.map_err(KinaError::Io)?;

    let individual = dir.join(cluster_name);
    tokio::fs::write(&individual, kubeconfig)
        .await
        .map_err(KinaError::Io)?;

    let global = dir.join("config");
    let kubeconfig_env = if global.exists() {
        format!("{}:{}", global.display(), individual.display())
    } else {
        individual.display().to_string()
    };

    let output = tokio::process::Command::new("kubectl")
        .env("KUBECONFIG", &kubeconfig_env)
        .args(["config", "view", "--flatten"])
        .output()
        .await
        .map_err(|e| {
            KinaError::Cluster(ClusterError::KubeconfigError {
                reason: format!("failed to run kubectl config view: {}", e),
            })
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(KinaError::Cluster(ClusterError::KubeconfigError {
            reason: format!("kubectl config view failed: {}", stderr),
        }));
    }

    tokio::fs::write(&global, &output.stdout)
        .await
        .map_err(KinaError::Io)?;

    let use_context = tokio::process::Command::new("kubectl")
        .args(["config", "use-context", cluster_name])
        .output()
        .await;
    if let Ok(out) = use_context {
        if !out.status.success() {
            warn!(
                "failed to set current context to '{}': {}",
                cluster_name,
                String::from_utf8_lossy(&out.stderr)
            );
        }
    }

    info!(
        "saved kubeconfig to {} and merged into {}",
        individual.display(),
        global.display()
    );
    Ok(())
}

/// Remove a cluster's individual kubeconfig file. Leaves the merged
/// global config's stale entries for `kubectl config delete-cluster`
/// etc. to clean up, matching kubectl's own removal granularity.
pub async fn remove(cluster_name: &str) -> KinaResult<()> {
    let individual = kube_dir()?.join(cluster_name);
    if tokio::fs::metadata(&individual).await.is_ok() {
        tokio::fs::remove_file(&individual).await.map_err(KinaError::Io)?;
    }
    Ok(())
}

pub fn exists_locally(cluster_name: &str, base_dir: &Path) -> bool {
    base_dir.join(cluster_name).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
apiVersion: v1
clusters:
- cluster:
    server: https://127.0.0.1:6443
  name: kina
contexts:
- context:
    cluster: kina
    user: kubernetes-admin
  name: kina
users:
- name: kubernetes-admin
  user: {}
current-context: kina
";

    #[test]
    fn rewrite_replaces_server_and_user_name() {
        let rewritten = rewrite(SAMPLE, "kina", "192.168.1.5:6443").unwrap();
        assert!(rewritten.contains("https://192.168.1.5:6443"));
        assert!(rewritten.contains("kina-admin"));
        assert!(!rewritten.contains("kubernetes-admin"));
    }

    #[test]
    fn rewrite_is_pure() {
        let a = rewrite(SAMPLE, "kina", "192.168.1.5:6443").unwrap();
        let b = rewrite(SAMPLE, "kina", "192.168.1.5:6443").unwrap();
        assert_eq!(a, b);
    }
}
