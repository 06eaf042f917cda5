//! Patch engine: a pure function `(document, patches) -> document'` applying
//! strategic-merge YAML patches followed by JSON-6902 patches, matching
//! §4.6/§9's treatment of the patch engine as a pure-function collaborator.
//!
//! The upstream system treats the full strategic-merge/JSON-6902 patch
//! engine as an external, out-of-scope collaborator; this module is the
//! concrete default implementation that contract requires so the bootstrap
//! config renderer (`core::bootstrap_config`) has something real to call.
//! Strategic merge here covers scalar override, nested map merge, and list
//! replace — the subset a single kubeadm document actually exercises, not
//! full Kubernetes apimachinery merge-key/`$patch: delete` semantics.

use crate::errors::{KinaError, KinaResult};

/// Apply a strategic-merge-style YAML patch: maps merge recursively
/// (patch keys override base keys), anything else (scalars, sequences)
/// replaces the base value outright.
pub fn apply_strategic_merge(base: &str, patch: &str) -> KinaResult<String> {
    let mut base_value: serde_yaml::Value = serde_yaml::from_str(base).map_err(|e| KinaError::Patch {
        reason: format!("failed to parse base document: {}", e),
    })?;
    let patch_value: serde_yaml::Value = serde_yaml::from_str(patch).map_err(|e| KinaError::Patch {
        reason: format!("failed to parse strategic-merge patch: {}", e),
    })?;

    merge_yaml(&mut base_value, &patch_value);

    serde_yaml::to_string(&base_value).map_err(|e| KinaError::Patch {
        reason: format!("failed to serialize merged document: {}", e),
    })
}

fn merge_yaml(base: &mut serde_yaml::Value, patch: &serde_yaml::Value) {
    match (base, patch) {
        (serde_yaml::Value::Mapping(base_map), serde_yaml::Value::Mapping(patch_map)) => {
            for (key, patch_val) in patch_map {
                match base_map.get_mut(key) {
                    Some(base_val) => merge_yaml(base_val, patch_val),
                    None => {
                        base_map.insert(key.clone(), patch_val.clone());
                    }
                }
            }
        }
        (base_slot, patch_val) => {
            *base_slot = patch_val.clone();
        }
    }
}

/// Apply an ordered list of RFC 6902 JSON-patch documents to a YAML
/// document, round-tripping through `serde_json::Value` for the patch
/// library and back.
pub fn apply_json6902(base: &str, patches: &[String]) -> KinaResult<String> {
    if patches.is_empty() {
        return Ok(base.to_string());
    }

    let yaml_value: serde_yaml::Value = serde_yaml::from_str(base).map_err(|e| KinaError::Patch {
        reason: format!("failed to parse base document: {}", e),
    })?;
    let mut json_value: serde_json::Value =
        serde_json::to_value(&yaml_value).map_err(|e| KinaError::Patch {
            reason: format!("failed to convert document to JSON for patching: {}", e),
        })?;

    for patch_text in patches {
        let patch: json_patch::Patch = serde_json::from_str(patch_text).map_err(|e| KinaError::Patch {
            reason: format!("invalid JSON-6902 patch document: {}", e),
        })?;
        json_patch::patch(&mut json_value, &patch).map_err(|e| KinaError::Patch {
            reason: format!("failed to apply JSON-6902 patch: {}", e),
        })?;
    }

    let merged_yaml: serde_yaml::Value =
        serde_yaml::to_value(&json_value).map_err(|e| KinaError::Patch {
            reason: format!("failed to convert patched document back to YAML: {}", e),
        })?;
    serde_yaml::to_string(&merged_yaml).map_err(|e| KinaError::Patch {
        reason: format!("failed to serialize patched document: {}", e),
    })
}

/// Rewrite a JSON-6902 patch's implied target name so it matches the
/// generated object's name, per §4.4.2/§9 ("the core only rewrites the
/// `metadata.name` field in each patch to match the generated object's
/// name, preserving user intent"). Patches are RFC 6902 operation lists
/// against a document; any `op` whose `path` ends in `/metadata/name` has
/// its `value` overwritten.
pub fn rename_patch_target(patch_text: &str, generated_name: &str) -> KinaResult<String> {
    let mut ops: serde_json::Value = serde_json::from_str(patch_text).map_err(|e| KinaError::Patch {
        reason: format!("invalid JSON-6902 patch document: {}", e),
    })?;

    if let Some(array) = ops.as_array_mut() {
        for op in array.iter_mut() {
            let is_name_path = op
                .get("path")
                .and_then(|p| p.as_str())
                .map(|p| p.ends_with("/metadata/name"))
                .unwrap_or(false);
            if is_name_path {
                if let Some(obj) = op.as_object_mut() {
                    obj.insert(
                        "value".to_string(),
                        serde_json::Value::String(generated_name.to_string()),
                    );
                }
            }
        }
    }

    serde_json::to_string(&ops).map_err(|e| KinaError::Patch {
        reason: format!("failed to re-serialize renamed patch: {}", e),
    })
}

/// Apply every strategic-merge patch then every JSON-6902 patch, in the
/// order supplied, to `document`.
pub fn apply_all(
    document: &str,
    strategic_merge_patches: &[String],
    json6902_patches: &[String],
) -> KinaResult<String> {
    let mut current = document.to_string();
    for patch in strategic_merge_patches {
        current = apply_strategic_merge(&current, patch)?;
    }
    current = apply_json6902(&current, json6902_patches)?;
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategic_merge_overrides_scalar_and_keeps_other_keys() {
        let base = "a: 1\nb:\n  c: 2\n  d: 3\n";
        let patch = "b:\n  c: 20\n";
        let merged = apply_strategic_merge(base, patch).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&merged).unwrap();
        assert_eq!(value["a"], serde_yaml::Value::from(1));
        assert_eq!(value["b"]["c"], serde_yaml::Value::from(20));
        assert_eq!(value["b"]["d"], serde_yaml::Value::from(3));
    }

    #[test]
    fn json6902_patch_applies_replace() {
        let base = "metadata:\n  name: original\n";
        let patches = vec![
            r#"[{"op":"replace","path":"/metadata/name","value":"patched"}]"#.to_string(),
        ];
        let patched = apply_json6902(base, &patches).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&patched).unwrap();
        assert_eq!(value["metadata"]["name"], serde_yaml::Value::from("patched"));
    }

    #[test]
    fn rename_patch_target_rewrites_metadata_name_value() {
        let patch = r#"[{"op":"replace","path":"/metadata/name","value":"user-supplied"}]"#;
        let renamed = rename_patch_target(patch, "generated-object").unwrap();
        assert!(renamed.contains("generated-object"));
        assert!(!renamed.contains("user-supplied"));
    }

    #[test]
    fn pure_function_identical_inputs_identical_output() {
        let base = "a: 1\n";
        let patch = "a: 2\n";
        assert_eq!(
            apply_strategic_merge(base, patch).unwrap(),
            apply_strategic_merge(base, patch).unwrap()
        );
    }
}
