//! Action engine (§4.4): a registry of named, ordered task lists, a
//! planner that expands them against a roster into a sorted execution
//! plan, and a sequential executor that halts on the first error.

mod config;
mod haproxy;
mod init;
mod join;

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use tracing::{info, warn};

use crate::core::provider::ContainerProvider;
use crate::core::roster::{NodeSelector, Roster, RosterEntry};
use crate::core::types::ExecResult;
use crate::errors::{ClusterError, KinaError, KinaResult};

pub type TaskFuture = Pin<Box<dyn Future<Output = KinaResult<()>> + Send>>;
pub type TaskRunFn = Arc<dyn Fn(Arc<ExecContext>, RosterEntry) -> TaskFuture + Send + Sync>;

/// One unit of work: a description for logging, the subset of the roster
/// it targets, and the function that executes it against one entry of
/// that subset.
#[derive(Clone)]
pub struct Task {
    pub description: String,
    pub selector: NodeSelector,
    pub run: TaskRunFn,
}

pub type ActionFactory = fn() -> Vec<Task>;

/// Process-wide action name -> factory map, mutated only at first access
/// (to register the four standard actions) and otherwise read-locked
/// briefly per `plan` call.
pub struct Registry;

fn registry_map() -> &'static Mutex<BTreeMap<String, ActionFactory>> {
    static MAP: OnceLock<Mutex<BTreeMap<String, ActionFactory>>> = OnceLock::new();
    MAP.get_or_init(|| {
        let mut map: BTreeMap<String, ActionFactory> = BTreeMap::new();
        map.insert("haproxy".to_string(), haproxy::tasks as ActionFactory);
        map.insert("config".to_string(), config::tasks as ActionFactory);
        map.insert("init".to_string(), init::tasks as ActionFactory);
        map.insert("join".to_string(), join::tasks as ActionFactory);
        Mutex::new(map)
    })
}

impl Registry {
    /// Register (or replace) an action factory under `name`.
    pub fn register(name: &str, factory: ActionFactory) {
        registry_map()
            .lock()
            .expect("action registry mutex poisoned")
            .insert(name.to_string(), factory);
    }

    fn create(name: &str) -> KinaResult<Vec<Task>> {
        let map = registry_map().lock().expect("action registry mutex poisoned");
        let factory = map.get(name).ok_or_else(|| {
            KinaError::Cluster(ClusterError::InvalidState {
                state: format!("unregistered action '{}'", name),
            })
        })?;
        Ok(factory())
    }
}

/// One fully-resolved step of the execution plan: a task bound to a
/// single roster entry, carrying the keys the planner sorted by.
pub struct PlanEntry {
    action_name: String,
    action_index: usize,
    task_index: usize,
    description: String,
    run: TaskRunFn,
    node: RosterEntry,
}

/// Expand `action_names` into tasks, select nodes per task, and sort the
/// resulting entries by the total order from §3: provisioning order
/// ascending, then node name, then action index, then task index — so
/// within one node's provisioning slot, actions run in the caller's
/// supplied order.
pub fn plan(action_names: &[String], roster: &Roster) -> KinaResult<Vec<PlanEntry>> {
    let mut entries = Vec::new();

    for (action_index, action_name) in action_names.iter().enumerate() {
        let tasks = Registry::create(action_name)?;
        for (task_index, task) in tasks.into_iter().enumerate() {
            for node in task.selector.select(roster) {
                entries.push(PlanEntry {
                    action_name: action_name.clone(),
                    action_index,
                    task_index,
                    description: task.description.clone(),
                    run: task.run.clone(),
                    node: node.clone(),
                });
            }
        }
    }

    entries.sort_by(|a, b| {
        a.node
            .provisioning_order
            .cmp(&b.node.provisioning_order)
            .then_with(|| a.node.name.cmp(&b.node.name))
            .then_with(|| a.action_index.cmp(&b.action_index))
            .then_with(|| a.task_index.cmp(&b.task_index))
    });

    Ok(entries)
}

/// A cooperative cancellation flag: the executor checks it before
/// starting each plan entry. Not an interrupt — an in-flight task always
/// runs to its next exec boundary.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run `entries` sequentially in plan order, halting and propagating on
/// the first failing entry. A cancelled token stops the plan before its
/// next entry starts; entries already running are not interrupted.
pub async fn execute(entries: Vec<PlanEntry>, ctx: Arc<ExecContext>, cancel: &CancellationToken) -> KinaResult<()> {
    for entry in entries {
        if cancel.is_cancelled() {
            warn!("action plan cancelled, halting before remaining entries");
            break;
        }

        info!("[{}] {}", entry.node.name, entry.description);

        (entry.run)(ctx.clone(), entry.node.clone())
            .await
            .map_err(|e| {
                KinaError::Cluster(ClusterError::ActionFailed {
                    action: entry.action_name.clone(),
                    task: entry.description.clone(),
                    node: entry.node.name.clone(),
                    reason: e.to_string(),
                })
            })?;
    }
    Ok(())
}

/// Shared state every task's run function can reach: the container
/// driver, the immutable roster, per-node addressing resolved during
/// provisioning, and the cluster-wide bootstrap parameters.
pub struct ExecContext {
    pub provider: Arc<dyn ContainerProvider>,
    pub roster: Arc<Roster>,
    pub cluster_name: String,
    pub control_plane_port: u16,
    pub api_bind_port: u16,
    pub token: String,
    pub wait_duration: Option<Duration>,
    pub kubeconfig_output_path: PathBuf,
    pub container_ids: BTreeMap<String, String>,
    pub node_ips: BTreeMap<String, String>,
    pub host_api_port: u16,
    pub disable_default_cni: bool,
}

impl ExecContext {
    pub fn container_id_for(&self, node_name: &str) -> KinaResult<&str> {
        self.container_ids
            .get(node_name)
            .map(|s| s.as_str())
            .ok_or_else(|| {
                KinaError::Cluster(ClusterError::NotFound {
                    name: node_name.to_string(),
                })
            })
    }

    pub fn ip_for(&self, node_name: &str) -> KinaResult<&str> {
        self.node_ips.get(node_name).map(|s| s.as_str()).ok_or_else(|| {
            KinaError::Cluster(ClusterError::NodeNotReady {
                node: node_name.to_string(),
                seconds: 0,
            })
        })
    }

    /// Runs a bootstrap command and turns a non-zero exit into
    /// `ClusterError::ExecFailed` instead of letting it pass as success.
    pub async fn exec_checked(&self, container_id: &str, cmd: &[&str]) -> KinaResult<ExecResult> {
        let result = self.provider.exec_in_container(container_id, cmd).await?;
        if !result.success {
            return Err(KinaError::Cluster(ClusterError::ExecFailed {
                command: cmd.join(" "),
                exit_code: result.exit_code,
                stderr: result.stderr,
            }));
        }
        Ok(result)
    }
}
