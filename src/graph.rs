//! Dependency-resolved task execution
//!
//! A [`Task`] is a named unit of work that declares its dependencies and the
//! exact artifacts it will produce. The [`TaskRunner`] resolves the transitive
//! closure of a requested task, rejects cycles before anything executes, and
//! runs tasks strictly one at a time in topological order.
//!
//! Completion is defined purely by artifact existence: a task whose declared
//! outputs are all present is skipped, and a task whose artifact was deleted
//! externally is simply pending again on the next resolution. There is no
//! journal, no done-flag, and no task-level retry — a failure halts the chain
//! and the operator re-runs after fixing the cause, paying only for the tasks
//! whose artifacts are missing.

use crate::artifact::{ArtifactName, ArtifactStore};
use crate::error::{Error, Result};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::sync::Arc;

/// A named unit of work in the extraction graph.
///
/// Identity is the task name; two tasks with the same name are the same node.
/// `run` receives the artifact store and reads its inputs from the artifacts
/// its dependencies declared — never by value from the dependency itself.
#[async_trait::async_trait]
pub trait Task: Send + Sync {
    /// Unique name of this task.
    fn name(&self) -> &str;

    /// Tasks whose outputs this task reads. Defaults to none (a leaf
    /// extraction).
    fn dependencies(&self) -> Vec<Arc<dyn Task>> {
        Vec::new()
    }

    /// The exact artifacts this task will publish.
    ///
    /// The declaration serves double duty: the skip-if-exists check before the
    /// task runs, and the post-run completeness check after it. A task that
    /// declares no outputs is never considered satisfied and runs every time.
    fn outputs(&self) -> Vec<ArtifactName>;

    /// Execute the task. All dependency artifacts are already materialized in
    /// `store` when this is called.
    async fn run(&self, store: &ArtifactStore) -> Result<()>;
}

/// What a single graph resolution did, task by task.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Tasks that executed, in execution order
    pub executed: Vec<String>,
    /// Tasks skipped because their declared outputs already existed
    pub skipped: Vec<String>,
}

/// Executes a requested task and its transitive dependencies.
pub struct TaskRunner {
    store: ArtifactStore,
}

impl TaskRunner {
    /// Create a runner publishing into `store`.
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }

    /// The artifact store this runner publishes into.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Resolve and execute `requested` and everything it depends on.
    ///
    /// Fails fast with [`Error::GraphCycle`] before any task runs if the
    /// declared dependencies are cyclic. Execution is sequential in
    /// topological order; the first task failure stops the chain, leaving
    /// completed artifacts on disk for the next invocation.
    pub async fn run(&self, requested: Arc<dyn Task>) -> Result<RunSummary> {
        let order = resolve_order(requested)?;
        let mut summary = RunSummary::default();

        for task in order {
            let name = task.name().to_string();
            let outputs = task.outputs();

            if !outputs.is_empty() && outputs.iter().all(|a| self.store.exists(a)) {
                tracing::info!(task = %name, "outputs already exist, skipping");
                summary.skipped.push(name);
                continue;
            }

            tracing::info!(task = %name, "running task");
            task.run(&self.store).await.map_err(|e| {
                tracing::error!(task = %name, error = %e, "task failed, halting chain");
                e
            })?;

            // The atomic-publish discipline means a declared output either
            // exists completely or not at all; absence here is a task bug.
            for artifact in &outputs {
                if !self.store.exists(artifact) {
                    return Err(Error::MissingOutput {
                        task: name,
                        artifact: artifact.clone(),
                    });
                }
            }

            tracing::info!(task = %name, outputs = outputs.len(), "task succeeded");
            summary.executed.push(name);
        }

        Ok(summary)
    }
}

/// Collect the dependency closure of `requested` and order it so every task
/// comes after all of its dependencies.
fn resolve_order(requested: Arc<dyn Task>) -> Result<Vec<Arc<dyn Task>>> {
    let mut tasks: HashMap<String, Arc<dyn Task>> = HashMap::new();
    let mut edges: Vec<(String, String)> = Vec::new();

    // Iterative DFS by name; a cycle cannot hang collection because visited
    // names are never expanded twice.
    let mut stack = vec![requested];
    while let Some(task) = stack.pop() {
        let name = task.name().to_string();
        if tasks.contains_key(&name) {
            continue;
        }
        for dep in task.dependencies() {
            edges.push((dep.name().to_string(), name.clone()));
            stack.push(dep);
        }
        tasks.insert(name, task);
    }

    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut indices: HashMap<String, NodeIndex> = HashMap::new();
    for name in tasks.keys() {
        indices.insert(name.clone(), graph.add_node(name.clone()));
    }
    for (dep, dependent) in &edges {
        graph.add_edge(indices[dep], indices[dependent], ());
    }

    let sorted = toposort(&graph, None).map_err(|cycle| Error::GraphCycle {
        task: graph[cycle.node_id()].clone(),
    })?;

    Ok(sorted
        .into_iter()
        .map(|idx| Arc::clone(&tasks[&graph[idx]]))
        .collect())
}
