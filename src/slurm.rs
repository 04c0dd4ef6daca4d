//! Execution of the two scheduler queries and assembly of a snapshot.
//!
//! Everything here is a thin collaborator around [`crate::core`]: it runs
//! the configured shell pipelines, hands their stdout to the parsers, and
//! bundles the result. The [`SlurmQueries`] trait is the seam that lets
//! tests feed canned scheduler output instead of shelling out.

use std::process::Command;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::config::SlurmConfig;
use crate::core::inventory::{self, Inventory};
use crate::core::jobs::{self, JobSummary};

/// The two text feeds a snapshot is built from.
#[cfg_attr(test, mockall::automock)]
pub trait SlurmQueries {
    /// Raw `sinfo` output: one line per uniform node group, headers
    /// already suppressed by the query flags.
    fn node_feed(&self) -> Result<String>;

    /// Raw filtered `sacct` output: one line per running billed job.
    fn job_feed(&self) -> Result<String>;
}

/// Production query runner: shells out to the configured pipelines.
pub struct SlurmCli {
    sinfo: String,
    sacct: String,
}

impl SlurmCli {
    pub fn new(config: &SlurmConfig) -> Self {
        Self {
            sinfo: config.sinfo.clone(),
            sacct: config.sacct.clone(),
        }
    }
}

impl SlurmQueries for SlurmCli {
    fn node_feed(&self) -> Result<String> {
        run_shell(&self.sinfo)
    }

    fn job_feed(&self) -> Result<String> {
        run_shell(&self.sacct)
    }
}

/// Run a query through `sh -c` and capture stdout.
///
/// The commands are pipelines (the job query filters through grep), so
/// they need a shell rather than argv splitting. A non-zero exit does not
/// abort the run: grep exits 1 when no job matches, and an empty feed is
/// a valid answer. The stderr tail is logged instead.
fn run_shell(command: &str) -> Result<String> {
    debug!(command, "running scheduler query");
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .with_context(|| format!("failed to run `{command}`"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(command, status = %output.status, stderr = %stderr.trim(), "scheduler query exited non-zero");
    }

    String::from_utf8(output.stdout).with_context(|| format!("`{command}` produced non-UTF-8 output"))
}

/// One complete view of the cluster at a point in time.
#[derive(Debug)]
pub struct Snapshot {
    pub inventory: Inventory,
    pub jobs: Vec<JobSummary>,
}

/// Fetch both feeds and fold them into a fresh snapshot.
///
/// The inventory is rebuilt from scratch on every call; nothing carries
/// over between polls, and a failed query aborts before any partial state
/// escapes.
pub fn snapshot(queries: &impl SlurmQueries, gpu_only: bool) -> Result<Snapshot> {
    let node_feed = queries.node_feed().context("querying node inventory")?;
    let job_feed = queries.job_feed().context("querying running jobs")?;

    let mut inventory = inventory::build(&node_feed, gpu_only);
    jobs::aggregate(&job_feed, &mut inventory);
    let jobs = jobs::parse_summaries(&job_feed);
    debug!(nodes = inventory.len(), jobs = jobs.len(), "snapshot assembled");

    Ok(Snapshot { inventory, jobs })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODE_FEED: &str = "\
gpu[01-02] gpu:a100:4 32/96/0/128 102400 512000
cpu01 (null) 0/64/0/64 0 256000
";
    const JOB_FEED: &str = "\
alice main-priority gpu[01-02] RUNNING billing=16,cpu=8,gres/gpu=4,mem=64G 1001
bob gpu-default cpu01 RUNNING billing=4,cpu=4,mem=16G 1002
";

    fn canned_queries() -> MockSlurmQueries {
        let mut queries = MockSlurmQueries::new();
        queries
            .expect_node_feed()
            .returning(|| Ok(NODE_FEED.to_string()));
        queries
            .expect_job_feed()
            .returning(|| Ok(JOB_FEED.to_string()));
        queries
    }

    #[test]
    fn test_snapshot_assembles_inventory_and_jobs() {
        let snapshot = snapshot(&canned_queries(), false).unwrap();

        assert_eq!(snapshot.inventory.len(), 3);
        let gpu01 = &snapshot.inventory["gpu01"];
        assert_eq!(gpu01.jobs["1001"].usage.gpu, 2.0);
        assert_eq!(gpu01.usage.priority.cpu, 4.0);

        let cpu01 = &snapshot.inventory["cpu01"];
        assert_eq!(cpu01.usage.default.mem_gb, 16.0);

        assert_eq!(snapshot.jobs.len(), 2);
    }

    #[test]
    fn test_gpu_only_drops_nodes_but_keeps_user_records() {
        let snapshot = snapshot(&canned_queries(), true).unwrap();

        assert!(!snapshot.inventory.contains_key("cpu01"));
        assert_eq!(snapshot.inventory.len(), 2);
        // bob's job attributes to no node, but still shows in the flat list.
        assert!(snapshot.jobs.iter().any(|j| j.user == "bob"));
    }

    #[test]
    fn test_failed_node_query_aborts() {
        let mut queries = MockSlurmQueries::new();
        queries
            .expect_node_feed()
            .returning(|| Err(anyhow::anyhow!("sinfo: command not found")));

        assert!(snapshot(&queries, false).is_err());
    }

    #[test]
    fn test_empty_feeds_give_empty_snapshot() {
        let mut queries = MockSlurmQueries::new();
        queries.expect_node_feed().returning(|| Ok(String::new()));
        queries.expect_job_feed().returning(|| Ok(String::new()));

        let snapshot = snapshot(&queries, false).unwrap();
        assert!(snapshot.inventory.is_empty());
        assert!(snapshot.jobs.is_empty());
    }
}
