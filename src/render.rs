//! Console rendering of a snapshot: the cluster GPU overview line, the
//! optional per-user summary block, and the per-node table.
//!
//! All output goes through an explicitly passed writer so callers decide
//! where it lands (stdout in the binary, byte buffers in tests).

use std::collections::{BTreeMap, HashSet};
use std::io::{self, Write};

use owo_colors::OwoColorize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::core::hostlist;
use crate::core::inventory::{Inventory, NodeRecord};
use crate::core::jobs::JobSummary;
use crate::core::tres::ResourceUsage;
use crate::core::PartitionClass;

/// Display switches resolved from CLI flags and config.
#[derive(Debug, Default, Clone)]
pub struct DisplayOptions {
    /// Expand the per-job breakdown under each node row.
    pub disp_users: bool,
    /// When set, restrict the node table to nodes running these users'
    /// jobs and highlight their rows.
    pub target_users: Option<HashSet<String>>,
}

impl DisplayOptions {
    fn is_target(&self, user: &str) -> bool {
        self.target_users
            .as_ref()
            .is_some_and(|users| users.contains(user))
    }

    fn shows_node(&self, node: &NodeRecord) -> bool {
        match &self.target_users {
            Some(users) => node.jobs.values().any(|j| users.contains(&j.user)),
            None => true,
        }
    }
}

/// One-line cluster GPU utilization header.
pub fn overview(out: &mut impl Write, inventory: &Inventory) -> io::Result<()> {
    let total: u32 = inventory.values().map(|n| n.gpu.count).sum();
    let used: f64 = inventory
        .values()
        .map(|n| n.usage.priority.gpu + n.usage.default.gpu)
        .sum();

    if total > 0 {
        let pct = used / f64::from(total) * 100.0;
        let line = format!(
            "Cluster GPU Overview: {}/{} GPUs Used ({:.1}%)",
            used as i64, total, pct
        );
        writeln!(out, "{}", line.yellow().bold())
    } else {
        writeln!(out, "{}", "Cluster GPU Overview: No GPUs detected".yellow().bold())
    }
}

/// Per-user resource summary over the unfiltered job list.
///
/// Works from the raw [`JobSummary`] records so jobs on nodes excluded
/// from the inventory (e.g. by `--gpu-only`) still count.
pub fn user_summary(
    out: &mut impl Write,
    jobs: &[JobSummary],
    target_users: &HashSet<String>,
) -> io::Result<()> {
    #[derive(Default)]
    struct UserStats {
        nodes: HashSet<String>,
        gpus_by_partition: BTreeMap<String, i64>,
    }

    let mut stats: BTreeMap<&str, UserStats> = target_users
        .iter()
        .map(|user| (user.as_str(), UserStats::default()))
        .collect();

    for job in jobs {
        let Some(user_stats) = stats.get_mut(job.user.as_str()) else {
            continue;
        };
        let gpus = ResourceUsage::parse(&job.alloc_tres).gpu as i64;
        for node in hostlist::expand(&job.nodelist) {
            user_stats.nodes.insert(node);
        }
        *user_stats
            .gpus_by_partition
            .entry(job.partition.clone())
            .or_insert(0) += gpus;
    }

    writeln!(out, "\n{}", "=".repeat(80))?;
    writeln!(out, "{}", "Summary of Resources Used by Specified Users".bold())?;
    writeln!(out, "{}", "=".repeat(80))?;

    let mut total_by_partition: BTreeMap<&str, i64> = BTreeMap::new();
    let mut all_nodes: HashSet<&str> = HashSet::new();
    for (user, user_stats) in &stats {
        all_nodes.extend(user_stats.nodes.iter().map(String::as_str));
        if user_stats.nodes.is_empty() {
            continue;
        }
        let user_gpus: i64 = user_stats.gpus_by_partition.values().sum();
        writeln!(
            out,
            "{} using {} node(s), {} GPU(s):",
            format!("* {user:<15}").cyan(),
            format!("{}", user_stats.nodes.len()).bold(),
            format!("{user_gpus}").bold(),
        )?;
        for (partition, count) in &user_stats.gpus_by_partition {
            writeln!(
                out,
                "  - {partition:<20}: {} GPU(s)",
                format!("{count:>3}").bold()
            )?;
            *total_by_partition.entry(partition.as_str()).or_insert(0) += count;
        }
    }

    writeln!(out, "{}", "-".repeat(45).dimmed())?;
    let total_gpus: i64 = total_by_partition.values().sum();
    writeln!(
        out,
        "{} {} nodes, {} GPUs",
        "Total:".bold(),
        all_nodes.len(),
        total_gpus
    )?;
    for (partition, count) in &total_by_partition {
        writeln!(out, "  {partition:<20}: {count:>3} GPU(s)")?;
    }
    writeln!(out, "{}", "=".repeat(80))
}

/// The main per-node table, sorted by hostname.
///
/// Each resource column shows a `priority/default/idle` triple. GPU idle
/// is capacity minus both accumulators and may print negative when the
/// scheduler double-books a node; that is worth seeing, not hiding.
pub fn node_table(
    out: &mut impl Write,
    inventory: &Inventory,
    options: &DisplayOptions,
) -> io::Result<()> {
    let mut builder = Builder::default();
    builder.push_record(["Server", "GPU", "CPU (P/D/I)", "GPU (P/D/I)", "Memory GB (P/D/I)"]);

    for node in inventory.values() {
        if !options.shows_node(node) {
            continue;
        }
        builder.push_record([
            node.hostname.bright_cyan().to_string(),
            format!("{} x {}", node.gpu.count, node.gpu.kind)
                .yellow()
                .to_string(),
            cpu_cell(node).green().to_string(),
            gpu_cell(node).magenta().to_string(),
            mem_cell(node).blue().to_string(),
        ]);
        if options.disp_users && !node.jobs.is_empty() {
            builder.push_record([
                String::new(),
                jobs_subtable(node, options),
                String::new(),
                String::new(),
                String::new(),
            ]);
        }
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    writeln!(out, "{table}")
}

fn cpu_cell(node: &NodeRecord) -> String {
    format!(
        "{:2}/{:2}/{:2}",
        node.usage.priority.cpu as i64,
        node.usage.default.cpu as i64,
        node.cpu.idle
    )
}

fn gpu_cell(node: &NodeRecord) -> String {
    let priority = node.usage.priority.gpu;
    let default = node.usage.default.gpu;
    let idle = f64::from(node.gpu.count) - priority - default;
    format!("{}/{}/{}", priority as i64, default as i64, idle as i64)
}

fn mem_cell(node: &NodeRecord) -> String {
    format!(
        "{:5.1}/{:5.1}/{:5.1}",
        node.usage.priority.mem_gb,
        node.usage.default.mem_gb,
        node.mem.idle_mb as f64 / 1024.0
    )
}

/// Per-job breakdown embedded under a node row. Rows are colored by
/// partition class, target users override in highlight.
fn jobs_subtable(node: &NodeRecord, options: &DisplayOptions) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Job ID", "User", "Partition", "CPU", "GPU", "Mem(GB)"]);

    for (job_id, job) in &node.jobs {
        let row = [
            job_id.clone(),
            job.user.clone(),
            job.partition.clone(),
            format!("{}", job.usage.cpu as i64),
            format!("{}", job.usage.gpu as i64),
            format!("{:.1}", job.usage.mem_gb),
        ];
        let styled = if options.is_target(&job.user) {
            row.map(|cell| cell.bright_cyan().bold().to_string())
        } else if job.class == PartitionClass::Default {
            row.map(|cell| cell.green().to_string())
        } else {
            row.map(|cell| cell.red().to_string())
        };
        builder.push_record(styled);
    }

    let mut table = builder.build();
    table.with(Style::blank());
    table.to_string()
}
