//! Aggregation of the running-job feed onto the node inventory, plus the
//! flat per-job list used for cluster-wide user summaries.

use tracing::debug;

use crate::core::hostlist;
use crate::core::inventory::Inventory;
use crate::core::tres::ResourceUsage;
use crate::core::PartitionClass;

/// One job's allocation share on a single node.
#[derive(Debug, Clone, PartialEq)]
pub struct JobShare {
    pub user: String,
    /// Raw partition name, kept for display.
    pub partition: String,
    pub class: PartitionClass,
    /// The job's total allocation divided by its node count.
    pub usage: ResourceUsage,
}

/// One raw job record, unfiltered by inventory membership. Feeds the
/// per-user summary, which must also see jobs on nodes excluded from the
/// node table (e.g. by `--gpu-only`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub user: String,
    pub partition: String,
    pub nodelist: String,
    pub alloc_tres: String,
    pub job_id: String,
}

/// Fields per job line: user, partition, nodelist, state, AllocTRES, job id.
const JOB_FIELDS: usize = 6;

fn job_fields(line: &str) -> Option<(&str, &str, &str, &str, &str)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < JOB_FIELDS {
        if !fields.is_empty() {
            debug!(line, "skipping job line with too few fields");
        }
        return None;
    }
    // fields[3] is the job state, already filtered to RUNNING by the query.
    Some((fields[0], fields[1], fields[2], fields[4], fields[5]))
}

/// Fold the job feed onto the inventory.
///
/// Each job's allocation is divided evenly across its expanded nodes and
/// attributed to every node present in the inventory: once as a
/// [`JobShare`] keyed by job id, once into the node's partition-class
/// accumulator. Hostnames missing from the inventory are dropped
/// silently; a job may legitimately span nodes the inventory filter
/// excluded.
pub fn aggregate(job_feed: &str, inventory: &mut Inventory) {
    for line in job_feed.lines() {
        let Some((user, partition, nodelist, alloc_tres, job_id)) = job_fields(line) else {
            continue;
        };

        let usage = ResourceUsage::parse(alloc_tres);
        let nodes = hostlist::expand(nodelist);
        let class = PartitionClass::classify(partition);
        debug!(job_id, partition, class = %class, nodes = nodes.len(), "attributing job");

        for hostname in &nodes {
            let Some(record) = inventory.get_mut(hostname) else {
                continue;
            };
            let share = usage.per_node_share(nodes.len());
            record.jobs.insert(
                job_id.to_string(),
                JobShare {
                    user: user.to_string(),
                    partition: partition.to_string(),
                    class,
                    usage: share,
                },
            );
            record.usage.class_mut(class).accumulate(&share);
        }
    }
}

/// Parse the job feed into the flat per-job list, same line format as
/// [`aggregate`] but with no inventory filtering.
pub fn parse_summaries(job_feed: &str) -> Vec<JobSummary> {
    job_feed
        .lines()
        .filter_map(|line| {
            let (user, partition, nodelist, alloc_tres, job_id) = job_fields(line)?;
            Some(JobSummary {
                user: user.to_string(),
                partition: partition.to_string(),
                nodelist: nodelist.to_string(),
                alloc_tres: alloc_tres.to_string(),
                job_id: job_id.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inventory;

    const NODE_FEED: &str = "\
gpu[01-02] gpu:a100:4 32/96/0/128 102400 512000
cpu01 (null) 0/64/0/64 0 256000
";

    fn test_inventory() -> Inventory {
        inventory::build(NODE_FEED, false)
    }

    #[test]
    fn test_fractional_attribution_across_nodes() {
        let mut inv = test_inventory();
        aggregate(
            "alice research gpu[01-02] RUNNING cpu=8,gres/gpu=4,mem=64G 1001\n",
            &mut inv,
        );

        for host in ["gpu01", "gpu02"] {
            let share = &inv[host].jobs["1001"];
            assert_eq!(share.user, "alice");
            assert_eq!(share.usage.cpu, 4.0);
            assert_eq!(share.usage.gpu, 2.0);
            assert_eq!(share.usage.mem_gb, 32.0);
        }

        // The shares sum back to the job's total allocation.
        let total: f64 = ["gpu01", "gpu02"]
            .iter()
            .map(|h| inv[*h].usage.priority.gpu)
            .sum();
        assert_eq!(total, 4.0);
    }

    #[test]
    fn test_partition_class_routes_accumulators() {
        let mut inv = test_inventory();
        aggregate(
            "\
alice research gpu01 RUNNING gres/gpu=2 1001
bob gpu-default gpu01 RUNNING gres/gpu=1 1002
",
            &mut inv,
        );
        let node = &inv["gpu01"];
        assert_eq!(node.usage.priority.gpu, 2.0);
        assert_eq!(node.usage.default.gpu, 1.0);
        assert_eq!(node.jobs["1001"].class, PartitionClass::Priority);
        assert_eq!(node.jobs["1002"].class, PartitionClass::Default);
    }

    #[test]
    fn test_unknown_nodes_dropped_silently() {
        let mut inv = test_inventory();
        aggregate(
            "alice research gpu[01-04] RUNNING gres/gpu=4 1001\n",
            &mut inv,
        );
        // Only two of the four nodes exist; each still gets a quarter.
        assert_eq!(inv["gpu01"].usage.priority.gpu, 1.0);
        assert_eq!(inv["gpu02"].usage.priority.gpu, 1.0);
        assert!(!inv.contains_key("gpu03"));
    }

    #[test]
    fn test_job_on_entirely_unknown_nodes_is_a_no_op() {
        let mut inv = test_inventory();
        let before = inv.clone();
        aggregate("carol research far[01-02] RUNNING cpu=8 1003\n", &mut inv);
        assert_eq!(inv, before);
    }

    #[test]
    fn test_short_lines_skipped() {
        let mut inv = test_inventory();
        let before = inv.clone();
        aggregate("alice research gpu01 RUNNING cpu=4\n\n", &mut inv);
        assert_eq!(inv, before);
    }

    #[test]
    fn test_multiple_jobs_accumulate_on_one_node() {
        let mut inv = test_inventory();
        aggregate(
            "\
alice research gpu01 RUNNING cpu=8,gres/gpu=2,mem=32G 1001
bob research gpu01 RUNNING cpu=4,gres/gpu=1,mem=16G 1002
",
            &mut inv,
        );
        let node = &inv["gpu01"];
        assert_eq!(node.jobs.len(), 2);
        assert_eq!(node.usage.priority.cpu, 12.0);
        assert_eq!(node.usage.priority.gpu, 3.0);
        assert_eq!(node.usage.priority.mem_gb, 48.0);
    }

    #[test]
    fn test_aggregation_is_idempotent_on_fresh_inventory() {
        let job_feed = "\
alice research gpu[01-02] RUNNING cpu=8,gres/gpu=4,mem=64G 1001
bob gpu-default cpu01 RUNNING cpu=4,mem=16G 1002
";
        let mut first = test_inventory();
        aggregate(job_feed, &mut first);
        let mut second = test_inventory();
        aggregate(job_feed, &mut second);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_summaries_ignores_inventory() {
        let summaries = parse_summaries(
            "carol research far[01-02] RUNNING cpu=8,gres/gpu=2 1003\n",
        );
        assert_eq!(
            summaries,
            vec![JobSummary {
                user: "carol".to_string(),
                partition: "research".to_string(),
                nodelist: "far[01-02]".to_string(),
                alloc_tres: "cpu=8,gres/gpu=2".to_string(),
                job_id: "1003".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_summaries_skips_short_lines() {
        assert!(parse_summaries("alice research\n").is_empty());
        assert!(parse_summaries("").is_empty());
    }
}
