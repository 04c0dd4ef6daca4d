//! Per-node inventory built from the raw `sinfo` node feed.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::gres::{self, CpuStates, GpuSpec, MemState};
use crate::core::hostlist;
use crate::core::jobs::JobShare;
use crate::core::ClassUsage;

/// Inventory keyed by hostname. A `BTreeMap` keeps iteration in hostname
/// order, which is the display order of the node table.
pub type Inventory = BTreeMap<String, NodeRecord>;

/// One physical node: its capacities from the node feed, plus the usage
/// accumulators filled in by the job aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub hostname: String,
    pub gpu: GpuSpec,
    pub cpu: CpuStates,
    pub mem: MemState,
    pub usage: ClassUsage,
    /// Running jobs touching this node, keyed by job id, each holding its
    /// per-node fractional share.
    pub jobs: BTreeMap<String, JobShare>,
}

impl NodeRecord {
    fn new(hostname: String, gpu: GpuSpec, cpu: CpuStates, mem: MemState) -> Self {
        Self {
            hostname,
            gpu,
            cpu,
            mem,
            usage: ClassUsage::default(),
            jobs: BTreeMap::new(),
        }
    }
}

/// Fields per node line: nodelist, GRES, CPU counters, alloc mem, total mem.
const NODE_FIELDS: usize = 5;

/// Build the inventory from the node feed, one line per uniform node group.
///
/// Every hostname expanded from the line's node-range expression gets its
/// own record sharing the group's decoded capacities, with independent
/// usage accumulators. Later lines overwrite earlier ones for the same
/// hostname, matching the scheduler's output ordering semantics.
///
/// With `gpu_only` set, a line whose GRES decodes to `null` is dropped
/// entirely; this is the only way a node can be absent from the inventory.
pub fn build(node_feed: &str, gpu_only: bool) -> Inventory {
    let mut inventory = Inventory::new();
    for line in node_feed.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < NODE_FIELDS {
            debug!(line, "skipping node line with too few fields");
            continue;
        }

        let gpu = gres::parse_gpu(fields[1]);
        if gpu_only && gpu.is_null() {
            continue;
        }
        let cpu = gres::parse_cpu_states(fields[2]);
        let mem = gres::parse_mem(fields[3], fields[4]);

        for hostname in hostlist::expand(fields[0]) {
            let record = NodeRecord::new(hostname.clone(), gpu.clone(), cpu, mem);
            inventory.insert(hostname, record);
        }
    }
    inventory
}
