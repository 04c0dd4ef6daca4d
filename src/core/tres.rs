//! Decoder for a job's allocated-resource (AllocTRES) string.

/// Resources a job holds, as whole CPU/GPU units and memory in gigabytes.
///
/// The key set is closed: only `cpu`, `gpu` and `mem` are ever read from
/// the scheduler, so this is a fixed-shape record rather than a map.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceUsage {
    pub cpu: f64,
    pub gpu: f64,
    pub mem_gb: f64,
}

impl ResourceUsage {
    /// Decode an AllocTRES string such as
    /// `billing=8,cpu=8,gres/gpu=1,mem=100G,node=1`.
    ///
    /// Each resource is looked up by substring probe (`cpu=`, `gpu=`,
    /// `mem=`), which is how `gres/gpu=1` satisfies the GPU probe. The
    /// value runs to the next comma or the end of the string; a trailing
    /// `G` is stripped. Absent or unparseable values decode to `0.0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use slurmtop::core::tres::ResourceUsage;
    ///
    /// let usage = ResourceUsage::parse("cpu=4,gpu=2,mem=8G");
    /// assert_eq!(usage.cpu, 4.0);
    /// assert_eq!(usage.gpu, 2.0);
    /// assert_eq!(usage.mem_gb, 8.0);
    ///
    /// assert_eq!(ResourceUsage::parse("cpu=4").mem_gb, 0.0);
    /// ```
    pub fn parse(alloc_tres: &str) -> Self {
        Self {
            cpu: lookup(alloc_tres, "cpu"),
            gpu: lookup(alloc_tres, "gpu"),
            mem_gb: lookup(alloc_tres, "mem"),
        }
    }

    /// The fraction of this allocation attributed to each of `node_count`
    /// nodes. Fractional on purpose: a 4-GPU job on two nodes counts 2.0
    /// GPUs on each.
    pub fn per_node_share(&self, node_count: usize) -> Self {
        let divisor = node_count as f64;
        Self {
            cpu: self.cpu / divisor,
            gpu: self.gpu / divisor,
            mem_gb: self.mem_gb / divisor,
        }
    }

    pub fn accumulate(&mut self, other: &Self) {
        self.cpu += other.cpu;
        self.gpu += other.gpu;
        self.mem_gb += other.mem_gb;
    }
}

fn lookup(alloc_tres: &str, key: &str) -> f64 {
    let probe = format!("{key}=");
    let Some(at) = alloc_tres.find(&probe) else {
        return 0.0;
    };
    let value = &alloc_tres[at + probe.len()..];
    let value = match value.find(',') {
        Some(end) => &value[..end],
        None => value,
    };
    value
        .strip_suffix('G')
        .unwrap_or(value)
        .parse()
        .unwrap_or(0.0)
}
