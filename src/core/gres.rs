//! Decoders for the per-node resource columns of the node feed: the GPU
//! generic-resource (GRES) string, the `allocated/idle/other/total` CPU
//! counters, and the allocated/total memory columns.
//!
//! Scheduler output is heterogeneous across Slurm versions and site
//! configs, so every decoder here degrades to zero values instead of
//! failing. A node with garbage in one column still shows up.

/// GRES marker for a node without GPUs (`(null)` in sinfo output).
pub const NO_GPU: &str = "null";

/// GPU capacity of one node, decoded from its GRES string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuSpec {
    /// Rendered model label: `a100`, `(a100|h100)` for mixed nodes, or
    /// `null` when the node has no GPUs.
    pub kind: String,
    /// Total GPU count across all models on the node.
    pub count: u32,
}

impl GpuSpec {
    pub fn none() -> Self {
        Self {
            kind: NO_GPU.to_string(),
            count: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.kind == NO_GPU
    }
}

/// Decode a GRES string such as `gpu:a100:4` or `gpu:a100:2,gpu:h100:1`.
///
/// A `null` marker anywhere in the string wins immediately. Otherwise each
/// comma-separated item counts only if it has at least three colon fields
/// and starts with `gpu`; the count field is digit-filtered first, so
/// index annotations like `gpu:a100:4(S:0-1)` parse as 4.
///
/// # Examples
///
/// ```
/// use slurmtop::core::gres::parse_gpu;
///
/// assert_eq!(parse_gpu("gpu:a100:4(S:0-1)").count, 4);
/// assert_eq!(parse_gpu("gpu:a100:2,gpu:h100:1").kind, "(a100|h100)");
/// assert_eq!(parse_gpu("(null)").kind, "null");
/// ```
pub fn parse_gpu(gres: &str) -> GpuSpec {
    if gres.contains(NO_GPU) {
        return GpuSpec::none();
    }

    let mut models: Vec<&str> = Vec::new();
    let mut total = 0u32;
    for item in gres.split(',') {
        let fields: Vec<&str> = item.split(':').collect();
        if fields.len() < 3 || !fields[0].starts_with("gpu") {
            continue;
        }
        if !models.contains(&fields[1]) {
            models.push(fields[1]);
        }
        let digits: String = fields[2].chars().filter(char::is_ascii_digit).collect();
        total += digits.parse::<u32>().unwrap_or(0);
    }

    let kind = match models.as_slice() {
        [] => NO_GPU.to_string(),
        [model] => (*model).to_string(),
        many => format!("({})", many.join("|")),
    };
    GpuSpec { kind, count: total }
}

/// CPU availability of one node; only the idle counter is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuStates {
    pub idle: u32,
}

/// Decode the `allocated/idle/other/total` counter string. The idle field
/// must be purely numeric, anything else counts as zero idle CPUs.
pub fn parse_cpu_states(counters: &str) -> CpuStates {
    let idle = counters
        .split('/')
        .nth(1)
        .and_then(parse_unsigned)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0);
    CpuStates { idle }
}

/// Memory state of one node, in megabytes as reported by sinfo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemState {
    /// Unallocated memory. Negative when the scheduler reports more
    /// allocated than installed; kept raw so the display exposes it.
    pub idle_mb: i64,
    pub total_mb: i64,
}

/// Decode the allocated and total memory columns. Non-numeric input
/// counts as zero; the subtraction is not clamped.
pub fn parse_mem(alloc_mb: &str, total_mb: &str) -> MemState {
    let alloc = parse_unsigned(alloc_mb).unwrap_or(0) as i64;
    let total = parse_unsigned(total_mb).unwrap_or(0) as i64;
    MemState {
        idle_mb: total - alloc,
        total_mb: total,
    }
}

/// Strict unsigned parse: digits only, no sign, no whitespace.
fn parse_unsigned(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gpu_single_model() {
        let gpu = parse_gpu("gpu:a100:4");
        assert_eq!(gpu.kind, "a100");
        assert_eq!(gpu.count, 4);
        assert!(!gpu.is_null());
    }

    #[test]
    fn test_parse_gpu_socket_annotation_stripped() {
        let gpu = parse_gpu("gpu:a100:4(S:0-1)");
        assert_eq!(gpu.kind, "a100");
        assert_eq!(gpu.count, 4);
    }

    #[test]
    fn test_parse_gpu_multiple_models() {
        let gpu = parse_gpu("gpu:a100:2,gpu:h100:1");
        assert_eq!(gpu.kind, "(a100|h100)");
        assert_eq!(gpu.count, 3);
    }

    #[test]
    fn test_parse_gpu_duplicate_model_counts_summed() {
        let gpu = parse_gpu("gpu:a100:2,gpu:a100:2");
        assert_eq!(gpu.kind, "a100");
        assert_eq!(gpu.count, 4);
    }

    #[test]
    fn test_parse_gpu_null_marker_wins() {
        assert_eq!(parse_gpu("(null)"), GpuSpec::none());
        // Even alongside otherwise valid items.
        assert_eq!(parse_gpu("gpu:a100:4,null"), GpuSpec::none());
    }

    #[test]
    fn test_parse_gpu_ignores_non_gpu_items() {
        let gpu = parse_gpu("fpga:x1:2,gpu:a100:4");
        assert_eq!(gpu.kind, "a100");
        assert_eq!(gpu.count, 4);
    }

    #[test]
    fn test_parse_gpu_too_few_fields_ignored() {
        assert_eq!(parse_gpu("gpu:4"), GpuSpec::none());
        assert_eq!(parse_gpu(""), GpuSpec::none());
    }

    #[test]
    fn test_parse_gpu_gpu_prefixed_first_field() {
        // "gpus" still satisfies the prefix check, as in the scheduler.
        let gpu = parse_gpu("gpus:a100:8");
        assert_eq!(gpu.count, 8);
    }

    #[test]
    fn test_parse_cpu_states() {
        assert_eq!(parse_cpu_states("32/96/0/128").idle, 96);
        assert_eq!(parse_cpu_states("0/64/0/64").idle, 64);
    }

    #[test]
    fn test_parse_cpu_states_degrades_to_zero() {
        assert_eq!(parse_cpu_states("").idle, 0);
        assert_eq!(parse_cpu_states("128").idle, 0);
        assert_eq!(parse_cpu_states("32/N/0/128").idle, 0);
        assert_eq!(parse_cpu_states("32//0/128").idle, 0);
        assert_eq!(parse_cpu_states("32/+6/0/128").idle, 0);
    }

    #[test]
    fn test_parse_mem() {
        let mem = parse_mem("102400", "512000");
        assert_eq!(mem.idle_mb, 409600);
        assert_eq!(mem.total_mb, 512000);
    }

    #[test]
    fn test_parse_mem_non_numeric_is_zero() {
        let mem = parse_mem("N/A", "512000");
        assert_eq!(mem.idle_mb, 512000);
        let mem = parse_mem("1024", "N/A");
        assert_eq!(mem.total_mb, 0);
        assert_eq!(mem.idle_mb, -1024);
    }

    #[test]
    fn test_parse_mem_overallocation_goes_negative() {
        let mem = parse_mem("600000", "512000");
        assert_eq!(mem.idle_mb, -88000);
    }
}
