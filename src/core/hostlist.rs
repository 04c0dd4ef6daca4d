//! Expansion of compressed Slurm node-range expressions.
//!
//! `sinfo` and `sacct` report node sets in a compact form such as
//! `gpu[01-04,09],login1`. Everything downstream works on explicit
//! hostnames, so this is the first decoding step for both feeds.

/// Expand a node-range expression into the explicit list of hostnames.
///
/// Top-level segments are separated by commas outside brackets; commas
/// inside `[...]` separate range specs and do not split the node list.
/// Zero padding is preserved from the digit count of the range start, so
/// `node[08-10]` keeps two-digit suffixes while `node[8-10]` does not.
///
/// Malformed ranges (reversed bounds, non-numeric endpoints) expand to
/// nothing rather than failing; an empty segment stays an empty hostname
/// and is left for the caller to ignore.
///
/// # Examples
///
/// ```
/// use slurmtop::core::hostlist::expand;
///
/// assert_eq!(expand("node[01-03]"), vec!["node01", "node02", "node03"]);
/// assert_eq!(expand("nodeA,nodeB[05-06]"), vec!["nodeA", "nodeB05", "nodeB06"]);
/// assert_eq!(expand("login1"), vec!["login1"]);
/// ```
pub fn expand(nodelist: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, ch) in nodelist.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                segments.push(&nodelist[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&nodelist[start..]);

    let mut hosts = Vec::new();
    for segment in segments {
        match (segment.find('['), segment.find(']')) {
            (Some(open), Some(close)) if open < close => {
                let prefix = &segment[..open];
                for spec in segment[open + 1..close].split(',') {
                    for suffix in expand_range(spec) {
                        hosts.push(format!("{prefix}{suffix}"));
                    }
                }
            }
            _ => hosts.push(segment.to_string()),
        }
    }
    hosts
}

/// Expand a single bracket spec: either a literal suffix or an inclusive
/// `start-end` range, zero-padded to the width of the start token.
fn expand_range(spec: &str) -> Vec<String> {
    match spec.split_once('-') {
        Some((start, end)) => {
            let width = start.len();
            let (Ok(lo), Ok(hi)) = (start.parse::<u64>(), end.parse::<u64>()) else {
                return Vec::new();
            };
            (lo..=hi).map(|n| format!("{n:0width$}")).collect()
        }
        None => vec![spec.to_string()],
    }
}
