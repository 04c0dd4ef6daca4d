pub mod gres;
pub mod hostlist;
pub mod inventory;
pub mod jobs;
pub mod tres;

use strum::Display;

use crate::core::tres::ResourceUsage;

/// Billing class of a Slurm partition.
///
/// The cluster runs two kinds of queues: preemptible "default" queues and
/// the paid "priority" queues. There is no scheduler metadata for this, so
/// classification goes by queue name: anything containing `default` or
/// `gpu` counts as default-class, everything else as priority-class.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[strum(serialize_all = "lowercase")]
pub enum PartitionClass {
    Priority,
    Default,
}

impl PartitionClass {
    /// Classify a partition by its name.
    ///
    /// Known quirk: a queue named `gpu-priority` lands in the default class
    /// because of the `gpu` substring. Sites naming queues that way should
    /// adjust the heuristic before trusting the priority column.
    ///
    /// # Examples
    ///
    /// ```
    /// use slurmtop::core::PartitionClass;
    ///
    /// assert_eq!(PartitionClass::classify("gpu-default"), PartitionClass::Default);
    /// assert_eq!(PartitionClass::classify("main-priority"), PartitionClass::Priority);
    /// assert_eq!(PartitionClass::classify("research"), PartitionClass::Priority);
    /// ```
    pub fn classify(partition: &str) -> Self {
        if partition.contains("default") || partition.contains("gpu") {
            Self::Default
        } else {
            Self::Priority
        }
    }
}

/// Per-node resource accumulator, one slot per partition class.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClassUsage {
    pub priority: ResourceUsage,
    pub default: ResourceUsage,
}

impl ClassUsage {
    pub fn class(&self, class: PartitionClass) -> &ResourceUsage {
        match class {
            PartitionClass::Priority => &self.priority,
            PartitionClass::Default => &self.default,
        }
    }

    pub fn class_mut(&mut self, class: PartitionClass) -> &mut ResourceUsage {
        match class {
            PartitionClass::Priority => &mut self.priority,
            PartitionClass::Default => &mut self.default,
        }
    }
}
