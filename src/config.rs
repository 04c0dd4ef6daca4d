use std::path::PathBuf;

use serde::Deserialize;

#[derive(Deserialize, Debug, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub slurm: SlurmConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// The two scheduler queries. Kept in config because output columns and
/// the billing filter differ between sites.
#[derive(Deserialize, Debug, Clone)]
pub struct SlurmConfig {
    #[serde(default = "default_sinfo")]
    pub sinfo: String,
    #[serde(default = "default_sacct")]
    pub sacct: String,
}

impl Default for SlurmConfig {
    fn default() -> Self {
        Self {
            sinfo: default_sinfo(),
            sacct: default_sacct(),
        }
    }
}

fn default_sinfo() -> String {
    "sinfo -O nodehost:100,gres:100,cpusstate,allocmem,memory -h -e".to_string()
}

fn default_sacct() -> String {
    "sacct -X --format=User%10,Partition%30,NodeList%30,State,AllocTRES%80,JobID -a --units=G \
     | grep RUNNING | grep billing"
        .to_string()
}

/// Display defaults; the matching CLI flags override these per run.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct DisplayConfig {
    /// Only show nodes that carry GPUs.
    #[serde(default)]
    pub gpu_only: bool,
    /// Expand the per-job breakdown under each node row.
    #[serde(default)]
    pub disp_users: bool,
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Failed to get config directory"))
        .map(|p| p.join("slurmtop"))
}

pub fn load_config(config_path: Option<&PathBuf>) -> Result<Config, config::ConfigError> {
    let mut config_vec = vec![];

    // User-provided config file
    if let Some(config_path) = config_path {
        if config_path.exists() {
            config_vec.push(config_path.clone());
        } else {
            eprintln!("Warning: Config file {config_path:?} not found.");
        }
    }

    // Default config file
    if let Ok(default_config_path) = get_config_dir().map(|d| d.join("slurmtop.toml")) {
        if default_config_path.exists() {
            config_vec.push(default_config_path);
        }
    }

    let settings = config::Config::builder();
    let settings = config_vec.iter().fold(settings, |s, path| {
        s.add_source(config::File::from(path.as_path()))
    });

    settings
        .add_source(
            config::Environment::with_prefix("SLURMTOP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
