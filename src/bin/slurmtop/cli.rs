use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "slurmtop",
    author,
    version,
    about = "Display Slurm cluster usage with detailed node and resource information."
)]
pub struct SlurmTop {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(long, global = true, help = "Path to the config file", hide = true)]
    pub config: Option<std::path::PathBuf>,

    #[arg(long, help = "Only show nodes with GPUs")]
    pub gpu_only: bool,

    #[arg(long, help = "Display detailed per-job usage under each node")]
    pub disp_users: bool,

    #[arg(long, num_args = 1.., help = "Filter by user netids")]
    pub users: Option<Vec<String>>,

    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,
}

#[derive(Debug, Parser)]
pub enum Commands {
    /// Generate tab-completion scripts for your shell
    Completions(CompletionsArgs),
}

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// The shell to generate the completions for
    pub shell: clap_complete::Shell,
}
