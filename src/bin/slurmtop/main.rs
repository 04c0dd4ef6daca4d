mod cli;

use std::collections::HashSet;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use slurmtop::render::{self, DisplayOptions};
use slurmtop::slurm::{self, SlurmCli};

fn main() -> Result<()> {
    let args = cli::SlurmTop::parse();

    // Initialize tracing based on verbosity
    let filter = match args.verbose {
        0 => "slurmtop=warn",
        1 => "slurmtop=info",
        2 => "slurmtop=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(cli::Commands::Completions(completions)) = args.command {
        let mut cmd = cli::SlurmTop::command();
        clap_complete::generate(
            completions.shell,
            &mut cmd,
            "slurmtop",
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    let config = slurmtop::config::load_config(args.config.as_ref()).unwrap_or_default();
    let gpu_only = args.gpu_only || config.display.gpu_only;
    let disp_users = args.disp_users || config.display.disp_users;
    let target_users: Option<HashSet<String>> =
        args.users.map(|users| users.into_iter().collect());

    let client = SlurmCli::new(&config.slurm);
    let snapshot = slurm::snapshot(&client, gpu_only)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    render::overview(&mut out, &snapshot.inventory)?;
    if let Some(users) = &target_users {
        render::user_summary(&mut out, &snapshot.jobs, users)?;
    }
    let options = DisplayOptions {
        disp_users,
        target_users,
    };
    render::node_table(&mut out, &snapshot.inventory, &options)?;

    Ok(())
}
