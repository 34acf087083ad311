use cellmap_db::{CellmapConfig, NamingPolicy};
use clap::Args as ClapArgs;

#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, ClapArgs)]
pub struct Command {
    /// Naming policy (default: the configured mapper policy)
    #[clap(long, short = 'p', value_parser = parse_policy, conflicts_with = "all")]
    pub policy: Option<NamingPolicy>,

    /// Print the translation under every policy
    #[clap(long, short = 'a')]
    pub all: bool,

    /// Attribute names to translate
    #[clap(required = true)]
    pub names: Vec<String>,
}

fn parse_policy(s: &str) -> Result<NamingPolicy, String> {
    s.parse::<NamingPolicy>().map_err(|e| e.to_string())
}

pub fn run(cmd: &Command, config: &CellmapConfig) -> anyhow::Result<()> {
    trace!("Running command: {:?}", cmd);

    if cmd.all {
        for name in &cmd.names {
            for policy in NamingPolicy::ALL {
                println!("{}\t{}\t{}", name, policy, policy.translate(name));
            }
        }
        return Ok(());
    }

    let policy = cmd.policy.unwrap_or(config.mapper.naming_policy);
    for name in &cmd.names {
        println!("{}", policy.translate(name));
    }
    Ok(())
}
