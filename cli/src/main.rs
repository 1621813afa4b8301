mod args;

use anyhow::Context;
use args::{Command, ProgArgs};
use clap::Parser;
use fmm_core::{ModManager, ModManagerConfig};
use fmm_model::ModName;
use fmm_portal::ServiceCredential;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = ProgArgs::parse();

    let config = match &args.root_dir {
        Some(root) => ModManagerConfig::under_root(root),
        None => ModManagerConfig::default_under_user_data_dir().context("could not determine a default data directory; pass --root-dir")?,
    };

    let mut manager = ModManager::new(config)?;

    match args.command {
        Command::List => {
            for m in manager.installed()? {
                println!("{} {} ({:?})", m.name, m.version, m.form);
            }
        }
        Command::Validate => {
            let findings = manager.validate()?;
            if findings.is_empty() {
                println!("no problems found");
            } else {
                for finding in &findings {
                    println!("{finding}");
                }
            }
        }
        Command::Resolve { names } => {
            let seeds = parse_names(&names)?;
            for meta in manager.resolve(&seeds).await? {
                println!("{} {}", meta.name, meta.version);
            }
        }
        Command::Install { names } => {
            let seeds = parse_names(&names)?;
            let credential = ServiceCredential::new(
                args.api_username.context("--api-username is required for install")?,
                args.api_token.context("--api-token is required for install")?,
            );
            manager.install(&seeds, &credential).await?;
            println!("installed {} mod(s)", seeds.len());
        }
        Command::Uninstall { name } => {
            manager.uninstall(&name.parse()?)?;
            println!("uninstalled {name}");
        }
        Command::Enable { name } => {
            manager.enable(&name.parse()?)?;
            println!("enabled {name}");
        }
        Command::Disable { name } => {
            manager.disable(&name.parse()?)?;
            println!("disabled {name}");
        }
        Command::ReadSave { path } => {
            let header = manager.read_save(&path)?;
            println!("game version: {:?}", header.game_version);
            println!("level: {}", header.level_name);
            for m in &header.mods {
                println!("  mod: {} {}", m.name, m.version);
            }
        }
    }

    Ok(())
}

fn parse_names(names: &[String]) -> anyhow::Result<Vec<ModName>> {
    names.iter().map(|n| n.parse().map_err(anyhow::Error::from)).collect()
}
