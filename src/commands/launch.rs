use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use std::sync::Arc;

use crate::app::AppContext;
use crate::commands::common;
use crate::config::LauncherConfig;
use crate::models::FlagSet;
use crate::utils::parse_flag_assignment;

#[derive(ClapArgs)]
pub struct Args {
    /// Flag override for this launch (repeatable)
    #[arg(short = 'f', long = "flag", value_name = "NAME=VALUE")]
    pub flags: Vec<String>,

    /// Exit right after the client starts instead of watching it
    #[arg(long)]
    pub detach: bool,
}

pub async fn execute(args: Args, config: LauncherConfig) -> Result<()> {
    let overrides = args
        .flags
        .iter()
        .map(|f| parse_flag_assignment(f))
        .collect::<Result<FlagSet>>()?;

    let ctx = Arc::new(AppContext::open(config)?);

    if args.detach {
        let id = ctx.launch(overrides).await.context("Launch failed")?;
        println!("Launched {}", id);
        return Ok(());
    }

    let tasks = ctx.start().await;
    let mut statuses = ctx.processes().subscribe();

    let id = ctx.launch(overrides).await.context("Launch failed")?;
    println!("Launched {} (Ctrl-C to stop)", id);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut last_count = None;

    loop {
        tokio::select! {
            status = statuses.recv() => {
                let Some(status) = status else { break };
                if last_count != Some(status.instances.len()) {
                    common::print_status(&status);
                    last_count = Some(status.instances.len());
                }
                if !status.is_running {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                println!("Stopping all instances...");
                ctx.kill_all().await;
                break;
            }
        }
    }

    statuses.unsubscribe();
    ctx.shutdown().await;
    tasks.stop();
    Ok(())
}
