use anyhow::Result;
use clap::Args as ClapArgs;

use crate::utils::open_in_browser;

#[derive(ClapArgs)]
pub struct Args {
    /// http(s) URL to open
    pub url: String,
}

pub async fn execute(args: Args) -> Result<()> {
    open_in_browser(&args.url)
}
