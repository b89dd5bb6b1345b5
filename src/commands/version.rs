use anyhow::Result;

use crate::app::VERSION;

pub async fn execute() -> Result<()> {
    println!("bloxlaunch {}", VERSION);
    Ok(())
}
