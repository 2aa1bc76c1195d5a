//! wifi reg - regulatory domain.

use clap::{Args, Subcommand};
use wlink::SocketManager;

#[derive(Args)]
pub struct RegCmd {
    #[command(subcommand)]
    action: RegAction,
}

#[derive(Subcommand)]
enum RegAction {
    /// Ask the kernel to switch to a regulatory domain.
    Set {
        /// ISO 3166-1 alpha-2 country code, or `00` for world.
        alpha2: String,
    },
}

impl RegCmd {
    pub async fn run(self, mgr: &SocketManager) -> anyhow::Result<()> {
        match self.action {
            RegAction::Set { alpha2 } => mgr.set_regulatory_domain(&alpha2).await?,
        }
        Ok(())
    }
}
