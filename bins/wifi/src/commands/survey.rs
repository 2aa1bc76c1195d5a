//! wifi survey - channel survey.

use clap::Args;
use wlink::SocketManager;

use super::{Output, ifindex};

#[derive(Args)]
pub struct SurveyCmd {
    /// Interface name or index.
    dev: String,
}

impl SurveyCmd {
    pub async fn run(self, mgr: &SocketManager, out: Output) -> anyhow::Result<()> {
        let survey = mgr.get_survey_info(ifindex(&self.dev)?).await?;
        if out.json(&survey)? {
            return Ok(());
        }
        for entry in &survey {
            let in_use = if entry.in_use { " [in use]" } else { "" };
            println!("Survey data from {}", self.dev);
            println!("\tfrequency:\t\t\t{} MHz{}", entry.freq, in_use);
            if let Some(noise) = entry.noise {
                println!("\tnoise:\t\t\t\t{noise} dBm");
            }
            let times = [
                ("channel active time", entry.time),
                ("channel busy time", entry.time_busy),
                ("extension channel busy time", entry.time_ext_busy),
                ("channel receive time", entry.time_rx),
                ("channel transmit time", entry.time_tx),
                ("channel scan time", entry.time_scan),
            ];
            for (label, value) in times {
                if let Some(ms) = value {
                    println!("\t{label}:\t\t{ms} ms");
                }
            }
            if let Some(load) = entry.load() {
                println!("\tchannel load:\t\t\t{load}%");
            }
        }
        Ok(())
    }
}
