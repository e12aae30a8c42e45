//! dissector - inspect ANS-104 bundles on Arweave
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
//!
//! Given one or more transaction ids, prints each bundle's data root, its
//! location in the weave, and the ids and sizes of the data items listed in
//! its index. Item payloads are never downloaded.

pub mod cmd;
pub mod exit;
pub mod output;

use std::time::Duration;

use clap::Parser;
use dissector_core::GatewayConfig;
use dissector_schema::ItemId;

#[derive(Debug, Parser)]
#[command(name = "dissector")]
#[command(author, version, about = "dissector - inspect ANS-104 bundles on Arweave")]
pub struct Cli {
    /// Bundle transaction id(s)
    #[arg(required = true)]
    pub tx_ids: Vec<String>,

    /// Gateway or node base URL [env: ARWEAVE_GATEWAY] [default: https://arweave.net]
    #[arg(long, short = 'g')]
    pub gateway: Option<String>,

    /// Request timeout in seconds [env: DISSECTOR_TIMEOUT] [default: 30]
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Also decode the header of this data item (base64url id)
    #[arg(long, value_name = "ID")]
    pub item: Option<ItemId>,

    /// Print one JSON document per transaction
    #[arg(long)]
    pub json: bool,

    /// Show tags, item byte ranges, and debug logs
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Gateway configuration: environment first, flags on top.
    pub fn gateway_config(&self) -> GatewayConfig {
        let mut config = GatewayConfig::from_env();
        if let Some(url) = &self.gateway {
            config = config.with_base_url(url.as_str());
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }
}
