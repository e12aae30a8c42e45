//! Dissect command

use std::process::ExitCode;

use anyhow::{Context, Result};
use dissector_core::{
    DataItem, DissectError, Dissection, ErrorKind, Gateway, HttpGateway, dissect, read_item,
};
use dissector_schema::ItemId;
use futures::future::join_all;

use crate::{Cli, exit, output};

/// Dissect every requested transaction and print the results.
///
/// Ids are processed concurrently. Each failure is reported on stderr; the
/// exit status reflects the first failing id in argument order.
pub async fn run(cli: &Cli) -> Result<ExitCode> {
    let config = cli.gateway_config();
    tracing::debug!("Using gateway {}", config.base_url);
    let gateway = HttpGateway::new(config).context("Failed to build HTTP client")?;

    let results = join_all(
        cli.tx_ids
            .iter()
            .map(|id| inspect(&gateway, id, cli.item.as_ref())),
    )
    .await;

    let mut first_failure: Option<ErrorKind> = None;
    for (tx_id, result) in cli.tx_ids.iter().zip(results) {
        match result {
            Ok((d, item)) => {
                if cli.json {
                    println!("{}", output::json(&d, item.as_ref())?);
                } else {
                    print!("{}", output::text(&d, item.as_ref(), cli.verbose));
                }
            }
            Err(e) => {
                eprintln!("error: {tx_id}: {e} [{}]", e.kind());
                first_failure.get_or_insert(e.kind());
            }
        }
    }

    Ok(exit::status(first_failure))
}

async fn inspect<G: Gateway>(
    gateway: &G,
    tx_id: &str,
    item: Option<&ItemId>,
) -> Result<(Dissection, Option<DataItem>), DissectError> {
    let d = dissect(gateway, tx_id).await?;
    let item = match item {
        Some(id) => Some(read_item(gateway, &d, id).await?),
        None => None,
    };
    Ok((d, item))
}
