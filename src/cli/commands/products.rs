//! Product lookup commands.

use console::style;

use crate::cli::icons::{dim_arrow, error, success, warn};
use crate::config::Settings;
use crate::paapi::SearchParams;

use super::helpers::{connect, to_json};

/// Fetch products by ASIN and print them as a JSON object keyed by ASIN.
pub async fn cmd_get(settings: &Settings, ids: &[String], pretty: bool) -> anyhow::Result<()> {
    let client = connect(settings)?;

    if let [id] = ids {
        return match client.get_product(id).await? {
            Some(product) => {
                println!("{}", to_json(&product, pretty)?);
                Ok(())
            }
            None => {
                eprintln!("{} {} not found", warn(), id);
                Ok(())
            }
        };
    }

    let products = client.get_products(ids).await?;
    let found: std::collections::BTreeMap<_, _> = products.into_iter().collect();
    println!("{}", to_json(&found, pretty)?);

    let missing: Vec<&String> = ids
        .iter()
        .filter(|id| !found.contains_key(&id.trim().to_ascii_uppercase()))
        .collect();
    if missing.is_empty() {
        eprintln!("{} {} products resolved", success(), found.len());
    } else {
        eprintln!(
            "{} {} of {} products resolved",
            warn(),
            found.len(),
            ids.len()
        );
        for id in missing {
            eprintln!("  {} {}", dim_arrow(), id);
        }
    }
    Ok(())
}

/// Run a keyword search and print the results as a JSON array.
pub async fn cmd_search(
    settings: &Settings,
    params: &SearchParams,
    pretty: bool,
) -> anyhow::Result<()> {
    let client = connect(settings)?;
    let products = client.search(params).await?;
    println!("{}", to_json(&products, pretty)?);
    eprintln!(
        "{} {} results for {}",
        success(),
        products.len(),
        style(&params.keywords).cyan()
    );
    Ok(())
}

/// Print each browse node of an item with its validity verdict.
pub async fn cmd_browse_nodes(settings: &Settings, id: &str) -> anyhow::Result<()> {
    let client = connect(settings)?;
    let Some(investigation) = client.browse_nodes(id).await? else {
        eprintln!("{} {} not found", warn(), id);
        return Ok(());
    };

    println!(
        "\n{}",
        style(format!("{} {}", investigation.asin, investigation.title)).bold()
    );
    println!("{}", "-".repeat(40));

    let chosen = &investigation.chosen;
    println!(
        "{:<10} {}",
        "Main:",
        if chosen.main.is_empty() {
            style("(none)".to_string()).dim()
        } else {
            style(chosen.main.clone()).green()
        }
    );
    if let Some(ref sub) = chosen.sub {
        println!("{:<10} {}", "Sub:", sub);
    }
    println!();

    for node in &investigation.nodes {
        let verdict = if node.valid { success() } else { error() };
        let rank = node
            .sales_rank
            .map(|r| format!(" rank {}", r))
            .unwrap_or_default();
        println!(
            "{} {} {}{}",
            verdict,
            node.display_name,
            style(format!("[{}]", node.id)).dim(),
            style(rank).dim()
        );
        for ancestor in &node.ancestors {
            let verdict = if ancestor.valid { success() } else { error() };
            println!(
                "    {} {} {}",
                verdict,
                ancestor.display_name,
                style(format!("[{}]", ancestor.id)).dim()
            );
        }
    }
    Ok(())
}
