//! Product cache inspection commands.

use console::style;

use crate::cli::icons::{dim_arrow, error, success, warn};
use crate::config::Settings;
use crate::models::Asin;

use super::helpers::open_cache;

/// Show cache entry counts.
pub fn cmd_cache_stats(settings: &Settings) -> anyhow::Result<()> {
    let cache = open_cache(settings)?;
    let stats = cache.stats();

    println!("\n{}", style("Product Cache").bold());
    println!("{}", "-".repeat(40));
    println!("{:<10} {}", "Path:", cache.path().display());
    println!("{:<10} {}", "Total:", stats.total);
    println!("{:<10} {}", "Valid:", style(stats.valid).green());
    println!("{:<10} {}", "Invalid:", style(stats.invalid).yellow());
    println!("{:<10} {}", "Expired:", style(stats.expired).dim());
    Ok(())
}

/// Report what the cache knows about each ASIN.
pub fn cmd_cache_check(settings: &Settings, ids: &[String]) -> anyhow::Result<()> {
    let cache = open_cache(settings)?;

    for raw in ids {
        let Some(asin) = Asin::parse(raw) else {
            println!("{} {} {}", error(), raw, style("not an ASIN").dim());
            continue;
        };
        let id = asin.as_str();
        if let Some(product) = cache.get(id) {
            println!("{} {} {}", success(), id, product.title);
        } else if cache.is_invalid(id) {
            println!("{} {} {}", warn(), id, style("confirmed absent").yellow());
        } else {
            println!("{} {} {}", dim_arrow(), id, style("needs fetch").dim());
        }
    }
    Ok(())
}
