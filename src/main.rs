use anyhow::{Context, Result};
use log::info;
use mealprep::api_connection::{build_http_client, FetchChain, FoodDataCentralClient, HttpSheet};
use mealprep::cli::{parse_args, Commands};
use mealprep::config::AppConfig;
use mealprep::nutritional_matcher::{FoodDatabaseResolver, ResolverChain, SheetResolver};
use mealprep::recipe_aggregator::NutritionAggregator;
use mealprep::recipe_parser::segment;
use mealprep::search::{load_sheet_rows, CachedSheet, StaticSheet};
use mealprep::structured_data::fetch_recipe_from_url;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}

async fn read_recipe_file(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read recipe file '{}'", path.display()))
}

/// Reference sheet first when one is configured, then the food database.
fn build_resolver_chain(
    config: &AppConfig,
    client: &reqwest::Client,
    sheet_override: Option<PathBuf>,
) -> Result<ResolverChain> {
    let mut chain = ResolverChain::default();

    if let Some(path) = sheet_override.or_else(|| config.sheet_path.clone()) {
        let rows = load_sheet_rows(&path)?;
        info!("Loaded {} reference sheet rows from {}", rows.len(), path.display());
        chain.push(Arc::new(SheetResolver::new(Arc::new(StaticSheet::new(rows)))));
    } else if let Some(url) = &config.sheet_url {
        let sheet = CachedSheet::new(HttpSheet::new(client.clone(), url), config.sheet_cache_ttl)
            .with_retry_after(config.sheet_retry_after);
        chain.push(Arc::new(SheetResolver::new(Arc::new(sheet))));
    }

    let fdc = FoodDataCentralClient::new(client.clone(), &config.fdc_api_key, &config.fdc_search_url);
    chain.push(Arc::new(FoodDatabaseResolver::new(Arc::new(fdc))));
    Ok(chain)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli_args = parse_args();
    let config = AppConfig::from_env();
    let client = build_http_client(config.http_timeout).context("Failed to build HTTP client")?;

    match cli_args.command {
        Commands::Parse { file } => {
            let text = read_recipe_file(&file).await?;
            print_json(&segment(&text))?;
        }
        Commands::Import { url } => {
            let fetcher = FetchChain::from_proxies(&client, &config.proxy_urls);
            let recipe = fetch_recipe_from_url(&fetcher, &url).await?;
            print_json(&recipe)?;
        }
        Commands::Nutrition {
            file,
            servings,
            sheet,
        } => {
            let text = read_recipe_file(&file).await?;
            let recipe = segment(&text);
            info!("Parsed '{}' with {} ingredients", recipe.title, recipe.ingredients.len());

            let chain = build_resolver_chain(&config, &client, sheet)?;
            let nutrition = NutritionAggregator::new(chain)
                .aggregate(&recipe.ingredients)
                .await?;

            if servings > 1 {
                print_json(&json!({
                    "title": recipe.title,
                    "items": nutrition.items,
                    "totals": nutrition.totals,
                    "servings": servings,
                    "perServing": nutrition.per_serving(servings),
                }))?;
            } else {
                print_json(&json!({
                    "title": recipe.title,
                    "items": nutrition.items,
                    "totals": nutrition.totals,
                }))?;
            }
        }
    }

    Ok(())
}
