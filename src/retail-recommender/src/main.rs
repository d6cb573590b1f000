//! Retail Recommender: popular-product reports and similar-product search
//! over an online retail transaction dataset.
//!
//! Loads the dataset once, builds the product summary table, then runs a
//! single subcommand against it.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use retail_core::config::{AppConfig, LoggingConfig};
use retail_core::validation::{parse_count, validate_query};
use retail_core::{GroupKey, RankingEntry, RankingScope, RetailError, TransactionStore};
use retail_personalization::{RecommendationEngine, RecommendationRequest, SortOrder};
use retail_reporting::{
    build_summary, export_csv, monthly_trends, top_n, top_n_for, PopularItemsReport,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "retail-recommender")]
#[command(about = "Popular products and similar-product recommendations for retail transactions")]
#[command(version)]
struct Cli {
    /// Dataset file: .json array, .jsonl/.ndjson rows or .xlsx workbook (overrides config)
    #[arg(long, global = true, env = "RETAIL_RECOMMENDER__DATASET__PATH")]
    dataset: Option<String>,

    /// Emit logs as JSON (overrides config)
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Describe the loaded dataset: row counts, missing values, first rows
    Describe,

    /// List the countries present in the dataset
    Countries,

    /// Top products globally, per country and per month
    Popular {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Top products for one scope, optionally for a single country or month
    Top {
        #[arg(value_enum)]
        scope: ScopeArg,

        /// Country name or month number (1-12)
        #[arg(short, long)]
        key: Option<String>,

        /// Number of products per group (default from config)
        #[arg(short = 'n', long)]
        count: Option<String>,
    },

    /// Monthly sales of the best-selling products
    Trends {
        /// Number of products to track (default from config)
        #[arg(long)]
        products: Option<String>,
    },

    /// Products related to a free-text query
    Recommend {
        query: String,

        /// Number of recommendations (default from config)
        #[arg(short = 'n', long)]
        count: Option<String>,

        /// Re-order the results after ranking
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
    },

    /// Price and total quantity sold for one product
    Product { description: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScopeArg {
    Global,
    Country,
    Month,
}

impl From<ScopeArg> for RankingScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Global => RankingScope::Global,
            ScopeArg::Country => RankingScope::Country,
            ScopeArg::Month => RankingScope::Month,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Popularity,
    PriceAsc,
    PriceDesc,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Popularity => SortOrder::Popularity,
            SortArg::PriceAsc => SortOrder::PriceAscending,
            SortArg::PriceDesc => SortOrder::PriceDescending,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = AppConfig::load();
    let mut config = loaded.as_ref().cloned().unwrap_or_default();
    if cli.json_logs {
        config.logging.json = true;
    }
    init_tracing(&config.logging);

    if let Err(e) = &loaded {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    // Apply CLI overrides
    if let Some(path) = cli.dataset {
        config.dataset.path = path;
    }
    config.validate()?;

    info!(dataset = %config.dataset.path, "Configuration loaded");

    let store = TransactionStore::load(&config.dataset.path)
        .with_context(|| format!("failed to load dataset `{}`", config.dataset.path))?;

    match cli.command {
        Commands::Describe => print_description(&store),
        Commands::Countries => {
            for country in store.countries() {
                println!("{country}");
            }
        }
        Commands::Popular { format } => {
            let report = PopularItemsReport::build(store.transactions(), &config.ranking);
            match format {
                OutputFormat::Text => {
                    println!("\n--- TOP {} PRODUCTS GLOBALLY ---\n", report.global.n);
                    print_entries(&report.global.entries);
                    println!("\n--- TOP {} PRODUCTS BY COUNTRY ---\n", report.by_country.n);
                    print_entries(&report.by_country.entries);
                    println!("\n--- TOP {} PRODUCTS BY MONTH ---\n", report.by_month.n);
                    print_entries(&report.by_month.entries);
                }
                OutputFormat::Csv => {
                    for view in report.views() {
                        println!("{}", export_csv(view));
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        Commands::Top { scope, key, count } => {
            let scope = RankingScope::from(scope);
            let n = match count {
                Some(raw) => parse_count(&raw)?,
                None => default_top(&config, scope),
            };
            match key {
                Some(raw) => {
                    let key = parse_group_key(scope, &raw)?;
                    let entries = top_n_for(store.transactions(), &key, n);
                    if entries.is_empty() {
                        println!("No sales data found for {key}.");
                    } else {
                        print_entries(&entries);
                    }
                }
                None => {
                    let view = top_n(store.transactions(), scope, n);
                    println!("Top {} products\n", view.n);
                    print_entries(&view.entries);
                }
            }
        }
        Commands::Trends { products } => {
            let k = match products {
                Some(raw) => parse_count(&raw)?,
                None => config.ranking.trend_products,
            };
            let table = monthly_trends(store.transactions(), k);
            println!("month\t{}", table.products.join("\t"));
            for row in &table.rows {
                let cells: Vec<String> = row.quantities.iter().map(|q| q.to_string()).collect();
                println!("{}\t{}", row.month, cells.join("\t"));
            }
        }
        Commands::Recommend { query, count, sort } => {
            let query = validate_query(&query)?;
            let limit = match count {
                Some(raw) => parse_count(&raw)?,
                None => config.recommendation.default_count,
            };

            let engine = RecommendationEngine::new(build_summary(store.transactions()));
            let response = engine.recommend(&RecommendationRequest {
                query: query.to_string(),
                limit,
                sort: sort.map(SortOrder::from),
            });

            if response.items.is_empty() {
                println!("No similar products found.");
            } else {
                println!("{:<40} {:>10} {:>14}", "Description", "UnitPrice", "Quantity Sold");
                for item in &response.items {
                    println!(
                        "{:<40} {:>10} {:>14}",
                        item.description,
                        format_price(item.unit_price),
                        item.total_quantity
                    );
                }
            }
        }
        Commands::Product { description } => {
            let engine = RecommendationEngine::new(build_summary(store.transactions()));
            match engine.product(&description) {
                Some(product) => {
                    println!("Product: {}", product.description);
                    println!("Unit Price: {}", format_price(product.unit_price));
                    println!("Total Quantity Sold: {}", product.total_quantity);
                }
                None => println!("No product named `{description}`."),
            }
        }
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.filter.as_str().into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn default_top(config: &AppConfig, scope: RankingScope) -> usize {
    match scope {
        RankingScope::Global => config.ranking.global_top,
        RankingScope::Country => config.ranking.country_top,
        RankingScope::Month => config.ranking.month_top,
    }
}

fn parse_group_key(scope: RankingScope, raw: &str) -> Result<GroupKey, RetailError> {
    let raw = raw.trim();
    match scope {
        RankingScope::Global => Ok(GroupKey::Global),
        RankingScope::Country => Ok(GroupKey::Country(raw.to_string())),
        RankingScope::Month => match raw.parse::<u32>() {
            Ok(month) if (1..=12).contains(&month) => Ok(GroupKey::Month(month)),
            _ => Err(RetailError::Validation(format!(
                "month must be a number from 1 to 12, got `{raw}`"
            ))),
        },
    }
}

fn format_price(price: f64) -> String {
    format!("${price:.2}")
}

fn print_entries(entries: &[RankingEntry]) {
    for entry in entries {
        match entry.key {
            GroupKey::Global => println!("{:<40} {:>10}", entry.description, entry.quantity),
            _ => println!(
                "{:<20} {:<40} {:>10}",
                entry.key, entry.description, entry.quantity
            ),
        }
    }
}

fn print_description(store: &TransactionStore) {
    let description = store.describe();
    println!("\n--- DATA DESCRIPTION ---\n");
    println!("Raw rows:           {}", description.raw_rows);
    println!("Rows kept:          {}", description.rows);
    println!("Rows dropped:       {}", description.dropped_rows);
    println!("Distinct products:  {}", description.distinct_products);
    println!("Distinct countries: {}", description.distinct_countries);
    println!("Distinct customers: {}", description.distinct_customers);
    if let (Some(first), Some(last)) = (description.first_invoice, description.last_invoice) {
        println!("Invoice range:      {first} .. {last}");
    }

    println!("\nHead of the data:\n");
    for tx in &description.head {
        println!(
            "{}  {:<40} {:>6} {:>10}  {:<16} {}",
            tx.invoice_date,
            tx.description,
            tx.quantity,
            format_price(tx.unit_price),
            tx.country,
            tx.customer_id
        );
    }

    let missing = &description.missing;
    println!("\nMissing Values:\n");
    println!("InvoiceNo    {}", missing.invoice_no);
    println!("Description  {}", missing.description);
    println!("Quantity     {}", missing.quantity);
    println!("InvoiceDate  {}", missing.invoice_date);
    println!("UnitPrice    {}", missing.unit_price);
    println!("CustomerID   {}", missing.customer_id);
    println!("Country      {}", missing.country);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(2.5), "$2.50");
        assert_eq!(format_price(0.0), "$0.00");
    }

    #[test]
    fn test_parse_group_key() {
        assert_eq!(
            parse_group_key(RankingScope::Country, " Italy ").unwrap(),
            GroupKey::Country("Italy".into())
        );
        assert_eq!(
            parse_group_key(RankingScope::Month, "12").unwrap(),
            GroupKey::Month(12)
        );
        assert!(parse_group_key(RankingScope::Month, "13").is_err());
        assert!(parse_group_key(RankingScope::Month, "June").is_err());
    }

    #[test]
    fn test_cli_parses_recommend() {
        let cli = Cli::try_parse_from([
            "retail-recommender",
            "--dataset",
            "retail.jsonl",
            "recommend",
            "red mug",
            "-n",
            "3",
            "--sort",
            "price-asc",
        ])
        .unwrap();
        assert_eq!(cli.dataset.as_deref(), Some("retail.jsonl"));
        match cli.command {
            Commands::Recommend { query, count, sort } => {
                assert_eq!(query, "red mug");
                assert_eq!(count.as_deref(), Some("3"));
                assert_eq!(sort.map(SortOrder::from), Some(SortOrder::PriceAscending));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
