//! dynexpr - query a JSON dataset with dynamic filter expressions

use anyhow::{bail, Context, Result};
use clap::Parser as ClapParser;
use dynexpr::database::Database;
use dynexpr::expression::Expressions;
use dynexpr::paging::{Order, PageRequest, Sort};
use dynexpr::sql::{DialectKind, SelectQuery};
use std::path::PathBuf;

/// Filter, sort and page the records of a dataset, or render the equivalent SQL
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dataset file holding the schema and records
    #[arg(short = 'D', long)]
    dataset: PathBuf,

    /// Entity to query
    #[arg(short, long)]
    entity: String,

    /// Filter expression as inline JSON
    #[arg(short, long, conflicts_with = "filter_file")]
    filter: Option<String>,

    /// Filter expression read from a file
    #[arg(long)]
    filter_file: Option<PathBuf>,

    /// Zero-based page number
    #[arg(short, long, default_value = "0")]
    page: usize,

    /// Page size
    #[arg(short, long, default_value = "20")]
    size: usize,

    /// Sort key as `field[,asc|desc]`, repeatable
    #[arg(long = "sort")]
    sort: Vec<Order>,

    /// Print the SQL for this dialect (postgres or mysql) instead of querying
    #[arg(long, value_name = "DIALECT")]
    sql: Option<DialectKind>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let tree = read_filter(&args)?;
    let request = PageRequest::of(args.page, args.size).with_sort(Sort::from(args.sort.clone()));

    let database = Database::load(&args.dataset)
        .with_context(|| format!("Failed to load dataset {}", args.dataset.display()))?;

    if let Some(kind) = args.sql {
        let dialect = kind.dialect();
        let query = SelectQuery::render(
            database.schema(),
            &args.entity,
            &tree,
            Some(&request),
            dialect.as_ref(),
        )?;
        println!("{}", query);
        println!("{}", query.params_json());
        return Ok(());
    }

    let page = database
        .find_page(&args.entity, &tree, &request)
        .with_context(|| format!("Query on {} failed", args.entity))?;
    log::info!(
        "page {} of {}: {} of {} records",
        page.page + 1,
        page.total_pages(),
        page.number_of_elements(),
        page.total_elements
    );
    let page = page.map(|record| record.to_json());
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

fn read_filter(args: &Args) -> Result<Expressions> {
    let text = match (&args.filter, &args.filter_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read filter file {}", path.display()))?,
        (None, None) => return Ok(Expressions::new()),
    };
    if text.trim().is_empty() {
        bail!("Filter expression is empty");
    }
    Expressions::from_json_str(&text).context("Invalid filter expression")
}
