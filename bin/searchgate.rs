use anyhow::{Context, Result};
use clap::Parser;
use prometheus::{Encoder, TextEncoder};
use searchgate::compiler::SourceFieldCompiler;
use searchgate::query::MatchOperator;
use searchgate::{
    spawn_refresh_task, GatewayConfig, GatewayMetrics, IndexMapping, MappingRegistry,
    RefreshEvent, SearchCompiler, SearchRequest, SettingsRegistry,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "searchgate")]
#[command(about = "Compile a filter/sort/facet DSL request into a backend search body", long_about = None)]
struct Args {
    /// Gateway configuration (JSON)
    #[arg(long, env = "SEARCHGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Index mappings (JSON object of index name to mapping)
    #[arg(long, env = "SEARCHGATE_MAPPINGS")]
    mappings: PathBuf,

    /// Target index
    #[arg(long)]
    index: String,

    /// Filter expression, e.g. "city EQ 'Rio' AND price RANGE [10, 20]"
    #[arg(long)]
    filter: Option<String>,

    /// Sort expression, e.g. "price DESC, _score"
    #[arg(long)]
    sort: Option<String>,

    /// Suppress sorting
    #[arg(long)]
    disable_sort: bool,

    /// Comma-separated facet fields
    #[arg(long)]
    facets: Option<String>,

    #[arg(long)]
    facet_size: Option<usize>,

    /// Comma-separated source fields to return
    #[arg(long, value_delimiter = ',')]
    include: Vec<String>,

    /// Comma-separated source fields to leave out
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Free-text query
    #[arg(long)]
    q: Option<String>,

    /// Comma-separated fields for the free-text query, each optionally name^boost
    #[arg(long, value_delimiter = ',')]
    fields: Vec<String>,

    /// Free-text operator (and, or)
    #[arg(long)]
    operator: Option<String>,

    /// Free-text minimum_should_match
    #[arg(long)]
    mm: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    from: Option<i64>,

    #[arg(long, allow_hyphen_values = true)]
    size: Option<i64>,

    /// Print the metrics registry after compiling
    #[arg(long)]
    print_metrics: bool,
}

fn parse_operator(operator: Option<&str>) -> Result<Option<MatchOperator>> {
    match operator.map(str::to_lowercase).as_deref() {
        None => Ok(None),
        Some("and") => Ok(Some(MatchOperator::And)),
        Some("or") => Ok(Some(MatchOperator::Or)),
        Some(other) => anyhow::bail!("unknown operator '{other}', expected 'and' or 'or'"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    info!("Starting searchgate v{}", searchgate::VERSION);

    let config = match &args.config {
        Some(path) => GatewayConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GatewayConfig::default(),
    };

    let data = std::fs::read_to_string(&args.mappings)
        .with_context(|| format!("reading mappings {}", args.mappings.display()))?;
    let mappings: HashMap<String, IndexMapping> =
        serde_json::from_str(&data).context("parsing mappings")?;

    let metrics = Arc::new(GatewayMetrics::new()?);
    let mapping_registry = Arc::new(MappingRegistry::new());
    let settings_registry = Arc::new(SettingsRegistry::from_config(&config));
    let sources = Arc::new(SourceFieldCompiler::new());

    let (refresh, task) = spawn_refresh_task(
        mapping_registry.clone(),
        settings_registry.clone(),
        sources.clone(),
        Some(metrics.clone()),
    );
    for (index, mapping) in mappings {
        refresh
            .send(RefreshEvent::MappingChanged { index, mapping })
            .await?;
    }
    refresh.shutdown();
    task.await?;
    info!(indices = ?mapping_registry.indices(), "mappings loaded");

    let compiler = SearchCompiler::new(mapping_registry, settings_registry, sources)
        .with_max_fragments(config.max_fragments)
        .with_metrics(metrics.clone());

    let request = SearchRequest {
        index: args.index,
        filter: args.filter,
        sort: args.sort,
        disable_sort: args.disable_sort,
        facets: args.facets,
        facet_size: args.facet_size,
        include_fields: args.include,
        exclude_fields: args.exclude,
        q: args.q,
        fields: args.fields,
        operator: parse_operator(args.operator.as_deref())?,
        mm: args.mm,
        from: args.from,
        size: args.size,
    };

    let compiled = compiler.compile(&request)?;
    println!("{}", serde_json::to_string_pretty(&compiled.to_dsl())?);

    if args.print_metrics {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metrics.registry().gather(), &mut buffer)?;
        eprintln!("{}", String::from_utf8_lossy(&buffer));
    }

    Ok(())
}
