use prometheus::{Counter, CounterVec, Histogram, HistogramOpts, Opts, Registry};
use std::sync::Arc;

/// Prometheus metrics for the gateway
#[derive(Clone)]
pub struct GatewayMetrics {
    // Counters
    pub requests_compiled: Counter,
    pub parse_errors: CounterVec,
    pub sort_fallbacks: Counter,
    pub snapshot_refreshes: Counter,

    // Histograms
    pub compile_latency: Histogram,

    registry: Arc<Registry>,
}

impl GatewayMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_compiled = Counter::with_opts(Opts::new(
            "searchgate_requests_compiled_total",
            "Total number of search requests compiled",
        ))?;
        registry.register(Box::new(requests_compiled.clone()))?;

        let parse_errors = CounterVec::new(
            Opts::new(
                "searchgate_parse_errors_total",
                "Rejected requests by error kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(parse_errors.clone()))?;

        let sort_fallbacks = Counter::with_opts(Opts::new(
            "searchgate_sort_fallbacks_total",
            "Requests whose sort was replaced by the index default",
        ))?;
        registry.register(Box::new(sort_fallbacks.clone()))?;

        let snapshot_refreshes = Counter::with_opts(Opts::new(
            "searchgate_snapshot_refreshes_total",
            "Mapping and settings refresh events applied",
        ))?;
        registry.register(Box::new(snapshot_refreshes.clone()))?;

        let compile_latency = Histogram::with_opts(
            HistogramOpts::new("searchgate_compile_seconds", "Request compile latency")
                .buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05]),
        )?;
        registry.register(Box::new(compile_latency.clone()))?;

        Ok(Self {
            requests_compiled,
            parse_errors,
            sort_fallbacks,
            snapshot_refreshes,
            compile_latency,
            registry: Arc::new(registry),
        })
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Record a successfully compiled request
    pub fn record_compile(&self, duration_secs: f64) {
        self.requests_compiled.inc();
        self.compile_latency.observe(duration_secs);
    }

    /// Record a rejected request, labelled by error kind
    pub fn record_error(&self, kind: &str) {
        self.parse_errors.with_label_values(&[kind]).inc();
    }

    pub fn record_sort_fallback(&self) {
        self.sort_fallbacks.inc();
    }

    pub fn record_refresh(&self) {
        self.snapshot_refreshes.inc();
    }
}
