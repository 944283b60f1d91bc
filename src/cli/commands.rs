use crate::context::RequestContext;
use crate::handler::{HandlerMethod, HandlerType, ReturnValue};
use crate::logging::init_logging;
use crate::mapping::{load_route_table, HandlerProvider, HandlerRegistry, RouteTable};
use crate::runtime_config::DispatchConfig;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// `METHOD /path[?query]`
static REQUEST_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z]+)\s+(/\S*)\s*$").expect("request line regex should be valid")
});

/// Route table inspection for brrtmvc
#[derive(Parser, Debug)]
#[command(name = "brrtmvc-routes")]
#[command(about = "Inspect brrtmvc route tables", long_about = None)]
pub struct Cli {
    /// Dispatch configuration file (YAML); defaults come from BRRTMVC_* variables
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level when no RUST_LOG filter is set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every mapping in a route table, in registration order
    List {
        /// Path to the YAML route table
        #[arg(short, long)]
        table: PathBuf,
    },
    /// Resolve one request against a route table
    Resolve {
        /// Path to the YAML route table
        #[arg(short, long)]
        table: PathBuf,

        /// Request line, e.g. "GET /widgets/42?preview=true"
        request: String,

        /// Request header as `name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
}

/// Provides a no-op handler for every id a route table names.
///
/// Handlers are created on first request and cached, so entries sharing an
/// id share one handler.
#[derive(Debug, Default)]
pub struct InspectionProvider {
    handlers: Mutex<HashMap<String, Arc<HandlerMethod>>>,
}

impl HandlerProvider for InspectionProvider {
    fn resolve(&self, handler_id: &str) -> Option<Arc<HandlerMethod>> {
        let mut handlers = self.handlers.lock();
        let handler = handlers.entry(handler_id.to_string()).or_insert_with(|| {
            let (type_name, method_name) = handler_id.split_once('#').unwrap_or((handler_id, "handle"));
            let ty = HandlerType::new(type_name).build();
            HandlerMethod::builder(&ty, method_name).build(|_| Ok(ReturnValue::Void))
        });
        Some(Arc::clone(handler))
    }
}

/// Load `table` into a registry configured by `config`.
pub fn load_registry(table: &Path, config: &DispatchConfig) -> Result<(RouteTable, HandlerRegistry)> {
    let route_table = load_route_table(table)?;
    let mut registry = HandlerRegistry::with_config(config);
    route_table
        .register_into(&mut registry, &InspectionProvider::default())
        .with_context(|| format!("failed to register route table {}", table.display()))?;
    Ok((route_table, registry))
}

/// Parse `"METHOD /path?query"` plus `name: value` headers into a context.
pub fn parse_request(line: &str, headers: &[String]) -> Result<RequestContext> {
    let captures = REQUEST_LINE
        .captures(line)
        .ok_or_else(|| anyhow!("expected 'METHOD /path', got '{line}'"))?;
    let method = Method::from_bytes(captures[1].to_ascii_uppercase().as_bytes())
        .map_err(|_| anyhow!("invalid HTTP method '{}'", &captures[1]))?;
    let target = &captures[2];
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };

    let mut ctx = RequestContext::new(method, path);
    if let Some(query) = query {
        ctx = ctx.with_query(query);
    }
    for header in headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| anyhow!("expected 'name: value' header, got '{header}'"))?;
        ctx = ctx.with_header(name.trim(), value.trim());
    }
    Ok(ctx)
}

/// Execute `cli`, writing the report to `out`.
///
/// # Errors
///
/// Returns an error if the configuration or route table cannot be loaded,
/// the request line is malformed, or resolution hits an ambiguous mapping.
pub fn run_cli_with_output(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let config = match &cli.config {
        Some(path) => DispatchConfig::from_yaml_file(path)?,
        None => DispatchConfig::from_env(),
    };

    match &cli.command {
        Commands::List { table } => {
            let (route_table, registry) = load_registry(table, &config)?;
            if let Some(base) = &route_table.base_path {
                writeln!(out, "base path: {base}")?;
            }
            for registration in registry.mappings() {
                writeln!(out, "{}  ->  {}", registration.criteria, registration.handler)?;
            }
            if let Some(default) = registry.default_handler() {
                writeln!(out, "(default)  ->  {default}")?;
            }
            writeln!(out, "{} mapping(s)", registry.len())?;
        }
        Commands::Resolve {
            table,
            request,
            headers,
        } => {
            let (_, registry) = load_registry(table, &config)?;
            let ctx = parse_request(request, headers)?;
            match registry.lookup_handler(&ctx)? {
                Some(found) => {
                    writeln!(out, "handler:  {}", found.handler)?;
                    writeln!(out, "criteria: {}", found.criteria)?;
                    writeln!(out, "lookup:   {}", found.lookup_path)?;
                    for (name, value) in ctx.path_variables() {
                        writeln!(out, "  {name} = {value}")?;
                    }
                }
                None => match registry.default_handler() {
                    Some(default) => writeln!(out, "handler:  {default} (default)")?,
                    None => writeln!(out, "no handler for {request}")?,
                },
            }
        }
    }
    Ok(())
}

/// Parse the process arguments, set up logging and run.
///
/// # Errors
///
/// See [`run_cli_with_output`].
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_cli_with_output(&cli, &mut out)
}
