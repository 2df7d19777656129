use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use ruleaudit_core::logging::init_tracing;
use ruleaudit_core::serde_utils::to_pretty_json;
use ruleaudit_core::AuditConfig;
use ruleaudit_report::{
    ChatCompletionGenerator, ReportApiBuilder, ReportRenderer, ReportServiceConfig,
};
use ruleaudit_rules::{load_rules, AnalyzerConfig, FieldSchema, RuleAnalyzer, ValidationResult};

mod output;

use output::{print_analysis, print_report_written, print_totals, AnalysisEntry};

#[derive(Parser)]
#[command(name = "ruleaudit")]
#[command(about = "Static analysis and reporting for declarative business rules", long_about = None)]
struct Cli {
    /// Field schema file (JSON or YAML) layered over the built-in registry
    #[arg(long, global = true, env = "RULEAUDIT_SCHEMA_PATH")]
    schema: Option<PathBuf>,
    /// Default log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every rule in a file or directory
    Analyze(AnalyzeArgs),
    /// Render a review report for every rule in a file or directory
    Report(ReportArgs),
    /// Serve the validation and report HTTP API
    Serve(ServeArgs),
    /// Print the effective field schema as JSON
    Schema,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Rule file or directory of .json/.yaml/.yml files
    path: PathBuf,
    /// Print results as JSON instead of colored text
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args)]
struct ReportArgs {
    /// Rule file or directory of .json/.yaml/.yml files
    path: PathBuf,
    /// Never call the report generator; use the deterministic template
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Write the reports to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ServeArgs {
    /// Address to bind, overriding RULEAUDIT_HTTP_BIND
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(Some(&cli.log_level))?;

    let config = AuditConfig::from_env()?;
    let schema_path = cli.schema.clone().or_else(|| config.schema_path.clone());
    let schema = load_schema(schema_path.as_deref())?;
    let analyzer = RuleAnalyzer::new(schema.clone(), analyzer_config(&config));

    match cli.command {
        Commands::Analyze(args) => {
            let rules = load_rules(&args.path)?;
            let results = analyzer.analyze_batch(&rules);
            if args.json {
                let entries: Vec<AnalysisEntry<'_>> = rules
                    .iter()
                    .zip(&results)
                    .map(|(rule, result)| AnalysisEntry {
                        rule_id: rule.display_id(),
                        rule_name: &rule.name,
                        validation_result: result,
                    })
                    .collect();
                println!("{}", to_pretty_json(&entries)?);
            } else {
                for (rule, result) in rules.iter().zip(&results) {
                    print_analysis(rule, result);
                }
                print_totals(&results);
            }
            Ok(exit_code(&results))
        }
        Commands::Report(args) => {
            let rules = load_rules(&args.path)?;
            let renderer = build_renderer(&config, schema, args.offline);
            let mut reports = Vec::with_capacity(rules.len());
            let mut results = Vec::with_capacity(rules.len());
            for rule in &rules {
                let result = analyzer.analyze(rule);
                reports.push(renderer.render(rule, &result).await.report);
                results.push(result);
            }

            let text = reports.join("\n---\n\n");
            match args.output {
                Some(path) => {
                    fs::write(&path, text)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    print_report_written(&path.display().to_string(), reports.len());
                }
                None => println!("{}", text),
            }
            Ok(exit_code(&results))
        }
        Commands::Serve(args) => {
            let renderer = build_renderer(&config, schema, false);
            let bind_address = args.bind.unwrap_or_else(|| config.http_bind.clone());
            let shutdown = ReportApiBuilder::new(analyzer, renderer)
                .serve(ReportServiceConfig {
                    bind_address: bind_address.clone(),
                })
                .await?;
            info!(address = %bind_address, "rule report service listening; press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            let _ = shutdown.send(());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Schema => {
            println!("{}", to_pretty_json(&schema)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_schema(path: Option<&Path>) -> anyhow::Result<FieldSchema> {
    match path {
        Some(path) => FieldSchema::from_path(path)
            .with_context(|| format!("failed to load field schema {}", path.display())),
        None => Ok(FieldSchema::builtin()),
    }
}

fn analyzer_config(config: &AuditConfig) -> AnalyzerConfig {
    AnalyzerConfig {
        max_depth: config.max_depth,
        depth_warning: config.depth_warning,
        node_warning: config.node_warning,
        ..AnalyzerConfig::default()
    }
}

fn build_renderer(config: &AuditConfig, schema: FieldSchema, offline: bool) -> ReportRenderer {
    let renderer = ReportRenderer::offline(schema).with_timeout(config.generator.timeout);
    if offline || !config.generator.is_enabled() {
        return renderer;
    }
    match ChatCompletionGenerator::from_settings(&config.generator) {
        Ok(generator) => renderer.with_generator(Arc::new(generator)),
        Err(err) => {
            warn!(error = %err, "report generator unavailable; using template reports");
            renderer
        }
    }
}

fn exit_code(results: &[ValidationResult]) -> ExitCode {
    if results.iter().all(ValidationResult::is_valid) {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
