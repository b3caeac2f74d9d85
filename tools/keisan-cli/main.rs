use clap::{Parser, Subcommand, ValueEnum};
use keisan::error::FlowConversionError;
use keisan::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

// --- JSON Deserialization Structs (Input Format Specific) ---
// These structs match the canvas `flow.json` format and are only used here for conversion.

#[derive(Deserialize)]
struct RawFlow {
    nodes: Vec<RawNode>,
    #[serde(default)]
    edges: Vec<RawEdge>,
}

#[derive(Deserialize)]
struct RawNode {
    id: String,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    data: RawNodeData,
}

#[derive(Deserialize, Default)]
struct RawNodeData {
    #[serde(default)]
    fields: Vec<String>,
    expression: Option<String>,
    #[serde(alias = "resultVariable")]
    result_variable: Option<String>,
    condition: Option<String>,
    code: Option<String>,
    field: Option<String>,
    source: Option<String>,
}

#[derive(Deserialize)]
struct RawEdge {
    source: String,
    #[serde(default = "default_source_handle", alias = "sourceHandle")]
    source_handle: String,
    target: String,
}

fn default_source_handle() -> String {
    "out".to_string()
}

/// Define a CLI-specific enum for clap to parse.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum DialectCli {
    Formula,
    Condition,
    Code,
}

impl From<DialectCli> for Dialect {
    fn from(dialect: DialectCli) -> Self {
        match dialect {
            DialectCli::Formula => Dialect::Formula,
            DialectCli::Condition => Dialect::Condition,
            DialectCli::Code => Dialect::Code,
        }
    }
}

// --- Converter Implementation ---
// This implements the conversion from the raw JSON model to keisan's canonical FlowDefinition.

impl RawNode {
    fn required(&self, value: &Option<String>, name: &str) -> std::result::Result<String, FlowConversionError> {
        value.clone().ok_or_else(|| {
            FlowConversionError::ValidationError(format!(
                "{} node '{}' is missing '{}'",
                self.node_type, self.id, name
            ))
        })
    }

    fn into_definition(self) -> std::result::Result<FlowNodeDefinition, FlowConversionError> {
        let data = &self.data;
        let kind = match self.node_type.as_str() {
            "employee" => NodeKind::Employee {
                fields: data.fields.clone(),
            },
            "computation" => NodeKind::Computation {
                expression: self.required(&data.expression, "expression")?,
                result_variable: self.required(&data.result_variable, "resultVariable")?,
            },
            "condition" => NodeKind::Condition {
                condition: self.required(&data.condition, "condition")?,
            },
            "code" => NodeKind::Code {
                code: self.required(&data.code, "code")?,
                result_variable: self.required(&data.result_variable, "resultVariable")?,
            },
            "output" => NodeKind::Output {
                field: self.required(&data.field, "field")?,
                source: self.required(&data.source, "source")?,
            },
            other => {
                return Err(FlowConversionError::UnknownNodeType {
                    node_id: self.id,
                    type_name: other.to_string(),
                });
            }
        };
        Ok(FlowNodeDefinition::new(self.id, kind))
    }
}

impl IntoFlow for RawFlow {
    fn into_flow(self) -> std::result::Result<FlowDefinition, FlowConversionError> {
        let nodes = self
            .nodes
            .into_iter()
            .map(RawNode::into_definition)
            .collect::<std::result::Result<_, _>>()?;

        let edges = self
            .edges
            .into_iter()
            .map(|raw_edge| FlowEdgeDefinition {
                source: raw_edge.source,
                source_handle: raw_edge.source_handle,
                target: raw_edge.target,
            })
            .collect();

        Ok(FlowDefinition { nodes, edges })
    }
}

/// Validate, evaluate and run payroll expressions and flows
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report which identifiers of an expression are bound, with highlighting
    Check {
        expression: String,
        /// JSON object of bindings; defaults to the sample employee and globals
        #[arg(short, long)]
        bindings: Option<String>,
        #[arg(short, long, value_enum, default_value = "formula")]
        dialect: DialectCli,
        /// Treat literals and built-in namespaces as ordinary variables
        #[arg(long)]
        no_reserved: bool,
    },
    /// Evaluate an expression or code body inside the sandbox
    Eval {
        expression: String,
        #[arg(short, long)]
        bindings: Option<String>,
        #[arg(short, long, value_enum, default_value = "formula")]
        dialect: DialectCli,
        /// Engine configuration JSON file
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Run a flow for one employee
    Flow {
        /// Path to the flow JSON file
        flow_path: String,
        /// Path to the employee and globals JSON file; defaults to sample data
        #[arg(short, long)]
        input: Option<String>,
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Check whether a name can be used as a variable
    Name { candidate: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckOutput {
    validation: ValidationResult,
    highlight: Vec<HighlightSpan>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EvalOutput {
    #[serde(flatten)]
    result: EvaluationResult,
    display: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ok = match cli.command {
        Command::Check {
            expression,
            bindings,
            dialect,
            no_reserved,
        } => run_check(&expression, bindings, dialect.into(), !no_reserved),
        Command::Eval {
            expression,
            bindings,
            dialect,
            config,
        } => run_eval(&expression, bindings, dialect.into(), config),
        Command::Flow {
            flow_path,
            input,
            config,
        } => run_flow(&flow_path, input, config),
        Command::Name { candidate } => {
            let result = validate_variable_name(&candidate);
            print_json(&result);
            result.is_valid
        }
    };

    if !ok {
        std::process::exit(1);
    }
}

fn run_check(expression: &str, bindings_path: Option<String>, dialect: Dialect, reserved: bool) -> bool {
    let bindings = load_bindings_or_sample(bindings_path);
    let validation = Analyzer::new(dialect)
        .with_reserved_keywords(reserved)
        .analyze(expression, &bindings);
    let output = CheckOutput {
        highlight: highlight(expression, &validation),
        validation,
    };
    print_json(&output);
    output.validation.all_valid
}

fn run_eval(
    expression: &str,
    bindings_path: Option<String>,
    dialect: Dialect,
    config_path: Option<String>,
) -> bool {
    let bindings = load_bindings_or_sample(bindings_path);
    let config = load_config(config_path);
    let result = Evaluator::new(dialect)
        .with_config(config)
        .evaluate(expression, &bindings);
    let output = EvalOutput {
        display: format_value_for_display(result.value.as_ref()),
        result,
    };
    print_json(&output);
    output.result.is_ok()
}

fn run_flow(flow_path: &str, input_path: Option<String>, config_path: Option<String>) -> bool {
    let load_start = Instant::now();
    let flow_json = fs::read_to_string(flow_path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read flow file '{}': {}", flow_path, e))
    });
    let input = match input_path {
        Some(path) => FlowInput::from_file(&path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load input data from '{}': {}", path, e))
        }),
        None => {
            eprintln!("No input file provided. Using default mock data.");
            FlowInput::sample()
        }
    };
    let config = load_config(config_path);

    let raw_flow: RawFlow = serde_json::from_str(&flow_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse flow JSON: {}", e)));
    let flow = raw_flow
        .into_flow()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to convert flow: {}", e)));
    let globals = input
        .registry()
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid global variables: {}", e)));
    let load_duration = load_start.elapsed();

    let run_start = Instant::now();
    let runner = FlowRunner::builder(flow)
        .with_config(config)
        .with_globals(globals)
        .build();
    let report = runner
        .run(&input.employee)
        .unwrap_or_else(|e| exit_with_error(&format!("Flow run failed: {}", e)));
    tracing::info!(
        load = ?load_duration,
        run = ?run_start.elapsed(),
        nodes = report.outcomes.len(),
        "flow finished"
    );

    print_json(&report);
    report.failed().next().is_none()
}

fn load_bindings_or_sample(path: Option<String>) -> Bindings {
    match path {
        Some(path) => keisan::data::load_bindings(&path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load bindings from '{}': {}", path, e))
        }),
        None => FlowInput::sample()
            .bindings()
            .unwrap_or_else(|e| exit_with_error(&format!("Invalid sample data: {}", e))),
    }
}

fn load_config(path: Option<String>) -> EngineConfig {
    match path {
        Some(path) => EngineConfig::from_file(&path)
            .unwrap_or_else(|e| exit_with_error(&format!("Invalid engine config: {}", e))),
        None => EngineConfig::default(),
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => exit_with_error(&format!("Failed to serialize output: {}", e)),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
