//! whatif - plan what-if analysis from the command line.
//!
//! Works on saved `EXPLAIN (FORMAT JSON)` output, so no database connection
//! is needed.

use std::fs;
use std::process::ExitCode;

use tracing::Level;

use whatif::analysis::WhatIfError;
use whatif::edit::{apply_modifications, compare_costs, compile_directives, ModificationSpec};
use whatif::plan::{assign_ids, IdScheme, PlanNode, DEFAULT_MAX_DEPTH};

#[derive(Debug, PartialEq)]
enum Command {
    Show { plan: String },
    Preview { plan: String, mods: String },
    Directives { mods: String },
    Compare { qep: String, aqp: String },
}

impl Command {
    fn parse(words: &[String]) -> Result<Self, String> {
        let (name, files) = words.split_first().ok_or("No command given.")?;

        match (name.as_str(), files) {
            ("show", [plan]) => Ok(Command::Show { plan: plan.clone() }),
            ("preview", [plan, mods]) => Ok(Command::Preview {
                plan: plan.clone(),
                mods: mods.clone(),
            }),
            ("directives", [mods]) => Ok(Command::Directives { mods: mods.clone() }),
            ("compare", [qep, aqp]) => Ok(Command::Compare {
                qep: qep.clone(),
                aqp: aqp.clone(),
            }),
            ("show" | "preview" | "directives" | "compare", _) => {
                Err(format!("Wrong number of files for '{}'.", name))
            }
            _ => Err(format!("Unknown command: {}", name)),
        }
    }
}

struct Options {
    verbose: bool,
    json: bool,
    scheme: IdScheme,
    command: Command,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let options = match parse_args(args) {
        Ok(Some(options)) => options,
        Ok(None) => return ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("Run 'whatif --help' for usage.");
            return ExitCode::FAILURE;
        }
    };

    let level = if options.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(&options) {
        Ok(output) => {
            println!("{}", output.trim_end());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut verbose = false;
    let mut json = false;
    let mut scheme = IdScheme::default();
    let mut words = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-v" | "--verbose" => verbose = true,
            "--json" => json = true,
            "--ids" => {
                let value = args.next().ok_or("--ids needs a value (path or preorder)")?;
                scheme = value.parse()?;
            }
            "-h" | "--help" => {
                print_help();
                return Ok(None);
            }
            "--version" => {
                println!("whatif v{}", env!("CARGO_PKG_VERSION"));
                return Ok(None);
            }
            flag if flag.starts_with('-') => return Err(format!("Unknown option: {}", flag)),
            _ => words.push(arg),
        }
    }

    Ok(Some(Options {
        verbose,
        json,
        scheme,
        command: Command::parse(&words)?,
    }))
}

fn print_help() {
    println!("whatif - What-if analysis for query execution plans");
    println!();
    println!("Usage: whatif [OPTIONS] <COMMAND> [FILES...]");
    println!();
    println!("Commands:");
    println!("  show PLAN                Print a plan with node ids");
    println!("  preview PLAN MODS        Print a plan with modifications applied");
    println!("  directives MODS          Print the planner directives for modifications");
    println!("  compare QEP AQP          Compare the root costs of two plans");
    println!();
    println!("Options:");
    println!("  --ids SCHEME             Node id scheme: path (default) or preorder");
    println!("  --json                   Print JSON instead of text");
    println!("  -v, --verbose            Enable debug logging");
    println!("  -h, --help               Show this help message");
    println!("  --version                Show version");
    println!();
    println!("PLAN, QEP and AQP are saved EXPLAIN (FORMAT JSON) output. MODS is a JSON");
    println!("object keyed by node id, e.g. {{\"11\": {{\"Scan Type\": \"Index Scan\"}}}}.");
}

fn run(options: &Options) -> Result<String, WhatIfError> {
    match &options.command {
        Command::Show { plan } => {
            let plan = load_plan(plan, options.scheme)?;
            render_plan(&plan, options.json)
        }
        Command::Preview { plan, mods } => {
            let plan = load_plan(plan, options.scheme)?;
            let mods = load_mods(mods)?;
            render_plan(&apply_modifications(&plan, &mods), options.json)
        }
        Command::Directives { mods } => {
            let directives = compile_directives(&load_mods(mods)?);
            if options.json {
                to_json(&directives)
            } else {
                Ok(directives
                    .iter()
                    .map(|d| format!("{};", d))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
        }
        Command::Compare { qep, aqp } => {
            let qep = load_plan(qep, options.scheme)?;
            let aqp = load_plan(aqp, options.scheme)?;
            let comparison = compare_costs(&qep, &aqp)?;
            if options.json {
                to_json(&comparison)
            } else {
                Ok(format!(
                    "Original cost: {:.2}\nModified cost: {:.2}\nDifference:    {:+.2}",
                    comparison.original_cost, comparison.modified_cost, comparison.difference
                ))
            }
        }
    }
}

fn load_plan(path: &str, scheme: IdScheme) -> Result<PlanNode, WhatIfError> {
    let mut plan = PlanNode::from_explain_file(path)?;
    assign_ids(&mut plan, scheme, DEFAULT_MAX_DEPTH)?;
    Ok(plan)
}

fn load_mods(path: &str) -> Result<ModificationSpec, WhatIfError> {
    let text = fs::read_to_string(path)?;
    ModificationSpec::from_json_str(&text)
        .map_err(|e| WhatIfError::InvalidConfig(format!("{}: {}", path, e)))
}

fn render_plan(plan: &PlanNode, json: bool) -> Result<String, WhatIfError> {
    if json {
        to_json(plan)
    } else {
        Ok(plan.to_string())
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, WhatIfError> {
    Ok(serde_json::to_string_pretty(value).map_err(std::io::Error::from)?)
}
