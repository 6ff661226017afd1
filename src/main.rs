use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgEnum, Parser};
use log::{error, info};

use agent_routing::models::lp_file::LpFile;
use agent_routing::models::routing::{Parameters, RoutingSolver, Sets};
use agent_routing::models::Error;
use agent_routing::parse::{parse_json, parse_text};
use agent_routing::problem::Problem;
use agent_routing::Config;

#[cfg(feature = "gurobi")]
use agent_routing::models::gurobi::GurobiSolver;
#[cfg(not(feature = "gurobi"))]
use agent_routing::models::microlp::MicrolpSolver;

#[derive(Debug, Clone, Copy, ArgEnum)]
enum Format {
    Text,
    Json,
}

/// Routes agents from their homes through time-slotted visits, minimizing travel distance.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Problem file. Read from stdin when omitted
    input: Option<PathBuf>,
    /// Format of the problem
    #[clap(long, arg_enum, default_value = "text")]
    format: Format,
    /// Format of the routes
    #[clap(long, arg_enum, default_value = "text")]
    output: Format,
    /// JSON file with solver settings
    #[clap(long)]
    config: Option<PathBuf>,
    /// Wall-clock limit on the optimizer, in seconds
    #[clap(long)]
    time_limit: Option<u64>,
    /// Fraction of the total pool that must be served
    #[clap(long)]
    quota: Option<f64>,
    /// Print the parsed problem and its slots before solving
    #[clap(long)]
    debug: bool,
    /// Also write the model in LP format to this file
    #[clap(long)]
    write_model: Option<PathBuf>,
}

#[cfg(feature = "gurobi")]
fn solver() -> Result<GurobiSolver, Error> {
    GurobiSolver::new("agent_routing")
}

#[cfg(not(feature = "gurobi"))]
fn solver() -> Result<MicrolpSolver, Error> {
    Ok(MicrolpSolver::new())
}

fn print_data(problem: &Problem) {
    println!("::::: Problem");
    println!();
    for agent in problem.agents() {
        let home = agent.home();
        println!("Agent {} x: {} y: {}", *agent.index(), home.x, home.y);
    }
    println!();
    for visit in problem.visits() {
        let location = visit.location();
        println!(
            "Visit {} slot: {} x: {} y: {} pool_size: {}",
            *visit.index(),
            visit.slot(),
            location.x,
            location.y,
            visit.pool_size()
        );
    }
    println!();

    println!("::::: Visits by slot");
    println!();
    for (slot, visits) in problem.slots() {
        let visits: Vec<String> = visits.iter().map(|v| (**v).to_string()).collect();
        println!("Slot {}: {}", slot, visits.join(" "));
    }
    println!();
}

fn write_model(
    problem: &Problem,
    config: &Config,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let sets = Sets::new(problem);
    let parameters = Parameters::new(problem, &sets, config.quota);
    let mut model = LpFile::new("agent_routing");
    RoutingSolver::build(&mut model, &sets, &parameters)?;
    model.write(io::BufWriter::new(fs::File::create(path)?))?;
    Ok(())
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    if let Some(time_limit) = args.time_limit {
        config.time_limit = time_limit;
    }
    if let Some(quota) = args.quota {
        config.quota = quota;
    }
    config.validate()?;
    info!("{:?}", config);

    let input = match &args.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            input
        }
    };

    let problem = match args.format {
        Format::Text => parse_text(&input)?,
        Format::Json => parse_json(&input)?,
    };

    if args.debug {
        print_data(&problem);
    }

    if let Some(path) = &args.write_model {
        write_model(&problem, &config, path)?;
    }

    let routes = agent_routing::plan(&problem, &config, solver()?)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        Format::Text => write!(out, "{}", routes)?,
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, &routes)?;
            writeln!(out)?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
