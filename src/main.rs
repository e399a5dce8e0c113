use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{bail, WrapErr};
use simplelog::LevelFilter;

use pbt_model::assertion::{AssertionFile, RawAssertion};
use pbt_model::config::ExtractConfig;
use pbt_model::coverage::coverage;
use pbt_model::dot::to_dot;
use pbt_model::extract::{ExtractError, Extraction, Extractor};
use pbt_model::solver::{dispatch_all, HttpSolver, DEFAULT_ENDPOINT};
use pbt_model::types::{cnf_to_string, Literal};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// More logging (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print one solver request per assertion.
    Extract {
        #[command(flatten)]
        input: Input,

        /// Write `<assertion>.json` files into this directory instead of printing.
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Send every request to the solver and report the verdicts.
    Check {
        #[command(flatten)]
        input: Input,

        /// Solver endpoint.
        #[arg(long, value_name = "URL", default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Request timeout, in seconds.
        #[arg(long, value_name = "SECS", default_value = "10")]
        timeout: u64,
    },
    /// Count the states admitted by each branch guard.
    Coverage {
        #[command(flatten)]
        input: Input,
    },
    /// Print the branch transition graph in DOT format.
    Dot {
        #[command(flatten)]
        input: Input,
    },
}

#[derive(Debug, Args)]
struct Input {
    /// Component source file.
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Assertions, as a JSON list or a `{filepath, useStatefulTesting, textAssertions}` object.
    #[arg(short, long, value_name = "JSON")]
    assertions: Option<PathBuf>,

    /// Drop inferred transitions from the requests.
    #[arg(long)]
    no_stateful: bool,

    /// Make the alternatives of each chain mutually exclusive.
    #[arg(long)]
    exclusive: bool,
}

impl Input {
    fn load(&self) -> color_eyre::Result<(ExtractConfig, Vec<RawAssertion>)> {
        let mut config = ExtractConfig::default()
            .with_stateful(!self.no_stateful)
            .with_exclusive_chains(self.exclusive);

        let Some(path) = &self.assertions else {
            return Ok((config, Vec::new()));
        };
        let text = fs::read_to_string(path).wrap_err_with(|| format!("cannot read {}", path.display()))?;
        let file: AssertionFile =
            serde_json::from_str(&text).wrap_err_with(|| format!("cannot parse {}", path.display()))?;
        if let AssertionFile::Request {
            use_stateful_testing: Some(false),
            ..
        } = &file
        {
            config.stateful = false;
        }
        Ok((config, file.assertions().to_vec()))
    }

    fn extract(&self) -> color_eyre::Result<Extraction> {
        let (config, assertions) = self.load()?;
        let extractor = Extractor::new(config);
        match extractor.extract_file(&self.file, &assertions) {
            Ok(extraction) => Ok(extraction),
            Err(err @ ExtractError::Source { .. }) => Err(err.into()),
            Err(err) => {
                for error in err.model_errors() {
                    eprintln!("{}", error);
                }
                bail!("{}", err)
            }
        }
    }
}

fn write_requests(extraction: &Extraction, out_dir: Option<&Path>) -> color_eyre::Result<()> {
    let Some(dir) = out_dir else {
        println!("{}", serde_json::to_string_pretty(&extraction.requests)?);
        return Ok(());
    };
    fs::create_dir_all(dir)?;
    for request in &extraction.requests {
        let path = dir.join(request_file_name(&request.pbt_assertion.name)?);
        fs::write(&path, serde_json::to_string_pretty(request)?)?;
        log::info!("Wrote {}", path.display());
    }
    Ok(())
}

/// `<name>.json`, for assertion names that stay inside the output directory.
fn request_file_name(name: &str) -> color_eyre::Result<String> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        bail!("assertion name {:?} cannot be used as a file name", name);
    }
    Ok(format!("{}.json", name))
}

fn format_state(state: &[Literal]) -> String {
    state
        .iter()
        .map(|lit| format!("{}={}", lit.name, lit.assignment))
        .collect::<Vec<_>>()
        .join(", ")
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    let level = match (args.quiet, args.verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    // Logs go to stderr so that stdout stays machine-readable.
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    match args.command {
        Command::Extract { input, out_dir } => {
            let extraction = input.extract()?;
            write_requests(&extraction, out_dir.as_deref())?;
        }

        Command::Check {
            input,
            endpoint,
            timeout,
        } => {
            let extraction = input.extract()?;
            let solver = HttpSolver::new(endpoint, Duration::from_secs(timeout))?;
            let time_solve = std::time::Instant::now();
            let results = dispatch_all(&solver, &extraction.requests);
            log::info!("Solved {} request(s) in {:.2?}", results.len(), time_solve.elapsed());

            let mut failures = 0;
            for (request, result) in extraction.requests.iter().zip(results) {
                let name = &request.pbt_assertion.name;
                match result {
                    Ok(response) if response.is_passed() => println!("PASS {}", name),
                    Ok(response) => {
                        failures += 1;
                        println!("FAIL {} (violated: {})", name, response.violated_pbt);
                        for (i, state) in response.states.iter().enumerate() {
                            println!("  step {}: {}", i, format_state(state));
                        }
                    }
                    Err(e) => {
                        failures += 1;
                        println!("ERROR {}: {}", name, e);
                    }
                }
            }
            if failures > 0 {
                bail!("{} of {} assertion(s) did not pass", failures, extraction.requests.len());
            }
        }

        Command::Coverage { input } => {
            let extraction = input.extract()?;
            let model = &extraction.model;
            let cov = coverage(model)?;
            println!("state variables: {}", model.state_variables.join(", "));
            println!("states: {}", cov.total);
            for (i, (branch, count)) in model.branches.iter().zip(&cov.per_branch).enumerate() {
                println!("branch {}: {} state(s) admitted by {}", i, count, cnf_to_string(&branch.conditions));
            }
            println!("uncovered: {}", cov.uncovered);
            println!("overlapping: {}", cov.overlapping);
            if let Some(witness) = &cov.uncovered_witness {
                println!("first uncovered state: {}", format_state(witness));
            }
        }

        Command::Dot { input } => {
            let extraction = input.extract()?;
            print!("{}", to_dot(&extraction.model)?);
        }
    }

    Ok(())
}
