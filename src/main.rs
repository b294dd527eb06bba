use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use cpu_sched::{
    PacedSystemCalls, PolicyChoice, SchedError, Sim, SimConfig,
    sim::{JobRecord, bernoulli_jobs, load_jobs},
};
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: cpu_sched <JOB_FILE | --generate N [--seed S]> [CHOICE [QUANTUM]]
  CHOICE: 1|fcfs, 2|rr, 3|priority";

enum Source {
    File(String),
    Generate { count: usize, seed: u64 },
}

struct Args {
    source: Source,
    choice: Option<String>,
    quantum: Option<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Args> {
    let source = match args.next()?.as_str() {
        "--generate" => {
            let count = args.next()?.parse().ok()?;
            Source::Generate { count, seed: 0 }
        }
        path => Source::File(path.to_string()),
    };

    let mut args = args.peekable();
    let source = match source {
        Source::Generate { count, .. } if args.peek().is_some_and(|a| a == "--seed") => {
            args.next();
            let seed = args.next()?.parse().ok()?;
            Source::Generate { count, seed }
        }
        other => other,
    };

    Some(Args {
        source,
        choice: args.next(),
        quantum: args.next(),
    })
}

fn prompt(message: &str) -> Option<String> {
    println!("{message}");
    io::stdout().flush().ok()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;
    Some(line.trim().to_string())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Some(args) = parse_args(std::env::args().skip(1)) else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    let config = SimConfig::from_env().unwrap_or_else(|err| {
        warn!("{err}; using defaults");
        SimConfig::default()
    });

    let jobs: Vec<JobRecord> = match args.source {
        Source::File(path) => match load_jobs(&path) {
            Ok(loaded) => loaded.jobs,
            Err(err) => {
                error!("{err}");
                Vec::new()
            }
        },
        Source::Generate { count, seed } => bernoulli_jobs(count, 0.3, seed),
    };

    let mut syscalls = PacedSystemCalls::new(config.pacing);
    let mut sim = Sim::new(&config);
    sim.load(jobs);
    sim.admit(&mut syscalls);

    let choice = args
        .choice
        .or_else(|| prompt("Select scheduling algorithm: 1. FCFS 2. Round-Robin 3. Priority"))
        .unwrap_or_default();
    let policy = choice.parse::<PolicyChoice>().and_then(|choice| {
        let quantum = match &args.quantum {
            None if choice.needs_quantum() => prompt("Enter time quantum for Round-Robin:"),
            quantum => quantum.clone(),
        };
        choice.into_policy(quantum.as_deref())
    });
    let policy = match policy {
        Ok(policy) => policy,
        Err(err) => {
            error!("{err}");
            println!("Invalid choice.");
            return ExitCode::FAILURE;
        }
    };

    match sim.run(policy, &mut syscalls) {
        Ok(report) => println!("\n{report}"),
        Err(SchedError::EmptyReadyQueue) => println!("No jobs available to schedule."),
        Err(err) => error!("{err}"),
    }

    for event in sim.drain_events() {
        debug!(?event);
    }

    ExitCode::SUCCESS
}
