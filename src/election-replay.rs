//! A simple CLI tool for replaying scripted elections.
//! Each scenario drives a real election against a manual clock, so the
//! outcome is exactly what the engine would produce for the same calls.

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::runtime::ConfigErrors;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::Deserialize;

use election_engine::model::VoteCount;
use election_engine::{
    Config, Election, ElectionPhase, ElectionResults, ErrorKind, ManualClock, Operation,
    ParticipantId,
};

const PROGRAM_NAME: &str = "election-replay";

const ABOUT_TEXT: &str = "Replay a scripted election and check its expectations.

EXIT CODES:
     0: Every expectation held.
   255: Ran successfully, but an expectation failed.
 Other: Error.";

const SCENARIO_PATH: &str = "SCENARIO_PATH";

const SCENARIO_PATH_HELP: &str = "The path to a JSON scenario: an `owner`, \n\
an optional `start_time`, and a list of `steps`";

const VERBOSE: &str = "verbose";

const LOG_CONFIG_PATH: &str = "log4rs.yaml";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .arg(
            Arg::new(SCENARIO_PATH)
                .help(SCENARIO_PATH_HELP)
                .action(ArgAction::Set)
                .required(true),
        )
        .arg(
            Arg::new(VERBOSE)
                .short('v')
                .long(VERBOSE)
                .help("Log every operation to stderr, ignoring log4rs.yaml")
                .action(ArgAction::SetTrue),
        )
}

/// A scripted election.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Scenario {
    owner: ParticipantId,
    /// When the clock starts. Defaults to the current time.
    #[serde(default)]
    start_time: Option<DateTime<Utc>>,
    /// Overrides the configured shortest election, in seconds.
    #[serde(default)]
    min_duration: Option<u32>,
    /// Overrides the configured longest election, in seconds.
    #[serde(default)]
    max_duration: Option<u32>,
    steps: Vec<Step>,
}

/// One step of a scenario.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Step {
    /// Perform an operation. Unless `expect` names an error kind, it must succeed.
    Call {
        caller: ParticipantId,
        operation: Operation,
        #[serde(default)]
        expect: Option<ErrorKind>,
    },
    /// Move the clock; negative values move it backwards.
    AdvanceTime { seconds: i64 },
    ExpectVotes {
        candidate: ParticipantId,
        votes: VoteCount,
    },
    ExpectWinner { candidate: ParticipantId },
    /// The phase as its status code: 0 not started, 1 started, 2 ended.
    ExpectPhase { phase: ElectionPhase },
}

/// A step whose expectation did not hold.
#[derive(Debug, Eq, PartialEq)]
struct Failure {
    /// One-based index into the scenario's steps.
    step: usize,
    reason: String,
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "step {}: {}", self.step, self.reason)
    }
}

/// Errors that this program may produce.
#[derive(Debug, Eq, PartialEq)]
enum Error {
    /// IO error described by the inner message.
    IO(String),
    /// Failed to decode the scenario, or its configuration is unusable.
    Format(String),
    /// The scenario ran but one of its expectations failed.
    Expectation(Failure),
}

/// Build the election configuration, letting the scenario override the loaded bounds.
fn scenario_config(scenario: &Scenario) -> Result<Config, Error> {
    let loaded = Config::load().map_err(|e| Error::Format(e.to_string()))?;
    let window = loaded.duration_window();
    Config::new(
        scenario.min_duration.unwrap_or(*window.start()),
        scenario.max_duration.unwrap_or(*window.end()),
    )
    .map_err(|e| Error::Format(e.to_string()))
}

/// Perform the step numbered `number`.
fn run_step(
    election: &mut Election<ManualClock>,
    clock: &ManualClock,
    number: usize,
    step: Step,
) -> Result<(), Error> {
    let fail = |reason: String| {
        Error::Expectation(Failure {
            step: number,
            reason,
        })
    };

    match step {
        Step::Call {
            caller,
            operation,
            expect,
        } => match (election.execute(&caller, operation), expect) {
            (Ok(()), None) => Ok(()),
            (Err(err), Some(kind)) if err.kind() == kind => Ok(()),
            (Ok(()), Some(kind)) => Err(fail(format!(
                "expected a {kind} error, but it succeeded"
            ))),
            (Err(err), None) => Err(fail(format!("unexpected {} error: {err}", err.kind()))),
            (Err(err), Some(kind)) => Err(fail(format!(
                "expected a {kind} error, got a {} error: {err}",
                err.kind()
            ))),
        },
        Step::AdvanceTime { seconds } => Duration::try_seconds(seconds)
            .and_then(|duration| clock.try_advance(duration))
            .map(|_| ())
            .ok_or_else(|| {
                Error::Format(format!(
                    "step {number}: advancing by {seconds} seconds leaves the supported time range"
                ))
            }),
        Step::ExpectVotes { candidate, votes } => {
            let actual = election.candidate_votes(&candidate);
            if actual == votes {
                Ok(())
            } else {
                Err(fail(format!(
                    "{candidate} has {actual} votes, expected {votes}"
                )))
            }
        }
        Step::ExpectWinner { candidate } => match election.winner() {
            Ok(winner) if *winner == candidate => Ok(()),
            Ok(winner) => Err(fail(format!("winner is {winner}, expected {candidate}"))),
            Err(err) => Err(fail(format!("no winner ({err}), expected {candidate}"))),
        },
        Step::ExpectPhase { phase } => {
            let actual = election.phase();
            if actual == phase {
                Ok(())
            } else {
                Err(fail(format!("election {actual}, expected {phase}")))
            }
        }
    }
}

/// Run a scenario to completion.
fn replay(path: &str) -> Result<ElectionResults, Error> {
    // Load the file.
    let file = BufReader::new(File::open(path).map_err(|e| Error::IO(e.to_string()))?);
    let scenario: Scenario =
        serde_json::from_reader(file).map_err(|e| Error::Format(e.to_string()))?;

    let config = scenario_config(&scenario)?;
    let clock = ManualClock::new(scenario.start_time.unwrap_or_else(Utc::now));
    let mut election = Election::with_config(scenario.owner, config, clock.clone());

    for (index, step) in scenario.steps.into_iter().enumerate() {
        run_step(&mut election, &clock, index + 1, step)?;
    }

    Ok(election.results())
}

/// Replay the scenario, report the result, and return the exit code.
fn run(args: &ArgMatches) -> u8 {
    let path: &String = args.get_one(SCENARIO_PATH).unwrap(); // Required argument is guaranteed to be present.
    match replay(path) {
        Ok(results) => {
            println!("Replay succeeded.");
            println!("{}", results);
            0
        }
        Err(Error::IO(msg)) => {
            println!("IO error: {}", msg);
            1
        }
        Err(Error::Format(msg)) => {
            println!("Invalid scenario: {}", msg);
            1
        }
        Err(Error::Expectation(failure)) => {
            println!("Replay failed at {}", failure);
            255
        }
    }
}

/// Log to stderr at `level`, keeping stdout for the results.
fn console_log_config(level: LevelFilter) -> Result<LogConfig, ConfigErrors> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{h({l})} {t} - {m}{n}")))
        .build();
    LogConfig::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
}

/// Set up logging from `log4rs.yaml`, or a stderr console if it is missing.
/// Verbose runs skip the file and log everything at debug level.
fn init_logging(verbose: bool) {
    if !verbose {
        match log4rs::init_file(LOG_CONFIG_PATH, Default::default()) {
            Ok(()) => return,
            Err(err) if Path::new(LOG_CONFIG_PATH).exists() => {
                eprintln!("Ignoring {LOG_CONFIG_PATH}: {err}");
            }
            Err(_) => {}
        }
    }

    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    // Logging is a convenience here; the replay itself still runs.
    match console_log_config(level).map(log4rs::init_config) {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => eprintln!("Failed to initialise logging: {err}"),
        Err(err) => eprintln!("Invalid logging configuration: {err}"),
    }
}

fn main() {
    let args = cli().get_matches();
    init_logging(args.get_flag(VERBOSE));
    let exit_code = run(&args);
    std::process::exit(exit_code.into())
}
