use anyhow::anyhow;
use chrono::{Duration, Utc};
use clap::{Parser, ValueEnum};
use election_engine::{Election, ErrorKind, ManualClock, ParticipantId, SharedElection};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use std::ops::AddAssign;
use std::process;
use std::thread;
use std::time::{Duration as StdDuration, Instant};

const OWNER: &str = "benchmark-owner";

#[rustfmt::skip]
const CANDIDATES: &[&str] = &[
    "Alice",
    "Bob",
    "Carol",
    "Dave",
    "Eve",
    "Fred",
    "Grace",
    "Henry",
    "Irene",
    "Joe",
];

#[derive(Parser)]
struct Args {
    /// How many threads to use. Defaults to the number of logical CPUs.
    #[arg(long, default_value_t = num_cpus::get())]
    threads: usize,

    /// How many distinct voters each thread casts for.
    #[arg(long, default_value_t = 10_000)]
    voters_per_thread: usize,

    /// How long voting stays open, in seconds.
    #[arg(long, default_value_t = 1800)]
    duration: u32,

    /// The behaviour of voters.
    #[arg(long, value_enum, default_value_t)]
    vote_mode: VoteMode,
}

/// The behaviour of voters.
#[derive(Debug, Copy, Clone, Default, ValueEnum)]
enum VoteMode {
    /// Every voter votes once for a valid candidate.
    Clean,
    /// Every voter tries to vote twice.
    Repeat,
    /// Attempt to model real behaviour: 2% retry, 1% name a non-candidate.
    #[default]
    Realistic,
}

impl VoteMode {
    /// Return `true` if this voter should try to vote a second time.
    fn should_repeat(&self) -> bool {
        match self {
            Self::Clean => false,
            Self::Repeat => true,
            Self::Realistic => rand::random::<f32>() < 0.02,
        }
    }

    /// Return `true` if this voter should name someone who never stood.
    fn should_misvote(&self) -> bool {
        match self {
            Self::Clean | Self::Repeat => false,
            Self::Realistic => rand::random::<f32>() < 0.01,
        }
    }
}

/// What one thread observed while voting.
#[derive(Debug, Default)]
struct ThreadReport {
    elapsed: StdDuration,
    attempts: u64,
    accepted: HashMap<&'static str, u64>,
    refused: HashMap<ErrorKind, u64>,
}

impl AddAssign for ThreadReport {
    fn add_assign(&mut self, rhs: Self) {
        self.elapsed += rhs.elapsed;
        self.attempts += rhs.attempts;
        for (candidate, votes) in rhs.accepted {
            *self.accepted.entry(candidate).or_default() += votes;
        }
        for (kind, count) in rhs.refused {
            *self.refused.entry(kind).or_default() += count;
        }
    }
}

/// Create an election with every benchmark candidate registered and voting open.
fn setup_election(
    clock: &ManualClock,
    duration: u32,
) -> anyhow::Result<SharedElection<ManualClock>> {
    let owner = ParticipantId::from(OWNER);
    let mut election = Election::new(owner.clone(), clock.clone());

    for candidate in CANDIDATES {
        election.apply_as_candidate(&ParticipantId::from(*candidate))?;
    }
    election.start_election(&owner, duration)?;

    Ok(SharedElection::new(election))
}

/// Cast votes for voters `first..first + count`.
fn cast_votes(
    election: &SharedElection<ManualClock>,
    first: usize,
    count: usize,
    vote_mode: VoteMode,
) -> ThreadReport {
    let mut report = ThreadReport::default();
    let mut rng = rand::thread_rng();
    let nobody = ParticipantId::from("nobody");
    let start = Instant::now();

    for voter_id in first..(first + count) {
        let voter = ParticipantId::new(format!("voter{voter_id}"));
        let repeat = vote_mode.should_repeat();

        for _ in 0..if repeat { 2 } else { 1 } {
            report.attempts += 1;
            let result = if vote_mode.should_misvote() {
                election.vote(&voter, &nobody).map(|()| None)
            } else {
                // Always in range; CANDIDATES is non-empty.
                let name = CANDIDATES[rng.gen_range(0..CANDIDATES.len())];
                election
                    .vote(&voter, &ParticipantId::from(name))
                    .map(|()| Some(name))
            };

            match result {
                Ok(Some(name)) => *report.accepted.entry(name).or_default() += 1,
                Ok(None) => {}
                Err(e) => *report.refused.entry(e.kind()).or_default() += 1,
            }
        }
    }

    report.elapsed = start.elapsed();
    report
}

/// Run the benchmark and return the combined report.
fn benchmark(
    election: &SharedElection<ManualClock>,
    num_threads: usize,
    voters_per_thread: usize,
    vote_mode: VoteMode,
) -> anyhow::Result<ThreadReport> {
    let end_val = num_threads * voters_per_thread;

    let start = Instant::now();
    let report = thread::scope(|s| {
        let threads: Vec<_> = (0..end_val)
            .step_by(voters_per_thread.max(1))
            .map(|first| s.spawn(move || cast_votes(election, first, voters_per_thread, vote_mode)))
            .collect();

        let mut report = ThreadReport::default();
        for t in threads {
            report += t.join().map_err(|_| anyhow!("voting thread panicked"))?;
        }
        Ok::<_, anyhow::Error>(report)
    })?;
    let total_duration = start.elapsed();

    let avg_thread_duration = report.elapsed / num_threads.max(1) as u32;
    let attempts_per_sec = report.attempts as f64 / total_duration.as_secs_f64();

    println!("threads: {}", num_threads);
    println!("voters:  {}", end_val);
    println!("average thread time: {:?}", avg_thread_duration);
    println!(
        "actual duration: {} attempts in {:?} ({:.2}/s)",
        report.attempts, total_duration, attempts_per_sec
    );
    for (kind, count) in &report.refused {
        println!("refused ({}): {}", kind, count);
    }

    Ok(report)
}

/// Close the election and check its tallies against what the threads saw.
fn verify(
    election: &SharedElection<ManualClock>,
    clock: &ManualClock,
    duration: u32,
    report: &ThreadReport,
) -> anyhow::Result<()> {
    let owner = ParticipantId::from(OWNER);

    // Voting must still be open, so closing early has to be refused.
    match election.end_election(&owner) {
        Err(e) if e.kind() == ErrorKind::Precondition => {}
        other => return Err(anyhow!("early end not refused: {:?}", other)),
    }

    clock.advance(Duration::seconds(duration.into()));
    election.end_election(&owner)?;

    let accepted: u64 = report.accepted.values().sum();
    if election.total_votes() != accepted {
        return Err(anyhow!(
            "election counted {} votes but {} were accepted",
            election.total_votes(),
            accepted
        ));
    }

    for candidate in CANDIDATES {
        let expected = report.accepted.get(candidate).copied().unwrap_or(0);
        let actual = election.candidate_votes(&ParticipantId::from(*candidate));
        if actual != expected {
            return Err(anyhow!(
                "{candidate} has {actual} votes but was given {expected}"
            ));
        }
    }

    // The earliest-registered candidate wins a tie.
    let most = CANDIDATES
        .iter()
        .map(|c| report.accepted.get(c).copied().unwrap_or(0))
        .max()
        .unwrap_or(0);
    let expected_winner = CANDIDATES
        .iter()
        .find(|c| report.accepted.get(*c).copied().unwrap_or(0) == most)
        .ok_or_else(|| anyhow!("no candidates"))?;
    let winner = election.winner()?;
    if winner.as_str() != *expected_winner {
        return Err(anyhow!("winner is {winner}, expected {expected_winner}"));
    }

    println!("\n{}", election.results());
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let clock = ManualClock::new(Utc::now());
    let election = setup_election(&clock, args.duration)?;

    let report = benchmark(&election, args.threads, args.voters_per_thread, args.vote_mode)?;
    verify(&election, &clock, args.duration, &report)?;

    // Shuffled spot checks: outside realistic mode every voter must be marked.
    if matches!(args.vote_mode, VoteMode::Realistic) {
        return Ok(());
    }
    let mut voters: Vec<usize> = (0..args.threads * args.voters_per_thread).collect();
    voters.shuffle(&mut rand::thread_rng());
    for voter_id in voters.into_iter().take(100) {
        let voter = ParticipantId::new(format!("voter{voter_id}"));
        if !election.has_voted(&voter) {
            return Err(anyhow!("{voter} voted but is not marked"));
        }
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("FATAL: {}", e);
        process::exit(1);
    }
}
