use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use anyhow::{Context, Result};
use chainsim_core::{mine, mine_parallel, propose, total_stake, Block, Chain, Validator};
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "chainsim-cli")]
#[command(about = "Proof-of-work and proof-of-stake chain simulator")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mine a chain of proof-of-work blocks
    Pow {
        /// Number of blocks to mine on top of genesis
        #[arg(long, default_value_t = 3)]
        blocks: u32,
        /// Required number of leading zero hex digits
        #[arg(long, default_value_t = 2)]
        difficulty: u32,
        /// Search the nonce space across all cores
        #[arg(long)]
        parallel: bool,
        /// Producer tag stamped on mined blocks
        #[arg(long, default_value = "miner")]
        miner: String,
        /// Print the final chain as JSON instead of a report
        #[arg(long)]
        json: bool,
    },
    /// Run stake-weighted proposer rounds
    Pos {
        /// Number of proposer rounds
        #[arg(long, default_value_t = 5)]
        rounds: u32,
        /// Seed for the selection RNG (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Validator set as addr=stake pairs
        #[arg(
            long,
            value_parser = parse_validator,
            value_delimiter = ',',
            default_value = "alice=1000,bob=500,charlie=200,dave=100"
        )]
        validators: Vec<Validator>,
        /// Load the validator set from a JSON file instead
        #[arg(long, conflicts_with = "validators")]
        validators_file: Option<PathBuf>,
        /// Print the final chain as JSON instead of a report
        #[arg(long)]
        json: bool,
    },
}

fn parse_validator(s: &str) -> Result<Validator, String> {
    let (address, stake) = s
        .split_once('=')
        .ok_or_else(|| format!("expected addr=stake, got `{s}`"))?;
    if address.is_empty() {
        return Err(format!("empty validator address in `{s}`"));
    }
    let stake: u64 = stake
        .parse()
        .map_err(|_| format!("stake in `{s}` is not a non-negative integer"))?;
    Ok(Validator::new(address, stake))
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Pow {
            blocks,
            difficulty,
            parallel,
            miner,
            json,
        } => run_pow(blocks, difficulty, parallel, &miner, json),
        Command::Pos {
            rounds,
            seed,
            validators,
            validators_file,
            json,
        } => {
            let validators = match validators_file {
                Some(path) => load_validators(&path)?,
                None => validators,
            };
            run_pos(rounds, seed, &validators, json)
        }
    }
}

fn run_pow(blocks: u32, difficulty: u32, parallel: bool, miner: &str, json: bool) -> Result<()> {
    let mut chain = Chain::genesis(vec!["genesis".to_string()], "system")?;
    let stop = AtomicBool::new(false);

    for i in 1..=u64::from(blocks) {
        let payload = vec![format!("tx{i}-1"), format!("tx{i}-2")];
        let (tip_height, tip_hash) = {
            let tip = chain.tip();
            (tip.height, tip.hash.clone())
        };
        let started = Instant::now();
        let seal = if parallel {
            mine_parallel(&payload, &tip_hash, difficulty, &stop)?
                .expect("the stop signal is never raised here")
        } else {
            mine(&payload, &tip_hash, difficulty)?
        };
        let elapsed = started.elapsed();
        let block = Block::new(tip_height + 1, tip_hash, payload, miner, Some(seal.nonce))?;
        chain.append(block)?;
        if !json {
            println!(
                "block {i}: nonce {} found in {elapsed:.2?}, hash {}",
                seal.nonce, seal.hash
            );
        }
    }

    report(&chain, json)
}

fn run_pos(rounds: u32, seed: Option<u64>, validators: &[Validator], json: bool) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut chain = Chain::genesis(vec!["genesis".to_string()], "system")?;

    for round in 1..=u64::from(rounds) {
        let payload = vec![format!("tx{round}-1"), format!("tx{round}-2")];
        let block = propose(validators, chain.tip(), payload, &mut rng)?;
        if !json {
            println!(
                "round {round}: {} proposes block {}",
                block.producer, block.height
            );
        }
        chain.append(block)?;
    }

    if !json {
        print_tally(&chain, validators);
    }
    report(&chain, json)
}

/// Counts blocks per producer from the chain itself rather than trusting
/// the per-round announcements.
fn print_tally(chain: &Chain, validators: &[Validator]) {
    let mut tally: HashMap<&str, u64> = HashMap::new();
    for block in &chain.blocks()[1..] {
        *tally.entry(block.producer.as_str()).or_default() += 1;
    }

    println!("\nproposals per validator:");
    for validator in validators {
        let wins = tally.get(validator.address.as_str()).copied().unwrap_or(0);
        println!(
            "  {:<12} stake {:>6}  blocks {wins}",
            validator.address, validator.stake
        );
    }
    println!("total stake: {}", total_stake(validators));
}

fn report(chain: &Chain, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(chain)?);
    } else {
        println!(
            "chain of {} blocks, verification {}",
            chain.len(),
            if chain.verify() { "passed" } else { "FAILED" }
        );
    }
    Ok(())
}

fn load_validators(path: &Path) -> Result<Vec<Validator>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading validator set from {}", path.display()))?;
    let validators: Vec<Validator> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing validator set from {}", path.display()))?;
    info!(count = validators.len(), "validator set loaded");
    Ok(validators)
}
