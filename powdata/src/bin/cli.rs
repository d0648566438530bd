//! Command-line interface for powdata.
//!
//! Decodes, validates and mines proof-of-work records given as hex.

use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use bitcoin::hash_types::BlockHash;
use bitcoin::pow::CompactTarget;
use time::OffsetDateTime;

use powdata::json::PowDataJson;
use powdata::mining::{self, NonceRange};
use powdata::tracing::prelude::*;
use powdata::{ConsensusParams, Network, PowAlgo, PowData, codec, work};

fn main() -> Result<()> {
    powdata::tracing::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        usage();
        std::process::exit(1);
    }

    let params = consensus_params()?;
    let command = &args[1];
    let rest = &args[2..];

    match (command.as_str(), rest) {
        ("decode", [record]) => cmd_decode(record)?,
        ("check", [record, block_hash]) => {
            if !cmd_check(record, block_hash, &params)? {
                std::process::exit(2);
            }
        }
        ("mine", [algo, bits, block_hash]) => cmd_mine(algo, bits, block_hash, false, &params)?,
        ("mine", [algo, bits, block_hash, flag]) if flag == "--merge-mined" => {
            cmd_mine(algo, bits, block_hash, true, &params)?
        }
        ("work", [algo, bits]) => cmd_work(algo, bits)?,
        _ => {
            eprintln!("Unknown command or wrong arguments: {}", command);
            eprintln!("Run without arguments to see usage.");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn usage() {
    eprintln!("Usage: powdata-cli <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  decode <record>                      Print a record as JSON");
    eprintln!("  check <record> <blockhash>           Validate a record for a block");
    eprintln!("  mine <algo> <bits> <blockhash> [--merge-mined]");
    eprintln!("                                       Mine a record for a block");
    eprintln!("  work <algo> <bits>                   Print the chain work of a block");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  POWDATA_NETWORK    main, test or regtest (default: main)");
    eprintln!("  RUST_LOG           log filter (default: info)");
}

/// Consensus parameters for the network named by POWDATA_NETWORK.
fn consensus_params() -> Result<ConsensusParams> {
    let network = match env::var("POWDATA_NETWORK") {
        Ok(name) => Network::from_str(&name)
            .with_context(|| format!("unknown network in POWDATA_NETWORK: {name:?}"))?,
        Err(_) => Network::Main,
    };
    debug!(%network, "Using consensus parameters");
    Ok(ConsensusParams::for_network(network))
}

fn parse_record(hex_record: &str) -> Result<PowData> {
    let bytes = hex::decode(hex_record).context("record is not valid hex")?;
    Ok(codec::decode(&bytes)?)
}

fn parse_bits(text: &str) -> Result<CompactTarget> {
    let text = text.trim_start_matches("0x");
    let bits = u32::from_str_radix(text, 16).with_context(|| format!("invalid bits: {text}"))?;
    Ok(CompactTarget::from_consensus(bits))
}

fn parse_block_hash(text: &str) -> Result<BlockHash> {
    BlockHash::from_str(text).with_context(|| format!("invalid block hash: {text}"))
}

fn cmd_decode(record: &str) -> Result<()> {
    let data = parse_record(record)?;
    let view = PowDataJson::from(&data);
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

/// Print whether the record secures the block; returns the verdict.
fn cmd_check(record: &str, block_hash: &str, params: &ConsensusParams) -> Result<bool> {
    let data = parse_record(record)?;
    let block_hash = parse_block_hash(block_hash)?;

    let valid = data.is_valid(block_hash, params);
    println!("{}", if valid { "valid" } else { "invalid" });
    Ok(valid)
}

fn cmd_mine(
    algo: &str,
    bits: &str,
    block_hash: &str,
    merge_mined: bool,
    params: &ConsensusParams,
) -> Result<()> {
    let algo = PowAlgo::from_name(algo)?;
    let bits = parse_bits(bits)?;
    let block_hash = parse_block_hash(block_hash)?;

    let now = OffsetDateTime::now_utc().unix_timestamp();
    let time = u32::try_from(now).context("system clock outside the 32-bit timestamp range")?;

    let data = mine_record(algo, bits, block_hash, merge_mined, time, params)?;
    println!("{}", hex::encode(codec::encode(&data)?));
    Ok(())
}

/// Build a record for `block_hash` and search for its proof, starting at
/// `time`.
///
/// Bits that no proof can meet on this network are refused up front.
fn mine_record(
    algo: PowAlgo,
    bits: CompactTarget,
    block_hash: BlockHash,
    merge_mined: bool,
    mut time: u32,
    params: &ConsensusParams,
) -> Result<PowData> {
    powdata::required_target(algo, bits, params).with_context(|| {
        format!(
            "cannot mine {algo} at bits {:08x} on {}",
            bits.to_consensus(),
            params.network
        )
    })?;

    let mut data = PowData::new();
    data.set_core_algo(algo);
    data.set_bits(bits);
    data.set_merge_mined(merge_mined);

    info!(%algo, %block_hash, "Mining");
    loop {
        let header = data.commit(block_hash, time);
        if let Some(nonce) = mining::search(header, algo, bits, params, NonceRange::full()) {
            info!(nonce, time, "Mined");
            break;
        }
        // Nonce space exhausted; a new timestamp gives a fresh one.
        time = match time.checked_add(1) {
            Some(t) => t,
            None => bail!("no proof of work found for any timestamp"),
        };
    }

    if !data.is_valid(block_hash, params) {
        bail!("mined record failed validation");
    }
    Ok(data)
}

fn cmd_work(algo: &str, bits: &str) -> Result<()> {
    let algo = PowAlgo::from_name(algo)?;
    let bits = parse_bits(bits)?;
    let proof = work::block_proof(algo, bits)?;
    println!("{proof:#x}");
    Ok(())
}
