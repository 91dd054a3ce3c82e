use std::env;
use std::fs;
use std::process;
use stickwork_domain_score::Score;
use stickwork_infra_storage_fs::FsStorage;

mod replay;

use replay::{replay, RecordedHit, ReplayOptions};

fn usage() -> ! {
    eprintln!("Usage: stickwork-replay <score.json> <hits.json> [--practice] [--ms-per-tick <ms>]");
    process::exit(1);
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> T {
    let data = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path, e);
            process::exit(1);
        }
    };
    match serde_json::from_str(&data) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error parsing '{}': {}", path, e);
            process::exit(1);
        }
    }
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        usage();
    }

    let mut opts = ReplayOptions::default();
    let mut rest = args[3..].iter();
    while let Some(flag) = rest.next() {
        match flag.as_str() {
            "--practice" => opts.practice = true,
            "--ms-per-tick" => {
                let Some(value) = rest.next().and_then(|v| v.parse::<f64>().ok()) else {
                    usage();
                };
                opts.ms_per_tick = value;
            }
            _ => usage(),
        }
    }

    let score: Score = read_json(&args[1]);
    let hits: Vec<RecordedHit> = read_json(&args[2]);

    let outcome = match replay(score, hits, Some(Box::new(FsStorage::default())), opts) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Replay failed: {}", e);
            process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error writing summary: {}", e);
            process::exit(1);
        }
    }
}
