use hybench::catalog::Catalog;
use hybench::common::error::FatalError;
use hybench::common::statistics::{GlobalStatistics, LocalStatistics};
use hybench::common::utils;
use hybench::database::mysql::MySqlConnection;
use hybench::workloads::driver;
use hybench::workloads::mixer::{self, CategoryMix};
use hybench::workloads::paramgen::ParameterGenerator;
use hybench::workloads::HyBenchParameters;

use clap::{arg, Command};
use crossbeam_utils::thread;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::mpsc;
use tracing::info;

fn main() {
    if let Err(e) = run() {
        eprintln!("hybench: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), FatalError> {
    // config file
    let mut config = utils::init_config("Settings.toml")?;

    // command line
    let matches = Command::new("hybench")
        .version("0.1.0")
        .about("HTAP benchmark workload driver")
        .arg(arg!(--"parse-only" "Parse the catalog, print it and exit").required(false))
        .arg(arg!(--"run-all" "Run every catalog template exactly once").required(false))
        .arg(arg!(--catalog <FILE> "Template catalog file").required(false))
        .arg(arg!(--"max-qry" <N> "Queries per worker").required(false))
        .arg(arg!(--workers <N> "Number of workers").required(false))
        .arg(arg!(--"ap-ratio" <R> "Analytical ratio").required(false))
        .arg(arg!(--"tp-ratio" <R> "Transactional ratio").required(false))
        .arg(arg!(--"at-ratio" <R> "Account-transaction ratio").required(false))
        .arg(arg!(--"iq-ratio" <R> "Interactive-query ratio").required(false))
        .arg(arg!(--log <LEVEL> "Log level").required(false))
        .get_matches();

    let overrides = [
        ("catalog", "catalog"),
        ("max-qry", "max_qry"),
        ("workers", "workers"),
        ("ap-ratio", "ap_ratio"),
        ("tp-ratio", "tp_ratio"),
        ("at-ratio", "at_ratio"),
        ("iq-ratio", "iq_ratio"),
        ("log", "log"),
    ];
    for (cli, key) in &overrides {
        if let Some(v) = matches.get_one::<String>(cli) {
            config
                .set(*key, v.clone())
                .map_err(|e| FatalError::Configuration(e.to_string()))?;
        }
    }

    utils::set_log_level(&config);

    let catalog_path = config
        .get_str("catalog")
        .unwrap_or_else(|_| "conf/stmt.toml".to_string());
    let catalog = Catalog::load(&catalog_path)?;

    if matches.is_present("parse-only") {
        println!("{}", catalog);
        return Ok(());
    }

    if config.get_bool("validate_catalog").unwrap_or(false) {
        driver::validate(&catalog)?;
    }

    let params = HyBenchParameters::from_config(&config);
    let record = config.get_bool("record").unwrap_or(false);

    let mut global_stats = GlobalStatistics::new();
    let (tx, rx) = mpsc::channel();

    if matches.is_present("run-all") {
        let mut conn = MySqlConnection::connect(&config)?;
        let (set_seed, seed) = utils::worker_seed(&config, 0);
        let mut gen = ParameterGenerator::new(set_seed, seed, params);
        let mut stats = LocalStatistics::new(0);

        info!("running every template once");
        driver::run_all_once(&catalog, &mut conn, &mut gen, &mut stats);
        let _ = tx.send(stats);
    } else {
        let workers = config.get_int("workers").unwrap_or(1).max(1) as usize;
        let max_qry = config.get_int("max_qry").unwrap_or(100) as u64;
        let mut mix = CategoryMix::from_config(&config);
        mix.normalize();

        // Connect before spawning so connection problems stay fatal.
        let mut connections = Vec::with_capacity(workers);
        for _ in 0..workers {
            connections.push(MySqlConnection::connect(&config)?);
        }

        info!(
            "starting {} worker(s), {} queries each, mix {:?}",
            workers, max_qry, mix
        );

        thread::scope(|s| {
            let catalog = &catalog;
            let config = &config;
            let mix = &mix;
            let params = &params;

            for (thread_id, mut conn) in connections.into_iter().enumerate() {
                let txc = tx.clone();

                s.builder()
                    .name(thread_id.to_string())
                    .spawn(move |_| {
                        let (set_seed, seed) = utils::worker_seed(config, thread_id as u32);
                        let mut gen = ParameterGenerator::new(set_seed, seed, params.clone());
                        let mut rng = match seed {
                            Some(s) => StdRng::seed_from_u64(s),
                            None => StdRng::from_entropy(),
                        };
                        let mut stats = LocalStatistics::new(thread_id as u32);

                        mixer::run(
                            catalog, max_qry, mix, &mut conn, &mut gen, &mut rng, &mut stats,
                        );

                        let _ = txc.send(stats);
                    })
                    .map_err(|e| FatalError::Configuration(e.to_string()))?;
            }

            Ok(())
        })
        .map_err(|_| FatalError::Configuration("worker panicked".to_string()))??;
    }

    drop(tx);

    info!("collecting statistics");
    while let Ok(local_stats) = rx.recv() {
        global_stats.merge_into(local_stats);
    }
    global_stats.end();

    print!("{}", global_stats);

    if record {
        if let Err(e) = global_stats.write_to_file() {
            tracing::warn!("unable to write results file: {}", e);
        }
    }

    Ok(())
}
