use std::env;
use std::process::ExitCode;

use combine_harness::producer::{TEN_AFTER_1S, TWENTY_AFTER_2S};
use combine_harness::{combine, Strategy};
use futures::executor::block_on;
use tracing_subscriber::EnvFilter;

fn parse_strategy(arg: &str) -> Option<Strategy> {
    match arg {
        "sequential" => Some(Strategy::Sequential),
        "concurrent" => Some(Strategy::Concurrent),
        "stream" => Some(Strategy::StreamCombinator),
        _ => None,
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let strategies = match env::args().nth(1) {
        Some(arg) => match parse_strategy(&arg) {
            Some(strategy) => vec![strategy],
            None => {
                eprintln!("unknown strategy {arg:?}; expected sequential | concurrent | stream");
                return ExitCode::FAILURE;
            }
        },
        None => Strategy::ALL.to_vec(),
    };

    for strategy in strategies {
        println!("--- {strategy:?} ---");
        match block_on(combine(strategy, TEN_AFTER_1S, TWENTY_AFTER_2S)) {
            Ok(result) => println!(
                "result = {}, time = {} [ms]",
                result.product, result.elapsed_millis
            ),
            Err(err) => eprintln!("combine failed: {err}"),
        }
    }

    ExitCode::SUCCESS
}
