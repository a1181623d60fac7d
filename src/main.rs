use std::env::{self, args};

use locker::{bench, config::Config, logging};

fn main() -> Result<(), String> {
    logging::init();

    let config = Config::from_args(args().skip(1))
        .and_then(|config| config.with_env(|name| env::var(name).ok()))
        .map_err(|e| e.to_string())?;
    log::debug!("{config:?}");

    for workload in config.workloads() {
        bench::run(&workload)
            .map(|report| println!("{report}"))
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}
