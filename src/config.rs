//! CLI and environment configuration of the bench.
//!
//! `locker <kind|all> [workers] [iterations] [hold_us]`
//!
//! `LOCKER_SPIN_LIMIT` overrides the adaptive lock's spin rounds.

use std::{error::Error, fmt, str::FromStr, time::Duration};

use strum::IntoEnumIterator;

use crate::{bench::Workload, locker::adaptive::DEFAULT_SPIN_LIMIT, locker::Kind};

pub const DEFAULT_WORKERS: usize = 32;
pub const DEFAULT_ITERATIONS: usize = 10_000;
pub const DEFAULT_HOLD_US: u64 = 10;
pub const DEFAULT_HOLD: Duration = Duration::from_micros(DEFAULT_HOLD_US);

pub const SPIN_LIMIT_VAR: &str = "LOCKER_SPIN_LIMIT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub kinds: Vec<Kind>,
    pub workers: usize,
    pub iterations: usize,
    /// how long a worker sits in the critical section, zero for no sleep at all
    pub hold: Duration,
    pub spin_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kinds: Kind::iter().collect(),
            workers: DEFAULT_WORKERS,
            iterations: DEFAULT_ITERATIONS,
            hold: DEFAULT_HOLD,
            spin_limit: DEFAULT_SPIN_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    NoKind,
    UnknownKind(String),
    BadNumber { name: &'static str, value: String },
    NoWorkers,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoKind => write!(f, "no locker supplied, use one of {}", kind_list()),
            ConfigError::UnknownKind(kind) => {
                write!(f, "unknown locker {kind:?}, use one of {}", kind_list())
            }
            ConfigError::BadNumber { name, value } => {
                write!(f, "{name} must be a non-negative integer, got {value:?}")
            }
            ConfigError::NoWorkers => write!(f, "workers must be at least 1"),
        }
    }
}

impl Error for ConfigError {}

fn kind_list() -> String {
    Kind::iter()
        .map(|k| k.to_string())
        .chain(["all".to_string()])
        .collect::<Vec<String>>()
        .join(",")
}

fn number<T>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
{
    value.map_or(Ok(default), |value| {
        value
            .parse()
            .map_err(|_| ConfigError::BadNumber { name, value })
    })
}

impl Config {
    /// the arguments after the program name
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let defaults = Self::default();

        let kinds = match args.next().ok_or(ConfigError::NoKind)?.as_str() {
            "all" => defaults.kinds,
            selector => vec![Kind::from_str(selector)
                .map_err(|_| ConfigError::UnknownKind(selector.to_string()))?],
        };
        let workers = number("workers", args.next(), defaults.workers)?;
        if workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        let iterations = number("iterations", args.next(), defaults.iterations)?;
        let hold = Duration::from_micros(number("hold_us", args.next(), DEFAULT_HOLD_US)?);

        Ok(Self {
            kinds,
            workers,
            iterations,
            hold,
            spin_limit: defaults.spin_limit,
        })
    }

    /// `lookup` is `std::env::var` in real life
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.spin_limit = number(SPIN_LIMIT_VAR, lookup(SPIN_LIMIT_VAR), self.spin_limit)?;
        Ok(self)
    }

    pub fn workloads(&self) -> impl Iterator<Item = Workload> + '_ {
        self.kinds.iter().map(|&kind| Workload {
            kind,
            workers: self.workers,
            iterations: self.iterations,
            hold: self.hold,
            spin_limit: self.spin_limit,
        })
    }
}
