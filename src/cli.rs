use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::Serialize;

/// Files larger than this are skipped unless `--max-size` says otherwise.
pub const DEFAULT_MAX_SIZE: u64 = 64 * 1024 * 1024;

/// How files that look binary are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryPolicy {
    /// Leave binary files out of the search.
    Skip,
    /// Search binary files as if they were text.
    Text,
}

/// Command-line options of the `pgrep` binary.
#[derive(Parser, Debug, Clone, Serialize)]
#[command(name = "pgrep", version, about = "Search files under ROOT for PATTERN in parallel")]
pub struct Options {
    /// Pattern to search for
    #[arg(value_name = "PATTERN")]
    pub pattern: String,

    /// Directory to search
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Number of worker threads (default: auto)
    #[arg(
        short,
        long,
        value_name = "N",
        value_parser = clap::value_parser!(u32).range(1..=i64::from(i32::MAX))
    )]
    pub jobs: Option<u32>,

    /// Treat PATTERN as a regex instead of a literal substring
    #[arg(short, long)]
    pub regex: bool,

    /// Skip files larger than BYTES
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_SIZE)]
    pub max_size: u64,

    /// Include only paths matching GLOB (repeatable)
    #[arg(long = "include", value_name = "GLOB")]
    pub include: Vec<String>,

    /// Exclude paths matching GLOB (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Include hidden files and directories
    #[arg(long)]
    pub hidden: bool,

    /// Follow symbolic links
    #[arg(long)]
    pub follow_symlinks: bool,

    /// What to do with binary files
    #[arg(long, value_enum, value_name = "MODE", default_value_t = BinaryPolicy::Skip)]
    pub binary: BinaryPolicy,
}

impl Options {
    /// Worker count to hand to [`ThreadPool::new`](crate::ThreadPool::new);
    /// `None` lets the pool pick one per CPU.
    pub fn worker_count(&self) -> Option<usize> {
        self.jobs.map(|jobs| jobs as usize)
    }
}

/// What a run resolved to: the parsed options plus the actual pool size.
#[derive(Debug, Serialize)]
pub struct RunPlan {
    /// Number of workers the pool was started with.
    pub workers: usize,
    /// Options as given on the command line, defaults filled in.
    #[serde(flatten)]
    pub options: Options,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options, clap::Error> {
        Options::try_parse_from(std::iter::once("pgrep").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let opts = parse(&["needle", "."]).unwrap();
        assert_eq!(opts.pattern, "needle");
        assert_eq!(opts.root, PathBuf::from("."));
        assert_eq!(opts.jobs, None);
        assert!(!opts.regex);
        assert_eq!(opts.max_size, DEFAULT_MAX_SIZE);
        assert!(opts.include.is_empty() && opts.exclude.is_empty());
        assert!(!opts.hidden && !opts.follow_symlinks);
        assert_eq!(opts.binary, BinaryPolicy::Skip);
    }

    #[test]
    fn all_flags() {
        let opts = parse(&[
            "-j", "8", "-r", "--max-size", "1024", "--include", "*.rs", "--include", "*.toml",
            "--exclude", "target/*", "--hidden", "--follow-symlinks", "--binary", "text", "fn",
            "src",
        ])
        .unwrap();
        assert_eq!(opts.worker_count(), Some(8));
        assert!(opts.regex);
        assert_eq!(opts.max_size, 1024);
        assert_eq!(opts.include, vec!["*.rs", "*.toml"]);
        assert_eq!(opts.exclude, vec!["target/*"]);
        assert!(opts.hidden && opts.follow_symlinks);
        assert_eq!(opts.binary, BinaryPolicy::Text);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse(&["-j", "0", "p", "."]).is_err());
        assert!(parse(&["-j", "many", "p", "."]).is_err());
        assert!(parse(&["-j", "3000000000", "p", "."]).is_err());
        assert!(parse(&["--max-size", "-1", "p", "."]).is_err());
        assert!(parse(&["--binary", "hex", "p", "."]).is_err());
    }

    #[test]
    fn requires_exactly_two_positionals() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["only"]).is_err());
        assert!(parse(&["a", "b", "c"]).is_err());
    }

    #[test]
    fn plan_serializes_flat() {
        let plan = RunPlan {
            workers: 3,
            options: parse(&["x", "/tmp"]).unwrap(),
        };
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["workers"], 3);
        assert_eq!(json["pattern"], "x");
        assert_eq!(json["binary"], "skip");
        assert_eq!(json["max_size"], DEFAULT_MAX_SIZE);
    }
}
