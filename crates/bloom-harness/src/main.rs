#![forbid(unsafe_code)]

//! `bloom-replay`: record and verify controller session traces.
//!
//! ```text
//! bloom-replay demo                 record the demo session and verify it in memory
//! bloom-replay record <out.jsonl>   record the demo session to a file
//! bloom-replay verify <in.jsonl>    replay a trace and check every snapshot
//! ```
//!
//! Environment:
//!
//! - `BLOOM_REPLAY_SEED`: jitter seed for the demo session (default 1). A
//!   value that is not an unsigned integer is an error.
//! - `BLOOM_REPLAY_CONFIG`: path to a JSON `BloomConfig`; missing fields
//!   take their defaults.
//! - `BLOOM_REPLAY_QUIET`: suppress the summary line. `0`, `false`, `no`
//!   and `off` leave it on.
//! - `RUST_LOG`: log filter (default `warn`).

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bloom_core::BloomConfig;
use bloom_harness::{SessionTrace, record_demo, replay};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Settings taken from `BLOOM_REPLAY_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ReplayEnv {
    seed: u64,
    config: Option<PathBuf>,
    quiet: bool,
}

impl ReplayEnv {
    fn from_process() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Blank values count as unset.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let seed = match var("BLOOM_REPLAY_SEED") {
            Some(v) => v
                .parse()
                .map_err(|_| format!("BLOOM_REPLAY_SEED: expected an unsigned integer, got {v:?}"))?,
            None => 1,
        };
        let quiet = var("BLOOM_REPLAY_QUIET").is_some_and(|v| {
            !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
        });
        Ok(Self {
            seed,
            config: var("BLOOM_REPLAY_CONFIG").map(PathBuf::from),
            quiet,
        })
    }

    fn load_config(&self) -> Result<BloomConfig, String> {
        let Some(path) = &self.config else {
            return Ok(BloomConfig::default());
        };
        let shown = path.display();
        let text = std::fs::read_to_string(path).map_err(|e| format!("{shown}: {e}"))?;
        let config: BloomConfig =
            serde_json::from_str(&text).map_err(|e| format!("{shown}: {e}"))?;
        config.validate().map_err(|e| format!("{shown}: {e}"))?;
        Ok(config)
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

fn summary_line(label: &str, trace: &SessionTrace, quiet: bool) -> Result<(), String> {
    let report = replay(trace).map_err(|e| e.to_string())?;
    if !quiet {
        eprintln!(
            "{label} OK: steps={} snapshots={} chain={:016x} sources={:?}",
            report.steps, report.snapshots, report.final_checksum_chain, report.active_inputs_seen
        );
    }
    Ok(())
}

fn run(args: &[String], env: &ReplayEnv) -> Result<(), String> {
    let seed = env.seed;
    match args {
        [cmd] if cmd == "demo" => {
            let trace = record_demo(env.load_config()?, seed).map_err(|e| e.to_string())?;
            summary_line("demo replay", &trace, env.quiet)
        }
        [cmd, out] if cmd == "record" => {
            let trace = record_demo(env.load_config()?, seed).map_err(|e| e.to_string())?;
            trace
                .write_to(Path::new(out))
                .map_err(|e| format!("{out}: {e}"))?;
            tracing::info!(path = %out, seed, "trace written");
            summary_line("record", &trace, env.quiet)
        }
        [cmd, input] if cmd == "verify" => {
            let trace = SessionTrace::read_from(Path::new(input)).map_err(|e| format!("{input}: {e}"))?;
            summary_line("trace replay", &trace, env.quiet)
        }
        _ => Err("usage: bloom-replay demo | record <out.jsonl> | verify <in.jsonl>".to_string()),
    }
}

fn main() -> ExitCode {
    init_logging();
    let args: Vec<String> = std::env::args().skip(1).collect();
    match ReplayEnv::from_process().and_then(|env| run(&args, &env)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("bloom-replay: {err}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> Result<ReplayEnv, String> {
        ReplayEnv::from_lookup(|name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v).to_string())
        })
    }

    #[test]
    fn unset_environment_uses_defaults() {
        let env = env_of(&[]).expect("defaults");
        assert_eq!(
            env,
            ReplayEnv {
                seed: 1,
                config: None,
                quiet: false
            }
        );
        assert_eq!(env.load_config(), Ok(BloomConfig::default()));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let env = env_of(&[("BLOOM_REPLAY_SEED", "  "), ("BLOOM_REPLAY_CONFIG", "")]).expect("blank");
        assert_eq!(env.seed, 1);
        assert_eq!(env.config, None);
    }

    #[test]
    fn bad_seed_is_an_error() {
        let err = env_of(&[("BLOOM_REPLAY_SEED", "-3")]).unwrap_err();
        assert!(err.contains("BLOOM_REPLAY_SEED"), "{err}");
    }

    #[test]
    fn quiet_accepts_any_value_but_false_words() {
        for (value, quiet) in [("1", true), ("yes", true), ("0", false), ("Off", false)] {
            let env = env_of(&[("BLOOM_REPLAY_QUIET", value)]).expect("quiet");
            assert_eq!(env.quiet, quiet, "{value}");
        }
    }

    #[test]
    fn config_file_is_loaded_and_validated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"{"arbiter":{"key_rotate_step":4.0}}"#).expect("write");
        let env = ReplayEnv {
            seed: 1,
            config: Some(good),
            quiet: true,
        };
        assert_eq!(env.load_config().expect("valid").arbiter.key_rotate_step, 4.0);

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"arbiter":{"decay_factor":2.0}}"#).expect("write");
        let env = ReplayEnv {
            config: Some(bad),
            ..env
        };
        assert!(env.load_config().unwrap_err().contains("decay_factor"));
    }
}
