//! `campusgate` operator CLI.
//!
//! ```text
//! campusgate catalog --check
//! campusgate resolve --seed seed.json --user <uuid>
//! campusgate gate --seed seed.json --user <uuid> --feature analytics.view --needed-plan starter
//! campusgate min-plan fees.online
//! ```

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use campusgate_core::UserId;
use campusgate_entitlements::{Capability, EngineConfig, Fallback, Feature, GateDescriptor, MembershipFailurePolicy, Plan};
use campusgate_observability::LogFormat;

#[derive(Parser, Debug)]
#[command(
    name = "campusgate",
    version,
    about = "Inspect plan/role catalogs and evaluate entitlement gates"
)]
struct Cli {
    /// JSON catalog document [env: CAMPUSGATE_CATALOG_PATH]
    #[arg(long, global = true, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// fail-open | propagate [env: CAMPUSGATE_MEMBERSHIP_FAILURES]
    #[arg(long, global = true, value_name = "POLICY")]
    membership_failures: Option<MembershipFailurePolicy>,

    /// json | pretty [env: CAMPUSGATE_LOG_FORMAT]
    #[arg(long, global = true, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the plan and role tables as JSON
    Catalog {
        /// Exit non-zero if a higher plan misses a lower plan's feature
        #[arg(long)]
        check: bool,
    },
    /// Resolve a user's effective entitlement against a seed file
    Resolve {
        #[arg(long, value_name = "FILE")]
        seed: PathBuf,
        #[arg(long, value_name = "UUID")]
        user: UserId,
    },
    /// Explain a gate decision for a user
    Gate {
        #[arg(long, value_name = "FILE")]
        seed: PathBuf,
        #[arg(long, value_name = "UUID")]
        user: UserId,
        #[arg(long)]
        capability: Option<Capability>,
        #[arg(long)]
        feature: Option<Feature>,
        #[arg(long, value_name = "PLAN")]
        needed_plan: Option<Plan>,
        /// What the UI would show on denial
        #[arg(long, value_enum, default_value_t = FallbackArg::Disable)]
        fallback: FallbackArg,
    },
    /// Print the cheapest plan that includes a feature
    MinPlan { feature: Feature },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FallbackArg {
    Hide,
    Disable,
    Replace,
}

impl From<FallbackArg> for Fallback {
    fn from(arg: FallbackArg) -> Self {
        match arg {
            FallbackArg::Hide => Fallback::Hide,
            FallbackArg::Disable => Fallback::Disable,
            FallbackArg::Replace => Fallback::Replace,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let log_format = match cli.log_format {
        Some(format) => format,
        None => LogFormat::from_env().unwrap_or_else(|err| {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }),
    };
    campusgate_observability::init(log_format);

    // Flags win over the environment.
    let mut config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid environment configuration");
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };
    if let Some(path) = cli.catalog {
        config.catalog_path = Some(path);
    }
    if let Some(policy) = cli.membership_failures {
        config.membership_failures = policy;
    }

    let result = match cli.command {
        Command::Catalog { check } => commands::catalog(&config, check),
        Command::Resolve { seed, user } => commands::resolve(&config, &seed, user).await,
        Command::Gate {
            seed,
            user,
            capability,
            feature,
            needed_plan,
            fallback,
        } => {
            let gate = GateDescriptor {
                capability,
                feature,
                needed_plan,
            };
            commands::gate(&config, &seed, user, &gate, fallback.into()).await
        }
        Command::MinPlan { feature } => commands::min_plan(&config, &feature),
    };

    match result {
        Ok(output) => {
            println!("{}", output.text);
            if !output.success {
                std::process::exit(2);
            }
        }
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "command failed");
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate_fallback(args: &[&str]) -> Fallback {
        let base = ["campusgate", "gate", "--seed", "seed.json", "--user", "0190b0a4-6d1e-7c3a-9b52-1f2e3d4c5b6a"];
        let cli = Cli::try_parse_from(base.iter().chain(args)).unwrap();
        match cli.command {
            Command::Gate { fallback, .. } => fallback.into(),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn fallback_defaults_to_disable() {
        assert_eq!(gate_fallback(&[]), Fallback::Disable);
    }

    #[test]
    fn fallback_accepts_each_variant() {
        assert_eq!(gate_fallback(&["--fallback", "hide"]), Fallback::Hide);
        assert_eq!(gate_fallback(&["--fallback", "replace"]), Fallback::Replace);
    }

    #[test]
    fn unknown_fallback_is_rejected() {
        let base = ["campusgate", "gate", "--seed", "s.json", "--user", "0190b0a4-6d1e-7c3a-9b52-1f2e3d4c5b6a"];
        assert!(Cli::try_parse_from(base.iter().chain(&["--fallback", "blink"])).is_err());
    }
}
