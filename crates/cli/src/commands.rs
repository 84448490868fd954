//! Subcommand implementations. Each returns the text to print so tests can
//! check output without spawning the binary.

use std::path::Path;

use anyhow::Context;
use serde_json::json;

use campusgate_core::UserId;
use campusgate_entitlements::{
    CatalogConfig, Catalogs, EffectiveEntitlement, EngineConfig, EntitlementResolver, Fallback, Feature,
    GateConsumer, GateDescriptor, explain,
};
use campusgate_infra::SeedFile;

pub struct Output {
    pub text: String,
    /// `false` makes the binary exit with status 2 (check failed / gate denied).
    pub success: bool,
}

impl Output {
    fn ok(value: serde_json::Value) -> anyhow::Result<Self> {
        Ok(Self {
            text: serde_json::to_string_pretty(&value)?,
            success: true,
        })
    }
}

pub fn catalog(config: &EngineConfig, check: bool) -> anyhow::Result<Output> {
    let catalogs = config.load_catalogs().context("loading catalogs")?;
    let document = CatalogConfig::from_catalogs(&catalogs.plans, &catalogs.roles);

    if !check {
        return Output::ok(serde_json::to_value(document)?);
    }

    let violations = catalogs.plans.superset_violations();
    Ok(Output {
        text: serde_json::to_string_pretty(&json!({
            "superset_ok": violations.is_empty(),
            "violations": violations,
        }))?,
        success: violations.is_empty(),
    })
}

pub async fn resolve(config: &EngineConfig, seed: &Path, user: UserId) -> anyhow::Result<Output> {
    let catalogs = config.load_catalogs().context("loading catalogs")?;
    let entitlement = resolve_from_seed(config, catalogs, seed, user).await?;
    Output::ok(serde_json::to_value(entitlement)?)
}

pub async fn gate(
    config: &EngineConfig,
    seed: &Path,
    user: UserId,
    gate: &GateDescriptor,
    fallback: Fallback,
) -> anyhow::Result<Output> {
    if gate.is_open() {
        tracing::warn!("gate has no constraints and will always allow");
    }

    let catalogs = config.load_catalogs().context("loading catalogs")?;
    let consumer = GateConsumer::new(catalogs.plans.clone());
    let entitlement = resolve_from_seed(config, catalogs, seed, user).await?;

    let explanation = explain(&entitlement, gate);
    let render = consumer.decide(&entitlement, gate, fallback);
    let hint = render.hint().map(ToString::to_string);

    Ok(Output {
        success: explanation.allowed,
        text: serde_json::to_string_pretty(&json!({
            "explanation": explanation,
            "render": render,
            "hint": hint,
        }))?,
    })
}

pub fn min_plan(config: &EngineConfig, feature: &Feature) -> anyhow::Result<Output> {
    let catalogs = config.load_catalogs().context("loading catalogs")?;
    let plan = catalogs.plans.minimum_plan_for(feature);
    Ok(Output {
        text: plan.map_or_else(|| "none".to_string(), |p| p.to_string()),
        success: plan.is_some(),
    })
}

async fn resolve_from_seed(
    config: &EngineConfig,
    catalogs: Catalogs,
    seed: &Path,
    user: UserId,
) -> anyhow::Result<EffectiveEntitlement> {
    let (directory, overrides) = SeedFile::load(seed)?.into_stores();
    let resolver =
        EntitlementResolver::new(catalogs, directory, overrides).with_failure_policy(config.membership_failures);

    resolver
        .resolve(user)
        .await
        .with_context(|| format!("resolving entitlement for user {user}"))
}
