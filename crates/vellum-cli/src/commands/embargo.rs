//! Embargo commands: check, set and lift.

use std::path::Path;

use anyhow::Result;
use vellum_authz::{Context, PolicyEvaluator};
use vellum_config::VellumConfig;
use vellum_embargo::EmbargoService;
use vellum_policy::ResourcePolicy;
use vellum_types::DsoRef;

use super::context;
use crate::snapshot::Repository;
use crate::{ActorArgs, Format};

/// Report READ grants that bypass an item's embargo.
pub fn check(config: &VellumConfig, snapshot: &Path, item: u64, format: Format) -> Result<()> {
    let repo = Repository::open(snapshot)?;
    let violations = with_embargo(&repo, config, |embargo| {
        embargo.check_embargo(&Context::anonymous(), DsoRef::item(item))
    })?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&violations)?),
        Format::Text if violations.is_empty() => println!("item {item}: no open READ grants"),
        Format::Text => {
            for violation in &violations {
                println!("item {item}: {violation}");
            }
        }
    }
    Ok(())
}

/// Embargo an item according to its terms.
pub fn set(
    config: &VellumConfig,
    snapshot: &Path,
    item: u64,
    terms: &str,
    actor: &ActorArgs,
    write: bool,
    format: Format,
) -> Result<()> {
    let repo = Repository::open(snapshot)?;
    let outcome = with_embargo(&repo, config, |embargo| {
        embargo.set_embargo(&context(actor), DsoRef::item(item), Some(terms))
    })?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        Format::Text => match outcome.lift {
            Some(lift) => {
                println!("item {item}: embargoed until {lift}");
                print_policies(&outcome.policies);
            }
            None => println!("item {item}: no embargo terms, nothing written"),
        },
    }
    save_if(write, &repo, snapshot)
}

/// Lift an item's embargo.
pub fn lift(
    config: &VellumConfig,
    snapshot: &Path,
    item: u64,
    actor: &ActorArgs,
    write: bool,
    format: Format,
) -> Result<()> {
    let repo = Repository::open(snapshot)?;
    let outcome = with_embargo(&repo, config, |embargo| {
        embargo.lift_embargo(&context(actor), DsoRef::item(item))
    })?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        Format::Text => {
            println!("item {item}: embargo lifted");
            print_policies(&outcome.policies);
        }
    }
    save_if(write, &repo, snapshot)
}

fn with_embargo<T>(
    repo: &Repository,
    config: &VellumConfig,
    f: impl FnOnce(&EmbargoService<'_>) -> vellum_embargo::Result<T>,
) -> Result<T> {
    let evaluator = PolicyEvaluator::new(&repo.store, &repo.graph, &repo.groups);
    let embargo = EmbargoService::new(
        &repo.store,
        &repo.graph,
        &evaluator,
        &config.authorization,
        &config.embargo,
    );
    Ok(f(&embargo)?)
}

fn print_policies(policies: &[ResourcePolicy]) {
    for policy in policies {
        let until = policy
            .end_date()
            .map_or_else(|| "open-ended".to_string(), |d| format!("until {d}"));
        println!(
            "  policy {}: {} on {} for {} ({until})",
            policy.id(),
            policy.action(),
            policy.resource(),
            policy.principal()
        );
    }
}

fn save_if(write: bool, repo: &Repository, snapshot: &Path) -> Result<()> {
    if write {
        repo.save(snapshot)?;
        tracing::info!(path = %snapshot.display(), "snapshot written");
    }
    Ok(())
}
