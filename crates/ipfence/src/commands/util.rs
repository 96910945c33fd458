//! Shared helpers for command handlers.

use tokio_util::sync::CancellationToken;

use ipfence_core::{IpRule, Reconciler, StateStore, reconcile};

use crate::cli::GlobalOpts;
use crate::config::Session;
use crate::error::CliError;

/// Everything a handler needs besides its own arguments.
pub struct Context<'a> {
    pub reconciler: &'a Reconciler,
    pub session: &'a Session,
    pub global: &'a GlobalOpts,
    pub cancel: &'a CancellationToken,
}

impl Context<'_> {
    pub fn load_store(&self) -> Result<StateStore, CliError> {
        Ok(StateStore::load(&self.session.state_path)?)
    }
}

/// Turn `--rule` values into the desired rule list.
pub fn desired_rules(raw: &[String]) -> Result<Vec<IpRule>, CliError> {
    let mut rules = Vec::with_capacity(raw.len());
    for value in raw {
        let value = value.trim();
        if value.chars().any(char::is_whitespace) {
            return Err(CliError::Validation {
                field: "rule".into(),
                reason: format!("{value:?} contains whitespace"),
            });
        }
        rules.push(IpRule::new(value));
    }
    Ok(reconcile::normalize(&rules))
}
