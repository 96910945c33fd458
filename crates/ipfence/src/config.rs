//! Bridges `GlobalOpts` onto ipfence-config: picks the profile, applies
//! flag overrides, and produces everything a command needs to run.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use ipfence_config::{Config, CredentialOverrides, Defaults, Profile};
use ipfence_core::ReconcilerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolved inputs for one command invocation.
#[derive(Debug)]
pub struct Session {
    pub profile_name: String,
    pub reconciler: ReconcilerConfig,
    pub state_path: PathBuf,
}

pub use ipfence_config::{config_path, load_config};

/// Credential overrides taken from flags. `ARM_*` variables are read later,
/// after the profile.
fn overrides(global: &GlobalOpts) -> CredentialOverrides {
    CredentialOverrides {
        tenant_id: global.tenant_id.clone(),
        client_id: global.client_id.clone(),
        client_secret: global.client_secret.clone().map(SecretString::from),
    }
}

/// Where tracked state lives: flag, then profile, then defaults.
pub fn resolve_state_path(global: &GlobalOpts, cfg: &Config) -> Result<PathBuf, CliError> {
    let profile_name = cfg.active_profile_name(global.profile.as_deref());
    let profile = cfg.profile(&profile_name)?;
    Ok(state_path_for(global, &profile, &cfg.defaults))
}

fn state_path_for(global: &GlobalOpts, profile: &Profile, defaults: &Defaults) -> PathBuf {
    global
        .state_file
        .clone()
        .unwrap_or_else(|| ipfence_config::state_path(profile, defaults))
}

/// Load config and resolve the active profile into a [`Session`].
pub fn resolve_session(global: &GlobalOpts) -> Result<Session, CliError> {
    let cfg = load_config()?;
    let profile_name = cfg.active_profile_name(global.profile.as_deref());
    let profile = cfg.profile(&profile_name)?;

    let credentials =
        ipfence_config::resolve_credentials(&profile, &profile_name, &overrides(global))?;
    let mut reconciler =
        ipfence_config::profile_to_reconciler_config(&profile, &cfg.defaults, credentials)?;
    if let Some(secs) = global.timeout {
        reconciler.timeout = Duration::from_secs(secs);
    }

    let state_path = state_path_for(global, &profile, &cfg.defaults);

    tracing::debug!(
        profile = %profile_name,
        state = %state_path.display(),
        endpoint = %reconciler.management_endpoint,
        "resolved session"
    );

    Ok(Session {
        profile_name,
        reconciler,
        state_path,
    })
}
