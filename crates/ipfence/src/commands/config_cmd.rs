//! Config subcommand handlers.

use std::fmt::Write as _;

use ipfence_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Format config for display, masking secrets.
fn format_config_redacted(cfg: &Config, active: &str) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out, "# active profile: {active}");
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "poll_interval = {}", cfg.defaults.poll_interval);
    if let Some(ref state) = cfg.defaults.state_file {
        let _ = writeln!(out, "state_file = \"{}\"", state.display());
    }

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        if let Some(ref v) = p.tenant_id {
            let _ = writeln!(out, "tenant_id = \"{v}\"");
        }
        if let Some(ref v) = p.client_id {
            let _ = writeln!(out, "client_id = \"{v}\"");
        }
        if p.client_secret.is_some() {
            let _ = writeln!(out, "client_secret = \"****\"");
        }
        if let Some(ref v) = p.client_secret_env {
            let _ = writeln!(out, "client_secret_env = \"{v}\"");
        }
        if let Some(ref v) = p.management_endpoint {
            let _ = writeln!(out, "management_endpoint = \"{v}\"");
        }
        if let Some(ref v) = p.authority {
            let _ = writeln!(out, "authority = \"{v}\"");
        }
        if let Some(ref v) = p.api_version {
            let _ = writeln!(out, "api_version = \"{v}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(interval) = p.poll_interval {
            let _ = writeln!(out, "poll_interval = {interval}");
        }
        if let Some(ref state) = p.state_file {
            let _ = writeln!(out, "state_file = \"{}\"", state.display());
        }
    }

    out.trim_end().to_owned()
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let active = cfg.active_profile_name(global.profile.as_deref());
            let state = config::resolve_state_path(global, &cfg)?;

            let mut text = format_config_redacted(&cfg, &active);
            let _ = write!(text, "\n\n# state file: {}", state.display());
            output::print_output(&text, global.quiet);
            Ok(())
        }
    }
}
