//! `show`: the account as Azure sees it, with tracked rules marked.

use serde::Serialize;
use tabled::Tabled;

use ipfence_core::{AccountState, PublicNetworkAccess};

use crate::cli::AccountArgs;
use crate::error::CliError;
use crate::output;

use super::util::Context;

// ── Report ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountReport {
    id: String,
    public_network_access: PublicNetworkAccess,
    rules: Vec<RuleReport>,
}

#[derive(Debug, Serialize)]
struct RuleReport {
    address: String,
    managed: bool,
}

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "Rule")]
    address: String,
    #[tabled(rename = "Managed")]
    managed: String,
}

impl From<&RuleReport> for RuleRow {
    fn from(r: &RuleReport) -> Self {
        Self {
            address: r.address.clone(),
            managed: if r.managed { "yes".into() } else { String::new() },
        }
    }
}

fn build_report(account: AccountState, tracked: &[ipfence_core::IpRule]) -> AccountReport {
    let rules = account
        .ip_rules
        .iter()
        .filter(|r| !r.is_sentinel())
        .map(|r| RuleReport {
            address: r.to_string(),
            managed: tracked.contains(r),
        })
        .collect();
    AccountReport {
        id: account.id,
        public_network_access: account.public_network_access,
        rules,
    }
}

fn detail(report: &AccountReport) -> String {
    let mut out = format!(
        "Account:               {}\nPublic network access: {}\n",
        report.id, report.public_network_access
    );
    if report.rules.is_empty() {
        out.push_str("IP rules:              none (publicly reachable)");
    } else {
        out.push('\n');
        out.push_str(&output::render_list(
            crate::cli::OutputFormat::Table,
            &report.rules,
            |r| RuleRow::from(r),
            |r| r.address.clone(),
        ));
    }
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context<'_>, args: AccountArgs) -> Result<(), CliError> {
    let store = ctx.load_store()?;
    let tracked = store
        .get(&args.account_id)
        .map(|entry| entry.rules.clone())
        .unwrap_or_default();

    let account = ctx.reconciler.read(&args.account_id, ctx.cancel).await?;
    let report = build_report(account, &tracked);

    let out = output::render_single(ctx.global.output, &report, detail, |r| {
        r.rules
            .iter()
            .map(|rule| rule.address.clone())
            .collect::<Vec<_>>()
            .join("\n")
    });
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}
