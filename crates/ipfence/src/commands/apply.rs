//! `apply`: reconcile, wait for Azure, then record the desired rules.

use ipfence_core::TrackedAccount;

use crate::cli::RulesArgs;
use crate::error::CliError;
use crate::output;

use super::util::{self, Context};

pub async fn handle(ctx: &Context<'_>, args: RulesArgs) -> Result<(), CliError> {
    let desired = util::desired_rules(&args.rules)?;
    let mut store = ctx.load_store()?;
    let tracked = store.get(&args.account_id).map(|entry| entry.rules.clone());
    if tracked.is_none() {
        tracing::info!(
            account_id = %args.account_id,
            profile = %ctx.session.profile_name,
            "account not tracked yet, only adding rules"
        );
    }

    let spinner = output::spinner(ctx.global, "Updating IP rules");
    let result = ctx
        .reconciler
        .apply(&args.account_id, tracked.as_deref(), &desired, ctx.cancel)
        .await;
    spinner.finish_and_clear();
    let outcome = result?;

    store.put(
        args.account_id.clone(),
        TrackedAccount::new(outcome.resource_id.clone(), desired),
    );
    store.save()?;

    let color = output::should_color(ctx.global.color);
    let out = output::render_single(
        ctx.global.output,
        &outcome,
        |o| {
            let mut text = output::render_plan(&o.plan, color);
            if o.changed {
                text.push_str("\n\nApplied.");
            }
            text
        },
        |o| {
            o.plan
                .final_set
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n")
        },
    );
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}
