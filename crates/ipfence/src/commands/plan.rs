//! `plan`: what `apply` would do, without doing it.

use crate::cli::RulesArgs;
use crate::error::CliError;
use crate::output;

use super::util::{self, Context};

pub async fn handle(ctx: &Context<'_>, args: RulesArgs) -> Result<(), CliError> {
    let desired = util::desired_rules(&args.rules)?;
    let store = ctx.load_store()?;
    let tracked = store.get(&args.account_id).map(|entry| entry.rules.as_slice());

    let plan = ctx
        .reconciler
        .plan(&args.account_id, tracked, &desired, ctx.cancel)
        .await?;

    let color = output::should_color(ctx.global.color);
    let out = output::render_single(
        ctx.global.output,
        &plan,
        |p| output::render_plan(p, color),
        |p| {
            p.final_set
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n")
        },
    );
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}
