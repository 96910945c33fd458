//! `release`: give up management of an account.

use crate::cli::ReleaseArgs;
use crate::error::CliError;
use crate::output;

use super::util::Context;

pub async fn handle(ctx: &Context<'_>, args: ReleaseArgs) -> Result<(), CliError> {
    let mut store = ctx.load_store()?;
    let Some(entry) = store.get(&args.account_id).cloned() else {
        output::notice(ctx.global, &format!("{} is not tracked", args.account_id));
        return Ok(());
    };

    if !args.keep_remote {
        let spinner = output::spinner(ctx.global, "Removing managed IP rules");
        let result = ctx
            .reconciler
            .release(&args.account_id, &entry.rules, ctx.cancel)
            .await;
        spinner.finish_and_clear();

        match result {
            Ok(outcome) => {
                let color = output::should_color(ctx.global.color);
                let out = output::render_single(
                    ctx.global.output,
                    &outcome,
                    |o| output::render_plan(&o.plan, color),
                    |o| {
                        o.plan
                            .to_remove
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join("\n")
                    },
                );
                output::print_output(&out, ctx.global.quiet);
            }
            // Nothing left to clean up remotely.
            Err(e) if e.is_not_found() => {
                tracing::info!(account_id = %args.account_id, "account already gone");
            }
            Err(e) => return Err(e.into()),
        }
    }

    store.remove(&args.account_id);
    store.save()?;
    output::notice(ctx.global, &format!("Stopped tracking {}", args.account_id));
    Ok(())
}
