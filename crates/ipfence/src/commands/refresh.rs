//! `refresh`: resync tracked state with the remote account.

use ipfence_core::{Observation, TrackedAccount};

use crate::cli::AccountArgs;
use crate::error::CliError;
use crate::output;

use super::util::Context;

pub async fn handle(ctx: &Context<'_>, args: AccountArgs) -> Result<(), CliError> {
    let mut store = ctx.load_store()?;
    let Some(entry) = store.get(&args.account_id).cloned() else {
        output::notice(ctx.global, &format!("{} is not tracked", args.account_id));
        return Ok(());
    };

    let observation = ctx
        .reconciler
        .observe(&args.account_id, &entry.rules, ctx.cancel)
        .await?;

    match observation {
        Observation::Gone => {
            store.remove(&args.account_id);
            store.save()?;
            output::notice(
                ctx.global,
                &format!("{} no longer exists; stopped tracking it", args.account_id),
            );
        }
        Observation::Present {
            resource_id,
            tracked,
        } => {
            let dropped = entry.rules.len().saturating_sub(tracked.len());
            let refreshed = TrackedAccount::new(resource_id, tracked);
            let out = output::render_single(
                ctx.global.output,
                &refreshed,
                |t| {
                    let mut text = t
                        .rules
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("\n");
                    if dropped > 0 {
                        text.push_str(&format!("\n\n{dropped} tracked rule(s) no longer present"));
                    }
                    text
                },
                |t| {
                    t.rules
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("\n")
                },
            );
            store.put(args.account_id.clone(), refreshed);
            store.save()?;
            output::print_output(&out, ctx.global.quiet);
        }
    }
    Ok(())
}
