//! Command dispatch: bridges CLI args -> reconciler calls -> output formatting.

pub mod apply;
pub mod config_cmd;
pub mod plan;
pub mod refresh;
pub mod release;
pub mod show;
pub mod util;

use tokio_util::sync::CancellationToken;

use ipfence_core::Reconciler;

use crate::cli::{Command, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;

/// Dispatch an account-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    session: &Session,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let reconciler = Reconciler::new(&session.reconciler)?;
    let ctx = util::Context {
        reconciler: &reconciler,
        session,
        global,
        cancel,
    };

    match cmd {
        Command::Show(args) => show::handle(&ctx, args).await,
        Command::Plan(args) => plan::handle(&ctx, args).await,
        Command::Apply(args) => apply::handle(&ctx, args).await,
        Command::Refresh(args) => refresh::handle(&ctx, args).await,
        Command::Release(args) => release::handle(&ctx, args).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
