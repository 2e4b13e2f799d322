use anyhow::Result;

use crate::cli::globals::GlobalArgs;

/// Handle the logout action. Always succeeds locally; the network leg is
/// best-effort.
pub async fn handle(globals: &GlobalArgs) -> Result<()> {
    let ctx = super::context(globals)?;

    let had_session = ctx.session.is_authenticated();
    ctx.flow.logout().await;

    if had_session {
        println!("Signed out.");
    } else {
        println!("No active session; local state cleared.");
    }

    Ok(())
}
