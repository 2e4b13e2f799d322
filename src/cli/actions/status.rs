use anyhow::Result;

use super::Context;
use crate::api::AuthApi;
use crate::cli::globals::GlobalArgs;
use crate::session::{Page, PageGuard};

/// Handle the status action: report the guard decision for a protected
/// page, optionally double-checking the token with the API.
pub async fn handle(globals: &GlobalArgs, remote: bool) -> Result<()> {
    let ctx = super::context(globals)?;

    match ctx.session.guard_page(Page::Dashboard) {
        PageGuard::RedirectToLogin => {
            println!("Not authenticated. Run `bazaro login`.");
        }
        PageGuard::Stay { user: Some(user) } => {
            let role = user.role.map(|role| format!(" ({role})")).unwrap_or_default();
            println!(
                "Authenticated as {} <{}>{role}.",
                user.name.unwrap_or_default(),
                user.email.unwrap_or_default()
            );
            if remote {
                validate_remote(&ctx).await;
            }
        }
        _ => {}
    }

    Ok(())
}

async fn validate_remote(ctx: &Context) {
    let Some(token) = ctx.session.token() else {
        return;
    };

    match ctx.api.validate(&token).await {
        Ok(()) => println!("The API accepts the stored token."),
        Err(err) if err.is_unauthorized() => {
            // the server has the final word on the token
            ctx.session.clear_session();
            println!("The API rejected the token; session cleared. Run `bazaro login`.");
        }
        Err(err) => println!("Could not validate remotely: {err}"),
    }
}
