use std::path::PathBuf;

use anyhow::Result;

use crate::cli::{actions::Action, globals::GlobalArgs};

pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let api_url = matches
        .get_one("api-url")
        .map(|s: &String| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("missing required argument: --api-url"))?;

    let mut globals = GlobalArgs::new(api_url);
    globals.state_dir = matches
        .get_one("state-dir")
        .map(|s: &String| PathBuf::from(s));
    globals.ephemeral = matches.get_flag("ephemeral");

    let action = match matches.subcommand() {
        Some(("login", _)) => Action::Login,
        Some(("logout", _)) => Action::Logout,
        Some(("status", sub)) => Action::Status {
            remote: sub.get_flag("remote"),
        },
        _ => return Err(anyhow::anyhow!("missing subcommand")),
    };

    Ok((action, globals))
}
