use std::io::Write;

use anyhow::{anyhow, Result};
use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use super::Context;
use crate::cli::{globals::GlobalArgs, notice::Notices};
use crate::flow::{valid_code, FlowOutcome, FlowState};
use crate::session::{Page, PageGuard};

/// Handle the login action: run the two-step handshake, then hold the
/// authenticated console open until the user signs out or goes idle.
pub async fn handle(globals: &GlobalArgs) -> Result<()> {
    let ctx = super::context(globals)?;
    let notices = Notices::new();

    if ctx.session.guard_page(Page::Login) == PageGuard::RedirectToDashboard {
        let user = ctx.session.user_display();
        println!(
            "Already signed in as {} <{}>.",
            user.name.unwrap_or_default(),
            user.email.unwrap_or_default()
        );
        return console(&ctx, &notices).await;
    }

    let mut reader = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match ctx.flow.state() {
            FlowState::AwaitingCredentials => {
                let email = prompt_line(&mut reader, "Email: ").await?;
                let password = SecretString::from(
                    tokio::task::spawn_blocking(|| rpassword::prompt_password("Password: "))
                        .await??,
                );

                match ctx.flow.submit_credentials(&email, &password).await {
                    FlowOutcome::Success { message, .. } => {
                        notices.set(&message);
                        println!("{message}");
                    }
                    FlowOutcome::VerificationRequired { message } => println!("{message}"),
                    FlowOutcome::Failure { message } => println!("{message}"),
                }
            }
            FlowState::AwaitingCode { email } => {
                println!("A 6-character code was sent to {email}. Type 'back' to start over.");
                let code = prompt_line(&mut reader, "Code: ").await?;

                if code.eq_ignore_ascii_case("back") {
                    ctx.flow.cancel_verification();
                    continue;
                }
                if !valid_code(&code) {
                    println!("The code must be exactly 6 characters");
                    continue;
                }

                match ctx.flow.submit_code(&code).await {
                    FlowOutcome::Success { message, .. } => {
                        notices.set(&message);
                        println!("{message}");
                    }
                    FlowOutcome::VerificationRequired { message }
                    | FlowOutcome::Failure { message } => println!("{message}"),
                }
            }
            FlowState::Authenticated => break,
        }
    }

    console(&ctx, &notices).await
}

/// The authenticated console. Every line of input counts as activity;
/// an hour without any closes the session from under us.
async fn console(ctx: &Context, notices: &Notices) -> Result<()> {
    ctx.session.arm_monitors();
    let mut state_rx = ctx.session.subscribe();

    println!("Commands: status, logout, quit.");
    let mut reader = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                if !*state_rx.borrow_and_update() {
                    println!("Session closed.");
                    break;
                }
            }
            line = reader.next_line() => {
                let Some(line) = line? else { break };
                ctx.session.record_activity();

                match line.trim() {
                    "" => {}
                    "status" => {
                        if let Some(notice) = notices.current() {
                            println!("{notice}");
                        }
                        let user = ctx.session.user_display();
                        let role = user.role.map(|role| format!(" ({role})")).unwrap_or_default();
                        println!(
                            "Signed in as {} <{}>{role}.",
                            user.name.unwrap_or_default(),
                            user.email.unwrap_or_default()
                        );
                    }
                    "logout" => {
                        ctx.flow.logout().await;
                        println!("Signed out.");
                        break;
                    }
                    "quit" | "exit" => break,
                    other => println!("Unknown command {other:?}. Commands: status, logout, quit."),
                }
            }
        }
    }

    Ok(())
}

async fn prompt_line(reader: &mut Lines<BufReader<Stdin>>, prompt: &str) -> Result<String> {
    print!("{prompt}");
    std::io::stdout().flush()?;

    let line = reader
        .next_line()
        .await?
        .ok_or_else(|| anyhow!("input closed"))?;
    Ok(line.trim().to_string())
}
