use anyhow::Result;
use bazaro::cli::{actions, actions::Action, start, telemetry};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    // Start the program
    let (action, globals) = start()?;

    // Handle the action
    let result = match action {
        Action::Login => actions::login::handle(&globals).await,
        Action::Logout => actions::logout::handle(&globals).await,
        Action::Status { remote } => actions::status::handle(&globals, remote).await,
    };

    telemetry::shutdown_tracer();

    result
}
