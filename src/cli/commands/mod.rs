use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("bazaro")
        .about("Food marketplace admin console")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("api-url")
                .short('u')
                .long("api-url")
                .help("Base URL of the marketplace API")
                .default_value("http://localhost:8080")
                .env("BAZARO_API_URL")
                .global(true),
        )
        .arg(
            Arg::new("state-dir")
                .long("state-dir")
                .help("Directory holding the persisted session state")
                .env("BAZARO_STATE_DIR")
                .global(true),
        )
        .arg(
            Arg::new("ephemeral")
                .long("ephemeral")
                .help("Keep the session in memory only, nothing on disk")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("BAZARO_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(Command::new("login").about("Sign in and open the admin console"))
        .subcommand(Command::new("logout").about("Sign out and clear the stored session"))
        .subcommand(
            Command::new("status")
                .about("Report the stored session state")
                .arg(
                    Arg::new("remote")
                        .long("remote")
                        .help("Also ask the API whether it still accepts the token")
                        .action(ArgAction::SetTrue),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "bazaro");
        assert_eq!(
            command.get_about().unwrap().to_string(),
            "Food marketplace admin console"
        );
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_check_api_url_and_subcommand() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "bazaro",
            "--api-url",
            "https://api.bazaro.dev",
            "status",
            "--remote",
        ]);

        assert_eq!(
            matches.get_one::<String>("api-url").map(|s| s.to_string()),
            Some("https://api.bazaro.dev".to_string())
        );

        let (name, sub) = matches.subcommand().expect("missing subcommand");
        assert_eq!(name, "status");
        assert!(sub.get_flag("remote"));
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("BAZARO_API_URL", Some("https://api.bazaro.dev")),
                ("BAZARO_STATE_DIR", Some("/tmp/bazaro-state")),
                ("BAZARO_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["bazaro", "login"]);

                assert_eq!(
                    matches.get_one::<String>("api-url").map(|s| s.to_string()),
                    Some("https://api.bazaro.dev".to_string())
                );
                assert_eq!(
                    matches
                        .get_one::<String>("state-dir")
                        .map(|s| s.to_string()),
                    Some("/tmp/bazaro-state".to_string())
                );
                assert_eq!(matches.get_one::<u8>("verbosity").map(|s| *s), Some(2));
                assert_eq!(matches.subcommand_name(), Some("login"));
            },
        );
    }

    #[test]
    fn test_default_api_url() {
        temp_env::with_vars([("BAZARO_API_URL", None::<String>)], || {
            let command = new();
            let matches = command.get_matches_from(vec!["bazaro", "status"]);
            assert_eq!(
                matches.get_one::<String>("api-url").map(|s| s.to_string()),
                Some("http://localhost:8080".to_string())
            );
            assert!(!matches.get_flag("ephemeral"));
        });
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("BAZARO_LOG_LEVEL", Some(level))], || {
                let command = new();
                let matches = command.get_matches_from(vec!["bazaro", "status"]);
                assert_eq!(
                    matches.get_one::<u8>("verbosity").map(|s| *s),
                    Some(index as u8)
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("BAZARO_LOG_LEVEL", None::<String>)], || {
                let mut args = vec!["bazaro".to_string()];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }
                args.push("status".to_string());

                let command = new();
                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>("verbosity").map(|s| *s),
                    Some(index as u8)
                );
            });
        }
    }
}
