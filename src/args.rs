//! Command-line argument parsing (spec.md §6 "CLI surface").

use std::path::PathBuf;

const DEFAULT_CONFIG_PATH: &str = "config/config.json";

/// Parsed result of the command line.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the controller normally.
    Run { config_path: PathBuf, force_web: bool },
    /// Print help text and exit 0.
    ShowHelp,
    /// Print version and exit 0.
    ShowVersion,
    /// Unknown flag or missing value; print usage and exit 1.
    ShowHelpDueToError { message: String },
}

pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse an argument iterator (typically `std::env::args()`).
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args.into_iter().skip(1).map(|s| s.as_ref().to_string()).collect();

        let mut config_path: Option<String> = None;
        let mut force_web = false;
        let mut idx = 0;

        while idx < args_vec.len() {
            match args_vec[idx].as_str() {
                "--help" | "-h" => return ParsedArgs { action: CliAction::ShowHelp },
                "--version" | "-V" => return ParsedArgs { action: CliAction::ShowVersion },
                "--web" => {
                    force_web = true;
                    idx += 1;
                }
                "--config" | "-c" => match args_vec.get(idx + 1) {
                    Some(value) => {
                        config_path = Some(value.clone());
                        idx += 2;
                    }
                    None => {
                        return ParsedArgs {
                            action: CliAction::ShowHelpDueToError { message: "--config requires a path argument".to_string() },
                        };
                    }
                },
                other => {
                    return ParsedArgs {
                        action: CliAction::ShowHelpDueToError { message: format!("unrecognized argument '{other}'") },
                    };
                }
            }
        }

        ParsedArgs {
            action: CliAction::Run {
                config_path: PathBuf::from(config_path.unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())),
                force_web,
            },
        }
    }
}

pub fn help_text() -> String {
    format!(
        "hydro-scheduler {}\n\n\
         Scheduling and adaptation engine for a flood/drain irrigation controller.\n\n\
         USAGE:\n    hydro-scheduler [OPTIONS]\n\n\
         OPTIONS:\n    \
         -c, --config <PATH>    Path to the configuration file (default: {DEFAULT_CONFIG_PATH})\n    \
         --web                  Force-enable the control surface regardless of file setting\n    \
         -h, --help             Print this help and exit\n    \
         -V, --version          Print version and exit\n",
        env!("CARGO_PKG_VERSION")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_standard_config_path() {
        let parsed = ParsedArgs::parse(["hydro-scheduler"]);
        assert_eq!(parsed.action, CliAction::Run { config_path: PathBuf::from(DEFAULT_CONFIG_PATH), force_web: false });
    }

    #[test]
    fn accepts_explicit_config_path() {
        let parsed = ParsedArgs::parse(["hydro-scheduler", "--config", "/etc/hydro/config.json"]);
        assert_eq!(parsed.action, CliAction::Run { config_path: PathBuf::from("/etc/hydro/config.json"), force_web: false });
    }

    #[test]
    fn recognizes_web_flag() {
        let parsed = ParsedArgs::parse(["hydro-scheduler", "--web"]);
        assert_eq!(parsed.action, CliAction::Run { config_path: PathBuf::from(DEFAULT_CONFIG_PATH), force_web: true });
    }

    #[test]
    fn help_flag_short_circuits() {
        let parsed = ParsedArgs::parse(["hydro-scheduler", "--config", "x.json", "--help"]);
        assert_eq!(parsed.action, CliAction::ShowHelp);
    }

    #[test]
    fn missing_config_value_is_an_error() {
        let parsed = ParsedArgs::parse(["hydro-scheduler", "--config"]);
        assert!(matches!(parsed.action, CliAction::ShowHelpDueToError { .. }));
    }

    #[test]
    fn unknown_flag_is_an_error() {
        let parsed = ParsedArgs::parse(["hydro-scheduler", "--bogus"]);
        assert!(matches!(parsed.action, CliAction::ShowHelpDueToError { .. }));
    }
}
