//! Command-line argument parsing for the `webpilot` binary.

/// Usage text printed for `--help` and argument errors.
pub const USAGE: &str = "\
Usage: webpilot [OPTIONS] <URL> <GOAL>

Run a WebPilot automation task and print its outcome as JSON.

Arguments:
  <URL>    Page the agent should operate on
  <GOAL>   What the agent should accomplish, in plain language

Options:
      --follow     Print every stream event as a JSON line while running
      --proxy      Route the remote browser session through a proxy
  -V, --version    Print version information
  -h, --help       Print this help

Environment:
  WEBPILOT_API_KEY    API key (required)
  WEBPILOT_BASE_URL   Override the API endpoint";

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Submit an automation run
    Run(RunArgs),
}

/// Arguments for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunArgs {
    pub url: String,
    pub goal: String,
    pub proxy: bool,
    pub follow: bool,
}

/// Parse command-line arguments.
///
/// `--version` and `--help` win over everything else; otherwise exactly
/// two positional arguments (url, goal) are required.
pub fn parse_args<I>(args: I) -> Result<CliCommand, String>
where
    I: Iterator<Item = String>,
{
    let mut positional = Vec::new();
    let mut proxy = false;
    let mut follow = false;

    for arg in args.skip(1) {
        // Skip the program name
        match arg.as_str() {
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--proxy" => proxy = true,
            "--follow" => follow = true,
            flag if flag.starts_with('-') => {
                return Err(format!("unknown option '{}'\n\n{}", flag, USAGE));
            }
            _ => positional.push(arg),
        }
    }

    match positional.len() {
        2 => {
            let mut positional = positional.into_iter();
            Ok(CliCommand::Run(RunArgs {
                url: positional.next().unwrap_or_default(),
                goal: positional.next().unwrap_or_default(),
                proxy,
                follow,
            }))
        }
        n if n < 2 => Err(format!("missing <URL> and <GOAL>\n\n{}", USAGE)),
        _ => Err(format!("too many arguments\n\n{}", USAGE)),
    }
}
