use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use webpilot::cli::{parse_args, CliCommand, USAGE};
use webpilot::client::WebPilotClient;
use webpilot::models::RunRequest;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Logs go to stderr so stdout stays clean JSON for piping.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let command = match parse_args(std::env::args()) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
    };

    let args = match command {
        CliCommand::Version => {
            println!("webpilot {}", VERSION);
            return Ok(());
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        CliCommand::Run(args) => args,
    };

    let client = WebPilotClient::from_env();
    let request = RunRequest::new(args.url, args.goal).with_proxy(args.proxy);

    let outcome = if args.follow {
        client
            .run_with_events(&request, |event| {
                if let Ok(line) = serde_json::to_string(event) {
                    println!("{}", line);
                }
            })
            .await
    } else {
        client.run(&request).await
    };

    let success = outcome.is_success();
    match serde_json::to_string_pretty(&outcome) {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => eprintln!("Failed to render outcome: {}", e),
    }

    if !success {
        std::process::exit(1);
    }
    Ok(())
}
