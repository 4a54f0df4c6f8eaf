use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use clap::Parser;
use log::LevelFilter;

use schema_export_lib::api::HttpExportClient;
use schema_export_lib::config::{self, ProbeConfig};
use schema_export_lib::probe::{self, ProbeOutcome};

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the export service
    #[arg(long, env = "SCHEMA_EXPORT_BASE_URL", default_value = config::DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(short, long, env = "SCHEMA_EXPORT_USERNAME", default_value = config::DEFAULT_USERNAME)]
    username: String,

    #[arg(short, long, env = "SCHEMA_EXPORT_PASSWORD", default_value = config::DEFAULT_PASSWORD)]
    password: String,

    /// Project whose newest version is exported
    #[arg(long, env = "SCHEMA_EXPORT_PROJECT_ID", default_value_t = config::DEFAULT_PROJECT_ID)]
    project_id: i64,

    /// File the exported SQL is written to
    #[arg(short, long, env = "SCHEMA_EXPORT_OUTPUT", default_value = config::DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Request timeout in seconds
    #[arg(long, env = "SCHEMA_EXPORT_TIMEOUT", default_value_t = config::DEFAULT_REQUEST_TIMEOUT_SECS)]
    timeout: u64,

    /// Also fetch and check the stored structure of this version
    #[arg(long, env = "SCHEMA_EXPORT_STRUCTURE_VERSION")]
    structure_version: Option<i64>,

    /// Print the rendered mock script
    #[arg(long)]
    show_script: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "RUST_LOG")]
    log_level: Option<String>,
}

impl Args {
    fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            base_url: self.base_url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            project_id: self.project_id,
            output_path: self.output.clone(),
            request_timeout_secs: self.timeout,
            structure_version_id: self.structure_version,
        }
    }
}

fn print_outcome(outcome: &ProbeOutcome, show_script: bool) {
    println!("Login succeeded, token: {}...", outcome.token_prefix);

    println!("\n=== MySQL SQL export ===");
    match &outcome.export {
        Some(saved) => {
            println!(
                "Version {} ({}), {} bytes",
                saved.version_id, saved.version_name, saved.bytes
            );
            println!("{}", "=".repeat(50));
            println!("{}", saved.preview);
            println!("{}", "=".repeat(50));
            println!("SQL saved to {}", saved.path.display());
        }
        None => println!("No export saved"),
    }

    for check in outcome.checks() {
        println!("\n=== {} ({}) ===", check.label, check.engine);
        print!("{}", check.report);
        if show_script {
            println!("\n{}", check.script);
        }
        if check.passed() {
            println!("\nRendered script follows the plan");
        } else {
            for problem in &check.problems {
                println!("  ! {}", problem);
            }
            for problem in &check.validation {
                println!("  ! {}", problem);
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(
            args.log_level
                .as_deref()
                .and_then(|l| LevelFilter::from_str(l).ok())
                .unwrap_or(LevelFilter::Info),
        )
        .init();

    let config = args.probe_config();
    let mut client = match HttpExportClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match probe::run(&mut client, &config).await {
        Ok(outcome) => {
            print_outcome(&outcome, args.show_script);
            println!("\nProbe finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
