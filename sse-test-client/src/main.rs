use anyhow::Result;
use clap::Parser;
use colored::*;

mod api_client;
mod output;
mod scenarios;
mod sse_client;

use api_client::ApiClient;
use output::{print_test_summary, TestResult};

#[derive(Parser)]
#[command(name = "sse-test-client")]
#[command(about = "SSE Integration Testing Tool")]
struct Cli {
    /// Base URL of the push relay (e.g., http://localhost:5000)
    #[arg(long)]
    base_url: String,

    /// Test scenario to run
    #[arg(long, value_enum)]
    scenario: ScenarioChoice,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone)]
enum ScenarioChoice {
    /// Open a stream and check the server counts it
    ConnectionTest,
    /// Send a message and check it arrives on the right stream
    Delivery,
    /// Open two streams for one id and check the first is closed
    Supersede,
    /// Send to an id with no stream
    UnknownRecipient,
    /// Drop a stream and check the server forgets it
    Disconnect,
    /// Keep a stream open while the server is stopped by hand (not part of `all`)
    Shutdown,
    /// Run every automatic scenario
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    let api_client = ApiClient::new(reqwest::Client::new(), cli.base_url.clone());
    let base_url = cli.base_url.as_str();

    println!("\n{}", "=== TEST PHASE ===".bright_white().bold());

    let mut results: Vec<TestResult> = Vec::new();

    match cli.scenario {
        ScenarioChoice::ConnectionTest => {
            results.push(scenarios::test_connection(base_url, &api_client).await?);
        }
        ScenarioChoice::Delivery => {
            results.push(scenarios::test_delivery(base_url, &api_client).await?);
        }
        ScenarioChoice::Supersede => {
            results.push(scenarios::test_supersede(base_url, &api_client).await?);
        }
        ScenarioChoice::UnknownRecipient => {
            results.push(scenarios::test_unknown_recipient(&api_client).await?);
        }
        ScenarioChoice::Disconnect => {
            results.push(scenarios::test_disconnect(base_url, &api_client).await?);
        }
        ScenarioChoice::Shutdown => {
            results.push(scenarios::test_shutdown(base_url).await?);
        }
        ScenarioChoice::All => {
            results.push(scenarios::test_connection(base_url, &api_client).await?);
            results.push(scenarios::test_delivery(base_url, &api_client).await?);
            results.push(scenarios::test_supersede(base_url, &api_client).await?);
            results.push(scenarios::test_unknown_recipient(&api_client).await?);
            results.push(scenarios::test_disconnect(base_url, &api_client).await?);
        }
    }

    println!("\n{}", "=== RESULTS ===".bright_white().bold());
    print_test_summary(&results);

    let all_passed = results.iter().all(|r| r.passed);

    if all_passed {
        println!("\n{}", "All tests passed! ✓".bright_green().bold());
    } else {
        println!("\n{}", "Some tests failed! ✗".bright_red().bold());
    }

    std::process::exit(if all_passed { 0 } else { 1 });
}
