use anyhow::Result;
use colored::*;
use reqwest::StatusCode;
use std::time::{Duration, Instant};

use crate::api_client::ApiClient;
use crate::output::{print_event, TestResult};
use crate::sse_client::Connection;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(60);

fn new_client_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

/// A stream opens and the server counts it.
pub async fn test_connection(base_url: &str, api_client: &ApiClient) -> Result<TestResult> {
    let start = Instant::now();
    println!("\n{}", "=== TEST: Connection ===".bright_cyan().bold());

    let before = api_client.connection_count().await?;
    let _connection =
        Connection::establish(base_url, &new_client_id("conn"), "Client A".to_string()).await?;
    let after = api_client.connection_count().await?;

    if after > before {
        println!("{} Server reports {} connection(s)", "✓".green(), after);
        Ok(TestResult::pass("connection", start))
    } else {
        Ok(TestResult::fail(
            "connection",
            start,
            format!("Connection count did not increase ({before} -> {after})"),
        ))
    }
}

/// A message sent to an id arrives verbatim on that id's stream.
pub async fn test_delivery(base_url: &str, api_client: &ApiClient) -> Result<TestResult> {
    let start = Instant::now();
    println!("\n{}", "=== TEST: Delivery ===".bright_cyan().bold());

    let client_id = new_client_id("delivery");
    let mut connection =
        Connection::establish(base_url, &client_id, "Client A".to_string()).await?;

    let payload = "hello from sse-test-client";
    println!("{} Sending to {}...", "→".blue(), client_id);
    let sent_at = Instant::now();
    let status = api_client.send(&client_id, payload).await?;
    if status != StatusCode::ACCEPTED {
        return Ok(TestResult::fail(
            "delivery",
            start,
            format!("Expected 202 from /send, got {status}"),
        ));
    }

    match connection.wait_for_event(EVENT_TIMEOUT).await {
        Ok(event) if event.data == payload => {
            print_event(&connection.label, &event, sent_at);
            Ok(TestResult::pass("delivery", start))
        }
        Ok(event) => Ok(TestResult::fail(
            "delivery",
            start,
            format!("Expected {payload:?}, got {:?}", event.data),
        )),
        Err(e) => Ok(TestResult::fail("delivery", start, e.to_string())),
    }
}

/// Re-registering an id closes the older stream and routes to the newer one.
pub async fn test_supersede(base_url: &str, api_client: &ApiClient) -> Result<TestResult> {
    let start = Instant::now();
    println!("\n{}", "=== TEST: Supersede ===".bright_cyan().bold());

    let client_id = new_client_id("supersede");
    let mut first =
        Connection::establish(base_url, &client_id, "First stream".to_string()).await?;
    let mut second =
        Connection::establish(base_url, &client_id, "Second stream".to_string()).await?;

    println!("{} Waiting for the first stream to be closed...", "→".blue());
    if let Err(e) = first.wait_for_close(EVENT_TIMEOUT).await {
        return Ok(TestResult::fail("supersede", start, e.to_string()));
    }
    println!("{} First stream closed by the server", "✓".green());

    let sent_at = Instant::now();
    api_client.send(&second.client_id, "after supersede").await?;
    match second.wait_for_event(EVENT_TIMEOUT).await {
        Ok(event) if event.data == "after supersede" => {
            print_event(&second.label, &event, sent_at);
            Ok(TestResult::pass("supersede", start))
        }
        Ok(event) => Ok(TestResult::fail(
            "supersede",
            start,
            format!("Unexpected payload {:?}", event.data),
        )),
        Err(e) => Ok(TestResult::fail("supersede", start, e.to_string())),
    }
}

/// A client going away frees its id without any call to the server.
pub async fn test_disconnect(base_url: &str, api_client: &ApiClient) -> Result<TestResult> {
    let start = Instant::now();
    println!("\n{}", "=== TEST: Disconnect ===".bright_cyan().bold());

    let connection =
        Connection::establish(base_url, &new_client_id("disconnect"), "Client A".to_string())
            .await?;
    let connected = api_client.connection_count().await?;

    println!("{} Dropping {}...", "→".blue(), connection.label);
    drop(connection);

    let deadline = Instant::now() + EVENT_TIMEOUT;
    loop {
        let count = api_client.connection_count().await?;
        if count < connected {
            println!("{} Server reports {} connection(s)", "✓".green(), count);
            return Ok(TestResult::pass("disconnect", start));
        }
        if Instant::now() >= deadline {
            return Ok(TestResult::fail(
                "disconnect",
                start,
                format!("Connection count stayed at {count} after the client left"),
            ));
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// An open stream ends cleanly when the server is stopped. Needs an operator
/// to send SIGTERM (or Ctrl+C) to the server, so it is not part of `all`.
pub async fn test_shutdown(base_url: &str) -> Result<TestResult> {
    let start = Instant::now();
    println!("\n{}", "=== TEST: Shutdown (manual) ===".bright_cyan().bold());

    let mut connection =
        Connection::establish(base_url, &new_client_id("shutdown"), "Client A".to_string())
            .await?;

    println!(
        "{} Stream open. Send SIGTERM to the server within {}s...",
        "→".blue(),
        SHUTDOWN_TIMEOUT.as_secs()
    );
    match connection.wait_for_close(SHUTDOWN_TIMEOUT).await {
        Ok(()) => {
            println!("{} Stream closed by the server", "✓".green());
            Ok(TestResult::pass("shutdown", start))
        }
        Err(e) => Ok(TestResult::fail("shutdown", start, e.to_string())),
    }
}

/// Sending to an id nobody holds is accepted and returns promptly.
pub async fn test_unknown_recipient(api_client: &ApiClient) -> Result<TestResult> {
    let start = Instant::now();
    println!("\n{}", "=== TEST: Unknown Recipient ===".bright_cyan().bold());

    let status = api_client.send(&new_client_id("nobody"), "lost").await?;
    let elapsed = start.elapsed();

    if status == StatusCode::ACCEPTED && elapsed < Duration::from_secs(1) {
        println!("{} Accepted in {:?}", "✓".green(), elapsed);
        Ok(TestResult::pass("unknown_recipient", start))
    } else {
        Ok(TestResult::fail(
            "unknown_recipient",
            start,
            format!("Expected a prompt 202, got {status} after {elapsed:?}"),
        ))
    }
}
