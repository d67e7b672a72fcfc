use anyhow::Result;
use eventsource_client::{self as es, Client};
use futures_util::stream::StreamExt;
use log::*;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct Event {
    pub data: String,
    pub timestamp: Instant,
}

enum Update {
    Event(Event),
    Closed,
}

pub struct Connection {
    pub label: String,
    pub client_id: String,
    update_rx: mpsc::UnboundedReceiver<Update>,
    handle: tokio::task::JoinHandle<()>,
}

impl Connection {
    pub async fn establish(base_url: &str, client_id: &str, label: String) -> Result<Self> {
        let url = format!("{}/events/{}", base_url, client_id);
        let (tx, rx) = mpsc::unbounded_channel();

        // The server closes superseded streams on purpose; never reconnect behind its back.
        let client = es::ClientBuilder::for_url(&url)?
            .reconnect(es::ReconnectOptions::reconnect(false).build())
            .build();

        let task_label = label.clone();
        let handle = tokio::spawn(async move {
            let mut stream = client.stream();

            loop {
                match stream.next().await {
                    Some(Ok(es::SSE::Event(event))) => {
                        let update = Update::Event(Event {
                            data: event.data,
                            timestamp: Instant::now(),
                        });
                        if tx.send(update).is_err() {
                            debug!("SSE receiver dropped for {}", task_label);
                            return;
                        }
                    }
                    Some(Ok(_)) => {
                        // Comments and connection notices carry no payload
                    }
                    Some(Err(e)) => {
                        debug!("SSE stream for {} ended: {}", task_label, e);
                        break;
                    }
                    None => {
                        debug!("SSE stream ended for {}", task_label);
                        break;
                    }
                }
            }
            let _ = tx.send(Update::Closed);
        });

        // Give the server a moment to register the stream before anyone sends to it.
        tokio::time::sleep(Duration::from_millis(200)).await;

        Ok(Self {
            label,
            client_id: client_id.to_string(),
            update_rx: rx,
            handle,
        })
    }

    pub async fn wait_for_event(&mut self, timeout: Duration) -> Result<Event> {
        match tokio::time::timeout(timeout, self.update_rx.recv()).await {
            Ok(Some(Update::Event(event))) => Ok(event),
            Ok(Some(Update::Closed)) | Ok(None) => anyhow::bail!("SSE connection closed"),
            Err(_) => anyhow::bail!("Timeout waiting for event on {}", self.label),
        }
    }

    /// Succeeds once the server has ended the stream, failing if an event arrives first.
    pub async fn wait_for_close(&mut self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.update_rx.recv()).await {
            Ok(Some(Update::Closed)) | Ok(None) => Ok(()),
            Ok(Some(Update::Event(event))) => {
                anyhow::bail!("Expected close, received event: {}", event.data)
            }
            Err(_) => anyhow::bail!("Timeout waiting for {} to close", self.label),
        }
    }
}

impl Drop for Connection {
    /// Stops reading, which drops the HTTP connection the way a departing browser does.
    fn drop(&mut self) {
        self.handle.abort();
    }
}
