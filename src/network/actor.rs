//! Network actor - runs HTTP requests in the Tokio async runtime

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::messages::{NetworkCommand, NetworkResponse};
use crate::network::client::{create_client, execute_request};

/// Network actor that executes resolved requests and reports back to the app
pub struct NetworkActor {
    client: reqwest::Client,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    active_requests: JoinSet<()>,
    log_bodies: bool,
}

impl NetworkActor {
    pub fn new(
        response_tx: mpsc::UnboundedSender<NetworkResponse>,
        timeout: Duration,
        log_bodies: bool,
    ) -> Self {
        NetworkActor {
            client: create_client(timeout),
            response_tx,
            active_requests: JoinSet::new(),
            log_bodies,
        }
    }

    /// Run the network actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<NetworkCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(NetworkCommand::Execute { id, request }) => {
                            let response_tx = self.response_tx.clone();
                            let client = self.client.clone();
                            let log_bodies = self.log_bodies;

                            self.active_requests.spawn(async move {
                                tracing::info!(id, method = %request.method, url = %request.url, "executing request");
                                let log_tx = response_tx.clone();
                                let logger = move |level, message| {
                                    let _ = log_tx.send(NetworkResponse::Log { id, level, message });
                                };
                                let result = execute_request(&client, request, id, log_bodies, logger).await;
                                tracing::info!(id, completed = matches!(result, NetworkResponse::Completed { .. }), "request finished");
                                let _ = response_tx.send(result);
                            });
                        }

                        Some(NetworkCommand::Shutdown) => {
                            self.active_requests.abort_all();
                            break;
                        }

                        None => break,
                    }
                }

                // Reap completed tasks
                Some(_result) = self.active_requests.join_next() => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HeaderMap, Method, ResolvedRequest, Url};

    #[tokio::test]
    async fn test_failed_request_is_reported_with_logs_first() {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
        let actor = NetworkActor::new(resp_tx, Duration::from_secs(1), false);
        let handle = tokio::spawn(actor.run(cmd_rx));

        cmd_tx
            .send(NetworkCommand::Execute {
                id: 9,
                request: ResolvedRequest {
                    method: Method::new("GET"),
                    url: Url::new("not a url"),
                    content_type: "text/plain".to_string(),
                    body: Vec::new(),
                    headers: HeaderMap::new(),
                },
            })
            .unwrap();

        let mut seen = Vec::new();
        while let Some(response) = resp_rx.recv().await {
            let terminal = response.is_terminal();
            seen.push(response);
            if terminal {
                break;
            }
        }

        assert!(seen.iter().all(|r| r.id() == 9));
        assert!(matches!(seen.last(), Some(NetworkResponse::Failed { .. })));
        assert!(matches!(seen.first(), Some(NetworkResponse::Log { .. })));

        cmd_tx.send(NetworkCommand::Shutdown).unwrap();
        handle.await.unwrap();
    }
}
