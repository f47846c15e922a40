//! Background driver that keeps a [`ServicePanel`] in sync with the relay.

use super::client::{ConsoleClient, EventStream};
use super::panel::{ServicePanel, RESTART_CONNECTION_CLOSED};
use super::ConsoleError;
use crate::relay::RestartProgressEvent;
use crate::sse::SseEvent;
use futures::StreamExt;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMMAND_CAPACITY: usize = 8;
const UPDATE_CAPACITY: usize = 1024;

/// Incremental changes, for consumers that render as things happen.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleUpdate {
    LogsOpened { service: String },
    Line(String),
    LogsClosed { reason: String },
    RestartStarted,
    Restart(RestartProgressEvent),
    RestartFailed { message: String },
}

#[derive(Debug)]
enum Command {
    Restart,
    SwitchService(String),
}

/// Live console for one service panel.
///
/// Dropping it closes every open subscription.
pub struct LiveConsole {
    commands: mpsc::Sender<Command>,
    panel: watch::Receiver<ServicePanel>,
    updates: broadcast::Sender<ConsoleUpdate>,
    first_updates: Option<broadcast::Receiver<ConsoleUpdate>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl LiveConsole {
    /// Mount a panel on `service` and start tailing its logs.
    pub fn spawn(client: ConsoleClient, service: impl Into<String>) -> Self {
        let service = service.into();
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (panel_tx, panel_rx) = watch::channel(ServicePanel::new(service.clone()));
        let (updates_tx, updates_rx) = broadcast::channel(UPDATE_CAPACITY);
        let cancel = CancellationToken::new();

        let driver = Driver {
            client,
            service,
            panel: panel_tx,
            updates: updates_tx.clone(),
            logs: None,
            restart: None,
        };
        let task = tokio::spawn(driver.run(commands_rx, cancel.clone()));

        Self {
            commands: commands_tx,
            panel: panel_rx,
            updates: updates_tx,
            first_updates: Some(updates_rx),
            cancel,
            task: Some(task),
        }
    }

    /// Request a restart. Ignored by the panel while one is running.
    pub async fn restart(&self) -> bool {
        self.commands.send(Command::Restart).await.is_ok()
    }

    /// Retarget the panel; the buffer is cleared and logs re-subscribed.
    pub async fn switch_service(&self, service: impl Into<String>) -> bool {
        self.commands
            .send(Command::SwitchService(service.into()))
            .await
            .is_ok()
    }

    /// Current panel state.
    pub fn panel(&self) -> ServicePanel {
        self.panel.borrow().clone()
    }

    /// Receiver notified on every panel change.
    pub fn watch(&self) -> watch::Receiver<ServicePanel> {
        self.panel.clone()
    }

    /// Update feed. The first call also sees updates sent before it.
    pub fn subscribe(&mut self) -> broadcast::Receiver<ConsoleUpdate> {
        self.first_updates
            .take()
            .unwrap_or_else(|| self.updates.subscribe())
    }

    /// Close all subscriptions and wait for the driver to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for LiveConsole {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Driver {
    client: ConsoleClient,
    service: String,
    panel: watch::Sender<ServicePanel>,
    updates: broadcast::Sender<ConsoleUpdate>,
    logs: Option<EventStream>,
    restart: Option<EventStream>,
}

impl Driver {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>, cancel: CancellationToken) {
        self.open_logs().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                command = commands.recv() => match command {
                    Some(Command::Restart) => self.start_restart().await,
                    Some(Command::SwitchService(service)) => {
                        self.logs = None;
                        self.restart = None;
                        self.panel.send_modify(|p| p.switch_service(service.clone()));
                        self.service = service;
                        self.open_logs().await;
                    }
                    None => break,
                },
                event = next_event(&mut self.logs) => self.on_log_event(event),
                event = next_event(&mut self.restart) => self.on_restart_event(event),
            }
        }

        self.logs = None;
        self.restart = None;
        self.panel.send_modify(ServicePanel::teardown);
        debug!(service = %self.service, "Live console stopped");
    }

    async fn open_logs(&mut self) {
        match self.client.subscribe_logs(&self.service).await {
            Ok(stream) => {
                info!(service = %self.service, "Log subscription opened");
                self.logs = Some(stream);
                self.panel.send_modify(ServicePanel::logs_opened);
                self.notify(ConsoleUpdate::LogsOpened {
                    service: self.service.clone(),
                });
            }
            Err(e) => self.close_logs(e.to_string()),
        }
    }

    fn on_log_event(&mut self, event: Option<Result<SseEvent, ConsoleError>>) {
        match event {
            Some(Ok(event)) => {
                self.panel.send_modify(|p| p.push_line(event.data.clone()));
                self.notify(ConsoleUpdate::Line(event.data));
            }
            Some(Err(e)) => self.close_logs(e.to_string()),
            None => self.close_logs("log stream closed".to_string()),
        }
    }

    fn close_logs(&mut self, reason: String) {
        warn!(service = %self.service, reason = %reason, "Log subscription closed");
        self.logs = None;
        self.panel.send_modify(|p| p.logs_failed(reason.clone()));
        self.notify(ConsoleUpdate::LogsClosed { reason });
    }

    async fn start_restart(&mut self) {
        let mut started = false;
        self.panel.send_modify(|p| started = p.begin_restart());
        if !started {
            debug!(service = %self.service, "Restart already in progress");
            return;
        }
        self.notify(ConsoleUpdate::RestartStarted);

        match self.client.subscribe_restart(&self.service).await {
            Ok(stream) => self.restart = Some(stream),
            Err(e) => {
                warn!(service = %self.service, error = %e, "Restart subscription failed");
                self.fail_restart();
            }
        }
    }

    fn on_restart_event(&mut self, event: Option<Result<SseEvent, ConsoleError>>) {
        match event {
            Some(Ok(event)) => {
                let Some(progress) = RestartProgressEvent::from_payload(&event.data) else {
                    debug!(data = %event.data, "Ignoring unrecognized restart payload");
                    return;
                };
                self.notify(ConsoleUpdate::Restart(progress.clone()));
                let mut done = false;
                self.panel.send_modify(|p| done = p.restart_event(progress));
                if done {
                    self.restart = None;
                }
            }
            Some(Err(e)) => {
                warn!(service = %self.service, error = %e, "Restart stream failed");
                self.fail_restart();
            }
            None => self.fail_restart(),
        }
    }

    fn fail_restart(&mut self) {
        self.restart = None;
        self.notify(ConsoleUpdate::RestartFailed {
            message: RESTART_CONNECTION_CLOSED.to_string(),
        });
        self.panel.send_modify(ServicePanel::restart_failed);
    }

    fn notify(&self, update: ConsoleUpdate) {
        // No receivers is fine.
        let _ = self.updates.send(update);
    }
}

async fn next_event(
    stream: &mut Option<EventStream>,
) -> Option<Result<SseEvent, ConsoleError>> {
    match stream {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::PanelState;
    use crate::relay::RestartStatus;
    use std::time::Duration;

    async fn wait_until(
        console: &LiveConsole,
        check: impl Fn(&ServicePanel) -> bool,
    ) -> ServicePanel {
        let mut rx = console.watch();
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if check(&rx.borrow_and_update()) {
                    return rx.borrow().clone();
                }
                if rx.changed().await.is_err() {
                    return rx.borrow().clone();
                }
            }
        })
        .await
        .expect("panel did not reach the expected state")
    }

    #[tokio::test]
    async fn test_log_lines_reach_panel_and_close_keeps_buffer() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/maintenance/logs/nginx")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body("data: one\n\ndata: two\n\n")
            .create_async()
            .await;

        let client = ConsoleClient::new(&server.url()).unwrap();
        let console = LiveConsole::spawn(client, "nginx");

        let panel = wait_until(&console, |p| p.state() == PanelState::Error).await;
        assert_eq!(panel.buffer().to_vec(), vec!["one", "two"]);
        assert_eq!(panel.error(), Some("log stream closed"));
    }

    #[tokio::test]
    async fn test_restart_runs_to_done() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/maintenance/logs/nydus")
            .with_status(502)
            .with_body(r#"{"error":{"message":"Upstream error"}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/maintenance/restart/nydus")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(concat!(
                "data: {\"status\":\"progress\",\"message\":\"pulling\",\"done\":false}\n\n",
                "data: not json\n\n",
                "data: {\"status\":\"success\",\"message\":\"restarted\",\"done\":true}\n\n",
            ))
            .create_async()
            .await;

        let client = ConsoleClient::new(&server.url()).unwrap();
        let mut console = LiveConsole::spawn(client, "nydus");
        let mut updates = console.subscribe();
        assert!(console.restart().await);

        let panel = wait_until(&console, |p| {
            p.restart().is_some_and(|s| !s.is_processing)
        })
        .await;
        let event = panel.restart().unwrap().last_event.clone().unwrap();
        assert_eq!(event.status, RestartStatus::Success);

        let mut seen = Vec::new();
        while let Ok(update) = updates.try_recv() {
            if let ConsoleUpdate::Restart(event) = update {
                seen.push(event.message);
            }
        }
        assert_eq!(seen, vec!["pulling", "restarted"]);
    }

    #[tokio::test]
    async fn test_restart_stream_without_done_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/maintenance/logs/nydus")
            .with_status(502)
            .create_async()
            .await;
        server
            .mock("GET", "/maintenance/restart/nydus")
            .with_status(200)
            .with_body("data: {\"status\":\"progress\",\"message\":\"pulling\",\"done\":false}\n\n")
            .create_async()
            .await;

        let client = ConsoleClient::new(&server.url()).unwrap();
        let console = LiveConsole::spawn(client, "nydus");
        console.restart().await;

        let panel = wait_until(&console, |p| p.error() == Some(RESTART_CONNECTION_CLOSED)).await;
        assert!(!panel.is_processing());
        assert_eq!(panel.state(), PanelState::Error);
    }

    #[tokio::test]
    async fn test_shutdown_tears_down_panel() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/maintenance/logs/nginx")
            .with_status(502)
            .create_async()
            .await;

        let client = ConsoleClient::new(&server.url()).unwrap();
        let console = LiveConsole::spawn(client, "nginx");
        let rx = console.watch();
        console.shutdown().await;
        assert!(!rx.borrow().logs_open());
        assert!(!rx.borrow().is_processing());
    }
}
