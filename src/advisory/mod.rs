//! Tactical advisory side channel
//!
//! Free-text questions go to an external text-generation service together with
//! a short status line; replies come back asynchronously and are shown as flavour
//! text. Nothing here reads or writes simulation state, and every failure maps to
//! a fixed fallback line so the host always has something to display.

mod gemini;

pub use gemini::GeminiAdvisor;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::session::GameStatus;

/// Default upper bound on a single advisory round trip
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvisoryError {
    /// No API key available
    Unconfigured,
    /// Transport or upstream failure
    Unavailable(String),
    /// Upstream answered with no usable text
    Garbled,
    TimedOut,
}

impl AdvisoryError {
    /// Line to show in place of a reply
    pub fn fallback_text(&self) -> &'static str {
        match self {
            AdvisoryError::Unconfigured => "CommLink Offline. Check API Key.",
            AdvisoryError::Garbled => "Transmission garbled.",
            AdvisoryError::Unavailable(_) | AdvisoryError::TimedOut => "Connection interrupted.",
        }
    }
}

impl fmt::Display for AdvisoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdvisoryError::Unconfigured => write!(f, "advisory provider has no API key"),
            AdvisoryError::Unavailable(reason) => write!(f, "advisory provider unavailable: {reason}"),
            AdvisoryError::Garbled => write!(f, "advisory reply contained no text"),
            AdvisoryError::TimedOut => write!(f, "advisory request timed out"),
        }
    }
}

impl std::error::Error for AdvisoryError {}

/// Something that can answer a question given the current battle status.
// The desk depends on this trait, not on a concrete HTTP client.
#[async_trait]
pub trait AdvisoryProvider: Send + Sync {
    async fn advise(&self, message: &str, status: &str) -> Result<String, AdvisoryError>;
}

/// Status line sent alongside each question
pub fn status_line(status: GameStatus, wave: u32, score: u64) -> String {
    format!("Status: {}, Wave: {}, Score: {}", status.as_str(), wave, score)
}

/// Handle returned by [`AdvisoryDesk::request`]
pub type Ticket = u64;

/// A finished request. `text` is always displayable: the reply itself, or the
/// fallback line when `error` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryReply {
    pub ticket: Ticket,
    pub text: String,
    pub error: Option<AdvisoryError>,
}

impl AdvisoryReply {
    fn from_result(ticket: Ticket, result: Result<String, AdvisoryError>) -> Self {
        match result {
            Ok(text) => Self {
                ticket,
                text,
                error: None,
            },
            Err(e) => Self {
                ticket,
                text: e.fallback_text().to_string(),
                error: Some(e),
            },
        }
    }
}

/// Fire-and-forget front end for an [`AdvisoryProvider`].
///
/// `request` spawns the call on the host's tokio runtime and returns at once;
/// `poll` collects whatever has finished without blocking, so it is safe to call
/// from the frame loop.
pub struct AdvisoryDesk {
    provider: Option<Arc<dyn AdvisoryProvider>>,
    runtime: Handle,
    timeout: Duration,
    tx: mpsc::UnboundedSender<AdvisoryReply>,
    rx: mpsc::UnboundedReceiver<AdvisoryReply>,
    next_ticket: Ticket,
    in_flight: usize,
}

impl AdvisoryDesk {
    pub fn new(runtime: Handle, provider: Option<Arc<dyn AdvisoryProvider>>, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            provider,
            runtime,
            timeout,
            tx,
            rx,
            next_ticket: 1,
            in_flight: 0,
        }
    }

    /// Desk with no provider; every request resolves to the offline fallback
    pub fn offline(runtime: Handle) -> Self {
        Self::new(runtime, None, DEFAULT_TIMEOUT)
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Number of requests whose replies have not been polled yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn request(&mut self, message: &str, status: &str) -> Ticket {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight += 1;

        let Some(provider) = self.provider.clone() else {
            let _ = self
                .tx
                .send(AdvisoryReply::from_result(ticket, Err(AdvisoryError::Unconfigured)));
            return ticket;
        };

        let tx = self.tx.clone();
        let timeout = self.timeout;
        let message = message.to_string();
        let status = status.to_string();
        self.runtime.spawn(async move {
            let result = match tokio::time::timeout(timeout, provider.advise(&message, &status)).await {
                Ok(result) => result,
                Err(_) => Err(AdvisoryError::TimedOut),
            };
            if let Err(e) = &result {
                log::info!("Advisory request {ticket} failed: {e}");
            }
            // Receiver gone means the desk was dropped; nobody is waiting
            let _ = tx.send(AdvisoryReply::from_result(ticket, result));
        });
        ticket
    }

    /// Collect finished replies without waiting
    pub fn poll(&mut self) -> Vec<AdvisoryReply> {
        let mut replies = Vec::new();
        while let Ok(reply) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            replies.push(reply);
        }
        replies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct EchoProvider {
        seen: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl AdvisoryProvider for EchoProvider {
        async fn advise(&self, message: &str, status: &str) -> Result<String, AdvisoryError> {
            self.seen
                .lock()
                .expect("seen mutex poisoned")
                .push((message.to_string(), status.to_string()));
            Ok(format!("Copy: {message}"))
        }
    }

    struct FailingProvider(AdvisoryError);

    #[async_trait]
    impl AdvisoryProvider for FailingProvider {
        async fn advise(&self, _message: &str, _status: &str) -> Result<String, AdvisoryError> {
            Err(self.0.clone())
        }
    }

    struct StalledProvider;

    #[async_trait]
    impl AdvisoryProvider for StalledProvider {
        async fn advise(&self, _message: &str, _status: &str) -> Result<String, AdvisoryError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("too late".to_string())
        }
    }

    async fn wait_for_reply(desk: &mut AdvisoryDesk) -> AdvisoryReply {
        for _ in 0..200 {
            if let Some(reply) = desk.poll().into_iter().next() {
                return reply;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no advisory reply arrived");
    }

    #[test]
    fn test_status_line_format() {
        assert_eq!(
            status_line(GameStatus::Playing, 3, 2450),
            "Status: PLAYING, Wave: 3, Score: 2450"
        );
        assert_eq!(
            status_line(GameStatus::GameOver, 1, 0),
            "Status: GAME_OVER, Wave: 1, Score: 0"
        );
    }

    #[test]
    fn test_fallback_lines() {
        assert_eq!(AdvisoryError::Unconfigured.fallback_text(), "CommLink Offline. Check API Key.");
        assert_eq!(AdvisoryError::Garbled.fallback_text(), "Transmission garbled.");
        assert_eq!(AdvisoryError::TimedOut.fallback_text(), "Connection interrupted.");
        assert_eq!(
            AdvisoryError::Unavailable("503".into()).fallback_text(),
            "Connection interrupted."
        );
    }

    #[tokio::test]
    async fn test_reply_delivered_through_poll() {
        let provider = Arc::new(EchoProvider {
            seen: Mutex::new(Vec::new()),
        });
        let mut desk = AdvisoryDesk::new(Handle::current(), Some(provider.clone()), DEFAULT_TIMEOUT);
        let status = status_line(GameStatus::Playing, 2, 1200);
        let ticket = desk.request("Where are they?", &status);
        assert_eq!(desk.in_flight(), 1);

        let reply = wait_for_reply(&mut desk).await;
        assert_eq!(reply.ticket, ticket);
        assert_eq!(reply.text, "Copy: Where are they?");
        assert!(reply.error.is_none());
        assert_eq!(desk.in_flight(), 0);

        let seen = provider.seen.lock().expect("seen mutex poisoned");
        assert_eq!(seen[0].1, "Status: PLAYING, Wave: 2, Score: 1200");
    }

    #[tokio::test]
    async fn test_offline_desk_answers_with_fallback() {
        let mut desk = AdvisoryDesk::offline(Handle::current());
        assert!(!desk.is_configured());
        desk.request("Status?", "Status: MENU, Wave: 1, Score: 0");
        let replies = desk.poll();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, "CommLink Offline. Check API Key.");
        assert_eq!(replies[0].error, Some(AdvisoryError::Unconfigured));
    }

    #[tokio::test]
    async fn test_provider_error_maps_to_fallback() {
        let provider = Arc::new(FailingProvider(AdvisoryError::Garbled));
        let mut desk = AdvisoryDesk::new(Handle::current(), Some(provider), DEFAULT_TIMEOUT);
        desk.request("Report", "Status: PLAYING, Wave: 1, Score: 0");
        let reply = wait_for_reply(&mut desk).await;
        assert_eq!(reply.text, "Transmission garbled.");
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let mut desk = AdvisoryDesk::new(
            Handle::current(),
            Some(Arc::new(StalledProvider)),
            Duration::from_millis(50),
        );
        desk.request("Anyone there?", "Status: PLAYING, Wave: 1, Score: 0");
        let reply = wait_for_reply(&mut desk).await;
        assert_eq!(reply.error, Some(AdvisoryError::TimedOut));
        assert_eq!(reply.text, "Connection interrupted.");
    }

    #[tokio::test]
    async fn test_tickets_are_unique() {
        let mut desk = AdvisoryDesk::offline(Handle::current());
        let a = desk.request("a", "");
        let b = desk.request("b", "");
        assert_ne!(a, b);
        assert_eq!(desk.poll().len(), 2);
    }
}
