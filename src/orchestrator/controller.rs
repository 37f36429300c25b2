//! Dispatch controller for the interactive surface.
//!
//! Runs at most one backend request at a time and emits events for
//! presentation layers. The busy gate is a scoped guard moved into the
//! dispatch task, so it clears on every exit path.

use crate::client::KbClient;
use crate::model::{AppEvent, ClientConfig, InfoEvent, DEFAULT_TOP_K};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Upload { files: Vec<PathBuf> },
    /// `top_k` arrives as the raw input field text; resolution happens here.
    Ask { question: String, top_k: String },
    Quit,
}

/// Single-flight guard for the busy gate.
///
/// Acquisition flips the shared flag and notifies UI layers; dropping the
/// guard clears the flag again. The dispatch task owns the guard, so the
/// gate releases whether the request succeeds, fails, or the task unwinds.
struct BusyGuard {
    flag: Arc<AtomicBool>,
    event_tx: UnboundedSender<AppEvent>,
}

impl BusyGuard {
    /// Returns `None` when the gate is already held; the action is then
    /// unavailable, not deferred.
    fn acquire(flag: &Arc<AtomicBool>, event_tx: &UnboundedSender<AppEvent>) -> Option<Self> {
        if flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }
        let _ = event_tx.send(AppEvent::BusyChanged { busy: true });
        Some(Self {
            flag: flag.clone(),
            event_tx: event_tx.clone(),
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
        let _ = self.event_tx.send(AppEvent::BusyChanged { busy: false });
    }
}

/// Resolve the raw top-k input: blank falls back to the default, anything
/// else must parse as a positive integer.
fn resolve_top_k(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(DEFAULT_TOP_K);
    }
    raw.parse::<u32>().ok().filter(|k| *k > 0)
}

async fn dispatch_upload(
    client: Arc<KbClient>,
    files: Vec<PathBuf>,
    event_tx: UnboundedSender<AppEvent>,
    _guard: BusyGuard,
) {
    let _ = event_tx.send(AppEvent::UploadStarted { files: files.len() });
    match client.upload_documents(&files).await {
        Ok(raw) => {
            let raw_json =
                serde_json::to_string_pretty(&raw).unwrap_or_else(|_| raw.to_string());
            let _ = event_tx.send(AppEvent::UploadCompleted { raw_json });
        }
        Err(e) => {
            let _ = event_tx.send(AppEvent::UploadFailed {
                error: format!("{e:#}"),
            });
        }
    }
}

async fn dispatch_ask(
    client: Arc<KbClient>,
    question: String,
    top_k: u32,
    event_tx: UnboundedSender<AppEvent>,
    _guard: BusyGuard,
) {
    let _ = event_tx.send(AppEvent::AskStarted {
        question: question.clone(),
    });
    match client.query(&question, top_k).await {
        Ok(raw) => {
            let raw_json =
                serde_json::to_string_pretty(&raw).unwrap_or_else(|_| raw.to_string());
            // Every answer field is optional; a body that does not match the
            // shape at all renders as the all-defaults answer.
            let result = serde_json::from_value(raw).unwrap_or_default();
            let _ = event_tx.send(AppEvent::AskCompleted {
                raw_json,
                result: Box::new(result),
            });
        }
        Err(e) => {
            let _ = event_tx.send(AppEvent::AskFailed {
                error: format!("{e:#}"),
            });
        }
    }
}

/// Receive UI commands, validate them, and dispatch backend requests one at
/// a time. Validation failures report a notice and never touch the gate.
pub(crate) async fn run_controller(
    cfg: &ClientConfig,
    event_tx: UnboundedSender<AppEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let client = Arc::new(KbClient::new(cfg)?);
    let busy = Arc::new(AtomicBool::new(false));
    let mut inflight: Option<tokio::task::JoinHandle<()>> = None;
    let mut quit_pending = false;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Upload { files }) => {
                        if files.is_empty() {
                            let _ = event_tx.send(AppEvent::Info(InfoEvent::EmptySelection));
                            continue;
                        }
                        // Gate held: drop the command, never queue it.
                        if let Some(guard) = BusyGuard::acquire(&busy, &event_tx) {
                            inflight = Some(tokio::spawn(dispatch_upload(
                                client.clone(),
                                files,
                                event_tx.clone(),
                                guard,
                            )));
                        }
                    }
                    Some(UiCommand::Ask { question, top_k }) => {
                        let question = question.trim().to_string();
                        if question.is_empty() {
                            let _ = event_tx.send(AppEvent::Info(InfoEvent::EmptyQuestion));
                            continue;
                        }
                        let Some(top_k) = resolve_top_k(&top_k) else {
                            let _ = event_tx.send(AppEvent::Info(InfoEvent::InvalidTopK {
                                raw: top_k.trim().to_string(),
                            }));
                            continue;
                        };
                        if let Some(guard) = BusyGuard::acquire(&busy, &event_tx) {
                            inflight = Some(tokio::spawn(dispatch_ask(
                                client.clone(),
                                question,
                                top_k,
                                event_tx.clone(),
                                guard,
                            )));
                        }
                    }
                    Some(UiCommand::Quit) | None => {
                        // No cancellation: wait out the in-flight request
                        // before tearing down.
                        quit_pending = true;
                        if inflight.is_none() {
                            break;
                        }
                    }
                }
            }
            // The JoinHandle stays in `inflight` until this branch wins; taking
            // it earlier would drop it whenever another branch is chosen and
            // completion would never be observed.
            maybe_done = async {
                if let Some(h) = inflight.as_mut() {
                    Some(h.await)
                } else {
                    futures::future::pending().await
                }
            } => {
                if let Some(join_res) = maybe_done {
                    inflight = None;
                    if let Err(e) = join_res {
                        let _ = event_tx.send(AppEvent::Info(InfoEvent::Message(format!(
                            "Dispatch task failed: {e}"
                        ))));
                    }
                    if quit_pending {
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn test_config() -> ClientConfig {
        // Port 1 is closed in practice; dispatches fail fast without a backend.
        ClientConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            request_timeout: Duration::from_secs(2),
            user_agent: "kbase-cli-test".to_string(),
        }
    }

    #[test]
    fn top_k_blank_falls_back_to_default() {
        assert_eq!(resolve_top_k(""), Some(6));
        assert_eq!(resolve_top_k("   "), Some(6));
    }

    #[test]
    fn top_k_parses_positive_integers() {
        assert_eq!(resolve_top_k("4"), Some(4));
        assert_eq!(resolve_top_k(" 12 "), Some(12));
    }

    #[test]
    fn top_k_rejects_invalid_input() {
        assert_eq!(resolve_top_k("abc"), None);
        assert_eq!(resolve_top_k("0"), None);
        assert_eq!(resolve_top_k("-2"), None);
        assert_eq!(resolve_top_k("3.5"), None);
    }

    #[tokio::test]
    async fn busy_guard_is_single_flight() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let flag = Arc::new(AtomicBool::new(false));

        let guard = BusyGuard::acquire(&flag, &tx).expect("gate free");
        assert!(flag.load(Ordering::SeqCst));
        assert!(BusyGuard::acquire(&flag, &tx).is_none());

        drop(guard);
        assert!(!flag.load(Ordering::SeqCst));

        assert!(matches!(
            rx.recv().await,
            Some(AppEvent::BusyChanged { busy: true })
        ));
        assert!(matches!(
            rx.recv().await,
            Some(AppEvent::BusyChanged { busy: false })
        ));
    }

    async fn run_commands(commands: Vec<UiCommand>) -> Vec<AppEvent> {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let cfg = test_config();
        let ctrl = tokio::spawn(async move { run_controller(&cfg, event_tx, cmd_rx).await });

        for cmd in commands {
            cmd_tx.send(cmd).unwrap();
        }
        cmd_tx.send(UiCommand::Quit).unwrap();
        ctrl.await.unwrap().unwrap();

        let mut events = Vec::new();
        while let Ok(ev) = event_rx.try_recv() {
            events.push(ev);
        }
        events
    }

    #[tokio::test]
    async fn blank_question_never_dispatches() {
        let events = run_commands(vec![UiCommand::Ask {
            question: "   ".into(),
            top_k: String::new(),
        }])
        .await;

        assert!(events
            .iter()
            .any(|e| matches!(e, AppEvent::Info(InfoEvent::EmptyQuestion))));
        assert!(!events
            .iter()
            .any(|e| matches!(e, AppEvent::BusyChanged { .. })));
    }

    #[tokio::test]
    async fn empty_selection_never_dispatches() {
        let events = run_commands(vec![UiCommand::Upload { files: vec![] }]).await;

        assert!(events
            .iter()
            .any(|e| matches!(e, AppEvent::Info(InfoEvent::EmptySelection))));
        assert!(!events
            .iter()
            .any(|e| matches!(e, AppEvent::BusyChanged { .. })));
    }

    #[tokio::test]
    async fn invalid_top_k_never_dispatches() {
        let events = run_commands(vec![UiCommand::Ask {
            question: "What is the refund policy?".into(),
            top_k: "abc".into(),
        }])
        .await;

        assert!(events
            .iter()
            .any(|e| matches!(e, AppEvent::Info(InfoEvent::InvalidTopK { .. }))));
        assert!(!events
            .iter()
            .any(|e| matches!(e, AppEvent::BusyChanged { .. })));
    }

    #[tokio::test]
    async fn failed_ask_releases_gate() {
        let events = run_commands(vec![UiCommand::Ask {
            question: "anyone there?".into(),
            top_k: String::new(),
        }])
        .await;

        let busy_changes: Vec<bool> = events
            .iter()
            .filter_map(|e| match e {
                AppEvent::BusyChanged { busy } => Some(*busy),
                _ => None,
            })
            .collect();
        assert_eq!(busy_changes, vec![true, false]);
        assert!(events.iter().any(|e| matches!(e, AppEvent::AskStarted { .. })));
        assert!(events.iter().any(|e| matches!(e, AppEvent::AskFailed { .. })));
    }

    #[tokio::test]
    async fn failed_upload_releases_gate() {
        let events = run_commands(vec![UiCommand::Upload {
            files: vec![PathBuf::from("/nonexistent/kbase-test-input")],
        }])
        .await;

        let busy_changes: Vec<bool> = events
            .iter()
            .filter_map(|e| match e {
                AppEvent::BusyChanged { busy } => Some(*busy),
                _ => None,
            })
            .collect();
        assert_eq!(busy_changes, vec![true, false]);
        assert!(events
            .iter()
            .any(|e| matches!(e, AppEvent::UploadStarted { files: 1 })));
        assert!(events
            .iter()
            .any(|e| matches!(e, AppEvent::UploadFailed { .. })));
    }
}
