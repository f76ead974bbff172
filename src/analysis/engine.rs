use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, bounded, unbounded};
use parking_lot::Mutex;

use super::scan::ScanFile;

/// How long a submitted scan sits in analysis before a verdict comes back.
pub const ANALYSIS_DELAY: Duration = Duration::from_millis(3000);

/// Decides whether a scan shows an abnormality. The production engine flips
/// a coin; tests swap in a fixed verdict.
pub trait AnalysisOracle: Send + 'static {
    fn analyze(&mut self, scan: &ScanFile) -> bool;
}

pub struct CoinFlipOracle;

impl AnalysisOracle for CoinFlipOracle {
    fn analyze(&mut self, _scan: &ScanFile) -> bool {
        rand::random_bool(0.5)
    }
}

enum AnalysisCommand {
    Analyze { ticket: u64, scan: Arc<ScanFile> },
    Stop,
}

#[derive(Debug)]
pub struct SliceImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug)]
pub enum AnalysisEvent {
    SlicePreview { ticket: u64, image: SliceImage },
    PreviewFailed { ticket: u64, message: String },
    Completed { ticket: u64, abnormality_detected: bool },
}

/// Background analysis worker. Commands go in over an unbounded channel,
/// ticketed events come back out, and the thread joins on drop.
///
/// Only one scan is analyzed at a time. Submitting a new one while another
/// is still waiting on its verdict replaces it, so a superseded scan never
/// produces a completion of its own.
pub struct AnalysisEngine {
    tx_cmd: Sender<AnalysisCommand>,
    rx_event: Receiver<AnalysisEvent>,
    last_error: Arc<Mutex<Option<String>>>,
    thread_handle: Option<JoinHandle<()>>,
}

impl AnalysisEngine {
    pub fn new() -> Self {
        Self::with_oracle(CoinFlipOracle, ANALYSIS_DELAY)
    }

    pub fn with_oracle(oracle: impl AnalysisOracle, delay: Duration) -> Self {
        let (tx_cmd, rx_cmd) = unbounded();
        let (tx_event, rx_event) = bounded(8);
        let last_error = Arc::new(Mutex::new(None));

        let worker_error = last_error.clone();
        let thread_handle = std::thread::spawn(move || {
            worker_loop(rx_cmd, tx_event, worker_error, oracle, delay);
        });

        Self {
            tx_cmd,
            rx_event,
            last_error,
            thread_handle: Some(thread_handle),
        }
    }

    pub fn submit(&self, ticket: u64, scan: Arc<ScanFile>) {
        let _ = self.tx_cmd.send(AnalysisCommand::Analyze { ticket, scan });
    }

    pub fn try_recv_event(&self) -> Option<AnalysisEvent> {
        self.rx_event.try_recv().ok()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    pub fn stop(&mut self) {
        let _ = self.tx_cmd.send(AnalysisCommand::Stop);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    #[cfg(test)]
    fn recv_event(&self, timeout: Duration) -> Option<AnalysisEvent> {
        self.rx_event.recv_timeout(timeout).ok()
    }
}

impl Drop for AnalysisEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(
    rx_cmd: Receiver<AnalysisCommand>,
    tx_event: Sender<AnalysisEvent>,
    last_error: Arc<Mutex<Option<String>>>,
    mut oracle: impl AnalysisOracle,
    delay: Duration,
) {
    log::debug!("analysis worker started");
    let mut pending: Option<(u64, Arc<ScanFile>)> = None;

    loop {
        // While a scan is pending, wait with a deadline so the verdict fires
        // once the delay elapses without a newer command arriving.
        let command = match pending {
            Some(_) => match rx_cmd.recv_timeout(delay) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match rx_cmd.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            },
        };

        match command {
            Some(AnalysisCommand::Analyze { ticket, scan }) => {
                decode_preview(&tx_event, &last_error, ticket, &scan);
                pending = Some((ticket, scan));
            }
            Some(AnalysisCommand::Stop) => break,
            None => {
                if let Some((ticket, scan)) = pending.take() {
                    let abnormality_detected = oracle.analyze(&scan);
                    let _ = tx_event.send(AnalysisEvent::Completed {
                        ticket,
                        abnormality_detected,
                    });
                }
            }
        }
    }
    log::debug!("analysis worker stopped");
}

fn decode_preview(
    tx_event: &Sender<AnalysisEvent>,
    last_error: &Mutex<Option<String>>,
    ticket: u64,
    scan: &ScanFile,
) {
    match image::load_from_memory(&scan.bytes) {
        Ok(decoded) => {
            let rgba = decoded.to_rgba8();
            let (width, height) = rgba.dimensions();
            *last_error.lock() = None;
            let _ = tx_event.send(AnalysisEvent::SlicePreview {
                ticket,
                image: SliceImage {
                    width,
                    height,
                    rgba: rgba.into_raw(),
                },
            });
        }
        Err(err) => {
            let message = format!("could not decode {}: {err}", scan.name);
            *last_error.lock() = Some(message.clone());
            let _ = tx_event.send(AnalysisEvent::PreviewFailed { ticket, message });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedOracle(bool);

    impl AnalysisOracle for FixedOracle {
        fn analyze(&mut self, _scan: &ScanFile) -> bool {
            self.0
        }
    }

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png)
            .expect("encode png");
        bytes.into_inner()
    }

    fn png_scan(name: &str) -> Arc<ScanFile> {
        Arc::new(ScanFile::new(name, "image/png", tiny_png()))
    }

    #[test]
    fn completion_reports_the_oracle_verdict() {
        let engine = AnalysisEngine::with_oracle(FixedOracle(true), Duration::from_millis(30));
        engine.submit(1, png_scan("slice.png"));

        let first = engine.recv_event(Duration::from_secs(2)).expect("preview");
        match first {
            AnalysisEvent::SlicePreview { ticket, image } => {
                assert_eq!(ticket, 1);
                assert_eq!((image.width, image.height), (2, 2));
                assert_eq!(image.rgba.len(), 16);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        let second = engine
            .recv_event(Duration::from_secs(2))
            .expect("completion");
        match second {
            AnalysisEvent::Completed {
                ticket,
                abnormality_detected,
            } => {
                assert_eq!(ticket, 1);
                assert!(abnormality_detected);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn newer_scan_supersedes_a_pending_one() {
        let engine = AnalysisEngine::with_oracle(FixedOracle(false), Duration::from_millis(200));
        engine.submit(1, png_scan("first.png"));
        engine.submit(2, png_scan("second.png"));

        let mut previews = Vec::new();
        let mut completions = Vec::new();
        for _ in 0..3 {
            match engine.recv_event(Duration::from_secs(2)) {
                Some(AnalysisEvent::SlicePreview { ticket, .. }) => previews.push(ticket),
                Some(AnalysisEvent::Completed { ticket, .. }) => completions.push(ticket),
                Some(AnalysisEvent::PreviewFailed { message, .. }) => {
                    panic!("preview failed: {message}")
                }
                None => panic!("timed out waiting for events"),
            }
        }

        assert_eq!(previews, vec![1, 2]);
        assert_eq!(completions, vec![2]);
    }

    #[test]
    fn undecodable_bytes_still_reach_a_verdict() {
        let engine = AnalysisEngine::with_oracle(FixedOracle(true), Duration::from_millis(10));
        engine.submit(
            7,
            Arc::new(ScanFile::new("scan.png", "image/png", b"junk".to_vec())),
        );

        let first = engine.recv_event(Duration::from_secs(2)).expect("event");
        assert!(matches!(
            first,
            AnalysisEvent::PreviewFailed { ticket: 7, .. }
        ));
        assert!(engine.last_error().is_some());

        let second = engine
            .recv_event(Duration::from_secs(2))
            .expect("completion");
        assert!(matches!(second, AnalysisEvent::Completed { ticket: 7, .. }));
    }

    #[test]
    fn stop_joins_the_worker() {
        let mut engine = AnalysisEngine::with_oracle(FixedOracle(true), Duration::from_secs(10));
        engine.submit(1, png_scan("slice.png"));
        engine.stop();
        assert!(engine.thread_handle.is_none());
    }
}
