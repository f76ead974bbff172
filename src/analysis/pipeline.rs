use std::sync::Arc;

use super::engine::AnalysisEvent;
use super::scan::{ScanFile, UploadError};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    #[default]
    Idle,
    Processing,
    Resolved,
}

/// A scan accepted for analysis, ready to hand to the engine.
#[derive(Debug)]
pub struct AnalysisRequest {
    pub ticket: u64,
    pub scan: Arc<ScanFile>,
}

/// Tracks the scan currently under analysis. Every accepted upload takes a
/// fresh ticket, and events carrying any other ticket are dropped, so a
/// verdict for a replaced or removed scan can never land on the current one.
#[derive(Default)]
pub struct ScanPipeline {
    scan: Option<Arc<ScanFile>>,
    abnormality_detected: Option<bool>,
    phase: AnalysisPhase,
    ticket: u64,
}

impl ScanPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and accepts an upload. Rejected files leave the pipeline
    /// exactly as it was.
    pub fn upload(&mut self, scan: ScanFile) -> Result<AnalysisRequest, UploadError> {
        if !scan.is_image() {
            return Err(UploadError::UnsupportedKind {
                kind: scan.kind.clone(),
            });
        }

        let scan = Arc::new(scan);
        self.ticket += 1;
        self.scan = Some(scan.clone());
        self.abnormality_detected = None;
        self.phase = AnalysisPhase::Processing;

        Ok(AnalysisRequest {
            ticket: self.ticket,
            scan,
        })
    }

    /// Folds an engine event into the pipeline. Returns false when the event
    /// belongs to a superseded ticket and was discarded.
    pub fn apply(&mut self, event: &AnalysisEvent) -> bool {
        let ticket = match event {
            AnalysisEvent::SlicePreview { ticket, .. }
            | AnalysisEvent::PreviewFailed { ticket, .. }
            | AnalysisEvent::Completed { ticket, .. } => *ticket,
        };

        if ticket != self.ticket {
            log::debug!(
                "discarding stale analysis event for ticket {ticket} (current {})",
                self.ticket
            );
            return false;
        }

        if let AnalysisEvent::Completed {
            abnormality_detected,
            ..
        } = event
        {
            self.abnormality_detected = Some(*abnormality_detected);
            self.phase = AnalysisPhase::Resolved;
        }

        true
    }

    /// Drops the current scan and invalidates anything still in flight.
    pub fn clear(&mut self) {
        self.ticket += 1;
        self.scan = None;
        self.abnormality_detected = None;
        self.phase = AnalysisPhase::Idle;
    }

    pub fn scan(&self) -> Option<&ScanFile> {
        self.scan.as_deref()
    }

    pub fn has_scan(&self) -> bool {
        self.scan.is_some()
    }

    pub fn is_processing(&self) -> bool {
        self.phase == AnalysisPhase::Processing
    }

    pub fn phase(&self) -> AnalysisPhase {
        self.phase
    }

    pub fn abnormality_detected(&self) -> Option<bool> {
        self.abnormality_detected
    }
}

#[cfg(test)]
mod tests {
    use super::super::engine::SliceImage;
    use super::*;

    fn image_scan(name: &str) -> ScanFile {
        ScanFile::new(name, "image/png", vec![1, 2, 3])
    }

    fn completed(ticket: u64, verdict: bool) -> AnalysisEvent {
        AnalysisEvent::Completed {
            ticket,
            abnormality_detected: verdict,
        }
    }

    #[test]
    fn upload_accepts_images_and_starts_processing() {
        let mut pipeline = ScanPipeline::new();
        let request = pipeline.upload(image_scan("scan.png")).expect("accepted");

        assert_eq!(request.ticket, 1);
        assert_eq!(request.scan.name, "scan.png");
        assert!(pipeline.is_processing());
        assert_eq!(pipeline.abnormality_detected(), None);
        assert_eq!(pipeline.scan().map(|s| s.name.as_str()), Some("scan.png"));
    }

    #[test]
    fn upload_rejects_non_images_without_touching_state() {
        let mut pipeline = ScanPipeline::new();

        let err = pipeline
            .upload(ScanFile::new("notes.txt", "text/plain", vec![]))
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedKind { .. }));
        assert_eq!(pipeline.phase(), AnalysisPhase::Idle);
        assert!(!pipeline.has_scan());

        let request = pipeline.upload(image_scan("scan.png")).expect("accepted");
        pipeline
            .upload(ScanFile::new("report.pdf", "application/pdf", vec![]))
            .unwrap_err();

        assert!(pipeline.is_processing());
        assert_eq!(pipeline.scan().map(|s| s.name.as_str()), Some("scan.png"));
        assert!(pipeline.apply(&completed(request.ticket, true)));
    }

    #[test]
    fn completion_resolves_the_current_ticket() {
        let mut pipeline = ScanPipeline::new();
        let request = pipeline.upload(image_scan("scan.png")).expect("accepted");

        assert!(pipeline.apply(&completed(request.ticket, true)));
        assert_eq!(pipeline.phase(), AnalysisPhase::Resolved);
        assert_eq!(pipeline.abnormality_detected(), Some(true));
        assert!(!pipeline.is_processing());
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut pipeline = ScanPipeline::new();
        let first = pipeline.upload(image_scan("first.png")).expect("accepted");
        let second = pipeline.upload(image_scan("second.png")).expect("accepted");
        assert_ne!(first.ticket, second.ticket);

        assert!(!pipeline.apply(&completed(first.ticket, true)));
        assert!(pipeline.is_processing());
        assert_eq!(pipeline.abnormality_detected(), None);

        assert!(pipeline.apply(&completed(second.ticket, false)));
        assert_eq!(pipeline.abnormality_detected(), Some(false));
    }

    #[test]
    fn clear_invalidates_in_flight_work() {
        let mut pipeline = ScanPipeline::new();
        let request = pipeline.upload(image_scan("scan.png")).expect("accepted");
        pipeline.clear();

        assert!(!pipeline.apply(&completed(request.ticket, true)));
        assert_eq!(pipeline.phase(), AnalysisPhase::Idle);
        assert!(!pipeline.has_scan());
        assert_eq!(pipeline.abnormality_detected(), None);
    }

    #[test]
    fn previews_follow_the_same_ticket_guard() {
        let mut pipeline = ScanPipeline::new();
        let request = pipeline.upload(image_scan("scan.png")).expect("accepted");

        let stale = AnalysisEvent::SlicePreview {
            ticket: request.ticket + 1,
            image: SliceImage {
                width: 1,
                height: 1,
                rgba: vec![0; 4],
            },
        };
        assert!(!pipeline.apply(&stale));

        let current = AnalysisEvent::SlicePreview {
            ticket: request.ticket,
            image: SliceImage {
                width: 1,
                height: 1,
                rgba: vec![0; 4],
            },
        };
        assert!(pipeline.apply(&current));
        assert!(pipeline.is_processing());
    }
}
