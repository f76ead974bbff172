use std::time::{Duration, Instant};

use crate::anatomy::cortex::CortexParams;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ViewMode {
    ThreeD,
    Axial,
    Coronal,
    Sagittal,
}

impl ViewMode {
    pub const ALL: [ViewMode; 4] = [
        ViewMode::ThreeD,
        ViewMode::Axial,
        ViewMode::Coronal,
        ViewMode::Sagittal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::ThreeD => "3D View",
            ViewMode::Axial => "Axial",
            ViewMode::Coronal => "Coronal",
            ViewMode::Sagittal => "Sagittal",
        }
    }
}

/// The window system owning fullscreen. Requests are fire-and-forget; the
/// host answers later through `fullscreen_active`, and may also leave
/// fullscreen on its own.
pub trait FullscreenHost {
    fn request_fullscreen(&self, enabled: bool);
    fn fullscreen_active(&self) -> bool;
}

impl FullscreenHost for winit::window::Window {
    fn request_fullscreen(&self, enabled: bool) {
        self.set_fullscreen(enabled.then(|| winit::window::Fullscreen::Borderless(None)));
    }

    fn fullscreen_active(&self) -> bool {
        self.fullscreen().is_some()
    }
}

/// Which projection is on screen and whether the viewer fills the screen.
/// Fullscreen tracks an optimistic flag that `sync_fullscreen` reconciles
/// against what the host actually did.
pub struct ViewState {
    pub mode: ViewMode,
    pub fullscreen: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            mode: ViewMode::ThreeD,
            fullscreen: false,
        }
    }
}

impl ViewState {
    pub fn select_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    pub fn toggle_fullscreen(&mut self, host: &dyn FullscreenHost) {
        self.fullscreen = !self.fullscreen;
        host.request_fullscreen(self.fullscreen);
    }

    pub fn sync_fullscreen(&mut self, host: &dyn FullscreenHost) {
        let actual = host.fullscreen_active();
        if actual != self.fullscreen {
            log::debug!("fullscreen reconciled to host state ({actual})");
            self.fullscreen = actual;
        }
    }
}

const NOTICE_TTL: Duration = Duration::from_secs(4);

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// A short status line that fades out on its own, the closest thing the
/// panel has to a toast.
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    created: Instant,
}

impl Notice {
    pub fn new(text: impl Into<String>, kind: NoticeKind) -> Self {
        Self {
            text: text.into(),
            kind,
            created: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created.elapsed() >= NOTICE_TTL
    }
}

pub struct ChatMessage {
    pub from_user: bool,
    pub text: String,
}

pub struct UiState {
    pub radius: f32,
    pub resolution: u32,
    pub fold_frequency: f32,
    pub fold_amplitude: f32,
    pub needs_rebuild: bool,
    pub synthesis_summary: String,
    pub synthesis_error: Option<String>,

    pub vsync_enabled: bool,

    pub path_input: String,
    pub upload_notice: Option<Notice>,
    pub analysis_notice: Option<Notice>,

    pub report_text: String,
    pub report_pending: Option<(Instant, bool)>,

    pub qa_input: String,
    pub qa_log: Vec<ChatMessage>,
    pub qa_pending: Option<(Instant, String)>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            radius: 2.0,
            resolution: 128,
            fold_frequency: 3.0,
            fold_amplitude: 0.2,
            needs_rebuild: true,
            synthesis_summary: String::new(),
            synthesis_error: None,

            vsync_enabled: true,

            path_input: String::new(),
            upload_notice: None,
            analysis_notice: None,

            report_text: String::new(),
            report_pending: None,

            qa_input: String::new(),
            qa_log: Vec::new(),
            qa_pending: None,
        }
    }
}

impl UiState {
    pub fn cortex_params(&self) -> CortexParams {
        CortexParams {
            radius: self.radius,
            resolution: self.resolution,
            fold_frequency: self.fold_frequency,
            fold_amplitude: self.fold_amplitude,
        }
    }

    pub fn prune_notices(&mut self) {
        if self.upload_notice.as_ref().is_some_and(Notice::is_expired) {
            self.upload_notice = None;
        }
        if self.analysis_notice.as_ref().is_some_and(Notice::is_expired) {
            self.analysis_notice = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Host that honors every request immediately.
    struct ObedientHost {
        active: Cell<bool>,
        requests: RefCell<Vec<bool>>,
    }

    impl ObedientHost {
        fn new() -> Self {
            Self {
                active: Cell::new(false),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl FullscreenHost for ObedientHost {
        fn request_fullscreen(&self, enabled: bool) {
            self.requests.borrow_mut().push(enabled);
            self.active.set(enabled);
        }

        fn fullscreen_active(&self) -> bool {
            self.active.get()
        }
    }

    /// Host that silently ignores every request.
    struct DeafHost;

    impl FullscreenHost for DeafHost {
        fn request_fullscreen(&self, _enabled: bool) {}

        fn fullscreen_active(&self) -> bool {
            false
        }
    }

    #[test]
    fn starts_windowed_in_three_d() {
        let state = ViewState::default();
        assert_eq!(state.mode, ViewMode::ThreeD);
        assert!(!state.fullscreen);
    }

    #[test]
    fn every_mode_switch_is_legal() {
        for from in ViewMode::ALL {
            for to in ViewMode::ALL {
                let mut state = ViewState {
                    mode: from,
                    fullscreen: true,
                };
                state.select_mode(to);
                assert_eq!(state.mode, to);
                assert!(state.fullscreen, "mode switches must not touch fullscreen");
            }
        }
    }

    #[test]
    fn toggle_flips_optimistically_and_asks_the_host() {
        let host = ObedientHost::new();
        let mut state = ViewState::default();

        state.toggle_fullscreen(&host);
        assert!(state.fullscreen);
        state.sync_fullscreen(&host);
        assert!(state.fullscreen);

        state.toggle_fullscreen(&host);
        assert!(!state.fullscreen);
        assert_eq!(*host.requests.borrow(), vec![true, false]);
    }

    #[test]
    fn external_exit_wins_on_sync() {
        let host = ObedientHost::new();
        let mut state = ViewState::default();

        state.toggle_fullscreen(&host);
        assert!(state.fullscreen);

        // The user leaves fullscreen through the window system directly.
        host.active.set(false);
        state.sync_fullscreen(&host);
        assert!(!state.fullscreen);
    }

    #[test]
    fn mode_survives_a_fullscreen_round_trip() {
        let host = ObedientHost::new();
        let mut state = ViewState::default();

        state.select_mode(ViewMode::Axial);
        assert_eq!(state.mode, ViewMode::Axial);
        assert!(!state.fullscreen);

        state.toggle_fullscreen(&host);
        assert_eq!(state.mode, ViewMode::Axial);
        assert!(state.fullscreen);

        host.active.set(false);
        state.sync_fullscreen(&host);
        assert_eq!(state.mode, ViewMode::Axial);
        assert!(!state.fullscreen);
    }

    #[test]
    fn denied_request_rolls_back_on_sync() {
        let host = DeafHost;
        let mut state = ViewState::default();

        state.toggle_fullscreen(&host);
        assert!(state.fullscreen);

        state.sync_fullscreen(&host);
        assert!(!state.fullscreen);
    }

    #[test]
    fn cortex_params_mirror_the_controls() {
        let mut ui = UiState::default();
        ui.radius = 1.5;
        ui.resolution = 96;
        ui.fold_frequency = 4.0;
        ui.fold_amplitude = 0.1;

        let params = ui.cortex_params();
        assert_eq!(params.radius, 1.5);
        assert_eq!(params.resolution, 96);
        assert_eq!(params.fold_frequency, 4.0);
        assert_eq!(params.fold_amplitude, 0.1);
    }

    #[test]
    fn default_controls_match_the_reference_head() {
        let params = UiState::default().cortex_params();
        assert_eq!(params.radius, 2.0);
        assert_eq!(params.resolution, 128);
        assert_eq!(params.fold_frequency, 3.0);
        assert_eq!(params.fold_amplitude, 0.2);
    }
}
