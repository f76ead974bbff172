pub mod panels;
pub mod state;
pub mod theme;

pub use panels::{UiActions, draw_side_panel, draw_viewer_chrome};
pub use state::{FullscreenHost, UiState, ViewMode, ViewState};
pub use theme::apply_theme;
