/// Distance from the bottom, in pixels, still counted as "at the latest message".
pub const SCROLL_THRESHOLD_PX: f64 = 100.0;

/// Scroll metrics of the message surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_top: f64,
    pub client_height: f64,
    pub scroll_height: f64,
}

impl Viewport {
    /// A surface whose content fits or that always follows its tail.
    pub fn at_bottom() -> Self {
        Self { scroll_top: 0.0, client_height: 0.0, scroll_height: 0.0 }
    }

    pub fn is_near_bottom(&self, threshold: f64) -> bool {
        self.scroll_height - self.scroll_top <= self.client_height + threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAction {
    ScrollToLatest,
    ShowIndicator,
}

#[derive(Debug, Clone)]
pub struct ScrollTracker {
    threshold: f64,
    scrolled_away: bool,
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self::new(SCROLL_THRESHOLD_PX)
    }
}

impl ScrollTracker {
    pub fn new(threshold: f64) -> Self {
        Self { threshold, scrolled_away: false }
    }

    pub fn scrolled_away(&self) -> bool {
        self.scrolled_away
    }

    pub fn on_scroll(&mut self, viewport: Viewport) {
        self.scrolled_away = !viewport.is_near_bottom(self.threshold);
    }

    pub fn on_new_content(&mut self, viewport: Viewport) -> ScrollAction {
        self.on_scroll(viewport);
        if self.scrolled_away { ScrollAction::ShowIndicator } else { ScrollAction::ScrollToLatest }
    }

    pub fn jump_to_latest(&mut self) {
        self.scrolled_away = false;
    }
}
