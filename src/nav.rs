/// Mobile menu and the dimming overlay behind it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavOverlay {
    menu_shown: bool,
}

impl NavOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hamburger click: flips menu and overlay together.
    pub fn toggle(&mut self) -> bool {
        self.menu_shown = !self.menu_shown;
        self.menu_shown
    }

    /// Overlay click: closes both.
    pub fn dismiss(&mut self) {
        self.menu_shown = false;
    }

    pub fn menu_shown(&self) -> bool {
        self.menu_shown
    }

    pub fn overlay_active(&self) -> bool {
        self.menu_shown
    }
}
