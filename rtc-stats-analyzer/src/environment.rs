//! Host environment seam.
//!
//! Quality events report the screen and application window geometry of the
//! host. The analyzer has no display access of its own, so the embedding
//! application supplies it through [`HostEnvironment`].

/// Width and height in pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(width: u32, height: u32) -> Self {
        Geometry { width, height }
    }

    /// Pixel count.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Read at quality event assembly time.
pub trait HostEnvironment: Send {
    fn screen_geometry(&self) -> Option<Geometry>;
    fn app_window_geometry(&self) -> Option<Geometry>;
}

/// An environment without display information. Geometry reports as zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnknownEnvironment;

impl HostEnvironment for UnknownEnvironment {
    fn screen_geometry(&self) -> Option<Geometry> {
        None
    }

    fn app_window_geometry(&self) -> Option<Geometry> {
        None
    }
}

/// An environment with fixed geometry, for hosts that never resize.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FixedEnvironment {
    pub screen: Option<Geometry>,
    pub app_window: Option<Geometry>,
}

impl HostEnvironment for FixedEnvironment {
    fn screen_geometry(&self) -> Option<Geometry> {
        self.screen
    }

    fn app_window_geometry(&self) -> Option<Geometry> {
        self.app_window
    }
}
