///
/// ScannerConfig
///
/// Scanner-wide policy shared by every iterator the scanner builds.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScannerConfig {
    auto_save_interval: u64,
}

impl ScannerConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            auto_save_interval: 0,
        }
    }

    /// Persist an iterator's checkpoint every `rows` consumed rows.
    /// `0` disables auto-save.
    #[must_use]
    pub const fn with_auto_save_interval(mut self, rows: u64) -> Self {
        self.auto_save_interval = rows;
        self
    }

    #[must_use]
    pub const fn auto_save_interval(&self) -> u64 {
        self.auto_save_interval
    }

    #[must_use]
    pub const fn auto_save_enabled(&self) -> bool {
        self.auto_save_interval > 0
    }
}
