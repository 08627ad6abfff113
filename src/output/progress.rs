//! In-place progress line for batch runs.
//!
//! A single rewritten terminal line showing a bar, the running count and
//! the file most recently finished. Updates are rate-limited so large
//! batches of tiny files do not spend their time repainting the
//! terminal. Disabled automatically when stdout is not a terminal.

use std::io::{self, IsTerminal, Write};
use std::time::{Duration, Instant};

const BAR_WIDTH: usize = 24;

/// Progress line for a batch of known size.
pub struct ProgressLine {
    total: usize,
    current: usize,
    enabled: bool,
    last_draw: Instant,
    min_interval: Duration,
}

impl ProgressLine {
    /// Create a progress line for `total` items, enabled only when
    /// stdout is a terminal.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            current: 0,
            enabled: total > 0 && io::stdout().is_terminal(),
            last_draw: Instant::now() - Duration::from_secs(1),
            min_interval: Duration::from_millis(100),
        }
    }

    /// Create a disabled progress line (no output).
    pub fn disabled() -> Self {
        Self {
            total: 0,
            current: 0,
            enabled: false,
            last_draw: Instant::now(),
            min_interval: Duration::from_millis(100),
        }
    }

    /// Record one completed item and redraw.
    ///
    /// # Arguments
    ///
    /// * `label` - Name of the item that just finished
    pub fn advance(&mut self, label: &str) {
        self.current += 1;
        if !self.enabled {
            return;
        }

        // Always draw the final state; rate-limit the rest.
        if self.current < self.total && self.last_draw.elapsed() < self.min_interval {
            return;
        }
        self.last_draw = Instant::now();
        self.draw(label);
    }

    /// Clear the progress line.
    pub fn finish(&mut self) {
        if !self.enabled {
            return;
        }
        print!("\r{:width$}\r", "", width = BAR_WIDTH + 48);
        io::stdout().flush().ok();
    }

    fn draw(&self, label: &str) {
        let filled = if self.total == 0 {
            BAR_WIDTH
        } else {
            BAR_WIDTH * self.current / self.total
        };
        let bar: String = "=".repeat(filled) + &" ".repeat(BAR_WIDTH - filled);

        // Keep the label short enough that the line never wraps.
        let label: String = label.chars().take(40).collect();

        print!(
            "\r[{bar}] {}/{} {label:<40}",
            self.current, self.total
        );
        io::stdout().flush().ok();
    }
}
