//! Batch progress line on stderr.

use std::io::Write;

use flowdraw_render_engine::{BatchProgress, ProgressCallback};

const BAR_WIDTH: usize = 30;

/// `[flowdraw] Processing [#####     ] 50% 1.2s`
pub fn render_line(progress: &BatchProgress) -> String {
    let fraction = progress.fraction().clamp(0.0, 1.0);
    let filled = ((fraction * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    format!(
        "[flowdraw] Processing [{}{}] {:.0}% {:.1}s",
        "#".repeat(filled),
        " ".repeat(BAR_WIDTH - filled),
        fraction * 100.0,
        progress.elapsed.as_secs_f64()
    )
}

/// Callback that redraws the progress line in place.
pub fn stderr_reporter() -> ProgressCallback {
    Box::new(|p: BatchProgress| {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{}", render_line(&p));
        if p.completed >= p.total {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    })
}
