use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

/// Where flows send human-readable progress. The caller decides how it is
/// shown.
pub trait Reporter: Send + Sync {
    fn info(&self, msg: &str);
    fn success(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
    /// `current` is 1-based.
    fn progress(&self, current: usize, total: usize, label: &str);
    fn finish(&self);
}

/// Log lines through `tracing`, results on stdout, bulk progress as a bar.
#[derive(Default)]
pub struct ConsoleReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_bar(&self, f: impl FnOnce(&mut Option<ProgressBar>)) {
        if let Ok(mut guard) = self.bar.lock() {
            f(&mut guard);
        }
    }
}

impl Reporter for ConsoleReporter {
    fn info(&self, msg: &str) {
        info!("{}", msg);
    }

    fn success(&self, msg: &str) {
        self.with_bar(|bar| match bar {
            Some(pb) => pb.println(msg),
            None => println!("{}", msg),
        });
    }

    fn warn(&self, msg: &str) {
        warn!("{}", msg);
    }

    fn error(&self, msg: &str) {
        error!("{}", msg);
    }

    fn progress(&self, current: usize, total: usize, label: &str) {
        self.with_bar(|bar| {
            let pb = bar.get_or_insert_with(|| {
                let pb = ProgressBar::new(total as u64);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
                {
                    pb.set_style(style.progress_chars("=> "));
                }
                pb
            });
            pb.set_length(total as u64);
            pb.set_position(current as u64);
            pb.set_message(label.to_string());
        });
    }

    fn finish(&self) {
        self.with_bar(|bar| {
            if let Some(pb) = bar.take() {
                pb.finish_and_clear();
            }
        });
    }
}
