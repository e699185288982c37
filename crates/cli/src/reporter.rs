//! Terminal progress for a deployment run

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use sitepilot_core::{ContentItem, Distribution, Error, Reporter, Stage};
use std::sync::Mutex;
use std::time::Duration;

/// Spinner per stage, one line per uploaded object
pub struct ConsoleReporter {
    current: Mutex<Option<(Stage, ProgressBar)>>,
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            current: Mutex::new(None),
            verbose,
        }
    }

    fn spinner(message: &'static str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(template);
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    fn println(&self, line: String) {
        match self.current.lock() {
            Ok(guard) => match guard.as_ref() {
                Some((_, pb)) => pb.println(line),
                None => println!("{}", line),
            },
            Err(_) => println!("{}", line),
        }
    }
}

fn label(stage: Stage) -> &'static str {
    match stage {
        Stage::Idle => "Starting",
        Stage::Preflight => "Checking site folder and bucket",
        Stage::Syncing => "Uploading files",
        Stage::Locking => "Locking bucket private",
        Stage::ProvisioningCdn => "Creating CloudFront distribution",
        Stage::BindingPolicy => "Attaching bucket policy",
        Stage::Invalidating => "Invalidating CloudFront cache",
        Stage::Done => "Done",
    }
}

/// `Uploaded: <key>`, with the cache policy when verbose
fn upload_line(item: &ContentItem, verbose: bool) -> String {
    let mut line = format!("  {} Uploaded: {}", style("↑").cyan(), item.storage_key);
    if verbose {
        line.push_str(&format!(" ({})", item.cache_control));
    }
    line
}

fn distribution_line(distribution: &Distribution) -> String {
    format!(
        "  {} Distribution {} created: {}",
        style("✓").green(),
        distribution.id,
        distribution.url()
    )
}

impl Reporter for ConsoleReporter {
    fn stage(&self, stage: Stage) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };

        if let Some((previous, pb)) = current.take() {
            pb.finish_with_message(format!("✅ {}", label(previous)));
        }

        if stage != Stage::Done {
            *current = Some((stage, Self::spinner(label(stage))));
        }
    }

    fn uploaded(&self, item: &ContentItem) {
        self.println(upload_line(item, self.verbose));
    }

    fn distribution_created(&self, distribution: &Distribution) {
        self.println(distribution_line(distribution));
    }

    fn invalidation_skipped(&self) {
        self.println(format!(
            "  {} No distribution id, cache invalidation skipped",
            style("⚠️").yellow()
        ));
    }

    fn aborted(&self, stage: Stage, _error: &Error) {
        if let Ok(mut current) = self.current.lock() {
            match current.take() {
                Some((_, pb)) => pb.abandon_with_message(format!("❌ {}", label(stage))),
                None => eprintln!("❌ {}", label(stage)),
            }
        }
    }
}
