pub use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

pub struct Feedback {
    multi: MultiProgress,
}

impl Feedback {
    pub fn indeterminate_progress_bar(&self) -> ProgressBar {
        let pb = ProgressBar::new_spinner();

        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}").unwrap(),
        );

        self.multi.add(pb)
    }
}

impl Default for Feedback {
    fn default() -> Self {
        let multi = MultiProgress::new();
        Self { multi }
    }
}
