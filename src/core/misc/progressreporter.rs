use indicatif::*;

/// Terminal progress bar counting primitives handed to subtree builds.
///
/// `update` takes `&self` so one reporter can be shared by every build task.
pub struct ProgressReporter {
    pb: ProgressBar,
}

impl ProgressReporter {
    pub fn new(total_work: usize, title: &str) -> Self {
        let pb = ProgressBar::new(total_work as u64);
        let template = format!("{{spinner:.bold.green}} {}: ", title)
            + "[{wide_bar:.cyan}] {pos}/{len} ({elapsed_precise}|{eta_precise}) ";
        if let Ok(style) = ProgressStyle::with_template(&template) {
            pb.set_style(style.progress_chars("█▇▆▅▄▃▂▁  "));
        }
        pb.tick();
        ProgressReporter { pb }
    }

    pub fn hidden(total_work: usize) -> Self {
        let pb = ProgressBar::hidden();
        pb.set_length(total_work as u64);
        ProgressReporter { pb }
    }

    pub fn update(&self, num: usize) {
        if num != 0 {
            self.pb.inc(num as u64);
        }
    }

    pub fn position(&self) -> u64 {
        return self.pb.position();
    }

    pub fn done(&self) {
        self.pb.finish();
    }
}
