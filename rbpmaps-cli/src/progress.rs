use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

/// One tick per manifest row; the message names the row being processed.
pub fn batch_progress(len: usize) -> Result<ProgressBar> {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")?
            .progress_chars("##-"),
    );
    Ok(bar)
}
