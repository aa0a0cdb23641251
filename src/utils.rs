use indicatif::ProgressStyle;
use indicatif::style::TemplateError;

/// Bar shown for a whole update pass.
pub(crate) fn get_style_pass() -> Result<ProgressStyle, TemplateError> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
        .progress_chars("=>-"))
}

/// Spinner shown while a single node runs.
pub(crate) fn get_style_node() -> Result<ProgressStyle, TemplateError> {
    ProgressStyle::with_template("{spinner:.green} {msg}")
}
