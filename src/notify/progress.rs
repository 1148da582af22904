use indicatif::ProgressStyle;

/// Spinner shown while a long step (the first bootstrap) is running.
/// - Yellow braille frames followed by the current message.
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[33m{spinner}\x1b[0m {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"])
}

/// Green check mark followed by the final message.
pub fn ok_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[32m✔\x1b[0m {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Red cross followed by the final message.
pub fn err_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[31m✘\x1b[0m {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
