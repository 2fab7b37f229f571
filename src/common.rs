use handlebars::{handlebars_helper, Handlebars};

use std::fs;
use std::path::Path;

/// Writes `content` to `filename`, creating missing parent directories.
pub fn write_string_to_file(filename: impl AsRef<Path>, content: &str) -> std::io::Result<()> {
    let path = filename.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

pub fn get_handlebars() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();

    // Coordinates in SVG output are written with two decimals.
    handlebars_helper!(fixed: |v: f64| format!("{:.2}", v));
    handlebars.register_helper("fixed", Box::new(fixed));

    handlebars_helper!(pluralize: |count: u64, word: String| {
        if count == 1 { format!("{} {}", count, word) } else { format!("{} {}s", count, word) }
    });
    handlebars.register_helper("pluralize", Box::new(pluralize));

    handlebars
}
