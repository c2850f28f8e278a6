use crate::settings::RuntimeSpec;
use crate::source::SourceRef;
use jiff::Zoned;
use regex::Regex;

const URL_PATTERN: &str = r#"https?://[^\s"')]+"#;

/// The shim text format: a tiny launcher that hands the pinned source URL to
/// the script runtime. The embedded URL is the single source of truth for
/// what is installed.
pub struct Shim;

impl Shim {
    /// POSIX shell shim.
    pub fn render(source: &SourceRef, runtime: &RuntimeSpec) -> String {
        let mut launcher = runtime.command.clone();
        for arg in &runtime.args {
            launcher.push(' ');
            launcher.push_str(arg);
        }

        format!(
            "#!/bin/sh\n# shimmy shim; installed {}\nexec {} '{}' \"$@\"\n",
            Zoned::now().strftime("%Y-%m-%dT%H:%M:%S%z"),
            launcher,
            source.as_str()
        )
    }

    /// Windows cmd shim.
    pub fn render_cmd(source: &SourceRef, runtime: &RuntimeSpec) -> String {
        let mut launcher = runtime.command.clone();
        for arg in &runtime.args {
            launcher.push(' ');
            launcher.push_str(arg);
        }

        format!(
            "@echo off\nrem shimmy shim; installed {}\n{} \"{}\" %*\n",
            Zoned::now().strftime("%Y-%m-%dT%H:%M:%S%z"),
            launcher,
            source.as_str()
        )
    }

    /// Recover the pinned source URL from shim contents.
    ///
    /// Accepts any launcher-shaped text file (shebang or cmd header) that
    /// embeds a single remote URL, so shims written by other installers are
    /// recognized too. Returns `None` for anything else, which is how the
    /// runtime binary and unrelated files in `bin/` are excluded.
    pub fn source_url(contents: &str) -> Option<String> {
        let first_line = contents.lines().next()?.trim_start();
        let launcher_shaped = first_line.starts_with("#!")
            || first_line.eq_ignore_ascii_case("@echo off")
            || first_line.to_ascii_lowercase().starts_with("@rem")
            || first_line.to_ascii_lowercase().starts_with("rem ");

        if !launcher_shaped {
            return None;
        }

        let url_re = Regex::new(URL_PATTERN).ok()?;
        url_re.find(contents).map(|m| m.as_str().to_string())
    }
}
