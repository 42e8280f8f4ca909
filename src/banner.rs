//! Startup banner and end-of-run summary for the CLI.

use crate::blade::SliceOutput;
use crate::consts::{AUTHOR, REPO, format_duration_ms};
use crate::terminal::color::*;
use crate::terminal::{blade_line, blade_print};

const KATANA: &str = r"
    +-----------------------------------------------------------+
    |                                                           |
    |   ____   ___  ____     _     ____ ___ ____  ___           |
    |  / ___| / _ \|  _ \   / \   / ___|_ _|  _ \|_ _|          |
    |  \___ \| | | | |_) | / _ \ | |  _ | || |_) || |           |
    |   ___) | |_| |  _ < / ___ \| |_| || ||  _ < | |           |
    |  |____/ \___/|_| \_/_/   \_\\____|___|_| \_\___|          |
    |                       空 斬 り                            |
    |                                                           |
    |               [ Watermark Slicing Engine ]                |
    +-----------------------------------------------------------+
";

/// Print the katana banner.
pub fn print_banner() {
    println!("{BLADE}{KATANA}{RESET}");
    println!(
        "    {DIM}v{}  {}  {}{RESET}",
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        REPO
    );
}

/// Print the target before the slice starts.
pub fn print_target(url: &str) {
    println!();
    blade_print(&format!("{DIM}Target acquired:{RESET}"));
    blade_print(&format!("{WHITE}{url}"));
    println!("  {DIM}|{RESET}");
}

/// Lines describing a successful slice.
pub fn success_lines(output: &SliceOutput) -> Vec<String> {
    let mut lines = vec![blade_line(&format!("{GREEN}{BOLD}SLICE COMPLETE"))];
    if let Some(path) = &output.output_path {
        lines.push(blade_line(&format!(
            "{DIM}Local File:{RESET} {WHITE}{}",
            path.display()
        )));
    }
    // Full URL so it's clickable in modern terminals
    lines.push(blade_line(&format!(
        "{DIM}Cloud Link:{RESET} {CYAN}{BOLD}{}",
        output.output_url
    )));
    if let Some(ms) = output.cost_time_ms.filter(|ms| *ms > 0) {
        lines.push(blade_line(&format!(
            "{DIM}Time Taken:{RESET} {GLOW}{}",
            format_duration_ms(ms)
        )));
    }
    lines
}

pub fn print_success(output: &SliceOutput) {
    println!("  {DIM}|{RESET}");
    for line in success_lines(output) {
        println!("{line}");
    }
    println!();
}

pub fn print_failure(error: &str) {
    println!("  {DIM}|{RESET}");
    blade_print(&format!("{RED}{BOLD}SLICE FAILED"));
    blade_print(&format!("{RED}{error}"));
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn output() -> SliceOutput {
        SliceOutput {
            task_id: "t".to_string(),
            output_url: "https://cdn/clean.mp4".to_string(),
            output_path: Some(PathBuf::from("out/clean.mp4")),
            cost_time_ms: Some(12_400),
        }
    }

    #[test]
    fn print_banner_does_not_panic() {
        print_banner();
        print_target("https://sora.chatgpt.com/p/1");
    }

    #[test]
    fn success_lines_include_everything() {
        let lines = success_lines(&output()).join("\n");
        assert!(lines.contains("SLICE COMPLETE"));
        assert!(lines.contains("out/clean.mp4"));
        assert!(lines.contains("https://cdn/clean.mp4"));
        assert!(lines.contains("12.4s"));
    }

    #[test]
    fn success_lines_skip_missing_fields() {
        let out = SliceOutput {
            output_path: None,
            cost_time_ms: None,
            ..output()
        };
        let lines = success_lines(&out);
        assert_eq!(lines.len(), 2);
        assert!(!lines.join("\n").contains("Local File"));
    }

    #[test]
    fn print_failure_does_not_panic() {
        print_failure("timed out after 60 status checks");
    }
}
