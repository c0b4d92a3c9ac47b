//! Terminal formatting.
//!
//! Formatting lives here so the store and compiler stay free of presentation
//! concerns, and output changes are localized.

use std::path::Path;
use std::time::Duration;

use crate::params::ModelConfiguration;
use crate::runner::RunReport;

const RULE_WIDTH: usize = 50;

fn opt_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "default".to_string())
}

/// Every parameter of `config`; the dust block is shown only when dust is included.
pub fn format_summary(config: &ModelConfiguration) -> String {
    let mut out = String::new();

    out.push_str(&format!("MAPPINGS Model: {}\n", config.name()));
    out.push_str(&format!("  Age index: {}\n", config.age_index()));
    out.push_str(&format!("  Geometry: {}\n", config.geometry()));
    out.push_str(&format!("  Log Pressure: {}\n", config.log_pressure()));
    out.push_str(&format!("  Log Temperature: {}\n", config.log_temperature()));
    out.push_str(&format!("  Filling Factor: {}\n", config.filling_factor()));
    out.push_str(&format!("  Log Ionization Parameter: {}\n", config.log_ionization()));
    out.push_str(&format!("  Step Size: {}\n", config.step_size()));
    out.push_str(&format!("  Log Luminosity: {}\n", config.log_luminosity()));
    out.push_str(&format!("  Abundance file: {}\n", opt_path(config.abundance_file())));
    out.push_str(&format!("  Depletion file: {}\n", opt_path(config.depletion_file())));
    out.push_str(&format!("  Spectrum file: {}\n", opt_path(config.spectrum_file())));

    let dust = config.dust();
    out.push_str(&format!("  Include dust: {}\n", dust.enabled));
    if dust.enabled {
        out.push_str(&format!(
            "    Dust depletion file: {}\n",
            dust.depletion_file
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "MISSING".to_string())
        ));
        out.push_str(&format!("    Allow grain destruction: {}\n", dust.allow_grain_destruction));
        out.push_str(&format!("    Grain distribution: {}\n", dust.grain_distribution));
        out.push_str(&format!("    PAH fraction: {}\n", dust.pah_fraction));
        out.push_str(&format!("    PAH switch value: {}\n", dust.pah_switch_value));
        out.push_str(&format!("    Evaluate dust temperatures: {}\n", dust.eval_temperature));
        out.push_str(&format!("    Graphite grains cospatial: {}\n", dust.graphite_cospatial));
    }

    out.push_str(&format!(
        "  Output path: {}\n",
        config
            .output_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "unset".to_string())
    ));

    out
}

/// Script text framed for terminal preview.
pub fn format_preview(script_text: &str) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    format!("Input file preview:\n{rule}\n{script_text}{rule}")
}

/// `Xm Y.YYs`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    let minutes = (secs / 60.0).floor();
    format!("{}m {:.2}s", minutes as u64, secs - minutes * 60.0)
}

pub fn format_run_report(report: &RunReport) -> String {
    let mut out = String::new();
    let outcome = if report.success() { "successfully run" } else { "failed" };
    out.push_str(&format!(
        "MAPPINGS model '{}' {} in {}\n",
        report.model,
        outcome,
        format_elapsed(report.elapsed)
    ));
    out.push_str(&format!("  Started: {}\n", report.started_at.format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("  Input: {}\n", report.input_file.display()));
    out.push_str(&format!(
        "  Exit code: {}\n",
        report
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "terminated by signal".to_string())
    ));
    if !report.stderr.trim().is_empty() {
        out.push_str("  stderr:\n");
        for line in report.stderr.lines() {
            out.push_str(&format!("    {line}\n"));
        }
    }
    out
}
