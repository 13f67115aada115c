//! Report generation
//!
//! Renders decoded reclaim timelines as plain text or JSON.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{self, Write};
use std::path::PathBuf;
use vmscan_decoder::{Timeline, VERSION};

/// Timeline decoded from one input file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub timeline: Timeline,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    decoder_version: &'static str,
    files: &'a [FileReport],
}

/// Render reports as a JSON document
pub fn render_json(reports: &[FileReport], generated_at: DateTime<Utc>) -> Result<String> {
    let doc = JsonReport {
        generated_at: generated_at.to_rfc3339(),
        decoder_version: VERSION,
        files: reports,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Render reports as plain text tables
pub fn render_txt(reports: &[FileReport], generated_at: DateTime<Utc>) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "vmscan reclaim report")?;
    writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(out, "Decoder:   v{}", VERSION)?;

    for report in reports {
        write_file_section(&mut out, report)?;
    }

    Ok(out)
}

fn write_file_section(out: &mut String, report: &FileReport) -> fmt::Result {
    let timeline = &report.timeline;
    writeln!(out)?;
    writeln!(out, "=== {} ===", report.path.display())?;

    for thread in &timeline.threads {
        if thread.slices().is_empty() {
            continue;
        }
        writeln!(out, "\n[{}] {}", thread.pid, thread.name)?;
        writeln!(
            out,
            "  {:<16} {:>16} {:>12}  {}",
            "SLICE", "START (ms)", "DUR (ms)", "ARGS"
        )?;
        for slice in thread.slices() {
            let args = slice
                .args
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(
                out,
                "  {:<16} {:>16.6} {:>12.6}  {}",
                slice.title, slice.start, slice.duration, args
            )?;
        }
    }

    if !timeline.open_intervals.is_empty() {
        writeln!(out, "\nStill open at end of trace:")?;
        for open in &timeline.open_intervals {
            writeln!(
                out,
                "  {}: {} (pid {}) since {:.6}",
                open.category, open.label, open.pid, open.since
            )?;
        }
    }

    let stats = &timeline.stats;
    writeln!(out, "\nSummary:")?;
    writeln!(out, "  Lines:            {}", stats.lines)?;
    writeln!(out, "  Malformed lines:  {}", stats.malformed_lines)?;
    writeln!(out, "  Events:           {}", stats.events)?;
    writeln!(out, "  Handled:          {}", stats.handled_events)?;
    writeln!(out, "  Unrecognized:     {}", stats.unhandled_events)?;
    writeln!(out, "  Other events:     {}", stats.unknown_events)?;
    writeln!(out, "  Slices:           {}", stats.slices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use vmscan_decoder::{DecoderConfig, Importer};

    const TRACE: &str = "\
 kswapd0-47 [000] .... 1.000000: mm_vmscan_kswapd_wake: nid=0 order=2
 kswapd0-47 [000] .... 1.005000: mm_vmscan_kswapd_sleep: nid=0
    java-9  [001] .... 1.006000: mm_vmscan_direct_reclaim_begin: order=0 may_writepage=1 gfp_flags=GFP_KERNEL
";

    fn reports() -> Vec<FileReport> {
        let mut importer = Importer::new(DecoderConfig::new()).unwrap();
        importer.import_str(TRACE);
        vec![FileReport {
            path: PathBuf::from("trace.txt"),
            timeline: importer.finish(),
        }]
    }

    fn when() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_txt_report_contents() {
        let text = render_txt(&reports(), when()).unwrap();
        assert!(text.contains("Generated: 2024-05-01 12:00:00 UTC"));
        assert!(text.contains("=== trace.txt ==="));
        assert!(text.contains("[47] kswapd: kswapd0"));
        assert!(text.contains("order=2"));
        assert!(text.contains("direct reclaim: java (pid 9)"));
        assert!(text.contains("Slices:           1"));
        assert!(text.ends_with("Slices:           1\n"));
    }

    #[test]
    fn test_txt_report_one_section_per_file() {
        let mut both = reports();
        let timeline = both[0].timeline.clone();
        both.push(FileReport {
            path: PathBuf::from("second.txt"),
            timeline,
        });
        let text = render_txt(&both, when()).unwrap();
        assert_eq!(text.matches("Summary:").count(), 2);
        assert!(text.contains("=== second.txt ==="));
    }

    #[test]
    fn test_json_report_structure() {
        let json = render_json(&reports(), when()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["decoder_version"], VERSION);
        assert_eq!(value["files"][0]["path"], "trace.txt");
        assert_eq!(
            value["files"][0]["timeline"]["threads"][0]["slices"][0]["args"]["order"],
            2
        );
    }
}
