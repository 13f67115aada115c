//! Standalone vmscan trace decoder tool
//!
//! Decodes an ftrace text log and prints every reclaim slice, followed by
//! per-label totals.
//!
//! Usage:
//!   cargo run --example decode_trace -- <trace.txt> [--limit <count>]

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use vmscan_decoder::{DecoderConfig, Importer, Slice};

#[derive(Default)]
struct LabelTotals {
    count: usize,
    total_ms: f64,
    max_ms: f64,
}

fn print_slice(pid: u32, slice: &Slice) {
    let args = slice
        .args
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ");
    println!(
        "[{:.6}s] pid {:<6} {:<16} {:>10.3}ms  {}",
        slice.start / 1000.0,
        pid,
        slice.title,
        slice.duration,
        args
    );
}

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        eprintln!("Usage: decode_trace <trace.txt> [--limit <count>]");
        std::process::exit(2);
    };
    let mut limit = usize::MAX;
    while let Some(arg) = args.next() {
        if arg == "--limit" {
            limit = args.next().and_then(|v| v.parse().ok()).unwrap_or(limit);
        }
    }

    let mut importer = match Importer::new(DecoderConfig::new()) {
        Ok(importer) => importer,
        Err(e) => {
            eprintln!("Failed to create importer: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = importer.import_file(&path) {
        eprintln!("Failed to import {:?}: {}", path, e);
        std::process::exit(1);
    }
    let timeline = importer.finish();

    let mut totals: HashMap<String, LabelTotals> = HashMap::new();
    let mut printed = 0;
    for thread in &timeline.threads {
        for slice in thread.slices() {
            if printed < limit {
                print_slice(thread.pid, slice);
                printed += 1;
            }
            let entry = totals.entry(slice.title.clone()).or_default();
            entry.count += 1;
            entry.total_ms += slice.duration;
            entry.max_ms = entry.max_ms.max(slice.duration);
        }
    }

    println!("\n=== RECLAIM SUMMARY ===");
    println!("Events processed: {}", timeline.stats.events);
    println!("Slices emitted:   {}", timeline.stats.slices);
    println!("Still open:       {}", timeline.open_intervals.len());

    let mut sorted: Vec<_> = totals.iter().collect();
    sorted.sort_by(|a, b| b.1.total_ms.total_cmp(&a.1.total_ms));
    for (label, t) in sorted.iter().take(10) {
        println!(
            "  {:<16} {:>5} slices  total {:>10.3}ms  max {:>8.3}ms",
            label, t.count, t.total_ms, t.max_ms
        );
    }
}
