//! Console output: banners, system information, live progress and the final
//! result tables.

use std::time::Duration;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use sysinfo::System;

use crate::core::controller::BenchReport;
use crate::core::settings::BenchmarkSettings;
use crate::stats::{BenchResult, TemperatureSummary};

const WIDTH: usize = 60;

// ============================================================================
// BANNERS
// ============================================================================

pub fn print_banner(title: &str) {
    let separator = "=".repeat(WIDTH);
    println!("\n{}", separator);
    println!("{:^60}", title.bold().cyan());
    println!("{}\n", separator);
}

pub fn print_section(title: &str) {
    println!("{}", title.bold().yellow());
    println!("{}", "━".repeat(title.chars().count()));
}

// ============================================================================
// SYSTEM INFORMATION
// ============================================================================

pub fn print_system_info(adapter: &wgpu::AdapterInfo) {
    print_section("System Information");

    let mut sys = System::new();
    sys.refresh_cpu_all();
    sys.refresh_memory();

    let os = System::long_os_version().unwrap_or_else(|| "Unknown".to_string());
    let cpu = sys
        .cpus()
        .first()
        .map(|cpu| cpu.brand().trim().to_string())
        .filter(|brand| !brand.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());
    let memory_gb = sys.total_memory() as f64 / 1024.0 / 1024.0 / 1024.0;

    println!("OS:      {}", os);
    println!("CPU:     {} ({} logical cores)", cpu, sys.cpus().len());
    println!("Memory:  {:.1} GB", memory_gb);
    println!("GPU:     {} ({:?}, {:?})", adapter.name.bold(), adapter.backend, adapter.device_type);
    if !adapter.driver.is_empty() {
        println!("Driver:  {} {}", adapter.driver, adapter.driver_info);
    }
    println!();
}

pub fn print_settings(settings: &BenchmarkSettings) {
    print_section("Benchmark Configuration");
    println!("Duration:        {} s", settings.duration_seconds);
    println!("Triangles:       {}", settings.triangle_count);
    println!("Surface:         {}x{}", settings.width, settings.height);
    match settings.frame_interval() {
        Some(_) => println!("Frame rate cap:  {} Hz", settings.refresh_hz),
        None => println!("Frame rate cap:  uncapped"),
    }
    println!("Thermal polling: every {} ms", settings.poll_interval_ms);
    println!();
}

pub fn print_thermal_sources(sources: &[String]) {
    print_section("Thermal Sources");
    if sources.is_empty() {
        println!(
            "{} {}",
            "⚠".yellow(),
            "No readable temperature source; the run will have no thermal samples".yellow()
        );
    } else {
        for source in sources {
            println!("  • {}", source);
        }
    }
    println!();
}

// ============================================================================
// PROGRESS
// ============================================================================

/// Progress bar measured in milliseconds of benchmark time
pub fn progress_bar(duration: Duration) -> ProgressBar {
    let pb = ProgressBar::new(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX));
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message(temperature_message(&[]));
    pb
}

/// Short status line for the latest thermal sample
pub fn temperature_message(samples: &[f32]) -> String {
    match samples.last() {
        Some(latest) => format!("{:.1} °C ({} samples)", latest, samples.len()),
        None => "no temperature yet".to_string(),
    }
}

// ============================================================================
// RESULTS
// ============================================================================

pub fn results_table(result: &BenchResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Metric").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    let rows = [
        ("Average FPS", format!("{:.2}", result.average_fps)),
        ("Minimum FPS", format!("{:.2}", result.min_fps)),
        ("FPS Drop %", format!("{:.2}", result.fps_drop_percent)),
        ("Frames", result.frame_count.to_string()),
        ("FPS Std Dev", format!("{:.2}", result.fps_std_dev)),
    ];
    for (metric, value) in rows {
        table.add_row(vec![
            Cell::new(metric),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn temperature_table(summary: &TemperatureSummary) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Temperature").fg(Color::Cyan),
            Cell::new("°C").fg(Color::Cyan),
        ]);

    let rise_color = if summary.rise() > 0.0 { Color::Red } else { Color::Green };
    table
        .add_row(vec![Cell::new("Samples"), Cell::new(summary.samples).set_alignment(CellAlignment::Right)])
        .add_row(vec![Cell::new("First"), Cell::new(format!("{:.1}", summary.first)).set_alignment(CellAlignment::Right)])
        .add_row(vec![Cell::new("Last"), Cell::new(format!("{:.1}", summary.last)).set_alignment(CellAlignment::Right)])
        .add_row(vec![Cell::new("Min"), Cell::new(format!("{:.1}", summary.min)).set_alignment(CellAlignment::Right)])
        .add_row(vec![Cell::new("Max"), Cell::new(format!("{:.1}", summary.max)).set_alignment(CellAlignment::Right)])
        .add_row(vec![
            Cell::new("Rise"),
            Cell::new(format!("{:+.1}", summary.rise()))
                .fg(rise_color)
                .set_alignment(CellAlignment::Right),
        ]);
    table
}

pub fn print_report(report: &BenchReport) {
    print_section("Results");
    if report.result.is_degenerate() {
        println!("{}", "Fewer than two frames were rendered; no FPS figures available.".yellow());
    }
    println!("{}", results_table(&report.result));
    println!();

    match TemperatureSummary::from_samples(&report.temperatures) {
        Some(summary) => println!("{}", temperature_table(&summary)),
        None => println!("{}", "No temperature samples were collected.".yellow()),
    }
    println!();
}
