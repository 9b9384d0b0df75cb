use std::path::Path;

use console::Style;
use phasecorr_core::{PhaseCorrelationPeak, Registration, RegistrationParams};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    best: Style,
    rejected: Style,
    warning: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            best: Style::new().green().bold(),
            rejected: Style::new().dim().yellow(),
            warning: Style::new().red().bold(),
            path: Style::new().underlined(),
        }
    }
}

fn format_ints(values: &[i64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("({})", parts.join(", "))
}

fn format_floats(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v:.3}")).collect();
    format!("({})", parts.join(", "))
}

fn format_shift(peak: &PhaseCorrelationPeak) -> String {
    match (&peak.subpixel_shift, &peak.shift) {
        (Some(sub), _) => format_floats(sub),
        (None, Some(shift)) => format_ints(shift),
        (None, None) => "-".to_string(),
    }
}

pub fn print_registration_summary(
    img1: &Path,
    img2: &Path,
    pcm_dims: &[usize],
    params: &RegistrationParams,
    registration: &Registration,
    show: usize,
) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Phase Correlation"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(17)));
    println!();

    println!("  {:<14}{}", s.label.apply_to("Image 1"), s.path.apply_to(img1.display()));
    println!("  {:<14}{}", s.label.apply_to("Image 2"), s.path.apply_to(img2.display()));
    let dims: Vec<i64> = pcm_dims.iter().map(|&d| d as i64).collect();
    println!("  {:<14}{}", s.label.apply_to("PCM"), s.value.apply_to(format_ints(&dims)));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Peaks"),
        s.value.apply_to(params.max_peaks)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Min overlap"),
        s.value.apply_to(&params.min_overlap)
    );
    println!();

    println!("  {}", s.header.apply_to("Hypotheses"));
    println!(
        "    {:<4}{:<22}{:<16}{:<12}{:<12}",
        s.label.apply_to("#"),
        s.label.apply_to("shift"),
        s.label.apply_to("pcm"),
        s.label.apply_to("r"),
        s.label.apply_to("overlap")
    );
    for (rank, peak) in registration.peaks.iter().take(show).enumerate() {
        let style = if peak.is_rejected() {
            &s.rejected
        } else if rank == 0 {
            &s.best
        } else {
            &s.value
        };
        let r = if peak.is_rejected() {
            "rejected".to_string()
        } else {
            format!("{:.4}", peak.cross_correlation)
        };
        println!(
            "    {:<4}{:<22}{:<16}{:<12}{:<12}",
            style.apply_to(rank + 1),
            style.apply_to(format_shift(peak)),
            style.apply_to(format!("{:.4}", peak.phase_correlation)),
            style.apply_to(r),
            style.apply_to(peak.n_pixel)
        );
    }
    if registration.peaks.len() > show {
        println!(
            "    {}",
            s.label
                .apply_to(format!("... {} more", registration.peaks.len() - show))
        );
    }
    println!();

    match registration.best() {
        Some(best) => println!(
            "  {:<14}{}",
            s.label.apply_to("Shift"),
            s.best.apply_to(format_shift(best))
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Shift"),
            s.rejected.apply_to("none overlaps both images")
        ),
    }
    if registration.is_partial() {
        println!(
            "  {}",
            s.warning.apply_to(format!(
                "{} parallel task(s) failed; the ranking may be incomplete",
                registration.failed_tasks
            ))
        );
    }
    println!();
}

pub fn print_hypotheses(offset: &[i64], shifts: &[Vec<i64>]) {
    let s = Styles::new();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Offset"),
        s.value.apply_to(format_ints(offset))
    );
    for (i, shift) in shifts.iter().enumerate() {
        println!("    {:<4}{}", s.label.apply_to(i), s.value.apply_to(format_ints(shift)));
    }
}
