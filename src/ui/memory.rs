use super::trend::Trend;
use crate::format::format_gib;
use crate::system::history::Series;
use crate::system::sample::MemorySample;

pub const TITLE: &str = "### Memory ### (Phys.Used/Tot -- Virtual Used/Tot)";

pub fn row(sample: &MemorySample) -> String {
    format!(
        "{} / {}  -- {} / {}",
        format_gib(sample.physical_used_gib),
        format_gib(sample.physical_total_gib),
        format_gib(sample.virtual_used_gib),
        format_gib(sample.virtual_total_gib),
    )
}

/// Graph suffix tracking virtual memory movement since the previous row.
pub fn graph(previous: Option<&MemorySample>, current: &MemorySample) -> String {
    let trend = Trend::between(previous.map(|p| p.virtual_used_gib), current.virtual_used_gib);
    format!(
        "     |{trend} {:.2} ({:.2})",
        trend.delta, current.virtual_used_gib
    )
}

/// History rows, oldest first. `remaining` blank lines reserve space for
/// iterations still to come.
pub fn render(
    out: &mut Vec<String>,
    series: &Series<MemorySample>,
    graphics: bool,
    sequential: bool,
    remaining: usize,
) {
    out.push(TITLE.to_string());
    let last = series.len().saturating_sub(1);
    for (index, (previous, current)) in series.with_previous().enumerate() {
        if sequential && index != last {
            out.push(String::new());
            continue;
        }
        let mut line = row(current);
        if graphics {
            line.push_str(&graph(previous, current));
        }
        out.push(line);
    }
    if !sequential {
        out.extend(std::iter::repeat_n(String::new(), remaining));
    }
    out.push(super::separator());
}
