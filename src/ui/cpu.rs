use super::trend::Trend;
use crate::system::history::Series;
use crate::system::sample::CpuSample;

/// One bar per whole percent, after a fixed `|||` base.
pub fn bar(sample: &CpuSample) -> String {
    let whole = sample.utilization_percent.clamp(0.0, 100.0) as usize;
    let mut bar = String::from("|||");
    bar.extend(std::iter::repeat_n('|', whole));
    bar
}

pub fn graph_row(previous: Option<&CpuSample>, current: &CpuSample) -> String {
    let trend = Trend::between(
        previous.map(CpuSample::utilization_fraction),
        current.utilization_fraction(),
    );
    format!(
        "\t{} {:.2} {trend}",
        bar(current),
        current.utilization_percent
    )
}

pub fn render(out: &mut Vec<String>, series: &Series<CpuSample>, graphics: bool, sequential: bool) {
    let Some(latest) = series.latest() else {
        out.push("Number of cores: ".to_string());
        return;
    };
    out.push(format!("Number of cores: {}", latest.core_count));
    out.push(format!(" total cpu use = {:.2}%", latest.utilization_percent));
    if !graphics {
        return;
    }

    let last = series.len() - 1;
    for (index, (previous, current)) in series.with_previous().enumerate() {
        if sequential && index != last {
            out.push(String::new());
        } else {
            out.push(graph_row(previous, current));
        }
    }
}
