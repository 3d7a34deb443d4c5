use crate::config::RunConfig;

pub fn render(out: &mut Vec<String>, config: &RunConfig, iteration: usize, self_memory_kb: Option<u64>) {
    if config.sequential_mode {
        out.push(String::new());
        out.push(format!(">>> iteration {iteration}"));
    } else {
        out.push(format!(
            "Nbr of samples: {} -- every {} secs",
            config.sample_count, config.interval_secs
        ));
    }
    match self_memory_kb {
        Some(kb) => out.push(format!(" Memory usage: {kb} kilobytes")),
        None => out.push(" Memory usage: unavailable".to_string()),
    }
    out.push(super::separator());
}
