use crate::format::Uptime;
use crate::system::info::SystemInfo;

pub fn render(out: &mut Vec<String>, info: &SystemInfo) {
    out.push(super::separator());
    out.push("### System Information ###".to_string());
    out.push(format!(" System Name = {}", info.system_name));
    out.push(format!(" Machine Name = {}", info.machine_name));
    out.push(format!(" Version = {}", info.version));
    out.push(format!(" Release = {}", info.release));
    out.push(format!(" Architecture = {}", info.architecture));
    out.push(format!(
        " System running since last reboot: {}",
        Uptime::from_secs(info.uptime_secs)
    ));
    out.push(super::separator());
}
