use crate::format::truncate_unicode;
use crate::system::sample::SessionSnapshot;

pub const TITLE: &str = "### Sessions/users ###";

pub fn render(out: &mut Vec<String>, snapshot: &SessionSnapshot, width: u16) {
    out.push(TITLE.to_string());
    for session in snapshot.iter() {
        out.push(truncate_unicode(&format!(" {session}"), usize::from(width)));
    }
    out.push(super::separator());
}
