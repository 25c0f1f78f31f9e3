use std::time::Duration;

/// Format a remaining duration as `MM:SS.d`.
///
/// Minutes and whole seconds are zero-padded to two digits and followed by the
/// truncated tenths of a second: 68.5 s becomes `01:08.5`.
pub fn format_clock(remaining: Duration) -> String {
    let tenths = remaining.as_millis() / 100;
    let minutes = tenths / 600;
    let seconds = (tenths / 10) % 60;
    format!("{:02}:{:02}.{}", minutes, seconds, tenths % 10)
}
