use std::time::Duration;

/// Formats a play time as `HH:MM:SS.mmm`, widening the hour field past 99.
pub fn time_str(duration: Duration) -> String {
    let ms = duration.as_millis();
    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let seconds = (ms / 1000) % 60;
    let milliseconds = ms % 1000;

    format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
}

#[test]
fn formats_play_time() {
    assert_eq!(time_str(Duration::from_millis(10_500)), "00:00:10.500");
    assert_eq!(time_str(Duration::from_secs(3 * 3600 + 25 * 60 + 7)), "03:25:07.000");
    assert_eq!(time_str(Duration::from_secs(123 * 3600)), "123:00:00.000");
}
