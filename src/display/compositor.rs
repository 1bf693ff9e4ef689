/// Places each device's reading in its own block of the terminal grid
use time::{Duration, OffsetDateTime, UtcOffset};

use super::{Position, SharedOutput};
use crate::config::DisplayLayout;
use crate::models::{Notification, Reading};
use crate::registry::Device;
use crate::utils::{format_clock, format_interval};

/// Lines reserved for the most recent alert below the device grid.
const ALERT_LINES: usize = 3;

/// Top-left cell of the block belonging to `slot_index`.
pub fn region_origin(slot_index: usize, layout: &DisplayLayout) -> Position {
    let columns = layout.columns_per_row.max(1);
    Position {
        col: layout.cell_width * (slot_index % columns),
        row: layout.cell_height * (slot_index / columns) + 1,
    }
}

/// Renders readings into fixed per-device regions.
///
/// Every line is padded to the cell width and every render writes the same
/// number of lines, so a block is fully redrawn even after the screen was
/// cleared or a longer value was shown before.
pub struct DisplayCompositor {
    output: SharedOutput,
    layout: DisplayLayout,
    use_text_pos: bool,
    offset: UtcOffset,
}

impl DisplayCompositor {
    pub fn new(
        output: SharedOutput,
        layout: DisplayLayout,
        use_text_pos: bool,
        offset: UtcOffset,
    ) -> Self {
        Self {
            output,
            layout,
            use_text_pos,
            offset,
        }
    }

    pub fn clear(&self) {
        if self.use_text_pos {
            self.output.lock().clear();
        }
    }

    pub fn render(
        &self,
        device: &Device,
        reading: &Reading,
        seen_at: OffsetDateTime,
        since_previous: Option<Duration>,
    ) {
        let lines = self.device_lines(device, reading, seen_at, since_previous);
        let origin = region_origin(device.slot_index, &self.layout);

        let mut output = self.output.lock();
        for (i, line) in lines.iter().enumerate() {
            let position = self.use_text_pos.then(|| Position {
                col: origin.col,
                row: origin.row + i,
            });
            output.write(&self.fit(line), position);
        }
        if !self.use_text_pos {
            output.write("", None);
        }
    }

    /// Show the last accepted alert in the status area under the grid.
    pub fn render_alert(&self, device_count: usize, notification: &Notification) {
        let title = notification.title.as_deref().unwrap_or_default();
        let message = notification.message.as_deref().unwrap_or_default();
        let mut output = self.output.lock();

        if !self.use_text_pos {
            output.write(title, None);
            output.write(message, None);
            return;
        }

        let columns = self.layout.columns_per_row.max(1);
        let grid_rows = device_count.div_ceil(columns).max(1);
        let row = self.layout.cell_height * grid_rows + 1;
        let width = self.layout.cell_width * columns;

        output.write(&pad(title, width), Some(Position { col: 0, row }));
        output.clear_region(ALERT_LINES - 1);
        output.write(&pad(message, width), Some(Position { col: 0, row: row + 1 }));
    }

    fn device_lines(
        &self,
        device: &Device,
        reading: &Reading,
        seen_at: OffsetDateTime,
        since_previous: Option<Duration>,
    ) -> Vec<String> {
        vec![
            format!("Device: {}", device.display_name),
            "-".repeat(18),
            format!("Temp: {:.2}°C", reading.temperature_c),
            format!("Humidity: {:.2}%", reading.humidity_pct),
            format!("Battery: {}% ({:.3}V)", reading.battery_pct, reading.battery_v),
            format!("RSSI: {} dBm", reading.rssi),
            format!("Count: {}", reading.sequence),
            format!("Last Seen: {}", format_clock(&seen_at, self.offset)),
            since_previous
                .map(|d| format!("Duration: {}", format_interval(d)))
                .unwrap_or_default(),
        ]
    }

    fn fit(&self, line: &str) -> String {
        if self.use_text_pos {
            pad(line, self.layout.cell_width)
        } else {
            line.to_string()
        }
    }
}

/// Truncate or space-pad to exactly `width` characters.
fn pad(text: &str, width: usize) -> String {
    let mut fitted: String = text.chars().take(width).collect();
    let len = fitted.chars().count();
    fitted.extend(std::iter::repeat(' ').take(width - len));
    fitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::testing::{Call, RecordingOutput};
    use time::macros::datetime;

    fn layout() -> DisplayLayout {
        DisplayLayout {
            columns_per_row: 4,
            cell_width: 24,
            cell_height: 10,
        }
    }

    fn device(slot_index: usize) -> Device {
        Device {
            address: "A4:C1:38:5E:DB:77".to_string(),
            display_name: "OUTSIDE ROOM".to_string(),
            slot_index,
            last_sequence: Some(7),
            last_seen_at: None,
        }
    }

    fn reading() -> Reading {
        Reading {
            temperature_c: 21.5,
            humidity_pct: 45.32,
            battery_v: 3.0,
            battery_pct: 80,
            sequence: 7,
            rssi: -67,
        }
    }

    fn compositor(use_text_pos: bool) -> (DisplayCompositor, RecordingOutput) {
        let recorder = RecordingOutput::default();
        let output = SharedOutput::new(Box::new(recorder.clone()));
        (
            DisplayCompositor::new(output, layout(), use_text_pos, UtcOffset::UTC),
            recorder,
        )
    }

    #[test]
    fn test_region_origin() {
        let layout = layout();
        assert_eq!(region_origin(0, &layout), Position { col: 0, row: 1 });
        assert_eq!(region_origin(3, &layout), Position { col: 72, row: 1 });
        assert_eq!(region_origin(4, &layout), Position { col: 0, row: 11 });
        assert_eq!(region_origin(6, &layout), Position { col: 48, row: 11 });
    }

    #[test]
    fn test_render_positions_every_line_in_region() {
        let (compositor, recorder) = compositor(true);
        compositor.render(
            &device(5),
            &reading(),
            datetime!(2024-03-01 08:15:00 UTC),
            Some(Duration::seconds(12)),
        );

        let calls = recorder.calls();
        assert_eq!(calls.len(), 9);
        for (i, call) in calls.iter().enumerate() {
            match call {
                Call::Write(text, Some(pos)) => {
                    assert_eq!(*pos, Position { col: 24, row: 11 + i });
                    assert_eq!(text.chars().count(), 24);
                }
                other => panic!("unexpected call {:?}", other),
            }
        }

        assert_eq!(
            recorder.written(),
            vec![
                "Device: OUTSIDE ROOM",
                "------------------",
                "Temp: 21.50°C",
                "Humidity: 45.32%",
                "Battery: 80% (3.000V)",
                "RSSI: -67 dBm",
                "Count: 7",
                "Last Seen: 08:15:00",
                "Duration: 0:00:12",
            ]
        );
    }

    #[test]
    fn test_first_report_blanks_duration_line() {
        let (compositor, recorder) = compositor(true);
        compositor.render(&device(0), &reading(), datetime!(2024-03-01 08:15:00 UTC), None);

        let written = recorder.written();
        assert_eq!(written.len(), 9);
        assert_eq!(written[8], "");
    }

    #[test]
    fn test_plain_mode_appends() {
        let (compositor, recorder) = compositor(false);
        compositor.render(&device(2), &reading(), datetime!(2024-03-01 08:15:00 UTC), None);
        compositor.clear();

        let calls = recorder.calls();
        assert!(calls.iter().all(|call| matches!(call, Call::Write(_, None))));
        assert_eq!(calls.len(), 10);
    }

    #[test]
    fn test_alert_goes_below_grid() {
        let (compositor, recorder) = compositor(true);
        let notification = Notification::new(Some("Alert".into()), Some("OUTSIDE: 5.00 °C".into()));
        compositor.render_alert(5, &notification);

        let calls = recorder.calls();
        assert!(matches!(&calls[0], Call::Write(t, Some(Position { col: 0, row: 21 })) if t.starts_with("Alert")));
        assert_eq!(calls[1], Call::ClearRegion(ALERT_LINES - 1));
        assert!(matches!(&calls[2], Call::Write(_, Some(Position { col: 0, row: 22 }))));
    }

    #[test]
    fn test_concurrent_renders_do_not_interleave() {
        let (compositor, recorder) = compositor(true);
        let compositor = std::sync::Arc::new(compositor);

        let handles: Vec<_> = (0..4)
            .map(|slot| {
                let compositor = compositor.clone();
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        compositor.render(
                            &device(slot),
                            &reading(),
                            datetime!(2024-03-01 08:15:00 UTC),
                            None,
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Each block of nine writes must come from a single slot
        let calls = recorder.calls();
        assert_eq!(calls.len(), 4 * 20 * 9);
        for block in calls.chunks(9) {
            let cols: Vec<usize> = block
                .iter()
                .map(|call| match call {
                    Call::Write(_, Some(pos)) => pos.col,
                    other => panic!("unexpected call {:?}", other),
                })
                .collect();
            assert!(cols.iter().all(|col| *col == cols[0]));
        }
    }

    #[test]
    fn test_pad_truncates_long_names() {
        assert_eq!(pad("abcdef", 4), "abcd");
        assert_eq!(pad("ab", 4), "ab  ");
    }
}
