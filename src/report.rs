use chrono::{Days, NaiveDate};
use std::io;

use crate::config::SessionStats;

/// Counts for the `days` days ending at `today`, oldest first, zero-filled.
/// Stops early at the first day the calendar cannot represent.
pub fn daily_rows(stats: &SessionStats, today: NaiveDate, days: usize) -> Vec<(NaiveDate, u32)> {
    let mut rows: Vec<_> = (0..days as u64)
        .map_while(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|day| (day, stats.count_for(day)))
        .collect();
    rows.reverse();
    rows
}

pub fn render_table(rows: &[(NaiveDate, u32)]) -> String {
    let peak = rows.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);
    let mut out = String::new();
    for (day, count) in rows {
        let bar = "#".repeat((*count as usize * 30).div_ceil(peak as usize));
        out.push_str(&format!("{} {:>4}  {}\n", day.format("%Y-%m-%d %a"), count, bar));
    }
    out
}

pub fn write_csv<W: io::Write>(stats: &SessionStats, writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["date", "completed"])?;
    for (day, count) in stats.iter() {
        wtr.write_record([day.to_string(), count.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample() -> SessionStats {
        [(date("2024-07-01"), 3), (date("2024-07-03"), 6)]
            .into_iter()
            .collect()
    }

    #[test]
    fn daily_rows_fill_gaps_oldest_first() {
        let rows = daily_rows(&sample(), date("2024-07-03"), 4);
        assert_eq!(
            rows,
            vec![
                (date("2024-06-30"), 0),
                (date("2024-07-01"), 3),
                (date("2024-07-02"), 0),
                (date("2024-07-03"), 6),
            ]
        );
    }

    #[test]
    fn daily_rows_with_zero_days_is_empty() {
        assert!(daily_rows(&sample(), date("2024-07-03"), 0).is_empty());
    }

    #[test]
    fn daily_rows_stop_at_the_earliest_date() {
        let today = NaiveDate::MIN.checked_add_days(Days::new(2)).unwrap();
        let rows = daily_rows(&sample(), today, usize::MAX);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], (NaiveDate::MIN, 0));
        assert_eq!(rows[2], (today, 0));
    }

    #[test]
    fn table_scales_bars_to_peak() {
        let rows = daily_rows(&sample(), date("2024-07-03"), 3);
        let table = render_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("2024-07-01 Mon"));
        assert!(lines[0].ends_with(&"#".repeat(15)));
        assert!(lines[1].trim_end().ends_with('0'));
        assert!(lines[2].ends_with(&"#".repeat(30)));
    }

    #[test]
    fn csv_lists_every_recorded_day() {
        let mut out = Vec::new();
        write_csv(&sample(), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "date,completed\n2024-07-01,3\n2024-07-03,6\n"
        );
    }
}
