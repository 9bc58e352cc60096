//! Day-by-day schedule table
//!
//! Renders one column per calendar day that has classes, each cell showing a
//! session's subject, time span and room.

use std::collections::BTreeMap;
use std::io::{self, IsTerminal, Write};

use chrono::{Datelike, NaiveDate, Weekday};
use ratatui::{
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Row, Table, Widget},
    Frame, Terminal, TerminalOptions, Viewport,
};

use crate::data::CalendarEntry;

/// Lines used by one session cell
const CELL_HEIGHT: u16 = 3;

/// Lines used by a column header
const HEADER_HEIGHT: u16 = 2;

const MIN_COLUMN_WIDTH: u16 = 18;
const MAX_COLUMN_WIDTH: u16 = 35;

/// Width budget shared by all columns before clamping
const TABLE_WIDTH_BUDGET: u16 = 100;

/// Vietnamese name of a weekday
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Thứ Hai",
        Weekday::Tue => "Thứ Ba",
        Weekday::Wed => "Thứ Tư",
        Weekday::Thu => "Thứ Năm",
        Weekday::Fri => "Thứ Sáu",
        Weekday::Sat => "Thứ Bảy",
        Weekday::Sun => "Chủ Nhật",
    }
}

/// How far `date` is from `today`, in words
pub fn countdown_text(date: NaiveDate, today: NaiveDate) -> String {
    let days = (date - today).num_days();
    match days {
        0 => "Hôm nay".to_string(),
        1 => "Ngày mai".to_string(),
        -1 => "Hôm qua".to_string(),
        d if d > 1 => format!("{} ngày nữa", d),
        d => format!("{} ngày trước", -d),
    }
}

/// Two-line column header: weekday, then `DD/MM (countdown)`
pub fn day_header(date: NaiveDate, today: NaiveDate) -> String {
    format!(
        "{}\n{} ({})",
        weekday_name(date.weekday()),
        date.format("%d/%m"),
        countdown_text(date, today)
    )
}

/// Groups entries by the calendar day they start on
///
/// Days come out in ascending order; entries keep their input order within a
/// day.
pub fn group_by_day(entries: &[CalendarEntry]) -> BTreeMap<NaiveDate, Vec<&CalendarEntry>> {
    let mut days: BTreeMap<NaiveDate, Vec<&CalendarEntry>> = BTreeMap::new();
    for entry in entries {
        days.entry(entry.start_time().date_naive())
            .or_default()
            .push(entry);
    }
    days
}

/// Column width for a table with `columns` day columns
pub fn column_width(columns: usize) -> u16 {
    let columns = u16::try_from(columns.max(1)).unwrap_or(u16::MAX);
    (TABLE_WIDTH_BUDGET / columns).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
}

fn session_cell(entry: &CalendarEntry) -> Cell<'static> {
    Cell::from(Text::from(vec![
        Line::from(Span::styled(
            entry.subject_name().to_string(),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                "{}-{}",
                entry.start_time().format("%H:%M"),
                entry.end_time().format("%H:%M")
            ),
            Style::default().fg(Color::Cyan),
        )),
        Line::from(format!("{} ({})", entry.room_name(), entry.facility_name())),
    ]))
}

/// Laid-out schedule, ready to draw
pub struct ScheduleTable<'a> {
    days: BTreeMap<NaiveDate, Vec<&'a CalendarEntry>>,
    today: NaiveDate,
}

impl<'a> ScheduleTable<'a> {
    pub fn new(entries: &'a [CalendarEntry], today: NaiveDate) -> Self {
        Self {
            days: group_by_day(entries),
            today,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn columns(&self) -> usize {
        self.days.len()
    }

    fn max_sessions_per_day(&self) -> usize {
        self.days.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Width needed to show every column, borders included
    pub fn width(&self) -> u16 {
        let columns = self.columns() as u16;
        columns * column_width(self.columns()) + columns.saturating_sub(1) + 2
    }

    /// Height needed to show every row, borders included
    pub fn height(&self) -> u16 {
        let rows = self.max_sessions_per_day() as u16;
        2 + HEADER_HEIGHT + 1 + rows * (CELL_HEIGHT + 1)
    }

    fn to_widget(&self) -> Table<'static> {
        let header = Row::new(
            self.days
                .keys()
                .map(|date| Cell::from(day_header(*date, self.today))),
        )
        .style(
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )
        .height(HEADER_HEIGHT)
        .bottom_margin(1);

        let rows = (0..self.max_sessions_per_day()).map(|i| {
            let cells = self.days.values().map(|sessions| match sessions.get(i) {
                Some(entry) => session_cell(entry),
                None => Cell::from(" "),
            });
            Row::new(cells).height(CELL_HEIGHT).bottom_margin(1)
        });

        let widths = vec![Constraint::Length(column_width(self.columns())); self.columns()];

        Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL))
    }

    /// Draws the table into the frame
    pub fn render(&self, frame: &mut Frame) {
        frame.render_widget(self.to_widget(), frame.area());
    }

    /// Renders the table to unstyled text, one line per terminal row
    pub fn to_plain_text(&self) -> String {
        let area = Rect::new(0, 0, self.width(), self.height());
        let mut buffer = Buffer::empty(area);
        self.to_widget().render(area, &mut buffer);

        let mut out = String::new();
        for row in buffer.content().chunks(usize::from(area.width.max(1))) {
            let line: String = row.iter().map(|cell| cell.symbol()).collect();
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

/// Prints the table to stdout
///
/// On a terminal the styled table is drawn into an inline viewport below the
/// cursor; otherwise plain text is written so output can be piped.
pub fn print_schedule(table: &ScheduleTable<'_>) -> io::Result<()> {
    let stdout = io::stdout();
    if !stdout.is_terminal() {
        let mut lock = stdout.lock();
        lock.write_all(table.to_plain_text().as_bytes())?;
        return lock.flush();
    }

    let mut terminal = Terminal::with_options(
        CrosstermBackend::new(stdout),
        TerminalOptions {
            viewport: Viewport::Inline(table.height()),
        },
    )?;
    terminal.draw(|frame| table.render(frame))?;
    terminal.show_cursor()?;
    drop(terminal);
    println!();
    Ok(())
}
