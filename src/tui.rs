use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    cursor::Show,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::analysis::Analysis;
use crate::config::AnalysisConfig;
use crate::rate::{to_local, Rate};

const PALETTE: [Color; 10] = [
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::Red,
    Color::Blue,
    Color::LightCyan,
    Color::LightYellow,
    Color::LightMagenta,
    Color::LightGreen,
];

struct PlotLine {
    label: String,
    color: Color,
    points: Vec<(f64, f64)>,
}

/// Everything the chart needs, computed once before the draw loop.
pub struct PlotData {
    title: String,
    y_title: String,
    lines: Vec<PlotLine>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    instantaneous: usize,
    note: Option<String>,
}

impl PlotData {
    pub fn new(analysis: &Analysis, config: &AnalysisConfig) -> Self {
        let title = format!(
            "File generation speed ({}-file window, {})",
            config.window_size, config.timestamp_kind
        );
        let y_title = format!("Files per {}", config.time_unit);

        let finite_max = analysis
            .plottable()
            .flat_map(|b| b.samples.iter().filter_map(|s| s.rate.finite()))
            .fold(0.0f64, f64::max);
        let y_top = if finite_max > 0.0 { finite_max * 1.1 } else { 1.0 };

        let mut x_min = f64::INFINITY;
        let mut x_max = f64::NEG_INFINITY;
        let mut instantaneous = 0;
        let lines: Vec<PlotLine> = analysis
            .plottable()
            .map(|series| {
                let points = series
                    .samples
                    .iter()
                    .map(|s| {
                        x_min = x_min.min(s.midpoint);
                        x_max = x_max.max(s.midpoint);
                        // Zero-span windows pin to the top edge.
                        let y = match s.rate {
                            Rate::Finite(v) => v,
                            Rate::Instantaneous => {
                                instantaneous += 1;
                                y_top
                            }
                        };
                        (s.midpoint, y)
                    })
                    .collect();
                PlotLine {
                    label: series.label(),
                    color: PALETTE[series.batch_index % PALETTE.len()],
                    points,
                }
            })
            .collect();

        let x_bounds = if lines.is_empty() {
            [0.0, 1.0]
        } else if x_min == x_max {
            [x_min - 1.0, x_max + 1.0]
        } else {
            [x_min, x_max]
        };
        let note = if lines.is_empty() {
            Some(analysis.empty_note(config))
        } else {
            None
        };

        Self {
            title,
            y_title,
            lines,
            x_bounds,
            y_bounds: [0.0, y_top],
            instantaneous,
            note,
        }
    }

    fn x_labels(&self) -> Vec<Span<'static>> {
        let [lo, hi] = self.x_bounds;
        [lo, (lo + hi) / 2.0, hi]
            .iter()
            .map(|&t| Span::raw(to_local(t).format("%Y-%m-%d %H:%M").to_string()))
            .collect()
    }

    fn y_labels(&self) -> Vec<Span<'static>> {
        let [lo, hi] = self.y_bounds;
        [lo, (lo + hi) / 2.0, hi]
            .iter()
            .map(|v| Span::raw(format!("{v:.1}")))
            .collect()
    }

    fn footer(&self) -> String {
        let mut footer = format!("q: quit | {} batch(es) plotted", self.lines.len());
        if self.instantaneous > 0 {
            footer.push_str(&format!(
                " | {} instantaneous window(s) drawn at top",
                self.instantaneous
            ));
        }
        footer
    }
}

pub fn draw(f: &mut Frame, plot: &PlotData) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(f.size());

    let block = Block::default().title(plot.title.clone()).borders(Borders::ALL);
    if let Some(note) = &plot.note {
        let para = Paragraph::new(note.clone())
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(para, chunks[0]);
    } else {
        let datasets: Vec<Dataset> = plot
            .lines
            .iter()
            .map(|line| {
                Dataset::default()
                    .name(line.label.clone())
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(line.color))
                    .data(&line.points)
            })
            .collect();
        let chart = Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .title("Time (midpoint of window)")
                    .bounds(plot.x_bounds)
                    .labels(plot.x_labels()),
            )
            .y_axis(
                Axis::default()
                    .title(plot.y_title.clone())
                    .bounds(plot.y_bounds)
                    .labels(plot.y_labels()),
            );
        f.render_widget(chart, chunks[0]);
    }

    f.render_widget(Paragraph::new(plot.footer()), chunks[1]);
}

/// Leaves the alternate screen, shows the cursor and turns raw mode off.
fn restore(out: &mut impl Write) -> io::Result<()> {
    execute!(out, LeaveAlternateScreen, Show)?;
    disable_raw_mode()
}

/// Restores the terminal when dropped, including on early return and unwind.
struct RestoreOnDrop<W: Write> {
    out: W,
}

impl<W: Write> Drop for RestoreOnDrop<W> {
    fn drop(&mut self) {
        if let Err(e) = restore(&mut self.out) {
            tracing::warn!(?e, "Failed to restore terminal");
        }
    }
}

pub fn run_chart(analysis: &Analysis, config: &AnalysisConfig) -> Result<()> {
    let plot = PlotData::new(analysis, config);

    enable_raw_mode()?;
    let _restore = RestoreOnDrop { out: io::stdout() };
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    event_loop(&mut terminal, &plot)
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, plot: &PlotData) -> Result<()> {
    loop {
        terminal.draw(|f| draw(f, plot))?;

        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                    || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
                {
                    return Ok(());
                }
            }
        }
    }
}
