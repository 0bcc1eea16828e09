use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Sparkline, Table},
};

use super::app::MonitorApp;
use super::widgets::{colored_gauge, sparkline_data, temp_color, usage_color};
use crate::core::system_monitor::{
    GpuDevice, MetricHistory, OomSource, ProcessRecord, ThermalReading, ThresholdSource,
};
use crate::ui::formatters::{format_age, format_clock, format_rate, format_size};

/// Main render function
pub fn render_ui(frame: &mut Frame, app: &MonitorApp) {
    let area = frame.area();
    let snapshot = &app.snapshot;

    let has_oom = snapshot.oom.is_some();
    // 2 lines per GPU + 2 for borders, at least room for the "none" line
    let gpu_height = (snapshot.gpus.len().max(1) * 2 + 2).min(12) as u16;

    let mut constraints = vec![Constraint::Length(1)];
    if has_oom {
        constraints.push(Constraint::Length(3));
    }
    constraints.extend([
        Constraint::Length(gpu_height),  // GPUs
        Constraint::Length(8),           // CPU / Memory / Network
        Constraint::Length(1),           // Temperatures
        Constraint::Min(5),              // Processes
        Constraint::Length(1),           // Footer
    ]);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut idx = 0;
    let mut next = || {
        let chunk = chunks[idx];
        idx += 1;
        chunk
    };

    render_header(frame, next(), app);
    if has_oom {
        render_oom_banner(frame, next(), app);
    }
    render_gpu_section(frame, next(), app);
    render_system_section(frame, next(), app);
    render_temperatures_section(frame, next(), app);
    render_processes_section(frame, next(), app);
    render_footer(frame, next());

    if app.show_help {
        render_help_overlay(frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let taken_at = app.snapshot.taken_at.with_timezone(&chrono::Local);
    let text = format!(
        " ktop │ {} │ Refresh: {}ms ",
        taken_at.format("%H:%M:%S"),
        app.refresh.as_millis()
    );
    let para = Paragraph::new(text).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    frame.render_widget(para, area);
}

fn render_oom_banner(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let Some(oom) = &app.snapshot.oom else {
        return;
    };

    let killer = match oom.source {
        OomSource::Kernel => "kernel OOM killer",
        OomSource::Daemon => "systemd-oomd",
    };
    let text = format!(
        " {} killed by {} at {} ({}) ",
        oom.target,
        killer,
        format_clock(&oom.timestamp),
        format_age(&oom.timestamp, app.snapshot.taken_at)
    );

    let block = Block::default()
        .title(" ⚠ OUT OF MEMORY ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    let para = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD));
    frame.render_widget(para, area);
}

fn render_gpu_section(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let block = Block::default().title(" GPU ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let gpus = &app.snapshot.gpus;
    if gpus.is_empty() {
        let no_gpu = Paragraph::new("No GPU detected").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(no_gpu, inner);
        return;
    }

    let rows = (inner.height / 2).max(1) as usize;
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(2); rows.min(gpus.len())])
        .split(inner);

    for (gpu, row) in gpus.iter().zip(layout.iter()) {
        render_gpu_row(frame, *row, gpu);
    }
}

fn render_gpu_row(frame: &mut Frame, area: Rect, gpu: &GpuDevice) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let util_text = if gpu.capabilities.has_util {
        format!("GPU{} {} │ Use {:.0}%", gpu.id, gpu.name, gpu.util_pct)
    } else {
        format!("GPU{} {} │ Use n/a", gpu.id, gpu.name)
    };
    render_gauge_with_trend(frame, halves[0], gpu.util_pct, &util_text, &gpu.util_history);

    let mem_text = if gpu.capabilities.has_mem {
        format!(
            "VRAM {} / {} ({:.0}%)",
            format_size(gpu.mem_used),
            format_size(gpu.mem_total),
            gpu.mem_pct()
        )
    } else {
        "VRAM n/a".to_string()
    };
    render_gauge_with_trend(frame, halves[1], gpu.mem_pct(), &mem_text, &gpu.mem_history);
}

/// Gauge on the first line, percentage sparkline below it
fn render_gauge_with_trend(
    frame: &mut Frame,
    area: Rect,
    pct: f64,
    label: &str,
    history: &MetricHistory,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    frame.render_widget(colored_gauge(pct, label), rows[0]);

    let data = sparkline_data(history, rows[1].width as usize, 100.0);
    let sparkline = Sparkline::default()
        .data(&data)
        .max(1000)
        .style(Style::default().fg(usage_color(pct)));
    frame.render_widget(sparkline, rows[1]);
}

fn render_system_section(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    render_cpu_panel(frame, chunks[0], app);
    render_memory_panel(frame, chunks[1], app);
    render_network_panel(frame, chunks[2], app);
}

fn render_cpu_panel(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let cpu = &app.snapshot.cpu;
    let title = if cpu.freq_mhz > 0 {
        format!(" CPU {:.1}% │ {} cores @ {} MHz ", cpu.pct, cpu.cores, cpu.freq_mhz)
    } else {
        format!(" CPU {:.1}% │ {} cores ", cpu.pct, cpu.cores)
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 {
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let label = format!("{:.1}%", cpu.pct);
    frame.render_widget(colored_gauge(cpu.pct, &label), layout[0]);

    let data = sparkline_data(&cpu.history, layout[1].width as usize, 100.0);
    let sparkline = Sparkline::default()
        .data(&data)
        .max(1000)
        .style(Style::default().fg(usage_color(cpu.pct)));
    frame.render_widget(sparkline, layout[1]);
}

fn render_memory_panel(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let mem = &app.snapshot.mem;
    let block = Block::default().title(" Memory ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 2 {
        let summary = Paragraph::new(format!("RAM: {:.1}%", mem.used_pct()));
        frame.render_widget(summary, inner);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // RAM
            Constraint::Length(2), // Swap
            Constraint::Length(1), // Available
            Constraint::Min(0),
        ])
        .split(inner);

    let ram_text = format!(
        "RAM:  {} / {} ({:.1}%)",
        format_size(mem.used),
        format_size(mem.total),
        mem.used_pct()
    );
    frame.render_widget(colored_gauge(mem.used_pct(), &ram_text), layout[0]);

    let swap_text = if mem.swap_total > 0 {
        format!(
            "Swap: {} / {} ({:.1}%)",
            format_size(mem.swap_used),
            format_size(mem.swap_total),
            mem.swap_pct()
        )
    } else {
        "Swap: none".to_string()
    };
    frame.render_widget(colored_gauge(mem.swap_pct(), &swap_text), layout[1]);

    let available = Paragraph::new(format!("Available: {}", format_size(mem.available)))
        .style(Style::default().fg(Color::Gray));
    frame.render_widget(available, layout[2]);
}

fn render_network_panel(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let net = &app.snapshot.net;
    let block = Block::default()
        .title(format!(" Network │ peak {} ", format_rate(net.peak)))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 2 {
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Percentage(50),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    // Both directions share the peak so their heights compare.
    let width = inner.width as usize;
    let down = sparkline_data(&net.history_down, width, net.peak);
    let up = sparkline_data(&net.history_up, width, net.peak);

    frame.render_widget(
        Paragraph::new(format!("↓ {}", format_rate(net.rate_down)))
            .style(Style::default().fg(Color::Green)),
        layout[0],
    );
    frame.render_widget(
        Sparkline::default()
            .data(&down)
            .max(1000)
            .style(Style::default().fg(Color::Green)),
        layout[1],
    );
    frame.render_widget(
        Paragraph::new(format!("↑ {}", format_rate(net.rate_up)))
            .style(Style::default().fg(Color::Magenta)),
        layout[2],
    );
    frame.render_widget(
        Sparkline::default()
            .data(&up)
            .max(1000)
            .style(Style::default().fg(Color::Magenta)),
        layout[3],
    );
}

fn thermal_span(name: &str, reading: &ThermalReading) -> Span<'static> {
    let marker = match reading.threshold_source {
        ThresholdSource::Fallback => "~",
        _ => "",
    };
    Span::styled(
        format!(
            "{}: {:.0}°C/{}{:.0}°C",
            name, reading.current_c, marker, reading.critical_c
        ),
        Style::default().fg(temp_color(reading.current_c, reading.critical_c)),
    )
}

fn render_temperatures_section(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    if area.height == 0 {
        return;
    }

    let thermal = &app.snapshot.thermal;
    let mut parts: Vec<Span> = Vec::new();
    if let Some(cpu) = &thermal.cpu {
        parts.push(thermal_span("CPU", cpu));
    }
    if let Some(mem) = &thermal.mem {
        parts.push(thermal_span("MEM", mem));
    }
    for gpu in &thermal.gpus {
        parts.push(thermal_span(&gpu.label, gpu));
    }

    let mut spans = vec![Span::raw(" Temperatures: ")];
    if parts.is_empty() {
        spans.push(Span::styled("-", Style::default().fg(Color::DarkGray)));
    } else {
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" │ "));
            }
            spans.push(part);
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_processes_section(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_process_table(
        frame,
        chunks[0],
        " Top processes by CPU ",
        &app.snapshot.procs_by_cpu,
    );
    render_process_table(
        frame,
        chunks[1],
        " Top processes by memory ",
        &app.snapshot.procs_by_mem,
    );
}

fn render_process_table(frame: &mut Frame, area: Rect, title: &str, procs: &[ProcessRecord]) {
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 2 {
        return; // Not enough space for header + at least one row
    }

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let header = Row::new(vec![
        Cell::from("PID").style(bold),
        Cell::from("Name").style(bold),
        Cell::from("CPU %").style(bold),
        Cell::from("RSS").style(bold),
        Cell::from("Shared").style(bold),
        Cell::from("MEM %").style(bold),
    ])
    .height(1);

    let rows: Vec<Row> = procs
        .iter()
        .map(|proc| {
            Row::new(vec![
                Cell::from(proc.pid.to_string()),
                Cell::from(proc.name.clone()),
                Cell::from(format!("{:.1}", proc.cpu_pct))
                    .style(Style::default().fg(usage_color(proc.cpu_pct))),
                Cell::from(format_size(proc.rss_bytes)),
                Cell::from(proc.shared_bytes.map(format_size).unwrap_or_else(|| "-".into())),
                Cell::from(format!("{:.1}", proc.mem_pct)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Min(10),
            Constraint::Length(7),
            Constraint::Length(11),
            Constraint::Length(11),
            Constraint::Length(6),
        ],
    )
    .header(header);

    frame.render_widget(table, inner);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let help = " q: Quit │ r: Refresh now │ ?: Help ";
    let para = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(para, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_text = r#"
    ktop - Help

    Keyboard Shortcuts:
    ─────────────────────────────────────
    q / Esc     Quit the application
    r           Sample and redraw now
    ? / h       Toggle this help screen

    Thresholds marked ~ are built-in defaults,
    the sensor did not report its own limit.
    "#;

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::DarkGray));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left);

    let popup_area = centered_rect(60, 50, area);
    frame.render_widget(paragraph, popup_area);
}

/// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
