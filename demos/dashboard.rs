use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use gridboard::logging::FileSink;
use gridboard::{
    DriverResult, GridConfig, ItemSpec, LayoutContainer, Logger, PixelRect, TerminalDriver,
    TerminalPointer,
};

const CELL_WIDTH: f64 = 8.0;
const CELL_HEIGHT: f64 = 16.0;

fn main() -> DriverResult<()> {
    let config = GridConfig::default();
    let mut container = LayoutContainer::with_grid_styler(config)?;
    if let Ok(sink) = FileSink::new("gridboard-demo.log", 1 << 20) {
        container.options_mut().logger = Some(Logger::new(sink));
    }
    container.set_editable(true);
    for (index, (cols, rows)) in [(4, 6), (4, 6), (4, 10), (6, 4), (6, 8), (3, 6), (9, 4)]
        .into_iter()
        .enumerate()
    {
        container.register_item(ItemSpec::new(format!("widget-{index}"), cols, rows))?;
    }

    let driver = TerminalDriver::new(container)
        .with_pointer(TerminalPointer::new(CELL_WIDTH, CELL_HEIGHT));
    let container = driver.run(draw)?;

    let layout = serde_json::to_string_pretty(&container.layout_items())
        .map_err(gridboard::LayoutError::from)?;
    println!("{layout}");
    Ok(())
}

fn draw(container: &LayoutContainer, stdout: &mut io::Stdout) -> DriverResult<()> {
    queue!(stdout, Clear(ClearType::All))?;
    for id in container.ordered_items() {
        if let Some(frame) = container.item_client_frame(id) {
            draw_box(stdout, frame, '#', id)?;
        }
    }
    if let Some(placeholder) = container.styler().placeholder() {
        let mut frame = placeholder.frame;
        let origin = container.container_rect();
        frame.shift(origin.top, origin.left);
        draw_box(stdout, frame, '.', "")?;
    }
    let mode = if container.is_editable() { "edit" } else { "view" };
    queue!(
        stdout,
        MoveTo(0, 0),
        Print(format!("[{mode}] e: toggle edit  q: quit"))
    )?;
    stdout.flush()?;
    Ok(())
}

fn draw_box(stdout: &mut io::Stdout, frame: PixelRect, edge: char, label: &str) -> io::Result<()> {
    let left = (frame.left / CELL_WIDTH).round().max(0.0) as u16;
    let top = (frame.top / CELL_HEIGHT).round();
    let width = (frame.width / CELL_WIDTH).round().max(1.0) as u16;
    let height = (frame.height / CELL_HEIGHT).round().max(1.0) as i32;
    for row in 0..height {
        let y = top + f64::from(row);
        if y < 1.0 {
            continue;
        }
        let line = if row == 0 || row == height - 1 {
            edge.to_string().repeat(usize::from(width))
        } else {
            format!("{edge}{}{edge}", " ".repeat(usize::from(width.saturating_sub(2))))
        };
        queue!(stdout, MoveTo(left, y as u16), Print(line))?;
    }
    if !label.is_empty() && top >= 1.0 {
        queue!(stdout, MoveTo(left + 1, top as u16), Print(label))?;
    }
    Ok(())
}
