use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{
        Block,
        Borders,
        Widget,
    },
};
use tui_logger::TuiLoggerWidget;

mod folders;
pub use folders::*;

pub struct AppLoggerWidget;

impl Widget for AppLoggerWidget {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        let block = Block::new().title("Log output").borders(Borders::LEFT);
        TuiLoggerWidget::default().block(block).render(area, buf);
    }
}
