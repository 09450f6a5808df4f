use serde::Serialize;

use super::duration;
use crate::{configs::ControlsConfig, playback::QueueSnapshot};

pub const QUEUE_UNAVAILABLE: &str = "> could not process queue atm, try later!";

/// Paging control shown under a queue listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PageWidget {
    Buttons,
    SelectMenu,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueRow {
    /// 1-based position in the whole queue, not in the page.
    pub number: usize,
    pub title: String,
    pub duration: Option<String>,
}

impl std::fmt::Display for QueueRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}. {}", self.number, self.title)?;
        if let Some(duration) = &self.duration {
            write!(f, " ({})", duration)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePage {
    pub page_index: usize,
    pub page_count: usize,
    pub widget: PageWidget,
    pub rows: Vec<QueueRow>,
    /// Message text: header plus the rows in a markdown block.
    pub text: String,
}

/// Reply to a queue view request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueView {
    /// Nothing playing or the engine is not ready. Shown only to the requester.
    Unavailable,
    /// A track is playing and nothing follows it.
    NowPlaying { text: String },
    Paged(QueuePage),
}

impl QueueView {
    pub fn text(&self) -> &str {
        match self {
            Self::Unavailable => QUEUE_UNAVAILABLE,
            Self::NowPlaying { text } => text,
            Self::Paged(page) => &page.text,
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

/// Read-only listing of the upcoming tracks. Independent of the control
/// message and of the update gate.
#[derive(Debug, Clone, Copy)]
pub struct QueuePaginator {
    page_size: usize,
    button_pages_max: usize,
}

impl Default for QueuePaginator {
    fn default() -> Self {
        Self::new(10, 5)
    }
}

impl QueuePaginator {
    pub fn new(page_size: usize, button_pages_max: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            button_pages_max,
        }
    }

    pub fn from_config(config: &ControlsConfig) -> Self {
        Self::new(config.page_size, config.button_pages_max)
    }

    pub fn page_count(&self, queue_size: usize) -> usize {
        queue_size.div_ceil(self.page_size)
    }

    pub fn widget_for(&self, page_count: usize) -> PageWidget {
        if page_count <= self.button_pages_max {
            PageWidget::Buttons
        } else {
            PageWidget::SelectMenu
        }
    }

    /// Builds the reply for `page`. A page past the end wraps to the first.
    pub fn view(&self, snapshot: Option<&QueueSnapshot>, page: usize) -> QueueView {
        let Some((snapshot, current)) = snapshot
            .filter(|s| s.is_ready)
            .and_then(|s| s.current.as_ref().map(|c| (s, c)))
        else {
            return QueueView::Unavailable;
        };

        let queue_size = snapshot.queue_size();
        if queue_size == 0 {
            return QueueView::NowPlaying {
                text: format!("> Playing **{}**", current.title),
            };
        }

        let page_count = self.page_count(queue_size);
        let page_index = if page < page_count { page } else { 0 };
        let header = format!("> Playing **{}** out of {}", current.title, queue_size + 1);

        let rows: Vec<QueueRow> = snapshot
            .upcoming
            .iter()
            .enumerate()
            .skip(page_index * self.page_size)
            .take(self.page_size)
            .map(|(i, track)| QueueRow {
                number: i + 1,
                title: track.title.clone(),
                duration: track.duration_ms.filter(|&ms| ms > 0).map(duration::format),
            })
            .collect();

        let body = rows
            .iter()
            .map(QueueRow::to_string)
            .collect::<Vec<_>>()
            .join("\n\n");

        QueueView::Paged(QueuePage {
            page_index,
            page_count,
            widget: self.widget_for(page_count),
            rows,
            text: format!("{}\n```markdown\n{}\n```", header, body),
        })
    }

    /// Every page of the listing, for widgets that preload them.
    pub fn pages(&self, snapshot: &QueueSnapshot) -> Vec<QueuePage> {
        let count = self.page_count(snapshot.queue_size());
        (0..count)
            .filter_map(|i| match self.view(Some(snapshot), i) {
                QueueView::Paged(page) => Some(page),
                _ => None,
            })
            .collect()
    }
}
