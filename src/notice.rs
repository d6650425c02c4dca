use std::collections::VecDeque;

/// Kept for inspection after notices leave the screen
const HISTORY_LIMIT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum NoticeKind {
    #[strum(serialize = "Invalid input")]
    InvalidInput,
    #[strum(serialize = "Countdown")]
    CountdownFinished,
    #[strum(serialize = "Timer file")]
    WriteFailed,
}

/// A non-blocking popup message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct NoticeBoard {
    next_id: u64,
    visible: VecDeque<Notice>,
    history: VecDeque<Notice>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&mut self, kind: NoticeKind, message: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let notice = Notice {
            id,
            kind,
            message: message.into(),
        };
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(notice.clone());
        self.visible.push_back(notice);
        id
    }

    /// Oldest notice still on screen
    pub fn front(&self) -> Option<&Notice> {
        self.visible.front()
    }

    pub fn visible(&self) -> impl Iterator<Item = &Notice> {
        self.visible.iter()
    }

    pub fn has_visible(&self) -> bool {
        !self.visible.is_empty()
    }

    pub fn dismiss_front(&mut self) -> Option<Notice> {
        self.visible.pop_front()
    }

    /// Removes the notice with `id` if it is still visible
    pub fn expire(&mut self, id: u64) -> bool {
        match self.visible.iter().position(|n| n.id == id) {
            Some(idx) => self.visible.remove(idx).is_some(),
            None => false,
        }
    }

    /// Every notice raised recently, newest last
    pub fn raised(&self) -> impl Iterator<Item = &Notice> {
        self.history.iter()
    }

    pub fn raised_count(&self, kind: NoticeKind) -> usize {
        self.history.iter().filter(|n| n.kind == kind).count()
    }
}
