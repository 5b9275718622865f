//! Pagination state definitions for a category crawl
//!
//! This module defines every state a category crawl can be in and the
//! transitions between them.

use crate::CellarError;
use std::fmt;

/// Represents the current position of a category crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    // ===== Active States =====
    /// The given page is about to be requested
    Fetching { page: u32 },

    /// The given page timed out `timeouts` times in a row and is requested again
    Retrying { page: u32, timeouts: u32 },

    // ===== Terminal States =====
    /// The listing ended (sentinel, empty page, HTTP error status or page cap)
    Exhausted,

    /// The listing could not be completed; the category is abandoned
    Failed,
}

/// Outcome of one fetch-and-parse step, as seen by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlEvent {
    /// The page yielded items
    PageParsed,

    /// The page signalled the end of the listing
    EndOfResults,

    /// The request timed out
    TimedOut,

    /// An unrecoverable error occurred
    Fatal,
}

impl CrawlState {
    /// Initial state of every category crawl
    pub fn start() -> Self {
        Self::Fetching { page: 1 }
    }

    /// Returns true if no further page will be requested
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted | Self::Failed)
    }

    /// Returns true if the crawl may still request pages
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// The page the next request targets, if any
    pub fn page(&self) -> Option<u32> {
        match self {
            Self::Fetching { page } | Self::Retrying { page, .. } => Some(*page),
            Self::Exhausted | Self::Failed => None,
        }
    }

    /// Consecutive timeouts on the current page
    pub fn timeouts(&self) -> u32 {
        match self {
            Self::Retrying { timeouts, .. } => *timeouts,
            _ => 0,
        }
    }

    /// Computes the state following `event`
    ///
    /// # Transition Rules
    ///
    /// | Event | Next state |
    /// |-------|------------|
    /// | PageParsed | `Fetching(page + 1)`, or `Exhausted` once `max_page` is reached |
    /// | EndOfResults | `Exhausted` |
    /// | TimedOut | `Retrying(page, n + 1)`, or `Failed` when `n + 1 > max_timeouts` |
    /// | Fatal | `Failed` |
    ///
    /// A success always resets the timeout counter. Terminal states accept no
    /// event.
    pub fn on_event(
        self,
        event: CrawlEvent,
        max_page: Option<u32>,
        max_timeouts: u32,
    ) -> Result<Self, CellarError> {
        let page = match self.page() {
            Some(page) => page,
            None => return Err(CellarError::InvalidTransition { from: self, event }),
        };

        let next = match event {
            CrawlEvent::PageParsed => match max_page {
                Some(max) if page >= max => Self::Exhausted,
                _ => Self::Fetching { page: page + 1 },
            },
            CrawlEvent::EndOfResults => Self::Exhausted,
            CrawlEvent::TimedOut => {
                let timeouts = self.timeouts() + 1;
                if timeouts > max_timeouts {
                    Self::Failed
                } else {
                    Self::Retrying { page, timeouts }
                }
            }
            CrawlEvent::Fatal => Self::Failed,
        };

        Ok(next)
    }
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetching { page } => write!(f, "fetching page {}", page),
            Self::Retrying { page, timeouts } => {
                write!(f, "retrying page {} after {} timeouts", page, timeouts)
            }
            Self::Exhausted => f.write_str("exhausted"),
            Self::Failed => f.write_str("failed"),
        }
    }
}
