/*
 * paging.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Mailbridge, an email integration engine.
 *
 * Mailbridge is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Mailbridge is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Mailbridge.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Pagination over message sequence numbers. Page 1 is the newest slice:
//! the window counts down from the mailbox's EXISTS total, and fetched
//! results are reversed afterwards so the highest sequence number comes
//! first.

use serde::Serialize;

/// A 1-based inclusive sequence-number window for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub start: u32,
    pub end: u32,
    pub total: u32,
    pub page: u32,
    pub limit: u32,
}

impl PageWindow {
    /// Empty means: issue no FETCH, return no messages, keep `total`.
    /// A page lying entirely past the mailbox start counts as empty even
    /// though the clamped bounds both sit at 1; fetching there would only
    /// re-serve the oldest message.
    pub fn is_empty(&self) -> bool {
        if self.total == 0 || self.start > self.end {
            return true;
        }
        let skipped = u64::from(self.page.saturating_sub(1)) * u64::from(self.limit);
        skipped >= u64::from(self.total)
    }
}

/// Compute the window for `page` (1-based) of size `limit` over `total`
/// messages. `start`/`end` never drop below 1; a page beyond the range and
/// a zero total (or zero limit) produce an empty window.
pub fn compute_window(total: u32, page: u32, limit: u32) -> PageWindow {
    let page = page.max(1);
    let total_i = i64::from(total);
    let page_i = i64::from(page);
    let limit_i = i64::from(limit);
    let start = (total_i - page_i * limit_i + 1).max(1) as u32;
    let end = (total_i - (page_i - 1) * limit_i).max(1) as u32;
    PageWindow {
        start,
        end,
        total,
        page,
        limit,
    }
}
