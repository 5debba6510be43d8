//! 非定位弹幕的行分配。
//!
//! 四种显示方式各有一条独立的行道，行道按画布像素行划分。
//! 同一时刻、同一行道内的弹幕不会重叠，除非触发挤占回退。

use crate::config::AssRenderOptions;
use crate::types::Comment;

/// 行道中一个像素行的占用记录，保留重算该行何时空闲所需的数据。
#[derive(Debug, Clone, Copy, PartialEq)]
struct RowOccupant {
    sequence: usize,
    start: f64,
    width: f64,
}

impl RowOccupant {
    fn of(comment: &Comment) -> Self {
        Self {
            sequence: comment.sequence,
            start: comment.timestamp,
            width: comment.pixel_width,
        }
    }
}

/// 四条行道的占用网格。
///
/// 每条行道的槽位数为可用高度加一，下标即画布上的像素行。
#[derive(Debug)]
pub(super) struct LaneGrid {
    lanes: [Vec<Option<RowOccupant>>; 4],
    width: f64,
    height: f64,
    bottom_reserved: f64,
    duration_marquee: f64,
    duration_still: f64,
}

impl LaneGrid {
    pub(super) fn new(options: &AssRenderOptions) -> Self {
        let usable =
            (i64::from(options.height) - i64::from(options.bottom_reserved) + 1).max(0) as usize;
        Self {
            lanes: std::array::from_fn(|_| vec![None; usable]),
            width: f64::from(options.width),
            height: f64::from(options.height),
            bottom_reserved: f64::from(options.bottom_reserved),
            duration_marquee: options.duration_marquee,
            duration_still: options.duration_still,
        }
    }

    /// 自顶向下为弹幕找一段连续的空闲行。
    ///
    /// 找不到时的行为取决于 `reduce`：为 `false` 时挤进最早就会空出的行，
    /// 返回该行；为 `true` 时返回 `None`，弹幕被丢弃。
    pub(super) fn allocate(&mut self, comment: &Comment, reduce: bool) -> Option<usize> {
        let lane = comment.mode.lane_index()?;
        let row_max = self.height - self.bottom_reserved - comment.block_height;
        let mut row = 0usize;
        while (row as f64) <= row_max {
            let free = self.count_free_rows(lane, comment, row);
            if (free as f64) >= comment.block_height {
                self.mark(lane, comment, row);
                return Some(row);
            }
            row += free.max(1);
        }
        if reduce {
            None
        } else {
            let row = self.find_alternative_row(lane, comment);
            self.mark(lane, comment, row);
            Some(row)
        }
    }

    /// 从 `start_row` 向下数连续空闲的行数，遇到仍然存活的占用者就停。
    fn count_free_rows(&self, lane: usize, comment: &Comment, start_row: usize) -> usize {
        let rows = &self.lanes[lane];
        let row_limit = rows.len().saturating_sub(1);
        let mut free = 0usize;
        let mut row = start_row;
        // 相邻行往往被同一条弹幕占用，检查过一次就跳过
        let mut checked: Option<RowOccupant> = None;
        if comment.mode.is_static() {
            while row < row_limit && (free as f64) < comment.block_height {
                if checked != rows[row] {
                    checked = rows[row];
                    if let Some(occupant) = checked
                        && occupant.start + self.duration_still > comment.timestamp
                    {
                        break;
                    }
                }
                row += 1;
                free += 1;
            }
        } else {
            let denominator = comment.pixel_width + self.width;
            // 新弹幕完全进入画面之前，该行也不能被再次使用
            let threshold = if denominator == 0.0 {
                comment.timestamp - self.duration_marquee
            } else {
                comment.timestamp
                    - self.duration_marquee * (1.0 - self.width / denominator)
            };
            while row < row_limit && (free as f64) < comment.block_height {
                if checked != rows[row] {
                    checked = rows[row];
                    if let Some(occupant) = checked {
                        if occupant.start > threshold {
                            break;
                        }
                        let travel = occupant.width + self.width;
                        if travel != 0.0
                            && occupant.start + occupant.width * self.duration_marquee / travel
                                > comment.timestamp
                        {
                            break;
                        }
                    }
                }
                row += 1;
                free += 1;
            }
        }
        free
    }

    /// 把 `[start_row, start_row + ceil(blockHeight))` 标记为该弹幕占用。
    fn mark(&mut self, lane: usize, comment: &Comment, start_row: usize) {
        let span = comment.block_height.ceil().max(0.0) as usize;
        let occupant = RowOccupant::of(comment);
        for slot in self.lanes[lane].iter_mut().skip(start_row).take(span) {
            *slot = Some(occupant);
        }
    }

    /// 在有效范围内找第一个空行；没有空行时取出现时刻最早的那一行。
    fn find_alternative_row(&self, lane: usize, comment: &Comment) -> usize {
        let rows = &self.lanes[lane];
        let limit =
            (self.height - self.bottom_reserved - comment.block_height.ceil()).max(0.0) as usize;
        let mut stalest = 0usize;
        for (row, slot) in rows.iter().enumerate().take(limit) {
            match slot {
                None => return row,
                Some(occupant) => {
                    if rows[stalest].is_some_and(|held| occupant.start < held.start) {
                        stalest = row;
                    }
                }
            }
        }
        stalest
    }
}
