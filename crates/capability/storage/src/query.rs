//! 行查询游标
//!
//! 抓取周期的每个阶段持有一个游标：打开时一次性缓冲结果集，
//! 之后逐行取出，耗尽或关闭后不再返回任何行。

use std::collections::VecDeque;

/// 已打开的行查询。
#[derive(Debug)]
pub struct RowQuery<T> {
    rows: VecDeque<T>,
    closed: bool,
}

impl<T> RowQuery<T> {
    pub fn from_rows(rows: Vec<T>) -> Self {
        Self {
            rows: rows.into(),
            closed: false,
        }
    }

    pub fn empty() -> Self {
        Self::from_rows(Vec::new())
    }

    /// 前进一行；`None` 表示结果集耗尽。
    pub fn fetch_row(&mut self) -> Option<T> {
        if self.closed {
            return None;
        }
        self.rows.pop_front()
    }

    /// 剩余未取出的行数。
    pub fn remaining(&self) -> usize {
        if self.closed { 0 } else { self.rows.len() }
    }

    pub fn close(&mut self) {
        self.closed = true;
        self.rows.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::RowQuery;

    #[test]
    fn closed_query_yields_nothing() {
        let mut query = RowQuery::from_rows(vec![1, 2, 3]);
        assert_eq!(query.fetch_row(), Some(1));
        assert_eq!(query.remaining(), 2);
        query.close();
        assert!(query.is_closed());
        assert_eq!(query.fetch_row(), None);
    }
}
