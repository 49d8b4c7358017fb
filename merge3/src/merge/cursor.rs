use indexmap::IndexMap;
use crate::model::{filestate::FileState, row::Row};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Status {
    Unseen,
    Backlog,
    Consumed,
}

///
/// A stream cursor over one loaded file, with push-back via a backlog (design §4.4, C4). Every
/// row starts `Unseen`; it moves to `Consumed` (contributed to output) directly, or to `Backlog`
/// (deferred, still eligible for a later `take`) and from there to `Consumed`.
///
pub struct Cursor<'f> {
    file: &'f FileState,
    pos: usize,
    status: Vec<Status>,
    backlog: IndexMap<String, usize>,
}

impl<'f> Cursor<'f> {
    pub fn new(file: &'f FileState) -> Self {
        Self {
            file,
            pos: 0,
            status: vec![Status::Unseen; file.len()],
            backlog: IndexMap::new(),
        }
    }

    ///
    /// Advance `pos` past any row that is no longer `Unseen`. Monotonic, so the total work across
    /// every call in a merge is O(n) - this is what keeps `peek` and `relevance` (§4.5) O(1)
    /// amortized rather than O(n) per call.
    ///
    fn settle(&mut self) {
        while self.pos < self.status.len() && self.status[self.pos] != Status::Unseen {
            self.pos += 1;
        }
    }

    ///
    /// The row at the cursor, or `None` at end of file. Does not consume it.
    ///
    pub fn peek(&mut self) -> Option<(usize, &'f Row)> {
        self.settle();
        if self.pos < self.status.len() {
            Some((self.pos, self.file.row(self.pos)))
        } else {
            None
        }
    }

    ///
    /// Mark the row at the cursor consumed and step past it.
    ///
    pub fn advance(&mut self) {
        if let Some((idx, _)) = self.peek() {
            self.status[idx] = Status::Consumed;
            self.pos = idx + 1;
        }
    }

    ///
    /// Move the row at the cursor into the backlog and step past it.
    ///
    pub fn defer(&mut self) {
        if let Some((idx, row)) = self.peek() {
            self.status[idx] = Status::Backlog;
            self.backlog.insert(row.key().to_string(), idx);
            self.pos = idx + 1;
        }
    }

    ///
    /// Locate `key`: first in the backlog, then among not-yet-consumed rows ahead of the cursor.
    /// Rows skipped over on the way to an ahead match are deferred (design §4.4: "mark
    /// intervening rows ... else defer"), so they remain available to a later `take`.
    ///
    pub fn take(&mut self, key: &str) -> Option<&'f Row> {
        if let Some(idx) = self.backlog.shift_remove(key) {
            self.status[idx] = Status::Consumed;
            return Some(self.file.row(idx))
        }

        let idx = self.file.position_of(key)?;
        if self.status[idx] != Status::Unseen {
            return None
        }

        self.settle();
        while self.pos < idx {
            self.defer();
        }

        self.status[idx] = Status::Consumed;
        if self.pos == idx {
            self.pos = idx + 1;
        }
        Some(self.file.row(idx))
    }

    pub fn is_consumed(&self, key: &str) -> bool {
        match self.file.position_of(key) {
            Some(idx) => self.status[idx] == Status::Consumed,
            None => false,
        }
    }

    ///
    /// Distance in rows from the cursor to the next not-yet-consumed occurrence of `key`: `0` if
    /// it is in the backlog, `d` if it is `d` rows ahead and unseen, `usize::MAX` ("infinity") if
    /// it has already been consumed or does not exist in this file (design §4.5, C5).
    ///
    pub fn relevance(&mut self, key: &str) -> usize {
        if self.backlog.contains_key(key) {
            return 0
        }

        match self.file.position_of(key) {
            Some(idx) if self.status[idx] == Status::Unseen => {
                self.settle();
                idx.saturating_sub(self.pos)
            },
            _ => usize::MAX,
        }
    }

    pub fn is_drained(&mut self) -> bool {
        self.peek().is_none() && self.backlog.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use crate::model::header::Header;

    fn file(keys: &[&str]) -> FileState {
        let header = Header::new(vec!["k".into()]).unwrap();
        let rows = keys.iter().enumerate()
            .map(|(i, k)| Row::new(i + 2, Bytes::new(), vec![k.to_string()], k.to_string()))
            .collect();
        FileState::new(header, Bytes::new(), rows).unwrap()
    }

    #[test]
    fn test_peek_and_advance_walk_in_order() {
        let f = file(&["1", "2", "3"]);
        let mut c = Cursor::new(&f);
        assert_eq!("1", c.peek().unwrap().1.key());
        c.advance();
        assert_eq!("2", c.peek().unwrap().1.key());
        c.advance();
        c.advance();
        assert!(c.peek().is_none());
    }

    #[test]
    fn test_take_from_ahead_defers_intervening_rows() {
        let f = file(&["1", "2", "3"]);
        let mut c = Cursor::new(&f);
        let row = c.take("3").unwrap();
        assert_eq!("3", row.key());
        assert_eq!(0, c.relevance("1")); // deferred to backlog
        assert_eq!(0, c.relevance("2"));
        assert_eq!(usize::MAX, c.relevance("3")); // already consumed
    }

    #[test]
    fn test_take_from_backlog() {
        let f = file(&["1", "2"]);
        let mut c = Cursor::new(&f);
        c.defer(); // "1" -> backlog
        let row = c.take("1").unwrap();
        assert_eq!("1", row.key());
        assert!(c.is_consumed("1"));
    }

    #[test]
    fn test_relevance_counts_distance_to_unseen_match() {
        let f = file(&["1", "2", "3"]);
        let mut c = Cursor::new(&f);
        assert_eq!(2, c.relevance("3"));
        assert_eq!(usize::MAX, c.relevance("missing"));
    }

    #[test]
    fn test_drained_requires_empty_backlog() {
        let f = file(&["1", "2"]);
        let mut c = Cursor::new(&f);
        c.defer();
        c.advance();
        assert!(!c.is_drained()); // "1" still sits in the backlog
        c.take("1");
        assert!(c.is_drained());
    }
}
