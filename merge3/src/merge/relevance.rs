use crate::merge::cursor::Cursor;

///
/// Distance-to-relevance oracle (design §4.5, C5): how soon `key` next matters in `cursor`'s
/// file. The heavy lifting - backlog lookup and the key index - lives on `Cursor` itself, since
/// that's where the consumed set and position already are; this is the named entry point the
/// driver calls by the vocabulary of §4.6.
///
pub fn relevance(key: &str, cursor: &mut Cursor<'_>) -> usize {
    cursor.relevance(key)
}

pub fn min_relevance(key: &str, a: &mut Cursor<'_>, b: &mut Cursor<'_>) -> usize {
    relevance(key, a).min(relevance(key, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use crate::model::{filestate::FileState, header::Header, row::Row};

    fn file(keys: &[&str]) -> FileState {
        let header = Header::new(vec!["k".into()]).unwrap();
        let rows = keys.iter().enumerate()
            .map(|(i, k)| Row::new(i + 2, Bytes::new(), vec![k.to_string()], k.to_string()))
            .collect();
        FileState::new(header, Bytes::new(), rows).unwrap()
    }

    #[test]
    fn test_min_relevance_picks_the_closer_file() {
        let fa = file(&["1", "2", "9"]);
        let fb = file(&["9", "1"]);
        let mut ca = Cursor::new(&fa);
        let mut cb = Cursor::new(&fb);
        assert_eq!(0, min_relevance("9", &mut ca, &mut cb));
    }
}
