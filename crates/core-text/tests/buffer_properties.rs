use core_text::{Position, TextBuffer};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert(Position, char),
    Delete(Position),
    Split(Position),
    Join(usize),
    Cursor(Position),
}

fn pos() -> impl Strategy<Value = Position> {
    (0usize..8, 0usize..12).prop_map(|(row, col)| Position::new(row, col))
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (pos(), prop::char::range('a', 'z')).prop_map(|(p, c)| Op::Insert(p, c)),
        (pos(), Just('漢')).prop_map(|(p, c)| Op::Insert(p, c)),
        pos().prop_map(Op::Delete),
        pos().prop_map(Op::Split),
        (0usize..8).prop_map(Op::Join),
        pos().prop_map(Op::Cursor),
    ]
}

fn apply(buf: &mut TextBuffer, op: &Op) {
    match *op {
        Op::Insert(p, c) => {
            buf.insert_rune(p, c);
        }
        Op::Delete(p) => {
            buf.delete_rune(p);
        }
        Op::Split(p) => {
            buf.split_line(p);
        }
        Op::Join(row) => {
            buf.join_line(Position::new(row, 0));
        }
        Op::Cursor(p) => buf.set_cursor(p),
    }
}

proptest! {
    #[test]
    fn cursor_stays_inside_the_document(
        text in "[a-c \t\n]{0,40}",
        ops in prop::collection::vec(op(), 0..40),
    ) {
        let mut buf = TextBuffer::from_text(&text);
        for op in &ops {
            apply(&mut buf, op);
            let cur = buf.cursor();
            prop_assert!(buf.line_count() >= 1);
            prop_assert!(cur.row < buf.line_count(), "{:?} after {:?}", cur, op);
            prop_assert!(cur.col <= buf.line_len(cur.row), "{:?} after {:?}", cur, op);
        }
    }

    #[test]
    fn delete_undoes_insert(
        text in "[a-c \n]{0,40}",
        at in pos(),
        r in prop::char::range('a', 'z'),
    ) {
        let mut buf = TextBuffer::from_text(&text);
        let at = buf.clamp(at);
        prop_assert!(buf.insert_rune(at, r));
        prop_assert_eq!(buf.cursor(), Position::new(at.row, at.col + 1));
        prop_assert_eq!(buf.delete_rune(at), Some(r));
        prop_assert_eq!(buf.to_text(), text);
    }

    #[test]
    fn join_undoes_split(text in "[a-c \n]{0,40}", at in pos()) {
        let mut buf = TextBuffer::from_text(&text);
        let at = buf.clamp(at);
        let lines = buf.line_count();
        prop_assert!(buf.split_line(at));
        prop_assert_eq!(buf.line_count(), lines + 1);
        prop_assert_eq!(buf.cursor(), Position::new(at.row + 1, 0));
        prop_assert!(buf.join_line(at));
        prop_assert_eq!(buf.to_text(), text);
    }
}
