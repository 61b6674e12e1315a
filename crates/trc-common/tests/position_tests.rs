use super::*;

#[test]
fn offsets_map_to_lines_and_columns() {
    let source = "def f\n  1\nend\n";
    let map = LineMap::build(source);
    assert_eq!(map.line_count(), 4);
    assert_eq!(map.offset_to_position(0), Position { line: 0, character: 0 });
    assert_eq!(map.offset_to_position(8), Position { line: 1, character: 2 });
    assert_eq!(map.offset_to_position(10), Position { line: 2, character: 0 });
    assert_eq!(map.line_text(1, source), "  1");
    assert_eq!(map.line_text(2, source), "end");
}

#[test]
fn offset_past_end_clamps_to_last_line() {
    let map = LineMap::build("a\nb");
    assert_eq!(map.offset_to_position(50).line, 1);
}

#[test]
fn interner_round_trips_and_dedupes() {
    let interner = ShardedInterner::new();
    let a = interner.intern("User");
    let b = interner.intern("User");
    let c = interner.intern("Admin");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(&*interner.resolve(a), "User");
    assert_eq!(interner.intern(""), Atom::NONE);
}
