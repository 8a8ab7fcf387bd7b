use rowan::TextSize;

use super::*;

#[test]
fn ids_follow_insertion_order() {
    let mut map = SourceMap::new();
    let a = map.add_file("a.sql", "A");
    let b = map.add_one_liner("B");
    let c = map.add_stdin("C");

    assert!(a < b && b < c);
    assert_eq!(map.len(), 3);
    let contents: Vec<_> = map.iter().map(|s| s.content).collect();
    assert_eq!(contents, vec!["A", "B", "C"]);
}

#[test]
fn display_and_module_names() {
    let mut map = SourceMap::new();
    let file = map.add_file("queries/module_1.sql", "");
    let inline = map.add_one_liner("");
    let stdin = map.add_stdin("");

    assert_eq!(map.kind(file).display_name(), "queries/module_1.sql");
    assert_eq!(map.module_name(file), "module_1");
    assert_eq!(map.module_name(inline), "<query>");
    assert_eq!(map.module_name(stdin), "<stdin>");
}

#[test]
fn line_col_is_one_based() {
    let map = SourceMap::one_liner("ab\ncd\n");
    let id = map.iter().next().unwrap().id;

    assert_eq!(map.line_col(id, TextSize::from(0)), (1, 1));
    assert_eq!(map.line_col(id, TextSize::from(1)), (1, 2));
    assert_eq!(map.line_col(id, TextSize::from(3)), (2, 1));
    assert_eq!(map.line_col(id, TextSize::from(6)), (3, 1));
}

#[test]
fn line_col_counts_characters() {
    let map = SourceMap::one_liner("-- é\nx");
    let id = map.iter().next().unwrap().id;

    // `é` is two bytes but one column
    assert_eq!(map.line_col(id, TextSize::from(5)), (1, 5));
}

#[test]
fn line_col_clamps_past_end() {
    let map = SourceMap::one_liner("abc");
    let id = map.iter().next().unwrap().id;

    assert_eq!(map.line_col(id, TextSize::from(99)), (1, 4));
}
