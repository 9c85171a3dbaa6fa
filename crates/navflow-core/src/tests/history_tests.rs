use super::*;
use crate::test_support::{catalog, detail, error, loading, names_from_top, Screen};

#[test]
fn builder_pushes_root_first() {
    let history = History::builder()
        .push(catalog())
        .push(detail())
        .push(loading())
        .build();

    assert_eq!(history.len(), 3);
    assert_eq!(history.top(), Some(&loading()));
    assert_eq!(history.peek(0), Some(&loading()));
    assert_eq!(history.peek(2), Some(&catalog()));
    assert_eq!(history.peek(3), None);
    assert_eq!(history.peek(usize::MAX), None);
    assert_eq!(names_from_top(&history), vec!["loading", "detail", "catalog"]);
}

#[test]
fn build_upon_leaves_the_source_untouched() {
    let original = History::of([catalog(), detail()]);
    let extended = original.build_upon().push(error()).build();

    assert_eq!(original.len(), 2);
    assert_eq!(extended.len(), 3);
    assert_eq!(original.build_upon().build(), original);
}

#[test]
fn pop_clamps_at_empty() {
    let builder = History::of(["a", "b"]).build_upon().pop(5);
    assert!(builder.is_empty());
    assert!(builder.build().is_empty());
}

#[test]
fn pop_zero_is_a_no_op() {
    let history = History::of(["a", "b"]);
    assert_eq!(history.build_upon().pop(0).build(), history);
}

#[test]
fn pop_one_returns_the_top() {
    let mut builder = History::of(["a", "b"]).build_upon();
    assert_eq!(builder.pop_one(), Some("b"));
    assert_eq!(builder.peek(), Some(&"a"));
    assert_eq!(builder.pop_one(), Some("a"));
    assert_eq!(builder.pop_one(), None);
}

#[test]
fn pop_to_keeps_the_topmost_match() {
    let history = History::of(["a", "b", "a", "c"]);
    let popped = history.build_upon().pop_to(&"a").expect("a is present").build();
    assert_eq!(popped, History::of(["a", "b", "a"]));
}

#[test]
fn pop_to_missing_key_fails() {
    let err = History::of(["a"]).build_upon().pop_to(&"z").unwrap_err();
    assert_eq!(
        err,
        ConfigurationError::KeyNotInHistory {
            key: "\"z\"".to_string()
        }
    );
}

#[test]
fn clear_empties_the_builder() {
    let builder = History::of(["a", "b"]).build_upon().clear().push("c");
    assert_eq!(builder.len(), 1);
    assert_eq!(builder.build(), History::single("c"));
}

#[test]
fn frames_iterate_in_both_orders() {
    let history = History::of(["a", "b", "c"]);
    let bottom: Vec<_> = history.frames_from_bottom().copied().collect();
    let top: Vec<_> = history.frames_from_top().copied().collect();
    assert_eq!(bottom, vec!["a", "b", "c"]);
    assert_eq!(top, vec!["c", "b", "a"]);
    assert_eq!((&history).into_iter().count(), 3);
}

#[test]
fn composite_flattens_components_first() {
    let dialog = Screen::new("dialog").over(detail());
    let history = History::of([catalog(), dialog.clone()]);

    assert_eq!(history.len(), 2);
    assert_eq!(history.flattened(), vec![catalog(), detail(), dialog]);
}

#[test]
fn nested_composites_flatten_recursively() {
    let inner = Screen::new("sheet").over(detail());
    let outer = Screen::new("dialog").over(inner.clone());
    let history = History::single(outer.clone());

    assert_eq!(history.flattened(), vec![detail(), inner, outer]);
}

#[test]
fn equality_is_by_flattened_frames() {
    let a = History::of(["x", "y"]);
    let b = History::of(["x", "y"]);
    let c = History::of(["y", "x"]);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.clone(), a);
}

#[test]
fn contains_checks_top_level_frames() {
    let dialog = Screen::new("dialog").over(detail());
    let history = History::of([catalog(), dialog.clone()]);
    assert!(history.contains(&dialog));
    assert!(history.contains(&catalog()));
    assert!(!history.contains(&detail()));
}

#[test]
fn depth_check_rejects_deep_composites() {
    let mut key = Screen::new("leaf");
    for _ in 0..4 {
        key = Screen::new("wrapper").over(key);
    }
    let history = History::single(key);

    assert!(history.check_depth(4).is_ok());
    assert_eq!(
        history.check_depth(3),
        Err(ConfigurationError::CompositeTooDeep { limit: 3 })
    );
}

#[test]
fn debug_lists_frames() {
    let history = History::of(["a", "b"]);
    assert_eq!(format!("{history:?}"), "[\"a\", \"b\"]");
    assert_eq!(format!("{:?}", history.build_upon()), "[\"a\", \"b\"]");
}

#[test]
fn empty_history_has_no_top() {
    let history: History<String> = History::default();
    assert!(history.is_empty());
    assert_eq!(history.top(), None);
    assert_eq!(history.peek(0), None);
}
