use super::*;
use crate::test_support::{catalog, detail, loading, Screen};

struct DropTop;

impl HistoryFilter<Screen> for DropTop {
    fn on_save_history(&self, history: &History<Screen>) -> History<Screen> {
        history.build_upon().pop(1).build()
    }
}

struct AppendOnRestore(&'static str);

impl HistoryFilter<Screen> for AppendOnRestore {
    fn on_save_history(&self, history: &History<Screen>) -> History<Screen> {
        history.clone()
    }

    fn on_restore_history(&self, history: History<Screen>) -> History<Screen> {
        history.build_upon().push(Screen::new(self.0)).build()
    }
}

#[test]
fn transient_keys_are_dropped_in_order() {
    let history = History::of([
        catalog(),
        loading().transient(),
        detail(),
        Screen::new("toast").transient(),
    ]);
    let saved = TransientKeyFilter.on_save_history(&history);
    assert_eq!(saved, History::of([catalog(), detail()]));
}

#[test]
fn transient_dialog_persists_as_its_component() {
    let dialog = Screen::new("dialog").transient().over(detail());
    let history = History::of([catalog(), dialog]);
    let saved = TransientKeyFilter.on_save_history(&history);
    assert_eq!(saved, History::of([catalog(), detail()]));
}

#[test]
fn persistent_composite_is_kept_whole() {
    let sheet = Screen::new("sheet").over(loading().transient());
    let history = History::of([catalog(), sheet.clone()]);
    let saved = TransientKeyFilter.on_save_history(&history);
    assert_eq!(saved.as_slice(), &[catalog(), sheet]);
    assert!(saved.flattened().contains(&loading().transient()));
}

#[test]
fn transient_frame_unwraps_to_persistent_composites() {
    let sheet = Screen::new("sheet").over(loading().transient());
    let dialog = Screen::new("dialog")
        .transient()
        .over(Screen::new("toast").transient())
        .over(sheet.clone());
    let saved = TransientKeyFilter.on_save_history(&History::of([catalog(), dialog]));
    assert_eq!(saved.as_slice(), &[catalog(), sheet]);
}

#[test]
fn all_transient_history_saves_empty() {
    let history = History::single(loading().transient());
    assert!(TransientKeyFilter.on_save_history(&history).is_empty());
}

#[test]
fn restore_is_identity_by_default() {
    let history = History::of([catalog(), detail()]);
    assert_eq!(TransientKeyFilter.on_restore_history(history.clone()), history);
}

#[test]
fn chain_applies_filters_in_order() {
    let chain = FilterChain::standard().with(DropTop);
    assert_eq!(chain.len(), 2);

    let history = History::of([catalog(), detail(), loading().transient()]);
    // The transient frame goes first, then the top persistent frame.
    assert_eq!(chain.on_save_history(&history), History::of([catalog()]));
}

#[test]
fn chain_runs_restore_hooks() {
    let chain = FilterChain::new()
        .with(AppendOnRestore("first"))
        .with(AppendOnRestore("second"));
    let restored = chain.on_restore_history(History::single(catalog()));
    let names: Vec<_> = restored.frames_from_bottom().map(Screen::name).collect();
    assert_eq!(names, vec!["catalog", "first", "second"]);
}

#[test]
fn empty_chain_passes_history_through() {
    let chain: FilterChain<Screen> = FilterChain::new();
    assert!(chain.is_empty());
    let history = History::of([catalog(), loading().transient()]);
    assert_eq!(chain.on_save_history(&history), history);
}

#[test]
fn default_chain_is_standard() {
    let chain: FilterChain<Screen> = FilterChain::default();
    assert_eq!(chain.len(), 1);
}
