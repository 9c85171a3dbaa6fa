use navflow_core::{
    BindingTag, Direction, FilterChain, History, HistoryFilter, NavError, Navigator,
    ScopeManager, ScopeTag, TransientKeyFilter,
};
use navflow_testing::{
    Counter, CounterFactory, ManualDispatcher, RecordingDispatcher, RecordingHistoryCallback,
    TestKey,
};

fn key(name: &str) -> TestKey {
    TestKey::new(name)
}

fn screen_two() -> TestKey {
    TestKey::new("screen-two").uses("counter", "two")
}

fn dialog() -> TestKey {
    TestKey::new("dialog")
        .transient()
        .over(screen_two())
        .uses("counter", "two")
}

fn scoped(history: History<TestKey>, factory: &CounterFactory) -> Navigator<TestKey> {
    Navigator::builder(history)
        .scopes(
            ScopeManager::builder()
                .scope("counter", factory.clone())
                .build()
                .expect("distinct scopes"),
        )
        .build()
        .expect("valid default history")
}

#[test]
fn push_push_pop_lands_backward() {
    let nav = Navigator::new(History::single(key("root"))).expect("valid history");
    let dispatcher = RecordingDispatcher::new();
    nav.set_dispatcher(dispatcher.clone());

    nav.push(key("a")).expect("valid key");
    nav.push(key("b")).expect("valid key");
    nav.pop(1).expect("valid request");

    let last = dispatcher.last().expect("dispatched");
    assert_eq!(last.direction(), Direction::Backward);
    assert_eq!(nav.history(), History::of([key("root"), key("a")]));
}

#[test]
fn replacing_the_whole_stack_is_replace() {
    let nav = Navigator::new(History::single(key("a"))).expect("valid history");
    let dispatcher = RecordingDispatcher::new();
    nav.set_dispatcher(dispatcher.clone());

    nav.set_history(History::of([key("x"), key("y")]))
        .expect("valid history");
    assert_eq!(
        dispatcher.last().map(|traversal| traversal.direction()),
        Some(Direction::Replace)
    );
}

#[test]
fn request_during_a_pending_traversal_dispatches_once_more() {
    let nav = Navigator::new(History::single(key("h1"))).expect("valid history");
    let dispatcher = ManualDispatcher::new();
    nav.set_dispatcher(dispatcher.clone());
    assert_eq!(dispatcher.fire_all(), 1);

    nav.set_history(History::of([key("h1"), key("h2")]))
        .expect("valid history");
    nav.set_history(History::of([key("h1"), key("h2"), key("h3")]))
        .expect("valid history");
    assert_eq!(dispatcher.pending(), 1);

    assert_eq!(dispatcher.fire_all(), 2);
    dispatcher.assert_idle();
    let traversals = dispatcher.traversals();
    assert_eq!(traversals.len(), 3);
    assert_eq!(traversals[1].destination().len(), 2);
    assert_eq!(traversals[2].origin().map(History::len), Some(2));
    assert_eq!(traversals[2].destination().len(), 3);
}

#[test]
fn dialog_over_screen_two_flattens_and_closes_backward() {
    let factory = CounterFactory::new();
    let nav = scoped(History::of([key("one"), screen_two()]), &factory);
    let dispatcher = RecordingDispatcher::new();
    nav.set_dispatcher(dispatcher.clone());

    nav.replace_top(dialog()).expect("valid key");
    assert_eq!(
        nav.history().flattened(),
        vec![key("one"), screen_two(), dialog()]
    );
    assert_eq!(
        dispatcher.last().map(|traversal| traversal.direction()),
        Some(Direction::Forward)
    );

    let counter = nav
        .get_model::<Counter>(&ScopeTag::from("counter"), &BindingTag::from("two"))
        .expect("shared model");
    counter.increment();

    nav.replace_top(screen_two()).expect("valid key");
    assert_eq!(
        dispatcher.last().map(|traversal| traversal.direction()),
        Some(Direction::Backward)
    );
    let after = nav
        .get_model::<Counter>(&ScopeTag::from("counter"), &BindingTag::from("two"))
        .expect("shared model");
    assert_eq!(after.get(), 1);
    assert_eq!(factory.created(), 1);
}

#[test]
fn popping_at_the_minimum_clears_without_dispatching() {
    let nav = Navigator::new(History::single(key("root"))).expect("valid history");
    let callback = RecordingHistoryCallback::new();
    nav.set_history_callback(callback.clone());
    let dispatcher = RecordingDispatcher::new();
    nav.set_dispatcher(dispatcher.clone());
    dispatcher.clear();

    nav.go_back().expect("valid request");
    assert_eq!(callback.cleared(), 1);
    assert_eq!(dispatcher.count(), 0);
}

#[test]
fn model_lookup_after_the_screen_left_is_not_found() {
    let factory = CounterFactory::new();
    let nav = scoped(History::of([key("one"), screen_two()]), &factory);
    nav.set_dispatcher(RecordingDispatcher::new());

    nav.go_back().expect("valid request");
    assert_eq!(
        nav.model(&ScopeTag::from("counter"), &BindingTag::from("two"))
            .err(),
        Some(NavError::NotFound {
            scope: ScopeTag::from("counter"),
            binding: BindingTag::from("two"),
        })
    );
}

#[test]
fn custom_filters_run_after_the_transient_filter() {
    struct KeepRoot;

    impl HistoryFilter<TestKey> for KeepRoot {
        fn on_save_history(&self, history: &History<TestKey>) -> History<TestKey> {
            history.frames_from_bottom().take(1).cloned().collect()
        }
    }

    let chain = FilterChain::new().with(TransientKeyFilter).with(KeepRoot);
    let history = History::of([key("splash").transient(), key("home"), key("detail")]);
    assert_eq!(chain.on_save_history(&history), History::single(key("home")));
}
