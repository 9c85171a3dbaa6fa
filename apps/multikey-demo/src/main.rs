use std::cell::Cell;
use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::rc::Rc;

use navflow_core::{
    BindingTag, History, HistoryCallback, Key, ModelPayload, Navigator, ScopeManager,
    ScopeRelations, ScopeTag, ScopedModel, Traversal, TraversalCompletion,
};
use navflow_runtime_std::{json_payload, load_config, JsonKeyCodec, JsonScopeFactory, StateFile};
use serde::{Deserialize, Serialize};

const COUNTER_SCOPE: ScopeTag = ScopeTag::from_static("counter");
const SCREEN_TWO_BINDING: BindingTag = BindingTag::from_static("screen-two");

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum Screen {
    One,
    Two,
    /// Shown over another screen and never persisted.
    Dialog(Box<Screen>),
}

impl Key for Screen {
    fn components(&self) -> Vec<Self> {
        match self {
            Screen::Dialog(under) => vec![(**under).clone()],
            _ => Vec::new(),
        }
    }

    fn is_transient(&self) -> bool {
        matches!(self, Screen::Dialog(_))
    }

    fn scope_relations(&self) -> ScopeRelations {
        match self {
            Screen::One => ScopeRelations::new(),
            Screen::Two => ScopeRelations::single(COUNTER_SCOPE, SCREEN_TWO_BINDING),
            Screen::Dialog(under) => under.scope_relations(),
        }
    }
}

/// Clicks shared by screen two and any dialog over it.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ClickCounter {
    clicks: Cell<u32>,
}

impl ClickCounter {
    fn click(&self) -> u32 {
        let clicks = self.clicks.get() + 1;
        self.clicks.set(clicks);
        clicks
    }
}

impl ScopedModel for ClickCounter {
    fn persist(&self) -> Option<ModelPayload> {
        json_payload(self)
    }
}

struct FinishOnClear {
    finished: Rc<Cell<bool>>,
}

impl HistoryCallback<Screen> for FinishOnClear {
    fn on_history_cleared(&self) {
        println!("<- back from the root, flow finished");
        self.finished.set(true);
    }
}

fn main() {
    env_logger::init();

    println!("=== navflow multikey demo ===");
    println!("Screen two and its dialog share one click counter.");
    println!("Run twice to see the saved history and clicks come back.");
    println!();

    if let Err(err) = run() {
        log::error!("demo failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let state_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| env::temp_dir().join("navflow-multikey.json"));
    let config_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("navflow.toml"));

    let config = load_config(&config_path)?;
    let state_file = StateFile::new(state_path);
    let codec = JsonKeyCodec::<Screen>::new();
    let finished = Rc::new(Cell::new(false));

    let scopes = ScopeManager::builder()
        .scope(COUNTER_SCOPE, JsonScopeFactory::<ClickCounter>::with_default())
        .build()?;
    let mut builder = Navigator::builder(History::single(Screen::One))
        .config(config)
        .scopes(scopes)
        .history_callback(FinishOnClear {
            finished: Rc::clone(&finished),
        });
    if let Some(state) = state_file.load()? {
        println!("restoring state from {:?}", state_file.path());
        builder = builder.restore(&state, &codec);
    }
    let navigator = builder.build()?;
    if let Some(err) = navigator.restore_error() {
        log::warn!("saved state ignored: {err}");
    }

    let handle = navigator.downgrade();
    navigator.set_dispatcher(
        move |traversal: Traversal<Screen>, completion: TraversalCompletion<Screen>| {
            let clicks = handle
                .upgrade()
                .and_then(|navigator| {
                    navigator
                        .get_model::<ClickCounter>(&COUNTER_SCOPE, &SCREEN_TWO_BINDING)
                        .ok()
                })
                .map(|counter| counter.clicks.get());
            let top = traversal.destination().top();
            match clicks {
                Some(clicks) => println!(
                    "{:?} to {top:?} ({clicks} clicks)",
                    traversal.direction()
                ),
                None => println!("{:?} to {top:?}", traversal.direction()),
            }
            completion.complete();
        },
    );

    navigator.set(Screen::Two)?;
    click(&navigator)?;
    navigator.replace_top(Screen::Dialog(Box::new(Screen::Two)))?;
    click(&navigator)?;

    let state = navigator.save_state(&codec)?;
    state_file.save(&state)?;
    println!(
        "saved {} frames to {:?}; the dialog is left out",
        state.history.len(),
        state_file.path()
    );

    while !finished.get() {
        navigator.go_back()?;
    }
    navigator.dispose();
    Ok(())
}

fn click(navigator: &Navigator<Screen>) -> Result<(), Box<dyn Error>> {
    let counter = navigator.get_model::<ClickCounter>(&COUNTER_SCOPE, &SCREEN_TWO_BINDING)?;
    println!("   click -> {}", counter.click());
    Ok(())
}
