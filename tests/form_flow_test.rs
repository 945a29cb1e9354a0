//! End-to-end walk of a report conversation against the real store, state
//! machine, and renderer — everything short of the transport.

use pretty_assertions::assert_eq;

use lostfound::categories::Category;
use lostfound::conversation::{
    ConversationData, ConversationState, ConversationStore, Field, FlowFields, FlowKind,
};
use lostfound::flow::{advance, FormInput, FormOutcome};
use lostfound::render;

const USER: i64 = 1001;

fn start(store: &ConversationStore, kind: FlowKind) {
    store.start(
        USER,
        ConversationState::AwaitPhoto,
        ConversationData::Form(FlowFields::new(kind)),
    );
}

/// Clone-out, advance, put-back: the same access pattern the handlers use.
fn step(store: &ConversationStore, input: FormInput<'_>) -> FormOutcome {
    let mut record = store.get(USER).expect("active conversation");
    let outcome = advance(&mut record, input);
    store.put(USER, record);
    outcome
}

#[test]
fn found_report_from_start_to_submit() {
    let store = ConversationStore::new();
    start(&store, FlowKind::FoundReport);

    // Photo, then category, lands on the summary
    assert!(matches!(
        step(&store, FormInput::Photo("file_abc")),
        FormOutcome::Prompt { field: Field::Category, .. }
    ));
    assert_eq!(step(&store, FormInput::Category(Category::Electronics)), FormOutcome::ShowSummary);

    // Fill in the location from the summary's edit loop
    assert!(matches!(
        step(&store, FormInput::Edit(Field::Location)),
        FormOutcome::Prompt { field: Field::Location, .. }
    ));
    assert_eq!(step(&store, FormInput::Text("Library, 2nd floor")), FormOutcome::ShowSummary);

    // The summary reflects everything gathered so far
    let record = store.get(USER).unwrap();
    let summary = render::render(record.data.form().unwrap());
    assert!(summary.text.contains("Library, 2nd floor"));
    assert!(summary.text.contains(Category::Electronics.label()));
    assert!(summary.text.contains("<b>Comments:</b> -"));

    // Confirm hands off to submission; the record itself is untouched until
    // the pipeline succeeds
    assert_eq!(step(&store, FormInput::Confirm), FormOutcome::Submit);
    let fields = store.get(USER).unwrap();
    assert_eq!(fields.data.form().unwrap().photo(), Some("file_abc"));
}

#[test]
fn lost_report_can_skip_and_later_add_a_photo() {
    let store = ConversationStore::new();
    start(&store, FlowKind::LostReport);

    assert!(matches!(
        step(&store, FormInput::SkipPhoto),
        FormOutcome::Prompt { field: Field::Category, .. }
    ));
    step(&store, FormInput::Category(Category::Bags));

    // No photo: the summary offers "add", not "edit"
    let record = store.get(USER).unwrap();
    let summary = render::render(record.data.form().unwrap());
    let photo_label = summary
        .actions
        .iter()
        .find(|a| a.field == Field::Photo)
        .map(|a| a.label)
        .unwrap();
    assert_eq!(photo_label, "📸 Add Photo");

    // Adding one from the edit loop flips the label
    step(&store, FormInput::Edit(Field::Photo));
    step(&store, FormInput::Photo("late_photo"));
    let record = store.get(USER).unwrap();
    let summary = render::render(record.data.form().unwrap());
    let photo_label = summary
        .actions
        .iter()
        .find(|a| a.field == Field::Photo)
        .map(|a| a.label)
        .unwrap();
    assert_eq!(photo_label, "📷 Edit Photo");
}

#[test]
fn restarting_a_flow_discards_the_previous_form() {
    let store = ConversationStore::new();
    start(&store, FlowKind::FoundReport);
    step(&store, FormInput::Photo("first"));
    step(&store, FormInput::Category(Category::Hats));

    // A fresh /found replaces the half-done form wholesale
    start(&store, FlowKind::FoundReport);
    let record = store.get(USER).unwrap();
    assert_eq!(record.state, ConversationState::AwaitPhoto);
    assert_eq!(record.data.form().unwrap().photo(), None);
}

#[test]
fn independent_users_do_not_share_state() {
    let store = ConversationStore::new();
    store.start(
        1,
        ConversationState::AwaitPhoto,
        ConversationData::Form(FlowFields::new(FlowKind::FoundReport)),
    );
    store.start(
        2,
        ConversationState::AwaitPhoto,
        ConversationData::Form(FlowFields::new(FlowKind::LostReport)),
    );

    let mut one = store.get(1).unwrap();
    advance(&mut one, FormInput::Photo("only_user_one"));
    store.put(1, one);

    let two = store.get(2).unwrap();
    assert_eq!(two.state, ConversationState::AwaitPhoto);
    assert_eq!(two.data.form().unwrap().photo(), None);
}
