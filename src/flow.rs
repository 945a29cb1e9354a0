//! Form state machine for the report flows.
//!
//! Both report forms run on the same engine: an ordered list of collection
//! steps (photo, category), then the summary loop where any field can be
//! edited before confirming. `advance` is the single transition function —
//! it mutates only the conversation record and tells the caller what to put
//! on screen next, so the whole machine is testable without a transport.

use crate::conversation::{ConversationRecord, ConversationState, Field, FlowKind};
use crate::core::config::SKIP_MARKER;

/// One collection step of a report form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub field: Field,
    pub prompt: &'static str,
    pub skippable: bool,
}

const FOUND_STEPS: &[Step] = &[
    Step {
        field: Field::Photo,
        prompt: "📸 Please send a photo of the item you found.",
        skippable: false,
    },
    Step {
        field: Field::Category,
        prompt: "📂 Select a category:",
        skippable: false,
    },
];

const LOST_STEPS: &[Step] = &[
    Step {
        field: Field::Photo,
        prompt: "📸 Please send a photo of the item you lost, or skip:",
        skippable: true,
    },
    Step {
        field: Field::Category,
        prompt: "📂 Select a category:",
        skippable: false,
    },
];

/// Ordered collection steps for a flow.
pub fn steps(kind: FlowKind) -> &'static [Step] {
    match kind {
        FlowKind::FoundReport => FOUND_STEPS,
        FlowKind::LostReport => LOST_STEPS,
    }
}

fn step_for(kind: FlowKind, field: Field) -> Option<&'static Step> {
    steps(kind).iter().find(|s| s.field == field)
}

/// Prompt shown when re-entering a field from the summary.
pub fn edit_prompt(kind: FlowKind, field: Field) -> &'static str {
    match (kind, field) {
        (FlowKind::FoundReport, Field::Photo) => "📸 Please send a new photo.",
        (FlowKind::LostReport, Field::Photo) => "📸 Please send a new photo, or skip:",
        (_, Field::Category) => "📂 Select a category:",
        (FlowKind::FoundReport, Field::Location) => "Where was it found? (Type \"-\" to skip)",
        (FlowKind::LostReport, Field::Location) => "Where did you lose it? (Type \"-\" to skip)",
        (_, Field::Contact) => "Enter your contact number: (Type \"-\" to skip)",
        (_, Field::Comments) => "Add or edit your comments: (Type \"-\" to skip)",
    }
}

fn photo_reprompt(kind: FlowKind) -> &'static str {
    match kind {
        FlowKind::FoundReport => "Please send a valid photo.",
        FlowKind::LostReport => "Please send a valid photo or tap ⏭ Skip Photo.",
    }
}

/// A classified inbound event, as far as the form engine cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormInput<'a> {
    /// A photo attachment (largest size file id).
    Photo(&'a str),
    /// The skip-photo button.
    SkipPhoto,
    /// A category pick.
    Category(crate::categories::Category),
    /// Free text.
    Text(&'a str),
    /// An edit-field button from the summary.
    Edit(Field),
    /// The confirm button from the summary.
    Confirm,
}

/// What the caller should do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    /// Show a prompt for the given field and await input.
    Prompt { field: Field, prompt: &'static str },
    /// Re-render the summary view (state is now `Summary`).
    ShowSummary,
    /// Invalid input for the current step; repeat the prompt, no transition.
    Reprompt(&'static str),
    /// The user confirmed; hand the fields to the submission pipeline.
    Submit,
    /// Input does not apply to the current state; do nothing.
    Ignored,
}

impl FormOutcome {
    /// Whether the triggering input was accepted into the form. Accepted
    /// messages are removed from the chat; rejected or ignored ones stay so
    /// the user can see what was not taken.
    pub fn consumed_input(self) -> bool {
        !matches!(self, FormOutcome::Reprompt(_) | FormOutcome::Ignored)
    }
}

/// Advance the form by one event.
///
/// Mutates `record.state` and `record.data` only; UI bookkeeping stays with
/// the caller. Events that do not fit the current state come back `Ignored`
/// so a stray button press never corrupts the form.
pub fn advance(record: &mut ConversationRecord, input: FormInput<'_>) -> FormOutcome {
    let kind = match record.data.form() {
        Some(fields) => fields.kind(),
        None => return FormOutcome::Ignored,
    };

    match record.state {
        ConversationState::AwaitPhoto => match input {
            FormInput::Photo(file_id) => {
                if let Some(fields) = record.data.form_mut() {
                    fields.set_photo(file_id.to_string());
                }
                record.state = ConversationState::AwaitCategory;
                let step = &steps(kind)[1];
                FormOutcome::Prompt {
                    field: step.field,
                    prompt: step.prompt,
                }
            }
            FormInput::SkipPhoto => {
                let skippable = step_for(kind, Field::Photo).map(|s| s.skippable).unwrap_or(false);
                if !skippable {
                    return FormOutcome::Ignored;
                }
                record.state = ConversationState::AwaitCategory;
                let step = &steps(kind)[1];
                FormOutcome::Prompt {
                    field: step.field,
                    prompt: step.prompt,
                }
            }
            FormInput::Text(_) => FormOutcome::Reprompt(photo_reprompt(kind)),
            _ => FormOutcome::Ignored,
        },

        ConversationState::AwaitCategory => match input {
            FormInput::Category(category) => {
                if let Some(fields) = record.data.form_mut() {
                    fields.set_category(category);
                }
                record.state = ConversationState::Summary;
                FormOutcome::ShowSummary
            }
            _ => FormOutcome::Ignored,
        },

        ConversationState::Summary => match input {
            FormInput::Edit(field) => {
                let known = record
                    .data
                    .form()
                    .map(|f| f.editable_fields().contains(&field))
                    .unwrap_or(false);
                if !known {
                    return FormOutcome::Ignored;
                }
                record.state = ConversationState::Editing(field);
                FormOutcome::Prompt {
                    field,
                    prompt: edit_prompt(kind, field),
                }
            }
            FormInput::Confirm => FormOutcome::Submit,
            _ => FormOutcome::Ignored,
        },

        ConversationState::Editing(field) => match (field, input) {
            (Field::Photo, FormInput::Photo(file_id)) => {
                if let Some(fields) = record.data.form_mut() {
                    fields.set_photo(file_id.to_string());
                }
                record.state = ConversationState::Summary;
                FormOutcome::ShowSummary
            }
            // Skipping during a photo edit removes the photo — the only way
            // to clear a once-set field.
            (Field::Photo, FormInput::SkipPhoto) => {
                let skippable = step_for(kind, Field::Photo).map(|s| s.skippable).unwrap_or(false);
                if !skippable {
                    return FormOutcome::Ignored;
                }
                if let Some(fields) = record.data.form_mut() {
                    fields.clear_photo();
                }
                record.state = ConversationState::Summary;
                FormOutcome::ShowSummary
            }
            (Field::Photo, FormInput::Text(_)) => FormOutcome::Reprompt(photo_reprompt(kind)),
            (Field::Category, FormInput::Category(category)) => {
                if let Some(fields) = record.data.form_mut() {
                    fields.set_category(category);
                }
                record.state = ConversationState::Summary;
                FormOutcome::ShowSummary
            }
            (Field::Location | Field::Contact | Field::Comments, FormInput::Text(text)) => {
                // The skip marker keeps the previous value.
                if text.trim() != SKIP_MARKER {
                    if let Some(fields) = record.data.form_mut() {
                        fields.set_text(field, text.to_string());
                    }
                }
                record.state = ConversationState::Summary;
                FormOutcome::ShowSummary
            }
            _ => FormOutcome::Ignored,
        },

        // Search, subscription, and broadcast states are not form states.
        _ => FormOutcome::Ignored,
    }
}
