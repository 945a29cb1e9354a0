//! Per-user conversation state.
//!
//! One `ConversationRecord` per user, at most one active flow at a time.
//! Starting any flow (or /start, /help) replaces whatever was there — no
//! merging, no stacking. State lives in memory only; a restart drops all
//! in-flight forms, which is acceptable (forms restart).
//!
//! The surrounding dispatch loop serializes events per user, so records are
//! cloned out, mutated, and put back rather than mutated behind the map's
//! shard locks (which must not be held across an await).

use dashmap::DashMap;

use crate::categories::Category;

/// A single editable form field. Which fields exist depends on the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Photo,
    Category,
    Location,
    Contact,
    Comments,
}

impl Field {
    /// Short tag used in callback payloads.
    pub fn tag(self) -> &'static str {
        match self {
            Field::Photo => "photo",
            Field::Category => "category",
            Field::Location => "location",
            Field::Contact => "contact",
            Field::Comments => "comments",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Field> {
        match tag {
            "photo" => Some(Field::Photo),
            "category" => Some(Field::Category),
            "location" => Some(Field::Location),
            "contact" => Some(Field::Contact),
            "comments" => Some(Field::Comments),
            _ => None,
        }
    }
}

/// Which report form is being filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    FoundReport,
    LostReport,
}

/// Fields collected by the /found flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoundItemFields {
    pub photo: Option<String>,
    pub category: Option<Category>,
    pub location: Option<String>,
    pub comments: Option<String>,
}

/// Fields collected by the /lost report flow. Photo is optional here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LostItemFields {
    pub photo: Option<String>,
    pub category: Option<Category>,
    pub location: Option<String>,
    pub contact: Option<String>,
    pub comments: Option<String>,
}

/// Tagged per-flow field bag. Any subset may be unset at any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowFields {
    Found(FoundItemFields),
    Lost(LostItemFields),
}

impl FlowFields {
    pub fn new(kind: FlowKind) -> Self {
        match kind {
            FlowKind::FoundReport => FlowFields::Found(FoundItemFields::default()),
            FlowKind::LostReport => FlowFields::Lost(LostItemFields::default()),
        }
    }

    pub fn kind(&self) -> FlowKind {
        match self {
            FlowFields::Found(_) => FlowKind::FoundReport,
            FlowFields::Lost(_) => FlowKind::LostReport,
        }
    }

    /// Editable fields of this flow, in summary/keyboard order.
    pub fn editable_fields(&self) -> &'static [Field] {
        match self {
            FlowFields::Found(_) => &[Field::Photo, Field::Category, Field::Location, Field::Comments],
            FlowFields::Lost(_) => &[
                Field::Photo,
                Field::Category,
                Field::Location,
                Field::Contact,
                Field::Comments,
            ],
        }
    }

    pub fn photo(&self) -> Option<&str> {
        match self {
            FlowFields::Found(f) => f.photo.as_deref(),
            FlowFields::Lost(f) => f.photo.as_deref(),
        }
    }

    pub fn category(&self) -> Option<Category> {
        match self {
            FlowFields::Found(f) => f.category,
            FlowFields::Lost(f) => f.category,
        }
    }

    /// Value of a free-text field, if this flow has it and it is set.
    pub fn text_field(&self, field: Field) -> Option<&str> {
        match (self, field) {
            (FlowFields::Found(f), Field::Location) => f.location.as_deref(),
            (FlowFields::Found(f), Field::Comments) => f.comments.as_deref(),
            (FlowFields::Lost(f), Field::Location) => f.location.as_deref(),
            (FlowFields::Lost(f), Field::Contact) => f.contact.as_deref(),
            (FlowFields::Lost(f), Field::Comments) => f.comments.as_deref(),
            _ => None,
        }
    }

    /// Whether the given field currently holds a value.
    pub fn is_populated(&self, field: Field) -> bool {
        match field {
            Field::Photo => self.photo().is_some(),
            Field::Category => self.category().is_some(),
            _ => self.text_field(field).is_some(),
        }
    }

    pub fn set_photo(&mut self, file_id: String) {
        match self {
            FlowFields::Found(f) => f.photo = Some(file_id),
            FlowFields::Lost(f) => f.photo = Some(file_id),
        }
    }

    pub fn clear_photo(&mut self) {
        match self {
            FlowFields::Found(f) => f.photo = None,
            FlowFields::Lost(f) => f.photo = None,
        }
    }

    pub fn set_category(&mut self, category: Category) {
        match self {
            FlowFields::Found(f) => f.category = Some(category),
            FlowFields::Lost(f) => f.category = Some(category),
        }
    }

    /// Set a free-text field. Ignored if this flow does not have the field.
    pub fn set_text(&mut self, field: Field, value: String) {
        match (&mut *self, field) {
            (FlowFields::Found(f), Field::Location) => f.location = Some(value),
            (FlowFields::Found(f), Field::Comments) => f.comments = Some(value),
            (FlowFields::Lost(f), Field::Location) => f.location = Some(value),
            (FlowFields::Lost(f), Field::Contact) => f.contact = Some(value),
            (FlowFields::Lost(f), Field::Comments) => f.comments = Some(value),
            _ => {}
        }
    }
}

/// Category + time-window filter for the search flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub category: Option<Category>,
    pub days: Option<i64>,
}

/// Flow-specific payload of a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationData {
    Form(FlowFields),
    Search(SearchFilter),
    None,
}

impl ConversationData {
    pub fn form(&self) -> Option<&FlowFields> {
        match self {
            ConversationData::Form(f) => Some(f),
            _ => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut FlowFields> {
        match self {
            ConversationData::Form(f) => Some(f),
            _ => None,
        }
    }
}

/// Which step the user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    // Report forms
    AwaitPhoto,
    AwaitCategory,
    Summary,
    Editing(Field),
    // Search flow
    AwaitFilterCategory,
    AwaitFilterDays,
    ViewingResults,
    // Subscription flow
    AwaitNotifyAction,
    AwaitSubscribeCategory,
    AwaitUnsubscribe,
    // Admin broadcast
    AwaitBroadcast,
}

/// Message ids of UI elements currently on screen, by logical slot, so they
/// can be retracted before re-rendering. Best-effort only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiRefs {
    pub last_prompt: Option<i32>,
    pub summary: Option<i32>,
    pub buttons: Option<i32>,
    pub results: Vec<i32>,
    pub end_list: Option<i32>,
}

/// One user's in-flight conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRecord {
    pub state: ConversationState,
    pub data: ConversationData,
    pub ui: UiRefs,
}

impl ConversationRecord {
    pub fn new(state: ConversationState, data: ConversationData) -> Self {
        Self {
            state,
            data,
            ui: UiRefs::default(),
        }
    }
}

/// In-memory map of active conversations, keyed by user id.
#[derive(Debug, Default)]
pub struct ConversationStore {
    records: DashMap<i64, ConversationRecord>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone out the user's record, if any.
    pub fn get(&self, user_id: i64) -> Option<ConversationRecord> {
        self.records.get(&user_id).map(|r| r.clone())
    }

    /// Store (or replace) the user's record.
    pub fn put(&self, user_id: i64, record: ConversationRecord) {
        self.records.insert(user_id, record);
    }

    /// Drop the user's record. No-op if absent.
    pub fn clear(&self, user_id: i64) {
        self.records.remove(&user_id);
    }

    /// Replace any prior conversation with a fresh record for a new flow.
    pub fn start(&self, user_id: i64, state: ConversationState, data: ConversationData) -> ConversationRecord {
        let record = ConversationRecord::new(state, data);
        self.records.insert(user_id, record.clone());
        record
    }
}
