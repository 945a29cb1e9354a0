//! Summary and caption rendering.
//!
//! Everything here is a pure function of the field bag: same input, same
//! output, no storage or network access. Keyboards are built elsewhere from
//! the returned action set.

use chrono::NaiveDate;

use crate::conversation::{Field, FlowFields, FlowKind};

/// One available edit action, labelled for the current field state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditAction {
    pub field: Field,
    pub label: &'static str,
}

/// Rendered summary view: text plus the edit actions to offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub text: String,
    pub actions: Vec<EditAction>,
}

fn action_label(field: Field, populated: bool) -> &'static str {
    match (field, populated) {
        (Field::Photo, true) => "📷 Edit Photo",
        (Field::Photo, false) => "📸 Add Photo",
        (Field::Category, true) => "🏷️ Edit Category",
        (Field::Category, false) => "🔍 Add Category",
        (Field::Location, true) => "🏠 Edit Location",
        (Field::Location, false) => "📍 Add Location",
        (Field::Contact, _) => "📞 Contact",
        (Field::Comments, true) => "💬 Edit Comment",
        (Field::Comments, false) => "📝 Add Comment",
    }
}

fn placeholder(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

/// Render the review summary and its edit-action set for a form.
pub fn render(fields: &FlowFields) -> Summary {
    let category = fields.category().map(|c| c.label());

    let text = match fields {
        FlowFields::Found(_) => format!(
            "📄 <b>Review Your Form:</b>\n\
             <b>Category:</b> {}\n\
             <b>Location:</b> {}\n\
             <b>Comments:</b> {}",
            placeholder(category),
            placeholder(fields.text_field(Field::Location)),
            placeholder(fields.text_field(Field::Comments)),
        ),
        FlowFields::Lost(_) => format!(
            "📄 <b>Review Your Lost Item Report:</b>\n\
             <b>Category:</b> {}\n\
             <b>Location:</b> {}\n\
             <b>Contact:</b> {}\n\
             <b>Comments:</b> {}",
            placeholder(category),
            placeholder(fields.text_field(Field::Location)),
            placeholder(fields.text_field(Field::Contact)),
            placeholder(fields.text_field(Field::Comments)),
        ),
    };

    let actions = fields
        .editable_fields()
        .iter()
        .map(|&field| EditAction {
            field,
            label: action_label(field, fields.is_populated(field)),
        })
        .collect();

    Summary { text, actions }
}

/// Compose the caption posted to the feed channel.
pub fn feed_caption(fields: &FlowFields, date: NaiveDate) -> String {
    match fields {
        FlowFields::Found(_) => format!(
            "Location: {}\nComments: {}\nDate: {}",
            placeholder(fields.text_field(Field::Location)),
            placeholder(fields.text_field(Field::Comments)),
            date,
        ),
        FlowFields::Lost(_) => format!(
            "🔎 Lost Item\n\nLocation: {}\nContact: {}\nComments: {}\nDate: {}",
            placeholder(fields.text_field(Field::Location)),
            placeholder(fields.text_field(Field::Contact)),
            placeholder(fields.text_field(Field::Comments)),
            date,
        ),
    }
}

/// Compose the caption for a subscriber notification about a new found item.
pub fn notification_caption(fields: &FlowFields, feed_caption: &str) -> String {
    let category = fields.category().map(|c| c.label());
    format!(
        "🔔 New item found in {}:\n\n{}",
        placeholder(category),
        feed_caption
    )
}

/// Pull the location and comment lines back out of a stored feed caption,
/// for the admin listing's control line.
pub fn caption_details(caption: &str) -> Option<String> {
    let picked: Vec<&str> = caption
        .lines()
        .filter(|l| l.starts_with("Location:") || l.starts_with("Comments:"))
        .collect();
    if picked.is_empty() {
        None
    } else {
        Some(picked.join("\n"))
    }
}

/// Prompt text for the /lost entry menu.
pub fn lost_menu_text() -> &'static str {
    "What would you like to do?"
}

/// Confirmation question shown under the summary.
pub fn confirm_question() -> &'static str {
    "Is everything correct?"
}
