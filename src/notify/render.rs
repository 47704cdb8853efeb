//! Issue description rendering. Pure: same listing + timestamp, same text.
//!
//! Every section is always present; missing data renders a placeholder so the
//! description keeps one shape.

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::ingest::types::Listing;

pub const NO_CONTACTS: &str = "No contact information available";
pub const NO_ATTACHMENTS: &str = "No attachments or additional links available";

const NEXT_STEPS: [&str; 5] = [
    "Review opportunity details",
    "Contact primary POC for clarification",
    "Assess capability match",
    "Determine bid/no-bid decision",
    "Prepare response if pursuing",
];

/// Non-empty text value of `key`; numbers are stringified.
fn text(v: &Value, key: &str) -> Option<String> {
    match v.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_text(v: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| text(v, k))
}

/// "City, State" from `officeAddress`, each part defaulting to "Unknown".
pub fn office_location(listing: &Listing) -> String {
    let addr = listing.office_address.as_ref().unwrap_or(&Value::Null);
    format!(
        "{}, {}",
        text(addr, "city").unwrap_or_else(|| "Unknown".into()),
        text(addr, "state").unwrap_or_else(|| "Unknown".into())
    )
}

/// Place of performance from nested `city.name` / `state.name`.
///
/// Absent object: "Unknown location". City or state present but not an
/// object: "Unknown, Unknown".
pub fn performance_location(listing: &Listing) -> String {
    let Some(pop) = listing.place_of_performance.as_ref().filter(|v| is_present(v)) else {
        return "Unknown location".to_string();
    };
    let empty = Value::Object(Default::default());
    let city = pop.get("city").unwrap_or(&empty);
    let state = pop.get("state").unwrap_or(&empty);
    if !(city.is_object() && state.is_object()) {
        return "Unknown, Unknown".to_string();
    }
    format!(
        "{}, {}",
        text(city, "name").unwrap_or_else(|| "Unknown".into()),
        text(state, "name").unwrap_or_else(|| "Unknown".into())
    )
}

fn is_present(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Object(m) => !m.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn contact_block(heading: &str, contact: &Value) -> Option<String> {
    if !contact.as_object().is_some_and(|m| !m.is_empty()) {
        return None;
    }
    let mut lines = vec![format!("### {heading}")];
    for (key, label) in [
        ("fullName", "Name"),
        ("title", "Title"),
        ("email", "Email"),
        ("phone", "Phone"),
    ] {
        if let Some(val) = text(contact, key) {
            lines.push(format!("- **{label}**: {val}"));
        }
    }
    Some(lines.join("\n"))
}

/// Primary, office, then numbered additional contacts.
pub fn render_contacts(listing: &Listing) -> String {
    let mut blocks = Vec::new();
    if let Some(b) = listing
        .primary_contact
        .as_ref()
        .and_then(|c| contact_block("Primary Contact", c))
    {
        blocks.push(b);
    }
    if let Some(b) = listing
        .office_contact
        .as_ref()
        .and_then(|c| contact_block("Office Contact", c))
    {
        blocks.push(b);
    }
    if let Some(Value::Array(extra)) = listing.point_of_contact.as_ref() {
        for (i, c) in extra.iter().enumerate() {
            if let Some(b) = contact_block(&format!("Contact {}", i + 1), c) {
                blocks.push(b);
            }
        }
    }

    if blocks.is_empty() {
        NO_CONTACTS.to_string()
    } else {
        blocks.join("\n\n")
    }
}

/// Documents, the additional-information link, and related links.
pub fn render_attachments(listing: &Listing) -> String {
    let mut blocks = Vec::new();

    if let Some(Value::Array(items)) = listing.attachments.as_ref() {
        if !items.is_empty() {
            let mut lines = vec!["### Documents & Attachments".to_string()];
            for item in items.iter().filter(|v| v.is_object()) {
                let name = first_text(item, &["name", "filename"])
                    .unwrap_or_else(|| "Unnamed attachment".into());
                let mut line = format!("- **{name}**");
                if let Some(desc) = text(item, "description") {
                    line.push_str(&format!(" - {desc}"));
                }
                if let Some(url) = first_text(item, &["url", "link"]) {
                    line.push_str(&format!("\n  - Link: {url}"));
                }
                lines.push(line);
            }
            blocks.push(lines.join("\n"));
        }
    }

    if let Some(link) = listing
        .additional_info_link
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        blocks.push(format!("### Additional Information\n- {link}"));
    }

    if let Some(Value::Array(items)) = listing.links.as_ref() {
        if !items.is_empty() {
            let mut lines = vec!["### Related Links".to_string()];
            for item in items {
                match item {
                    Value::String(s) => lines.push(format!("- {s}")),
                    Value::Object(_) => {
                        let name =
                            first_text(item, &["name", "title"]).unwrap_or_else(|| "Link".into());
                        if let Some(url) = first_text(item, &["url", "href"]) {
                            lines.push(format!("- [{name}]({url})"));
                        }
                    }
                    _ => {}
                }
            }
            blocks.push(lines.join("\n"));
        }
    }

    if blocks.is_empty() {
        NO_ATTACHMENTS.to_string()
    } else {
        blocks.join("\n\n")
    }
}

/// Full Markdown body for the issue.
pub fn render_description(listing: &Listing, detected_at: NaiveDateTime) -> String {
    let or = |v: &Option<String>, default: &str| v.clone().unwrap_or_else(|| default.to_string());
    let steps = NEXT_STEPS
        .iter()
        .map(|s| format!("- [ ] {s}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "# New SAM.gov Opportunity Found\n\
         \n\
         ## 📋 Basic Information\n\
         - **Title**: {title}\n\
         - **Solicitation Number**: {solicitation}\n\
         - **Notice Type**: {kind}\n\
         - **NAICS Code**: {naics}\n\
         - **Set-Aside**: {set_aside}\n\
         - **UID**: {uid}\n\
         \n\
         ## 📅 Important Dates\n\
         - **Posted Date**: {posted}\n\
         - **Response Deadline**: {deadline}\n\
         \n\
         ## 🏢 Organization & Location\n\
         - **Organization**: {org}\n\
         - **Office Location**: {office}\n\
         - **Performance Location**: {performance}\n\
         \n\
         ## 👥 Contacts\n\
         {contacts}\n\
         \n\
         ## 📎 Attachments & Links\n\
         {attachments}\n\
         \n\
         ## 🔗 SAM.gov Links\n\
         - **Opportunity Page**: {ui_link}\n\
         \n\
         ## 📝 Next Steps\n\
         {steps}\n\
         \n\
         **Detected by SAM.gov Monitor at {detected}**",
        title = listing.title_or_default(),
        solicitation = or(&listing.solicitation_number, "No solicitation number"),
        kind = or(&listing.notice_type, "Unknown type"),
        naics = or(&listing.naics_code, "Unknown NAICS"),
        set_aside = or(&listing.set_aside, "No set-aside info"),
        uid = listing.uid().unwrap_or("Unknown"),
        posted = or(&listing.posted_date, "Unknown date"),
        deadline = or(&listing.response_deadline, "No deadline"),
        org = or(&listing.full_parent_path_name, "Unknown organization"),
        office = office_location(listing),
        performance = performance_location(listing),
        contacts = render_contacts(listing),
        attachments = render_attachments(listing),
        ui_link = or(&listing.ui_link, "No link available"),
        detected = detected_at.format("%Y-%m-%d %H:%M:%S"),
    )
}
