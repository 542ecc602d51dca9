//! CSV rendering for attendee exports

use crate::types::Attendee;

/// Render attendees as CSV with an `ID,Name,Email` header
pub fn attendees_to_csv(attendees: &[Attendee]) -> String {
    let mut out = String::from("ID,Name,Email\r\n");
    for a in attendees {
        out.push_str(&escape(&a.id));
        out.push(',');
        out.push_str(&escape(&a.name));
        out.push(',');
        out.push_str(&escape(&a.email));
        out.push_str("\r\n");
    }
    out
}

/// Quote a field when it contains a delimiter, quote or line break
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
