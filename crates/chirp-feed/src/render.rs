//! HTML rendering for the feed fragment.
//!
//! A pure function of (feed snapshot, edit target, viewer identity).
//! Action buttons call the page-level helpers (`chirpEdit` etc.) that the
//! static client defines; the server decides what is rendered, the client
//! only swaps fragments in.

use chirp_types::models::Chirp;
use uuid::Uuid;

const TIME_FORMAT: &str = "%d %b %Y, %H:%M";

/// Render the whole feed fragment.
pub fn feed(chirps: &[Chirp], edit_target: Option<Uuid>, viewer: Uuid) -> String {
    let mut html = String::from("<div class=\"feed\" id=\"feed\">\n");

    if chirps.is_empty() {
        html.push_str("  <p class=\"feed-empty\">No chirps yet.</p>\n");
    }
    for chirp in chirps {
        html.push_str(&chirp_row(chirp, edit_target, viewer));
    }

    html.push_str("</div>\n");
    html
}

fn chirp_row(chirp: &Chirp, edit_target: Option<Uuid>, viewer: Uuid) -> String {
    let editing = edit_target == Some(chirp.id);
    let own = chirp.author.id == viewer;

    let mut row = format!("  <article class=\"chirp\" id=\"chirp-{}\">\n", chirp.id);
    row.push_str("    <header class=\"chirp-meta\">\n");
    row.push_str(&format!(
        "      <span class=\"chirp-author\">{}</span>\n",
        escape(&chirp.author.username)
    ));
    row.push_str(&format!(
        "      <time datetime=\"{}\">{}</time>\n",
        chirp.created_at.to_rfc3339(),
        chirp.created_at.format(TIME_FORMAT)
    ));

    if chirp.is_edited() {
        row.push_str("      <span class=\"chirp-edited\">edited</span>\n");
    }
    row.push_str("    </header>\n");

    if editing {
        row.push_str(&edit_form(chirp));
    } else {
        row.push_str(&format!(
            "    <p class=\"chirp-body\">{}</p>\n",
            escape(&chirp.body)
        ));
        if own {
            row.push_str(&actions_menu(chirp.id));
        }
    }

    row.push_str("  </article>\n");
    row
}

/// The inline edit sub-view, swapped in for the chirp being edited.
fn edit_form(chirp: &Chirp) -> String {
    let mut form = format!(
        "    <form class=\"chirp-edit\" onsubmit=\"return chirpSave('{}', this)\">\n",
        chirp.id
    );
    form.push_str(&format!(
        "      <textarea name=\"body\" maxlength=\"255\" required>{}</textarea>\n",
        escape(&chirp.body)
    ));
    form.push_str("      <button type=\"submit\">Save</button>\n");
    form.push_str("      <button type=\"button\" onclick=\"chirpCancel()\">Cancel</button>\n");
    form.push_str("    </form>\n");
    form
}

fn actions_menu(id: Uuid) -> String {
    let mut nav = String::from("    <nav class=\"chirp-actions\">\n");
    nav.push_str(&format!("      <button onclick=\"chirpEdit('{id}')\">Edit</button>\n"));
    nav.push_str(&format!("      <button onclick=\"chirpDelete('{id}')\">Delete</button>\n"));
    nav.push_str("    </nav>\n");
    nav
}

/// Minimal HTML escaping for user-supplied text.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
