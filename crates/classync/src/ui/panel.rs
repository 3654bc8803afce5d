//! Plain-text rendering of the two class buffers.

use std::fmt::Write as _;

use crate::app::buffer::BufferView;
use crate::app::notify::ActiveNotice;
use crate::app::session::PanelState;

const PLACEHOLDER: &str = "Add tailwind classes here";
const FOCUS_HINT: &str = "enter to apply";

/// Render the panel: the instance section when the selection has an instance node, the
/// component section when it has a root, and any notices still awaiting dismissal.
pub fn render(panel: &PanelState, notices: &[ActiveNotice]) -> String {
    let mut out = String::new();
    let has_instance = panel.instance.node.is_some();
    let has_root = panel.root.node.is_some();

    if has_instance {
        section(&mut out, "Instance", &panel.instance);
    }
    if has_root {
        // The label only distinguishes the root when both sections are shown.
        let label = if has_instance { "Component" } else { "" };
        section(&mut out, label, &panel.root);
    }
    if !has_instance && !has_root {
        out.push_str("No editable element selected\n");
    }

    for active in notices {
        let _ = writeln!(out, "! [{}] {}", active.id, active.notice.message);
    }
    out
}

fn section(out: &mut String, label: &str, view: &BufferView) {
    if !label.is_empty() {
        match &view.node {
            Some(node) => {
                let _ = writeln!(out, "{label}  ({node})");
            }
            None => {
                let _ = writeln!(out, "{label}");
            }
        }
    }

    let text = if view.text.is_empty() {
        format!("<{PLACEHOLDER}>")
    } else {
        view.text.clone()
    };
    if view.focused {
        let _ = writeln!(out, "> {text}  [{FOCUS_HINT}]");
    } else {
        let _ = writeln!(out, "> {text}");
    }
}
