//! Builds the outbound parts list from the working set and a question.

use crate::api::Part;
use crate::core::message::InlineImage;
use crate::core::record::WorkingSet;

pub const UNDECODABLE_PLACEHOLDER: &str = "[Content could not be decoded as UTF-8]";

pub fn start_marker(path: &str) -> String {
    format!("--- START OF FILE: {path} ---")
}

pub fn end_marker(path: &str) -> String {
    format!("--- END OF FILE: {path} ---")
}

/// One marker-framed file section, terminated by a newline.
pub fn framed_section(path: &str, content: &str) -> String {
    let mut section = String::with_capacity(content.len() + path.len() * 2 + 48);
    section.push_str(&start_marker(path));
    section.push('\n');
    section.push_str(content);
    if !content.ends_with('\n') {
        section.push('\n');
    }
    section.push_str(&end_marker(path));
    section.push('\n');
    section
}

/// The text part: the bare question, or every file followed by the question.
pub fn compose_text(working_set: &WorkingSet, question: &str) -> String {
    if working_set.is_empty() {
        return question.to_string();
    }

    let mut text = String::from("Here are the files I am working with:\n\n");
    for record in working_set {
        let content = std::str::from_utf8(record.raw_bytes()).unwrap_or(UNDECODABLE_PLACEHOLDER);
        text.push_str(&framed_section(record.original_path(), content));
        text.push('\n');
    }
    text.push_str(question);
    text
}

/// Image part first when one is attached, then exactly one text part.
pub fn assemble_parts(
    working_set: &WorkingSet,
    question: &str,
    image: Option<&InlineImage>,
) -> Vec<Part> {
    let mut parts = Vec::with_capacity(2);
    if let Some(image) = image {
        parts.push(Part::inline(image.mime_type.clone(), &image.data));
    }
    parts.push(Part::text(compose_text(working_set, question)));
    parts
}
