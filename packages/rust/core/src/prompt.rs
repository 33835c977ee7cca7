//! Grouping prompt construction.
//!
//! The reply grammar requested here (numbered headings, `- Article:` member
//! lines, reserved labels) is the same grammar [`crate::grouping`] parses; both
//! sides read it from the constants in this module.

use std::fmt::Write as _;

use newslens_shared::ArticleRecord;

/// Number of groups the model is asked for. Headings are numbered `1.` to this.
pub const GROUP_COUNT: usize = 5;

/// Prefix of a member line in the reply.
pub const MEMBER_PREFIX: &str = "- Article: ";

/// Labels the model must not use. Compared case-insensitively.
pub const RESERVED_LABELS: &[&str] = &["Unclear", "Miscellaneous", "Unrelated"];

/// Whether `label` is one of [`RESERVED_LABELS`].
pub fn is_reserved_label(label: &str) -> bool {
    RESERVED_LABELS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(label.trim()))
}

/// Build the single user prompt for a batch of records.
///
/// Records with a usable summary are described by title, summary and URL;
/// the rest by title, description and URL. Output is deterministic for a
/// given batch.
pub fn build(records: &[ArticleRecord]) -> String {
    let count = records.len();
    let mut prompt = String::new();

    let _ = write!(
        prompt,
        "I will give you {count} headlines or article summaries. I want you to give me a \
         scale that would let me plot these news articles on a graph. I want you to give \
         me {GROUP_COUNT} groups for me to place these articles in. Avoid using the words \
         {} in a category name. Groups that include opposing viewpoints should be as far \
         apart on the x-axis as possible.\n\nHere are the {count} articles:\n",
        reserved_list()
    );

    for record in records {
        prompt.push('\n');
        let _ = writeln!(prompt, "Title: {}", one_line(&record.title));
        if record.has_usable_summary() {
            let _ = writeln!(prompt, "Summary: {}", one_line(record.effective_text()));
        } else {
            let _ = writeln!(prompt, "Description: {}", one_line(&record.description));
        }
        let _ = writeln!(prompt, "Url: {}", record.url);
    }

    prompt.push_str("\nHere is the format of your response:\n");
    for n in 1..=GROUP_COUNT {
        let _ = writeln!(prompt, "{n}. <Group {n}>");
        let _ = writeln!(prompt, "{MEMBER_PREFIX}<Article url>");
        let _ = writeln!(
            prompt,
            "{MEMBER_PREFIX}<as many articles as you put in this category>"
        );
    }

    prompt
}

/// "Unclear, Miscellaneous, or Unrelated".
fn reserved_list() -> String {
    match RESERVED_LABELS {
        [] => String::new(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{}, or {last}", init.join(", ")),
    }
}

/// Keep each field on one line so it cannot be mistaken for reply grammar.
fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, summary: Option<&str>) -> ArticleRecord {
        ArticleRecord {
            url: url.into(),
            title: format!("Title for {url}"),
            source_name: "Example".into(),
            description: format!("Description for {url}"),
            summary: summary.map(String::from),
        }
    }

    #[test]
    fn prompt_lists_every_url_and_count() {
        let records = vec![
            record("https://a.com/1", Some("A summary.")),
            record("https://b.com/2", None),
            record("https://c.com/3", Some("Something went wrong while parsing")),
        ];
        let prompt = build(&records);

        for r in &records {
            assert!(prompt.contains(&format!("Url: {}", r.url)));
        }
        assert!(prompt.contains("I will give you 3 headlines"));
        assert!(prompt.contains("Here are the 3 articles"));
    }

    #[test]
    fn prompt_uses_summary_or_description() {
        let records = vec![
            record("https://a.com/1", Some("A summary.")),
            record("https://b.com/2", None),
            record("https://c.com/3", Some("Something went wrong")),
        ];
        let prompt = build(&records);

        assert!(prompt.contains("Summary: A summary."));
        assert!(prompt.contains("Description: Description for https://b.com/2"));
        assert!(prompt.contains("Description: Description for https://c.com/3"));
        assert!(!prompt.contains("Something went wrong"));
    }

    #[test]
    fn prompt_requests_five_headings_and_member_lines() {
        let prompt = build(&[record("https://a.com/1", None)]);
        for n in 1..=GROUP_COUNT {
            assert!(prompt.contains(&format!("\n{n}. <Group {n}>\n")));
        }
        assert!(prompt.contains("- Article: <Article url>"));
        assert!(prompt.contains("Unclear, Miscellaneous, or Unrelated"));
        assert!(prompt.contains("opposing viewpoints"));
    }

    #[test]
    fn prompt_flattens_multiline_fields() {
        let mut r = record("https://a.com/1", Some("Line one.\n1. Not a heading"));
        r.title = "Split\ntitle".into();
        let prompt = build(&[r]);
        assert!(prompt.contains("Title: Split title\n"));
        assert!(prompt.contains("Summary: Line one. 1. Not a heading\n"));
    }

    #[test]
    fn prompt_is_deterministic() {
        let records = vec![record("https://a.com/1", None), record("https://b.com/2", None)];
        assert_eq!(build(&records), build(&records));
    }

    #[test]
    fn reserved_labels_case_insensitive() {
        assert!(is_reserved_label("unclear"));
        assert!(is_reserved_label(" MISCELLANEOUS "));
        assert!(!is_reserved_label("Unrelated topics"));
        assert!(!is_reserved_label("Left"));
    }
}
