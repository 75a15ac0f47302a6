use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

pub const FILE_NAME: &str = "learning_plan.pdf";

// A4 in points
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;

const HEADING_SIZE: i64 = 16;
const BODY_SIZE: i64 = 10;
const LEADING: i64 = 12;
const HEADING_GAP: i64 = 28;

// Courier glyphs are 0.6em wide.
const CHARS_PER_LINE: usize = ((PAGE_WIDTH - 2 * MARGIN) * 10 / (BODY_SIZE * 6)) as usize;
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN - HEADING_GAP) / LEADING) as usize;

const TRUNCATED: &str = "[... truncated ...]";

/// Two pages: "Search Results" then "Learning Plan".
pub fn create_pdf(search_results: &str, learning_plan: &str) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let body_font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let heading_font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => body_font,
            "F2" => heading_font,
        },
    });

    let mut kids = Vec::new();
    for (heading, text) in [("Search Results", search_results), ("Learning Plan", learning_plan)] {
        let page_id = add_page(&mut doc, pages_id, heading, text)?;
        kids.push(Object::from(page_id));
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as i64,
        "Kids" => kids,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).context("Failed to serialize PDF")?;
    Ok(bytes)
}

/// Inline download link target.
pub fn pdf_data_uri(bytes: &[u8]) -> String {
    format!("data:application/pdf;base64,{}", BASE64.encode(bytes))
}

fn add_page(doc: &mut Document, pages_id: ObjectId, heading: &str, text: &str) -> Result<ObjectId> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F2".into(), HEADING_SIZE.into()]),
        Operation::new("Td", vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN).into()]),
        Operation::new("Tj", vec![Object::string_literal(to_win_ansi(heading))]),
        Operation::new("Tf", vec!["F1".into(), BODY_SIZE.into()]),
        Operation::new("TL", vec![LEADING.into()]),
        Operation::new("Td", vec![0.into(), (-HEADING_GAP).into()]),
    ];

    for (i, line) in fit_to_page(wrap(&transliterate(text), CHARS_PER_LINE))
        .into_iter()
        .enumerate()
    {
        if i > 0 {
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("Tj", vec![Object::string_literal(to_win_ansi(&line))]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().context("Failed to encode page content")?,
    ));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    }))
}

/// Maps text onto the Latin-1 range the standard fonts can show.
/// Anything without a sensible stand-in becomes `?`.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push('\n'),
            '\t' => out.push_str("    "),
            '\r' => {}
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2212}' => out.push('-'),
            '\u{2014}' | '\u{2015}' => out.push_str("--"),
            '\u{2026}' => out.push_str("..."),
            '\u{2022}' | '\u{25CF}' | '\u{25E6}' | '\u{2023}' => out.push('*'),
            '\u{00A0}' | '\u{2002}'..='\u{200A}' | '\u{202F}' => out.push(' '),
            '\u{200B}' | '\u{FEFF}' => {}
            c if c.is_control() => {}
            c if (c as u32) <= 0xFF => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn to_win_ansi(line: &str) -> Vec<u8> {
    // Callers pass transliterated text; every char fits in one byte.
    line.chars()
        .map(|c| u8::try_from(c as u32).unwrap_or(b'?'))
        .collect()
}

/// Greedy word wrap; words longer than a line are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0;
        for word in paragraph.split(' ') {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if line_len > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if line_len == 0 { word.len() } else { line_len + 1 + word.len() };
            if needed > width && line_len > 0 {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.extend(word.iter());
            line_len += word.len();
        }
        lines.push(line);
    }
    lines
}

fn fit_to_page(mut lines: Vec<String>) -> Vec<String> {
    if lines.len() > LINES_PER_PAGE {
        lines.truncate(LINES_PER_PAGE - 1);
        lines.push(TRUNCATED.to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_texts(bytes: &[u8]) -> Vec<String> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|id| String::from_utf8_lossy(&doc.get_page_content(*id).unwrap()).into_owned())
            .collect()
    }

    #[test]
    fn test_two_pages_with_headings() {
        let bytes = create_pdf("A", "B").unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let pages = page_texts(&bytes);
        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("(Search Results)"));
        assert!(pages[0].contains("(A)"));
        assert!(!pages[0].contains("(B)"));
        assert!(pages[1].contains("(Learning Plan)"));
        assert!(pages[1].contains("(B)"));
    }

    #[test]
    fn test_non_latin1_text_does_not_fail() {
        let bytes = create_pdf("Photosynthesis \u{2014} \u{201C}light\u{201D} \u{1F331}", "\u{4E2D}\u{6587}").unwrap();
        let pages = page_texts(&bytes);
        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("Photosynthesis -- \"light\" ?"));
        assert!(pages[1].contains("(??)"));
    }

    #[test]
    fn test_transliterate_keeps_latin1() {
        assert_eq!(transliterate("caf\u{e9} na\u{ef}ve"), "caf\u{e9} na\u{ef}ve");
        assert_eq!(transliterate("a\u{2026}b\tc\r\n"), "a...b    c\n");
        assert_eq!(transliterate("\u{2022} item"), "* item");
    }

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);

        let lines = wrap("abcdefghijklmnop", 5);
        assert_eq!(lines, vec!["abcde", "fghij", "klmno", "p"]);

        let lines = wrap("one\n\ntwo", 10);
        assert_eq!(lines, vec!["one", "", "two"]);
    }

    #[test]
    fn test_long_text_is_truncated_on_one_page() {
        let long = "line\n".repeat(LINES_PER_PAGE * 3);
        let bytes = create_pdf(&long, "B").unwrap();
        let pages = page_texts(&bytes);
        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains(TRUNCATED));
        assert_eq!(pages[0].matches("(line)").count(), LINES_PER_PAGE - 1);
    }

    #[test]
    fn test_data_uri_prefix() {
        let uri = pdf_data_uri(b"%PDF");
        assert_eq!(uri, "data:application/pdf;base64,JVBERg==");
    }
}
