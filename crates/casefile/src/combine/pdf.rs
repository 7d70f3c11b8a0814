use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::ProcessError;

const LINES_PER_PAGE: usize = 50;
const WRAP_COLUMNS: usize = 95;

/// Lays out plain text on US Letter pages.
///
/// Lines starting with `#` are set as headings (marker stripped, bold).
pub fn render_text_pdf(text: &str) -> Result<Vec<u8>, ProcessError> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.new_object_id();
    let bold_font_id = doc.new_object_id();
    let resources_id = doc.new_object_id();

    doc.objects.insert(
        font_id,
        Object::Dictionary(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        }),
    );
    doc.objects.insert(
        bold_font_id,
        Object::Dictionary(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        }),
    );
    doc.objects.insert(
        resources_id,
        Object::Dictionary(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
                "F2" => bold_font_id,
            },
        }),
    );

    let lines = layout_lines(text);
    let page_count = lines.len().div_ceil(LINES_PER_PAGE).max(1);
    let mut page_ids = Vec::with_capacity(page_count);

    for page_num in 0..page_count {
        let start = (page_num * LINES_PER_PAGE).min(lines.len());
        let end = ((page_num + 1) * LINES_PER_PAGE).min(lines.len());

        let content = format_page_content(&lines[start..end]);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| (*id).into()).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_ids.len() as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    save(&mut doc)
}

struct Line {
    text: String,
    heading: bool,
}

fn layout_lines(text: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        let trimmed = raw.trim_start();
        let heading = trimmed.starts_with('#');
        let content = if heading {
            trimmed.trim_start_matches('#').trim()
        } else {
            raw.trim_end()
        };

        for chunk in wrap(content, WRAP_COLUMNS) {
            lines.push(Line {
                text: chunk,
                heading,
            });
        }
    }
    lines
}

/// Greedy word wrap; words longer than `width` are split hard.
fn wrap(text: &str, width: usize) -> Vec<String> {
    if text.chars().count() <= width {
        return vec![text.to_string()];
    }

    let mut out = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > width {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            let split: String = word.chars().take(width).collect();
            word = word.chars().skip(width).collect();
            out.push(split);
        }
        let needed = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
        if needed > width && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn format_page_content(lines: &[Line]) -> String {
    let mut content = String::new();
    content.push_str("BT\n");
    content.push_str("/F1 11 Tf\n");
    content.push_str("50 742 Td\n");
    content.push_str("14 TL\n");

    for line in lines {
        let escaped = escape_pdf_string(&line.text);
        if line.heading {
            content.push_str(&format!("/F2 12 Tf ({}) Tj T* /F1 11 Tf\n", escaped));
        } else {
            content.push_str(&format!("({}) Tj T*\n", escaped));
        }
    }

    content.push_str("ET\n");
    content
}

fn escape_pdf_string(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '(' => "\\(".to_string(),
            ')' => "\\)".to_string(),
            '\\' => "\\\\".to_string(),
            c if c.is_ascii() && !c.is_control() => c.to_string(),
            _ => " ".to_string(),
        })
        .collect()
}

fn save(doc: &mut Document) -> Result<Vec<u8>, ProcessError> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ProcessError::PdfProcessing(e.to_string()))?;
    Ok(buffer)
}

fn load(bytes: &[u8], index: usize) -> Result<Document, ProcessError> {
    Document::load_mem(bytes)
        .map_err(|e| ProcessError::PdfProcessing(format!("input {} is not a valid PDF: {}", index + 1, e)))
}

/// Page attributes a page may inherit from its `Pages` ancestors.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Guards against cyclic `Parent` chains in damaged files.
const MAX_TREE_DEPTH: usize = 64;

/// Copy of a page dictionary with inherited attributes made explicit.
fn with_inherited_attributes(doc: &Document, page: &Dictionary) -> Dictionary {
    let mut page = page.clone();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let Some(node) = parent.and_then(|id| doc.get_dictionary(id).ok()) else {
            break;
        };
        for key in INHERITABLE_KEYS {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    if !page.has(b"MediaBox") {
        page.set("MediaBox", vec![0.into(), 0.into(), 612.into(), 792.into()]);
    }
    page
}

/// Concatenates the pages of every input, in input order, into one PDF.
///
/// Every page is re-parented under a fresh page tree, so attributes it
/// inherited from its own tree are copied onto the page first.
pub fn merge_pdfs(inputs: &[Vec<u8>]) -> Result<Vec<u8>, ProcessError> {
    if inputs.is_empty() {
        return Err(ProcessError::EmptyInput);
    }

    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut objects: Vec<(ObjectId, Object)> = Vec::new();

    for (index, bytes) in inputs.iter().enumerate() {
        let mut doc = load(bytes, index)?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        // get_pages is keyed by page number, so this keeps reading order
        for (_, page_id) in doc.get_pages() {
            let page = doc
                .get_dictionary(page_id)
                .map_err(|e| ProcessError::PdfProcessing(e.to_string()))?;
            pages.push((page_id, with_inherited_attributes(&doc, page)));
        }
        objects.extend(doc.objects.into_iter());
    }

    let mut merged = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Object)> = None;

    for (object_id, object) in objects {
        match object.type_name().unwrap_or(b"") {
            b"Catalog" => {
                if catalog.is_none() {
                    catalog = Some((object_id, object));
                }
            }
            b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let (catalog_id, catalog_object) =
        catalog.ok_or_else(|| ProcessError::PdfProcessing("no catalog found".to_string()))?;
    let pages_id: ObjectId = (max_id, 0);

    for (object_id, mut dictionary) in pages.iter().cloned() {
        dictionary.set("Parent", pages_id);
        merged
            .objects
            .insert(object_id, Object::Dictionary(dictionary));
    }

    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => pages
                .iter()
                .map(|(object_id, _)| Object::Reference(*object_id))
                .collect::<Vec<_>>(),
            "Count" => pages.len() as u32,
        }),
    );

    if let Ok(dictionary) = catalog_object.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Pages", pages_id);
        dictionary.remove(b"Outlines");
        merged
            .objects
            .insert(catalog_id, Object::Dictionary(dictionary));
    }

    merged.trailer.set("Root", catalog_id);
    merged.max_id = max_id;
    merged.renumber_objects();

    save(&mut merged)
}

/// Text of every page, one block per page; unreadable pages are skipped.
pub fn extract_text(bytes: &[u8]) -> Result<String, ProcessError> {
    let doc = load(bytes, 0)?;
    let mut text = String::new();

    for (page_num, _) in doc.get_pages() {
        if let Ok(page_text) = doc.extract_text(&[page_num]) {
            text.push_str(&page_text);
            text.push('\n');
        }
    }

    Ok(text)
}

pub fn page_count(bytes: &[u8]) -> Result<usize, ProcessError> {
    Ok(load(bytes, 0)?.get_pages().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_page() {
        let bytes = render_text_pdf("Hello World").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(page_count(&bytes).unwrap(), 1);
    }

    #[test]
    fn test_render_empty_text_still_has_a_page() {
        let bytes = render_text_pdf("").unwrap();
        assert_eq!(page_count(&bytes).unwrap(), 1);
    }

    #[test]
    fn test_render_paginates() {
        let text = (0..120).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        let bytes = render_text_pdf(&text).unwrap();
        assert_eq!(page_count(&bytes).unwrap(), 3);
    }

    #[test]
    fn test_merge_preserves_page_count_and_order() {
        let first = render_text_pdf(
            &(0..60).map(|i| format!("first {}", i)).collect::<Vec<_>>().join("\n"),
        )
        .unwrap();
        let second = render_text_pdf("second document").unwrap();

        let merged = merge_pdfs(&[first, second]).unwrap();
        assert_eq!(page_count(&merged).unwrap(), 3);

        let doc = Document::load_mem(&merged).unwrap();
        let pages = doc.get_pages();
        let first_page = doc.get_page_content(pages[&1]).unwrap();
        let last_page = doc.get_page_content(pages[&3]).unwrap();
        assert!(String::from_utf8_lossy(&first_page).contains("first 0"));
        assert!(String::from_utf8_lossy(&last_page).contains("second document"));
    }

    /// One-page PDF whose MediaBox and fonts live only on the `Pages` node.
    fn pdf_with_inherited_attributes(width: i64, height: i64, text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let content = format!("BT /F1 12 Tf 10 10 Td ({}) Tj ET", text);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        save(&mut doc).unwrap()
    }

    fn media_box(doc: &Document, page_id: ObjectId) -> Vec<i64> {
        doc.get_dictionary(page_id)
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_i64().unwrap())
            .collect()
    }

    #[test]
    fn test_merge_keeps_inherited_page_attributes() {
        let square = pdf_with_inherited_attributes(612, 612, "square");
        let small = pdf_with_inherited_attributes(200, 200, "small");

        let merged = merge_pdfs(&[square, small]).unwrap();
        let doc = Document::load_mem(&merged).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);

        assert_eq!(media_box(&doc, pages[&1]), vec![0, 0, 612, 612]);
        assert_eq!(media_box(&doc, pages[&2]), vec![0, 0, 200, 200]);
        for page_id in pages.values() {
            let page = doc.get_dictionary(*page_id).unwrap();
            assert!(page.has(b"Resources"));
        }

        let root_id = doc.catalog().unwrap().get(b"Pages").unwrap().as_reference().unwrap();
        let root = doc.get_dictionary(root_id).unwrap();
        assert!(!root.has(b"MediaBox"));
        assert!(!root.has(b"Resources"));
        assert_eq!(root.get(b"Count").unwrap().as_i64().unwrap(), 2);
    }

    #[test]
    fn test_merge_rejects_invalid_input() {
        let valid = render_text_pdf("ok").unwrap();
        let err = merge_pdfs(&[valid, b"not a pdf".to_vec()]).unwrap_err();
        match err {
            ProcessError::PdfProcessing(msg) => assert!(msg.contains("input 2")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_merge_empty_is_error() {
        assert!(matches!(merge_pdfs(&[]), Err(ProcessError::EmptyInput)));
    }

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(escape_pdf_string("a(b)c\\"), "a\\(b\\)c\\\\");
        assert_eq!(escape_pdf_string("caf\u{e9}"), "caf ");
    }

    #[test]
    fn test_wrap_long_lines() {
        let long = "word ".repeat(40);
        let wrapped = wrap(long.trim(), 20);
        assert!(wrapped.len() > 1);
        assert!(wrapped.iter().all(|l| l.chars().count() <= 20));

        let unbroken = "x".repeat(45);
        let wrapped = wrap(&unbroken, 20);
        assert_eq!(wrapped.len(), 3);
        assert_eq!(wrapped[2].len(), 5);
    }

    #[test]
    fn test_headings_are_stripped() {
        let lines = layout_lines("# Title\nbody");
        assert_eq!(lines[0].text, "Title");
        assert!(lines[0].heading);
        assert!(!lines[1].heading);
    }
}
