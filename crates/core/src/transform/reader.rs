/// Splits a YAML stream into its documents.
///
/// A document starts at a line beginning with `---`. Content after `---` and
/// at least one space belongs to the new document, so `--- |` or `--- text`
/// open a document on the marker line. A line starting with `...` ends the
/// current document and is itself dropped. Either marker may be followed by a
/// comment. Documents made of whitespace only are dropped.
#[derive(Clone, Debug)]
pub struct DocumentReader<'a> {
    remaining: &'a str,
}

impl<'a> DocumentReader<'a> {
    #[must_use]
    pub const fn new(content: &'a str) -> Self { Self { remaining: content } }
}

impl<'a> Iterator for DocumentReader<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.remaining.is_empty() {
            let (document, rest) = split_first(self.remaining);
            self.remaining = rest;
            if !document.trim().is_empty() {
                return Some(document);
            }
        }
        None
    }
}

fn split_first(content: &str) -> (&str, &str) {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if let Some(skip) = boundary(line) {
            return (&content[..offset], &content[offset + skip..]);
        }
        offset += line.len();
    }
    (content, "")
}

/// Bytes of `line` to skip when it is a document boundary.
///
/// That is the whole line, except for a `---` line carrying content, where
/// the content is kept for the next document.
fn boundary(line: &str) -> Option<usize> {
    if let Some(rest) = line.strip_prefix("---") {
        let content = rest.trim_start_matches([' ', '\t']);
        if content.trim().is_empty() || content.starts_with('#') {
            return Some(line.len());
        }
        // `---foo` is a plain scalar, not a marker.
        return (content.len() < rest.len()).then_some(line.len() - content.len());
    }
    line.strip_prefix("...")
        .map(str::trim)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('#'))
        .then_some(line.len())
}

/// Whether `document` carries nothing but comments and blank lines.
pub fn is_comment_only(document: &str) -> bool {
    document.lines().map(str::trim).all(|line| line.is_empty() || line.starts_with('#'))
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn test_split_documents() {
        let content = indoc! {"
            ---
            a: 1
            ---   # first separator comment
            b: 2
            ---
            ---
            c: |
              ---not a separator
        "};
        let documents: Vec<_> = DocumentReader::new(content).collect();
        assert_eq!(documents, ["a: 1\n", "b: 2\n", "c: |\n  ---not a separator\n"]);
    }

    #[test]
    fn test_single_document_without_separator() {
        let documents: Vec<_> = DocumentReader::new("kind: Pod").collect();
        assert_eq!(documents, ["kind: Pod"]);
    }

    #[test]
    fn test_blank_stream() {
        assert_eq!(DocumentReader::new("").count(), 0);
        assert_eq!(DocumentReader::new("\n  \n---\n\n").count(), 0);
    }

    #[test]
    fn test_crlf_separator() {
        let documents: Vec<_> = DocumentReader::new("a: 1\r\n---\r\nb: 2\r\n").collect();
        assert_eq!(documents, ["a: 1\r\n", "b: 2\r\n"]);
    }

    #[test]
    fn test_content_on_separator_line() {
        let content = indoc! {"
            a: 1
            --- |
              literal text
            ---\tplain
            --- # only a comment
            b: 2
        "};
        let documents: Vec<_> = DocumentReader::new(content).collect();
        assert_eq!(documents, ["a: 1\n", "|\n  literal text\n", "plain\n", "b: 2\n"]);
    }

    #[test]
    fn test_document_end_marker() {
        let content = indoc! {"
            a: 1
            ...
            b: 2
            ... # done
            ---
            c: 3
            ...
        "};
        let documents: Vec<_> = DocumentReader::new(content).collect();
        assert_eq!(documents, ["a: 1\n", "b: 2\n", "c: 3\n"]);

        let documents: Vec<_> = DocumentReader::new("a: ...\n....\n").collect();
        assert_eq!(documents, ["a: ...\n....\n"]);
    }

    #[test]
    fn test_comment_only() {
        assert!(is_comment_only("# just a note\n\n  # another\n"));
        assert!(!is_comment_only("# note\nkind: Pod\n"));
    }
}
