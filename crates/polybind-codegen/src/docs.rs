//! Flattening long descriptions into plain text lines.
//!
//! Action descriptions are written in POD-style markup (`C<code>`,
//! `F<file>`, `L<page(8)>`, ...). Each target wants them as plain, wrapped
//! comment lines. The flattener is a collaborator: the in-process
//! [`PlainText`] flattener lives here, an external-tool flattener and the
//! memoizing cache live in the driver.

use crate::error::CodegenResult;

/// Everything that determines the flattened output.
///
/// Identical requests must always yield identical lines; caches rely on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocRequest<'a> {
    pub width: usize,
    /// Drop leading and trailing blank lines.
    pub trim: bool,
    pub discard_first_line: bool,
    /// Action the text belongs to, for error messages.
    pub name: &'a str,
    pub text: &'a str,
}

/// Turns markup into plain text lines.
pub trait DocFlattener {
    fn flatten(&mut self, req: &DocRequest<'_>) -> CodegenResult<Vec<String>>;
}

impl<F: DocFlattener + ?Sized> DocFlattener for &mut F {
    fn flatten(&mut self, req: &DocRequest<'_>) -> CodegenResult<Vec<String>> {
        (**self).flatten(req)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// PlainText
// ══════════════════════════════════════════════════════════════════════════════

/// In-process flattener: strips formatting codes and wraps paragraphs.
///
/// Paragraphs whose first line is indented are verbatim and kept as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl DocFlattener for PlainText {
    fn flatten(&mut self, req: &DocRequest<'_>) -> CodegenResult<Vec<String>> {
        let mut lines = Vec::new();
        for (i, para) in paragraphs(req.text).into_iter().enumerate() {
            if i > 0 {
                lines.push(String::new());
            }
            if para.first().is_some_and(|l| l.starts_with([' ', '\t'])) {
                lines.extend(para.iter().map(|l| strip_codes(l.trim_end())));
            } else {
                let joined = para.join(" ");
                lines.extend(wrap(&strip_codes(&joined), req.width));
            }
        }
        Ok(finish(lines, req))
    }
}

/// Apply the trim and discard flags shared by every flattener.
pub fn finish(mut lines: Vec<String>, req: &DocRequest<'_>) -> Vec<String> {
    if req.discard_first_line && !lines.is_empty() {
        lines.remove(0);
    }
    if req.trim {
        while lines.first().is_some_and(|l| l.trim().is_empty()) {
            lines.remove(0);
        }
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }
        for l in &mut lines {
            let end = l.trim_end().len();
            l.truncate(end);
        }
    }
    lines
}

fn paragraphs(text: &str) -> Vec<Vec<&str>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Remove `X<...>` formatting codes, keeping their contents.
///
/// `E<lt>` and `E<gt>` become the literal angle brackets.
fn strip_codes(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut open = 0usize;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        if c == 'E' && next == Some('<') {
            let rest: String = chars[i + 2..].iter().take_while(|&&c| c != '>').collect();
            let consumed = rest.chars().count() + 3;
            match rest.as_str() {
                "lt" => out.push('<'),
                "gt" => out.push('>'),
                other => out.push_str(other),
            }
            i += consumed;
            continue;
        }
        if c.is_ascii_uppercase() && next == Some('<') {
            open += 1;
            i += 2;
            continue;
        }
        if c == '>' && open > 0 {
            open -= 1;
            i += 1;
            continue;
        }
        out.push(c);
        i += 1;
    }
    out
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(text: &str) -> DocRequest<'_> {
        DocRequest {
            width: 30,
            trim: true,
            discard_first_line: false,
            name: "mount",
            text,
        }
    }

    #[test]
    fn strips_formatting_codes() {
        assert_eq!(strip_codes("call C<mount> on F</dev/sda>"), "call mount on /dev/sda");
        assert_eq!(strip_codes("see L<mount(8)> and I<-o>"), "see mount(8) and -o");
        assert_eq!(strip_codes("a E<lt>b E<gt> c"), "a <b > c");
        assert_eq!(strip_codes("x > y"), "x > y");
        assert_eq!(strip_codes("B<C<nested>>"), "nested");
    }

    #[test]
    fn wraps_and_separates_paragraphs() {
        let text = "Mount a guest disk at a position in the filesystem.\n\nSecond paragraph.";
        let lines = PlainText.flatten(&req(text)).unwrap();
        assert_eq!(
            lines,
            vec![
                "Mount a guest disk at a",
                "position in the filesystem.",
                "",
                "Second paragraph.",
            ]
        );
        assert!(lines.iter().all(|l| l.len() <= 30));
    }

    #[test]
    fn verbatim_paragraphs_are_kept() {
        let text = "Example:\n\n guestfish add disk.img\n run";
        let lines = PlainText.flatten(&req(text)).unwrap();
        assert_eq!(lines, vec!["Example:", "", " guestfish add disk.img", " run"]);
    }

    #[test]
    fn discard_first_line() {
        let mut r = req("one\n\ntwo");
        r.discard_first_line = true;
        assert_eq!(PlainText.flatten(&r).unwrap(), vec!["two"]);
        r.trim = false;
        assert_eq!(PlainText.flatten(&r).unwrap(), vec!["", "two"]);
    }

    #[test]
    fn idempotent() {
        let r = req("Some C<text> that wraps across more than one line of output.");
        assert_eq!(PlainText.flatten(&r).unwrap(), PlainText.flatten(&r).unwrap());
    }
}
