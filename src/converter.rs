use html2text::render::text_renderer::TrivialDecorator;

// html2text always wraps. Paragraphs shorter than this many characters keep
// their line; `<hr>` is drawn this wide, so it cannot be unbounded.
const WRAP_WIDTH: usize = 1 << 20;

/// Renders an HTML transcript as plain text.
pub fn html_to_text(html: &[u8]) -> String {
    let rendered = html2text::from_read_with_decorator(html, WRAP_WIDTH, TrivialDecorator::new());
    let kept = rendered
        .lines()
        .filter(|line| !is_rule(line))
        .collect::<Vec<&str>>()
        .join("\n");
    normalize_whitespace(&kept)
}

// a horizontal rule spans the whole wrap width
fn is_rule(line: &str) -> bool {
    line.chars().count() >= WRAP_WIDTH && line.chars().all(|c| matches!(c, '-' | '─' | '━' | '='))
}

/// Strips trailing spaces, folds runs of blank lines into one and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = false;
    for line in text.lines().map(str::trim_end) {
        if line.is_empty() {
            blank_run = !out.is_empty();
            continue;
        }
        if blank_run {
            out.push('\n');
            blank_run = false;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}
