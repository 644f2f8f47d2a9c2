//! Text normalizer. Cleans raw extracted résumé text into the canonical form the
//! pattern extractors and the LLM prompt expect.
//!
//! The output contains printable ASCII, `\n` and the canonical bullet `•` only.
//! `normalize` is total and idempotent: `normalize(normalize(x)) == normalize(x)`.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Every bullet glyph variant is folded to this character.
pub const BULLET: char = '•';

/// Pictographic icons replaced by the field label they stand for.
/// Variation-selector forms are listed before their bare forms.
pub const DEFAULT_ICONS: &[(&str, &str)] = &[
    ("📍", "Location:"),
    ("📧", "Email:"),
    ("📱", "Phone:"),
    ("📞", "Phone:"),
    ("🌐", "Website:"),
    ("💼", "LinkedIn:"),
    ("🐙", "GitHub:"),
    ("🏠", "Address:"),
    ("☎\u{FE0F}", "Phone:"),
    ("☎", "Phone:"),
    ("✉\u{FE0F}", "Email:"),
    ("✉", "Email:"),
];

const BULLET_VARIANTS: &[char] = &[
    '\u{2022}', // •
    '\u{25CF}', // ●
    '\u{25A0}', // ■
    '\u{25AA}', // ▪
    '\u{25E6}', // ◦
    '\u{25CB}', // ○
    '\u{25C6}', // ◆
    '\u{25BA}', // ►
    '\u{2023}', // ‣
    '\u{2043}', // ⁃
    '\u{2219}', // ∙
    '\u{00B7}', // ·
    '\u{2756}', // ❖
    '\u{27A2}', // ➢
    '\u{27A4}', // ➤
    '\u{F0B7}', // Symbol-font bullet from Word exports
];

static DEFAULT_NORMALIZER: Lazy<Normalizer> = Lazy::new(Normalizer::default);

/// Normalizes `raw` with the default icon table.
pub fn normalize(raw: &str) -> String {
    DEFAULT_NORMALIZER.normalize(raw)
}

/// Configurable normalizer. The icon table is the only extension point.
#[derive(Debug, Clone)]
pub struct Normalizer {
    icons: Vec<(String, String)>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            icons: DEFAULT_ICONS
                .iter()
                .map(|(icon, label)| (icon.to_string(), label.to_string()))
                .collect(),
        }
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or overrides) an icon substitution. Added icons are checked before the defaults.
    pub fn with_icon(mut self, icon: impl Into<String>, label: impl Into<String>) -> Self {
        let icon = icon.into();
        self.icons.retain(|(existing, _)| *existing != icon);
        self.icons.insert(0, (icon, label.into()));
        self
    }

    /// Runs the cleaning steps until the text stops changing.
    ///
    /// Icons are substituted in the first pass only. Its output is printable
    /// ASCII, newlines and bullets, so every later pass either leaves the text
    /// unchanged or shortens it, and the loop terminates.
    pub fn normalize(&self, raw: &str) -> String {
        let mut current = self.pass(raw, true);
        loop {
            let next = self.pass(&current, false);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn pass(&self, text: &str, with_icons: bool) -> String {
        let text = strip_pdf_artifacts(text);
        let text = fold_unicode(&text);
        let text = if with_icons {
            self.substitute_icons(&text)
        } else {
            text
        };
        let text = normalize_bullets(&text);
        // Noise removal replaces characters with spaces, so collapsing runs last.
        let text = strip_noise(&text);
        collapse_whitespace(&text)
    }

    fn substitute_icons(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (icon, label) in &self.icons {
            if out.contains(icon.as_str()) {
                out = out.replace(icon.as_str(), &format!(" {label} "));
            }
        }
        out
    }
}

/// Removes `(cid:NN)` glyph placeholders and `--- Page N ---` markers.
fn strip_pdf_artifacts(text: &str) -> String {
    static CID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(cid:\d+\)").unwrap());
    static PAGE_MARKER_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"-{3}\s*Page\s*\d+\s*-{3}").unwrap());

    // Removing one placeholder can expose another around it.
    let mut without_cid = text.to_string();
    while CID_RE.is_match(&without_cid) {
        without_cid = CID_RE.replace_all(&without_cid, "").into_owned();
    }
    PAGE_MARKER_RE.replace_all(&without_cid, " ").into_owned()
}

/// NFKC composition (also expands ligatures like `ﬁ`), then ASCII quotes and dashes.
fn fold_unicode(text: &str) -> String {
    // UTF-8 en/em dashes mis-decoded as cp1252.
    static MOJIBAKE_DASH_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new("\u{E2}\u{20AC}[\u{201C}\u{201D}\u{2013}\u{2014}]").unwrap());

    let composed: String = text.nfkc().collect();
    let composed = MOJIBAKE_DASH_RE.replace_all(&composed, "-");

    composed
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
            '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
            other => other,
        })
        .collect()
}

fn normalize_bullets(text: &str) -> String {
    static BULLET_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"•(?:[ \t]*•)+").unwrap());

    let unified: String = text
        .chars()
        .map(|c| if BULLET_VARIANTS.contains(&c) { BULLET } else { c })
        .collect();
    BULLET_RUN_RE.replace_all(&unified, "•").into_owned()
}

/// Keeps printable ASCII, newlines and the bullet. Accented letters fold to their
/// base letter; invisible formatting characters vanish; anything else becomes a space.
fn strip_noise(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' | BULLET | ' ' => out.push(c),
            c if c.is_ascii_graphic() => out.push(c),
            c if is_invisible(c) => {}
            c if c.is_ascii() => out.push(' '),
            c => {
                let base: String = std::iter::once(c)
                    .nfd()
                    .filter(|b| b.is_ascii_alphanumeric())
                    .collect();
                if base.is_empty() {
                    out.push(' ');
                } else {
                    out.push_str(&base);
                }
            }
        }
    }
    out
}

fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}' | '\u{200B}'..='\u{200F}' | '\u{2060}'..='\u{2064}' | '\u{FE00}'..='\u{FE0F}' | '\u{FEFF}'
    )
}

fn collapse_whitespace(text: &str) -> String {
    static RULE_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-_=]{3,}").unwrap());
    static SPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());
    static NEWLINE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" ?\n[ \n]*").unwrap());
    static SPACE_BEFORE_PUNCT_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[ \n]+([,.!?;:])").unwrap());

    let text = RULE_LINE_RE.replace_all(text, " ");
    let text = SPACE_RUN_RE.replace_all(&text, " ");
    let text = NEWLINE_RUN_RE.replace_all(&text, "\n");
    let text = SPACE_BEFORE_PUNCT_RE.replace_all(&text, "$1");
    text.trim().to_string()
}
