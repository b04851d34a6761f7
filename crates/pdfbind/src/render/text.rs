//! Text flow: wrap, paginate and draw plain text in Helvetica.
//!
//! Text is encoded to single WinAnsi bytes before measuring. Characters
//! without a WinAnsi code are drawn as `?`.

use lopdf::Object;
use lopdf::content::{Content, Operation};
use std::borrow::Cow;

use super::{FONT_RESOURCE, MARGIN, PAGE_HEIGHT, PAGE_WIDTH, PageContent};
use crate::error::{ConvertError, Result};

/// Helvetica advance widths for 0x20..=0x7E, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// WinAnsi code points 0x80..=0x9F: character, byte and Helvetica width.
const WIN_ANSI_EXTRAS: [(char, u8, u16); 27] = [
    ('\u{20AC}', 0x80, 556),
    ('\u{201A}', 0x82, 222),
    ('\u{0192}', 0x83, 556),
    ('\u{201E}', 0x84, 333),
    ('\u{2026}', 0x85, 1000),
    ('\u{2020}', 0x86, 556),
    ('\u{2021}', 0x87, 556),
    ('\u{02C6}', 0x88, 333),
    ('\u{2030}', 0x89, 1000),
    ('\u{0160}', 0x8A, 667),
    ('\u{2039}', 0x8B, 333),
    ('\u{0152}', 0x8C, 1000),
    ('\u{017D}', 0x8E, 611),
    ('\u{2018}', 0x91, 222),
    ('\u{2019}', 0x92, 222),
    ('\u{201C}', 0x93, 333),
    ('\u{201D}', 0x94, 333),
    ('\u{2022}', 0x95, 350),
    ('\u{2013}', 0x96, 556),
    ('\u{2014}', 0x97, 1000),
    ('\u{02DC}', 0x98, 333),
    ('\u{2122}', 0x99, 1000),
    ('\u{0161}', 0x9A, 500),
    ('\u{203A}', 0x9B, 333),
    ('\u{0153}', 0x9C, 944),
    ('\u{017E}', 0x9E, 500),
    ('\u{0178}', 0x9F, 667),
];

/// Width used for every other byte outside printable ASCII.
const FALLBACK_WIDTH: u16 = 556;

/// Helvetica ascender, in em.
const ASCENT: f32 = 0.718;

/// Helvetica line height (ascender - descender + line gap), in em.
const LINE_HEIGHT_FACTOR: f32 = 1.156;

const TAB_WIDTH: usize = 4;

/// Layout parameters for flowed text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    /// Font size in points.
    pub font_size: f32,
    /// Extra space between lines, in points.
    pub line_gap: f32,
    /// Width available for a line.
    pub width: f32,
    /// Height available for lines on one page.
    pub height: f32,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            line_gap: 5.0,
            width: PAGE_WIDTH - 2.0 * MARGIN,
            height: PAGE_HEIGHT - 2.0 * MARGIN,
        }
    }
}

impl TextLayout {
    /// Height of one line of glyphs.
    pub fn line_height(&self) -> f32 {
        self.font_size * LINE_HEIGHT_FACTOR
    }

    /// Distance between consecutive baselines.
    pub fn line_advance(&self) -> f32 {
        self.line_height() + self.line_gap
    }

    /// Number of lines that fit on one page (at least one).
    pub fn lines_per_page(&self) -> usize {
        if self.height <= self.line_height() {
            return 1;
        }
        ((self.height - self.line_height()) / self.line_advance()).floor() as usize + 1
    }

    /// Baseline of the first line, measured from the page bottom.
    pub fn first_baseline(&self) -> f32 {
        PAGE_HEIGHT - MARGIN - self.font_size * ASCENT
    }

    /// Rendered width of an encoded line.
    pub fn measure(&self, line: &[u8]) -> f32 {
        let units: u32 = line.iter().map(|&b| u32::from(glyph_width(b))).sum();
        units as f32 * self.font_size / 1000.0
    }

    /// Break `text` into encoded lines no wider than the layout width.
    ///
    /// Paragraphs split on `\n`; words wrap on spaces and words wider than a
    /// full line are broken between characters.
    pub fn wrap(&self, text: &str) -> Vec<Vec<u8>> {
        let normalized = normalize(text);
        let mut lines = Vec::new();

        for paragraph in normalized.split('\n') {
            let encoded: Vec<u8> = paragraph.chars().map(encode_char).collect();
            self.wrap_paragraph(&encoded, &mut lines);
        }

        lines
    }

    fn wrap_paragraph(&self, paragraph: &[u8], lines: &mut Vec<Vec<u8>>) {
        let mut line: Vec<u8> = Vec::new();
        let mut started = false;
        let mut after_wrap = false;

        for word in paragraph.split(|&b| b == b' ') {
            if !started {
                started = true;
                line = self.break_word(word, lines);
                continue;
            }
            // Spaces at a wrap point are consumed by the line break.
            if after_wrap && line.is_empty() {
                if !word.is_empty() {
                    line = self.break_word(word, lines);
                }
                continue;
            }

            let mut candidate = line.clone();
            candidate.push(b' ');
            candidate.extend_from_slice(word);
            if self.measure(&candidate) <= self.width {
                line = candidate;
                continue;
            }

            let mut full = std::mem::take(&mut line);
            while full.last() == Some(&b' ') {
                full.pop();
            }
            lines.push(full);
            after_wrap = true;
            line = self.break_word(word, lines);
        }

        lines.push(line);
    }

    /// Push full-width chunks of `word` and return the remainder.
    fn break_word(&self, word: &[u8], lines: &mut Vec<Vec<u8>>) -> Vec<u8> {
        if self.measure(word) <= self.width {
            return word.to_vec();
        }

        let mut chunk = Vec::new();
        for &byte in word {
            chunk.push(byte);
            if chunk.len() > 1 && self.measure(&chunk) > self.width {
                chunk.pop();
                lines.push(std::mem::take(&mut chunk));
                chunk.push(byte);
            }
        }
        chunk
    }

    /// Wrap `text` and group the lines into pages.
    ///
    /// Always yields at least one page, even for empty text.
    pub fn paginate(&self, text: &str) -> Vec<Vec<Vec<u8>>> {
        let lines = self.wrap(text);
        let per_page = self.lines_per_page();

        let mut pages: Vec<Vec<Vec<u8>>> = lines.chunks(per_page).map(<[_]>::to_vec).collect();
        if pages.is_empty() {
            pages.push(Vec::new());
        }
        pages
    }

    /// Content stream drawing `lines` top-down from the first baseline.
    ///
    /// # Errors
    ///
    /// Returns an error if the operations cannot be encoded.
    pub fn page_content(&self, lines: &[Vec<u8>]) -> lopdf::Result<Vec<u8>> {
        if lines.iter().all(Vec::is_empty) {
            return Content { operations: vec![] }.encode();
        }

        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FONT_RESOURCE.into(), self.font_size.into()]),
            Operation::new("TL", vec![self.line_advance().into()]),
            Operation::new("Td", vec![MARGIN.into(), self.first_baseline().into()]),
        ];

        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            if !line.is_empty() {
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(line.clone())],
                ));
            }
        }
        operations.push(Operation::new("ET", vec![]));

        Content { operations }.encode()
    }
}

/// Render raw text file bytes into one or more pages.
///
/// Invalid UTF-8 is decoded lossily and logged.
///
/// # Errors
///
/// Returns [`ConvertError::MalformedContent`] if a content stream cannot be
/// encoded.
pub fn render_text(bytes: &[u8], name: &str) -> Result<Vec<PageContent>> {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(e) => {
            tracing::warn!(file = name, error = %e, "input is not valid UTF-8, replacing invalid sequences");
            String::from_utf8_lossy(bytes)
        }
    };

    let layout = TextLayout::default();
    layout
        .paginate(&text)
        .iter()
        .map(|lines| {
            layout
                .page_content(lines)
                .map(PageContent::text)
                .map_err(|e| ConvertError::malformed_content(name, e.to_string()))
        })
        .collect()
}

fn normalize(text: &str) -> String {
    text.strip_prefix('\u{FEFF}')
        .unwrap_or(text)
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\t', &" ".repeat(TAB_WIDTH))
}

fn encode_char(c: char) -> u8 {
    match u32::from(c) {
        code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
        _ => WIN_ANSI_EXTRAS
            .iter()
            .find(|(extra, _, _)| *extra == c)
            .map_or(b'?', |&(_, byte, _)| byte),
    }
}

fn glyph_width(byte: u8) -> u16 {
    match byte {
        0x20..=0x7E => HELVETICA_WIDTHS[usize::from(byte - 0x20)],
        0x80..=0x9F => WIN_ANSI_EXTRAS
            .iter()
            .find(|&&(_, code, _)| code == byte)
            .map_or(FALLBACK_WIDTH, |&(_, _, width)| width),
        _ => FALLBACK_WIDTH,
    }
}
