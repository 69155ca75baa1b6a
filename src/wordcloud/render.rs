// src/wordcloud/render.rs
//! Font-free default renderer: one shelf-packed block per word, sized by frequency.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use once_cell::sync::Lazy;
use regex::Regex;

use super::colors::{parse_color, Colormap};
use super::{Renderer, WordCloudOptions};
use crate::error::{AnalyticsError, Result};

pub const MAX_SIDE: u32 = 4096;
const RELATIVE_SCALING: f64 = 0.5;
const CHAR_ASPECT: f64 = 0.6;
const MIN_BLOCK_PX: f64 = 4.0;
const SHRINK: f64 = 0.9;

static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w[\w']+").expect("word regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct BlockCloudRenderer;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Block {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

impl BlockCloudRenderer {
    pub fn new() -> Self {
        Self
    }
}

/// Word frequencies, most frequent first, ties by first occurrence, at most `max_words`.
pub fn frequencies(
    text: &str,
    stopwords: &HashSet<&'static str>,
    max_words: usize,
) -> Vec<(String, usize)> {
    let lower = text.to_lowercase();
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (i, m) in RE_WORD.find_iter(&lower).enumerate() {
        let w = m.as_str();
        let w = w.strip_suffix("'s").unwrap_or(w);
        if w.chars().count() < 2 || stopwords.contains(w) {
            continue;
        }
        counts.entry(w.to_string()).or_insert((0, i)).0 += 1;
    }
    let mut ranked: Vec<(String, usize, usize)> =
        counts.into_iter().map(|(w, (c, i))| (w, c, i)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(max_words);
    ranked.into_iter().map(|(w, c, _)| (w, c)).collect()
}

// Shelf packing; stops at the first word that no longer fits.
fn pack(words: &[(String, usize)], base: f64, width: u32, height: u32) -> Vec<Block> {
    let max = words.first().map(|w| w.1).unwrap_or(1).max(1) as f64;
    let (mut x, mut y, mut row_h) = (0u32, 0u32, 0u32);
    let mut out = Vec::with_capacity(words.len());

    for (word, count) in words {
        let rel = *count as f64 / max;
        let size = base * (RELATIVE_SCALING * rel + (1.0 - RELATIVE_SCALING));
        let h = size.max(1.0).round() as u32;
        let w = (size * CHAR_ASPECT * word.chars().count() as f64)
            .max(1.0)
            .round() as u32;
        if w > width {
            break;
        }
        if x + w > width {
            x = 0;
            y += row_h;
            row_h = 0;
        }
        if y + h > height {
            break;
        }
        out.push(Block { x, y, w, h });
        x += w;
        row_h = row_h.max(h);
    }
    out
}

fn layout(words: &[(String, usize)], width: u32, height: u32) -> Vec<Block> {
    let mut base = height as f64 / 3.0;
    loop {
        let blocks = pack(words, base, width, height);
        if blocks.len() == words.len() || base * SHRINK < MIN_BLOCK_PX {
            return blocks;
        }
        base *= SHRINK;
    }
}

fn fill(img: &mut RgbImage, b: Block, color: Rgb<u8>) {
    // 1px gutter so neighbouring blocks stay distinguishable
    let (x0, y0) = (b.x + 1, b.y + 1);
    let x1 = (b.x + b.w).saturating_sub(1).min(img.width());
    let y1 = (b.y + b.h).saturating_sub(1).min(img.height());
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, color);
        }
    }
}

impl Renderer for BlockCloudRenderer {
    fn render(
        &self,
        text: &str,
        options: &WordCloudOptions,
        stopwords: &HashSet<&'static str>,
    ) -> Result<Vec<u8>> {
        let (width, height) = (options.width, options.height);
        if width == 0 || height == 0 || width > MAX_SIDE || height > MAX_SIDE {
            return Err(AnalyticsError::RenderFailed(format!(
                "image size must be within 1..={MAX_SIDE} (got {width}x{height})"
            )));
        }
        if options.max_words == 0 {
            return Err(AnalyticsError::RenderFailed(
                "max_words must be at least 1".into(),
            ));
        }
        let bg = parse_color(&options.background_color).ok_or_else(|| {
            AnalyticsError::RenderFailed(format!(
                "unknown background color '{}'",
                options.background_color
            ))
        })?;
        let cmap = Colormap::by_name(&options.colormap).ok_or_else(|| {
            AnalyticsError::RenderFailed(format!("unknown colormap '{}'", options.colormap))
        })?;

        let words = frequencies(text, stopwords, options.max_words);
        if words.is_empty() {
            return Err(AnalyticsError::RenderFailed(
                "need at least 1 word to plot a word cloud".into(),
            ));
        }

        let blocks = layout(&words, width, height);
        let mut img = RgbImage::from_pixel(width, height, bg);
        let denom = (blocks.len().saturating_sub(1)).max(1) as f64;
        for (rank, b) in blocks.iter().enumerate() {
            fill(&mut img, *b, cmap.sample(rank as f64 / denom));
        }

        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| AnalyticsError::RenderFailed(format!("png encoding failed: {e}")))?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stopwords::stopwords;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];

    #[test]
    fn frequencies_skip_stopwords_and_possessives() {
        let f = frequencies("The dog's bowl and the dog bowl, dog!", stopwords(), 10);
        assert_eq!(f[0], ("dog".to_string(), 3));
        assert_eq!(f[1], ("bowl".to_string(), 2));
        assert!(f.iter().all(|(w, _)| w != "the" && w != "and"));
    }

    #[test]
    fn frequencies_capped_by_max_words() {
        let text = (0..30).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        assert_eq!(frequencies(&text, stopwords(), 5).len(), 5);
    }

    #[test]
    fn renders_png_of_requested_size() {
        let opts = WordCloudOptions {
            width: 120,
            height: 60,
            ..WordCloudOptions::default()
        };
        let png = BlockCloudRenderer
            .render("rent rent repair repair repair lease", &opts, stopwords())
            .unwrap();
        assert!(png.starts_with(PNG_MAGIC));
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (120, 60));
    }

    #[test]
    fn blocks_stay_inside_the_canvas() {
        let words: Vec<(String, usize)> = (0..40).map(|i| (format!("word{i}"), 40 - i)).collect();
        for b in layout(&words, 200, 100) {
            assert!(b.x + b.w <= 200 && b.y + b.h <= 100, "{b:?}");
        }
    }

    #[test]
    fn invalid_options_fail() {
        let r = BlockCloudRenderer;
        let bad_color = WordCloudOptions {
            background_color: "nope".into(),
            ..WordCloudOptions::default()
        };
        assert!(matches!(
            r.render("hello world", &bad_color, stopwords()),
            Err(AnalyticsError::RenderFailed(_))
        ));
        let bad_map = WordCloudOptions {
            colormap: "nope".into(),
            ..WordCloudOptions::default()
        };
        assert!(r.render("hello world", &bad_map, stopwords()).is_err());
        let zero = WordCloudOptions {
            width: 0,
            ..WordCloudOptions::default()
        };
        assert!(r.render("hello world", &zero, stopwords()).is_err());
        assert!(r
            .render("the and of", &WordCloudOptions::default(), stopwords())
            .is_err());
    }
}
