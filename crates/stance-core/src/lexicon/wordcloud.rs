/*
Copyright 2024, Zep Software, Inc.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/


//! Word-cloud layout rendered to SVG
//!
//! Words are placed largest first. Each starts at a seeded random point and
//! walks an outward spiral until its bounding box fits without overlap,
//! shrinking the font when no position is found.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::{Validate, ValidationError};

use crate::errors::PipelineResult;

/// Average glyph advance as a fraction of the font size
const GLYPH_WIDTH_RATIO: f32 = 0.6;
const SPIRAL_STEPS: usize = 2_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_font_range"))]
pub struct WordCloudConfig {
    #[validate(range(min = 1))]
    pub width: u32,
    #[validate(range(min = 1))]
    pub height: u32,
    pub background: String,
    #[validate(range(min = 1))]
    pub min_font_size: u32,
    #[validate(range(min = 1))]
    pub max_font_size: u32,
    pub font_step: u32,
    pub max_words: usize,
    /// Exponent on relative frequency when sizing words: 0 is uniform, 1 is linear
    #[validate(range(min = 0.0, max = 1.0))]
    pub relative_scaling: f32,
    /// Probability a word is laid out horizontally
    #[validate(range(min = 0.0, max = 1.0))]
    pub prefer_horizontal: f32,
    pub seed: u64,
}

impl Default for WordCloudConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            background: "white".to_string(),
            min_font_size: 10,
            max_font_size: 150,
            font_step: 2,
            max_words: 200,
            relative_scaling: 0.5,
            prefer_horizontal: 0.9,
            seed: 42,
        }
    }
}

fn validate_font_range(config: &WordCloudConfig) -> Result<(), ValidationError> {
    if config.min_font_size > config.max_font_size {
        return Err(ValidationError::new("min_font_size_exceeds_max"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedWord {
    pub text: String,
    pub font_size: u32,
    /// Bounding box, top-left origin
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub vertical: bool,
    pub color: String,
}

impl PlacedWord {
    fn overlaps(&self, x: f32, y: f32, width: f32, height: f32) -> bool {
        x < self.x + self.width
            && self.x < x + width
            && y < self.y + self.height
            && self.y < y + height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordCloud {
    pub config: WordCloudConfig,
    pub words: Vec<PlacedWord>,
}

impl WordCloud {
    /// Lay out words given as `(word, frequency)`, most frequent first
    pub fn generate(frequencies: &[(String, usize)], config: WordCloudConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut words: Vec<PlacedWord> = Vec::new();
        let max_frequency = frequencies.first().map(|(_, f)| *f).unwrap_or(1).max(1) as f32;
        let canvas_w = config.width as f32;
        let canvas_h = config.height as f32;
        let min_font = config.min_font_size.min(config.max_font_size);
        let max_font = config.min_font_size.max(config.max_font_size);

        for (text, frequency) in frequencies.iter().take(config.max_words) {
            let share = *frequency as f32 / max_frequency;
            let scale = share.powf(config.relative_scaling);
            let mut font_size = ((max_font as f32) * scale).round() as u32;
            font_size = font_size.clamp(min_font, max_font);
            let vertical = rng.gen::<f32>() > config.prefer_horizontal;
            let color = format!("hsl({}, 80%, 50%)", rng.gen_range(0..360));

            let placed = loop {
                let (w, h) = box_size(text, font_size, vertical);
                if let Some((x, y)) = find_position(&words, w, h, canvas_w, canvas_h, &mut rng) {
                    break Some((x, y, w, h));
                }
                if font_size <= min_font || config.font_step == 0 {
                    break None;
                }
                font_size = font_size.saturating_sub(config.font_step).max(min_font);
            };

            match placed {
                Some((x, y, width, height)) => words.push(PlacedWord {
                    text: text.clone(),
                    font_size,
                    x,
                    y,
                    width,
                    height,
                    vertical,
                    color,
                }),
                None => debug!("No room left for '{}'", text),
            }
        }

        Self { config, words }
    }

    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.config.width,
            h = self.config.height
        );
        let _ = writeln!(
            svg,
            r#"  <rect width="100%" height="100%" fill="{}"/>"#,
            escape_xml(&self.config.background)
        );
        for word in &self.words {
            let text = escape_xml(&word.text);
            if word.vertical {
                // rotate about the bottom-left corner of the box
                let ax = word.x;
                let ay = word.y + word.height;
                let _ = writeln!(
                    svg,
                    r#"  <text x="{ax:.1}" y="{ay:.1}" font-size="{}" fill="{}" font-family="sans-serif" dominant-baseline="hanging" transform="rotate(-90 {ax:.1} {ay:.1})">{text}</text>"#,
                    word.font_size, word.color
                );
            } else {
                let _ = writeln!(
                    svg,
                    r#"  <text x="{:.1}" y="{:.1}" font-size="{}" fill="{}" font-family="sans-serif" dominant-baseline="hanging">{text}</text>"#,
                    word.x, word.y, word.font_size, word.color
                );
            }
        }
        svg.push_str("</svg>\n");
        svg
    }

    pub fn write_svg(&self, path: impl AsRef<Path>) -> PipelineResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_svg())?;
        debug!("Word cloud with {} words written to {}", self.words.len(), path.display());
        Ok(())
    }
}

fn box_size(text: &str, font_size: u32, vertical: bool) -> (f32, f32) {
    let along = text.chars().count() as f32 * font_size as f32 * GLYPH_WIDTH_RATIO;
    let across = font_size as f32;
    if vertical {
        (across, along)
    } else {
        (along, across)
    }
}

fn find_position(
    placed: &[PlacedWord],
    width: f32,
    height: f32,
    canvas_w: f32,
    canvas_h: f32,
    rng: &mut StdRng,
) -> Option<(f32, f32)> {
    if width > canvas_w || height > canvas_h {
        return None;
    }
    let start_x = rng.gen_range(0.0..=(canvas_w - width));
    let start_y = rng.gen_range(0.0..=(canvas_h - height));

    for step in 0..SPIRAL_STEPS {
        let angle = step as f32 * 0.1;
        let radius = step as f32 * 0.5;
        let x = start_x + radius * angle.cos();
        let y = start_y + radius * angle.sin();
        if x < 0.0 || y < 0.0 || x + width > canvas_w || y + height > canvas_h {
            continue;
        }
        if placed.iter().all(|w| !w.overlaps(x, y, width, height)) {
            return Some((x, y));
        }
    }
    None
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn frequencies() -> Vec<(String, usize)> {
        [
            ("Hasina", 40),
            ("election", 25),
            ("BNP", 20),
            ("Dhaka", 12),
            ("protest", 9),
            ("students", 7),
            ("quota", 5),
            ("reform", 3),
            ("<script>", 1),
        ]
        .into_iter()
        .map(|(w, f)| (w.to_string(), f))
        .collect()
    }

    #[test]
    fn test_layout_is_deterministic() {
        let a = WordCloud::generate(&frequencies(), WordCloudConfig::default());
        let b = WordCloud::generate(&frequencies(), WordCloudConfig::default());
        assert_eq!(a, b);
        assert_eq!(a.to_svg(), b.to_svg());
    }

    #[test]
    fn test_words_fit_canvas_without_overlap() {
        let cloud = WordCloud::generate(&frequencies(), WordCloudConfig::default());
        assert!(!cloud.words.is_empty());
        for (i, word) in cloud.words.iter().enumerate() {
            assert!(word.x >= 0.0 && word.y >= 0.0);
            assert!(word.x + word.width <= 800.0 + f32::EPSILON);
            assert!(word.y + word.height <= 400.0 + f32::EPSILON);
            assert!((10..=150).contains(&word.font_size));
            for other in &cloud.words[i + 1..] {
                assert!(!other.overlaps(word.x, word.y, word.width, word.height));
            }
        }
    }

    #[test]
    fn test_more_frequent_words_are_not_smaller() {
        let config = WordCloudConfig {
            prefer_horizontal: 1.0,
            ..Default::default()
        };
        let cloud = WordCloud::generate(&frequencies(), config);
        let first = &cloud.words[0];
        assert_eq!(first.text, "Hasina");
        assert!(cloud.words.iter().all(|w| w.font_size <= first.font_size));
    }

    #[test]
    fn test_svg_escapes_text_and_sets_bounds() {
        let cloud = WordCloud::generate(&frequencies(), WordCloudConfig::default());
        let svg = cloud.to_svg();
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="800" height="400""#));
        assert!(svg.contains(r#"fill="white""#));
        assert!(!svg.contains("<script>"));
    }

    #[test]
    fn test_inverted_font_range_is_rejected_but_still_lays_out() {
        let config = WordCloudConfig {
            min_font_size: 60,
            max_font_size: 20,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(WordCloudConfig::default().validate().is_ok());

        let cloud = WordCloud::generate(&frequencies(), config);
        assert!(!cloud.words.is_empty());
        assert!(cloud.words.iter().all(|w| (20..=60).contains(&w.font_size)));
    }

    #[test]
    fn test_empty_input_renders_background_only() {
        let cloud = WordCloud::generate(&[], WordCloudConfig::default());
        assert!(cloud.words.is_empty());
        assert_eq!(cloud.to_svg().matches("<text").count(), 0);
    }

    #[test]
    fn test_write_svg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cloud.svg");
        WordCloud::generate(&frequencies(), WordCloudConfig::default())
            .write_svg(&path)
            .unwrap();
        assert!(fs::read_to_string(&path).unwrap().ends_with("</svg>\n"));
    }
}
