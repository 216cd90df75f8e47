//! Named Entity Recognition (NER) module
//!
//! Provides two recognizers:
//! - Hosted: a token-classification model on the inference API
//! - Pattern: regex patterns + dictionary matching, no network required
//!
//! Both report character offsets, end exclusive.

use async_trait::async_trait;
use bioastra_core::{NlpError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::hub::{HubClient, InferenceOptions};
use crate::{EntityRecognizer, ExtractedEntity};

/// Hub task tag for NER models
pub const TOKEN_CLASSIFICATION_TASK: &str = "token-classification";

// ============================================================================
// Character offsets
// ============================================================================

/// Slice `text` by character offsets, `None` unless `start < end <= len`
pub fn char_slice(text: &str, start: usize, end: usize) -> Option<&str> {
    if start >= end {
        return None;
    }

    let mut boundaries = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()));

    let byte_start = boundaries.nth(start)?;
    let byte_end = boundaries.nth(end - start - 1)?;
    Some(&text[byte_start..byte_end])
}

/// Byte-to-character offset table for one input text
///
/// Built once per text so that converting a match offset is a binary search
/// instead of a rescan from the start.
struct CharIndex {
    /// Byte offset of every character, in order
    starts: Vec<usize>,
}

impl CharIndex {
    fn new(text: &str) -> Self {
        Self {
            starts: text.char_indices().map(|(i, _)| i).collect(),
        }
    }

    /// Character offset of a byte offset on a char boundary (or the text end)
    fn char_offset(&self, byte: usize) -> usize {
        self.starts.partition_point(|&start| start < byte)
    }
}

// ============================================================================
// Hosted NER
// ============================================================================

#[derive(Debug, Serialize)]
struct TokenClassificationRequest<'a> {
    inputs: &'a str,
    parameters: TokenClassificationParameters,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct TokenClassificationParameters {
    aggregation_strategy: &'static str,
}

/// Span as reported by a token-classification model
#[derive(Debug, Deserialize)]
struct TokenClassificationOutput {
    /// Present when the model aggregates sub-word tokens
    #[serde(default)]
    entity_group: Option<String>,
    /// Per-token label when no aggregation happened
    #[serde(default)]
    entity: Option<String>,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    start: Option<usize>,
    #[serde(default)]
    end: Option<usize>,
}

/// Entity recognizer calling a model hosted on the inference API
pub struct HfEntityRecognizer {
    hub: HubClient,
    model: String,
}

impl HfEntityRecognizer {
    /// Wrap an already-resolved model
    pub fn new(hub: HubClient, model: impl Into<String>) -> Self {
        Self {
            hub,
            model: model.into(),
        }
    }

    /// Resolve `model` on the hub and build a recognizer for it
    pub async fn load(hub: HubClient, model: &str) -> Result<Self> {
        let info = hub.resolve(model, TOKEN_CLASSIFICATION_TASK).await?;
        Ok(Self::new(hub, info.id))
    }

    /// Map raw model spans onto the input, keeping the model's order
    fn to_entities(
        &self,
        text: &str,
        outputs: Vec<TokenClassificationOutput>,
    ) -> Result<Vec<ExtractedEntity>> {
        outputs
            .into_iter()
            .map(|output| {
                let label = output.entity_group.or(output.entity).ok_or_else(|| {
                    NlpError::InvalidOutput(format!("{} returned a span without a label", self.model))
                })?;

                let (start, end) = match (output.start, output.end) {
                    (Some(start), Some(end)) => (start, end),
                    _ => {
                        return Err(NlpError::InvalidOutput(format!(
                            "{} returned '{label}' without offsets",
                            self.model
                        )))
                    }
                };

                let span = char_slice(text, start, end).ok_or_else(|| {
                    NlpError::InvalidOutput(format!(
                        "{} returned out-of-range span {start}..{end}",
                        self.model
                    ))
                })?;

                Ok(ExtractedEntity {
                    text: span.to_string(),
                    label,
                    start,
                    end,
                    confidence: output.score,
                })
            })
            .collect()
    }
}

#[async_trait]
impl EntityRecognizer for HfEntityRecognizer {
    async fn recognize(&self, text: &str) -> Result<Vec<ExtractedEntity>> {
        let request = TokenClassificationRequest {
            inputs: text,
            parameters: TokenClassificationParameters {
                aggregation_strategy: "simple",
            },
            options: InferenceOptions::default(),
        };

        let outputs: Vec<TokenClassificationOutput> = self.hub.infer(&self.model, &request).await?;
        self.to_entities(text, outputs)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Entity labels
// ============================================================================

/// Labels produced by the pattern recognizer (OntoNotes-style tags)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityLabel {
    /// Agencies, companies, institutions
    Org,
    /// Stations, centers, built facilities
    Fac,
    /// Non-political locations, celestial bodies, orbits
    Loc,
    /// Countries and other political entities
    Gpe,
    Date,
    Time,
    Percent,
    Quantity,
    Cardinal,
}

impl EntityLabel {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Org => "ORG",
            Self::Fac => "FAC",
            Self::Loc => "LOC",
            Self::Gpe => "GPE",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Percent => "PERCENT",
            Self::Quantity => "QUANTITY",
            Self::Cardinal => "CARDINAL",
        }
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Pattern-based NER
// ============================================================================

/// Dictionary entry for entity matching
#[derive(Debug, Clone)]
pub struct DictionaryEntry {
    pub term: String,
    pub label: EntityLabel,
}

/// Pattern-based NER using regex patterns and a space-biology dictionary
///
/// Dictionary terms are matched case-sensitively on word boundaries since
/// they are proper nouns and acronyms.
pub struct PatternNer {
    /// Pattern rules (regex -> label, confidence)
    patterns: Vec<(Regex, EntityLabel, f32)>,
    /// Known terms with their compiled matcher
    dictionary: Vec<(DictionaryEntry, Regex)>,
}

/// Identifier reported for the pattern recognizer
pub const PATTERN_MODEL_ID: &str = "bioastra/pattern-ner";

impl PatternNer {
    /// Create a new pattern NER with the default domain rules
    pub fn new() -> Self {
        let mut ner = Self {
            patterns: Vec::new(),
            dictionary: Vec::new(),
        };

        ner.init_patterns();
        ner.init_dictionary();
        ner
    }

    /// Initialize regex patterns
    fn init_patterns(&mut self) {
        const MONTHS: &str =
            "January|February|March|April|May|June|July|August|September|October|November|December";
        // Integer part may carry thousands separators
        const NUMBER: &str = r"(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?";

        // Dates
        self.add_pattern(r"\b\d{4}-\d{1,2}-\d{1,2}\b", EntityLabel::Date, 0.95);
        self.add_pattern(r"\b\d{1,2}/\d{1,2}/\d{4}\b", EntityLabel::Date, 0.95);
        self.add_pattern(
            &format!(r"\b(?:{MONTHS})(?:\s+\d{{1,2}},)?\s+\d{{4}}\b"),
            EntityLabel::Date,
            0.9,
        );
        self.add_pattern(r"\b(?:19|20)\d{2}s?\b", EntityLabel::Date, 0.6);

        // Durations
        self.add_pattern(
            r"\b\d+(?:\.\d+)?(?:\s|-)?(?:days?|weeks?|months?|years?)\b",
            EntityLabel::Date,
            0.85,
        );
        self.add_pattern(
            r"\b\d+(?:\.\d+)?(?:\s|-)?(?:hours?|minutes?|seconds?)\b",
            EntityLabel::Time,
            0.85,
        );

        // Percentages
        self.add_pattern(
            &format!(r"\b{NUMBER}\s?(?:%|percent\b)"),
            EntityLabel::Percent,
            0.95,
        );

        // Measured quantities
        self.add_pattern(
            &format!(r"\b{NUMBER}\s?(?:mGy|Gy|mSv|Sv|kg|mg|g|km|cm|mm|m|°C|K|rpm)\b"),
            EntityLabel::Quantity,
            0.8,
        );

        // Plain numbers
        self.add_pattern(r"\b\d{1,3}(?:,\d{3})+\b|\b\d+(?:\.\d+)?\b", EntityLabel::Cardinal, 0.5);
    }

    /// Initialize dictionary for space-biology terms
    fn init_dictionary(&mut self) {
        // Agencies and organizations
        self.add_term(
            "NASA",
            EntityLabel::Org,
            vec!["National Aeronautics and Space Administration"],
        );
        self.add_term("ESA", EntityLabel::Org, vec!["European Space Agency"]);
        self.add_term(
            "JAXA",
            EntityLabel::Org,
            vec!["Japan Aerospace Exploration Agency"],
        );
        self.add_term("Roscosmos", EntityLabel::Org, vec![]);
        self.add_term("CNSA", EntityLabel::Org, vec!["China National Space Administration"]);
        self.add_term("ISRO", EntityLabel::Org, vec!["Indian Space Research Organisation"]);
        self.add_term("SpaceX", EntityLabel::Org, vec![]);
        self.add_term("GeneLab", EntityLabel::Org, vec!["NASA GeneLab"]);

        // Facilities
        self.add_term("ISS", EntityLabel::Fac, vec!["International Space Station"]);
        self.add_term("Tiangong", EntityLabel::Fac, vec!["Tiangong space station"]);
        self.add_term("Kennedy Space Center", EntityLabel::Fac, vec!["KSC"]);
        self.add_term("Johnson Space Center", EntityLabel::Fac, vec!["JSC"]);
        self.add_term("Veggie", EntityLabel::Fac, vec!["Vegetable Production System"]);
        self.add_term("Advanced Plant Habitat", EntityLabel::Fac, vec!["APH"]);

        // Locations
        self.add_term("Earth", EntityLabel::Loc, vec![]);
        self.add_term("Moon", EntityLabel::Loc, vec!["lunar surface"]);
        self.add_term("Mars", EntityLabel::Loc, vec!["Martian surface"]);
        self.add_term("low Earth orbit", EntityLabel::Loc, vec!["LEO"]);

        // Countries
        self.add_term("United States", EntityLabel::Gpe, vec!["USA", "U.S."]);
        self.add_term("Russia", EntityLabel::Gpe, vec![]);
        self.add_term("Japan", EntityLabel::Gpe, vec![]);
        self.add_term("China", EntityLabel::Gpe, vec![]);
        self.add_term("Canada", EntityLabel::Gpe, vec![]);
    }

    /// Add a regex pattern
    fn add_pattern(&mut self, pattern: &str, label: EntityLabel, confidence: f32) {
        match Regex::new(pattern) {
            Ok(regex) => self.patterns.push((regex, label, confidence)),
            Err(e) => tracing::warn!(pattern, error = %e, "Skipping invalid NER pattern"),
        }
    }

    /// Add a dictionary term
    fn add_term(&mut self, term: &str, label: EntityLabel, aliases: Vec<&str>) {
        let entry = DictionaryEntry {
            term: term.to_string(),
            label,
        };

        // Longest alternatives first so the regex prefers full names
        let mut names: Vec<&str> = std::iter::once(term).chain(aliases).collect();
        names.sort_by_key(|n| std::cmp::Reverse(n.len()));
        let alternatives: Vec<String> = names.iter().map(|n| regex::escape(n)).collect();

        // `\b` cannot follow a trailing '.', so names like "U.S." end on a non-word char instead
        let pattern = format!(r"\b({})(?:\b|$|\W)", alternatives.join("|"));
        match Regex::new(&pattern) {
            Ok(regex) => self.dictionary.push((entry, regex)),
            Err(e) => tracing::warn!(term, error = %e, "Skipping invalid dictionary term"),
        }
    }

    /// Extract entities using pattern matching
    fn extract_by_patterns(&self, text: &str, index: &CharIndex) -> Vec<ExtractedEntity> {
        let mut entities = Vec::new();

        for (regex, label, confidence) in &self.patterns {
            for mat in regex.find_iter(text) {
                entities.push(entity_at(text, index, mat.start(), mat.end(), *label, *confidence));
            }
        }

        entities
    }

    /// Extract entities using dictionary lookup
    fn extract_by_dictionary(&self, text: &str, index: &CharIndex) -> Vec<ExtractedEntity> {
        let mut entities = Vec::new();

        for (entry, regex) in &self.dictionary {
            for caps in regex.captures_iter(text) {
                let Some(name) = caps.get(1) else { continue };
                let confidence = if name.as_str() == entry.term { 0.95 } else { 0.9 };
                entities.push(entity_at(text, index, name.start(), name.end(), entry.label, confidence));
            }
        }

        entities
    }

    /// Resolve overlaps: longest span first, then highest confidence, then earliest
    ///
    /// Returns the kept spans sorted by start offset.
    fn deduplicate(&self, mut entities: Vec<ExtractedEntity>) -> Vec<ExtractedEntity> {
        entities.retain(|e| e.start < e.end);
        entities.sort_by(|a, b| {
            (b.end - b.start)
                .cmp(&(a.end - a.start))
                .then(b.confidence.total_cmp(&a.confidence))
                .then(a.start.cmp(&b.start))
        });

        // Kept spans are disjoint, keyed by start
        let mut kept: BTreeMap<usize, ExtractedEntity> = BTreeMap::new();

        for entity in entities {
            let overlaps = kept
                .range(..entity.end)
                .next_back()
                .is_some_and(|(_, prev)| prev.end > entity.start);
            if !overlaps {
                kept.insert(entity.start, entity);
            }
        }

        kept.into_values().collect()
    }

    /// Run all rules over `text`
    pub fn extract(&self, text: &str) -> Vec<ExtractedEntity> {
        let index = CharIndex::new(text);
        let mut entities = self.extract_by_patterns(text, &index);
        entities.extend(self.extract_by_dictionary(text, &index));
        self.deduplicate(entities)
    }
}

fn entity_at(
    text: &str,
    index: &CharIndex,
    byte_start: usize,
    byte_end: usize,
    label: EntityLabel,
    confidence: f32,
) -> ExtractedEntity {
    ExtractedEntity {
        text: text[byte_start..byte_end].to_string(),
        label: label.to_string(),
        start: index.char_offset(byte_start),
        end: index.char_offset(byte_end),
        confidence,
    }
}

impl Default for PatternNer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityRecognizer for PatternNer {
    async fn recognize(&self, text: &str) -> Result<Vec<ExtractedEntity>> {
        Ok(self.extract(text))
    }

    fn model_id(&self) -> &str {
        PATTERN_MODEL_ID
    }
}

// ============================================================================
// Tests
// ============================================================================
