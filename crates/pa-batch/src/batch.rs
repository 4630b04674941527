//! Annotation batch files and their projected documents.
//!
//! A batch file is JSON in one of two shapes:
//!
//! ```json
//! {"id": "movie_r2", "name": "Movie", "segments": [ ... ]}
//! ```
//!
//! or, for batches written before movie-level metadata existed, a bare
//! array of segments. Each segment carries the raw `d1_text` / `d2_text`
//! pair and optionally the annotator's `annotation` records, a `locked`
//! flag and an `updated` timestamp. Fields this crate does not know about
//! are kept so a batch can be written back unchanged.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use pa_align::{AlignEngine, MappedAnnotation, PairResult, PreparedText, RenderedPair};
use pa_core::{Selection, Side};

use crate::error::{BatchError, Result};

/// Characters of each raw side shown in pair listings.
const PREVIEW_CHARS: usize = 100;

/// Marker in a batch id for later annotation rounds.
const ROUND_MARKER: &str = "_r";

// ---------------------------------------------------------------------------
// On-disk schema
// ---------------------------------------------------------------------------

/// One stored annotation: both selected strings joined by `\n`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub txt: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One document pair of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub d1_text: String,
    pub d2_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<Vec<AnnotationRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Segment {
    fn annotation_count(&self) -> usize {
        self.annotation.as_ref().map_or(0, Vec::len)
    }
}

/// Batch metadata plus its segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchData {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub segments: Vec<Segment>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BatchFile {
    Full(BatchData),
    Legacy(Vec<Segment>),
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// `(touched, extracted)`: pairs with at least one annotation, and the total
/// number of annotations over them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnoStats {
    pub touched: usize,
    pub extracted: usize,
}

/// One row of the batch index page.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub name: String,
    pub file_name: String,
    pub stats: AnnoStats,
    pub last_update: Option<NaiveDateTime>,
}

/// One row of the pair listing of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairPreview {
    pub index: usize,
    pub d1_preview: String,
    pub d2_preview: String,
}

/// Everything needed to render one document pair.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    pub index: usize,
    pub d1_text: String,
    pub d2_text: String,
    pub annotations: Vec<MappedAnnotation>,
    pub rendered: RenderedPair,
    pub is_last: bool,
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// A parsed batch file with every segment projected.
#[derive(Debug, Clone)]
pub struct Batch {
    file_name: String,
    path: PathBuf,
    data: BatchData,
    documents: Vec<PairResult>,
    malformed: usize,
}

impl Batch {
    /// Read and project the batch file at `path`.
    pub fn load(path: &Path, engine: &AlignEngine) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| BatchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(path, &bytes, engine)
    }

    /// Parse and project batch JSON that was read from `path`.
    pub fn from_slice(path: &Path, bytes: &[u8], engine: &AlignEngine) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let parsed: BatchFile = serde_json::from_slice(bytes).map_err(|source| BatchError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let data = match parsed {
            BatchFile::Full(data) => data,
            BatchFile::Legacy(segments) => BatchData {
                id: file_name.clone(),
                name: String::new(),
                segments,
            },
        };

        let mut batch = Self {
            file_name,
            path: path.to_path_buf(),
            data,
            documents: Vec::new(),
            malformed: 0,
        };
        batch.project(engine);
        Ok(batch)
    }

    /// Project every segment, logging selections that fail to resolve.
    fn project(&mut self, engine: &AlignEngine) {
        let mut documents = Vec::with_capacity(self.data.segments.len());
        let mut malformed = 0;
        for (index, segment) in self.data.segments.iter().enumerate() {
            let (selections, skipped) = parse_selections(&self.file_name, index, segment);
            malformed += skipped;

            let left = PreparedText::new(&segment.d1_text);
            let right = PreparedText::new(&segment.d2_text);
            let canonical = [left.canonical().to_string(), right.canonical().to_string()];

            let pair = engine.process_prepared(left, right, &selections);
            for (selection, mapped) in selections.iter().zip(&pair.annotations) {
                for (side, haystack) in [Side::Left, Side::Right].into_iter().zip(&canonical) {
                    let span = mapped.get(side);
                    if !span.is_found() {
                        warn!(
                            batch = %self.file_name,
                            segment = index,
                            side = %side,
                            selection = %selection.get(side),
                            canonical = %haystack,
                            "{}",
                            span.label()
                        );
                    }
                }
            }
            documents.push(pair);
        }
        self.documents = documents;
        self.malformed = malformed;
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &BatchData {
        &self.data
    }

    pub fn id(&self) -> &str {
        &self.data.id
    }

    /// Display name with stray backslashes removed.
    pub fn display_name(&self) -> String {
        self.data.name.replace('\\', "")
    }

    pub fn len(&self) -> usize {
        self.data.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.segments.is_empty()
    }

    /// Annotation records that could not be split into two segments.
    pub fn malformed_annotations(&self) -> usize {
        self.malformed
    }

    /// Projected pair at `index`.
    pub fn pair(&self, index: usize) -> Result<&PairResult> {
        self.documents
            .get(index)
            .ok_or_else(|| BatchError::SegmentOutOfRange {
                batch: self.file_name.clone(),
                index,
                len: self.documents.len(),
            })
    }

    /// Count touched pairs and extracted annotations.
    ///
    /// In later rounds (`_r` in the batch id) locked segments were annotated
    /// in an earlier round and do not count.
    pub fn anno_stats(&self) -> AnnoStats {
        let later_round = self.data.id.contains(ROUND_MARKER);
        let mut stats = AnnoStats::default();
        for segment in &self.data.segments {
            if later_round && segment.locked != Some(false) {
                continue;
            }
            let count = segment.annotation_count();
            if count > 0 {
                stats.touched += 1;
                stats.extracted += count;
            }
        }
        stats
    }

    /// Latest `updated` timestamp among explicitly unlocked segments.
    pub fn last_update(&self) -> Option<NaiveDateTime> {
        self.data
            .segments
            .iter()
            .filter(|s| s.locked == Some(false))
            .filter_map(|s| s.updated.as_deref())
            .filter(|stamp| !stamp.is_empty())
            .filter_map(|stamp| {
                let parsed = parse_timestamp(stamp);
                if parsed.is_none() {
                    warn!(batch = %self.file_name, stamp, "unparseable update timestamp");
                }
                parsed
            })
            .max()
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            name: self.display_name(),
            file_name: self.file_name.clone(),
            stats: self.anno_stats(),
            last_update: self.last_update(),
        }
    }

    /// Index and first characters of each raw side, per segment.
    pub fn pair_previews(&self) -> Vec<PairPreview> {
        self.data
            .segments
            .iter()
            .enumerate()
            .map(|(index, s)| PairPreview {
                index,
                d1_preview: s.d1_text.chars().take(PREVIEW_CHARS).collect(),
                d2_preview: s.d2_text.chars().take(PREVIEW_CHARS).collect(),
            })
            .collect()
    }

    /// Display texts, spans and highlight runs of the pair at `index`.
    pub fn document(&self, index: usize, engine: &AlignEngine) -> Result<DocumentView> {
        let pair = self.pair(index)?;
        Ok(DocumentView {
            index,
            d1_text: pair.d1_text.clone(),
            d2_text: pair.d2_text.clone(),
            annotations: pair.annotations.clone(),
            rendered: engine.render_pair(pair),
            is_last: index + 1 == self.documents.len(),
        })
    }
}

/// Split the stored annotation records of a segment into selections.
/// Returns the selections and the number of records skipped.
fn parse_selections(file_name: &str, index: usize, segment: &Segment) -> (Vec<Selection>, usize) {
    let Some(records) = &segment.annotation else {
        return (Vec::new(), 0);
    };
    let mut selections = Vec::with_capacity(records.len());
    let mut skipped = 0;
    for record in records {
        match Selection::parse(&record.txt) {
            Ok(sel) => selections.push(sel),
            Err(err) => {
                skipped += 1;
                warn!(
                    batch = %file_name,
                    segment = index,
                    txt = %record.txt,
                    error = %err,
                    "skipping malformed annotation"
                );
            }
        }
    }
    (selections, skipped)
}

/// Parse an ISO-8601 timestamp, with or without a UTC offset.
///
/// Offset-carrying stamps are converted to UTC so all values compare on one
/// clock.
pub fn parse_timestamp(stamp: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(stamp) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(stamp, fmt).ok())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pa_core::MatchSpan;

    fn load(file_name: &str, json: &str) -> Batch {
        let engine = AlignEngine::default();
        Batch::from_slice(Path::new(file_name), json.as_bytes(), &engine).expect("batch")
    }

    const FULL: &str = r#"{
        "id": "movie_r2",
        "name": "Movie \\ Title",
        "segments": [
            {
                "d1_text": "Hei!\n\nMitä kuuluu?",
                "d2_text": "Hi!\n\n<i>How are you?</i>",
                "annotation": [{"txt": "Hei!\nHi!", "by": "ann1"}],
                "locked": false,
                "updated": "2021-05-03T10:00:00"
            },
            {
                "d1_text": "Vanha kierros.",
                "d2_text": "Old round.",
                "annotation": [{"txt": "Vanha\nOld"}, {"txt": "kierros\nround"}],
                "locked": true,
                "updated": "2022-01-01T00:00:00"
            },
            {
                "d1_text": "Ei merkintöjä.",
                "d2_text": "No annotations.",
                "locked": false,
                "updated": "2021-06-01T08:30:00.250000"
            }
        ]
    }"#;

    #[test]
    fn full_format_is_projected() {
        let batch = load("movie_r2.json", FULL);
        assert_eq!(batch.id(), "movie_r2");
        assert_eq!(batch.display_name(), "Movie  Title");
        assert_eq!(batch.len(), 3);

        let pair = batch.pair(0).expect("pair");
        assert_eq!(pair.d1_text, "Hei!\nMitä kuuluu?");
        assert_eq!(pair.d2_text, "Hi!\n How are you? ");
        assert_eq!(pair.annotations.len(), 1);
        assert_eq!(pair.annotations[0].left, MatchSpan::found(0, 3));
        assert_eq!(pair.annotations[0].right, MatchSpan::found(0, 2));
    }

    #[test]
    fn legacy_array_uses_file_name_as_id() {
        let batch = load(
            "old_batch.json",
            r#"[{"d1_text": "a b", "d2_text": "c d", "annotation": []}]"#,
        );
        assert_eq!(batch.id(), "old_batch.json");
        assert_eq!(batch.display_name(), "");
        assert!(batch.pair(0).expect("pair").annotations.is_empty());
    }

    #[test]
    fn later_round_counts_only_unlocked() {
        let batch = load("movie_r2.json", FULL);
        assert_eq!(
            batch.anno_stats(),
            AnnoStats {
                touched: 1,
                extracted: 1
            }
        );
    }

    #[test]
    fn first_round_counts_everything() {
        let json = FULL.replace("movie_r2", "movie");
        let batch = load("movie.json", &json);
        assert_eq!(
            batch.anno_stats(),
            AnnoStats {
                touched: 2,
                extracted: 3
            }
        );
    }

    #[test]
    fn last_update_ignores_locked_segments() {
        let batch = load("movie_r2.json", FULL);
        let expected = parse_timestamp("2021-06-01T08:30:00.25").expect("stamp");
        assert_eq!(batch.last_update(), Some(expected));
    }

    #[test]
    fn last_update_none_without_unlocked_stamps() {
        let batch = load(
            "b.json",
            r#"[{"d1_text": "a", "d2_text": "b", "updated": "2021-01-01T00:00:00"}]"#,
        );
        assert_eq!(batch.last_update(), None);
    }

    #[test]
    fn timestamps_with_offsets_are_normalized() {
        let with_offset = parse_timestamp("2021-05-03T12:00:00+02:00").expect("offset");
        let naive = parse_timestamp("2021-05-03T10:00:00").expect("naive");
        assert_eq!(with_offset, naive);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn malformed_annotations_are_skipped() {
        let batch = load(
            "b.json",
            r#"[{"d1_text": "Moi maailma.", "d2_text": "Hello world.",
                "annotation": [{"txt": "no separator"}, {"txt": "Moi\nHello"}, {"txt": "a\nb\nc"}]}]"#,
        );
        assert_eq!(batch.malformed_annotations(), 2);
        let pair = batch.pair(0).expect("pair");
        assert_eq!(pair.annotations.len(), 1);
        assert!(pair.annotations[0].left.is_found());
    }

    #[test]
    fn unresolved_selections_stay_as_sentinels() {
        let batch = load(
            "b.json",
            r#"[{"d1_text": "Moi maailma.", "d2_text": "Hello world.",
                "annotation": [{"txt": "Hei\nworld"}]}]"#,
        );
        let pair = batch.pair(0).expect("pair");
        assert_eq!(pair.annotations[0].left, MatchSpan::NotFound);
        // "world" ends the canonical text, so its end boundary has no key.
        assert_eq!(pair.annotations[0].right, MatchSpan::IndexInconsistent);
        assert_eq!(pair.stats.failed(), 2);
    }

    #[test]
    fn previews_truncate_raw_text() {
        let long = "x".repeat(150);
        let json = format!(r#"[{{"d1_text": "{long}", "d2_text": "short\n\nraw"}}]"#);
        let batch = load("b.json", &json);
        let previews = batch.pair_previews();
        assert_eq!(previews[0].d1_preview.chars().count(), 100);
        assert_eq!(previews[0].d2_preview, "short\n\nraw");
    }

    #[test]
    fn document_view_marks_last_pair() {
        let engine = AlignEngine::default();
        let batch = load("movie_r2.json", FULL);
        let first = batch.document(0, &engine).expect("doc");
        assert!(!first.is_last);
        assert_eq!(first.rendered.left.max_depth, 3);
        let last = batch.document(2, &engine).expect("doc");
        assert!(last.is_last);
        assert!(matches!(
            batch.document(3, &engine),
            Err(BatchError::SegmentOutOfRange { index: 3, len: 3, .. })
        ));
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let batch = load("movie_r2.json", FULL);
        let json = serde_json::to_value(batch.data()).expect("serialize");
        assert_eq!(json["segments"][0]["annotation"][0]["by"], "ann1");
        assert!(json["segments"][2].get("annotation").is_none());
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let engine = AlignEngine::default();
        let err = Batch::from_slice(Path::new("bad.json"), b"{\"id\": 3}", &engine).unwrap_err();
        assert!(matches!(err, BatchError::Parse { .. }));
    }
}
