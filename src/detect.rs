//! Assertion detectors.
//!
//! A [`DetectorRegistry`] is an ordered dispatch table: the first detector whose
//! [`AssertionDetector::can_handle`] accepts an assertion evaluates it. When no detector
//! accepts, the assertion is reported unsatisfied for that branch and a warning is logged.
//!
//! The registry is built once per [`Extractor`][crate::extract::Extractor] and passed down
//! explicitly.

use crate::assertion::Detector;

/// Marker attributes that identify an element, all treated as equivalent.
pub const DEFAULT_MARKER_ATTRIBUTES: &[&str] = &["aria-label", "data-testid", "data-test-id", "id"];

pub trait AssertionDetector: Send + Sync {
    fn can_handle(&self, detector: &Detector) -> bool;
    fn evaluate(&self, detector: &Detector, rendered: &str) -> bool;
}

/// Literal-substring presence in the rendered output.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextDetector;

impl AssertionDetector for TextDetector {
    fn can_handle(&self, detector: &Detector) -> bool {
        matches!(detector, Detector::Text { .. })
    }

    fn evaluate(&self, detector: &Detector, rendered: &str) -> bool {
        match detector {
            Detector::Text { text_to_find } => rendered.contains(text_to_find.as_str()),
            _ => false,
        }
    }
}

/// Presence of an element whose marker attribute equals the label.
#[derive(Debug, Clone)]
pub struct LabelDetector {
    attributes: Vec<String>,
}

impl LabelDetector {
    pub fn new<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for LabelDetector {
    fn default() -> Self {
        LabelDetector::new(DEFAULT_MARKER_ATTRIBUTES.iter().copied())
    }
}

impl AssertionDetector for LabelDetector {
    fn can_handle(&self, detector: &Detector) -> bool {
        matches!(detector, Detector::Label { .. })
    }

    fn evaluate(&self, detector: &Detector, rendered: &str) -> bool {
        let Detector::Label { label_to_find } = detector else {
            return false;
        };
        self.attributes
            .iter()
            .any(|attr| attribute_values(rendered, attr).any(|value| value == label_to_find))
    }
}

/// Values of every `attr="v"`, `attr='v'`, `attr={"v"}` or `attr={'v'}` occurrence.
pub fn attribute_values<'a>(text: &'a str, attr: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    text.match_indices(attr).filter_map(move |(at, _)| {
        let before = text[..at].chars().next_back();
        if before.is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_') {
            return None;
        }
        let rest = text[at + attr.len()..].trim_start();
        let rest = rest.strip_prefix('=')?.trim_start();
        let (rest, braced) = match rest.strip_prefix('{') {
            Some(inner) => (inner.trim_start(), true),
            None => (rest, false),
        };
        let quote = rest.chars().next().filter(|&q| q == '"' || q == '\'')?;
        let body = &rest[1..];
        let end = body.find(quote)?;
        if braced && !body[end + 1..].trim_start().starts_with('}') {
            return None;
        }
        Some(&body[..end])
    })
}

pub struct DetectorRegistry {
    detectors: Vec<Box<dyn AssertionDetector>>,
}

impl DetectorRegistry {
    /// A registry with no detectors; every assertion evaluates to `false`.
    pub fn empty() -> Self {
        Self { detectors: Vec::new() }
    }

    /// Text and label detectors, the label detector using `attributes` as markers.
    pub fn with_markers(attributes: &[String]) -> Self {
        let mut registry = Self::empty();
        registry.register(TextDetector);
        registry.register(LabelDetector::new(attributes.iter().cloned()));
        registry
    }

    /// Appends a detector; earlier detectors take precedence.
    pub fn register(&mut self, detector: impl AssertionDetector + 'static) {
        self.detectors.push(Box::new(detector));
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Whether `rendered` satisfies the property `name`, by the first detector able to
    /// handle `detector`.
    pub fn evaluate(&self, name: &str, detector: &Detector, rendered: &str) -> bool {
        match self.detectors.iter().find(|d| d.can_handle(detector)) {
            Some(handler) => handler.evaluate(detector, rendered),
            None => {
                log::warn!("No detector found for assertion '{}' (kind: {})", name, detector.kind());
                false
            }
        }
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(TextDetector);
        registry.register(LabelDetector::default());
        registry
    }
}

impl std::fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorRegistry")
            .field("detectors", &self.detectors.len())
            .finish()
    }
}
