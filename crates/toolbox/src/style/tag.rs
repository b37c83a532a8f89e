//! Parser for `styles` tags of the form `"<renderer>.<field>"`.

use super::ClassificationFunction;

/// Renderer named by the prefix of a style tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagRenderer {
    Lisa,
    Ols,
    Classify(ClassificationFunction),
}

/// A recognized style tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleTag {
    pub renderer: TagRenderer,
    /// Field reference, absent when the tag does not carry exactly one
    pub field: Option<String>,
}

/// Prefixes in match order; longer ones come first.
const PREFIXES: &[(&str, TagRenderer)] = &[
    ("LISA", TagRenderer::Lisa),
    ("OLS", TagRenderer::Ols),
    ("CL", TagRenderer::Classify(ClassificationFunction::JenksNaturalBreaks)),
    ("JE", TagRenderer::Classify(ClassificationFunction::JenksNaturalBreaks)),
    ("NA", TagRenderer::Classify(ClassificationFunction::JenksNaturalBreaks)),
    ("E", TagRenderer::Classify(ClassificationFunction::EqualInterval)),
    ("S", TagRenderer::Classify(ClassificationFunction::StandardDeviation)),
    ("Q", TagRenderer::Classify(ClassificationFunction::Quantile)),
];

/// Parse a style tag. Returns `None` when the renderer prefix is not
/// recognized.
///
/// Classification renderers need exactly `<renderer>.<field>`; `OLS` takes
/// the second segment whatever follows it. Trailing empty segments are
/// ignored and segments are taken verbatim, without trimming.
pub fn parse_style_tag(tag: &str) -> Option<StyleTag> {
    let mut parts: Vec<&str> = tag.split('.').collect();
    while parts.last().is_some_and(|s| s.is_empty()) {
        parts.pop();
    }
    let prefix = parts.first()?.to_uppercase();
    if prefix.is_empty() {
        return None;
    }

    let renderer = PREFIXES
        .iter()
        .find(|(p, _)| prefix.starts_with(p))
        .map(|(_, r)| *r)?;

    let field = match renderer {
        TagRenderer::Lisa => None,
        TagRenderer::Ols => parts.get(1).map(|s| s.to_string()),
        TagRenderer::Classify(_) if parts.len() == 2 => Some(parts[1].to_string()),
        TagRenderer::Classify(_) => None,
    };
    let field = field.filter(|f| !f.is_empty());

    Some(StyleTag { renderer, field })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ClassificationFunction as CF;

    fn renderer(tag: &str) -> Option<TagRenderer> {
        parse_style_tag(tag).map(|t| t.renderer)
    }

    #[test]
    fn classification_prefixes() {
        assert_eq!(renderer("Quantile.density"), Some(TagRenderer::Classify(CF::Quantile)));
        assert_eq!(renderer("EqualInterval.pop"), Some(TagRenderer::Classify(CF::EqualInterval)));
        assert_eq!(renderer("StdDev.pop"), Some(TagRenderer::Classify(CF::StandardDeviation)));
        assert_eq!(renderer("jenks.pop"), Some(TagRenderer::Classify(CF::JenksNaturalBreaks)));
        assert_eq!(renderer("ClassBreaks.pop"), Some(TagRenderer::Classify(CF::JenksNaturalBreaks)));
        assert_eq!(renderer("Natural.pop"), Some(TagRenderer::Classify(CF::JenksNaturalBreaks)));
    }

    #[test]
    fn lisa_and_ols() {
        let lisa = parse_style_tag("LISA").unwrap();
        assert_eq!(lisa.renderer, TagRenderer::Lisa);
        assert_eq!(lisa.field, None);

        let ols = parse_style_tag("ols.StdResid.extra").unwrap();
        assert_eq!(ols.renderer, TagRenderer::Ols);
        assert_eq!(ols.field.as_deref(), Some("StdResid"));
    }

    #[test]
    fn field_extraction() {
        let tag = parse_style_tag("Q.density").unwrap();
        assert_eq!(tag.field.as_deref(), Some("density"));
        assert_eq!(parse_style_tag("Q").unwrap().field, None);
        assert_eq!(parse_style_tag("Q.a.b").unwrap().field, None);
        assert_eq!(parse_style_tag("Q.").unwrap().field, None);
    }

    #[test]
    fn trailing_dots_are_dropped() {
        let tag = parse_style_tag("Q.density.").unwrap();
        assert_eq!(tag.renderer, TagRenderer::Classify(CF::Quantile));
        assert_eq!(tag.field.as_deref(), Some("density"));
        assert_eq!(parse_style_tag("Q.density..").unwrap().field.as_deref(), Some("density"));
        assert_eq!(parse_style_tag("Q.a..b").unwrap().field, None);
    }

    #[test]
    fn segments_are_not_trimmed() {
        assert_eq!(parse_style_tag(" Q.density"), None);
        assert_eq!(parse_style_tag("Q. density").unwrap().field.as_deref(), Some(" density"));
    }

    #[test]
    fn unrecognized_prefixes() {
        assert_eq!(parse_style_tag("Histogram.pop"), None);
        assert_eq!(parse_style_tag(""), None);
        assert_eq!(parse_style_tag(".pop"), None);
    }
}
