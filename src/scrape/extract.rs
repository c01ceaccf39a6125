// src/scrape/extract.rs
//! Open Graph preview extraction over html5ever's token stream.
//!
//! Only the tokenizer runs; no tree is built. The sink switches the tokenizer
//! into the matching raw-text state after `<script>`, `<style>` and friends so
//! markup-looking text inside them is not read as tags.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

use crate::scrape::types::PreviewMetadata;

pub const DESCRIPTION_PROPERTY: &str = "og:description";
pub const IMAGE_PROPERTY: &str = "og:image";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PreviewField {
    Description,
    Image,
}

#[derive(Default)]
struct PreviewSink {
    out: PreviewMetadata,
}

impl PreviewSink {
    fn record(&mut self, tag: &Tag) {
        // Classification is per element; nothing carries over to the next one.
        let field = tag
            .attrs
            .iter()
            .filter(|a| &*a.name.local == "property")
            .find_map(|a| match &*a.value {
                DESCRIPTION_PROPERTY => Some(PreviewField::Description),
                IMAGE_PROPERTY => Some(PreviewField::Image),
                _ => None,
            });
        let Some(field) = field else {
            return;
        };

        for attr in tag.attrs.iter().filter(|a| &*a.name.local == "content") {
            match field {
                PreviewField::Description => self.out.description = attr.value.to_string(),
                PreviewField::Image => self.out.featured_image = attr.value.to_string(),
            }
        }
    }
}

/// Tokenizer state for the content of elements that hold no markup.
fn content_state(name: &str) -> Option<TokenSinkResult<()>> {
    let kind = match name {
        "script" => RawKind::ScriptData,
        "title" | "textarea" => RawKind::Rcdata,
        "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" => RawKind::Rawtext,
        "plaintext" => return Some(TokenSinkResult::Plaintext),
        _ => return None,
    };
    Some(TokenSinkResult::RawData(kind))
}

impl TokenSink for PreviewSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let Token::TagToken(tag) = token else {
            return TokenSinkResult::Continue;
        };
        if tag.kind != TagKind::StartTag {
            return TokenSinkResult::Continue;
        }
        if &*tag.name == "meta" {
            self.record(&tag);
            return TokenSinkResult::Continue;
        }
        content_state(&tag.name).unwrap_or(TokenSinkResult::Continue)
    }
}

/// Single forward pass over `html`; later `<meta>` elements overwrite earlier ones.
/// Documents without matching elements (including malformed or empty input)
/// yield an empty `PreviewMetadata`.
pub fn extract_preview(html: &str) -> PreviewMetadata {
    let mut input = BufferQueue::new();
    input.push_back(StrTendril::from_slice(html));

    let mut tokenizer = Tokenizer::new(PreviewSink::default(), TokenizerOpts::default());
    // The sink never hands back a script to run, so feed always drains the queue.
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();

    tokenizer.sink.out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Test &amp; page</title>
  <meta charset="utf-8">
  <meta name="description" content="plain description">
  <meta property="og:description" content="A short summary &quot;quoted&quot;">
  <meta property="og:image" content="https://cdn.example.test/a.jpg" />
  <meta property="og:image:width" content="1200">
</head>
<body><p>Body</p></body>
</html>"#;

    #[test]
    fn extracts_description_and_image() {
        let m = extract_preview(ARTICLE);
        assert_eq!(m.description, r#"A short summary "quoted""#);
        assert_eq!(m.featured_image, "https://cdn.example.test/a.jpg");
        assert!(m.is_complete());
    }

    #[test]
    fn last_matching_element_wins() {
        let html = r#"<meta property="og:description" content="A">
<meta property="og:description" content="B">"#;
        assert_eq!(extract_preview(html).description, "B");
    }

    #[test]
    fn missing_content_leaves_field_empty() {
        let html = r#"<meta property="og:description"><meta property="og:image" content="x.png">"#;
        let m = extract_preview(html);
        assert_eq!(m.description, "");
        assert_eq!(m.featured_image, "x.png");
        assert!(!m.is_complete());
    }

    #[test]
    fn content_before_property_still_counts() {
        let html = r#"<meta content="img.png" property="og:image">"#;
        assert_eq!(extract_preview(html).featured_image, "img.png");
    }

    #[test]
    fn flags_do_not_carry_to_next_element() {
        let html = r#"<meta property="og:image" content="one.png"><meta content="stray">"#;
        let m = extract_preview(html);
        assert_eq!(m.featured_image, "one.png");
        assert_eq!(m.description, "");
    }

    #[test]
    fn property_value_is_case_sensitive_but_names_are_not() {
        let html = r#"<META PROPERTY="og:description" CONTENT="yes"><meta property="OG:IMAGE" content="no">"#;
        let m = extract_preview(html);
        assert_eq!(m.description, "yes");
        assert_eq!(m.featured_image, "");
    }

    #[test]
    fn unquoted_and_single_quoted_values() {
        let html = "<meta property=og:image content='a.png'><meta content=b property=og:description>";
        let m = extract_preview(html);
        assert_eq!(m.featured_image, "a.png");
        assert_eq!(m.description, "b");
    }

    #[test]
    fn meta_inside_script_or_comment_is_ignored() {
        let html = r#"<!-- <meta property="og:image" content="c.png"> -->
<script>var s = '<meta property="og:description" content="js">';</script>
<style>/* <meta property="og:image" content="css.png"> */</style>
<title><meta property="og:image" content="title.png"></title>"#;
        assert_eq!(extract_preview(html), PreviewMetadata::default());
    }

    #[test]
    fn abruptly_closed_comments_do_not_hide_later_tags() {
        let tail = r#"<meta property="og:description" content="D"><meta property="og:image" content="I.png"><!-- trailing -->"#;
        for opener in ["<!-->", "<!--->", "<!-- x --!>"] {
            let m = extract_preview(&format!("{opener}{tail}"));
            assert_eq!(m.description, "D", "after {opener}");
            assert_eq!(m.featured_image, "I.png", "after {opener}");
        }
    }

    #[test]
    fn tags_after_script_end_are_read() {
        let html = r#"<script>if (a < b) { x = "</scrip"; }</script><meta property="og:image" content="after.png">"#;
        assert_eq!(extract_preview(html).featured_image, "after.png");
    }

    #[test]
    fn empty_and_malformed_documents_yield_defaults() {
        assert_eq!(extract_preview(""), PreviewMetadata::default());
        assert_eq!(
            extract_preview("<<<>>> <meta property=\"og:image\" content=\"trunc"),
            PreviewMetadata::default()
        );
        assert_eq!(extract_preview("not markup at all"), PreviewMetadata::default());
    }

    #[test]
    fn extraction_is_idempotent() {
        assert_eq!(extract_preview(ARTICLE), extract_preview(ARTICLE));
    }
}
