use pulldown_cmark::{html, Event, LinkType, Tag};
use regex::Regex;
use urutte_ref::{sigil_regex, HashtagRef, LinkRef, MentionRef, UrlRef};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpanKind {
    Url,
    Hashtag,
    Mention,
    Text,
}

/// A classified slice of post content. Spans borrow from the text they were
/// cut from and live for one render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Span<'a> {
    Url(&'a str),
    Hashtag(&'a str),
    Mention(&'a str),
    Text(&'a str),
}

impl<'a> Span<'a> {
    pub fn kind(&self) -> SpanKind {
        match self {
            Span::Url(_) => SpanKind::Url,
            Span::Hashtag(_) => SpanKind::Hashtag,
            Span::Mention(_) => SpanKind::Mention,
            Span::Text(_) => SpanKind::Text,
        }
    }

    /// The exact substring of the content, sigil included.
    pub fn raw(&self) -> &'a str {
        match *self {
            Span::Url(raw) | Span::Hashtag(raw) | Span::Mention(raw) | Span::Text(raw) => raw,
        }
    }

    /// What gets shown. Never rewritten, so concatenating every span's display
    /// gives back the content.
    pub fn display(&self) -> &'a str {
        self.raw()
    }

    /// The tag or username after the sigil.
    pub fn target(&self) -> Option<&'a str> {
        match *self {
            Span::Hashtag(raw) | Span::Mention(raw) => Some(&raw[1..]),
            Span::Url(_) | Span::Text(_) => None,
        }
    }

    /// The typed reference behind an interactive span. Spans are cut by the
    /// same patterns the references check, so this is `Some` for every
    /// non-text span `spans` produces.
    pub fn link_ref(&self) -> Option<LinkRef> {
        match *self {
            Span::Url(raw) => UrlRef::from_string(raw.to_string())
                .ok()
                .map(LinkRef::Url),
            Span::Hashtag(raw) => HashtagRef::from_string(raw.to_string())
                .ok()
                .map(LinkRef::Hashtag),
            Span::Mention(raw) => MentionRef::from_string(raw.to_string())
                .ok()
                .map(LinkRef::Mention),
            Span::Text(_) => None,
        }
    }

    /// Urls link to themselves (`https://` added to scheme-less ones), hashtags
    /// and mentions to their in-app page.
    pub fn href(&self) -> Option<String> {
        self.link_ref().map(|link_ref| link_ref.to_page_url())
    }

    pub fn is_interactive(&self) -> bool {
        !matches!(self, Span::Text(_))
    }

    /// Interactive spans swallow the click so an enclosing clickable card does
    /// not also react to it. Missing handlers make the click a no-op.
    pub fn click(&self, handlers: &ClickHandlers<'_>, event: &mut ClickEvent) {
        match *self {
            Span::Hashtag(raw) => {
                event.stop_propagation();
                if let Some(on_hashtag_click) = &handlers.on_hashtag_click {
                    on_hashtag_click(&raw[1..]);
                }
            }
            Span::Mention(raw) => {
                event.stop_propagation();
                if let Some(on_mention_click) = &handlers.on_mention_click {
                    on_mention_click(&raw[1..]);
                }
            }
            Span::Url(_) => event.stop_propagation(),
            Span::Text(_) => {}
        }
    }
}

#[derive(Default)]
pub struct ClickHandlers<'h> {
    on_hashtag_click: Option<Box<dyn Fn(&str) + 'h>>,
    on_mention_click: Option<Box<dyn Fn(&str) + 'h>>,
}

impl<'h> ClickHandlers<'h> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_hashtag_click(mut self, callback: impl Fn(&str) + 'h) -> Self {
        self.on_hashtag_click = Some(Box::new(callback));
        self
    }

    pub fn on_mention_click(mut self, callback: impl Fn(&str) + 'h) -> Self {
        self.on_mention_click = Some(Box::new(callback));
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClickEvent {
    propagation_stopped: bool,
}

impl ClickEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

enum Piece<'a> {
    Matched(&'a str),
    Plain(&'a str),
}

// Like a capturing split: matches are kept as their own pieces, empty gaps are dropped.
fn split_keep<'a>(text: &'a str, regex: &Regex) -> Vec<Piece<'a>> {
    let mut pieces = Vec::new();
    let mut last_match_end = 0;
    for mat in regex.find_iter(text) {
        if mat.start() > last_match_end {
            pieces.push(Piece::Plain(&text[last_match_end..mat.start()]));
        }
        pieces.push(Piece::Matched(mat.as_str()));
        last_match_end = mat.end();
    }
    if last_match_end < text.len() {
        pieces.push(Piece::Plain(&text[last_match_end..]));
    }
    pieces
}

/// Urls are cut out first so a `#fragment` or `@` inside one stays part of the url.
pub fn spans(content: &str) -> impl Iterator<Item = Span<'_>> {
    split_keep(content, UrlRef::multi_regex())
        .into_iter()
        .flat_map(|piece| match piece {
            Piece::Matched(url) => vec![Span::Url(url)],
            Piece::Plain(text) => split_keep(text, sigil_regex())
                .into_iter()
                .map(|piece| match piece {
                    Piece::Matched(tag) if tag.starts_with('#') => Span::Hashtag(tag),
                    Piece::Matched(mention) => Span::Mention(mention),
                    Piece::Plain(text) => Span::Text(text),
                })
                .collect(),
        })
}

pub fn tokenize(content: &str) -> Vec<Span<'_>> {
    spans(content).collect()
}

/// Distinct hashtags in order of first appearance, without the `#`.
pub fn hashtags(content: &str) -> Vec<&str> {
    distinct_targets(content, SpanKind::Hashtag)
}

/// Distinct mentioned usernames in order of first appearance, without the `@`.
pub fn mentions(content: &str) -> Vec<&str> {
    distinct_targets(content, SpanKind::Mention)
}

fn distinct_targets(content: &str, kind: SpanKind) -> Vec<&str> {
    let mut targets: Vec<&str> = Vec::new();
    for span in spans(content).filter(|span| span.kind() == kind) {
        if let Some(target) = span.target() {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
    }
    targets
}

pub fn render(content: &str) -> impl Iterator<Item = Event<'_>> {
    spans(content).flat_map(|span| {
        let text = Event::Text(span.display().into());
        if !span.is_interactive() {
            return vec![text].into_iter();
        }

        let dest = span.href().unwrap_or_default();
        let link_tag = Tag::Link(LinkType::Inline, dest.into(), "".into());
        vec![Event::Start(link_tag.clone()), text, Event::End(link_tag)].into_iter()
    })
}

pub fn to_html(content: &str) -> String {
    let mut html_buf = String::new();
    html::push_html(&mut html_buf, render(content));
    html_buf
}
