use lazy_static::lazy_static;
use regex::Regex;
use std::{borrow::Cow, convert::TryFrom, fmt};
use thiserror::Error as ThisError;
use urlencoding::encode;

const URL_RE_STRING: &str = r"https?://\S+|www\.\S+";
const HASHTAG_RE_STRING: &str = r"#(?P<tag>\w+)";
const MENTION_RE_STRING: &str = r"@(?P<user>\w+)";

#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefError {
    #[error("Does not match as {ref_type}: {input}")]
    BadFormat {
        ref_type: &'static str,
        input: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UrlRef(String);

impl UrlRef {
    // From string that starts with http or www.
    pub fn from_string(string: String) -> Result<Self, RefError> {
        if !Self::is_match(string.as_str()) {
            Err(RefError::BadFormat {
                ref_type: "Url",
                input: string,
            })
        } else {
            Ok(Self(string))
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn single_regex() -> &'static Regex {
        lazy_static! {
            static ref RE: Regex = anchored(URL_RE_STRING);
        }
        &*RE
    }

    pub fn multi_regex() -> &'static Regex {
        lazy_static! {
            static ref RE: Regex = Regex::new(URL_RE_STRING).unwrap();
        }
        &*RE
    }

    pub fn is_match(string: &str) -> bool {
        let regex = Self::single_regex();
        regex.is_match(string)
    }

    /// Link target for the url as typed. Scheme-less `www.` urls get `https://`
    /// here only, the typed text is left alone.
    pub fn href(&self) -> Cow<'_, str> {
        let url = self.as_str();
        if url.starts_with("http") {
            Cow::Borrowed(url)
        } else {
            Cow::Owned(format!("https://{}", url))
        }
    }

    pub fn to_page_url(&self) -> String {
        self.href().into_owned()
    }
}

impl TryFrom<String> for UrlRef {
    type Error = RefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UrlRef::from_string(value)
    }
}

impl fmt::Display for UrlRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HashtagRef(String);

impl HashtagRef {
    // From string that starts with #
    pub fn from_string(string: String) -> Result<Self, RefError> {
        if !Self::is_match(string.as_str()) {
            Err(RefError::BadFormat {
                ref_type: "Hashtag",
                input: string,
            })
        } else {
            Ok(Self(string))
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The tag without its leading `#`.
    pub fn tag(&self) -> &str {
        &self.0[1..]
    }

    pub fn single_regex() -> &'static Regex {
        lazy_static! {
            static ref RE: Regex = anchored(HASHTAG_RE_STRING);
        }
        &*RE
    }

    pub fn multi_regex() -> &'static Regex {
        lazy_static! {
            static ref RE: Regex = Regex::new(HASHTAG_RE_STRING).unwrap();
        }
        &*RE
    }

    pub fn is_match(string: &str) -> bool {
        let regex = Self::single_regex();
        regex.is_match(string)
    }

    pub fn to_page_url(&self) -> String {
        format!("/hashtag/{}", encode(self.tag()))
    }
}

impl TryFrom<String> for HashtagRef {
    type Error = RefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        HashtagRef::from_string(value)
    }
}

impl fmt::Display for HashtagRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MentionRef(String);

impl MentionRef {
    // From string that starts with @
    pub fn from_string(string: String) -> Result<Self, RefError> {
        if !Self::is_match(string.as_str()) {
            Err(RefError::BadFormat {
                ref_type: "Mention",
                input: string,
            })
        } else {
            Ok(Self(string))
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The username without its leading `@`.
    pub fn username(&self) -> &str {
        &self.0[1..]
    }

    pub fn single_regex() -> &'static Regex {
        lazy_static! {
            static ref RE: Regex = anchored(MENTION_RE_STRING);
        }
        &*RE
    }

    pub fn multi_regex() -> &'static Regex {
        lazy_static! {
            static ref RE: Regex = Regex::new(MENTION_RE_STRING).unwrap();
        }
        &*RE
    }

    pub fn is_match(string: &str) -> bool {
        let regex = Self::single_regex();
        regex.is_match(string)
    }

    pub fn to_page_url(&self) -> String {
        format!("/profile/{}", encode(self.username()))
    }
}

impl TryFrom<String> for MentionRef {
    type Error = RefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MentionRef::from_string(value)
    }
}

impl fmt::Display for MentionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LinkRef {
    Url(UrlRef),
    Hashtag(HashtagRef),
    Mention(MentionRef),
}

impl LinkRef {
    pub fn from_string(value: String) -> Result<Self, RefError> {
        let v = value.as_str();
        if UrlRef::is_match(v) {
            Ok(LinkRef::Url(value.try_into()?))
        } else if HashtagRef::is_match(v) {
            Ok(LinkRef::Hashtag(value.try_into()?))
        } else if MentionRef::is_match(v) {
            Ok(LinkRef::Mention(value.try_into()?))
        } else {
            Err(RefError::BadFormat {
                ref_type: "Link",
                input: value,
            })
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LinkRef::Url(url) => url.as_str(),
            LinkRef::Hashtag(hashtag) => hashtag.as_str(),
            LinkRef::Mention(mention) => mention.as_str(),
        }
    }

    pub fn to_page_url(&self) -> String {
        match self {
            LinkRef::Url(url_ref) => url_ref.to_page_url(),
            LinkRef::Hashtag(hashtag_ref) => hashtag_ref.to_page_url(),
            LinkRef::Mention(mention_ref) => mention_ref.to_page_url(),
        }
    }
}

impl TryFrom<String> for LinkRef {
    type Error = RefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LinkRef::from_string(value)
    }
}

impl fmt::Display for LinkRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hashtags and mentions in one pattern, so a single pass over text finds both.
pub fn sigil_regex() -> &'static Regex {
    lazy_static! {
        static ref RE: Regex = combine_regexes(vec![
            HashtagRef::multi_regex(),
            MentionRef::multi_regex(),
        ]);
    }
    &*RE
}

fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!("^(?:{})$", pattern)).unwrap()
}

fn combine_regexes(regexes: Vec<&Regex>) -> Regex {
    let mut string = String::new();
    string.push('(');
    string.push_str(
        regexes
            .into_iter()
            .map(|regex| regex.as_str())
            .collect::<Vec<&str>>()
            .join("|")
            .as_str(),
    );
    string.push(')');
    Regex::new(&string).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(UrlRef::is_match("https://example.com/a?b=1"));
        assert!(UrlRef::is_match("http://example.com"));
        assert!(UrlRef::is_match("www.example.com"));
        assert!(!UrlRef::is_match("example.com"));
        assert!(!UrlRef::is_match("see https://example.com"));
    }

    #[test]
    fn test_url_href() {
        let url = UrlRef::from_string("www.example.com".to_string()).unwrap();
        assert_eq!(url.href(), "https://www.example.com");
        assert_eq!(url.as_str(), "www.example.com");

        let url = UrlRef::from_string("http://example.com".to_string()).unwrap();
        assert_eq!(url.href(), "http://example.com");
    }

    #[test]
    fn test_is_hashtag() {
        assert!(HashtagRef::is_match("#rust"));
        assert!(HashtagRef::is_match("#snake_case_2"));
        assert!(!HashtagRef::is_match("#"));
        assert!(!HashtagRef::is_match("#rust."));
        assert!(!HashtagRef::is_match("rust"));
    }

    #[test]
    fn test_hashtag_page_url() {
        let hashtag = HashtagRef::from_string("#café".to_string()).unwrap();
        assert_eq!(hashtag.tag(), "café");
        assert_eq!(hashtag.to_page_url(), "/hashtag/caf%C3%A9");
    }

    #[test]
    fn test_mention_page_url() {
        let mention = MentionRef::from_string("@bob".to_string()).unwrap();
        assert_eq!(mention.username(), "bob");
        assert_eq!(mention.to_page_url(), "/profile/bob");
    }

    #[test]
    fn test_link_ref() {
        assert!(matches!(
            LinkRef::from_string("www.example.com".to_string()),
            Ok(LinkRef::Url(_))
        ));
        assert!(matches!(
            LinkRef::from_string("#world".to_string()),
            Ok(LinkRef::Hashtag(_))
        ));
        assert!(matches!(
            LinkRef::from_string("@bob".to_string()),
            Ok(LinkRef::Mention(_))
        ));
        assert_eq!(
            LinkRef::from_string("plain".to_string()),
            Err(RefError::BadFormat {
                ref_type: "Link",
                input: "plain".to_string(),
            })
        );
    }

    #[test]
    fn test_sigil_regex() {
        let found: Vec<&str> = sigil_regex()
            .find_iter("hi @bob, #rust! a#b @ #")
            .map(|mat| mat.as_str())
            .collect();
        assert_eq!(found, vec!["@bob", "#rust", "#b"]);
    }
}
