//! Validated media type strings ("type/subtype" plus optional parameters).

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid media type: {0}")]
pub struct InvalidMediaType(pub String);

/// A syntactically valid media type such as `application/json` or
/// `text/plain; charset=utf-8`.
///
/// Type and subtype are normalised to lowercase (they match
/// case-insensitively on the wire); parameters keep their spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType(String);

/// RFC 2045 token characters: printable ASCII minus tspecials and space.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            (0x21..0x7f).contains(&b) && !b"()<>@,;:\\\"/[]?=".contains(&b)
        })
}

fn is_quoted_string(s: &str) -> bool {
    s.len() >= 2
        && s.starts_with('"')
        && s.ends_with('"')
        && s[1..s.len() - 1].bytes().all(|b| b != b'"' && b != b'\r' && b != b'\n')
}

impl MediaType {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `type/subtype` part without parameters.
    pub fn essence(&self) -> &str {
        match self.0.find(';') {
            Some(pos) => &self.0[..pos],
            None => &self.0,
        }
    }

    pub fn octet_stream() -> Self {
        Self("application/octet-stream".to_string())
    }
}

impl FromStr for MediaType {
    type Err = InvalidMediaType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = s.split(';');
        let essence = segments.next().unwrap_or("").trim();
        let (main, sub) = essence
            .split_once('/')
            .ok_or_else(|| InvalidMediaType(s.to_string()))?;
        if !is_token(main) || !is_token(sub) {
            return Err(InvalidMediaType(s.to_string()));
        }
        let mut canonical = format!("{}/{}", main.to_ascii_lowercase(), sub.to_ascii_lowercase());
        for param in segments {
            let param = param.trim();
            let (attr, value) = param
                .split_once('=')
                .ok_or_else(|| InvalidMediaType(s.to_string()))?;
            if !is_token(attr) || !(is_token(value) || is_quoted_string(value)) {
                return Err(InvalidMediaType(s.to_string()));
            }
            canonical.push_str("; ");
            canonical.push_str(attr);
            canonical.push('=');
            canonical.push_str(value);
        }
        Ok(Self(canonical))
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for MediaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MediaType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_types_parse() {
        let mt: MediaType = "application/json".parse().unwrap();
        assert_eq!(mt.as_str(), "application/json");
        assert_eq!(mt.essence(), "application/json");
    }

    #[test]
    fn type_and_subtype_lowercase() {
        let mt: MediaType = "Text/HTML".parse().unwrap();
        assert_eq!(mt.as_str(), "text/html");
    }

    #[test]
    fn parameters_survive() {
        let mt: MediaType = "text/plain; charset=utf-8".parse().unwrap();
        assert_eq!(mt.as_str(), "text/plain; charset=utf-8");
        assert_eq!(mt.essence(), "text/plain");
    }

    #[test]
    fn quoted_parameter_values_accepted() {
        let mt: MediaType = r#"multipart/mixed; boundary="a b c""#.parse().unwrap();
        assert_eq!(mt.essence(), "multipart/mixed");
    }

    #[test]
    fn malformed_rejected() {
        for bad in [
            "",
            "noslash",
            "/json",
            "application/",
            "appli cation/json",
            "application/json;",
            "text/plain; charset",
            "text/plain; =utf-8",
        ] {
            assert!(bad.parse::<MediaType>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn serde_round_trip_validates() {
        let mt: MediaType = "application/json".parse().unwrap();
        let json = serde_json::to_string(&mt).unwrap();
        assert_eq!(json, "\"application/json\"");
        let back: MediaType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mt);
        assert!(serde_json::from_str::<MediaType>("\"nonsense\"").is_err());
    }
}
