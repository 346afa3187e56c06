use crate::{Error, Result};
use cookie::{Cookie, ParseError};
use log::warn;

/// Parse a `document.cookie` style string into name/value pairs.
///
/// Fragments without `=` are skipped.
pub fn parse(s: &str) -> Result<Vec<Cookie<'static>>> {
    let mut cookies = Vec::new();

    for cookie in Cookie::split_parse(s.trim().trim_end_matches(';')) {
        match cookie {
            Ok(x) => cookies.push(x.into_owned()),
            Err(ParseError::MissingPair) => warn!("skipping cookie fragment without '='"),
            Err(e) => {
                return Err(Error::Config(format!("could not parse cookies: {}", e)));
            }
        }
    }

    if cookies.is_empty() {
        return Err(Error::Config("cookie string is empty".to_owned()));
    }

    Ok(cookies)
}

/// Normalized `name=value; name=value` form for a `Cookie` header.
pub fn header_value(s: &str) -> Result<String> {
    Ok(parse(s)?
        .iter()
        .map(|x| format!("{}={}", x.name(), x.value()))
        .collect::<Vec<_>>()
        .join("; "))
}
