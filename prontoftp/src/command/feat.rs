//! # Feat
//!
//! Parser for the FEAT response, [RFC 2389](https://datatracker.ietf.org/doc/html/rfc2389#section-3.2).

use crate::types::{Features, FtpResult, Response};
use crate::FtpError;

/// Parses the FEAT reply into the supported [`Features`].
///
/// The reply has one of two shapes:
///
/// - no-features: `211 [SP] ...`
/// - features-list: `211-...`, one ` feature-label [[SP] description]` line
///   per feature, terminated by `211 END`
pub fn parse_features(response: &Response) -> FtpResult<Features> {
    let mut lines = response.message.lines();
    let first_line = lines
        .next()
        .ok_or_else(|| FtpError::BadResponse(response.message.clone()))?;
    debug!("Parsing features; first line: {first_line}");

    let mut features = Features::new();
    if first_line.starts_with("211-") {
        for line in lines {
            if line.starts_with("211 ") || line == "211" {
                break;
            }
            parse_feature(line, &mut features)?;
        }
        Ok(features)
    } else if first_line.starts_with("211 ") {
        debug!("Found `211` - no features available");
        Ok(features)
    } else {
        Err(FtpError::BadResponse(response.message.clone()))
    }
}

/// Parses a single feature line from the FEAT response.
///
/// The line MUST start with a space character (` `) and can have the following syntax:
///
/// - `feature-label` [[SP] ["description"]]
fn parse_feature(line: &str, features: &mut Features) -> FtpResult<()> {
    if !line.starts_with(' ') {
        error!("Feature response doesn't start with ` `");
        return Err(FtpError::BadResponse(line.to_string()));
    }

    let mut line = line.trim().split(' ');
    let Some(feature_name) = line.next() else {
        error!("Feature line is empty");
        return Err(FtpError::BadResponse(String::new()));
    };
    let feature_values = match line.collect::<Vec<&str>>().join(" ") {
        values if values.is_empty() => None,
        values => Some(values),
    };
    debug!("found supported feature: {feature_name}: {feature_values:?}");
    features.insert(feature_name.to_string(), feature_values);

    Ok(())
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_should_parse_no_features() {
        let response = Response::new(211, "211 No features available");
        let features = parse_features(&response).expect("failed to parse features");
        assert!(features.is_empty());
    }

    #[test]
    fn test_should_parse_features() {
        let response = Response::new(
            211,
            "211-Features:\n MLST size*;create;modify*;perm;media-type\n SIZE\n COMPRESSION\n211 END",
        );
        let features = parse_features(&response).expect("failed to parse features");
        assert_eq!(features.len(), 3);
        assert!(features.contains_key("MLST"));
        assert_eq!(
            features
                .get("MLST")
                .as_ref()
                .expect("no MLST")
                .as_deref()
                .expect("no value for MLST"),
            "size*;create;modify*;perm;media-type"
        );
        assert!(features.contains_key("SIZE"));
        assert_eq!(features.get("SIZE"), Some(&None));
        assert!(features.contains_key("COMPRESSION"));
        assert_eq!(features.get("COMPRESSION"), Some(&None));
    }

    #[test]
    fn test_should_not_parse_invalid_features() {
        let response = Response::new(211, "211-Features:\nInvalid feature line");
        let result = parse_features(&response);
        assert!(result.is_err(), "Expected error for invalid feature line");
        assert!(matches!(result.unwrap_err(), FtpError::BadResponse(_)));
    }
}
