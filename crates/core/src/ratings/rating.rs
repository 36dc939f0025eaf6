//! Rating records and input validation.

use crate::catalog::ItemId;
use crate::config;
use crate::error::{RecommendError, Result};
use serde::{Deserialize, Serialize};

/// A validated user-item rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: String,
    pub item_id: ItemId,
    /// Integer score in `MIN_RATING..=MAX_RATING`.
    pub score: u8,
}

impl Rating {
    /// Validates the score, then the user id, and builds a rating.
    pub fn new(user_id: &str, item_id: ItemId, score: i64) -> Result<Self> {
        let score = validate_score(score)?;
        Ok(Self {
            user_id: validate_user(user_id)?,
            item_id,
            score,
        })
    }
}

/// Score as it appears in an external table: a number or numeric text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawScore {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawScore {
    /// Converts to a validated integer score.
    pub fn parse(&self) -> Result<u8> {
        match self {
            RawScore::Int(n) => validate_score(*n),
            RawScore::Float(f) if f.fract() == 0.0 && f.is_finite() => validate_score(*f as i64),
            RawScore::Float(f) => Err(RecommendError::InvalidRating(f.to_string())),
            RawScore::Text(s) => parse_score(s),
        }
    }
}

/// A loosely-typed ratings row supplied by an external loader.
///
/// The item may be referenced by id or by catalog name; the facade resolves
/// names before rows reach the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRating {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub item_id: Option<ItemId>,
    #[serde(default, alias = "place_name")]
    pub item_name: Option<String>,
    #[serde(default, alias = "rating")]
    pub score: Option<RawScore>,
}

impl TryFrom<&RawRating> for Rating {
    type Error = RecommendError;

    fn try_from(row: &RawRating) -> Result<Self> {
        let user_id = row
            .user_id
            .as_deref()
            .ok_or_else(|| RecommendError::MalformedRow("missing user_id".into()))?;
        let item_id = row
            .item_id
            .ok_or_else(|| RecommendError::MalformedRow("missing item_id".into()))?;
        let score = row
            .score
            .as_ref()
            .ok_or_else(|| RecommendError::MalformedRow("missing score".into()))?
            .parse()?;
        Ok(Self {
            user_id: validate_user(user_id)?,
            item_id,
            score,
        })
    }
}

/// Parses score text such as `"4"` or `" 5 "`.
pub fn parse_score(text: &str) -> Result<u8> {
    let n: i64 = text
        .trim()
        .parse()
        .map_err(|_| RecommendError::InvalidRating(text.to_string()))?;
    validate_score(n)
}

/// Checks that a score lies within the accepted range.
pub fn validate_score(score: i64) -> Result<u8> {
    if (config::MIN_RATING as i64..=config::MAX_RATING as i64).contains(&score) {
        Ok(score as u8)
    } else {
        Err(RecommendError::InvalidRating(score.to_string()))
    }
}

/// Trims a user id and rejects blank or oversized ids.
pub fn validate_user(user_id: &str) -> Result<String> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(RecommendError::InvalidUser("user id must not be blank".into()));
    }
    if trimmed.len() > config::MAX_USER_ID_LEN {
        return Err(RecommendError::InvalidUser(format!(
            "user id exceeds {} bytes",
            config::MAX_USER_ID_LEN
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_score_bounds() {
        assert_eq!(validate_score(1).unwrap(), 1);
        assert_eq!(validate_score(5).unwrap(), 5);
        assert!(matches!(
            validate_score(0),
            Err(RecommendError::InvalidRating(_))
        ));
        assert!(matches!(
            validate_score(6),
            Err(RecommendError::InvalidRating(_))
        ));
        assert!(validate_score(-3).is_err());
    }

    #[test]
    fn test_parse_score_text() {
        assert_eq!(parse_score(" 4 ").unwrap(), 4);
        assert!(matches!(
            parse_score("four"),
            Err(RecommendError::InvalidRating(_))
        ));
        assert!(parse_score("").is_err());
        assert!(parse_score("4.5").is_err());
    }

    #[test]
    fn test_validate_user() {
        assert_eq!(validate_user("  u1 ").unwrap(), "u1");
        assert!(matches!(
            validate_user("   "),
            Err(RecommendError::InvalidUser(_))
        ));
        let long = "x".repeat(config::MAX_USER_ID_LEN + 1);
        assert!(validate_user(&long).is_err());
    }

    #[test]
    fn test_raw_score_variants() {
        assert_eq!(RawScore::Int(3).parse().unwrap(), 3);
        assert_eq!(RawScore::Float(4.0).parse().unwrap(), 4);
        assert!(RawScore::Float(4.5).parse().is_err());
        assert_eq!(RawScore::Text("2".into()).parse().unwrap(), 2);
    }

    #[test]
    fn test_raw_rating_conversion() {
        let row = RawRating {
            user_id: Some("u1".into()),
            item_id: Some(3),
            item_name: None,
            score: Some(RawScore::Text("5".into())),
        };
        let rating = Rating::try_from(&row).unwrap();
        assert_eq!(rating, Rating::new("u1", 3, 5).unwrap());

        let missing = RawRating {
            item_id: None,
            ..row.clone()
        };
        assert!(matches!(
            Rating::try_from(&missing),
            Err(RecommendError::MalformedRow(_))
        ));
    }
}
