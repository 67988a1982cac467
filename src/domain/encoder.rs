//! Label encoders and the categorical resolution policy.
//!
//! A label encoder is fitted during training and shipped as an artifact; this
//! crate never builds one from data. Codes follow the fitted class order:
//! the code of a category is its position in the sorted class list.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Category name that unseen values collapse into when the encoder knows it.
pub const OTHERS_CATEGORY: &str = "Others";

/// Errors raised while constructing label encoders.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncoderError {
    #[error("encoder for {field} has no known categories")]
    Empty { field: String },

    #[error("encoder for {field} lists category {category:?} more than once")]
    DuplicateCategory { field: String, category: String },

    #[error("encoder for {field} is missing from the encoders artifact")]
    MissingField { field: String },

    #[error("encoder for {field} lists {category:?} out of sorted order")]
    Unsorted { field: String, category: String },
}

/// The seven categorical inputs, in feature-vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoricalField {
    Gender,
    Ethnicity,
    Jaundice,
    AutismSelfReport,
    CountryOfResidence,
    UsedAppBefore,
    Relation,
}

impl CategoricalField {
    /// All fields in the order they occupy in the feature vector.
    pub const ALL: [CategoricalField; 7] = [
        Self::Gender,
        Self::Ethnicity,
        Self::Jaundice,
        Self::AutismSelfReport,
        Self::CountryOfResidence,
        Self::UsedAppBefore,
        Self::Relation,
    ];

    /// Key of this field in the encoders artifact.
    ///
    /// The spellings (`austim`, `contry_of_res`) come from the training data
    /// columns and must not be corrected.
    #[must_use]
    pub fn artifact_key(&self) -> &'static str {
        match self {
            Self::Gender => "gender",
            Self::Ethnicity => "ethnicity",
            Self::Jaundice => "jaundice",
            Self::AutismSelfReport => "austim",
            Self::CountryOfResidence => "contry_of_res",
            Self::UsedAppBefore => "used_app_before",
            Self::Relation => "relation",
        }
    }

    /// Human-readable form label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gender => "Gender",
            Self::Ethnicity => "Ethnicity",
            Self::Jaundice => "Jaundice (at birth)",
            Self::AutismSelfReport => "Self-reported Autism",
            Self::CountryOfResidence => "Country of Residence",
            Self::UsedAppBefore => "Used Autism App Before?",
            Self::Relation => "Relation to Person",
        }
    }

    /// Position of this field among the categorical fields.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Gender => 0,
            Self::Ethnicity => 1,
            Self::Jaundice => 2,
            Self::AutismSelfReport => 3,
            Self::CountryOfResidence => 4,
            Self::UsedAppBefore => 5,
            Self::Relation => 6,
        }
    }

    /// Look a field up by its artifact key.
    #[must_use]
    pub fn from_artifact_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.artifact_key() == key)
    }
}

impl std::fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.artifact_key())
    }
}

/// Why an unseen value landed in the bucket it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackReason {
    /// The encoder has an `"Others"` category.
    Others,
    /// No `"Others"` category; the first known category was used.
    FirstCategory,
}

/// Outcome of resolving a raw categorical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    /// The value is a known category.
    Known(u32),
    /// The value was unseen and mapped to a substitute bucket.
    Fallback { code: u32, reason: FallbackReason },
}

impl Encoding {
    /// The integer code fed to the classifier.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::Known(code) | Self::Fallback { code, .. } => *code,
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// A fitted label encoder: non-empty, duplicate-free, sorted.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
    codes: HashMap<String, u32>,
}

impl LabelEncoder {
    /// Build an encoder from its fitted class list.
    ///
    /// The list must be in the sorted order a fitted encoder keeps, since
    /// codes are assigned by position.
    ///
    /// # Errors
    /// Returns `EncoderError` if the list is empty, contains duplicates, or
    /// is not sorted.
    pub fn new(field: CategoricalField, classes: Vec<String>) -> Result<Self, EncoderError> {
        if classes.is_empty() {
            return Err(EncoderError::Empty {
                field: field.artifact_key().to_string(),
            });
        }

        let mut codes = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if codes.insert(class.clone(), code as u32).is_some() {
                return Err(EncoderError::DuplicateCategory {
                    field: field.artifact_key().to_string(),
                    category: class.clone(),
                });
            }
        }

        if let Some(pair) = classes.windows(2).find(|pair| pair[0] > pair[1]) {
            return Err(EncoderError::Unsorted {
                field: field.artifact_key().to_string(),
                category: pair[1].clone(),
            });
        }

        Ok(Self { classes, codes })
    }

    /// Known categories in code order.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Code of a known category.
    #[must_use]
    pub fn code(&self, category: &str) -> Option<u32> {
        self.codes.get(category).copied()
    }

    /// Resolve a raw value, never failing.
    ///
    /// Known values map to their own code. Unseen values go to `"Others"` when
    /// the encoder has it, otherwise to the first known category.
    #[must_use]
    pub fn resolve(&self, value: &str) -> Encoding {
        if let Some(code) = self.code(value) {
            return Encoding::Known(code);
        }
        if let Some(code) = self.code(OTHERS_CATEGORY) {
            return Encoding::Fallback {
                code,
                reason: FallbackReason::Others,
            };
        }
        // Non-empty by construction, and the first class always has code 0.
        Encoding::Fallback {
            code: 0,
            reason: FallbackReason::FirstCategory,
        }
    }
}

/// One encoder per categorical field.
#[derive(Debug, Clone)]
pub struct EncoderSet {
    encoders: Vec<LabelEncoder>,
}

impl EncoderSet {
    /// Build the set from per-field class lists.
    ///
    /// # Errors
    /// Returns `EncoderError::MissingField` if any field lacks an encoder, or
    /// the construction error of an invalid encoder.
    pub fn from_classes(
        mut classes: HashMap<CategoricalField, Vec<String>>,
    ) -> Result<Self, EncoderError> {
        let mut encoders = Vec::with_capacity(CategoricalField::ALL.len());
        for field in CategoricalField::ALL {
            let list = classes.remove(&field).ok_or_else(|| EncoderError::MissingField {
                field: field.artifact_key().to_string(),
            })?;
            encoders.push(LabelEncoder::new(field, list)?);
        }
        Ok(Self { encoders })
    }

    #[must_use]
    pub fn get(&self, field: CategoricalField) -> &LabelEncoder {
        &self.encoders[field.index()]
    }

    /// Resolve a value for the given field.
    #[must_use]
    pub fn resolve(&self, field: CategoricalField, value: &str) -> Encoding {
        self.get(field).resolve(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encoder(classes: &[&str]) -> LabelEncoder {
        LabelEncoder::new(
            CategoricalField::Ethnicity,
            classes.iter().map(|c| c.to_string()).collect(),
        )
        .expect("valid encoder")
    }

    #[test]
    fn test_known_value_resolves_to_its_code() {
        let enc = encoder(&["Asian", "Black", "Others", "White-European"]);
        assert_eq!(enc.resolve("Black"), Encoding::Known(1));
        assert_eq!(enc.resolve("White-European"), Encoding::Known(3));
    }

    #[test]
    fn test_known_others_is_not_a_fallback() {
        let enc = encoder(&["Asian", "Others"]);
        assert_eq!(enc.resolve("Others"), Encoding::Known(1));
    }

    #[test]
    fn test_unknown_value_uses_others_bucket() {
        let enc = encoder(&["Asian", "Black", "Others", "White-European"]);
        assert_eq!(
            enc.resolve("Mixed"),
            Encoding::Fallback {
                code: 2,
                reason: FallbackReason::Others
            }
        );
    }

    #[test]
    fn test_unknown_value_without_others_uses_first_category() {
        let enc = encoder(&["Afghanistan", "Brazil", "India"]);
        let resolved = enc.resolve("Atlantis");
        assert_eq!(resolved.code(), 0);
        assert_eq!(
            resolved,
            Encoding::Fallback {
                code: 0,
                reason: FallbackReason::FirstCategory
            }
        );
    }

    #[test]
    fn test_matching_is_exact() {
        let enc = encoder(&["no", "yes"]);
        assert!(enc.resolve("Yes").is_fallback());
        assert!(enc.resolve("yes ").is_fallback());
    }

    #[test]
    fn test_empty_encoder_rejected() {
        let err = LabelEncoder::new(CategoricalField::Gender, vec![]).unwrap_err();
        assert_eq!(
            err,
            EncoderError::Empty {
                field: "gender".into()
            }
        );
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let err = LabelEncoder::new(
            CategoricalField::Relation,
            vec!["Self".into(), "Others".into(), "Self".into()],
        )
        .unwrap_err();
        assert!(matches!(err, EncoderError::DuplicateCategory { .. }));
    }

    #[test]
    fn test_unsorted_classes_rejected() {
        let err = LabelEncoder::new(
            CategoricalField::CountryOfResidence,
            vec!["India".into(), "Brazil".into(), "Canada".into()],
        )
        .unwrap_err();
        assert_eq!(
            err,
            EncoderError::Unsorted {
                field: "contry_of_res".into(),
                category: "Brazil".into()
            }
        );
    }

    #[test]
    fn test_encoder_set_requires_every_field() {
        let mut classes = HashMap::new();
        for field in CategoricalField::ALL {
            if field != CategoricalField::Relation {
                classes.insert(field, vec!["a".to_string()]);
            }
        }
        let err = EncoderSet::from_classes(classes).unwrap_err();
        assert_eq!(
            err,
            EncoderError::MissingField {
                field: "relation".into()
            }
        );
    }

    #[test]
    fn test_artifact_keys_round_trip() {
        for field in CategoricalField::ALL {
            assert_eq!(CategoricalField::from_artifact_key(field.artifact_key()), Some(field));
        }
        assert_eq!(CategoricalField::from_artifact_key("country"), None);
    }

    proptest! {
        #[test]
        fn prop_known_categories_resolve_to_own_code(
            classes in prop::collection::btree_set("[a-zA-Z ]{1,12}", 1..20)
        ) {
            let classes: Vec<String> = classes.into_iter().collect();
            let enc = LabelEncoder::new(CategoricalField::Gender, classes.clone()).unwrap();
            for (i, class) in classes.iter().enumerate() {
                prop_assert_eq!(enc.resolve(class), Encoding::Known(i as u32));
            }
        }

        #[test]
        fn prop_unknown_categories_never_fail(
            classes in prop::collection::btree_set("[a-z]{1,8}", 1..10),
            value in "[0-9]{1,6}",
        ) {
            let classes: Vec<String> = classes.into_iter().collect();
            let enc = LabelEncoder::new(CategoricalField::Gender, classes).unwrap();
            // Digits never collide with the lowercase classes.
            let resolved = enc.resolve(&value);
            prop_assert_eq!(
                resolved,
                Encoding::Fallback { code: 0, reason: FallbackReason::FirstCategory }
            );
        }
    }
}
