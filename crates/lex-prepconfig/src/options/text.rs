use serde::{Deserialize, Serialize};

use super::categorical::TopN;
use super::{FeatureSet, FeatureValue, flag, is_false};

option_enum! {
    TextMissing {
        None => "none",
        Drop => "drop",
        EmptyString => "empty_string",
        Constant => "constant",
    }
}

option_enum! {
    /// `None` keeps the raw text.
    Vectorization {
        None => "none",
        Tfidf => "tfidf",
        Count => "count",
        Binary => "binary",
        Hashing => "hashing",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<TextMissing>,
    #[serde(skip_serializing_if = "is_false")]
    pub lowercase: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub remove_punctuation: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub tokenize: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub remove_stopwords: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub stemming: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub lemmatization: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vectorization: Option<Vectorization>,
    /// Vocabulary cap for the vectorizer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_features: Option<TopN>,
    /// Drop the raw text column once vectorized.
    #[serde(skip_serializing_if = "is_false")]
    pub drop_original: bool,
}

impl FeatureSet for TextOptions {
    fn feature(&self, feature: &str) -> Option<FeatureValue> {
        match feature {
            "missing" => self.missing.map(Into::into),
            "lowercase" => flag(self.lowercase),
            "remove_punctuation" => flag(self.remove_punctuation),
            "tokenize" => flag(self.tokenize),
            "remove_stopwords" => flag(self.remove_stopwords),
            "stemming" => flag(self.stemming),
            "lemmatization" => flag(self.lemmatization),
            "vectorization" => self.vectorization.map(Into::into),
            "max_features" => self.max_features.map(|t| FeatureValue::TopN { n: t.n }),
            "drop_original" => flag(self.drop_original),
            _ => None,
        }
    }
}
