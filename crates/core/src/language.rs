//! Languages a release can be tagged with.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! languages {
    ($($variant:ident, $name:literal;)+) => {
        /// A spoken language.
        ///
        /// There is no "unknown" member: a release with no detected language
        /// carries an empty set.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Language {
            $($variant,)+
        }

        impl Language {
            pub const ALL: &'static [Language] = &[$(Language::$variant,)+];

            pub fn name(self) -> &'static str {
                match self {
                    $(Language::$variant => $name,)+
                }
            }
        }
    };
}

languages! {
    English, "English";
    French, "French";
    Spanish, "Spanish";
    German, "German";
    Italian, "Italian";
    Danish, "Danish";
    Dutch, "Dutch";
    Japanese, "Japanese";
    Icelandic, "Icelandic";
    Chinese, "Chinese";
    Russian, "Russian";
    Polish, "Polish";
    Vietnamese, "Vietnamese";
    Swedish, "Swedish";
    Norwegian, "Norwegian";
    Finnish, "Finnish";
    Turkish, "Turkish";
    Portuguese, "Portuguese";
    Flemish, "Flemish";
    Greek, "Greek";
    Korean, "Korean";
    Hungarian, "Hungarian";
    Hebrew, "Hebrew";
    Lithuanian, "Lithuanian";
    Czech, "Czech";
    Hindi, "Hindi";
    Arabic, "Arabic";
    Thai, "Thai";
    Romanian, "Romanian";
    Ukrainian, "Ukrainian";
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
