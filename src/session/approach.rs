use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Conversational style selected per session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum TherapyApproach {
    #[default]
    Cbt,
    Psychoanalytic,
    Humanistic,
    Existential,
    Gestalt,
    Act,
    Positive,
    Schema,
    SolutionFocused,
    Narrative,
    FamilySystems,
    Dbt,
    /// Approach tag this client does not know about
    #[serde(other)]
    #[value(skip)]
    Other,
}

impl TherapyApproach {
    pub const ALL: [TherapyApproach; 12] = [
        Self::Cbt,
        Self::Psychoanalytic,
        Self::Humanistic,
        Self::Existential,
        Self::Gestalt,
        Self::Act,
        Self::Positive,
        Self::Schema,
        Self::SolutionFocused,
        Self::Narrative,
        Self::FamilySystems,
        Self::Dbt,
    ];

    /// Wire value used by the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cbt => "cbt",
            Self::Psychoanalytic => "psychoanalytic",
            Self::Humanistic => "humanistic",
            Self::Existential => "existential",
            Self::Gestalt => "gestalt",
            Self::Act => "act",
            Self::Positive => "positive",
            Self::Schema => "schema",
            Self::SolutionFocused => "solution_focused",
            Self::Narrative => "narrative",
            Self::FamilySystems => "family_systems",
            Self::Dbt => "dbt",
            Self::Other => "other",
        }
    }

    pub fn label(&self, language: Language) -> &'static str {
        match language {
            Language::Tr => match self {
                Self::Cbt => "Bilişsel Davranışçı Terapi",
                Self::Psychoanalytic => "Psikanalitik Terapi",
                Self::Humanistic => "Hümanistik Terapi",
                Self::Existential => "Varoluşçu Terapi",
                Self::Gestalt => "Gestalt Terapi",
                Self::Act => "Kabul ve Kararlılık Terapisi",
                Self::Positive => "Pozitif Psikoterapi",
                Self::Schema => "Şema Terapi",
                Self::SolutionFocused => "Çözüm Odaklı Terapi",
                Self::Narrative => "Anlatı Terapisi",
                Self::FamilySystems => "Aile Sistemleri Terapisi",
                Self::Dbt => "Diyalektik Davranış Terapisi",
                Self::Other => "Terapi",
            },
            Language::En => match self {
                Self::Cbt => "Cognitive Behavioral Therapy",
                Self::Psychoanalytic => "Psychoanalytic Therapy",
                Self::Humanistic => "Humanistic Therapy",
                Self::Existential => "Existential Therapy",
                Self::Gestalt => "Gestalt Therapy",
                Self::Act => "Acceptance and Commitment Therapy",
                Self::Positive => "Positive Psychotherapy",
                Self::Schema => "Schema Therapy",
                Self::SolutionFocused => "Solution-Focused Therapy",
                Self::Narrative => "Narrative Therapy",
                Self::FamilySystems => "Family Systems Therapy",
                Self::Dbt => "Dialectical Behavior Therapy",
                Self::Other => "Therapy",
            },
        }
    }
}

impl fmt::Display for TherapyApproach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interface and transcription language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Tr,
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Tr => "tr",
            Self::En => "en",
        }
    }

    /// Placeholder shown when the server returns no transcription
    pub fn voice_message_placeholder(&self) -> &'static str {
        match self {
            Self::Tr => "Ses mesajı",
            Self::En => "Voice message",
        }
    }

    /// Shown when a request fails without a server explanation
    pub fn generic_error_message(&self) -> &'static str {
        match self {
            Self::Tr => "Bir hata oluştu. Lütfen daha sonra tekrar deneyin.",
            Self::En => "An error occurred. Please try again later.",
        }
    }

    fn session_word(&self) -> &'static str {
        match self {
            Self::Tr => "Seansı",
            Self::En => "Session",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tr" => Ok(Self::Tr),
            "en" => Ok(Self::En),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

/// Title used when a session is created without one,
/// e.g. "Schema Therapy Session - 05.03.2025 09:07".
pub fn default_session_title(
    approach: TherapyApproach,
    language: Language,
    at: NaiveDateTime,
) -> String {
    format!(
        "{} {} - {}",
        approach.label(language),
        language.session_word(),
        at.format("%d.%m.%Y %H:%M")
    )
}
