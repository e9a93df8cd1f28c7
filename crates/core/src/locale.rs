//! Display languages and their label tables.
//!
//! Every user-facing string produced by the library (status labels,
//! transport failure messages) is looked up through a [`Locale`] so the
//! caller decides the language once, at configuration time.

use std::str::FromStr;

use crate::error::CoreError;

/// Glyph prefixed to a stop-word outcome copied from a related parcel
/// when the caller asks for inherited outcomes to be visible.
pub const INHERITED_MARKER: &str = "\u{2691} ";

/// Supported display languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    Ru,
    En,
}

/// Label table for one locale.
#[derive(Debug)]
pub struct Labels {
    // Whole-value combinations.
    pub not_checked: &'static str,
    pub approved_with_excise: &'static str,
    pub approved_with_notification: &'static str,
    pub excluded_by_partner: &'static str,

    // Stop-word half.
    pub sw_no_issues: &'static str,
    pub sw_approved: &'static str,
    pub sw_issue_stop_word: &'static str,

    // FEACN half.
    pub fc_no_issues: &'static str,
    pub fc_issue_feacn_code: &'static str,
    pub fc_issue_nonexisting_feacn: &'static str,
    pub fc_issue_invalid_feacn_format: &'static str,

    // Transport.
    pub server_unreachable: &'static str,
}

static RU: Labels = Labels {
    not_checked: "Не проверено",
    approved_with_excise: "Согласовано с акцизом",
    approved_with_notification: "Согласовано с нотификацией",
    excluded_by_partner: "Исключено партнёром",
    sw_no_issues: "Стоп-слова не найдены",
    sw_approved: "Согласовано",
    sw_issue_stop_word: "Найдены стоп-слова",
    fc_no_issues: "Код ТН ВЭД в порядке",
    fc_issue_feacn_code: "Запрет по коду ТН ВЭД",
    fc_issue_nonexisting_feacn: "Несуществующий код ТН ВЭД",
    fc_issue_invalid_feacn_format: "Неверный формат кода ТН ВЭД",
    server_unreachable: "Не удалось соединиться с сервером",
};

static EN: Labels = Labels {
    not_checked: "Not checked",
    approved_with_excise: "Approved with excise",
    approved_with_notification: "Approved with notification",
    excluded_by_partner: "Excluded by partner",
    sw_no_issues: "No stop words",
    sw_approved: "Approved",
    sw_issue_stop_word: "Stop words found",
    fc_no_issues: "FEACN code OK",
    fc_issue_feacn_code: "FEACN code restricted",
    fc_issue_nonexisting_feacn: "Non-existent FEACN code",
    fc_issue_invalid_feacn_format: "Invalid FEACN code format",
    server_unreachable: "Cannot reach the server",
};

impl Locale {
    /// Label table for this locale.
    pub fn labels(self) -> &'static Labels {
        match self {
            Locale::Ru => &RU,
            Locale::En => &EN,
        }
    }

    /// Short language tag (`ru`, `en`).
    pub fn tag(self) -> &'static str {
        match self {
            Locale::Ru => "ru",
            Locale::En => "en",
        }
    }
}

impl FromStr for Locale {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ru" | "ru-ru" => Ok(Locale::Ru),
            "en" | "en-us" | "en-gb" => Ok(Locale::En),
            other => Err(CoreError::UnknownLocale(other.to_string())),
        }
    }
}
