//! Composite parcel check status.
//!
//! Every parcel carries one 32-bit status that packs the outcomes of two
//! independent checks:
//!
//! - the upper 16 bits hold the FEACN tariff code check ([`FcStatus`]),
//! - the lower 16 bits hold the stop-word check ([`SwStatus`]).
//!
//! The two checks complete independently, so callers merge a fresh result
//! for one half into the existing code with [`CheckStatusCode::with_fc`] or
//! [`CheckStatusCode::with_sw`]. The backend stores and returns the packed
//! value as a plain number.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::locale::{Labels, Locale, INHERITED_MARKER};

// ---------------------------------------------------------------------------
// Bit layout
// ---------------------------------------------------------------------------

/// Set in either half when that check found something needing attention.
pub const ISSUE_FLAG: u16 = 0x0100;

/// Set in a half when its outcome was copied from a related parcel rather
/// than determined for this one.
pub const INHERITED_FLAG: u16 = 0x0080;

const HALF_MASK: u32 = 0xFFFF;
const FC_SHIFT: u32 = 16;

/// Pack an FC and an SW sub-status into one code.
pub const fn compose(fc: u16, sw: u16) -> u32 {
    ((fc as u32) << FC_SHIFT) | sw as u32
}

/// Split a packed code into its `(fc, sw)` halves.
pub const fn decompose(value: u32) -> (u16, u16) {
    (
        ((value >> FC_SHIFT) & HALF_MASK) as u16,
        (value & HALF_MASK) as u16,
    )
}

// ---------------------------------------------------------------------------
// Sub-statuses
// ---------------------------------------------------------------------------

/// Outcome of the stop-word check (lower half).
///
/// The named constants are the values the backend is known to produce;
/// any other `u16` is carried through untouched and renders as empty text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SwStatus(u16);

impl SwStatus {
    pub const NOT_CHECKED: Self = Self(0x0000);
    pub const NO_ISSUES: Self = Self(0x0010);
    pub const APPROVED: Self = Self(0x0020);
    pub const APPROVED_INHERITED: Self = Self(0x0020 | INHERITED_FLAG);
    pub const APPROVED_WITH_EXCISE: Self = Self(0x0230);
    pub const APPROVED_WITH_NOTIFICATION: Self = Self(0x0231);
    pub const ISSUE_STOP_WORD: Self = Self(ISSUE_FLAG);
    pub const ISSUE_STOP_WORD_INHERITED: Self = Self(ISSUE_FLAG | INHERITED_FLAG);
    pub const MARKED_BY_PARTNER: Self = Self(0x01FF);

    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub const fn code(self) -> u16 {
        self.0
    }

    pub const fn has_issue(self) -> bool {
        self.0 & ISSUE_FLAG != 0
    }

    pub const fn is_inherited(self) -> bool {
        self.0 & INHERITED_FLAG != 0
    }

    /// The same outcome with the inherited bit cleared.
    pub const fn without_inherited(self) -> Self {
        Self(self.0 & !INHERITED_FLAG)
    }

    /// Fragment for this half, or `""` when there is nothing to show.
    fn fragment(self, labels: &Labels, inherited_visible: bool) -> String {
        let (text, inherited) = match self {
            Self::NOT_CHECKED => return String::new(),
            Self::NO_ISSUES => (labels.sw_no_issues, false),
            Self::APPROVED => (labels.sw_approved, false),
            Self::APPROVED_INHERITED => (labels.sw_approved, true),
            Self::APPROVED_WITH_EXCISE => (labels.approved_with_excise, false),
            Self::APPROVED_WITH_NOTIFICATION => (labels.approved_with_notification, false),
            Self::ISSUE_STOP_WORD => (labels.sw_issue_stop_word, false),
            Self::ISSUE_STOP_WORD_INHERITED => (labels.sw_issue_stop_word, true),
            Self::MARKED_BY_PARTNER => (labels.excluded_by_partner, false),
            _ => return String::new(),
        };

        if inherited && inherited_visible {
            format!("{INHERITED_MARKER}{text}")
        } else {
            text.to_string()
        }
    }
}

/// Outcome of the FEACN tariff code check (upper half).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FcStatus(u16);

impl FcStatus {
    pub const NOT_CHECKED: Self = Self(0x0000);
    pub const NO_ISSUES: Self = Self(0x0010);
    pub const APPROVED_WITH_EXCISE: Self = Self(0x0230);
    pub const APPROVED_WITH_NOTIFICATION: Self = Self(0x0231);
    pub const ISSUE_FEACN_CODE: Self = Self(ISSUE_FLAG);
    pub const ISSUE_NONEXISTING_FEACN: Self = Self(ISSUE_FLAG | 0x0001);
    pub const ISSUE_INVALID_FEACN_FORMAT: Self = Self(ISSUE_FLAG | 0x0002);
    pub const MARKED_BY_PARTNER: Self = Self(0x01FF);

    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub const fn code(self) -> u16 {
        self.0
    }

    pub const fn has_issue(self) -> bool {
        self.0 & ISSUE_FLAG != 0
    }

    fn fragment(self, labels: &Labels) -> &'static str {
        match self {
            Self::NO_ISSUES => labels.fc_no_issues,
            Self::APPROVED_WITH_EXCISE => labels.approved_with_excise,
            Self::APPROVED_WITH_NOTIFICATION => labels.approved_with_notification,
            Self::ISSUE_FEACN_CODE => labels.fc_issue_feacn_code,
            Self::ISSUE_NONEXISTING_FEACN => labels.fc_issue_nonexisting_feacn,
            Self::ISSUE_INVALID_FEACN_FORMAT => labels.fc_issue_invalid_feacn_format,
            Self::MARKED_BY_PARTNER => labels.excluded_by_partner,
            _ => "",
        }
    }
}

// ---------------------------------------------------------------------------
// CheckStatusCode
// ---------------------------------------------------------------------------

/// Coarse classification used to pick a display style for a parcel row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckSeverity {
    /// Neither check has run yet.
    NotChecked,
    /// Checked, nothing to act on.
    Clear,
    /// At least one half carries the issue flag.
    Attention,
    /// A partner excluded the parcel from checks.
    Excluded,
}

/// Packed FC + SW check status of a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CheckStatusCode(u32);

impl CheckStatusCode {
    pub const NOT_CHECKED: Self = Self::from_parts(FcStatus::NOT_CHECKED, SwStatus::NOT_CHECKED);
    pub const NO_ISSUES: Self = Self::from_parts(FcStatus::NO_ISSUES, SwStatus::NO_ISSUES);
    pub const APPROVED_WITH_EXCISE: Self =
        Self::from_parts(FcStatus::APPROVED_WITH_EXCISE, SwStatus::APPROVED_WITH_EXCISE);
    pub const APPROVED_WITH_NOTIFICATION: Self = Self::from_parts(
        FcStatus::APPROVED_WITH_NOTIFICATION,
        SwStatus::APPROVED_WITH_NOTIFICATION,
    );
    pub const MARKED_BY_PARTNER: Self =
        Self::from_parts(FcStatus::MARKED_BY_PARTNER, SwStatus::MARKED_BY_PARTNER);

    pub const fn from_parts(fc: FcStatus, sw: SwStatus) -> Self {
        Self(compose(fc.0, sw.0))
    }

    pub const fn from_int(value: u32) -> Self {
        Self(value)
    }

    /// Build a code from an arbitrary JSON value the way the backend's
    /// loosely-typed clients do: numbers and numeric strings are truncated
    /// to an unsigned 32-bit integer, everything else becomes
    /// [`NOT_CHECKED`](Self::NOT_CHECKED).
    pub fn coerce(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        let number = match value {
            Value::Number(n) => n
                .as_u64()
                .map(|v| v as f64)
                .or_else(|| n.as_i64().map(|v| v as f64))
                .or_else(|| n.as_f64()),
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        };

        match number {
            Some(n) if n.is_finite() => Self(n.trunc() as i64 as u32),
            _ => Self::NOT_CHECKED,
        }
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    pub const fn fc(self) -> FcStatus {
        FcStatus(decompose(self.0).0)
    }

    pub const fn sw(self) -> SwStatus {
        SwStatus(decompose(self.0).1)
    }

    pub const fn decompose(self) -> (FcStatus, SwStatus) {
        (self.fc(), self.sw())
    }

    pub const fn has_issues(self) -> bool {
        self.fc().has_issue() || self.sw().has_issue()
    }

    pub const fn is_inherited_sw(self) -> bool {
        self.sw().is_inherited()
    }

    /// Replace the FC half, keeping the SW half.
    pub const fn with_fc(self, fc: FcStatus) -> Self {
        Self::from_parts(fc, self.sw())
    }

    /// Replace the SW half, keeping the FC half.
    pub const fn with_sw(self, sw: SwStatus) -> Self {
        Self::from_parts(self.fc(), sw)
    }

    pub fn severity(self) -> CheckSeverity {
        if self.fc() == FcStatus::MARKED_BY_PARTNER || self.sw() == SwStatus::MARKED_BY_PARTNER {
            CheckSeverity::Excluded
        } else if self.has_issues() {
            CheckSeverity::Attention
        } else if self == Self::NOT_CHECKED {
            CheckSeverity::NotChecked
        } else {
            CheckSeverity::Clear
        }
    }

    /// User-facing label.
    ///
    /// Whole-value combinations where both halves agree get a single label.
    /// Otherwise the SW and FC fragments are joined with `", "`, skipping
    /// empty ones. Inherited SW outcomes read like their direct
    /// counterparts unless `inherited_visible` is set, in which case they
    /// carry [`INHERITED_MARKER`].
    pub fn label(self, locale: Locale, inherited_visible: bool) -> String {
        let labels = locale.labels();

        match self {
            Self::NOT_CHECKED => return labels.not_checked.to_string(),
            Self::APPROVED_WITH_EXCISE => return labels.approved_with_excise.to_string(),
            Self::APPROVED_WITH_NOTIFICATION => {
                return labels.approved_with_notification.to_string()
            }
            Self::MARKED_BY_PARTNER => return labels.excluded_by_partner.to_string(),
            _ => {}
        }

        let sw = self.sw().fragment(labels, inherited_visible);
        let fc = self.fc().fragment(labels);

        [sw.as_str(), fc]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<u32> for CheckStatusCode {
    fn from(value: u32) -> Self {
        Self::from_int(value)
    }
}

impl From<CheckStatusCode> for u32 {
    fn from(code: CheckStatusCode) -> Self {
        code.value()
    }
}

impl fmt::Display for CheckStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label(Locale::default(), false))
    }
}

impl Serialize for CheckStatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> Deserialize<'de> for CheckStatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::coerce(&raw))
    }
}
