use crate::error::TakeoffError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tray widths (mm) that a run annotation may carry. Anything else is a
/// false match and is discarded.
pub const TRAY_SIZES_MM: &[u32] = &[50, 75, 100, 150, 225, 300, 450, 600, 750, 900];

pub fn is_known_size(size_mm: u32) -> bool {
    TRAY_SIZES_MM.contains(&size_mm)
}

/// Equipment class a tray serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrayType {
    /// Low voltage power.
    Lv,
    /// Extra-low voltage.
    Elv,
    /// Fire alarm.
    Fa,
    Hv,
    Mv,
    Data,
    /// Security.
    Sec,
    /// Emergency lighting.
    Em,
}

impl TrayType {
    pub const ALL: [TrayType; 8] = [
        TrayType::Lv,
        TrayType::Elv,
        TrayType::Fa,
        TrayType::Hv,
        TrayType::Mv,
        TrayType::Data,
        TrayType::Sec,
        TrayType::Em,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrayType::Lv => "LV",
            TrayType::Elv => "ELV",
            TrayType::Fa => "FA",
            TrayType::Hv => "HV",
            TrayType::Mv => "MV",
            TrayType::Data => "DATA",
            TrayType::Sec => "SEC",
            TrayType::Em => "EM",
        }
    }

    /// Membership check for a type token; case-insensitive.
    pub fn from_token(token: &str) -> Option<TrayType> {
        let upper = token.trim().to_uppercase();
        TrayType::ALL.into_iter().find(|t| t.as_str() == upper)
    }
}

impl fmt::Display for TrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ISO A-series sheet, identified by its landscape long edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A0,
    A1,
    A2,
    A3,
    A4,
}

impl PaperSize {
    pub const ALL: [PaperSize; 5] = [
        PaperSize::A0,
        PaperSize::A1,
        PaperSize::A2,
        PaperSize::A3,
        PaperSize::A4,
    ];

    pub fn width_mm(&self) -> f64 {
        match self {
            PaperSize::A0 => 1189.0,
            PaperSize::A1 => 841.0,
            PaperSize::A2 => 594.0,
            PaperSize::A3 => 420.0,
            PaperSize::A4 => 297.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaperSize::A0 => "A0",
            PaperSize::A1 => "A1",
            PaperSize::A2 => "A2",
            PaperSize::A3 => "A3",
            PaperSize::A4 => "A4",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<PaperSize> {
        let upper = s.trim().to_uppercase();
        PaperSize::ALL.into_iter().find(|p| p.as_str() == upper)
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tray run annotation recognised in the drawing text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunAnnotation {
    pub size_mm: u32,
    pub tray_type: TrayType,
    /// Installation height, when the annotation carries an `@<mm>` suffix.
    pub height_metres: Option<f64>,
    pub x: f64,
    pub y: f64,
    pub end_x: f64,
}

/// A vertical drop marker ("DROP TO LEVEL 2", "DROP DOWN COLUMN C4").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropAnnotation {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

/// Scale facts found in the drawing text. Either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleDetection {
    pub scale_ratio: Option<u32>,
    pub paper_size: Option<PaperSize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrayDuty {
    Light,
    #[default]
    Medium,
    Heavy,
}

impl TrayDuty {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrayDuty::Light => "light",
            TrayDuty::Medium => "medium",
            TrayDuty::Heavy => "heavy",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<TrayDuty> {
        match s.trim().to_lowercase().as_str() {
            "light" => Some(TrayDuty::Light),
            "medium" => Some(TrayDuty::Medium),
            "heavy" => Some(TrayDuty::Heavy),
            _ => None,
        }
    }
}

impl fmt::Display for TrayDuty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-supplied parameters for the cable estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInputs {
    /// Only runs of this type feed the cable estimate. `None` takes all.
    pub tray_filter: Option<TrayType>,
    pub tray_duty: TrayDuty,
    pub drop_metres_per_fitting: Decimal,
    pub first_point_run_metres: Decimal,
    pub number_of_circuits: u32,
    pub additional_cable_percent: Decimal,
}

impl Default for UserInputs {
    fn default() -> Self {
        Self {
            tray_filter: None,
            tray_duty: TrayDuty::Medium,
            drop_metres_per_fitting: Decimal::from(2),
            first_point_run_metres: Decimal::from(10),
            number_of_circuits: 1,
            additional_cable_percent: Decimal::from(10),
        }
    }
}

impl UserInputs {
    pub fn validate(&self) -> Result<(), TakeoffError> {
        let fields = [
            ("drop_metres_per_fitting", self.drop_metres_per_fitting),
            ("first_point_run_metres", self.first_point_run_metres),
            ("additional_cable_percent", self.additional_cable_percent),
        ];
        for (name, value) in fields {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(TakeoffError::InvalidInputs(format!(
                    "{} must not be negative (got {})",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Fold an operator's answer to a generated question into the inputs.
    pub fn apply_answer(&mut self, question_id: &str, value: &str) -> Result<(), TakeoffError> {
        let invalid = || TakeoffError::InvalidAnswer {
            question_id: question_id.to_string(),
            value: value.to_string(),
        };
        match question_id {
            crate::questions::TRAY_FILTER_ID => {
                if value.trim().eq_ignore_ascii_case("all") {
                    self.tray_filter = None;
                } else {
                    self.tray_filter = Some(TrayType::from_token(value).ok_or_else(invalid)?);
                }
            }
            crate::questions::TRAY_DUTY_ID => {
                self.tray_duty = TrayDuty::from_str_loose(value).ok_or_else(invalid)?;
            }
            crate::questions::NO_TEXT_ID | crate::questions::EXTRACTION_FAILED_ID => {
                if !matches!(value.trim(), "skip" | "retry") {
                    return Err(invalid());
                }
            }
            other => return Err(TakeoffError::UnknownQuestion(other.to_string())),
        }
        Ok(())
    }

    /// Undo the effect of an answer, putting its field back to the default.
    pub fn clear_answer(&mut self, question_id: &str) {
        let defaults = UserInputs::default();
        match question_id {
            crate::questions::TRAY_FILTER_ID => self.tray_filter = defaults.tray_filter,
            crate::questions::TRAY_DUTY_ID => self.tray_duty = defaults.tray_duty,
            _ => {}
        }
    }
}
