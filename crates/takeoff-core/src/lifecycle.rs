use crate::config::EngineConfig;
use crate::error::TakeoffError;
use crate::measure::cable::compute_cable_summary;
use crate::measure::outcome::{CableSummary, TakeoffResult};
use crate::model::UserInputs;
use crate::questions::Question;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TakeoffStatus {
    Draft,
    Processing,
    Ready,
    Verified,
    /// Terminal. The numbers have been quoted against.
    Locked,
}

impl TakeoffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TakeoffStatus::Draft => "draft",
            TakeoffStatus::Processing => "processing",
            TakeoffStatus::Ready => "ready",
            TakeoffStatus::Verified => "verified",
            TakeoffStatus::Locked => "locked",
        }
    }
}

impl fmt::Display for TakeoffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted takeoff for one drawing input.
///
/// Every mutating operation takes the revision the caller last saw and
/// fails with `RevisionConflict` if the record moved on since, so
/// concurrent re-extractions of the same input serialize on the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeoffRecord {
    pub id: String,
    pub input_ref: String,
    pub status: TakeoffStatus,
    pub revision: u64,
    pub result: Option<TakeoffResult>,
    pub user_inputs: UserInputs,
    pub cable_summary: Option<CableSummary>,
    /// Question id to the answer given.
    pub answers: BTreeMap<String, String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub locked_at: Option<DateTime<Utc>>,
}

impl TakeoffRecord {
    pub fn new(id: impl Into<String>, input_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            input_ref: input_ref.into(),
            status: TakeoffStatus::Draft,
            revision: 0,
            result: None,
            user_inputs: UserInputs::default(),
            cable_summary: None,
            answers: BTreeMap::new(),
            verified_at: None,
            locked_at: None,
        }
    }

    fn check_revision(&self, expected: u64) -> Result<(), TakeoffError> {
        if self.revision != expected {
            return Err(TakeoffError::RevisionConflict {
                expected,
                actual: self.revision,
            });
        }
        Ok(())
    }

    fn transition(&mut self, allowed: &[TakeoffStatus], to: TakeoffStatus) -> Result<(), TakeoffError> {
        if !allowed.contains(&self.status) {
            return Err(TakeoffError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        tracing::debug!(id = %self.id, from = %self.status, %to, "takeoff status change");
        self.status = to;
        Ok(())
    }

    fn bump(&mut self) {
        self.revision += 1;
    }

    fn recompute_cable(&mut self, config: &EngineConfig) {
        self.cable_summary = self
            .result
            .as_ref()
            .map(|r| compute_cable_summary(&r.tray_runs, &self.user_inputs, config));
    }

    /// Start (re-)extraction. The previous result stays until `complete`
    /// supersedes it; a verification stamp does not survive.
    pub fn begin_processing(&mut self, expected_revision: u64) -> Result<(), TakeoffError> {
        self.check_revision(expected_revision)?;
        self.transition(
            &[TakeoffStatus::Draft, TakeoffStatus::Ready, TakeoffStatus::Verified],
            TakeoffStatus::Processing,
        )?;
        self.verified_at = None;
        self.bump();
        Ok(())
    }

    /// Store a fresh result. Answers given against the old result are kept
    /// only for questions the new result still asks; a dropped answer's
    /// input goes back to its default.
    pub fn complete(
        &mut self,
        expected_revision: u64,
        result: TakeoffResult,
        config: &EngineConfig,
    ) -> Result<(), TakeoffError> {
        self.check_revision(expected_revision)?;
        self.transition(&[TakeoffStatus::Processing], TakeoffStatus::Ready)?;
        let dropped: Vec<String> = self
            .answers
            .keys()
            .filter(|id| !result.questions.iter().any(|q| &q.id == *id))
            .cloned()
            .collect();
        for id in &dropped {
            self.answers.remove(id);
            self.user_inputs.clear_answer(id);
        }
        if !dropped.is_empty() {
            tracing::debug!(id = %self.id, dropped = ?dropped, "answers dropped on re-extraction");
        }
        self.result = Some(result);
        self.recompute_cable(config);
        self.bump();
        Ok(())
    }

    fn reopen_for_edit(&mut self) -> Result<(), TakeoffError> {
        match self.status {
            TakeoffStatus::Ready => Ok(()),
            TakeoffStatus::Verified => {
                self.verified_at = None;
                self.transition(&[TakeoffStatus::Verified], TakeoffStatus::Ready)
            }
            from => Err(TakeoffError::InvalidTransition {
                from,
                to: TakeoffStatus::Ready,
            }),
        }
    }

    /// Record an answer to one of the result's questions.
    pub fn answer(
        &mut self,
        expected_revision: u64,
        question_id: &str,
        value: &str,
        config: &EngineConfig,
    ) -> Result<(), TakeoffError> {
        self.check_revision(expected_revision)?;
        let asked = self
            .result
            .as_ref()
            .is_some_and(|r| r.questions.iter().any(|q| q.id == question_id));
        if !asked {
            return Err(TakeoffError::UnknownQuestion(question_id.to_string()));
        }

        let mut inputs = self.user_inputs.clone();
        inputs.apply_answer(question_id, value)?;
        self.reopen_for_edit()?;

        self.user_inputs = inputs;
        self.answers
            .insert(question_id.to_string(), value.trim().to_string());
        self.recompute_cable(config);
        self.bump();
        Ok(())
    }

    /// Replace the operator inputs wholesale.
    pub fn update_inputs(
        &mut self,
        expected_revision: u64,
        inputs: UserInputs,
        config: &EngineConfig,
    ) -> Result<(), TakeoffError> {
        self.check_revision(expected_revision)?;
        inputs.validate()?;
        self.reopen_for_edit()?;
        self.user_inputs = inputs;
        self.recompute_cable(config);
        self.bump();
        Ok(())
    }

    pub fn verify(&mut self, expected_revision: u64, at: DateTime<Utc>) -> Result<(), TakeoffError> {
        self.check_revision(expected_revision)?;
        self.transition(&[TakeoffStatus::Ready], TakeoffStatus::Verified)?;
        self.verified_at = Some(at);
        self.bump();
        Ok(())
    }

    pub fn reopen(&mut self, expected_revision: u64) -> Result<(), TakeoffError> {
        self.check_revision(expected_revision)?;
        self.transition(&[TakeoffStatus::Verified], TakeoffStatus::Ready)?;
        self.verified_at = None;
        self.bump();
        Ok(())
    }

    pub fn lock(&mut self, expected_revision: u64, at: DateTime<Utc>) -> Result<(), TakeoffError> {
        self.check_revision(expected_revision)?;
        self.transition(&[TakeoffStatus::Verified], TakeoffStatus::Locked)?;
        self.locked_at = Some(at);
        self.bump();
        Ok(())
    }

    pub fn can_generate_quote(&self) -> bool {
        matches!(self.status, TakeoffStatus::Verified | TakeoffStatus::Locked)
    }

    /// Questions on the current result that have no answer yet.
    pub fn outstanding_questions(&self) -> Vec<&Question> {
        self.result
            .as_ref()
            .map(|r| {
                r.questions
                    .iter()
                    .filter(|q| !self.answers.contains_key(&q.id))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Gate for quote generation: every drawing's takeoff must be verified or
/// locked.
pub fn ensure_quote_ready(records: &[TakeoffRecord]) -> Result<(), TakeoffError> {
    match records.iter().find(|r| !r.can_generate_quote()) {
        Some(r) => Err(TakeoffError::NotVerified {
            id: r.id.clone(),
            status: r.status,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::outcome::TrayRun;
    use crate::model::{ScaleDetection, TrayDuty, TrayType};
    use crate::questions::generate_questions;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()
    }

    fn tray(tray_type: TrayType, length: f64) -> TrayRun {
        TrayRun {
            id: format!("tray-100-{}", tray_type.as_str().to_lowercase()),
            size_mm: 100,
            tray_type,
            length_metres: length,
            height_metres: None,
            wholesaler_lengths: (length / 3.0).ceil() as u32,
            t_pieces: 0,
            cross_pieces: 0,
            bends_90: 0,
            drops: 0,
            annotation_count: 2,
            segments: Vec::new(),
        }
    }

    fn result() -> TakeoffResult {
        let runs = vec![tray(TrayType::Lv, 40.0), tray(TrayType::Fa, 20.0)];
        let annotations: Vec<crate::model::RunAnnotation> = runs
            .iter()
            .map(|r| crate::model::RunAnnotation {
                size_mm: r.size_mm,
                tray_type: r.tray_type,
                height_metres: None,
                x: 0.0,
                y: 0.0,
                end_x: 10.0,
            })
            .collect();
        TakeoffResult {
            drawing_ref: "E-101".into(),
            page_number: 1,
            page_width: 1000.0,
            page_height: 700.0,
            detected: ScaleDetection::default(),
            scale: None,
            fitting_summary: crate::measure::fittings::summarize_fittings(&runs),
            tray_runs: runs,
            questions: generate_questions(&annotations),
            drawing_notes: Vec::new(),
            has_text_layer: true,
            total_text_elements: 12,
            phrase_count: 4,
            run_annotation_count: 2,
            drop_annotation_count: 0,
        }
    }

    fn ready_record() -> TakeoffRecord {
        let config = EngineConfig::default();
        let mut record = TakeoffRecord::new("tk-1", "input-7");
        record.begin_processing(0).unwrap();
        record.complete(1, result(), &config).unwrap();
        record
    }

    #[test]
    fn test_happy_path_to_locked() {
        let mut record = ready_record();
        assert_eq!(record.status, TakeoffStatus::Ready);
        assert_eq!(record.revision, 2);
        assert!(record.cable_summary.is_some());
        assert!(!record.can_generate_quote());

        record.verify(2, stamp()).unwrap();
        assert_eq!(record.verified_at, Some(stamp()));
        assert!(record.can_generate_quote());

        record.lock(3, stamp()).unwrap();
        assert_eq!(record.status, TakeoffStatus::Locked);
        assert!(record.can_generate_quote());
    }

    #[test]
    fn test_stale_revision_rejected() {
        let mut record = ready_record();
        let err = record.verify(1, stamp()).unwrap_err();
        assert!(matches!(
            err,
            TakeoffError::RevisionConflict {
                expected: 1,
                actual: 2
            }
        ));
        assert_eq!(record.status, TakeoffStatus::Ready);
    }

    #[test]
    fn test_locked_is_terminal() {
        let mut record = ready_record();
        record.verify(2, stamp()).unwrap();
        record.lock(3, stamp()).unwrap();
        assert!(matches!(
            record.begin_processing(4),
            Err(TakeoffError::InvalidTransition {
                from: TakeoffStatus::Locked,
                to: TakeoffStatus::Processing
            })
        ));
        assert!(record.reopen(4).is_err());
        assert!(record
            .update_inputs(4, UserInputs::default(), &EngineConfig::default())
            .is_err());
    }

    #[test]
    fn test_cannot_verify_draft() {
        let mut record = TakeoffRecord::new("tk-2", "input-8");
        assert!(record.verify(0, stamp()).is_err());
        assert!(record.complete(0, result(), &EngineConfig::default()).is_err());
    }

    #[test]
    fn test_answer_on_verified_drops_to_ready() {
        let mut record = ready_record();
        record.verify(2, stamp()).unwrap();
        record
            .answer(3, "tray-filter", "FA", &EngineConfig::default())
            .unwrap();
        assert_eq!(record.status, TakeoffStatus::Ready);
        assert_eq!(record.verified_at, None);
        assert_eq!(record.user_inputs.tray_filter, Some(TrayType::Fa));
        let cable = record.cable_summary.as_ref().unwrap();
        assert_eq!(cable.route_length_metres, dec!(20));
    }

    #[test]
    fn test_outstanding_questions_shrink() {
        let mut record = ready_record();
        assert_eq!(record.outstanding_questions().len(), 2);
        record
            .answer(2, "tray-duty", "heavy", &EngineConfig::default())
            .unwrap();
        let outstanding = record.outstanding_questions();
        assert_eq!(outstanding.len(), 1);
        assert_eq!(outstanding[0].id, "tray-filter");
        assert_eq!(record.user_inputs.tray_duty, TrayDuty::Heavy);
    }

    #[test]
    fn test_answer_unasked_question_rejected() {
        let mut record = ready_record();
        assert!(matches!(
            record.answer(2, "no-text", "skip", &EngineConfig::default()),
            Err(TakeoffError::UnknownQuestion(_))
        ));
        assert_eq!(record.revision, 2);
    }

    #[test]
    fn test_invalid_answer_leaves_record_untouched() {
        let mut record = ready_record();
        record.verify(2, stamp()).unwrap();
        assert!(record
            .answer(3, "tray-duty", "extreme", &EngineConfig::default())
            .is_err());
        assert_eq!(record.status, TakeoffStatus::Verified);
        assert_eq!(record.revision, 3);
    }

    #[test]
    fn test_reextraction_supersedes_result() {
        let config = EngineConfig::default();
        let mut record = ready_record();
        record.answer(2, "tray-duty", "light", &config).unwrap();
        record.verify(3, stamp()).unwrap();
        record.begin_processing(4).unwrap();
        assert_eq!(record.verified_at, None);
        let mut fresh = result();
        fresh.questions.retain(|q| q.id != "tray-duty");
        record.complete(5, fresh, &config).unwrap();
        assert!(record.answers.is_empty());
        assert_eq!(record.status, TakeoffStatus::Ready);
    }

    #[test]
    fn test_dropped_answer_resets_its_input() {
        let config = EngineConfig::default();
        let mut record = ready_record();
        record.answer(2, "tray-filter", "FA", &config).unwrap();
        record.answer(3, "tray-duty", "heavy", &config).unwrap();
        record.begin_processing(4).unwrap();

        // Only LV left on the page: no filter question any more.
        let mut fresh = result();
        fresh.tray_runs.retain(|r| r.tray_type == TrayType::Lv);
        fresh.questions.retain(|q| q.id != "tray-filter");
        record.complete(5, fresh, &config).unwrap();

        assert!(!record.answers.contains_key("tray-filter"));
        assert_eq!(record.user_inputs.tray_filter, None);
        assert_eq!(record.answers.get("tray-duty").map(String::as_str), Some("heavy"));
        assert_eq!(record.user_inputs.tray_duty, TrayDuty::Heavy);
        let cable = record.cable_summary.as_ref().unwrap();
        assert_eq!(cable.route_length_metres, dec!(40));
    }

    #[test]
    fn test_quote_gate() {
        let mut verified = ready_record();
        verified.verify(2, stamp()).unwrap();
        let pending = ready_record();

        assert!(ensure_quote_ready(std::slice::from_ref(&verified)).is_ok());
        let err = ensure_quote_ready(&[verified, pending]).unwrap_err();
        assert!(matches!(
            err,
            TakeoffError::NotVerified {
                status: TakeoffStatus::Ready,
                ..
            }
        ));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(TakeoffStatus::Processing.to_string(), "processing");
        let json = serde_json::to_string(&TakeoffStatus::Locked).unwrap();
        assert_eq!(json, "\"locked\"");
    }
}
