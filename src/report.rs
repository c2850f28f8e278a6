use crate::update::{CandidateStatus, FailureKind, Mode, UpdateCandidate};
use colored::Colorize;

/// Renders one status line per candidate that has news. Up-to-date scripts
/// and scripts outside the filter never produce a line, so a name's presence
/// in the output is the contract callers can rely on.
pub struct Reporter;

impl Reporter {
    pub fn lines(candidates: &[UpdateCandidate], mode: Mode) -> Vec<String> {
        candidates
            .iter()
            .filter_map(|candidate| Self::line(candidate, mode))
            .collect()
    }

    pub fn print(candidates: &[UpdateCandidate], mode: Mode) {
        for line in Self::lines(candidates, mode) {
            println!("{}", line);
        }
    }

    pub fn update_count(candidates: &[UpdateCandidate]) -> usize {
        candidates
            .iter()
            .filter(|c| c.status == CandidateStatus::UpdateAvailable)
            .count()
    }

    pub fn failure_count(candidates: &[UpdateCandidate]) -> usize {
        candidates
            .iter()
            .filter(|c| matches!(c.status, CandidateStatus::Failed(_)))
            .count()
    }

    pub fn is_quiet(candidates: &[UpdateCandidate]) -> bool {
        Self::update_count(candidates) == 0 && Self::failure_count(candidates) == 0
    }

    fn line(candidate: &UpdateCandidate, mode: Mode) -> Option<String> {
        match &candidate.status {
            CandidateStatus::UpToDate => None,
            CandidateStatus::UpdateAvailable => {
                let current = candidate.current.as_deref().unwrap_or("?");
                let latest = candidate.latest.as_deref().unwrap_or("?");
                let suffix = match mode {
                    Mode::Check => "",
                    Mode::Apply => " (updated)",
                };

                Some(format!(
                    "  • {} {} → {}{}",
                    candidate.name.white().bold(),
                    current.red(),
                    latest.green().bold(),
                    suffix
                ))
            }
            CandidateStatus::Failed(kind) => {
                let reason = match kind {
                    FailureKind::Resolution(msg) => msg.as_str(),
                    FailureKind::Install(msg) => msg.as_str(),
                    FailureKind::UnknownName => "not installed",
                };

                Some(format!(
                    "  ✗ {} {}",
                    candidate.name.white().bold(),
                    reason.red()
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, status: CandidateStatus) -> UpdateCandidate {
        UpdateCandidate {
            name: name.to_string(),
            current: Some("0.5.0".to_string()),
            latest: Some("0.8.2".to_string()),
            status,
        }
    }

    #[test]
    fn up_to_date_scripts_are_silent() {
        let candidates = vec![
            candidate("nublar", CandidateStatus::UpToDate),
            candidate("udd", CandidateStatus::UpdateAvailable),
        ];

        let lines = Reporter::lines(&candidates, Mode::Check);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("udd"));
        assert!(lines[0].contains("0.5.0"));
        assert!(lines[0].contains("0.8.2"));
        assert!(!lines.iter().any(|line| line.contains("nublar")));
    }

    #[test]
    fn failures_render_a_distinct_line() {
        let candidates = vec![candidate(
            "ghost",
            CandidateStatus::Failed(FailureKind::UnknownName),
        )];

        let lines = Reporter::lines(&candidates, Mode::Check);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("ghost"));
        assert!(lines[0].contains("not installed"));
    }

    #[test]
    fn nothing_to_report_is_quiet() {
        let candidates = vec![candidate("nublar", CandidateStatus::UpToDate)];
        assert!(Reporter::is_quiet(&candidates));
        assert!(Reporter::lines(&candidates, Mode::Apply).is_empty());
    }

    #[test]
    fn counts_split_updates_and_failures() {
        let candidates = vec![
            candidate("udd", CandidateStatus::UpdateAvailable),
            candidate(
                "fmt",
                CandidateStatus::Failed(FailureKind::Resolution("timeout".to_string())),
            ),
        ];

        assert_eq!(Reporter::update_count(&candidates), 1);
        assert_eq!(Reporter::failure_count(&candidates), 1);
        assert!(!Reporter::is_quiet(&candidates));
    }
}
