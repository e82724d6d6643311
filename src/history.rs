use crate::models::{DraftStatus, EmailDraft, Tone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(DraftStatus),
}

impl StatusFilter {
    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Only(status) => status.as_str(),
        }
    }

    /// all -> draft -> sent -> failed -> all
    pub fn cycle(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Only(DraftStatus::ALL[0]),
            StatusFilter::Only(status) => {
                match DraftStatus::ALL.iter().position(|s| *s == status) {
                    Some(i) if i + 1 < DraftStatus::ALL.len() => {
                        StatusFilter::Only(DraftStatus::ALL[i + 1])
                    }
                    _ => StatusFilter::All,
                }
            }
        }
    }

    fn accepts(&self, status: DraftStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToneFilter {
    #[default]
    All,
    Only(Tone),
}

impl ToneFilter {
    pub fn label(&self) -> &'static str {
        match self {
            ToneFilter::All => "all",
            ToneFilter::Only(tone) => tone.as_str(),
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            ToneFilter::All => ToneFilter::Only(Tone::ALL[0]),
            ToneFilter::Only(tone) => match Tone::ALL.iter().position(|t| *t == tone) {
                Some(i) if i + 1 < Tone::ALL.len() => ToneFilter::Only(Tone::ALL[i + 1]),
                _ => ToneFilter::All,
            },
        }
    }

    /// Tones outside the known set only pass the `All` filter
    fn accepts(&self, tone: Option<Tone>) -> bool {
        match self {
            ToneFilter::All => true,
            ToneFilter::Only(wanted) => Some(*wanted) == tone,
        }
    }
}

/// Search term plus status/tone predicates over the draft list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftFilter {
    pub search: String,
    pub status: StatusFilter,
    pub tone: ToneFilter,
}

impl DraftFilter {
    pub fn matches(&self, email: &EmailDraft) -> bool {
        self.matches_search(email) && self.status.accepts(email.status) && self.tone.accepts(email.known_tone())
    }

    fn matches_search(&self, email: &EmailDraft) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        [&email.recipient, &email.prompt, &email.content]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Keeps source order; never re-sorts.
    pub fn apply<'a>(&self, emails: &'a [EmailDraft]) -> Vec<&'a EmailDraft> {
        emails.iter().filter(|email| self.matches(email)).collect()
    }
}

/// History tab state: the filter, the selection within the filtered list
/// and whether the detail modal is open.
#[derive(Debug, Default)]
pub struct HistoryView {
    pub filter: DraftFilter,
    pub selected: usize,
    pub editing_search: bool,
    pub viewing: Option<i64>,
}

impl HistoryView {
    pub fn visible<'a>(&self, emails: &'a [EmailDraft]) -> Vec<&'a EmailDraft> {
        self.filter.apply(emails)
    }

    pub fn selected_id(&self, emails: &[EmailDraft]) -> Option<i64> {
        self.visible(emails).get(self.selected).map(|email| email.id)
    }

    pub fn move_down(&mut self, emails: &[EmailDraft]) {
        let len = self.visible(emails).len();
        if self.selected < len.saturating_sub(1) {
            self.selected += 1;
        }
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Keeps the selection inside the list after it shrinks.
    pub fn clamp(&mut self, emails: &[EmailDraft]) {
        let len = self.visible(emails).len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    pub fn push_search(&mut self, c: char) {
        self.filter.search.push(c);
        self.selected = 0;
    }

    pub fn pop_search(&mut self) {
        self.filter.search.pop();
        self.selected = 0;
    }

    pub fn cycle_status(&mut self) {
        self.filter.status = self.filter.status.cycle();
        self.selected = 0;
    }

    pub fn cycle_tone(&mut self) {
        self.filter.tone = self.filter.tone.cycle();
        self.selected = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::draft;

    fn sample() -> Vec<EmailDraft> {
        let mut acme = draft(3, DraftStatus::Draft, Tone::Friendly);
        acme.recipient = "contact@acme.com".to_string();
        let mut failed = draft(4, DraftStatus::Failed, Tone::Formal);
        failed.content = "Quarterly numbers attached".to_string();
        vec![
            draft(1, DraftStatus::Sent, Tone::Formal),
            draft(2, DraftStatus::Draft, Tone::Casual),
            acme,
            failed,
        ]
    }

    fn ids(found: &[&EmailDraft]) -> Vec<i64> {
        found.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_empty_filter_returns_everything_in_order() {
        let emails = sample();
        let filter = DraftFilter::default();
        assert_eq!(ids(&filter.apply(&emails)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_status_filter_scenario() {
        let emails = vec![
            draft(1, DraftStatus::Sent, Tone::Formal),
            draft(2, DraftStatus::Draft, Tone::Casual),
        ];
        let filter = DraftFilter {
            status: StatusFilter::Only(DraftStatus::Sent),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&emails)), vec![1]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let emails = sample();
        let filter = DraftFilter {
            search: "ACME".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&emails)), vec![3]);
    }

    #[test]
    fn test_search_covers_prompt_and_content() {
        let emails = sample();
        let by_content = DraftFilter {
            search: "quarterly".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&by_content.apply(&emails)), vec![4]);

        let by_prompt = DraftFilter {
            search: "prompt 2".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&by_prompt.apply(&emails)), vec![2]);
    }

    #[test]
    fn test_predicates_combine() {
        let emails = sample();
        let filter = DraftFilter {
            search: "example.com".to_string(),
            status: StatusFilter::Only(DraftStatus::Failed),
            tone: ToneFilter::Only(Tone::Formal),
        };
        assert_eq!(ids(&filter.apply(&emails)), vec![4]);
    }

    #[test]
    fn test_unknown_tone_only_passes_all() {
        let mut odd = draft(9, DraftStatus::Draft, Tone::Formal);
        odd.tone = "professional".to_string();
        let emails = vec![draft(1, DraftStatus::Draft, Tone::Formal), odd];

        assert_eq!(ids(&DraftFilter::default().apply(&emails)), vec![1, 9]);
        let formal = DraftFilter {
            tone: ToneFilter::Only(Tone::Formal),
            ..Default::default()
        };
        assert_eq!(ids(&formal.apply(&emails)), vec![1]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let emails = sample();
        let filter = DraftFilter {
            search: "e".to_string(),
            status: StatusFilter::Only(DraftStatus::Draft),
            tone: ToneFilter::All,
        };
        let once: Vec<EmailDraft> = filter.apply(&emails).into_iter().cloned().collect();
        let twice: Vec<EmailDraft> = filter.apply(&once).into_iter().cloned().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_cycles_wrap_to_all() {
        let mut status = StatusFilter::All;
        for _ in 0..=DraftStatus::ALL.len() {
            status = status.cycle();
        }
        assert_eq!(status, StatusFilter::All);

        let mut tone = ToneFilter::All;
        for _ in 0..=Tone::ALL.len() {
            tone = tone.cycle();
        }
        assert_eq!(tone, ToneFilter::All);
    }

    #[test]
    fn test_selection_follows_filtered_list() {
        let emails = sample();
        let mut view = HistoryView::default();
        view.move_down(&emails);
        view.move_down(&emails);
        assert_eq!(view.selected_id(&emails), Some(3));

        view.cycle_status();
        assert_eq!(view.selected, 0);
        assert_eq!(view.selected_id(&emails), Some(2));

        view.move_down(&emails);
        view.move_down(&emails);
        assert_eq!(view.selected_id(&emails), Some(3));

        let shorter: Vec<EmailDraft> = emails.into_iter().filter(|e| e.id != 3).collect();
        view.clamp(&shorter);
        assert_eq!(view.selected_id(&shorter), Some(2));
    }
}
