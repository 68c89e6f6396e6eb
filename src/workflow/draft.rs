use crate::types::{
    Bug, CreateBugPayload, DESCRIPTION_MAX_CHARS, Priority, Status, TITLE_MAX_CHARS,
    UpdateBugPayload, User,
};

use super::WorkflowError;

// ---------------------------------------------------------------------------
// Assignee
// ---------------------------------------------------------------------------

/// The assignee field: a display name, linked to a user id only when it was
/// picked from the suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignee {
    pub id: Option<i64>,
    pub display_name: String,
}

impl Assignee {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: Some(user.id),
            display_name: user.full_name(),
        }
    }

    /// Typed text that is not (yet) linked to a user.
    pub fn free_text(text: impl Into<String>) -> Self {
        Self {
            id: None,
            display_name: text.into(),
        }
    }

    pub fn is_linked(&self) -> bool {
        self.id.is_some()
    }
}

// ---------------------------------------------------------------------------
// Pickable reference entities
// ---------------------------------------------------------------------------

/// A reference entity the editor offers in a cycling picker.
pub trait Choice: Clone {
    fn id(&self) -> i64;
    fn label(&self) -> &str;
    fn is_active(&self) -> bool;
}

impl Choice for Priority {
    fn id(&self) -> i64 {
        self.id
    }
    fn label(&self) -> &str {
        &self.level
    }
    fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

impl Choice for Status {
    fn id(&self) -> i64 {
        self.id
    }
    fn label(&self) -> &str {
        &self.label
    }
    fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// `None`, then every active entry, then the pre-existing value if it is no
/// longer among the active ones.
fn choices<T: Choice>(active: &[T], original: Option<&T>) -> Vec<Option<T>> {
    let mut out: Vec<Option<T>> = Vec::with_capacity(active.len() + 2);
    out.push(None);
    out.extend(active.iter().filter(|c| c.is_active()).cloned().map(Some));
    if let Some(orig) = original
        && !out.iter().flatten().any(|c| c.id() == orig.id())
    {
        out.push(Some(orig.clone()));
    }
    out
}

fn cycle<T: Choice>(current: Option<i64>, options: &[Option<T>], forward: bool) -> Option<i64> {
    if options.is_empty() {
        return current;
    }
    let pos = options
        .iter()
        .position(|o| o.as_ref().map(Choice::id) == current)
        .unwrap_or(0);
    let len = options.len();
    let next = if forward {
        (pos + 1) % len
    } else {
        (pos + len - 1) % len
    };
    options[next].as_ref().map(Choice::id)
}

fn allowed<T: Choice>(id: Option<i64>, active: &[T], original: Option<&T>) -> bool {
    let Some(id) = id else {
        return true;
    };
    active.iter().any(|c| c.id() == id && c.is_active()) || original.is_some_and(|o| o.id() == id)
}

fn describe<T: Choice>(id: Option<i64>, active: &[T], original: Option<&T>) -> String {
    let Some(id) = id else {
        return "-".to_owned();
    };
    active
        .iter()
        .chain(original)
        .find(|c| c.id() == id)
        .map_or_else(|| format!("#{id}"), |c| c.label().to_owned())
}

// ---------------------------------------------------------------------------
// Reference snapshot
// ---------------------------------------------------------------------------

/// The active reference data a draft is validated against.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceSnapshot<'a> {
    pub priorities: &'a [Priority],
    pub statuses: &'a [Status],
}

// ---------------------------------------------------------------------------
// Edit draft
// ---------------------------------------------------------------------------

/// Pending edits to a bug, detached from the committed record.
///
/// Owns copies of everything it shows; nothing here points back into the
/// bug store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditDraft {
    title: String,
    description: String,
    priority_id: Option<i64>,
    status_id: Option<i64>,
    assignee: Assignee,
    // Values the bug had when editing began; they stay selectable even when
    // they have since been disabled.
    original_priority: Option<Priority>,
    original_status: Option<Status>,
}

impl EditDraft {
    /// Blank draft for a new bug.
    pub fn init_empty() -> Self {
        Self::default()
    }

    /// Copy the editable fields of `bug`.
    pub fn init_from_bug(bug: &Bug) -> Self {
        Self {
            title: bug.title.clone(),
            description: bug.description.clone(),
            priority_id: bug.priority_id(),
            status_id: bug.status_id(),
            assignee: bug.assignee.as_ref().map(Assignee::from_user).unwrap_or_default(),
            original_priority: bug.priority.clone(),
            original_status: bug.status.clone(),
        }
    }

    // --- accessors ---

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn priority_id(&self) -> Option<i64> {
        self.priority_id
    }

    pub fn status_id(&self) -> Option<i64> {
        self.status_id
    }

    pub fn assignee(&self) -> &Assignee {
        &self.assignee
    }

    /// True when the editable fields still equal those of `bug`.
    pub fn matches_bug(&self, bug: &Bug) -> bool {
        self.title == bug.title
            && self.description == bug.description
            && self.priority_id == bug.priority_id()
            && self.status_id == bug.status_id()
            && self.assignee.id == bug.assignee_id()
    }

    // --- text fields ---

    /// Set the title, truncating anything past the length cap.
    pub fn set_title(&mut self, title: &str) {
        self.title = truncate_chars(title, TITLE_MAX_CHARS);
    }

    /// Set the description, truncating anything past the length cap.
    pub fn set_description(&mut self, description: &str) {
        self.description = truncate_chars(description, DESCRIPTION_MAX_CHARS);
    }

    /// Append a typed character to the title. Returns `false` at the cap.
    pub fn push_title_char(&mut self, c: char) -> bool {
        push_capped(&mut self.title, c, TITLE_MAX_CHARS)
    }

    pub fn push_description_char(&mut self, c: char) -> bool {
        push_capped(&mut self.description, c, DESCRIPTION_MAX_CHARS)
    }

    pub fn pop_title_char(&mut self) {
        self.title.pop();
    }

    pub fn pop_description_char(&mut self) {
        self.description.pop();
    }

    // --- assignee ---

    /// Replace the assignee with free text; the link to any user is dropped.
    pub fn set_assignee_text(&mut self, text: &str) {
        self.assignee = Assignee::free_text(text);
    }

    pub fn push_assignee_char(&mut self, c: char) {
        let mut text = std::mem::take(&mut self.assignee.display_name);
        text.push(c);
        self.assignee = Assignee::free_text(text);
    }

    pub fn pop_assignee_char(&mut self) {
        let mut text = std::mem::take(&mut self.assignee.display_name);
        text.pop();
        self.assignee = Assignee::free_text(text);
    }

    pub fn choose_assignee(&mut self, user: &User) {
        self.assignee = Assignee::from_user(user);
    }

    pub fn clear_assignee(&mut self) {
        self.assignee = Assignee::default();
    }

    // --- priority / status pickers ---

    pub fn set_priority(&mut self, id: Option<i64>) {
        self.priority_id = id;
    }

    pub fn set_status(&mut self, id: Option<i64>) {
        self.status_id = id;
    }

    pub fn priority_choices(&self, active: &[Priority]) -> Vec<Option<Priority>> {
        choices(active, self.original_priority.as_ref())
    }

    pub fn status_choices(&self, active: &[Status]) -> Vec<Option<Status>> {
        choices(active, self.original_status.as_ref())
    }

    /// Step the priority to the next (or previous) offered choice.
    pub fn cycle_priority(&mut self, active: &[Priority], forward: bool) {
        self.priority_id = cycle(self.priority_id, &self.priority_choices(active), forward);
    }

    pub fn cycle_status(&mut self, active: &[Status], forward: bool) {
        self.status_id = cycle(self.status_id, &self.status_choices(active), forward);
    }

    pub fn priority_label(&self, active: &[Priority]) -> String {
        describe(self.priority_id, active, self.original_priority.as_ref())
    }

    pub fn status_label(&self, active: &[Status]) -> String {
        describe(self.status_id, active, self.original_status.as_ref())
    }

    // --- validation & payloads ---

    /// Check everything the server would otherwise reject.
    pub fn validate(&self, refs: &ReferenceSnapshot<'_>) -> Result<(), WorkflowError> {
        if self.title.trim().is_empty() {
            return Err(WorkflowError::EmptyTitle);
        }
        if self.title.chars().count() > TITLE_MAX_CHARS {
            return Err(WorkflowError::TitleTooLong {
                max: TITLE_MAX_CHARS,
            });
        }
        if self.description.chars().count() > DESCRIPTION_MAX_CHARS {
            return Err(WorkflowError::DescriptionTooLong {
                max: DESCRIPTION_MAX_CHARS,
            });
        }
        if !allowed(self.priority_id, refs.priorities, self.original_priority.as_ref()) {
            return Err(WorkflowError::InvalidPriority(self.priority_id.unwrap_or_default()));
        }
        if !allowed(self.status_id, refs.statuses, self.original_status.as_ref()) {
            return Err(WorkflowError::InvalidStatus(self.status_id.unwrap_or_default()));
        }
        Ok(())
    }

    pub fn to_create_payload(&self, creator_id: Option<i64>) -> CreateBugPayload {
        CreateBugPayload {
            title: self.title.trim().to_owned(),
            description: self.description.clone(),
            priority_id: self.priority_id,
            status_id: self.status_id,
            assignee_id: self.assignee.id,
            created_by_user_id: creator_id,
        }
    }

    pub fn to_update_payload(&self, bug_id: i64) -> UpdateBugPayload {
        UpdateBugPayload {
            id: bug_id,
            title: self.title.trim().to_owned(),
            description: self.description.clone(),
            priority_id: self.priority_id,
            status_id: self.status_id,
            assignee_id: self.assignee.id,
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn push_capped(s: &mut String, c: char, max: usize) -> bool {
    if s.chars().count() >= max {
        return false;
    }
    s.push(c);
    true
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::EnableState;

    fn priority(id: i64, level: &str, state: &str) -> Priority {
        serde_json::from_value(json!({"id": id, "level": level, "status": state})).unwrap()
    }

    fn status(id: i64, label: &str, state: &str) -> Status {
        serde_json::from_value(json!({"id": id, "statusLabel": label, "status": state})).unwrap()
    }

    fn sample_bug() -> Bug {
        serde_json::from_value(json!({
            "id": 12,
            "title": "Crash on save",
            "description": "Stack trace attached",
            "priority": {"id": 9, "level": "Legacy", "status": "disabled"},
            "status": {"id": 1, "statusLabel": "Open", "status": "active"},
            "assignee": {"id": 7, "firstName": "John", "lastName": "Doe"}
        }))
        .unwrap()
    }

    #[test]
    fn init_from_bug_copies_editable_fields() {
        let bug = sample_bug();
        let draft = EditDraft::init_from_bug(&bug);
        assert!(draft.matches_bug(&bug));
        assert_eq!(draft.title(), "Crash on save");
        assert_eq!(draft.priority_id(), Some(9));
        assert_eq!(draft.assignee(), &Assignee {
            id: Some(7),
            display_name: "John Doe".into()
        });
    }

    #[test]
    fn editing_draft_leaves_bug_alone() {
        let bug = sample_bug();
        let before = bug.clone();
        let mut draft = EditDraft::init_from_bug(&bug);
        draft.set_title("Something else");
        draft.clear_assignee();
        assert_eq!(bug, before);
        assert!(!draft.matches_bug(&bug));
    }

    #[test]
    fn title_is_capped() {
        let mut draft = EditDraft::init_empty();
        draft.set_title(&"x".repeat(300));
        assert_eq!(draft.title().chars().count(), TITLE_MAX_CHARS);
        assert!(!draft.push_title_char('y'));
        draft.pop_title_char();
        assert!(draft.push_title_char('y'));
    }

    #[test]
    fn description_cap_counts_chars_not_bytes() {
        let mut draft = EditDraft::init_empty();
        draft.set_description(&"é".repeat(DESCRIPTION_MAX_CHARS + 5));
        assert_eq!(draft.description().chars().count(), DESCRIPTION_MAX_CHARS);
    }

    #[test]
    fn empty_title_is_rejected() {
        let mut draft = EditDraft::init_empty();
        draft.set_title("   ");
        assert_eq!(
            draft.validate(&ReferenceSnapshot::default()),
            Err(WorkflowError::EmptyTitle)
        );
    }

    #[test]
    fn disabled_original_priority_stays_valid() {
        let active = [priority(3, "High", "active")];
        let draft = EditDraft::init_from_bug(&sample_bug());
        let refs = ReferenceSnapshot {
            priorities: &active,
            statuses: &[status(1, "Open", "active")],
        };
        assert_eq!(draft.validate(&refs), Ok(()));
    }

    #[test]
    fn unknown_priority_is_rejected() {
        let mut draft = EditDraft::init_empty();
        draft.set_title("t");
        draft.set_priority(Some(42));
        let active = [priority(3, "High", "active")];
        let refs = ReferenceSnapshot {
            priorities: &active,
            statuses: &[],
        };
        assert_eq!(draft.validate(&refs), Err(WorkflowError::InvalidPriority(42)));
    }

    #[test]
    fn disabled_status_from_list_is_rejected() {
        let mut draft = EditDraft::init_empty();
        draft.set_title("t");
        draft.set_status(Some(5));
        let statuses = [status(5, "Won't fix", "disabled")];
        let refs = ReferenceSnapshot {
            priorities: &[],
            statuses: &statuses,
        };
        assert_eq!(draft.validate(&refs), Err(WorkflowError::InvalidStatus(5)));
    }

    #[test]
    fn priority_choices_include_none_and_original() {
        let draft = EditDraft::init_from_bug(&sample_bug());
        let active = [priority(3, "High", "active"), priority(4, "Low", "active")];
        let ids: Vec<Option<i64>> = draft
            .priority_choices(&active)
            .iter()
            .map(|c| c.as_ref().map(|p| p.id))
            .collect();
        assert_eq!(ids, [None, Some(3), Some(4), Some(9)]);
    }

    #[test]
    fn cycling_wraps_both_ways() {
        let mut draft = EditDraft::init_empty();
        let active = [priority(3, "High", "active"), priority(4, "Low", "active")];
        draft.cycle_priority(&active, true);
        assert_eq!(draft.priority_id(), Some(3));
        draft.cycle_priority(&active, true);
        draft.cycle_priority(&active, true);
        assert_eq!(draft.priority_id(), None);
        draft.cycle_priority(&active, false);
        assert_eq!(draft.priority_id(), Some(4));
        assert_eq!(draft.priority_label(&active), "Low");
    }

    #[test]
    fn typing_unlinks_the_assignee() {
        let mut draft = EditDraft::init_from_bug(&sample_bug());
        draft.push_assignee_char('!');
        assert_eq!(draft.assignee().id, None);
        assert_eq!(draft.assignee().display_name, "John Doe!");
        assert_eq!(draft.to_update_payload(12).assignee_id, None);
    }

    #[test]
    fn create_payload_has_exactly_six_keys() {
        let mut draft = EditDraft::init_empty();
        draft.set_title("Crash on save");
        draft.set_description("...");
        draft.set_priority(Some(3));
        draft.set_status(Some(1));
        let value = serde_json::to_value(draft.to_create_payload(Some(7))).unwrap();
        assert_eq!(
            value,
            json!({
                "title": "Crash on save",
                "description": "...",
                "priorityId": 3,
                "statusId": 1,
                "assigneeId": null,
                "createdByUserId": 7
            })
        );
    }

    #[test]
    fn update_payload_carries_id() {
        let draft = EditDraft::init_from_bug(&sample_bug());
        let value = serde_json::to_value(draft.to_update_payload(12)).unwrap();
        assert_eq!(value["id"], 12);
        assert_eq!(value["assigneeId"], 7);
        assert!(value.get("createdByUserId").is_none());
        assert_eq!(value.as_object().map(serde_json::Map::len), Some(6));
    }

    #[test]
    fn unknown_enable_state_is_not_offered() {
        let draft = EditDraft::init_empty();
        let mut odd = priority(8, "Odd", "active");
        odd.status = EnableState::Unknown;
        assert_eq!(draft.priority_choices(&[odd]).len(), 1);
    }
}
