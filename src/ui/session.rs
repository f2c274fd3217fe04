use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::error::OutreachError;
use crate::map::MapEvent;
use crate::model::Company;

/// Quiet period after the last edit before a save is issued.
pub const AUTOSAVE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub enum SaveStatus {
    Saved,
    Pending,
    Saving,
    Failed(String),
}

/// The single writer for one company while it is open in the editor.
/// Edits apply to the working copy immediately; saves are debounced and at
/// most one is in flight at a time.
pub struct EditorSession {
    company: Company,
    revision: u64,
    saved_revision: u64,
    in_flight: Option<u64>,
    last_edit: Option<Instant>,
    status: SaveStatus,
}

impl EditorSession {
    pub fn new(company: Company) -> Self {
        Self {
            company,
            revision: 0,
            saved_revision: 0,
            in_flight: None,
            last_edit: None,
            status: SaveStatus::Saved,
        }
    }

    pub fn company(&self) -> &Company {
        &self.company
    }

    pub fn status(&self) -> &SaveStatus {
        &self.status
    }

    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    /// Runs `f` against the working copy. Only an actual change counts as an
    /// edit and restarts the autosave timer.
    pub fn edit<R>(&mut self, now: Instant, f: impl FnOnce(&mut Company) -> R) -> R {
        let before = self.company.clone();
        let result = f(&mut self.company);
        if self.company != before {
            self.touch(now);
        }
        result
    }

    pub fn apply_map_event(&mut self, now: Instant, event: MapEvent) {
        match event {
            MapEvent::CountryToggled(name) => self.edit(now, |c| c.toggle_highlight(&name)),
            MapEvent::PinMoved { id, lat, lng } => {
                if !self.edit(now, |c| c.move_pin(&id, lat, lng)) {
                    log::warn!("pin {} no longer exists", id);
                }
            }
        }
    }

    fn touch(&mut self, now: Instant) {
        self.revision += 1;
        self.last_edit = Some(now);
        if self.in_flight.is_none() {
            self.status = SaveStatus::Pending;
        }
    }

    /// A snapshot to persist, once the working copy has been quiet for
    /// [`AUTOSAVE_DELAY`] and no earlier save is still running.
    pub fn poll_save(&mut self, now: Instant) -> Option<(u64, Company)> {
        if !self.is_dirty() || self.in_flight.is_some() {
            return None;
        }
        let last_edit = self.last_edit?;
        if now.duration_since(last_edit) < AUTOSAVE_DELAY {
            return None;
        }
        self.in_flight = Some(self.revision);
        self.status = SaveStatus::Saving;
        Some((self.revision, self.company.clone()))
    }

    /// Time left until [`poll_save`](Self::poll_save) would fire.
    pub fn time_until_save(&self, now: Instant) -> Option<Duration> {
        if !self.is_dirty() || self.in_flight.is_some() {
            return None;
        }
        self.last_edit
            .map(|t| AUTOSAVE_DELAY.saturating_sub(now.duration_since(t)))
    }

    /// Records the outcome of a save. A failure keeps the working copy and
    /// waits for the next edit or an explicit [`retry`](Self::retry).
    pub fn save_finished(&mut self, revision: u64, result: Result<(), OutreachError>) {
        if self.in_flight != Some(revision) {
            if let Err(e) = result {
                log::error!("background save of {} failed: {}", self.company.name, e);
            }
            return;
        }
        self.in_flight = None;
        match result {
            Ok(()) => {
                self.saved_revision = self.saved_revision.max(revision);
                self.status = if self.is_dirty() {
                    SaveStatus::Pending
                } else {
                    SaveStatus::Saved
                };
            }
            Err(e) => {
                log::error!("saving {} failed: {}", self.company.name, e);
                self.last_edit = None;
                self.status = SaveStatus::Failed(e.to_string());
            }
        }
    }

    pub fn retry(&mut self, now: Instant) {
        if self.is_dirty() && self.in_flight.is_none() {
            self.last_edit = Some(now.checked_sub(AUTOSAVE_DELAY).unwrap_or(now));
            self.status = SaveStatus::Pending;
        }
    }
}

/// Working copies flushed on the way out of the editor whose save was
/// rejected. They stay here until a retry lands or the company is reopened.
#[derive(Default)]
pub struct UnsavedCompanies {
    failed: BTreeMap<String, (Company, String)>,
}

impl UnsavedCompanies {
    pub fn flush_finished(&mut self, company: Company, result: Result<(), OutreachError>) {
        match result {
            Ok(()) => {
                self.failed.remove(&company.id);
            }
            Err(e) => {
                log::error!("saving {} after leaving the editor failed: {}", company.name, e);
                self.failed.insert(company.id.clone(), (company, e.to_string()));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.failed.is_empty()
    }

    /// One line per company, naming it and the store's reason.
    pub fn messages(&self) -> Vec<String> {
        self.failed
            .values()
            .map(|(company, error)| format!("Could not save {}: {}", company.name, error))
            .collect()
    }

    /// Hands every rejected copy back for another attempt.
    pub fn take_all(&mut self) -> Vec<Company> {
        std::mem::take(&mut self.failed).into_values().map(|(company, _)| company).collect()
    }

    /// The rejected copy of `id`, if any, for the editor to pick up again.
    pub fn take(&mut self, id: &str) -> Option<Company> {
        self.failed.remove(id).map(|(company, _)| company)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (EditorSession, Instant) {
        (EditorSession::new(Company::new_default("Sibanye Stillwater")), Instant::now())
    }

    #[test]
    fn saves_once_the_editor_goes_quiet() {
        let (mut session, t0) = session();
        session.edit(t0, |c| c.description = "PGMs".to_string());
        session.edit(t0 + Duration::from_millis(600), |c| c.description = "PGMs and gold".to_string());

        assert!(session.poll_save(t0 + Duration::from_millis(1200)).is_none());
        assert_eq!(
            session.time_until_save(t0 + Duration::from_millis(1200)),
            Some(Duration::from_millis(400))
        );

        let (revision, snapshot) = session.poll_save(t0 + Duration::from_millis(1600)).unwrap();
        assert_eq!(snapshot.description, "PGMs and gold");
        assert_eq!(session.status(), &SaveStatus::Saving);

        session.save_finished(revision, Ok(()));
        assert_eq!(session.status(), &SaveStatus::Saved);
        assert!(!session.is_dirty());
    }

    #[test]
    fn no_op_edits_do_not_schedule_a_save() {
        let (mut session, t0) = session();
        let name = session.company().name.clone();
        session.edit(t0, |c| c.name = name);
        assert!(!session.is_dirty());
        assert!(session.poll_save(t0 + AUTOSAVE_DELAY).is_none());
    }

    #[test]
    fn edits_during_a_save_trigger_another() {
        let (mut session, t0) = session();
        session.edit(t0, |c| c.toggle_highlight("Zimbabwe"));
        let (first, _) = session.poll_save(t0 + AUTOSAVE_DELAY).unwrap();

        let t1 = t0 + Duration::from_millis(1100);
        session.edit(t1, |c| c.toggle_highlight("Zambia"));
        assert!(session.poll_save(t1 + AUTOSAVE_DELAY).is_none());

        session.save_finished(first, Ok(()));
        assert_eq!(session.status(), &SaveStatus::Pending);
        let (_, snapshot) = session.poll_save(t1 + AUTOSAVE_DELAY).unwrap();
        assert_eq!(snapshot.highlighted_countries, vec!["Zimbabwe", "Zambia"]);
    }

    #[test]
    fn failed_save_keeps_the_edit_and_can_be_retried() {
        let (mut session, t0) = session();
        session.edit(t0, |c| c.name = "Sibanye-Stillwater".to_string());
        let (revision, _) = session.poll_save(t0 + AUTOSAVE_DELAY).unwrap();

        session.save_finished(revision, Err(OutreachError::Persistence("disk full".into())));
        assert!(matches!(session.status(), SaveStatus::Failed(msg) if msg.contains("disk full")));
        assert_eq!(session.company().name, "Sibanye-Stillwater");
        assert!(session.poll_save(t0 + Duration::from_secs(10)).is_none());

        let t1 = t0 + Duration::from_secs(10);
        session.retry(t1);
        assert!(session.poll_save(t1).is_some());
    }

    #[test]
    fn map_events_edit_the_working_copy() {
        let (mut session, t0) = session();
        let id = session.edit(t0, |c| c.add_location().id.clone());

        session.apply_map_event(t0, MapEvent::PinMoved { id: id.clone(), lat: -26.2, lng: 28.0 });
        session.apply_map_event(t0, MapEvent::CountryToggled("South Africa".to_string()));

        let location = session.company().location(&id).unwrap();
        assert_eq!((location.lat, location.lng), (-26.2, 28.0));
        assert!(session.company().is_highlighted("South Africa"));
    }

    #[test]
    fn rejected_flush_is_kept_and_reported() {
        let mut unsaved = UnsavedCompanies::default();
        let mut company = Company::new_default("Glencore");
        company.description = "Edited just before leaving".to_string();

        unsaved.flush_finished(company.clone(), Err(OutreachError::Persistence("read-only".into())));
        assert!(!unsaved.is_empty());
        let messages = unsaved.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Glencore") && messages[0].contains("read-only"));

        let retried = unsaved.take_all();
        assert_eq!(retried, vec![company.clone()]);
        assert!(unsaved.is_empty());

        unsaved.flush_finished(company.clone(), Err(OutreachError::Persistence("read-only".into())));
        assert_eq!(unsaved.take(&company.id), Some(company.clone()));
        assert_eq!(unsaved.take(&company.id), None);
    }

    #[test]
    fn successful_flush_clears_an_earlier_failure() {
        let mut unsaved = UnsavedCompanies::default();
        let company = Company::new_default("Glencore");
        unsaved.flush_finished(company.clone(), Err(OutreachError::Persistence("busy".into())));
        unsaved.flush_finished(company, Ok(()));
        assert!(unsaved.is_empty());
    }
}
