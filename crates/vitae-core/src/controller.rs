//! Editor state machine
//!
//! The controller owns the only live [`FormSession`] and applies intents to
//! it one at a time. It never performs I/O against the remote store itself:
//! remote work is returned as [`Effect`]s and its answers come back through
//! [`EditorController::complete`]. At most one remote request is outstanding;
//! while it is, the form is read-only.

use serde_json::{Map, Value};
use vitae_form::{FormSession, FormSynthesizer, SectionId, StructureIntrospector, ValidationIssue};
use vitae_store::{
    ExportBundle, LocalStore, Locale, PersistenceError, Reconciliation, ReconciliationConflict,
    ReconciliationEngine, Resolution, Snapshot,
};

use crate::config::EditorConfig;
use crate::error::{EditorError, NetworkError};
use crate::intent::{Completion, Effect, Intent, Ticket};
use crate::remote::SaveOutcome;
use crate::status::StatusMessage;

/// What a fetched document will be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchPurpose {
    /// Nothing cached; the remote copy becomes the session
    Load,
    /// Sync comparison against the local snapshot
    Compare,
    /// Divergence resolved in favour of the remote copy
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    Fetch(FetchPurpose),
    Push,
}

#[derive(Debug, Clone)]
struct Pending {
    ticket: Ticket,
    locale: Locale,
    request: Request,
}

/// Intent-driven owner of the editing session
#[derive(Debug)]
pub struct EditorController {
    synthesizer: FormSynthesizer,
    store: LocalStore,
    engine: ReconciliationEngine,
    locale: Option<Locale>,
    session: Option<FormSession>,
    /// Last loaded or saved document, for `Reset`
    baseline: Option<Value>,
    pending: Option<Pending>,
    conflict: Option<ReconciliationConflict>,
    outbox: Vec<StatusMessage>,
    next_ticket: u64,
}

impl EditorController {
    /// Create controller from its parts
    #[must_use]
    pub fn new(synthesizer: FormSynthesizer, store: LocalStore, engine: ReconciliationEngine) -> Self {
        Self {
            synthesizer,
            store,
            engine,
            locale: None,
            session: None,
            baseline: None,
            pending: None,
            conflict: None,
            outbox: Vec::new(),
            next_ticket: 1,
        }
    }

    /// Create controller from configuration, opening the local store
    ///
    /// # Errors
    /// Returns [`EditorError::Persistence`] if the store cannot be opened
    pub fn from_config(config: &EditorConfig) -> Result<Self, EditorError> {
        let store = config.storage.open()?;
        let synthesizer =
            FormSynthesizer::new(StructureIntrospector::new(config.introspection.clone()));
        let engine = ReconciliationEngine::new(config.reconcile.clone());
        Ok(Self::new(synthesizer, store, engine))
    }

    /// Active locale
    #[inline]
    #[must_use]
    pub fn locale(&self) -> Option<&Locale> {
        self.locale.as_ref()
    }

    /// Live session, `None` until a locale has loaded
    #[inline]
    #[must_use]
    pub fn session(&self) -> Option<&FormSession> {
        self.session.as_ref()
    }

    /// Local cache
    #[inline]
    #[must_use]
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Unresolved divergence from the last sync
    #[inline]
    #[must_use]
    pub fn conflict(&self) -> Option<&ReconciliationConflict> {
        self.conflict.as_ref()
    }

    /// True while a remote request is outstanding
    #[inline]
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.pending.is_some()
    }

    /// Ticket of the outstanding remote request
    #[inline]
    #[must_use]
    pub fn pending_ticket(&self) -> Option<Ticket> {
        self.pending.as_ref().map(|p| p.ticket)
    }

    /// Take every status message produced so far
    pub fn drain_status(&mut self) -> Vec<StatusMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Apply one intent
    ///
    /// Returns remote work to perform. Recoverable failures also leave a
    /// `Danger` status in the outbox.
    ///
    /// # Errors
    /// - [`EditorError::ReadOnly`] for edits while a remote request is outstanding
    /// - [`EditorError::Busy`] for saves, syncs and resolutions in the same state
    /// - [`EditorError::MissingRequired`] if a save finds empty required fields
    /// - [`EditorError::Form`] for unknown paths, lists and sections
    /// - [`EditorError::Persistence`] if the local cache fails
    pub fn handle(&mut self, intent: Intent) -> Result<Vec<Effect>, EditorError> {
        tracing::debug!(?intent, "Handling intent");
        let result = self.apply(intent);
        self.observe(result)
    }

    fn apply(&mut self, intent: Intent) -> Result<Vec<Effect>, EditorError> {
        match intent {
            Intent::EditField { path, value } => {
                self.editable()?.edit(&path, value)?;
                Ok(Vec::new())
            }
            Intent::AddItem { list, defaults } => {
                self.editable()?.add_item(&list, defaults.as_ref())?;
                Ok(Vec::new())
            }
            Intent::RemoveItem { list, index } => {
                self.editable()?.remove_item(&list, index)?;
                Ok(Vec::new())
            }
            Intent::SwitchSection(id) => {
                self.session.as_mut().ok_or(EditorError::NoSession)?.switch_section(&id)?;
                Ok(Vec::new())
            }
            Intent::SwitchLocale(locale) => self.switch_locale(locale),
            Intent::Save => {
                self.idle()?;
                self.save_local()?;
                Ok(Vec::new())
            }
            Intent::Sync => self.sync(),
            Intent::Reset => {
                self.reset()?;
                Ok(Vec::new())
            }
            Intent::Resolve(resolution) => self.resolve(resolution),
            Intent::ClearLocal => {
                self.idle()?;
                let removed = self.store.clear_all()?;
                self.notify(StatusMessage::info(format!("Removed {removed} cached document(s)")));
                Ok(Vec::new())
            }
        }
    }

    /// Record the user-visible side of a failed intent
    fn observe<T>(&mut self, result: Result<T, EditorError>) -> Result<T, EditorError> {
        if let Err(err) = &result {
            if err.is_retryable() {
                tracing::warn!(error = %err, "Recoverable editor failure");
                self.notify(StatusMessage::danger(err.to_string()));
            } else if let EditorError::MissingRequired(paths) = err {
                self.notify(StatusMessage::warning(format!(
                    "{} required field(s) are empty",
                    paths.len()
                )));
            }
        }
        result
    }

    fn notify(&mut self, message: StatusMessage) {
        self.outbox.push(message);
    }

    fn fail(&mut self, err: &EditorError) {
        tracing::warn!(error = %err, "Remote completion failed");
        self.notify(StatusMessage::danger(err.to_string()));
    }

    fn idle(&self) -> Result<(), EditorError> {
        match self.pending {
            Some(_) => Err(EditorError::Busy),
            None => Ok(()),
        }
    }

    fn editable(&mut self) -> Result<&mut FormSession, EditorError> {
        if let Some(pending) = &self.pending {
            return Err(EditorError::ReadOnly(pending.locale.clone()));
        }
        self.session.as_mut().ok_or(EditorError::NoSession)
    }

    fn issue(&mut self, locale: Locale, request: Request) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        if let Some(abandoned) = self.pending.replace(Pending {
            ticket,
            locale,
            request,
        }) {
            tracing::debug!(ticket = %abandoned.ticket, locale = %abandoned.locale, "Abandoning remote request");
        }
        ticket
    }

    fn fetch(&mut self, locale: Locale, purpose: FetchPurpose) -> Effect {
        let ticket = self.issue(locale.clone(), Request::Fetch(purpose));
        Effect::Fetch { ticket, locale }
    }

    fn push(&mut self, locale: Locale, document: Value) -> Effect {
        let ticket = self.issue(locale.clone(), Request::Push);
        Effect::Push {
            ticket,
            locale,
            document,
        }
    }

    /// Replace the session with one built over `document`
    fn load(&mut self, document: Value) -> Result<(), EditorError> {
        let session = self.synthesizer.synthesize(document.clone())?;
        self.session = Some(session);
        self.baseline = Some(document);
        Ok(())
    }

    /// Load `document` and cache it for `locale`
    ///
    /// Nothing is cached and the current session is kept unless the document
    /// can be turned into a form.
    fn adopt(&mut self, locale: &Locale, document: Value) -> Result<(), EditorError> {
        let session = self.synthesizer.synthesize(document.clone())?;
        self.store.put(locale, &document)?;
        self.session = Some(session);
        self.baseline = Some(document);
        Ok(())
    }

    fn switch_locale(&mut self, locale: Locale) -> Result<Vec<Effect>, EditorError> {
        let loaded = self.session.is_some() && self.pending.is_none();
        if loaded && self.locale.as_ref() == Some(&locale) {
            return Ok(Vec::new());
        }

        if let Some(abandoned) = self.pending.take() {
            tracing::debug!(ticket = %abandoned.ticket, locale = %abandoned.locale, "Abandoning remote request");
        }
        self.locale = Some(locale.clone());
        self.session = None;
        self.baseline = None;
        self.conflict = None;

        match self.store.get(&locale) {
            Ok(Some(snapshot)) => {
                self.load(snapshot.document)?;
                tracing::info!(locale = %locale, "Loaded from local cache");
                self.notify(StatusMessage::info(format!("Loaded '{locale}' from the local cache")));
                Ok(Vec::new())
            }
            Ok(None) => Ok(vec![self.fetch(locale, FetchPurpose::Load)]),
            Err(err @ PersistenceError::Corrupt { .. }) => {
                tracing::warn!(locale = %locale, error = %err, "Cached document unreadable");
                self.notify(StatusMessage::warning(format!(
                    "Cached copy of '{locale}' is unreadable; loading the remote copy"
                )));
                Ok(vec![self.fetch(locale, FetchPurpose::Load)])
            }
            Err(err) => Err(err.into()),
        }
    }

    fn save_local(&mut self) -> Result<Snapshot, EditorError> {
        let locale = self.locale.clone().ok_or(EditorError::NoSession)?;
        let session = self.session.as_mut().ok_or(EditorError::NoSession)?;

        let document = session.extract_document();
        let missing = session.missing_required();
        session.clear_validation_issues();
        if !missing.is_empty() {
            session.apply_validation_issues(
                missing.iter().map(|path| ValidationIssue::new(path.to_string(), "required")),
            );
            return Err(EditorError::MissingRequired(missing));
        }

        let snapshot = self.store.put(&locale, &document)?;
        self.baseline = Some(document);
        tracing::info!(locale = %locale, fingerprint = %snapshot.fingerprint(), "Saved locally");
        self.notify(StatusMessage::success(format!("Saved '{locale}' locally")));
        Ok(snapshot)
    }

    fn sync(&mut self) -> Result<Vec<Effect>, EditorError> {
        self.idle()?;
        let snapshot = self.save_local()?;
        self.conflict = None;
        self.notify(StatusMessage::info(format!(
            "Comparing '{}' with the remote copy",
            snapshot.locale
        )));
        Ok(vec![self.fetch(snapshot.locale, FetchPurpose::Compare)])
    }

    fn reset(&mut self) -> Result<(), EditorError> {
        if let Some(pending) = &self.pending {
            return Err(EditorError::ReadOnly(pending.locale.clone()));
        }
        let baseline = self.baseline.clone().ok_or(EditorError::NoSession)?;
        let active = self.session.as_ref().map(|s| s.active_section().id.clone());
        self.load(baseline)?;
        if let (Some(id), Some(session)) = (active, self.session.as_mut()) {
            if session.switch_section(&id).is_err() {
                tracing::debug!(section = %id, "Section gone after reset");
            }
        }
        self.notify(StatusMessage::info("Discarded unsaved changes"));
        Ok(())
    }

    fn resolve(&mut self, resolution: Resolution) -> Result<Vec<Effect>, EditorError> {
        self.idle()?;
        let Some(conflict) = self.conflict.clone() else {
            self.notify(StatusMessage::info("Nothing to resolve"));
            return Ok(Vec::new());
        };
        tracing::info!(locale = %conflict.locale, ?resolution, "Resolving divergence");
        match resolution {
            Resolution::PushLocal => {
                let snapshot = self.save_local()?;
                Ok(vec![self.push(snapshot.locale, snapshot.document)])
            }
            Resolution::PullRemote => Ok(vec![self.fetch(conflict.locale, FetchPurpose::Replace)]),
        }
    }

    /// Apply the answer to a remote request
    ///
    /// Answers to anything but the outstanding request for the active locale
    /// are dropped without touching the session. May return follow-up work.
    pub fn complete(&mut self, completion: Completion) -> Vec<Effect> {
        let pending = match self.pending.take() {
            Some(p) if p.ticket == completion.ticket() && p.locale == *completion.locale() => p,
            other => {
                self.pending = other;
                tracing::debug!(
                    ticket = %completion.ticket(),
                    locale = %completion.locale(),
                    "Discarding stale completion"
                );
                return Vec::new();
            }
        };

        match (pending.request, completion) {
            (Request::Fetch(purpose), Completion::Fetched { locale, result, .. }) => {
                self.fetched(purpose, &locale, result)
            }
            (Request::Push, Completion::Pushed { locale, result, .. }) => {
                self.pushed(&locale, result);
                Vec::new()
            }
            (request, completion) => {
                tracing::error!(?request, ticket = %completion.ticket(), "Completion kind does not match request");
                Vec::new()
            }
        }
    }

    fn fetched(
        &mut self,
        purpose: FetchPurpose,
        locale: &Locale,
        result: Result<Option<Value>, NetworkError>,
    ) -> Vec<Effect> {
        let remote = match result {
            Ok(remote) => remote,
            Err(err) => {
                self.fail(&err.into());
                return Vec::new();
            }
        };

        match (purpose, remote) {
            (FetchPurpose::Load, Some(document)) => match self.adopt(locale, document) {
                Ok(()) => {
                    tracing::info!(locale = %locale, "Loaded from remote");
                    self.notify(StatusMessage::success(format!("Loaded '{locale}' from the remote")));
                }
                Err(err) => self.fail(&err),
            },
            (FetchPurpose::Load, None) => match self.load(Value::Object(Map::new())) {
                Ok(()) => self.notify(StatusMessage::warning(format!(
                    "No document for '{locale}' yet; starting empty"
                ))),
                Err(err) => self.fail(&err),
            },
            (FetchPurpose::Compare, remote) => return self.compare(locale, remote.as_ref()),
            (FetchPurpose::Replace, Some(document)) => match self.adopt(locale, document) {
                Ok(()) => {
                    self.conflict = None;
                    tracing::info!(locale = %locale, "Local copy replaced by remote");
                    self.notify(StatusMessage::success(format!(
                        "Replaced the local copy of '{locale}' with the remote one"
                    )));
                }
                Err(err) => self.fail(&err),
            },
            (FetchPurpose::Replace, None) => {
                self.notify(StatusMessage::warning(format!("The remote has no copy of '{locale}'")));
            }
        }
        Vec::new()
    }

    fn compare(&mut self, locale: &Locale, remote: Option<&Value>) -> Vec<Effect> {
        let local = match self.store.get(locale) {
            Ok(local) => local,
            Err(err) => {
                self.fail(&err.into());
                return Vec::new();
            }
        };

        match self.engine.reconcile(local.as_ref(), remote) {
            Reconciliation::NoLocal => {
                self.notify(StatusMessage::info(format!("Nothing cached for '{locale}'")));
                Vec::new()
            }
            Reconciliation::RemoteMissing => {
                let Some(snapshot) = local else {
                    return Vec::new();
                };
                self.notify(StatusMessage::info(format!(
                    "The remote has no copy of '{locale}'; uploading"
                )));
                vec![self.push(snapshot.locale, snapshot.document)]
            }
            Reconciliation::InSync => {
                tracing::info!(locale = %locale, "In sync");
                self.notify(StatusMessage::success(format!("'{locale}' is in sync")));
                Vec::new()
            }
            Reconciliation::Diverged(conflict) => {
                self.notify(StatusMessage::warning(conflict.to_string()));
                self.conflict = Some(conflict);
                Vec::new()
            }
        }
    }

    fn pushed(&mut self, locale: &Locale, result: Result<SaveOutcome, NetworkError>) {
        match result {
            Ok(SaveOutcome::Accepted { message }) => {
                self.conflict = None;
                tracing::info!(locale = %locale, "Remote copy updated");
                self.notify(StatusMessage::success(message));
            }
            Ok(SaveOutcome::Rejected(issues)) => {
                let total = issues.len();
                let attached = self.session.as_mut().map_or(0, |session| {
                    session.clear_validation_issues();
                    session.apply_validation_issues(issues)
                });
                tracing::warn!(locale = %locale, total, attached, "Remote rejected document");
                self.notify(StatusMessage::danger(format!(
                    "The remote rejected '{locale}' with {total} issue(s)"
                )));
            }
            Err(err) => self.fail(&err.into()),
        }
    }

    /// Every cached locale and document
    ///
    /// # Errors
    /// Returns [`EditorError::Persistence`] if the cache cannot be read
    pub fn export_bundle(&mut self) -> Result<ExportBundle, EditorError> {
        let result = self.store.export_all().map_err(EditorError::from);
        self.observe(result)
    }

    /// Merge a bundle into the cache
    ///
    /// Rebuilds the session if the active locale was part of the bundle.
    ///
    /// # Errors
    /// - [`EditorError::Busy`] while a remote request is outstanding
    /// - [`EditorError::Persistence`] if the import fails; nothing is changed
    pub fn import_bundle(&mut self, bundle: &ExportBundle) -> Result<Vec<Locale>, EditorError> {
        let result = self.import(bundle);
        self.observe(result)
    }

    fn import(&mut self, bundle: &ExportBundle) -> Result<Vec<Locale>, EditorError> {
        self.idle()?;
        let imported = self.store.import_all(bundle)?;

        let active = self.locale.clone().filter(|l| imported.contains(l));
        if let Some(locale) = active {
            if let Some(snapshot) = self.store.get(&locale)? {
                self.load(snapshot.document)?;
                self.conflict = None;
                tracing::info!(locale = %locale, "Active locale replaced by import");
            }
        }
        self.notify(StatusMessage::success(format!("Imported {} locale(s)", imported.len())));
        Ok(imported)
    }

    /// Id of the active section, if a session is loaded
    #[must_use]
    pub fn active_section(&self) -> Option<&SectionId> {
        self.session.as_ref().map(|s| &s.active_section().id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusLevel;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn locale(code: &str) -> Locale {
        Locale::new(code).unwrap()
    }

    fn controller() -> EditorController {
        EditorController::new(
            FormSynthesizer::default(),
            LocalStore::in_memory(),
            ReconciliationEngine::default(),
        )
    }

    fn fetched(effect: &Effect, document: Option<Value>) -> Completion {
        Completion::Fetched {
            ticket: effect.ticket(),
            locale: effect.locale().clone(),
            result: Ok(document),
        }
    }

    #[test]
    fn uncached_locale_loads_from_remote() {
        let mut editor = controller();
        let effects = editor.handle(Intent::SwitchLocale(locale("pt"))).unwrap();
        assert_eq!(effects.len(), 1);
        assert!(editor.is_read_only());

        let err = editor
            .handle(Intent::EditField {
                path: "name".parse().unwrap(),
                value: json!("x"),
            })
            .unwrap_err();
        assert!(matches!(err, EditorError::ReadOnly(_)));

        let follow_up = editor.complete(fetched(&effects[0], Some(json!({"name": "Ana"}))));
        assert!(follow_up.is_empty());
        assert!(!editor.is_read_only());
        assert_eq!(editor.session().unwrap().document(), &json!({"name": "Ana"}));
        assert!(editor.store().get(&locale("pt")).unwrap().is_some());
    }

    #[test]
    fn cached_locale_needs_no_fetch() {
        let mut editor = controller();
        editor.store().put(&locale("en"), &json!({"name": "Ann"})).unwrap();
        let effects = editor.handle(Intent::SwitchLocale(locale("en"))).unwrap();
        assert!(effects.is_empty());
        assert_eq!(editor.drain_status()[0].level, StatusLevel::Info);
        assert!(editor.drain_status().is_empty());
    }

    #[test]
    fn missing_remote_document_starts_empty() {
        let mut editor = controller();
        let effects = editor.handle(Intent::SwitchLocale(locale("es"))).unwrap();
        editor.complete(fetched(&effects[0], None));
        assert_eq!(editor.session().unwrap().document(), &json!({}));
        assert_eq!(editor.sections_len(), 1);
    }

    #[test]
    fn unknown_ticket_is_ignored() {
        let mut editor = controller();
        let effects = editor.handle(Intent::SwitchLocale(locale("pt"))).unwrap();
        let bogus = Completion::Fetched {
            ticket: Ticket(999),
            locale: locale("pt"),
            result: Ok(Some(json!({"name": "Mallory"}))),
        };
        editor.complete(bogus);
        assert!(editor.is_read_only());
        assert_eq!(editor.pending_ticket(), Some(effects[0].ticket()));
    }

    #[test]
    fn save_refuses_missing_required() {
        let mut editor = controller();
        editor.store().put(&locale("pt"), &json!({"name": "Ana", "email": ""})).unwrap();
        editor.handle(Intent::SwitchLocale(locale("pt"))).unwrap();
        editor
            .handle(Intent::EditField {
                path: "name".parse().unwrap(),
                value: json!("  "),
            })
            .unwrap();

        let err = editor.handle(Intent::Save).unwrap_err();
        let EditorError::MissingRequired(paths) = err else {
            panic!("expected missing required");
        };
        assert_eq!(paths.len(), 2);
        let session = editor.session().unwrap();
        assert_eq!(session.field(&"name".parse().unwrap()).unwrap().issue(), Some("required"));
        assert_eq!(
            editor.store().get(&locale("pt")).unwrap().unwrap().document["name"],
            json!("Ana")
        );
    }

    #[test]
    fn reset_restores_last_saved_document() {
        let mut editor = controller();
        editor.store().put(&locale("pt"), &json!({"name": "Ana", "city": "Rio"})).unwrap();
        editor.handle(Intent::SwitchLocale(locale("pt"))).unwrap();
        editor
            .handle(Intent::EditField {
                path: "city".parse().unwrap(),
                value: json!("Lisboa"),
            })
            .unwrap();
        editor.handle(Intent::Reset).unwrap();
        assert_eq!(editor.session().unwrap().document()["city"], json!("Rio"));
    }

    #[test]
    fn resolve_without_conflict_is_a_no_op() {
        let mut editor = controller();
        editor.store().put(&locale("pt"), &json!({"name": "Ana"})).unwrap();
        editor.handle(Intent::SwitchLocale(locale("pt"))).unwrap();
        editor.drain_status();
        let effects = editor.handle(Intent::Resolve(Resolution::PushLocal)).unwrap();
        assert!(effects.is_empty());
        assert_eq!(editor.drain_status(), vec![StatusMessage::info("Nothing to resolve")]);
    }

    impl EditorController {
        fn sections_len(&self) -> usize {
            self.session.as_ref().map_or(0, |s| s.sections().len())
        }
    }
}
