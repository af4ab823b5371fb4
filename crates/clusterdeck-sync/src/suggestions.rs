//! Repair-suggestion state: the current findings, the per-kind review
//! modals, and the force-apply selection.

use std::collections::BTreeMap;

use tokio::sync::Mutex;
use tracing::debug;

use clusterdeck_api::mutation::{
    DisableServersRequest, EditUrisRequest, ForceApplyRequest, RestartReplicationRequest, UriChange,
};
use clusterdeck_api::suggestions::SuggestionsPage;
use clusterdeck_api::{ApiError, RemoteAccess};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuggestionKind {
    RefineUri,
    ForceApply,
    RestartReplication,
    DisableServers,
}

/// Reason buckets for bulk force-apply selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceApplyReason {
    /// Configuration locked or mismatched.
    ConfigError,
    OperationError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalPhase {
    #[default]
    Closed,
    Reviewing,
    Applying,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalState {
    pub phase: ModalPhase,
    pub error: Option<String>,
}

#[derive(Default)]
struct EngineState {
    page: SuggestionsPage,
    modals: BTreeMap<u8, ModalState>,
    /// Per-uuid selection for force-apply, seeded all-true.
    checked: BTreeMap<String, bool>,
}

impl EngineState {
    fn modal_mut(&mut self, kind: SuggestionKind) -> &mut ModalState {
        self.modals.entry(kind as u8).or_default()
    }
}

/// Holds the latest suggestions and drives the review/apply flows.
///
/// Lists replace wholesale on every successful refresh and clear on a
/// refresh failure or session close. The force-apply selection survives
/// reseeding for uuids that are still suggested.
pub struct SuggestionEngine {
    state: Mutex<EngineState>,
}

impl SuggestionEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(EngineState::default()),
        }
    }

    pub async fn refresh(&self, remote: &dyn RemoteAccess) -> Result<(), ApiError> {
        let page = remote.fetch_suggestions().await?;
        self.apply_page(page).await;
        Ok(())
    }

    pub async fn apply_page(&self, page: SuggestionsPage) {
        let mut state = self.state.lock().await;
        let mut checked = BTreeMap::new();
        for suggestion in &page.force_apply {
            let prior = state.checked.get(&suggestion.uuid).copied();
            checked.insert(suggestion.uuid.clone(), prior.unwrap_or(true));
        }
        state.checked = checked;
        state.page = page;
    }

    pub async fn reset(&self) {
        debug!("clearing suggestion state");
        *self.state.lock().await = EngineState::default();
    }

    /// Drops the lists and selections but keeps any open modal, so a
    /// failed refresh does not yank a dialog out from under the user.
    pub async fn clear_lists(&self) {
        let mut state = self.state.lock().await;
        state.page = SuggestionsPage::default();
        state.checked.clear();
    }

    pub async fn page(&self) -> SuggestionsPage {
        self.state.lock().await.page.clone()
    }

    /// A panel is shown exactly when its list is non-empty.
    pub async fn panel_visible(&self, kind: SuggestionKind) -> bool {
        let state = self.state.lock().await;
        match kind {
            SuggestionKind::RefineUri => !state.page.refine_uri.is_empty(),
            SuggestionKind::ForceApply => !state.page.force_apply.is_empty(),
            SuggestionKind::RestartReplication => !state.page.restart_replication.is_empty(),
            SuggestionKind::DisableServers => !state.page.disable_servers.is_empty(),
        }
    }

    pub async fn modal(&self, kind: SuggestionKind) -> ModalState {
        self.state
            .lock()
            .await
            .modals
            .get(&(kind as u8))
            .cloned()
            .unwrap_or_default()
    }

    pub async fn open(&self, kind: SuggestionKind) {
        let mut state = self.state.lock().await;
        let modal = state.modal_mut(kind);
        modal.phase = ModalPhase::Reviewing;
        modal.error = None;
    }

    pub async fn close(&self, kind: SuggestionKind) {
        let mut state = self.state.lock().await;
        *state.modal_mut(kind) = ModalState::default();
    }

    pub async fn set_checked(&self, uuid: &str, checked: bool) {
        let mut state = self.state.lock().await;
        if let Some(entry) = state.checked.get_mut(uuid) {
            *entry = checked;
        }
    }

    /// Bulk check/uncheck every instance suggested for the given reason.
    pub async fn set_reason_checked(&self, reason: ForceApplyReason, checked: bool) {
        let mut state = self.state.lock().await;
        let uuids: Vec<String> = state
            .page
            .force_apply
            .iter()
            .filter(|s| match reason {
                ForceApplyReason::ConfigError => s.config_locked || s.config_mismatch,
                ForceApplyReason::OperationError => s.operation_error,
            })
            .map(|s| s.uuid.clone())
            .collect();
        for uuid in uuids {
            state.checked.insert(uuid, checked);
        }
    }

    pub async fn checked_uuids(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .checked
            .iter()
            .filter(|(_, checked)| **checked)
            .map(|(uuid, _)| uuid.clone())
            .collect()
    }

    /// Batch advertise-URI fix covering every visible entry.
    pub async fn apply_refine_uri(&self, remote: &dyn RemoteAccess) -> Result<(), ApiError> {
        let changes: Vec<UriChange> = {
            let mut state = self.state.lock().await;
            let modal = state.modal_mut(SuggestionKind::RefineUri);
            if modal.phase != ModalPhase::Reviewing {
                return Err(ApiError::validation("no suggestion modal under review"));
            }
            modal.phase = ModalPhase::Applying;
            state
                .page
                .refine_uri
                .iter()
                .map(|s| UriChange {
                    uuid: s.uuid.clone(),
                    uri: s.uri_new.clone(),
                })
                .collect()
        };

        let result = remote.edit_uris(EditUrisRequest { changes }).await;
        self.finish(SuggestionKind::RefineUri, &result).await;
        result
    }

    /// Submits only the checked instances.
    pub async fn apply_force_apply(&self, remote: &dyn RemoteAccess) -> Result<(), ApiError> {
        let uuids = {
            let mut state = self.state.lock().await;
            let modal = state.modal_mut(SuggestionKind::ForceApply);
            if modal.phase != ModalPhase::Reviewing {
                return Err(ApiError::validation("no suggestion modal under review"));
            }
            modal.phase = ModalPhase::Applying;
            state
                .checked
                .iter()
                .filter(|(_, checked)| **checked)
                .map(|(uuid, _)| uuid.clone())
                .collect::<Vec<_>>()
        };

        let result = remote.force_apply(ForceApplyRequest { uuids }).await;
        self.finish(SuggestionKind::ForceApply, &result).await;
        result
    }

    pub async fn apply_restart_replication(
        &self,
        remote: &dyn RemoteAccess,
    ) -> Result<(), ApiError> {
        let uuids = {
            let mut state = self.state.lock().await;
            let modal = state.modal_mut(SuggestionKind::RestartReplication);
            if modal.phase != ModalPhase::Reviewing {
                return Err(ApiError::validation("no suggestion modal under review"));
            }
            modal.phase = ModalPhase::Applying;
            state
                .page
                .restart_replication
                .iter()
                .map(|s| s.uuid.clone())
                .collect::<Vec<_>>()
        };

        let result = remote
            .restart_replication(RestartReplicationRequest { uuids })
            .await;
        self.finish(SuggestionKind::RestartReplication, &result).await;
        result
    }

    pub async fn apply_disable_servers(&self, remote: &dyn RemoteAccess) -> Result<(), ApiError> {
        let uuids = {
            let mut state = self.state.lock().await;
            let modal = state.modal_mut(SuggestionKind::DisableServers);
            if modal.phase != ModalPhase::Reviewing {
                return Err(ApiError::validation("no suggestion modal under review"));
            }
            modal.phase = ModalPhase::Applying;
            state
                .page
                .disable_servers
                .iter()
                .map(|s| s.uuid.clone())
                .collect::<Vec<_>>()
        };

        let result = remote.disable_servers(DisableServersRequest { uuids }).await;
        self.finish(SuggestionKind::DisableServers, &result).await;
        result
    }

    /// Success closes the modal; failure returns it to review with the
    /// error attached and the selection untouched.
    async fn finish(&self, kind: SuggestionKind, result: &Result<(), ApiError>) {
        let mut state = self.state.lock().await;
        let modal = state.modal_mut(kind);
        match result {
            Ok(()) => *modal = ModalState::default(),
            Err(err) => {
                modal.phase = ModalPhase::Reviewing;
                modal.error = Some(err.message());
            }
        }
    }
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::new()
    }
}
