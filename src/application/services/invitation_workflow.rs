//! # Invitation Workflow
//!
//! Moves service requests from `CREADA` to `COTIZANDO` by inviting the best
//! ranked providers.
//!
//! # Flow
//!
//! ```text
//! CREADA request
//!   ├── assigned provider? ──► invite that provider only
//!   └── resolve category ──► select Top-N ──► COTIZANDO ──► invite each
//!                                  │
//!                                  └── nobody eligible: stays CREADA
//! ```
//!
//! Invitations are sent through the [`InvitationSender`] port. A failed call
//! is logged and reported with `enviado = false`; the batch keeps going. One
//! invitation row is recorded per (request, provider, round) and providers
//! already invited in the current round are never invited twice.
//!
//! A cancelled request can be requoted: it reopens in `COTIZANDO` with the
//! next round number and invites a fresh Top-N, skipping providers that
//! already quoted and the directly assigned provider.
//!
//! After a batch, the per-request results are handed to the
//! [`Top3Publisher`].

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::provider_ranking::ProviderRanker;
use crate::application::services::top3_publisher::Top3Publisher;
use crate::config::InvitationSettings;
use crate::domain::entities::{Invitation, Provider, ServiceRequest};
use crate::domain::value_objects::{
    CategoryId, ProviderId, RequestId, RequestStatus, SkillId, Timestamp, UserId,
};
use crate::infrastructure::integrations::payloads::InvitationRecord;
use crate::infrastructure::integrations::traits::InvitationSender;
use crate::infrastructure::persistence::{
    CatalogRepository, InvitationRepository, ProviderRepository, ServiceRequestRepository,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

const INVITE_MESSAGE: &str = "Invitación a cotizar";
const DIRECT_ASSIGNMENT_MESSAGE: &str = "Asignación directa de la solicitud por favor cotizar";
const ADDITIONAL_INVITE_MESSAGE: &str = "Invitación adicional a cotizar";
const REQUOTE_MESSAGE: &str = "Recotización: invitación a cotizar";

/// Outcome of processing one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Top3Result {
    /// Processed request.
    #[serde(rename = "solicitudId")]
    pub request_id: RequestId,
    /// Request description.
    #[serde(rename = "descripcion")]
    pub description: String,
    /// Status after processing.
    #[serde(rename = "estado")]
    pub status: RequestStatus,
    /// Whether the request has entered quoting.
    #[serde(rename = "fueCotizada")]
    pub quoted: bool,
    /// Whether the request is critical.
    #[serde(rename = "esCritica")]
    pub critical: bool,
    /// Invitations issued, best ranked first.
    pub top3: Vec<InvitationRecord>,
}

impl Top3Result {
    /// Result for a request as it stands, with the given invitations.
    #[must_use]
    pub fn new(request: &ServiceRequest, invitations: Vec<InvitationRecord>) -> Self {
        Self {
            request_id: request.id(),
            description: request.description().to_string(),
            status: request.status(),
            quoted: request.was_quoted(),
            critical: request.is_critical(),
            top3: invitations,
        }
    }

    /// Result for a request that got no invitations.
    #[must_use]
    pub fn empty(request: &ServiceRequest) -> Self {
        Self::new(request, Vec::new())
    }
}

/// A "request created" event pushed by the requests module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCreatedEvent {
    /// Upstream request id.
    #[serde(alias = "solicitudId")]
    pub solicitud_id: RequestId,
    /// Requesting user.
    #[serde(default, alias = "usuarioId")]
    pub usuario_id: Option<UserId>,
    /// Requested skill.
    #[serde(default, alias = "habilidadId")]
    pub habilidad_id: Option<SkillId>,
    /// Category, when the requests module already knows it.
    #[serde(default, alias = "rubroId", alias = "rubro_id")]
    pub rubro: Option<CategoryId>,
    /// Short title.
    #[serde(default)]
    pub titulo: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Initial status; `CREADA` when missing or unknown.
    #[serde(default)]
    pub estado: Option<String>,
    /// Critical flag.
    #[serde(default, alias = "esCritica")]
    pub es_critica: Option<bool>,
    /// Urgent flag, treated as critical.
    #[serde(default, alias = "esUrgente")]
    pub es_urgente: Option<bool>,
    /// Provider chosen directly by the requester.
    #[serde(default, alias = "prestadorId", alias = "prestador_asignado_id")]
    pub prestador_id: Option<ProviderId>,
    /// Already-quoted flag.
    #[serde(default, alias = "fueCotizada")]
    pub fue_cotizada: Option<bool>,
}

impl RequestCreatedEvent {
    /// Creates an event with only the id set.
    #[must_use]
    pub fn new(solicitud_id: RequestId) -> Self {
        Self {
            solicitud_id,
            usuario_id: None,
            habilidad_id: None,
            rubro: None,
            titulo: None,
            descripcion: None,
            estado: None,
            es_critica: None,
            es_urgente: None,
            prestador_id: None,
            fue_cotizada: None,
        }
    }

    fn status(&self) -> RequestStatus {
        self.estado
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| s.parse().ok())
            .unwrap_or(RequestStatus::Created)
    }

    fn is_critical(&self) -> bool {
        self.es_urgente == Some(true) || self.es_critica == Some(true)
    }
}

/// Invitation workflow service.
#[derive(Debug, Clone)]
pub struct InvitationWorkflow {
    requests: Arc<dyn ServiceRequestRepository>,
    providers: Arc<dyn ProviderRepository>,
    invitations: Arc<dyn InvitationRepository>,
    catalog: Arc<dyn CatalogRepository>,
    ranker: ProviderRanker,
    sender: Arc<dyn InvitationSender>,
    publisher: Top3Publisher,
    limits: InvitationSettings,
}

impl InvitationWorkflow {
    /// Creates the workflow with default invitation limits.
    #[must_use]
    pub fn new(
        requests: Arc<dyn ServiceRequestRepository>,
        providers: Arc<dyn ProviderRepository>,
        invitations: Arc<dyn InvitationRepository>,
        catalog: Arc<dyn CatalogRepository>,
        ranker: ProviderRanker,
        sender: Arc<dyn InvitationSender>,
        publisher: Top3Publisher,
    ) -> Self {
        Self {
            requests,
            providers,
            invitations,
            catalog,
            ranker,
            sender,
            publisher,
            limits: InvitationSettings::default(),
        }
    }

    /// Sets the invitation limits.
    #[must_use]
    pub fn with_limits(mut self, limits: InvitationSettings) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the invitation limits.
    #[inline]
    #[must_use]
    pub fn limits(&self) -> &InvitationSettings {
        &self.limits
    }

    /// Invites the Top-N providers for every `CREADA` request.
    ///
    /// # Errors
    ///
    /// Returns an error only if the created requests cannot be loaded;
    /// per-request failures are logged and reported as empty results.
    pub async fn invite_top3_for_created(&self) -> ApplicationResult<Vec<Top3Result>> {
        let created = self.requests.find_by_status(RequestStatus::Created).await?;
        tracing::info!(count = created.len(), "processing created requests");
        Ok(self.process_batch(created).await)
    }

    /// Stores new requests from creation events and runs the workflow on them.
    ///
    /// Requests whose id already exists are returned untouched. The returned
    /// list reflects the state after processing, in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if the requests cannot be stored or reloaded.
    pub async fn create_from_events(
        &self,
        events: Vec<RequestCreatedEvent>,
    ) -> ApplicationResult<Vec<ServiceRequest>> {
        let mut ids = Vec::with_capacity(events.len());
        let mut fresh = Vec::new();

        for event in &events {
            let request = self.request_from_event(event).await?;
            if self.requests.insert_if_absent(&request).await? {
                tracing::info!(request_id = %request.id(), status = %request.status(), "request created");
                fresh.push(request);
            } else {
                tracing::debug!(request_id = %request.id(), "request already exists, skipping");
            }
            ids.push(event.solicitud_id);
        }

        if !fresh.is_empty() {
            self.process_batch(fresh).await;
        }

        let mut stored = Vec::with_capacity(ids.len());
        for id in ids {
            let request = self
                .requests
                .get(id)
                .await?
                .ok_or_else(|| ApplicationError::internal(format!("request {id} vanished")))?;
            stored.push(request);
        }
        Ok(stored)
    }

    /// Cancels a request.
    ///
    /// Returns `false` if it was already cancelled.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown request and a state transition
    /// error for a completed one.
    pub async fn cancel(&self, request_id: RequestId) -> ApplicationResult<bool> {
        let mut request = self.load(request_id).await?;
        let changed = request.cancel()?;
        if changed {
            self.requests.save(&request).await?;
            tracing::info!(request_id = %request_id, "request cancelled");
        } else {
            tracing::info!(request_id = %request_id, "request already cancelled");
        }
        Ok(changed)
    }

    /// Invites one more provider to a request in `COTIZANDO`.
    ///
    /// Returns `None` when the round is full or no candidate is left.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown request and `InvalidState` when the
    /// request is not quoting.
    pub async fn invite_additional(
        &self,
        request_id: RequestId,
    ) -> ApplicationResult<Option<InvitationRecord>> {
        let mut request = self.load(request_id).await?;
        if request.status() != RequestStatus::Quoting {
            return Err(ApplicationError::invalid_state(format!(
                "request {} is {}, additional invitations need COTIZANDO",
                request_id,
                request.status()
            )));
        }

        let invited = self.invited_in_round(&request).await?;
        let max = self.limits.max_for(request.is_critical());
        if invited.len() >= max {
            tracing::debug!(
                request_id = %request_id,
                round = request.round(),
                max,
                "round already at invitation cap"
            );
            return Ok(None);
        }

        let category = self.resolve_category(&request).await?;
        let mut skip = invited;
        skip.extend(request.assigned_provider_id());
        let Some(chosen) = self
            .ranker
            .select_candidates_excluding(&request, category, 1, true, &skip)
            .await?
            .into_iter()
            .next()
            .map(|ranked| ranked.provider)
        else {
            tracing::debug!(
                request_id = %request_id,
                round = request.round(),
                "no additional provider available"
            );
            return Ok(None);
        };

        let record = self
            .send_invitation(&request, category, &chosen, ADDITIONAL_INVITE_MESSAGE)
            .await?;
        request.restart_round_clock();
        self.requests.save(&request).await?;
        Ok(Some(record))
    }

    /// Reopens a cancelled request and invites a fresh Top-N.
    ///
    /// Providers that already quoted the request and the assigned provider
    /// are skipped. With nobody eligible the request stays `CANCELADA` and
    /// an empty result is returned.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown request and `InvalidState` when the
    /// request is not cancelled.
    pub async fn requote(&self, request_id: RequestId) -> ApplicationResult<Top3Result> {
        let mut request = self.load(request_id).await?;
        if request.status() != RequestStatus::Cancelled {
            return Err(ApplicationError::invalid_state(format!(
                "request {} is {}, requoting needs CANCELADA",
                request_id,
                request.status()
            )));
        }

        let category = self.resolve_category(&request).await?;
        let limit = self.limits.initial_for(request.is_critical());
        let skip: HashSet<ProviderId> = request.assigned_provider_id().into_iter().collect();
        let selection: Vec<Provider> = self
            .ranker
            .select_candidates_excluding(&request, category, limit, true, &skip)
            .await?
            .into_iter()
            .map(|ranked| ranked.provider)
            .collect();

        if selection.is_empty() {
            tracing::warn!(
                request_id = %request_id,
                skill_id = ?request.skill_id(),
                category_id = ?category,
                "no candidates for requote, request stays CANCELADA"
            );
            return Ok(Top3Result::empty(&request));
        }

        request.reopen_for_requote()?;
        self.requests.save(&request).await?;
        tracing::info!(request_id = %request_id, round = request.round(), "request requoted");

        let mut records = Vec::with_capacity(selection.len());
        for provider in &selection {
            records.push(
                self.send_invitation(&request, category, provider, REQUOTE_MESSAGE)
                    .await?,
            );
        }
        Ok(Top3Result::new(&request, records))
    }

    /// Resolves the category of a request: its own, else its skill's.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog lookup fails.
    pub async fn resolve_category(
        &self,
        request: &ServiceRequest,
    ) -> ApplicationResult<Option<CategoryId>> {
        if let Some(category) = request.category_id() {
            return Ok(Some(category));
        }
        self.category_of_skill(request.id(), request.skill_id()).await
    }

    async fn category_of_skill(
        &self,
        request_id: RequestId,
        skill_id: Option<SkillId>,
    ) -> ApplicationResult<Option<CategoryId>> {
        let Some(skill_id) = skill_id else {
            return Ok(None);
        };
        match self.catalog.get_skill(skill_id).await? {
            Some(skill) => Ok(Some(skill.category_id)),
            None => {
                tracing::warn!(
                    request_id = %request_id,
                    skill_id = %skill_id,
                    "skill not found in local catalog"
                );
                Ok(None)
            }
        }
    }

    async fn request_from_event(
        &self,
        event: &RequestCreatedEvent,
    ) -> ApplicationResult<ServiceRequest> {
        let category = match event.rubro {
            Some(category) => Some(category),
            None => {
                self.category_of_skill(event.solicitud_id, event.habilidad_id)
                    .await?
            }
        };
        Ok(
            ServiceRequest::new(
                event.solicitud_id,
                event.descripcion.clone().unwrap_or_default(),
            )
            .with_requester(event.usuario_id)
            .with_category(category)
            .with_skill(event.habilidad_id)
            .with_title(event.titulo.clone())
            .with_assigned_provider(event.prestador_id)
            .with_critical(event.is_critical())
            .with_quoted(event.fue_cotizada == Some(true))
            .with_status(event.status()),
        )
    }

    async fn load(&self, request_id: RequestId) -> ApplicationResult<ServiceRequest> {
        self.requests
            .get(request_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Solicitud", request_id))
    }

    async fn process_batch(&self, requests: Vec<ServiceRequest>) -> Vec<Top3Result> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let fallback = Top3Result::empty(&request);
            match self.process_request(request).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!(
                        request_id = %fallback.request_id,
                        error = %e,
                        "failed to process request"
                    );
                    results.push(fallback);
                }
            }
        }

        let outcome = self.publisher.publish_top3(&results).await;
        if outcome.success {
            tracing::info!(%outcome, "top3 event published");
        } else if outcome.is_skipped() {
            tracing::info!(%outcome, "top3 publication skipped");
        } else {
            tracing::warn!(%outcome, "top3 publication unsuccessful");
        }
        results
    }

    async fn process_request(&self, mut request: ServiceRequest) -> ApplicationResult<Top3Result> {
        if !request.is_awaiting_invitations() {
            tracing::debug!(
                request_id = %request.id(),
                status = %request.status(),
                "request not awaiting invitations"
            );
            return Ok(Top3Result::empty(&request));
        }
        if let Some(provider_id) = request.assigned_provider_id() {
            return self.invite_assigned(request, provider_id).await;
        }

        let category = self.resolve_category(&request).await?;
        let limit = self.limits.initial_for(request.is_critical());
        let invited = self.invited_in_round(&request).await?;
        let selection: Vec<Provider> = self
            .ranker
            .select_candidates_excluding(&request, category, limit, false, &invited)
            .await?
            .into_iter()
            .map(|ranked| ranked.provider)
            .collect();

        if selection.is_empty() {
            tracing::warn!(
                request_id = %request.id(),
                skill_id = ?request.skill_id(),
                category_id = ?category,
                "no active candidates, request stays CREADA"
            );
            return Ok(Top3Result::empty(&request));
        }

        request.start_quoting()?;
        self.requests.save(&request).await?;

        let mut records = Vec::with_capacity(selection.len());
        for provider in &selection {
            records.push(
                self.send_invitation(&request, category, provider, INVITE_MESSAGE)
                    .await?,
            );
        }
        Ok(Top3Result::new(&request, records))
    }

    async fn invite_assigned(
        &self,
        mut request: ServiceRequest,
        provider_id: ProviderId,
    ) -> ApplicationResult<Top3Result> {
        let Some(provider) = self.providers.get(provider_id).await? else {
            tracing::error!(
                request_id = %request.id(),
                provider_id = %provider_id,
                "assigned provider does not exist"
            );
            return Ok(Top3Result::empty(&request));
        };

        let category = self.resolve_category(&request).await?;
        if category.is_none() {
            tracing::warn!(
                request_id = %request.id(),
                provider_id = %provider_id,
                "category unresolved for direct assignment"
            );
        }

        let record = self
            .send_invitation(&request, category, &provider, DIRECT_ASSIGNMENT_MESSAGE)
            .await?;
        request.start_quoting()?;
        self.requests.save(&request).await?;
        Ok(Top3Result::new(&request, vec![record]))
    }

    async fn invited_in_round(&self, request: &ServiceRequest) -> ApplicationResult<HashSet<ProviderId>> {
        Ok(self
            .invitations
            .find_by_request_and_round(request.id(), request.round())
            .await?
            .iter()
            .map(|i| i.provider_id)
            .collect())
    }

    async fn send_invitation(
        &self,
        request: &ServiceRequest,
        category: Option<CategoryId>,
        provider: &Provider,
        base_message: &str,
    ) -> ApplicationResult<InvitationRecord> {
        let mut record = InvitationRecord {
            request_id: request.id(),
            category_id: category,
            skill_id: request.skill_id(),
            provider_id: provider.id(),
            quote_id: None,
            provider_name: provider.display_name(),
            message: format!("{} {}", base_message, request.id()),
            sent: false,
            timestamp: Timestamp::now(),
        };

        match self.sender.send_invitation(&record).await {
            Ok(()) => {
                record.sent = true;
                tracing::info!(
                    request_id = %request.id(),
                    provider_id = %provider.id(),
                    round = request.round(),
                    "invitation sent"
                );
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %request.id(),
                    provider_id = %provider.id(),
                    error = %e,
                    "invitation call failed"
                );
            }
        }

        let invitation = Invitation::new(request.id(), provider.id(), request.round());
        if !self.invitations.insert_if_absent(&invitation).await? {
            tracing::debug!(
                request_id = %request.id(),
                provider_id = %provider.id(),
                round = request.round(),
                "invitation already recorded"
            );
        }
        Ok(record)
    }
}
